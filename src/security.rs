use thiserror::Error;

/// Characters the shell would interpret rather than pass through literally
const SHELL_METACHARACTERS: &[char] = &[
    ';', '|', '&', '$', '`', '(', ')', '{', '}', '[', ']', '<', '>', '\n', '\r', '\'', '"', '\\',
    '*', '?', '!', '#',
];

/// Human-readable list of forbidden characters for error messages
const SHELL_METACHARACTERS_DISPLAY: &str = "; | & $ ` ( ) { } [ ] < > ' \" \\ * ? ! #";

const UNRESTRICTED_HINT: &str =
    "Start the server with --unrestricted to allow pipes, redirection and other shell syntax.";

/// Reasons a command is refused before anything is spawned
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("command is empty")]
    EmptyCommand,
    #[error(
        "'{0}' contains invalid characters. Forbidden characters: {chars}. {hint}",
        chars = SHELL_METACHARACTERS_DISPLAY,
        hint = UNRESTRICTED_HINT
    )]
    ShellMetacharacters(String),
}

/// What the `run_command` tool is allowed to hand to the shell.
///
/// `Unrestricted` passes the command line through untouched, so anything the
/// shell understands (pipes, substitutions, redirection) runs with the
/// server's privileges. It must be switched on explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShellPolicy {
    #[default]
    Restricted,
    Unrestricted,
}

impl ShellPolicy {
    pub fn from_flag(unrestricted: bool) -> Self {
        if unrestricted {
            ShellPolicy::Unrestricted
        } else {
            ShellPolicy::Restricted
        }
    }

    pub fn validate(self, command: &str) -> Result<(), ValidationError> {
        if command.trim().is_empty() {
            return Err(ValidationError::EmptyCommand);
        }
        match self {
            ShellPolicy::Unrestricted => Ok(()),
            ShellPolicy::Restricted => validate_argument(command),
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ShellPolicy::Restricted => {
                "restricted: shell metacharacters are rejected, plain commands with arguments only"
            }
            ShellPolicy::Unrestricted => {
                "unrestricted: the command line is passed to the shell as-is"
            }
        }
    }
}

/// Check if a string contains shell metacharacters
pub fn contains_shell_metacharacters(s: &str) -> bool {
    s.contains(SHELL_METACHARACTERS)
}

/// Returns the offending command in the error
pub fn validate_argument(arg: &str) -> Result<(), ValidationError> {
    if contains_shell_metacharacters(arg) {
        return Err(ValidationError::ShellMetacharacters(arg.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_commands_have_no_metacharacters() {
        assert!(!contains_shell_metacharacters("ls -la /tmp"));
        assert!(!contains_shell_metacharacters("git status --short"));
    }

    #[test]
    fn test_detects_semicolon_pipe_and_substitution() {
        assert!(contains_shell_metacharacters("ls; rm -rf /"));
        assert!(contains_shell_metacharacters("cat file | sh"));
        assert!(contains_shell_metacharacters("echo $(whoami)"));
        assert!(contains_shell_metacharacters("echo `whoami`"));
    }

    #[test]
    fn test_restricted_rejects_redirection() {
        let err = ShellPolicy::Restricted
            .validate("echo hi > /tmp/out")
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ShellMetacharacters("echo hi > /tmp/out".to_string())
        );
        assert!(err.to_string().contains("--unrestricted"));
    }

    #[test]
    fn test_restricted_allows_plain_command() {
        assert!(ShellPolicy::Restricted.validate("uname -a").is_ok());
    }

    #[test]
    fn test_unrestricted_allows_everything() {
        assert!(ShellPolicy::Unrestricted
            .validate("echo a | tr a b; echo $HOME > /dev/null")
            .is_ok());
    }

    #[test]
    fn test_empty_command_rejected_under_any_policy() {
        assert_eq!(
            ShellPolicy::Unrestricted.validate("   "),
            Err(ValidationError::EmptyCommand)
        );
        assert_eq!(
            ShellPolicy::Restricted.validate(""),
            Err(ValidationError::EmptyCommand)
        );
    }

    #[test]
    fn test_policy_defaults_to_restricted() {
        assert_eq!(ShellPolicy::default(), ShellPolicy::Restricted);
        assert_eq!(ShellPolicy::from_flag(false), ShellPolicy::Restricted);
        assert_eq!(ShellPolicy::from_flag(true), ShellPolicy::Unrestricted);
    }
}
