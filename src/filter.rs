use regex::Regex;
use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

/// Optional post-processing of successful command output.
///
/// Applied in the order grep -> head -> tail. Failure text is never filtered.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct OutputFilter {
    /// Optional regex pattern to filter output lines (keeps matching lines)
    #[serde(default)]
    pub grep_pattern: Option<String>,

    /// If true, drop lines matching grep_pattern instead of keeping them
    #[serde(default)]
    pub invert_grep: Option<bool>,

    /// Return only the first N lines of output
    #[serde(default)]
    pub head: Option<usize>,

    /// Return only the last N lines of output
    #[serde(default)]
    pub tail: Option<usize>,
}

impl OutputFilter {
    pub fn is_empty(&self) -> bool {
        self.grep_pattern.is_none() && self.head.is_none() && self.tail.is_none()
    }

    /// Compile the grep pattern up front so a bad pattern fails before
    /// anything runs.
    pub fn compile(&self) -> Result<Option<Regex>, regex::Error> {
        self.grep_pattern.as_deref().map(Regex::new).transpose()
    }

    /// Returns `output` untouched when no filter is set. Otherwise the kept
    /// lines are re-joined with `\n`: the trailing newline and any `\r` line
    /// endings are dropped.
    pub fn apply(&self, grep: Option<&Regex>, output: String) -> String {
        if self.is_empty() {
            return output;
        }

        let mut lines: Vec<&str> = output.lines().collect();

        if let Some(regex) = grep {
            let invert = self.invert_grep.unwrap_or(false);
            lines.retain(|line| regex.is_match(line) != invert);
        }
        if let Some(n) = self.head {
            lines.truncate(n);
        }
        if let Some(n) = self.tail {
            let skip = lines.len().saturating_sub(n);
            lines.drain(..skip);
        }

        lines.join("\n")
    }
}
