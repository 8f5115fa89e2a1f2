use std::io;
use std::path::{Path, PathBuf};

use rmcp::model::{AnnotateAble, RawResource, Resource};
use tracing::{error, info};

pub const README_URI: &str = "readme://mcp";
pub const README_NAME: &str = "readme";
pub const README_FILE_NAME: &str = "mcpreadme.md";

/// The static readme exposed as `readme://mcp`.
///
/// The file is read on every request; nothing is cached.
#[derive(Debug, Clone)]
pub struct ReadmeResource {
    path: PathBuf,
}

impl ReadmeResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Listing entry advertised to clients
    pub fn descriptor(&self) -> Resource {
        let mut raw = RawResource::new(README_URI, README_NAME.to_string());
        raw.description = Some("MCP README content served by this terminal server".to_string());
        raw.mime_type = Some("text/markdown".to_string());
        raw.no_annotation()
    }

    pub fn read(&self) -> io::Result<String> {
        std::fs::read_to_string(&self.path)
    }

    /// Content returned to clients: the file text, or an error line when the
    /// file cannot be read.
    pub fn contents(&self) -> String {
        info!(path = %self.path.display(), "Getting MCP README content");
        match self.read() {
            Ok(content) => content,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Error reading readme");
                format!("Error: Could not read readme file: {}", e)
            }
        }
    }
}

/// `mcpreadme.md` next to the running executable, falling back to the
/// current directory when the executable path is unavailable.
///
/// Debug builds live under `target/`, away from the shipped readme, so they
/// use the crate root's copy when the executable directory has none.
pub fn default_readme_path() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(README_FILE_NAME);

    if cfg!(debug_assertions) && !beside_exe.is_file() {
        return Path::new(env!("CARGO_MANIFEST_DIR")).join(README_FILE_NAME);
    }
    beside_exe
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_contents_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(README_FILE_NAME);
        let text = "# MCP\n\nSome *markdown* with unicode: \u{2713}\n";
        std::fs::write(&path, text).unwrap();

        let resource = ReadmeResource::new(&path);
        assert_eq!(resource.contents(), text);
    }

    #[test]
    fn test_contents_read_fresh_each_time() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(README_FILE_NAME);
        std::fs::write(&path, "first").unwrap();
        let resource = ReadmeResource::new(&path);
        assert_eq!(resource.contents(), "first");

        std::fs::write(&path, "second").unwrap();
        assert_eq!(resource.contents(), "second");
    }

    #[test]
    fn test_missing_file_returns_error_text() {
        let temp_dir = TempDir::new().unwrap();
        let resource = ReadmeResource::new(temp_dir.path().join("missing.md"));
        let contents = resource.contents();
        assert!(contents.starts_with("Error: Could not read readme file: "));
        assert!(resource.read().is_err());
    }

    #[test]
    fn test_directory_path_returns_error_text() {
        let temp_dir = TempDir::new().unwrap();
        let resource = ReadmeResource::new(temp_dir.path());
        assert!(resource
            .contents()
            .starts_with("Error: Could not read readme file: "));
    }

    #[test]
    fn test_descriptor() {
        let resource = ReadmeResource::new("unused.md");
        let descriptor = resource.descriptor();
        assert_eq!(descriptor.uri, README_URI);
        assert_eq!(descriptor.name, README_NAME);
        assert_eq!(descriptor.mime_type.as_deref(), Some("text/markdown"));
    }

    #[test]
    fn test_default_path_uses_readme_file_name() {
        assert!(default_readme_path().ends_with(README_FILE_NAME));
    }

    #[test]
    fn test_default_path_finds_shipped_readme_in_debug_builds() {
        if cfg!(debug_assertions) {
            let resource = ReadmeResource::new(default_readme_path());
            assert!(resource.read().is_ok());
            assert!(resource.contents().starts_with("# MCP Terminal Server"));
        }
    }
}
