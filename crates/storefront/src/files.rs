//! Small filesystem helpers shared by the memo and session files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Sibling path a document is staged at before it replaces `path`.
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `contents` to `path` so readers only ever see a complete document.
///
/// Missing parent directories are created.
pub fn write_atomic(path: &Path, contents: impl AsRef<[u8]>) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let staged = temp_path(path);
    fs::write(&staged, contents)?;
    fs::rename(&staged, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_replaces_existing_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a/b/state.json");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_temp_path_is_a_sibling() {
        let path = Path::new("/data/memo.json");
        assert_eq!(temp_path(path), PathBuf::from("/data/memo.json.tmp"));
    }
}
