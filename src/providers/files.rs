// File capability provider
//
// Read/write/list operations scoped to a single working directory. Any
// path that would resolve outside it is rejected before touching the
// filesystem.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::error::ProviderError;
use crate::tools::normalize::{str_arg, Args};
use crate::tools::registry::{Operation, RegistryBuilder};

/// Cap on file content returned into the transcript
const MAX_OUTPUT_CHARS: usize = 10_000;

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a user-supplied path inside the working directory.
    ///
    /// Absolute paths and parent-directory components are rejected
    /// outright; symlinks inside the directory are the user's own.
    fn resolve(&self, raw: &str) -> Result<PathBuf, ProviderError> {
        let path = Path::new(raw);
        if path.is_absolute() {
            return Err(ProviderError::Operation(format!(
                "path '{}' is outside the working directory",
                raw
            )));
        }
        for component in path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(ProviderError::Operation(format!(
                        "path '{}' is outside the working directory",
                        raw
                    )))
                }
            }
        }
        Ok(self.root.join(path))
    }

    pub fn read_file(&self, file_path: &str) -> Result<String, ProviderError> {
        let resolved = self.resolve(file_path)?;
        debug!("Reading {}", resolved.display());

        let contents = std::fs::read_to_string(&resolved)
            .map_err(|e| ProviderError::Operation(format!("failed to read {}: {}", file_path, e)))?;
        Ok(truncate_for_transcript(contents))
    }

    pub fn write_file(&self, file_path: &str, content: &str) -> Result<String, ProviderError> {
        let resolved = self.resolve(file_path)?;
        debug!("Writing {} bytes to {}", content.len(), resolved.display());

        std::fs::write(&resolved, content)
            .map_err(|e| ProviderError::Operation(format!("failed to write {}: {}", file_path, e)))?;
        Ok(format!("Wrote {} bytes to {}", content.len(), file_path))
    }

    pub fn list_files(&self) -> Result<String, ProviderError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            ProviderError::Operation(format!(
                "failed to list working directory {}: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                ProviderError::Operation(format!("failed to list working directory: {}", e))
            })?;
            let mut name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        if names.is_empty() {
            Ok("(working directory is empty)".to_string())
        } else {
            Ok(names.join("\n"))
        }
    }
}

fn truncate_for_transcript(contents: String) -> String {
    if contents.len() <= MAX_OUTPUT_CHARS {
        return contents;
    }
    let mut cut = MAX_OUTPUT_CHARS;
    while !contents.is_char_boundary(cut) {
        cut -= 1;
    }
    format!(
        "{}\n\n[File truncated - showing first {} characters of {}]",
        &contents[..cut],
        cut,
        contents.len()
    )
}

// Operation bindings

pub struct ReadFile(pub Arc<FileStore>);

#[async_trait]
impl Operation for ReadFile {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0.read_file(str_arg(args, "file_path")?)
    }
}

pub struct WriteFile(pub Arc<FileStore>);

#[async_trait]
impl Operation for WriteFile {
    async fn call(&self, args: &Args) -> Result<String, ProviderError> {
        self.0
            .write_file(str_arg(args, "file_path")?, str_arg(args, "content")?)
    }
}

pub struct ListFiles(pub Arc<FileStore>);

#[async_trait]
impl Operation for ListFiles {
    async fn call(&self, _args: &Args) -> Result<String, ProviderError> {
        self.0.list_files()
    }
}

/// Bind every file operation onto the registry builder
pub fn register(builder: RegistryBuilder, store: Arc<FileStore>) -> RegistryBuilder {
    builder
        .register("read_file", Box::new(ReadFile(store.clone())))
        .register("write_file", Box::new(WriteFile(store.clone())))
        .register("list_files", Box::new(ListFiles(store)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let report = store.write_file("notes.txt", "remember the milk").unwrap();
        assert!(report.contains("17 bytes"));
        assert_eq!(store.read_file("notes.txt").unwrap(), "remember the milk");
    }

    #[test]
    fn test_read_missing_file_is_operation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = store(&dir).read_file("ghost.txt").unwrap_err();
        assert!(matches!(err, ProviderError::Operation(_)));
        assert!(err.to_string().contains("ghost.txt"));
    }

    #[test]
    fn test_parent_escape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        for path in ["../etc/passwd", "a/../../b.txt", "/etc/passwd"] {
            let err = store.read_file(path).unwrap_err();
            assert!(
                err.to_string().contains("outside the working directory"),
                "{} should be rejected",
                path
            );
        }
    }

    #[test]
    fn test_list_files_marks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::write(dir.path().join("b.txt"), "b").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();

        assert_eq!(store.list_files().unwrap(), "a.txt\nb.txt\nsub/");
    }

    #[test]
    fn test_list_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).list_files().unwrap(), "(working directory is empty)");
    }

    #[test]
    fn test_long_file_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.write_file("big.txt", &"x".repeat(20_000)).unwrap();

        let output = store.read_file("big.txt").unwrap();
        assert!(output.contains("[File truncated"));
        assert!(output.len() < 11_000);
    }
}
