use std::path::{Path, PathBuf};

/// Removes a request-scoped file when dropped, whichever way the request exits.
///
/// The file does not need to exist yet: the remux output path is guarded
/// before the external tool runs so a half-written artifact is cleaned up too.
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed temporary artifact {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Failed to remove temporary artifact {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.mp4.processing");
        std::fs::write(&path, b"data").unwrap();

        {
            let guard = TempArtifact::new(&path);
            assert!(guard.path().exists());
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let guard = TempArtifact::new(dir.path().join("never-written"));
        drop(guard);
    }
}
