use crate::output::paths::OutputPath;
use crate::output::traits::{OutputError, OutputResult, OutputWriter, WriteOutcome};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes documents into a directory tree under `root`
///
/// Each document is written to a temporary sibling first and then renamed
/// into place, so readers never observe a half-written file.
#[derive(Debug)]
pub struct FileSystemWriter {
    root: PathBuf,
    force_overwrite: bool,
    temp_counter: AtomicU64,
}

impl FileSystemWriter {
    /// Creates the writer and its root directory
    ///
    /// # Arguments
    ///
    /// * `root` - Output directory, created if missing
    /// * `force_overwrite` - Replace files that already exist
    ///
    /// # Returns
    ///
    /// * `Ok(FileSystemWriter)` - Root exists and is a directory
    /// * `Err(OutputError)` - The root could not be created
    pub fn new(root: impl Into<PathBuf>, force_overwrite: bool) -> OutputResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| OutputError::CreateRoot {
            path: root.display().to_string(),
            source,
        })?;

        Ok(Self {
            root,
            force_overwrite,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `path` under this writer's root
    pub fn resolve(&self, path: &OutputPath) -> PathBuf {
        self.root.join(path.to_path_buf())
    }

    fn temp_path(&self, target: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(".{}.{}.{}.tmp", name, std::process::id(), n))
    }
}

impl OutputWriter for FileSystemWriter {
    fn write(&self, path: &OutputPath, content: &str) -> OutputResult<WriteOutcome> {
        let target = self.resolve(path);
        let write_err = |source| OutputError::Write {
            path: target.display().to_string(),
            source,
        };

        let outcome = match fs::read(&target) {
            Ok(_) if !self.force_overwrite => {
                tracing::debug!("Keeping existing file {}", target.display());
                return Ok(WriteOutcome::Unchanged);
            }
            Ok(existing) if existing == content.as_bytes() => return Ok(WriteOutcome::Unchanged),
            Ok(_) => WriteOutcome::Updated,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WriteOutcome::Created,
            Err(e) => return Err(write_err(e)),
        };

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp = self.temp_path(&target);
        if let Err(e) = fs::write(&temp, content) {
            let _ = fs::remove_file(&temp);
            return Err(write_err(e));
        }
        if let Err(e) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(write_err(e));
        }

        Ok(outcome)
    }
}
