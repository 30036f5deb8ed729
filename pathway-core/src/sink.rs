use std::path::{Path, PathBuf};

use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to clean output directory {}", path.display())]
    Clean {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("refusing to clean {}, it contains the working directory", path.display())]
    CleanWorkingDir { path: PathBuf },
}

/// Output root that export files are written under.
///
/// All paths passed in are relative to the root and use `/` separators.
#[derive(Debug, Clone)]
pub struct OutputDir {
    root: PathBuf,
}

impl OutputDir {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure the root exists, optionally wiping previous output first.
    pub async fn prepare(&self, clean: bool) -> Result<(), SinkError> {
        if clean {
            self.clean().await?;
        }
        self.create_root().await
    }

    async fn clean(&self) -> Result<(), SinkError> {
        let clean_error = |source: std::io::Error| SinkError::Clean {
            path: self.root.clone(),
            source,
        };

        if !tokio::fs::try_exists(&self.root).await.map_err(clean_error)? {
            return Ok(());
        }
        let root = tokio::fs::canonicalize(&self.root).await.map_err(clean_error)?;
        let cwd = std::env::current_dir().map_err(clean_error)?;
        let cwd = tokio::fs::canonicalize(&cwd).await.map_err(clean_error)?;
        if encloses(&root, &cwd) {
            return Err(SinkError::CleanWorkingDir {
                path: self.root.clone(),
            });
        }

        info!(root = %self.root.display(), "removing previous output");
        tokio::fs::remove_dir_all(&self.root).await.map_err(clean_error)
    }

    async fn create_root(&self) -> Result<(), SinkError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| SinkError::CreateDir {
                path: self.root.clone(),
                source,
            })
    }

    /// Create a directory if it does not exist yet.
    pub async fn create_dir(&self, relative: &str) -> Result<(), SinkError> {
        let path = self.resolve(relative);
        debug!(path = %path.display(), "creating directory");
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| SinkError::CreateDir { path, source })
    }

    /// Write a file, replacing any previous contents.
    pub async fn write(&self, relative: &str, contents: &str) -> Result<(), SinkError> {
        let path = self.resolve(relative);
        debug!(path = %path.display(), bytes = contents.len(), "writing file");
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| SinkError::Write { path, source })
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

/// Whether `dir` is `root` or lies somewhere below it. Both paths must be canonical.
fn encloses(root: &Path, dir: &Path) -> bool {
    dir.starts_with(root)
}
