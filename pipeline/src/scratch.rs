//! Per-request scratch space.
//!
//! Every request gets its own directory, `<root>/<request id>`, created with
//! `create_dir` so an existing directory is never adopted. Nothing in the
//! pipeline uses a fixed artifact path outside of one of these directories.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors returned while allocating, filling or releasing scratch space.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("create scratch root {}: {source}", path.display())]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("allocate scratch space {}: {source}", path.display())]
    Allocate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write artifact {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("release scratch space {}: {source}", path.display())]
    Release {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Allocates scratch spaces under one root directory.
#[derive(Debug, Clone)]
pub struct ScratchArena {
    root: PathBuf,
}

impl ScratchArena {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the scratch space for `request_id`.
    ///
    /// Fails if a directory for the same id already exists.
    pub async fn acquire(&self, request_id: Uuid) -> Result<ScratchSpace, ResourceError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| ResourceError::CreateRoot {
                path: self.root.clone(),
                source,
            })?;

        let dir = self.root.join(request_id.to_string());
        tokio::fs::create_dir(&dir)
            .await
            .map_err(|source| ResourceError::Allocate {
                path: dir.clone(),
                source,
            })?;

        debug!("scratch space {} allocated", dir.display());
        Ok(ScratchSpace {
            request_id,
            dir,
            released: false,
        })
    }
}

/// A request's private directory.
///
/// Call [`ScratchSpace::release`] when done. If the value is dropped without
/// a successful release (panic, cancelled future) the directory is removed
/// synchronously in `Drop`.
///
/// That fallback uses blocking `std::fs::remove_dir_all` on whichever
/// thread drops the value, usually a runtime worker. A request's space
/// holds a handful of small files, so the stall is short, but the normal
/// path should always go through the async `release`.
#[derive(Debug)]
pub struct ScratchSpace {
    request_id: Uuid,
    dir: PathBuf,
    released: bool,
}

impl ScratchSpace {
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact `name` inside this space.
    pub fn artifact(&self, name: &str) -> PathBuf {
        debug_assert!(
            !name.contains(['/', '\\']) && name != ".." && name != ".",
            "artifact names are plain file names"
        );
        self.dir.join(name)
    }

    /// Writes and syncs an artifact, returning its path.
    pub async fn write_artifact(&self, name: &str, data: &[u8]) -> Result<PathBuf, ResourceError> {
        let path = self.artifact(name);
        let write = async {
            let mut file = tokio::fs::File::create(&path).await?;
            file.write_all(data).await?;
            file.sync_all().await
        };
        write.await.map_err(|source| ResourceError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Removes the directory and everything in it.
    ///
    /// Safe to call more than once, and when some or all artifacts were
    /// never created.
    pub async fn release(&mut self) -> Result<(), ResourceError> {
        match tokio::fs::remove_dir_all(&self.dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ResourceError::Release {
                    path: self.dir.clone(),
                    source,
                });
            }
        }
        self.released = true;
        debug!("scratch space {} released", self.dir.display());
        Ok(())
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => debug!("scratch space {} removed on drop", self.dir.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove scratch space {}: {}", self.dir.display(), e),
        }
    }
}
