//! Default `ObjectStore`: copies the artifact into a configured directory,
//! standing in for the real Dapr-backed object store the original service
//! dials over gRPC.

use super::ObjectStore;
use crate::error::HolderError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn upload(&self, path: &Path, id: &str) -> Result<(), HolderError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let dest = self.root.join(id);
        tokio::fs::copy(path, &dest).await?;
        Ok(())
    }
}
