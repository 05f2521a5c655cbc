//! The object store contract consumed by [`crate::holder::RecordsHolder`] for
//! post-session upload, and a filesystem-backed default implementation.

pub mod fs;

pub use fs::FsObjectStore;

use crate::error::HolderError;
use async_trait::async_trait;
use std::path::Path;

/// Uploads the bytes at `path` under key `id`. Large-payload transport is
/// the implementation's concern; the core only needs this one call shape.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(&self, path: &Path, id: &str) -> Result<(), HolderError>;
}
