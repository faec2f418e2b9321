//! Durable object storage used for extraction output and audit records.

pub mod filesystem;
pub mod uri;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

pub use filesystem::FsObjectStore;
pub use uri::ObjectUri;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, uri: &ObjectUri) -> Result<Vec<u8>, StorageError>;

    async fn put(&self, uri: &ObjectUri, body: Vec<u8>, content_type: &str)
        -> Result<(), StorageError>;

    /// Immediate child prefixes of `uri`, each ending in `/`, sorted.
    async fn list_prefixes(&self, uri: &ObjectUri) -> Result<Vec<ObjectUri>, StorageError>;
}

/// Reads an object and decodes it as JSON.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    uri: &ObjectUri,
) -> Result<T, StorageError> {
    let bytes = store.get(uri).await?;
    serde_json::from_slice(&bytes).map_err(|e| StorageError::Decode {
        uri: uri.to_string(),
        source: e,
    })
}
