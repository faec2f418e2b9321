use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ObjectStore, ObjectUri};
use crate::error::StorageError;

/// Object store backed by a local directory, laid out as `root/bucket/key`.
///
/// Used for local runs and tests in place of a cloud bucket.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, uri: &ObjectUri) -> PathBuf {
        let mut path = self.root.join(uri.bucket());
        for segment in uri.key().split('/').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        path
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, uri: &ObjectUri) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(uri);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(uri.to_string()))
            }
            Err(e) => Err(StorageError::Read {
                uri: uri.to_string(),
                source: e,
            }),
        }
    }

    async fn put(
        &self,
        uri: &ObjectUri,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.path_for(uri);
        let write_err = |e| StorageError::Write {
            uri: uri.to_string(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(&path, body).await.map_err(write_err)
    }

    async fn list_prefixes(&self, uri: &ObjectUri) -> Result<Vec<ObjectUri>, StorageError> {
        let dir = self.path_for(uri);
        let list_err = |e| StorageError::List {
            uri: uri.to_string(),
            source: e,
        };

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(list_err(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
            let is_dir = entry.file_type().await.map_err(list_err)?.is_dir();
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| uri.join(&format!("{}/", name)))
            .collect())
    }
}
