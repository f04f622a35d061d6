use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Blob {
    pub content_type: String,
    pub bytes: Bytes,
}

/// Content-addressed blob store for avatar and post images. `put` returns a
/// fetchable URL; uploading the same bytes twice yields the same URL.
#[derive(Clone)]
pub struct BlobStore {
    blobs: Arc<RwLock<HashMap<String, Blob>>>,
    base_url: String,
}

impl BlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
            base_url: base_url.into(),
        }
    }

    pub async fn put(&self, bytes: Bytes, content_type: &str) -> String {
        let key = content_key(&bytes);
        let url = self.url_for(&key);
        let mut blobs = self.blobs.write().await;
        blobs.insert(
            key,
            Blob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        url
    }

    pub async fn get(&self, key: &str) -> Option<Blob> {
        let blobs = self.blobs.read().await;
        blobs.get(key).cloned()
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

fn content_key(bytes: &Bytes) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
