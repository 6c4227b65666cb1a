pub mod supabase;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

pub use supabase::SupabaseStorage;

/// Options for a single object write.
///
/// The storage transport only accepts string header values, so both settings
/// are rendered as strings by [`PutOptions::headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: String,
    pub upsert: bool,
}

impl PutOptions {
    pub fn headers(&self) -> [(&'static str, String); 2] {
        [
            ("content-type", self.content_type.clone()),
            ("x-upsert", self.upsert.to_string()),
        ]
    }
}

/// Object storage seam. Keys are hierarchical: `prefix/timestamp_filename`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> Result<(), String>;

    /// Time-limited retrieval URL for a private object.
    async fn sign(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, String>;

    async fn public_url(&self, bucket: &str, key: &str) -> Result<String, String>;
}
