use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::parser::FileBlob;
use crate::storage::{ObjectStore, PutOptions};

/// What happened to one attachment slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No file was provided for the slot.
    Skipped,
    /// Bytes were written. `url` is empty when neither a signed nor a public
    /// URL could be obtained.
    Stored { key: String, url: String },
    /// The write itself failed.
    Failed { file_name: String, reason: String },
}

impl UploadOutcome {
    /// Empty string means "attachment not available".
    pub fn url(&self) -> &str {
        match self {
            UploadOutcome::Stored { url, .. } => url,
            _ => "",
        }
    }
}

/// Writes attachments into one bucket and hands back retrieval URLs.
pub struct AttachmentUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    signed_url_ttl: Duration,
}

impl AttachmentUploader {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>, signed_url_ttl: Duration) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            signed_url_ttl,
        }
    }

    pub async fn upload(
        &self,
        blob: Option<&FileBlob>,
        prefix: &str,
        default_content_type: &str,
        now: DateTime<Utc>,
    ) -> UploadOutcome {
        let Some(blob) = blob else {
            return UploadOutcome::Skipped;
        };

        let safe_name = sanitize_file_name(&blob.file_name);
        if blob.data.is_empty() {
            tracing::warn!("Upload failed for {safe_name}: file is empty");
            return UploadOutcome::Failed {
                file_name: safe_name,
                reason: "could not read file bytes".to_string(),
            };
        }

        let key = storage_key(prefix, &safe_name, now);
        let options = PutOptions {
            content_type: blob
                .content_type
                .clone()
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| default_content_type.to_string()),
            upsert: true,
        };

        if let Err(e) = self
            .store
            .put(&self.bucket, &key, blob.data.clone(), &options)
            .await
        {
            tracing::warn!("Upload failed for {safe_name}: {e}");
            return UploadOutcome::Failed {
                file_name: safe_name,
                reason: e,
            };
        }

        let url = match self.store.sign(&self.bucket, &key, self.signed_url_ttl).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Could not create signed URL for {safe_name}: {e}");
                self.store
                    .public_url(&self.bucket, &key)
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!("Could not create public URL for {safe_name}: {e}");
                        String::new()
                    })
            }
        };

        UploadOutcome::Stored { key, url }
    }
}

/// Path separators never survive into a storage key segment.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace(['/', '\\'], "_")
}

/// `{prefix}/{YYYYMMDDTHHMMSSZ}_{name}`. Two uploads of the same name in the
/// same second share a key; the upsert flag makes the later one win.
pub fn storage_key(prefix: &str, safe_name: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}/{}_{safe_name}", now.format("%Y%m%dT%H%M%SZ"))
}
