use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Url};
use serde_json::{Value, json};

use super::{ObjectStore, PutOptions};
use crate::config::StorageConfig;

/// Supabase Storage REST client.
pub struct SupabaseStorage {
    client: Client,
    base: Url,
    api_key: String,
}

impl SupabaseStorage {
    pub fn new(config: &StorageConfig) -> Result<Self, String> {
        let base = Url::parse(&config.url).map_err(|e| format!("Invalid storage URL: {e}"))?;
        let client = Client::builder()
            .build()
            .map_err(|e| format!("Failed to build storage client: {e}"))?;

        Ok(Self {
            client,
            base,
            api_key: config.api_key().to_string(),
        })
    }

    /// `{base}/storage/v1/{section...}/{bucket}/{key...}` with every segment
    /// percent-encoded.
    fn object_url(&self, section: &[&str], bucket: &str, key: &str) -> Result<Url, String> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| "Storage URL cannot be a base".to_string())?;
            segments.pop_if_empty();
            segments.extend(["storage", "v1"]);
            segments.extend(section);
            segments.push(bucket);
            segments.extend(key.split('/'));
        }
        Ok(url)
    }

    fn absolute(&self, signed_path: &str) -> Result<String, String> {
        if signed_path.starts_with("http://") || signed_path.starts_with("https://") {
            return Ok(signed_path.to_string());
        }
        let base = self.base.as_str().trim_end_matches('/');
        let path = signed_path.trim_start_matches('/');
        Ok(format!("{base}/storage/v1/{path}"))
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> Result<(), String> {
        let url = self.object_url(&["object"], bucket, key)?;

        let mut req = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key);
        for (name, value) in options.headers() {
            req = req.header(name, value);
        }

        let resp = req
            .body(data)
            .send()
            .await
            .map_err(|e| format!("Storage request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(format!(
                "Storage write rejected ({}): {}",
                status.as_u16(),
                body.chars().take(256).collect::<String>()
            ));
        }

        Ok(())
    }

    async fn sign(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, String> {
        let url = self.object_url(&["object", "sign"], bucket, key)?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(&json!({ "expiresIn": ttl.as_secs() }))
            .send()
            .await
            .map_err(|e| format!("Signing request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("Signing rejected ({})", status.as_u16()));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| format!("Invalid signing response: {e}"))?;

        let signed = body
            .get("signedURL")
            .or_else(|| body.get("signed_url"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Signing response had no URL".to_string())?;

        self.absolute(signed)
    }

    async fn public_url(&self, bucket: &str, key: &str) -> Result<String, String> {
        self.object_url(&["object", "public"], bucket, key)
            .map(|u| u.to_string())
    }
}
