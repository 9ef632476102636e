use std::path::Path;

use log::debug;
use reqwest::{Client, RequestBuilder};

use crate::error::Result;

/// Fetch-by-key client for the bucket holding model artifacts.
pub struct BlobStore {
    client: Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl BlobStore {
    pub fn new(client: Client, endpoint: &str, bucket: &str, token: Option<String>) -> Self {
        BlobStore {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            bucket: bucket.to_owned(),
            token,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetch a named blob into memory.
    pub async fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .authorized(self.client.get(self.object_url(key)))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Fetch a named blob and write it to `dest`, creating parent
    /// directories as needed.
    pub async fn download_to(&self, key: &str, dest: &Path) -> Result<()> {
        let bytes = self.fetch(key).await?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        debug!("{} -> {} ({} bytes)", key, dest.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> BlobStore {
        BlobStore::new(Client::new(), "https://blobs.internal/", "derma-models", None)
    }

    #[test]
    fn object_urls_are_endpoint_bucket_key() {
        assert_eq!(
            store().object_url("saved_model.pb"),
            "https://blobs.internal/derma-models/saved_model.pb"
        );
    }

    #[test]
    fn nested_keys_keep_their_path() {
        assert_eq!(
            store().object_url("variables/variables.index"),
            "https://blobs.internal/derma-models/variables/variables.index"
        );
    }
}
