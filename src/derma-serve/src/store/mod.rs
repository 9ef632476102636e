//! Thin REST clients for the two managed backends: key-addressed blob
//! storage for model artifacts and a collection/document database for
//! prediction records.

mod auth;
pub mod blob;
pub mod document;

use reqwest::Client;

pub use blob::BlobStore;
pub use document::{Document, DocumentStore};

use crate::config::Config;
use crate::error::Result;

/// Build both store clients from the configuration, resolving credentials
/// once and sharing one HTTP client.
pub async fn connect(config: &Config) -> Result<(BlobStore, DocumentStore)> {
    let client = Client::new();
    let token = auth::resolve_token(&client, &config.credentials).await?;
    let blob = BlobStore::new(
        client.clone(),
        &config.blob_endpoint,
        &config.model_bucket,
        token.clone(),
    );
    let documents = DocumentStore::new(client, &config.doc_endpoint, token);
    Ok((blob, documents))
}
