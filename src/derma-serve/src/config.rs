use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BLOB_ENDPOINT: &str = "https://storage.googleapis.com";
const DEFAULT_BUCKET: &str = "derma-models";
const DEFAULT_COLLECTION: &str = "predictions";
const DEFAULT_CACHE_DIR: &str = "local_model";

/// Where the store clients get their bearer token from.
///
/// Deployments differ only in this choice, so it is one enumeration rather
/// than separate code paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// No Authorization header; public bucket or local emulator.
    Anonymous,
    /// Token fetched from the instance metadata service.
    InstanceMetadata,
    /// Bearer token read from a key file on disk.
    KeyFile(PathBuf),
}

impl CredentialSource {
    /// `anonymous` | `metadata` | path to a key file.
    pub fn parse(value: &str) -> Self {
        match value {
            "anonymous" => CredentialSource::Anonymous,
            "metadata" => CredentialSource::InstanceMetadata,
            path => CredentialSource::KeyFile(PathBuf::from(path)),
        }
    }
}

/// Service configuration, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub blob_endpoint: String,
    pub model_bucket: String,
    pub doc_endpoint: String,
    pub prediction_collection: String,
    pub credentials: CredentialSource,
    pub model_cache_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match get("PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Upstream(format!("PORT is not a valid port: {raw}")))?,
            None => DEFAULT_PORT,
        };

        let doc_endpoint = get("DOC_ENDPOINT")
            .ok_or_else(|| Error::Upstream("DOC_ENDPOINT is not set".to_owned()))?;

        let credentials = match get("STORE_CREDENTIALS") {
            Some(raw) => CredentialSource::parse(&raw),
            None => CredentialSource::Anonymous,
        };

        Ok(Config {
            port,
            blob_endpoint: get("BLOB_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_BLOB_ENDPOINT.to_owned()),
            model_bucket: get("MODEL_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.to_owned()),
            doc_endpoint,
            prediction_collection: get("PREDICTION_COLLECTION")
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_owned()),
            credentials,
            model_cache_dir: get("MODEL_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
        })
    }
}
