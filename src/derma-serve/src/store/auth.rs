use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::config::CredentialSource;
use crate::error::Result;

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

/// Resolve the bearer token for a credential source, if the source carries
/// one.
pub(crate) async fn resolve_token(
    client: &Client,
    credentials: &CredentialSource,
) -> Result<Option<String>> {
    match credentials {
        CredentialSource::Anonymous => Ok(None),
        CredentialSource::KeyFile(path) => {
            let token = tokio::fs::read_to_string(path).await?;
            Ok(Some(token.trim().to_owned()))
        }
        CredentialSource::InstanceMetadata => {
            debug!("requesting access token from the instance metadata service");
            let token: MetadataToken = client
                .get(METADATA_TOKEN_URL)
                .header("Metadata-Flavor", "Google")
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            Ok(Some(token.access_token))
        }
    }
}
