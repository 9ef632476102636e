use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A stored document: its id plus the raw JSON fields, exactly as the
/// store returned them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    documents: Vec<Document>,
}

/// Collection/document client for the prediction database.
pub struct DocumentStore {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl DocumentStore {
    pub fn new(client: Client, endpoint: &str, token: Option<String>) -> Self {
        DocumentStore {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            token,
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/v1/collections/{}/documents", self.endpoint, collection)
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}", self.collection_url(collection), id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Upsert a document keyed by `id`.
    pub async fn put<T: Serialize>(&self, collection: &str, id: &str, fields: &T) -> Result<()> {
        self.authorized(self.client.put(self.document_url(collection, id)))
            .json(fields)
            .send()
            .await?
            .error_for_status()?;
        debug!("stored document {collection}/{id}");
        Ok(())
    }

    /// List every document in a collection. Order is whatever the store
    /// returns.
    pub async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let response: ListResponse = self
            .authorized(self.client.get(self.collection_url(collection)))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DocumentStore {
        DocumentStore::new(Client::new(), "http://docs.internal/", None)
    }

    #[test]
    fn collection_url_shape() {
        assert_eq!(
            store().collection_url("predictions"),
            "http://docs.internal/v1/collections/predictions/documents"
        );
    }

    #[test]
    fn document_url_shape() {
        assert_eq!(
            store().document_url("predictions", "abc-123"),
            "http://docs.internal/v1/collections/predictions/documents/abc-123"
        );
    }

    #[test]
    fn list_response_deserializes_documents_verbatim() {
        let raw = serde_json::json!({
            "documents": [
                {"id": "a", "fields": {"result": "Cancer"}},
                {"id": "b", "fields": {"result": "Non-cancer"}},
            ]
        });
        let parsed: ListResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.documents.len(), 2);
        assert_eq!(parsed.documents[0].id, "a");
        assert_eq!(parsed.documents[0].fields["result"], "Cancer");
    }
}
