use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_LENGTH;
use axum::http::HeaderMap;
use axum::Json;
use log::info;
use serde_json::{json, Value};

use derma_serve::record::{Label, PredictionRecord};
use derma_serve::store::Document;
use derma_serve::{Error, ImageClassifier};

use crate::envelope::{ApiError, SuccessBody};
use crate::state::AppState;

/// Multipart field carrying the upload.
const IMAGE_FIELD: &str = "image";

/// Upload cap in bytes, checked against the declared content length before
/// the body is read. The router's body limit is the enforcement backstop.
pub const MAX_UPLOAD_BYTES: u64 = 1_000_000;

/// `POST /api/predict`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<SuccessBody<PredictionRecord>>, ApiError> {
    reject_oversize(&headers)?;
    let bytes = image_field(multipart).await?;
    let record = run_prediction(&state, bytes).await?;

    // Persist before responding: either the record is durable or the whole
    // request fails.
    state
        .documents
        .put(&state.collection, &record.id, &record)
        .await?;

    Ok(Json(SuccessBody::with_message(
        "Model is predicted successfully",
        record,
    )))
}

/// `GET /api/predict/histories`
pub async fn histories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SuccessBody<Vec<Value>>>, ApiError> {
    let documents = state.documents.list(&state.collection).await?;
    Ok(Json(SuccessBody::new(history_entries(documents))))
}

/// `GET /api/health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "ok", "model_loaded": state.model_loaded() }))
}

fn reject_oversize(headers: &HeaderMap) -> Result<(), ApiError> {
    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());
    match declared {
        Some(length) if length > MAX_UPLOAD_BYTES => {
            Err(Error::PayloadTooLarge(MAX_UPLOAD_BYTES).into())
        }
        _ => Ok(()),
    }
}

/// Pull the bytes of the `image` field out of the form. No usable field
/// means the client sent nothing to classify.
async fn image_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| Error::Upstream(err.to_string()))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| Error::Upstream(err.to_string()))?;
            if bytes.is_empty() {
                break;
            }
            return Ok(bytes.to_vec());
        }
    }
    Err(Error::MissingInput.into())
}

/// Preprocess, check readiness, run the forward pass, build the record.
///
/// Preprocessing runs before the readiness check so a bad upload is
/// reported as such even while the model is still loading. The forward pass
/// runs on the blocking pool.
async fn run_prediction(state: &Arc<AppState>, bytes: Vec<u8>) -> Result<PredictionRecord, ApiError> {
    let input = ImageClassifier::preprocess(&bytes)?;
    if !state.model_loaded() {
        return Err(Error::ModelUnavailable.into());
    }

    let shared = Arc::clone(state);
    let label = tokio::task::spawn_blocking(move || -> Result<Label, Error> {
        let classifier = shared.classifier.get().ok_or(Error::ModelUnavailable)?;
        let score = classifier.score(&input)?;
        Ok(Label::from_score(score))
    })
    .await
    .map_err(|err| Error::Upstream(err.to_string()))??;

    info!("classification result: {label:?}");
    Ok(PredictionRecord::new(label))
}

/// Map stored documents to the `{id, history}` response shape.
fn history_entries(documents: Vec<Document>) -> Vec<Value> {
    documents
        .into_iter()
        .map(|doc| json!({ "id": doc.id, "history": doc.fields }))
        .collect()
}
