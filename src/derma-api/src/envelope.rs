use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use derma_serve::Error;

/// Uniform success wrapper: `{status, message?, data}`.
#[derive(Debug, Serialize)]
pub struct SuccessBody<T: Serialize> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

impl<T: Serialize> SuccessBody<T> {
    pub fn new(data: T) -> Self {
        SuccessBody {
            status: "success",
            message: None,
            data,
        }
    }

    pub fn with_message(message: &'static str, data: T) -> Self {
        SuccessBody {
            status: "success",
            message: Some(message),
            data,
        }
    }
}

/// Uniform failure wrapper: `{status:"fail", message}`.
#[derive(Debug, Serialize)]
pub struct FailBody {
    pub status: &'static str,
    pub message: String,
}

/// Handler error: a service error kind plus its deterministic HTTP mapping.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::MissingInput
            | Error::ModelUnavailable
            | Error::Decode(_)
            | Error::Upstream(_) => StatusCode::BAD_REQUEST,
        };
        let body = FailBody {
            status: "fail",
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_with_message_has_all_three_fields() {
        let body = SuccessBody::with_message("Model is predicted successfully", 7);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "Model is predicted successfully");
        assert_eq!(json["data"], 7);
    }

    #[test]
    fn success_without_message_omits_the_field() {
        let body = SuccessBody::new(vec![1, 2]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn oversize_maps_to_413() {
        let response = ApiError(Error::PayloadTooLarge(1_000_000)).into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn every_other_kind_maps_to_400() {
        for err in [
            Error::MissingInput,
            Error::ModelUnavailable,
            Error::Decode("bad".into()),
            Error::Upstream("down".into()),
        ] {
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}
