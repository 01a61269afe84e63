use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use crate::errors::BountydError;

impl IntoResponse for BountydError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            BountydError::Config(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            BountydError::Payload(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            BountydError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            BountydError::Authentication(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        (status, Json(json!({"error": message}))).into_response()
    }
}
