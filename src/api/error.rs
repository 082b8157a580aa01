use crate::services::contacts::OnboardError;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Onboard(#[from] OnboardError),

    #[error("contact listing failed: {0}")]
    ListContacts(#[source] sqlx::Error),

    #[error("multipart request could not be read: {0}")]
    Multipart(#[from] MultipartError),
}

impl AppError {
    fn stage(&self) -> &'static str {
        match self {
            AppError::Onboard(err) => err.stage(),
            AppError::ListContacts(_) => "list",
            AppError::Multipart(_) => "validation",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let detail = self.to_string();
        tracing::error!("🛑 {} failure: {}", self.stage(), detail);

        let (status, message) = match &self {
            AppError::Onboard(err) => {
                let message = match err {
                    OnboardError::MissingContact | OnboardError::Malformed(_) => {
                        "contact information was not received; nothing was saved"
                    }
                    OnboardError::Pipeline(_) => {
                        "error while processing image; information was not saved"
                    }
                    OnboardError::Persistence(_) | OnboardError::MissingRow(_) => {
                        "error while processing contact information"
                    }
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            AppError::ListContacts(_) => (StatusCode::BAD_REQUEST, "error while reading contacts"),
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, "upload form could not be read"),
        };

        let body = Json(json!({
            "ok": false,
            "message": message,
            "err": detail,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_contact_renders_the_envelope_with_500() {
        let response = AppError::Onboard(OnboardError::MissingContact).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(
            json["message"],
            "contact information was not received; nothing was saved"
        );
        assert_eq!(json["err"], "no contact supplied");
    }

    #[tokio::test]
    async fn listing_failures_are_bad_requests() {
        let response = AppError::ListContacts(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["message"], "error while reading contacts");
    }

    #[tokio::test]
    async fn persistence_failures_keep_the_cause_in_err() {
        let response = AppError::Onboard(OnboardError::MissingRow(41)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "error while processing contact information");
        assert_eq!(json["err"], "inserted contact 41 could not be re-read");
    }
}
