use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use sheets::SheetsError;
use thiserror::Error;

pub const CREDENTIALS_DETAILS: &str = "Google service account credentials are not set.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to fetch search results.")]
    InternalStore,

    #[error("Server configuration error.")]
    CredentialsUnavailable,

    #[error("Failed to fetch data from Google Sheets.")]
    Upstream { status: u16, message: String },
}

impl From<SheetsError> for AppError {
    fn from(error: SheetsError) -> Self {
        match error {
            SheetsError::CredentialsUnavailable => AppError::CredentialsUnavailable,
            other => AppError::Upstream {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = self.to_string();

        match self {
            AppError::InternalStore => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": error }))).into_response()
            }
            AppError::CredentialsUnavailable => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error, "details": CREDENTIALS_DETAILS })),
            )
                .into_response(),
            AppError::Upstream { status, message } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

                (status, Json(json!({ "error": error, "message": message }))).into_response()
            }
        }
    }
}
