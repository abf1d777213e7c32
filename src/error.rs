use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum AppError {
    #[display(fmt = "{} not found", _0)]
    NotFound(String),

    #[display(fmt = "invalid argument: {}", _0)]
    InvalidArgument(String),

    #[display(fmt = "store error: {}", _0)]
    Store(String),

    #[display(fmt = "export failed: {}", _0)]
    ExportFailed(String),
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Store(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::ExportFailed(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::ExportFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::NotFound(_) | AppError::InvalidArgument(_) => self.to_string(),
            AppError::Store(detail) => {
                tracing::error!(error = %detail, "Store operation failed");
                "Internal Server Error".to_string()
            }
            AppError::ExportFailed(detail) => {
                tracing::error!(error = %detail, "Export failed");
                "Export failed, Contact with system admin".to_string()
            }
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(AppError::NotFound("employee 3".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidArgument("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Store("gone".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn display_names_the_missing_thing() {
        assert_eq!(AppError::NotFound("employee 3".into()).to_string(), "employee 3 not found");
    }
}
