use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::api::models::{ErrorBody, FieldError};
use crate::chat::catalog::CatalogError;
use crate::chat::ChatError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation failed: {}", field_list(.0))]
    Validation(Vec<FieldError>),
    #[error("Not found: {0}")]
    NotFound(String),
    // Detail is logged where it happens, never returned to the caller
    #[error("Internal server error")]
    Internal,
}

fn field_list(details: &[FieldError]) -> String {
    details
        .iter()
        .map(|d| format!("{} ({})", d.field, d.rule))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ApiError {
    pub fn invalid(field: &str, rule: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            field: field.to_string(),
            rule: rule.to_string(),
            message: message.into(),
        }])
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let details = match self {
            ApiError::Validation(details) => details.clone(),
            _ => Vec::new(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            success: false,
            error: self.to_string(),
            details,
        })
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    rule: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(details)
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Catalog(CatalogError::UnknownTable(table)) => {
                ApiError::NotFound(format!("table {}", table))
            }
            other => {
                error!("Request failed: {}", other);
                ApiError::Internal
            }
        }
    }
}
