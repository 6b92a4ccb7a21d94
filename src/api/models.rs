use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::chat::models::ChatContext;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    // Missing and empty both surface as a `message` length error
    #[serde(default)]
    #[validate(length(min = 1, max = 500, message = "message must be between 1 and 500 characters"))]
    pub message: String,
    #[validate(length(min = 1, max = 128, message = "sessionId must be between 1 and 128 characters"))]
    pub session_id: Option<String>,
    #[serde(default)]
    pub context: Option<ChatContext>,
}

#[derive(Debug, Deserialize)]
pub struct SampleQuery {
    #[serde(default = "default_sample_limit")]
    pub limit: usize,
}

fn default_sample_limit() -> usize {
    5
}

pub const MAX_SAMPLE_LIMIT: usize = 100;

/// `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub rule: String,
    pub message: String,
}

/// `{ "success": false, "error": ..., "details": [...] }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<FieldError>,
}
