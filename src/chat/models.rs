use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chat::catalog::QueryResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// One turn in a conversation. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            generated_query: None,
            result_count: None,
            confidence: None,
        }
    }

    pub fn assistant(content: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            generated_query: None,
            result_count: None,
            confidence: Some(confidence),
        }
    }

    pub fn with_query(mut self, sql: impl Into<String>) -> Self {
        self.generated_query = Some(sql.into());
        self
    }

    pub fn with_result_count(mut self, count: usize) -> Self {
        self.result_count = Some(count);
        self
    }
}

/// The model's structured answer after parsing. `confidence` is always in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntent {
    pub sql_query: String,
    pub explanation: String,
    pub confidence: f64,
    pub suggested_table: Option<String>,
}

impl QueryIntent {
    pub fn has_sql(&self) -> bool {
        !self.sql_query.trim().is_empty()
    }
}

/// Optional hints the client sends along with a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatContext {
    pub current_table: Option<String>,
    pub available_tables: Option<Vec<String>>,
    pub previous_queries: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
    pub context: ChatContext,
}

/// What the service hands back for a single turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub session_id: String,
    pub message: ChatMessage,
    pub query_result: QueryResult,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
}
