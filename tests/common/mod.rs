#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sqlchat::chat::history::{HistoryStore, InMemoryHistoryStore, StoreError};
use sqlchat::chat::models::ChatMessage;
use sqlchat::chat::ChatService;
use sqlchat::config::ChatConfig;
use sqlchat::db::{get_catalog_connection, DbPool, DuckDbCatalog};
use sqlchat::llm::models::{ChatOptions, ChatResponse, Message};
use sqlchat::llm::{LlmError, LlmProvider};

/// Replays canned replies in order and records every (system, user) prompt it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let user = messages.iter().map(|m| m.content.clone()).collect::<Vec<_>>().join("\n");
        self.prompts
            .lock()
            .unwrap()
            .push((options.system_prompt.unwrap_or_default(), user));

        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Api("no scripted reply left".to_string())));

        next.map(|content| ChatResponse { content, model: "scripted".to_string(), usage: None })
    }
}

pub const STORE_FAILURE: &str = "disk quota exceeded on /var/lib/sqlchat/history.duckdb";

/// A history backend whose every operation fails.
pub struct FailingHistoryStore;

#[async_trait]
impl HistoryStore for FailingHistoryStore {
    async fn append_many(&self, _session_id: &str, _messages: Vec<ChatMessage>) -> Result<(), StoreError> {
        Err(StoreError::Storage(STORE_FAILURE.to_string()))
    }

    async fn get(&self, _session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        Err(StoreError::Storage(STORE_FAILURE.to_string()))
    }

    async fn clear(&self, _session_id: &str) -> Result<(), StoreError> {
        Err(StoreError::Storage(STORE_FAILURE.to_string()))
    }
}

pub const SEED: &str = r#"
CREATE TABLE users (id INTEGER PRIMARY KEY, name VARCHAR NOT NULL, email VARCHAR);
INSERT INTO users VALUES (1, 'Ada', 'ada@example.com'), (2, 'Grace', NULL), (3, 'Linus', 'linus@example.com');

CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, total DOUBLE);
INSERT INTO orders VALUES (10, 1, 9.5), (11, 1, 20.0), (12, 3, 5.25);
"#;

pub fn seeded_pool() -> DbPool {
    let pool = get_catalog_connection(":memory:").unwrap();
    pool.lock().unwrap().execute_batch(SEED).unwrap();
    pool
}

pub fn chat_config() -> ChatConfig {
    ChatConfig {
        narrate_results: false,
        max_result_rows: 100,
        previous_queries: 3,
    }
}

pub fn service_with(provider: Arc<ScriptedProvider>, config: ChatConfig) -> ChatService {
    ChatService::new(
        provider,
        Arc::new(DuckDbCatalog::new(seeded_pool())),
        Arc::new(InMemoryHistoryStore::default()),
        config,
    )
}

pub fn intent_json(sql: &str, explanation: &str, confidence: f64) -> String {
    serde_json::json!({
        "sql": sql,
        "explanation": explanation,
        "confidence": confidence,
    })
    .to_string()
}
