use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::chat::models::ChatMessage;

pub const DEFAULT_MAX_MESSAGES: usize = 20;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("History storage error: {0}")]
    Storage(String),
}

/// Per-session, append-ordered, length-capped message log.
///
/// Sessions come into existence on first append. Appends are atomic per
/// session and trimming only ever drops the oldest messages.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(&self, session_id: &str, message: ChatMessage) -> Result<(), StoreError> {
        self.append_many(session_id, vec![message]).await
    }

    /// Appends all messages in order, or none of them.
    async fn append_many(&self, session_id: &str, messages: Vec<ChatMessage>) -> Result<(), StoreError>;

    /// Messages oldest-first; an unknown session yields an empty list.
    async fn get(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError>;

    /// Idempotent.
    async fn clear(&self, session_id: &str) -> Result<(), StoreError>;
}

pub struct InMemoryHistoryStore {
    sessions: RwLock<HashMap<String, VecDeque<ChatMessage>>>,
    max_messages: usize,
}

impl InMemoryHistoryStore {
    pub fn new(max_messages: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_messages: max_messages.max(1),
        }
    }
}

impl Default for InMemoryHistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn append_many(&self, session_id: &str, messages: Vec<ChatMessage>) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let log = sessions.entry(session_id.to_string()).or_default();
        log.extend(messages);
        while log.len() > self.max_messages {
            log.pop_front();
        }
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_only_the_most_recent_messages() {
        let store = InMemoryHistoryStore::default();
        for i in 0..45 {
            store.append("s1", ChatMessage::user(format!("msg {}", i))).await.unwrap();
            assert!(store.get("s1").await.unwrap().len() <= DEFAULT_MAX_MESSAGES);
        }

        let messages = store.get("s1").await.unwrap();
        assert_eq!(messages.len(), 20);
        assert_eq!(messages.first().unwrap().content, "msg 25");
        assert_eq!(messages.last().unwrap().content, "msg 44");
    }

    #[tokio::test]
    async fn unknown_session_is_empty_and_clear_is_idempotent() {
        let store = InMemoryHistoryStore::default();
        assert!(store.get("nobody").await.unwrap().is_empty());
        store.clear("nobody").await.unwrap();
        store.clear("nobody").await.unwrap();
    }

    #[tokio::test]
    async fn append_many_keeps_order_and_cap() {
        let store = InMemoryHistoryStore::new(3);
        store.append("s1", ChatMessage::user("first")).await.unwrap();
        store
            .append_many("s1", vec![ChatMessage::user("q"), ChatMessage::assistant("a", 0.9)])
            .await
            .unwrap();
        store
            .append_many("s1", vec![ChatMessage::user("q2"), ChatMessage::assistant("a2", 0.9)])
            .await
            .unwrap();

        let contents: Vec<String> = store.get("s1").await.unwrap().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec!["a", "q2", "a2"]);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = InMemoryHistoryStore::new(5);
        store.append("a", ChatMessage::user("for a")).await.unwrap();
        store.append("b", ChatMessage::user("for b")).await.unwrap();
        store.clear("a").await.unwrap();

        assert!(store.get("a").await.unwrap().is_empty());
        assert_eq!(store.get("b").await.unwrap()[0].content, "for b");
    }
}
