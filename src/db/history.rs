use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{params, Connection};
use tracing::info;
use uuid::Uuid;

use crate::chat::history::{HistoryStore, StoreError};
use crate::chat::models::{ChatMessage, Role};
use crate::db::connection::DbPool;

const SCHEMA: &str = r#"
CREATE SEQUENCE IF NOT EXISTS seq_chat_messages;

CREATE TABLE IF NOT EXISTS chat_messages (
    seq BIGINT DEFAULT nextval('seq_chat_messages'),
    id VARCHAR NOT NULL,
    session_id VARCHAR NOT NULL,
    role VARCHAR NOT NULL,
    content TEXT NOT NULL,
    created_at VARCHAR NOT NULL,
    generated_query TEXT,
    result_count BIGINT,
    confidence DOUBLE
);
"#;

type MessageRow = (String, String, String, String, Option<String>, Option<i64>, Option<f64>);

fn db_err(e: duckdb::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

/// Chat history persisted in DuckDB. A batch of appends and its trimming run
/// in one transaction under the connection lock.
pub struct DuckDbHistoryStore {
    pool: DbPool,
    max_messages: usize,
}

impl DuckDbHistoryStore {
    pub fn new(pool: DbPool, max_messages: usize) -> Result<Self, StoreError> {
        {
            let conn = pool
                .lock()
                .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))?;
            init_schema(&conn).map_err(db_err)?;
        }
        Ok(Self { pool, max_messages: max_messages.max(1) })
    }
}

fn init_schema(conn: &Connection) -> duckdb::Result<()> {
    info!("Initializing chat history schema");
    conn.execute_batch(SCHEMA)
}

fn row_to_message(row: MessageRow) -> Result<ChatMessage, StoreError> {
    let (id, role, content, created_at, generated_query, result_count, confidence) = row;

    let id = id
        .parse::<Uuid>()
        .map_err(|e| StoreError::Storage(format!("bad message id {}: {}", id, e)))?;
    let role = Role::parse(&role).ok_or_else(|| StoreError::Storage(format!("bad role {}", role)))?;
    let timestamp = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::Storage(format!("bad timestamp {}: {}", created_at, e)))?
        .with_timezone(&Utc);

    Ok(ChatMessage {
        id,
        role,
        content,
        timestamp,
        generated_query,
        result_count: result_count.map(|n| n.max(0) as usize),
        confidence,
    })
}

#[async_trait]
impl HistoryStore for DuckDbHistoryStore {
    async fn append_many(&self, session_id: &str, messages: Vec<ChatMessage>) -> Result<(), StoreError> {
        let mut conn = self
            .pool
            .lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))?;
        let tx = conn.transaction().map_err(db_err)?;

        for message in &messages {
            tx.execute(
                "INSERT INTO chat_messages (id, session_id, role, content, created_at, generated_query, result_count, confidence)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    message.id.to_string(),
                    session_id,
                    message.role.as_str(),
                    message.content,
                    message.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
                    message.generated_query,
                    message.result_count.map(|n| n as i64),
                    message.confidence,
                ],
            )
            .map_err(db_err)?;
        }

        // Drop everything older than the newest `max_messages` rows of this session
        tx.execute(
            "DELETE FROM chat_messages
             WHERE session_id = ?
               AND seq <= (SELECT seq FROM chat_messages WHERE session_id = ? ORDER BY seq DESC LIMIT 1 OFFSET ?)",
            params![session_id, session_id, self.max_messages as i64],
        )
        .map_err(db_err)?;

        tx.commit().map_err(db_err)
    }

    async fn get(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let conn = self
            .pool
            .lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT id, role, content, created_at, generated_query, result_count, confidence
                 FROM chat_messages
                 WHERE session_id = ?
                 ORDER BY seq ASC",
            )
            .map_err(db_err)?;

        let rows: Vec<MessageRow> = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })
            .map_err(db_err)?
            .collect::<duckdb::Result<Vec<_>>>()
            .map_err(db_err)?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn clear(&self, session_id: &str) -> Result<(), StoreError> {
        let conn = self
            .pool
            .lock()
            .map_err(|_| StoreError::Storage("connection lock poisoned".to_string()))?;
        conn.execute("DELETE FROM chat_messages WHERE session_id = ?", params![session_id])
            .map_err(db_err)?;
        Ok(())
    }
}
