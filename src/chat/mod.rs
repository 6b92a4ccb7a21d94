//! The natural-language-to-SQL turn pipeline.
//!
//! schema + history -> prompt -> model -> parser -> confidence gate ->
//! reply -> history.

pub mod catalog;
pub mod gate;
pub mod history;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod responder;
pub mod suggestions;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ChatConfig;
use crate::llm::LlmProvider;
use catalog::{CatalogError, QueryResult, SchemaCatalog, TableInfo};
use gate::GateDecision;
use history::{HistoryStore, StoreError};
use models::{ChatMessage, ChatReply, ChatRequest};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ChatService {
    llm: Arc<dyn LlmProvider>,
    catalog: Arc<dyn SchemaCatalog>,
    history: Arc<dyn HistoryStore>,
    settings: ChatConfig,
}

impl ChatService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        catalog: Arc<dyn SchemaCatalog>,
        history: Arc<dyn HistoryStore>,
        settings: ChatConfig,
    ) -> Self {
        Self { llm, catalog, history, settings }
    }

    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// Runs one chat turn. Provider failures and unparseable replies become
    /// assistant messages; only catalog and history failures are errors.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let ChatRequest { session_id, message, context } = request;
        let user_message = ChatMessage::user(message.clone());

        let past = self.history.get(&session_id).await?;
        let tables = self.catalog.list_tables().await?;

        let previous_queries = match context.previous_queries.as_ref().filter(|q| !q.is_empty()) {
            Some(queries) => last_n(queries.iter().cloned(), self.settings.previous_queries),
            None => last_n(
                past.iter().filter_map(|m| m.generated_query.clone()),
                self.settings.previous_queries,
            ),
        };

        let prompt = prompt::build_prompt(&message, &tables, &previous_queries, &context);

        let raw = match self.llm.complete(&prompt.system, &prompt.user).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Session {}: {} call failed: {}", session_id, self.llm.name(), e);
                let reply = ChatMessage::assistant(responder::APOLOGY_MESSAGE, 0.0);
                return self.finish(session_id, user_message, reply, QueryResult::default(), None).await;
            }
        };

        let intent = parser::parse_response(&raw);
        let decision = gate::decide(&intent);
        info!(
            "Session {}: decision={:?} confidence={:.2} has_sql={}",
            session_id,
            decision,
            intent.confidence,
            intent.has_sql()
        );

        match decision {
            GateDecision::Conversational => {
                let reply = ChatMessage::assistant(intent.explanation.clone(), intent.confidence);
                self.finish(session_id, user_message, reply, QueryResult::default(), None).await
            }
            GateDecision::Clarify => {
                let reply = ChatMessage::assistant(responder::CLARIFICATION_MESSAGE, intent.confidence);
                self.finish(session_id, user_message, reply, QueryResult::default(), None).await
            }
            GateDecision::Execute => {
                let sql = intent.sql_query.clone();
                match self.catalog.run_query(&sql, self.settings.max_result_rows).await {
                    Ok(result) => {
                        let narrator = if self.settings.narrate_results { Some(self.llm.as_ref()) } else { None };
                        let text = responder::describe_results(narrator, &message, &intent, &result).await;
                        let reply = ChatMessage::assistant(text, intent.confidence)
                            .with_query(sql.clone())
                            .with_result_count(result.row_count);
                        self.finish(session_id, user_message, reply, result, Some(sql)).await
                    }
                    Err(e) => {
                        warn!("Session {}: generated query failed: {}", session_id, e);
                        let reply = ChatMessage::assistant(responder::EXECUTION_FAILED_MESSAGE, intent.confidence)
                            .with_query(sql.clone());
                        self.finish(session_id, user_message, reply, QueryResult::default(), Some(sql)).await
                    }
                }
            }
        }
    }

    async fn finish(
        &self,
        session_id: String,
        user_message: ChatMessage,
        reply: ChatMessage,
        query_result: QueryResult,
        sql_query: Option<String>,
    ) -> Result<ChatReply, ChatError> {
        self.history
            .append_many(&session_id, vec![user_message, reply.clone()])
            .await?;

        Ok(ChatReply {
            session_id,
            confidence: reply.confidence.unwrap_or(0.0),
            message: reply,
            query_result,
            sql_query,
        })
    }

    pub async fn history(&self, session_id: &str) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.history.get(session_id).await?)
    }

    pub async fn clear_history(&self, session_id: &str) -> Result<(), ChatError> {
        self.history.clear(session_id).await?;
        info!("Cleared history for session {}", session_id);
        Ok(())
    }

    pub async fn suggestions(&self) -> Result<Vec<String>, ChatError> {
        let tables = self.catalog.list_tables().await?;
        Ok(suggestions::suggestions(&tables))
    }

    pub async fn tables(&self) -> Result<Vec<TableInfo>, ChatError> {
        Ok(self.catalog.list_tables().await?)
    }

    pub async fn sample_rows(&self, table: &str, limit: usize) -> Result<QueryResult, ChatError> {
        Ok(self.catalog.sample_rows(table, limit).await?)
    }
}

fn last_n(items: impl Iterator<Item = String>, n: usize) -> Vec<String> {
    let all: Vec<String> = items.collect();
    let skip = all.len().saturating_sub(n);
    all.into_iter().skip(skip).collect()
}
