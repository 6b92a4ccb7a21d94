use std::sync::Arc;

use tracing::info;

use crate::chat::history::{HistoryStore, InMemoryHistoryStore};
use crate::chat::ChatService;
use crate::config::{AppConfig, HistoryBackend};
use crate::db::{get_catalog_connection, get_connection, DuckDbCatalog, DuckDbHistoryStore};
use crate::error::AppError;
use crate::llm::ProviderFactory;

/// Wires the configured provider, catalog and history store into a [`ChatService`].
/// Fails when no provider has credentials.
pub fn build_service(config: &AppConfig) -> Result<ChatService, AppError> {
    check_paths(config)?;
    let llm = ProviderFactory::from_config(&config.llm)?;

    let catalog = Arc::new(DuckDbCatalog::new(get_catalog_connection(&config.database.path)?));

    let history: Arc<dyn HistoryStore> = match config.history.backend {
        HistoryBackend::Memory => {
            info!("Using in-memory chat history (max {} messages)", config.history.max_messages);
            Arc::new(InMemoryHistoryStore::new(config.history.max_messages))
        }
        HistoryBackend::Duckdb => {
            info!("Using DuckDB chat history at {}", config.history.path);
            let pool = get_connection(&config.history.path)?;
            Arc::new(DuckDbHistoryStore::new(pool, config.history.max_messages)?)
        }
    };

    Ok(ChatService::new(llm, catalog, history, config.chat.clone()))
}

/// The catalog connection is read-only and every table on it is shown to the
/// model, so chat history must live in a separate database file.
fn check_paths(config: &AppConfig) -> Result<(), AppError> {
    if config.history.backend == HistoryBackend::Duckdb
        && config.history.path != ":memory:"
        && config.history.path == config.database.path
    {
        return Err(AppError::InvalidConfig(format!(
            "history.path and database.path both point at {}",
            config.history.path
        )));
    }
    Ok(())
}
