use duckdb::{AccessMode, Config, Connection, Result as DbResult};
use std::sync::{Arc, Mutex};
use tracing::info;

pub type DbPool = Arc<Mutex<Connection>>;

pub fn get_connection(path: &str) -> DbResult<DbPool> {
    info!("Connecting to DuckDB at {}", path);
    let conn = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(path)?
    };
    Ok(Arc::new(Mutex::new(conn)))
}

/// Opens the database that questions are asked about.
///
/// File databases are opened read-only. External access (file readers,
/// `ATTACH`, extension loading) is disabled for every catalog connection.
pub fn get_catalog_connection(path: &str) -> DbResult<DbPool> {
    info!("Connecting to DuckDB catalog at {} (read-only)", path);
    let config = Config::default().enable_external_access(false)?;
    let conn = if path == ":memory:" {
        Connection::open_in_memory_with_flags(config)?
    } else {
        Connection::open_with_flags(path, config.access_mode(AccessMode::ReadOnly)?)?
    };
    Ok(Arc::new(Mutex::new(conn)))
}

/// Double-quotes an identifier for interpolation into SQL.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
