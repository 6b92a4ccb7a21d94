pub mod catalog;
pub mod connection;
pub mod history;

pub use catalog::DuckDbCatalog;
pub use connection::{get_catalog_connection, get_connection, DbPool};
pub use history::DuckDbHistoryStore;
