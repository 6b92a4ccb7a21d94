//! Schema metadata and read-only query access to the database being asked about.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Unknown table: {0}")]
    UnknownTable(String),
    #[error("Query rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub is_primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub name: String,
    pub schema: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
}

impl TableInfo {
    /// `schema.name`, or just `name` for the default schema.
    pub fn qualified_name(&self) -> String {
        if self.schema.is_empty() || self.schema == "main" || self.schema == "public" {
            self.name.clone()
        } else {
            format!("{}.{}", self.schema, self.name)
        }
    }
}

/// Rows produced by executing a generated query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

#[async_trait]
pub trait SchemaCatalog: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<TableInfo>, CatalogError>;

    async fn sample_rows(&self, table: &str, limit: usize) -> Result<QueryResult, CatalogError>;

    /// Runs a single read-only statement, returning at most `max_rows` rows.
    async fn run_query(&self, sql: &str, max_rows: usize) -> Result<QueryResult, CatalogError>;
}

/// Accepts exactly one `SELECT`/`WITH` statement; a trailing semicolon is allowed.
///
/// This only screens the statement shape. Catalog implementations must still
/// keep the engine from applying writes.
pub fn ensure_read_only(sql: &str) -> Result<&str, CatalogError> {
    let trimmed = sql.trim();
    let statement = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();

    if statement.is_empty() {
        return Err(CatalogError::Rejected("empty statement".to_string()));
    }
    if has_statement_separator(statement) {
        return Err(CatalogError::Rejected("multiple statements".to_string()));
    }

    let first_word = statement
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if first_word != "SELECT" && first_word != "WITH" {
        return Err(CatalogError::Rejected(format!("{} statements are not allowed", first_word)));
    }

    Ok(statement)
}

/// True when a `;` appears outside string literals, quoted identifiers and comments.
fn has_statement_separator(sql: &str) -> bool {
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                // A doubled quote is an escape and simply re-enters the literal
                for next in chars.by_ref() {
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ';' => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_accepts_select_and_with() {
        assert_eq!(ensure_read_only("SELECT * FROM t;").unwrap(), "SELECT * FROM t");
        assert!(ensure_read_only("  with x as (select 1) select * from x").is_ok());
    }

    #[test]
    fn read_only_rejects_writes_and_batches() {
        assert!(matches!(ensure_read_only("DELETE FROM users"), Err(CatalogError::Rejected(_))));
        assert!(matches!(ensure_read_only("SELECT 1; DROP TABLE users;"), Err(CatalogError::Rejected(_))));
        assert!(matches!(ensure_read_only("  ;"), Err(CatalogError::Rejected(_))));
        assert!(matches!(
            ensure_read_only("SELECT ';' AS s; DELETE FROM users"),
            Err(CatalogError::Rejected(_))
        ));
    }

    #[test]
    fn semicolons_inside_literals_and_comments_are_not_separators() {
        let sql = "SELECT * FROM users WHERE name = 'a;b' AND \"odd;col\" = 'it''s;' -- trailing; note\n";
        assert!(ensure_read_only(sql).is_ok());
        assert!(ensure_read_only("SELECT /* a; b */ 1;").is_ok());
        assert_eq!(ensure_read_only("SELECT 'x;y';").unwrap(), "SELECT 'x;y'");
    }
}
