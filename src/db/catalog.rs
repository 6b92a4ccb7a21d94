use async_trait::async_trait;
use chrono::DateTime;
use duckdb::types::{TimeUnit, Value};
use duckdb::{params, Connection};
use serde_json::{json, Map, Value as JsonValue};

use crate::chat::catalog::{ensure_read_only, CatalogError, ColumnInfo, QueryResult, SchemaCatalog, TableInfo};
use crate::db::connection::{quote_ident, DbPool};

/// Schema access and read-only execution over a DuckDB database.
pub struct DuckDbCatalog {
    pool: DbPool,
}

fn db_err(e: duckdb::Error) -> CatalogError {
    CatalogError::Database(e.to_string())
}

impl DuckDbCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn load_tables(conn: &Connection) -> duckdb::Result<Vec<TableInfo>> {
        let mut stmt = conn.prepare(
            "SELECT table_schema, table_name FROM information_schema.tables
             WHERE table_schema NOT IN ('information_schema', 'pg_catalog')
               AND table_type IN ('BASE TABLE', 'VIEW')
             ORDER BY table_schema, table_name",
        )?;
        let names = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<duckdb::Result<Vec<_>>>()?;

        let mut tables = Vec::with_capacity(names.len());
        for (schema, name) in names {
            let primary_key = Self::load_primary_key(conn, &schema, &name)?;

            let mut stmt = conn.prepare(
                "SELECT column_name, data_type, is_nullable FROM information_schema.columns
                 WHERE table_schema = ? AND table_name = ?
                 ORDER BY ordinal_position",
            )?;
            let columns = stmt
                .query_map(params![schema, name], |row| {
                    let column_name: String = row.get(0)?;
                    let nullable: String = row.get(2)?;
                    Ok(ColumnInfo {
                        is_primary_key: primary_key.contains(&column_name),
                        name: column_name,
                        data_type: row.get(1)?,
                        nullable: nullable.eq_ignore_ascii_case("YES"),
                    })
                })?
                .collect::<duckdb::Result<Vec<_>>>()?;

            tables.push(TableInfo { name, schema, columns, primary_key });
        }
        Ok(tables)
    }

    fn load_primary_key(conn: &Connection, schema: &str, table: &str) -> duckdb::Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT unnest(constraint_column_names) FROM duckdb_constraints()
             WHERE schema_name = ? AND table_name = ? AND constraint_type = 'PRIMARY KEY'",
        )?;
        let rows = stmt.query_map(params![schema, table], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    fn execute(conn: &Connection, sql: &str, max_rows: usize) -> duckdb::Result<QueryResult> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let columns: Vec<String> = rows.as_ref().map(|s| s.column_names()).unwrap_or_default();

        let mut result = QueryResult { columns, ..Default::default() };
        while let Some(row) = rows.next()? {
            if result.rows.len() >= max_rows {
                result.truncated = true;
                break;
            }
            let mut record = Map::with_capacity(result.columns.len());
            for (i, column) in result.columns.iter().enumerate() {
                let value: Value = row.get(i)?;
                record.insert(column.clone(), to_json(value));
            }
            result.rows.push(record);
        }
        result.row_count = result.rows.len();
        Ok(result)
    }
}

#[async_trait]
impl SchemaCatalog for DuckDbCatalog {
    async fn list_tables(&self) -> Result<Vec<TableInfo>, CatalogError> {
        let conn = self
            .pool
            .lock()
            .map_err(|_| CatalogError::Database("connection lock poisoned".to_string()))?;
        Self::load_tables(&conn).map_err(db_err)
    }

    async fn sample_rows(&self, table: &str, limit: usize) -> Result<QueryResult, CatalogError> {
        let conn = self
            .pool
            .lock()
            .map_err(|_| CatalogError::Database("connection lock poisoned".to_string()))?;

        // Only names that exist in the catalog are interpolated
        let tables = Self::load_tables(&conn).map_err(db_err)?;
        let info = tables
            .iter()
            .find(|t| t.qualified_name() == table || t.name == table)
            .ok_or_else(|| CatalogError::UnknownTable(table.to_string()))?;

        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {}",
            quote_ident(&info.schema),
            quote_ident(&info.name),
            limit
        );
        Self::execute(&conn, &sql, limit).map_err(db_err)
    }

    async fn run_query(&self, sql: &str, max_rows: usize) -> Result<QueryResult, CatalogError> {
        let statement = ensure_read_only(sql)?;
        let mut conn = self
            .pool
            .lock()
            .map_err(|_| CatalogError::Database("connection lock poisoned".to_string()))?;

        // Generated SQL never commits, whatever it turns out to contain
        let tx = conn.transaction().map_err(db_err)?;
        let result = Self::execute(&tx, statement, max_rows);
        tx.rollback().map_err(db_err)?;
        result.map_err(db_err)
    }
}

fn to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => json!(b),
        Value::TinyInt(n) => json!(n),
        Value::SmallInt(n) => json!(n),
        Value::Int(n) => json!(n),
        Value::BigInt(n) => json!(n),
        Value::HugeInt(n) => i64::try_from(n).map(|v| json!(v)).unwrap_or_else(|_| json!(n.to_string())),
        Value::UTinyInt(n) => json!(n),
        Value::USmallInt(n) => json!(n),
        Value::UInt(n) => json!(n),
        Value::UBigInt(n) => json!(n),
        Value::Float(f) => json!(f),
        Value::Double(f) => json!(f),
        Value::Decimal(d) => {
            let text = d.to_string();
            text.parse::<f64>().map(|f| json!(f)).unwrap_or_else(|_| json!(text))
        }
        Value::Text(s) => json!(s),
        Value::Enum(s) => json!(s),
        Value::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|ts| json!(ts.naive_utc().to_string()))
                .unwrap_or(JsonValue::Null)
        }
        Value::Date32(days) => DateTime::from_timestamp(i64::from(days) * 86_400, 0)
            .map(|ts| json!(ts.date_naive().to_string()))
            .unwrap_or(JsonValue::Null),
        Value::List(items) => JsonValue::Array(items.into_iter().map(to_json).collect()),
        other => json!(format!("{:?}", other)),
    }
}
