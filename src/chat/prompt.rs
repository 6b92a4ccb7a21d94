//! Builds the schema-aware prompt pair sent to the model.

use std::fmt::Write;

use crate::chat::catalog::TableInfo;
use crate::chat::models::ChatContext;

const RULES: &str = "\
Rules:
1. Only generate read-only SELECT queries (a leading WITH clause is fine). Never modify data.
2. Only reference tables and columns that appear in the schema above.
3. Add a LIMIT clause (100 or fewer) unless the question asks for an aggregate.
4. If the question cannot be answered from this schema, leave \"sql\" empty and explain why.
5. If the message is conversational and needs no query, leave \"sql\" empty, answer in \"explanation\" and use a high confidence.
6. \"confidence\" is a number between 0.0 and 1.0 describing how sure you are that the SQL answers the question.";

const OUTPUT_FORMAT: &str = "\
Respond with a single JSON object and nothing else:
{\"sql\": \"<query or empty string>\", \"explanation\": \"<short explanation for the user>\", \"confidence\": <0.0-1.0>, \"suggestedTable\": \"<most relevant table or null>\"}";

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Renders every table and column. Large schemas are passed through untruncated.
pub fn describe_schema(tables: &[TableInfo]) -> String {
    if tables.is_empty() {
        return "(no tables available)".to_string();
    }

    let mut out = String::new();
    for table in tables {
        let _ = writeln!(out, "Table {}:", table.qualified_name());
        for column in &table.columns {
            let mut flags = Vec::new();
            if column.is_primary_key {
                flags.push("PRIMARY KEY");
            }
            if !column.nullable {
                flags.push("NOT NULL");
            }
            if flags.is_empty() {
                let _ = writeln!(out, "  - {} {}", column.name, column.data_type);
            } else {
                let _ = writeln!(out, "  - {} {} ({})", column.name, column.data_type, flags.join(", "));
            }
        }
    }
    out
}

pub fn build_prompt(
    message: &str,
    tables: &[TableInfo],
    previous_queries: &[String],
    context: &ChatContext,
) -> Prompt {
    let system = format!(
        "You are a data assistant that translates questions into SQL for a DuckDB/PostgreSQL-compatible database.\n\n\
         Database schema:\n{}\n{}\n\n{}",
        describe_schema(tables),
        RULES,
        OUTPUT_FORMAT
    );

    let mut user = format!("Question: {}", message);

    if let Some(table) = context.current_table.as_deref().filter(|t| !t.is_empty()) {
        let _ = write!(user, "\n\nThe user is currently looking at table: {}", table);
    }
    if let Some(available) = context.available_tables.as_ref().filter(|t| !t.is_empty()) {
        let _ = write!(user, "\n\nTables visible to the user: {}", available.join(", "));
    }
    if !previous_queries.is_empty() {
        user.push_str("\n\nRecent queries in this conversation:");
        for query in previous_queries {
            let _ = write!(user, "\n- {}", query);
        }
    }

    Prompt { system, user }
}
