use crate::chat::catalog::TableInfo;

const CANNED: &[&str] = &[
    "Show me all users",
    "How many records are in each table?",
    "What are the top 10 most recent orders?",
    "Show me the total revenue by month",
    "Which customers placed the most orders?",
];

/// Canned questions, plus two about the first table when any exist.
pub fn suggestions(tables: &[TableInfo]) -> Vec<String> {
    let mut out: Vec<String> = CANNED.iter().map(|s| s.to_string()).collect();
    if let Some(first) = tables.first() {
        let name = first.qualified_name();
        out.push(format!("Show me the first 10 rows from {}", name));
        out.push(format!("How many rows are in {}?", name));
    }
    out
}
