//! Reply text for each outcome of a chat turn.

use tracing::warn;

use crate::chat::catalog::QueryResult;
use crate::chat::models::QueryIntent;
use crate::llm::LlmProvider;

pub const CLARIFICATION_MESSAGE: &str = "I'm not sure how to turn that into a query. Could you rephrase it? For example:\n\
- \"Show me all users\"\n\
- \"How many orders were placed last month?\"\n\
- \"What are the top 5 products by revenue?\"\n\
- \"List customers who signed up this year\"";

pub const APOLOGY_MESSAGE: &str =
    "Sorry, I couldn't process that request right now. Please try rephrasing your question or try again in a moment.";

pub const EXECUTION_FAILED_MESSAGE: &str =
    "I generated a query for that, but it couldn't be run against the database. Try rephrasing your question or naming the table you're interested in.";

/// Rows included in the narration prompt.
const NARRATION_SAMPLE_ROWS: usize = 10;

const NARRATION_SYSTEM_PROMPT: &str = "You summarise SQL query results for a non-technical user. \
Reply with one or two plain sentences. Do not include SQL or JSON.";

pub fn fallback_summary(count: usize) -> String {
    match count {
        1 => "Found 1 result for your query.".to_string(),
        n => format!("Found {} results for your query.", n),
    }
}

/// Reply text for an executed query. With a narrator, a second model call
/// describes the rows and any failure falls back to a row count; without
/// one, the model's own explanation is used verbatim.
pub async fn describe_results(
    narrator: Option<&dyn LlmProvider>,
    question: &str,
    intent: &QueryIntent,
    result: &QueryResult,
) -> String {
    let Some(llm) = narrator else {
        return intent.explanation.clone();
    };

    let sample: Vec<_> = result.rows.iter().take(NARRATION_SAMPLE_ROWS).collect();
    let rows_json = serde_json::to_string(&sample).unwrap_or_else(|_| "[]".to_string());
    let user_prompt = format!(
        "Question: {}\nSQL: {}\nRow count: {}{}\nRows (first {}): {}",
        question,
        intent.sql_query,
        result.row_count,
        if result.truncated { " (truncated)" } else { "" },
        sample.len(),
        rows_json
    );

    match llm.complete(NARRATION_SYSTEM_PROMPT, &user_prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => fallback_summary(result.row_count),
        Err(e) => {
            warn!("Result narration failed, using fallback: {}", e);
            fallback_summary(result.row_count)
        }
    }
}
