use serde::Serialize;

use crate::chat::models::QueryIntent;

/// At or above this, a SQL-less answer is accepted as a conversational reply.
pub const CONVERSATIONAL_THRESHOLD: f64 = 0.9;
/// Below this, generated SQL is not trusted enough to run.
pub const EXECUTE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// No SQL but high confidence: reply with the explanation as-is.
    Conversational,
    /// Not enough to go on: ask the user to rephrase.
    Clarify,
    /// Run the SQL and answer from its results.
    Execute,
}

pub fn decide(intent: &QueryIntent) -> GateDecision {
    let has_sql = intent.has_sql();
    let conf = intent.confidence;

    if !has_sql && conf >= CONVERSATIONAL_THRESHOLD {
        GateDecision::Conversational
    } else if !has_sql || conf < EXECUTE_THRESHOLD {
        GateDecision::Clarify
    } else {
        GateDecision::Execute
    }
}
