//! Shared utilities for integration tests.

pub mod harness;

use serde_json::Value;

/// Encodes messages as protocol input, one JSON object per line.
#[allow(dead_code)]
pub fn json_lines(messages: &[Value]) -> String {
    messages.iter().map(|m| format!("{m}\n")).collect()
}

/// Decodes protocol output back into messages.
///
/// # Panics
///
/// Panics if a line is not valid JSON.
#[allow(dead_code)]
pub fn parse_lines(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            serde_json::from_str(l).unwrap_or_else(|e| panic!("Bad protocol line {l:?}: {e}"))
        })
        .collect()
}

/// Finds the reply with the given request id.
#[allow(dead_code)]
pub fn reply(messages: &[Value], id: u64) -> &Value {
    messages
        .iter()
        .find(|m| m["kind"] == "reply" && m["id"] == id)
        .unwrap_or_else(|| panic!("No reply with id {id} in {messages:?}"))
}
