//! The AI writing assistant's interface.
//!
//! No provider ships with the crate. A provider implements
//! [`TextCompletion`]; the helpers here shape its input and output the same
//! way for every provider.

use crate::domain::Note;
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Characters of context kept before the cursor.
pub const CONTEXT_BEFORE: usize = 500;
/// Characters of context kept after the cursor.
pub const CONTEXT_AFTER: usize = 200;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant provider is not configured")]
    NotConfigured,

    #[error("assistant request failed: {0}")]
    Provider(String),

    #[error("assistant returned no text")]
    Empty,
}

/// What to do with a note handed to [`TextCompletion::analyze_note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Grammar,
    Summary,
    Expand,
    Custom,
}

impl AnalysisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Grammar => "grammar",
            AnalysisMode::Summary => "summary",
            AnalysisMode::Expand => "expand",
            AnalysisMode::Custom => "custom",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A text-completion provider.
pub trait TextCompletion: Send + Sync {
    /// Suggests a continuation at the cursor.
    ///
    /// `is_follow_up` is set when the user has just accepted a previous
    /// suggestion, so the provider should move the text forward instead of
    /// restating it.
    fn generate_suggestion(
        &self,
        text_before: &str,
        text_after: &str,
        is_follow_up: bool,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;

    /// Answers a free-form chat prompt, optionally about one note.
    fn generate_text(
        &self,
        prompt: &str,
        attached_note: Option<&Note>,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;

    fn analyze_note(
        &self,
        note: &Note,
        mode: AnalysisMode,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;
}

/// The window of text around the cursor sent with a suggestion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionContext {
    pub before: String,
    pub after: String,
    /// Text follows the cursor and the text before it doesn't end a sentence.
    pub mid_sentence: bool,
    pub is_follow_up: bool,
}

impl SuggestionContext {
    pub fn new(text_before: &str, text_after: &str, is_follow_up: bool) -> Self {
        let before = last_chars(text_before, CONTEXT_BEFORE);
        let after = first_chars(text_after, CONTEXT_AFTER);
        let ends_sentence = before.trim_end().ends_with(['.', '!', '?']);
        let mid_sentence = !after.trim().is_empty() && !ends_sentence;

        Self {
            before: before.to_string(),
            after: after.to_string(),
            mid_sentence,
            is_follow_up,
        }
    }
}

fn last_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }
    match text.char_indices().nth(count - n) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

fn first_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Strips a leading ellipsis the provider was asked not to produce.
pub fn clean_suggestion(raw: &str) -> String {
    match raw.strip_prefix("...") {
        Some(rest) => rest.trim().to_string(),
        None => raw.to_string(),
    }
}

/// A parsed chat input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Analyze(AnalysisMode),
    Help,
    Prompt(String),
}

impl ChatCommand {
    /// Recognizes `/grammar`, `/fix`, `/summary`, `/summarize`, `/expand`
    /// and `/help`, case-insensitively. Anything else is a plain prompt.
    pub fn parse(input: &str) -> Self {
        let lower = input.trim_start().to_lowercase();
        if lower.starts_with("/grammar") || lower.starts_with("/fix") {
            ChatCommand::Analyze(AnalysisMode::Grammar)
        } else if lower.starts_with("/summary") || lower.starts_with("/summarize") {
            ChatCommand::Analyze(AnalysisMode::Summary)
        } else if lower.starts_with("/expand") {
            ChatCommand::Analyze(AnalysisMode::Expand)
        } else if lower.starts_with("/help") {
            ChatCommand::Help
        } else {
            ChatCommand::Prompt(input.to_string())
        }
    }
}
