//! Core data models used throughout lua-chat.
//!
//! These types represent the catalog records, ranked search hits, and the
//! request/response shapes that flow through the chat endpoint.

use serde::{Deserialize, Serialize};

/// A reusable Lua code example with searchable metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SnippetRecord {
    pub title: String,
    pub keywords: Vec<String>,
    pub code: String,
}

impl SnippetRecord {
    pub fn new(title: &str, keywords: &[&str], code: &str) -> Self {
        Self {
            title: title.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            code: code.to_string(),
        }
    }
}

/// A catalog record paired with its relevance score for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredSnippet {
    #[serde(flatten)]
    pub record: SnippetRecord,
    /// Number of the record's keywords found in the query.
    #[serde(rename = "relevanceScore")]
    pub relevance_score: u32,
}

/// Inbound body of `POST /api/chat`.
///
/// `message` is optional at the wire level so that a missing field is
/// reported as an empty message (400) rather than a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub search_for_code: bool,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, search_for_code: bool) -> Self {
        Self {
            message: Some(message.into()),
            search_for_code,
        }
    }
}

/// Successful response body of the chat endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Always `true`; failures use [`ErrorResponse`].
    pub success: bool,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub search_performed: bool,
    pub code_found: bool,
    /// ISO 8601, UTC, millisecond precision.
    pub timestamp: String,
}

/// Failure response body (`400`, `405`, `500`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}

/// Speaker of a [`ConversationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role/content pair sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}
