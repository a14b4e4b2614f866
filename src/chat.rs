//! Request orchestration for the chat endpoint.
//!
//! [`ChatService::handle`] validates a [`ChatRequest`] and takes one of two
//! mutually exclusive paths:
//!
//! - **Code search** (`searchForCode = true`): rank the catalog, send the
//!   top [`MAX_COMBINED_SNIPPETS`] to the completion gateway for merging,
//!   and fall back to the best raw snippet if the gateway fails.
//! - **Conversation** (`searchForCode = false`): send the message straight
//!   to the gateway with the assistant persona, falling back to a fixed
//!   apology.
//!
//! Gateway failures never fail the request. Only an empty message
//! ([`ChatError::Validation`]) or an unexpected fault
//! ([`ChatError::Internal`]) does.

use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::SnippetSource;
use crate::completion::CompletionGateway;
use crate::models::{ChatRequest, ChatResponse, ConversationMessage};
use crate::prompts;
use crate::search::{search, MAX_COMBINED_SNIPPETS};

/// Request-level failure.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The message is missing or blank.
    #[error("{0}")]
    Validation(String),
    /// Anything else that went wrong while building the response.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Composes catalog, scorer, and completion gateway per request.
#[derive(Clone)]
pub struct ChatService {
    catalog: Arc<dyn SnippetSource>,
    gateway: Arc<dyn CompletionGateway>,
}

/// Response text plus optional code payload, before finalization.
struct Reply {
    response: String,
    code: Option<String>,
}

impl ChatService {
    pub fn new(catalog: Arc<dyn SnippetSource>, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self { catalog, gateway }
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        let message = match request.message {
            Some(m) if !m.trim().is_empty() => m,
            _ => return Err(ChatError::Validation(prompts::EMPTY_MESSAGE.to_string())),
        };

        let reply = if request.search_for_code {
            self.search_and_combine(&message).await?
        } else {
            self.converse(&message).await
        };

        Ok(ChatResponse {
            success: true,
            code_found: reply.code.is_some(),
            response: reply.response,
            code: reply.code,
            search_performed: request.search_for_code,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }

    async fn search_and_combine(&self, message: &str) -> Result<Reply, ChatError> {
        info!(query = %message, "searching snippets");

        let records = self.catalog.list()?;
        let results = search(message, &records);

        let Some(best) = results.first() else {
            info!("no matching snippets");
            return Ok(Reply {
                response: prompts::NO_SNIPPET_FOUND.to_string(),
                code: None,
            });
        };

        let combined = results
            .iter()
            .take(MAX_COMBINED_SNIPPETS)
            .map(|s| s.record.code.as_str())
            .collect::<Vec<_>>()
            .join(prompts::SNIPPET_SEPARATOR);

        let conversation = [
            ConversationMessage::system(prompts::COMBINE_PERSONA),
            ConversationMessage::user(prompts::combine_prompt(message, &combined)),
        ];

        match self.gateway.complete(&conversation).await {
            // An empty completion counts as no code.
            Ok(code) => Ok(Reply {
                response: prompts::combined_ack(results.len()),
                code: Some(code).filter(|c| !c.trim().is_empty()),
            }),
            Err(e) => {
                warn!(
                    error = %e,
                    model = self.gateway.model_name(),
                    fallback = %best.record.title,
                    "completion failed, returning best raw snippet"
                );
                Ok(Reply {
                    response: prompts::COMBINE_FALLBACK.to_string(),
                    code: Some(best.record.code.clone()),
                })
            }
        }
    }

    async fn converse(&self, message: &str) -> Reply {
        let conversation = [
            ConversationMessage::system(prompts::ASSISTANT_PERSONA),
            ConversationMessage::user(message),
        ];

        match self.gateway.complete(&conversation).await {
            Ok(text) => Reply {
                response: text,
                code: None,
            },
            Err(e) => {
                warn!(error = %e, model = self.gateway.model_name(), "completion failed");
                Reply {
                    response: prompts::CHAT_FALLBACK.to_string(),
                    code: None,
                }
            }
        }
    }
}
