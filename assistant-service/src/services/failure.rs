//! Classification of provider failures into user-facing categories.

use super::providers::ProviderError;
use serde::Serialize;

/// Why a reply could not be produced. Only affects the wording shown to the
/// user; none of these end the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Authentication,
    QuotaExceeded,
    Transport,
    ContentFiltered,
    Unclassified,
}

impl FailureKind {
    /// Typed variants decide first; anything else falls back to matching the
    /// error text for known markers.
    pub fn classify(error: &ProviderError) -> Self {
        match error {
            ProviderError::Unauthorized(_) | ProviderError::NotConfigured(_) => {
                FailureKind::Authentication
            }
            ProviderError::RateLimited => FailureKind::QuotaExceeded,
            ProviderError::NetworkError(_) => FailureKind::Transport,
            ProviderError::ContentFiltered => FailureKind::ContentFiltered,
            other => Self::classify_text(&other.to_string()),
        }
    }

    pub fn classify_text(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();

        if message.contains("API_KEY") || message.contains("401") {
            FailureKind::Authentication
        } else if lower.contains("quota") || lower.contains("limit") || message.contains("429") {
            FailureKind::QuotaExceeded
        } else if lower.contains("network")
            || lower.contains("fetch")
            || message.contains("NETWORK_ERROR")
        {
            FailureKind::Transport
        } else if message.contains("SAFETY") || lower.contains("blocked") {
            FailureKind::ContentFiltered
        } else {
            FailureKind::Unclassified
        }
    }

    /// Fixed copy shown to the user in place of a reply.
    pub fn user_message(self) -> &'static str {
        match self {
            FailureKind::Authentication => {
                "There seems to be an API authentication issue. Please verify the API key is correct."
            }
            FailureKind::QuotaExceeded => {
                "I've reached my usage limit for now. Please try again later."
            }
            FailureKind::Transport => {
                "I'm having network connectivity issues. Please check your internet connection and try again."
            }
            FailureKind::ContentFiltered => {
                "I can't process that request due to safety guidelines. Please try rephrasing your question."
            }
            FailureKind::Unclassified => {
                "I'm sorry, I'm having trouble processing your request right now. Please try again in a moment."
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Authentication => "authentication",
            FailureKind::QuotaExceeded => "quota_exceeded",
            FailureKind::Transport => "transport",
            FailureKind::ContentFiltered => "content_filtered",
            FailureKind::Unclassified => "unclassified",
        }
    }
}
