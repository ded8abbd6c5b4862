//! Query-filtering subsystem: LLM-primary resolution with a
//! deterministic keyword fallback.

pub mod keyword;
pub mod llm;

pub use keyword::filter_by_keywords;
pub use llm::{IntentResolver, LlmClient, ProviderError};

use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::models::{MatchResult, Provenance, Ticket};
use std::time::Duration;

/// Single entry point for resolving a natural-language query against a
/// ticket collection.
///
/// Resolution is one pass with no retry edge: the LLM path is attempted
/// once under an explicit timeout; any failure routes to the keyword
/// filter, which cannot fail. LLM failures never propagate to the
/// caller.
pub struct QueryResolver {
    intent: IntentResolver,
    resolve_timeout: Duration,
}

impl QueryResolver {
    pub fn new(client: LlmClient, config: &LlmConfig) -> Self {
        Self {
            intent: IntentResolver::new(client),
            resolve_timeout: Duration::from_secs(config.resolve_timeout_secs),
        }
    }

    /// Resolve `query` to an order-preserved subset of `tickets`.
    ///
    /// An empty or whitespace-only query is rejected with
    /// [`AppError::InvalidQuery`] before any filtering happens.
    ///
    /// Cancellation: dropping the returned future abandons the pending
    /// provider call; no local keyword fallback runs for a canceled
    /// caller.
    pub async fn resolve_query(&self, query: &str, tickets: &[Ticket]) -> Result<MatchResult> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidQuery(
                "query must not be empty".to_string(),
            ));
        }

        match tokio::time::timeout(self.resolve_timeout, self.intent.resolve(query, tickets)).await
        {
            Ok(Ok(matched)) => {
                tracing::info!(
                    matched = matched.len(),
                    total = tickets.len(),
                    provenance = %Provenance::Llm,
                    "Query resolved via LLM"
                );
                Ok(MatchResult::new(matched, Provenance::Llm))
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    cause = e.cause(),
                    error = %e,
                    "LLM intent resolution failed, using keyword fallback"
                );
                Ok(self.keyword_fallback(query, tickets))
            }
            Err(_) => {
                tracing::warn!(
                    cause = "resolve_timeout",
                    timeout_secs = self.resolve_timeout.as_secs(),
                    "LLM intent resolution exceeded the resolver bound, using keyword fallback"
                );
                Ok(self.keyword_fallback(query, tickets))
            }
        }
    }

    fn keyword_fallback(&self, query: &str, tickets: &[Ticket]) -> MatchResult {
        let matched = filter_by_keywords(query, tickets);
        tracing::info!(
            matched = matched.len(),
            total = tickets.len(),
            provenance = %Provenance::KeywordFallback,
            "Query resolved via keyword fallback"
        );
        MatchResult::new(matched, Provenance::KeywordFallback)
    }

    /// The underlying chat-completion client, shared with the analysis
    /// path
    pub fn llm_client(&self) -> &LlmClient {
        self.intent.client()
    }
}
