//! LLM intent resolver: delegates semantic interpretation of a query to
//! an external chat-completion provider and translates its answer into a
//! ticket subset.
//!
//! Every failure surfaces as a distinct [`ProviderError`] variant; retry
//! and fallback policy live entirely in the orchestrator.

use crate::config::LlmConfig;
use crate::error::{AppError, Result};
use crate::models::Ticket;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Credential values that are treated the same as an absent key
const PLACEHOLDER_KEYS: &[&str] = &["your_api_key_here", "changeme", "sk-..."];

static DIGIT_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("static digit-run pattern"));

const SYSTEM_PROMPT: &str = "You are a precise ticket filtering system. \
Analyze the user's natural language query and return only the ticket ids \
that match the intent. Always respond with a valid JSON array of strings.";

/// Failure causes of a single provider call. None of these are retried
/// or recovered here.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// API key absent or a known placeholder; no network call was made
    #[error("API key missing or placeholder")]
    MissingCredential,

    /// Network-level fault reaching the provider
    #[error("network error: {0}")]
    Network(String),

    /// The HTTP client gave up waiting for the provider
    #[error("provider call timed out after {0}s")]
    Timeout(u64),

    /// Non-success HTTP status from the provider
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Error payload embedded in an otherwise successful response
    #[error("provider error payload: {0}")]
    Api(String),

    /// Response text contained neither a JSON array nor any digits
    #[error("unparseable provider response: {0}")]
    Unparseable(String),
}

impl ProviderError {
    /// Stable cause label for structured log fields
    pub fn cause(&self) -> &'static str {
        match self {
            ProviderError::MissingCredential => "missing_credential",
            ProviderError::Network(_) => "network",
            ProviderError::Timeout(_) => "timeout",
            ProviderError::Status { .. } => "status",
            ProviderError::Api(_) => "api_error",
            ProviderError::Unparseable(_) => "unparseable",
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Thin chat-completion client shared by the intent resolver and the
/// executive-summary analysis path
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
    api_key: Option<String>,
}

impl LlmClient {
    /// Create a client with an explicit (possibly absent) API key
    pub fn new(config: LlmConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let api_key = api_key.filter(|k| !is_placeholder(k));

        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Create a client reading the API key from the environment variable
    /// named in config. An absent or placeholder value is expected and
    /// leaves the client credential-less.
    pub fn from_env(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).ok();
        Self::new(config, api_key)
    }

    /// Whether a usable credential is configured
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// One chat-completion round trip. Returns the assistant message
    /// text, or the distinct failure cause.
    pub async fn chat_completion(
        &self,
        system: &str,
        user: &str,
    ) -> std::result::Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential)?;

        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(self.config.request_timeout_secs)
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|_| ProviderError::Unparseable(truncate(&body, 200)))?;

        if let Some(err) = parsed.error {
            return Err(ProviderError::Api(err.message));
        }

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Unparseable("response contained no choices".to_string()))
    }
}

/// Resolves query intent against a ticket collection via the LLM
#[derive(Clone)]
pub struct IntentResolver {
    client: LlmClient,
}

impl IntentResolver {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    /// Ask the model which tickets match the query. The returned subset
    /// follows the input collection's order, never the model's.
    pub async fn resolve(
        &self,
        query: &str,
        tickets: &[Ticket],
    ) -> std::result::Result<Vec<Ticket>, ProviderError> {
        let prompt = build_filter_prompt(query, tickets);
        let content = self.client.chat_completion(SYSTEM_PROMPT, &prompt).await?;
        let ids = extract_ids(&content)?;

        tracing::debug!(
            extracted = ids.len(),
            "Parsed matching ticket ids from provider response"
        );

        let id_set: HashSet<&str> = ids.iter().map(String::as_str).collect();
        Ok(tickets
            .iter()
            .filter(|t| id_set.contains(t.id.as_str()))
            .cloned()
            .collect())
    }
}

/// Serialize the whole ticket collection plus the query into a single
/// user message, asking for a bare JSON array of matching ids.
fn build_filter_prompt(query: &str, tickets: &[Ticket]) -> String {
    let mut prompt = format!(
        "Given this natural language query: \"{query}\"\n\n\
         Analyze these service desk tickets and return only those that match the query intent.\n\n\
         Tickets to analyze:\n"
    );

    for ticket in tickets {
        prompt.push_str(&format!(
            "\nID: {}\nKey: {}\nSummary: {}\nStatus: {}\nRoot Cause: {}\nDescription: {}\nCreated: {}\n---",
            ticket.id,
            ticket.key,
            ticket.summary,
            ticket.status,
            ticket.root_cause,
            ticket.description.as_deref().unwrap_or("(none)"),
            ticket.created.to_rfc3339(),
        ));
    }

    prompt.push_str(
        "\n\nReturn ONLY a JSON array of matching ticket ids. For example: [\"3\", \"9\"]\n\
         Do not include any explanation, just the JSON array.",
    );
    prompt
}

/// Extract matching ids from the model's response text: a direct JSON
/// array parse first, then a best-effort sweep of contiguous digit runs.
/// Duplicates are removed, first occurrence kept.
fn extract_ids(content: &str) -> std::result::Result<Vec<String>, ProviderError> {
    let trimmed = content.trim();

    if let Ok(values) = serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
        let ids = dedup(values.into_iter().filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }));
        return Ok(ids);
    }

    let ids = dedup(DIGIT_RUNS.find_iter(trimmed).map(|m| m.as_str().to_string()));
    if ids.is_empty() {
        return Err(ProviderError::Unparseable(truncate(trimmed, 200)));
    }
    Ok(ids)
}

fn dedup(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(id.clone())).collect()
}

fn is_placeholder(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || PLACEHOLDER_KEYS.contains(&key)
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            key: format!("JSD-{id}"),
            summary: "summary".to_string(),
            status: "Open".to_string(),
            created: Utc::now(),
            root_cause: "cause".to_string(),
            description: None,
        }
    }

    #[test]
    fn test_extract_ids_json_array() {
        let ids = extract_ids(r#"["3","9","21"]"#).unwrap();
        assert_eq!(ids, vec!["3", "9", "21"]);
    }

    #[test]
    fn test_extract_ids_numeric_json_array() {
        let ids = extract_ids("[3, 9, 21]").unwrap();
        assert_eq!(ids, vec!["3", "9", "21"]);
    }

    #[test]
    fn test_extract_ids_digit_runs_from_prose() {
        let ids = extract_ids("Sure! Tickets 13 and 9 look relevant.").unwrap();
        assert_eq!(ids, vec!["13", "9"]);
    }

    #[test]
    fn test_extract_ids_dedups_preserving_first_occurrence() {
        let ids = extract_ids("9 and 9 and 13").unwrap();
        assert_eq!(ids, vec!["9", "13"]);
    }

    #[test]
    fn test_extract_ids_unparseable() {
        let err = extract_ids("none of these match, sorry").unwrap_err();
        assert_eq!(err.cause(), "unparseable");
    }

    #[test]
    fn test_placeholder_keys_are_dropped() {
        let config = LlmConfig::default();
        for key in ["", "  ", "your_api_key_here", "changeme"] {
            let client = LlmClient::new(config.clone(), Some(key.to_string())).unwrap();
            assert!(!client.has_credential(), "{key:?} should not count");
        }
        let client = LlmClient::new(config, Some("sk-real-key".to_string())).unwrap();
        assert!(client.has_credential());
    }

    #[tokio::test]
    async fn test_missing_credential_fails_fast() {
        let client = LlmClient::new(LlmConfig::default(), None).unwrap();
        let resolver = IntentResolver::new(client);
        let err = resolver.resolve("critical", &[ticket("1")]).await.unwrap_err();
        assert_eq!(err.cause(), "missing_credential");
    }

    #[test]
    fn test_filter_prompt_enumerates_tickets() {
        let tickets = vec![ticket("4"), ticket("5")];
        let prompt = build_filter_prompt("security issues", &tickets);
        assert!(prompt.contains("\"security issues\""));
        assert!(prompt.contains("ID: 4"));
        assert!(prompt.contains("Key: JSD-5"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "ééééé";
        let t = truncate(s, 3);
        assert!(t.ends_with("..."));
    }
}
