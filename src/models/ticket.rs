use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// A service-desk ticket. Tickets are immutable inputs to the filtering
/// core; no mutation occurs after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier within a collection
    pub id: String,

    /// Display key (e.g. JSD-104)
    pub key: String,

    /// Human-readable summary
    pub summary: String,

    /// Status label (open-ended set: Open, Critical, In Progress, ...)
    pub status: String,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Root cause text
    pub root_cause: String,

    /// Optional long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Marker for which resolution path produced a filtered subset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Provenance {
    /// The LLM intent resolver matched the query
    #[serde(rename = "llm")]
    #[strum(serialize = "llm")]
    Llm,

    /// The deterministic keyword filter was used instead
    #[serde(rename = "keyword-fallback")]
    #[strum(serialize = "keyword-fallback")]
    KeywordFallback,
}

/// Outcome of resolving a natural-language query against a ticket
/// collection: an order-preserved subsequence of the input plus the
/// path that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub tickets: Vec<Ticket>,
    pub provenance: Provenance,
}

impl MatchResult {
    pub fn new(tickets: Vec<Ticket>, provenance: Provenance) -> Self {
        Self {
            tickets,
            provenance,
        }
    }

    /// True when the keyword fallback produced this result
    pub fn is_fallback(&self) -> bool {
        self.provenance == Provenance::KeywordFallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_wire_format() {
        let json = r#"{
            "id": "4",
            "key": "JSD-104",
            "summary": "Increasing response time in API endpoints",
            "status": "Open",
            "created": "2025-09-02T11:20:00.000Z",
            "rootCause": "Java application memory management failure"
        }"#;

        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.id, "4");
        assert_eq!(ticket.root_cause, "Java application memory management failure");
        assert!(ticket.description.is_none());

        let out = serde_json::to_value(&ticket).unwrap();
        assert!(out.get("rootCause").is_some());
        assert!(out.get("description").is_none());
    }

    #[test]
    fn test_provenance_wire_names() {
        assert_eq!(
            serde_json::to_value(Provenance::Llm).unwrap(),
            serde_json::json!("llm")
        );
        assert_eq!(
            serde_json::to_value(Provenance::KeywordFallback).unwrap(),
            serde_json::json!("keyword-fallback")
        );
        assert_eq!(Provenance::KeywordFallback.to_string(), "keyword-fallback");
    }

    #[test]
    fn test_match_result_fallback_flag() {
        let result = MatchResult::new(vec![], Provenance::KeywordFallback);
        assert!(result.is_fallback());
        let result = MatchResult::new(vec![], Provenance::Llm);
        assert!(!result.is_fallback());
    }
}
