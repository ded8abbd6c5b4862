//! Deterministic keyword filter, the offline fallback for the LLM path.
//!
//! The rule set is data, not branching code: an ordered list of
//! (trigger words, match target) pairs evaluated first-match-wins.
//! Ordering is deliberate because a query like "critical memory leaks"
//! triggers both a status rule and a topic rule; the status rule must
//! win.

use crate::models::Ticket;

/// Which ticket fields a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchTarget {
    /// The status label
    Status,
    /// Summary and root-cause text
    Content,
}

/// One category rule: fires when any trigger word appears in the query,
/// then selects tickets whose target field contains any needle.
struct KeywordRule {
    name: &'static str,
    triggers: &'static [&'static str],
    target: MatchTarget,
    needles: &'static [&'static str],
}

impl KeywordRule {
    fn triggered_by(&self, query: &str) -> bool {
        self.triggers.iter().any(|t| query.contains(t))
    }

    fn matches(&self, ticket: &Ticket) -> bool {
        match self.target {
            MatchTarget::Status => {
                let status = ticket.status.to_lowercase();
                self.needles.iter().any(|n| status.contains(n))
            }
            MatchTarget::Content => {
                let summary = ticket.summary.to_lowercase();
                let root_cause = ticket.root_cause.to_lowercase();
                self.needles
                    .iter()
                    .any(|n| summary.contains(n) || root_cause.contains(n))
            }
        }
    }
}

/// Category rules in priority order; the first triggered rule wins.
const RULES: &[KeywordRule] = &[
    KeywordRule {
        name: "status-critical",
        triggers: &["critical", "urgent"],
        target: MatchTarget::Status,
        needles: &["critical", "urgent"],
    },
    KeywordRule {
        name: "status-open",
        triggers: &["open", "new"],
        target: MatchTarget::Status,
        needles: &["open", "new"],
    },
    KeywordRule {
        name: "status-in-progress",
        triggers: &["progress"],
        target: MatchTarget::Status,
        needles: &["progress"],
    },
    KeywordRule {
        name: "topic-security",
        triggers: &["security"],
        target: MatchTarget::Content,
        needles: &["security"],
    },
    KeywordRule {
        name: "topic-memory",
        triggers: &["memory", "java"],
        target: MatchTarget::Content,
        needles: &["memory", "java"],
    },
    KeywordRule {
        name: "topic-network",
        triggers: &["network", "connection"],
        target: MatchTarget::Content,
        needles: &["network", "connection"],
    },
];

/// Filter a ticket collection by fixed keyword rules. Always succeeds
/// and preserves the input order; when no category rule is triggered,
/// the whole query is matched as a substring of summary or root cause.
pub fn filter_by_keywords(query: &str, tickets: &[Ticket]) -> Vec<Ticket> {
    let query = query.to_lowercase();

    for rule in RULES {
        if rule.triggered_by(&query) {
            tracing::debug!(rule = rule.name, "Keyword rule triggered");
            return tickets
                .iter()
                .filter(|t| rule.matches(t))
                .cloned()
                .collect();
        }
    }

    tracing::debug!("No keyword rule triggered, using generic substring match");
    tickets
        .iter()
        .filter(|t| {
            t.summary.to_lowercase().contains(&query)
                || t.root_cause.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}
