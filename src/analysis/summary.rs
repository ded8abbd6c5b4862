//! Executive summary generation over a ticket subset.
//!
//! Two paths: a deterministic templated report built from status and
//! root-cause theme counts, and a prompt for the richer LLM-written
//! analysis. The templated report is also the fallback when the
//! provider is unavailable, mirroring the query-filter policy.

use crate::models::Ticket;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use uuid::Uuid;

/// System instruction for the LLM analysis path
pub const ANALYSIS_SYSTEM_PROMPT: &str = "You are an expert IT operations \
analyst specializing in incident management and root cause analysis. Your \
task is to analyze service desk tickets and provide executive-level insights.";

/// Root-cause theme buckets counted by the templated report
const THEMES: &[(&str, &[&str])] = &[
    ("Memory management", &["memory", "java", "heap", "jvm"]),
    ("Log volume and disk capacity", &["log", "disk", "storage", "space"]),
    (
        "Security exposure",
        &["security", "vulnerab", "unauthorized", "patch", "injection"],
    ),
    ("Network and connectivity", &["network", "connection"]),
];

/// A generated executive summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub ticket_count: usize,
    pub text: String,
}

impl ExecutiveSummary {
    /// Build a deterministic, offline summary of a ticket subset.
    /// Counts per status label and per root-cause theme, formatted as an
    /// executive-level text block.
    pub fn generate(tickets: &[Ticket]) -> Self {
        let mut status_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for ticket in tickets {
            *status_counts.entry(ticket.status.as_str()).or_default() += 1;
        }

        let mut theme_counts: Vec<(&str, usize)> = THEMES
            .iter()
            .map(|(name, needles)| {
                let count = tickets
                    .iter()
                    .filter(|t| {
                        let text =
                            format!("{} {}", t.summary, t.root_cause).to_lowercase();
                        needles.iter().any(|n| text.contains(n))
                    })
                    .count();
                (*name, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        theme_counts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut text = String::new();
        let _ = writeln!(text, "EXECUTIVE SUMMARY");
        let _ = writeln!(text);
        let _ = writeln!(text, "Tickets in scope: {}", tickets.len());
        let _ = writeln!(text);

        let _ = writeln!(text, "By status:");
        if status_counts.is_empty() {
            let _ = writeln!(text, "  (none)");
        }
        for (status, count) in &status_counts {
            let _ = writeln!(text, "  {status}: {count}");
        }
        let _ = writeln!(text);

        let _ = writeln!(text, "Key themes:");
        if theme_counts.is_empty() {
            let _ = writeln!(text, "  No recurring root-cause themes identified.");
        }
        for (theme, count) in &theme_counts {
            let _ = writeln!(text, "  {theme}: {count} ticket(s)");
        }

        if let Some((top_theme, count)) = theme_counts.first() {
            let _ = writeln!(text);
            let _ = writeln!(
                text,
                "Priority focus: {top_theme} ({count} of {} tickets). \
                 Recommend a dedicated remediation workstream.",
                tickets.len()
            );
        }

        Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            ticket_count: tickets.len(),
            text,
        }
    }
}

/// Build the user prompt for the LLM-written analysis of a ticket
/// subset: key themes, root causes, business impact, recommendations,
/// and priority focus areas.
pub fn analysis_prompt(tickets: &[Ticket]) -> String {
    let ticket_lines: String = tickets
        .iter()
        .map(|t| {
            format!(
                "- {}: {} (Status: {}, Root Cause: {})\n",
                t.key, t.summary, t.status, t.root_cause
            )
        })
        .collect();

    format!(
        "Please analyze the following {count} service desk tickets and provide an executive summary:\n\n\
         TICKETS:\n{ticket_lines}\n\
         Please provide an analysis that includes:\n\n\
         1. **Key Themes Identified**: What are the main patterns or categories of issues?\n\n\
         2. **Root Cause Analysis**:\n\
            - What are the primary root causes driving these incidents?\n\
            - How frequently does each root cause appear?\n\n\
         3. **Business Impact Assessment**:\n\
            - What types of business operations are being affected?\n\
            - Which issues pose the highest risk?\n\n\
         4. **Recommendations**:\n\
            - What immediate actions should be taken?\n\
            - What strategic initiatives would prevent future occurrences?\n\n\
         5. **Priority Focus Areas**: What should leadership prioritize to address these systemic issues?\n\n\
         Format your response as a clear, executive-level summary suitable for senior management. \
         Use bullet points and clear headings. Keep the tone professional and action-oriented.",
        count = tickets.len(),
    )
}
