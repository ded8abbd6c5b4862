//! In-memory ticket store and the mock Jira date-range search.
//!
//! The store is constructed once in `main` and injected through the
//! application state; the filtering core only ever reads from it.

use crate::error::{AppError, Result};
use crate::models::Ticket;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static JQL_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"created >= "([^"]+)""#).expect("static JQL start pattern")
});
static JQL_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"created <= "([^"]+)""#).expect("static JQL end pattern")
});

/// Read-only, insertion-ordered collection of tickets
#[derive(Debug, Clone)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
}

impl TicketStore {
    /// Create a store from an explicit ticket collection
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self { tickets }
    }

    /// Load the embedded demo fixture set
    pub fn with_mock_data() -> Result<Self> {
        let tickets: Vec<Ticket> = serde_json::from_str(include_str!("mock_tickets.json"))?;
        Ok(Self::new(tickets))
    }

    /// All tickets, in insertion order
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Tickets created within the inclusive `[start, end]` range, in
    /// insertion order. An absent bound leaves that side open.
    pub fn search_created_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<Ticket> {
        self.tickets
            .iter()
            .filter(|t| start.map_or(true, |s| t.created >= s))
            .filter(|t| end.map_or(true, |e| t.created <= e))
            .cloned()
            .collect()
    }
}

/// Bounds extracted from a simulated JQL string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Extract `created >= "..."` / `created <= "..."` bounds from a JQL
/// string. Missing or unreadable clauses leave the bound open, matching
/// the mock backend the frontend was written against.
pub fn parse_jql_range(jql: &str) -> Result<DateRange> {
    let start = match JQL_START.captures(jql) {
        Some(caps) => Some(parse_date_bound(&caps[1], false)?),
        None => None,
    };
    let end = match JQL_END.captures(jql) {
        Some(caps) => Some(parse_date_bound(&caps[1], true)?),
        None => None,
    };
    Ok(DateRange { start, end })
}

/// Parse a range bound that is either a full RFC 3339 instant or a bare
/// `YYYY-MM-DD` date. Bare end dates extend to the end of that day so a
/// date-only range stays inclusive on both sides.
pub fn parse_date_bound(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {raw}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN)
    } else {
        NaiveTime::MIN
    };
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}
