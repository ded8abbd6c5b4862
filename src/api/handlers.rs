use crate::analysis::{analysis_prompt, ExecutiveSummary, ANALYSIS_SYSTEM_PROMPT};
use crate::api::AppState;
use crate::error::Result;
use crate::models::{Provenance, Ticket};
use crate::store::{parse_date_bound, parse_jql_range};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Note attached to query responses produced by the keyword fallback
const FALLBACK_NOTE: &str =
    "LLM filtering unavailable; results produced by keyword matching.";

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Simulated Jira JQL search: only `created >=` / `created <=` clauses
/// are honored, everything else in the JQL is ignored
pub async fn mock_search(
    State(state): State<AppState>,
    Query(params): Query<MockSearchQuery>,
) -> Result<Json<MockSearchResponse>> {
    let range = match params.jql.as_deref() {
        Some(jql) => parse_jql_range(jql)?,
        None => Default::default(),
    };

    let issues = state.store.search_created_between(range.start, range.end);

    tracing::debug!(
        matched = issues.len(),
        total = state.store.len(),
        "Mock JQL search"
    );

    Ok(Json(MockSearchResponse { issues }))
}

#[derive(Debug, Deserialize)]
pub struct MockSearchQuery {
    pub jql: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MockSearchResponse {
    pub issues: Vec<Ticket>,
}

/// List tickets created within a date range
pub async fn list_tickets(
    State(state): State<AppState>,
    Json(request): Json<TicketRangeRequest>,
) -> Result<Json<TicketListResponse>> {
    request.validate()?;

    let start = parse_date_bound(&request.start_date, false)?;
    let end = parse_date_bound(&request.end_date, true)?;
    let tickets = state.store.search_created_between(Some(start), Some(end));
    let count = tickets.len();

    Ok(Json(TicketListResponse { tickets, count }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketRangeRequest {
    #[validate(length(min = 1))]
    pub start_date: String,
    #[validate(length(min = 1))]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub tickets: Vec<Ticket>,
    pub count: usize,
}

/// Resolve a natural-language query against the ticket store.
///
/// Always answers 200 with a (possibly empty) subset for a valid query;
/// `note` is present only when the keyword fallback produced the result.
pub async fn resolve_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let result = state
        .resolver
        .resolve_query(&request.query, state.store.tickets())
        .await?;

    let note = result.is_fallback().then(|| FALLBACK_NOTE.to_string());
    let count = result.tickets.len();

    Ok(Json(QueryResponse {
        query: request.query,
        tickets: result.tickets,
        count,
        provenance: result.provenance,
        note,
    }))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub tickets: Vec<Ticket>,
    pub count: usize,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Generate an executive summary, optionally scoped to the subset
/// matching a natural-language query. The LLM-written analysis is
/// attempted first; any provider failure falls back to the templated
/// report, same policy as the query filter.
pub async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<SummaryRequest>,
) -> Result<Json<SummaryResponse>> {
    let tickets = match request.query.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => {
            state
                .resolver
                .resolve_query(query, state.store.tickets())
                .await?
                .tickets
        }
        _ => state.store.tickets().to_vec(),
    };

    let llm = state.resolver.llm_client();
    match llm
        .chat_completion(ANALYSIS_SYSTEM_PROMPT, &analysis_prompt(&tickets))
        .await
    {
        Ok(text) => Ok(Json(SummaryResponse {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            ticket_count: tickets.len(),
            summary: text,
            source: SummarySource::Llm,
        })),
        Err(e) => {
            tracing::warn!(
                cause = e.cause(),
                error = %e,
                "LLM analysis failed, using templated summary"
            );
            let report = ExecutiveSummary::generate(&tickets);
            Ok(Json(SummaryResponse {
                id: report.id,
                generated_at: report.generated_at,
                ticket_count: report.ticket_count,
                summary: report.text,
                source: SummarySource::Template,
            }))
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct SummaryRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub ticket_count: usize,
    pub summary: String,
    pub source: SummarySource,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    Llm,
    Template,
}
