//! Integration tests for the query-filtering subsystem: LLM-primary
//! resolution against a mocked provider, keyword fallback on every
//! failure cause, and the ticket-matching contract.

use chrono::Utc;
use desk_analytics::config::LlmConfig;
use desk_analytics::filter::{filter_by_keywords, LlmClient, QueryResolver};
use desk_analytics::models::{Provenance, Ticket};

fn ticket(id: u32) -> Ticket {
    Ticket {
        id: id.to_string(),
        key: format!("JSD-{}", 100 + id),
        summary: format!("Ticket {id}"),
        status: "Open".to_string(),
        created: Utc::now(),
        root_cause: "Generic cause".to_string(),
        description: None,
    }
}

fn tickets_1_to_21() -> Vec<Ticket> {
    (1..=21).map(ticket).collect()
}

fn llm_config(server: &mockito::Server) -> LlmConfig {
    LlmConfig {
        api_url: format!("{}/v1/chat/completions", server.url()),
        request_timeout_secs: 5,
        resolve_timeout_secs: 5,
        ..LlmConfig::default()
    }
}

fn resolver_for(server: &mockito::Server, api_key: Option<&str>) -> QueryResolver {
    let config = llm_config(server);
    let client = LlmClient::new(config.clone(), api_key.map(String::from)).unwrap();
    QueryResolver::new(client, &config)
}

fn chat_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

#[tokio::test]
async fn llm_json_array_selects_tickets_in_collection_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_body(r#"["3","9","21"]"#))
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("anything", &tickets).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.provenance, Provenance::Llm);
    let ids: Vec<&str> = result.tickets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "9", "21"]);
}

#[tokio::test]
async fn llm_model_order_does_not_leak_into_result() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(chat_body(r#"["21","3","9"]"#))
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("anything", &tickets).await.unwrap();

    // Input collection order, not the model's listing order
    let ids: Vec<&str> = result.tickets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["3", "9", "21"]);
}

#[tokio::test]
async fn llm_prose_response_falls_back_to_digit_extraction() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(chat_body(
            "I think ticket 13 matches, and possibly ticket 9 as well.",
        ))
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("anything", &tickets).await.unwrap();

    assert_eq!(result.provenance, Provenance::Llm);
    let ids: Vec<&str> = result.tickets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["9", "13"]);
}

#[tokio::test]
async fn provider_http_error_triggers_keyword_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let tickets = vec![
        Ticket {
            id: "1".to_string(),
            key: "JSD-101".to_string(),
            summary: "Failover triggered".to_string(),
            status: "Critical".to_string(),
            created: Utc::now(),
            root_cause: "Java heap space memory leak".to_string(),
            description: None,
        },
        Ticket {
            id: "2".to_string(),
            key: "JSD-102".to_string(),
            summary: "Route flap".to_string(),
            status: "Open".to_string(),
            created: Utc::now(),
            root_cause: "BGP routing convergence".to_string(),
            description: None,
        },
    ];

    let resolver = resolver_for(&server, Some("sk-test"));
    let result = resolver.resolve_query("memory", &tickets).await.unwrap();

    assert_eq!(result.provenance, Provenance::KeywordFallback);
    assert_eq!(result.tickets, filter_by_keywords("memory", &tickets));
    let ids: Vec<&str> = result.tickets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["1"]);
}

#[tokio::test]
async fn embedded_provider_error_payload_triggers_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(r#"{"error": {"message": "You exceeded your current quota"}}"#)
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("open tickets", &tickets).await.unwrap();

    assert_eq!(result.provenance, Provenance::KeywordFallback);
    // Every fixture ticket has status Open
    assert_eq!(result.tickets.len(), tickets.len());
}

#[tokio::test]
async fn unparseable_response_without_digits_triggers_fallback() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(chat_body("No tickets appear to match your query."))
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("open", &tickets).await.unwrap();

    assert_eq!(result.provenance, Provenance::KeywordFallback);
}

#[tokio::test]
async fn slow_provider_exceeds_resolver_bound_and_falls_back() {
    use std::io::Write;

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_chunked_body(|writer| {
            // Answer well after the resolver's bound has expired
            std::thread::sleep(std::time::Duration::from_secs(3));
            writer.write_all(chat_body(r#"["3"]"#).as_bytes())
        })
        .create_async()
        .await;

    let config = LlmConfig {
        api_url: format!("{}/v1/chat/completions", server.url()),
        // Client-level timeout stays generous so the orchestrator's own
        // bound is the one that fires
        request_timeout_secs: 30,
        resolve_timeout_secs: 1,
        ..LlmConfig::default()
    };
    let client = LlmClient::new(config.clone(), Some("sk-test".to_string())).unwrap();
    let resolver = QueryResolver::new(client, &config);

    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("open", &tickets).await.unwrap();

    assert_eq!(result.provenance, Provenance::KeywordFallback);
    assert_eq!(result.tickets, filter_by_keywords("open", &tickets));
}

#[tokio::test]
async fn missing_credential_never_reaches_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let resolver = resolver_for(&server, None);
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("open", &tickets).await.unwrap();

    mock.assert_async().await;
    assert_eq!(result.provenance, Provenance::KeywordFallback);
}

#[tokio::test]
async fn placeholder_credential_behaves_as_missing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("your_api_key_here"));
    let result = resolver
        .resolve_query("critical", &tickets_1_to_21())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(result.provenance, Provenance::KeywordFallback);
}

#[tokio::test]
async fn empty_query_is_invalid_and_performs_no_filtering() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let err = resolver
        .resolve_query("", &tickets_1_to_21())
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err.error_code(), "INVALID_QUERY");
}

#[tokio::test]
async fn result_is_always_a_subsequence_of_the_input() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        // Ids the collection does not contain must be ignored, never
        // fabricated into tickets
        .with_body(chat_body(r#"["2", "99", "5", "1000"]"#))
        .create_async()
        .await;

    let resolver = resolver_for(&server, Some("sk-test"));
    let tickets = tickets_1_to_21();
    let result = resolver.resolve_query("anything", &tickets).await.unwrap();

    let ids: Vec<&str> = result.tickets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "5"]);
    for t in &result.tickets {
        assert!(tickets.iter().any(|orig| orig == t));
    }
}
