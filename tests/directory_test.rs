use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param, query_param_contains};
use wiremock::{Mock, MockServer, ResponseTemplate};

use duochat::auth::{Identity, Session};
use duochat::config::ClientOptions;
use duochat::error::Error;
use duochat::Duochat;

fn client(server: &MockServer, page_size: u32) -> Duochat {
    let options = ClientOptions::default()
        .with_database_id("db")
        .with_directory_page_size(page_size);
    let client = Duochat::new_with_options(&server.uri(), "test-key", options);
    client
        .account()
        .set_session(Session::new("token".to_string(), "u1".to_string(), 3600));
    client
}

fn user_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "$id": id,
        "userId": id,
        "email": format!("{}@example.com", id),
        "name": name,
        "registrationDate": "2026-01-01T00:00:00Z",
        "lastLogin": "2026-01-01T00:00:00Z",
        "provider": "github",
    })
}

const USERS_PATH: &str = "/v1/databases/db/collections/users/documents";

#[tokio::test]
async fn list_walks_pages_and_dedups_by_identity_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .and(query_param(
            "queries[]",
            r#"{"method":"offset","values":[0]}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "documents": [user_json("u1", "Ada"), user_json("u2", "Grace")],
        })))
        .mount(&server)
        .await;

    // Second page repeats u2, which the client must drop
    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .and(query_param(
            "queries[]",
            r#"{"method":"offset","values":[2]}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "documents": [user_json("u2", "Grace")],
        })))
        .mount(&server)
        .await;

    let records = client(&server, 2).directory().list().await.unwrap();

    let ids: Vec<_> = records.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2"]);
}

#[tokio::test]
async fn page_cursor_is_restartable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .and(query_param(
            "queries[]",
            r#"{"method":"offset","values":[0]}"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [user_json("u1", "Ada")],
        })))
        .expect(2)
        .mount(&server)
        .await;

    let directory = client(&server, 2).directory();
    let mut pages = directory.pages(2);

    let first = pages.next_page().await.unwrap().unwrap();
    assert_eq!(first.len(), 1);
    assert!(pages.next_page().await.unwrap().is_none());

    pages.rewind();
    let again = pages.next_page().await.unwrap().unwrap();
    assert_eq!(again[0].user_id, "u1");
}

#[tokio::test]
async fn get_by_id_maps_missing_document_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{}/u9", USERS_PATH)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Document with the requested ID could not be found.",
            "code": 404,
            "type": "document_not_found",
        })))
        .mount(&server)
        .await;

    let err = client(&server, 2)
        .directory()
        .get_by_id("u9")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn search_queries_name_and_email_remotely() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .and(query_param_contains("queries[]", "\"method\":\"search\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "documents": [user_json("u2", "Grace")],
        })))
        .mount(&server)
        .await;

    let records = client(&server, 2).directory().search("gra").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name.as_deref(), Some("Grace"));
}

#[tokio::test]
async fn empty_search_term_is_rejected_without_a_request() {
    let server = MockServer::start().await;

    let err = client(&server, 2)
        .directory()
        .search("  ")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn provision_uses_the_identity_id_as_document_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .and(body_partial_json(json!({
            "documentId": "u1",
            "data": { "userId": "u1", "provider": "github" },
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json("u1", "Ada")))
        .mount(&server)
        .await;

    let identity = Identity {
        id: "u1".to_string(),
        email: Some("u1@example.com".to_string()),
        name: Some("Ada".to_string()),
    };
    let record = client(&server, 2)
        .directory()
        .provision(&identity, "github")
        .await
        .unwrap();

    assert_eq!(record.id, "u1");
    assert_eq!(record.user_id, "u1");
    assert_eq!(record.provider, "github");
}
