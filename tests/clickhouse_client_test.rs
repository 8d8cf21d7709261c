//! Integration tests for the ClickHouse HTTP client against a mock server

use batch_export::adapters::clickhouse::{AnalyticalStore, ClickHouseClient, Statement};
use batch_export::config::{secret_string, ClickHouseConfig};
use batch_export::domain::ExportError;
use mockito::{Matcher, Server};

fn client_for(server: &Server) -> ClickHouseClient {
    client_at(server.url())
}

fn client_at(url: String) -> ClickHouseClient {
    ClickHouseClient::new(ClickHouseConfig {
        url,
        user: "exporter".to_string(),
        password: Some(secret_string("s3cret".to_string())),
        database: "posthog".to_string(),
        timeout_seconds: 5,
        tls_verify: true,
    })
    .unwrap()
}

fn count_statement() -> Statement {
    Statement::new("SELECT count(*) FROM events WHERE team_id = {team_id:Int64}")
        .bind("team_id", 2)
}

#[tokio::test]
async fn test_ping_reports_alive() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/ping")
        .with_status(200)
        .with_body("Ok.\n")
        .create_async()
        .await;

    assert!(client_for(&server).is_alive().await);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_ping_failure_reports_not_alive() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/ping")
        .with_status(503)
        .create_async()
        .await;

    assert!(!client_for(&server).is_alive().await);
}

#[tokio::test]
async fn test_fetch_count_sends_bound_parameters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("database".into(), "posthog".into()),
            Matcher::UrlEncoded("default_format".into(), "TabSeparated".into()),
            Matcher::UrlEncoded("param_team_id".into(), "2".into()),
        ]))
        .match_header("X-ClickHouse-User", "exporter")
        .match_header("X-ClickHouse-Key", "s3cret")
        .match_body(Matcher::Regex(r"^SELECT count\(\*\) FROM events".into()))
        .with_status(200)
        .with_body("10\n")
        .create_async()
        .await;

    let count = client_for(&server)
        .fetch_count(&count_statement())
        .await
        .unwrap();

    assert_eq!(count, Some(10));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_count_null_result_is_none() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("\\N\n")
        .create_async()
        .await;

    let count = client_for(&server)
        .fetch_count(&count_statement())
        .await
        .unwrap();

    assert_eq!(count, None);
}

#[tokio::test]
async fn test_server_error_is_query_error() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Code: 60. DB::Exception: Table posthog.events does not exist")
        .create_async()
        .await;

    let err = client_for(&server)
        .execute(&Statement::new("INSERT INTO FUNCTION s3({path:String}) SELECT 1"))
        .await
        .unwrap_err();

    match err {
        ExportError::Query(message) => {
            assert!(message.contains("500"));
            assert!(message.contains("Code: 60"));
        }
        other => panic!("expected a query error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_execute_has_no_default_format() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("database".into(), "posthog".into()),
            Matcher::UrlEncoded("param_path".into(), "http://object-storage:19000/b/k.csv".into()),
        ]))
        .with_status(200)
        .create_async()
        .await;

    client_for(&server)
        .execute(
            &Statement::new("INSERT INTO FUNCTION s3({path:String}) SELECT 1")
                .bind("path", "http://object-storage:19000/b/k.csv"),
        )
        .await
        .unwrap();

    mock.assert_async().await;
}

#[tokio::test]
async fn test_path_prefix_is_kept() {
    let mut server = Server::new_async().await;
    let ping = server
        .mock("GET", "/clickhouse/ping")
        .with_status(200)
        .with_body("Ok.\n")
        .create_async()
        .await;
    let query = server
        .mock("POST", "/clickhouse/")
        .match_query(Matcher::UrlEncoded("database".into(), "posthog".into()))
        .with_status(200)
        .with_body("3\n")
        .create_async()
        .await;

    let client = client_at(format!("{}/clickhouse", server.url()));

    assert!(client.is_alive().await);
    assert_eq!(
        client.fetch_count(&count_statement()).await.unwrap(),
        Some(3)
    );
    ping.assert_async().await;
    query.assert_async().await;
}
