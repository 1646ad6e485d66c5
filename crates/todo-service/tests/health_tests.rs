//! Operational endpoint integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use reqwest::StatusCode;
use sqlx::PgPool;
use todo_test_utils::TestTodoServer;

#[sqlx::test(migrations = "../../migrations")]
async fn test_health_returns_ok(pool: PgPool) -> Result<()> {
    let server = TestTodoServer::spawn(pool).await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ready_checks_database(pool: PgPool) -> Result<()> {
    let server = TestTodoServer::spawn(pool).await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "healthy");
    assert!(body.get("error").is_none());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_ready_reports_unavailable_database(pool: PgPool) -> Result<()> {
    let server = TestTodoServer::spawn(pool.clone()).await?;
    pool.close().await;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["error"], "Service dependencies unavailable");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_operational_endpoints_need_no_token(pool: PgPool) -> Result<()> {
    let server = TestTodoServer::spawn(pool).await?;

    for endpoint in ["/health", "/ready", "/metrics"] {
        let response = reqwest::get(format!("{}{}", server.url(), endpoint)).await?;
        assert_eq!(response.status(), StatusCode::OK, "{endpoint}");
    }
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_metrics_endpoint_serves_prometheus_text(pool: PgPool) -> Result<()> {
    let server = TestTodoServer::spawn(pool).await?;

    // Generate at least one recorded request first.
    reqwest::get(format!("{}/health", server.url())).await?;

    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await?;
    assert!(body.contains("todo_http_requests_total"));
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_unknown_route_is_not_found(pool: PgPool) -> Result<()> {
    let server = TestTodoServer::spawn(pool).await?;

    let response = reqwest::get(format!("{}/lists", server.url())).await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
