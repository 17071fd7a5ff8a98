//! Shared test utilities for integration tests.
//!
//! Provides a `TestClient` that drives the JSON API against an in-memory
//! database, plus helpers to seed periods and expenses.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use outlay::config::Config;
use outlay::db::{create_in_memory_pool, migrations};
use outlay::handlers;
use outlay::state::AppState;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestClient {
    state: AppState,
}

impl TestClient {
    /// Fresh in-memory database with migrations applied.
    pub fn new() -> Self {
        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        {
            let conn = pool.get().expect("Failed to get connection");
            migrations::run_migrations(&conn, Path::new("migrations"))
                .expect("Failed to run migrations");
        }

        let config = Config {
            host: "127.0.0.1".into(),
            port: 7080,
            database_path: PathBuf::from(":memory:"),
            migrations_path: PathBuf::from("migrations"),
            chart_dir: PathBuf::from("data/charts"),
        };

        let state = AppState {
            db: pool,
            config: Arc::new(config),
        };

        Self { state }
    }

    pub fn router(&self) -> Router {
        handlers::routes().with_state(self.state.clone())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, uri: &str) -> (StatusCode, Option<T>) {
        let (status, body) = self.get(uri).await;
        (status, serde_json::from_str(&body).ok())
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, String) {
        self.send_json("POST", uri, body).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> (StatusCode, String) {
        self.send_json("PUT", uri, body).await
    }

    async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, String) {
        let response = self
            .router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        let response = self
            .router()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response.status()
    }

    /// Create a budget period, returning its id.
    pub async fn create_period(&self, month_year: &str, budgeted_cents: i64) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/periods",
                serde_json::json!({
                    "month_year": month_year,
                    "budgeted_cents": budgeted_cents,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create_period failed: {}", body);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        value["id"].as_i64().unwrap()
    }

    /// Create an expense, returning its id.
    pub async fn create_expense(
        &self,
        period_id: i64,
        date: &str,
        amount_cents: i64,
        category: &str,
    ) -> i64 {
        let (status, body) = self
            .post_json(
                "/api/expenses",
                serde_json::json!({
                    "date": date,
                    "amount_cents": amount_cents,
                    "category": category,
                    "description": format!("{} on {}", category, date),
                    "period_id": period_id,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create_expense failed: {}", body);

        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        value["id"].as_i64().unwrap()
    }
}
