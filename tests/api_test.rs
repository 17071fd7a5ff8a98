//! Integration tests for the JSON data service.

mod common;

use axum::http::StatusCode;
use common::TestClient;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct CategoryTotal {
    category: String,
    total_cents: i64,
    month_year: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Period {
    id: i64,
    month_year: String,
    budgeted_cents: i64,
    remaining_cents: i64,
}

#[tokio::test]
async fn health_check() {
    let client = TestClient::new();
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn category_totals_empty_period() {
    let client = TestClient::new();
    let period = client.create_period("2026-03-01", 100_000).await;

    let (status, body) = client
        .get(&format!("/api/expenses/category-totals?period_id={}", period))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
}

#[tokio::test]
async fn category_totals_aggregate_in_insertion_order() {
    let client = TestClient::new();
    let period = client.create_period("2026-03-01", 100_000).await;

    client.create_expense(period, "2026-03-02", 5000, "Food").await;
    client.create_expense(period, "2026-03-05", 2000, "Travel").await;
    client.create_expense(period, "2026-03-09", 3000, "Food").await;

    let (status, totals): (_, Option<Vec<CategoryTotal>>) = client
        .get_json(&format!("/api/expenses/category-totals?period_id={}", period))
        .await;
    assert_eq!(status, StatusCode::OK);

    let totals = totals.expect("Failed to parse category totals");
    assert_eq!(totals.len(), 2);
    // First-occurrence order, not sorted by amount or name.
    assert_eq!(totals[0].category, "Food");
    assert_eq!(totals[0].total_cents, 8000);
    assert_eq!(totals[1].category, "Travel");
    assert_eq!(totals[1].total_cents, 2000);
}

#[tokio::test]
async fn monthly_totals_carry_month_buckets() {
    let client = TestClient::new();
    let jan = client.create_period("2026-01-01", 100_000).await;
    let mar = client.create_period("2026-03-01", 100_000).await;

    client.create_expense(jan, "2026-01-15", 4000, "Rent").await;
    client.create_expense(mar, "2026-03-10", 1500, "Rent").await;
    client.create_expense(mar, "2026-03-11", 2500, "Food").await;

    let (status, totals): (_, Option<Vec<CategoryTotal>>) = client
        .get_json("/api/expenses/monthly-category-totals?year=2026")
        .await;
    assert_eq!(status, StatusCode::OK);

    let totals = totals.expect("Failed to parse monthly totals");
    assert_eq!(totals.len(), 3);
    assert_eq!(totals[0].category, "Rent");
    assert_eq!(totals[0].month_year.as_deref(), Some("2026-01-01"));
    assert_eq!(totals[0].total_cents, 4000);
    assert_eq!(totals[2].month_year.as_deref(), Some("2026-03-01"));
}

#[tokio::test]
async fn expenses_adjust_period_remainder() {
    let client = TestClient::new();
    let period = client.create_period("2026-05-01", 50_000).await;

    let expense = client.create_expense(period, "2026-05-03", 12_000, "Food").await;

    let (_, periods): (_, Option<Vec<Period>>) = client.get_json("/api/periods").await;
    let p = &periods.unwrap()[0];
    assert_eq!(p.budgeted_cents, 50_000);
    assert_eq!(p.remaining_cents, 38_000);

    // Updating the amount reconciles the remainder.
    let (status, _) = client
        .put_json(
            &format!("/api/expenses/{}", expense),
            serde_json::json!({
                "date": "2026-05-03",
                "amount_cents": 20_000,
                "category": "Food",
                "description": "groceries",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, periods): (_, Option<Vec<Period>>) = client.get_json("/api/periods").await;
    assert_eq!(periods.unwrap()[0].remaining_cents, 30_000);

    // Deleting restores it.
    let status = client.delete(&format!("/api/expenses/{}", expense)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, periods): (_, Option<Vec<Period>>) = client.get_json("/api/periods").await;
    assert_eq!(periods.unwrap()[0].remaining_cents, 50_000);
}

#[tokio::test]
async fn periods_list_most_recent_first() {
    let client = TestClient::new();
    client.create_period("2026-01-01", 10_000).await;
    client.create_period("2026-04-01", 10_000).await;
    client.create_period("2026-02-01", 10_000).await;

    let (_, periods): (_, Option<Vec<Period>>) = client.get_json("/api/periods").await;
    let months: Vec<String> = periods.unwrap().into_iter().map(|p| p.month_year).collect();
    assert_eq!(months, vec!["2026-04-01", "2026-02-01", "2026-01-01"]);
}

#[tokio::test]
async fn yearly_summaries_scope_to_year() {
    let client = TestClient::new();
    client.create_period("2025-12-01", 10_000).await;
    client.create_period("2026-01-01", 20_000).await;
    client.create_period("2026-02-01", 30_000).await;

    let (status, body) = client.get("/api/periods/yearly?year=2026").await;
    assert_eq!(status, StatusCode::OK);

    let summaries: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["month_year"], "2026-01-01");
    assert_eq!(summaries[1]["budgeted_cents"], 30_000);
}

#[tokio::test]
async fn duplicate_period_month_is_rejected() {
    let client = TestClient::new();
    client.create_period("2026-06-01", 10_000).await;

    let (status, body) = client
        .post_json(
            "/api/periods",
            serde_json::json!({ "month_year": "2026-06-15", "budgeted_cents": 5000 }),
        )
        .await;
    // Mid-month dates normalize to the same period.
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
}

#[tokio::test]
async fn expense_for_unknown_period_is_404() {
    let client = TestClient::new();

    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "date": "2026-05-03",
                "amount_cents": 100,
                "category": "Food",
                "description": "",
                "period_id": 999,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_category_is_rejected() {
    let client = TestClient::new();
    let period = client.create_period("2026-05-01", 10_000).await;

    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "date": "2026-05-03",
                "amount_cents": 100,
                "category": "  ",
                "description": "",
                "period_id": period,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn current_period_missing_is_404() {
    let client = TestClient::new();
    let (status, _) = client.get("/api/periods/current").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn expense_years_are_distinct_and_ascending() {
    let client = TestClient::new();
    let a = client.create_period("2025-11-01", 10_000).await;
    let b = client.create_period("2026-01-01", 10_000).await;

    client.create_expense(a, "2025-11-05", 100, "Food").await;
    client.create_expense(b, "2026-01-02", 100, "Food").await;
    client.create_expense(b, "2026-01-03", 200, "Travel").await;

    let (status, years): (_, Option<Vec<i32>>) = client.get_json("/api/expenses/years").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(years.unwrap(), vec![2025, 2026]);
}

#[tokio::test]
async fn expense_filter_by_period_and_category() {
    let client = TestClient::new();
    let a = client.create_period("2026-01-01", 10_000).await;
    let b = client.create_period("2026-02-01", 10_000).await;

    client.create_expense(a, "2026-01-02", 100, "Food").await;
    client.create_expense(a, "2026-01-03", 200, "Travel").await;
    client.create_expense(b, "2026-02-04", 300, "Food").await;

    let (_, body) = client.get(&format!("/api/expenses?period_id={}", a)).await;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(rows.len(), 2);

    let (_, body) = client.get("/api/expenses?category=Food").await;
    let rows: Vec<serde_json::Value> = serde_json::from_str(&body).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["category"] == "Food"));
}
