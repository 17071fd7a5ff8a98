pub mod expenses;
pub mod periods;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        // Budget periods
        .route("/api/periods", get(periods::list))
        .route("/api/periods", post(periods::create))
        .route("/api/periods/current", get(periods::current))
        .route("/api/periods/yearly", get(periods::yearly))
        // Expenses
        .route("/api/expenses", get(expenses::list))
        .route("/api/expenses", post(expenses::create))
        .route("/api/expenses/:id", put(expenses::update))
        .route("/api/expenses/:id", delete(expenses::delete))
        // Aggregations (chart data)
        .route(
            "/api/expenses/category-totals",
            get(expenses::category_totals),
        )
        .route(
            "/api/expenses/monthly-category-totals",
            get(expenses::monthly_category_totals),
        )
        .route("/api/expenses/years", get(expenses::years))
        // Health check
        .route("/health", get(health))
}

async fn health() -> &'static str {
    "OK"
}
