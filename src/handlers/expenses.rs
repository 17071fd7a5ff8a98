use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Datelike;
use serde::Deserialize;

use crate::db::queries::{budget_periods, expenses};
use crate::error::{AppError, AppResult};
use crate::models::{CategoryTotal, Expense, ExpenseUpdate, NewExpense};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExpenseParams {
    pub period_id: Option<i64>,
    pub category: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ExpenseParams>,
) -> AppResult<Json<Vec<Expense>>> {
    let conn = state.db.get()?;
    let filter = expenses::ExpenseFilter {
        period_id: params.period_id,
        category: params.category,
        from_date: params.from_date,
        to_date: params.to_date,
    };
    let rows = expenses::list_expenses(&conn, &filter)?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct CategoryTotalsParams {
    pub period_id: i64,
}

/// Summed amounts per category for one period, in first-insertion order.
pub async fn category_totals(
    State(state): State<AppState>,
    Query(params): Query<CategoryTotalsParams>,
) -> AppResult<Json<Vec<CategoryTotal>>> {
    let conn = state.db.get()?;
    let totals = expenses::category_totals(&conn, params.period_id)?;
    Ok(Json(totals))
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthlyTotalsParams {
    pub year: Option<i32>,
}

/// Summed amounts per category per month for one year.
pub async fn monthly_category_totals(
    State(state): State<AppState>,
    Query(params): Query<MonthlyTotalsParams>,
) -> AppResult<Json<Vec<CategoryTotal>>> {
    let conn = state.db.get()?;
    let year = params
        .year
        .unwrap_or_else(|| chrono::Local::now().date_naive().year());
    let totals = expenses::category_totals_by_month(&conn, year)?;
    Ok(Json(totals))
}

/// Distinct years with recorded expenses, for the year picker.
pub async fn years(State(state): State<AppState>) -> AppResult<Json<Vec<i32>>> {
    let conn = state.db.get()?;
    let years = expenses::expense_years(&conn)?;
    Ok(Json(years))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewExpense>,
) -> AppResult<Json<Expense>> {
    if new.category.trim().is_empty() {
        return Err(AppError::Validation("Category must not be empty".into()));
    }

    let mut conn = state.db.get()?;
    if budget_periods::get_period(&conn, new.period_id)?.is_none() {
        return Err(AppError::NotFound(format!(
            "Budget period {} does not exist",
            new.period_id
        )));
    }

    let expense = expenses::insert_expense(&mut conn, &new)?;
    tracing::debug!(id = expense.id, category = %expense.category, "Created expense");
    Ok(Json(expense))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(update): Json<ExpenseUpdate>,
) -> AppResult<Json<Expense>> {
    if update.category.trim().is_empty() {
        return Err(AppError::Validation("Category must not be empty".into()));
    }

    let mut conn = state.db.get()?;
    let expense = expenses::update_expense(&mut conn, id, &update)?
        .ok_or_else(|| AppError::NotFound(format!("Expense {} not found", id)))?;
    Ok(Json(expense))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let mut conn = state.db.get()?;
    if expenses::delete_expense(&mut conn, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Expense {} not found", id)))
    }
}
