use axum::extract::{Query, State};
use axum::response::Json;
use chrono::Datelike;
use serde::Deserialize;

use crate::db::queries::budget_periods;
use crate::error::{AppError, AppResult};
use crate::models::{BudgetPeriod, NewBudgetPeriod, PeriodSummary};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<BudgetPeriod>>> {
    let conn = state.db.get()?;
    let periods = budget_periods::list_periods(&conn)?;
    Ok(Json(periods))
}

/// The period covering today's date, or 404 when none has been created.
pub async fn current(State(state): State<AppState>) -> AppResult<Json<BudgetPeriod>> {
    let conn = state.db.get()?;
    let today = chrono::Local::now().date_naive();

    let id = budget_periods::current_period_id(&conn, today)?
        .ok_or_else(|| AppError::NotFound("No budget period for the current month".into()))?;
    let period = budget_periods::get_period(&conn, id)?
        .ok_or_else(|| AppError::NotFound("No budget period for the current month".into()))?;

    Ok(Json(period))
}

#[derive(Debug, Default, Deserialize)]
pub struct YearlyParams {
    pub year: Option<i32>,
}

pub async fn yearly(
    State(state): State<AppState>,
    Query(params): Query<YearlyParams>,
) -> AppResult<Json<Vec<PeriodSummary>>> {
    let conn = state.db.get()?;
    let year = params
        .year
        .unwrap_or_else(|| chrono::Local::now().date_naive().year());
    let summaries = budget_periods::yearly_summaries(&conn, year)?;
    Ok(Json(summaries))
}

pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewBudgetPeriod>,
) -> AppResult<Json<BudgetPeriod>> {
    if new.budgeted_cents <= 0 {
        return Err(AppError::Validation(
            "Budgeted amount must be positive".into(),
        ));
    }

    let conn = state.db.get()?;
    let period = budget_periods::insert_period(&conn, &new).map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            AppError::Validation("A budget period for that month already exists".into())
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(period = %period.label(), "Created budget period");
    Ok(Json(period))
}
