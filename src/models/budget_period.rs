use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date_utils::period_label;

/// A calendar month for which a budget is tracked.
///
/// `remaining_cents` is maintained by the expense queries: inserting or
/// deleting an expense adjusts the owning period's remainder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub id: i64,
    /// First day of the budgeted month.
    pub month_year: NaiveDate,
    pub budgeted_cents: i64,
    pub remaining_cents: i64,
}

impl BudgetPeriod {
    /// Human-readable label, e.g. "Aug 2026".
    pub fn label(&self) -> String {
        period_label(self.month_year)
    }

    pub fn spent_cents(&self) -> i64 {
        self.budgeted_cents - self.remaining_cents
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBudgetPeriod {
    pub month_year: NaiveDate,
    pub budgeted_cents: i64,
}

/// Year-scoped projection used by the savings chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period_id: i64,
    pub month_year: NaiveDate,
    pub budgeted_cents: i64,
    pub remaining_cents: i64,
}
