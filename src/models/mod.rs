pub mod budget_period;
pub mod expense;

pub use budget_period::{BudgetPeriod, NewBudgetPeriod, PeriodSummary};
pub use expense::{CategoryTotal, Expense, ExpenseUpdate, NewExpense};
