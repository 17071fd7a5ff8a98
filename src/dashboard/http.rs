//! HTTP data sources: the dashboard's view of the remote service layer.
//!
//! All failures are normalized into a single [`FetchError`] message right
//! here at the boundary; nothing upstream inspects error shapes.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dashboard::source::{BoxedFetch, FetchError, RowSource};
use crate::models::{
    BudgetPeriod, CategoryTotal, Expense, ExpenseUpdate, NewBudgetPeriod, NewExpense,
    PeriodSummary,
};

/// Thin typed client over the JSON API.
#[derive(Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
        let response = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| FetchError::new(format!("GET {}: {}", path, e)))?;
        Self::decode(path, response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T, FetchError> {
        let response = self
            .http
            .request(method.clone(), self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::new(format!("{} {}: {}", method, path, e)))?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T, FetchError> {
        let status = response.status();
        if !status.is_success() {
            // The service replies with {"error": "..."} on failure.
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| status.to_string());
            return Err(FetchError::new(format!("{}: {}", path, message)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::new(format!("{}: invalid response: {}", path, e)))
    }

    pub async fn periods(&self) -> Result<Vec<BudgetPeriod>, FetchError> {
        self.get_json("/api/periods").await
    }

    pub async fn current_period(&self) -> Result<BudgetPeriod, FetchError> {
        self.get_json("/api/periods/current").await
    }

    pub async fn yearly_summaries(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<PeriodSummary>, FetchError> {
        match year {
            Some(y) => self.get_json(&format!("/api/periods/yearly?year={}", y)).await,
            None => self.get_json("/api/periods/yearly").await,
        }
    }

    pub async fn category_totals(&self, period_id: i64) -> Result<Vec<CategoryTotal>, FetchError> {
        self.get_json(&format!(
            "/api/expenses/category-totals?period_id={}",
            period_id
        ))
        .await
    }

    pub async fn monthly_category_totals(
        &self,
        year: Option<i32>,
    ) -> Result<Vec<CategoryTotal>, FetchError> {
        match year {
            Some(y) => {
                self.get_json(&format!("/api/expenses/monthly-category-totals?year={}", y))
                    .await
            }
            None => self.get_json("/api/expenses/monthly-category-totals").await,
        }
    }

    pub async fn expense_years(&self) -> Result<Vec<i32>, FetchError> {
        self.get_json("/api/expenses/years").await
    }

    pub async fn expenses(&self, period_id: Option<i64>) -> Result<Vec<Expense>, FetchError> {
        match period_id {
            Some(id) => self.get_json(&format!("/api/expenses?period_id={}", id)).await,
            None => self.get_json("/api/expenses").await,
        }
    }

    pub async fn create_expense(&self, new: &NewExpense) -> Result<Expense, FetchError> {
        self.send_json(reqwest::Method::POST, "/api/expenses", new)
            .await
    }

    pub async fn update_expense(
        &self,
        id: i64,
        update: &ExpenseUpdate,
    ) -> Result<Expense, FetchError> {
        self.send_json(reqwest::Method::PUT, &format!("/api/expenses/{}", id), update)
            .await
    }

    pub async fn delete_expense(&self, id: i64) -> Result<(), FetchError> {
        let path = format!("/api/expenses/{}", id);
        let response = self
            .http
            .delete(self.url(&path))
            .send()
            .await
            .map_err(|e| FetchError::new(format!("DELETE {}: {}", path, e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(FetchError::new(format!("{}: {}", path, response.status())))
        }
    }

    pub async fn create_period(&self, new: &NewBudgetPeriod) -> Result<BudgetPeriod, FetchError> {
        self.send_json(reqwest::Method::POST, "/api/periods", new)
            .await
    }
}

impl crate::dashboard::source::ExpenseStore for ServiceClient {
    fn create(&self, new: NewExpense) -> crate::dashboard::source::BoxedOp<Expense> {
        let client = self.clone();
        Box::pin(async move { client.create_expense(&new).await })
    }

    fn update(&self, id: i64, update: ExpenseUpdate) -> crate::dashboard::source::BoxedOp<Expense> {
        let client = self.clone();
        Box::pin(async move { client.update_expense(id, &update).await })
    }

    fn delete(&self, id: i64) -> crate::dashboard::source::BoxedOp<()> {
        let client = self.clone();
        Box::pin(async move { client.delete_expense(id).await })
    }
}

impl crate::dashboard::source::PeriodStore for ServiceClient {
    fn create(&self, new: NewBudgetPeriod) -> crate::dashboard::source::BoxedOp<BudgetPeriod> {
        let client = self.clone();
        Box::pin(async move { client.create_period(&new).await })
    }
}

/// Category totals for one period (`param`: period id).
pub struct CategoryTotalsSource(pub ServiceClient);

impl RowSource<i64, CategoryTotal> for CategoryTotalsSource {
    fn fetch(&self, period_id: &i64) -> BoxedFetch<CategoryTotal> {
        let client = self.0.clone();
        let period_id = *period_id;
        Box::pin(async move { client.category_totals(period_id).await })
    }
}

/// Category totals per month (`param`: optional year, `None` = current).
pub struct MonthlyTotalsSource(pub ServiceClient);

impl RowSource<Option<i32>, CategoryTotal> for MonthlyTotalsSource {
    fn fetch(&self, year: &Option<i32>) -> BoxedFetch<CategoryTotal> {
        let client = self.0.clone();
        let year = *year;
        Box::pin(async move { client.monthly_category_totals(year).await })
    }
}

/// All budget periods; parameterless.
pub struct PeriodsSource(pub ServiceClient);

impl RowSource<(), BudgetPeriod> for PeriodsSource {
    fn fetch(&self, _param: &()) -> BoxedFetch<BudgetPeriod> {
        let client = self.0.clone();
        Box::pin(async move { client.periods().await })
    }
}

/// Yearly period summaries (`param`: optional year).
pub struct YearlySummariesSource(pub ServiceClient);

impl RowSource<Option<i32>, PeriodSummary> for YearlySummariesSource {
    fn fetch(&self, year: &Option<i32>) -> BoxedFetch<PeriodSummary> {
        let client = self.0.clone();
        let year = *year;
        Box::pin(async move { client.yearly_summaries(year).await })
    }
}

/// Expense rows (`param`: optional period id filter).
pub struct ExpensesSource(pub ServiceClient);

impl RowSource<Option<i64>, Expense> for ExpensesSource {
    fn fetch(&self, period_id: &Option<i64>) -> BoxedFetch<Expense> {
        let client = self.0.clone();
        let period_id = *period_id;
        Box::pin(async move { client.expenses(period_id).await })
    }
}
