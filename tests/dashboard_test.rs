//! Integration tests for the dashboard pipeline: components wired to fake
//! sources, a fake chart backend, and a collecting notification sink.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use outlay::dashboard::backend::SvgChartBackend;
use outlay::dashboard::components::{
    BudgetManager, CategoryPieChart, ExpenseManager, MonthlyCategoryChart, PeriodExpenseChart,
    SavingsChart,
};
use outlay::dashboard::events::CollectingSink;
use outlay::dashboard::render::{BoxedLoad, ChartBackend, ChartHandle, ChartSurface, RenderError};
use outlay::dashboard::source::{BoxedOp, ExpenseStore, FetchError, FnSource, PeriodStore};
use outlay::dashboard::{RowAction, Severity};
use outlay::models::{
    BudgetPeriod, CategoryTotal, Expense, ExpenseUpdate, NewBudgetPeriod, NewExpense,
    PeriodSummary,
};
use outlay::services::series::SeriesDescriptor;

struct FakeBackend {
    created: AtomicUsize,
    destroyed: Arc<AtomicUsize>,
    last_labels: Mutex<Vec<String>>,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            created: AtomicUsize::new(0),
            destroyed: Arc::new(AtomicUsize::new(0)),
            last_labels: Mutex::new(Vec::new()),
        })
    }

    fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
    }

    fn last_labels(&self) -> Vec<String> {
        self.last_labels.lock().unwrap().clone()
    }
}

struct FakeHandle {
    destroyed: Arc<AtomicUsize>,
}

impl ChartHandle for FakeHandle {
    fn destroy(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

impl ChartBackend for FakeBackend {
    fn load(&self) -> BoxedLoad {
        Box::pin(async { Ok(()) })
    }

    fn render(
        &self,
        _surface: &ChartSurface,
        descriptor: &SeriesDescriptor,
    ) -> Result<Box<dyn ChartHandle>, RenderError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.last_labels.lock().unwrap() = descriptor.labels.clone();
        Ok(Box::new(FakeHandle {
            destroyed: self.destroyed.clone(),
        }))
    }
}

fn totals(rows: &[(&str, i64)]) -> Vec<CategoryTotal> {
    rows.iter()
        .map(|(category, cents)| CategoryTotal {
            category: category.to_string(),
            total_cents: *cents,
            month_year: None,
        })
        .collect()
}

#[tokio::test]
async fn pie_chart_renders_fetched_totals() {
    let backend = FakeBackend::new();
    let sink = Arc::new(CollectingSink::new());
    let source = Arc::new(FnSource(|_period_id: &i64| async {
        Ok(totals(&[("Food", 8000), ("Travel", 2000)]))
    }));

    let mut chart = CategoryPieChart::new(source, backend.clone(), sink.clone());
    chart.activate().await;
    chart.refresh(1).await;

    assert!(chart.has_chart());
    assert_eq!(backend.live(), 1);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn empty_fetch_leaves_previous_chart() {
    let backend = FakeBackend::new();
    let sink = Arc::new(CollectingSink::new());
    let empty = Arc::new(AtomicUsize::new(0));
    let empty_flag = empty.clone();
    let source = Arc::new(FnSource(move |_period_id: &i64| {
        let empty = empty_flag.clone();
        async move {
            if empty.load(Ordering::SeqCst) == 1 {
                Ok(Vec::new())
            } else {
                Ok(totals(&[("Food", 8000)]))
            }
        }
    }));

    let mut chart = CategoryPieChart::new(source, backend.clone(), sink.clone());
    chart.activate().await;
    chart.refresh(1).await;
    assert_eq!(backend.live(), 1);

    // Second fetch returns no rows: the first chart stays on screen and
    // no notification is raised.
    empty.store(1, Ordering::SeqCst);
    chart.refresh(1).await;
    assert!(chart.has_chart());
    assert_eq!(backend.created.load(Ordering::SeqCst), 1);
    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn fetch_failure_is_surfaced_and_chart_untouched() {
    let backend = FakeBackend::new();
    let sink = Arc::new(CollectingSink::new());
    let fail = Arc::new(AtomicUsize::new(0));
    let fail_flag = fail.clone();
    let source = Arc::new(FnSource(move |_period_id: &i64| {
        let fail = fail_flag.clone();
        async move {
            if fail.load(Ordering::SeqCst) == 1 {
                Err(FetchError::new("remote lookup rejected"))
            } else {
                Ok(totals(&[("Food", 8000)]))
            }
        }
    }));

    let mut chart = CategoryPieChart::new(source, backend.clone(), sink.clone());
    chart.activate().await;
    chart.refresh(1).await;

    fail.store(1, Ordering::SeqCst);
    chart.refresh(1).await;

    let notifications = sink.take();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Error);
    assert!(notifications[0].message.contains("remote lookup rejected"));

    // The previous chart is left in place.
    assert!(chart.has_chart());
    assert_eq!(backend.live(), 1);
}

fn month_total(category: &str, cents: i64, year: i32, month: u32) -> CategoryTotal {
    CategoryTotal {
        category: category.to_string(),
        total_cents: cents,
        month_year: NaiveDate::from_ymd_opt(year, month, 1),
    }
}

#[tokio::test]
async fn monthly_chart_runs_january_through_its_injected_date() {
    let backend = FakeBackend::new();
    let sink = Arc::new(CollectingSink::new());
    let source = Arc::new(FnSource(|_year: &Option<i32>| async {
        Ok(vec![
            month_total("Food", 1000, 2026, 1),
            month_total("Food", 2000, 2026, 4),
        ])
    }));

    let today = NaiveDate::from_ymd_opt(2026, 4, 12).unwrap();
    let mut chart = MonthlyCategoryChart::new(source, backend.clone(), sink, today);
    chart.activate().await;
    chart.refresh(Some(2026)).await;

    assert!(chart.has_chart());
    // Zero months are present and every label carries its aggregate.
    assert_eq!(
        backend.last_labels(),
        vec!["Jan (10.00)", "Feb (0.00)", "Mar (0.00)", "Apr (20.00)"]
    );
}

#[tokio::test]
async fn savings_chart_zero_fills_to_its_injected_date() {
    let backend = FakeBackend::new();
    let sink = Arc::new(CollectingSink::new());
    let source = Arc::new(FnSource(|_year: &Option<i32>| async {
        Ok(vec![
            PeriodSummary {
                period_id: 1,
                month_year: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                budgeted_cents: 100_000,
                remaining_cents: 25_000,
            },
            PeriodSummary {
                period_id: 2,
                month_year: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
                budgeted_cents: 100_000,
                remaining_cents: 40_000,
            },
        ])
    }));

    let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
    let mut chart = SavingsChart::new(source, backend.clone(), sink, today);
    chart.activate().await;
    chart.refresh(Some(2026)).await;

    assert!(chart.has_chart());
    assert_eq!(backend.last_labels(), vec!["Jan", "Feb", "Mar"]);
}

struct NoopPeriodStore;

impl PeriodStore for NoopPeriodStore {
    fn create(&self, _new: NewBudgetPeriod) -> BoxedOp<BudgetPeriod> {
        Box::pin(async { Err(FetchError::new("not implemented")) })
    }
}

fn period(id: i64, year: i32, month: u32) -> BudgetPeriod {
    BudgetPeriod {
        id,
        month_year: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        budgeted_cents: 100_000,
        remaining_cents: 100_000,
    }
}

#[tokio::test]
async fn budget_manager_selection_drives_period_chart() {
    let backend = FakeBackend::new();
    let sink = Arc::new(CollectingSink::new());

    let periods_source = Arc::new(FnSource(|_param: &()| async {
        Ok(vec![period(2, 2026, 8), period(1, 2026, 7)])
    }));
    let mut manager = BudgetManager::new(periods_source, Arc::new(NoopPeriodStore), sink.clone());

    let totals_source = Arc::new(FnSource(|period_id: &i64| {
        let rows = if *period_id == 2 {
            totals(&[("Food", 8000), ("Travel", 2000)])
        } else {
            totals(&[("Rent", 90_000)])
        };
        async move { Ok(rows) }
    }));
    let mut chart = PeriodExpenseChart::new(
        totals_source,
        backend.clone(),
        sink.clone(),
        manager.subscribe(),
    );
    chart.activate().await;

    // Loading the period list auto-selects the most recent period.
    manager.refresh().await;
    chart.refresh_selected().await;
    assert!(chart.has_chart());
    assert_eq!(backend.created.load(Ordering::SeqCst), 1);

    // Picking another period re-fetches and replaces the chart.
    manager.select(1);
    chart.refresh_selected().await;
    assert_eq!(backend.created.load(Ordering::SeqCst), 2);
    assert_eq!(backend.live(), 1);

    // Selecting an unknown period only raises a notification.
    manager.select(99);
    assert_eq!(sink.count(), 1);
}

struct RecordingExpenseStore {
    deleted: Arc<AtomicUsize>,
}

impl ExpenseStore for RecordingExpenseStore {
    fn create(&self, new: NewExpense) -> BoxedOp<Expense> {
        Box::pin(async move {
            Ok(Expense {
                id: 10,
                date: new.date,
                amount_cents: new.amount_cents,
                category: new.category,
                description: new.description,
                period_id: new.period_id,
            })
        })
    }

    fn update(&self, _id: i64, _update: ExpenseUpdate) -> BoxedOp<Expense> {
        Box::pin(async { Err(FetchError::new("not implemented")) })
    }

    fn delete(&self, _id: i64) -> BoxedOp<()> {
        let deleted = self.deleted.clone();
        Box::pin(async move {
            deleted.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

#[tokio::test]
async fn expense_manager_deletes_and_notifies() {
    let sink = Arc::new(CollectingSink::new());
    let deleted = Arc::new(AtomicUsize::new(0));

    let source = Arc::new(FnSource(|_filter: &Option<i64>| async {
        Ok(vec![Expense {
            id: 7,
            date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
            amount_cents: 4200,
            category: "Food".into(),
            description: "groceries".into(),
            period_id: 1,
        }])
    }));
    let store = Arc::new(RecordingExpenseStore {
        deleted: deleted.clone(),
    });

    let (mut manager, mut actions) = ExpenseManager::new(source, store, sink.clone());
    manager.refresh(Some(1)).await;
    assert_eq!(manager.rows().len(), 1);

    manager.delete(7).await;
    assert_eq!(deleted.load(Ordering::SeqCst), 1);
    assert_eq!(actions.try_recv(), Ok(RowAction::Delete(7)));

    let notifications = sink.take();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].severity, Severity::Success);
}

#[tokio::test]
async fn expense_manager_surfaces_edit_requests() {
    let sink = Arc::new(CollectingSink::new());
    let source = Arc::new(FnSource(|_filter: &Option<i64>| async {
        Ok(Vec::<Expense>::new())
    }));
    let store = Arc::new(RecordingExpenseStore {
        deleted: Arc::new(AtomicUsize::new(0)),
    });

    let (manager, mut actions) = ExpenseManager::new(source, store, sink);
    manager.request_edit(42);
    assert_eq!(actions.try_recv(), Ok(RowAction::Edit(42)));
}

#[tokio::test]
async fn svg_backend_writes_and_destroys_chart_files() {
    let dir = tempfile::tempdir().unwrap();
    let chart_dir = dir.path().join("charts");
    let backend = Arc::new(SvgChartBackend::new(&chart_dir));
    let sink = Arc::new(CollectingSink::new());

    let source = Arc::new(FnSource(|_period_id: &i64| async {
        Ok(totals(&[("Food", 8000), ("Travel", 2000)]))
    }));
    let mut chart = CategoryPieChart::new(source, backend, sink);
    chart.activate().await;
    chart.refresh(1).await;

    let rendered = chart_dir.join("expense-category-chart.svg");
    assert!(rendered.exists());
    let contents = std::fs::read_to_string(&rendered).unwrap();
    assert!(contents.contains("<svg"));

    // Re-rendering replaces the file rather than stacking charts.
    chart.refresh(1).await;
    assert!(rendered.exists());

    drop(chart);
    assert!(!rendered.exists());
}
