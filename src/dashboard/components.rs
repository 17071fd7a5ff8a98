//! The dashboard components. Each chart is a self-contained instance of
//! the fetch -> build-series -> render pipeline; the two managers are thin
//! table/list surfaces that emit user events and delegate mutations to the
//! service layer.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tokio::sync::{mpsc, watch};

use crate::dashboard::events::{Notification, NotificationSink, PeriodSelection, RowAction};
use crate::dashboard::render::{ChartBackend, ChartSurface, RenderGate};
use crate::dashboard::source::{
    ExpenseStore, FetchEvents, PeriodStore, QueryBinding, RowSource,
};
use crate::models::{
    BudgetPeriod, CategoryTotal, Expense, ExpenseUpdate, NewBudgetPeriod, NewExpense,
    PeriodSummary,
};
use crate::services::series::{
    category_pie, monthly_series, savings_series, snapshot_series, SeriesDescriptor,
};

/// Shared pipeline plumbing: a bound data source, a render gate and a
/// pure rows-to-descriptor function.
pub struct ChartComponent<P, R> {
    title: &'static str,
    binding: QueryBinding<P, R>,
    events: FetchEvents<R>,
    gate: RenderGate,
    sink: Arc<dyn NotificationSink>,
    build: Box<dyn Fn(&[R]) -> Option<SeriesDescriptor> + Send + Sync>,
}

impl<P, R> ChartComponent<P, R>
where
    R: Send + 'static,
{
    pub fn new(
        title: &'static str,
        surface: &str,
        source: Arc<dyn RowSource<P, R>>,
        backend: Arc<dyn ChartBackend>,
        sink: Arc<dyn NotificationSink>,
        build: impl Fn(&[R]) -> Option<SeriesDescriptor> + Send + Sync + 'static,
    ) -> Self {
        let (binding, events) = QueryBinding::new(source);
        Self {
            title,
            binding,
            events,
            gate: RenderGate::new(backend, ChartSurface::new(surface)),
            sink,
            build: Box::new(build),
        }
    }

    /// First-visibility hook: load the rendering library once. A failed
    /// load is surfaced and leaves every later render a silent no-op.
    pub async fn activate(&mut self) {
        if let Err(e) = self.gate.ensure_loaded().await {
            self.sink
                .notify(Notification::error(self.title, e.to_string()));
        }
    }

    /// Issue a fetch for `param`; an older in-flight fetch becomes stale.
    pub fn request(&self, param: &P) {
        self.binding.issue(param);
    }

    /// Consume one fetch outcome: build the series and render, or surface
    /// the failure. Returns `false` once the binding is closed.
    pub async fn pump(&mut self) -> bool {
        match self.events.next().await {
            Some(Ok(rows)) => {
                let descriptor = (self.build)(&rows);
                if let Err(e) = self.gate.render(descriptor.as_ref()) {
                    tracing::error!(component = self.title, "Render failed: {}", e);
                    self.sink
                        .notify(Notification::error(self.title, e.to_string()));
                }
                true
            }
            Some(Err(e)) => {
                tracing::error!(component = self.title, "Fetch failed: {}", e);
                self.sink
                    .notify(Notification::error(self.title, e.message.clone()));
                true
            }
            None => false,
        }
    }

    /// Fetch and draw in one step.
    pub async fn refresh(&mut self, param: &P) {
        self.request(param);
        self.pump().await;
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn has_chart(&self) -> bool {
        self.gate.has_chart()
    }
}

/// Pie of the current period's expenses by category.
pub struct CategoryPieChart {
    inner: ChartComponent<i64, CategoryTotal>,
}

impl CategoryPieChart {
    pub fn new(
        source: Arc<dyn RowSource<i64, CategoryTotal>>,
        backend: Arc<dyn ChartBackend>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            inner: ChartComponent::new(
                "Expenses by Category",
                "expense-category-chart",
                source,
                backend,
                sink,
                |rows| category_pie(rows),
            ),
        }
    }

    pub async fn activate(&mut self) {
        self.inner.activate().await;
    }

    pub async fn refresh(&mut self, period_id: i64) {
        self.inner.refresh(&period_id).await;
    }

    pub fn has_chart(&self) -> bool {
        self.inner.has_chart()
    }
}

/// Stacked bar of category totals per month, January through the current
/// calendar month.
pub struct MonthlyCategoryChart {
    inner: ChartComponent<Option<i32>, CategoryTotal>,
}

impl MonthlyCategoryChart {
    /// `today` bounds the time axis (January through its month); the host
    /// passes the current date.
    pub fn new(
        source: Arc<dyn RowSource<Option<i32>, CategoryTotal>>,
        backend: Arc<dyn ChartBackend>,
        sink: Arc<dyn NotificationSink>,
        today: NaiveDate,
    ) -> Self {
        Self {
            inner: ChartComponent::new(
                "Monthly Expenses by Category",
                "monthly-category-chart",
                source,
                backend,
                sink,
                move |rows| monthly_series(rows, today, true),
            ),
        }
    }

    pub async fn activate(&mut self) {
        self.inner.activate().await;
    }

    pub async fn refresh(&mut self, year: Option<i32>) {
        self.inner.refresh(&year).await;
    }

    pub fn has_chart(&self) -> bool {
        self.inner.has_chart()
    }
}

/// Remaining budget per month for the current year.
pub struct SavingsChart {
    inner: ChartComponent<Option<i32>, PeriodSummary>,
}

impl SavingsChart {
    pub fn new(
        source: Arc<dyn RowSource<Option<i32>, PeriodSummary>>,
        backend: Arc<dyn ChartBackend>,
        sink: Arc<dyn NotificationSink>,
        today: NaiveDate,
    ) -> Self {
        Self {
            inner: ChartComponent::new(
                "Savings",
                "savings-chart",
                source,
                backend,
                sink,
                move |rows| savings_series(rows, today),
            ),
        }
    }

    pub async fn activate(&mut self) {
        self.inner.activate().await;
    }

    pub async fn refresh(&mut self, year: Option<i32>) {
        self.inner.refresh(&year).await;
    }

    pub fn has_chart(&self) -> bool {
        self.inner.has_chart()
    }
}

enum PipelineEvent {
    SelectionChanged(bool),
    Fetch(Option<Result<Vec<CategoryTotal>, crate::dashboard::source::FetchError>>),
}

/// Snapshot stacked bar for a user-selected period. Subscribes to the
/// selection-changed channel and re-fetches on every pick; stale responses
/// from superseded picks are discarded by the binding.
pub struct PeriodExpenseChart {
    binding: QueryBinding<i64, CategoryTotal>,
    events: FetchEvents<CategoryTotal>,
    gate: RenderGate,
    sink: Arc<dyn NotificationSink>,
    selection: watch::Receiver<Option<PeriodSelection>>,
    current_label: String,
}

impl PeriodExpenseChart {
    pub fn new(
        source: Arc<dyn RowSource<i64, CategoryTotal>>,
        backend: Arc<dyn ChartBackend>,
        sink: Arc<dyn NotificationSink>,
        selection: watch::Receiver<Option<PeriodSelection>>,
    ) -> Self {
        let (binding, events) = QueryBinding::new(source);
        Self {
            binding,
            events,
            gate: RenderGate::new(backend, ChartSurface::new("period-expense-chart")),
            sink,
            selection,
            current_label: String::new(),
        }
    }

    pub async fn activate(&mut self) {
        if let Err(e) = self.gate.ensure_loaded().await {
            self.sink
                .notify(Notification::error("Expenses by Category", e.to_string()));
        }
    }

    /// Fetch and draw for whatever is currently selected, if anything.
    pub async fn refresh_selected(&mut self) {
        let Some(selection) = self.selection.borrow().clone() else {
            return;
        };
        self.current_label = selection.label;
        self.binding.issue(&selection.period_id);
        self.pump().await;
    }

    /// Drive the component: react to selection changes and fetch
    /// outcomes until the selection channel closes.
    pub async fn run(&mut self) {
        loop {
            let event = {
                let selection = &mut self.selection;
                let events = &mut self.events;
                tokio::select! {
                    changed = selection.changed() => PipelineEvent::SelectionChanged(changed.is_ok()),
                    outcome = events.next() => PipelineEvent::Fetch(outcome),
                }
            };

            match event {
                PipelineEvent::SelectionChanged(true) => {
                    let Some(selection) = self.selection.borrow_and_update().clone() else {
                        continue;
                    };
                    self.current_label = selection.label;
                    self.binding.issue(&selection.period_id);
                }
                PipelineEvent::SelectionChanged(false) => break,
                PipelineEvent::Fetch(Some(outcome)) => self.apply(outcome),
                PipelineEvent::Fetch(None) => break,
            }
        }
    }

    async fn pump(&mut self) {
        if let Some(outcome) = self.events.next().await {
            self.apply(outcome);
        }
    }

    fn apply(&mut self, outcome: Result<Vec<CategoryTotal>, crate::dashboard::source::FetchError>) {
        match outcome {
            Ok(rows) => {
                let descriptor = snapshot_series(&rows, &self.current_label);
                if let Err(e) = self.gate.render(descriptor.as_ref()) {
                    tracing::error!("Render failed: {}", e);
                    self.sink
                        .notify(Notification::error("Expenses by Category", e.to_string()));
                }
            }
            Err(e) => {
                tracing::error!("Fetch failed: {}", e);
                self.sink
                    .notify(Notification::error("Expenses by Category", e.message));
            }
        }
    }

    pub fn has_chart(&self) -> bool {
        self.gate.has_chart()
    }
}

/// Expense table: lists rows for a period filter, emits row actions, and
/// delegates mutations to the service.
pub struct ExpenseManager {
    binding: QueryBinding<Option<i64>, Expense>,
    events: FetchEvents<Expense>,
    store: Arc<dyn ExpenseStore>,
    sink: Arc<dyn NotificationSink>,
    actions: mpsc::UnboundedSender<RowAction>,
    rows: Vec<Expense>,
    filter: Option<i64>,
}

impl ExpenseManager {
    pub fn new(
        source: Arc<dyn RowSource<Option<i64>, Expense>>,
        store: Arc<dyn ExpenseStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> (Self, mpsc::UnboundedReceiver<RowAction>) {
        let (binding, events) = QueryBinding::new(source);
        let (actions, actions_rx) = mpsc::unbounded_channel();
        (
            Self {
                binding,
                events,
                store,
                sink,
                actions,
                rows: Vec::new(),
                filter: None,
            },
            actions_rx,
        )
    }

    pub fn rows(&self) -> &[Expense] {
        &self.rows
    }

    /// Re-fetch the table for `period_id` (`None` = all periods).
    pub async fn refresh(&mut self, period_id: Option<i64>) {
        self.filter = period_id;
        self.binding.issue(&period_id);
        match self.events.next().await {
            Some(Ok(rows)) => self.rows = rows,
            Some(Err(e)) => {
                tracing::error!("Fetch failed: {}", e);
                self.sink.notify(Notification::error("Expenses", e.message));
            }
            None => {}
        }
    }

    /// Raise an edit request for the hosting form component.
    pub fn request_edit(&self, id: i64) {
        let _ = self.actions.send(RowAction::Edit(id));
    }

    pub async fn create(&mut self, new: NewExpense) {
        match self.store.create(new).await {
            Ok(expense) => {
                self.sink.notify(Notification::success(
                    "Expenses",
                    format!("Recorded {} for {}", expense.amount_display(), expense.category),
                ));
                self.refresh(self.filter).await;
            }
            Err(e) => self.sink.notify(Notification::error("Expenses", e.message)),
        }
    }

    pub async fn update(&mut self, id: i64, update: ExpenseUpdate) {
        match self.store.update(id, update).await {
            Ok(_) => {
                self.sink
                    .notify(Notification::success("Expenses", "Expense updated"));
                self.refresh(self.filter).await;
            }
            Err(e) => self.sink.notify(Notification::error("Expenses", e.message)),
        }
    }

    pub async fn delete(&mut self, id: i64) {
        let _ = self.actions.send(RowAction::Delete(id));
        match self.store.delete(id).await {
            Ok(()) => {
                self.sink
                    .notify(Notification::success("Expenses", "Expense deleted"));
                self.refresh(self.filter).await;
            }
            Err(e) => self.sink.notify(Notification::error("Expenses", e.message)),
        }
    }
}

/// Budget period list: owns the selection-changed channel and creates new
/// periods through the service.
pub struct BudgetManager {
    binding: QueryBinding<(), BudgetPeriod>,
    events: FetchEvents<BudgetPeriod>,
    store: Arc<dyn PeriodStore>,
    sink: Arc<dyn NotificationSink>,
    selection: watch::Sender<Option<PeriodSelection>>,
    periods: Vec<BudgetPeriod>,
}

impl BudgetManager {
    pub fn new(
        source: Arc<dyn RowSource<(), BudgetPeriod>>,
        store: Arc<dyn PeriodStore>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        let (binding, events) = QueryBinding::new(source);
        let (selection, _) = watch::channel(None);
        Self {
            binding,
            events,
            store,
            sink,
            selection,
            periods: Vec::new(),
        }
    }

    /// Selection-changed subscription for the period-driven charts.
    pub fn subscribe(&self) -> watch::Receiver<Option<PeriodSelection>> {
        self.selection.subscribe()
    }

    pub fn periods(&self) -> &[BudgetPeriod] {
        &self.periods
    }

    /// Load the period list. The most recent period is selected when
    /// nothing is selected yet.
    pub async fn refresh(&mut self) {
        self.binding.issue(&());
        match self.events.next().await {
            Some(Ok(periods)) => {
                self.periods = periods;
                if self.selection.borrow().is_none() {
                    if let Some(first) = self.periods.first() {
                        let _ = self.selection.send(Some(PeriodSelection {
                            period_id: first.id,
                            label: first.label(),
                        }));
                    }
                }
            }
            Some(Err(e)) => {
                tracing::error!("Fetch failed: {}", e);
                self.sink
                    .notify(Notification::error("Budget Periods", e.message));
            }
            None => {}
        }
    }

    /// User picked a period; notify subscribers.
    pub fn select(&self, period_id: i64) {
        match self.periods.iter().find(|p| p.id == period_id) {
            Some(period) => {
                let _ = self.selection.send(Some(PeriodSelection {
                    period_id: period.id,
                    label: period.label(),
                }));
            }
            None => {
                self.sink.notify(Notification::error(
                    "Budget Periods",
                    format!("Unknown budget period {}", period_id),
                ));
            }
        }
    }

    pub async fn create_period(&mut self, new: NewBudgetPeriod) {
        match self.store.create(new).await {
            Ok(period) => {
                self.sink.notify(Notification::success(
                    "Budget Periods",
                    format!("Created budget for {}", period.label()),
                ));
                self.refresh().await;
            }
            Err(e) => self
                .sink
                .notify(Notification::error("Budget Periods", e.message)),
        }
    }
}

/// Year used by the year-scoped charts when the host passes `None`.
pub fn current_year() -> i32 {
    chrono::Local::now().date_naive().year()
}
