//! The chart pipeline shared by the dashboard components.
//!
//! Every component is a self-contained instance of the same three stages:
//! a data-source binding (issue a parameterized fetch, re-issue on
//! parameter change, discard stale responses), the series builder
//! ([`crate::services::series`]), and a render gate that owns the one-time
//! chart-library initialization and the single live chart per surface.

pub mod backend;
pub mod components;
pub mod events;
pub mod http;
pub mod render;
pub mod source;

pub use events::{Notification, NotificationSink, PeriodSelection, RowAction, Severity};
pub use render::{ChartBackend, ChartHandle, ChartSurface, RenderGate};
pub use source::{FetchError, FetchEvents, QueryBinding, RowSource};
