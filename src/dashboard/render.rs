//! Render gate: one-time chart-library initialization and single-instance
//! chart lifecycle per drawing surface.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::services::series::SeriesDescriptor;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Chart library failed to load: {0}")]
    LoadFailed(String),

    #[error("Chart draw failed: {0}")]
    DrawFailed(String),
}

pub type BoxedLoad = Pin<Box<dyn Future<Output = Result<(), RenderError>> + Send>>;

/// Identifies the drawing surface a chart is attached to (the canvas
/// equivalent), e.g. `"expense-category-chart"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChartSurface(pub String);

impl ChartSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// A live chart instance. Disposable; destroyed before a replacement is
/// drawn on the same surface.
pub trait ChartHandle: Send {
    fn destroy(&mut self);
}

/// The rendering library, injected so tests can substitute a double.
pub trait ChartBackend: Send + Sync {
    /// One-shot asynchronous library initialization.
    fn load(&self) -> BoxedLoad;

    fn render(
        &self,
        surface: &ChartSurface,
        descriptor: &SeriesDescriptor,
    ) -> Result<Box<dyn ChartHandle>, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Unloaded,
    Loading,
    Ready,
}

/// State machine `Unloaded -> Loading -> Ready`.
///
/// The Unloaded->Loading transition happens once per instance lifetime. A
/// failed load is reported and the gate stays in Loading indefinitely;
/// every later render is a silent no-op. While Ready, rendering destroys
/// the previous chart on the surface before constructing the new one.
pub struct RenderGate {
    backend: Arc<dyn ChartBackend>,
    surface: ChartSurface,
    state: GateState,
    chart: Option<Box<dyn ChartHandle>>,
}

impl RenderGate {
    pub fn new(backend: Arc<dyn ChartBackend>, surface: ChartSurface) -> Self {
        Self {
            backend,
            surface,
            state: GateState::Unloaded,
            chart: None,
        }
    }

    /// Load the rendering library if this instance has not tried yet.
    ///
    /// Returns the load error exactly once, on the attempt that failed;
    /// repeat calls after a failure are no-ops returning `Ok`.
    pub async fn ensure_loaded(&mut self) -> Result<(), RenderError> {
        if self.state != GateState::Unloaded {
            return Ok(());
        }

        self.state = GateState::Loading;
        match self.backend.load().await {
            Ok(()) => {
                self.state = GateState::Ready;
                tracing::debug!(surface = %self.surface.0, "Chart backend ready");
                Ok(())
            }
            Err(e) => {
                tracing::error!(surface = %self.surface.0, "Chart backend load failed: {}", e);
                Err(e)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == GateState::Ready
    }

    pub fn has_chart(&self) -> bool {
        self.chart.is_some()
    }

    /// Draw `descriptor` on this gate's surface, replacing any previous
    /// chart. No-op before the library is Ready or when the descriptor is
    /// absent (empty dataset: the previous chart stays on screen).
    pub fn render(&mut self, descriptor: Option<&SeriesDescriptor>) -> Result<bool, RenderError> {
        if self.state != GateState::Ready {
            return Ok(false);
        }
        let Some(descriptor) = descriptor else {
            return Ok(false);
        };
        if descriptor.labels.is_empty() || descriptor.series.is_empty() {
            return Ok(false);
        }

        if let Some(mut previous) = self.chart.take() {
            previous.destroy();
        }

        let handle = self.backend.render(&self.surface, descriptor)?;
        self.chart = Some(handle);
        Ok(true)
    }
}

impl Drop for RenderGate {
    fn drop(&mut self) {
        if let Some(mut chart) = self.chart.take() {
            chart.destroy();
        }
    }
}
