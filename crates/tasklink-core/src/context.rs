//! Per-run context.
//!
//! Each run gets its own id and root span; stages attach child spans to it so
//! every log line of a run can be correlated without ambient state.

use tracing::Span;
use uuid::Uuid;

/// Explicit context handed to every stage of a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    span: Span,
}

impl RunContext {
    /// Start a new run with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", run_id = %run_id);
        Self { run_id, span }
    }

    /// Identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Root span of this run.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Child span for a named stage (`auth`, `scrape`, `persist`).
    #[must_use]
    pub fn stage(&self, stage: &'static str) -> Span {
        tracing::info_span!(parent: &self.span, "stage", name = stage)
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
