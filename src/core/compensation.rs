//! Best-effort undo steps for multi-step writes
//!
//! A create that uploads media and then fails to persist must remove what it
//! already uploaded. Each side effect registers its undo step here as soon as
//! it succeeds. On failure the plan runs the steps in reverse order. A step
//! that fails is logged and skipped, and it never replaces the error the
//! caller is about to return.

use anyhow::Result;
use futures::future::BoxFuture;
use std::future::Future;

struct Step {
    label: String,
    action: BoxFuture<'static, Result<()>>,
}

/// Ordered list of undo steps
#[derive(Default)]
pub struct CompensationPlan {
    steps: Vec<Step>,
}

impl CompensationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an undo step. The future is not polled until [`run`](Self::run).
    pub fn push<F>(&mut self, label: impl Into<String>, action: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.steps.push(Step {
            label: label.into(),
            action: Box::pin(action),
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute every step, newest first. Returns how many steps failed.
    pub async fn run(self) -> usize {
        let mut failures = 0;
        for step in self.steps.into_iter().rev() {
            match step.action.await {
                Ok(()) => tracing::debug!(step = %step.label, "compensation step done"),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(step = %step.label, error = %e, "compensation step failed");
                }
            }
        }
        failures
    }

    /// Drop every step without running it (the operation succeeded)
    pub fn commit(self) {
        if !self.steps.is_empty() {
            tracing::trace!(steps = self.steps.len(), "compensation plan committed");
        }
    }
}
