//! Observer seam for repository outcomes.
//!
//! Logging is a collaborator of the façade, not part of its contract: the
//! service hands every outcome to a `RepoObserver` and callers pick the
//! implementation.

use crate::repo::person_repo::{Operation, RepoError};
use log::{error, info};
use std::sync::Arc;

/// Receives the outcome of every façade operation.
pub trait RepoObserver {
    fn on_success(&self, operation: Operation, detail: &str);
    fn on_error(&self, operation: Operation, error: &RepoError);
}

/// Emits `event=repo_op` records through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl RepoObserver for LogObserver {
    fn on_success(&self, operation: Operation, detail: &str) {
        info!("event=repo_op module=repo status=ok op={operation} {detail}");
    }

    fn on_error(&self, operation: Operation, error: &RepoError) {
        error!("event=repo_op module=repo status=error op={operation} error={error}");
    }
}

/// Discards every outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RepoObserver for NoopObserver {
    fn on_success(&self, _operation: Operation, _detail: &str) {}

    fn on_error(&self, _operation: Operation, _error: &RepoError) {}
}

impl<O: RepoObserver + ?Sized> RepoObserver for &O {
    fn on_success(&self, operation: Operation, detail: &str) {
        (**self).on_success(operation, detail);
    }

    fn on_error(&self, operation: Operation, error: &RepoError) {
        (**self).on_error(operation, error);
    }
}

impl<O: RepoObserver + ?Sized> RepoObserver for Arc<O> {
    fn on_success(&self, operation: Operation, detail: &str) {
        (**self).on_success(operation, detail);
    }

    fn on_error(&self, operation: Operation, error: &RepoError) {
        (**self).on_error(operation, error);
    }
}
