//! Progress reporting and cooperative cancellation for long running stages.

use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

use crate::errors::{
    AlignmentError,
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DistanceMatrix,
    Clustering,
    Validation,
    Alignment,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Stage::DistanceMatrix => "Scoring row pairs",
            Stage::Clustering => "Clustering",
            Stage::Validation => "Cutting the cluster tree",
            Stage::Alignment => "Building aligned rows",
        }
    }
}

/// Receives incremental progress from the pipeline.
///
/// Implemented for `()` (discards everything) and for
/// [`indicatif::ProgressBar`].
pub trait ProgressSink {
    /// A new stage starts, with `total` units of work.
    fn start_stage(&self, stage: Stage, total: u64);
    /// `delta` more units of the current stage are done.
    fn advance(&self, delta: u64);
    fn finish_stage(&self, _stage: Stage) {}
}

impl ProgressSink for () {
    fn start_stage(&self, _stage: Stage, _total: u64) {}
    fn advance(&self, _delta: u64) {}
}

impl ProgressSink for indicatif::ProgressBar {
    fn start_stage(&self, stage: Stage, total: u64) {
        self.reset();
        self.set_length(total);
        self.set_message(stage.label());
    }

    fn advance(&self, delta: u64) {
        self.inc(delta);
    }

    fn finish_stage(&self, _stage: Stage) {
        self.set_position(self.length().unwrap_or(0));
    }
}

impl<T: ProgressSink + ?Sized> ProgressSink for &T {
    fn start_stage(&self, stage: Stage, total: u64) {
        (**self).start_stage(stage, total)
    }

    fn advance(&self, delta: u64) {
        (**self).advance(delta)
    }

    fn finish_stage(&self, stage: Stage) {
        (**self).finish_stage(stage)
    }
}

/// Shared flag used to ask a running alignment to stop.
///
/// Clones share the same flag, so one clone can be handed to another
/// thread (a signal handler, a UI) while the pipeline checks the other.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }

    /// Returns `Err(AlignmentError::Canceled)` once [`cancel`](Self::cancel) was called.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(AlignmentError::Canceled)
        } else {
            Ok(())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_clones_share_state() {
        let token = CancellationToken::new();
        let other = token.clone();
        assert!(token.check().is_ok());
        other.cancel();
        assert!(token.is_canceled());
        assert!(token.check().unwrap_err().is_canceled());
    }
}
