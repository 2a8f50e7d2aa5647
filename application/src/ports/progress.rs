//! Progress notification port
//!
//! Defines the interface for reporting progress during a refinement run.
//! Events are emitted in order, once per state transition, and carry
//! everything a renderer needs so that no renderer has to query the run.

use draftsmith_domain::{GradeResult, MessageStatus, RefinementPhase, Rubric, RunOutcome};
use tokio::sync::mpsc;

/// A refinement progress event
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The orchestrator moved into a new state
    PhaseEntered { phase: RefinementPhase },
    /// Rubric built for this turn
    CriteriaReady { rubric: Rubric },
    /// First draft written
    DraftReady { words: usize },
    /// A draft was graded; `iteration` is 1-based
    GradeResult { iteration: usize, grade: GradeResult },
    /// A revised draft replaced the previous one
    RefineApplied { iteration: usize, words: usize },
    /// The run reached a terminal state; `status` is absent for failed runs
    RunComplete {
        outcome: RunOutcome,
        status: Option<MessageStatus>,
        iterations: usize,
    },
}

impl ProgressEvent {
    /// Stable phase name used in logs and JSON output
    pub fn phase(&self) -> &'static str {
        match self {
            ProgressEvent::PhaseEntered { .. } => "phase_entered",
            ProgressEvent::CriteriaReady { .. } => "criteria_ready",
            ProgressEvent::DraftReady { .. } => "draft_ready",
            ProgressEvent::GradeResult { .. } => "grade_result",
            ProgressEvent::RefineApplied { .. } => "refine_applied",
            ProgressEvent::RunComplete { .. } => "run_complete",
        }
    }
}

/// Callback for progress updates during a refinement run
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain lines, channels).
pub trait ProgressNotifier: Send + Sync {
    fn on_event(&self, event: &ProgressEvent);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_event(&self, _event: &ProgressEvent) {}
}

/// Forwards every event into an unbounded channel.
///
/// A closed receiver is ignored: the run does not depend on anyone
/// listening.
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Create a notifier together with its receiving end
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressNotifier for ChannelProgress {
    fn on_event(&self, event: &ProgressEvent) {
        let _ = self.tx.send(event.clone());
    }
}
