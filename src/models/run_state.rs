//! Run lifecycle and summary
//!
//! A run moves `Init -> Fetching -> Normalizing -> Replacing -> Done`.
//! `Error` absorbs any non-`Done` state when a fatal precondition fails.

use crate::models::ExchangeRate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Init,
    Fetching,
    Normalizing,
    Replacing,
    Done,
    Error,
}

impl RunState {
    /// Whether `self -> next` is a legal transition
    pub fn can_advance_to(&self, next: RunState) -> bool {
        use RunState::*;
        match (self, next) {
            (Done, _) | (Error, _) => false,
            (_, Error) => true,
            (Init, Fetching) => true,
            (Fetching, Normalizing) => true,
            (Normalizing, Replacing) => true,
            // persistence disabled: normalizing finishes the run
            (Normalizing, Done) => true,
            (Replacing, Done) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Init => "init",
            RunState::Fetching => "fetching",
            RunState::Normalizing => "normalizing",
            RunState::Replacing => "replacing",
            RunState::Done => "done",
            RunState::Error => "error",
        }
    }
}

/// Result of replacing one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaceOutcome {
    pub collection: String,
    pub deleted: usize,
    /// Enumeration rounds that deleted at least one document
    pub delete_batches: usize,
    pub written: usize,
    pub failed_writes: usize,
    /// False when the clear phase stopped early and prior documents may remain
    pub cleared_completely: bool,
}

impl ReplaceOutcome {
    /// The collection holds exactly the snapshot
    pub fn is_consistent(&self) -> bool {
        self.cleared_completely && self.failed_writes == 0
    }
}

/// What one run did, reported to the caller instead of terminating the process
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub job: String,
    pub state: RunState,
    /// Records fetched per category
    pub fetched: BTreeMap<String, usize>,
    /// Documents written to the store
    pub written: usize,
    pub exchange_rate: Option<ExchangeRate>,
    /// False when the store was unavailable and persistence was skipped
    pub persisted: bool,
    pub replace: Option<ReplaceOutcome>,
    pub error: Option<String>,
    pub backup_path: Option<String>,
}

impl RunSummary {
    pub fn new(job: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            state: RunState::Init,
            fetched: BTreeMap::new(),
            written: 0,
            exchange_rate: None,
            persisted: false,
            replace: None,
            error: None,
            backup_path: None,
        }
    }

    /// Move to `next`; illegal transitions are ignored and reported as false
    pub fn advance(&mut self, next: RunState) -> bool {
        if !self.state.can_advance_to(next) {
            debug!(job = %self.job, from = self.state.as_str(), to = next.as_str(), "Ignored run state transition");
            return false;
        }
        debug!(job = %self.job, from = self.state.as_str(), to = next.as_str(), "Run state transition");
        self.state = next;
        true
    }

    pub fn fail(&mut self, error: impl std::fmt::Display) {
        if self.advance(RunState::Error) {
            self.error = Some(error.to_string());
        }
    }

    pub fn record_fetched(&mut self, category: &str, count: usize) {
        self.fetched.insert(category.to_string(), count);
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    /// Done, and any replace left the collection matching the snapshot
    pub fn is_consistent(&self) -> bool {
        self.is_success() && self.replace.as_ref().map_or(true, |r| r.is_consistent())
    }

    pub fn used_fallback_rate(&self) -> bool {
        self.exchange_rate.as_ref().map_or(false, |r| r.is_fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut summary = RunSummary::new("market");
        assert!(summary.advance(RunState::Fetching));
        assert!(summary.advance(RunState::Normalizing));
        assert!(summary.advance(RunState::Replacing));
        assert!(summary.advance(RunState::Done));
        assert!(summary.is_success());
    }

    #[test]
    fn test_error_is_absorbing() {
        let mut summary = RunSummary::new("leaderboard");
        summary.advance(RunState::Fetching);
        summary.fail("no listings");
        assert_eq!(summary.state, RunState::Error);
        assert!(!summary.advance(RunState::Normalizing));
        assert!(!summary.advance(RunState::Done));
        assert_eq!(summary.error.as_deref(), Some("no listings"));
    }

    #[test]
    fn test_done_cannot_fail() {
        let mut summary = RunSummary::new("market");
        summary.advance(RunState::Fetching);
        summary.advance(RunState::Normalizing);
        summary.advance(RunState::Done);
        assert!(!RunState::Done.can_advance_to(RunState::Error));
        summary.fail("late");
        assert_eq!(summary.state, RunState::Done);
        assert!(summary.error.is_none());
    }

    #[test]
    fn test_skipping_states_is_rejected() {
        assert!(!RunState::Init.can_advance_to(RunState::Replacing));
        assert!(!RunState::Fetching.can_advance_to(RunState::Done));
    }

    #[test]
    fn test_inconsistent_replace() {
        let mut summary = RunSummary::new("market");
        summary.advance(RunState::Fetching);
        summary.advance(RunState::Normalizing);
        summary.advance(RunState::Replacing);
        summary.advance(RunState::Done);
        summary.replace = Some(ReplaceOutcome {
            collection: "c".into(),
            cleared_completely: false,
            ..Default::default()
        });
        assert!(summary.is_success());
        assert!(!summary.is_consistent());
    }
}
