//! Import session state machine
//!
//! A session progresses through three phases and never goes back:
//! IDLE → RUNNING → TERMINAL(result)

use crate::error::{ImportError, ImportResult};
use chrono::{DateTime, Utc};
use impex_common::{OperationResult, ProgressSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Import session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "result", rename_all = "UPPERCASE")]
pub enum Phase {
    /// Created, not started
    Idle,
    /// Importer is executing
    Running,
    /// Finished with the importer's reported result
    Terminal(OperationResult),
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Terminal(_))
    }

    pub fn result(&self) -> Option<OperationResult> {
        match self {
            Phase::Terminal(result) => Some(*result),
            _ => None,
        }
    }

    /// Whether `next` is a legal successor of this phase
    fn allows(&self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Running) | (Phase::Running, Phase::Terminal(_))
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => f.write_str("idle"),
            Phase::Running => f.write_str("running"),
            Phase::Terminal(OperationResult::Successful) => f.write_str("finished"),
            Phase::Terminal(OperationResult::Failed) => f.write_str("failed"),
            Phase::Terminal(OperationResult::Cancelled) => f.write_str("cancelled"),
        }
    }
}

/// Phase transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub session_id: Uuid,
    pub old_phase: Phase,
    pub new_phase: Phase,
    pub transitioned_at: DateTime<Utc>,
}

/// Queryable session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Unique session identifier
    pub session_id: Uuid,

    /// Current phase
    pub phase: Phase,

    /// Latest progress seen while running
    pub progress: Option<ProgressSnapshot>,

    /// Importer-supplied summary for a failed run
    pub failure_summary: Option<String>,

    /// `can_cancel()` as queried when the run began
    pub can_cancel: Option<bool>,

    /// Set once `cancel()` was forwarded to the importer
    pub cancel_requested: bool,

    /// Run start time (set on entering RUNNING)
    pub started_at: Option<DateTime<Utc>>,

    /// Run end time (set on entering TERMINAL)
    pub ended_at: Option<DateTime<Utc>>,
}

impl SessionStatus {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            phase: Phase::Idle,
            progress: None,
            failure_summary: None,
            can_cancel: None,
            cancel_requested: false,
            started_at: None,
            ended_at: None,
        }
    }

    /// Transition to a new phase
    ///
    /// Only IDLE → RUNNING and RUNNING → TERMINAL are accepted; anything else
    /// leaves the status untouched and returns `InvalidState`.
    pub fn transition_to(&mut self, new_phase: Phase) -> ImportResult<StateTransition> {
        if !self.phase.allows(new_phase) {
            return Err(ImportError::invalid_state("change phase", self.phase));
        }

        let transition = StateTransition {
            session_id: self.session_id,
            old_phase: self.phase,
            new_phase,
            transitioned_at: Utc::now(),
        };
        self.phase = new_phase;

        match new_phase {
            Phase::Running => self.started_at = Some(transition.transitioned_at),
            Phase::Terminal(_) => self.ended_at = Some(transition.transitioned_at),
            Phase::Idle => {}
        }

        Ok(transition)
    }

    /// Record a progress snapshot
    ///
    /// Within one determinate period the completed count never goes back; a
    /// change of total (e.g. indeterminate → known) starts a new period.
    pub fn update_progress(&mut self, snapshot: ProgressSnapshot) {
        let completed = match self.progress {
            Some(previous) if previous.total_units == snapshot.total_units => {
                snapshot.completed_units.max(previous.completed_units)
            }
            _ => snapshot.completed_units,
        };
        self.progress = Some(ProgressSnapshot {
            completed_units: completed,
            ..snapshot
        });
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use impex_common::ExchangeType;

    #[test]
    fn phases_only_move_forward() {
        let mut status = SessionStatus::new(Uuid::new_v4());

        assert!(status
            .transition_to(Phase::Terminal(OperationResult::Successful))
            .is_err());
        assert_eq!(status.phase, Phase::Idle);

        let t = status.transition_to(Phase::Running).unwrap();
        assert_eq!(t.old_phase, Phase::Idle);
        assert!(status.started_at.is_some());
        assert!(status.transition_to(Phase::Running).is_err());

        status
            .transition_to(Phase::Terminal(OperationResult::Cancelled))
            .unwrap();
        assert!(status.ended_at.is_some());

        for next in [
            Phase::Idle,
            Phase::Running,
            Phase::Terminal(OperationResult::Successful),
        ] {
            assert!(status.transition_to(next).is_err());
        }
        assert_eq!(status.phase, Phase::Terminal(OperationResult::Cancelled));
    }

    #[test]
    fn completed_units_never_decrease_within_a_period() {
        let mut status = SessionStatus::new(Uuid::new_v4());
        status.update_progress(ProgressSnapshot::new(ExchangeType::Notes, 10, 6));
        status.update_progress(ProgressSnapshot::new(ExchangeType::Notes, 10, 4));
        assert_eq!(status.progress.unwrap().completed_units, 6);

        status.update_progress(ProgressSnapshot::new(ExchangeType::Notes, 0, 0));
        status.update_progress(ProgressSnapshot::new(ExchangeType::Notes, 20, 2));
        assert_eq!(status.progress.unwrap().completed_units, 2);
        assert_eq!(status.progress.unwrap().total_units, 20);
    }

    #[test]
    fn phase_display_names() {
        assert_eq!(Phase::Idle.to_string(), "idle");
        assert_eq!(Phase::Terminal(OperationResult::Failed).to_string(), "failed");
        assert_eq!(
            Phase::Terminal(OperationResult::Cancelled).result(),
            Some(OperationResult::Cancelled)
        );
    }
}
