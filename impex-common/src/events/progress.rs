//! Progress snapshot and its presentation-facing form

use super::ExchangeType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest known progress of a running exchange
///
/// `total_units == 0` is the sentinel for an unknown total. It never means
/// "nothing left to do".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub exchange_type: ExchangeType,
    pub total_units: u64,
    pub completed_units: u64,
}

impl ProgressSnapshot {
    pub fn new(exchange_type: ExchangeType, total_units: u64, completed_units: u64) -> Self {
        Self {
            exchange_type,
            total_units,
            completed_units,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        self.total_units == 0
    }

    /// Completed share in `0.0..=1.0`, or `None` while the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.is_indeterminate() {
            None
        } else {
            let done = self.completed_units.min(self.total_units);
            Some(done as f64 / self.total_units as f64)
        }
    }

    /// How a progress indicator should show this snapshot
    pub fn display(&self) -> ProgressDisplay {
        if self.is_indeterminate() {
            ProgressDisplay::Indeterminate
        } else {
            ProgressDisplay::Determinate {
                completed: self.completed_units.min(self.total_units),
                total: self.total_units,
            }
        }
    }
}

/// Rendering hint for a progress indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressDisplay {
    /// Busy indicator with no fraction
    Indeterminate,
    /// Bounded bar at `completed / total`
    Determinate { completed: u64, total: u64 },
}

impl fmt::Display for ProgressDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressDisplay::Indeterminate => f.write_str("[working…]"),
            ProgressDisplay::Determinate { completed, total } => {
                let percent = (*completed as f64 / *total as f64) * 100.0;
                write!(f, "{}/{} ({:.0}%)", completed, total, percent)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_indeterminate_not_complete() {
        let unknown = ProgressSnapshot::new(ExchangeType::Sessions, 0, 0);
        let done = ProgressSnapshot::new(ExchangeType::Sessions, 5, 5);

        assert!(unknown.is_indeterminate());
        assert_eq!(unknown.fraction(), None);
        assert_eq!(unknown.display(), ProgressDisplay::Indeterminate);

        assert_eq!(done.fraction(), Some(1.0));
        assert_ne!(unknown.display(), done.display());
        assert_ne!(unknown.display().to_string(), done.display().to_string());
    }

    #[test]
    fn determinate_display_clamps_overshoot() {
        let snapshot = ProgressSnapshot::new(ExchangeType::Feeds, 10, 12);
        assert_eq!(
            snapshot.display(),
            ProgressDisplay::Determinate {
                completed: 10,
                total: 10
            }
        );
        assert_eq!(snapshot.display().to_string(), "10/10 (100%)");
    }

    #[test]
    fn partial_progress_renders_fraction() {
        let snapshot = ProgressSnapshot::new(ExchangeType::Bookmarks, 4, 1);
        assert_eq!(snapshot.fraction(), Some(0.25));
        assert_eq!(snapshot.display().to_string(), "1/4 (25%)");
    }
}
