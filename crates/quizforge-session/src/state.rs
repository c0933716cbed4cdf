//! Session phase and cumulative user statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Exam lifecycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No exam active; the full exercise set is presented.
    #[default]
    Idle,
    /// Exam started, cursor live, timer armed if configured.
    Running,
    /// Results computed; next transition returns to `Idle`.
    Finished,
}

impl SessionPhase {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionPhase::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Finished)
    }
}

/// Running totals across the whole session, exam or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStats {
    pub total_answered: u32,
    pub correct_count: u32,
    pub completed_ids: BTreeSet<u32>,
    pub session_start: DateTime<Utc>,
}

impl UserStats {
    pub fn new(now: DateTime<Utc>) -> Self {
        UserStats {
            total_answered: 0,
            correct_count: 0,
            completed_ids: BTreeSet::new(),
            session_start: now,
        }
    }

    /// Record one checked answer. Re-checking an exercise updates counters
    /// but the completed set only grows.
    pub fn record_check(&mut self, exercise_id: u32, correct: bool) {
        self.total_answered += 1;
        if correct {
            self.correct_count += 1;
        }
        self.completed_ids.insert(exercise_id);
    }

    pub fn accuracy(&self) -> f64 {
        if self.total_answered == 0 {
            0.0
        } else {
            f64::from(self.correct_count) / f64::from(self.total_answered) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_predicates() {
        assert!(!SessionPhase::Idle.is_running());
        assert!(SessionPhase::Running.is_running());
        assert!(SessionPhase::Finished.is_terminal());
    }

    #[test]
    fn stats_track_rechecks_without_double_completion() {
        let mut stats = UserStats::new(Utc::now());
        stats.record_check(1, false);
        stats.record_check(1, true);
        assert_eq!(stats.total_answered, 2);
        assert_eq!(stats.correct_count, 1);
        assert_eq!(stats.completed_ids.len(), 1);
        assert_eq!(stats.accuracy(), 50.0);
    }

    #[test]
    fn accuracy_of_empty_stats_is_zero() {
        let stats = UserStats::new(Utc::now());
        assert_eq!(stats.accuracy(), 0.0);
    }
}
