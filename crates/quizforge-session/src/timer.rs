//! Countdown timer for timed exams.
//!
//! The timer is a deadline, not a task: callers tick it once per second (or
//! on whatever cadence they have) and act on the returned status. Display
//! urgency changes below ten minutes and again below five.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Remaining time drops into `Warning` below this many seconds.
pub const WARNING_THRESHOLD_SECS: i64 = 600;
/// And into `Danger` below this many.
pub const DANGER_THRESHOLD_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExamTimer {
    deadline: DateTime<Utc>,
}

/// Display/urgency status at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStatus {
    Normal,
    Warning,
    Danger,
    Expired,
}

impl ExamTimer {
    pub fn starting_at(start: DateTime<Utc>, limit_seconds: i64) -> Self {
        ExamTimer {
            deadline: start + Duration::seconds(limit_seconds),
        }
    }

    /// Whole seconds left; negative once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.deadline - now).num_seconds()
    }

    pub fn status(&self, now: DateTime<Utc>) -> TimerStatus {
        let remaining = self.remaining_seconds(now);
        if remaining <= 0 {
            TimerStatus::Expired
        } else if remaining < DANGER_THRESHOLD_SECS {
            TimerStatus::Danger
        } else if remaining < WARNING_THRESHOLD_SECS {
            TimerStatus::Warning
        } else {
            TimerStatus::Normal
        }
    }

    /// `MM:SS` rendering, clamped at zero.
    pub fn display(&self, now: DateTime<Utc>) -> String {
        let remaining = self.remaining_seconds(now).max(0);
        format!("{:02}:{:02}", remaining / 60, remaining % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_follow_remaining_time() {
        let start = Utc::now();
        let timer = ExamTimer::starting_at(start, 1800);
        assert_eq!(timer.status(start), TimerStatus::Normal);
        assert_eq!(
            timer.status(start + Duration::seconds(1201)),
            TimerStatus::Warning
        );
        assert_eq!(
            timer.status(start + Duration::seconds(1501)),
            TimerStatus::Danger
        );
        assert_eq!(
            timer.status(start + Duration::seconds(1800)),
            TimerStatus::Expired
        );
    }

    #[test]
    fn display_clamps_at_zero() {
        let start = Utc::now();
        let timer = ExamTimer::starting_at(start, 65);
        assert_eq!(timer.display(start), "01:05");
        assert_eq!(timer.display(start + Duration::seconds(100)), "00:00");
    }
}
