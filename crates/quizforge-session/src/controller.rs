//! Exam-session controller.
//!
//! Owns the exercise manager, the phase machine (`idle` → `running` →
//! `finished`), the navigation cursor, and the countdown. Interactive
//! concerns (finish confirmation, accepting a smaller pool) are surfaced as
//! explicit parameters and recoverable errors so the calling frontend can
//! ask the user and retry.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use quizforge_core::error::AnswerError;
use quizforge_core::manager::ExerciseManager;
use quizforge_core::model::{ExerciseKind, ExerciseRecord, ExerciseSet};
use quizforge_core::renderer::{Answer, Presentation, Verdict};

use crate::config::ExamConfig;
use crate::error::SessionError;
use crate::persist::Snapshot;
use crate::state::{SessionPhase, UserStats};
use crate::timer::{ExamTimer, TimerStatus};

/// Letter-grade-like classification of an exam percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeBand {
    Excellent,
    Great,
    Good,
    Passing,
    NeedsImprovement,
}

impl GradeBand {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            GradeBand::Excellent
        } else if percentage >= 80.0 {
            GradeBand::Great
        } else if percentage >= 70.0 {
            GradeBand::Good
        } else if percentage >= 60.0 {
            GradeBand::Passing
        } else {
            GradeBand::NeedsImprovement
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GradeBand::Excellent => "Excellent",
            GradeBand::Great => "Great",
            GradeBand::Good => "Good",
            GradeBand::Passing => "Passing",
            GradeBand::NeedsImprovement => "Needs improvement",
        };
        write!(f, "{s}")
    }
}

/// Per-exercise line in the final results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseOutcome {
    pub id: u32,
    pub question: String,
    pub kind: ExerciseKind,
    pub points: u32,
    pub correct: bool,
    pub feedback: String,
}

/// Aggregate results computed once, at exam finish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResults {
    pub score: u32,
    pub max_score: u32,
    pub correct_count: usize,
    pub total_count: usize,
    pub percentage: f64,
    pub band: GradeBand,
    pub time_expired: bool,
    pub duration_seconds: i64,
    pub details: Vec<ExerciseOutcome>,
}

pub struct SessionController {
    session_id: Uuid,
    /// The full loaded collection; exam mode presents a subset of it.
    set: ExerciseSet,
    current: Vec<ExerciseRecord>,
    manager: ExerciseManager,
    phase: SessionPhase,
    current_index: usize,
    config: Option<ExamConfig>,
    exam_start: Option<DateTime<Utc>>,
    timer: Option<ExamTimer>,
    /// Verdicts of answers checked during the current exam.
    checked: BTreeMap<u32, bool>,
    stats: UserStats,
    results: Option<ExamResults>,
}

impl SessionController {
    pub fn new(set: ExerciseSet, now: DateTime<Utc>) -> Self {
        let mut manager = ExerciseManager::new();
        manager.init(&set.exercises);
        let current = set.exercises.clone();
        SessionController {
            session_id: Uuid::new_v4(),
            set,
            current,
            manager,
            phase: SessionPhase::Idle,
            current_index: 0,
            config: None,
            exam_start: None,
            timer: None,
            checked: BTreeMap::new(),
            stats: UserStats::new(now),
            results: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn course(&self) -> &str {
        &self.set.course
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    pub fn config(&self) -> Option<&ExamConfig> {
        self.config.as_ref()
    }

    pub fn results(&self) -> Option<&ExamResults> {
        self.results.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn exercise_count(&self) -> usize {
        self.current.len()
    }

    pub fn current_exercise(&self) -> Option<&ExerciseRecord> {
        self.current.get(self.current_index)
    }

    pub fn current_presentation(&self) -> Option<Presentation> {
        let record = self.current_exercise()?;
        self.manager.presentation(record.id)
    }

    /// The finish affordance is shown only at the last question.
    pub fn at_last_question(&self) -> bool {
        !self.current.is_empty() && self.current_index == self.current.len() - 1
    }

    /// Start an exam with the given configuration.
    ///
    /// `accept_smaller` is the user's renewed consent after a
    /// [`SessionError::PoolTooSmall`]: with it set, a pool smaller than the
    /// requested question count is used in full.
    pub fn start_exam(
        &mut self,
        config: ExamConfig,
        accept_smaller: bool,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        if self.phase.is_running() {
            return Err(SessionError::AlreadyRunning);
        }
        if config.kinds.is_empty() {
            return Err(SessionError::NoKindsSelected);
        }

        let mut pool: Vec<ExerciseRecord> = self
            .set
            .exercises
            .iter()
            .filter(|r| config.admits(r))
            .cloned()
            .collect();
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }
        if config.question_count > pool.len() && !accept_smaller {
            return Err(SessionError::PoolTooSmall {
                requested: config.question_count,
                available: pool.len(),
            });
        }

        if config.randomize {
            pool.shuffle(&mut rand::rng());
        }
        pool.truncate(config.question_count.min(pool.len()));

        // Fresh sequential ids decouple exam-session ids from catalog ids.
        for (i, record) in pool.iter_mut().enumerate() {
            record.id = (i + 1) as u32;
        }

        tracing::info!(
            questions = pool.len(),
            time_limit_minutes = config.time_limit_minutes,
            "starting exam"
        );

        self.manager.init(&pool);
        self.current = pool;
        self.current_index = 0;
        self.checked.clear();
        self.results = None;
        self.timer = (config.time_limit_minutes > 0)
            .then(|| ExamTimer::starting_at(now, config.time_limit_seconds()));
        self.exam_start = Some(now);
        self.config = Some(config);
        self.phase = SessionPhase::Running;
        Ok(())
    }

    /// Move the cursor forward, clamped to the last question.
    pub fn next(&mut self) -> usize {
        if self.current_index + 1 < self.current.len() {
            self.current_index += 1;
        }
        self.current_index
    }

    /// Move the cursor back, clamped to the first question.
    pub fn previous(&mut self) -> usize {
        self.current_index = self.current_index.saturating_sub(1);
        self.current_index
    }

    pub fn submit_answer(&mut self, id: u32, answer: Answer) -> Result<(), AnswerError> {
        self.manager.submit_answer(id, answer)
    }

    /// Evaluate one exercise and fold the verdict into the session stats.
    pub fn check_answer(&mut self, id: u32) -> Option<Verdict> {
        let verdict = self.manager.check_answer(id)?;
        self.stats.record_check(id, verdict.correct);
        self.checked.insert(id, verdict.correct);
        Some(verdict)
    }

    /// One countdown tick. At expiry the exam is force-finished, bypassing
    /// the confirmation normally required to finish early.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TimerStatus {
        if !self.phase.is_running() {
            return TimerStatus::Normal;
        }
        let Some(timer) = self.timer else {
            return TimerStatus::Normal;
        };
        let status = timer.status(now);
        if status == TimerStatus::Expired {
            tracing::info!("time expired, finishing exam");
            // Running phase was just checked, so this cannot fail.
            let _ = self.finish_exam(true, now);
        }
        status
    }

    pub fn timer_display(&self, now: DateTime<Utc>) -> Option<String> {
        self.timer.map(|t| t.display(now))
    }

    /// Stop the timer, evaluate every exam exercise once, and transition to
    /// `finished`. Early finish confirmation is the caller's business.
    pub fn finish_exam(
        &mut self,
        time_expired: bool,
        now: DateTime<Utc>,
    ) -> Result<ExamResults, SessionError> {
        if !self.phase.is_running() {
            return Err(SessionError::NotRunning);
        }

        let mut details = Vec::with_capacity(self.current.len());
        let mut score = 0u32;
        let mut max_score = 0u32;
        let mut correct_count = 0usize;
        for record in &self.current {
            let verdict = self
                .manager
                .evaluate(record.id)
                .unwrap_or_else(|| Verdict {
                    correct: false,
                    feedback: "not evaluated".into(),
                });
            max_score += record.points;
            if verdict.correct {
                score += record.points;
                correct_count += 1;
            }
            details.push(ExerciseOutcome {
                id: record.id,
                question: record.question.clone(),
                kind: record.kind(),
                points: record.points,
                correct: verdict.correct,
                feedback: verdict.feedback,
            });
        }

        let total_count = self.current.len();
        let percentage = if total_count == 0 {
            0.0
        } else {
            correct_count as f64 / total_count as f64 * 100.0
        };
        let duration_seconds = self
            .exam_start
            .map(|start| (now - start).num_seconds())
            .unwrap_or(0);

        let results = ExamResults {
            score,
            max_score,
            correct_count,
            total_count,
            percentage,
            band: GradeBand::from_percentage(percentage),
            time_expired,
            duration_seconds,
            details,
        };
        tracing::info!(score, max_score, percentage, time_expired, "exam finished");

        self.timer = None;
        self.phase = SessionPhase::Finished;
        self.results = Some(results.clone());
        Ok(results)
    }

    /// Leave exam mode: restore the full collection and return to `idle`.
    /// Session stats survive; exam configuration and results do not.
    pub fn exit_exam_mode(&mut self) {
        self.current = self.set.exercises.clone();
        self.manager.init(&self.current);
        self.current_index = 0;
        self.checked.clear();
        self.config = None;
        self.exam_start = None;
        self.timer = None;
        self.results = None;
        self.phase = SessionPhase::Idle;
    }

    /// Capture everything needed to resume after a reload.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        Snapshot {
            saved_at: now,
            session_id: self.session_id,
            set: self.set.clone(),
            current: self.current.clone(),
            phase: self.phase,
            current_index: self.current_index,
            config: self.config.clone(),
            exam_start: self.exam_start,
            checked: self.checked.clone(),
            stats: self.stats.clone(),
            results: self.results.clone(),
        }
    }

    /// Rebuild a controller from a snapshot.
    ///
    /// A running exam resumes with the *remaining* time (configured limit
    /// minus elapsed since exam start); if that is already spent, the exam
    /// is force-finished with `time_expired` set.
    pub fn restore(snapshot: Snapshot, now: DateTime<Utc>) -> Self {
        let mut manager = ExerciseManager::new();
        manager.init(&snapshot.current);
        let mut controller = SessionController {
            session_id: snapshot.session_id,
            set: snapshot.set,
            current: snapshot.current,
            manager,
            phase: snapshot.phase,
            current_index: snapshot.current_index,
            config: snapshot.config,
            exam_start: snapshot.exam_start,
            timer: None,
            checked: snapshot.checked,
            stats: snapshot.stats,
            results: snapshot.results,
        };

        if controller.phase.is_running() {
            let limit = controller
                .config
                .as_ref()
                .map(|c| c.time_limit_seconds())
                .unwrap_or(0);
            if limit > 0 {
                if let Some(start) = controller.exam_start {
                    let timer = ExamTimer::starting_at(start, limit);
                    if timer.remaining_seconds(now) <= 0 {
                        tracing::info!("restored exam already out of time");
                        let _ = controller.finish_exam(true, now);
                    } else {
                        controller.timer = Some(timer);
                    }
                }
            }
        }
        controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quizforge_core::model::{Difficulty, Payload};

    fn true_false(id: u32, correct: bool, difficulty: Difficulty) -> ExerciseRecord {
        ExerciseRecord {
            id,
            question: format!("Statement {id}"),
            points: 1,
            difficulty,
            payload: Payload::TrueFalse {
                correct_answer: correct,
            },
            hint: None,
            explanation: None,
            sample_answer: None,
            image: None,
            extra: serde_json::Map::new(),
        }
    }

    fn set_of(n: u32) -> ExerciseSet {
        ExerciseSet {
            course: "Test".into(),
            description: String::new(),
            exercises: (1..=n)
                .map(|i| true_false(i, true, Difficulty::Medium))
                .collect(),
            metadata: None,
        }
    }

    fn config(questions: usize, minutes: u32) -> ExamConfig {
        ExamConfig {
            question_count: questions,
            time_limit_minutes: minutes,
            randomize: false,
            ..ExamConfig::default()
        }
    }

    #[test]
    fn exam_subset_gets_fresh_sequential_ids() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(10), now);
        ctrl.start_exam(config(4, 0), false, now).unwrap();
        assert_eq!(ctrl.phase(), SessionPhase::Running);
        assert_eq!(ctrl.exercise_count(), 4);
        let ids: Vec<u32> = ctrl.current.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn pool_too_small_is_recoverable_with_consent() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(3), now);
        let err = ctrl.start_exam(config(10, 0), false, now).unwrap_err();
        assert_eq!(err.available_pool(), Some(3));
        assert_eq!(ctrl.phase(), SessionPhase::Idle);

        ctrl.start_exam(config(10, 0), true, now).unwrap();
        assert_eq!(ctrl.exercise_count(), 3);
    }

    #[test]
    fn empty_kind_selection_is_rejected() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(3), now);
        let mut cfg = config(2, 0);
        cfg.kinds.clear();
        assert!(matches!(
            ctrl.start_exam(cfg, false, now),
            Err(SessionError::NoKindsSelected)
        ));
    }

    #[test]
    fn navigation_is_clamped() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(3), now);
        ctrl.start_exam(config(3, 0), false, now).unwrap();
        assert_eq!(ctrl.previous(), 0);
        assert_eq!(ctrl.next(), 1);
        assert_eq!(ctrl.next(), 2);
        assert!(ctrl.at_last_question());
        assert_eq!(ctrl.next(), 2);
    }

    #[test]
    fn timer_expiry_force_finishes() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(2), now);
        ctrl.start_exam(config(2, 1), false, now).unwrap();
        // 65 seconds later the one-minute exam is over.
        let later = now + Duration::seconds(65);
        assert_eq!(ctrl.tick(later), TimerStatus::Expired);
        assert_eq!(ctrl.phase(), SessionPhase::Finished);
        let results = ctrl.results().unwrap();
        assert!(results.time_expired);
        assert_eq!(results.total_count, 2);
    }

    #[test]
    fn finishing_scores_points_and_bands() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(4), now);
        ctrl.start_exam(config(4, 0), false, now).unwrap();
        // Answer three of four correctly.
        for id in 1..=3u32 {
            ctrl.submit_answer(id, Answer::Bool(true)).unwrap();
            assert!(ctrl.check_answer(id).unwrap().correct);
        }
        ctrl.submit_answer(4, Answer::Bool(false)).unwrap();
        let results = ctrl.finish_exam(false, now).unwrap();
        assert_eq!(results.score, 3);
        assert_eq!(results.max_score, 4);
        assert_eq!(results.correct_count, 3);
        assert_eq!(results.percentage, 75.0);
        assert_eq!(results.band, GradeBand::Good);
        assert!(!results.time_expired);
    }

    #[test]
    fn finish_requires_a_running_exam() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(2), now);
        assert!(matches!(
            ctrl.finish_exam(false, now),
            Err(SessionError::NotRunning)
        ));
    }

    #[test]
    fn exit_exam_mode_restores_the_full_set() {
        let now = Utc::now();
        let mut ctrl = SessionController::new(set_of(10), now);
        ctrl.start_exam(config(3, 0), false, now).unwrap();
        ctrl.finish_exam(false, now).unwrap();
        ctrl.exit_exam_mode();
        assert_eq!(ctrl.phase(), SessionPhase::Idle);
        assert_eq!(ctrl.exercise_count(), 10);
        assert!(ctrl.results().is_none());
    }

    #[test]
    fn grade_bands_at_the_boundaries() {
        assert_eq!(GradeBand::from_percentage(90.0), GradeBand::Excellent);
        assert_eq!(GradeBand::from_percentage(89.9), GradeBand::Great);
        assert_eq!(GradeBand::from_percentage(80.0), GradeBand::Great);
        assert_eq!(GradeBand::from_percentage(70.0), GradeBand::Good);
        assert_eq!(GradeBand::from_percentage(60.0), GradeBand::Passing);
        assert_eq!(
            GradeBand::from_percentage(59.9),
            GradeBand::NeedsImprovement
        );
    }

    #[test]
    fn snapshot_restore_rearms_with_remaining_time() {
        let start = Utc::now();
        let mut ctrl = SessionController::new(set_of(5), start);
        ctrl.start_exam(config(5, 30), false, start).unwrap();
        ctrl.next();
        ctrl.submit_answer(1, Answer::Bool(true)).unwrap();
        ctrl.check_answer(1).unwrap();

        let snap = ctrl.snapshot(start + Duration::seconds(60));
        let reload = start + Duration::seconds(600);
        let restored = SessionController::restore(snap, reload);
        assert_eq!(restored.phase(), SessionPhase::Running);
        assert_eq!(restored.current_index(), 1);
        assert_eq!(restored.stats().correct_count, 1);
        // 30 minutes minus 10 elapsed leaves 20.
        let remaining = restored.timer.unwrap().remaining_seconds(reload);
        assert_eq!(remaining, 1200);
    }

    #[test]
    fn restore_with_spent_time_force_finishes() {
        let start = Utc::now();
        let mut ctrl = SessionController::new(set_of(2), start);
        ctrl.start_exam(config(2, 1), false, start).unwrap();
        let snap = ctrl.snapshot(start + Duration::seconds(30));
        let restored = SessionController::restore(snap, start + Duration::seconds(120));
        assert_eq!(restored.phase(), SessionPhase::Finished);
        assert!(restored.results().unwrap().time_expired);
    }
}
