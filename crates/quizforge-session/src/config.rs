//! Exam configuration and the filter predicate it induces.

use serde::{Deserialize, Serialize};

use quizforge_core::model::{Difficulty, ExerciseKind, ExerciseRecord};

/// User-chosen exam parameters, fixed at exam start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamConfig {
    /// How many questions to draw from the matching pool.
    pub question_count: usize,
    /// Countdown length in minutes; 0 disables the timer.
    pub time_limit_minutes: u32,
    #[serde(default)]
    pub difficulty: DifficultyFilter,
    /// Exercise kinds admitted into the pool. Must be non-empty.
    pub kinds: Vec<ExerciseKind>,
    /// Shuffle the matching pool before taking the first N.
    #[serde(default = "default_true")]
    pub randomize: bool,
    /// Reveal stored explanations during the exam.
    #[serde(default)]
    pub show_explanations: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ExamConfig {
    fn default() -> Self {
        ExamConfig {
            question_count: 10,
            time_limit_minutes: 30,
            difficulty: DifficultyFilter::Any,
            kinds: vec![
                ExerciseKind::MultipleChoiceSingle,
                ExerciseKind::MultipleChoiceMultiple,
                ExerciseKind::TrueFalse,
                ExerciseKind::OpenText,
                ExerciseKind::FillInBlank,
                ExerciseKind::Matching,
                ExerciseKind::Ordering,
                ExerciseKind::CodeCompletion,
                ExerciseKind::DragAndDrop,
            ],
            randomize: true,
            show_explanations: false,
        }
    }
}

impl ExamConfig {
    /// The combined {kind, difficulty} pool predicate.
    pub fn admits(&self, record: &ExerciseRecord) -> bool {
        self.kinds.contains(&record.kind()) && self.difficulty.admits(record.difficulty)
    }

    pub fn time_limit_seconds(&self) -> i64 {
        i64::from(self.time_limit_minutes) * 60
    }
}

/// Difficulty filter. `Any` admits everything, including records whose
/// difficulty was unrecognized at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyFilter {
    #[default]
    Any,
    Only(Difficulty),
}

impl DifficultyFilter {
    pub fn admits(&self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyFilter::Any => true,
            DifficultyFilter::Only(wanted) => difficulty == *wanted,
        }
    }
}
