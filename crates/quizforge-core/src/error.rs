//! Error types for exercise loading and validation.
//!
//! Defined in `quizforge-core` so callers can classify failures (structural
//! invariant violation vs. malformed upload) without string matching.

use thiserror::Error;

/// A structural invariant violated by an exercise definition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvariantError {
    #[error("question text is empty")]
    EmptyQuestion,

    #[error("points must be at least 1")]
    ZeroPoints,

    #[error("at least 2 options are required, found {found}")]
    TooFewOptions { found: usize },

    #[error("at least one correct answer is required")]
    NoCorrectAnswers,

    #[error("{what} index {index} out of range for length {len}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("index {index} appears more than once")]
    DuplicateIndex { index: usize },

    #[error("min_words must be at least 1")]
    ZeroMinWords,

    #[error("question contains no blank markers")]
    NoBlankMarkers,

    #[error("{markers} blank markers but {answers} answer specs")]
    BlankCountMismatch { markers: usize, answers: usize },

    #[error("blank at position {position} has no accepted answers")]
    BlankWithoutAnswers { position: usize },

    #[error("left and right columns must be non-empty and equal length ({left} vs {right})")]
    UnbalancedMatching { left: usize, right: usize },

    #[error("{declared} match pairs declared, {expected} left items to cover")]
    MissingMatchPairs { declared: usize, expected: usize },

    #[error("correct_order has {order} entries for {items} items")]
    OrderLengthMismatch { order: usize, items: usize },

    #[error("blank declared on line {line} but the line has no marker")]
    LineWithoutMarker { line: usize },

    #[error("at least one category is required")]
    NoCategories,
}

/// Errors raised at the upload and loading boundary.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file extension is not `.json`.
    #[error("unsupported file type: {0} (expected a .json file)")]
    NotJson(String),

    /// The file exceeds the size cap.
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    /// The content is not parseable JSON, even after repair.
    #[error("invalid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The JSON parsed but holds no usable exercise array.
    #[error("no exercise array found in file")]
    NoExercises,

    /// Every exercise in the file failed validation.
    #[error("all {0} exercises failed validation")]
    NothingValid(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A submitted answer that does not fit the exercise it was aimed at.
///
/// These indicate a caller bug (wrong answer shape) rather than a wrong
/// answer; a wrong-but-well-formed answer is a failing [`crate::renderer::Verdict`],
/// not an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("a {expected} exercise cannot take a {given} answer")]
    KindMismatch {
        expected: &'static str,
        given: &'static str,
    },

    #[error("expected {expected} entries, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    #[error("index {index} out of range for {len} displayed entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("sequence is not a permutation of the displayed positions")]
    NotAPermutation,
}

impl LoadError {
    /// Returns `true` when the failure is about the file itself rather
    /// than its contents.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            LoadError::NotJson(_) | LoadError::TooLarge { .. } | LoadError::Io(_)
        )
    }
}
