//! Core data model types for quizforge.
//!
//! These are the fundamental types the entire system uses to represent
//! exercises, their grading payloads, and exercise collections.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::InvariantError;

/// Canonical blank marker used in fill-in-blank questions and code templates.
pub const BLANK_MARKER: &str = "_____";

/// Default minimum word count for open-text answers.
pub const DEFAULT_MIN_WORDS: usize = 10;

/// A single exercise definition plus its grading rule.
///
/// Deserialization is hand-written: with two flattened fields a derived
/// impl would let `extra` swallow the payload's keys as well, and the
/// record would re-serialize with duplicates. See [`ExerciseRecord`]'s
/// `Deserialize` impl below.
#[derive(Debug, Clone, Serialize)]
pub struct ExerciseRecord {
    /// Identifier, unique within a loaded set. A missing id is assigned
    /// from the record's position at validation time.
    #[serde(default)]
    pub id: u32,
    /// Question text. For fill-in-blank it contains [`BLANK_MARKER`] occurrences.
    pub question: String,
    /// Score weight.
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Type-specific grading payload, tagged by the `type` field.
    #[serde(flatten)]
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageAttachment>,
    /// Fields we do not recognize are carried through unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_points() -> u32 {
    1
}

impl<'de> Deserialize<'de> for ExerciseRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        fn take<T, E>(
            map: &mut serde_json::Map<String, serde_json::Value>,
            key: &str,
        ) -> Result<Option<T>, E>
        where
            T: serde::de::DeserializeOwned,
            E: Error,
        {
            map.remove(key)
                .map(|value| serde_json::from_value(value).map_err(E::custom))
                .transpose()
        }

        let mut map = serde_json::Map::deserialize(deserializer)?;

        let id: u32 = take(&mut map, "id")?.unwrap_or_default();
        let question: String =
            take(&mut map, "question")?.ok_or_else(|| D::Error::missing_field("question"))?;
        let points: u32 = take(&mut map, "points")?.unwrap_or_else(default_points);
        let difficulty: Difficulty = take(&mut map, "difficulty")?.unwrap_or_default();
        let hint: Option<String> = take(&mut map, "hint")?.flatten();
        let explanation: Option<String> = take(&mut map, "explanation")?.flatten();
        let sample_answer: Option<String> = take(&mut map, "sample_answer")?.flatten();
        let image: Option<ImageAttachment> = take(&mut map, "image")?.flatten();

        // The payload reads its tag and fields out of what is left; keys it
        // owns are then dropped so `extra` keeps only genuine unknowns.
        let payload: Payload =
            serde_json::from_value(serde_json::Value::Object(map.clone()))
                .map_err(D::Error::custom)?;
        if let serde_json::Value::Object(owned) =
            serde_json::to_value(&payload).map_err(D::Error::custom)?
        {
            for key in owned.keys() {
                map.remove(key);
            }
        }

        Ok(ExerciseRecord {
            id,
            question,
            points,
            difficulty,
            payload,
            hint,
            explanation,
            sample_answer,
            image,
            extra: map,
        })
    }
}

/// An embedded image shown with the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// Embedded bitmap (data URI).
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
}

/// Exercise difficulty. Unknown values are tolerated and rendered neutrally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "facile")]
    Easy,
    #[default]
    #[serde(alias = "medio")]
    Medium,
    #[serde(alias = "difficile")]
    Hard,
    /// Anything we do not recognize.
    #[serde(other)]
    Unspecified,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Unspecified => "unspecified",
        };
        write!(f, "{s}")
    }
}

/// The nine recognized exercise kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    MultipleChoiceSingle,
    MultipleChoiceMultiple,
    TrueFalse,
    #[serde(alias = "open_ended")]
    OpenText,
    FillInBlank,
    Matching,
    Ordering,
    CodeCompletion,
    DragAndDrop,
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExerciseKind::MultipleChoiceSingle => "multiple_choice_single",
            ExerciseKind::MultipleChoiceMultiple => "multiple_choice_multiple",
            ExerciseKind::TrueFalse => "true_false",
            ExerciseKind::OpenText => "open_text",
            ExerciseKind::FillInBlank => "fill_in_blank",
            ExerciseKind::Matching => "matching",
            ExerciseKind::Ordering => "ordering",
            ExerciseKind::CodeCompletion => "code_completion",
            ExerciseKind::DragAndDrop => "drag_and_drop",
        };
        write!(f, "{s}")
    }
}

/// Type-specific grading data, mutually exclusive by exercise kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    MultipleChoiceSingle {
        options: Vec<String>,
        /// Authored index of the single correct option.
        correct_answer: usize,
    },
    MultipleChoiceMultiple {
        options: Vec<String>,
        /// Authored indices of all correct options.
        correct_answers: Vec<usize>,
    },
    TrueFalse {
        correct_answer: bool,
    },
    #[serde(alias = "open_ended")]
    OpenText {
        #[serde(default)]
        keywords: Vec<String>,
        #[serde(default = "default_min_words")]
        min_words: usize,
    },
    FillInBlank {
        /// One entry per [`BLANK_MARKER`] in the question, in order.
        blanks: Vec<BlankSpec>,
    },
    Matching {
        left_items: Vec<String>,
        right_items: Vec<String>,
        correct_matches: Vec<MatchPair>,
    },
    Ordering {
        items: Vec<String>,
        /// Authored indices in their correct final sequence.
        correct_order: Vec<usize>,
    },
    CodeCompletion {
        code_template: String,
        blanks: Vec<CodeBlank>,
    },
    DragAndDrop {
        draggable_items: Vec<String>,
        categories: Vec<Category>,
    },
}

fn default_min_words() -> usize {
    DEFAULT_MIN_WORDS
}

/// Acceptable answers for one fill-in-blank slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlankSpec {
    /// Zero-based position among the question's blanks.
    pub position: usize,
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// A declared left-to-right correct pairing for matching exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: usize,
    pub right: usize,
}

/// Expected literal text for one code-template blank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeBlank {
    /// Zero-based line index within the code template.
    pub line: usize,
    pub correct_answer: String,
}

/// A drop target owning a set of correct draggable-item indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub correct_items: Vec<usize>,
}

impl Payload {
    /// The kind tag this payload belongs to.
    pub fn kind(&self) -> ExerciseKind {
        match self {
            Payload::MultipleChoiceSingle { .. } => ExerciseKind::MultipleChoiceSingle,
            Payload::MultipleChoiceMultiple { .. } => ExerciseKind::MultipleChoiceMultiple,
            Payload::TrueFalse { .. } => ExerciseKind::TrueFalse,
            Payload::OpenText { .. } => ExerciseKind::OpenText,
            Payload::FillInBlank { .. } => ExerciseKind::FillInBlank,
            Payload::Matching { .. } => ExerciseKind::Matching,
            Payload::Ordering { .. } => ExerciseKind::Ordering,
            Payload::CodeCompletion { .. } => ExerciseKind::CodeCompletion,
            Payload::DragAndDrop { .. } => ExerciseKind::DragAndDrop,
        }
    }
}

impl ExerciseRecord {
    pub fn kind(&self) -> ExerciseKind {
        self.payload.kind()
    }

    /// Check the type-specific structural invariants.
    ///
    /// Violations reject a record at upload validation and raise a
    /// construction error at authoring time.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.question.trim().is_empty() {
            return Err(InvariantError::EmptyQuestion);
        }
        if self.points == 0 {
            return Err(InvariantError::ZeroPoints);
        }

        match &self.payload {
            Payload::MultipleChoiceSingle {
                options,
                correct_answer,
            } => {
                if options.len() < 2 {
                    return Err(InvariantError::TooFewOptions { found: options.len() });
                }
                if *correct_answer >= options.len() {
                    return Err(InvariantError::IndexOutOfRange {
                        what: "correct_answer",
                        index: *correct_answer,
                        len: options.len(),
                    });
                }
            }
            Payload::MultipleChoiceMultiple {
                options,
                correct_answers,
            } => {
                if options.len() < 2 {
                    return Err(InvariantError::TooFewOptions { found: options.len() });
                }
                if correct_answers.is_empty() {
                    return Err(InvariantError::NoCorrectAnswers);
                }
                let mut seen = std::collections::HashSet::new();
                for &idx in correct_answers {
                    if idx >= options.len() {
                        return Err(InvariantError::IndexOutOfRange {
                            what: "correct_answers",
                            index: idx,
                            len: options.len(),
                        });
                    }
                    if !seen.insert(idx) {
                        return Err(InvariantError::DuplicateIndex { index: idx });
                    }
                }
            }
            Payload::TrueFalse { .. } => {}
            Payload::OpenText { min_words, .. } => {
                if *min_words == 0 {
                    return Err(InvariantError::ZeroMinWords);
                }
            }
            Payload::FillInBlank { blanks } => {
                let markers = self.question.matches(BLANK_MARKER).count();
                if markers == 0 {
                    return Err(InvariantError::NoBlankMarkers);
                }
                if markers != blanks.len() {
                    return Err(InvariantError::BlankCountMismatch {
                        markers,
                        answers: blanks.len(),
                    });
                }
                for blank in blanks {
                    if blank.correct_answers.is_empty() {
                        return Err(InvariantError::BlankWithoutAnswers {
                            position: blank.position,
                        });
                    }
                }
            }
            Payload::Matching {
                left_items,
                right_items,
                correct_matches,
            } => {
                if left_items.is_empty() || left_items.len() != right_items.len() {
                    return Err(InvariantError::UnbalancedMatching {
                        left: left_items.len(),
                        right: right_items.len(),
                    });
                }
                let mut lefts = std::collections::HashSet::new();
                for pair in correct_matches {
                    if pair.left >= left_items.len() {
                        return Err(InvariantError::IndexOutOfRange {
                            what: "correct_matches.left",
                            index: pair.left,
                            len: left_items.len(),
                        });
                    }
                    if pair.right >= right_items.len() {
                        return Err(InvariantError::IndexOutOfRange {
                            what: "correct_matches.right",
                            index: pair.right,
                            len: right_items.len(),
                        });
                    }
                    if !lefts.insert(pair.left) {
                        return Err(InvariantError::DuplicateIndex { index: pair.left });
                    }
                }
                if lefts.len() != left_items.len() {
                    return Err(InvariantError::MissingMatchPairs {
                        declared: lefts.len(),
                        expected: left_items.len(),
                    });
                }
            }
            Payload::Ordering {
                items,
                correct_order,
            } => {
                if correct_order.len() != items.len() {
                    return Err(InvariantError::OrderLengthMismatch {
                        order: correct_order.len(),
                        items: items.len(),
                    });
                }
                let mut seen = vec![false; items.len()];
                for &idx in correct_order {
                    if idx >= items.len() {
                        return Err(InvariantError::IndexOutOfRange {
                            what: "correct_order",
                            index: idx,
                            len: items.len(),
                        });
                    }
                    if seen[idx] {
                        return Err(InvariantError::DuplicateIndex { index: idx });
                    }
                    seen[idx] = true;
                }
            }
            Payload::CodeCompletion {
                code_template,
                blanks,
            } => {
                let markers = code_template.matches(BLANK_MARKER).count();
                if markers != blanks.len() {
                    return Err(InvariantError::BlankCountMismatch {
                        markers,
                        answers: blanks.len(),
                    });
                }
                let lines: Vec<&str> = code_template.lines().collect();
                for blank in blanks {
                    let line = lines.get(blank.line).ok_or(InvariantError::IndexOutOfRange {
                        what: "blanks.line",
                        index: blank.line,
                        len: lines.len(),
                    })?;
                    if !line.contains(BLANK_MARKER) {
                        return Err(InvariantError::LineWithoutMarker { line: blank.line });
                    }
                }
            }
            Payload::DragAndDrop {
                draggable_items,
                categories,
            } => {
                if categories.is_empty() {
                    return Err(InvariantError::NoCategories);
                }
                let mut claimed = std::collections::HashSet::new();
                for category in categories {
                    for &idx in &category.correct_items {
                        if idx >= draggable_items.len() {
                            return Err(InvariantError::IndexOutOfRange {
                                what: "correct_items",
                                index: idx,
                                len: draggable_items.len(),
                            });
                        }
                        if !claimed.insert(idx) {
                            return Err(InvariantError::DuplicateIndex { index: idx });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// A collection of exercises for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    #[serde(default = "default_course")]
    pub course: String,
    #[serde(default)]
    pub description: String,
    pub exercises: Vec<ExerciseRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<UploadMetadata>,
}

fn default_course() -> String {
    "Untitled Course".to_string()
}

/// Provenance recorded when a collection arrives through the upload boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMetadata {
    pub file_name: String,
    pub original_count: usize,
    pub valid_count: usize,
}
