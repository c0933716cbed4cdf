//! Renderer hierarchy: one evaluation strategy per exercise kind.
//!
//! A renderer owns one [`ExerciseRecord`] plus the mutable input state the
//! user has produced so far. Lists shown to the user (options, right-column
//! items, orderable items, draggable items) are shuffled at construction;
//! the renderer keeps a mapping from displayed position back to the authored
//! index, so evaluation is always performed against authored indices.
//!
//! `evaluate` never fails: a missing or wrong answer is a failing
//! [`Verdict`], not an error. Only `submit` can reject input, and then only
//! for shape problems (wrong answer kind, out-of-range index).

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::error::AnswerError;
use crate::model::{
    BlankSpec, Category, CodeBlank, Difficulty, ExerciseKind, ExerciseRecord, MatchPair, Payload,
    BLANK_MARKER,
};

/// Outcome of evaluating one exercise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub feedback: String,
}

impl Verdict {
    fn pass(feedback: impl Into<String>) -> Self {
        Verdict {
            correct: true,
            feedback: feedback.into(),
        }
    }

    fn fail(feedback: impl Into<String>) -> Self {
        Verdict {
            correct: false,
            feedback: feedback.into(),
        }
    }
}

/// A user's answer, expressed in terms of *displayed* positions.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// One displayed option index (single-choice).
    Selection(usize),
    /// A set of displayed option indices (multiple-choice).
    Selections(Vec<usize>),
    Bool(bool),
    /// Free text (open-text answers).
    Text(String),
    /// One string per blank, in blank order (fill-in-blank, code completion).
    Blanks(Vec<String>),
    /// For each left item, the displayed right index it is matched to.
    Pairs(Vec<Option<usize>>),
    /// The displayed positions in the user's chosen order (ordering).
    Sequence(Vec<usize>),
    /// For each displayed draggable item, the category it was dropped into.
    Placements(Vec<Option<usize>>),
}

impl Answer {
    fn kind_name(&self) -> &'static str {
        match self {
            Answer::Selection(_) => "selection",
            Answer::Selections(_) => "selections",
            Answer::Bool(_) => "boolean",
            Answer::Text(_) => "text",
            Answer::Blanks(_) => "blanks",
            Answer::Pairs(_) => "pairs",
            Answer::Sequence(_) => "sequence",
            Answer::Placements(_) => "placements",
        }
    }
}

/// What a renderer asks the frontend to display.
#[derive(Debug, Clone)]
pub struct Presentation {
    pub id: u32,
    pub question: String,
    pub kind: ExerciseKind,
    pub points: u32,
    pub difficulty: Difficulty,
    pub has_hint: bool,
    pub body: PresentationBody,
}

/// Kind-specific display content, already shuffled where applicable.
#[derive(Debug, Clone)]
pub enum PresentationBody {
    Options { options: Vec<String>, multiple: bool },
    TrueFalse,
    TextEntry { min_words: usize },
    Blanks { segments: Vec<String> },
    Matching { left: Vec<String>, right: Vec<String> },
    Ordering { items: Vec<String> },
    Code { lines: Vec<String> },
    Categories { items: Vec<String>, categories: Vec<String> },
}

/// Capability set shared by all nine exercise kinds.
pub trait Renderer {
    fn record(&self) -> &ExerciseRecord;

    fn kind(&self) -> ExerciseKind {
        self.record().kind()
    }

    fn presentation(&self) -> Presentation;

    /// Store the user's current input. Rejects only shape problems.
    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError>;

    /// Grade the stored input. Pure with respect to that input.
    fn evaluate(&self) -> Verdict;

    /// Discard all user input, leaving the record untouched.
    fn reset(&mut self);
}

/// Fisher-Yates shuffle that also returns `mapping[display] = authored_index`.
fn shuffle_with_mapping<T: Clone, R: Rng>(items: &[T], rng: &mut R) -> (Vec<T>, Vec<usize>) {
    let mut mapping: Vec<usize> = (0..items.len()).collect();
    mapping.shuffle(rng);
    let shuffled = mapping.iter().map(|&i| items[i].clone()).collect();
    (shuffled, mapping)
}

fn base_presentation(record: &ExerciseRecord, body: PresentationBody) -> Presentation {
    Presentation {
        id: record.id,
        question: record.question.clone(),
        kind: record.kind(),
        points: record.points,
        difficulty: record.difficulty,
        has_hint: record.hint.is_some(),
        body,
    }
}

const NO_SELECTION: &str = "Select an answer first.";

// ---------------------------------------------------------------------------
// multiple_choice_single

pub struct MultipleChoiceSingleRenderer {
    record: ExerciseRecord,
    options: Vec<String>,
    correct: usize,
    mapping: Vec<usize>,
    selected: Option<usize>,
}

impl MultipleChoiceSingleRenderer {
    pub fn new(record: ExerciseRecord, options: Vec<String>, correct: usize) -> Self {
        Self::with_rng(record, options, correct, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(
        record: ExerciseRecord,
        options: Vec<String>,
        correct: usize,
        rng: &mut R,
    ) -> Self {
        let (_, mapping) = shuffle_with_mapping(&options, rng);
        MultipleChoiceSingleRenderer {
            record,
            options,
            correct,
            mapping,
            selected: None,
        }
    }

    fn displayed_options(&self) -> Vec<String> {
        self.mapping.iter().map(|&i| self.options[i].clone()).collect()
    }
}

impl Renderer for MultipleChoiceSingleRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        base_presentation(
            &self.record,
            PresentationBody::Options {
                options: self.displayed_options(),
                multiple: false,
            },
        )
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Selection(idx) => {
                if idx >= self.options.len() {
                    return Err(AnswerError::IndexOutOfRange {
                        index: idx,
                        len: self.options.len(),
                    });
                }
                self.selected = Some(idx);
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "single-choice",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let Some(displayed) = self.selected else {
            return Verdict::fail(NO_SELECTION);
        };
        if self.mapping[displayed] == self.correct {
            Verdict::pass("Correct!")
        } else {
            Verdict::fail(format!(
                "Incorrect. The correct answer is: {}",
                self.options[self.correct]
            ))
        }
    }

    fn reset(&mut self) {
        self.selected = None;
    }
}

// ---------------------------------------------------------------------------
// multiple_choice_multiple

pub struct MultipleChoiceMultipleRenderer {
    record: ExerciseRecord,
    options: Vec<String>,
    correct: BTreeSet<usize>,
    mapping: Vec<usize>,
    selected: Vec<usize>,
}

impl MultipleChoiceMultipleRenderer {
    pub fn new(record: ExerciseRecord, options: Vec<String>, correct: Vec<usize>) -> Self {
        Self::with_rng(record, options, correct, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(
        record: ExerciseRecord,
        options: Vec<String>,
        correct: Vec<usize>,
        rng: &mut R,
    ) -> Self {
        let (_, mapping) = shuffle_with_mapping(&options, rng);
        MultipleChoiceMultipleRenderer {
            record,
            options,
            correct: correct.into_iter().collect(),
            mapping,
            selected: Vec::new(),
        }
    }
}

impl Renderer for MultipleChoiceMultipleRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        let options = self.mapping.iter().map(|&i| self.options[i].clone()).collect();
        base_presentation(
            &self.record,
            PresentationBody::Options {
                options,
                multiple: true,
            },
        )
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Selections(indices) => {
                for &idx in &indices {
                    if idx >= self.options.len() {
                        return Err(AnswerError::IndexOutOfRange {
                            index: idx,
                            len: self.options.len(),
                        });
                    }
                }
                self.selected = indices;
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "multiple-choice",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        if self.selected.is_empty() {
            return Verdict::fail(NO_SELECTION);
        }
        let chosen: BTreeSet<usize> = self.selected.iter().map(|&d| self.mapping[d]).collect();
        if chosen == self.correct {
            Verdict::pass("Correct!")
        } else {
            Verdict::fail(format!(
                "Incorrect. {} of {} correct options chosen.",
                chosen.intersection(&self.correct).count(),
                self.correct.len()
            ))
        }
    }

    fn reset(&mut self) {
        self.selected.clear();
    }
}

// ---------------------------------------------------------------------------
// true_false

pub struct TrueFalseRenderer {
    record: ExerciseRecord,
    correct: bool,
    selected: Option<bool>,
}

impl TrueFalseRenderer {
    pub fn new(record: ExerciseRecord, correct: bool) -> Self {
        TrueFalseRenderer {
            record,
            correct,
            selected: None,
        }
    }
}

impl Renderer for TrueFalseRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        base_presentation(&self.record, PresentationBody::TrueFalse)
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Bool(value) => {
                self.selected = Some(value);
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "true/false",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let Some(value) = self.selected else {
            return Verdict::fail(NO_SELECTION);
        };
        if value == self.correct {
            Verdict::pass("Correct!")
        } else {
            Verdict::fail(format!("Incorrect. The statement is {}.", self.correct))
        }
    }

    fn reset(&mut self) {
        self.selected = None;
    }
}

// ---------------------------------------------------------------------------
// open_text

pub struct OpenTextRenderer {
    record: ExerciseRecord,
    keywords: Vec<String>,
    min_words: usize,
    text: String,
}

impl OpenTextRenderer {
    pub fn new(record: ExerciseRecord, keywords: Vec<String>, min_words: usize) -> Self {
        OpenTextRenderer {
            record,
            keywords,
            min_words,
            text: String::new(),
        }
    }
}

impl Renderer for OpenTextRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        base_presentation(
            &self.record,
            PresentationBody::TextEntry {
                min_words: self.min_words,
            },
        )
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Text(text) => {
                self.text = text;
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "open-text",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let word_count = self.text.split_whitespace().count();
        if word_count < self.min_words {
            return Verdict::fail(format!(
                "Answer too short: {} of {} required words.",
                word_count, self.min_words
            ));
        }
        if !self.keywords.is_empty() {
            let lowered = self.text.to_lowercase();
            let hit = self
                .keywords
                .iter()
                .any(|kw| lowered.contains(&kw.to_lowercase()));
            if !hit {
                return Verdict::fail("The answer does not touch any of the expected topics.");
            }
        }
        Verdict::pass("Answer accepted.")
    }

    fn reset(&mut self) {
        self.text.clear();
    }
}

// ---------------------------------------------------------------------------
// fill_in_blank

pub struct FillInBlankRenderer {
    record: ExerciseRecord,
    blanks: Vec<BlankSpec>,
    inputs: Vec<String>,
}

impl FillInBlankRenderer {
    pub fn new(record: ExerciseRecord, mut blanks: Vec<BlankSpec>) -> Self {
        blanks.sort_by_key(|b| b.position);
        let inputs = vec![String::new(); blanks.len()];
        FillInBlankRenderer {
            record,
            blanks,
            inputs,
        }
    }
}

fn blank_matches(spec: &BlankSpec, input: &str) -> bool {
    let trimmed = input.trim();
    spec.correct_answers.iter().any(|accepted| {
        if spec.case_sensitive {
            trimmed == accepted
        } else {
            // Answers can be accented Italian; full case folding, not ASCII.
            trimmed.to_lowercase() == accepted.to_lowercase()
        }
    })
}

impl Renderer for FillInBlankRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        let segments = self
            .record
            .question
            .split(BLANK_MARKER)
            .map(str::to_string)
            .collect();
        base_presentation(&self.record, PresentationBody::Blanks { segments })
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Blanks(values) => {
                if values.len() != self.blanks.len() {
                    return Err(AnswerError::ArityMismatch {
                        expected: self.blanks.len(),
                        got: values.len(),
                    });
                }
                self.inputs = values;
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "fill-in-blank",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let correct = self
            .blanks
            .iter()
            .zip(&self.inputs)
            .filter(|(spec, input)| blank_matches(spec, input))
            .count();
        let total = self.blanks.len();
        if correct == total {
            Verdict::pass(format!("Correct! {correct}/{total} blanks correct."))
        } else {
            Verdict::fail(format!("{correct}/{total} blanks correct."))
        }
    }

    fn reset(&mut self) {
        for input in &mut self.inputs {
            input.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// matching

pub struct MatchingRenderer {
    record: ExerciseRecord,
    left: Vec<String>,
    right: Vec<String>,
    /// `correct[left] = authored right index`.
    correct: Vec<usize>,
    right_mapping: Vec<usize>,
    /// Per left item, the chosen *displayed* right index.
    chosen: Vec<Option<usize>>,
}

impl MatchingRenderer {
    pub fn new(
        record: ExerciseRecord,
        left: Vec<String>,
        right: Vec<String>,
        pairs: Vec<MatchPair>,
    ) -> Self {
        Self::with_rng(record, left, right, pairs, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(
        record: ExerciseRecord,
        left: Vec<String>,
        right: Vec<String>,
        pairs: Vec<MatchPair>,
        rng: &mut R,
    ) -> Self {
        let mut correct = vec![0usize; left.len()];
        for pair in &pairs {
            correct[pair.left] = pair.right;
        }
        let (_, right_mapping) = shuffle_with_mapping(&right, rng);
        let chosen = vec![None; left.len()];
        MatchingRenderer {
            record,
            left,
            right,
            correct,
            right_mapping,
            chosen,
        }
    }
}

impl Renderer for MatchingRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        let right = self
            .right_mapping
            .iter()
            .map(|&i| self.right[i].clone())
            .collect();
        base_presentation(
            &self.record,
            PresentationBody::Matching {
                left: self.left.clone(),
                right,
            },
        )
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Pairs(pairs) => {
                if pairs.len() != self.left.len() {
                    return Err(AnswerError::ArityMismatch {
                        expected: self.left.len(),
                        got: pairs.len(),
                    });
                }
                for idx in pairs.iter().flatten() {
                    if *idx >= self.right.len() {
                        return Err(AnswerError::IndexOutOfRange {
                            index: *idx,
                            len: self.right.len(),
                        });
                    }
                }
                self.chosen = pairs;
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "matching",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let correct = self
            .chosen
            .iter()
            .enumerate()
            .filter(|(left, chosen)| {
                chosen.is_some_and(|displayed| self.right_mapping[displayed] == self.correct[*left])
            })
            .count();
        let total = self.left.len();
        if correct == total {
            Verdict::pass("Correct! All pairs matched.")
        } else {
            Verdict::fail(format!("{correct}/{total} pairs matched."))
        }
    }

    fn reset(&mut self) {
        for slot in &mut self.chosen {
            *slot = None;
        }
    }
}

// ---------------------------------------------------------------------------
// ordering

pub struct OrderingRenderer {
    record: ExerciseRecord,
    items: Vec<String>,
    correct_order: Vec<usize>,
    mapping: Vec<usize>,
    /// Displayed positions in the user's submitted order.
    submitted: Option<Vec<usize>>,
}

impl OrderingRenderer {
    pub fn new(record: ExerciseRecord, items: Vec<String>, correct_order: Vec<usize>) -> Self {
        Self::with_rng(record, items, correct_order, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(
        record: ExerciseRecord,
        items: Vec<String>,
        correct_order: Vec<usize>,
        rng: &mut R,
    ) -> Self {
        let (_, mapping) = shuffle_with_mapping(&items, rng);
        OrderingRenderer {
            record,
            items,
            correct_order,
            mapping,
            submitted: None,
        }
    }

    /// The authored index shown at each display position.
    pub fn display_mapping(&self) -> &[usize] {
        &self.mapping
    }
}

impl Renderer for OrderingRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        let items = self.mapping.iter().map(|&i| self.items[i].clone()).collect();
        base_presentation(&self.record, PresentationBody::Ordering { items })
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Sequence(sequence) => {
                if sequence.len() != self.items.len() {
                    return Err(AnswerError::ArityMismatch {
                        expected: self.items.len(),
                        got: sequence.len(),
                    });
                }
                let mut seen = vec![false; self.items.len()];
                for &pos in &sequence {
                    if pos >= self.items.len() || seen[pos] {
                        return Err(AnswerError::NotAPermutation);
                    }
                    seen[pos] = true;
                }
                self.submitted = Some(sequence);
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "ordering",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let Some(sequence) = &self.submitted else {
            return Verdict::fail("Arrange the items first.");
        };
        let as_authored: Vec<usize> = sequence.iter().map(|&pos| self.mapping[pos]).collect();
        if as_authored == self.correct_order {
            Verdict::pass("Correct! The sequence is right.")
        } else {
            Verdict::fail("Incorrect sequence.")
        }
    }

    fn reset(&mut self) {
        self.submitted = None;
        // Reshuffle so a retry does not start from the previous layout.
        let (_, mapping) = shuffle_with_mapping(&self.items, &mut rand::rng());
        self.mapping = mapping;
    }
}

// ---------------------------------------------------------------------------
// code_completion

pub struct CodeCompletionRenderer {
    record: ExerciseRecord,
    template: String,
    blanks: Vec<CodeBlank>,
    inputs: Vec<String>,
}

impl CodeCompletionRenderer {
    pub fn new(record: ExerciseRecord, template: String, blanks: Vec<CodeBlank>) -> Self {
        let inputs = vec![String::new(); blanks.len()];
        CodeCompletionRenderer {
            record,
            template,
            blanks,
            inputs,
        }
    }
}

impl Renderer for CodeCompletionRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        let lines = self.template.lines().map(str::to_string).collect();
        base_presentation(&self.record, PresentationBody::Code { lines })
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Blanks(values) => {
                if values.len() != self.blanks.len() {
                    return Err(AnswerError::ArityMismatch {
                        expected: self.blanks.len(),
                        got: values.len(),
                    });
                }
                self.inputs = values;
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "code-completion",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        // Case-sensitive; only leading/trailing whitespace is forgiven.
        let correct = self
            .blanks
            .iter()
            .zip(&self.inputs)
            .filter(|(blank, input)| input.trim() == blank.correct_answer)
            .count();
        let total = self.blanks.len();
        if correct == total {
            Verdict::pass("Correct! The code is complete.")
        } else {
            Verdict::fail(format!("{correct}/{total} blanks correct."))
        }
    }

    fn reset(&mut self) {
        for input in &mut self.inputs {
            input.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// drag_and_drop

pub struct DragAndDropRenderer {
    record: ExerciseRecord,
    items: Vec<String>,
    categories: Vec<Category>,
    item_mapping: Vec<usize>,
    /// Per displayed item, the category it currently sits in.
    placements: Vec<Option<usize>>,
}

impl DragAndDropRenderer {
    pub fn new(record: ExerciseRecord, items: Vec<String>, categories: Vec<Category>) -> Self {
        Self::with_rng(record, items, categories, &mut rand::rng())
    }

    pub fn with_rng<R: Rng>(
        record: ExerciseRecord,
        items: Vec<String>,
        categories: Vec<Category>,
        rng: &mut R,
    ) -> Self {
        let (_, item_mapping) = shuffle_with_mapping(&items, rng);
        let placements = vec![None; items.len()];
        DragAndDropRenderer {
            record,
            items,
            categories,
            item_mapping,
            placements,
        }
    }
}

impl Renderer for DragAndDropRenderer {
    fn record(&self) -> &ExerciseRecord {
        &self.record
    }

    fn presentation(&self) -> Presentation {
        let items = self
            .item_mapping
            .iter()
            .map(|&i| self.items[i].clone())
            .collect();
        let categories = self.categories.iter().map(|c| c.name.clone()).collect();
        base_presentation(
            &self.record,
            PresentationBody::Categories { items, categories },
        )
    }

    fn submit(&mut self, answer: Answer) -> Result<(), AnswerError> {
        match answer {
            Answer::Placements(placements) => {
                if placements.len() != self.items.len() {
                    return Err(AnswerError::ArityMismatch {
                        expected: self.items.len(),
                        got: placements.len(),
                    });
                }
                for idx in placements.iter().flatten() {
                    if *idx >= self.categories.len() {
                        return Err(AnswerError::IndexOutOfRange {
                            index: *idx,
                            len: self.categories.len(),
                        });
                    }
                }
                self.placements = placements;
                Ok(())
            }
            other => Err(AnswerError::KindMismatch {
                expected: "drag-and-drop",
                given: other.kind_name(),
            }),
        }
    }

    fn evaluate(&self) -> Verdict {
        let mut placed: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.categories.len()];
        for (displayed, placement) in self.placements.iter().enumerate() {
            if let Some(category) = placement {
                placed[*category].insert(self.item_mapping[displayed]);
            }
        }
        let correct = self
            .categories
            .iter()
            .zip(&placed)
            .filter(|(category, contents)| {
                let expected: BTreeSet<usize> = category.correct_items.iter().copied().collect();
                expected == **contents
            })
            .count();
        let total = self.categories.len();
        if correct == total {
            Verdict::pass("Correct! Every item is in the right category.")
        } else {
            Verdict::fail(format!("{correct}/{total} categories correct."))
        }
    }

    fn reset(&mut self) {
        // Return every item to the unplaced pool.
        for slot in &mut self.placements {
            *slot = None;
        }
    }
}

// ---------------------------------------------------------------------------
// factory

/// Build the concrete renderer for a record. Returns `None` (with a warning)
/// when the record violates its structural invariants, so one bad record
/// never aborts a batch.
pub fn create_renderer(record: &ExerciseRecord) -> Option<Box<dyn Renderer>> {
    create_renderer_with_rng(record, &mut rand::rng())
}

/// Seedable variant of [`create_renderer`] for deterministic presentation.
pub fn create_renderer_with_rng<R: Rng>(
    record: &ExerciseRecord,
    rng: &mut R,
) -> Option<Box<dyn Renderer>> {
    if let Err(err) = record.check_invariants() {
        tracing::warn!(id = record.id, %err, "skipping invalid exercise");
        return None;
    }
    let record = record.clone();
    let renderer: Box<dyn Renderer> = match record.payload.clone() {
        Payload::MultipleChoiceSingle {
            options,
            correct_answer,
        } => Box::new(MultipleChoiceSingleRenderer::with_rng(
            record,
            options,
            correct_answer,
            rng,
        )),
        Payload::MultipleChoiceMultiple {
            options,
            correct_answers,
        } => Box::new(MultipleChoiceMultipleRenderer::with_rng(
            record,
            options,
            correct_answers,
            rng,
        )),
        Payload::TrueFalse { correct_answer } => {
            Box::new(TrueFalseRenderer::new(record, correct_answer))
        }
        Payload::OpenText {
            keywords,
            min_words,
        } => Box::new(OpenTextRenderer::new(record, keywords, min_words)),
        Payload::FillInBlank { blanks } => Box::new(FillInBlankRenderer::new(record, blanks)),
        Payload::Matching {
            left_items,
            right_items,
            correct_matches,
        } => Box::new(MatchingRenderer::with_rng(
            record,
            left_items,
            right_items,
            correct_matches,
            rng,
        )),
        Payload::Ordering {
            items,
            correct_order,
        } => Box::new(OrderingRenderer::with_rng(record, items, correct_order, rng)),
        Payload::CodeCompletion {
            code_template,
            blanks,
        } => Box::new(CodeCompletionRenderer::new(record, code_template, blanks)),
        Payload::DragAndDrop {
            draggable_items,
            categories,
        } => Box::new(DragAndDropRenderer::with_rng(
            record,
            draggable_items,
            categories,
            rng,
        )),
    };
    Some(renderer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(payload: Payload, question: &str) -> ExerciseRecord {
        ExerciseRecord {
            id: 1,
            question: question.into(),
            points: 1,
            difficulty: Difficulty::Easy,
            payload,
            hint: None,
            explanation: None,
            sample_answer: None,
            image: None,
            extra: serde_json::Map::new(),
        }
    }

    fn mcs_record() -> ExerciseRecord {
        record(
            Payload::MultipleChoiceSingle {
                options: vec!["3".into(), "4".into(), "5".into(), "6".into()],
                correct_answer: 1,
            },
            "What is 2 + 2?",
        )
    }

    /// Find the displayed position of an authored index.
    fn display_pos(mapping: &[usize], authored: usize) -> usize {
        mapping.iter().position(|&m| m == authored).unwrap()
    }

    #[test]
    fn single_choice_grades_against_authored_indices() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let rec = mcs_record();
            let mut r = create_renderer_with_rng(&rec, &mut rng).unwrap();
            // Pick what is displayed where "4" landed.
            let PresentationBody::Options { options, .. } = r.presentation().body else {
                panic!("wrong body");
            };
            let pos = options.iter().position(|o| o == "4").unwrap();
            r.submit(Answer::Selection(pos)).unwrap();
            assert!(r.evaluate().correct, "seed {seed}");
        }
    }

    #[test]
    fn single_choice_failure_names_the_correct_option() {
        let mut rng = StdRng::seed_from_u64(7);
        let rec = mcs_record();
        let mut r = create_renderer_with_rng(&rec, &mut rng).unwrap();
        let PresentationBody::Options { options, .. } = r.presentation().body else {
            panic!("wrong body");
        };
        let wrong = options.iter().position(|o| o == "5").unwrap();
        r.submit(Answer::Selection(wrong)).unwrap();
        let verdict = r.evaluate();
        assert!(!verdict.correct);
        assert!(verdict.feedback.contains('4'), "{}", verdict.feedback);
    }

    #[test]
    fn no_selection_fails_without_panicking() {
        let r = create_renderer(&mcs_record()).unwrap();
        let verdict = r.evaluate();
        assert!(!verdict.correct);
        assert_eq!(verdict.feedback, NO_SELECTION);
    }

    #[test]
    fn multiple_choice_requires_exact_set() {
        let rec = record(
            Payload::MultipleChoiceMultiple {
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answers: vec![0, 2],
            },
            "Pick the vowels... sort of",
        );
        let mut rng = StdRng::seed_from_u64(3);
        let mut r = create_renderer_with_rng(&rec, &mut rng).unwrap();
        let PresentationBody::Options { options, .. } = r.presentation().body else {
            panic!("wrong body");
        };
        let a = options.iter().position(|o| o == "a").unwrap();
        let c = options.iter().position(|o| o == "c").unwrap();
        r.submit(Answer::Selections(vec![a])).unwrap();
        assert!(!r.evaluate().correct);
        r.submit(Answer::Selections(vec![a, c])).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn fill_in_blank_is_case_insensitive_by_default() {
        let rec = record(
            Payload::FillInBlank {
                blanks: vec![BlankSpec {
                    position: 0,
                    correct_answers: vec!["password".into()],
                    case_sensitive: false,
                }],
            },
            "Enter your _____ to log in",
        );
        let mut r = create_renderer(&rec).unwrap();
        r.submit(Answer::Blanks(vec!["  PASSWORD ".into()])).unwrap();
        assert!(r.evaluate().correct);

        r.submit(Answer::Blanks(vec!["pass".into()])).unwrap();
        let verdict = r.evaluate();
        assert!(!verdict.correct);
        assert!(verdict.feedback.contains("0/1"), "{}", verdict.feedback);
    }

    #[test]
    fn fill_in_blank_case_folds_accented_characters() {
        let rec = record(
            Payload::FillInBlank {
                blanks: vec![BlankSpec {
                    position: 0,
                    correct_answers: vec!["però".into()],
                    case_sensitive: false,
                }],
            },
            "Va bene, _____ attenzione",
        );
        let mut r = create_renderer(&rec).unwrap();
        r.submit(Answer::Blanks(vec!["PERÒ".into()])).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn fill_in_blank_respects_case_sensitivity() {
        let rec = record(
            Payload::FillInBlank {
                blanks: vec![BlankSpec {
                    position: 0,
                    correct_answers: vec!["SELECT".into()],
                    case_sensitive: true,
                }],
            },
            "_____ * FROM users",
        );
        let mut r = create_renderer(&rec).unwrap();
        r.submit(Answer::Blanks(vec!["select".into()])).unwrap();
        assert!(!r.evaluate().correct);
        r.submit(Answer::Blanks(vec!["SELECT".into()])).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn open_text_word_minimum_is_a_hard_fail() {
        let rec = record(
            Payload::OpenText {
                keywords: vec!["cifratura".into()],
                min_words: 5,
            },
            "Explain encryption",
        );
        let mut r = create_renderer(&rec).unwrap();
        r.submit(Answer::Text("la cifratura".into())).unwrap();
        assert!(!r.evaluate().correct);
        r.submit(Answer::Text("la Cifratura protegge i dati in transito".into()))
            .unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn open_text_without_keywords_only_counts_words() {
        let rec = record(
            Payload::OpenText {
                keywords: vec![],
                min_words: 3,
            },
            "Say anything",
        );
        let mut r = create_renderer(&rec).unwrap();
        r.submit(Answer::Text("one two three".into())).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn ordering_scenario_two_zero_one() {
        // Authored items A B C, correct order [2, 0, 1] (C, A, B).
        let rec = record(
            Payload::Ordering {
                items: vec!["A".into(), "B".into(), "C".into()],
                correct_order: vec![2, 0, 1],
            },
            "Order these",
        );
        let mut rng = StdRng::seed_from_u64(11);
        let mut r = OrderingRenderer::with_rng(
            rec,
            vec!["A".into(), "B".into(), "C".into()],
            vec![2, 0, 1],
            &mut rng,
        );
        let mapping = r.display_mapping().to_vec();
        let sequence = vec![
            display_pos(&mapping, 2),
            display_pos(&mapping, 0),
            display_pos(&mapping, 1),
        ];
        r.submit(Answer::Sequence(sequence)).unwrap();
        assert!(r.evaluate().correct);

        // Any transposition fails.
        let swapped = vec![
            display_pos(&mapping, 0),
            display_pos(&mapping, 2),
            display_pos(&mapping, 1),
        ];
        r.submit(Answer::Sequence(swapped)).unwrap();
        assert!(!r.evaluate().correct);
    }

    #[test]
    fn ordering_rejects_non_permutations() {
        let rec = record(
            Payload::Ordering {
                items: vec!["A".into(), "B".into()],
                correct_order: vec![1, 0],
            },
            "Order these",
        );
        let mut r = create_renderer(&rec).unwrap();
        assert_eq!(
            r.submit(Answer::Sequence(vec![0, 0])),
            Err(AnswerError::NotAPermutation)
        );
    }

    #[test]
    fn matching_requires_every_left_item_resolved() {
        let rec = record(
            Payload::Matching {
                left_items: vec!["HTTP".into(), "SSH".into()],
                right_items: vec!["80".into(), "22".into()],
                correct_matches: vec![
                    MatchPair { left: 0, right: 0 },
                    MatchPair { left: 1, right: 1 },
                ],
            },
            "Match protocols to ports",
        );
        let mut rng = StdRng::seed_from_u64(5);
        let mut r = MatchingRenderer::with_rng(
            rec,
            vec!["HTTP".into(), "SSH".into()],
            vec!["80".into(), "22".into()],
            vec![
                MatchPair { left: 0, right: 0 },
                MatchPair { left: 1, right: 1 },
            ],
            &mut rng,
        );
        let pos80 = display_pos(&r.right_mapping, 0);
        let pos22 = display_pos(&r.right_mapping, 1);
        r.submit(Answer::Pairs(vec![Some(pos80), None])).unwrap();
        assert!(!r.evaluate().correct);
        r.submit(Answer::Pairs(vec![Some(pos80), Some(pos22)])).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn code_completion_is_case_sensitive() {
        let rec = record(
            Payload::CodeCompletion {
                code_template: "let x = _____;".into(),
                blanks: vec![CodeBlank {
                    line: 0,
                    correct_answer: "Vec::new()".into(),
                }],
            },
            "Complete the code",
        );
        let mut r = create_renderer(&rec).unwrap();
        r.submit(Answer::Blanks(vec!["vec::new()".into()])).unwrap();
        assert!(!r.evaluate().correct);
        r.submit(Answer::Blanks(vec![" Vec::new() ".into()])).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn drag_and_drop_counts_unplaced_items_as_wrong() {
        let rec = record(
            Payload::DragAndDrop {
                draggable_items: vec!["badge".into(), "firewall".into()],
                categories: vec![
                    Category {
                        name: "Physical".into(),
                        correct_items: vec![0],
                    },
                    Category {
                        name: "Logical".into(),
                        correct_items: vec![1],
                    },
                ],
            },
            "Sort the controls",
        );
        let mut rng = StdRng::seed_from_u64(2);
        let mut r = DragAndDropRenderer::with_rng(
            rec,
            vec!["badge".into(), "firewall".into()],
            vec![
                Category {
                    name: "Physical".into(),
                    correct_items: vec![0],
                },
                Category {
                    name: "Logical".into(),
                    correct_items: vec![1],
                },
            ],
            &mut rng,
        );
        let badge = display_pos(&r.item_mapping, 0);
        let firewall = display_pos(&r.item_mapping, 1);
        r.submit(Answer::Placements(vec![None, None])).unwrap();
        assert!(!r.evaluate().correct);

        let mut placements = vec![None, None];
        placements[badge] = Some(0);
        placements[firewall] = Some(1);
        r.submit(Answer::Placements(placements)).unwrap();
        assert!(r.evaluate().correct);
    }

    #[test]
    fn reset_returns_every_renderer_to_a_failing_pristine_state() {
        let records = vec![
            mcs_record(),
            record(
                Payload::TrueFalse {
                    correct_answer: true,
                },
                "Sky is blue",
            ),
            record(
                Payload::OpenText {
                    keywords: vec![],
                    min_words: 2,
                },
                "Say something",
            ),
        ];
        for rec in records {
            let mut r = create_renderer(&rec).unwrap();
            let answer = match rec.kind() {
                ExerciseKind::MultipleChoiceSingle => Answer::Selection(1),
                ExerciseKind::TrueFalse => Answer::Bool(true),
                _ => Answer::Text("plenty of words".into()),
            };
            r.submit(answer).unwrap();
            r.reset();
            assert!(!r.evaluate().correct, "{} should fail after reset", rec.kind());
        }
    }

    #[test]
    fn factory_skips_invalid_records() {
        let mut rec = mcs_record();
        rec.payload = Payload::MultipleChoiceSingle {
            options: vec!["only one".into()],
            correct_answer: 0,
        };
        assert!(create_renderer(&rec).is_none());
    }

    #[test]
    fn submit_rejects_mismatched_answer_kind() {
        let mut r = create_renderer(&mcs_record()).unwrap();
        assert!(matches!(
            r.submit(Answer::Text("four".into())),
            Err(AnswerError::KindMismatch { .. })
        ));
    }
}
