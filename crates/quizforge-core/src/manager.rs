//! Exercise manager: exclusive owner of the renderer collection.
//!
//! Lookup failures are logged and become no-ops rather than errors. The
//! manager sits between UI event handlers and the renderers, and a stale id
//! must never take the whole session down.

use std::collections::BTreeMap;

use crate::error::AnswerError;
use crate::model::ExerciseRecord;
use crate::renderer::{create_renderer, Answer, Presentation, Renderer, Verdict};

/// Invoked after every successful `check_answer` with `(exercise_id, correct)`.
pub type AnswerCheckedHook = Box<dyn FnMut(u32, bool)>;

#[derive(Default)]
pub struct ExerciseManager {
    renderers: BTreeMap<u32, Box<dyn Renderer>>,
    on_answer_checked: Option<AnswerCheckedHook>,
}

impl ExerciseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole renderer collection. Records the factory cannot
    /// build a renderer for are dropped with a warning.
    pub fn init(&mut self, records: &[ExerciseRecord]) {
        let mut renderers = BTreeMap::new();
        for record in records {
            match create_renderer(record) {
                Some(renderer) => {
                    renderers.insert(record.id, renderer);
                }
                None => {
                    tracing::warn!(id = record.id, "dropping exercise with no renderer");
                }
            }
        }
        tracing::debug!(count = renderers.len(), "initialized renderers");
        self.renderers = renderers;
    }

    pub fn set_on_answer_checked(&mut self, hook: AnswerCheckedHook) {
        self.on_answer_checked = Some(hook);
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.renderers.keys().copied()
    }

    /// Presentations for every exercise, in id order.
    pub fn render_all(&self) -> Vec<Presentation> {
        self.renderers.values().map(|r| r.presentation()).collect()
    }

    pub fn presentation(&self, id: u32) -> Option<Presentation> {
        match self.renderers.get(&id) {
            Some(renderer) => Some(renderer.presentation()),
            None => {
                tracing::warn!(id, "presentation requested for unknown exercise");
                None
            }
        }
    }

    /// Store an answer for one exercise. Unknown id is a logged no-op.
    pub fn submit_answer(&mut self, id: u32, answer: Answer) -> Result<(), AnswerError> {
        match self.renderers.get_mut(&id) {
            Some(renderer) => renderer.submit(answer),
            None => {
                tracing::warn!(id, "answer submitted for unknown exercise");
                Ok(())
            }
        }
    }

    /// Evaluate one exercise and fire the answer-checked hook.
    pub fn check_answer(&mut self, id: u32) -> Option<Verdict> {
        let Some(renderer) = self.renderers.get(&id) else {
            tracing::warn!(id, "check requested for unknown exercise");
            return None;
        };
        let verdict = renderer.evaluate();
        if let Some(hook) = &mut self.on_answer_checked {
            hook(id, verdict.correct);
        }
        Some(verdict)
    }

    /// Evaluate one exercise without firing the hook.
    pub fn evaluate(&self, id: u32) -> Option<Verdict> {
        self.renderers.get(&id).map(|r| r.evaluate())
    }

    pub fn reset_exercise(&mut self, id: u32) {
        match self.renderers.get_mut(&id) {
            Some(renderer) => renderer.reset(),
            None => tracing::warn!(id, "reset requested for unknown exercise"),
        }
    }

    pub fn reset_all(&mut self) {
        for renderer in self.renderers.values_mut() {
            renderer.reset();
        }
    }

    /// Hint text, if the exercise has one. Absent field is a logged no-op.
    pub fn hint(&self, id: u32) -> Option<&str> {
        let record = self.record(id)?;
        if record.hint.is_none() {
            tracing::warn!(id, "hint requested but none is set");
        }
        record.hint.as_deref()
    }

    pub fn sample_answer(&self, id: u32) -> Option<&str> {
        let record = self.record(id)?;
        if record.sample_answer.is_none() {
            tracing::warn!(id, "sample answer requested but none is set");
        }
        record.sample_answer.as_deref()
    }

    pub fn record(&self, id: u32) -> Option<&ExerciseRecord> {
        self.renderers.get(&id).map(|r| r.record())
    }
}
