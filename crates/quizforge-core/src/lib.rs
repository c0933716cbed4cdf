//! quizforge-core — Exercise model, validation, and the renderer engine.
//!
//! This crate defines the fundamental data model, the per-kind evaluation
//! strategies, and the manager that owns renderer lifecycle. Everything the
//! rest of the quizforge system builds on.

pub mod catalog;
pub mod error;
pub mod manager;
pub mod model;
pub mod renderer;
pub mod validate;
