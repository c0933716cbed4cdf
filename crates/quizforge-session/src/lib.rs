//! quizforge-session — Exam-mode session controller.
//!
//! Timed exam sessions over a loaded exercise collection: configuration
//! filters, the idle/running/finished state machine, countdown handling,
//! scoring, and snapshot persistence across restarts.

pub mod config;
pub mod controller;
pub mod error;
pub mod persist;
pub mod state;
pub mod timer;
