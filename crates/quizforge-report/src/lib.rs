//! quizforge-report — Exam report types with JSON persistence.
//!
//! A report is a frozen record of one finished exam: when it happened, how
//! the exam was configured, the aggregate results, and the per-exercise
//! detail. Reports are exported for the user; nothing re-ingests them.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quizforge_session::config::ExamConfig;
use quizforge_session::controller::ExamResults;

/// A complete exam report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Course the exam was drawn from.
    pub course: String,
    /// The configuration the exam ran with.
    pub config: ExamConfig,
    /// Aggregate results plus per-exercise detail.
    pub results: ExamResults,
}

impl ExamReport {
    pub fn new(course: impl Into<String>, config: ExamConfig, results: ExamResults) -> Self {
        ExamReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            course: course.into(),
            config,
            results,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: ExamReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Default file name, derived from course and timestamp.
    pub fn default_file_name(&self) -> String {
        format!(
            "exam-{}-{}.json",
            self.course.to_lowercase().replace(char::is_whitespace, "-"),
            self.created_at.format("%Y%m%d-%H%M%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use quizforge_core::model::ExerciseSet;
    use quizforge_session::controller::SessionController;

    fn finished_results() -> (ExamConfig, ExamResults) {
        let set: ExerciseSet = serde_json::from_str(
            r#"{"course": "Reti", "exercises": [
                {"id": 1, "type": "true_false", "question": "One", "correct_answer": true},
                {"id": 2, "type": "true_false", "question": "Two", "correct_answer": false}
            ]}"#,
        )
        .unwrap();
        let now = Utc::now();
        let mut ctrl = SessionController::new(set, now);
        let config = ExamConfig {
            question_count: 2,
            time_limit_minutes: 0,
            randomize: false,
            ..ExamConfig::default()
        };
        ctrl.start_exam(config.clone(), false, now).unwrap();
        let results = ctrl.finish_exam(false, now).unwrap();
        (config, results)
    }

    #[test]
    fn report_roundtrips_through_json() {
        let (config, results) = finished_results();
        let report = ExamReport::new("Reti", config, results);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save_json(&path).unwrap();

        let loaded = ExamReport::load_json(&path).unwrap();
        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.course, "Reti");
        assert_eq!(loaded.results.total_count, 2);
        assert_eq!(loaded.results.details.len(), 2);
    }

    #[test]
    fn default_file_name_is_filesystem_friendly() {
        let (config, results) = finished_results();
        let report = ExamReport::new("Sicurezza Informatica", config, results);
        let name = report.default_file_name();
        assert!(name.starts_with("exam-sicurezza-informatica-"));
        assert!(name.ends_with(".json"));
        assert!(!name.contains(' '));
    }
}
