//! Upload boundary and per-record validation.
//!
//! Files arrive as JSON, either a bare exercise array or a collection object
//! with `course`/`description`/`exercises`. Each record is validated
//! independently so one bad record never rejects the batch; the batch fails
//! only when nothing survives.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::model::{ExerciseRecord, ExerciseSet, UploadMetadata};

/// Upload size ceiling.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// One rejected record, identified by its position in the uploaded array.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub index: usize,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exercise {}: {}", self.index + 1, self.message)
    }
}

/// Validate a raw exercise array. Records are checked independently; valid
/// ones come back fully defaulted (id assigned from position when absent).
pub fn validate_exercises(raw: &[Value]) -> (Vec<ExerciseRecord>, Vec<ValidationError>) {
    let mut valid = Vec::new();
    let mut errors = Vec::new();

    for (index, value) in raw.iter().enumerate() {
        match validate_one(value, index) {
            Ok(record) => valid.push(record),
            Err(message) => {
                tracing::debug!(index, %message, "rejected exercise");
                errors.push(ValidationError { index, message });
            }
        }
    }

    (valid, errors)
}

fn validate_one(value: &Value, index: usize) -> Result<ExerciseRecord, String> {
    let obj = value.as_object().ok_or("not a JSON object")?;

    // These two are rejected outright before any deserialization, so the
    // message names the missing field rather than a serde tag error.
    if !obj.get("type").is_some_and(|t| t.is_string()) {
        return Err("missing \"type\" field".into());
    }
    if !obj
        .get("question")
        .and_then(Value::as_str)
        .is_some_and(|q| !q.trim().is_empty())
    {
        return Err("missing or empty \"question\" field".into());
    }

    let mut record: ExerciseRecord =
        serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;

    if obj.get("id").is_none() {
        record.id = (index + 1) as u32;
    }

    record.check_invariants().map_err(|e| e.to_string())?;
    Ok(record)
}

/// Remove trailing commas before `]` or `}`, outside string literals.
///
/// The one malformation tolerated at the upload boundary; anything else is
/// a parse error.
pub fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let chars: Vec<char> = input.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if matches!(next, Some(']') | Some('}')) {
                    // Drop the comma, keep the whitespace after it.
                } else {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Load and validate an exercise collection from disk.
///
/// Returns the surviving records plus the per-index errors for the rest,
/// so callers can surface both.
pub fn load_collection(path: &Path) -> Result<(ExerciseSet, Vec<ValidationError>), LoadError> {
    if path.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(LoadError::NotJson(path.display().to_string()));
    }
    let size = fs::metadata(path)?.len();
    if size > MAX_UPLOAD_BYTES {
        return Err(LoadError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }

    let text = fs::read_to_string(path)?;
    let parsed: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(first_err) => {
            // One repair attempt, then the original error wins.
            let repaired = strip_trailing_commas(&text);
            serde_json::from_str(&repaired).map_err(|_| LoadError::Malformed(first_err))?
        }
    };

    let (course, description, raw) = match parsed {
        Value::Array(items) => (None, None, items),
        Value::Object(mut obj) => {
            let course = obj
                .get("course")
                .and_then(Value::as_str)
                .map(str::to_string);
            let description = obj
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string);
            match obj.remove("exercises") {
                Some(Value::Array(items)) => (course, description, items),
                _ => return Err(LoadError::NoExercises),
            }
        }
        _ => return Err(LoadError::NoExercises),
    };

    if raw.is_empty() {
        return Err(LoadError::NoExercises);
    }

    let original_count = raw.len();
    let (valid, errors) = validate_exercises(&raw);
    if valid.is_empty() {
        return Err(LoadError::NothingValid(original_count));
    }

    tracing::info!(
        file = %path.display(),
        valid = valid.len(),
        rejected = errors.len(),
        "loaded exercise collection"
    );

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let set = ExerciseSet {
        course: course.unwrap_or_else(|| "Untitled Course".to_string()),
        description: description.unwrap_or_default(),
        metadata: Some(UploadMetadata {
            file_name,
            original_count,
            valid_count: valid.len(),
        }),
        exercises: valid,
    };
    Ok((set, errors))
}
