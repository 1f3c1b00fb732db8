//! Dataset push glue: merge policy, example normalization, and project error
//! classification.

use crate::client::Example;
use chrono::Utc;
use serde_json::{Map, Value};
use thiserror::Error;

/// How a push interacts with an existing dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushPlan {
    /// Prepend existing examples before writing back.
    pub append: bool,
    /// Forward the overwrite flag to the platform.
    pub overwrite: bool,
    /// Operation label reported to the caller.
    pub operation: &'static str,
}

/// Decide the push mode from the request flags and the size of the existing
/// dataset. When neither flag is set but a non-empty dataset exists, append
/// mode is enabled silently so unlabeled pushes never clobber data.
pub fn resolve_push_plan(overwrite: bool, append: bool, existing_count: usize) -> PushPlan {
    let append_mode = append || (!overwrite && !append && existing_count > 0);

    let operation = if overwrite {
        "overwritten"
    } else if append_mode {
        "appended"
    } else {
        "created"
    };

    PushPlan {
        append: append_mode,
        overwrite,
        operation,
    }
}

/// Why an incoming example record could not be turned into an [`Example`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("example is not a JSON object")]
    NotAnObject,
    #[error("example has no input (expected an `input` or `question` field)")]
    MissingInput,
}

/// Normalize one incoming example record.
///
/// Alternate field names are mapped onto the platform's schema:
/// `question` becomes `input`, `expected`/`answer` become `expected_output`.
/// Non-string scalars are coerced to their JSON rendering.
pub fn normalize_example(raw: &Value) -> Result<Example, NormalizeError> {
    let obj = raw.as_object().ok_or(NormalizeError::NotAnObject)?;

    let input = field(obj, &["input", "question"]).ok_or(NormalizeError::MissingInput)?;

    Ok(Example {
        example_id: None,
        input: Some(input),
        expected_output: field(obj, &["expected_output", "expected", "answer"]),
        actual_output: field(obj, &["actual_output"]),
        context: field(obj, &["context"]),
        name: field(obj, &["name"]),
        created_at: Some(Utc::now()),
    })
}

/// First present field among `names`, coerced to a string.
fn field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|n| obj.get(*n)).map(coerce_string)
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of ensuring a project exists before a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    Created,
    AlreadyExists,
    ApiError,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Created => "created",
            ProjectStatus::AlreadyExists => "already_exists",
            ProjectStatus::ApiError => "api_error",
        }
    }
}

/// Classify a project-creation failure from its message text alone; the
/// remote client exposes nothing more structured. Returns `None` when the
/// failure should propagate to the caller.
pub fn classify_project_error(message: &str) -> Option<ProjectStatus> {
    let lower = message.to_lowercase();

    if lower.contains("already exists") || message.contains("400") {
        Some(ProjectStatus::AlreadyExists)
    } else if message.contains("500") || lower.contains("internal server error") {
        Some(ProjectStatus::ApiError)
    } else {
        None
    }
}
