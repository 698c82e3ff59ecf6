//! Task text validation.
//!
//! # Responsibility
//! - Normalize raw user input into storable task text.
//! - Report empty and oversized input with typed errors.
//!
//! # Invariants
//! - A `TaskText` is always trimmed and never empty.
//! - Length is counted in Unicode scalar values, not bytes.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

/// Validation failure for task text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is empty or whitespace-only after trimming.
    EmptyInput,
    /// Trimmed input exceeds the configured maximum.
    TooLong { len: usize, max: usize },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "task text cannot be empty"),
            Self::TooLong { len, max } => {
                write!(f, "task text is {len} characters; maximum is {max}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Normalized task text.
///
/// Only produced by [`validate_text`] or by decoding stored records, so raw
/// input can never reach a `Task` unnormalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskText(String);

impl TaskText {
    /// Wraps already-persisted text, enforcing only the non-empty invariant.
    pub(crate) fn from_stored(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for TaskText {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Display for TaskText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims `raw` and checks it against `max_len`.
///
/// # Errors
/// - `EmptyInput` when nothing remains after trimming.
/// - `TooLong` when the trimmed text has more than `max_len` characters.
pub fn validate_text(raw: &str, max_len: usize) -> Result<TaskText, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyInput);
    }

    let len = trimmed.chars().count();
    if len > max_len {
        return Err(ValidationError::TooLong { len, max: max_len });
    }

    Ok(TaskText(trimmed.to_string()))
}
