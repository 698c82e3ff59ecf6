//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task entity and its in-place mutations.
//! - Encode/decode the structural record used by persistence.
//!
//! # Invariants
//! - `id` and `created_at` never change after construction.
//! - `updated_at >= created_at`, and every mutation strictly advances
//!   `updated_at`.
//! - `text` is always a validated `TaskText`.

use crate::model::validation::{validate_text, TaskText, ValidationError};
use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// UTC timestamp with millisecond precision.
pub type Timestamp = DateTime<Utc>;

/// Opaque, collection-unique task identifier.
///
/// Fresh ids are UUIDv7 strings (time-ordered prefix plus random tail), but
/// ids decoded from storage may be any non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a new id without any central counter.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Accepts an externally supplied id; blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
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
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    text: TaskText,
    completed: bool,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Task {
    /// Creates a pending task from validated text with a fresh id.
    pub fn new(text: TaskText) -> Self {
        let now = now_millis();
        Self {
            id: TaskId::generate(),
            text,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Flips completion state and refreshes `updated_at`.
    pub fn toggle_complete(&mut self) {
        self.completed = !self.completed;
        self.touch();
    }

    /// Replaces text after re-validating `raw`.
    ///
    /// # Errors
    /// Returns the validation failure unchanged; the task is left untouched.
    pub fn update_text(&mut self, raw: &str, max_len: usize) -> Result<(), ValidationError> {
        let text = validate_text(raw, max_len)?;
        self.text = text;
        self.touch();
        Ok(())
    }

    /// Encodes this task as its persisted record.
    pub fn to_record(&self) -> TaskRecord {
        TaskRecord {
            id: self.id.as_str().to_string(),
            text: self.text.as_str().to_string(),
            completed: Some(self.completed),
            created_at: Some(format_timestamp(self.created_at)),
            updated_at: Some(format_timestamp(self.updated_at)),
        }
    }

    /// Decodes a persisted record, checking every field explicitly.
    ///
    /// Missing `completed` decodes as `false`. Missing `createdAt` decodes as
    /// now; missing `updatedAt` falls back to `createdAt`. An `updatedAt`
    /// earlier than `createdAt` is clamped up to it.
    ///
    /// # Errors
    /// Returns `DecodeError` naming the first field that cannot be accepted.
    pub fn from_record(record: TaskRecord) -> Result<Self, DecodeError> {
        let id = TaskId::parse(&record.id).ok_or(DecodeError::EmptyId)?;
        let text = TaskText::from_stored(&record.text).ok_or_else(|| DecodeError::EmptyText {
            id: id.as_str().to_string(),
        })?;

        let created_at = match record.created_at.as_deref() {
            Some(raw) => parse_timestamp("createdAt", raw)?,
            None => now_millis(),
        };
        let updated_at = match record.updated_at.as_deref() {
            Some(raw) => parse_timestamp("updatedAt", raw)?,
            None => created_at,
        };

        Ok(Self {
            id,
            text,
            completed: record.completed.unwrap_or(false),
            created_at,
            updated_at: updated_at.max(created_at),
        })
    }

    fn touch(&mut self) {
        let now = now_millis();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::milliseconds(1)
        };
    }
}

/// Plain structural shape of one stored task.
///
/// Field names follow the stored layout (`createdAt`, `updatedAt`).
/// Optional fields tolerate records written by older versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Reason a stored record could not become a `Task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The record is not an object with the expected field types.
    Malformed(String),
    EmptyId,
    EmptyText { id: String },
    InvalidTimestamp { field: &'static str, value: String },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(details) => write!(f, "malformed task record: {details}"),
            Self::EmptyId => write!(f, "task record has an empty id"),
            Self::EmptyText { id } => write!(f, "task record `{id}` has empty text"),
            Self::InvalidTimestamp { field, value } => {
                write!(f, "task record field `{field}` is not a timestamp: `{value}`")
            }
        }
    }
}

impl Error for DecodeError {}

/// Current time truncated to milliseconds, the stored precision.
pub fn now_millis() -> Timestamp {
    Utc::now().trunc_subsecs(3)
}

/// Formats as RFC 3339 with milliseconds and a `Z` suffix.
pub fn format_timestamp(value: Timestamp) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(field: &'static str, raw: &str) -> Result<Timestamp, DecodeError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc).trunc_subsecs(3))
        .map_err(|_| DecodeError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}
