//! Post payload normalizer.
//!
//! # Responsibility
//! - Coerce raw JSON fields into the typed create/update payloads the
//!   repository layer persists.
//! - Enforce the status-gated exclusivity between `scheduledAt` and
//!   `postedAt`.
//!
//! # Invariants
//! - `normalize_tags_csv` is total and idempotent on its own output.
//! - `normalize_optional_date` never fails; unparseable or wrong-typed
//!   values leave the stored field unchanged.
//! - When a write resolves `status`, the timestamp for the opposite branch
//!   is always discarded, even if the caller supplied both.

use crate::model::post::{PostPurpose, PostStatus};
use chrono::{DateTime, NaiveDateTime};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Accepted formats for `datetime-local` style input without a zone offset.
/// Naive values are interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Hard validation failure for a normalized payload.
///
/// Everything except the body degrades gracefully, so this enum stays small
/// on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// `body` is missing, not a string, or blank after trimming.
    BodyRequired,
}

impl ValidationError {
    /// Stable machine-readable error kind used on the wire.
    pub fn kind(self) -> &'static str {
        match self {
            Self::BodyRequired => "INVALID_BODY",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BodyRequired => write!(f, "body is required"),
        }
    }
}

impl Error for ValidationError {}

/// Three-way partial-update value.
///
/// Distinguishes "key absent" from "explicitly cleared" from "set to a
/// value", which plain `Option` cannot express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field key absent; the stored value must stay unchanged.
    Keep,
    /// Field explicitly cleared; the stored value becomes null.
    Clear,
    /// Field set to a concrete value.
    Set(T),
}

impl<T> Patch<T> {
    /// Returns `true` when the stored value would stay unchanged.
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Collapses the patch for create semantics: `Set` keeps its value,
    /// `Keep` and `Clear` both mean "no value".
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

/// Fully-typed payload for creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCreate {
    /// `Some` only for a non-blank title, kept untrimmed as supplied.
    pub title: Option<String>,
    /// Verbatim body text, guaranteed non-blank.
    pub body: String,
    pub status: PostStatus,
    pub purpose: PostPurpose,
    /// Canonical comma-joined tag string.
    pub tags: String,
    /// Epoch ms; `Some` only when `status == Scheduled`.
    pub scheduled_at: Option<i64>,
    /// Epoch ms; `Some` only when `status == Posted`.
    pub posted_at: Option<i64>,
}

/// Fully-typed payload for partially updating a post.
///
/// Every field is independently optional-to-change; `Patch::Keep` and
/// `None` fields never reach SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUpdate {
    pub title: Patch<String>,
    /// `Some` only when a replacement body was supplied (non-blank).
    pub body: Option<String>,
    pub status: Option<PostStatus>,
    pub purpose: Option<PostPurpose>,
    /// `Some` whenever the `tags` key was present, already canonicalized.
    pub tags: Option<String>,
    pub scheduled_at: Patch<i64>,
    pub posted_at: Patch<i64>,
}

/// Canonicalizes a comma-separated tag string.
///
/// Non-string input maps to the empty string. Tokens are trimmed, empty
/// tokens dropped, order preserved, duplicates kept.
pub fn normalize_tags_csv(input: Option<&Value>) -> String {
    let Some(Value::String(raw)) = input else {
        return String::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Normalizes an optional date field into a three-way patch (epoch ms).
///
/// - absent key -> `Keep`
/// - explicit null -> `Clear`
/// - blank string -> `Clear`
/// - parseable string -> `Set(epoch_ms)`
/// - unparseable string or wrong type -> `Keep` (field is ignored)
pub fn normalize_optional_date(input: Option<&Value>) -> Patch<i64> {
    match input {
        None => Patch::Keep,
        Some(Value::Null) => Patch::Clear,
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Patch::Clear;
            }
            match parse_instant_ms(trimmed) {
                Some(epoch_ms) => Patch::Set(epoch_ms),
                None => Patch::Keep,
            }
        }
        Some(_) => Patch::Keep,
    }
}

/// Parses an ISO-8601 instant into epoch milliseconds.
///
/// Accepts RFC 3339 with offset, or a naive `datetime-local` form which is
/// interpreted as UTC.
pub fn parse_instant_ms(text: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    None
}

/// Normalizes a raw create payload.
///
/// # Contract
/// - `title`: non-blank string kept untrimmed; anything else becomes null.
/// - `body`: must be a non-blank string, otherwise `BodyRequired`.
/// - `status`/`purpose`: invalid or absent tokens fall back to
///   `DRAFT`/`OTHER`.
/// - Timestamps follow the status gate: only the branch matching the
///   resolved status may carry a value, the other is forced null.
pub fn normalize_create(raw: &Map<String, Value>) -> Result<NormalizedCreate, ValidationError> {
    let title = match raw.get("title") {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.clone()),
        _ => None,
    };

    let body = match raw.get("body") {
        Some(Value::String(value)) => value.clone(),
        _ => String::new(),
    };
    if body.trim().is_empty() {
        return Err(ValidationError::BodyRequired);
    }

    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .and_then(PostStatus::parse)
        .unwrap_or(PostStatus::Draft);
    let purpose = raw
        .get("purpose")
        .and_then(Value::as_str)
        .and_then(PostPurpose::parse)
        .unwrap_or(PostPurpose::Other);

    let tags = normalize_tags_csv(raw.get("tags"));

    let (scheduled_at, posted_at) = match status {
        PostStatus::Scheduled => (
            normalize_optional_date(raw.get("scheduledAt")).into_value(),
            None,
        ),
        PostStatus::Posted => (
            None,
            normalize_optional_date(raw.get("postedAt")).into_value(),
        ),
        PostStatus::Draft => (None, None),
    };

    Ok(NormalizedCreate {
        title,
        body,
        status,
        purpose,
        tags,
        scheduled_at,
        posted_at,
    })
}

/// Normalizes a raw partial-update payload.
///
/// # Contract
/// - Absent keys always mean "leave the stored value unchanged".
/// - `title`: blank string and explicit null both clear; wrong types keep.
/// - `body`: a supplied blank string is `BodyRequired`; wrong types keep.
/// - When `status` is supplied, the timestamp gate applies: `SCHEDULED`
///   and `POSTED` clear the opposite branch, `DRAFT` clears both.
/// - When `status` is absent, both date fields pass through the three-way
///   normalizer untouched.
pub fn normalize_update(raw: &Map<String, Value>) -> Result<NormalizedUpdate, ValidationError> {
    let title = match raw.get("title") {
        Some(Value::String(value)) => {
            if value.trim().is_empty() {
                Patch::Clear
            } else {
                Patch::Set(value.clone())
            }
        }
        Some(Value::Null) => Patch::Clear,
        _ => Patch::Keep,
    };

    let body = match raw.get("body") {
        Some(Value::String(value)) => {
            if value.trim().is_empty() {
                return Err(ValidationError::BodyRequired);
            }
            Some(value.clone())
        }
        _ => None,
    };

    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .and_then(PostStatus::parse);
    let purpose = raw
        .get("purpose")
        .and_then(Value::as_str)
        .and_then(PostPurpose::parse);

    let tags = if raw.contains_key("tags") {
        Some(normalize_tags_csv(raw.get("tags")))
    } else {
        None
    };

    let (scheduled_at, posted_at) = match status {
        Some(PostStatus::Scheduled) => {
            (normalize_optional_date(raw.get("scheduledAt")), Patch::Clear)
        }
        Some(PostStatus::Posted) => (Patch::Clear, normalize_optional_date(raw.get("postedAt"))),
        // Moving back to draft clears both plan timestamps so the
        // exclusivity invariant holds without knowing the prior status.
        Some(PostStatus::Draft) => (Patch::Clear, Patch::Clear),
        None => (
            normalize_optional_date(raw.get("scheduledAt")),
            normalize_optional_date(raw.get("postedAt")),
        ),
    };

    Ok(NormalizedUpdate {
        title,
        body,
        status,
        purpose,
        tags,
        scheduled_at,
        posted_at,
    })
}
