//! Post domain model.
//!
//! # Responsibility
//! - Define the canonical post record persisted by the repository layer.
//! - Define the `status`/`purpose` enums and their wire tokens.
//!
//! # Invariants
//! - `id` is stable and never reused for another post.
//! - `scheduled_at` is meaningful only when `status == Scheduled`.
//! - `posted_at` is meaningful only when `status == Posted`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a post.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type PostId = Uuid;

/// Lifecycle state of a planned post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    /// Being written, not yet planned.
    Draft,
    /// Planned for a future publish time.
    Scheduled,
    /// Already published.
    Posted,
}

impl PostStatus {
    /// Parses a wire/storage token into a status value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(Self::Draft),
            "SCHEDULED" => Some(Self::Scheduled),
            "POSTED" => Some(Self::Posted),
            _ => None,
        }
    }

    /// Returns the canonical wire/storage token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Scheduled => "SCHEDULED",
            Self::Posted => "POSTED",
        }
    }
}

/// Editorial intent of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostPurpose {
    /// Announcement of new content or releases.
    Announce,
    /// Sharing something learned.
    Learn,
    /// Day-to-day observations.
    Daily,
    /// Retrospective or summary.
    Recap,
    /// Anything else.
    Other,
}

impl PostPurpose {
    /// Parses a wire/storage token into a purpose value.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ANNOUNCE" => Some(Self::Announce),
            "LEARN" => Some(Self::Learn),
            "DAILY" => Some(Self::Daily),
            "RECAP" => Some(Self::Recap),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    /// Returns the canonical wire/storage token.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Announce => "ANNOUNCE",
            Self::Learn => "LEARN",
            Self::Daily => "DAILY",
            Self::Recap => "RECAP",
            Self::Other => "OTHER",
        }
    }
}

/// Canonical post record as stored.
///
/// Timestamps are epoch milliseconds; the API layer renders them as
/// RFC 3339 strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Stable global ID used for linking and auditing.
    pub id: PostId,
    /// Optional display title; never stored as an empty string.
    pub title: Option<String>,
    /// Required post body, kept verbatim as supplied.
    pub body: String,
    /// Lifecycle state.
    pub status: PostStatus,
    /// Editorial intent.
    pub purpose: PostPurpose,
    /// Canonical comma-joined tag string (possibly empty).
    pub tags: String,
    /// Planned publish instant. Only set when `status == Scheduled`.
    pub scheduled_at: Option<i64>,
    /// Actual publish instant. Only set when `status == Posted`.
    pub posted_at: Option<i64>,
    /// Store-managed creation instant.
    pub created_at: i64,
    /// Store-managed last-modified instant. Bumped on every write.
    pub updated_at: i64,
}

impl Post {
    /// Splits the canonical tag string into individual tokens.
    ///
    /// The stored form is already trimmed, so this is a plain split that
    /// only drops empty segments.
    pub fn tags_vec(&self) -> Vec<String> {
        self.tags
            .split(',')
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Post, PostId, PostPurpose, PostStatus};

    fn sample_post(tags: &str) -> Post {
        Post {
            id: PostId::new_v4(),
            title: None,
            body: "body".to_string(),
            status: PostStatus::Draft,
            purpose: PostPurpose::Other,
            tags: tags.to_string(),
            scheduled_at: None,
            posted_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn status_tokens_roundtrip() {
        for status in [PostStatus::Draft, PostStatus::Scheduled, PostStatus::Posted] {
            assert_eq!(PostStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::parse("draft"), None);
        assert_eq!(PostStatus::parse(""), None);
    }

    #[test]
    fn purpose_tokens_roundtrip() {
        for purpose in [
            PostPurpose::Announce,
            PostPurpose::Learn,
            PostPurpose::Daily,
            PostPurpose::Recap,
            PostPurpose::Other,
        ] {
            assert_eq!(PostPurpose::parse(purpose.as_str()), Some(purpose));
        }
        assert_eq!(PostPurpose::parse("bogus"), None);
    }

    #[test]
    fn tags_vec_splits_canonical_string() {
        assert_eq!(sample_post("a,b,c").tags_vec(), vec!["a", "b", "c"]);
        assert!(sample_post("").tags_vec().is_empty());
    }
}
