//! Wire representations for the HTTP surface.
//!
//! # Responsibility
//! - Render domain records as camelCase JSON with RFC 3339 instants.
//! - Keep serialization concerns out of core.

use chrono::{SecondsFormat, TimeZone, Utc};
use postplan_core::{Post, PostPurpose, PostStatus};
use serde::Serialize;

/// Full post representation returned by read endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    pub status: PostStatus,
    pub purpose: PostPurpose,
    pub tags: String,
    pub scheduled_at: Option<String>,
    pub posted_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Post> for PostBody {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title,
            body: post.body,
            status: post.status,
            purpose: post.purpose,
            tags: post.tags,
            scheduled_at: post.scheduled_at.map(epoch_ms_to_rfc3339),
            posted_at: post.posted_at.map(epoch_ms_to_rfc3339),
            created_at: epoch_ms_to_rfc3339(post.created_at),
            updated_at: epoch_ms_to_rfc3339(post.updated_at),
        }
    }
}

/// Minimal `{id}` envelope returned by write endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct IdBody {
    pub id: String,
}

/// Error envelope for all non-2xx responses.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Health-check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthBody {
    pub ok: bool,
    pub version: String,
}

/// Renders a stored epoch-millisecond instant as an RFC 3339 UTC string.
pub fn epoch_ms_to_rfc3339(epoch_ms: i64) -> String {
    Utc.timestamp_millis_opt(epoch_ms)
        .single()
        .map(|instant| instant.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
