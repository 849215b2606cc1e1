//! Post use-case service.
//!
//! # Responsibility
//! - Provide create/update/get/list/delete entry points over raw JSON
//!   payloads.
//! - Run the input normalizer before any persistence call.
//!
//! # Invariants
//! - Service APIs never bypass normalization.
//! - Create/update return the stored row read back after the write.
//! - Post list is always sorted by `updated_at DESC, id ASC`.

use crate::model::post::{Post, PostId, PostStatus};
use crate::normalize::post_input::{normalize_create, normalize_update, ValidationError};
use crate::repo::post_repo::{
    normalize_post_limit, PostListQuery, PostRepository, RepoError, RepoResult,
};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for post use-cases.
#[derive(Debug)]
pub enum PostServiceError {
    /// Payload failed normalization.
    Validation(ValidationError),
    /// Target post does not exist.
    PostNotFound(PostId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for PostServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PostNotFound(id) => write!(f, "post not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent post state: {details}"),
        }
    }
}

impl Error for PostServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for PostServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for PostServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::PostNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostListResult {
    /// List items sorted by `updated_at DESC, id ASC`.
    pub items: Vec<Post>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Post service facade over repository implementations.
pub struct PostService<R: PostRepository> {
    repo: R,
}

impl<R: PostRepository> PostService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Normalizes and persists a create payload, returning the stored row.
    pub fn create_post(&self, raw: &Map<String, Value>) -> Result<Post, PostServiceError> {
        let input = normalize_create(raw)?;
        let id = self.repo.create_post(&input)?;
        self.repo
            .get_post(id)?
            .ok_or(PostServiceError::InconsistentState(
                "created post not found in read-back",
            ))
    }

    /// Normalizes and applies a partial update, returning the stored row.
    pub fn update_post(
        &self,
        id: PostId,
        raw: &Map<String, Value>,
    ) -> Result<Post, PostServiceError> {
        let patch = normalize_update(raw)?;
        self.repo.update_post(id, &patch)?;
        self.repo
            .get_post(id)?
            .ok_or(PostServiceError::InconsistentState(
                "updated post not found in read-back",
            ))
    }

    /// Gets one post by stable ID.
    pub fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        self.repo.get_post(id)
    }

    /// Lists posts by recency with optional status filter and pagination.
    pub fn list_posts(
        &self,
        status: Option<PostStatus>,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<PostListResult, PostServiceError> {
        let applied_limit = normalize_post_limit(limit);
        let query = PostListQuery {
            status,
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list_posts(&query)?;
        Ok(PostListResult {
            items,
            applied_limit,
        })
    }

    /// Hard-deletes one post by stable ID.
    pub fn delete_post(&self, id: PostId) -> Result<PostId, PostServiceError> {
        self.repo.delete_post(id)?;
        Ok(id)
    }
}
