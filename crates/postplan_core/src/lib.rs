//! Core domain logic for postplan.
//! This crate is the single source of truth for post-lifecycle invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_file_logging, init_stderr_logging, logging_status};
pub use model::post::{Post, PostId, PostPurpose, PostStatus};
pub use normalize::post_input::{
    normalize_create, normalize_optional_date, normalize_tags_csv, normalize_update,
    NormalizedCreate, NormalizedUpdate, Patch, ValidationError,
};
pub use repo::post_repo::{
    PostListQuery, PostRepository, RepoError, RepoResult, SqlitePostRepository,
};
pub use service::post_service::{PostListResult, PostService, PostServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
