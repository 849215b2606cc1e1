//! Domain model for planned social-media posts.
//!
//! # Responsibility
//! - Define the canonical post record and its lifecycle enums.
//! - Keep a single storage shape shared by the API and persistence layers.
//!
//! # Invariants
//! - Every post is identified by a stable `PostId`.
//! - `scheduled_at` and `posted_at` are never both set; which one may be
//!   non-null is decided by `status`.

pub mod post;
