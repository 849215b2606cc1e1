//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate normalization and repository calls into use-case level
//!   APIs.
//! - Keep the HTTP layer decoupled from storage details.

pub mod post_service;
