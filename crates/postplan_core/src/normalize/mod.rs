//! Request-input normalization for post create/update payloads.
//!
//! # Responsibility
//! - Turn untyped JSON payloads into fully-typed normalized records.
//! - Own the status-gated timestamp policy shared by create and update.
//!
//! # Invariants
//! - Normalization is pure and side-effect free.
//! - The only hard validation error is a missing/blank body; every other
//!   invalid field degrades to a default or is left unchanged.

pub mod post_input;
