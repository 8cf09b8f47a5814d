//! Domain model for joke records.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own the default validation rules for caller-supplied input.
//!
//! # Invariants
//! - Every persisted joke is identified by a store-assigned `JokeId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod joke;
