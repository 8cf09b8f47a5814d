//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository errors are storage-layer failures only; absence and stale
//!   writes are reported as values, never as errors.
//! - Repositories never cache rows between calls.

pub mod joke_repo;
