//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into request-level APIs.
//! - Keep request handlers decoupled from storage details.

pub mod joke_service;
