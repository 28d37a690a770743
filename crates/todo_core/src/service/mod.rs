//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Assign ids and timestamps so every backing store behaves the same.

pub mod todo_service;
