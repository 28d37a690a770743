//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical `Todo` record shared by server and client.
//! - Own input normalization for create and patch requests.
//!
//! # Invariants
//! - Every todo is identified by an opaque, immutable id string.
//! - `text` is never empty after trimming.
//! - `priority` is always one of `low|medium|high`.

pub mod todo;
