//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the todo data access contract shared by every backing store.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate input before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   transport errors.

pub mod todo_repo;
