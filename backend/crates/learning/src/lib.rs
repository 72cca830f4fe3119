//! Interactive Learning Backend Module
//!
//! Flashcard modules, categories of modules, practice results and
//! bookmarks, with owner-based access control.
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, deletion plans
//! - `application/` - Use cases and the unit-of-work engine they share
//! - `infra/` - PostgreSQL and in-memory stores, session token store
//!
//! ## Consistency Model
//! - Every write runs in one unit of work: all of its rows commit or none do
//! - A category's privacy counter always equals its number of private members
//! - Deletes never cascade in the store; dependents are removed first, in order
//! - Sessions live in process memory and do not survive a restart

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;

// Re-exports for convenience
pub use application::config::LearningConfig;
pub use application::service::LearningService;
pub use error::{LearningError, LearningResult};
pub use infra::{InMemoryTokenStore, MemoryStore, PgStore};

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};

#[cfg(test)]
mod tests;
