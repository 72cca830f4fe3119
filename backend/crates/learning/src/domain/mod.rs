//! Domain Layer
//!
//! Contains entities, value objects, repository traits and the pure
//! services (deletion plans, result aggregation).

pub mod aggregation;
pub mod deletion;
pub mod entities;
pub mod repository;
pub mod value_objects;

// Re-exports
pub use entities::*;
pub use repository::{StoreError, StoreResult, TokenStore, UnitOfWork, UnitOfWorkFactory};
pub use value_objects::{
    CategoryType, CategoryVisibility, ModuleType, SessionToken, TextWithLang, VisibilityError,
};
