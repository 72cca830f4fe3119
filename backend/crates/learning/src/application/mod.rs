//! Application Layer
//!
//! Use cases and the engine pieces they share: unit-of-work lifecycle,
//! per-family locks, ownership guard, visibility propagation and
//! cascading deletion.

pub mod cards;
pub(crate) mod cascade;
pub mod categories;
pub mod config;
pub mod locks;
pub mod modules;
pub(crate) mod ownership;
pub mod results;
pub mod selections;
pub mod service;
pub mod session;
pub(crate) mod unit_of_work;
pub mod users;
pub(crate) mod visibility;

// Re-exports
pub use cards::CardsUseCase;
pub use categories::CategoriesUseCase;
pub use config::LearningConfig;
pub use locks::{Family, FamilyLocks};
pub use modules::{InsertModuleOutput, ModulesUseCase};
pub use results::{InsertCategoryResultOutput, OwnerResults, ResultsUseCase};
pub use selections::SelectionsUseCase;
pub use service::LearningService;
pub use session::{SessionUseCase, SignInOutput};
pub use users::{RegisterInput, UsersUseCase};
