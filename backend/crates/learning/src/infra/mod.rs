//! Infrastructure Layer
//!
//! Store implementations (PostgreSQL and in-memory) and the process-local
//! session token store.

pub mod memory;
pub mod postgres;
pub mod token_store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use token_store::InMemoryTokenStore;
