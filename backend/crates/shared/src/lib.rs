//! Shared Kernel
//!
//! Vocabulary every crate agrees on:
//! - `AppError` / `ErrorKind` and their HTTP mapping (feature `axum`)
//! - Typed identifiers for store-generated ids

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
