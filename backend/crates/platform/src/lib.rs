//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Secure randomness and hex encoding for session tokens
//! - Password hashing (Argon2id)

pub mod crypto;
pub mod password;
