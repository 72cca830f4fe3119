//! Value Objects
//!
//! Privacy types, the category visibility counter and session tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by privacy value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisibilityError {
    /// Removing a private module from a category whose counter is already zero
    #[error("category private-module counter would drop below zero")]
    Underflow,

    /// Persisted counter is negative
    #[error("invalid category type column value: {0}")]
    InvalidCounter(i32),

    /// Persisted module type is neither private nor public
    #[error("invalid module type column value: {0}")]
    UnknownModuleType(i16),
}

// ============================================================================
// Module type
// ============================================================================

/// Privacy of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Private,
    Public,
}

impl ModuleType {
    const PRIVATE: i16 = 0;
    const PUBLIC: i16 = 1;

    pub fn from_column(value: i16) -> Result<Self, VisibilityError> {
        match value {
            Self::PRIVATE => Ok(Self::Private),
            Self::PUBLIC => Ok(Self::Public),
            other => Err(VisibilityError::UnknownModuleType(other)),
        }
    }

    pub fn to_column(self) -> i16 {
        match self {
            Self::Private => Self::PRIVATE,
            Self::Public => Self::PUBLIC,
        }
    }

    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

/// Requested privacy of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Private,
    Public,
}

// ============================================================================
// Category visibility counter
// ============================================================================

/// Derived visibility of a category
///
/// `Private(n)` means the category currently contains `n > 0` private
/// modules. Persisted as a single integer column where `0` is public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "visibility", content = "private_modules", rename_all = "lowercase")]
pub enum CategoryVisibility {
    #[default]
    Public,
    Private(u32),
}

impl CategoryVisibility {
    pub fn from_column(value: i32) -> Result<Self, VisibilityError> {
        match value {
            0 => Ok(Self::Public),
            n if n > 0 => Ok(Self::Private(n.unsigned_abs())),
            n => Err(VisibilityError::InvalidCounter(n)),
        }
    }

    pub fn to_column(self) -> i32 {
        match self {
            Self::Public => 0,
            Self::Private(n) => i32::try_from(n).unwrap_or(i32::MAX),
        }
    }

    /// Number of private member modules
    pub fn private_count(self) -> u32 {
        match self {
            Self::Public => 0,
            Self::Private(n) => n,
        }
    }

    pub fn is_private(self) -> bool {
        self.private_count() > 0
    }

    fn from_count(count: u32) -> Self {
        if count == 0 {
            Self::Public
        } else {
            Self::Private(count)
        }
    }

    /// A private module joined the category
    pub fn with_private_added(self) -> Self {
        Self::from_count(self.private_count().saturating_add(1))
    }

    /// A private module left the category
    pub fn with_private_removed(self) -> Result<Self, VisibilityError> {
        self.private_count()
            .checked_sub(1)
            .map(Self::from_count)
            .ok_or(VisibilityError::Underflow)
    }
}

// ============================================================================
// Term / definition text
// ============================================================================

/// Text tagged with its language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextWithLang {
    pub lang: String,
    pub text: String,
}

impl TextWithLang {
    pub fn new(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            text: text.into(),
        }
    }
}

// ============================================================================
// Session token
// ============================================================================

/// Opaque hex-encoded session token
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SessionToken").field(&"[REDACTED]").finish()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
