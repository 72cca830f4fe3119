//! Common ID Types
//!
//! Type-safe wrappers around store-generated integer identities.
//! The relational store owns id generation (identity columns and
//! sequences); the application never computes ids itself.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Generic typed ID wrapper
///
/// Usage:
/// ```
/// use kernel::id::{Id, markers};
/// type ModuleId = Id<markers::Module>;
/// let id = ModuleId::from_raw(7);
/// assert_eq!(id.value(), 7);
/// ```
pub struct Id<T> {
    value: i64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Wrap a raw identity read from the store
    pub const fn from_raw(value: i64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Raw value for binding into queries
    pub const fn value(&self) -> i64 {
        self.value
    }
}

// Manual impls: derives would require the marker types to implement
// the same traits.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<i64> for Id<T> {
    fn from(value: i64) -> Self {
        Self::from_raw(value)
    }
}

impl<T> From<Id<T>> for i64 {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Self::from_raw)
    }
}

/// Marker types for different entity IDs
pub mod markers {
    /// Marker for User IDs
    pub enum User {}

    /// Marker for Module (deck) IDs
    pub enum Module {}

    /// Marker for Card IDs
    pub enum Card {}

    /// Marker for Category IDs
    pub enum Category {}

    /// Marker for practice Result IDs
    pub enum PracticeResult {}

    /// Marker for category result group IDs
    pub enum CategoryResult {}
}

/// Type aliases for common IDs
pub type UserId = Id<markers::User>;
pub type ModuleId = Id<markers::Module>;
pub type CardId = Id<markers::Card>;
pub type CategoryId = Id<markers::Category>;
pub type ResultId = Id<markers::PracticeResult>;
pub type CategoryResultId = Id<markers::CategoryResult>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_round_trips_raw_value() {
        let id = ModuleId::from_raw(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(format!("{:?}", id), "Id(42)");
    }

    #[test]
    fn test_id_ordering_follows_value() {
        let mut ids = vec![CardId::from_raw(3), CardId::from_raw(1), CardId::from_raw(2)];
        ids.sort();
        assert_eq!(ids, vec![CardId::from(1), CardId::from(2), CardId::from(3)]);
    }

    #[test]
    fn test_id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&CategoryId::from_raw(9)).unwrap();
        assert_eq!(json, "9");

        let id: CategoryId = serde_json::from_str("11").unwrap();
        assert_eq!(id.value(), 11);
    }
}
