//! Domain Entities
//!
//! Users, modules (decks), cards, categories, practice results and the
//! input shapes used to create them.

use chrono::{DateTime, Utc};
use kernel::id::{CardId, CategoryId, CategoryResultId, ModuleId, ResultId, UserId};
use serde::Serialize;

use crate::domain::value_objects::{CategoryVisibility, ModuleType, TextWithLang};

// ============================================================================
// Users
// ============================================================================

/// Stored user account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub name: String,
    /// Argon2id PHC string
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub name: String,
    pub password_hash: String,
}

/// User as seen by another (or the same) user
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    /// Only present when the actor is the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    pub name: String,
    pub modules: Vec<Module>,
    pub categories: Vec<Category>,
}

// ============================================================================
// Cards and modules
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub module_id: ModuleId,
    pub term: TextWithLang,
    pub definition: TextWithLang,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub term: TextWithLang,
    pub definition: TextWithLang,
}

/// A deck of cards
///
/// `cards` is only populated by read paths that ask for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    pub owner_id: UserId,
    pub module_type: ModuleType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
}

impl Module {
    pub fn is_visible_to(&self, actor: UserId) -> bool {
        self.owner_id == actor || !self.module_type.is_private()
    }
}

#[derive(Debug, Clone)]
pub struct NewModule {
    pub name: String,
    pub module_type: ModuleType,
    pub cards: Vec<NewCard>,
}

// ============================================================================
// Categories
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub owner_id: UserId,
    /// Derived from the private member modules
    pub visibility: CategoryVisibility,
    /// Owner asked for the category to stay private regardless of members
    pub pinned_private: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<Module>,
}

impl Category {
    pub fn is_private(&self) -> bool {
        self.pinned_private || self.visibility.is_private()
    }

    pub fn is_visible_to(&self, actor: UserId) -> bool {
        self.owner_id == actor || !self.is_private()
    }
}

// ============================================================================
// Results
// ============================================================================

/// Verdict for one card within a practice attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardResult {
    pub card_id: CardId,
    pub result: String,
}

/// One practice attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PracticeResult {
    pub id: ResultId,
    pub owner_id: UserId,
    /// Quiz mode tag
    pub kind: String,
    pub time: DateTime<Utc>,
    pub card_results: Vec<CardResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleResult {
    pub module_id: ModuleId,
    pub result: PracticeResult,
}

/// All module attempts of one category practice session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryModulesResult {
    pub group_id: CategoryResultId,
    pub category_id: CategoryId,
    pub owner_id: UserId,
    pub time: DateTime<Utc>,
    pub modules: Vec<ModuleResult>,
}

/// Flat row of a category result group as read from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResultRow {
    pub group_id: CategoryResultId,
    pub category_id: CategoryId,
    pub module_id: ModuleId,
    pub result_id: ResultId,
    pub kind: String,
    pub owner_id: UserId,
    pub time: DateTime<Utc>,
}

/// Attempt on one module, used by both result inputs
#[derive(Debug, Clone)]
pub struct NewModuleAttempt {
    pub module_id: ModuleId,
    pub kind: String,
    pub card_results: Vec<CardResult>,
}

#[derive(Debug, Clone)]
pub struct NewCategoryResult {
    pub category_id: CategoryId,
    pub time: DateTime<Utc>,
    pub modules: Vec<NewModuleAttempt>,
}
