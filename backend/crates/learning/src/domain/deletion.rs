//! Deletion Plans
//!
//! Ordered step sequences for deleting a card, a module or a category.
//! The store does not cascade; a parent row is deleted only after every
//! row referencing it is gone.

use kernel::id::{CardId, CategoryId, ModuleId};

/// Root of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionTarget {
    Card(CardId),
    Module(ModuleId),
    Category(CategoryId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionStep {
    /// Actor must own the target
    VerifyOwnership(DeletionTarget),

    DeleteCardResultsOfCard(CardId),
    DeleteCard(CardId),

    /// Every card of the module, each after its card results
    DeleteCardsOfModule(ModuleId),
    /// Leave every category, decrementing counters for a private module
    DetachModuleFromCategories(ModuleId),
    PurgeModuleResults(ModuleId),
    PurgeCategoryResultsOfModule(ModuleId),
    DeleteModuleSelections(ModuleId),
    DeleteModule(ModuleId),

    /// Drop memberships without counter updates
    DetachAllModules(CategoryId),
    PurgeCategoryResults(CategoryId),
    DeleteCategorySelections(CategoryId),
    DeleteCategory(CategoryId),
}

/// Stages of removing a set of results
///
/// Card outcomes reference the result, and so do the module/category
/// link rows, so the result row goes last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeStage {
    CardResults,
    Links,
    Results,
}

pub const RESULT_PURGE: [PurgeStage; 3] =
    [PurgeStage::CardResults, PurgeStage::Links, PurgeStage::Results];

impl DeletionTarget {
    pub fn plan(self) -> Vec<DeletionStep> {
        use DeletionStep::*;

        match self {
            DeletionTarget::Card(id) => vec![
                VerifyOwnership(self),
                DeleteCardResultsOfCard(id),
                DeleteCard(id),
            ],
            DeletionTarget::Module(id) => vec![
                VerifyOwnership(self),
                DeleteCardsOfModule(id),
                DetachModuleFromCategories(id),
                PurgeModuleResults(id),
                PurgeCategoryResultsOfModule(id),
                DeleteModuleSelections(id),
                DeleteModule(id),
            ],
            DeletionTarget::Category(id) => vec![
                VerifyOwnership(self),
                DetachAllModules(id),
                PurgeCategoryResults(id),
                DeleteCategorySelections(id),
                DeleteCategory(id),
            ],
        }
    }
}
