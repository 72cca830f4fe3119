//! Result Aggregation
//!
//! Folds flat category result rows into nested groups.

use crate::domain::entities::{
    CategoryModulesResult, CategoryResultRow, ModuleResult, PracticeResult,
};

/// Group consecutive rows sharing a group id
///
/// Rows must arrive sorted by group id. The accumulator is flushed when
/// the group id changes and once more after the last row. Module entries
/// keep input order. Card outcomes are left empty.
pub fn fold_category_rows<I>(rows: I) -> Vec<CategoryModulesResult>
where
    I: IntoIterator<Item = CategoryResultRow>,
{
    let mut groups = Vec::new();
    let mut current: Option<CategoryModulesResult> = None;

    for row in rows {
        if current.as_ref().is_some_and(|g| g.group_id != row.group_id) {
            groups.extend(current.take());
        }

        let group = current.get_or_insert_with(|| CategoryModulesResult {
            group_id: row.group_id,
            category_id: row.category_id,
            owner_id: row.owner_id,
            time: row.time,
            modules: Vec::new(),
        });

        group.modules.push(ModuleResult {
            module_id: row.module_id,
            result: PracticeResult {
                id: row.result_id,
                owner_id: row.owner_id,
                kind: row.kind,
                time: row.time,
                card_results: Vec::new(),
            },
        });
    }

    groups.extend(current);
    groups
}

/// Fold rows of a single group lookup
pub fn fold_single_group<I>(rows: I) -> Option<CategoryModulesResult>
where
    I: IntoIterator<Item = CategoryResultRow>,
{
    fold_category_rows(rows).into_iter().next()
}
