//! Per-family locks
//!
//! One in-process mutex per entity family, held around a whole unit of
//! work. The database transaction alone does not serialize the
//! read-compute-write of a category counter between two connections.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Entity families, in lock acquisition order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Family {
    Users,
    Cards,
    Modules,
    Categories,
    CategoryModules,
    Results,
    CardResults,
    ModuleResults,
    CategoryResults,
    Selections,
}

impl Family {
    pub const ALL: [Family; 10] = [
        Family::Users,
        Family::Cards,
        Family::Modules,
        Family::Categories,
        Family::CategoryModules,
        Family::Results,
        Family::CardResults,
        Family::ModuleResults,
        Family::CategoryResults,
        Family::Selections,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Created once at start-up and shared by every use case
#[derive(Debug, Default)]
pub struct FamilyLocks {
    locks: [Arc<Mutex<()>>; 10],
}

/// Held locks; released on drop
#[derive(Debug)]
pub struct FamilyGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl FamilyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `families` in a fixed global order so two callers can never
    /// wait on each other.
    pub async fn acquire(&self, families: &[Family]) -> FamilyGuard {
        let mut ordered = families.to_vec();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for family in ordered {
            guards.push(self.locks[family.index()].clone().lock_owned().await);
        }

        FamilyGuard { _guards: guards }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_guard_blocks_same_family_until_dropped() {
        let locks = Arc::new(FamilyLocks::new());
        let guard = locks.acquire(&[Family::Categories, Family::Modules]).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _g = locks.acquire(&[Family::Modules]).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender acquired the lock")
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_families_do_not_block() {
        let locks = FamilyLocks::new();
        let _cards = locks.acquire(&[Family::Cards]).await;
        let selections = tokio::time::timeout(
            Duration::from_millis(100),
            locks.acquire(&[Family::Selections, Family::Selections]),
        )
        .await;
        assert!(selections.is_ok());
    }

    #[test]
    fn test_all_families_are_distinct() {
        let mut all = Family::ALL.to_vec();
        all.dedup();
        assert_eq!(all.len(), 10);
        assert_eq!(Family::Selections.index(), 9);
    }
}
