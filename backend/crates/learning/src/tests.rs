//! Use-case tests for the learning crate
//! Every scenario runs against the in-memory store

#[cfg(test)]
mod support {
    use std::sync::Arc;

    use chrono::Utc;
    use kernel::id::{CategoryId, ModuleId, UserId};

    use crate::application::modules::InsertModuleOutput;
    use crate::application::users::RegisterInput;
    use crate::domain::entities::{CardResult, NewCard, NewModule, NewModuleAttempt};
    use crate::domain::value_objects::{CategoryVisibility, ModuleType, TextWithLang};
    use crate::infra::{InMemoryTokenStore, MemoryStore};
    use crate::{LearningConfig, LearningService};

    pub const PASSWORD: &str = "correct horse battery staple";

    pub struct Fixture {
        pub store: Arc<MemoryStore>,
        pub service: LearningService<MemoryStore, InMemoryTokenStore>,
    }

    impl Fixture {
        pub fn new() -> Self {
            let config = Arc::new(LearningConfig::default());
            let store = Arc::new(MemoryStore::new());
            let tokens = Arc::new(InMemoryTokenStore::new(&config));
            let service = LearningService::new(store.clone(), tokens, config);
            Self { store, service }
        }

        pub async fn user(&self, login: &str) -> UserId {
            self.service
                .users
                .register(RegisterInput {
                    login: login.to_string(),
                    name: login.to_uppercase(),
                    password: PASSWORD.to_string(),
                })
                .await
                .unwrap()
        }

        pub async fn module(
            &self,
            owner: UserId,
            name: &str,
            module_type: ModuleType,
        ) -> InsertModuleOutput {
            let cards = (1..=2)
                .map(|n| NewCard {
                    term: TextWithLang::new("en", format!("{name} term {n}")),
                    definition: TextWithLang::new("de", format!("{name} definition {n}")),
                })
                .collect();
            self.service
                .modules
                .insert(
                    owner,
                    NewModule {
                        name: name.to_string(),
                        module_type,
                        cards,
                    },
                )
                .await
                .unwrap()
        }

        pub async fn visibility(&self, owner: UserId, category: CategoryId) -> CategoryVisibility {
            self.service
                .categories
                .get(owner, category)
                .await
                .unwrap()
                .visibility
        }

        /// Record a module result with one outcome per card
        pub async fn practice(&self, actor: UserId, module: &InsertModuleOutput) {
            self.service
                .results
                .insert_module_result(actor, Utc::now(), attempt(module))
                .await
                .unwrap();
        }
    }

    pub fn attempt(module: &InsertModuleOutput) -> NewModuleAttempt {
        NewModuleAttempt {
            module_id: module.module_id,
            kind: "write".to_string(),
            card_results: module
                .card_ids
                .iter()
                .map(|&card_id| CardResult {
                    card_id,
                    result: "correct".to_string(),
                })
                .collect(),
        }
    }

    pub fn ids(modules: &[&InsertModuleOutput]) -> Vec<ModuleId> {
        modules.iter().map(|m| m.module_id).collect()
    }
}

#[cfg(test)]
mod category_visibility_tests {
    use super::support::*;
    use crate::domain::value_objects::{CategoryType, CategoryVisibility, ModuleType};
    use crate::error::LearningError;

    #[tokio::test]
    async fn test_counter_follows_private_members() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let m1 = fx.module(owner, "m1", ModuleType::Private).await;
        let m2 = fx.module(owner, "m2", ModuleType::Public).await;
        let m3 = fx.module(owner, "m3", ModuleType::Private).await;

        let category = fx
            .service
            .categories
            .insert(owner, "all", &ids(&[&m1, &m2]))
            .await
            .unwrap();
        assert_eq!(fx.visibility(owner, category).await, CategoryVisibility::Private(1));

        let after_add = fx
            .service
            .categories
            .add_modules(owner, category, &[m3.module_id])
            .await
            .unwrap();
        assert_eq!(after_add, CategoryVisibility::Private(2));

        let after_remove = fx
            .service
            .categories
            .remove_module(owner, category, m1.module_id)
            .await
            .unwrap();
        assert_eq!(after_remove, CategoryVisibility::Private(1));
        assert_eq!(fx.visibility(owner, category).await, CategoryVisibility::Private(1));
    }

    #[tokio::test]
    async fn test_module_type_change_updates_every_containing_category() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;

        let first = fx
            .service
            .categories
            .insert(owner, "first", &[module.module_id])
            .await
            .unwrap();
        let second = fx
            .service
            .categories
            .insert(owner, "second", &[module.module_id])
            .await
            .unwrap();

        fx.service
            .modules
            .change_type(owner, module.module_id, ModuleType::Private)
            .await
            .unwrap();
        assert_eq!(fx.visibility(owner, first).await, CategoryVisibility::Private(1));
        assert_eq!(fx.visibility(owner, second).await, CategoryVisibility::Private(1));

        fx.service
            .modules
            .change_type(owner, module.module_id, ModuleType::Public)
            .await
            .unwrap();
        assert_eq!(fx.visibility(owner, first).await, CategoryVisibility::Public);
        assert_eq!(fx.visibility(owner, second).await, CategoryVisibility::Public);

        let same = fx
            .service
            .modules
            .change_type(owner, module.module_id, ModuleType::Public)
            .await;
        assert!(matches!(same, Err(LearningError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_duplicate_add_is_rejected_without_side_effects() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let m1 = fx.module(owner, "m1", ModuleType::Private).await;
        let m2 = fx.module(owner, "m2", ModuleType::Private).await;
        let category = fx
            .service
            .categories
            .insert(owner, "all", &[m1.module_id])
            .await
            .unwrap();
        let before = fx.store.snapshot().await;

        // m2 is new but m1 is already a member: nothing is added
        let result = fx
            .service
            .categories
            .add_modules(owner, category, &[m2.module_id, m1.module_id])
            .await;
        assert!(matches!(result, Err(LearningError::AlreadyExists(_))));

        let twice = fx
            .service
            .categories
            .add_modules(owner, category, &[m2.module_id, m2.module_id])
            .await;
        assert!(matches!(twice, Err(LearningError::AlreadyExists(_))));

        assert_eq!(fx.store.snapshot().await, before);
        assert_eq!(fx.visibility(owner, category).await, CategoryVisibility::Private(1));
    }

    #[tokio::test]
    async fn test_change_category_type() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let public = fx.module(owner, "public", ModuleType::Public).await;
        let private = fx.module(owner, "private", ModuleType::Private).await;
        let categories = &fx.service.categories;

        let category = categories
            .insert(owner, "pinned", &[public.module_id])
            .await
            .unwrap();
        categories
            .change_type(owner, category, CategoryType::Private)
            .await
            .unwrap();
        let pinned = categories.get(owner, category).await.unwrap();
        assert!(pinned.pinned_private);
        assert!(pinned.is_private());
        assert!(matches!(
            categories.change_type(owner, category, CategoryType::Private).await,
            Err(LearningError::InvalidTransition(_))
        ));

        // pinning does not touch the member counter
        categories
            .add_modules(owner, category, &[private.module_id])
            .await
            .unwrap();
        assert_eq!(fx.visibility(owner, category).await, CategoryVisibility::Private(1));
        assert!(matches!(
            categories.change_type(owner, category, CategoryType::Public).await,
            Err(LearningError::InvalidTransition(_))
        ));

        categories
            .remove_module(owner, category, private.module_id)
            .await
            .unwrap();
        categories
            .change_type(owner, category, CategoryType::Public)
            .await
            .unwrap();
        assert!(!categories.get(owner, category).await.unwrap().is_private());
    }

    #[tokio::test]
    async fn test_private_category_is_hidden_from_others() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        let private = fx.module(owner, "private", ModuleType::Private).await;
        let public = fx.module(owner, "public", ModuleType::Public).await;

        let hidden = fx
            .service
            .categories
            .insert(owner, "hidden", &[private.module_id])
            .await
            .unwrap();
        let open = fx
            .service
            .categories
            .insert(owner, "open", &[public.module_id])
            .await
            .unwrap();

        let seen = fx
            .service
            .categories
            .categories_of_user(other, owner, false)
            .await
            .unwrap();
        assert_eq!(seen.iter().map(|c| c.id).collect::<Vec<_>>(), vec![open]);
        assert!(matches!(
            fx.service.categories.get(other, hidden).await,
            Err(LearningError::Forbidden { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_counter_survives_concurrent_writers() {
        let fx = std::sync::Arc::new(Fixture::new());
        let owner = fx.user("ann").await;
        let category = fx.service.categories.insert(owner, "busy", &[]).await.unwrap();

        let mut modules = Vec::new();
        for n in 0..20 {
            modules.push(fx.module(owner, &format!("m{n}"), ModuleType::Private).await);
        }

        // Every task adds its module, flips it to public and back; odd
        // tasks leave theirs public
        let tasks: Vec<_> = modules
            .iter()
            .enumerate()
            .map(|(n, module)| {
                let fx = fx.clone();
                let module_id = module.module_id;
                tokio::spawn(async move {
                    fx.service
                        .categories
                        .add_modules(owner, category, &[module_id])
                        .await
                        .unwrap();
                    fx.service
                        .modules
                        .change_type(owner, module_id, ModuleType::Public)
                        .await
                        .unwrap();
                    if n % 2 == 0 {
                        fx.service
                            .modules
                            .change_type(owner, module_id, ModuleType::Private)
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(fx.visibility(owner, category).await, CategoryVisibility::Private(10));
        let members = fx
            .service
            .categories
            .modules_of_category(owner, category, false)
            .await
            .unwrap();
        assert_eq!(members.len(), 20);
    }
}

#[cfg(test)]
mod deletion_tests {
    use super::support::*;
    use chrono::Utc;

    use crate::domain::entities::NewCategoryResult;
    use crate::domain::value_objects::{CategoryVisibility, ModuleType};
    use crate::error::LearningError;

    #[tokio::test]
    async fn test_module_delete_removes_every_dependent() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let reader = fx.user("bob").await;
        let doomed = fx.module(owner, "doomed", ModuleType::Private).await;
        let kept = fx.module(owner, "kept", ModuleType::Public).await;

        let category = fx
            .service
            .categories
            .insert(owner, "all", &ids(&[&doomed, &kept]))
            .await
            .unwrap();
        fx.practice(owner, &doomed).await;
        fx.service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time: Utc::now(),
                    modules: vec![attempt(&doomed), attempt(&kept)],
                },
            )
            .await
            .unwrap();
        fx.service
            .selections
            .select_module(owner, doomed.module_id)
            .await
            .unwrap();
        fx.service
            .selections
            .select_module(reader, kept.module_id)
            .await
            .unwrap();

        fx.service
            .modules
            .delete(owner, doomed.module_id)
            .await
            .unwrap();

        let tables = fx.store.snapshot().await;
        assert_eq!(tables.module_dependents(doomed.module_id), 0);
        assert_eq!(tables.module_count(), 1);
        assert_eq!(tables.card_count(), 2);
        // the kept module's attempt in the category group survives
        assert_eq!(tables.result_count(), 1);
        assert_eq!(tables.card_result_count(), 2);
        assert_eq!(fx.visibility(owner, category).await, CategoryVisibility::Public);
        assert!(matches!(
            fx.service.modules.get(owner, doomed.module_id).await,
            Err(LearningError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_category_delete_removes_every_dependent() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let reader = fx.user("bob").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;

        let category = fx
            .service
            .categories
            .insert(owner, "all", &[module.module_id])
            .await
            .unwrap();
        fx.service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time: Utc::now(),
                    modules: vec![attempt(&module)],
                },
            )
            .await
            .unwrap();
        fx.service
            .selections
            .select_category(reader, category)
            .await
            .unwrap();

        fx.service.categories.delete(owner, category).await.unwrap();

        let tables = fx.store.snapshot().await;
        assert_eq!(tables.category_dependents(category), 0);
        assert_eq!(tables.category_count(), 0);
        assert_eq!(tables.result_count(), 0);
        assert_eq!(tables.card_result_count(), 0);
        // member modules are left alone
        assert_eq!(tables.module_count(), 1);
        assert_eq!(tables.card_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_step_rolls_back_whole_delete() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let module = fx.module(owner, "verbs", ModuleType::Private).await;
        fx.service
            .categories
            .insert(owner, "all", &[module.module_id])
            .await
            .unwrap();
        fx.practice(owner, &module).await;
        let before = fx.store.snapshot().await;

        // cards and memberships are gone by the time results are purged
        fx.store.fail_on("delete_module_result");
        let result = fx.service.modules.delete(owner, module.module_id).await;
        assert!(matches!(result, Err(LearningError::Internal(_))));
        assert_eq!(fx.store.snapshot().await, before);

        fx.store.clear_failures();
        fx.service
            .modules
            .delete(owner, module.module_id)
            .await
            .unwrap();
        assert_eq!(fx.store.snapshot().await.module_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_previous_state() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let before = fx.store.snapshot().await;

        fx.store.fail_on("commit");
        let result = fx.service.categories.insert(owner, "all", &[]).await;
        assert!(matches!(result, Err(LearningError::Internal(_))));
        assert_eq!(fx.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_card_delete_removes_its_outcomes() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;
        fx.practice(owner, &module).await;

        fx.service
            .cards
            .delete(owner, module.card_ids[0])
            .await
            .unwrap();

        let tables = fx.store.snapshot().await;
        assert_eq!(tables.card_count(), 1);
        assert_eq!(tables.card_result_count(), 1);
        assert_eq!(tables.result_count(), 1);
    }

    #[tokio::test]
    async fn test_only_owner_may_delete() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;
        let before = fx.store.snapshot().await;

        assert!(matches!(
            fx.service.modules.delete(other, module.module_id).await,
            Err(LearningError::Forbidden { .. })
        ));
        assert!(matches!(
            fx.service.cards.delete(other, module.card_ids[0]).await,
            Err(LearningError::Forbidden { .. })
        ));
        assert_eq!(fx.store.snapshot().await, before);
    }
}

#[cfg(test)]
mod access_tests {
    use super::support::*;
    use kernel::id::{CardId, ModuleId};

    use crate::domain::entities::{Card, NewCard};
    use crate::domain::value_objects::{ModuleType, TextWithLang};
    use crate::error::{LearningError, NOT_AVAILABLE};

    #[tokio::test]
    async fn test_missing_and_hidden_objects_look_the_same() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        let private = fx.module(owner, "private", ModuleType::Private).await;

        let hidden = fx
            .service
            .modules
            .get(other, private.module_id)
            .await
            .unwrap_err();
        let missing = fx
            .service
            .modules
            .get(other, ModuleId::from_raw(404))
            .await
            .unwrap_err();

        assert!(matches!(hidden, LearningError::Forbidden { .. }));
        assert!(matches!(missing, LearningError::NotFound { .. }));
        assert_eq!(hidden.to_string(), NOT_AVAILABLE);
        assert_eq!(missing.to_string(), NOT_AVAILABLE);
    }

    #[tokio::test]
    async fn test_public_module_is_readable_but_not_writable() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;

        let read = fx.service.modules.get(other, module.module_id).await.unwrap();
        assert_eq!(read.cards.len(), 2);

        assert!(matches!(
            fx.service.modules.rename(other, module.module_id, "mine").await,
            Err(LearningError::Forbidden { .. })
        ));
        let card = NewCard {
            term: TextWithLang::new("en", "x"),
            definition: TextWithLang::new("de", "y"),
        };
        assert!(matches!(
            fx.service.cards.insert(other, module.module_id, card).await,
            Err(LearningError::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_card_update_keeps_module() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;
        let card_id = module.card_ids[0];

        fx.service
            .cards
            .update(
                owner,
                Card {
                    id: card_id,
                    module_id: ModuleId::from_raw(999),
                    term: TextWithLang::new("en", "run"),
                    definition: TextWithLang::new("de", "laufen"),
                },
            )
            .await
            .unwrap();

        let card = fx.service.cards.get(owner, card_id).await.unwrap();
        assert_eq!(card.module_id, module.module_id);
        assert_eq!(card.term.text, "run");
        assert!(matches!(
            fx.service.cards.get(owner, CardId::from_raw(999)).await,
            Err(LearningError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_other_users_only_see_public_modules() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        fx.module(owner, "private", ModuleType::Private).await;
        let public = fx.module(owner, "public", ModuleType::Public).await;

        let own = fx
            .service
            .modules
            .modules_of_user(owner, owner, false)
            .await
            .unwrap();
        let seen = fx
            .service
            .modules
            .modules_of_user(other, owner, true)
            .await
            .unwrap();

        assert_eq!(own.len(), 2);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id, public.module_id);
        assert_eq!(seen[0].cards.len(), 2);
    }

    #[tokio::test]
    async fn test_category_cannot_take_foreign_private_module() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        let foreign = fx.module(other, "foreign", ModuleType::Private).await;

        let result = fx
            .service
            .categories
            .insert(owner, "all", &[foreign.module_id])
            .await;
        assert!(matches!(result, Err(LearningError::Forbidden { .. })));
        assert_eq!(fx.store.snapshot().await.category_count(), 0);

        let missing = fx
            .service
            .categories
            .insert(owner, "all", &[ModuleId::from_raw(77)])
            .await;
        assert!(matches!(missing, Err(LearningError::NotFound { .. })));
    }
}

#[cfg(test)]
mod results_tests {
    use super::support::*;
    use chrono::{TimeZone, Utc};
    use kernel::id::{CardId, CategoryResultId};

    use crate::domain::entities::{CardResult, NewCategoryResult, NewModuleAttempt};
    use crate::domain::value_objects::ModuleType;
    use crate::error::LearningError;

    #[tokio::test]
    async fn test_category_result_groups_one_result_per_module() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let m1 = fx.module(owner, "m1", ModuleType::Public).await;
        let m2 = fx.module(owner, "m2", ModuleType::Public).await;
        let category = fx
            .service
            .categories
            .insert(owner, "all", &ids(&[&m1, &m2]))
            .await
            .unwrap();
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        let first = fx
            .service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time,
                    modules: vec![attempt(&m1), attempt(&m2)],
                },
            )
            .await
            .unwrap();
        let second = fx
            .service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time,
                    modules: vec![attempt(&m2)],
                },
            )
            .await
            .unwrap();
        assert_ne!(first.group_id, second.group_id);
        assert_eq!(first.result_ids.len(), 2);

        let groups = fx
            .service
            .results
            .category_results(owner, category)
            .await
            .unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].group_id, first.group_id);
        assert_eq!(groups[0].modules.len(), 2);
        assert_eq!(groups[0].time, time);
        assert_eq!(groups[1].modules.len(), 1);

        let detailed = fx
            .service
            .results
            .category_result(owner, first.group_id)
            .await
            .unwrap();
        assert_eq!(detailed.modules[0].module_id, m1.module_id);
        assert_eq!(detailed.modules[0].result.card_results.len(), 2);
    }

    #[tokio::test]
    async fn test_module_results_are_per_owner() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let other = fx.user("bob").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;

        fx.practice(owner, &module).await;
        fx.practice(other, &module).await;
        fx.practice(other, &module).await;

        let mine = fx
            .service
            .results
            .module_results(owner, module.module_id)
            .await
            .unwrap();
        let theirs = fx.service.results.results_of_owner(other).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(theirs.modules.len(), 2);
        assert!(theirs.categories.is_empty());

        let result_id = mine[0].result.id;
        let detailed = fx.service.results.module_result(owner, result_id).await.unwrap();
        assert_eq!(detailed.result.card_results.len(), 2);
        assert!(matches!(
            fx.service.results.module_result(other, result_id).await,
            Err(LearningError::Forbidden { .. })
        ));
        assert!(matches!(
            fx.service.results.delete_module_result(other, result_id).await,
            Err(LearningError::Forbidden { .. })
        ));

        fx.service
            .results
            .delete_module_result(owner, result_id)
            .await
            .unwrap();
        assert!(fx
            .service
            .results
            .module_results(owner, module.module_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_rejects_cards_of_another_module() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let m1 = fx.module(owner, "m1", ModuleType::Public).await;
        let m2 = fx.module(owner, "m2", ModuleType::Public).await;
        let before = fx.store.snapshot().await;

        let foreign_card = NewModuleAttempt {
            module_id: m1.module_id,
            kind: "write".to_string(),
            card_results: vec![CardResult {
                card_id: m2.card_ids[0],
                result: "correct".to_string(),
            }],
        };
        let result = fx
            .service
            .results
            .insert_module_result(owner, Utc::now(), foreign_card)
            .await;
        assert!(matches!(result, Err(LearningError::NotFound { .. })));

        let missing_card = NewModuleAttempt {
            module_id: m1.module_id,
            kind: "write".to_string(),
            card_results: vec![CardResult {
                card_id: CardId::from_raw(500),
                result: "correct".to_string(),
            }],
        };
        let result = fx
            .service
            .results
            .insert_module_result(owner, Utc::now(), missing_card)
            .await;
        assert!(matches!(result, Err(LearningError::NotFound { .. })));
        assert_eq!(fx.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_category_result_needs_member_modules() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let member = fx.module(owner, "member", ModuleType::Public).await;
        let outsider = fx.module(owner, "outsider", ModuleType::Public).await;
        let category = fx
            .service
            .categories
            .insert(owner, "all", &[member.module_id])
            .await
            .unwrap();
        let before = fx.store.snapshot().await;

        let result = fx
            .service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time: Utc::now(),
                    modules: vec![attempt(&member), attempt(&outsider)],
                },
            )
            .await;
        assert!(matches!(result, Err(LearningError::NotFound { .. })));
        assert_eq!(fx.store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_removing_module_purges_its_group_rows() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let m1 = fx.module(owner, "m1", ModuleType::Public).await;
        let m2 = fx.module(owner, "m2", ModuleType::Public).await;
        let category = fx
            .service
            .categories
            .insert(owner, "all", &ids(&[&m1, &m2]))
            .await
            .unwrap();
        let group = fx
            .service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time: Utc::now(),
                    modules: vec![attempt(&m1), attempt(&m2)],
                },
            )
            .await
            .unwrap();

        fx.service
            .categories
            .remove_module(owner, category, m1.module_id)
            .await
            .unwrap();

        let remaining = fx
            .service
            .results
            .category_result(owner, group.group_id)
            .await
            .unwrap();
        assert_eq!(remaining.modules.len(), 1);
        assert_eq!(remaining.modules[0].module_id, m2.module_id);
        assert_eq!(fx.store.snapshot().await.result_count(), 1);

        fx.service
            .results
            .delete_category_result(owner, group.group_id)
            .await
            .unwrap();
        assert!(matches!(
            fx.service.results.category_result(owner, group.group_id).await,
            Err(LearningError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_category_result_is_rejected() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let module = fx.module(owner, "m1", ModuleType::Public).await;
        let category = fx
            .service
            .categories
            .insert(owner, "all", &[module.module_id])
            .await
            .unwrap();
        let before = fx.store.snapshot().await;

        let empty = fx
            .service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time: Utc::now(),
                    modules: Vec::new(),
                },
            )
            .await;
        assert!(matches!(empty, Err(LearningError::InvalidInput(_))));
        assert_eq!(fx.store.snapshot().await, before);

        // no group id was spent on the rejected request
        let first = fx
            .service
            .results
            .insert_category_result(
                owner,
                NewCategoryResult {
                    category_id: category,
                    time: Utc::now(),
                    modules: vec![attempt(&module)],
                },
            )
            .await
            .unwrap();
        assert_eq!(first.group_id, CategoryResultId::from_raw(1));
    }
}

#[cfg(test)]
mod session_tests {
    use super::support::*;

    use crate::application::users::RegisterInput;
    use crate::error::LearningError;

    #[tokio::test]
    async fn test_sign_in_authenticate_sign_out() {
        let fx = Fixture::new();
        let user = fx.user("ann").await;
        let session = &fx.service.session;

        let signed_in = session.sign_in("ann", PASSWORD.to_string()).await.unwrap();
        assert_eq!(signed_in.user_id, user);
        assert_eq!(session.authenticate(signed_in.token.as_str()).unwrap(), user);

        session.sign_out(user).unwrap();
        assert!(matches!(
            session.authenticate(signed_in.token.as_str()),
            Err(LearningError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_bad_credentials_fail_alike() {
        let fx = Fixture::new();
        fx.user("ann").await;
        let session = &fx.service.session;

        let wrong_password = session.sign_in("ann", "nope".to_string()).await;
        let unknown_login = session.sign_in("zed", PASSWORD.to_string()).await;
        assert!(matches!(wrong_password, Err(LearningError::Unauthorized)));
        assert!(matches!(unknown_login, Err(LearningError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let fx = Fixture::new();
        fx.user("ann").await;
        let users = &fx.service.users;

        let taken = users
            .register(RegisterInput {
                login: "ann".to_string(),
                name: "Other".to_string(),
                password: PASSWORD.to_string(),
            })
            .await;
        assert!(matches!(taken, Err(LearningError::AlreadyExists(_))));

        let blank_login = users
            .register(RegisterInput {
                login: "   ".to_string(),
                name: "Blank".to_string(),
                password: PASSWORD.to_string(),
            })
            .await;
        assert!(matches!(blank_login, Err(LearningError::InvalidInput(_))));

        let blank_password = users
            .register(RegisterInput {
                login: "cat".to_string(),
                name: "Cat".to_string(),
                password: "  ".to_string(),
            })
            .await;
        assert!(matches!(blank_password, Err(LearningError::InvalidInput(_))));
        assert_eq!(fx.store.snapshot().await.user_count(), 1);
    }

    #[tokio::test]
    async fn test_profile_shows_login_only_to_self() {
        let fx = Fixture::new();
        let ann = fx.user("ann").await;
        let bob = fx.user("bob").await;

        let own = fx.service.users.get(ann, ann, false).await.unwrap();
        let seen = fx.service.users.get(bob, ann, false).await.unwrap();
        assert_eq!(own.login.as_deref(), Some("ann"));
        assert_eq!(seen.login, None);
        assert_eq!(seen.name, "ANN");
    }
}

#[cfg(test)]
mod selection_tests {
    use super::support::*;

    use crate::domain::value_objects::ModuleType;
    use crate::error::LearningError;

    #[tokio::test]
    async fn test_select_and_unselect_module() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let reader = fx.user("bob").await;
        let module = fx.module(owner, "verbs", ModuleType::Public).await;
        let selections = &fx.service.selections;

        selections.select_module(owner, module.module_id).await.unwrap();
        selections.select_module(reader, module.module_id).await.unwrap();
        assert!(matches!(
            selections.select_module(reader, module.module_id).await,
            Err(LearningError::AlreadyExists(_))
        ));
        assert_eq!(
            selections.module_selection_count(module.module_id).await.unwrap(),
            2
        );

        selections.unselect_module(reader, module.module_id).await.unwrap();
        assert!(matches!(
            selections.unselect_module(reader, module.module_id).await,
            Err(LearningError::NotFound { .. })
        ));
        assert!(selections.selected_modules(reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_selection_follows_visibility() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let reader = fx.user("bob").await;
        let private = fx.module(owner, "private", ModuleType::Private).await;
        let public = fx.module(owner, "public", ModuleType::Public).await;
        let selections = &fx.service.selections;

        assert!(matches!(
            selections.select_module(reader, private.module_id).await,
            Err(LearningError::Forbidden { .. })
        ));

        // bookmarked while public, then hidden by its owner
        selections.select_module(reader, public.module_id).await.unwrap();
        fx.service
            .modules
            .change_type(owner, public.module_id, ModuleType::Private)
            .await
            .unwrap();
        assert!(selections.selected_modules(reader).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_category() {
        let fx = Fixture::new();
        let owner = fx.user("ann").await;
        let reader = fx.user("bob").await;
        let category = fx
            .service
            .categories
            .insert(owner, "empty", &[])
            .await
            .unwrap();
        let selections = &fx.service.selections;

        selections.select_category(reader, category).await.unwrap();
        assert_eq!(selections.selected_categories(reader).await.unwrap().len(), 1);
        assert_eq!(selections.category_selection_count(category).await.unwrap(), 1);

        selections.unselect_category(reader, category).await.unwrap();
        assert_eq!(selections.category_selection_count(category).await.unwrap(), 0);
    }
}

#[cfg(test)]
mod error_tests {
    use axum::http::StatusCode;

    use crate::domain::repository::StoreError;
    use crate::error::LearningError;
    use kernel::error::kind::ErrorKind;

    #[test]
    fn test_status_codes() {
        let cases = [
            (LearningError::not_found("module", 1_i64), StatusCode::NOT_FOUND),
            (LearningError::forbidden("module", 1_i64), StatusCode::FORBIDDEN),
            (LearningError::AlreadyExists("dup".into()), StatusCode::CONFLICT),
            (
                LearningError::InvalidTransition("same".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (LearningError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (LearningError::InvalidToken, StatusCode::UNAUTHORIZED),
            (LearningError::ExpiredToken, StatusCode::UNAUTHORIZED),
            (LearningError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                LearningError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{err:?}");
        }
    }

    #[test]
    fn test_token_errors_suggest_signing_in() {
        let app = LearningError::ExpiredToken.to_app_error();
        assert_eq!(app.kind(), ErrorKind::Unauthorized);
        assert_eq!(app.action(), Some("Sign in again"));
        assert_eq!(LearningError::Unauthorized.to_app_error().action(), None);
    }

    #[test]
    fn test_store_errors_map_to_learning_errors() {
        assert!(matches!(
            LearningError::from(StoreError::NotFound("modules")),
            LearningError::NotFound { id: None, .. }
        ));
        assert!(matches!(
            LearningError::from(StoreError::UniqueViolation("users_login_key".into())),
            LearningError::AlreadyExists(_)
        ));
        assert!(matches!(
            LearningError::from(StoreError::ForeignKeyViolation("cards_module_id_fkey".into())),
            LearningError::Internal(_)
        ));
        assert!(matches!(
            LearningError::from(StoreError::Closed),
            LearningError::Internal(_)
        ));
    }
}
