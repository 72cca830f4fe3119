//! Users Use Case
//!
//! Registration and profile reads.

use std::sync::Arc;

use kernel::id::UserId;
use platform::password::ClearTextPassword;

use crate::application::categories::categories_visible_to;
use crate::application::config::LearningConfig;
use crate::application::locks::{Family, FamilyLocks};
use crate::application::modules::modules_visible_to;
use crate::application::unit_of_work::{begin, finish};
use crate::domain::entities::{NewUser, UserProfile};
use crate::domain::repository::{UnitOfWorkFactory, UserRepository};
use crate::error::{LearningError, LearningResult};

/// Register input
pub struct RegisterInput {
    pub login: String,
    pub name: String,
    pub password: String,
}

pub struct UsersUseCase<F>
where
    F: UnitOfWorkFactory,
{
    store: Arc<F>,
    locks: Arc<FamilyLocks>,
    config: Arc<LearningConfig>,
}

impl<F> UsersUseCase<F>
where
    F: UnitOfWorkFactory,
{
    pub fn new(store: Arc<F>, locks: Arc<FamilyLocks>, config: Arc<LearningConfig>) -> Self {
        Self {
            store,
            locks,
            config,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> LearningResult<UserId> {
        let login = input.login.trim().to_string();
        if login.is_empty() {
            return Err(LearningError::InvalidInput("login must not be empty".to_string()));
        }

        let password = ClearTextPassword::new(input.password)
            .map_err(|e| LearningError::InvalidInput(e.to_string()))?;
        let hash = password
            .hash(self.config.pepper())
            .map_err(|e| LearningError::Internal(e.to_string()))?;

        let name = input.name;

        let _guard = self.locks.acquire(&[Family::Users]).await;
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            if uow.find_user_by_login(&login).await?.is_some() {
                return Err(LearningError::AlreadyExists("login is already taken".to_string()));
            }
            let user = NewUser {
                login: login.clone(),
                name,
                password_hash: hash.as_phc_string().to_string(),
            };
            Ok(uow.insert_user(&user).await?)
        }
        .await;
        let user_id = finish(uow, outcome).await?;

        tracing::info!(user_id = %user_id, "User registered");
        Ok(user_id)
    }

    /// Profile of `user_id` as seen by `actor`; `full` attaches visible
    /// modules (with cards) and categories
    pub async fn get(
        &self,
        actor: UserId,
        user_id: UserId,
        full: bool,
    ) -> LearningResult<UserProfile> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async {
            let user = uow
                .find_user(user_id)
                .await?
                .ok_or_else(|| LearningError::not_found("user", user_id))?;

            let (modules, categories) = if full {
                (
                    modules_visible_to(&mut uow, actor, user_id, true).await?,
                    categories_visible_to(&mut uow, actor, user_id, false).await?,
                )
            } else {
                (Vec::new(), Vec::new())
            };

            Ok(UserProfile {
                id: user.id,
                login: (actor == user.id).then_some(user.login),
                name: user.name,
                modules,
                categories,
            })
        }
        .await;
        finish(uow, outcome).await
    }
}
