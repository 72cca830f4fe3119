//! Session Use Case
//!
//! Sign in, sign out and token authentication. Tokens live only in the
//! process-local token store and never take part in a unit of work.

use std::sync::Arc;

use kernel::id::UserId;
use platform::password::{ClearTextPassword, HashedPassword};

use crate::application::config::LearningConfig;
use crate::application::unit_of_work::{begin, finish};
use crate::domain::repository::{TokenStore, UnitOfWorkFactory, UserRepository};
use crate::domain::value_objects::SessionToken;
use crate::error::{LearningError, LearningResult};

/// Sign in output
#[derive(Debug, Clone)]
pub struct SignInOutput {
    pub user_id: UserId,
    pub token: SessionToken,
}

pub struct SessionUseCase<F, T>
where
    F: UnitOfWorkFactory,
    T: TokenStore,
{
    store: Arc<F>,
    tokens: Arc<T>,
    config: Arc<LearningConfig>,
}

impl<F, T> SessionUseCase<F, T>
where
    F: UnitOfWorkFactory,
    T: TokenStore,
{
    pub fn new(store: Arc<F>, tokens: Arc<T>, config: Arc<LearningConfig>) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    /// Unknown login and wrong password fail the same way
    pub async fn sign_in(&self, login: &str, password: String) -> LearningResult<SignInOutput> {
        let mut uow = begin(&*self.store).await?;
        let outcome = async { Ok(uow.find_user_by_login(login.trim()).await?) }.await;
        let user = finish(uow, outcome)
            .await?
            .ok_or(LearningError::Unauthorized)?;

        let password = ClearTextPassword::new(password).map_err(|_| LearningError::Unauthorized)?;
        let hash = HashedPassword::from_phc_string(user.password_hash).map_err(|e| {
            tracing::error!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            LearningError::Unauthorized
        })?;
        if !hash.verify(&password, self.config.pepper()) {
            return Err(LearningError::Unauthorized);
        }

        let token = self.tokens.issue(user.id);
        tracing::info!(user_id = %user.id, "User signed in");

        Ok(SignInOutput {
            user_id: user.id,
            token,
        })
    }

    pub fn sign_out(&self, user_id: UserId) -> LearningResult<()> {
        self.tokens.revoke(user_id)?;
        tracing::info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Resolve a bearer token to its user
    pub fn authenticate(&self, token: &str) -> LearningResult<UserId> {
        self.tokens.validate(token)
    }
}
