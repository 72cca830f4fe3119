use kernel::id::UserId;

use super::PgUnitOfWork;
use crate::domain::entities::{NewUser, User};
use crate::domain::repository::{StoreResult, UserRepository};

impl UserRepository for PgUnitOfWork {
    async fn insert_user(&mut self, user: &NewUser) -> StoreResult<UserId> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (login, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&user.login)
        .bind(&user.name)
        .bind(&user.password_hash)
        .fetch_one(self.conn()?)
        .await?;

        Ok(UserId::from_raw(id))
    }

    async fn find_user(&mut self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, login, name, password_hash FROM users WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(self.conn()?)
        .await?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_user_by_login(&mut self, login: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, login, name, password_hash FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(self.conn()?)
        .await?;

        Ok(row.map(UserRow::into_user))
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    name: String,
    password_hash: String,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: UserId::from_raw(self.id),
            login: self.login,
            name: self.name,
            password_hash: self.password_hash,
        }
    }
}
