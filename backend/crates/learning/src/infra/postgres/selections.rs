use kernel::id::{CategoryId, ModuleId, UserId};

use super::categories::CategoryRow;
use super::modules::ModuleRow;
use super::{PgUnitOfWork, one_row};
use crate::domain::entities::{Category, Module};
use crate::domain::repository::{SelectionRepository, StoreResult};

impl SelectionRepository for PgUnitOfWork {
    async fn insert_selected_module(
        &mut self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO selected_modules (user_id, module_id) VALUES ($1, $2)")
            .bind(user_id.value())
            .bind(module_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn delete_selected_module(
        &mut self,
        user_id: UserId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        let result =
            sqlx::query("DELETE FROM selected_modules WHERE user_id = $1 AND module_id = $2")
                .bind(user_id.value())
                .bind(module_id.value())
                .execute(self.conn()?)
                .await?;

        one_row(result, "selected_modules")
    }

    async fn selected_modules_of_user(&mut self, user_id: UserId) -> StoreResult<Vec<Module>> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT modules.id, modules.name, modules.owner_id, modules.type AS module_type
            FROM selected_modules
            INNER JOIN modules ON modules.id = selected_modules.module_id
            WHERE selected_modules.user_id = $1
            ORDER BY modules.id
            "#,
        )
        .bind(user_id.value())
        .fetch_all(self.conn()?)
        .await?;

        rows.into_iter().map(ModuleRow::into_module).collect()
    }

    async fn module_selection_count(&mut self, module_id: ModuleId) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM selected_modules WHERE module_id = $1",
        )
        .bind(module_id.value())
        .fetch_one(self.conn()?)
        .await?;

        Ok(count.unsigned_abs())
    }

    async fn delete_module_selections(&mut self, module_id: ModuleId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM selected_modules WHERE module_id = $1")
            .bind(module_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected())
    }

    async fn insert_selected_category(
        &mut self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO selected_categories (user_id, category_id) VALUES ($1, $2)")
            .bind(user_id.value())
            .bind(category_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn delete_selected_category(
        &mut self,
        user_id: UserId,
        category_id: CategoryId,
    ) -> StoreResult<()> {
        let result =
            sqlx::query("DELETE FROM selected_categories WHERE user_id = $1 AND category_id = $2")
                .bind(user_id.value())
                .bind(category_id.value())
                .execute(self.conn()?)
                .await?;

        one_row(result, "selected_categories")
    }

    async fn selected_categories_of_user(
        &mut self,
        user_id: UserId,
    ) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT categories.id, categories.name, categories.owner_id,
                   categories.type AS private_count, categories.pinned_private
            FROM selected_categories
            INNER JOIN categories ON categories.id = selected_categories.category_id
            WHERE selected_categories.user_id = $1
            ORDER BY categories.id
            "#,
        )
        .bind(user_id.value())
        .fetch_all(self.conn()?)
        .await?;

        rows.into_iter().map(CategoryRow::into_category).collect()
    }

    async fn category_selection_count(&mut self, category_id: CategoryId) -> StoreResult<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM selected_categories WHERE category_id = $1",
        )
        .bind(category_id.value())
        .fetch_one(self.conn()?)
        .await?;

        Ok(count.unsigned_abs())
    }

    async fn delete_category_selections(&mut self, category_id: CategoryId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM selected_categories WHERE category_id = $1")
            .bind(category_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected())
    }
}
