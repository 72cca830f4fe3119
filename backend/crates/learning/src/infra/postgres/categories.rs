use kernel::id::{CategoryId, ModuleId, UserId};

use super::{PgUnitOfWork, one_row};
use crate::domain::entities::Category;
use crate::domain::repository::{
    CategoryModuleRepository, CategoryRepository, StoreError, StoreResult,
};
use crate::domain::value_objects::CategoryVisibility;

impl CategoryRepository for PgUnitOfWork {
    async fn insert_category(&mut self, owner_id: UserId, name: &str) -> StoreResult<CategoryId> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO categories (name, owner_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(owner_id.value())
        .fetch_one(self.conn()?)
        .await?;

        Ok(CategoryId::from_raw(id))
    }

    async fn find_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, owner_id, type AS private_count, pinned_private
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(self.conn()?)
        .await?;

        row.map(CategoryRow::into_category).transpose()
    }

    async fn categories_of_owner(&mut self, owner_id: UserId) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, owner_id, type AS private_count, pinned_private
            FROM categories
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id.value())
        .fetch_all(self.conn()?)
        .await?;

        rows.into_iter().map(CategoryRow::into_category).collect()
    }

    async fn rename_category(&mut self, id: CategoryId, name: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE categories SET name = $2 WHERE id = $1")
            .bind(id.value())
            .bind(name)
            .execute(self.conn()?)
            .await?;

        one_row(result, "categories")
    }

    async fn set_category_visibility(
        &mut self,
        id: CategoryId,
        visibility: CategoryVisibility,
    ) -> StoreResult<()> {
        let result = sqlx::query("UPDATE categories SET type = $2 WHERE id = $1")
            .bind(id.value())
            .bind(visibility.to_column())
            .execute(self.conn()?)
            .await?;

        one_row(result, "categories")
    }

    async fn set_category_pinned(&mut self, id: CategoryId, pinned: bool) -> StoreResult<()> {
        let result = sqlx::query("UPDATE categories SET pinned_private = $2 WHERE id = $1")
            .bind(id.value())
            .bind(pinned)
            .execute(self.conn()?)
            .await?;

        one_row(result, "categories")
    }

    async fn delete_category(&mut self, id: CategoryId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.value())
            .execute(self.conn()?)
            .await?;

        one_row(result, "categories")
    }
}

// ============================================================================
// Category Module Repository Implementation
// ============================================================================

impl CategoryModuleRepository for PgUnitOfWork {
    async fn insert_category_module(
        &mut self,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO category_modules (category_id, module_id) VALUES ($1, $2)")
            .bind(category_id.value())
            .bind(module_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn delete_category_module(
        &mut self,
        category_id: CategoryId,
        module_id: ModuleId,
    ) -> StoreResult<()> {
        let result =
            sqlx::query("DELETE FROM category_modules WHERE category_id = $1 AND module_id = $2")
                .bind(category_id.value())
                .bind(module_id.value())
                .execute(self.conn()?)
                .await?;

        one_row(result, "category_modules")
    }

    async fn delete_category_modules(&mut self, category_id: CategoryId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM category_modules WHERE category_id = $1")
            .bind(category_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected())
    }

    async fn module_ids_of_category(
        &mut self,
        category_id: CategoryId,
    ) -> StoreResult<Vec<ModuleId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT module_id FROM category_modules WHERE category_id = $1 ORDER BY module_id",
        )
        .bind(category_id.value())
        .fetch_all(self.conn()?)
        .await?;

        Ok(ids.into_iter().map(ModuleId::from_raw).collect())
    }

    async fn category_ids_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<CategoryId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT category_id FROM category_modules WHERE module_id = $1 ORDER BY category_id",
        )
        .bind(module_id.value())
        .fetch_all(self.conn()?)
        .await?;

        Ok(ids.into_iter().map(CategoryId::from_raw).collect())
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct CategoryRow {
    id: i64,
    name: String,
    owner_id: i64,
    private_count: i32,
    pinned_private: bool,
}

impl CategoryRow {
    pub(super) fn into_category(self) -> StoreResult<Category> {
        Ok(Category {
            id: CategoryId::from_raw(self.id),
            name: self.name,
            owner_id: UserId::from_raw(self.owner_id),
            visibility: CategoryVisibility::from_column(self.private_count)
                .map_err(StoreError::backend)?,
            pinned_private: self.pinned_private,
            modules: Vec::new(),
        })
    }
}
