use kernel::id::{ModuleId, UserId};

use super::{PgUnitOfWork, one_row};
use crate::domain::entities::Module;
use crate::domain::repository::{ModuleRepository, StoreError, StoreResult};
use crate::domain::value_objects::ModuleType;

impl ModuleRepository for PgUnitOfWork {
    async fn insert_module(
        &mut self,
        owner_id: UserId,
        name: &str,
        module_type: ModuleType,
    ) -> StoreResult<ModuleId> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO modules (name, owner_id, type) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(owner_id.value())
        .bind(module_type.to_column())
        .fetch_one(self.conn()?)
        .await?;

        Ok(ModuleId::from_raw(id))
    }

    async fn find_module(&mut self, id: ModuleId) -> StoreResult<Option<Module>> {
        let row = sqlx::query_as::<_, ModuleRow>(
            "SELECT id, name, owner_id, type AS module_type FROM modules WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(self.conn()?)
        .await?;

        row.map(ModuleRow::into_module).transpose()
    }

    async fn modules_of_owner(&mut self, owner_id: UserId) -> StoreResult<Vec<Module>> {
        let rows = sqlx::query_as::<_, ModuleRow>(
            r#"
            SELECT id, name, owner_id, type AS module_type
            FROM modules
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id.value())
        .fetch_all(self.conn()?)
        .await?;

        rows.into_iter().map(ModuleRow::into_module).collect()
    }

    async fn rename_module(&mut self, id: ModuleId, name: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE modules SET name = $2 WHERE id = $1")
            .bind(id.value())
            .bind(name)
            .execute(self.conn()?)
            .await?;

        one_row(result, "modules")
    }

    async fn set_module_type(&mut self, id: ModuleId, module_type: ModuleType) -> StoreResult<()> {
        let result = sqlx::query("UPDATE modules SET type = $2 WHERE id = $1")
            .bind(id.value())
            .bind(module_type.to_column())
            .execute(self.conn()?)
            .await?;

        one_row(result, "modules")
    }

    async fn delete_module(&mut self, id: ModuleId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM modules WHERE id = $1")
            .bind(id.value())
            .execute(self.conn()?)
            .await?;

        one_row(result, "modules")
    }
}

#[derive(sqlx::FromRow)]
pub(super) struct ModuleRow {
    id: i64,
    name: String,
    owner_id: i64,
    module_type: i16,
}

impl ModuleRow {
    pub(super) fn into_module(self) -> StoreResult<Module> {
        Ok(Module {
            id: ModuleId::from_raw(self.id),
            name: self.name,
            owner_id: UserId::from_raw(self.owner_id),
            module_type: ModuleType::from_column(self.module_type).map_err(StoreError::backend)?,
            cards: Vec::new(),
        })
    }
}
