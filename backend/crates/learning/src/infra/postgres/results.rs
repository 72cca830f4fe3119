use chrono::{DateTime, Utc};
use kernel::id::{CardId, CategoryId, CategoryResultId, ModuleId, ResultId, UserId};

use super::{PgUnitOfWork, one_row};
use crate::domain::entities::{CardResult, CategoryResultRow, ModuleResult, PracticeResult};
use crate::domain::repository::{
    CardResultRepository, CategoryResultRepository, ModuleResultRepository, ResultRepository,
    StoreResult,
};

const MODULE_RESULT_COLUMNS: &str = r#"
    SELECT modules_res.result_id, modules_res.module_id, modules_res.owner_id,
           modules_res.time, results.kind
    FROM modules_res
    INNER JOIN results ON results.id = modules_res.result_id
"#;

const CATEGORY_RESULT_COLUMNS: &str = r#"
    SELECT category_res.category_result_id, category_res.category_id,
           category_res.module_id, category_res.result_id, results.kind,
           category_res.owner_id, category_res.time
    FROM category_res
    INNER JOIN results ON results.id = category_res.result_id
"#;

const CATEGORY_RESULT_ORDER: &str = "ORDER BY category_res.category_result_id, category_res.result_id";

impl ResultRepository for PgUnitOfWork {
    async fn insert_result(&mut self, kind: &str) -> StoreResult<ResultId> {
        let id = sqlx::query_scalar::<_, i64>("INSERT INTO results (kind) VALUES ($1) RETURNING id")
            .bind(kind)
            .fetch_one(self.conn()?)
            .await?;

        Ok(ResultId::from_raw(id))
    }

    async fn delete_result(&mut self, id: ResultId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM results WHERE id = $1")
            .bind(id.value())
            .execute(self.conn()?)
            .await?;

        one_row(result, "results")
    }
}

// ============================================================================
// Card Result Repository Implementation
// ============================================================================

impl CardResultRepository for PgUnitOfWork {
    async fn insert_card_result(
        &mut self,
        result_id: ResultId,
        card_result: &CardResult,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO cards_results (result_id, card_id, result) VALUES ($1, $2, $3)")
            .bind(result_id.value())
            .bind(card_result.card_id.value())
            .bind(&card_result.result)
            .execute(self.conn()?)
            .await?;

        Ok(())
    }

    async fn card_results_of(&mut self, result_id: ResultId) -> StoreResult<Vec<CardResult>> {
        let rows = sqlx::query_as::<_, (i64, String)>(
            "SELECT card_id, result FROM cards_results WHERE result_id = $1 ORDER BY card_id",
        )
        .bind(result_id.value())
        .fetch_all(self.conn()?)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(card_id, result)| CardResult {
                card_id: CardId::from_raw(card_id),
                result,
            })
            .collect())
    }

    async fn delete_card_results_of_result(&mut self, result_id: ResultId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cards_results WHERE result_id = $1")
            .bind(result_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_card_results_of_card(&mut self, card_id: CardId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM cards_results WHERE card_id = $1")
            .bind(card_id.value())
            .execute(self.conn()?)
            .await?;

        Ok(result.rows_affected())
    }
}

// ============================================================================
// Module Result Repository Implementation
// ============================================================================

impl ModuleResultRepository for PgUnitOfWork {
    async fn insert_module_result(
        &mut self,
        result_id: ResultId,
        module_id: ModuleId,
        owner_id: UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO modules_res (result_id, module_id, owner_id, time)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(result_id.value())
        .bind(module_id.value())
        .bind(owner_id.value())
        .bind(time)
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn find_module_result(
        &mut self,
        result_id: ResultId,
    ) -> StoreResult<Option<ModuleResult>> {
        let sql = format!("{MODULE_RESULT_COLUMNS} WHERE modules_res.result_id = $1");
        let row = sqlx::query_as::<_, ModuleResultRecord>(&sql)
            .bind(result_id.value())
            .fetch_optional(self.conn()?)
            .await?;

        Ok(row.map(ModuleResultRecord::into_module_result))
    }

    async fn module_results_of_owner(
        &mut self,
        owner_id: UserId,
    ) -> StoreResult<Vec<ModuleResult>> {
        let sql = format!(
            "{MODULE_RESULT_COLUMNS} WHERE modules_res.owner_id = $1 ORDER BY modules_res.result_id"
        );
        let rows = sqlx::query_as::<_, ModuleResultRecord>(&sql)
            .bind(owner_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows
            .into_iter()
            .map(ModuleResultRecord::into_module_result)
            .collect())
    }

    async fn module_results_of_module_owner(
        &mut self,
        module_id: ModuleId,
        owner_id: UserId,
    ) -> StoreResult<Vec<ModuleResult>> {
        let sql = format!(
            "{MODULE_RESULT_COLUMNS} WHERE modules_res.module_id = $1 AND modules_res.owner_id = $2 \
             ORDER BY modules_res.result_id"
        );
        let rows = sqlx::query_as::<_, ModuleResultRecord>(&sql)
            .bind(module_id.value())
            .bind(owner_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows
            .into_iter()
            .map(ModuleResultRecord::into_module_result)
            .collect())
    }

    async fn module_result_ids_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<ResultId>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT result_id FROM modules_res WHERE module_id = $1 ORDER BY result_id",
        )
        .bind(module_id.value())
        .fetch_all(self.conn()?)
        .await?;

        Ok(ids.into_iter().map(ResultId::from_raw).collect())
    }

    async fn delete_module_result(&mut self, result_id: ResultId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM modules_res WHERE result_id = $1")
            .bind(result_id.value())
            .execute(self.conn()?)
            .await?;

        one_row(result, "modules_res")
    }
}

// ============================================================================
// Category Result Repository Implementation
// ============================================================================

impl CategoryResultRepository for PgUnitOfWork {
    async fn next_category_result_id(&mut self) -> StoreResult<CategoryResultId> {
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval('category_result_id_seq')")
            .fetch_one(self.conn()?)
            .await?;

        Ok(CategoryResultId::from_raw(id))
    }

    async fn insert_category_result_row(
        &mut self,
        group_id: CategoryResultId,
        category_id: CategoryId,
        module_id: ModuleId,
        result_id: ResultId,
        owner_id: UserId,
        time: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO category_res (
                category_result_id,
                category_id,
                module_id,
                result_id,
                owner_id,
                time
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(group_id.value())
        .bind(category_id.value())
        .bind(module_id.value())
        .bind(result_id.value())
        .bind(owner_id.value())
        .bind(time)
        .execute(self.conn()?)
        .await?;

        Ok(())
    }

    async fn category_result_rows_of_group(
        &mut self,
        group_id: CategoryResultId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let sql = format!(
            "{CATEGORY_RESULT_COLUMNS} WHERE category_res.category_result_id = $1 {CATEGORY_RESULT_ORDER}"
        );
        let rows = sqlx::query_as::<_, CategoryResultRecord>(&sql)
            .bind(group_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows.into_iter().map(CategoryResultRecord::into_row).collect())
    }

    async fn category_result_rows_of_owner(
        &mut self,
        owner_id: UserId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let sql = format!(
            "{CATEGORY_RESULT_COLUMNS} WHERE category_res.owner_id = $1 {CATEGORY_RESULT_ORDER}"
        );
        let rows = sqlx::query_as::<_, CategoryResultRecord>(&sql)
            .bind(owner_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows.into_iter().map(CategoryResultRecord::into_row).collect())
    }

    async fn category_result_rows_of_category_owner(
        &mut self,
        category_id: CategoryId,
        owner_id: UserId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let sql = format!(
            "{CATEGORY_RESULT_COLUMNS} WHERE category_res.category_id = $1 \
             AND category_res.owner_id = $2 {CATEGORY_RESULT_ORDER}"
        );
        let rows = sqlx::query_as::<_, CategoryResultRecord>(&sql)
            .bind(category_id.value())
            .bind(owner_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows.into_iter().map(CategoryResultRecord::into_row).collect())
    }

    async fn category_result_rows_of_category(
        &mut self,
        category_id: CategoryId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let sql = format!(
            "{CATEGORY_RESULT_COLUMNS} WHERE category_res.category_id = $1 {CATEGORY_RESULT_ORDER}"
        );
        let rows = sqlx::query_as::<_, CategoryResultRecord>(&sql)
            .bind(category_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows.into_iter().map(CategoryResultRecord::into_row).collect())
    }

    async fn category_result_rows_of_module(
        &mut self,
        module_id: ModuleId,
    ) -> StoreResult<Vec<CategoryResultRow>> {
        let sql = format!(
            "{CATEGORY_RESULT_COLUMNS} WHERE category_res.module_id = $1 {CATEGORY_RESULT_ORDER}"
        );
        let rows = sqlx::query_as::<_, CategoryResultRecord>(&sql)
            .bind(module_id.value())
            .fetch_all(self.conn()?)
            .await?;

        Ok(rows.into_iter().map(CategoryResultRecord::into_row).collect())
    }

    async fn delete_category_result_row(&mut self, result_id: ResultId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM category_res WHERE result_id = $1")
            .bind(result_id.value())
            .execute(self.conn()?)
            .await?;

        one_row(result, "category_res")
    }
}

#[derive(sqlx::FromRow)]
struct ModuleResultRecord {
    result_id: i64,
    module_id: i64,
    owner_id: i64,
    time: DateTime<Utc>,
    kind: String,
}

impl ModuleResultRecord {
    fn into_module_result(self) -> ModuleResult {
        ModuleResult {
            module_id: ModuleId::from_raw(self.module_id),
            result: PracticeResult {
                id: ResultId::from_raw(self.result_id),
                owner_id: UserId::from_raw(self.owner_id),
                kind: self.kind,
                time: self.time,
                card_results: Vec::new(),
            },
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryResultRecord {
    category_result_id: i64,
    category_id: i64,
    module_id: i64,
    result_id: i64,
    kind: String,
    owner_id: i64,
    time: DateTime<Utc>,
}

impl CategoryResultRecord {
    fn into_row(self) -> CategoryResultRow {
        CategoryResultRow {
            group_id: CategoryResultId::from_raw(self.category_result_id),
            category_id: CategoryId::from_raw(self.category_id),
            module_id: ModuleId::from_raw(self.module_id),
            result_id: ResultId::from_raw(self.result_id),
            kind: self.kind,
            owner_id: UserId::from_raw(self.owner_id),
            time: self.time,
        }
    }
}
