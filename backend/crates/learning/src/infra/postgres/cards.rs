use kernel::id::{CardId, ModuleId};

use super::{PgUnitOfWork, one_row};
use crate::domain::entities::{Card, NewCard};
use crate::domain::repository::{CardRepository, StoreResult};
use crate::domain::value_objects::TextWithLang;

impl CardRepository for PgUnitOfWork {
    async fn insert_card(&mut self, module_id: ModuleId, card: &NewCard) -> StoreResult<CardId> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO cards (module_id, term_lang, term_text, definition_lang, definition_text)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(module_id.value())
        .bind(&card.term.lang)
        .bind(&card.term.text)
        .bind(&card.definition.lang)
        .bind(&card.definition.text)
        .fetch_one(self.conn()?)
        .await?;

        Ok(CardId::from_raw(id))
    }

    async fn find_card(&mut self, id: CardId) -> StoreResult<Option<Card>> {
        let row = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, module_id, term_lang, term_text, definition_lang, definition_text
            FROM cards
            WHERE id = $1
            "#,
        )
        .bind(id.value())
        .fetch_optional(self.conn()?)
        .await?;

        Ok(row.map(CardRow::into_card))
    }

    async fn cards_of_module(&mut self, module_id: ModuleId) -> StoreResult<Vec<Card>> {
        let rows = sqlx::query_as::<_, CardRow>(
            r#"
            SELECT id, module_id, term_lang, term_text, definition_lang, definition_text
            FROM cards
            WHERE module_id = $1
            ORDER BY id
            "#,
        )
        .bind(module_id.value())
        .fetch_all(self.conn()?)
        .await?;

        Ok(rows.into_iter().map(CardRow::into_card).collect())
    }

    async fn update_card(&mut self, card: &Card) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE cards SET
                term_lang = $2,
                term_text = $3,
                definition_lang = $4,
                definition_text = $5
            WHERE id = $1
            "#,
        )
        .bind(card.id.value())
        .bind(&card.term.lang)
        .bind(&card.term.text)
        .bind(&card.definition.lang)
        .bind(&card.definition.text)
        .execute(self.conn()?)
        .await?;

        one_row(result, "cards")
    }

    async fn delete_card(&mut self, id: CardId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1")
            .bind(id.value())
            .execute(self.conn()?)
            .await?;

        one_row(result, "cards")
    }
}

#[derive(sqlx::FromRow)]
struct CardRow {
    id: i64,
    module_id: i64,
    term_lang: String,
    term_text: String,
    definition_lang: String,
    definition_text: String,
}

impl CardRow {
    fn into_card(self) -> Card {
        Card {
            id: CardId::from_raw(self.id),
            module_id: ModuleId::from_raw(self.module_id),
            term: TextWithLang::new(self.term_lang, self.term_text),
            definition: TextWithLang::new(self.definition_lang, self.definition_text),
        }
    }
}
