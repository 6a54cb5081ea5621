//! Category queries.

use crate::db::{decode_type, Db};
use crate::model::{Category, CategoryUpdates, NewCategory, Page, PageRequest};
use crate::{Error, Result};
use anyhow::Context;

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    #[sqlx(rename = "type")]
    kind: String,
    parent_id: Option<i64>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = Error;

    fn try_from(row: CategoryRow) -> Result<Self> {
        Ok(Category {
            id: row.id,
            name: row.name,
            r#type: decode_type(&row.kind)?,
            parent_id: row.parent_id,
        })
    }
}

fn to_categories(rows: Vec<CategoryRow>) -> Result<Vec<Category>> {
    rows.into_iter().map(Category::try_from).collect()
}

impl Db {
    /// Returns one page of categories in ascending id order.
    pub(crate) async fn list_categories(&self, request: PageRequest) -> Result<Page<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            "SELECT id, name, type, parent_id FROM categories ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await
        .context("Unable to list categories")?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count categories")?;

        Ok(Page::new(
            request,
            to_categories(rows)?,
            u64::try_from(count).unwrap_or_default(),
        ))
    }

    /// Returns every category in ascending id order.
    pub(crate) async fn all_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> =
            sqlx::query_as("SELECT id, name, type, parent_id FROM categories ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .context("Unable to list categories")?;
        to_categories(rows)
    }

    pub(crate) async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, type, parent_id FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to get category {id}"))?;
        row.map(Category::try_from).transpose()
    }

    /// Inserts a category and returns its new id. A missing `type` means `EXPENSE`; a missing
    /// `name` is left for the store to reject.
    pub(crate) async fn insert_category(&self, new: &NewCategory) -> Result<i64> {
        let result =
            sqlx::query("INSERT INTO categories (name, type, parent_id) VALUES (?, ?, ?)")
                .bind(new.name.as_deref())
                .bind(new.r#type.unwrap_or_default().to_string())
                .bind(new.parent_id)
                .execute(&self.pool)
                .await
                .context("Unable to insert category")?;
        Ok(result.last_insert_rowid())
    }

    /// Applies `updates` to the category with `id`.
    ///
    /// Returns `Ok(None)` if there is no such category. The read and the write happen in one
    /// transaction, and nothing is written when the updates change nothing.
    pub(crate) async fn update_category(
        &self,
        id: i64,
        updates: &CategoryUpdates,
    ) -> Result<Option<Category>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let row: Option<CategoryRow> =
            sqlx::query_as("SELECT id, name, type, parent_id FROM categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .with_context(|| format!("Unable to get category {id}"))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut category = Category::try_from(row)?;
        if updates.apply(&mut category) {
            sqlx::query("UPDATE categories SET name = ?, type = ?, parent_id = ? WHERE id = ?")
                .bind(&category.name)
                .bind(category.r#type.to_string())
                .bind(category.parent_id)
                .bind(id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Unable to update category {id}"))?;
        }

        tx.commit().await.context("Unable to commit transaction")?;
        Ok(Some(category))
    }

    /// Deletes the category with `id`. Returns whether a row was removed. Children and bills that
    /// reference the category are left alone.
    pub(crate) async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete category {id}"))?;
        Ok(result.rows_affected() > 0)
    }
}
