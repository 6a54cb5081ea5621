//! Bill queries, including the date-bounded reads that feed the aggregates.

use crate::aggregate::{DateRange, Entry};
use crate::db::{decode_date, decode_type, encode_date, Db};
use crate::model::{Amount, Bill, BillUpdates, NewBill, Page, PageRequest};
use crate::{Error, Result};
use anyhow::Context;
use chrono::Utc;
use std::str::FromStr;

#[derive(Debug, sqlx::FromRow)]
struct BillRow {
    id: i64,
    amount: String,
    #[sqlx(rename = "type")]
    kind: String,
    category_id: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    date: String,
}

fn decode_amount(s: &str) -> Result<Amount> {
    Amount::from_str(s).with_context(|| format!("Invalid amount '{s}' stored in the database"))
}

impl TryFrom<BillRow> for Bill {
    type Error = Error;

    fn try_from(row: BillRow) -> Result<Self> {
        Ok(Bill {
            id: row.id,
            amount: decode_amount(&row.amount)?,
            r#type: decode_type(&row.kind)?,
            category_id: row.category_id,
            title: row.title,
            description: row.description,
            date: decode_date(&row.date)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EntryRow {
    amount: String,
    #[sqlx(rename = "type")]
    kind: String,
    date: String,
}

impl TryFrom<EntryRow> for Entry {
    type Error = Error;

    fn try_from(row: EntryRow) -> Result<Self> {
        Ok(Entry {
            r#type: decode_type(&row.kind)?,
            amount: decode_amount(&row.amount)?,
            date: decode_date(&row.date)?,
        })
    }
}

const SELECT_BILL: &str =
    "SELECT id, amount, type, category_id, title, description, date FROM bills";

impl Db {
    /// Returns one page of bills, newest date first. Bills sharing a date are ordered by
    /// descending id so that paging is stable.
    pub(crate) async fn list_bills(&self, request: PageRequest) -> Result<Page<Bill>> {
        let rows: Vec<BillRow> = sqlx::query_as(&format!(
            "{SELECT_BILL} ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await
        .context("Unable to list bills")?;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bills")
            .fetch_one(&self.pool)
            .await
            .context("Unable to count bills")?;

        let bills = rows
            .into_iter()
            .map(Bill::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Page::new(
            request,
            bills,
            u64::try_from(count).unwrap_or_default(),
        ))
    }

    pub(crate) async fn get_bill(&self, id: i64) -> Result<Option<Bill>> {
        let row: Option<BillRow> = sqlx::query_as(&format!("{SELECT_BILL} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get bill {id}"))?;
        row.map(Bill::try_from).transpose()
    }

    /// Inserts a bill and returns its new id. A missing `type` means `EXPENSE` and a missing
    /// `date` means now. A missing `amount` is left for the store to reject.
    pub(crate) async fn insert_bill(&self, new: &NewBill) -> Result<i64> {
        let date = new.date.unwrap_or_else(Utc::now);
        let result = sqlx::query(
            "INSERT INTO bills (amount, type, category_id, title, description, date) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new.amount.map(|a| a.to_string()))
        .bind(new.r#type.unwrap_or_default().to_string())
        .bind(new.category_id)
        .bind(new.title.as_deref())
        .bind(new.description.as_deref())
        .bind(encode_date(&date))
        .execute(&self.pool)
        .await
        .context("Unable to insert bill")?;
        Ok(result.last_insert_rowid())
    }

    /// Applies `updates` to the bill with `id`, returning `Ok(None)` if there is no such bill.
    pub(crate) async fn update_bill(&self, id: i64, updates: &BillUpdates) -> Result<Option<Bill>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Unable to begin transaction")?;

        let row: Option<BillRow> = sqlx::query_as(&format!("{SELECT_BILL} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .with_context(|| format!("Unable to get bill {id}"))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut bill = Bill::try_from(row)?;
        if updates.apply(&mut bill) {
            sqlx::query(
                "UPDATE bills SET amount = ?, type = ?, category_id = ?, title = ?, \
                 description = ?, date = ? WHERE id = ?",
            )
            .bind(bill.amount.to_string())
            .bind(bill.r#type.to_string())
            .bind(bill.category_id)
            .bind(bill.title.as_deref())
            .bind(bill.description.as_deref())
            .bind(encode_date(&bill.date))
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Unable to update bill {id}"))?;
        }

        tx.commit().await.context("Unable to commit transaction")?;
        Ok(Some(bill))
    }

    /// Deletes the bill with `id`. Returns whether a row was removed.
    pub(crate) async fn delete_bill(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Unable to delete bill {id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Reads the type, amount and date of every bill, or only of those dated within `range`.
    pub(crate) async fn bill_entries(&self, range: Option<&DateRange>) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = match range {
            Some(range) => {
                sqlx::query_as::<_, EntryRow>(
                    "SELECT amount, type, date FROM bills WHERE date >= ? AND date < ?",
                )
                .bind(encode_date(&range.start()))
                .bind(encode_date(&range.end()))
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, EntryRow>("SELECT amount, type, date FROM bills")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .context("Unable to read bills")?;
        rows.into_iter().map(Entry::try_from).collect()
    }
}
