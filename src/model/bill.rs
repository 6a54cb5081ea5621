use crate::model::{blank_as_none, Amount, EntryType};
use crate::Result;
use anyhow::bail;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single income or expense record.
///
/// `category_id` may reference a category that does not exist, and `r#type` is independent of the
/// referenced category's type.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: i64,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub r#type: EntryType,
    pub category_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: DateTime<Utc>,
}

/// The body of a bill creation request. A missing `date` means "now".
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
pub struct NewBill {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub amount: Option<Amount>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub r#type: Option<EntryType>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<DateTime<Utc>>,
}

/// The fields that may be changed on an existing bill. `None` means "leave unchanged".
///
/// `amount`, `type` and `date` ignore blank values. `title` and `description` accept an empty
/// string as a real value.
#[derive(Debug, Default, Clone, Eq, PartialEq, Deserialize)]
pub struct BillUpdates {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub amount: Option<Amount>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub r#type: Option<EntryType>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

impl BillUpdates {
    /// Applies the supplied fields to `bill` and returns `true` if any field was supplied.
    pub fn apply(&self, bill: &mut Bill) -> bool {
        let mut changed = false;
        if let Some(amount) = self.amount {
            bill.amount = amount;
            changed = true;
        }
        if let Some(t) = self.r#type {
            bill.r#type = t;
            changed = true;
        }
        if let Some(date) = self.date {
            bill.date = date;
            changed = true;
        }
        if let Some(title) = &self.title {
            bill.title = Some(title.clone());
            changed = true;
        }
        if let Some(description) = &self.description {
            bill.description = Some(description.clone());
            changed = true;
        }
        if let Some(category_id) = self.category_id {
            bill.category_id = Some(category_id);
            changed = true;
        }
        changed
    }
}

/// Parses a bill date. Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD`, which is taken as
/// midnight UTC.
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    bail!("Invalid date '{s}', expected YYYY-MM-DD or an RFC 3339 timestamp")
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = blank_as_none(deserializer)?;
    raw.map(|s| parse_date(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn lunch() -> Bill {
        Bill {
            id: 4,
            amount: Amount::from_str("12.50").unwrap(),
            r#type: EntryType::Expense,
            category_id: Some(2),
            title: Some("Lunch".into()),
            description: None,
            date: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date("2024-03-05").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("2024-03-05T10:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap()
        );
        assert!(parse_date("05/03/2024").is_err());
    }

    #[test]
    fn test_new_bill_defaults() {
        let new: NewBill = serde_json::from_str(r#"{"amount": 10}"#).unwrap();
        assert_eq!(new.amount, Some(Amount::from_str("10").unwrap()));
        assert_eq!(new.r#type, None);
        assert_eq!(new.date, None);
        assert_eq!(new.category_id, None);
    }

    #[test]
    fn test_new_bill_rejects_bad_date() {
        let result = serde_json::from_str::<NewBill>(r#"{"amount": 1, "date": "yesterday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_updates_change_nothing() {
        let mut bill = lunch();
        assert!(!BillUpdates::default().apply(&mut bill));
        assert_eq!(bill, lunch());
    }

    #[test]
    fn test_blank_amount_is_ignored_but_blank_title_is_applied() {
        let updates: BillUpdates =
            serde_json::from_str(r#"{"amount": "", "type": "", "date": "", "title": ""}"#).unwrap();
        let mut bill = lunch();
        assert!(updates.apply(&mut bill));
        assert_eq!(bill.amount, lunch().amount);
        assert_eq!(bill.r#type, EntryType::Expense);
        assert_eq!(bill.date, lunch().date);
        assert_eq!(bill.title.as_deref(), Some(""));
    }

    #[test]
    fn test_updates_apply_each_field() {
        let updates: BillUpdates = serde_json::from_str(
            r#"{"amount": "99.99", "type": "INCOME", "date": "2023-01-02",
                "description": "refund", "category_id": 7}"#,
        )
        .unwrap();
        let mut bill = lunch();
        assert!(updates.apply(&mut bill));
        assert_eq!(bill.amount, Amount::from_str("99.99").unwrap());
        assert_eq!(bill.r#type, EntryType::Income);
        assert_eq!(bill.date, Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(bill.description.as_deref(), Some("refund"));
        assert_eq!(bill.category_id, Some(7));
        assert_eq!(bill.title.as_deref(), Some("Lunch"));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(lunch()).unwrap();
        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["amount"].as_f64(), Some(12.5));
        assert_eq!(json["date"], "2024-03-05T12:00:00Z");
        assert_eq!(json["description"], serde_json::Value::Null);
    }
}
