//! Types that represent the core data model, such as `Bill` and `Category`.
mod amount;
mod bill;
mod category;
mod page;

pub use amount::{Amount, AmountError};
pub use bill::{parse_date, Bill, BillUpdates, NewBill};
pub use category::{Category, CategoryUpdates, NewCategory};
pub use page::{Page, PageRequest, PER_PAGE};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Whether a bill or category represents money coming in or money going out.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(EntryType);
serde_plain::derive_fromstr_from_deserialize!(EntryType);

/// Deserializes an optional field where `null`, a missing key and a blank string all mean "not
/// supplied".
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
