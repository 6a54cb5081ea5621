use crate::model::{blank_as_none, EntryType};
use serde::{Deserialize, Serialize};

/// A label, optionally nested under a parent, that bills can be filed under.
///
/// `parent_id` is a plain reference. It may dangle and nothing prevents cycles.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: EntryType,
    pub parent_id: Option<i64>,
}

/// The body of a category creation request.
///
/// `name` is optional here so that a missing name reaches the store, which is what rejects it.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub r#type: Option<EntryType>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<i64>,
}

/// The fields that may be changed on an existing category. `None` means "leave unchanged".
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdates {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub r#type: Option<EntryType>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<i64>,
}

impl CategoryUpdates {
    /// Applies the supplied fields to `category` and returns `true` if anything was written.
    /// `parent_id` is only touched when it differs from the current value.
    pub fn apply(&self, category: &mut Category) -> bool {
        let mut changed = false;
        if let Some(name) = &self.name {
            category.name = name.clone();
            changed = true;
        }
        if let Some(t) = self.r#type {
            category.r#type = t;
            changed = true;
        }
        if let Some(parent_id) = self.parent_id {
            if category.parent_id != Some(parent_id) {
                category.parent_id = Some(parent_id);
                changed = true;
            }
        }
        changed
    }
}
