//! Equipment model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use sqlx::FromRow;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Upper bound of the `description` column, in characters
pub const DESCRIPTION_MAX_LENGTH: usize = 65535;

/// Equipment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i32,
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub category: Option<String>,
    /// Inventory number
    #[validate(length(min = 2, max = 255))]
    pub number: String,
    #[validate(length(max = 65535))]
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// Null until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

impl Equipment {
    /// Stamp `updated_at` with the current time.
    ///
    /// The new stamp is always strictly later than the previous modification
    /// (or the creation time), even when the clock has not moved forward by a
    /// full microsecond, which is the storage resolution.
    pub fn touch(&mut self) {
        let previous = self.updated_at.unwrap_or(self.created_at);
        let floor = previous + Duration::microseconds(1);
        self.updated_at = Some(Utc::now().max(floor));
    }
}

/// Validated draft for a record that has not been stored yet
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewEquipment {
    #[validate(length(min = 3, max = 255))]
    pub name: String,
    #[validate(length(max = 255))]
    pub category: Option<String>,
    #[validate(length(min = 2, max = 255))]
    pub number: String,
    #[validate(length(max = 65535))]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Writable equipment fields, as received on create and update.
///
/// The outer `Option` tells whether the key was present in the body, the
/// inner one whether it was `null`. Keys outside the writable set (`id`,
/// `createdAt`, `updatedAt`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EquipmentInput {
    #[serde(default, with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub category: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub number: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub description: Option<Option<String>>,
}

impl EquipmentInput {
    /// Build a creation draft. `name` and `number` are required, `description`
    /// falls back to an empty string.
    pub fn into_new(self) -> AppResult<NewEquipment> {
        let name = required("name", self.name)?;
        let number = required("number", self.number)?;
        let description = not_null("description", self.description)?.unwrap_or_default();

        Ok(NewEquipment {
            name,
            category: self.category.flatten(),
            number,
            description,
            created_at: Utc::now(),
        })
    }
}

/// Apply the fields present in `input` onto `existing`, leaving the others
/// untouched. An explicit `null` clears `category`; it is rejected for the
/// non-nullable fields.
pub fn merge(existing: Equipment, input: EquipmentInput) -> AppResult<Equipment> {
    let mut updated = existing;

    if let Some(name) = not_null("name", input.name)? {
        updated.name = name;
    }
    if let Some(category) = input.category {
        updated.category = category;
    }
    if let Some(number) = not_null("number", input.number)? {
        updated.number = number;
    }
    if let Some(description) = not_null("description", input.description)? {
        updated.description = description;
    }

    Ok(updated)
}

fn not_null(field: &str, value: Option<Option<String>>) -> AppResult<Option<String>> {
    match value {
        Some(None) => Err(AppError::BadRequest(format!("{} cannot be null", field))),
        Some(Some(v)) => Ok(Some(v)),
        None => Ok(None),
    }
}

fn required(field: &str, value: Option<Option<String>>) -> AppResult<String> {
    not_null(field, value)?.ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}
