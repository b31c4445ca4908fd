use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use utoipa::ToSchema;

use super::{decode_text_enum, ContactMethod, CreatorStatus};

#[derive(Debug, Clone)]
pub struct CreatorProfile {
    pub id: String,
    pub user_id: String,
    pub status: Option<CreatorStatus>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    /// Raw JSON array text as stored
    pub categories: Option<String>,
    pub looking_for: Option<String>,
    pub contact_method: Option<ContactMethod>,
    pub contact_value: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'r> FromRow<'r, SqliteRow> for CreatorProfile {
    fn from_row(r: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(CreatorProfile {
            id: r.try_get("id")?,
            user_id: r.try_get("user_id")?,
            status: decode_text_enum(r, "status")?,
            price_min: r.try_get("price_min")?,
            price_max: r.try_get("price_max")?,
            categories: r.try_get("categories")?,
            looking_for: r.try_get("looking_for")?,
            contact_method: decode_text_enum(r, "contact_method")?,
            contact_value: r.try_get("contact_value")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

/// Partial update for creator settings. `None` keeps the stored value.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCreatorProfile {
    pub status: Option<CreatorStatus>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub categories: Option<Vec<String>>,
    pub looking_for: Option<String>,
    pub contact_method: Option<ContactMethod>,
    pub contact_value: Option<String>,
}
