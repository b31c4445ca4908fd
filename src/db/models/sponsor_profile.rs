use chrono::NaiveDateTime;
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use utoipa::ToSchema;

use super::{decode_text_enum, SponsorStatus};

#[derive(Debug, Clone)]
pub struct SponsorProfile {
    pub id: String,
    pub user_id: String,
    pub status: Option<SponsorStatus>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub industry: Option<String>,
    pub categories: Option<String>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub looking_for: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl<'r> FromRow<'r, SqliteRow> for SponsorProfile {
    fn from_row(r: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SponsorProfile {
            id: r.try_get("id")?,
            user_id: r.try_get("user_id")?,
            status: decode_text_enum(r, "status")?,
            company_name: r.try_get("company_name")?,
            company_website: r.try_get("company_website")?,
            industry: r.try_get("industry")?,
            categories: r.try_get("categories")?,
            budget_min: r.try_get("budget_min")?,
            budget_max: r.try_get("budget_max")?,
            looking_for: r.try_get("looking_for")?,
            created_at: r.try_get("created_at")?,
            updated_at: r.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSponsorProfile {
    pub status: Option<SponsorStatus>,
    pub company_name: Option<String>,
    pub company_website: Option<String>,
    pub industry: Option<String>,
    pub categories: Option<Vec<String>>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub looking_for: Option<String>,
}
