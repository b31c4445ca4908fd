//! One-shot backfill of per-role profiles from an export of legacy denormalized user rows.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::{
    ContactMethod, CreatorProfileRepository, CreatorStatus, Role, SponsorProfileRepository,
    SponsorStatus, UpdateCreatorProfile, UpdateSponsorProfile, UserRepository,
};
use crate::error::{AppError, AppResult};

const PROGRESS_EVERY: usize = 25;

/// A legacy `users` row. Every column is optional; unknown columns are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct LegacyUserRow {
    pub id: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub onboarding_completed: LegacyFlag,

    pub creator_status: Option<String>,
    pub creator_price_min: Option<i64>,
    pub creator_price_max: Option<i64>,
    pub creator_categories: Option<serde_json::Value>,
    pub creator_looking_for: Option<String>,
    pub creator_contact_method: Option<String>,
    pub creator_contact_value: Option<String>,

    pub sponsor_status: Option<String>,
    pub sponsor_company_name: Option<String>,
    pub sponsor_company_website: Option<String>,
    pub sponsor_industry: Option<String>,
    pub sponsor_categories: Option<serde_json::Value>,
    pub sponsor_budget_min: Option<i64>,
    pub sponsor_budget_max: Option<i64>,
    pub sponsor_looking_for: Option<String>,
}

/// Exports write booleans as `true`, `1` or `"1"` depending on the source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LegacyFlag(pub bool);

impl<'de> Deserialize<'de> for LegacyFlag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(LegacyFlag(match value {
            serde_json::Value::Bool(b) => b,
            serde_json::Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            serde_json::Value::String(s) => matches!(s.as_str(), "1" | "true" | "t"),
            _ => false,
        }))
    }
}

/// Stored category lists come either as JSON text or as an already-parsed array.
fn legacy_categories(value: Option<&serde_json::Value>) -> Option<Vec<String>> {
    match value? {
        serde_json::Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        serde_json::Value::String(s) if !s.trim().is_empty() => {
            match serde_json::from_str::<Vec<String>>(s) {
                Ok(codes) => Some(codes),
                Err(e) => {
                    tracing::warn!("Failed to parse legacy category list {:?}: {}", s, e);
                    None
                }
            }
        }
        _ => None,
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub processed: usize,
    pub failures: usize,
    pub creator_profiles_created: usize,
    pub sponsor_profiles_created: usize,
    pub roles_set: usize,
}

pub struct BackfillService;

impl BackfillService {
    pub fn read_rows(path: &Path) -> anyhow::Result<Vec<LegacyUserRow>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read legacy export {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse legacy export {}", path.display()))
    }

    /// Backfill one legacy row. Existing profiles are left untouched.
    pub async fn backfill_user(
        pool: &SqlitePool,
        row: &LegacyUserRow,
        report: &mut BackfillReport,
    ) -> AppResult<()> {
        let Some(id) = row.id.as_deref() else {
            tracing::warn!("Encountered legacy user row without id");
            return Ok(());
        };

        if UserRepository::find_by_id(pool, id).await?.is_none() {
            return Err(AppError::NotFound(format!("User {} does not exist", id)));
        }

        let Some(role) = row.role.as_deref().and_then(Role::parse) else {
            return Ok(());
        };

        if UserRepository::set_role_if_unset(pool, id, role).await? {
            report.roles_set += 1;
        }

        if role.is_creator() && row.onboarding_completed.0 {
            let values = UpdateCreatorProfile {
                status: row.creator_status.as_deref().and_then(CreatorStatus::parse),
                price_min: row.creator_price_min,
                price_max: row.creator_price_max,
                categories: legacy_categories(row.creator_categories.as_ref()),
                looking_for: row.creator_looking_for.clone(),
                contact_method: row
                    .creator_contact_method
                    .as_deref()
                    .and_then(ContactMethod::parse),
                contact_value: row.creator_contact_value.clone(),
            };
            if CreatorProfileRepository::insert_if_absent(pool, id, &values).await? {
                report.creator_profiles_created += 1;
            }
        }

        if role.is_sponsor() {
            let values = UpdateSponsorProfile {
                status: row.sponsor_status.as_deref().and_then(SponsorStatus::parse),
                company_name: row.sponsor_company_name.clone(),
                company_website: row.sponsor_company_website.clone(),
                industry: row.sponsor_industry.clone(),
                categories: legacy_categories(row.sponsor_categories.as_ref()),
                budget_min: row.sponsor_budget_min,
                budget_max: row.sponsor_budget_max,
                looking_for: row.sponsor_looking_for.clone(),
            };
            if SponsorProfileRepository::insert_if_absent(pool, id, &values).await? {
                report.sponsor_profiles_created += 1;
            }
        }

        Ok(())
    }

    pub async fn run(pool: &SqlitePool, rows: &[LegacyUserRow]) -> BackfillReport {
        tracing::info!("Starting profile backfill for {} legacy rows", rows.len());
        let mut report = BackfillReport::default();

        for row in rows {
            match Self::backfill_user(pool, row, &mut report).await {
                Ok(()) => {
                    report.processed += 1;
                    if report.processed % PROGRESS_EVERY == 0 {
                        tracing::info!("Processed {} users...", report.processed);
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::error!(
                        "Failed to backfill user {}: {}",
                        row.id.as_deref().unwrap_or("<unknown>"),
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Profile backfill finished. Processed {} users with {} failures ({} creator, {} sponsor profiles created)",
            report.processed,
            report.failures,
            report.creator_profiles_created,
            report.sponsor_profiles_created
        );

        report
    }
}
