use chrono::NaiveDateTime;
use sqlx::FromRow;

/// Short-lived single-use value (e.g. a PKCE code verifier) keyed by identifier.
#[derive(Debug, Clone, FromRow)]
pub struct Verification {
    pub id: String,
    pub identifier: String,
    pub value: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}
