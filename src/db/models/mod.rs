pub mod account;
pub mod creator_profile;
pub mod enums;
pub mod marketplace_user;
pub mod session;
pub mod sponsor_profile;
pub mod twitter_profile;
pub mod user;
pub mod verification;

pub use account::*;
pub use creator_profile::*;
pub use enums::*;
pub use marketplace_user::*;
pub use session::*;
pub use sponsor_profile::*;
pub use twitter_profile::*;
pub use user::*;
pub use verification::*;

use sqlx::{sqlite::SqliteRow, Row};

/// Decode a nullable TEXT column into one of the closed enums.
pub(crate) fn decode_text_enum<T>(row: &SqliteRow, column: &str) -> Result<Option<T>, sqlx::Error>
where
    T: TryFrom<String, Error = String>,
{
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|value| {
        T::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: e.into(),
        })
    })
    .transpose()
}
