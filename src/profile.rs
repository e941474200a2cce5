//! The user profile: base currency, timezone, and budget cycle day.
//!
//! The store holds a single profile row, mirroring the single-household
//! deployment model. The engine never reads the profile itself; handlers
//! fetch it and pass it in as an explicit value so every computation stays a
//! pure function of its inputs.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, money::DEFAULT_BASE_CURRENCY};

/// The timezone assumed when the profile does not specify one.
pub const DEFAULT_TIMEZONE: &str = "America/Montevideo";

/// The settings that shape every budget and statistics computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// The ISO 4217 currency everything is converted into for aggregation.
    pub base_currency: String,
    /// The canonical IANA timezone the user lives in.
    pub timezone: String,
    /// The day of month (1 to 28) the budget window starts on, for users
    /// whose month runs payday to payday. `None` means calendar months.
    pub budget_cycle_day: Option<u8>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_owned(),
            timezone: DEFAULT_TIMEZONE.to_owned(),
            budget_cycle_day: None,
        }
    }
}

/// Retrieve the profile, falling back to the documented defaults when no row
/// has been stored yet.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_profile(connection: &Connection) -> Result<Profile, Error> {
    let result = connection
        .prepare("SELECT base_currency, timezone, budget_cycle_day FROM profile WHERE id = 1")?
        .query_one([], map_profile_row);

    match result {
        Ok(profile) => Ok(profile),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(Profile::default()),
        Err(error) => Err(error.into()),
    }
}

/// Store the profile, replacing any previous one.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCycleDay] if the cycle day is outside 1 to 28,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_profile(profile: &Profile, connection: &Connection) -> Result<(), Error> {
    if let Some(day) = profile.budget_cycle_day
        && !(1..=28).contains(&day)
    {
        return Err(Error::InvalidCycleDay(day));
    }

    connection.execute(
        "INSERT INTO profile (id, base_currency, timezone, budget_cycle_day)
         VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            base_currency = excluded.base_currency,
            timezone = excluded.timezone,
            budget_cycle_day = excluded.budget_cycle_day",
        (
            &profile.base_currency,
            &profile.timezone,
            profile.budget_cycle_day,
        ),
    )?;

    Ok(())
}

/// Create the profile table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_profile_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                base_currency TEXT NOT NULL,
                timezone TEXT NOT NULL,
                budget_cycle_day INTEGER
                )",
        (),
    )?;

    Ok(())
}

fn map_profile_row(row: &Row) -> Result<Profile, rusqlite::Error> {
    Ok(Profile {
        base_currency: row.get(0)?,
        timezone: row.get(1)?,
        budget_cycle_day: row.get(2)?,
    })
}
