//! Store contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define the Event, Participant and Logistics store contracts used by
//!   the service layer.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call the entity's `validate()` before SQL mutations.
//! - Lookups return `Option`; a miss is never an error at this layer.
//! - Multi-row writes run inside one `BEGIN IMMEDIATE` transaction.
//! - Event/participant membership lives in one link table, so both sides
//!   hydrate from the same rows.

pub mod event_repo;
pub mod logistics_repo;
pub mod participant_repo;

use crate::db::DbError;
use crate::model::event::{EventId, MAX_STORABLE_YEAR, MIN_STORABLE_YEAR};
use crate::model::ValidationError;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-layer error shared by all repositories.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    /// A write referenced an owning event row that does not exist.
    EventNotFound(EventId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::EventNotFound(id) => write!(f, "event not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::EventNotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn date_to_db(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Query bounds outside the storable years would break text ordering.
fn clamp_to_storable(date: NaiveDate) -> NaiveDate {
    let (Some(min), Some(max)) = (
        NaiveDate::from_ymd_opt(MIN_STORABLE_YEAR, 1, 1),
        NaiveDate::from_ymd_opt(MAX_STORABLE_YEAR, 12, 31),
    ) else {
        return date;
    };
    date.clamp(min, max)
}

fn parse_date(value: &str, column: &str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| RepoError::InvalidData(format!("invalid date value `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
