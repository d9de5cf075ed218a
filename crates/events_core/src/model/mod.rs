//! Domain model for events, participants and logistics.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own association mutations so both sides of a relation stay in sync.
//!
//! # Invariants
//! - Every entity is identified by a stable UUID assigned at construction.
//! - Collections on entities are only written through model methods.
//! - Write paths call `validate()` before persistence.

pub mod event;
pub mod logistics;
pub mod participant;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for any domain entity.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Event description is empty after trim.
    BlankDescription,
    /// Event ends before it starts.
    EndBeforeStart {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
    /// Date year falls outside `MIN_STORABLE_YEAR..=MAX_STORABLE_YEAR`.
    DateOutOfRange(chrono::NaiveDate),
    /// Unit price is negative, NaN or infinite.
    InvalidUnitPrice(f64),
    /// Quantity is negative.
    NegativeQuantity(i32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankDescription => write!(f, "description must not be blank"),
            Self::EndBeforeStart { start, end } => {
                write!(f, "end date {end} is earlier than start date {start}")
            }
            Self::DateOutOfRange(date) => {
                write!(f, "date {date} is outside the supported years 0000-9999")
            }
            Self::InvalidUnitPrice(price) => {
                write!(f, "unit price must be a finite non-negative number, got {price}")
            }
            Self::NegativeQuantity(quantity) => {
                write!(f, "quantity must not be negative, got {quantity}")
            }
        }
    }
}

impl Error for ValidationError {}
