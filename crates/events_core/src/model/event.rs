//! Event domain model.
//!
//! # Responsibility
//! - Define the scheduled occurrence that owns logistics and groups
//!   participants.
//! - Provide association helpers that update both sides of a relation.
//!
//! # Invariants
//! - `id` is stable and never reused for another event.
//! - `description` is non-blank; storage keeps it unique.
//! - `end_date` is never earlier than `start_date`.
//! - Both dates fall in years `0000..=9999`, so their ISO text sorts by date.
//! - `logistics` holds at most one record per logistics id.

use super::logistics::Logistics;
use super::participant::{Participant, ParticipantId};
use super::ValidationError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable event identifier.
pub type EventId = Uuid;

pub const MIN_STORABLE_YEAR: i32 = 0;
pub const MAX_STORABLE_YEAR: i32 = 9999;

/// A scheduled occurrence with a date range, participants and logistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Shared membership; the event does not own participant lifecycle.
    pub participants: BTreeSet<ParticipantId>,
    /// Owned line items in insertion order.
    pub logistics: Vec<Logistics>,
}

impl Event {
    /// Creates an event with a generated stable ID and empty associations.
    pub fn new(
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), description, start_date, end_date)
    }

    /// Creates an event with a caller-provided stable ID.
    ///
    /// This constructor does not validate the date range.
    pub fn with_id(
        id: EventId,
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            start_date,
            end_date,
            participants: BTreeSet::new(),
            logistics: Vec::new(),
        }
    }

    /// Validates description, dates and every owned logistics record.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::BlankDescription);
        }
        for date in [self.start_date, self.end_date] {
            if !(MIN_STORABLE_YEAR..=MAX_STORABLE_YEAR).contains(&date.year()) {
                return Err(ValidationError::DateOutOfRange(date));
            }
        }
        if self.end_date < self.start_date {
            return Err(ValidationError::EndBeforeStart {
                start: self.start_date,
                end: self.end_date,
            });
        }
        for item in &self.logistics {
            item.validate()?;
        }
        Ok(())
    }

    /// Adds `participant` to this event and this event to `participant`.
    ///
    /// Returns `false` when the membership already existed on both sides.
    pub fn add_participant(&mut self, participant: &mut Participant) -> bool {
        let added_here = self.participants.insert(participant.id);
        let added_there = participant.events.insert(self.id);
        added_here || added_there
    }

    /// Appends a logistics record, replacing any record with the same id.
    pub fn attach_logistics(&mut self, logistics: Logistics) {
        match self.logistics.iter_mut().find(|item| item.id == logistics.id) {
            Some(existing) => *existing = logistics,
            None => self.logistics.push(logistics),
        }
    }

    /// Returns whether `[start, end]` intersects this event's date range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    /// Iterates reserved logistics in insertion order.
    pub fn reserved_logistics(&self) -> impl Iterator<Item = &Logistics> {
        self.logistics.iter().filter(|item| item.reserved)
    }

    /// Sum of `unit_price * quantity` over reserved logistics only.
    pub fn reserved_cost(&self) -> f64 {
        self.reserved_logistics().map(Logistics::line_cost).sum()
    }
}
