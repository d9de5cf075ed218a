//! Participant domain model.
//!
//! # Responsibility
//! - Define the person record attached to events.
//! - Define the fixed role set a participant can hold.
//!
//! # Invariants
//! - `id` is stable and never reused for another participant.
//! - `events` is shared membership; a participant never owns an event.

use super::event::EventId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable participant identifier.
pub type ParticipantId = Uuid;

/// Function a participant holds within the events it joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Runs the event; the cost report is keyed on organizers.
    Organizer,
    Guest,
    Server,
    Animator,
}

impl Role {
    /// Storage and wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::Guest => "guest",
            Self::Server => "server",
            Self::Animator => "animator",
        }
    }

    /// Parses a storage/wire name, case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "organizer" => Some(Self::Organizer),
            "guest" => Some(Self::Guest),
            "server" => Some(Self::Server),
            "animator" => Some(Self::Animator),
            _ => None,
        }
    }
}

/// A person taking part in one or more events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub surname: String,
    pub given_name: String,
    pub role: Role,
    /// Events this participant is a member of. Hydrated from storage.
    pub events: BTreeSet<EventId>,
}

impl Participant {
    /// Creates a participant with a generated stable ID and no memberships.
    pub fn new(surname: impl Into<String>, given_name: impl Into<String>, role: Role) -> Self {
        Self::with_id(Uuid::new_v4(), surname, given_name, role)
    }

    /// Creates a participant with a caller-provided stable ID.
    pub fn with_id(
        id: ParticipantId,
        surname: impl Into<String>,
        given_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            surname: surname.into(),
            given_name: given_name.into(),
            role,
            events: BTreeSet::new(),
        }
    }

    /// Returns whether the participant matches the given name and role exactly.
    pub fn matches(&self, surname: &str, given_name: &str, role: Role) -> bool {
        self.surname == surname && self.given_name == given_name && self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::{Participant, Role};

    #[test]
    fn role_names_parse_back() {
        for role in [Role::Organizer, Role::Guest, Role::Server, Role::Animator] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse(" ORGANIZER "), Some(Role::Organizer));
        assert_eq!(Role::parse("chef"), None);
    }

    #[test]
    fn matches_requires_exact_name_and_role() {
        let participant = Participant::new("Tounsi", "Ahmed", Role::Organizer);
        assert!(participant.matches("Tounsi", "Ahmed", Role::Organizer));
        assert!(!participant.matches("Tounsi", "Ahmed", Role::Guest));
        assert!(!participant.matches("tounsi", "Ahmed", Role::Organizer));
    }
}
