//! Participant store contract and SQLite implementation.
//!
//! # Invariants
//! - `save_participant` only adds membership links; removing a member is
//!   the owning event's job.
//! - `Participant.events` is always hydrated from `event_participants`.

use super::{parse_uuid, RepoError, RepoResult};
use crate::model::event::EventId;
use crate::model::participant::{Participant, ParticipantId, Role};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Repository interface for participant persistence.
pub trait ParticipantRepository {
    /// Upserts the participant and its memberships; returns the stored record.
    fn save_participant(&self, participant: &Participant) -> RepoResult<Participant>;
    fn find_participant_by_id(&self, id: ParticipantId) -> RepoResult<Option<Participant>>;
}

/// SQLite-backed participant repository.
pub struct SqliteParticipantRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParticipantRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ParticipantRepository for SqliteParticipantRepository<'_> {
    fn save_participant(&self, participant: &Participant) -> RepoResult<Participant> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO participants (uuid, surname, given_name, role)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uuid) DO UPDATE SET
                surname = excluded.surname,
                given_name = excluded.given_name,
                role = excluded.role,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                participant.id.to_string(),
                participant.surname.as_str(),
                participant.given_name.as_str(),
                participant.role.as_str(),
            ],
        )?;
        for event_id in &participant.events {
            tx.execute(
                "INSERT OR IGNORE INTO event_participants (event_uuid, participant_uuid)
                 VALUES (?1, ?2);",
                params![event_id.to_string(), participant.id.to_string()],
            )?;
        }
        tx.commit()?;

        self.find_participant_by_id(participant.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "participant {} missing after save",
                participant.id
            ))
        })
    }

    fn find_participant_by_id(&self, id: ParticipantId) -> RepoResult<Option<Participant>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, surname, given_name, role
             FROM participants
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut participant = parse_participant_row(row)?;
        participant.events = load_event_ids(self.conn, participant.id)?;
        Ok(Some(participant))
    }
}

/// Loads the participant ids linked to one event.
pub(crate) fn load_participant_ids(
    conn: &Connection,
    event_id: EventId,
) -> RepoResult<BTreeSet<ParticipantId>> {
    let mut stmt = conn.prepare(
        "SELECT participant_uuid FROM event_participants WHERE event_uuid = ?1;",
    )?;
    let mut rows = stmt.query([event_id.to_string()])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.insert(parse_uuid(&text, "event_participants.participant_uuid")?);
    }
    Ok(ids)
}

fn load_event_ids(conn: &Connection, participant_id: ParticipantId) -> RepoResult<BTreeSet<EventId>> {
    let mut stmt = conn.prepare(
        "SELECT event_uuid FROM event_participants WHERE participant_uuid = ?1;",
    )?;
    let mut rows = stmt.query([participant_id.to_string()])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.insert(parse_uuid(&text, "event_participants.event_uuid")?);
    }
    Ok(ids)
}

fn parse_participant_row(row: &Row<'_>) -> RepoResult<Participant> {
    let uuid_text: String = row.get("uuid")?;
    let role_text: String = row.get("role")?;
    let role = Role::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in participants.role"))
    })?;

    Ok(Participant::with_id(
        parse_uuid(&uuid_text, "participants.uuid")?,
        row.get::<_, String>("surname")?,
        row.get::<_, String>("given_name")?,
        role,
    ))
}
