//! Event store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the event aggregate: event row, membership links and owned
//!   logistics rows.
//! - Provide the description, date-range and participant lookups used by
//!   the service layer.
//!
//! # Invariants
//! - `save_event` replaces membership links and logistics rows of the event
//!   in one transaction; logistics dropped from the aggregate are deleted.
//! - List queries are ordered by `start_date ASC, uuid ASC`.

use super::logistics_repo::{load_logistics_for_event, upsert_logistics};
use super::participant_repo::load_participant_ids;
use super::{clamp_to_storable, date_to_db, parse_date, parse_uuid, RepoError, RepoResult};
use crate::model::event::{Event, EventId};
use crate::model::participant::Role;
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const EVENT_SELECT_SQL: &str = "SELECT DISTINCT
    e.uuid,
    e.description,
    e.start_date,
    e.end_date
FROM events e";

const EVENT_ORDER_SQL: &str = " ORDER BY e.start_date ASC, e.uuid ASC";

/// Repository interface for event persistence and queries.
pub trait EventRepository {
    /// Upserts the event aggregate and returns the stored state.
    fn save_event(&self, event: &Event) -> RepoResult<Event>;
    /// Loads the stored aggregate for `id`.
    fn find_event_by_id(&self, id: EventId) -> RepoResult<Option<Event>>;
    /// Descriptions are unique, so at most one event matches.
    fn find_event_by_description(&self, description: &str) -> RepoResult<Option<Event>>;
    /// Events whose date range intersects `[start, end]`, bounds inclusive.
    fn find_events_overlapping(&self, start: NaiveDate, end: NaiveDate)
        -> RepoResult<Vec<Event>>;
    /// Events with at least one participant matching name and role exactly.
    fn find_events_by_participant(
        &self,
        surname: &str,
        given_name: &str,
        role: Role,
    ) -> RepoResult<Vec<Event>>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn save_event(&self, event: &Event) -> RepoResult<Event> {
        event.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO events (uuid, description, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uuid) DO UPDATE SET
                description = excluded.description,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                event.id.to_string(),
                event.description.as_str(),
                date_to_db(event.start_date),
                date_to_db(event.end_date),
            ],
        )?;

        tx.execute(
            "DELETE FROM event_participants WHERE event_uuid = ?1;",
            [event.id.to_string()],
        )?;
        for participant_id in &event.participants {
            tx.execute(
                "INSERT INTO event_participants (event_uuid, participant_uuid)
                 VALUES (?1, ?2);",
                params![event.id.to_string(), participant_id.to_string()],
            )?;
        }

        prune_logistics(&tx, event)?;
        for (position, item) in event.logistics.iter().enumerate() {
            upsert_logistics(&tx, event.id, item, position as i64)?;
        }
        tx.commit()?;

        load_event_by_id(self.conn, event.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("event {} missing after save", event.id))
        })
    }

    fn find_event_by_id(&self, id: EventId) -> RepoResult<Option<Event>> {
        load_event_by_id(self.conn, id)
    }

    fn find_event_by_description(&self, description: &str) -> RepoResult<Option<Event>> {
        let mut events = query_events(
            self.conn,
            &format!("{EVENT_SELECT_SQL} WHERE e.description = ?1"),
            vec![Value::Text(description.to_string())],
        )?;
        Ok(events.pop())
    }

    fn find_events_overlapping(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepoResult<Vec<Event>> {
        query_events(
            self.conn,
            &format!(
                "{EVENT_SELECT_SQL}
                 WHERE e.start_date <= ?2
                   AND e.end_date >= ?1{EVENT_ORDER_SQL}"
            ),
            vec![
                Value::Text(date_to_db(clamp_to_storable(start))),
                Value::Text(date_to_db(clamp_to_storable(end))),
            ],
        )
    }

    fn find_events_by_participant(
        &self,
        surname: &str,
        given_name: &str,
        role: Role,
    ) -> RepoResult<Vec<Event>> {
        query_events(
            self.conn,
            &format!(
                "{EVENT_SELECT_SQL}
                 JOIN event_participants ep ON ep.event_uuid = e.uuid
                 JOIN participants p ON p.uuid = ep.participant_uuid
                 WHERE p.surname = ?1
                   AND p.given_name = ?2
                   AND p.role = ?3{EVENT_ORDER_SQL}"
            ),
            vec![
                Value::Text(surname.to_string()),
                Value::Text(given_name.to_string()),
                Value::Text(role.as_str().to_string()),
            ],
        )
    }
}

fn load_event_by_id(conn: &Connection, id: EventId) -> RepoResult<Option<Event>> {
    let mut events = query_events(
        conn,
        &format!("{EVENT_SELECT_SQL} WHERE e.uuid = ?1"),
        vec![Value::Text(id.to_string())],
    )?;
    Ok(events.pop())
}

/// Runs an event query and hydrates membership and logistics for each row.
fn query_events(conn: &Connection, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Event>> {
    let mut events = Vec::new();
    {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }
    }

    for event in &mut events {
        event.participants = load_participant_ids(conn, event.id)?;
        event.logistics = load_logistics_for_event(conn, event.id)?;
    }
    Ok(events)
}

fn prune_logistics(conn: &Connection, event: &Event) -> RepoResult<()> {
    let mut stmt = conn.prepare("SELECT uuid FROM logistics WHERE event_uuid = ?1;")?;
    let stored = stmt
        .query_map([event.id.to_string()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for uuid_text in stored {
        let id = parse_uuid(&uuid_text, "logistics.uuid")?;
        if event.logistics.iter().all(|item| item.id != id) {
            conn.execute("DELETE FROM logistics WHERE uuid = ?1;", [uuid_text])?;
        }
    }
    Ok(())
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let uuid_text: String = row.get("uuid")?;
    let start_text: String = row.get("start_date")?;
    let end_text: String = row.get("end_date")?;

    let event = Event::with_id(
        parse_uuid(&uuid_text, "events.uuid")?,
        row.get::<_, String>("description")?,
        parse_date(&start_text, "events.start_date")?,
        parse_date(&end_text, "events.end_date")?,
    );
    event.validate()?;
    Ok(event)
}
