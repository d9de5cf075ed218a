//! Logistics store contract and SQLite implementation.
//!
//! # Invariants
//! - Every logistics row is owned by exactly one existing event.
//! - `position` preserves insertion order within the owning event.

use super::{bool_to_int, parse_bool, parse_uuid, RepoError, RepoResult};
use crate::model::event::EventId;
use crate::model::logistics::{Logistics, LogisticsId};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

const LOGISTICS_SELECT_SQL: &str = "SELECT
    uuid,
    description,
    reserved,
    unit_price,
    quantity
FROM logistics";

/// Repository interface for logistics writes.
pub trait LogisticsRepository {
    /// Upserts one logistics row owned by `event_id` and returns the stored record.
    fn save_logistics(&self, event_id: EventId, logistics: &Logistics) -> RepoResult<Logistics>;
}

/// SQLite-backed logistics repository.
pub struct SqliteLogisticsRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLogisticsRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LogisticsRepository for SqliteLogisticsRepository<'_> {
    fn save_logistics(&self, event_id: EventId, logistics: &Logistics) -> RepoResult<Logistics> {
        logistics.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let event_exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM events WHERE uuid = ?1);",
            [event_id.to_string()],
            |row| row.get(0),
        )?;
        if !event_exists {
            return Err(RepoError::EventNotFound(event_id));
        }

        let current: Option<(String, i64)> = tx
            .query_row(
                "SELECT event_uuid, position FROM logistics WHERE uuid = ?1;",
                [logistics.id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let position = match current {
            Some((owner, position)) if owner == event_id.to_string() => position,
            _ => next_position(&tx, event_id)?,
        };
        upsert_logistics(&tx, event_id, logistics, position)?;
        tx.commit()?;

        load_logistics_by_id(self.conn, logistics.id)?.ok_or_else(|| {
            RepoError::InvalidData(format!(
                "logistics {} missing after save",
                logistics.id
            ))
        })
    }
}

pub(crate) fn upsert_logistics(
    conn: &Connection,
    event_id: EventId,
    logistics: &Logistics,
    position: i64,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO logistics (
            uuid,
            event_uuid,
            description,
            reserved,
            unit_price,
            quantity,
            position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(uuid) DO UPDATE SET
            event_uuid = excluded.event_uuid,
            description = excluded.description,
            reserved = excluded.reserved,
            unit_price = excluded.unit_price,
            quantity = excluded.quantity,
            position = excluded.position,
            updated_at = (strftime('%s', 'now') * 1000);",
        params![
            logistics.id.to_string(),
            event_id.to_string(),
            logistics.description.as_str(),
            bool_to_int(logistics.reserved),
            logistics.unit_price,
            logistics.quantity,
            position,
        ],
    )?;
    Ok(())
}

/// Loads an event's logistics in insertion order.
pub(crate) fn load_logistics_for_event(
    conn: &Connection,
    event_id: EventId,
) -> RepoResult<Vec<Logistics>> {
    let mut stmt = conn.prepare(&format!(
        "{LOGISTICS_SELECT_SQL}
         WHERE event_uuid = ?1
         ORDER BY position ASC, uuid ASC;"
    ))?;
    let mut rows = stmt.query([event_id.to_string()])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_logistics_row(row)?);
    }
    Ok(items)
}

fn load_logistics_by_id(conn: &Connection, id: LogisticsId) -> RepoResult<Option<Logistics>> {
    let mut stmt = conn.prepare(&format!("{LOGISTICS_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_logistics_row(row)?)),
        None => Ok(None),
    }
}

fn next_position(conn: &Connection, event_id: EventId) -> RepoResult<i64> {
    let position = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM logistics WHERE event_uuid = ?1;",
        [event_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(position)
}

fn parse_logistics_row(row: &Row<'_>) -> RepoResult<Logistics> {
    let uuid_text: String = row.get("uuid")?;
    let logistics = Logistics {
        id: parse_uuid(&uuid_text, "logistics.uuid")?,
        description: row.get("description")?,
        reserved: parse_bool(row.get("reserved")?, "logistics.reserved")?,
        unit_price: row.get("unit_price")?,
        quantity: row.get("quantity")?,
    };
    logistics.validate()?;
    Ok(logistics)
}
