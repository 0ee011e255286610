use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

use crate::model::{
    Club, ClubSummary, Event, EventSummary, Gender, Participant, Region, Volunteer,
    VolunteerRole, VolunteerStatus, VolunteerSummary,
};

pub const DB_FILE_NAME: &str = "youthnet.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    init_schema(&conn)?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS participants(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            contact TEXT NOT NULL,
            gender TEXT NOT NULL,
            age INTEGER,
            region TEXT NOT NULL,
            institution TEXT,
            is_member INTEGER NOT NULL DEFAULT 0,
            is_contestant INTEGER NOT NULL DEFAULT 0,
            notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;
    // Photo capture and card generation arrived after the first schema.
    ensure_participants_card_columns(conn)?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_participants_name_contact ON participants(name, contact)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS clubs(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            institution TEXT NOT NULL,
            description TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            event_date TEXT NOT NULL,
            category TEXT NOT NULL,
            location TEXT,
            description TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS club_memberships(
            id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL,
            club_id TEXT NOT NULL,
            join_date TEXT NOT NULL,
            FOREIGN KEY(participant_id) REFERENCES participants(id),
            FOREIGN KEY(club_id) REFERENCES clubs(id),
            UNIQUE(participant_id, club_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_club_memberships_club ON club_memberships(club_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS participations(
            id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL,
            event_id TEXT NOT NULL,
            registered_at TEXT NOT NULL,
            FOREIGN KEY(participant_id) REFERENCES participants(id),
            FOREIGN KEY(event_id) REFERENCES events(id),
            UNIQUE(participant_id, event_id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_participations_event ON participations(event_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_participations_participant ON participations(participant_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS volunteers(
            id TEXT PRIMARY KEY,
            participant_id TEXT NOT NULL,
            role TEXT NOT NULL,
            status TEXT NOT NULL,
            start_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(participant_id) REFERENCES participants(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_volunteers_participant ON volunteers(participant_id)",
        [],
    )?;

    Ok(())
}

fn ensure_participants_card_columns(conn: &Connection) -> anyhow::Result<()> {
    if !table_has_column(conn, "participants", "photo_ref")? {
        conn.execute("ALTER TABLE participants ADD COLUMN photo_ref TEXT", [])?;
    }
    if !table_has_column(conn, "participants", "last_card_generated_at")? {
        conn.execute(
            "ALTER TABLE participants ADD COLUMN last_card_generated_at TEXT",
            [],
        )?;
    }
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

pub fn settings_get_json(conn: &Connection, key: &str) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(conn: &Connection, key: &str, value: &serde_json::Value) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}

const PARTICIPANT_COLUMNS: &str = "p.id, p.name, p.contact, p.gender, p.age, p.region, p.institution,
       p.is_member, p.is_contestant, p.notes, p.photo_ref, p.last_card_generated_at, p.created_at,
       (SELECT COUNT(*) FROM participations pe WHERE pe.participant_id = p.id)";

fn participant_from_row(r: &Row<'_>) -> rusqlite::Result<Participant> {
    let gender: String = r.get(3)?;
    let age: Option<i64> = r.get(4)?;
    let region: String = r.get(5)?;
    Ok(Participant {
        id: r.get(0)?,
        name: r.get(1)?,
        contact: r.get(2)?,
        gender: Gender::parse(&gender),
        age: age.and_then(|v| u32::try_from(v).ok()),
        region: Region::parse(&region).unwrap_or_default(),
        institution: r.get(6)?,
        is_member: r.get::<_, i64>(7)? != 0,
        is_contestant: r.get::<_, i64>(8)? != 0,
        notes: r.get(9)?,
        photo_ref: r.get(10)?,
        last_card_generated_at: r.get::<_, Option<DateTime<Utc>>>(11)?,
        created_at: r.get(12)?,
        engagement_score: r.get(13)?,
    })
}

pub fn list_participants(conn: &Connection) -> rusqlite::Result<Vec<Participant>> {
    let sql = format!(
        "SELECT {} FROM participants p ORDER BY p.created_at, p.rowid",
        PARTICIPANT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], participant_from_row)?;
    rows.collect()
}

pub fn get_participant(conn: &Connection, participant_id: &str) -> rusqlite::Result<Option<Participant>> {
    let sql = format!("SELECT {} FROM participants p WHERE p.id = ?", PARTICIPANT_COLUMNS);
    conn.query_row(&sql, [participant_id], participant_from_row)
        .optional()
}

pub fn club_members(conn: &Connection, club_id: &str) -> rusqlite::Result<Vec<Participant>> {
    let sql = format!(
        "SELECT {} FROM participants p
         JOIN club_memberships cm ON cm.participant_id = p.id
         WHERE cm.club_id = ?
         ORDER BY cm.join_date, p.name",
        PARTICIPANT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([club_id], participant_from_row)?;
    rows.collect()
}

pub fn event_attendees(conn: &Connection, event_id: &str) -> rusqlite::Result<Vec<Participant>> {
    let sql = format!(
        "SELECT {} FROM participants p
         JOIN participations pe ON pe.participant_id = p.id
         WHERE pe.event_id = ?
         ORDER BY pe.registered_at, p.name",
        PARTICIPANT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([event_id], participant_from_row)?;
    rows.collect()
}

fn club_from_row(r: &Row<'_>) -> rusqlite::Result<Club> {
    Ok(Club {
        id: r.get(0)?,
        name: r.get(1)?,
        institution: r.get(2)?,
        description: r.get(3)?,
        created_at: r.get(4)?,
    })
}

pub fn list_clubs(conn: &Connection) -> rusqlite::Result<Vec<ClubSummary>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.institution, c.description, c.created_at,
                (SELECT COUNT(*) FROM club_memberships cm WHERE cm.club_id = c.id)
         FROM clubs c
         ORDER BY c.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(ClubSummary {
            club: club_from_row(r)?,
            member_count: r.get(5)?,
        })
    })?;
    rows.collect()
}

pub fn get_club(conn: &Connection, club_id: &str) -> rusqlite::Result<Option<Club>> {
    conn.query_row(
        "SELECT id, name, institution, description, created_at FROM clubs WHERE id = ?",
        [club_id],
        club_from_row,
    )
    .optional()
}

fn event_from_row(r: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: r.get(0)?,
        name: r.get(1)?,
        date: r.get(2)?,
        category: r.get(3)?,
        location: r.get(4)?,
        description: r.get(5)?,
        created_at: r.get(6)?,
    })
}

pub fn list_events(conn: &Connection) -> rusqlite::Result<Vec<EventSummary>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.name, e.event_date, e.category, e.location, e.description, e.created_at,
                (SELECT COUNT(*) FROM participations pe WHERE pe.event_id = e.id)
         FROM events e
         ORDER BY e.event_date DESC, e.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(EventSummary {
            event: event_from_row(r)?,
            attendee_count: r.get(7)?,
        })
    })?;
    rows.collect()
}

pub fn get_event(conn: &Connection, event_id: &str) -> rusqlite::Result<Option<Event>> {
    conn.query_row(
        "SELECT id, name, event_date, category, location, description, created_at
         FROM events WHERE id = ?",
        [event_id],
        event_from_row,
    )
    .optional()
}

pub fn volunteer_from_row(r: &Row<'_>) -> rusqlite::Result<Volunteer> {
    let role: String = r.get(2)?;
    let status: String = r.get(3)?;
    let role = VolunteerRole::parse(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown volunteer role: {role}").into(),
        )
    })?;
    Ok(Volunteer {
        id: r.get(0)?,
        participant_id: r.get(1)?,
        role,
        status: VolunteerStatus::parse(&status).unwrap_or_default(),
        start_date: r.get(4)?,
        created_at: r.get(5)?,
    })
}

pub fn list_volunteers(conn: &Connection) -> rusqlite::Result<Vec<VolunteerSummary>> {
    let mut stmt = conn.prepare(
        "SELECT v.id, v.participant_id, v.role, v.status, v.start_date, v.created_at,
                p.name, p.contact
         FROM volunteers v
         JOIN participants p ON p.id = v.participant_id
         ORDER BY v.start_date, p.name",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(VolunteerSummary {
            volunteer: volunteer_from_row(r)?,
            participant_name: r.get(6)?,
            participant_contact: r.get(7)?,
        })
    })?;
    rows.collect()
}

fn id_set(conn: &Connection, sql: &str, param: Option<&str>) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = match param {
        Some(p) => stmt.query_map([p], |r| r.get::<_, String>(0))?.collect(),
        None => stmt.query_map([], |r| r.get::<_, String>(0))?.collect(),
    };
    rows
}

pub fn club_member_ids(conn: &Connection, club_id: &str) -> rusqlite::Result<HashSet<String>> {
    id_set(
        conn,
        "SELECT participant_id FROM club_memberships WHERE club_id = ?",
        Some(club_id),
    )
}

pub fn event_attendee_ids(conn: &Connection, event_id: &str) -> rusqlite::Result<HashSet<String>> {
    id_set(
        conn,
        "SELECT participant_id FROM participations WHERE event_id = ?",
        Some(event_id),
    )
}

pub fn volunteer_participant_ids(conn: &Connection) -> rusqlite::Result<HashSet<String>> {
    id_set(conn, "SELECT DISTINCT participant_id FROM volunteers", None)
}
