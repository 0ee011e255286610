use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db;
use crate::model::{
    Club, Event, Gender, NewParticipant, NewVolunteer, Participant, ParticipantPatch, Region,
    Volunteer,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db_query_failed",
            Self::NotFound { .. } => "not_found",
            Self::InvalidField { .. } => "bad_params",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkCreated {
    pub created: usize,
    pub participant_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkAttached {
    pub added: usize,
    pub skipped: usize,
}

/// Write side of the workspace. Relation attaches report `false` when the
/// relation already exists.
pub trait Store {
    fn add_participant(
        &self,
        fields: &NewParticipant,
        club_id: Option<&str>,
    ) -> Result<Participant, StoreError>;
    fn add_multiple_participants(&self, fields: &[NewParticipant]) -> Result<BulkCreated, StoreError>;
    fn update_participant(
        &self,
        participant_id: &str,
        patch: &ParticipantPatch,
    ) -> Result<bool, StoreError>;
    fn delete_participant(&self, participant_id: &str) -> Result<bool, StoreError>;
    fn delete_multiple_participants(&self, participant_ids: &[String]) -> Result<usize, StoreError>;
    fn add_club_membership(&self, participant_id: &str, club_id: &str) -> Result<bool, StoreError>;
    fn add_participation(&self, participant_id: &str, event_id: &str) -> Result<bool, StoreError>;
    fn add_multiple_participations(
        &self,
        participant_ids: &[String],
        event_id: &str,
    ) -> Result<BulkAttached, StoreError>;
    fn add_volunteer(&self, fields: &NewVolunteer) -> Result<Volunteer, StoreError>;
}

pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn create_club(
        &self,
        name: &str,
        institution: &str,
        description: Option<&str>,
    ) -> Result<Club, StoreError> {
        let club = Club {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            institution: institution.trim().to_string(),
            description: description
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO clubs(id, name, institution, description, created_at) VALUES(?, ?, ?, ?, ?)",
            (
                &club.id,
                &club.name,
                &club.institution,
                &club.description,
                club.created_at,
            ),
        )?;
        Ok(club)
    }

    pub fn create_event(
        &self,
        name: &str,
        date: NaiveDate,
        category: &str,
        location: Option<&str>,
        description: Option<&str>,
    ) -> Result<Event, StoreError> {
        let clean = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let event = Event {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            date,
            category: category.trim().to_string(),
            location: clean(location),
            description: clean(description),
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO events(id, name, event_date, category, location, description, created_at)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                &event.id,
                &event.name,
                event.date,
                &event.category,
                &event.location,
                &event.description,
                event.created_at,
            ),
        )?;
        Ok(event)
    }

    pub fn mark_card_generated(&self, participant_id: &str) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        let changed = self.conn.execute(
            "UPDATE participants SET last_card_generated_at = ?, updated_at = ? WHERE id = ?",
            (now, now, participant_id),
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                entity: "participant",
                id: participant_id.to_string(),
            });
        }
        Ok(now)
    }

    fn insert_participant(&self, fields: &NewParticipant) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO participants(
               id, name, contact, gender, age, region, institution,
               is_member, is_contestant, notes, created_at, updated_at
             ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                &id,
                fields.name.trim(),
                fields.contact.trim(),
                fields.gender.as_str(),
                fields.age.map(i64::from),
                fields.region.as_str(),
                fields.institution.as_deref(),
                i64::from(fields.is_member),
                i64::from(fields.is_contestant),
                fields.notes.as_deref(),
                now,
                now,
            ),
        )?;
        Ok(id)
    }

    fn insert_membership(&self, participant_id: &str, club_id: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO club_memberships(id, participant_id, club_id, join_date)
             VALUES(?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                participant_id,
                club_id,
                Utc::now().date_naive(),
            ),
        )?;
        Ok(changed > 0)
    }

    fn insert_participation(&self, participant_id: &str, event_id: &str) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO participations(id, participant_id, event_id, registered_at)
             VALUES(?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                participant_id,
                event_id,
                Utc::now(),
            ),
        )?;
        Ok(changed > 0)
    }

    fn require_exists(&self, table: &'static str, entity: &'static str, id: &str) -> Result<(), StoreError> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
        let found: Option<i64> = self
            .conn
            .query_row(&sql, [id], |r| r.get(0))
            .optional()?;
        match found {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                entity,
                id: id.to_string(),
            }),
        }
    }

    fn delete_cascade(&self, participant_id: &str) -> Result<bool, StoreError> {
        self.conn.execute(
            "DELETE FROM participations WHERE participant_id = ?",
            [participant_id],
        )?;
        self.conn.execute(
            "DELETE FROM club_memberships WHERE participant_id = ?",
            [participant_id],
        )?;
        self.conn.execute(
            "DELETE FROM volunteers WHERE participant_id = ?",
            [participant_id],
        )?;
        let changed = self
            .conn
            .execute("DELETE FROM participants WHERE id = ?", [participant_id])?;
        Ok(changed > 0)
    }
}

impl Store for SqliteStore<'_> {
    fn add_participant(
        &self,
        fields: &NewParticipant,
        club_id: Option<&str>,
    ) -> Result<Participant, StoreError> {
        if let Some(club_id) = club_id {
            self.require_exists("clubs", "club", club_id)?;
        }
        let tx = self.conn.unchecked_transaction()?;
        let participant_id = self.insert_participant(fields)?;
        if let Some(club_id) = club_id {
            self.insert_membership(&participant_id, club_id)?;
        }
        tx.commit()?;
        db::get_participant(self.conn, &participant_id)?.ok_or(StoreError::NotFound {
            entity: "participant",
            id: participant_id,
        })
    }

    fn add_multiple_participants(&self, fields: &[NewParticipant]) -> Result<BulkCreated, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut participant_ids = Vec::with_capacity(fields.len());
        for f in fields {
            participant_ids.push(self.insert_participant(f)?);
        }
        tx.commit()?;
        Ok(BulkCreated {
            created: participant_ids.len(),
            participant_ids,
        })
    }

    fn update_participant(
        &self,
        participant_id: &str,
        patch: &ParticipantPatch,
    ) -> Result<bool, StoreError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(name) = patch.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(StoreError::InvalidField {
                    field: "name",
                    value: String::new(),
                });
            }
            sets.push("name = ?");
            values.push(Box::new(name.to_string()));
        }
        if let Some(contact) = patch.contact.as_deref().map(str::trim) {
            if contact.is_empty() {
                return Err(StoreError::InvalidField {
                    field: "contact",
                    value: String::new(),
                });
            }
            sets.push("contact = ?");
            values.push(Box::new(contact.to_string()));
        }
        if let Some(gender) = patch.gender.as_deref() {
            sets.push("gender = ?");
            values.push(Box::new(Gender::parse(gender).as_str()));
        }
        if let Some(age) = patch.age {
            sets.push("age = ?");
            values.push(Box::new(i64::from(age)));
        }
        if let Some(region) = patch.region.as_deref() {
            let parsed = Region::parse(region).ok_or_else(|| StoreError::InvalidField {
                field: "region",
                value: region.to_string(),
            })?;
            sets.push("region = ?");
            values.push(Box::new(parsed.as_str()));
        }
        if let Some(institution) = patch.institution.as_deref() {
            sets.push("institution = NULLIF(?, '')");
            values.push(Box::new(institution.trim().to_string()));
        }
        if let Some(is_member) = patch.is_member {
            sets.push("is_member = ?");
            values.push(Box::new(i64::from(is_member)));
        }
        if let Some(is_contestant) = patch.is_contestant {
            sets.push("is_contestant = ?");
            values.push(Box::new(i64::from(is_contestant)));
        }
        if let Some(notes) = patch.notes.as_deref() {
            sets.push("notes = NULLIF(?, '')");
            values.push(Box::new(notes.trim().to_string()));
        }
        if let Some(photo_ref) = patch.photo_ref.as_deref() {
            sets.push("photo_ref = NULLIF(?, '')");
            values.push(Box::new(photo_ref.trim().to_string()));
        }

        if sets.is_empty() {
            return Ok(db::get_participant(self.conn, participant_id)?.is_some());
        }
        sets.push("updated_at = ?");
        values.push(Box::new(Utc::now()));
        values.push(Box::new(participant_id.to_string()));

        let sql = format!("UPDATE participants SET {} WHERE id = ?", sets.join(", "));
        let changed = self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    fn delete_participant(&self, participant_id: &str) -> Result<bool, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = self.delete_cascade(participant_id)?;
        tx.commit()?;
        Ok(deleted)
    }

    fn delete_multiple_participants(&self, participant_ids: &[String]) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut deleted = 0usize;
        for id in participant_ids {
            if self.delete_cascade(id)? {
                deleted += 1;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    fn add_club_membership(&self, participant_id: &str, club_id: &str) -> Result<bool, StoreError> {
        self.require_exists("participants", "participant", participant_id)?;
        self.require_exists("clubs", "club", club_id)?;
        self.insert_membership(participant_id, club_id)
    }

    fn add_participation(&self, participant_id: &str, event_id: &str) -> Result<bool, StoreError> {
        self.require_exists("participants", "participant", participant_id)?;
        self.require_exists("events", "event", event_id)?;
        self.insert_participation(participant_id, event_id)
    }

    fn add_multiple_participations(
        &self,
        participant_ids: &[String],
        event_id: &str,
    ) -> Result<BulkAttached, StoreError> {
        self.require_exists("events", "event", event_id)?;
        let tx = self.conn.unchecked_transaction()?;
        let mut summary = BulkAttached::default();
        for id in participant_ids {
            self.require_exists("participants", "participant", id)?;
            if self.insert_participation(id, event_id)? {
                summary.added += 1;
            } else {
                summary.skipped += 1;
            }
        }
        tx.commit()?;
        Ok(summary)
    }

    fn add_volunteer(&self, fields: &NewVolunteer) -> Result<Volunteer, StoreError> {
        self.require_exists("participants", "participant", &fields.participant_id)?;
        let volunteer = Volunteer {
            id: Uuid::new_v4().to_string(),
            participant_id: fields.participant_id.clone(),
            role: fields.role,
            status: fields.status,
            start_date: fields.start_date,
            created_at: Utc::now(),
        };
        self.conn.execute(
            "INSERT INTO volunteers(id, participant_id, role, status, start_date, created_at)
             VALUES(?, ?, ?, ?, ?, ?)",
            (
                &volunteer.id,
                &volunteer.participant_id,
                volunteer.role.as_str(),
                volunteer.status.as_str(),
                volunteer.start_date,
                volunteer.created_at,
            ),
        )?;
        Ok(volunteer)
    }
}
