use std::fmt::Write;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::config::{ExportFormat, DEFAULT_DATE_FORMAT};
use crate::model::{ClubSummary, EventSummary, Participant, VolunteerSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    pub key: &'static str,
    pub label: &'static str,
}

const fn col(key: &'static str, label: &'static str) -> ColumnDef {
    ColumnDef { key, label }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportValue {
    Text(String),
    Integer(i64),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Missing,
}

impl From<Option<String>> for ExportValue {
    fn from(v: Option<String>) -> Self {
        v.map(Self::Text).unwrap_or(Self::Missing)
    }
}

pub trait Exportable {
    fn columns() -> &'static [ColumnDef];
    fn value(&self, key: &str) -> ExportValue;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export")]
    NoEntities,
    #[error("select at least one column")]
    NoColumns,
    #[error("unknown column: {0}")]
    UnknownColumn(String),
}

impl ExportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoEntities => "export_empty",
            Self::NoColumns | Self::UnknownColumn(_) => "bad_params",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn format_value(value: &ExportValue, format: &ExportFormat) -> String {
    match value {
        ExportValue::Text(s) => s.clone(),
        ExportValue::Integer(n) => n.to_string(),
        ExportValue::Bool(true) => "Yes".to_string(),
        ExportValue::Bool(false) => "No".to_string(),
        ExportValue::Date(d) => format_date(*d, &format.date_format),
        ExportValue::Timestamp(t) => format_date(t.date_naive(), &format.date_format),
        ExportValue::Missing => String::new(),
    }
}

/// Renders with `fmt`, or with the default format when `fmt` cannot render a date.
fn format_date(d: NaiveDate, fmt: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", d.format(fmt)).is_ok() {
        return out;
    }
    out.clear();
    match write!(out, "{}", d.format(DEFAULT_DATE_FORMAT)) {
        Ok(()) => out,
        Err(_) => d.to_string(),
    }
}

/// Projects `entities` onto `selected` in the caller's column order.
pub fn build_export<T: Exportable>(
    entities: &[T],
    selected: &[String],
    format: &ExportFormat,
) -> Result<ExportTable, ExportError> {
    if selected.is_empty() {
        return Err(ExportError::NoColumns);
    }
    if entities.is_empty() {
        return Err(ExportError::NoEntities);
    }
    let columns = selected
        .iter()
        .map(|key| {
            T::columns()
                .iter()
                .find(|c| c.key == key.as_str())
                .ok_or_else(|| ExportError::UnknownColumn(key.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = entities
        .iter()
        .map(|e| {
            columns
                .iter()
                .map(|c| format_value(&e.value(c.key), format))
                .collect()
        })
        .collect();
    Ok(ExportTable {
        headers: columns.iter().map(|c| c.label.to_string()).collect(),
        rows,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEntity {
    Participants,
    Clubs,
    Events,
    Volunteers,
}

impl ExportEntity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "participants" => Some(Self::Participants),
            "clubs" => Some(Self::Clubs),
            "events" => Some(Self::Events),
            "volunteers" => Some(Self::Volunteers),
            _ => None,
        }
    }

    pub fn columns(self) -> &'static [ColumnDef] {
        match self {
            Self::Participants => Participant::columns(),
            Self::Clubs => ClubSummary::columns(),
            Self::Events => EventSummary::columns(),
            Self::Volunteers => VolunteerSummary::columns(),
        }
    }
}

const PARTICIPANT_COLUMNS: &[ColumnDef] = &[
    col("name", "Name"),
    col("contact", "Contact"),
    col("gender", "Gender"),
    col("age", "Age"),
    col("region", "Region"),
    col("institution", "Institution"),
    col("isMember", "Member"),
    col("isContestant", "Contestant"),
    col("engagementScore", "Engagement Score"),
    col("notes", "Notes"),
    col("createdAt", "Registered On"),
    col("lastCardGeneratedAt", "Card Generated On"),
];

impl Exportable for Participant {
    fn columns() -> &'static [ColumnDef] {
        PARTICIPANT_COLUMNS
    }

    fn value(&self, key: &str) -> ExportValue {
        match key {
            "name" => ExportValue::Text(self.name.clone()),
            "contact" => ExportValue::Text(self.contact.clone()),
            "gender" => ExportValue::Text(self.gender.as_str().to_string()),
            "age" => self
                .age
                .map(|a| ExportValue::Integer(i64::from(a)))
                .unwrap_or(ExportValue::Missing),
            "region" => ExportValue::Text(self.region.as_str().to_string()),
            "institution" => self.institution.clone().into(),
            "isMember" => ExportValue::Bool(self.is_member),
            "isContestant" => ExportValue::Bool(self.is_contestant),
            "engagementScore" => ExportValue::Integer(self.engagement_score),
            "notes" => self.notes.clone().into(),
            "createdAt" => ExportValue::Timestamp(self.created_at),
            "lastCardGeneratedAt" => self
                .last_card_generated_at
                .map(ExportValue::Timestamp)
                .unwrap_or(ExportValue::Missing),
            _ => ExportValue::Missing,
        }
    }
}

const CLUB_COLUMNS: &[ColumnDef] = &[
    col("name", "Club"),
    col("institution", "Institution"),
    col("description", "Description"),
    col("memberCount", "Members"),
    col("createdAt", "Created On"),
];

impl Exportable for ClubSummary {
    fn columns() -> &'static [ColumnDef] {
        CLUB_COLUMNS
    }

    fn value(&self, key: &str) -> ExportValue {
        match key {
            "name" => ExportValue::Text(self.club.name.clone()),
            "institution" => ExportValue::Text(self.club.institution.clone()),
            "description" => self.club.description.clone().into(),
            "memberCount" => ExportValue::Integer(self.member_count),
            "createdAt" => ExportValue::Timestamp(self.club.created_at),
            _ => ExportValue::Missing,
        }
    }
}

const EVENT_COLUMNS: &[ColumnDef] = &[
    col("name", "Event"),
    col("date", "Date"),
    col("category", "Category"),
    col("location", "Location"),
    col("attendeeCount", "Attendees"),
];

impl Exportable for EventSummary {
    fn columns() -> &'static [ColumnDef] {
        EVENT_COLUMNS
    }

    fn value(&self, key: &str) -> ExportValue {
        match key {
            "name" => ExportValue::Text(self.event.name.clone()),
            "date" => ExportValue::Date(self.event.date),
            "category" => ExportValue::Text(self.event.category.clone()),
            "location" => self.event.location.clone().into(),
            "attendeeCount" => ExportValue::Integer(self.attendee_count),
            _ => ExportValue::Missing,
        }
    }
}

const VOLUNTEER_COLUMNS: &[ColumnDef] = &[
    col("participantName", "Name"),
    col("participantContact", "Contact"),
    col("role", "Role"),
    col("status", "Status"),
    col("startDate", "Start Date"),
];

impl Exportable for VolunteerSummary {
    fn columns() -> &'static [ColumnDef] {
        VOLUNTEER_COLUMNS
    }

    fn value(&self, key: &str) -> ExportValue {
        match key {
            "participantName" => ExportValue::Text(self.participant_name.clone()),
            "participantContact" => ExportValue::Text(self.participant_contact.clone()),
            "role" => ExportValue::Text(self.volunteer.role.as_str().to_string()),
            "status" => ExportValue::Text(self.volunteer.status.as_str().to_string()),
            "startDate" => ExportValue::Date(self.volunteer.start_date),
            _ => ExportValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Region};
    use chrono::TimeZone;

    fn participant() -> Participant {
        Participant {
            id: "p1".to_string(),
            name: "Amina Uwase".to_string(),
            contact: "0788000111".to_string(),
            gender: Gender::Female,
            age: Some(16),
            region: Region::North,
            institution: None,
            is_member: true,
            is_contestant: false,
            notes: None,
            photo_ref: None,
            last_card_generated_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 9, 2, 10, 30, 0).unwrap(),
            engagement_score: 3,
        }
    }

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn rows_follow_the_selected_column_order() {
        let table = build_export(
            &[participant()],
            &keys(&["engagementScore", "name", "isMember"]),
            &ExportFormat::default(),
        )
        .expect("export");
        assert_eq!(table.headers, vec!["Engagement Score", "Name", "Member"]);
        assert_eq!(table.rows, vec![vec!["3", "Amina Uwase", "Yes"]]);
    }

    #[test]
    fn formatting_rules() {
        let fmt = ExportFormat::default();
        let table = build_export(
            &[participant()],
            &keys(&["isContestant", "institution", "createdAt", "lastCardGeneratedAt"]),
            &fmt,
        )
        .expect("export");
        assert_eq!(table.rows[0], vec!["No", "", "09/02/2024", ""]);

        let custom = ExportFormat {
            date_format: "%Y-%m-%d".to_string(),
        };
        let d = NaiveDate::from_ymd_opt(2025, 1, 31).expect("date");
        assert_eq!(format_value(&ExportValue::Date(d), &custom), "2025-01-31");
        assert_eq!(format_value(&ExportValue::Missing, &custom), "");
        assert_eq!(format_value(&ExportValue::Bool(true), &custom), "Yes");
    }

    #[test]
    fn time_only_format_falls_back_to_default_date_format() {
        let time_only = ExportFormat {
            date_format: "%H:%M".to_string(),
        };
        let d = NaiveDate::from_ymd_opt(2025, 3, 1).expect("date");
        assert_eq!(format_value(&ExportValue::Date(d), &time_only), "03/01/2025");
        let t = Utc.with_ymd_and_hms(2024, 9, 2, 10, 30, 0).unwrap();
        assert_eq!(format_value(&ExportValue::Timestamp(t), &time_only), "09/02/2024");
    }

    #[test]
    fn guards_reject_empty_selections() {
        let fmt = ExportFormat::default();
        assert_eq!(
            build_export(&[participant()], &[], &fmt),
            Err(ExportError::NoColumns)
        );
        assert_eq!(
            build_export::<Participant>(&[], &keys(&["name"]), &fmt),
            Err(ExportError::NoEntities)
        );
        assert_eq!(
            build_export(&[participant()], &keys(&["shoeSize"]), &fmt),
            Err(ExportError::UnknownColumn("shoeSize".to_string()))
        );
    }
}
