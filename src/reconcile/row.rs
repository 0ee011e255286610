use chrono::NaiveDate;

use super::csv_io::RawRow;
use super::matcher::composite_key;
use crate::config::ImportDefaults;
use crate::model::{Gender, NewParticipant, Region, VolunteerRole, VolunteerStatus};

pub const NAME_COLUMNS: &[&str] = &["NAMES", "Name"];
pub const CONTACT_COLUMNS: &[&str] = &["CONTACT", "Contact"];
pub const GENDER_COLUMNS: &[&str] = &["GENDER", "Gender", "Sex"];
pub const AGE_COLUMNS: &[&str] = &["AGE", "Age"];
pub const REGION_COLUMNS: &[&str] = &["REGION", "Region"];
pub const INSTITUTION_COLUMNS: &[&str] = &["INSTITUTION", "Institution", "School"];
pub const MEMBER_COLUMNS: &[&str] = &["MEMBER", "Member", "Membership"];
pub const CONTESTANT_COLUMNS: &[&str] = &["CONTESTANT", "Contestant"];
pub const NOTES_COLUMNS: &[&str] = &["NOTES", "Notes"];
pub const ROLE_COLUMNS: &[&str] = &["ROLE", "Role"];
pub const STATUS_COLUMNS: &[&str] = &["STATUS", "Status"];
pub const START_DATE_COLUMNS: &[&str] = &["START DATE", "StartDate", "Start Date", "start_date"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Participants,
    ClubMembers,
    EventAttendees,
    Volunteers,
}

impl ImportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "participants" => Some(Self::Participants),
            "clubMembers" => Some(Self::ClubMembers),
            "eventAttendees" => Some(Self::EventAttendees),
            "volunteers" => Some(Self::Volunteers),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Participants => "participants",
            Self::ClubMembers => "clubMembers",
            Self::EventAttendees => "eventAttendees",
            Self::Volunteers => "volunteers",
        }
    }

    pub fn required_columns(self) -> &'static [&'static [&'static str]] {
        match self {
            Self::Volunteers => &[NAME_COLUMNS, CONTACT_COLUMNS, ROLE_COLUMNS],
            _ => &[NAME_COLUMNS, CONTACT_COLUMNS],
        }
    }
}

/// A free-text date cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateField {
    Missing,
    Valid(NaiveDate),
    Invalid(String),
}

impl DateField {
    fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            None => Self::Missing,
            Some(raw) => match parse_date(raw) {
                Some(d) => Self::Valid(d),
                None => Self::Invalid(raw.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolunteerFields {
    pub role: VolunteerRole,
    pub status: VolunteerStatus,
    pub start_date: DateField,
}

/// A row that passed required-field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub line: usize,
    pub key: String,
    pub participant: NewParticipant,
    pub volunteer: Option<VolunteerFields>,
}

pub type Coerced = Result<CandidateRow, Vec<String>>;

pub fn coerce(raw: &RawRow, kind: ImportKind, defaults: &ImportDefaults) -> Coerced {
    let mut reasons = Vec::new();
    let name = raw.get(NAME_COLUMNS);
    let contact = raw.get(CONTACT_COLUMNS);
    if name.is_none() {
        reasons.push("missing name".to_string());
    }
    if contact.is_none() {
        reasons.push("missing contact".to_string());
    }

    let volunteer = if kind == ImportKind::Volunteers {
        match raw.get(ROLE_COLUMNS) {
            None => {
                reasons.push("missing role".to_string());
                None
            }
            Some(r) => match VolunteerRole::parse(r) {
                None => {
                    reasons.push(format!("unrecognized role \"{r}\""));
                    None
                }
                Some(role) => Some(VolunteerFields {
                    role,
                    status: raw
                        .get(STATUS_COLUMNS)
                        .and_then(VolunteerStatus::parse)
                        .unwrap_or(defaults.volunteer_status),
                    start_date: DateField::from_cell(raw.get(START_DATE_COLUMNS)),
                }),
            },
        }
    } else {
        None
    };

    let (Some(name), Some(contact)) = (name, contact) else {
        return Err(reasons);
    };
    if !reasons.is_empty() {
        return Err(reasons);
    }

    Ok(CandidateRow {
        line: raw.line,
        key: composite_key(name, contact),
        participant: NewParticipant {
            name: name.to_string(),
            contact: contact.to_string(),
            gender: raw.get(GENDER_COLUMNS).map(Gender::parse).unwrap_or_default(),
            age: raw.get(AGE_COLUMNS).and_then(|s| s.parse::<u32>().ok()),
            region: raw
                .get(REGION_COLUMNS)
                .and_then(Region::parse)
                .unwrap_or(defaults.region),
            institution: raw.get(INSTITUTION_COLUMNS).map(str::to_string),
            is_member: raw
                .get(MEMBER_COLUMNS)
                .and_then(parse_boolish)
                .unwrap_or(false),
            is_contestant: raw
                .get(CONTESTANT_COLUMNS)
                .and_then(parse_boolish)
                .unwrap_or(false),
            notes: raw.get(NOTES_COLUMNS).map(str::to_string),
        },
        volunteer,
    })
}

pub fn parse_boolish(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
