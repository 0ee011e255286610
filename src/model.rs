use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ImportDefaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Other,
}

impl Gender {
    /// Unrecognized values fall back to `Other`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Region {
    #[default]
    Central,
    North,
    South,
    East,
    West,
}

impl Region {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "central" => Some(Self::Central),
            "north" | "northern" => Some(Self::North),
            "south" | "southern" => Some(Self::South),
            "east" | "eastern" => Some(Self::East),
            "west" | "western" => Some(Self::West),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Central => "Central",
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VolunteerRole {
    #[serde(rename = "Event Staff")]
    EventStaff,
    Mentor,
    Logistics,
    Administrative,
    Fundraising,
}

impl VolunteerRole {
    pub const ALL: [VolunteerRole; 5] = [
        Self::EventStaff,
        Self::Mentor,
        Self::Logistics,
        Self::Administrative,
        Self::Fundraising,
    ];

    /// Accepts the label in any casing, with or without the separator
    /// ("Event Staff", "event_staff", "EVENTSTAFF").
    pub fn parse(s: &str) -> Option<Self> {
        let folded = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match folded.as_str() {
            "eventstaff" => Some(Self::EventStaff),
            "mentor" => Some(Self::Mentor),
            "logistics" => Some(Self::Logistics),
            "administrative" => Some(Self::Administrative),
            "fundraising" => Some(Self::Fundraising),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EventStaff => "Event Staff",
            Self::Mentor => "Mentor",
            Self::Logistics => "Logistics",
            Self::Administrative => "Administrative",
            Self::Fundraising => "Fundraising",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum VolunteerStatus {
    #[default]
    Active,
    Inactive,
}

impl VolunteerStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub gender: Gender,
    pub age: Option<u32>,
    pub region: Region,
    pub institution: Option<String>,
    pub is_member: bool,
    pub is_contestant: bool,
    pub notes: Option<String>,
    pub photo_ref: Option<String>,
    pub last_card_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Number of event registrations.
    pub engagement_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub name: String,
    pub contact: String,
    pub gender: Gender,
    pub age: Option<u32>,
    pub region: Region,
    pub institution: Option<String>,
    pub is_member: bool,
    pub is_contestant: bool,
    pub notes: Option<String>,
}

/// Loosely typed participant fields as they arrive over IPC.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact: String,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub region: Option<String>,
    pub institution: Option<String>,
    pub is_member: Option<bool>,
    pub is_contestant: Option<bool>,
    pub notes: Option<String>,
}

impl ParticipantInput {
    pub fn into_new(self, defaults: &ImportDefaults) -> Result<NewParticipant, String> {
        let name = self.name.trim().to_string();
        let contact = self.contact.trim().to_string();
        if name.is_empty() || contact.is_empty() {
            return Err("name and contact are required".to_string());
        }
        Ok(NewParticipant {
            name,
            contact,
            gender: self.gender.as_deref().map(Gender::parse).unwrap_or_default(),
            age: self.age,
            region: self
                .region
                .as_deref()
                .and_then(Region::parse)
                .unwrap_or(defaults.region),
            institution: non_empty(self.institution),
            is_member: self.is_member.unwrap_or(false),
            is_contestant: self.is_contestant.unwrap_or(false),
            notes: non_empty(self.notes),
        })
    }
}

/// Fields left as `None` are not touched. An empty string clears
/// `institution`, `notes` and `photoRef`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPatch {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub region: Option<String>,
    pub institution: Option<String>,
    pub is_member: Option<bool>,
    pub is_contestant: Option<bool>,
    pub notes: Option<String>,
    pub photo_ref: Option<String>,
}

impl ParticipantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.region.is_none()
            && self.institution.is_none()
            && self.is_member.is_none()
            && self.is_contestant.is_none()
            && self.notes.is_none()
            && self.photo_ref.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: String,
    pub name: String,
    pub institution: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSummary {
    #[serde(flatten)]
    pub club: Club,
    pub member_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub category: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub attendee_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Volunteer {
    pub id: String,
    pub participant_id: String,
    pub role: VolunteerRole,
    pub status: VolunteerStatus,
    pub start_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVolunteer {
    pub participant_id: String,
    pub role: VolunteerRole,
    pub status: VolunteerStatus,
    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VolunteerSummary {
    #[serde(flatten)]
    pub volunteer: Volunteer,
    pub participant_name: String,
    pub participant_contact: String,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
