use std::collections::{HashMap, HashSet};

use super::row::{Coerced, ImportKind};
use crate::model::{Club, Event, Participant};

/// `lowercase(trim(name)) + "_" + trim(contact)`. Every importer keys
/// identities this way.
pub fn composite_key(name: &str, contact: &str) -> String {
    format!("{}_{}", name.trim().to_lowercase(), contact.trim())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    Participants,
    ClubMembers { club_id: String, institution: String },
    EventAttendees { event_id: String },
    Volunteers,
}

impl ImportTarget {
    pub fn club(club: &Club) -> Self {
        Self::ClubMembers {
            club_id: club.id.clone(),
            institution: club.institution.clone(),
        }
    }

    pub fn event(event: &Event) -> Self {
        Self::EventAttendees {
            event_id: event.id.clone(),
        }
    }

    pub fn kind(&self) -> ImportKind {
        match self {
            Self::Participants => ImportKind::Participants,
            Self::ClubMembers { .. } => ImportKind::ClubMembers,
            Self::EventAttendees { .. } => ImportKind::EventAttendees,
            Self::Volunteers => ImportKind::Volunteers,
        }
    }

    /// Club imports only see participants of the club's institution.
    pub fn in_scope(&self, participant: &Participant) -> bool {
        match self {
            Self::ClubMembers { institution, .. } => participant
                .institution
                .as_deref()
                .map(|i| i.trim().eq_ignore_ascii_case(institution.trim()))
                .unwrap_or(false),
            _ => true,
        }
    }

    pub fn has_relation(&self) -> bool {
        !matches!(self, Self::Participants)
    }

    pub(crate) fn new_message(&self) -> &'static str {
        match self {
            Self::Participants => "will create participant",
            Self::ClubMembers { .. } => "will create participant and add to club",
            Self::EventAttendees { .. } => "will create participant and register for event",
            Self::Volunteers => "will create participant and add as volunteer",
        }
    }

    pub(crate) fn existing_message(&self) -> &'static str {
        match self {
            Self::Participants => "participant already exists",
            Self::ClubMembers { .. } => "existing participant will be added to club",
            Self::EventAttendees { .. } => "existing participant will be registered for event",
            Self::Volunteers => "existing participant will be added as volunteer",
        }
    }

    pub(crate) fn already_linked_message(&self) -> &'static str {
        match self {
            Self::Participants => "participant already exists",
            Self::ClubMembers { .. } => "already a member of this club",
            Self::EventAttendees { .. } => "already registered for this event",
            Self::Volunteers => "already a volunteer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    New,
    Existing { participant_id: String },
    AlreadyLinked { participant_id: String },
    Invalid { reasons: Vec<String> },
}

/// Indexes a participant snapshot once so every row of a file is classified
/// against the same state.
pub struct IdentityMatcher<'a> {
    target: &'a ImportTarget,
    by_key: HashMap<String, &'a Participant>,
    linked: &'a HashSet<String>,
}

impl<'a> IdentityMatcher<'a> {
    pub fn new(
        target: &'a ImportTarget,
        participants: &'a [Participant],
        linked: &'a HashSet<String>,
    ) -> Self {
        let mut by_key = HashMap::new();
        for p in participants.iter().filter(|p| target.in_scope(p)) {
            by_key
                .entry(composite_key(&p.name, &p.contact))
                .or_insert(p);
        }
        Self {
            target,
            by_key,
            linked,
        }
    }

    pub fn target(&self) -> &ImportTarget {
        self.target
    }

    pub fn lookup(&self, key: &str) -> Option<&'a Participant> {
        self.by_key.get(key).copied()
    }

    pub fn classify(&self, row: &Coerced) -> Classification {
        let candidate = match row {
            Ok(c) => c,
            Err(reasons) => {
                return Classification::Invalid {
                    reasons: reasons.clone(),
                }
            }
        };
        let Some(participant) = self.lookup(&candidate.key) else {
            return Classification::New;
        };
        let participant_id = participant.id.clone();
        if !self.target.has_relation() || self.linked.contains(&participant.id) {
            Classification::AlreadyLinked { participant_id }
        } else {
            Classification::Existing { participant_id }
        }
    }
}
