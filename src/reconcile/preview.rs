use std::collections::HashMap;

use serde::Serialize;

use super::csv_io::{serialize_cells, RawRow};
use super::matcher::{Classification, IdentityMatcher};
use super::row::{coerce, CandidateRow, DateField};
use crate::config::ImportDefaults;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    New,
    Existing,
    AlreadyLinked,
    Invalid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRow {
    pub line: usize,
    #[serde(serialize_with = "serialize_cells")]
    pub data: Vec<(String, String)>,
    pub status: RowStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(skip)]
    pub candidate: Option<CandidateRow>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSummary {
    pub total: usize,
    pub new: usize,
    pub existing: usize,
    pub already_linked: usize,
    pub invalid: usize,
}

/// Classifies every non-blank row against the matcher's snapshot. Never writes.
pub fn build_preview(
    rows: &[RawRow],
    matcher: &IdentityMatcher<'_>,
    defaults: &ImportDefaults,
) -> Vec<PreviewRow> {
    let kind = matcher.target().kind();
    let mut first_new_line: HashMap<String, usize> = HashMap::new();

    rows.iter()
        .filter(|raw| !raw.is_blank())
        .map(|raw| {
            let coerced = coerce(raw, kind, defaults);
            let classification = matcher.classify(&coerced);
            let candidate = coerced.ok();
            let (status, mut message, participant_id) = match classification {
                Classification::New => (
                    RowStatus::New,
                    matcher.target().new_message().to_string(),
                    None,
                ),
                Classification::Existing { participant_id } => (
                    RowStatus::Existing,
                    matcher.target().existing_message().to_string(),
                    Some(participant_id),
                ),
                Classification::AlreadyLinked { participant_id } => (
                    RowStatus::AlreadyLinked,
                    matcher.target().already_linked_message().to_string(),
                    Some(participant_id),
                ),
                Classification::Invalid { reasons } => (RowStatus::Invalid, reasons.join("; "), None),
            };

            if let (RowStatus::New, Some(c)) = (status, candidate.as_ref()) {
                match first_new_line.get(&c.key) {
                    Some(earlier) => {
                        message = format!("duplicates line {earlier}; resolves to the participant created from it");
                    }
                    None => {
                        first_new_line.insert(c.key.clone(), raw.line);
                    }
                }
            }
            if matches!(status, RowStatus::New | RowStatus::Existing) {
                if let Some(DateField::Invalid(raw_date)) =
                    candidate.as_ref().and_then(|c| c.volunteer.as_ref()).map(|v| &v.start_date)
                {
                    message = format!("{message} (start date \"{raw_date}\" is not a valid date; row will fail)");
                }
            }

            PreviewRow {
                line: raw.line,
                data: raw.cells.clone(),
                status,
                message,
                participant_id,
                candidate,
            }
        })
        .collect()
}

pub fn summarize(rows: &[PreviewRow]) -> PreviewSummary {
    rows.iter().fold(PreviewSummary::default(), |mut acc, row| {
        acc.total += 1;
        match row.status {
            RowStatus::New => acc.new += 1,
            RowStatus::Existing => acc.existing += 1,
            RowStatus::AlreadyLinked => acc.already_linked += 1,
            RowStatus::Invalid => acc.invalid += 1,
        }
        acc
    })
}
