use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::Serialize;

use super::error::ImportError;
use super::matcher::{composite_key, ImportTarget};
use super::preview::{PreviewRow, RowStatus};
use super::row::{CandidateRow, DateField};
use crate::model::{NewVolunteer, Participant};
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub created: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created { participant_id: String },
    Converted { participant_id: String },
    Skipped(ImportError),
    Failed(ImportError),
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub stats: ImportStats,
    pub outcomes: Vec<(usize, RowOutcome)>,
}

impl ImportReport {
    fn record(&mut self, line: usize, outcome: RowOutcome) {
        match &outcome {
            RowOutcome::Created { participant_id } => {
                tracing::debug!(line, participant_id = %participant_id, "participant created");
                self.stats.created += 1;
            }
            RowOutcome::Converted { participant_id } => {
                tracing::debug!(line, participant_id = %participant_id, "relation attached");
                self.stats.converted += 1;
            }
            RowOutcome::Skipped(e) => {
                tracing::debug!(line, code = e.code(), "row skipped");
                self.stats.skipped += 1;
            }
            RowOutcome::Failed(e) => {
                tracing::warn!(line, error = %e, "import row failed");
                self.stats.failed += 1;
            }
        }
        self.outcomes.push((line, outcome));
    }
}

/// Batch-local participant roster: the in-scope snapshot plus everything
/// created earlier in the same run.
struct ShadowRoster {
    participants: Vec<Participant>,
    by_key: HashMap<String, usize>,
    linked: HashSet<String>,
}

impl ShadowRoster {
    fn new(target: &ImportTarget, snapshot: &[Participant], linked: &HashSet<String>) -> Self {
        let mut roster = Self {
            participants: Vec::with_capacity(snapshot.len()),
            by_key: HashMap::new(),
            linked: linked.clone(),
        };
        for p in snapshot.iter().filter(|p| target.in_scope(p)) {
            roster.push(p.clone());
        }
        roster
    }

    fn push(&mut self, participant: Participant) {
        let key = composite_key(&participant.name, &participant.contact);
        let idx = self.participants.len();
        self.participants.push(participant);
        self.by_key.entry(key).or_insert(idx);
    }

    fn resolve(&self, key: &str) -> Option<&Participant> {
        self.by_key.get(key).map(|&i| &self.participants[i])
    }
}

/// Applies the accepted preview rows one at a time, in file order. A row
/// that fails is recorded and the batch continues; nothing is rolled back.
pub fn execute<S: Store + ?Sized>(
    store: &S,
    target: &ImportTarget,
    snapshot: &[Participant],
    linked: &HashSet<String>,
    rows: &[PreviewRow],
    skip_lines: &HashSet<usize>,
) -> ImportReport {
    let mut shadow = ShadowRoster::new(target, snapshot, linked);
    let mut report = ImportReport::default();

    for row in rows {
        let line = row.line;
        if skip_lines.contains(&line) {
            report.record(
                line,
                RowOutcome::Skipped(ImportError::DuplicateSkip {
                    line,
                    reason: "deselected in preview".to_string(),
                }),
            );
            continue;
        }
        let candidate = match (row.status, row.candidate.as_ref()) {
            (RowStatus::Invalid, _) | (_, None) => {
                report.record(
                    line,
                    RowOutcome::Skipped(ImportError::Validation {
                        line,
                        reasons: row.message.clone(),
                    }),
                );
                continue;
            }
            (RowStatus::AlreadyLinked, _) => {
                report.record(
                    line,
                    RowOutcome::Skipped(ImportError::DuplicateSkip {
                        line,
                        reason: row.message.clone(),
                    }),
                );
                continue;
            }
            (_, Some(c)) => c,
        };

        let outcome = match row.status {
            RowStatus::New if shadow.resolve(&candidate.key).is_none() => {
                create_and_attach(store, target, &mut shadow, candidate)
            }
            // A New row whose identity was created earlier in this batch
            // resolves like an Existing one.
            _ => attach_existing(store, target, &mut shadow, candidate),
        };
        report.record(line, outcome);
    }

    tracing::info!(
        kind = target.kind().as_str(),
        created = report.stats.created,
        converted = report.stats.converted,
        skipped = report.stats.skipped,
        failed = report.stats.failed,
        "import finished"
    );
    report
}

fn create_and_attach<S: Store + ?Sized>(
    store: &S,
    target: &ImportTarget,
    shadow: &mut ShadowRoster,
    candidate: &CandidateRow,
) -> RowOutcome {
    let line = candidate.line;
    if let Err(e) = check_start_date(candidate) {
        return RowOutcome::Failed(e);
    }

    let mut fields = candidate.participant.clone();
    if let ImportTarget::ClubMembers { institution, .. } = target {
        fields.institution = Some(institution.clone());
    }
    let participant = match store.add_participant(&fields, None) {
        Ok(p) => p,
        Err(e) => {
            return RowOutcome::Failed(ImportError::WriteFailure {
                line,
                reason: e.to_string(),
            })
        }
    };
    let participant_id = participant.id.clone();
    shadow.push(participant);

    match attach(store, target, &participant_id, candidate) {
        Ok(()) => {
            shadow.linked.insert(participant_id.clone());
            RowOutcome::Created { participant_id }
        }
        Err(e) => RowOutcome::Failed(e),
    }
}

fn attach_existing<S: Store + ?Sized>(
    store: &S,
    target: &ImportTarget,
    shadow: &mut ShadowRoster,
    candidate: &CandidateRow,
) -> RowOutcome {
    let line = candidate.line;
    let Some(participant_id) = shadow.resolve(&candidate.key).map(|p| p.id.clone()) else {
        return RowOutcome::Failed(ImportError::WriteFailure {
            line,
            reason: "matched participant is no longer available".to_string(),
        });
    };
    if !target.has_relation() || shadow.linked.contains(&participant_id) {
        return RowOutcome::Skipped(ImportError::DuplicateSkip {
            line,
            reason: target.already_linked_message().to_string(),
        });
    }
    if let Err(e) = check_start_date(candidate) {
        return RowOutcome::Failed(e);
    }
    match attach(store, target, &participant_id, candidate) {
        Ok(()) => {
            shadow.linked.insert(participant_id.clone());
            RowOutcome::Converted { participant_id }
        }
        Err(e) => RowOutcome::Failed(e),
    }
}

fn check_start_date(candidate: &CandidateRow) -> Result<(), ImportError> {
    match candidate.volunteer.as_ref().map(|v| &v.start_date) {
        Some(DateField::Invalid(raw)) => Err(ImportError::Validation {
            line: candidate.line,
            reasons: format!("invalid date \"{raw}\""),
        }),
        _ => Ok(()),
    }
}

fn attach<S: Store + ?Sized>(
    store: &S,
    target: &ImportTarget,
    participant_id: &str,
    candidate: &CandidateRow,
) -> Result<(), ImportError> {
    let line = candidate.line;
    let write_failure = |reason: String| ImportError::WriteFailure { line, reason };
    let attached = match target {
        ImportTarget::Participants => return Ok(()),
        ImportTarget::ClubMembers { club_id, .. } => store
            .add_club_membership(participant_id, club_id)
            .map_err(|e| write_failure(e.to_string()))?,
        ImportTarget::EventAttendees { event_id } => store
            .add_participation(participant_id, event_id)
            .map_err(|e| write_failure(e.to_string()))?,
        ImportTarget::Volunteers => {
            let Some(v) = candidate.volunteer.as_ref() else {
                return Err(write_failure("volunteer fields missing".to_string()));
            };
            let start_date = match &v.start_date {
                DateField::Valid(d) => *d,
                DateField::Missing => Utc::now().date_naive(),
                DateField::Invalid(raw) => {
                    return Err(ImportError::Validation {
                        line,
                        reasons: format!("invalid date \"{raw}\""),
                    })
                }
            };
            store
                .add_volunteer(&NewVolunteer {
                    participant_id: participant_id.to_string(),
                    role: v.role,
                    status: v.status,
                    start_date,
                })
                .map_err(|e| write_failure(e.to_string()))?;
            true
        }
    };
    if attached {
        Ok(())
    } else {
        Err(write_failure("relation was not created".to_string()))
    }
}
