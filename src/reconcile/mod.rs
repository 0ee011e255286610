//! Bulk CSV reconciliation: read a file, classify each row against the
//! existing roster, then apply the accepted rows through a [`Store`].
//!
//! [`Store`]: crate::store::Store

pub mod csv_io;
pub mod error;
pub mod executor;
pub mod export;
pub mod matcher;
pub mod preview;
pub mod row;
pub mod templates;

use std::collections::HashSet;
use std::path::Path;

use crate::config::ImportDefaults;
use crate::model::Participant;
use error::ImportError;
use matcher::{IdentityMatcher, ImportTarget};
use preview::{PreviewRow, PreviewSummary};

#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub headers: Vec<String>,
    pub rows: Vec<PreviewRow>,
    pub summary: PreviewSummary,
}

/// Reads and classifies `path`. Nothing is written.
pub fn plan_import(
    path: &Path,
    target: &ImportTarget,
    participants: &[Participant],
    linked: &HashSet<String>,
    defaults: &ImportDefaults,
) -> Result<ImportPlan, ImportError> {
    let parsed = csv_io::read_csv_file(path)?;
    parsed.require_columns(target.kind().required_columns())?;
    let matcher = IdentityMatcher::new(target, participants, linked);
    let rows = preview::build_preview(&parsed.rows, &matcher, defaults);
    let summary = preview::summarize(&rows);
    tracing::debug!(
        kind = target.kind().as_str(),
        total = summary.total,
        invalid = summary.invalid,
        "import planned"
    );
    Ok(ImportPlan {
        headers: parsed.headers,
        rows,
        summary,
    })
}
