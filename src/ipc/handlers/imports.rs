use std::collections::HashSet;
use std::path::PathBuf;

use crate::config;
use crate::db;
use crate::ipc::handlers::clubs::require_club;
use crate::ipc::handlers::events::require_event;
use crate::ipc::helpers::{get_required_str, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::reconcile::executor;
use crate::reconcile::matcher::ImportTarget;
use crate::reconcile::plan_import;
use crate::reconcile::row::ImportKind;
use crate::store::SqliteStore;
use rusqlite::Connection;
use serde_json::{json, Value};

#[derive(Clone, Copy)]
enum Action {
    Preview,
    Apply,
}

/// `imports.<kind>.<preview|apply>`
fn parse_method(method: &str) -> Option<(ImportKind, Action)> {
    let rest = method.strip_prefix("imports.")?;
    let (kind, action) = rest.split_once('.')?;
    let action = match action {
        "preview" => Action::Preview,
        "apply" => Action::Apply,
        _ => return None,
    };
    Some((ImportKind::parse(kind)?, action))
}

fn resolve_target(
    conn: &Connection,
    kind: ImportKind,
    params: &Value,
) -> Result<(ImportTarget, HashSet<String>), HandlerErr> {
    Ok(match kind {
        ImportKind::Participants => (ImportTarget::Participants, HashSet::new()),
        ImportKind::ClubMembers => {
            let club = require_club(conn, &get_required_str(params, "clubId")?)?;
            let linked = db::club_member_ids(conn, &club.id)?;
            (ImportTarget::club(&club), linked)
        }
        ImportKind::EventAttendees => {
            let event = require_event(conn, &get_required_str(params, "eventId")?)?;
            let linked = db::event_attendee_ids(conn, &event.id)?;
            (ImportTarget::event(&event), linked)
        }
        ImportKind::Volunteers => (ImportTarget::Volunteers, db::volunteer_participant_ids(conn)?),
    })
}

fn parse_skip_lines(params: &Value) -> Result<HashSet<usize>, HandlerErr> {
    let Some(raw) = params.get("skipLines") else {
        return Ok(HashSet::new());
    };
    let Some(items) = raw.as_array() else {
        return Err(HandlerErr::bad_params("skipLines must be an array of line numbers"));
    };
    items
        .iter()
        .map(|v| {
            v.as_u64()
                .map(|n| n as usize)
                .ok_or_else(|| HandlerErr::bad_params("skipLines must be an array of line numbers"))
        })
        .collect()
}

fn run_import(
    conn: &Connection,
    params: &Value,
    kind: ImportKind,
    action: Action,
) -> Result<Value, HandlerErr> {
    let in_path = PathBuf::from(get_required_str(params, "inPath")?);
    let (target, linked) = resolve_target(conn, kind, params)?;
    let snapshot = db::list_participants(conn)?;
    let defaults = config::load_import_defaults(conn);

    let plan = plan_import(&in_path, &target, &snapshot, &linked, &defaults).map_err(|e| {
        HandlerErr::from(e).with_details(json!({ "path": in_path.to_string_lossy() }))
    })?;

    match action {
        Action::Preview => Ok(json!({
            "kind": kind.as_str(),
            "headers": plan.headers,
            "summary": plan.summary,
            "previewRows": plan.rows,
        })),
        Action::Apply => {
            let skip_lines = parse_skip_lines(params)?;
            let store = SqliteStore::new(conn);
            let report = executor::execute(&store, &target, &snapshot, &linked, &plan.rows, &skip_lines);
            Ok(json!({
                "kind": kind.as_str(),
                "created": report.stats.created,
                "converted": report.stats.converted,
                "skipped": report.stats.skipped,
                "failed": report.stats.failed,
            }))
        }
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let (kind, action) = parse_method(&req.method)?;
    Some(with_db(state, req, |conn, params| {
        run_import(conn, params, kind, action)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_split_into_kind_and_action() {
        assert!(matches!(
            parse_method("imports.clubMembers.preview"),
            Some((ImportKind::ClubMembers, Action::Preview))
        ));
        assert!(matches!(
            parse_method("imports.volunteers.apply"),
            Some((ImportKind::Volunteers, Action::Apply))
        ));
        assert!(parse_method("imports.staff.apply").is_none());
        assert!(parse_method("imports.participants.delete").is_none());
        assert!(parse_method("exports.run").is_none());
    }
}
