use crate::config;
use crate::db;
use crate::ipc::helpers::{get_optional_str, get_required_str, parse_param, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{Club, ParticipantInput};
use crate::store::{SqliteStore, Store};
use rusqlite::Connection;
use serde_json::{json, Value};

pub(crate) fn require_club(conn: &Connection, club_id: &str) -> Result<Club, HandlerErr> {
    db::get_club(conn, club_id)?.ok_or_else(|| {
        HandlerErr::new("not_found", "club not found").with_details(json!({ "clubId": club_id }))
    })
}

fn clubs_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "clubs": db::list_clubs(conn)? }))
}

fn clubs_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let institution = get_required_str(params, "institution")?;
    let description = get_optional_str(params, "description");
    let club = SqliteStore::new(conn).create_club(&name, &institution, description.as_deref())?;
    Ok(json!({ "club": club }))
}

fn clubs_members_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let club_id = get_required_str(params, "clubId")?;
    require_club(conn, &club_id)?;
    Ok(json!({ "members": db::club_members(conn, &club_id)? }))
}

fn clubs_members_add(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let club_id = get_required_str(params, "clubId")?;
    let participant_id = get_required_str(params, "participantId")?;
    let added = SqliteStore::new(conn).add_club_membership(&participant_id, &club_id)?;
    Ok(json!({ "added": added }))
}

/// Creates a participant straight into the club. The participant takes the
/// club's institution whatever the caller sent.
fn clubs_members_quick_add(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let club_id = get_required_str(params, "clubId")?;
    let club = require_club(conn, &club_id)?;
    let input: ParticipantInput = parse_param(params, None)?;
    let mut fields = input
        .into_new(&config::load_import_defaults(conn))
        .map_err(HandlerErr::bad_params)?;
    fields.institution = Some(club.institution.clone());
    let participant = SqliteStore::new(conn).add_participant(&fields, Some(&club.id))?;
    Ok(json!({ "participant": participant }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let f = match req.method.as_str() {
        "clubs.list" => clubs_list,
        "clubs.create" => clubs_create,
        "clubs.members.list" => clubs_members_list,
        "clubs.members.add" => clubs_members_add,
        "clubs.members.quickAdd" => clubs_members_quick_add,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
