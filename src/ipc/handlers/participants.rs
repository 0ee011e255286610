use crate::config;
use crate::db;
use crate::ipc::helpers::{
    get_optional_str, get_required_str, get_string_list, parse_param, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{ParticipantInput, ParticipantPatch};
use crate::store::{SqliteStore, Store};
use rusqlite::Connection;
use serde_json::{json, Value};

fn participants_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    let participants = db::list_participants(conn)?;
    Ok(json!({ "participants": participants }))
}

fn participants_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let input: ParticipantInput = parse_param(params, None)?;
    let fields = input
        .into_new(&config::load_import_defaults(conn))
        .map_err(HandlerErr::bad_params)?;
    let club_id = get_optional_str(params, "clubId");
    let participant = SqliteStore::new(conn).add_participant(&fields, club_id.as_deref())?;
    Ok(json!({ "participant": participant }))
}

fn participants_create_many(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let inputs: Vec<ParticipantInput> = parse_param(params, Some("participants"))?;
    let defaults = config::load_import_defaults(conn);
    let mut fields = Vec::with_capacity(inputs.len());
    for (idx, input) in inputs.into_iter().enumerate() {
        let f = input
            .into_new(&defaults)
            .map_err(|m| HandlerErr::bad_params(m).with_details(json!({ "index": idx })))?;
        fields.push(f);
    }
    let bulk = SqliteStore::new(conn).add_multiple_participants(&fields)?;
    Ok(json!({
        "created": bulk.created,
        "participantIds": bulk.participant_ids
    }))
}

fn participants_update(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let participant_id = get_required_str(params, "participantId")?;
    let patch: ParticipantPatch = parse_param(params, Some("patch"))?;
    if patch.is_empty() {
        return Err(HandlerErr::bad_params("patch must change at least one field"));
    }
    update_or_not_found(conn, &participant_id, &patch)
}

fn participants_set_photo(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let participant_id = get_required_str(params, "participantId")?;
    let photo_ref = params
        .get("photoRef")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HandlerErr::bad_params("missing photoRef"))?;
    let patch = ParticipantPatch {
        photo_ref: Some(photo_ref.to_string()),
        ..ParticipantPatch::default()
    };
    update_or_not_found(conn, &participant_id, &patch)
}

fn update_or_not_found(
    conn: &Connection,
    participant_id: &str,
    patch: &ParticipantPatch,
) -> Result<Value, HandlerErr> {
    if !SqliteStore::new(conn).update_participant(participant_id, patch)? {
        return Err(HandlerErr::new("not_found", "participant not found"));
    }
    Ok(json!({ "ok": true }))
}

fn participants_mark_card_generated(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let participant_id = get_required_str(params, "participantId")?;
    let at = SqliteStore::new(conn).mark_card_generated(&participant_id)?;
    Ok(json!({ "lastCardGeneratedAt": at }))
}

fn participants_delete(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let participant_id = get_required_str(params, "participantId")?;
    if !SqliteStore::new(conn).delete_participant(&participant_id)? {
        return Err(HandlerErr::new("not_found", "participant not found"));
    }
    Ok(json!({ "deleted": 1 }))
}

fn participants_delete_many(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let ids = get_string_list(params, "participantIds")?;
    let deleted = SqliteStore::new(conn).delete_multiple_participants(&ids)?;
    Ok(json!({ "deleted": deleted }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let f = match req.method.as_str() {
        "participants.list" => participants_list,
        "participants.create" => participants_create,
        "participants.createMany" => participants_create_many,
        "participants.update" => participants_update,
        "participants.setPhoto" => participants_set_photo,
        "participants.markCardGenerated" => participants_mark_card_generated,
        "participants.delete" => participants_delete,
        "participants.deleteMany" => participants_delete_many,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
