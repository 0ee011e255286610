use crate::db;
use crate::ipc::helpers::{
    get_optional_str, get_required_str, get_string_list, with_db, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::Event;
use crate::reconcile::row::parse_date;
use crate::store::{SqliteStore, Store};
use rusqlite::Connection;
use serde_json::{json, Value};

pub(crate) fn require_event(conn: &Connection, event_id: &str) -> Result<Event, HandlerErr> {
    db::get_event(conn, event_id)?.ok_or_else(|| {
        HandlerErr::new("not_found", "event not found").with_details(json!({ "eventId": event_id }))
    })
}

fn events_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "events": db::list_events(conn)? }))
}

fn events_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    let raw_date = get_required_str(params, "date")?;
    let date = parse_date(&raw_date)
        .ok_or_else(|| HandlerErr::bad_params(format!("invalid date: {}", raw_date)))?;
    let category = get_required_str(params, "category")?;
    let location = get_optional_str(params, "location");
    let description = get_optional_str(params, "description");
    let event = SqliteStore::new(conn).create_event(
        &name,
        date,
        &category,
        location.as_deref(),
        description.as_deref(),
    )?;
    Ok(json!({ "event": event }))
}

fn events_attendees_list(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let event_id = get_required_str(params, "eventId")?;
    require_event(conn, &event_id)?;
    Ok(json!({ "attendees": db::event_attendees(conn, &event_id)? }))
}

fn events_attendees_add(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let event_id = get_required_str(params, "eventId")?;
    let participant_id = get_required_str(params, "participantId")?;
    let added = SqliteStore::new(conn).add_participation(&participant_id, &event_id)?;
    Ok(json!({ "added": added }))
}

fn events_attendees_add_many(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let event_id = get_required_str(params, "eventId")?;
    let ids = get_string_list(params, "participantIds")?;
    let bulk = SqliteStore::new(conn).add_multiple_participations(&ids, &event_id)?;
    Ok(json!({ "added": bulk.added, "skipped": bulk.skipped }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let f = match req.method.as_str() {
        "events.list" => events_list,
        "events.create" => events_create,
        "events.attendees.list" => events_attendees_list,
        "events.attendees.add" => events_attendees_add,
        "events.attendees.addMany" => events_attendees_add_many,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
