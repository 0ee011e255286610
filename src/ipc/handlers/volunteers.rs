use crate::config;
use crate::db;
use crate::ipc::helpers::{get_optional_str, get_required_str, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::model::{NewVolunteer, VolunteerRole, VolunteerStatus};
use crate::reconcile::row::parse_date;
use crate::store::{SqliteStore, Store};
use chrono::Utc;
use rusqlite::Connection;
use serde_json::{json, Value};

fn volunteers_list(conn: &Connection, _params: &Value) -> Result<Value, HandlerErr> {
    Ok(json!({ "volunteers": db::list_volunteers(conn)? }))
}

fn volunteers_create(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let participant_id = get_required_str(params, "participantId")?;
    let raw_role = get_required_str(params, "role")?;
    let role = VolunteerRole::parse(&raw_role).ok_or_else(|| {
        let allowed = VolunteerRole::ALL.map(VolunteerRole::as_str).join(", ");
        HandlerErr::bad_params(format!("role must be one of: {}", allowed))
    })?;
    let status = match get_optional_str(params, "status") {
        Some(s) => VolunteerStatus::parse(&s)
            .ok_or_else(|| HandlerErr::bad_params("status must be one of: active, inactive"))?,
        None => config::load_import_defaults(conn).volunteer_status,
    };
    let start_date = match get_optional_str(params, "startDate") {
        Some(s) => parse_date(&s)
            .ok_or_else(|| HandlerErr::bad_params(format!("invalid startDate: {}", s)))?,
        None => Utc::now().date_naive(),
    };

    let volunteer = SqliteStore::new(conn).add_volunteer(&NewVolunteer {
        participant_id,
        role,
        status,
        start_date,
    })?;
    Ok(json!({ "volunteer": volunteer }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let f = match req.method.as_str() {
        "volunteers.list" => volunteers_list,
        "volunteers.create" => volunteers_create,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
