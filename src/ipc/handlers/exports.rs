use std::path::PathBuf;

use crate::config;
use crate::db;
use crate::ipc::helpers::{get_required_str, get_string_list, with_db, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::reconcile::csv_io::write_table;
use crate::reconcile::export::{build_export, ExportEntity, ExportTable};
use rusqlite::Connection;
use serde_json::{json, Value};

fn require_entity(params: &Value) -> Result<ExportEntity, HandlerErr> {
    let raw = get_required_str(params, "entity")?;
    ExportEntity::parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!(
            "entity must be one of: participants, clubs, events, volunteers (got {})",
            raw
        ))
    })
}

fn exports_columns(_conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let entity = require_entity(params)?;
    Ok(json!({ "columns": entity.columns() }))
}

fn exports_run(conn: &Connection, params: &Value) -> Result<Value, HandlerErr> {
    let entity = require_entity(params)?;
    let columns = get_string_list(params, "columns")?;
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let format = config::load_export_format(conn);

    let table: ExportTable = match entity {
        ExportEntity::Participants => build_export(&db::list_participants(conn)?, &columns, &format)?,
        ExportEntity::Clubs => build_export(&db::list_clubs(conn)?, &columns, &format)?,
        ExportEntity::Events => build_export(&db::list_events(conn)?, &columns, &format)?,
        ExportEntity::Volunteers => build_export(&db::list_volunteers(conn)?, &columns, &format)?,
    };

    write_table(&table.headers, &table.rows, &out_path).map_err(|e| {
        HandlerErr::new("io_failed", format!("{e:#}"))
            .with_details(json!({ "path": out_path.to_string_lossy() }))
    })?;
    tracing::info!(rows = table.rows.len(), path = %out_path.display(), "export written");
    Ok(json!({
        "rowsExported": table.rows.len(),
        "path": out_path.to_string_lossy()
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let f = match req.method.as_str() {
        "exports.columns" => exports_columns,
        "exports.run" => exports_run,
        _ => return None,
    };
    Some(with_db(state, req, f))
}
