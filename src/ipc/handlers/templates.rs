use std::path::PathBuf;

use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::reconcile::row::ImportKind;
use crate::reconcile::templates::{file_name, template};
use serde_json::{json, Value};

fn require_kind(params: &Value) -> Result<ImportKind, HandlerErr> {
    let raw = get_required_str(params, "kind")?;
    ImportKind::parse(&raw).ok_or_else(|| {
        HandlerErr::bad_params(format!(
            "kind must be one of: participants, clubMembers, eventAttendees, volunteers (got {})",
            raw
        ))
    })
}

fn templates_get(params: &Value) -> Result<Value, HandlerErr> {
    let kind = require_kind(params)?;
    Ok(json!({
        "kind": kind.as_str(),
        "fileName": file_name(kind),
        "csv": template(kind)
    }))
}

fn templates_write(params: &Value) -> Result<Value, HandlerErr> {
    let kind = require_kind(params)?;
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let io_failed = |e: std::io::Error| {
        HandlerErr::new("io_failed", e.to_string())
            .with_details(json!({ "path": out_path.to_string_lossy() }))
    };
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_failed)?;
    }
    std::fs::write(&out_path, template(kind)).map_err(io_failed)?;
    Ok(json!({ "path": out_path.to_string_lossy() }))
}

/// Templates need no workspace.
pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "templates.get" => templates_get(&req.params),
        "templates.write" => templates_write(&req.params),
        _ => return None,
    };
    Some(match result {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
