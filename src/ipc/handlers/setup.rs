use crate::config;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{Region, VolunteerStatus};
use serde_json::{json, Map, Value};

#[derive(Clone, Copy)]
enum SetupSection {
    Import,
    Export,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "import" => Some(Self::Import),
            "export" => Some(Self::Export),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Import => config::IMPORT_SECTION_KEY,
            Self::Export => config::EXPORT_SECTION_KEY,
        }
    }

    fn defaults(self) -> Value {
        match self {
            Self::Import => config::default_import_section(),
            Self::Export => config::default_export_section(),
        }
    }
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = current
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())?;
    for (k, v) in patch {
        match section {
            SetupSection::Import => match k.as_str() {
                "defaultRegion" => {
                    let s = parse_string_max(v, k, 16)?;
                    let region = Region::parse(&s).ok_or_else(|| {
                        "defaultRegion must be one of: central, north, south, east, west"
                            .to_string()
                    })?;
                    obj.insert(k.clone(), Value::String(region.as_str().to_ascii_lowercase()));
                }
                "defaultVolunteerStatus" => {
                    let s = parse_string_max(v, k, 16)?;
                    let status = VolunteerStatus::parse(&s).ok_or_else(|| {
                        "defaultVolunteerStatus must be one of: active, inactive".to_string()
                    })?;
                    obj.insert(k.clone(), Value::String(status.as_str().to_ascii_lowercase()));
                }
                _ => return Err(format!("unknown import field: {}", k)),
            },
            SetupSection::Export => match k.as_str() {
                "dateFormat" => {
                    let s = parse_string_max(v, k, 32)?;
                    if !config::is_valid_date_format(&s) {
                        return Err(format!("dateFormat cannot render a date: {}", s));
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                _ => return Err(format!("unknown export field: {}", k)),
            },
        }
    }
    Ok(())
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    ok(
        &req.id,
        json!({
            "import": config::load_section(conn, SetupSection::Import.key(), SetupSection::Import.defaults()),
            "export": config::load_section(conn, SetupSection::Export.key(), SetupSection::Export.defaults()),
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = config::load_section(conn, section.key(), section.defaults());
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = db::settings_set_json(conn, section.key(), &current) {
        return err(&req.id, "db_update_failed", e.to_string(), None);
    }
    tracing::info!(section = section.key(), "settings updated");
    ok(&req.id, current)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
