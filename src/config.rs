use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::{json, Value};

use crate::db;
use crate::model::{Region, VolunteerStatus};

pub const IMPORT_SECTION_KEY: &str = "setup.import";
pub const EXPORT_SECTION_KEY: &str = "setup.export";

pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Fallbacks applied while coercing imported rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportDefaults {
    pub region: Region,
    pub volunteer_status: VolunteerStatus,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            region: Region::Central,
            volunteer_status: VolunteerStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFormat {
    pub date_format: String,
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

pub fn default_import_section() -> Value {
    json!({
        "defaultRegion": "central",
        "defaultVolunteerStatus": "active"
    })
}

pub fn default_export_section() -> Value {
    json!({
        "dateFormat": DEFAULT_DATE_FORMAT
    })
}

/// Stored section merged over its defaults. Unreadable settings read as defaults.
pub fn load_section(conn: &Connection, key: &str, defaults: Value) -> Value {
    let mut merged = defaults;
    let stored = db::settings_get_json(conn, key).ok().flatten();
    if let (Some(base), Some(Value::Object(over))) = (merged.as_object_mut(), stored) {
        for (k, v) in over {
            base.insert(k, v);
        }
    }
    merged
}

pub fn load_import_defaults(conn: &Connection) -> ImportDefaults {
    let section = load_section(conn, IMPORT_SECTION_KEY, default_import_section());
    let fallback = ImportDefaults::default();
    ImportDefaults {
        region: section
            .get("defaultRegion")
            .and_then(|v| v.as_str())
            .and_then(Region::parse)
            .unwrap_or(fallback.region),
        volunteer_status: section
            .get("defaultVolunteerStatus")
            .and_then(|v| v.as_str())
            .and_then(VolunteerStatus::parse)
            .unwrap_or(fallback.volunteer_status),
    }
}

pub fn load_export_format(conn: &Connection) -> ExportFormat {
    let section = load_section(conn, EXPORT_SECTION_KEY, default_export_section());
    section
        .get("dateFormat")
        .and_then(|v| v.as_str())
        .filter(|s| is_valid_date_format(s))
        .map(|s| ExportFormat {
            date_format: s.to_string(),
        })
        .unwrap_or_default()
}

/// A format is usable when it parses and renders a bare date. Time and
/// offset specifiers parse fine but fail to render without a time.
pub fn is_valid_date_format(fmt: &str) -> bool {
    if fmt.trim().is_empty() || StrftimeItems::new(fmt).any(|item| matches!(item, Item::Error)) {
        return false;
    }
    let mut out = String::new();
    write!(out, "{}", NaiveDate::MIN.format(fmt)).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_format_validation() {
        assert!(is_valid_date_format("%m/%d/%Y"));
        assert!(is_valid_date_format("%Y-%m-%d"));
        assert!(!is_valid_date_format(""));
        assert!(!is_valid_date_format("%Q"));
        assert!(!is_valid_date_format("%H:%M"));
        assert!(!is_valid_date_format("%Y-%m-%d %z"));
    }

    #[test]
    fn stored_sections_override_defaults() {
        let conn = db::open_in_memory().expect("open db");
        assert_eq!(load_import_defaults(&conn), ImportDefaults::default());
        assert_eq!(load_export_format(&conn), ExportFormat::default());

        db::settings_set_json(
            &conn,
            IMPORT_SECTION_KEY,
            &json!({ "defaultRegion": "west" }),
        )
        .expect("store section");
        db::settings_set_json(&conn, EXPORT_SECTION_KEY, &json!({ "dateFormat": "%d.%m.%Y" }))
            .expect("store section");

        let defaults = load_import_defaults(&conn);
        assert_eq!(defaults.region, Region::West);
        assert_eq!(defaults.volunteer_status, VolunteerStatus::Active);
        assert_eq!(load_export_format(&conn).date_format, "%d.%m.%Y");
    }
}
