mod test_support;

use serde_json::json;
use test_support::{temp_dir, Sidecar};

#[test]
fn export_writes_selected_columns_in_order_with_formatting() {
    let workspace = temp_dir("youthnet-export");
    let out = workspace.join("out").join("participants.csv");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    sidecar.request_ok(
        "participants.create",
        json!({ "name": "Amina", "contact": "0788", "isMember": true }),
    );
    sidecar.request_ok(
        "participants.create",
        json!({ "name": "Bosco", "contact": "0799" }),
    );

    let res = sidecar.request_ok(
        "exports.run",
        json!({
            "entity": "participants",
            "columns": ["isMember", "name", "institution"],
            "outPath": out.to_string_lossy()
        }),
    );
    assert_eq!(res["rowsExported"], 2);
    let text = std::fs::read_to_string(&out).expect("read export");
    assert_eq!(text, "Member,Name,Institution\nYes,Amina,\nNo,Bosco,\n");

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn empty_selection_or_entity_set_never_writes_a_file() {
    let workspace = temp_dir("youthnet-export-guards");
    let out = workspace.join("never.csv");
    let mut sidecar = Sidecar::with_workspace(&workspace);

    let code = sidecar.request_err(
        "exports.run",
        json!({ "entity": "clubs", "columns": ["name"], "outPath": out.to_string_lossy() }),
    );
    assert_eq!(code, "export_empty");
    assert!(!out.exists());

    sidecar.request_ok(
        "clubs.create",
        json!({ "name": "Chess", "institution": "Hilltop High" }),
    );
    let code = sidecar.request_err(
        "exports.run",
        json!({ "entity": "clubs", "columns": [], "outPath": out.to_string_lossy() }),
    );
    assert_eq!(code, "bad_params");
    assert!(!out.exists());

    let code = sidecar.request_err(
        "exports.run",
        json!({ "entity": "clubs", "columns": ["shoeSize"], "outPath": out.to_string_lossy() }),
    );
    assert_eq!(code, "bad_params");
    assert!(!out.exists());

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn export_dates_follow_the_configured_format() {
    let workspace = temp_dir("youthnet-export-dates");
    let out = workspace.join("events.csv");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    sidecar.request_ok(
        "events.create",
        json!({ "name": "Science Fair", "date": "2025-03-01", "category": "Competition" }),
    );

    let columns = json!(["name", "date", "attendeeCount"]);
    sidecar.request_ok(
        "exports.run",
        json!({ "entity": "events", "columns": columns, "outPath": out.to_string_lossy() }),
    );
    let text = std::fs::read_to_string(&out).expect("read export");
    assert_eq!(text, "Event,Date,Attendees\nScience Fair,03/01/2025,0\n");

    let code = sidecar.request_err(
        "setup.update",
        json!({ "section": "export", "patch": { "dateFormat": "" } }),
    );
    assert_eq!(code, "bad_params");
    for time_only in ["%H:%M", "%z"] {
        let code = sidecar.request_err(
            "setup.update",
            json!({ "section": "export", "patch": { "dateFormat": time_only } }),
        );
        assert_eq!(code, "bad_params", "{} was accepted", time_only);
    }
    let setup = sidecar.request_ok("setup.get", json!({}));
    assert_eq!(setup["export"]["dateFormat"], "%m/%d/%Y");

    sidecar.request_ok(
        "setup.update",
        json!({ "section": "export", "patch": { "dateFormat": "%Y-%m-%d" } }),
    );
    sidecar.request_ok(
        "exports.run",
        json!({ "entity": "events", "columns": columns, "outPath": out.to_string_lossy() }),
    );
    let text = std::fs::read_to_string(&out).expect("read export");
    assert_eq!(text, "Event,Date,Attendees\nScience Fair,2025-03-01,0\n");

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn column_catalogue_is_listed_per_entity() {
    let workspace = temp_dir("youthnet-export-columns");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let res = sidecar.request_ok("exports.columns", json!({ "entity": "volunteers" }));
    let keys: Vec<&str> = res["columns"]
        .as_array()
        .expect("columns")
        .iter()
        .filter_map(|c| c["key"].as_str())
        .collect();
    assert_eq!(
        keys,
        vec!["participantName", "participantContact", "role", "status", "startDate"]
    );
    let code = sidecar.request_err("exports.columns", json!({ "entity": "staff" }));
    assert_eq!(code, "bad_params");

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}
