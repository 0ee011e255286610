mod test_support;

use serde_json::json;
use test_support::{temp_dir, Sidecar};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("youthnet-router-smoke");
    let mut sidecar = Sidecar::spawn();

    let health = sidecar.request_ok("health", json!({}));
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
    assert!(health["workspacePath"].is_null());

    assert_eq!(sidecar.request_err("participants.list", json!({})), "no_workspace");
    assert_eq!(sidecar.request_err("workspace.select", json!({})), "bad_params");
    sidecar.request_ok(
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert!(workspace.join("youthnet.sqlite3").is_file());

    let methods = [
        ("setup.get", json!({})),
        ("participants.list", json!({})),
        ("clubs.list", json!({})),
        ("events.list", json!({})),
        ("volunteers.list", json!({})),
        ("exports.columns", json!({ "entity": "participants" })),
        ("templates.get", json!({ "kind": "clubMembers" })),
    ];
    for (method, params) in methods {
        sidecar.request_ok(method, params);
    }

    // Families that fail on bad params still have to be routed.
    for method in [
        "imports.participants.preview",
        "imports.eventAttendees.apply",
        "exports.run",
        "templates.write",
        "workspace.backup.import",
    ] {
        let code = sidecar.request_err(method, json!({}));
        assert_ne!(code, "not_implemented", "{} was not routed", method);
    }

    assert_eq!(sidecar.request_err("grades.list", json!({})), "not_implemented");
    assert_eq!(
        sidecar.request_err("imports.staff.preview", json!({})),
        "not_implemented"
    );

    let bad = sidecar.send_raw("{not json");
    assert_eq!(bad["ok"], false);
    assert_eq!(bad["error"]["code"], "bad_json");

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn settings_sections_merge_over_defaults() {
    let workspace = temp_dir("youthnet-setup");
    let mut sidecar = Sidecar::with_workspace(&workspace);

    let setup = sidecar.request_ok("setup.get", json!({}));
    assert_eq!(setup["import"]["defaultRegion"], "central");
    assert_eq!(setup["import"]["defaultVolunteerStatus"], "active");
    assert_eq!(setup["export"]["dateFormat"], "%m/%d/%Y");

    let updated = sidecar.request_ok(
        "setup.update",
        json!({ "section": "import", "patch": { "defaultVolunteerStatus": "Inactive" } }),
    );
    assert_eq!(updated["defaultVolunteerStatus"], "inactive");
    assert_eq!(updated["defaultRegion"], "central");

    for (section, patch) in [
        ("import", json!({ "defaultRegion": "Mars" })),
        ("import", json!({ "favouriteColour": "blue" })),
        ("reports", json!({})),
    ] {
        let code = sidecar.request_err("setup.update", json!({ "section": section, "patch": patch }));
        assert_eq!(code, "bad_params");
    }

    let p = sidecar.request_ok("participants.create", json!({ "name": "Amina", "contact": "1" }));
    let id = p["participant"]["id"].as_str().expect("id").to_string();
    let v = sidecar.request_ok(
        "volunteers.create",
        json!({ "participantId": id, "role": "Logistics" }),
    );
    assert_eq!(v["volunteer"]["status"], "Inactive");

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn templates_can_be_written_and_imported() {
    let workspace = temp_dir("youthnet-templates");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let out = workspace.join("tpl").join("participants.csv");

    let written = sidecar.request_ok(
        "templates.write",
        json!({ "kind": "participants", "outPath": out.to_string_lossy() }),
    );
    assert_eq!(written["path"], out.to_string_lossy().to_string());

    let preview = sidecar.request_ok(
        "imports.participants.preview",
        json!({ "inPath": out.to_string_lossy() }),
    );
    assert_eq!(preview["summary"]["new"], 2);
    assert_eq!(preview["summary"]["invalid"], 0);

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}
