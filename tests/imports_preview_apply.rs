mod test_support;

use serde_json::{json, Value};
use test_support::{temp_dir, write_file, Sidecar};

fn statuses(preview: &Value) -> Vec<String> {
    preview["previewRows"]
        .as_array()
        .expect("previewRows")
        .iter()
        .map(|r| r["status"].as_str().unwrap_or("").to_string())
        .collect()
}

fn create_club(sidecar: &mut Sidecar, name: &str, institution: &str) -> String {
    let res = sidecar.request_ok(
        "clubs.create",
        json!({ "name": name, "institution": institution }),
    );
    res["club"]["id"].as_str().expect("club id").to_string()
}

#[test]
fn club_import_resolves_in_file_duplicates_and_is_idempotent() {
    let workspace = temp_dir("youthnet-club-import");
    let csv = write_file(
        &workspace,
        "members.csv",
        "Name,Contact\nAmina,0788\namina ,0788\nEric,\n",
    );
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let club_id = create_club(&mut sidecar, "Debate", "Hilltop High");
    let params = json!({ "clubId": club_id, "inPath": csv.to_string_lossy() });

    let preview = sidecar.request_ok("imports.clubMembers.preview", params.clone());
    assert_eq!(statuses(&preview), vec!["new", "new", "invalid"]);
    assert_eq!(preview["summary"]["total"], 3);
    assert_eq!(preview["summary"]["new"], 2);
    assert_eq!(preview["summary"]["invalid"], 1);
    let dup_message = preview["previewRows"][1]["message"].as_str().unwrap_or("");
    assert!(dup_message.contains("line 2"), "{}", dup_message);
    assert_eq!(preview["previewRows"][2]["line"], 4);

    let applied = sidecar.request_ok("imports.clubMembers.apply", params.clone());
    assert_eq!(applied["created"], 1);
    assert_eq!(applied["converted"], 0);
    assert_eq!(applied["skipped"], 2);
    assert_eq!(applied["failed"], 0);

    let members = sidecar.request_ok("clubs.members.list", json!({ "clubId": club_id }));
    let members = members["members"].as_array().expect("members");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["institution"], "Hilltop High");

    // The same file again has nothing left to create or attach.
    let again = sidecar.request_ok("imports.clubMembers.preview", params.clone());
    assert_eq!(again["summary"]["new"], 0);
    assert_eq!(again["summary"]["existing"], 0);
    assert_eq!(again["summary"]["alreadyLinked"], 2);
    let reapplied = sidecar.request_ok("imports.clubMembers.apply", params);
    assert_eq!(reapplied["created"], 0);
    assert_eq!(reapplied["converted"], 0);

    let all = sidecar.request_ok("participants.list", json!({}));
    assert_eq!(all["participants"].as_array().map(Vec::len), Some(1));

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn club_import_only_matches_participants_of_the_club_institution() {
    let workspace = temp_dir("youthnet-club-scope");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let club_id = create_club(&mut sidecar, "Robotics", "Hilltop High");
    sidecar.request_ok(
        "participants.create",
        json!({ "name": "Eric", "contact": "0799", "institution": "Riverside School" }),
    );
    sidecar.request_ok(
        "participants.create",
        json!({ "name": "Grace", "contact": "0711", "institution": " hilltop high " }),
    );
    let csv = write_file(
        &workspace,
        "robotics.csv",
        "Name,Contact\nERIC,0799\ngrace,0711\n",
    );
    let params = json!({ "clubId": club_id, "inPath": csv.to_string_lossy() });

    let preview = sidecar.request_ok("imports.clubMembers.preview", params.clone());
    assert_eq!(statuses(&preview), vec!["new", "existing"]);
    assert!(preview["previewRows"][1]["participantId"].is_string());

    let applied = sidecar.request_ok("imports.clubMembers.apply", params);
    assert_eq!(applied["created"], 1);
    assert_eq!(applied["converted"], 1);

    let all = sidecar.request_ok("participants.list", json!({}));
    let erics = all["participants"]
        .as_array()
        .expect("participants")
        .iter()
        .filter(|p| p["name"].as_str().map(|n| n.eq_ignore_ascii_case("eric")) == Some(true))
        .count();
    assert_eq!(erics, 2);

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn event_import_registers_existing_and_new_participants() {
    let workspace = temp_dir("youthnet-event-import");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let event = sidecar.request_ok(
        "events.create",
        json!({ "name": "Science Fair", "date": "2025-03-01", "category": "Competition" }),
    );
    let event_id = event["event"]["id"].as_str().expect("event id").to_string();
    sidecar.request_ok(
        "participants.create",
        json!({ "name": "Jane Doe", "contact": "X" }),
    );
    let csv = write_file(
        &workspace,
        "fair.csv",
        "Name,Contact,Gender\nJane Doe ,X,F\nOmar,0755,M\n",
    );
    let params = json!({ "eventId": event_id, "inPath": csv.to_string_lossy() });

    let preview = sidecar.request_ok("imports.eventAttendees.preview", params.clone());
    assert_eq!(statuses(&preview), vec!["existing", "new"]);

    let applied = sidecar.request_ok("imports.eventAttendees.apply", params);
    assert_eq!(applied["converted"], 1);
    assert_eq!(applied["created"], 1);

    let events = sidecar.request_ok("events.list", json!({}));
    assert_eq!(events["events"][0]["attendeeCount"], 2);
    let all = sidecar.request_ok("participants.list", json!({}));
    for p in all["participants"].as_array().expect("participants") {
        assert_eq!(p["engagementScore"], 1);
    }

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn volunteer_import_counts_failures_without_aborting() {
    let workspace = temp_dir("youthnet-volunteer-import");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let csv = write_file(
        &workspace,
        "volunteers.csv",
        "Name,Contact,Role,Start Date\nAmina,1,Mentor,2024-09-01\nBosco,2,Logistics,not-a-date\nCarla,3,Coach,\nDavid,4,event staff,\n",
    );
    let params = json!({ "inPath": csv.to_string_lossy() });

    let preview = sidecar.request_ok("imports.volunteers.preview", params.clone());
    assert_eq!(statuses(&preview), vec!["new", "new", "invalid", "new"]);

    let applied = sidecar.request_ok("imports.volunteers.apply", params);
    assert_eq!(applied["created"], 2);
    assert_eq!(applied["failed"], 1);
    assert_eq!(applied["skipped"], 1);

    let volunteers = sidecar.request_ok("volunteers.list", json!({}));
    let volunteers = volunteers["volunteers"].as_array().expect("volunteers");
    assert_eq!(volunteers.len(), 2);
    assert!(volunteers.iter().any(|v| v["role"] == "Event Staff"));
    // The failed row never reached the participant write.
    let all = sidecar.request_ok("participants.list", json!({}));
    assert_eq!(all["participants"].as_array().map(Vec::len), Some(2));

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn participants_import_honours_deselected_lines_and_defaults() {
    let workspace = temp_dir("youthnet-participants-import");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    sidecar.request_ok(
        "setup.update",
        json!({ "section": "import", "patch": { "defaultRegion": "North" } }),
    );
    let csv = write_file(
        &workspace,
        "people.csv",
        "NAMES,CONTACT,REGION,MEMBER\nAmina,1,,yes\nBosco,2,West,no\nCarla,3,,\n",
    );
    let preview = sidecar.request_ok(
        "imports.participants.preview",
        json!({ "inPath": csv.to_string_lossy() }),
    );
    let columns: Vec<&str> = preview["previewRows"][0]["data"]
        .as_object()
        .expect("row data")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(columns, vec!["NAMES", "CONTACT", "REGION", "MEMBER"]);

    let applied = sidecar.request_ok(
        "imports.participants.apply",
        json!({ "inPath": csv.to_string_lossy(), "skipLines": [3] }),
    );
    assert_eq!(applied["created"], 2);
    assert_eq!(applied["skipped"], 1);

    let all = sidecar.request_ok("participants.list", json!({}));
    let people = all["participants"].as_array().expect("participants");
    assert_eq!(people.len(), 2);
    assert_eq!(people[0]["name"], "Amina");
    assert_eq!(people[0]["region"], "North");
    assert_eq!(people[0]["isMember"], true);
    assert_eq!(people[1]["name"], "Carla");

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn unreadable_files_fail_once_before_any_write() {
    let workspace = temp_dir("youthnet-import-errors");
    let mut sidecar = Sidecar::with_workspace(&workspace);
    let txt = write_file(&workspace, "people.txt", "Name,Contact\nAmina,1\n");
    let code = sidecar.request_err(
        "imports.participants.apply",
        json!({ "inPath": txt.to_string_lossy() }),
    );
    assert_eq!(code, "invalid_file_type");

    let wrong = write_file(&workspace, "wrong.csv", "First,Last\nAmina,U\n");
    let code = sidecar.request_err(
        "imports.participants.preview",
        json!({ "inPath": wrong.to_string_lossy() }),
    );
    assert_eq!(code, "parse_failed");

    let good = write_file(&workspace, "good.csv", "Name,Contact\nAmina,1\n");
    let code = sidecar.request_err(
        "imports.clubMembers.preview",
        json!({ "clubId": "missing", "inPath": good.to_string_lossy() }),
    );
    assert_eq!(code, "not_found");

    let all = sidecar.request_ok("participants.list", json!({}));
    assert_eq!(all["participants"].as_array().map(Vec::len), Some(0));

    drop(sidecar);
    let _ = std::fs::remove_dir_all(workspace);
}
