use super::row::ImportKind;

const PARTICIPANTS: &str = "\
NAMES,CONTACT,GENDER,AGE,REGION,INSTITUTION,MEMBER,CONTESTANT,NOTES
Jane Doe,0788000111,Female,16,North,Hilltop High,Yes,No,
John Smith,0788000222,Male,17,Central,,No,Yes,Debate finalist
";

const CLUB_MEMBERS: &str = "\
Name,Contact,Gender,Age,Region,Member,Notes
Jane Doe,0788000111,Female,16,North,Yes,
John Smith,0788000222,Male,17,Central,No,
";

const EVENT_ATTENDEES: &str = "\
Name,Contact,Gender,Age,Region,Institution
Jane Doe,0788000111,Female,16,North,Hilltop High
John Smith,0788000222,Male,17,Central,
";

const VOLUNTEERS: &str = "\
Name,Contact,Role,Status,Start Date
Jane Doe,0788000111,Mentor,active,2024-09-01
John Smith,0788000222,Event Staff,inactive,
";

/// Sample file users can fill in for the given import.
pub fn template(kind: ImportKind) -> &'static str {
    match kind {
        ImportKind::Participants => PARTICIPANTS,
        ImportKind::ClubMembers => CLUB_MEMBERS,
        ImportKind::EventAttendees => EVENT_ATTENDEES,
        ImportKind::Volunteers => VOLUNTEERS,
    }
}

pub fn file_name(kind: ImportKind) -> String {
    format!("{}_template.csv", kind.as_str())
}
