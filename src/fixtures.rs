// Shared test data: two jurisdictions seeded into an in-memory database.
//
// Ohio has every report, two import runs and a handful of flags, some of
// which point at records that no longer exist. Alaska has clean reports and
// has never been imported.

use crate::db::{
    insert_bill, insert_jurisdiction, insert_membership, insert_organization, insert_person,
    insert_run_plan, insert_vote_event, replace_flagged_issues, save_report, setup_database,
};
use crate::entities::{
    Bill, Jurisdiction, Membership, Organization, Person, RunPlan, VoteEvent,
};
use crate::reports::{AggregateReport, ReportKind};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;

pub const OHIO: &str = "Ohio";
pub const OHIO_ID: &str = "ocd-jurisdiction/country:us/state:oh/government";
pub const ALASKA: &str = "Alaska";
pub const ALASKA_ID: &str = "ocd-jurisdiction/country:us/state:ak/government";

pub fn empty_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    setup_database(&conn).unwrap();
    conn
}

pub fn seeded_connection() -> Connection {
    let conn = empty_connection();
    seed_catalog(&conn);
    seed_reports(&conn, OHIO);
    seed_clean_reports(&conn, ALASKA);
    seed_flags(&conn);
    conn
}

fn seed_catalog(conn: &Connection) {
    // Inserted out of name order on purpose
    insert_jurisdiction(conn, &Jurisdiction::new(OHIO_ID, OHIO).with_url("https://ohio.gov")).unwrap();
    insert_jurisdiction(conn, &Jurisdiction::new(ALASKA_ID, ALASKA)).unwrap();

    for (id, name, image) in [
        ("ocd-person/oh-roe", "Jane Roe", ""),
        ("ocd-person/oh-doe", "John Doe", "https://ohio.gov/doe.jpg"),
    ] {
        insert_person(
            conn,
            &Person {
                id: id.to_string(),
                name: name.to_string(),
                jurisdiction_id: OHIO_ID.to_string(),
                image: image.to_string(),
            },
        )
        .unwrap();
    }

    for (id, name, classification) in [
        ("ocd-organization/oh-house", "Ohio House", "lower"),
        ("ocd-organization/oh-finance", "Finance Committee", "committee"),
        ("ocd-organization/oh-ethics", "Ethics Committee", "committee"),
    ] {
        insert_organization(
            conn,
            &Organization {
                id: id.to_string(),
                name: name.to_string(),
                jurisdiction_id: OHIO_ID.to_string(),
                classification: classification.to_string(),
            },
        )
        .unwrap();
    }

    insert_membership(
        conn,
        &Membership {
            id: "ocd-membership/oh-1".to_string(),
            organization_id: "ocd-organization/oh-house".to_string(),
            person_id: None,
            person_name: "Rep. Smith".to_string(),
            role: "member".to_string(),
        },
    )
    .unwrap();

    insert_bill(
        conn,
        &Bill {
            id: "ocd-bill/oh-hb1".to_string(),
            jurisdiction_id: OHIO_ID.to_string(),
            identifier: "HB 1".to_string(),
            title: "Budget Act".to_string(),
            legislative_session: "135".to_string(),
        },
    )
    .unwrap();

    insert_vote_event(
        conn,
        &VoteEvent {
            id: "ocd-vote/oh-1".to_string(),
            jurisdiction_id: OHIO_ID.to_string(),
            identifier: String::new(),
            motion_text: "third reading".to_string(),
            start_date: "2024-03-01".to_string(),
            result: "pass".to_string(),
            bill_id: None,
        },
    )
    .unwrap();

    for (success, start_hour, end_day) in [(true, 1, 1), (false, 2, 2)] {
        insert_run_plan(
            conn,
            &RunPlan {
                jurisdiction_id: OHIO_ID.to_string(),
                success,
                start_time: Utc.with_ymd_and_hms(2024, 6, end_day, start_hour, 0, 0).unwrap(),
                end_time: Utc.with_ymd_and_hms(2024, 6, end_day, 4, 0, 0).unwrap(),
            },
        )
        .unwrap();
    }
}

/// Ohio's counts; every value distinct so pass-through is checkable
pub fn seed_reports(conn: &Connection, jurisdiction: &str) {
    save_report(
        conn,
        &AggregateReport::new(jurisdiction, ReportKind::People)
            .with_count("missing-photo", 1)
            .with_count("missing-phone", 4)
            .with_warnings(5),
    )
    .unwrap();
    save_report(
        conn,
        &AggregateReport::new(jurisdiction, ReportKind::Organization)
            .with_count("no-memberships", 3)
            .with_count("unmatched-person", 1)
            .with_warnings(1),
    )
    .unwrap();
    save_report(
        conn,
        &AggregateReport::new(jurisdiction, ReportKind::Bill)
            .with_count("no-actions", 6)
            .with_count("no-sponsors", 2)
            .with_warnings(2),
    )
    .unwrap();
    save_report(
        conn,
        &AggregateReport::new(jurisdiction, ReportKind::VoteEvent)
            .with_count("missing-bill", 7)
            .with_count("missing-counts", 8)
            .with_count("bad-counts", 9)
            .with_warnings(9),
    )
    .unwrap();
}

pub fn seed_clean_reports(conn: &Connection, jurisdiction: &str) {
    for kind in ReportKind::ALL {
        save_report(conn, &AggregateReport::new(jurisdiction, kind)).unwrap();
    }
}

fn seed_flags(conn: &Connection) {
    replace_flagged_issues(conn, OHIO, "person-missing-photo", &["ocd-person/oh-roe"]).unwrap();
    // Three flags, one for an organization deleted since the scan
    replace_flagged_issues(
        conn,
        OHIO,
        "organization-no-memberships",
        &[
            "ocd-organization/oh-ethics",
            "ocd-organization/oh-finance",
            "ocd-organization/oh-merged-away",
        ],
    )
    .unwrap();
    replace_flagged_issues(conn, OHIO, "membership-unmatched-person", &["ocd-membership/oh-1"])
        .unwrap();
    replace_flagged_issues(conn, OHIO, "bill-no-actions", &["ocd-bill/oh-hb1"]).unwrap();
    replace_flagged_issues(conn, OHIO, "voteevent-missing-bill", &["ocd-vote/oh-1"]).unwrap();
}
