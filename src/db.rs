use crate::entities::{
    Bill, Entity, Jurisdiction, Membership, Organization, Person, RunPlan, VoteEvent,
};
use crate::error::{DashboardError, Result};
use crate::issues::{EntityClass, IssueCatalog};
use crate::reports::{AggregateReport, ReportKind, WARNINGS_FIELD};
use crate::store::{CatalogStore, FlaggedIssueIndex, ReportStore};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use tracing::debug;

/// Max ids bound per `IN (...)` query
const ID_CHUNK: usize = 500;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Catalog tables (owned by the importer)
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS jurisdictions (
            id TEXT PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            url TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS people (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            jurisdiction_id TEXT NOT NULL REFERENCES jurisdictions(id),
            image TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS organizations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            jurisdiction_id TEXT NOT NULL REFERENCES jurisdictions(id),
            classification TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS memberships (
            id TEXT PRIMARY KEY,
            organization_id TEXT NOT NULL REFERENCES organizations(id),
            person_id TEXT REFERENCES people(id),
            person_name TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS bills (
            id TEXT PRIMARY KEY,
            jurisdiction_id TEXT NOT NULL REFERENCES jurisdictions(id),
            identifier TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            legislative_session TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS vote_events (
            id TEXT PRIMARY KEY,
            jurisdiction_id TEXT NOT NULL REFERENCES jurisdictions(id),
            identifier TEXT NOT NULL DEFAULT '',
            motion_text TEXT NOT NULL DEFAULT '',
            start_date TEXT NOT NULL DEFAULT '',
            result TEXT NOT NULL DEFAULT '',
            bill_id TEXT REFERENCES bills(id)
        );

        CREATE TABLE IF NOT EXISTS run_plans (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            jurisdiction_id TEXT NOT NULL REFERENCES jurisdictions(id),
            success INTEGER NOT NULL,
            start_time TEXT NOT NULL,
            end_time TEXT NOT NULL
        );",
    )?;

    // ==========================================================================
    // Report tables (owned by the report generator)
    // One *_count column per catalog slug, plus the warnings rollup
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS people_reports (
            jurisdiction_id TEXT UNIQUE NOT NULL REFERENCES jurisdictions(id),
            missing_photo_count INTEGER NOT NULL DEFAULT 0,
            missing_phone_count INTEGER NOT NULL DEFAULT 0,
            missing_email_count INTEGER NOT NULL DEFAULT 0,
            missing_address_count INTEGER NOT NULL DEFAULT 0,
            warnings_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS organization_reports (
            jurisdiction_id TEXT UNIQUE NOT NULL REFERENCES jurisdictions(id),
            no_memberships_count INTEGER NOT NULL DEFAULT 0,
            unmatched_person_count INTEGER NOT NULL DEFAULT 0,
            warnings_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS bill_reports (
            jurisdiction_id TEXT UNIQUE NOT NULL REFERENCES jurisdictions(id),
            no_actions_count INTEGER NOT NULL DEFAULT 0,
            no_sponsors_count INTEGER NOT NULL DEFAULT 0,
            unmatched_person_sponsor_count INTEGER NOT NULL DEFAULT 0,
            unmatched_org_sponsor_count INTEGER NOT NULL DEFAULT 0,
            no_versions_count INTEGER NOT NULL DEFAULT 0,
            warnings_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS vote_event_reports (
            jurisdiction_id TEXT UNIQUE NOT NULL REFERENCES jurisdictions(id),
            missing_voters_count INTEGER NOT NULL DEFAULT 0,
            missing_counts_count INTEGER NOT NULL DEFAULT 0,
            bad_counts_count INTEGER NOT NULL DEFAULT 0,
            unmatched_voter_count INTEGER NOT NULL DEFAULT 0,
            missing_bill_count INTEGER NOT NULL DEFAULT 0,
            warnings_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS data_quality_issues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            jurisdiction_id TEXT NOT NULL REFERENCES jurisdictions(id),
            issue TEXT NOT NULL,
            object_id TEXT NOT NULL,
            UNIQUE (jurisdiction_id, issue, object_id)
        );",
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_issues_lookup ON data_quality_issues(jurisdiction_id, issue)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_run_plans_end ON run_plans(jurisdiction_id, end_time)",
        [],
    )?;

    Ok(())
}

/// Report columns the catalog expects but the database lacks
pub fn missing_report_columns(
    conn: &Connection,
    catalog: &IssueCatalog,
) -> Result<Vec<(ReportKind, String)>> {
    let mut missing = Vec::new();

    for kind in ReportKind::ALL {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", kind.table()))?;
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut expected = kind.expected_fields(catalog);
        expected.push(WARNINGS_FIELD.to_string());

        for field in expected {
            if !columns.contains(&field) {
                missing.push((kind, field));
            }
        }
    }

    Ok(missing)
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_time(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|source| DashboardError::InvalidTimestamp { value, source })
}

fn is_column_name(field: &str) -> bool {
    !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

// ============================================================================
// POPULATION (importer / report generator side)
// ============================================================================

pub fn insert_jurisdiction(conn: &Connection, jurisdiction: &Jurisdiction) -> Result<()> {
    conn.execute(
        "INSERT INTO jurisdictions (id, name, url) VALUES (?1, ?2, ?3)",
        params![jurisdiction.id, jurisdiction.name, jurisdiction.url],
    )?;
    Ok(())
}

pub fn insert_person(conn: &Connection, person: &Person) -> Result<()> {
    conn.execute(
        "INSERT INTO people (id, name, jurisdiction_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![person.id, person.name, person.jurisdiction_id, person.image],
    )?;
    Ok(())
}

pub fn insert_organization(conn: &Connection, org: &Organization) -> Result<()> {
    conn.execute(
        "INSERT INTO organizations (id, name, jurisdiction_id, classification)
         VALUES (?1, ?2, ?3, ?4)",
        params![org.id, org.name, org.jurisdiction_id, org.classification],
    )?;
    Ok(())
}

pub fn insert_membership(conn: &Connection, membership: &Membership) -> Result<()> {
    conn.execute(
        "INSERT INTO memberships (id, organization_id, person_id, person_name, role)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            membership.id,
            membership.organization_id,
            membership.person_id,
            membership.person_name,
            membership.role,
        ],
    )?;
    Ok(())
}

pub fn insert_bill(conn: &Connection, bill: &Bill) -> Result<()> {
    conn.execute(
        "INSERT INTO bills (id, jurisdiction_id, identifier, title, legislative_session)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            bill.id,
            bill.jurisdiction_id,
            bill.identifier,
            bill.title,
            bill.legislative_session,
        ],
    )?;
    Ok(())
}

pub fn insert_vote_event(conn: &Connection, vote: &VoteEvent) -> Result<()> {
    conn.execute(
        "INSERT INTO vote_events (id, jurisdiction_id, identifier, motion_text, start_date, result, bill_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            vote.id,
            vote.jurisdiction_id,
            vote.identifier,
            vote.motion_text,
            vote.start_date,
            vote.result,
            vote.bill_id,
        ],
    )?;
    Ok(())
}

pub fn insert_run_plan(conn: &Connection, run: &RunPlan) -> Result<()> {
    conn.execute(
        "INSERT INTO run_plans (jurisdiction_id, success, start_time, end_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            run.jurisdiction_id,
            run.success,
            format_time(&run.start_time),
            format_time(&run.end_time),
        ],
    )?;
    Ok(())
}

/// Replace the jurisdiction's report of this kind wholesale.
///
/// Counters absent from `report` are reset to zero.
pub fn save_report(conn: &Connection, report: &AggregateReport) -> Result<()> {
    let mut columns = vec!["warnings_count".to_string()];
    let mut values = vec![
        Value::Text(report.jurisdiction.clone()),
        Value::Integer(report.warnings_count),
    ];

    for (field, count) in &report.counts {
        if !is_column_name(field) {
            return Err(DashboardError::InvalidReportField {
                kind: report.kind,
                field: field.clone(),
            });
        }
        columns.push(field.clone());
        values.push(Value::Integer(*count));
    }

    let placeholders: Vec<String> = (2..=values.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "INSERT OR REPLACE INTO {} (jurisdiction_id, {})
         VALUES ((SELECT id FROM jurisdictions WHERE name = ?1), {})",
        report.kind.table(),
        columns.join(", "),
        placeholders.join(", "),
    );

    conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(())
}

/// Supersede every flag for (jurisdiction, issue key) with `object_ids`
pub fn replace_flagged_issues(
    conn: &Connection,
    jurisdiction: &str,
    issue_key: &str,
    object_ids: &[&str],
) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    let jurisdiction_id: String = tx.query_row(
        "SELECT id FROM jurisdictions WHERE name = ?1",
        [jurisdiction],
        |row| row.get(0),
    )?;

    tx.execute(
        "DELETE FROM data_quality_issues WHERE jurisdiction_id = ?1 AND issue = ?2",
        params![jurisdiction_id, issue_key],
    )?;

    let mut inserted = 0;
    for object_id in object_ids {
        inserted += tx.execute(
            "INSERT OR IGNORE INTO data_quality_issues (jurisdiction_id, issue, object_id)
             VALUES (?1, ?2, ?3)",
            params![jurisdiction_id, issue_key, object_id],
        )?;
    }

    tx.commit()?;
    Ok(inserted)
}

// ============================================================================
// SQLITE STORE (read side)
// ============================================================================

/// Catalog, report and flag reads over one SQLite connection
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }

    fn query_by_ids<F>(&self, select: &str, ids: &[String], map: F) -> Result<Vec<Entity>>
    where
        F: Fn(&Row<'_>) -> rusqlite::Result<Entity>,
    {
        let mut entities = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(ID_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("{} WHERE id IN ({})", select, placeholders);
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), |row| map(row))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            entities.extend(rows);
        }

        Ok(entities)
    }
}

impl CatalogStore for SqliteStore<'_> {
    fn list_jurisdictions(&self) -> Result<Vec<Jurisdiction>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, url FROM jurisdictions ORDER BY name")?;

        let jurisdictions = stmt
            .query_map([], |row| {
                Ok(Jurisdiction {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    url: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(jurisdictions)
    }

    fn get_entities_by_ids(
        &self,
        class: EntityClass,
        ids: &[String],
    ) -> Result<HashMap<String, Entity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let entities = match class {
            EntityClass::Person => self.query_by_ids(
                "SELECT id, name, jurisdiction_id, image FROM people",
                ids,
                |row| {
                    Ok(Entity::Person(Person {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        jurisdiction_id: row.get(2)?,
                        image: row.get(3)?,
                    }))
                },
            )?,
            EntityClass::Organization => self.query_by_ids(
                "SELECT id, name, jurisdiction_id, classification FROM organizations",
                ids,
                |row| {
                    Ok(Entity::Organization(Organization {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        jurisdiction_id: row.get(2)?,
                        classification: row.get(3)?,
                    }))
                },
            )?,
            EntityClass::Membership => self.query_by_ids(
                "SELECT id, organization_id, person_id, person_name, role FROM memberships",
                ids,
                |row| {
                    Ok(Entity::Membership(Membership {
                        id: row.get(0)?,
                        organization_id: row.get(1)?,
                        person_id: row.get(2)?,
                        person_name: row.get(3)?,
                        role: row.get(4)?,
                    }))
                },
            )?,
            EntityClass::Bill => self.query_by_ids(
                "SELECT id, jurisdiction_id, identifier, title, legislative_session FROM bills",
                ids,
                |row| {
                    Ok(Entity::Bill(Bill {
                        id: row.get(0)?,
                        jurisdiction_id: row.get(1)?,
                        identifier: row.get(2)?,
                        title: row.get(3)?,
                        legislative_session: row.get(4)?,
                    }))
                },
            )?,
            EntityClass::VoteEvent => self.query_by_ids(
                "SELECT id, jurisdiction_id, identifier, motion_text, start_date, result, bill_id
                 FROM vote_events",
                ids,
                |row| {
                    Ok(Entity::VoteEvent(VoteEvent {
                        id: row.get(0)?,
                        jurisdiction_id: row.get(1)?,
                        identifier: row.get(2)?,
                        motion_text: row.get(3)?,
                        start_date: row.get(4)?,
                        result: row.get(5)?,
                        bill_id: row.get(6)?,
                    }))
                },
            )?,
        };

        debug!(class = %class, requested = ids.len(), found = entities.len(), "resolved entities");

        Ok(entities
            .into_iter()
            .map(|entity| (entity.id().to_string(), entity))
            .collect())
    }

    fn latest_run_plan(&self, jurisdiction: &str) -> Result<Option<RunPlan>> {
        let row = self
            .conn
            .query_row(
                "SELECT r.jurisdiction_id, r.success, r.start_time, r.end_time
                 FROM run_plans r
                 JOIN jurisdictions j ON j.id = r.jurisdiction_id
                 WHERE j.name = ?1
                 ORDER BY r.end_time DESC, r.id DESC
                 LIMIT 1",
                [jurisdiction],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((jurisdiction_id, success, start, end)) => Ok(Some(RunPlan {
                jurisdiction_id,
                success,
                start_time: parse_time(start)?,
                end_time: parse_time(end)?,
            })),
            None => Ok(None),
        }
    }
}

impl ReportStore for SqliteStore<'_> {
    fn get_aggregate_report(
        &self,
        jurisdiction: &str,
        kind: ReportKind,
    ) -> Result<Option<AggregateReport>> {
        let sql = format!(
            "SELECT r.* FROM {} r
             JOIN jurisdictions j ON j.id = r.jurisdiction_id
             WHERE j.name = ?1",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([jurisdiction])?;
        let Some(row) = rows.next()? else {
            debug!(jurisdiction, kind = %kind, "no report row");
            return Ok(None);
        };

        // Read counters generically so a dropped column shows up as a missing field
        let mut report = AggregateReport::new(jurisdiction, kind);
        for (idx, column) in columns.iter().enumerate() {
            if column == WARNINGS_FIELD {
                report.warnings_count = row.get(idx)?;
            } else if column.ends_with("_count") {
                report.counts.insert(column.clone(), row.get(idx)?);
            }
        }

        Ok(Some(report))
    }
}

impl FlaggedIssueIndex for SqliteStore<'_> {
    fn find_flagged(&self, jurisdiction: &str, issue_key: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.object_id
             FROM data_quality_issues d
             JOIN jurisdictions j ON j.id = d.jurisdiction_id
             WHERE j.name = ?1 AND d.issue = ?2
             ORDER BY d.object_id",
        )?;

        let ids = stmt
            .query_map(params![jurisdiction, issue_key], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(ids)
    }
}
