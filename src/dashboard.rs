// 📋 Dashboard Aggregator - overview rows and per-jurisdiction issue cards
//
// Counts are passed through from the aggregate reports untouched.
// A missing report is a hard failure: zeros would hide a stale dashboard.

use crate::entities::RunStatus;
use crate::error::{DashboardError, Result};
use crate::issues::{EntityClass, IssueCatalog};
use crate::reports::{AggregateReport, ReportKind, WARNINGS_FIELD};
use crate::store::{CatalogStore, ReportStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

// ============================================================================
// OVERVIEW ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeopleCounts {
    pub warning: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationCounts {
    pub warning: i64,
    pub no_memberships: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCounts {
    pub warning: i64,
    pub no_actions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEventCounts {
    pub warning: i64,
    pub missing_bill: i64,
    pub missing_counts: i64,
}

/// One line of the overview table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JurisdictionRow {
    pub name: String,
    pub people: PeopleCounts,
    pub organizations: OrganizationCounts,
    pub bills: BillCounts,
    pub vote_events: VoteEventCounts,

    /// None when the jurisdiction has never been imported
    pub run: Option<RunStatus>,
}

impl JurisdictionRow {
    /// Sum of error-level counters shown on the row
    pub fn error_total(&self) -> i64 {
        self.organizations.no_memberships
            + self.bills.no_actions
            + self.vote_events.missing_bill
            + self.vote_events.missing_counts
    }

    pub fn warning_total(&self) -> i64 {
        self.people.warning
            + self.organizations.warning
            + self.bills.warning
            + self.vote_events.warning
    }
}

/// Flat form of `JurisdictionRow` for CSV export
#[derive(Debug, Clone, Serialize)]
pub struct OverviewRecord {
    pub jurisdiction: String,
    pub people_warnings: i64,
    pub organization_warnings: i64,
    pub no_memberships: i64,
    pub bill_warnings: i64,
    pub no_actions: i64,
    pub voteevent_warnings: i64,
    pub missing_bill: i64,
    pub missing_counts: i64,
    pub run_success: Option<bool>,
    pub run_date: Option<String>,
}

impl From<&JurisdictionRow> for OverviewRecord {
    fn from(row: &JurisdictionRow) -> Self {
        OverviewRecord {
            jurisdiction: row.name.clone(),
            people_warnings: row.people.warning,
            organization_warnings: row.organizations.warning,
            no_memberships: row.organizations.no_memberships,
            bill_warnings: row.bills.warning,
            no_actions: row.bills.no_actions,
            voteevent_warnings: row.vote_events.warning,
            missing_bill: row.vote_events.missing_bill,
            missing_counts: row.vote_events.missing_counts,
            run_success: row.run.map(|r| r.success),
            run_date: row.run.map(|r| r.date.to_string()),
        }
    }
}

// ============================================================================
// DETAIL CARDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCard {
    pub slug: String,

    /// Error-severity issue
    pub alert: bool,

    pub description: String,
    pub count: i64,
}

/// Cards grouped by owner class (class order), each group in catalog order
pub type JurisdictionDetail = BTreeMap<EntityClass, Vec<IssueCard>>;

// ============================================================================
// AGGREGATOR
// ============================================================================

pub struct DashboardAggregator<'a, C, R> {
    issues: &'a IssueCatalog,
    catalog: &'a C,
    reports: &'a R,
}

impl<'a, C, R> DashboardAggregator<'a, C, R>
where
    C: CatalogStore,
    R: ReportStore,
{
    pub fn new(issues: &'a IssueCatalog, catalog: &'a C, reports: &'a R) -> Self {
        DashboardAggregator {
            issues,
            catalog,
            reports,
        }
    }

    fn report(&self, jurisdiction: &str, kind: ReportKind) -> Result<AggregateReport> {
        self.reports
            .get_aggregate_report(jurisdiction, kind)?
            .ok_or_else(|| DashboardError::MissingReport {
                jurisdiction: jurisdiction.to_string(),
                kind,
            })
    }

    /// One row per jurisdiction, in name order
    pub fn overview(&self) -> Result<Vec<JurisdictionRow>> {
        let jurisdictions = self.catalog.list_jurisdictions()?;
        let mut rows = Vec::with_capacity(jurisdictions.len());

        for jurisdiction in jurisdictions {
            rows.push(self.overview_row(&jurisdiction.name)?);
        }

        info!(rows = rows.len(), "built overview");
        Ok(rows)
    }

    pub fn overview_row(&self, jurisdiction: &str) -> Result<JurisdictionRow> {
        let people = self.report(jurisdiction, ReportKind::People)?;
        let orgs = self.report(jurisdiction, ReportKind::Organization)?;
        let bills = self.report(jurisdiction, ReportKind::Bill)?;
        let votes = self.report(jurisdiction, ReportKind::VoteEvent)?;

        let run = self
            .catalog
            .latest_run_plan(jurisdiction)?
            .map(|plan| plan.status());

        Ok(JurisdictionRow {
            name: jurisdiction.to_string(),
            people: PeopleCounts {
                warning: people.field(WARNINGS_FIELD)?,
            },
            organizations: OrganizationCounts {
                warning: orgs.field(WARNINGS_FIELD)?,
                no_memberships: orgs.count_for("no-memberships")?,
            },
            bills: BillCounts {
                warning: bills.field(WARNINGS_FIELD)?,
                no_actions: bills.count_for("no-actions")?,
            },
            vote_events: VoteEventCounts {
                warning: votes.field(WARNINGS_FIELD)?,
                missing_bill: votes.count_for("missing-bill")?,
                missing_counts: votes.count_for("missing-counts")?,
            },
            run,
        })
    }

    /// Card per catalog issue type, grouped by owner class
    pub fn jurisdiction_detail(&self, jurisdiction: &str) -> Result<JurisdictionDetail> {
        let mut reports: BTreeMap<ReportKind, AggregateReport> = BTreeMap::new();
        let mut detail = JurisdictionDetail::new();

        for issue in self.issues.all_issue_types() {
            let kind = issue.owner.report_kind();
            if !reports.contains_key(&kind) {
                reports.insert(kind, self.report(jurisdiction, kind)?);
            }
            let report = &reports[&kind];

            detail.entry(issue.owner).or_default().push(IssueCard {
                slug: issue.slug.to_string(),
                alert: issue.is_alert(),
                description: issue.description.to_string(),
                count: report.field(&issue.report_field())?,
            });
        }

        debug!(jurisdiction, classes = detail.len(), "built detail cards");
        Ok(detail)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{save_report, SqliteStore};
    use crate::fixtures::{seeded_connection, ALASKA, OHIO};
    use crate::issues::Severity;
    use chrono::NaiveDate;

    fn find_card<'d>(
        detail: &'d JurisdictionDetail,
        class: EntityClass,
        slug: &str,
    ) -> Option<&'d IssueCard> {
        detail
            .get(&class)
            .and_then(|cards| cards.iter().find(|card| card.slug == slug))
    }

    #[test]
    fn test_overview_rows_pass_counts_through() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let rows = aggregator.overview().unwrap();
        assert_eq!(rows.len(), 2);

        let ohio = &rows[1];
        assert_eq!(ohio.name, OHIO);
        assert_eq!(ohio.people, PeopleCounts { warning: 5 });
        assert_eq!(
            ohio.organizations,
            OrganizationCounts {
                warning: 1,
                no_memberships: 3
            }
        );
        assert_eq!(
            ohio.bills,
            BillCounts {
                warning: 2,
                no_actions: 6
            }
        );
        assert_eq!(
            ohio.vote_events,
            VoteEventCounts {
                warning: 9,
                missing_bill: 7,
                missing_counts: 8
            }
        );
        assert_eq!(ohio.error_total(), 3 + 6 + 7 + 8);
        assert_eq!(ohio.warning_total(), 5 + 1 + 2 + 9);
    }

    #[test]
    fn test_overview_is_ordered_by_name() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let names: Vec<String> = aggregator.overview().unwrap().into_iter().map(|r| r.name).collect();
        let mut sorted = names.clone();
        sorted.sort();

        assert_eq!(names, sorted);
        assert_eq!(names, vec![ALASKA.to_string(), OHIO.to_string()]);
    }

    #[test]
    fn test_run_status_latest_or_absent() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let rows = aggregator.overview().unwrap();

        // Alaska was never imported
        assert_eq!(rows[0].run, None);

        let ohio_run = rows[1].run.unwrap();
        assert!(!ohio_run.success);
        assert_eq!(ohio_run.date, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    }

    #[test]
    fn test_overview_fails_on_missing_report() {
        let conn = seeded_connection();
        conn.execute(
            "DELETE FROM vote_event_reports WHERE jurisdiction_id =
                (SELECT id FROM jurisdictions WHERE name = ?1)",
            [ALASKA],
        )
        .unwrap();

        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let err = aggregator.overview().unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingReport { ref jurisdiction, kind: ReportKind::VoteEvent }
                if jurisdiction == ALASKA
        ));

        // Ohio's row alone is still buildable
        assert!(aggregator.overview_row(OHIO).is_ok());
    }

    #[test]
    fn test_overview_is_idempotent() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let first = serde_json::to_string(&aggregator.overview().unwrap()).unwrap();
        let second = serde_json::to_string(&aggregator.overview().unwrap()).unwrap();
        assert_eq!(first, second);

        let detail1 = serde_json::to_string(&aggregator.jurisdiction_detail(OHIO).unwrap()).unwrap();
        let detail2 = serde_json::to_string(&aggregator.jurisdiction_detail(OHIO).unwrap()).unwrap();
        assert_eq!(detail1, detail2);
    }

    #[test]
    fn test_detail_has_one_card_per_issue_type() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let catalog = IssueCatalog::global();
        let aggregator = DashboardAggregator::new(catalog, &store, &store);

        let detail = aggregator.jurisdiction_detail(OHIO).unwrap();

        let total: usize = detail.values().map(|cards| cards.len()).sum();
        assert_eq!(total, catalog.len());

        for issue in catalog.all_issue_types() {
            let card = find_card(&detail, issue.owner, issue.slug).unwrap();
            assert_eq!(card.alert, issue.severity == Severity::Error);
            assert_eq!(card.description, issue.description);
        }
    }

    #[test]
    fn test_detail_class_and_card_order() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let detail = aggregator.jurisdiction_detail(OHIO).unwrap();

        let classes: Vec<EntityClass> = detail.keys().copied().collect();
        assert_eq!(classes, EntityClass::ALL.to_vec());

        let bill_slugs: Vec<&str> = detail[&EntityClass::Bill].iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(
            bill_slugs,
            vec![
                "no-actions",
                "no-sponsors",
                "unmatched-person-sponsor",
                "unmatched-org-sponsor",
                "no-versions"
            ]
        );

        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("voteevent").is_some());
    }

    #[test]
    fn test_detail_counts_and_membership_cross_mapping() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let detail = aggregator.jurisdiction_detail(OHIO).unwrap();

        assert_eq!(find_card(&detail, EntityClass::Bill, "no-actions").unwrap().count, 6);
        assert_eq!(find_card(&detail, EntityClass::Person, "missing-phone").unwrap().count, 4);
        assert_eq!(find_card(&detail, EntityClass::Person, "missing-email").unwrap().count, 0);

        // Membership counters come from the organization report
        let unmatched = find_card(&detail, EntityClass::Membership, "unmatched-person").unwrap();
        assert_eq!(unmatched.count, 1);
        assert!(!unmatched.alert);
    }

    #[test]
    fn test_detail_fails_on_schema_drift() {
        let conn = seeded_connection();
        conn.execute("ALTER TABLE people_reports DROP COLUMN missing_email_count", [])
            .unwrap();
        save_report(
            &conn,
            &AggregateReport::new(OHIO, ReportKind::People).with_warnings(1),
        )
        .unwrap();

        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        assert!(matches!(
            aggregator.jurisdiction_detail(OHIO),
            Err(DashboardError::MissingReportField { kind: ReportKind::People, ref field })
                if field == "missing_email_count"
        ));
    }

    #[test]
    fn test_detail_fails_on_unknown_jurisdiction() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        assert!(matches!(
            aggregator.jurisdiction_detail("Atlantis"),
            Err(DashboardError::MissingReport { kind: ReportKind::People, .. })
        ));
    }

    #[test]
    fn test_overview_record_flattens_run() {
        let conn = seeded_connection();
        let store = SqliteStore::new(&conn);
        let aggregator = DashboardAggregator::new(IssueCatalog::global(), &store, &store);

        let rows = aggregator.overview().unwrap();
        let alaska = OverviewRecord::from(&rows[0]);
        let ohio = OverviewRecord::from(&rows[1]);

        assert_eq!(alaska.run_success, None);
        assert_eq!(ohio.run_success, Some(false));
        assert_eq!(ohio.run_date.as_deref(), Some("2024-06-02"));
        assert_eq!(ohio.missing_counts, 8);
    }
}
