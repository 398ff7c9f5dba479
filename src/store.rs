// 🔌 External store interfaces
//
// The dashboard only reads. Catalog records, report snapshots and flag rows
// are produced elsewhere and may be from slightly different points in time.

use crate::entities::{Entity, Jurisdiction, RunPlan};
use crate::error::Result;
use crate::issues::EntityClass;
use crate::reports::{AggregateReport, ReportKind};
use std::collections::HashMap;

/// Jurisdictions, entities and import runs
pub trait CatalogStore {
    /// All jurisdictions ordered by name
    fn list_jurisdictions(&self) -> Result<Vec<Jurisdiction>>;

    /// Missing ids are omitted from the map, not reported
    fn get_entities_by_ids(
        &self,
        class: EntityClass,
        ids: &[String],
    ) -> Result<HashMap<String, Entity>>;

    /// Run with the latest end time, if the jurisdiction was ever imported
    fn latest_run_plan(&self, jurisdiction: &str) -> Result<Option<RunPlan>>;
}

/// Latest aggregate snapshot per (jurisdiction, kind)
pub trait ReportStore {
    fn get_aggregate_report(
        &self,
        jurisdiction: &str,
        kind: ReportKind,
    ) -> Result<Option<AggregateReport>>;
}

/// Per-entity flags backing the drill-down
pub trait FlaggedIssueIndex {
    /// Entity ids flagged under `<owner>-<slug>` for the jurisdiction
    fn find_flagged(&self, jurisdiction: &str, issue_key: &str) -> Result<Vec<String>>;
}
