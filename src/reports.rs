// 📊 Aggregate reports - per-jurisdiction counter snapshots
//
// Written wholesale by the external report generator; read-only here.

use crate::error::{DashboardError, Result};
use crate::issues::{report_field_for, IssueCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const WARNINGS_FIELD: &str = "warnings_count";

// ============================================================================
// REPORT KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    People,
    Organization,
    Bill,
    VoteEvent,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::People,
        ReportKind::Organization,
        ReportKind::Bill,
        ReportKind::VoteEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::People => "people",
            ReportKind::Organization => "organization",
            ReportKind::Bill => "bill",
            ReportKind::VoteEvent => "voteevent",
        }
    }

    /// Backing table in the report store
    pub fn table(&self) -> &'static str {
        match self {
            ReportKind::People => "people_reports",
            ReportKind::Organization => "organization_reports",
            ReportKind::Bill => "bill_reports",
            ReportKind::VoteEvent => "vote_event_reports",
        }
    }

    /// Counter columns the catalog expects on this report, in catalog order
    pub fn expected_fields(&self, catalog: &IssueCatalog) -> Vec<String> {
        catalog
            .all_issue_types()
            .iter()
            .filter(|issue| issue.owner.report_kind() == *self)
            .map(|issue| issue.report_field())
            .collect()
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AGGREGATE REPORT
// ============================================================================

/// One report per (jurisdiction, kind)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub jurisdiction: String,
    pub kind: ReportKind,
    pub warnings_count: i64,

    /// Counter columns keyed by field name (e.g. "no_actions_count")
    pub counts: BTreeMap<String, i64>,
}

impl AggregateReport {
    pub fn new(jurisdiction: impl Into<String>, kind: ReportKind) -> Self {
        AggregateReport {
            jurisdiction: jurisdiction.into(),
            kind,
            warnings_count: 0,
            counts: BTreeMap::new(),
        }
    }

    /// Builder: set the counter for an issue slug
    pub fn with_count(mut self, slug: &str, count: i64) -> Self {
        self.counts.insert(report_field_for(slug), count);
        self
    }

    /// Builder: set the warnings rollup
    pub fn with_warnings(mut self, warnings_count: i64) -> Self {
        self.warnings_count = warnings_count;
        self
    }

    /// Read a counter column by name
    pub fn field(&self, field: &str) -> Result<i64> {
        if field == WARNINGS_FIELD {
            return Ok(self.warnings_count);
        }

        self.counts
            .get(field)
            .copied()
            .ok_or_else(|| DashboardError::MissingReportField {
                kind: self.kind,
                field: field.to_string(),
            })
    }

    /// Counter for an issue slug
    pub fn count_for(&self, slug: &str) -> Result<i64> {
        self.field(&report_field_for(slug))
    }
}
