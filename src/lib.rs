// Jurisdiction Data Quality - Core Library
// Issue taxonomy, per-jurisdiction aggregation and drill-down resolution.
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod issues;
pub mod error;
pub mod reports;
pub mod entities;
pub mod store;
pub mod db;
pub mod dashboard;
pub mod resolver;
pub mod config;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use issues::{
    EntityClass, IssueCatalog, IssueType, Severity, ISSUE_TYPES,
};
pub use error::{DashboardError, Result};
pub use reports::{AggregateReport, ReportKind};
pub use entities::{
    Bill, Entity, Jurisdiction, Membership, Organization, Person, RunPlan, RunStatus, VoteEvent,
};
pub use store::{CatalogStore, FlaggedIssueIndex, ReportStore};
pub use db::{
    SqliteStore,
    setup_database, missing_report_columns, save_report, replace_flagged_issues,
    insert_jurisdiction, insert_person, insert_organization, insert_membership,
    insert_bill, insert_vote_event, insert_run_plan,
};
pub use dashboard::{
    DashboardAggregator, IssueCard, JurisdictionDetail, JurisdictionRow, OverviewRecord,
};
pub use resolver::{EditLinkKind, IssueGroup, IssueResolution, IssueResolver};
pub use config::DashboardConfig;
