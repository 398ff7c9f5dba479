// ⚠️ Dashboard errors
// Bad input vs. report-generator preconditions vs. store failures

use crate::issues::EntityClass;
use crate::reports::ReportKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Debug, Error)]
pub enum DashboardError {
    // ========================================================================
    // CALLER ERRORS (never retried)
    // ========================================================================
    #[error("unknown issue type `{0}`")]
    UnknownIssueType(String),

    #[error("unknown entity class `{0}`")]
    UnknownEntityClass(String),

    #[error("issue type `{slug}` belongs to {owner}, not {requested}")]
    IssueClassMismatch {
        slug: String,
        owner: EntityClass,
        requested: EntityClass,
    },

    #[error("`{field}` is not a valid {kind} report column")]
    InvalidReportField { kind: ReportKind, field: String },

    // ========================================================================
    // PRECONDITIONS (report generator has not run, or its schema drifted)
    // ========================================================================
    #[error("no {kind} report for jurisdiction `{jurisdiction}`")]
    MissingReport {
        jurisdiction: String,
        kind: ReportKind,
    },

    #[error("{kind} report has no field `{field}`")]
    MissingReportField { kind: ReportKind, field: String },

    // ========================================================================
    // STORE
    // ========================================================================
    #[error("store read failed: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("invalid timestamp `{value}`: {source}")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl DashboardError {
    /// HTTP status for the API surface
    pub fn status_code(&self) -> u16 {
        match self {
            DashboardError::UnknownIssueType(_) | DashboardError::UnknownEntityClass(_) => 404,
            DashboardError::IssueClassMismatch { .. }
            | DashboardError::InvalidReportField { .. } => 400,
            DashboardError::MissingReport { .. }
            | DashboardError::MissingReportField { .. }
            | DashboardError::Store(_)
            | DashboardError::InvalidTimestamp { .. } => 500,
        }
    }

    /// True when the caller sent something the catalog does not know
    pub fn is_caller_error(&self) -> bool {
        self.status_code() < 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors_are_client_statuses() {
        assert_eq!(DashboardError::UnknownIssueType("x".into()).status_code(), 404);
        assert_eq!(DashboardError::UnknownEntityClass("x".into()).status_code(), 404);
        assert!(DashboardError::UnknownEntityClass("x".into()).is_caller_error());

        let err = DashboardError::InvalidReportField {
            kind: ReportKind::Bill,
            field: "x y".to_string(),
        };
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "`x y` is not a valid bill report column");
    }

    #[test]
    fn test_preconditions_are_server_statuses() {
        let err = DashboardError::MissingReport {
            jurisdiction: "Ohio".to_string(),
            kind: ReportKind::Bill,
        };

        assert_eq!(err.status_code(), 500);
        assert!(!err.is_caller_error());
        assert_eq!(err.to_string(), "no bill report for jurisdiction `Ohio`");
    }
}
