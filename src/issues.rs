// 🏷️ Issue Catalog - the closed taxonomy of data-quality issues
//
// Every slug has exactly one owner class, one severity and one description.
// The table is fixed at compile time; the lookup index is built once per process.

use crate::error::{DashboardError, Result};
use crate::reports::ReportKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

// ============================================================================
// ENTITY CLASS
// ============================================================================

/// Kind of catalog record an issue type applies to.
///
/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    Person,
    Organization,
    Membership,
    Bill,
    VoteEvent,
}

impl EntityClass {
    pub const ALL: [EntityClass; 5] = [
        EntityClass::Person,
        EntityClass::Organization,
        EntityClass::Membership,
        EntityClass::Bill,
        EntityClass::VoteEvent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Person => "person",
            EntityClass::Organization => "organization",
            EntityClass::Membership => "membership",
            EntityClass::Bill => "bill",
            EntityClass::VoteEvent => "voteevent",
        }
    }

    /// Aggregate report that carries this class's counters.
    ///
    /// Membership issues are counted on the organization report.
    pub fn report_kind(&self) -> ReportKind {
        match self {
            EntityClass::Person => ReportKind::People,
            EntityClass::Organization => ReportKind::Organization,
            EntityClass::Membership => ReportKind::Organization,
            EntityClass::Bill => ReportKind::Bill,
            EntityClass::VoteEvent => ReportKind::VoteEvent,
        }
    }
}

impl fmt::Display for EntityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityClass {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "person" => Ok(EntityClass::Person),
            "organization" => Ok(EntityClass::Organization),
            "membership" => Ok(EntityClass::Membership),
            "bill" => Ok(EntityClass::Bill),
            "voteevent" => Ok(EntityClass::VoteEvent),
            other => Err(DashboardError::UnknownEntityClass(other.to_string())),
        }
    }
}

// ============================================================================
// SEVERITY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning, // Record is incomplete
    Error,   // Record is unusable as imported
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

// ============================================================================
// ISSUE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IssueType {
    /// Kebab-case identifier (e.g. "no-memberships")
    pub slug: &'static str,
    pub owner: EntityClass,
    pub severity: Severity,
    pub description: &'static str,
}

impl IssueType {
    const fn new(
        slug: &'static str,
        owner: EntityClass,
        severity: Severity,
        description: &'static str,
    ) -> Self {
        IssueType {
            slug,
            owner,
            severity,
            description,
        }
    }

    /// Key stored on flagged-issue rows: `<owner>-<slug>`
    pub fn composite_key(&self) -> String {
        format!("{}-{}", self.owner.as_str(), self.slug)
    }

    /// Counter column on the owner's aggregate report
    pub fn report_field(&self) -> String {
        report_field_for(self.slug)
    }

    pub fn is_alert(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// `missing-photo` → `missing_photo_count`
pub fn report_field_for(slug: &str) -> String {
    format!("{}_count", slug.replace('-', "_"))
}

use EntityClass::{Bill, Membership, Organization, Person, VoteEvent};
use Severity::{Error, Warning};

/// The taxonomy, in display order.
pub static ISSUE_TYPES: &[IssueType] = &[
    // Person
    IssueType::new("missing-photo", Person, Warning, "Missing Photo"),
    IssueType::new("missing-phone", Person, Warning, "Missing Phone"),
    IssueType::new("missing-email", Person, Warning, "Missing Email"),
    IssueType::new("missing-address", Person, Warning, "Missing Postal Address"),
    // Organization
    IssueType::new("no-memberships", Organization, Error, "No Memberships"),
    // Membership
    IssueType::new("unmatched-person", Membership, Warning, "Unmatched Person"),
    // Bill
    IssueType::new("no-actions", Bill, Error, "Missing Actions"),
    IssueType::new("no-sponsors", Bill, Warning, "Missing Sponsors"),
    IssueType::new(
        "unmatched-person-sponsor",
        Bill,
        Warning,
        "Sponsors are not matched to Person Object",
    ),
    IssueType::new(
        "unmatched-org-sponsor",
        Bill,
        Warning,
        "Sponsors are not matched to Organization Object",
    ),
    IssueType::new("no-versions", Bill, Warning, "Missing Versions"),
    // VoteEvent
    IssueType::new("missing-voters", VoteEvent, Warning, "Missing Voters"),
    IssueType::new("missing-counts", VoteEvent, Error, "Missing Counts"),
    IssueType::new("bad-counts", VoteEvent, Warning, "Bad Counts"),
    IssueType::new("unmatched-voter", VoteEvent, Warning, "Unmatched Voter"),
    IssueType::new("missing-bill", VoteEvent, Error, "Missing Bill"),
];

// ============================================================================
// ISSUE CATALOG
// ============================================================================

/// Read-only view over the taxonomy with O(1) slug lookups
pub struct IssueCatalog {
    types: &'static [IssueType],
    by_slug: HashMap<&'static str, usize>,
}

impl IssueCatalog {
    /// Build a catalog over an arbitrary table (tests, alternate deployments)
    pub fn from_table(types: &'static [IssueType]) -> Self {
        let by_slug = types
            .iter()
            .enumerate()
            .map(|(idx, issue)| (issue.slug, idx))
            .collect();

        IssueCatalog { types, by_slug }
    }

    /// Process-wide catalog over `ISSUE_TYPES`
    pub fn global() -> &'static IssueCatalog {
        static CATALOG: OnceLock<IssueCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| IssueCatalog::from_table(ISSUE_TYPES))
    }

    pub fn all_issue_types(&self) -> &'static [IssueType] {
        self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, slug: &str) -> Result<&'static IssueType> {
        let types = self.types;
        self.by_slug
            .get(slug)
            .map(|&idx| &types[idx])
            .ok_or_else(|| DashboardError::UnknownIssueType(slug.to_string()))
    }

    pub fn owner_class_of(&self, slug: &str) -> Result<EntityClass> {
        self.get(slug).map(|issue| issue.owner)
    }

    pub fn severity_of(&self, slug: &str) -> Result<Severity> {
        self.get(slug).map(|issue| issue.severity)
    }

    pub fn description_of(&self, slug: &str) -> Result<&'static str> {
        self.get(slug).map(|issue| issue.description)
    }

    /// Slugs owned by `class`, in catalog order
    pub fn issues_for_class(&self, class: EntityClass) -> Vec<&'static str> {
        self.types
            .iter()
            .filter(|issue| issue.owner == class)
            .map(|issue| issue.slug)
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
