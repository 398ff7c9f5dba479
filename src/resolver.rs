// 🔎 Issue Resolver - drill down from a counter to the flagged records
//
// Flags are looked up by composite key (`<owner>-<slug>`), then resolved
// against the live catalog. Ids deleted since the scan are dropped.

use crate::entities::Entity;
use crate::error::{DashboardError, Result};
use crate::issues::{EntityClass, IssueCatalog, IssueType};
use crate::store::{CatalogStore, FlaggedIssueIndex};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

// ============================================================================
// EDIT LINK
// ============================================================================

/// Admin change-form route for an entity class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditLinkKind {
    CorePersonChange,
    CoreOrganizationChange,
    LegislativeBillChange,
    LegislativeVoteeventChange,
}

impl EditLinkKind {
    /// None for memberships: they have no change form of their own
    pub fn for_class(class: EntityClass) -> Option<EditLinkKind> {
        match class {
            EntityClass::Person => Some(EditLinkKind::CorePersonChange),
            EntityClass::Organization => Some(EditLinkKind::CoreOrganizationChange),
            EntityClass::Membership => None,
            EntityClass::Bill => Some(EditLinkKind::LegislativeBillChange),
            EntityClass::VoteEvent => Some(EditLinkKind::LegislativeVoteeventChange),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EditLinkKind::CorePersonChange => "core_person_change",
            EditLinkKind::CoreOrganizationChange => "core_organization_change",
            EditLinkKind::LegislativeBillChange => "legislative_bill_change",
            EditLinkKind::LegislativeVoteeventChange => "legislative_voteevent_change",
        }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Flagged entities sharing one issue description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueGroup {
    pub description: String,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssueResolution {
    pub jurisdiction: String,
    pub class: EntityClass,

    /// Groups in catalog order; every resolved slug has one, possibly empty.
    /// Serialized as an object keyed by description.
    #[serde(serialize_with = "serialize_groups")]
    pub groups: Vec<IssueGroup>,

    pub edit_link: Option<EditLinkKind>,
}

impl IssueResolution {
    pub fn total(&self) -> usize {
        self.groups.iter().map(|group| group.entities.len()).sum()
    }

    pub fn group(&self, description: &str) -> Option<&[Entity]> {
        self.groups
            .iter()
            .find(|group| group.description == description)
            .map(|group| group.entities.as_slice())
    }
}

fn serialize_groups<S>(
    groups: &[IssueGroup],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(groups.len()))?;
    for group in groups {
        map.serialize_entry(&group.description, &group.entities)?;
    }
    map.end()
}

pub struct IssueResolver<'a, C, F> {
    issues: &'a IssueCatalog,
    catalog: &'a C,
    flags: &'a F,
}

impl<'a, C, F> IssueResolver<'a, C, F>
where
    C: CatalogStore,
    F: FlaggedIssueIndex,
{
    pub fn new(issues: &'a IssueCatalog, catalog: &'a C, flags: &'a F) -> Self {
        IssueResolver {
            issues,
            catalog,
            flags,
        }
    }

    /// Resolve one slug, or every slug of the class when `slug` is None
    pub fn resolve_issues(
        &self,
        jurisdiction: &str,
        class: &str,
        slug: Option<&str>,
    ) -> Result<IssueResolution> {
        let class: EntityClass = class.parse()?;

        let issue_types: Vec<&IssueType> = match slug {
            Some(slug) => {
                let issue = self.issues.get(slug)?;
                if issue.owner != class {
                    return Err(DashboardError::IssueClassMismatch {
                        slug: slug.to_string(),
                        owner: issue.owner,
                        requested: class,
                    });
                }
                vec![issue]
            }
            None => self
                .issues
                .issues_for_class(class)
                .into_iter()
                .map(|slug| self.issues.get(slug))
                .collect::<Result<Vec<_>>>()?,
        };

        let mut groups: Vec<IssueGroup> = Vec::new();

        for issue in issue_types {
            let entities = self.resolve_one(jurisdiction, issue)?;
            // Identical descriptions share one group
            match groups
                .iter_mut()
                .find(|group| group.description == issue.description)
            {
                Some(group) => group.entities.extend(entities),
                None => groups.push(IssueGroup {
                    description: issue.description.to_string(),
                    entities,
                }),
            }
        }

        Ok(IssueResolution {
            jurisdiction: jurisdiction.to_string(),
            class,
            groups,
            edit_link: EditLinkKind::for_class(class),
        })
    }

    fn resolve_one(&self, jurisdiction: &str, issue: &IssueType) -> Result<Vec<Entity>> {
        let ids = self.flags.find_flagged(jurisdiction, &issue.composite_key())?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut found = self.catalog.get_entities_by_ids(issue.owner, &ids)?;

        // Keep flag-index order
        let entities: Vec<Entity> = ids.iter().filter_map(|id| found.remove(id)).collect();

        if entities.len() < ids.len() {
            warn!(
                jurisdiction,
                issue = issue.slug,
                flagged = ids.len(),
                live = entities.len(),
                "dropping flags for records no longer in the catalog"
            );
        } else {
            debug!(jurisdiction, issue = issue.slug, count = entities.len(), "resolved issue");
        }

        Ok(entities)
    }
}

// ============================================================================
// TESTS
// ============================================================================
