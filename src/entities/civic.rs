// 🏛️ Core civic entities - jurisdictions, people, organizations, memberships
//
// Owned by the external catalog store. Ids are OCD-style strings
// ("ocd-person/…"); jurisdictions are addressed by name.

use serde::{Deserialize, Serialize};

// ============================================================================
// JURISDICTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jurisdiction {
    pub id: String,

    /// Natural key used by every dashboard query
    pub name: String,

    pub url: String,
}

impl Jurisdiction {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Jurisdiction {
            id: id.into(),
            name: name.into(),
            url: String::new(),
        }
    }

    /// Builder: add homepage url
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

// ============================================================================
// PERSON
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub jurisdiction_id: String,

    /// Photo url; empty when the scraper found none
    pub image: String,
}

// ============================================================================
// ORGANIZATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub jurisdiction_id: String,

    /// e.g. "legislature", "lower", "committee", "party"
    pub classification: String,
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub organization_id: String,

    /// None until the importer matches `person_name` to a Person
    pub person_id: Option<String>,

    pub person_name: String,
    pub role: String,
}

impl Membership {
    pub fn label(&self) -> String {
        if self.role.is_empty() {
            self.person_name.clone()
        } else {
            format!("{} ({})", self.person_name, self.role)
        }
    }
}
