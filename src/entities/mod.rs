// Entity Models - the records the catalog store hands back
//
// One struct per entity class, plus `Entity` as the closed sum over them.
// Adding a class means adding a variant here and fixing every match.

pub mod civic;
pub mod legislative;
pub mod run_plan;

pub use civic::{Jurisdiction, Membership, Organization, Person};
pub use legislative::{Bill, VoteEvent};
pub use run_plan::{RunPlan, RunStatus};

use crate::issues::EntityClass;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "lowercase")]
pub enum Entity {
    Person(Person),
    Organization(Organization),
    Membership(Membership),
    Bill(Bill),
    VoteEvent(VoteEvent),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Person(p) => &p.id,
            Entity::Organization(o) => &o.id,
            Entity::Membership(m) => &m.id,
            Entity::Bill(b) => &b.id,
            Entity::VoteEvent(v) => &v.id,
        }
    }

    pub fn class(&self) -> EntityClass {
        match self {
            Entity::Person(_) => EntityClass::Person,
            Entity::Organization(_) => EntityClass::Organization,
            Entity::Membership(_) => EntityClass::Membership,
            Entity::Bill(_) => EntityClass::Bill,
            Entity::VoteEvent(_) => EntityClass::VoteEvent,
        }
    }

    /// Short human label for lists
    pub fn display_name(&self) -> String {
        match self {
            Entity::Person(p) => p.name.clone(),
            Entity::Organization(o) => o.name.clone(),
            Entity::Membership(m) => m.label(),
            Entity::Bill(b) => format!("{} - {}", b.identifier, b.title),
            Entity::VoteEvent(v) => v.label(),
        }
    }
}
