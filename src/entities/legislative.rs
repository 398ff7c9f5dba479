// 📜 Legislative entities - bills and vote events

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub jurisdiction_id: String,

    /// Chamber-local identifier (e.g. "HB 101")
    pub identifier: String,

    pub title: String,
    pub legislative_session: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEvent {
    pub id: String,
    pub jurisdiction_id: String,
    pub identifier: String,
    pub motion_text: String,
    pub start_date: String,

    /// "pass" / "fail"
    pub result: String,

    /// Bill being voted on; None when the importer could not resolve it
    pub bill_id: Option<String>,
}

impl VoteEvent {
    pub fn label(&self) -> String {
        match (self.identifier.is_empty(), self.start_date.is_empty()) {
            (true, true) => self.motion_text.clone(),
            (true, false) => format!("{} ({})", self.motion_text, self.start_date),
            (false, _) => format!("{}: {}", self.identifier, self.motion_text),
        }
    }
}
