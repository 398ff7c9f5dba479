// 🏃 RunPlan - one execution of a jurisdiction's import pipeline

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    pub jurisdiction_id: String,
    pub success: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl RunPlan {
    /// Status shown on the overview row
    pub fn status(&self) -> RunStatus {
        RunStatus {
            success: self.success,
            date: self.end_time.date_naive(),
        }
    }
}

/// Outcome and end date of the latest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub success: bool,
    pub date: NaiveDate,
}
