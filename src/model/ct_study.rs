use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudyStatus {
    Pending,
    Available,
    Archived,
}

impl StudyStatus {
    pub fn label(self) -> &'static str {
        match self {
            StudyStatus::Pending => "Pending",
            StudyStatus::Available => "Available",
            StudyStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One CT examination as reported by a study source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtStudy {
    pub study_id: String,
    pub study_date: DateTime<Utc>,
    pub description: String,
    pub status: StudyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_count: Option<usize>,
}
