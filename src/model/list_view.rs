use super::{CtStudy, ErrorKind, StudyListState, StudyStatus};
use crate::utils::{format_study_date, format_study_extent, truncate_description};

pub const NO_STUDIES_MESSAGE: &str = "No CT studies found for this patient.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyRow {
    pub study_id: String,
    pub date: String,
    pub description: String,
    pub status: StudyStatus,
    pub extent: Option<String>,
}

impl From<&CtStudy> for StudyRow {
    fn from(study: &CtStudy) -> Self {
        Self {
            study_id: study.study_id.clone(),
            date: format_study_date(&study.study_date),
            description: truncate_description(&study.description),
            status: study.status,
            extent: format_study_extent(study.series_count, study.instance_count),
        }
    }
}

/// What the study list shows for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Progress,
    Empty { message: &'static str },
    Rows { count: usize, rows: Vec<StudyRow> },
    Error { kind: ErrorKind, message: &'static str },
}

impl ListView {
    pub fn from_state(state: &StudyListState) -> Self {
        match state {
            StudyListState::Loading => ListView::Progress,
            StudyListState::Loaded(studies) if studies.is_empty() => ListView::Empty {
                message: NO_STUDIES_MESSAGE,
            },
            StudyListState::Loaded(studies) => ListView::Rows {
                count: studies.len(),
                rows: studies.iter().map(StudyRow::from).collect(),
            },
            StudyListState::Failed(kind) => ListView::Error {
                kind: *kind,
                message: kind.user_message(),
            },
        }
    }
}
