pub mod ct_study;
pub mod error;
pub mod list_view;
pub mod patient;
pub mod study_list;

pub use ct_study::{CtStudy, StudyStatus};
pub use error::{ErrorKind, RetrievalError};
pub use list_view::{ListView, StudyRow};
pub use patient::{InvalidPatientId, PatientId};
pub use study_list::{FetchRequest, RequestTag, Resolution, StudyList, StudyListState};
