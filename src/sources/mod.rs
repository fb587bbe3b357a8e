pub mod dicom_folder;
pub mod http;

use crate::model::{CtStudy, PatientId, RetrievalError};
use async_trait::async_trait;

pub use dicom_folder::DicomFolderSource;
pub use http::HttpStudySource;

/// Supplies the CT studies belonging to a patient.
#[async_trait]
pub trait StudySource: Send + Sync {
    async fn fetch_ct_studies(&self, patient: &PatientId)
        -> Result<Vec<CtStudy>, RetrievalError>;

    /// Short label shown in the dashboard.
    fn describe(&self) -> String;
}
