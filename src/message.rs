use crate::model::{CtStudy, RequestTag, RetrievalError};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum Message {
    PatientInputChanged(String),
    OpenPatient,
    ClosePatient,
    RetryFetch,
    StudiesFetched {
        tag: RequestTag,
        result: Result<Vec<CtStudy>, RetrievalError>,
    },
    PickDicomFolder,
    DicomFolderPicked(Option<PathBuf>),
}
