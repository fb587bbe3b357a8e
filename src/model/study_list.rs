//! Fetch lifecycle of the CT study list.
//!
//! [`StudyList`] owns the view-state for one patient and decides which
//! retrieval results may be applied. It never performs I/O itself: every
//! operation that needs data returns a [`FetchRequest`] that the host turns
//! into an asynchronous task, and the task's outcome comes back through
//! [`StudyList::resolve`] together with the request's [`RequestTag`].

use super::{CtStudy, ErrorKind, PatientId, RetrievalError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

/// Generations are process-wide so tags never repeat across remounts.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Identifies one retrieval attempt issued by a [`StudyList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTag {
    patient: PatientId,
    generation: u64,
}

impl RequestTag {
    pub fn patient(&self) -> &PatientId {
        &self.patient
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A retrieval the host must run for the study list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub tag: RequestTag,
}

impl FetchRequest {
    pub fn patient(&self) -> &PatientId {
        &self.tag.patient
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudyListState {
    Loading,
    /// Sorted by study date, most recent first. May be empty.
    Loaded(Vec<CtStudy>),
    Failed(ErrorKind),
}

/// What happened to a result handed to [`StudyList::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Applied,
    Discarded,
}

#[derive(Debug)]
pub struct StudyList {
    patient: PatientId,
    state: StudyListState,
    in_flight: Option<RequestTag>,
    mounted: bool,
}

impl StudyList {
    pub fn mount(patient: PatientId) -> (Self, FetchRequest) {
        log::info!("Mounting CT study list for patient {patient}");
        let mut list = Self {
            patient,
            state: StudyListState::Loading,
            in_flight: None,
            mounted: true,
        };
        let request = list.issue();
        (list, request)
    }

    pub fn patient(&self) -> &PatientId {
        &self.patient
    }

    pub fn state(&self) -> &StudyListState {
        &self.state
    }

    pub fn in_flight(&self) -> Option<&RequestTag> {
        self.in_flight.as_ref()
    }

    /// Switches to another patient. Returns `None` when the identifier is
    /// unchanged or the list has been unmounted.
    pub fn change_patient(&mut self, patient: PatientId) -> Option<FetchRequest> {
        if !self.mounted || patient == self.patient {
            return None;
        }

        log::info!(
            "Patient changed from {} to {patient}, superseding pending CT study request",
            self.patient
        );
        self.patient = patient;
        self.state = StudyListState::Loading;
        Some(self.issue())
    }

    /// Re-issues the request for the current patient after a failure.
    pub fn retry(&mut self) -> Option<FetchRequest> {
        if !self.mounted || !matches!(self.state, StudyListState::Failed(_)) {
            return None;
        }

        log::info!("Retrying CT study retrieval for patient {}", self.patient);
        self.state = StudyListState::Loading;
        Some(self.issue())
    }

    pub fn resolve(
        &mut self,
        tag: &RequestTag,
        result: Result<Vec<CtStudy>, RetrievalError>,
    ) -> Resolution {
        if !self.mounted || self.in_flight.as_ref() != Some(tag) {
            log::debug!(
                "Discarding stale CT study result for patient {} (generation {})",
                tag.patient,
                tag.generation
            );
            return Resolution::Discarded;
        }

        self.in_flight = None;
        match result {
            Ok(studies) => self.on_retrieval_success(studies),
            Err(err) => {
                log::warn!(
                    "CT study retrieval failed for patient {}: {err}",
                    self.patient
                );
                self.on_retrieval_failure(err.kind());
            }
        }
        Resolution::Applied
    }

    /// Drops the in-flight request. Nothing is applied afterwards.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        log::info!("Unmounting CT study list for patient {}", self.patient);
        self.mounted = false;
        self.in_flight = None;
    }

    fn on_retrieval_success(&mut self, studies: Vec<CtStudy>) {
        let studies = sort_most_recent_first(dedupe_by_study_id(studies));
        log::info!(
            "Loaded {} CT stud{} for patient {}",
            studies.len(),
            if studies.len() == 1 { "y" } else { "ies" },
            self.patient
        );
        self.state = StudyListState::Loaded(studies);
    }

    fn on_retrieval_failure(&mut self, kind: ErrorKind) {
        self.state = StudyListState::Failed(kind);
    }

    fn issue(&mut self) -> FetchRequest {
        let tag = RequestTag {
            patient: self.patient.clone(),
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
        };
        self.in_flight = Some(tag.clone());
        FetchRequest { tag }
    }
}

fn dedupe_by_study_id(studies: Vec<CtStudy>) -> Vec<CtStudy> {
    let mut seen = HashSet::new();
    studies
        .into_iter()
        .filter(|study| {
            let fresh = seen.insert(study.study_id.clone());
            if !fresh {
                log::warn!("Dropping duplicate CT study {}", study.study_id);
            }
            fresh
        })
        .collect()
}

fn sort_most_recent_first(mut studies: Vec<CtStudy>) -> Vec<CtStudy> {
    studies.sort_by(|a, b| {
        b.study_date
            .cmp(&a.study_date)
            .then_with(|| a.study_id.cmp(&b.study_id))
    });
    studies
}
