use super::StudySource;
use crate::model::{CtStudy, PatientId, RetrievalError, StudyStatus};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use dicom::dictionary_std::tags;
use dicom::object::{DefaultDicomObject, OpenFileOptions};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

const CT_MODALITY: &str = "CT";
const FALLBACK_DESCRIPTION: &str = "CT study";

/// Builds the study list from DICOM files stored under a local folder.
#[derive(Debug, Clone)]
pub struct DicomFolderSource {
    root: PathBuf,
}

impl DicomFolderSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl StudySource for DicomFolderSource {
    async fn fetch_ct_studies(
        &self,
        patient: &PatientId,
    ) -> Result<Vec<CtStudy>, RetrievalError> {
        let root = self.root.clone();
        let patient = patient.clone();
        tokio::task::spawn_blocking(move || {
            let instances = scan_folder(&root)?;
            summarize_patient(&instances, &patient)
        })
        .await
        .map_err(|err| RetrievalError::Unknown(format!("folder scan aborted: {err}")))?
    }

    fn describe(&self) -> String {
        format!("DICOM folder {}", self.root.display())
    }
}

/// Header attributes of one DICOM instance relevant to the study list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct InstanceSummary {
    patient_id: Option<String>,
    modality: Option<String>,
    study_instance_uid: Option<String>,
    series_instance_uid: Option<String>,
    study_date: Option<String>,
    study_time: Option<String>,
    study_description: Option<String>,
    body_part: Option<String>,
}

fn scan_folder(root: &Path) -> Result<Vec<InstanceSummary>, RetrievalError> {
    log::info!("Scanning DICOM folder: {}", root.display());
    let files = collect_files(root).map_err(|err| {
        let message = format!("{}: failed to read folder ({err})", root.display());
        log::error!("{message}");
        RetrievalError::Network(message)
    })?;

    let instances = files
        .into_iter()
        .filter_map(|path| read_instance(&path))
        .collect::<Vec<_>>();
    log::debug!(
        "Found {} DICOM instance(s) under {}",
        instances.len(),
        root.display()
    );
    Ok(instances)
}

/// Lists every file under `root`, following symlinks. Only a failure to read
/// `root` itself is an error; unreadable entries below it are skipped.
fn collect_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root)?;
    let mut visited = HashSet::from([fs::canonicalize(root)?]);
    let mut files = Vec::new();
    walk_entries(entries, &mut visited, &mut files);
    Ok(files)
}

fn walk_entries(entries: fs::ReadDir, visited: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(err) => {
                log::warn!("Skipping unreadable folder entry: {err}");
                continue;
            }
        };

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(err) => {
                log::warn!("Skipping {}: {err}", path.display());
                continue;
            }
        };

        if metadata.is_file() {
            files.push(path);
            continue;
        }
        if !metadata.is_dir() {
            continue;
        }

        // Symlinked folders can point back up the tree.
        match fs::canonicalize(&path) {
            Ok(canonical) if !visited.insert(canonical.clone()) => {
                log::debug!("Skipping {}: folder already scanned", path.display());
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                log::warn!("Skipping {}: {err}", path.display());
                continue;
            }
        }

        match fs::read_dir(&path) {
            Ok(children) => walk_entries(children, visited, files),
            Err(err) => log::warn!("Skipping {}: failed to read folder ({err})", path.display()),
        }
    }
}

fn read_instance(path: &Path) -> Option<InstanceSummary> {
    let object = match OpenFileOptions::new()
        .read_until(tags::PIXEL_DATA)
        .open_file(path)
    {
        Ok(object) => object,
        Err(err) => {
            log::debug!("Skipping {}: not a readable DICOM file ({err})", path.display());
            return None;
        }
    };

    Some(InstanceSummary {
        patient_id: attribute_text(&object, "PatientID"),
        modality: attribute_text(&object, "Modality"),
        study_instance_uid: attribute_text(&object, "StudyInstanceUID"),
        series_instance_uid: attribute_text(&object, "SeriesInstanceUID"),
        study_date: attribute_text(&object, "StudyDate"),
        study_time: attribute_text(&object, "StudyTime"),
        study_description: attribute_text(&object, "StudyDescription"),
        body_part: attribute_text(&object, "BodyPartExamined"),
    })
}

#[derive(Default)]
struct StudyAccumulator<'a> {
    first: Option<&'a InstanceSummary>,
    series: BTreeSet<&'a str>,
    instances: usize,
}

fn summarize_patient(
    instances: &[InstanceSummary],
    patient: &PatientId,
) -> Result<Vec<CtStudy>, RetrievalError> {
    let for_patient = instances
        .iter()
        .filter(|instance| instance.patient_id.as_deref() == Some(patient.as_str()))
        .collect::<Vec<_>>();

    if for_patient.is_empty() {
        return Err(RetrievalError::NotFound(patient.clone()));
    }

    let mut grouped: BTreeMap<&str, StudyAccumulator> = BTreeMap::new();
    for instance in for_patient {
        if instance.modality.as_deref() != Some(CT_MODALITY) {
            continue;
        }
        let Some(study_uid) = instance.study_instance_uid.as_deref() else {
            log::warn!("Ignoring CT instance without StudyInstanceUID for patient {patient}");
            continue;
        };

        let study = grouped.entry(study_uid).or_default();
        study.first.get_or_insert(instance);
        if let Some(series_uid) = instance.series_instance_uid.as_deref() {
            study.series.insert(series_uid);
        }
        study.instances += 1;
    }

    Ok(grouped
        .into_iter()
        .filter_map(|(study_uid, study)| {
            let first = study.first?;
            Some(CtStudy {
                study_id: study_uid.to_string(),
                study_date: study_datetime(first.study_date.as_deref(), first.study_time.as_deref()),
                description: first
                    .study_description
                    .clone()
                    .or_else(|| first.body_part.clone())
                    .unwrap_or_else(|| FALLBACK_DESCRIPTION.to_string()),
                status: StudyStatus::Available,
                series_count: Some(study.series.len()),
                instance_count: Some(study.instances),
            })
        })
        .collect())
}

/// Combines DICOM DA and TM values. Missing or malformed dates sort last.
fn study_datetime(date: Option<&str>, time: Option<&str>) -> DateTime<Utc> {
    let Some(date) = date.and_then(|value| NaiveDate::parse_from_str(value, "%Y%m%d").ok())
    else {
        return DateTime::<Utc>::MIN_UTC;
    };
    let time = time.and_then(parse_dicom_time).unwrap_or(NaiveTime::MIN);
    date.and_time(time).and_utc()
}

fn parse_dicom_time(value: &str) -> Option<NaiveTime> {
    let whole = value.split('.').next().unwrap_or_default();
    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let field = |range: std::ops::Range<usize>| whole.get(range).and_then(|s| s.parse().ok());
    let (hour, minute, second) = match whole.len() {
        2 => (field(0..2)?, 0, 0),
        4 => (field(0..2)?, field(2..4)?, 0),
        6 => (field(0..2)?, field(2..4)?, field(4..6)?),
        _ => return None,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}

fn attribute_text(object: &DefaultDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use dicom::core::{DataElement, PrimitiveValue, VR};
    use dicom::object::{FileMetaTableBuilder, InMemDicomObject};

    fn patient(id: &str) -> PatientId {
        PatientId::new(id).expect("valid id")
    }

    fn instance(patient: &str, modality: &str, study: &str, series: &str) -> InstanceSummary {
        InstanceSummary {
            patient_id: Some(patient.to_string()),
            modality: Some(modality.to_string()),
            study_instance_uid: Some(study.to_string()),
            series_instance_uid: Some(series.to_string()),
            study_date: Some("20240501".to_string()),
            study_time: Some("101500.25".to_string()),
            study_description: Some("Chest CT".to_string()),
            body_part: Some("CHEST".to_string()),
        }
    }

    #[test]
    fn groups_instances_into_studies() {
        let instances = vec![
            instance("P-1", "CT", "1.2.1", "1.2.1.1"),
            instance("P-1", "CT", "1.2.1", "1.2.1.1"),
            instance("P-1", "CT", "1.2.1", "1.2.1.2"),
            instance("P-1", "MR", "1.2.2", "1.2.2.1"),
            instance("P-2", "CT", "1.2.3", "1.2.3.1"),
        ];

        let studies = summarize_patient(&instances, &patient("P-1")).expect("studies");

        assert_eq!(studies.len(), 1);
        assert_eq!(studies[0].study_id, "1.2.1");
        assert_eq!(studies[0].series_count, Some(2));
        assert_eq!(studies[0].instance_count, Some(3));
        assert_eq!(studies[0].status, StudyStatus::Available);
        assert_eq!(
            studies[0].study_date,
            Utc.with_ymd_and_hms(2024, 5, 1, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn unknown_patient_is_not_found() {
        let instances = vec![instance("P-1", "CT", "1.2.1", "1.2.1.1")];
        assert_eq!(
            summarize_patient(&instances, &patient("P-9")),
            Err(RetrievalError::NotFound(patient("P-9")))
        );
    }

    #[test]
    fn patient_without_ct_has_empty_list() {
        let instances = vec![instance("P-1", "MR", "1.2.1", "1.2.1.1")];
        assert_eq!(summarize_patient(&instances, &patient("P-1")), Ok(Vec::new()));
    }

    #[test]
    fn description_falls_back_to_body_part() {
        let mut only_body_part = instance("P-1", "CT", "1.2.1", "1.2.1.1");
        only_body_part.study_description = None;
        let mut bare = instance("P-1", "CT", "1.2.2", "1.2.2.1");
        bare.study_description = None;
        bare.body_part = None;

        let studies =
            summarize_patient(&[only_body_part, bare], &patient("P-1")).expect("studies");

        assert_eq!(studies[0].description, "CHEST");
        assert_eq!(studies[1].description, FALLBACK_DESCRIPTION);
    }

    #[test]
    fn parses_dicom_times() {
        assert_eq!(parse_dicom_time("10"), NaiveTime::from_hms_opt(10, 0, 0));
        assert_eq!(parse_dicom_time("1015"), NaiveTime::from_hms_opt(10, 15, 0));
        assert_eq!(
            parse_dicom_time("101530.123456"),
            NaiveTime::from_hms_opt(10, 15, 30)
        );
        assert_eq!(parse_dicom_time("10:15"), None);
        assert_eq!(
            study_datetime(Some("not-a-date"), None),
            DateTime::<Utc>::MIN_UTC
        );
    }

    fn write_ct_instance(path: &Path, patient: &str, study_uid: &str, sop_uid: &str) {
        let object = InMemDicomObject::from_element_iter([
            DataElement::new(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from("1.2.840.10008.5.1.4.1.1.2")),
            DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from(sop_uid)),
            DataElement::new(tags::STUDY_DATE, VR::DA, PrimitiveValue::from("20240410")),
            DataElement::new(tags::MODALITY, VR::CS, PrimitiveValue::from("CT")),
            DataElement::new(tags::STUDY_DESCRIPTION, VR::LO, PrimitiveValue::from("Abdomen CT")),
            DataElement::new(tags::PATIENT_ID, VR::LO, PrimitiveValue::from(patient)),
            DataElement::new(tags::STUDY_INSTANCE_UID, VR::UI, PrimitiveValue::from(study_uid)),
            DataElement::new(tags::SERIES_INSTANCE_UID, VR::UI, PrimitiveValue::from("1.2.9.1")),
        ]);
        let file = object
            .with_meta(
                FileMetaTableBuilder::new()
                    .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.2")
                    .media_storage_sop_instance_uid(sop_uid)
                    .transfer_syntax("1.2.840.10008.1.2.1"),
            )
            .expect("file meta");
        file.write_to_file(path).expect("write dicom file");
    }

    #[tokio::test]
    async fn reads_studies_from_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("series");
        fs::create_dir_all(&nested).expect("nested dir");
        write_ct_instance(&dir.path().join("a.dcm"), "P-1001", "1.2.9", "1.2.9.1.1");
        write_ct_instance(&nested.join("b.dcm"), "P-1001", "1.2.9", "1.2.9.1.2");
        fs::write(dir.path().join("notes.txt"), "not dicom").expect("write text file");

        let source = DicomFolderSource::new(dir.path().to_path_buf());
        let studies = source
            .fetch_ct_studies(&patient("P-1001"))
            .await
            .expect("studies");

        assert_eq!(studies.len(), 1);
        assert_eq!(studies[0].study_id, "1.2.9");
        assert_eq!(studies[0].description, "Abdomen CT");
        assert_eq!(studies[0].instance_count, Some(2));
        assert_eq!(
            studies[0].study_date,
            Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap()
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn follows_symlinks_and_skips_broken_entries() {
        use std::os::unix::fs::symlink;

        let store = tempfile::tempdir().expect("store dir");
        let dir = tempfile::tempdir().expect("scan dir");
        let linked_series = store.path().join("series");
        fs::create_dir_all(&linked_series).expect("series dir");
        write_ct_instance(&linked_series.join("a.dcm"), "P-1001", "1.2.9", "1.2.9.1.1");
        write_ct_instance(&store.path().join("b.dcm"), "P-1001", "1.2.9", "1.2.9.1.2");

        symlink(&linked_series, dir.path().join("series-link")).expect("folder link");
        symlink(store.path().join("b.dcm"), dir.path().join("b-link.dcm")).expect("file link");
        symlink(dir.path().join("gone"), dir.path().join("dangling")).expect("dangling link");
        symlink(dir.path(), dir.path().join("loop")).expect("loop link");

        let source = DicomFolderSource::new(dir.path().to_path_buf());
        let studies = source
            .fetch_ct_studies(&patient("P-1001"))
            .await
            .expect("studies");

        assert_eq!(studies.len(), 1);
        assert_eq!(studies[0].instance_count, Some(2));
    }

    #[test]
    fn collects_only_regular_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("empty")).expect("subdir");
        fs::write(dir.path().join("notes.txt"), "not dicom").expect("write text file");

        let files = collect_files(dir.path()).expect("scan");

        assert_eq!(files, vec![dir.path().join("notes.txt")]);
    }

    #[tokio::test]
    async fn missing_folder_is_a_network_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = DicomFolderSource::new(dir.path().join("absent"));

        let err = source
            .fetch_ct_studies(&patient("P-1"))
            .await
            .expect_err("missing folder");

        assert!(matches!(err, RetrievalError::Network(_)));
    }
}
