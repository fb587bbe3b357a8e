//! Startup configuration.
//!
//! Resolved once in `main` from the command line, the process environment and
//! an optional `.env` file, then handed to the application. Nothing reads the
//! environment after startup.

use crate::model::{InvalidPatientId, PatientId};
use crate::sources::{DicomFolderSource, HttpStudySource, StudySource};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Parser)]
#[command(name = "ct-study-viewer")]
#[command(about = "Patient dashboard listing CT imaging studies")]
pub struct Cli {
    /// Patient identifier opened at startup
    #[arg(long, env = "CT_VIEWER_PATIENT")]
    pub patient: Option<String>,
    /// Base URL of the imaging service
    #[arg(long, env = "CT_VIEWER_API_URL", conflicts_with = "dicom_dir")]
    pub api_url: Option<String>,
    /// Folder of DICOM files to read studies from
    #[arg(long, env = "CT_VIEWER_DICOM_DIR")]
    pub dicom_dir: Option<PathBuf>,
    /// Request timeout for the imaging service, in seconds
    #[arg(long, env = "CT_VIEWER_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid imaging service URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("imaging service URL {0} cannot carry a path")]
    UnsupportedUrl(String),
    #[error("timeout must be at least one second")]
    ZeroTimeout,
    #[error("DICOM folder {} does not exist or is not a directory", .0.display())]
    MissingDicomDir(PathBuf),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("invalid startup patient: {0}")]
    Patient(#[from] InvalidPatientId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    Http { base_url: Url, timeout: Duration },
    DicomFolder(PathBuf),
}

impl SourceConfig {
    pub fn build(&self) -> Result<Arc<dyn StudySource>, ConfigError> {
        let source: Arc<dyn StudySource> = match self {
            SourceConfig::Http { base_url, timeout } => {
                Arc::new(HttpStudySource::new(base_url.clone(), *timeout)?)
            }
            SourceConfig::DicomFolder(root) => Arc::new(DicomFolderSource::new(root.clone())),
        };
        Ok(source)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub initial_patient: Option<PatientId>,
    pub source: Option<SourceConfig>,
}

impl AppConfig {
    /// Loads `.env` (if any) and parses the command line.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("Loaded environment from {}", path.display());
        }
        Self::from_cli(Cli::parse())
    }

    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if cli.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let initial_patient = cli.patient.map(PatientId::new).transpose()?;

        let source = match (cli.api_url, cli.dicom_dir) {
            (Some(raw), _) => Some(SourceConfig::Http {
                base_url: parse_base_url(&raw)?,
                timeout: Duration::from_secs(cli.timeout_secs),
            }),
            (None, Some(dir)) => {
                if !dir.is_dir() {
                    return Err(ConfigError::MissingDicomDir(dir));
                }
                Some(SourceConfig::DicomFolder(dir))
            }
            (None, None) => None,
        };

        Ok(Self {
            initial_patient,
            source,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|err| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::UnsupportedUrl(raw.to_string()));
    }
    Ok(url)
}
