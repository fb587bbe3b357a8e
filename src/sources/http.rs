use super::StudySource;
use crate::model::{CtStudy, PatientId, RetrievalError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 200;

/// Reads studies from `GET <base>/patients/<id>/ct-studies`.
#[derive(Debug, Clone)]
pub struct HttpStudySource {
    client: Client,
    base_url: Url,
}

impl HttpStudySource {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn studies_url(&self, patient: &PatientId) -> Result<Url, RetrievalError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RetrievalError::Unknown(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["patients", patient.as_str(), "ct-studies"]);
        Ok(url)
    }
}

#[async_trait]
impl StudySource for HttpStudySource {
    async fn fetch_ct_studies(
        &self,
        patient: &PatientId,
    ) -> Result<Vec<CtStudy>, RetrievalError> {
        let url = self.studies_url(patient)?;
        log::info!("Requesting CT studies from {}", self.base_url);
        log::debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, patient, &body));
        }

        // Body read failures are transport failures; only the decode step may
        // yield a malformed-payload error.
        let body = response.bytes().await.map_err(|err| {
            RetrievalError::Network(format!("failed to read study payload: {err}"))
        })?;
        serde_json::from_slice::<Vec<CtStudy>>(&body)
            .map_err(|err| RetrievalError::Unknown(format!("malformed study payload: {err}")))
    }

    fn describe(&self) -> String {
        format!("Imaging service at {}", self.base_url)
    }
}

fn classify_transport_error(err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
        RetrievalError::Network(err.to_string())
    } else {
        RetrievalError::Unknown(err.to_string())
    }
}

pub(crate) fn classify_status(
    status: StatusCode,
    patient: &PatientId,
    body: &str,
) -> RetrievalError {
    let message = summarize_body(body, status);
    if status == StatusCode::NOT_FOUND {
        RetrievalError::NotFound(patient.clone())
    } else if status.is_server_error() {
        RetrievalError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        RetrievalError::Unknown(format!("unexpected status {status}: {message}"))
    }
}

fn summarize_body(body: &str, status: StatusCode) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY_LEN).collect()
}
