use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("patient identifier cannot be empty")]
pub struct InvalidPatientId;

/// Opaque patient identifier handed to the study list by the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PatientId(String);

impl PatientId {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, InvalidPatientId> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(InvalidPatientId);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PatientId {
    type Error = InvalidPatientId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PatientId> for String {
    fn from(value: PatientId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let id = PatientId::new("  P-1001 \n").expect("valid id");
        assert_eq!(id.as_str(), "P-1001");
    }

    #[test]
    fn rejects_blank_identifiers() {
        assert_eq!(PatientId::new(""), Err(InvalidPatientId));
        assert_eq!(PatientId::new("   "), Err(InvalidPatientId));
    }
}
