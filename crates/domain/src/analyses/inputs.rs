use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};

use super::Procedure;
use crate::{storage::Blob, Error};

/// Which patient a submission is for.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PatientSelection {
    Existing(String),
    /// Created on the fly before any photo is uploaded
    New { name: String },
}

/// One before/after analysis request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Submission {
    pub patient: PatientSelection,
    pub before: Blob,
    pub after: Blob,
    pub procedures: Vec<Procedure>,
}

impl Submission {
    /// Checks everything that can be checked without calling out.
    pub fn validate(&self) -> Result<(), Error> {
        if self.before.is_empty() || self.after.is_empty() {
            return Err(Error::validation("Both before and after photos are required"));
        }
        if self.procedures.is_empty() {
            return Err(Error::validation("Select at least one procedure"));
        }

        let blank = match &self.patient {
            PatientSelection::Existing(id) => id.trim().is_empty(),
            PatientSelection::New { name } => name.trim().is_empty(),
        };
        if blank {
            return Err(Error::validation(
                "Select a patient or enter the new patient's name",
            ));
        }

        Ok(())
    }

    /// Procedures in submission order, without repeats.
    pub fn distinct_procedures(&self) -> Vec<Procedure> {
        let mut seen = Vec::with_capacity(self.procedures.len());
        for procedure in &self.procedures {
            if !seen.contains(procedure) {
                seen.push(*procedure);
            }
        }
        seen
    }
}

/// Image as sent over the API.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct EncodedImage {
    /// Base64 bytes, without a `data:` prefix
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl EncodedImage {
    fn decode(self, label: &str) -> Result<Blob, Error> {
        let bytes = general_purpose::STANDARD
            .decode(self.data.trim())
            .map_err(|_| Error::validation(format!("The {} photo is not valid base64", label)))?;

        let content_type = self.content_type.unwrap_or("image/jpeg".to_string());
        Ok(Blob::new(bytes, content_type))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SubmitAnalysisInput {
    /// Takes precedence over `patient_name`
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub before_image: EncodedImage,
    #[serde(default)]
    pub after_image: EncodedImage,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
}

impl SubmitAnalysisInput {
    pub fn into_submission(self) -> Result<Submission, Error> {
        let patient = match (non_blank(self.patient_id), non_blank(self.patient_name)) {
            (Some(id), _) => PatientSelection::Existing(id),
            (None, Some(name)) => PatientSelection::New { name },
            (None, None) => {
                return Err(Error::validation(
                    "Select a patient or enter the new patient's name",
                ))
            }
        };

        Ok(Submission {
            patient,
            before: self.before_image.decode("before")?,
            after: self.after_image.decode("after")?,
            procedures: self.procedures,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
