use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ulid::Ulid;

use crate::Identity;

pub const ENTITY: &str = "Analysis";

/// Cosmetic procedure performed between the two photos.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Procedure {
    Botox,
    Preenchimento,
    Peeling,
}

impl Procedure {
    pub const ALL: [Procedure; 3] = [Procedure::Botox, Procedure::Preenchimento, Procedure::Peeling];
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Analyzed and reported; the only state a stored analysis is written in
    #[default]
    Completed,
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Analysis {
    pub id: String,
    pub patient_id: String,
    pub user_id: String,
    #[serde(default)]
    pub before_photo_id: Option<String>,
    #[serde(default)]
    pub after_photo_id: Option<String>,
    pub procedures: Vec<Procedure>,
    /// Analyzer output, stored untouched
    pub results: Value,
    /// Object key of the rendered PDF
    pub report_path: String,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewAnalysis {
    pub patient_id: String,
    pub before_photo_id: Option<String>,
    pub after_photo_id: Option<String>,
    pub procedures: Vec<Procedure>,
    pub results: Value,
    pub report_path: String,
}

impl Analysis {
    pub fn create(owner: &Identity, input: NewAnalysis) -> Self {
        Self {
            id: Ulid::new().to_string(),
            patient_id: input.patient_id,
            user_id: owner.user_id.clone(),
            before_photo_id: input.before_photo_id,
            after_photo_id: input.after_photo_id,
            procedures: input.procedures,
            results: input.results,
            report_path: input.report_path,
            status: AnalysisStatus::Completed,
            created_at: Utc::now(),
        }
    }
}
