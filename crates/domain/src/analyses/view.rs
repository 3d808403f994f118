use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{model::ENTITY, Analysis, AnalysisStatus, Procedure};
use crate::{
    patients::{self, Patient},
    Error, Identity, Services,
};

/// Analysis detail, with the patient it belongs to.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct AnalysisView {
    #[serde(flatten)]
    pub analysis: Analysis,
    pub patient: Option<Patient>,
}

/// History entry; leaves out the results and the report.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct AnalysisSummary {
    pub id: String,
    pub patient_id: String,
    pub procedures: Vec<Procedure>,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Analysis> for AnalysisSummary {
    fn from(analysis: Analysis) -> Self {
        Self {
            id: analysis.id,
            patient_id: analysis.patient_id,
            procedures: analysis.procedures,
            status: analysis.status,
            created_at: analysis.created_at,
        }
    }
}

impl Services {
    pub async fn analysis(&self, identity: &Identity, id: &str) -> Result<Analysis, Error> {
        self.analyses
            .get(identity, id)
            .await?
            .ok_or_else(|| Error::not_found(ENTITY))
    }

    pub async fn analysis_view(&self, identity: &Identity, id: &str) -> Result<AnalysisView, Error> {
        let analysis = self.analysis(identity, id).await?;
        let patient = self.patients.get(identity, &analysis.patient_id).await?;

        Ok(AnalysisView { analysis, patient })
    }

    /// The stored PDF report of an analysis.
    pub async fn report_pdf(&self, identity: &Identity, id: &str) -> Result<Vec<u8>, Error> {
        let analysis = self.analysis(identity, id).await?;
        if analysis.report_path.trim().is_empty() {
            return Err(Error::integrity(format!("analysis {} has no report", analysis.id)));
        }

        let pdf = self.storage.download(&analysis.report_path).await?;
        if pdf.is_empty() {
            return Err(Error::integrity(format!("report of analysis {} is empty", analysis.id)));
        }

        Ok(pdf)
    }

    /// A patient's analyses, newest first.
    pub async fn patient_history(
        &self,
        identity: &Identity,
        patient_id: &str,
    ) -> Result<Vec<AnalysisSummary>, Error> {
        let patient = patients::find(self.patients.as_ref(), identity, patient_id).await?;
        let analyses = self.analyses.list_for_patient(identity, &patient.id).await?;

        Ok(analyses.into_iter().map(AnalysisSummary::from).collect())
    }
}
