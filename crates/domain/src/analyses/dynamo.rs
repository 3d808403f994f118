use async_trait::async_trait;

use super::{Analysis, AnalysisRepository, NewAnalysis};
use crate::{
    dynamo::{Table, PATIENT_INDEX},
    Error, Identity,
};

pub struct DynamoAnalysisRepository {
    table: Table,
}

impl DynamoAnalysisRepository {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

#[async_trait]
impl AnalysisRepository for DynamoAnalysisRepository {
    async fn create(&self, owner: &Identity, input: NewAnalysis) -> Result<Analysis, Error> {
        let analysis = Analysis::create(owner, input);
        self.table.put(&analysis).await?;
        Ok(analysis)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Analysis>, Error> {
        let analysis: Option<Analysis> = self.table.get(id).await?;
        Ok(analysis.filter(|a| owner.owns(&a.user_id)))
    }

    async fn list_for_patient(
        &self,
        owner: &Identity,
        patient_id: &str,
    ) -> Result<Vec<Analysis>, Error> {
        let mut analyses: Vec<Analysis> = self
            .table
            .query(PATIENT_INDEX, "patient_id", patient_id)
            .await?;

        analyses.retain(|a| owner.owns(&a.user_id));
        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(analyses)
    }
}
