use async_trait::async_trait;

use super::{Analysis, NewAnalysis};
use crate::{Error, Identity};

/// Analysis rows, always scoped to their owner.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn create(&self, owner: &Identity, input: NewAnalysis) -> Result<Analysis, Error>;

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Analysis>, Error>;

    /// Newest first.
    async fn list_for_patient(
        &self,
        owner: &Identity,
        patient_id: &str,
    ) -> Result<Vec<Analysis>, Error>;
}
