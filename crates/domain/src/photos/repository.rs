use async_trait::async_trait;

use super::{NewPhoto, Photo};
use crate::{Error, Identity};

/// Photo metadata rows, always scoped to their owner.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create(&self, owner: &Identity, input: NewPhoto) -> Result<Photo, Error>;

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Photo>, Error>;

    /// The `limit` most recently created photos of a patient, newest first.
    async fn recent_for_patient(
        &self,
        owner: &Identity,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<Photo>, Error>;
}
