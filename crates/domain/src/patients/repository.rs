use async_trait::async_trait;

use super::{NewPatient, Patient};
use crate::{Error, Identity};

/// Patient rows, always scoped to their owner.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn create(&self, owner: &Identity, input: NewPatient) -> Result<Patient, Error>;

    /// `None` when the patient is missing or belongs to someone else.
    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Patient>, Error>;

    /// Newest first.
    async fn list(&self, owner: &Identity, limit: Option<usize>) -> Result<Vec<Patient>, Error>;
}
