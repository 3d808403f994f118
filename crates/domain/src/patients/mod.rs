/// Patient model
pub mod model;

/// Input DTOs
pub mod inputs;

/// Storage port
pub mod repository;

/// DynamoDB adapter
pub mod dynamo;

pub use dynamo::DynamoPatientRepository;
pub use inputs::NewPatient;
pub use model::Patient;
pub use repository::PatientRepository;

use crate::{Error, Identity};

/// Validates and stores a new patient owned by `owner`.
pub async fn register(
    repo: &dyn PatientRepository,
    owner: &Identity,
    input: NewPatient,
) -> Result<Patient, Error> {
    let input = input.normalized()?;
    let patient = repo.create(owner, input).await?;

    tracing::info!("Patient {} registered", patient.id);
    Ok(patient)
}

/// Loads one of `owner`'s patients.
pub async fn find(
    repo: &dyn PatientRepository,
    owner: &Identity,
    id: &str,
) -> Result<Patient, Error> {
    repo.get(owner, id)
        .await?
        .ok_or_else(|| Error::not_found(model::ENTITY))
}
