use async_trait::async_trait;

use super::{NewPatient, Patient, PatientRepository};
use crate::{
    dynamo::{Table, USER_INDEX},
    Error, Identity,
};

pub struct DynamoPatientRepository {
    table: Table,
}

impl DynamoPatientRepository {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

#[async_trait]
impl PatientRepository for DynamoPatientRepository {
    async fn create(&self, owner: &Identity, input: NewPatient) -> Result<Patient, Error> {
        let patient = Patient::create(owner, input);
        self.table.put(&patient).await?;
        Ok(patient)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Patient>, Error> {
        let patient: Option<Patient> = self.table.get(id).await?;
        Ok(patient.filter(|p| owner.owns(&p.user_id)))
    }

    async fn list(&self, owner: &Identity, limit: Option<usize>) -> Result<Vec<Patient>, Error> {
        let mut patients: Vec<Patient> =
            self.table.query(USER_INDEX, "user_id", &owner.user_id).await?;

        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            patients.truncate(limit);
        }
        Ok(patients)
    }
}
