use std::sync::Arc;

use crate::{
    analyses::{AnalysisRepository, DynamoAnalysisRepository},
    config::Settings,
    dynamo::Table,
    patients::{DynamoPatientRepository, PatientRepository},
    photos::{DynamoPhotoRepository, PhotoRepository},
    remote::{AnalysisApi, Analyzer, ReportGenerator},
    storage::{ObjectStorage, S3ObjectStorage},
};

/// Every collaborator the clinic operations talk to.
#[derive(Clone)]
pub struct Services {
    pub patients: Arc<dyn PatientRepository>,
    pub photos: Arc<dyn PhotoRepository>,
    pub analyses: Arc<dyn AnalysisRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub analyzer: Arc<dyn Analyzer>,
    pub reports: Arc<dyn ReportGenerator>,
}

impl Services {
    /// Production wiring: DynamoDB tables, the S3 clinic bucket and the HTTP
    /// analysis service.
    pub fn aws(
        settings: &Settings,
        dynamodb_client: aws_sdk_dynamodb::Client,
        s3_client: aws_sdk_s3::Client,
    ) -> Self {
        let table = |name: &str| Table::new(dynamodb_client.clone(), name);
        let api = Arc::new(AnalysisApi::new(settings.analysis_api_url.clone()));

        Self {
            patients: Arc::new(DynamoPatientRepository::new(table(&settings.patients_table))),
            photos: Arc::new(DynamoPhotoRepository::new(table(&settings.photos_table))),
            analyses: Arc::new(DynamoAnalysisRepository::new(table(&settings.analyses_table))),
            storage: Arc::new(S3ObjectStorage::new(
                s3_client,
                settings.photos_bucket.clone(),
                settings.photos_public_url.clone(),
            )),
            analyzer: api.clone(),
            reports: api,
        }
    }
}
