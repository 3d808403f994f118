use async_trait::async_trait;

use super::{NewPhoto, Photo, PhotoRepository};
use crate::{
    dynamo::{Table, PATIENT_INDEX},
    Error, Identity,
};

pub struct DynamoPhotoRepository {
    table: Table,
}

impl DynamoPhotoRepository {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

#[async_trait]
impl PhotoRepository for DynamoPhotoRepository {
    async fn create(&self, owner: &Identity, input: NewPhoto) -> Result<Photo, Error> {
        let photo = Photo::create(owner, input);
        self.table.put(&photo).await?;
        Ok(photo)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Photo>, Error> {
        let photo: Option<Photo> = self.table.get(id).await?;
        Ok(photo.filter(|p| owner.owns(&p.user_id)))
    }

    async fn recent_for_patient(
        &self,
        owner: &Identity,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<Photo>, Error> {
        let mut photos: Vec<Photo> = self
            .table
            .query(PATIENT_INDEX, "patient_id", patient_id)
            .await?;

        photos.retain(|p| owner.owns(&p.user_id));
        photos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        photos.truncate(limit);
        Ok(photos)
    }
}
