use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream};

use super::{Blob, ObjectStorage};
use crate::{Error, Service};

/// Clinic bucket on S3; photos are served publicly from `public_url`.
pub struct S3ObjectStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_url: String,
}

impl S3ObjectStorage {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_url: public_url.into(),
        }
    }
}

fn storage_error<E: std::error::Error>(err: E) -> Error {
    Error::dependency(Service::Storage, DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn upload(&self, path: &str, blob: &Blob) -> Result<(), Error> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(&blob.content_type)
            .body(ByteStream::from(blob.bytes.clone()))
            .send()
            .await
            .map_err(storage_error)?;

        tracing::info!("Uploaded s3://{}/{}", self.bucket, path);
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, Error> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|s| s.is_no_such_key()) {
                    Error::integrity(format!("object {} is missing", path))
                } else {
                    storage_error(e)
                }
            })?;

        let bytes = output.body.collect().await.map_err(storage_error)?;
        Ok(bytes.into_bytes().to_vec())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, path)
    }
}
