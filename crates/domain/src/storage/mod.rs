//! Object storage for uploaded photos and rendered reports.
//!
//! Photos live under `photos/` and are read back by the analysis service
//! through their public URL. Reports live under `reports/` and only ever go
//! out through the API.

/// S3 adapter
pub mod s3;

pub use s3::S3ObjectStorage;

use async_trait::async_trait;
use derive_new::new;
use ulid::Ulid;

use crate::{photos::PhotoTag, Error};

pub const PDF: &str = "application/pdf";

/// Bytes with the content type they are stored under.
#[derive(new, Clone, Debug, Eq, PartialEq)]
pub struct Blob {
    pub bytes: Vec<u8>,
    #[new(into)]
    pub content_type: String,
}

impl Blob {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self::new(bytes, PDF)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/heic" => "heic",
            PDF => "pdf",
            _ => "jpg",
        }
    }
}

/// Bucket path for a freshly uploaded photo.
///
/// The ULID prefix is time-ordered and unique per call, so two uploads never
/// share a path even within the same millisecond.
pub fn photo_path(tag: PhotoTag, blob: &Blob) -> String {
    format!("photos/{}_{}.{}", Ulid::new(), tag, blob.extension())
}

/// Bucket path for a rendered report.
pub fn report_path() -> String {
    format!("reports/{}.pdf", Ulid::new())
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, path: &str, blob: &Blob) -> Result<(), Error>;

    /// Stored bytes at `path`; a missing object is an integrity error.
    async fn download(&self, path: &str) -> Result<Vec<u8>, Error>;

    fn public_url(&self, path: &str) -> String;
}
