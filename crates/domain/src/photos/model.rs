use std::fmt;

use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::Identity;

pub const ENTITY: &str = "Photo";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PhotoTag {
    Before,
    After,
}

impl PhotoTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoTag::Before => "before",
            PhotoTag::After => "after",
        }
    }
}

impl fmt::Display for PhotoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Photo {
    pub id: String,
    /// Absent on legacy rows; such photos cannot be used for a report.
    #[serde(default)]
    pub storage_path: Option<String>,
    pub photo_type: PhotoTag,
    pub user_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(new, Clone, Debug, Eq, PartialEq)]
pub struct NewPhoto {
    #[new(into)]
    pub storage_path: String,
    pub photo_type: PhotoTag,
    pub patient_id: Option<String>,
}

impl Photo {
    pub fn create(owner: &Identity, input: NewPhoto) -> Self {
        Self {
            id: Ulid::new().to_string(),
            storage_path: Some(input.storage_path),
            photo_type: input.photo_type,
            user_id: owner.user_id.clone(),
            patient_id: input.patient_id,
            created_at: Utc::now(),
        }
    }

    /// Storage path, treating an empty string like a missing one.
    pub fn path(&self) -> Option<&str> {
        self.storage_path.as_deref().filter(|p| !p.is_empty())
    }
}
