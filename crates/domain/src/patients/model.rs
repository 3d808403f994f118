use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use super::NewPatient;
use crate::Identity;

pub const ENTITY: &str = "Patient";

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct Patient {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// Stamps a fresh id, owner and creation time onto `input`.
    pub fn create(owner: &Identity, input: NewPatient) -> Self {
        Self {
            id: Ulid::new().to_string(),
            name: input.name,
            email: input.email,
            phone: input.phone,
            gender: input.gender,
            user_id: owner.user_id.clone(),
            created_at: Utc::now(),
        }
    }
}
