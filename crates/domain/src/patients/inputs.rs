use serde::{Deserialize, Serialize};

use crate::Error;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct NewPatient {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl NewPatient {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Trims every field; blank contact fields become absent.
    pub fn normalized(self) -> Result<Self, Error> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("Patient name is required"));
        }

        Ok(Self {
            name,
            email: non_blank(self.email),
            phone: non_blank(self.phone),
            gender: non_blank(self.gender),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
