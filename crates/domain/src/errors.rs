use std::fmt;

use thiserror::Error;

/// External collaborator a dependency failure came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Service {
    Database,
    Storage,
    Analyzer,
    ReportGenerator,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Database => "database",
            Service::Storage => "storage",
            Service::Analyzer => "analyzer",
            Service::ReportGenerator => "report generator",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Entity not found: {entity}")]
    NotFound { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Displays the collaborator's own message so it can be shown as-is.
    #[error("{message}")]
    Dependency { service: Service, message: String },

    #[error("Integrity error: {message}")]
    Integrity { message: String },
}

impl Error {
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn dependency(service: Service, message: impl Into<String>) -> Self {
        Self::Dependency {
            service,
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}
