//! Clinic Domain Models

/// Analyses and the submission workflow
pub mod analyses;

/// Environment settings
pub mod config;

/// DynamoDB table access
pub mod dynamo;

/// Domain errors
pub mod errors;

/// Authenticated caller
pub mod identity;

/// Patient registry
pub mod patients;

/// Photo rows
pub mod photos;

/// Remote analysis service
pub mod remote;

/// Collaborator wiring
pub mod services;

/// Photo and report objects
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::{Error, Service};
pub use identity::Identity;
pub use services::Services;
