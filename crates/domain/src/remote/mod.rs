//! Remote image-analysis and report-rendering service.

/// reqwest client for the analysis service
pub mod http;

pub use http::AnalysisApi;

use async_trait::async_trait;
use derive_new::new;
use serde_json::Value;

use crate::{analyses::Procedure, Error};

/// Rendered PDF, already decoded from the wire.
#[derive(new, Clone, Debug, Eq, PartialEq)]
pub struct GeneratedReport {
    pub pdf: Vec<u8>,
}

/// Compares a before/after pair for the given procedures.
///
/// The returned JSON is opaque to this crate and is stored as-is.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        before_url: &str,
        after_url: &str,
        procedures: &[Procedure],
    ) -> Result<Value, Error>;
}

/// Renders the clinic PDF for an analyzed pair.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(
        &self,
        before_url: &str,
        after_url: &str,
        results: &Value,
    ) -> Result<GeneratedReport, Error>;
}
