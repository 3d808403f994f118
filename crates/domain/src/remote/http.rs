use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::{Analyzer, GeneratedReport, ReportGenerator};
use crate::{analyses::Procedure, Error, Service};

const ANALYZE_FAILED: &str = "Image analysis failed";
const REPORT_FAILED: &str = "Report generation failed";

/// HTTP client for the analysis service (`/api/analyze`, `/api/generate-pdf`).
pub struct AnalysisApi {
    client: reqwest::Client,
    api_url: String,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    before_image_url: &'a str,
    after_image_url: &'a str,
    procedures: &'a [Procedure],
}

#[derive(Serialize)]
struct ReportRequest<'a> {
    before_url: &'a str,
    after_url: &'a str,
    analysis_results: &'a Value,
}

#[derive(Deserialize)]
struct ReportBody {
    pdf_base64: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

impl AnalysisApi {
    /// `api_url` is the service root without a trailing slash.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        service: Service,
        fallback: &str,
    ) -> Result<T, Error> {
        let response = self
            .client
            .post(format!("{}{}", self.api_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::dependency(service, e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::dependency(service, e.to_string()))?;

        if !status.is_success() {
            tracing::warn!("{} returned HTTP {}", service, status.as_u16());
            return Err(Error::dependency(service, detail_message(&bytes, fallback)));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| Error::dependency(service, format!("{}: {}", fallback, e)))
    }
}

#[async_trait]
impl Analyzer for AnalysisApi {
    async fn analyze(
        &self,
        before_url: &str,
        after_url: &str,
        procedures: &[Procedure],
    ) -> Result<Value, Error> {
        let request = AnalyzeRequest {
            before_image_url: before_url,
            after_image_url: after_url,
            procedures,
        };

        let body: Value = self
            .post("/api/analyze", &request, Service::Analyzer, ANALYZE_FAILED)
            .await?;

        Ok(unwrap_envelope(body))
    }
}

#[async_trait]
impl ReportGenerator for AnalysisApi {
    async fn generate(
        &self,
        before_url: &str,
        after_url: &str,
        results: &Value,
    ) -> Result<GeneratedReport, Error> {
        let request = ReportRequest {
            before_url,
            after_url,
            analysis_results: results,
        };

        let body: ReportBody = self
            .post("/api/generate-pdf", &request, Service::ReportGenerator, REPORT_FAILED)
            .await?;

        decode_report(&body.pdf_base64).map(GeneratedReport::new)
    }
}

/// The `detail` of an error body, or `fallback` when there is none.
fn detail_message(body: &[u8], fallback: &str) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn decode_report(encoded: &str) -> Result<Vec<u8>, Error> {
    let report_error = |reason: String| {
        Error::dependency(Service::ReportGenerator, format!("{}: {}", REPORT_FAILED, reason))
    };

    let pdf = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| report_error(e.to_string()))?;
    if pdf.is_empty() {
        return Err(report_error("empty report".to_string()));
    }

    Ok(pdf)
}

/// The service answers `{success, analysis, raw_response}`; only `analysis`
/// is the result. Bodies without that envelope are taken whole.
fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.get("analysis").is_some_and(Value::is_object) => {
            map.remove("analysis").unwrap_or_default()
        }
        other => other,
    }
}
