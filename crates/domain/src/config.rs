use std::env;

/// Runtime settings, read from the environment with local defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    pub patients_table: String,
    pub photos_table: String,
    pub analyses_table: String,
    pub photos_bucket: String,
    pub photos_public_url: String,
    pub analysis_api_url: String,
}

impl Settings {
    pub fn from_env() -> Self {
        let patients_table =
            env::var("DYNAMODB_PATIENTS_TABLE").unwrap_or("clinic-patients".to_string());

        let photos_table =
            env::var("DYNAMODB_PHOTOS_TABLE").unwrap_or("clinic-photos".to_string());

        let analyses_table =
            env::var("DYNAMODB_ANALYSES_TABLE").unwrap_or("clinic-analyses".to_string());

        let photos_bucket = env::var("PHOTOS_BUCKET").unwrap_or("clinic-photos".to_string());

        let photos_public_url = env::var("PHOTOS_PUBLIC_URL")
            .unwrap_or(format!("https://{}.s3.amazonaws.com", photos_bucket));

        let analysis_api_url =
            env::var("ANALYSIS_API_URL").unwrap_or("http://localhost:8000".to_string());

        Self {
            patients_table,
            photos_table,
            analyses_table,
            photos_bucket,
            photos_public_url: trim_base_url(&photos_public_url),
            analysis_api_url: trim_base_url(&analysis_api_url),
        }
    }
}

/// Drops trailing slashes so paths can be appended with a single `/`.
pub fn trim_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
