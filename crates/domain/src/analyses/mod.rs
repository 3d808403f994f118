/// Analysis model
pub mod model;

/// Input DTOs
pub mod inputs;

/// Storage port
pub mod repository;

/// DynamoDB adapter
pub mod dynamo;

/// Before/after photo lookup for reporting
pub mod resolve;

/// Upload, analyze, persist
pub mod workflow;

/// Read models
pub mod view;

pub use dynamo::DynamoAnalysisRepository;
pub use inputs::{EncodedImage, PatientSelection, SubmitAnalysisInput, Submission};
pub use model::{Analysis, AnalysisStatus, NewAnalysis, Procedure};
pub use repository::AnalysisRepository;
pub use view::{AnalysisSummary, AnalysisView};
pub use workflow::{SubmissionOutcome, SubmissionWarning};
