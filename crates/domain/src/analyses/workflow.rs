//! Analysis submission: patient, photos, remote analysis, report, record.
//!
//! Every collaborator call is awaited in sequence. Nothing is rolled back when
//! a later step fails, so an error says nothing about whether photos, their
//! rows or the report object were already stored. The analysis row only
//! carries the report's object key; the PDF itself never goes to the table. Photo rows are best-effort: a failed insert is
//! reported as a warning and the recency lookup in [`super::resolve`] covers
//! for the missing id.

use serde::Serialize;

use super::{
    resolve::{self, RecordedPhotos, ResolutionPath},
    NewAnalysis, PatientSelection, Submission,
};
use crate::{
    patients::{self, NewPatient},
    photos::{NewPhoto, PhotoTag},
    storage::{photo_path, report_path, Blob},
    Error, Identity, Services,
};

/// Non-fatal problem met while submitting.
#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubmissionWarning {
    /// The blob was uploaded but its photo row could not be written
    PhotoNotRecorded { photo_type: PhotoTag, message: String },
    /// Report photos were picked by recency instead of by id
    PhotosResolvedByRecency,
}

#[derive(Clone, Debug, Serialize, Eq, PartialEq)]
pub struct SubmissionOutcome {
    pub analysis_id: String,
    pub warnings: Vec<SubmissionWarning>,
}

struct Uploaded {
    path: String,
    url: String,
}

impl Services {
    /// Runs a submission for `identity` and returns the stored analysis id.
    pub async fn submit(
        &self,
        identity: &Identity,
        submission: Submission,
    ) -> Result<SubmissionOutcome, Error> {
        submission.validate()?;
        let procedures = submission.distinct_procedures();
        let mut warnings = Vec::new();

        let patient_id = self.resolve_patient(identity, &submission.patient).await?;

        let before = self.upload(PhotoTag::Before, &submission.before).await?;
        let after = self.upload(PhotoTag::After, &submission.after).await?;

        let recorded = RecordedPhotos {
            before: self
                .record_photo(identity, &patient_id, PhotoTag::Before, &before, &mut warnings)
                .await,
            after: self
                .record_photo(identity, &patient_id, PhotoTag::After, &after, &mut warnings)
                .await,
        };

        tracing::info!(
            "Analyzing photos of patient {} for {} procedure(s)",
            patient_id,
            procedures.len()
        );
        let results = self
            .analyzer
            .analyze(&before.url, &after.url, &procedures)
            .await?;

        let pair = resolve::resolve_pair(
            self.photos.as_ref(),
            self.storage.as_ref(),
            identity,
            &patient_id,
            &recorded,
        )
        .await?;
        if pair.path == ResolutionPath::Recency {
            warnings.push(SubmissionWarning::PhotosResolvedByRecency);
        }

        tracing::info!("Generating report for patient {}", patient_id);
        let report = self
            .reports
            .generate(&pair.before.url, &pair.after.url, &results)
            .await?;

        let report_path = report_path();
        self.storage
            .upload(&report_path, &Blob::pdf(report.pdf))
            .await?;

        let analysis = self
            .analyses
            .create(
                identity,
                NewAnalysis {
                    patient_id,
                    before_photo_id: Some(pair.before.id),
                    after_photo_id: Some(pair.after.id),
                    procedures,
                    results,
                    report_path,
                },
            )
            .await?;

        tracing::info!(
            "Analysis {} completed with {} warning(s)",
            analysis.id,
            warnings.len()
        );

        Ok(SubmissionOutcome {
            analysis_id: analysis.id,
            warnings,
        })
    }

    async fn resolve_patient(
        &self,
        identity: &Identity,
        selection: &PatientSelection,
    ) -> Result<String, Error> {
        match selection {
            PatientSelection::Existing(id) => {
                let patient = patients::find(self.patients.as_ref(), identity, id.trim()).await?;
                Ok(patient.id)
            }
            PatientSelection::New { name } => {
                let patient =
                    patients::register(self.patients.as_ref(), identity, NewPatient::named(name))
                        .await?;
                Ok(patient.id)
            }
        }
    }

    async fn upload(&self, tag: PhotoTag, blob: &Blob) -> Result<Uploaded, Error> {
        let path = photo_path(tag, blob);
        self.storage.upload(&path, blob).await?;

        Ok(Uploaded {
            url: self.storage.public_url(&path),
            path,
        })
    }

    /// Writes the photo row, turning a failure into a warning.
    async fn record_photo(
        &self,
        identity: &Identity,
        patient_id: &str,
        tag: PhotoTag,
        uploaded: &Uploaded,
        warnings: &mut Vec<SubmissionWarning>,
    ) -> Option<String> {
        let input = NewPhoto::new(uploaded.path.clone(), tag, Some(patient_id.to_string()));

        match self.photos.create(identity, input).await {
            Ok(photo) => Some(photo.id),
            Err(err) => {
                tracing::warn!("Could not record {} photo {}: {}", tag, uploaded.path, err);
                warnings.push(SubmissionWarning::PhotoNotRecorded {
                    photo_type: tag,
                    message: err.to_string(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analyses::Procedure,
        errors::Service,
        patients::PatientRepository,
        storage::ObjectStorage,
        testing::{Call, TestBed, REPORT_PDF},
    };
    use assert_matches::assert_matches;
    use serde_json::json;

    fn images() -> (Blob, Blob) {
        (Blob::jpeg(vec![0xff, 0xd8, 0x01]), Blob::jpeg(vec![0xff, 0xd8, 0x02]))
    }

    fn submission(patient: PatientSelection, procedures: Vec<Procedure>) -> Submission {
        let (before, after) = images();
        Submission {
            patient,
            before,
            after,
            procedures,
        }
    }

    fn existing(id: &str) -> PatientSelection {
        PatientSelection::Existing(id.to_string())
    }

    fn new_patient(name: &str) -> PatientSelection {
        PatientSelection::New {
            name: name.to_string(),
        }
    }

    /// Registers a patient for `user-1` and forgets the calls it took.
    async fn registered(bed: &TestBed) -> String {
        let patient = bed
            .patients
            .create(&Identity::new("user-1"), NewPatient::named("Joana Lima"))
            .await
            .unwrap();
        bed.journal.clear();
        patient.id
    }

    #[tokio::test]
    async fn new_patient_end_to_end() {
        let bed = TestBed::new();
        let identity = Identity::new("user-1");

        let outcome = bed
            .services()
            .submit(&identity, submission(new_patient("Maria Silva"), vec![Procedure::Botox]))
            .await
            .unwrap();

        assert!(outcome.warnings.is_empty());

        let analysis = bed.analyses.row(&outcome.analysis_id).unwrap();
        let patient = bed.patients.rows().pop().unwrap();
        assert_eq!(patient.name, "Maria Silva");
        assert_eq!(patient.user_id, "user-1");
        assert_eq!(analysis.patient_id, patient.id);
        assert_eq!(serde_json::to_value(analysis.status).unwrap(), json!("completed"));
        assert!(analysis.before_photo_id.is_some());
        assert!(analysis.after_photo_id.is_some());
        assert_eq!(analysis.procedures, [Procedure::Botox]);

        let photos = bed.photos.rows();
        assert_eq!(photos.len(), 2);
        assert!(photos.iter().all(|p| p.patient_id.as_deref() == Some(patient.id.as_str())));
        // two photos and the report
        assert_eq!(bed.storage.paths().len(), 3);
    }

    #[tokio::test]
    async fn report_is_stored_as_an_object_and_referenced_by_key() {
        let bed = TestBed::new();
        let identity = Identity::new("user-1");
        let patient_id = registered(&bed).await;

        let outcome = bed
            .services()
            .submit(&identity, submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap();

        let analysis = bed.analyses.row(&outcome.analysis_id).unwrap();
        assert!(analysis.report_path.starts_with("reports/"));

        let report = bed.storage.object(&analysis.report_path).unwrap();
        assert_eq!(report.bytes, REPORT_PDF);
        assert_eq!(report.content_type, "application/pdf");

        // the row holds the key only
        let row = serde_json::to_string(&analysis).unwrap();
        assert!(!row.contains("JVBERi0"));
        assert!(!row.contains("%PDF"));

        let pdf = bed
            .services()
            .report_pdf(&identity, &outcome.analysis_id)
            .await
            .unwrap();
        assert_eq!(pdf, REPORT_PDF);
    }

    #[tokio::test]
    async fn calls_run_in_order() {
        let bed = TestBed::new();

        bed.services()
            .submit(
                &Identity::new("user-1"),
                submission(new_patient("Maria Silva"), vec![Procedure::Botox]),
            )
            .await
            .unwrap();

        assert_eq!(
            bed.journal.calls(),
            [
                Call::CreatePatient,
                Call::Upload(PhotoTag::Before),
                Call::Upload(PhotoTag::After),
                Call::CreatePhoto(PhotoTag::Before),
                Call::CreatePhoto(PhotoTag::After),
                Call::Analyze,
                Call::GetPhoto,
                Call::GetPhoto,
                Call::GenerateReport,
                Call::UploadReport,
                Call::CreateAnalysis,
            ]
        );
    }

    #[tokio::test]
    async fn existing_patient_is_looked_up_before_uploading() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;

        bed.services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap();

        let calls = bed.journal.calls();
        assert_eq!(calls[..2], [Call::GetPatient, Call::Upload(PhotoTag::Before)]);
        assert!(!calls.contains(&Call::CreatePatient));
    }

    #[tokio::test]
    async fn foreign_patient_is_rejected_without_side_effects() {
        let bed = TestBed::new();
        let alice = bed
            .patients
            .create(&Identity::new("alice"), NewPatient::named("Maria Silva"))
            .await
            .unwrap();
        bed.journal.clear();

        let err = bed
            .services()
            .submit(&Identity::new("bob"), submission(existing(&alice.id), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        assert_matches!(err, Error::NotFound { entity } if entity == "Patient");
        assert_eq!(bed.journal.calls(), [Call::GetPatient]);
        assert!(bed.storage.paths().is_empty());
        assert!(bed.analyses.rows().is_empty());
    }

    #[tokio::test]
    async fn unknown_patient_is_rejected_without_side_effects() {
        let bed = TestBed::new();

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing("ghost"), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        assert_matches!(err, Error::NotFound { .. });
        assert!(bed.storage.paths().is_empty());
        assert!(bed.photos.rows().is_empty());
        assert!(bed.analyses.rows().is_empty());
    }

    #[tokio::test]
    async fn empty_images_issue_no_calls() {
        let bed = TestBed::new();
        let mut s = submission(existing("P1"), vec![Procedure::Botox]);
        s.before = Blob::jpeg(Vec::new());
        s.after = Blob::jpeg(Vec::new());

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), s)
            .await
            .unwrap_err();

        assert_matches!(err, Error::Validation { .. });
        assert!(bed.journal.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_procedures_issue_no_calls() {
        let bed = TestBed::new();

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing("P1"), Vec::new()))
            .await
            .unwrap_err();

        assert_matches!(err, Error::Validation { .. });
        assert!(bed.journal.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_patient_creation_uploads_nothing() {
        let bed = TestBed::new();
        bed.patients.fail_with("insert denied");

        let err = bed
            .services()
            .submit(
                &Identity::new("user-1"),
                submission(new_patient("Maria Silva"), vec![Procedure::Botox]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "insert denied");
        assert!(bed.storage.paths().is_empty());
        assert_eq!(bed.journal.calls(), [Call::CreatePatient]);
    }

    #[tokio::test]
    async fn failed_upload_leaves_no_rows() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.storage.fail_on(PhotoTag::After, "bucket unavailable");

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Peeling]))
            .await
            .unwrap_err();

        assert_matches!(err, Error::Dependency { service: Service::Storage, .. });
        assert!(bed.photos.rows().is_empty());
        assert!(bed.analyses.rows().is_empty());
        // the before blob stays in the bucket
        assert_eq!(bed.storage.paths().len(), 1);
        assert!(!bed.journal.calls().contains(&Call::Analyze));
    }

    #[tokio::test]
    async fn failed_photo_rows_still_reach_the_analyzer() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.photos.fail_with("photos table throttled");

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        // no rows at all, so the recency lookup finds nothing either
        assert_matches!(err, Error::Integrity { .. });
        assert!(bed.journal.calls().contains(&Call::Analyze));
        assert!(bed.journal.calls().contains(&Call::RecentPhotos));
        assert!(!bed.journal.calls().contains(&Call::GenerateReport));
        assert!(bed.analyses.rows().is_empty());
    }

    #[tokio::test]
    async fn one_failed_photo_row_recovers_through_recency() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        // an after photo from an earlier visit is the only one on record
        bed.photos.seed(
            &Identity::new("user-1"),
            NewPhoto::new("photos/older_after.jpg", PhotoTag::After, Some(patient_id.clone())),
        );
        bed.photos.fail_on(PhotoTag::After, "conditional check failed");

        let outcome = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap();

        assert_eq!(
            outcome.warnings,
            [
                SubmissionWarning::PhotoNotRecorded {
                    photo_type: PhotoTag::After,
                    message: "conditional check failed".to_string(),
                },
                SubmissionWarning::PhotosResolvedByRecency,
            ]
        );
        assert!(bed.journal.calls().contains(&Call::Analyze));

        let analysis = bed.analyses.row(&outcome.analysis_id).unwrap();
        let report_urls = bed.reports.last_urls().unwrap();
        assert!(report_urls.1.ends_with("photos/older_after.jpg"));
        assert!(analysis.after_photo_id.is_some());
    }

    #[tokio::test]
    async fn analyzer_detail_is_reported_verbatim() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.analyzer.fail_with("quota exceeded");

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "quota exceeded");
        assert!(bed.analyses.rows().is_empty());
        assert!(!bed.journal.calls().contains(&Call::GenerateReport));
        // photos were already stored
        assert_eq!(bed.photos.rows().len(), 2);
    }

    #[tokio::test]
    async fn report_failure_stores_no_analysis() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.reports.fail_with("renderer crashed");

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        assert_matches!(err, Error::Dependency { service: Service::ReportGenerator, .. });
        assert!(bed.analyses.rows().is_empty());
        assert!(!bed.journal.calls().contains(&Call::UploadReport));
    }

    #[tokio::test]
    async fn report_upload_failure_stores_no_analysis() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.storage.fail_reports_with("bucket unavailable");

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        assert_matches!(err, Error::Dependency { service: Service::Storage, .. });
        assert!(bed.analyses.rows().is_empty());
        assert!(!bed.journal.calls().contains(&Call::CreateAnalysis));
    }

    #[tokio::test]
    async fn analysis_insert_failure_keeps_photos() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.analyses.fail_with("analyses table missing");

        let err = bed
            .services()
            .submit(&Identity::new("user-1"), submission(existing(&patient_id), vec![Procedure::Botox]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "analyses table missing");
        assert_eq!(bed.photos.rows().len(), 2);
        // both photos and the orphaned report
        assert_eq!(bed.storage.paths().len(), 3);
    }

    #[tokio::test]
    async fn procedures_and_results_round_trip_unchanged() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;
        bed.analyzer.respond_with(json!({"score": 7}));
        let identity = Identity::new("user-1");

        let outcome = bed
            .services()
            .submit(
                &identity,
                submission(existing(&patient_id), vec![Procedure::Botox, Procedure::Peeling]),
            )
            .await
            .unwrap();

        let stored = bed
            .services()
            .analyses
            .get(&identity, &outcome.analysis_id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(stored.procedures, [Procedure::Botox, Procedure::Peeling]);
        assert_eq!(stored.results, json!({"score": 7}));
        assert_eq!(bed.reports.last_results(), Some(json!({"score": 7})));
    }

    #[tokio::test]
    async fn analyzer_receives_public_urls_of_uploaded_photos() {
        let bed = TestBed::new();
        let patient_id = registered(&bed).await;

        bed.services()
            .submit(
                &Identity::new("user-1"),
                submission(
                    existing(&patient_id),
                    vec![Procedure::Botox, Procedure::Peeling, Procedure::Botox],
                ),
            )
            .await
            .unwrap();

        assert_eq!(bed.analyzer.last_procedures(), [Procedure::Botox, Procedure::Peeling]);
        let paths = bed.storage.paths();
        let (before_url, after_url) = bed.analyzer.last_urls().unwrap();
        assert_eq!(before_url, bed.storage.public_url(&paths[0]));
        assert_eq!(after_url, bed.storage.public_url(&paths[1]));
        assert!(paths[0].contains("_before."));
        assert!(paths[1].contains("_after."));
    }
}
