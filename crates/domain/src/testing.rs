//! In-memory collaborators for tests.
//!
//! Every fake writes to a shared [`Journal`] so tests can assert which calls
//! were issued, and in what order. Rows are returned newest first by
//! insertion order, so tests do not depend on clock resolution.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    analyses::{Analysis, AnalysisRepository, NewAnalysis, Procedure},
    patients::{NewPatient, Patient, PatientRepository},
    photos::{NewPhoto, Photo, PhotoRepository, PhotoTag},
    remote::{Analyzer, GeneratedReport, ReportGenerator},
    storage::{Blob, ObjectStorage},
    Error, Identity, Service, Services,
};

/// Minimal PDF header, returned by [`StubReportGenerator`].
pub const REPORT_PDF: &[u8] = b"%PDF-1.4";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    CreatePatient,
    GetPatient,
    ListPatients,
    Upload(PhotoTag),
    UploadReport,
    Download,
    CreatePhoto(PhotoTag),
    GetPhoto,
    RecentPhotos,
    Analyze,
    GenerateReport,
    CreateAnalysis,
    GetAnalysis,
    ListAnalyses,
}

#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// Scripted failure, optionally limited to one photo tag.
#[derive(Debug, Default)]
struct Failure(Mutex<Option<(Option<PhotoTag>, String)>>);

impl Failure {
    fn set(&self, tag: Option<PhotoTag>, message: &str) {
        *self.0.lock().unwrap() = Some((tag, message.to_string()));
    }

    fn check(&self, tag: Option<PhotoTag>, service: Service) -> Result<(), Error> {
        match &*self.0.lock().unwrap() {
            Some((None, message)) => Err(Error::dependency(service, message.clone())),
            Some((Some(only), message)) if Some(*only) == tag => {
                Err(Error::dependency(service, message.clone()))
            }
            _ => Ok(()),
        }
    }
}

fn newest_first<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().rev().filter(|r| keep(r)).cloned().collect()
}

#[derive(Debug, Default)]
pub struct MemoryPatientRepository {
    journal: Journal,
    rows: Mutex<Vec<Patient>>,
    failure: Failure,
}

impl MemoryPatientRepository {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    /// Makes every later insert fail with `message`.
    pub fn fail_with(&self, message: &str) {
        self.failure.set(None, message);
    }

    pub fn rows(&self) -> Vec<Patient> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl PatientRepository for MemoryPatientRepository {
    async fn create(&self, owner: &Identity, input: NewPatient) -> Result<Patient, Error> {
        self.journal.record(Call::CreatePatient);
        self.failure.check(None, Service::Database)?;

        let patient = Patient::create(owner, input);
        self.rows.lock().unwrap().push(patient.clone());
        Ok(patient)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Patient>, Error> {
        self.journal.record(Call::GetPatient);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|p| p.id == id && owner.owns(&p.user_id))
            .cloned())
    }

    async fn list(&self, owner: &Identity, limit: Option<usize>) -> Result<Vec<Patient>, Error> {
        self.journal.record(Call::ListPatients);
        let mut patients = newest_first(&self.rows.lock().unwrap(), |p| owner.owns(&p.user_id));
        if let Some(limit) = limit {
            patients.truncate(limit);
        }
        Ok(patients)
    }
}

#[derive(Debug, Default)]
pub struct MemoryPhotoRepository {
    journal: Journal,
    rows: Mutex<Vec<Photo>>,
    failure: Failure,
}

impl MemoryPhotoRepository {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn fail_with(&self, message: &str) {
        self.failure.set(None, message);
    }

    /// Makes later inserts of `tag` photos fail with `message`.
    pub fn fail_on(&self, tag: PhotoTag, message: &str) {
        self.failure.set(Some(tag), message);
    }

    /// Stores a row directly, bypassing the journal and scripted failures.
    pub fn seed(&self, owner: &Identity, input: NewPhoto) -> Photo {
        let photo = Photo::create(owner, input);
        self.rows.lock().unwrap().push(photo.clone());
        photo
    }

    pub fn rows(&self) -> Vec<Photo> {
        self.rows.lock().unwrap().clone()
    }

    pub fn recency_queries(&self) -> usize {
        self.journal
            .calls()
            .iter()
            .filter(|c| **c == Call::RecentPhotos)
            .count()
    }
}

#[async_trait]
impl PhotoRepository for MemoryPhotoRepository {
    async fn create(&self, owner: &Identity, input: NewPhoto) -> Result<Photo, Error> {
        self.journal.record(Call::CreatePhoto(input.photo_type));
        self.failure.check(Some(input.photo_type), Service::Database)?;

        let photo = Photo::create(owner, input);
        self.rows.lock().unwrap().push(photo.clone());
        Ok(photo)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Photo>, Error> {
        self.journal.record(Call::GetPhoto);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|p| p.id == id && owner.owns(&p.user_id))
            .cloned())
    }

    async fn recent_for_patient(
        &self,
        owner: &Identity,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<Photo>, Error> {
        self.journal.record(Call::RecentPhotos);
        let mut photos = newest_first(&self.rows.lock().unwrap(), |p| {
            owner.owns(&p.user_id) && p.patient_id.as_deref() == Some(patient_id)
        });
        photos.truncate(limit);
        Ok(photos)
    }
}

#[derive(Debug, Default)]
pub struct MemoryAnalysisRepository {
    journal: Journal,
    rows: Mutex<Vec<Analysis>>,
    failure: Failure,
}

impl MemoryAnalysisRepository {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn fail_with(&self, message: &str) {
        self.failure.set(None, message);
    }

    pub fn rows(&self) -> Vec<Analysis> {
        self.rows.lock().unwrap().clone()
    }

    pub fn row(&self, id: &str) -> Option<Analysis> {
        self.rows().into_iter().find(|a| a.id == id)
    }
}

#[async_trait]
impl AnalysisRepository for MemoryAnalysisRepository {
    async fn create(&self, owner: &Identity, input: NewAnalysis) -> Result<Analysis, Error> {
        self.journal.record(Call::CreateAnalysis);
        self.failure.check(None, Service::Database)?;

        let analysis = Analysis::create(owner, input);
        self.rows.lock().unwrap().push(analysis.clone());
        Ok(analysis)
    }

    async fn get(&self, owner: &Identity, id: &str) -> Result<Option<Analysis>, Error> {
        self.journal.record(Call::GetAnalysis);
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|a| a.id == id && owner.owns(&a.user_id))
            .cloned())
    }

    async fn list_for_patient(
        &self,
        owner: &Identity,
        patient_id: &str,
    ) -> Result<Vec<Analysis>, Error> {
        self.journal.record(Call::ListAnalyses);
        Ok(newest_first(&self.rows.lock().unwrap(), |a| {
            owner.owns(&a.user_id) && a.patient_id == patient_id
        }))
    }
}

#[derive(Debug, Default)]
pub struct MemoryObjectStorage {
    journal: Journal,
    objects: Mutex<Vec<(String, Blob)>>,
    failure: Failure,
    report_failure: Failure,
}

impl MemoryObjectStorage {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn fail_with(&self, message: &str) {
        self.failure.set(None, message);
    }

    /// Makes later uploads of `tag` photos fail with `message`.
    pub fn fail_on(&self, tag: PhotoTag, message: &str) {
        self.failure.set(Some(tag), message);
    }

    /// Makes later report uploads fail with `message`.
    pub fn fail_reports_with(&self, message: &str) {
        self.report_failure.set(None, message);
    }

    /// Uploaded paths in upload order.
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn object(&self, path: &str) -> Option<Blob> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, blob)| blob.clone())
    }
}

/// Photo tag encoded in a photo path; `None` for reports.
fn tag_of(path: &str) -> Option<PhotoTag> {
    if path.contains("_after.") {
        Some(PhotoTag::After)
    } else if path.contains("_before.") {
        Some(PhotoTag::Before)
    } else {
        None
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, path: &str, blob: &Blob) -> Result<(), Error> {
        let tag = tag_of(path);
        match tag {
            Some(tag) => self.journal.record(Call::Upload(tag)),
            None => {
                self.journal.record(Call::UploadReport);
                self.report_failure.check(None, Service::Storage)?;
            }
        }
        self.failure.check(tag, Service::Storage)?;

        self.objects
            .lock()
            .unwrap()
            .push((path.to_string(), blob.clone()));
        Ok(())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, Error> {
        self.journal.record(Call::Download);
        self.object(path)
            .map(|blob| blob.bytes)
            .ok_or_else(|| Error::integrity(format!("object {} is missing", path)))
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://photos.test/{}", path)
    }
}

#[derive(Debug)]
pub struct StubAnalyzer {
    journal: Journal,
    response: Mutex<Value>,
    failure: Failure,
    last_urls: Mutex<Option<(String, String)>>,
    last_procedures: Mutex<Vec<Procedure>>,
}

impl Default for StubAnalyzer {
    fn default() -> Self {
        Self::with_journal(Journal::default())
    }
}

impl StubAnalyzer {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            response: Mutex::new(json!({"score": 7, "summary": "visible improvement"})),
            failure: Failure::default(),
            last_urls: Mutex::new(None),
            last_procedures: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, results: Value) {
        *self.response.lock().unwrap() = results;
    }

    /// Fails like the service does, with `detail` as the message.
    pub fn fail_with(&self, detail: &str) {
        self.failure.set(None, detail);
    }

    pub fn last_urls(&self) -> Option<(String, String)> {
        self.last_urls.lock().unwrap().clone()
    }

    pub fn last_procedures(&self) -> Vec<Procedure> {
        self.last_procedures.lock().unwrap().clone()
    }
}

#[async_trait]
impl Analyzer for StubAnalyzer {
    async fn analyze(
        &self,
        before_url: &str,
        after_url: &str,
        procedures: &[Procedure],
    ) -> Result<Value, Error> {
        self.journal.record(Call::Analyze);
        *self.last_urls.lock().unwrap() = Some((before_url.to_string(), after_url.to_string()));
        *self.last_procedures.lock().unwrap() = procedures.to_vec();
        self.failure.check(None, Service::Analyzer)?;

        Ok(self.response.lock().unwrap().clone())
    }
}

#[derive(Debug, Default)]
pub struct StubReportGenerator {
    journal: Journal,
    failure: Failure,
    last: Mutex<Option<(String, String, Value)>>,
}

impl StubReportGenerator {
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    pub fn fail_with(&self, detail: &str) {
        self.failure.set(None, detail);
    }

    pub fn last_urls(&self) -> Option<(String, String)> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(before, after, _)| (before.clone(), after.clone()))
    }

    pub fn last_results(&self) -> Option<Value> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(_, _, results)| results.clone())
    }
}

#[async_trait]
impl ReportGenerator for StubReportGenerator {
    async fn generate(
        &self,
        before_url: &str,
        after_url: &str,
        results: &Value,
    ) -> Result<GeneratedReport, Error> {
        self.journal.record(Call::GenerateReport);
        *self.last.lock().unwrap() =
            Some((before_url.to_string(), after_url.to_string(), results.clone()));
        self.failure.check(None, Service::ReportGenerator)?;

        Ok(GeneratedReport::new(REPORT_PDF.to_vec()))
    }
}

/// All fakes sharing one journal.
pub struct TestBed {
    pub journal: Journal,
    pub patients: Arc<MemoryPatientRepository>,
    pub photos: Arc<MemoryPhotoRepository>,
    pub analyses: Arc<MemoryAnalysisRepository>,
    pub storage: Arc<MemoryObjectStorage>,
    pub analyzer: Arc<StubAnalyzer>,
    pub reports: Arc<StubReportGenerator>,
}

impl Default for TestBed {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBed {
    pub fn new() -> Self {
        let journal = Journal::default();

        Self {
            patients: Arc::new(MemoryPatientRepository::with_journal(journal.clone())),
            photos: Arc::new(MemoryPhotoRepository::with_journal(journal.clone())),
            analyses: Arc::new(MemoryAnalysisRepository::with_journal(journal.clone())),
            storage: Arc::new(MemoryObjectStorage::with_journal(journal.clone())),
            analyzer: Arc::new(StubAnalyzer::with_journal(journal.clone())),
            reports: Arc::new(StubReportGenerator::with_journal(journal.clone())),
            journal,
        }
    }

    pub fn services(&self) -> Services {
        Services {
            patients: self.patients.clone(),
            photos: self.photos.clone(),
            analyses: self.analyses.clone(),
            storage: self.storage.clone(),
            analyzer: self.analyzer.clone(),
            reports: self.reports.clone(),
        }
    }
}
