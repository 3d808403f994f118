//! Finding the stored before/after photos a report is rendered from.
//!
//! The workflow normally knows the ids of the photo rows it just wrote and
//! looks them up directly. When a metadata insert failed there is no id to
//! follow, so it falls back to the patient's two most recent photos and
//! picks one of each tag. That recency path is a degraded mode: it can pick
//! up photos from another submission if two run for the same patient at once.

use crate::{
    photos::{Photo, PhotoRepository, PhotoTag},
    storage::ObjectStorage,
    Error, Identity,
};

/// How many recent photos the recency path inspects.
const RECENT_WINDOW: usize = 2;

/// Photo row ids written during a submission, when the insert returned one.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordedPhotos {
    pub before: Option<String>,
    pub after: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionPath {
    /// Exact lookup by the recorded ids
    Direct,
    /// Most recent photos of the patient
    Recency,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedPhoto {
    pub id: String,
    pub url: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedPair {
    pub before: ResolvedPhoto,
    pub after: ResolvedPhoto,
    pub path: ResolutionPath,
}

pub async fn resolve_pair(
    photos: &dyn PhotoRepository,
    storage: &dyn ObjectStorage,
    owner: &Identity,
    patient_id: &str,
    recorded: &RecordedPhotos,
) -> Result<ResolvedPair, Error> {
    match (&recorded.before, &recorded.after) {
        (Some(before_id), Some(after_id)) => {
            by_id(photos, storage, owner, before_id, after_id).await
        }
        _ => by_recency(photos, storage, owner, patient_id).await,
    }
}

pub async fn by_id(
    photos: &dyn PhotoRepository,
    storage: &dyn ObjectStorage,
    owner: &Identity,
    before_id: &str,
    after_id: &str,
) -> Result<ResolvedPair, Error> {
    let before = photos.get(owner, before_id).await?;
    let after = photos.get(owner, after_id).await?;

    Ok(ResolvedPair {
        before: locate(before.as_ref(), PhotoTag::Before, storage)?,
        after: locate(after.as_ref(), PhotoTag::After, storage)?,
        path: ResolutionPath::Direct,
    })
}

pub async fn by_recency(
    photos: &dyn PhotoRepository,
    storage: &dyn ObjectStorage,
    owner: &Identity,
    patient_id: &str,
) -> Result<ResolvedPair, Error> {
    tracing::warn!("Resolving photos of patient {} by recency", patient_id);

    let recent = photos
        .recent_for_patient(owner, patient_id, RECENT_WINDOW)
        .await?;

    let tagged = |tag: PhotoTag| recent.iter().find(|p| p.photo_type == tag);

    Ok(ResolvedPair {
        before: locate(tagged(PhotoTag::Before), PhotoTag::Before, storage)?,
        after: locate(tagged(PhotoTag::After), PhotoTag::After, storage)?,
        path: ResolutionPath::Recency,
    })
}

fn locate(
    photo: Option<&Photo>,
    tag: PhotoTag,
    storage: &dyn ObjectStorage,
) -> Result<ResolvedPhoto, Error> {
    let photo = photo.ok_or_else(|| {
        Error::integrity(format!("cannot generate report: {} photo not found", tag))
    })?;

    let path = photo.path().ok_or_else(|| {
        Error::integrity(format!(
            "cannot generate report: {} photo {} has no storage path",
            tag, photo.id
        ))
    })?;

    Ok(ResolvedPhoto {
        id: photo.id.clone(),
        url: storage.public_url(path),
    })
}
