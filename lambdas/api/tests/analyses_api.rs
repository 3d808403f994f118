//! Integration tests for analysis submission, detail, history and report
//! download.

mod common;

use axum::{
    http::{header, Method, StatusCode},
    Router,
};
use common::{body_bytes, body_json, body_text, build_test_app, get, post_json, send};
use domain::{
    photos::{NewPhoto, PhotoTag},
    testing::{Call, REPORT_PDF},
    Identity,
};
use serde_json::{json, Value};

const BEFORE_JPEG: &str = "/9j/AA==";
const AFTER_JPEG: &str = "/9j/AQ==";

/// Registers a patient through the API and returns its id.
async fn registered(app: &Router) -> String {
    let patient = body_json(post_json(app, "/patients", json!({"name": "Joana Lima"})).await).await;
    patient["id"].as_str().unwrap().to_string()
}

fn submission(patient: Value, procedures: Value) -> Value {
    let mut body = json!({
        "before_image": {"data": BEFORE_JPEG, "content_type": "image/jpeg"},
        "after_image": {"data": AFTER_JPEG},
        "procedures": procedures,
    });
    for (key, value) in patient.as_object().unwrap() {
        body[key] = value.clone();
    }
    body
}

// ---------------------------------------------------------------------------
// Test: new patient, all collaborators healthy
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_patient_submission_completes() {
    let (app, bed) = build_test_app();

    let response = post_json(
        &app,
        "/analyses",
        submission(json!({"patient_name": "Maria Silva"}), json!(["Botox"])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let outcome = body_json(response).await;
    assert_eq!(outcome["warnings"], json!([]));
    let id = outcome["analysis_id"].as_str().unwrap();

    let detail = body_json(get(&app, &format!("/analyses/{}", id)).await).await;
    assert_eq!(detail["status"], "completed");
    assert_eq!(detail["procedures"], json!(["Botox"]));
    assert_eq!(detail["patient"]["name"], "Maria Silva");
    assert!(detail["before_photo_id"].is_string());
    assert!(detail["after_photo_id"].is_string());
    let report_path = detail["report_path"].as_str().unwrap();
    assert!(report_path.starts_with("reports/"));
    assert_eq!(bed.storage.object(report_path).unwrap().bytes, REPORT_PDF);

    // decoded photo bytes reached the bucket
    let paths = bed.storage.paths();
    assert_eq!(bed.storage.object(&paths[0]).unwrap().bytes, [0xff, 0xd8, 0xff, 0x00]);
    assert_eq!(bed.storage.object(&paths[1]).unwrap().bytes, [0xff, 0xd8, 0xff, 0x01]);
}

// ---------------------------------------------------------------------------
// Test: analyzer failure surfaces the analyzer's detail verbatim
// ---------------------------------------------------------------------------

#[tokio::test]
async fn analyzer_failure_returns_its_detail() {
    let (app, bed) = build_test_app();
    let patient_id = registered(&app).await;
    bed.analyzer.fail_with("quota exceeded");

    let response = post_json(
        &app,
        "/analyses",
        submission(json!({ "patient_id": patient_id }), json!(["Botox"])),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_text(response).await, "quota exceeded");
    assert!(bed.analyses.rows().is_empty());
}

// ---------------------------------------------------------------------------
// Test: analyses cannot be filed under another user's patient
// ---------------------------------------------------------------------------

#[tokio::test]
async fn foreign_patient_submission_returns_404() {
    let (app, bed) = build_test_app();
    let patient_id = registered(&app).await;

    let response = send(
        &app,
        Method::POST,
        "/analyses",
        Some("someone-else"),
        Some(submission(json!({ "patient_id": patient_id }), json!(["Botox"]))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_text(response).await, "Entity not found: Patient");
    assert!(bed.storage.paths().is_empty());
    assert!(bed.analyses.rows().is_empty());
}

// ---------------------------------------------------------------------------
// Test: empty images never reach a collaborator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_images_return_400_without_calls() {
    let (app, bed) = build_test_app();

    let response = post_json(
        &app,
        "/analyses",
        json!({"patient_id": "P1", "procedures": ["Botox"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(bed.journal.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Test: best-effort photo rows show up as warnings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unrecorded_photo_is_reported_as_warning() {
    let (app, bed) = build_test_app();
    let patient_id = registered(&app).await;
    bed.photos.seed(
        &Identity::new(common::USER),
        NewPhoto::new("photos/older_after.jpg", PhotoTag::After, Some(patient_id.clone())),
    );
    bed.photos.fail_on(PhotoTag::After, "throttled");

    let response = post_json(
        &app,
        "/analyses",
        submission(json!({ "patient_id": patient_id }), json!(["Peeling"])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let outcome = body_json(response).await;
    assert_eq!(
        outcome["warnings"],
        json!([
            {"kind": "photo_not_recorded", "photo_type": "after", "message": "throttled"},
            {"kind": "photos_resolved_by_recency"}
        ])
    );
    assert!(bed.journal.calls().contains(&Call::RecentPhotos));
}

// ---------------------------------------------------------------------------
// Test: GET /patients/:id/analyses lists the history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn patient_history_lists_submissions() {
    let (app, _bed) = build_test_app();

    let patient = body_json(post_json(&app, "/patients", json!({"name": "Maria Silva"})).await).await;
    let patient_id = patient["id"].as_str().unwrap();

    for procedure in ["Botox", "Preenchimento"] {
        let response = post_json(
            &app,
            "/analyses",
            submission(json!({ "patient_id": patient_id }), json!([procedure])),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let history = body_json(get(&app, &format!("/patients/{}/analyses", patient_id)).await).await;
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["procedures"], json!(["Preenchimento"]));
    assert!(history[0].get("report_base64").is_none());
}

// ---------------------------------------------------------------------------
// Test: report download decodes the stored PDF
// ---------------------------------------------------------------------------

#[tokio::test]
async fn report_downloads_as_pdf() {
    let (app, _bed) = build_test_app();
    let patient_id = registered(&app).await;

    let outcome = body_json(
        post_json(
            &app,
            "/analyses",
            submission(json!({ "patient_id": patient_id }), json!(["Botox"])),
        )
        .await,
    )
    .await;
    let id = outcome["analysis_id"].as_str().unwrap();

    let response = get(&app, &format!("/analyses/{}/report", id)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"analysis_{}.pdf\"", id).as_str()
    );
    assert_eq!(body_bytes(response).await, b"%PDF-1.4");
}

// ---------------------------------------------------------------------------
// Test: unknown analysis
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_analysis_returns_404() {
    let (app, _bed) = build_test_app();

    assert_eq!(get(&app, "/analyses/nope").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/analyses/nope/report").await.status(), StatusCode::NOT_FOUND);
}
