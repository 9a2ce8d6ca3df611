mod common;

use common::*;
use shared::models::{ArtifactKey, ArtifactKind};
use slab_server::issuance::IssueRequest;
use slab_server::records::PhotoUpload;
use slab_server::store::{
    ArtifactStore, FsArtifactStore, MemoryRecordStore, PhotoSide, RecordStore,
};
use std::sync::Arc;

fn png() -> Vec<u8> {
    slab_printer::raster::encode_png(&image::RgbaImage::from_pixel(
        4,
        4,
        image::Rgba([200, 10, 10, 255]),
    ))
    .unwrap()
}

#[tokio::test]
async fn test_delete_removes_record_and_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let records = Arc::new(MemoryRecordStore::new());
    let artifacts = Arc::new(FsArtifactStore::new(dir.path(), ARTIFACT_BASE_URL));
    let app = app_with(records.clone(), artifacts.clone());

    let report = app
        .state
        .issuance
        .issue(IssueRequest {
            fields: jdoe_fields(),
            photos: vec![
                PhotoUpload {
                    side: PhotoSide::Front,
                    bytes: png(),
                },
                PhotoUpload {
                    side: PhotoSide::Back,
                    bytes: png(),
                },
            ],
        })
        .await
        .unwrap();
    let id = report.record_id.clone();
    for kind in ArtifactKind::ALL {
        let key = ArtifactKey::new(id.as_str(), kind);
        assert!(artifacts.get(&key).await.is_ok(), "{key}");
    }

    let outcome = app.state.record_service.delete(&id).await.unwrap();
    assert_eq!(outcome.record_id, id);
    assert_eq!(outcome.removed.len(), 4);
    assert!(outcome.failed.is_empty());

    assert!(records.get(&id).await.is_err());
    for kind in ArtifactKind::ALL {
        let key = ArtifactKey::new(id.as_str(), kind);
        assert!(artifacts.get(&key).await.is_err(), "{key}");
    }
    // Nothing left on disk under any namespace
    let leftovers: Vec<_> = walk(dir.path());
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

fn walk(path: &std::path::Path) -> Vec<std::path::PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(path) {
        for entry in entries.flatten() {
            let p = entry.path();
            if p.is_dir() {
                files.extend(walk(&p));
            } else {
                files.push(p);
            }
        }
    }
    files
}

#[tokio::test]
async fn test_update_regenerates_label() {
    let (app, records, artifacts) = memory_app();
    let issued = app.state.issuance.issue_fields(jdoe_fields()).await.unwrap();
    let before = artifacts
        .load(&ArtifactKey::label(issued.record_id.as_str()))
        .await
        .unwrap();

    let mut fields = jdoe_fields();
    fields.grade = "8".into();
    let updated = app
        .state
        .record_service
        .update(&issued.record_id, fields)
        .await
        .unwrap();
    assert_eq!(updated.record_id, issued.record_id);
    assert_eq!(updated.label_url, issued.label_url);

    let after = artifacts
        .load(&ArtifactKey::label(issued.record_id.as_str()))
        .await
        .unwrap();
    assert_ne!(before.bytes, after.bytes);

    let record = records.get(&issued.record_id).await.unwrap();
    assert_eq!(record.fields.grade.as_str(), "8");
}

#[tokio::test]
async fn test_verification_view() {
    let (app, _, _) = memory_app();
    let issued = app.state.issuance.issue_fields(jdoe_fields()).await.unwrap();

    let view = app
        .state
        .record_service
        .verification_view(&issued.record_id)
        .await
        .unwrap();
    assert_eq!(view.record.id, issued.record_id);
    assert_eq!(view.label_url.as_deref(), Some(issued.label_url.as_str()));
    assert_eq!(view.code_url.as_deref(), Some(issued.code_url.as_str()));
    assert_eq!(
        view.verification_url.to_string(),
        format!("{PUBLIC_BASE_URL}/card/{}", issued.record_id)
    );
}

#[tokio::test]
async fn test_attach_photo_rejects_garbage() {
    let (app, _, artifacts) = memory_app();
    let issued = app.state.issuance.issue_fields(jdoe_fields()).await.unwrap();
    let before = artifacts.len();

    assert!(app
        .state
        .record_service
        .attach_photo(&issued.record_id, PhotoSide::Front, b"definitely not an image")
        .await
        .is_err());
    assert_eq!(artifacts.len(), before);

    let url = app
        .state
        .record_service
        .attach_photo(&issued.record_id, PhotoSide::Front, &png())
        .await
        .unwrap();
    assert!(url.ends_with(&format!("/cards/{}_front.png", issued.record_id)));
}

#[tokio::test]
async fn test_fs_store_put_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FsArtifactStore::new(dir.path(), ARTIFACT_BASE_URL);
    let key = ArtifactKey::label("AbCdEfGhIjKlMnOpQrSt");

    let first = store.put(&key, &png(), "image/png").await.unwrap();
    let second = store.put(&key, &png(), "image/png").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first, format!("{ARTIFACT_BASE_URL}/labels/AbCdEfGhIjKlMnOpQrSt_label.png"));
    assert_eq!(walk(dir.path()).len(), 1);
    assert_eq!(store.load(&key).await.unwrap().bytes, png());
}
