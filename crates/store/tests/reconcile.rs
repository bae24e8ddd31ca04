//! Start-up sweep and audit over diverged stores.

mod common;

use bytes::Bytes;

use common::{set, stored_files, Harness};
use depot_store::{
    ArtifactMeta, BlobPath, BlobStore, Catalog, IntentOperation, Journal, NewArtifact,
    ReconcileReport,
};

fn png(name: &str) -> NewArtifact {
    NewArtifact::new(name, "png", Bytes::from_static(b"\x89PNG"))
}

#[tokio::test]
async fn test_nothing_pending_is_clean() {
    let h = Harness::new().await;
    h.coordinator.create(png("logo")).await.unwrap();

    let report = h.coordinator.reconcile().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(report, ReconcileReport::default());
}

#[tokio::test]
async fn test_failed_create_is_compensated() {
    let h = Harness::new().await;
    set(&h.blobs.fail_write, true);
    let _ = h.coordinator.create(png("logo")).await.unwrap_err();
    set(&h.blobs.fail_write, false);

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.examined, 1);
    assert_eq!(report.compensated, 1);

    assert!(h.coordinator.list().await.unwrap().is_empty());
    assert!(h.journal.pending().await.unwrap().is_empty());

    // the name is free again
    h.coordinator.create(png("logo")).await.unwrap();
}

#[tokio::test]
async fn test_failed_delete_is_finished() {
    let h = Harness::new().await;
    let record = h.coordinator.create(png("logo")).await.unwrap();
    set(&h.catalog.fail_delete, true);
    let _ = h.coordinator.delete(&record.id).await.unwrap_err();
    set(&h.catalog.fail_delete, false);

    let audit = h.coordinator.audit().await.unwrap();
    assert_eq!(audit.orphan_records.len(), 1);
    assert_eq!(audit.orphan_records[0].id, record.id);

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.finished, 1);
    assert!(h.coordinator.list().await.unwrap().is_empty());
    assert!(h.coordinator.audit().await.unwrap().is_consistent());
}

#[tokio::test]
async fn test_create_without_row_removes_stray_blob() {
    let h = Harness::new().await;
    let meta = ArtifactMeta::new("logo", 4, "png");

    // interrupted between a blob write and a row that never landed
    h.journal
        .begin(IntentOperation::Create, None, &meta)
        .await
        .unwrap();
    h.blobs
        .write(&meta.blob_path(), Bytes::from_static(b"\x89PNG"))
        .await
        .unwrap();

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.blobs_removed, 1);
    assert!(stored_files(&h.root).is_empty());
}

#[tokio::test]
async fn test_create_with_both_halves_is_completed() {
    let h = Harness::new().await;
    let record = h.coordinator.create(png("logo")).await.unwrap();

    // as if completing the intent had failed
    h.journal
        .begin(
            IntentOperation::Create,
            Some(record.id),
            &ArtifactMeta::new("logo", 4, "png"),
        )
        .await
        .unwrap();

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.completed, 1);
    h.coordinator.fetch(&record.id).await.unwrap();
}

#[tokio::test]
async fn test_untouched_delete_is_completed() {
    let h = Harness::new().await;
    let record = h.coordinator.create(png("logo")).await.unwrap();

    h.journal
        .begin(
            IntentOperation::Delete,
            Some(record.id),
            &ArtifactMeta::new("logo", 4, "png"),
        )
        .await
        .unwrap();

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.finished, 0);
    h.coordinator.fetch(&record.id).await.unwrap();
}

#[tokio::test]
async fn test_create_intent_ignores_same_name_other_type() {
    let h = Harness::new().await;
    let other = h.coordinator.create(png("logo")).await.unwrap();

    h.journal
        .begin(IntentOperation::Create, None, &ArtifactMeta::new("logo", 4, "gif"))
        .await
        .unwrap();

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.completed, 1);
    assert!(h.catalog.get_by_id(&other.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_failed_step_stays_pending() {
    let h = Harness::new().await;
    set(&h.blobs.fail_write, true);
    let _ = h.coordinator.create(png("logo")).await.unwrap_err();
    set(&h.catalog.fail_delete, true);

    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(h.journal.pending().await.unwrap().len(), 1);

    set(&h.catalog.fail_delete, false);
    let report = h.coordinator.reconcile().await.unwrap();
    assert_eq!(report.compensated, 1);
}

#[tokio::test]
async fn test_audit_reports_orphan_blobs() {
    let h = Harness::new().await;
    h.coordinator.create(png("logo")).await.unwrap();
    h.blobs
        .write(&BlobPath::derive("stray", "png"), Bytes::from_static(b"x"))
        .await
        .unwrap();

    let audit = h.coordinator.audit().await.unwrap();
    assert!(audit.orphan_records.is_empty());
    assert_eq!(audit.orphan_blobs, vec!["stray.png".to_string()]);
    assert!(!audit.is_consistent());
}
