//! Integration tests for directory ingestion against in-memory stores.

mod common;

use common::{manifest, write_manifest, MemoryStore, ScriptedSession, CONFLICT};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use threat_db::error::{StoreErrorKind, ThreatDbError};
use threat_db::ingest::{FileOutcome, IngestOptions, Ingestor};
use threat_db::model::EmptyReason;
use threat_db::store::{BenignRejection, GraphQlResponse, MutationClient, SubmitOutcome};
use threat_db::{BomNormalizer, CycloneDxNormalizer};

fn ingestor(store: &Arc<MemoryStore>, options: IngestOptions) -> Ingestor<Arc<MemoryStore>> {
    Ingestor::new(MutationClient::new(Arc::clone(store)), options)
}

fn removing() -> IngestOptions {
    IngestOptions {
        remove_on_success: true,
        ..IngestOptions::default()
    }
}

// ============================================================================
// Discovery
// ============================================================================

#[test]
fn test_ignored_and_hidden_directories_are_skipped() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    write_manifest(root, "app.vex.json", &manifest("urn:uuid:a1", 2, 0));
    write_manifest(root, "nested/deeper/svc.vex.json", &manifest("urn:uuid:a2", 2, 0));
    write_manifest(root, "node_modules/dep/x.vex.json", &manifest("urn:uuid:a3", 2, 0));
    write_manifest(root, "Target/x.vex.json", &manifest("urn:uuid:a4", 2, 0));
    write_manifest(root, ".cache/x.vex.json", &manifest("urn:uuid:a5", 2, 0));
    write_manifest(root, "notes.json", &manifest("urn:uuid:a6", 2, 0));

    let store = Arc::new(MemoryStore::new());
    let ingestor = ingestor(&store, IngestOptions::default());

    let mut found = ingestor.discover(root);
    found.sort();
    assert_eq!(
        found,
        vec![root.join("app.vex.json"), root.join("nested/deeper/svc.vex.json")]
    );

    let report = ingestor.ingest_directory(root);
    assert_eq!(report.discovered, 2);
    assert_eq!(report.created, 2);
    assert!(store.contains("urn:uuid:a1"));
    assert!(store.contains("urn:uuid:a2"));
    assert!(!store.contains("urn:uuid:a3"));
}

// ============================================================================
// Batch behavior
// ============================================================================

#[test]
fn test_remove_on_success_deletes_only_accepted_files() {
    let tmp = TempDir::new().unwrap();
    let ok = write_manifest(tmp.path(), "ok.vex.json", &manifest("urn:uuid:r1", 3, 1));
    let empty = write_manifest(tmp.path(), "empty.vex.json", &manifest("urn:uuid:r2", 0, 0));
    let broken = tmp.path().join("broken.vex.json");
    std::fs::write(&broken, "{\"serialNumber\": ").unwrap();

    let store = Arc::new(MemoryStore::new());
    let report = ingestor(&store, removing()).ingest_directory(tmp.path());

    assert_eq!(report.discovered, 3);
    assert_eq!(report.created, 1);
    assert_eq!(report.nothing_to_ingest, 2);
    assert_eq!(report.removed, 1);
    assert!(!report.has_failures());
    assert!(!ok.exists());
    assert!(empty.exists());
    assert!(broken.exists());
}

#[test]
fn test_files_kept_without_remove_on_success() {
    let tmp = TempDir::new().unwrap();
    let path = write_manifest(tmp.path(), "a.vex.json", &manifest("urn:uuid:k1", 1, 0));

    let store = Arc::new(MemoryStore::new());
    let report = ingestor(&store, IngestOptions::default()).ingest_directory(tmp.path());
    assert_eq!(report.created, 1);
    assert_eq!(report.removed, 0);
    assert!(path.exists());
}

#[test]
fn test_failure_does_not_abort_batch() {
    let tmp = TempDir::new().unwrap();
    for i in 0..4 {
        write_manifest(
            tmp.path(),
            &format!("m{i}.vex.json"),
            &manifest(&format!("urn:uuid:f{i}"), 2, 0),
        );
    }

    // One rejection, then successes.
    let mut responses = vec![Ok(GraphQlResponse::with_error("schema mismatch: unknown field"))];
    responses.extend((0..3).map(|i| {
        Ok(GraphQlResponse::with_data(
            json!({"addBom": {"bom": [{"serialNumber": format!("urn:uuid:f{i}")}]}}),
        ))
    }));
    let session = Arc::new(ScriptedSession::new(responses));
    let options = IngestOptions {
        parallel: false,
        remove_on_success: true,
        ..IngestOptions::default()
    };
    let ingestor = Ingestor::new(MutationClient::new(Arc::clone(&session)), options);

    let report = ingestor.ingest_directory(tmp.path());
    assert_eq!(session.calls(), 4);
    assert_eq!(report.created, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.removed, 3);
    assert!(report.has_failures());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].0.exists());
    assert!(report.failures[0].1.contains("schema mismatch"));
}

#[test]
fn test_store_unreachable_counts_as_failure() {
    let tmp = TempDir::new().unwrap();
    let path = write_manifest(tmp.path(), "a.vex.json", &manifest("urn:uuid:u1", 1, 0));

    let session = ScriptedSession::new(vec![Err(ThreatDbError::store(
        "posting",
        StoreErrorKind::Connection("connection refused".to_string()),
    ))]);
    let options = IngestOptions {
        remove_on_success: true,
        ..IngestOptions::default()
    };
    let ingestor = Ingestor::new(MutationClient::new(session), options);

    let outcome = ingestor.ingest_file(&path);
    assert!(outcome.is_failure());
    assert!(path.exists());
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_reingesting_same_manifest_is_success() {
    let tmp = TempDir::new().unwrap();
    let doc = manifest("urn:uuid:1a1ffcb3-2c26-43af-8032-d312627ab9f8", 5, 2);
    let path = write_manifest(tmp.path(), "again.vex.json", &doc);

    let store = Arc::new(MemoryStore::new());
    let ingestor = ingestor(&store, IngestOptions::default());

    assert_eq!(ingestor.ingest_file(&path), FileOutcome::Created);
    let components = store.component_count();

    let second = ingestor.ingest_file(&path);
    assert_eq!(
        second,
        FileOutcome::Unchanged(BenignRejection::DuplicateBom)
    );
    assert!(second.is_success());
    assert_eq!(store.bom_count(), 1);
    assert_eq!(store.component_count(), components);
}

#[test]
fn test_shared_component_is_benign() {
    let store = Arc::new(MemoryStore::new());
    let client = MutationClient::new(Arc::clone(&store));
    let normalizer = CycloneDxNormalizer::new();

    let first = normalizer
        .normalize_str(&manifest("urn:uuid:shared", 2, 0).to_string())
        .into_bom()
        .unwrap();
    let mut second = first.clone();
    second.serial_number = "urn:uuid:shared-rebuild".to_string();

    assert!(client.create_bom(&first).unwrap().is_created());
    assert_eq!(
        client.create_bom(&second).unwrap(),
        SubmitOutcome::Unchanged(BenignRejection::SharedComponent)
    );
}

#[test]
fn test_missing_timestamp_is_benign() {
    let mut doc = manifest("urn:uuid:no-ts", 1, 0);
    doc["metadata"].as_object_mut().unwrap().remove("timestamp");

    let store = Arc::new(MemoryStore::new());
    let ingestor = ingestor(&store, IngestOptions::default());
    assert!(ingestor.ingest_stream(doc.to_string().as_bytes()));
    assert_eq!(store.bom_count(), 0);
}

// ============================================================================
// Conflict retries
// ============================================================================

#[test]
fn test_conflict_is_retried_once() {
    let store = Arc::new(MemoryStore::new().with_conflicts(1));
    let ingestor = ingestor(&store, IngestOptions::default());

    let doc = manifest("urn:uuid:retry", 3, 0);
    assert!(ingestor.ingest_stream(&serde_json::to_vec(&doc).unwrap()));
    assert_eq!(store.mutations(), 2);
    assert!(store.contains("urn:uuid:retry"));
}

#[test]
fn test_repeated_conflict_fails() {
    let session = ScriptedSession::new(vec![
        Ok(GraphQlResponse::with_error(CONFLICT)),
        Ok(GraphQlResponse::with_error(CONFLICT)),
    ]);
    let ingestor = Ingestor::new(MutationClient::new(session), IngestOptions::default());

    let doc = manifest("urn:uuid:conflict", 1, 0);
    assert!(!ingestor.ingest_reader(doc.to_string().as_bytes()));
    assert_eq!(ingestor.client().session().calls(), 2);
}

// ============================================================================
// Uploads
// ============================================================================

#[test]
fn test_stream_nothing_to_ingest_is_false() {
    let store = Arc::new(MemoryStore::new());
    let ingestor = ingestor(&store, IngestOptions::default());

    assert!(!ingestor.ingest_stream(b"{}"));
    assert!(!ingestor.ingest_stream(b"garbage"));
    assert_eq!(store.mutations(), 0);
}

#[test]
fn test_file_outcome_reasons() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let ingestor = ingestor(&store, IngestOptions::default());

    let no_serial = write_manifest(tmp.path(), "a.vex.json", &json!({"components": [{"name": "x"}]}));
    assert_eq!(
        ingestor.ingest_file(&no_serial),
        FileOutcome::NothingToIngest(EmptyReason::MissingSerialNumber)
    );
    assert_eq!(
        ingestor.ingest_file(&tmp.path().join("gone.vex.json")),
        FileOutcome::NothingToIngest(EmptyReason::Unreadable)
    );
}
