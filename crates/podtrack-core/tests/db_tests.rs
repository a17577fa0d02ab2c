use podtrack_core::{db::pod_queries::StatusWrite, Database, PodError};
use tempfile::TempDir;

/// Helper function to create a temporary directory and database
fn create_test_database() -> (TempDir, Database) {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let db = Database::new(temp_dir.path().join("pods.db")).expect("Failed to create database");
    (temp_dir, db)
}

#[test]
fn test_register_and_get_client_pod() {
    let (_temp_dir, mut db) = create_test_database();

    let record = db
        .register_client_pod("T1", "C1", Some("complete"))
        .expect("Failed to register");
    assert_eq!(record.version, 0);

    let loaded = db
        .get_client_pod("T1", "C1")
        .expect("Failed to query")
        .expect("Record should exist");
    assert_eq!(loaded, record);

    assert!(db.get_client_pod("T1", "C2").unwrap().is_none());
    assert!(db.has_client_pod("T1", "C1").unwrap());
    assert!(!db.has_client_pod("T1", "C2").unwrap());
}

#[test]
fn test_register_twice_fails() {
    let (_temp_dir, mut db) = create_test_database();
    db.register_client_pod("T1", "C1", None).unwrap();

    let err = db.register_client_pod("T1", "C1", None).unwrap_err();
    assert!(matches!(err, PodError::InvalidInput { .. }));
}

#[test]
fn test_update_status_checks_version() {
    let (_temp_dir, mut db) = create_test_database();
    db.register_client_pod("T1", "C1", Some("started")).unwrap();

    assert_eq!(
        db.update_status("T1", "C1", "complete", Some(0)).unwrap(),
        StatusWrite::Applied(1)
    );
    assert_eq!(
        db.update_status("T1", "C1", "pod_received", Some(0)).unwrap(),
        StatusWrite::Stale { current: 1 }
    );

    let record = db.get_client_pod("T1", "C1").unwrap().unwrap();
    assert_eq!(record.status.as_deref(), Some("complete"));
    assert_eq!(record.version, 1);
}

#[test]
fn test_update_status_without_version() {
    let (_temp_dir, mut db) = create_test_database();
    db.register_client_pod("T1", "C1", None).unwrap();

    assert_eq!(
        db.update_status("T1", "C1", "complete", None).unwrap(),
        StatusWrite::Applied(1)
    );
    assert_eq!(
        db.update_status("T9", "C1", "complete", None).unwrap(),
        StatusWrite::Missing
    );
}

#[test]
fn test_documents_listed_in_insertion_order() {
    let (_temp_dir, mut db) = create_test_database();
    db.register_client_pod("T1", "C1", None).unwrap();

    let first = db
        .add_document("T1", "C1", "complete", "file:///a.pdf", "pdf")
        .unwrap();
    let second = db
        .add_document("T1", "C1", "started", "file:///b.png", "png")
        .unwrap();

    let documents = db.list_documents("T1", "C1").unwrap();
    assert_eq!(documents, vec![first, second]);

    let record = db.get_client_pod("T1", "C1").unwrap().unwrap();
    assert_eq!(record.documents.len(), 2);
}

#[test]
fn test_add_document_requires_record() {
    let (_temp_dir, mut db) = create_test_database();

    let err = db
        .add_document("T1", "C1", "complete", "file:///a.pdf", "pdf")
        .unwrap_err();
    assert!(matches!(err, PodError::ClientPodNotFound { .. }));
}

#[test]
fn test_reopening_database_keeps_data() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pods.db");

    {
        let mut db = Database::new(&path).unwrap();
        db.register_client_pod("T1", "C1", Some("settled")).unwrap();
    }

    let db = Database::new(&path).unwrap();
    let record = db.get_client_pod("T1", "C1").unwrap().unwrap();
    assert_eq!(record.status.as_deref(), Some("settled"));
}
