use podtrack_core::LocalAuthority;
use tempfile::TempDir;

/// Helper function to create a local authority in a temporary directory
pub async fn create_test_authority() -> (TempDir, LocalAuthority) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let authority = LocalAuthority::builder()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_storage_dir(Some(temp_dir.path().join("documents")))
        .build()
        .await
        .expect("Failed to create authority");
    (temp_dir, authority)
}
