use orchestrator_core::{ArtifactStore, OrchestratorError};
use orchestrator_infrastructure::{FileSystemArtifactStore, StaticDataSource};

#[tokio::test]
async fn test_put_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSystemArtifactStore::new(dir.path());

    let path = "dev/nonprd/peer_inputs/GCM TMT_peer_inputs_2022-03-31.json";
    store.put(path, br#"{"members":2}"#.to_vec()).await.unwrap();

    assert!(dir.path().join(path).exists());
    assert_eq!(
        store.get(path).await.unwrap(),
        Some(br#"{"members":2}"#.to_vec())
    );
}

#[tokio::test]
async fn test_missing_artifact_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSystemArtifactStore::new(dir.path());

    assert_eq!(store.get("dev/nonprd/missing.json").await.unwrap(), None);
    assert!(!store.exists("dev/nonprd/missing.json").await.unwrap());
}

#[tokio::test]
async fn test_overwrite_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSystemArtifactStore::new(dir.path());

    store.put("dev/nonprd/a.json", b"first".to_vec()).await.unwrap();
    store.put("dev/nonprd/a.json", b"second".to_vec()).await.unwrap();

    assert_eq!(
        store.get("dev/nonprd/a.json").await.unwrap(),
        Some(b"second".to_vec())
    );
    assert_eq!(store.list("dev/").await.unwrap(), vec!["dev/nonprd/a.json"]);
}

#[tokio::test]
async fn test_list_by_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSystemArtifactStore::new(dir.path());

    for path in [
        "dev/nonprd/fund_reports/Skye_report_2022-03-31.json",
        "dev/nonprd/fund_reports/Citadel_report_2022-03-31.json",
        "dev/nonprd/attribution/attribution_MTD_2022-03-31.json",
    ] {
        store.put(path, b"{}".to_vec()).await.unwrap();
    }

    assert_eq!(
        store.list("dev/nonprd/fund_reports/").await.unwrap(),
        vec![
            "dev/nonprd/fund_reports/Citadel_report_2022-03-31.json",
            "dev/nonprd/fund_reports/Skye_report_2022-03-31.json",
        ]
    );
    assert!(store.list("prd/").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileSystemArtifactStore::new(dir.path().join("root"));

    let err = store
        .put("../escape.json", b"x".to_vec())
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::Storage(_)));
    assert!(!dir.path().join("escape.json").exists());
}

#[tokio::test]
async fn test_load_universe_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("universe.json");
    std::fs::write(
        &path,
        r#"{"funds":[
            {"name":"Skye","peer_group":"GCM TMT","scopes":["performance_quality"]},
            {"name":"Citadel","peer_group":"GCM TMT","scopes":["performance_quality"]}
        ]}"#,
    )
    .unwrap();

    let source = StaticDataSource::load(&path).await.unwrap();
    assert_eq!(source.fund_count(), 2);

    let err = StaticDataSource::load(dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestratorError::DataSource(_)));
}
