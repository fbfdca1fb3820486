use std::path::Path;

use serde_json::{json, Value};
use tempfile::TempDir;

use orchestrator_core::{AppConfig, InstanceStatus, JobRequest, RunSummary, StorageBackend};
use orchestrator_dispatcher::{EOF_RBA_REPORT, PERFORMANCE_QUALITY_REPORT};
use report_orchestrator::app::{build_runner, AppMode, Application};

const UNIVERSE: &str = r#"{
  "funds": [
    {"name": "Skye", "peer_group": "GCM TMT", "scopes": ["performance_quality"],
     "records": {"MTD": {"return": 0.012}}},
    {"name": "Citadel", "peer_group": "GCM TMT", "scopes": ["performance_quality"],
     "records": {"MTD": {"return": -0.004}}},
    {"name": "Millennium", "peer_group": "Multi-Strategy", "scopes": ["eof"],
     "records": {"MTD": {"return": 0.008}, "QTD": {"return": 0.02}}}
  ]
}"#;

fn config(dir: &TempDir) -> AppConfig {
    let universe_path = dir.path().join("universe.json");
    std::fs::write(&universe_path, UNIVERSE).unwrap();

    let mut config = AppConfig::default();
    config.storage.backend = StorageBackend::Filesystem;
    config.storage.root_dir = dir.path().join("artifacts").display().to_string();
    config.data_source.universe_path = Some(universe_path.display().to_string());
    config.worker.attribution_periods = vec!["MTD".to_string(), "QTD".to_string()];
    config
}

fn read_artifact(root: &Path, relative: &str) -> Value {
    let content = std::fs::read(root.join(relative))
        .unwrap_or_else(|e| panic!("artifact {relative} should exist: {e}"));
    serde_json::from_slice(&content).unwrap()
}

#[tokio::test]
async fn test_performance_quality_report_writes_artifacts() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let root = Path::new(&config.storage.root_dir).to_path_buf();
    let runner = build_runner(&config).await.unwrap();

    let request = JobRequest::from_body(json!({
        "as_of_date": "2022-03-31",
        "scope": "performance_quality"
    }))
    .unwrap();

    let instance = runner
        .run_to_completion(PERFORMANCE_QUALITY_REPORT, request)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed, "{:?}", instance.error_message);

    let summary: RunSummary = serde_json::from_value(instance.output.unwrap()).unwrap();
    assert!(summary.succeeded);
    assert_eq!(summary.branch_count(), 3);

    let peers = read_artifact(&root, "dev/nonprd/peer_inputs/GCM TMT_peer_inputs_2022-03-31.json");
    assert_eq!(peers["members"].as_array().unwrap().len(), 2);

    for fund in ["Skye", "Citadel"] {
        let report = read_artifact(
            &root,
            &format!("dev/nonprd/fund_reports/{fund}_report_2022-03-31.json"),
        );
        assert_eq!(report["fund_name"], json!(fund));
        assert_eq!(report["peer_group"], json!("GCM TMT"));
    }
    assert!(!root
        .join("dev/nonprd/fund_reports/Millennium_report_2022-03-31.json")
        .exists());
}

#[tokio::test]
async fn test_fund_without_peer_group_does_not_fail_run() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let root = Path::new(&config.storage.root_dir).to_path_buf();

    let mut universe: Value = serde_json::from_str(UNIVERSE).unwrap();
    universe["funds"].as_array_mut().unwrap().push(json!({
        "name": "Solo",
        "scopes": ["performance_quality"],
        "records": {"MTD": {"return": 0.03}}
    }));
    let universe_path = config.data_source.universe_path.clone().unwrap();
    std::fs::write(&universe_path, universe.to_string()).unwrap();

    let runner = build_runner(&config).await.unwrap();
    let request = JobRequest::from_body(json!({
        "as_of_date": "2022-03-31",
        "scope": "performance_quality"
    }))
    .unwrap();

    let instance = runner
        .run_to_completion(PERFORMANCE_QUALITY_REPORT, request)
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed, "{:?}", instance.error_message);

    let summary: RunSummary = serde_json::from_value(instance.output.unwrap()).unwrap();
    assert_eq!(summary.branch_count(), 4);

    let report = read_artifact(&root, "dev/nonprd/fund_reports/Solo_report_2022-03-31.json");
    assert_eq!(report["peer_group"], Value::Null);
    assert_eq!(report["peers"], json!([]));
}

#[tokio::test]
async fn test_eof_rba_report_writes_one_artifact_per_period() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let root = Path::new(&config.storage.root_dir).to_path_buf();
    let runner = build_runner(&config).await.unwrap();

    let request = JobRequest::from_body(json!({ "as_of_date": "2022-03-31" })).unwrap();
    let instance = runner.run_to_completion(EOF_RBA_REPORT, request).await.unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed, "{:?}", instance.error_message);

    let mtd = read_artifact(&root, "dev/nonprd/attribution/attribution_MTD_2022-03-31.json");
    assert_eq!(mtd["funds"].as_array().unwrap().len(), 3);

    let qtd = read_artifact(&root, "dev/nonprd/attribution/attribution_QTD_2022-03-31.json");
    assert_eq!(qtd["period"], json!("QTD"));
}

#[tokio::test]
async fn test_missing_universe_file_fails_startup() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.data_source.universe_path = Some(dir.path().join("missing.json").display().to_string());

    let err = Application::new(config, AppMode::Api, None).await.err().unwrap();
    assert!(format!("{err:#}").contains("missing.json"));
}

#[tokio::test]
async fn test_application_run_once_with_memory_storage() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir);
    config.storage.backend = StorageBackend::Memory;

    let app = Application::new(config.clone(), AppMode::Api, None).await.unwrap();
    let request = JobRequest::from_body(json!({ "as_of_date": "2022-03-31" })).unwrap();

    let instance = app.run_once(EOF_RBA_REPORT, request).await.unwrap();
    assert_eq!(instance.status, InstanceStatus::Completed);

    // 内存存储不落盘
    assert!(!Path::new(&config.storage.root_dir).exists());

    let err = app
        .run_once("UnknownOrchestrator", JobRequest::default())
        .await
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("UnknownOrchestrator"));
}
