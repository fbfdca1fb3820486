mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;

use common::{request, runner, ScriptedActivity};
use orchestrator_core::{
    InstanceStatus, JobRequest, OrchestrationClient, OrchestratorError, RunSummary,
    SiblingPolicy, TimerConfig,
};
use orchestrator_dispatcher::{TimerTrigger, EOF_RBA_REPORT, PERFORMANCE_QUALITY_REPORT};

fn scenario() -> serde_json::Value {
    json!({ "fund_names": ["Skye", "Citadel"], "peer_groups": ["GCM TMT"] })
}

#[tokio::test]
async fn test_end_to_end_scenario_completes() {
    let activity = Arc::new(ScriptedActivity::new(scenario()));
    let runner = runner(activity.clone(), SiblingPolicy::Drain).await;

    let instance = runner
        .run_to_completion(PERFORMANCE_QUALITY_REPORT, request())
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Completed);
    assert!(instance.started_at.is_some());
    assert!(instance.completed_at.is_some());
    assert_eq!(activity.calls_for("peer_summary").len(), 1);
    assert_eq!(activity.calls_for("fund_report").len(), 2);

    let summary: RunSummary = serde_json::from_value(instance.output.unwrap()).unwrap();
    assert!(summary.succeeded);
    assert_eq!(summary.instance_id, instance.id);
    assert_eq!(summary.branch_count(), 3);
}

#[tokio::test]
async fn test_end_to_end_scenario_fails_with_partial_summary() {
    let activity = Arc::new(ScriptedActivity::new(scenario()).failing("Citadel"));
    let runner = runner(activity.clone(), SiblingPolicy::Drain).await;

    let instance = runner
        .run_to_completion(PERFORMANCE_QUALITY_REPORT, request())
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Failed);
    let message = instance.error_message.clone().unwrap();
    assert!(message.contains("fund_report"));
    assert!(message.contains("Citadel 数据加载失败"));

    let partial: RunSummary = serde_json::from_value(instance.output.unwrap()).unwrap();
    assert!(!partial.succeeded);
    assert_eq!(partial.batches.len(), 2);
    assert_eq!(partial.failed_count(), 1);

    // 终态已写回存储
    let stored = runner.get_status(instance.id).await.unwrap();
    assert_eq!(stored.status, InstanceStatus::Failed);
}

#[tokio::test]
async fn test_missing_as_of_date_fails_instance() {
    let activity = Arc::new(ScriptedActivity::new(scenario()));
    let runner = runner(activity.clone(), SiblingPolicy::Drain).await;

    let instance = runner
        .run_to_completion(EOF_RBA_REPORT, JobRequest::default())
        .await
        .unwrap();

    assert_eq!(instance.status, InstanceStatus::Failed);
    assert!(instance.error_message.unwrap().contains("as_of_date"));
    assert!(activity.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_orchestrator_is_rejected() {
    let activity = Arc::new(ScriptedActivity::new(scenario()));
    let runner = runner(activity, SiblingPolicy::Drain).await;

    let err = runner.start_new("NoSuchOrchestrator", request()).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::OrchestratorNotFound { .. }));
    assert!(runner.list_instances(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_new_returns_pending_then_completes() {
    let activity = Arc::new(ScriptedActivity::new(scenario()));
    let runner = runner(activity, SiblingPolicy::Drain).await;

    let instance = runner
        .start_new(PERFORMANCE_QUALITY_REPORT, request())
        .await
        .unwrap();
    assert_eq!(instance.status, InstanceStatus::Pending);

    let mut status = runner.get_status(instance.id).await.unwrap();
    for _ in 0..100 {
        if status.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        status = runner.get_status(instance.id).await.unwrap();
    }

    assert_eq!(status.status, InstanceStatus::Completed);

    let listed = runner
        .list_instances(Some(PERFORMANCE_QUALITY_REPORT), 10)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, instance.id);
}

#[tokio::test]
async fn test_get_status_unknown_instance() {
    let activity = Arc::new(ScriptedActivity::new(scenario()));
    let runner = runner(activity, SiblingPolicy::Drain).await;

    let err = runner.get_status(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::InstanceNotFound { .. }));
    assert_eq!(
        runner.orchestrator_names(),
        vec![EOF_RBA_REPORT, PERFORMANCE_QUALITY_REPORT]
    );
}

#[tokio::test]
async fn test_timer_fires_with_previous_month_end() {
    let activity = Arc::new(ScriptedActivity::new(json!({ "periods": ["MTD"] })));
    let runner = Arc::new(runner(activity, SiblingPolicy::Drain).await);

    let started_at = Utc.with_ymd_and_hms(2022, 3, 31, 23, 0, 0).unwrap();
    let timers = vec![
        TimerConfig {
            orchestrator: EOF_RBA_REPORT.to_string(),
            schedule: "0 0 6 1 * *".to_string(),
            enabled: true,
        },
        TimerConfig {
            orchestrator: PERFORMANCE_QUALITY_REPORT.to_string(),
            schedule: "0 0 6 1 * *".to_string(),
            enabled: false,
        },
    ];

    let mut trigger =
        TimerTrigger::new(runner.clone(), &timers, Duration::from_secs(30), started_at).unwrap();
    assert_eq!(trigger.timer_count(), 1);

    let before = Utc.with_ymd_and_hms(2022, 4, 1, 5, 59, 0).unwrap();
    assert!(trigger.tick(before).await.is_empty());

    let fire = Utc.with_ymd_and_hms(2022, 4, 1, 6, 0, 10).unwrap();
    let started = trigger.tick(fire).await;
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].name, EOF_RBA_REPORT);
    assert_eq!(started[0].input.param_str("as_of_date"), Some("2022-03-31"));

    // 同一触发点不会重复触发
    assert!(trigger.tick(fire).await.is_empty());
}

#[tokio::test]
async fn test_timer_rejects_unknown_orchestrator_and_bad_cron() {
    let activity = Arc::new(ScriptedActivity::new(scenario()));
    let runner = Arc::new(runner(activity, SiblingPolicy::Drain).await);

    let unknown = vec![TimerConfig {
        orchestrator: "Missing".to_string(),
        schedule: "0 0 6 1 * *".to_string(),
        enabled: true,
    }];
    assert!(matches!(
        TimerTrigger::new(runner.clone(), &unknown, Duration::from_secs(30), Utc::now()),
        Err(OrchestratorError::OrchestratorNotFound { .. })
    ));

    let bad_cron = vec![TimerConfig {
        orchestrator: EOF_RBA_REPORT.to_string(),
        schedule: "every month".to_string(),
        enabled: true,
    }];
    assert!(matches!(
        TimerTrigger::new(runner, &bad_cron, Duration::from_secs(30), Utc::now()),
        Err(OrchestratorError::InvalidCron { .. })
    ));
}
