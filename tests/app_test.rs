use notebook_pipeline::infrastructure::{StateStore, WakeScheduler};
use notebook_pipeline::models::{PipelineState, PipelineStatus, SourceKind, SourceRef, Step};
use notebook_pipeline::{App, Config, HostMode};
use std::path::Path;
use std::time::Duration;

fn config_in(dir: &Path) -> Config {
    Config {
        state_file: dir.join("pipeline_state.json"),
        settings_file: dir.join("artifact_settings.toml"),
        ..Config::default()
    }
}

/// 写入一条停在产物请求阶段的记录，模拟请求途中进程退出
async fn seed_interrupted_fan_out(path: &Path, step_started_at: i64) {
    let mut state = PipelineState::started(
        SourceRef::from_input("https://example.com/a", SourceKind::Url),
        step_started_at,
    );
    state.notebook_id = Some("nb-0123456789".to_string());
    state.enter_step(Step::GenerateArtifacts, "Requesting Audio (1/2)…", step_started_at);
    StateStore::file(path).replace(state).await.unwrap();
}

#[tokio::test]
async fn test_run_daemon_returns_when_no_wake_is_pending() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let now = chrono::Utc::now().timestamp_millis();
    seed_interrupted_fan_out(&config.state_file, now).await;

    let mut app = App::initialize(config, HostMode::Interval).await.unwrap();
    let state = tokio::time::timeout(Duration::from_secs(3), app.run_daemon())
        .await
        .expect("守护循环应该立即返回")
        .unwrap();

    assert_eq!(state.status, PipelineStatus::Running);
    assert_eq!(state.active_step(), Some(Step::GenerateArtifacts));
    assert!(!app.pipeline().scheduler().is_armed());
}

#[tokio::test]
async fn test_run_daemon_fails_long_stalled_step() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let three_hours_ago = chrono::Utc::now().timestamp_millis() - 3 * 60 * 60 * 1000;
    seed_interrupted_fan_out(&config.state_file, three_hours_ago).await;

    let mut app = App::initialize(config.clone(), HostMode::Interval)
        .await
        .unwrap();
    let state = tokio::time::timeout(Duration::from_secs(3), app.run_daemon())
        .await
        .expect("守护循环应该立即返回")
        .unwrap();

    assert_eq!(state.status, PipelineStatus::Error);
    assert!(state
        .error
        .as_deref()
        .unwrap()
        .contains("stalled during generate_artifacts"));

    // 失败记录已写回文件
    let persisted = StateStore::file(&config.state_file).get().await.unwrap();
    assert_eq!(persisted, state);
}
