mod common;

use common::{ScriptedApi, NOTEBOOK_ID, SOURCE_ID};
use notebook_pipeline::error::AppError;
use notebook_pipeline::models::SourceStatus;
use notebook_pipeline::orchestrator::wait_for_source_ready;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_returns_once_source_is_ready() {
    let api = ScriptedApi {
        source_ready_on_call: Some(3),
        ..ScriptedApi::default()
    };

    let source = assert_ok!(
        wait_for_source_ready(&api, NOTEBOOK_ID, SOURCE_ID, Duration::ZERO, 5, || false).await
    );
    assert_eq!(source.status, SourceStatus::Ready);
    assert_eq!(api.calls().list_sources, 3);
}

#[tokio::test]
async fn test_cancelled_before_first_call() {
    let api = ScriptedApi::default();

    let result =
        wait_for_source_ready(&api, NOTEBOOK_ID, SOURCE_ID, Duration::ZERO, 5, || true).await;
    assert!(matches!(result, Err(AppError::AbortedByUser)));
    assert_eq!(api.calls().list_sources, 0);
}

#[tokio::test]
async fn test_cancelled_after_network_wait() {
    let api = ScriptedApi::default();
    let checks = AtomicUsize::new(0);

    // 第一次检查放行，请求返回后的检查触发取消
    let result = wait_for_source_ready(&api, NOTEBOOK_ID, SOURCE_ID, Duration::ZERO, 5, || {
        checks.fetch_add(1, Ordering::SeqCst) >= 1
    })
    .await;

    assert!(matches!(result, Err(AppError::AbortedByUser)));
    assert_eq!(api.calls().list_sources, 1);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let api = ScriptedApi {
        source_ready_on_call: None,
        source_list_failures: 1,
        ..ScriptedApi::default()
    };

    let result = wait_for_source_ready(&api, NOTEBOOK_ID, SOURCE_ID, Duration::ZERO, 4, || false).await;
    assert!(matches!(result, Err(AppError::PhaseTimeout { .. })));
    assert_eq!(api.calls().list_sources, 4);
}

#[tokio::test]
async fn test_source_error_stops_waiting() {
    let api = ScriptedApi {
        source_errors: true,
        ..ScriptedApi::default()
    };

    let err = assert_err!(
        wait_for_source_ready(&api, NOTEBOOK_ID, SOURCE_ID, Duration::ZERO, 4, || false).await
    );
    assert!(matches!(err, AppError::SourceProcessing(_)));
    assert_eq!(api.calls().list_sources, 1);
}
