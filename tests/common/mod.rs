//! 集成测试共用的脚本化远端和测试装配
#![allow(dead_code)]

use async_trait::async_trait;
use notebook_pipeline::api::rpc_methods;
use notebook_pipeline::config::{Config, PipelineTiming};
use notebook_pipeline::error::{AppError, AppResult};
use notebook_pipeline::infrastructure::{ExternalScheduler, StateStore};
use notebook_pipeline::models::{
    ArtifactSettings, ArtifactStatus, ArtifactType, GenerationResult, NotebookInfo, SourceInfo,
    SourceRef, SourceStatus, TaskStatus,
};
use notebook_pipeline::services::RecordingEffects;
use notebook_pipeline::utils::ManualClock;
use notebook_pipeline::{NotebookApi, Pipeline, PipelineState};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NOTEBOOK_ID: &str = "nb-0123456789";
pub const SOURCE_ID: &str = "src-0123456789";
pub const START_MS: i64 = 1_700_000_000_000;

/// 调用记录
#[derive(Debug, Default, Clone)]
pub struct Calls {
    pub list_sources: usize,
    pub list_artifacts: usize,
    pub titles: usize,
    pub deleted: Vec<String>,
    pub generated: Vec<ArtifactType>,
    pub added: Vec<SourceRef>,
    pub uploaded: Vec<(String, usize, String)>,
}

/// 远端调用的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPoint {
    ListSources,
    Generate(ArtifactType),
    ListArtifacts,
}

/// 调用进行中时被写入的状态（中止或新任务）
pub struct Interruption {
    pub at: CallPoint,
    pub store: StateStore,
    pub replacement: PipelineState,
}

/// 按调用次数推进的远端
pub struct ScriptedApi {
    /// 创建笔记本时返回的ID
    pub notebook_id: Option<String>,
    /// 第几次查询来源时变为就绪，`None` 表示一直处理中
    pub source_ready_on_call: Option<usize>,
    /// 来源直接报错
    pub source_errors: bool,
    /// 前几次查询来源返回瞬时错误
    pub source_list_failures: usize,
    pub sign_in_fails: bool,
    pub add_source_fails: bool,
    /// 这些类型的生成请求直接失败
    pub failing_starts: Vec<ArtifactType>,
    /// (类型, 第几次批量查询时落定, 落定状态)
    pub settle_plan: Vec<(ArtifactType, usize, TaskStatus)>,
    pub title: Option<String>,
    /// 在指定调用返回前覆盖状态
    pub interruption: Option<Interruption>,
    pub calls: Mutex<Calls>,
}

impl Default for ScriptedApi {
    fn default() -> Self {
        Self {
            notebook_id: Some(NOTEBOOK_ID.to_string()),
            source_ready_on_call: Some(1),
            source_errors: false,
            source_list_failures: 0,
            sign_in_fails: false,
            add_source_fails: false,
            failing_starts: Vec::new(),
            settle_plan: Vec::new(),
            title: Some("Generated Title".to_string()),
            interruption: None,
            calls: Mutex::new(Calls::default()),
        }
    }
}

impl ScriptedApi {
    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn task_id(artifact: ArtifactType) -> String {
        format!("task-{:?}", artifact).to_lowercase()
    }

    async fn interrupt_at(&self, point: CallPoint) {
        if let Some(interruption) = &self.interruption {
            if interruption.at == point {
                interruption
                    .store
                    .replace(interruption.replacement.clone())
                    .await
                    .unwrap();
            }
        }
    }
}

#[async_trait]
impl NotebookApi for ScriptedApi {
    async fn ensure_signed_in(&self) -> AppResult<()> {
        if self.sign_in_fails {
            return Err(AppError::AuthRequired);
        }
        Ok(())
    }

    async fn create_notebook(&self, title: &str) -> AppResult<NotebookInfo> {
        Ok(NotebookInfo {
            id: self.notebook_id.clone(),
            title: title.to_string(),
        })
    }

    async fn delete_notebook(&self, notebook_id: &str) -> AppResult<()> {
        self.calls.lock().unwrap().deleted.push(notebook_id.to_string());
        Ok(())
    }

    async fn add_source(&self, _notebook_id: &str, source: &SourceRef) -> AppResult<String> {
        if self.add_source_fails {
            return Err(AppError::rpc(rpc_methods::ADD_SOURCE, json!(3)));
        }
        self.calls.lock().unwrap().added.push(source.clone());
        Ok(SOURCE_ID.to_string())
    }

    async fn add_file_source(
        &self,
        _notebook_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> AppResult<String> {
        self.calls.lock().unwrap().uploaded.push((
            filename.to_string(),
            bytes.len(),
            mime_type.to_string(),
        ));
        Ok(SOURCE_ID.to_string())
    }

    async fn list_sources(&self, _notebook_id: &str) -> AppResult<Vec<SourceInfo>> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.list_sources += 1;
            calls.list_sources
        };

        self.interrupt_at(CallPoint::ListSources).await;

        if call <= self.source_list_failures {
            return Err(AppError::Transport { status: 503 });
        }

        let status = if self.source_errors {
            SourceStatus::Error
        } else if self.source_ready_on_call.map(|n| call >= n).unwrap_or(false) {
            SourceStatus::Ready
        } else {
            SourceStatus::Processing
        };

        Ok(vec![SourceInfo {
            id: SOURCE_ID.to_string(),
            title: "Source".to_string(),
            status,
        }])
    }

    async fn get_notebook_title(&self, _notebook_id: &str) -> AppResult<Option<String>> {
        self.calls.lock().unwrap().titles += 1;
        Ok(self.title.clone())
    }

    async fn generate_artifact(
        &self,
        _notebook_id: &str,
        source_ids: &[String],
        artifact: ArtifactType,
        _settings: &ArtifactSettings,
    ) -> AppResult<GenerationResult> {
        assert_eq!(source_ids.to_vec(), vec![SOURCE_ID.to_string()]);
        self.calls.lock().unwrap().generated.push(artifact);
        self.interrupt_at(CallPoint::Generate(artifact)).await;

        if self.failing_starts.contains(&artifact) {
            return Err(AppError::rpc(rpc_methods::CREATE_ARTIFACT, json!(8)));
        }
        if artifact.is_synchronous() {
            return Ok(GenerationResult {
                task_id: Some("note-0000000001".to_string()),
                status: TaskStatus::Completed,
            });
        }
        Ok(GenerationResult {
            task_id: Some(Self::task_id(artifact)),
            status: TaskStatus::InProgress,
        })
    }

    async fn list_artifact_statuses(
        &self,
        _notebook_id: &str,
    ) -> AppResult<HashMap<String, ArtifactStatus>> {
        let (call, generated) = {
            let mut calls = self.calls.lock().unwrap();
            calls.list_artifacts += 1;
            (calls.list_artifacts, calls.generated.clone())
        };
        self.interrupt_at(CallPoint::ListArtifacts).await;

        Ok(generated
            .into_iter()
            .filter(|t| !self.failing_starts.contains(t) && !t.is_synchronous())
            .map(|artifact| {
                let status = self
                    .settle_plan
                    .iter()
                    .find(|(t, at, _)| *t == artifact && call >= *at)
                    .map(|(_, _, status)| *status)
                    .unwrap_or(TaskStatus::InProgress);
                (
                    Self::task_id(artifact),
                    ArtifactStatus {
                        status,
                        type_code: Some(artifact.type_code()),
                    },
                )
            })
            .collect())
    }
}

/// 测试装配
pub struct Harness {
    pub pipeline: Pipeline,
    pub api: Arc<ScriptedApi>,
    pub clock: Arc<ManualClock>,
    pub scheduler: Arc<ExternalScheduler>,
    pub effects: Arc<RecordingEffects>,
    pub store: StateStore,
}

pub fn timing() -> PipelineTiming {
    PipelineTiming {
        poll_interval: Duration::from_secs(30),
        source_timeout: Duration::from_secs(600),
        generation_timeout: Duration::from_secs(2400),
        artifact_spacing: Duration::ZERO,
    }
}

pub fn harness(api: ScriptedApi, types: &[ArtifactType]) -> Harness {
    harness_with_store(api, types, StateStore::in_memory())
}

pub fn harness_with_store(api: ScriptedApi, types: &[ArtifactType], store: StateStore) -> Harness {
    let api = Arc::new(api);
    let clock = Arc::new(ManualClock::new(START_MS));
    let scheduler = Arc::new(ExternalScheduler::new());
    let effects = Arc::new(RecordingEffects::new());
    let config = Config {
        base_url: "https://notebook.test".to_string(),
        ..Config::default()
    };

    let pipeline = Pipeline::new(&config, api.clone(), store.clone())
        .with_settings(ArtifactSettings::only(types))
        .with_scheduler(scheduler.clone())
        .with_effects(effects.clone())
        .with_clock(clock.clone())
        .with_timing(timing());

    Harness {
        pipeline,
        api,
        clock,
        scheduler,
        effects,
        store,
    }
}

impl Harness {
    /// 推进一个轮询周期后执行 tick
    pub async fn tick(&self) -> notebook_pipeline::PipelineState {
        self.clock.advance(timing().poll_interval);
        self.pipeline.tick().await.unwrap()
    }
}
