//! 流水线状态 - 唯一持久化的实体
//!
//! 时间戳统一为毫秒。阶段计时只看 `step_started_at`，
//! 每进入一个阶段重置一次，不跨阶段累计。

use crate::models::artifact::{ArtifactType, TaskStatus};
use crate::models::source::SourceRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

/// 阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Auth,
    CreateNotebook,
    AddSource,
    WaitSource,
    GenerateArtifacts,
    WaitArtifacts,
    Done,
    Error,
}

impl Step {
    /// 需要定时唤醒的阶段
    pub fn is_polling(&self) -> bool {
        matches!(self, Step::WaitSource | Step::WaitArtifacts)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Auth => "auth",
            Step::CreateNotebook => "create_notebook",
            Step::AddSource => "add_source",
            Step::WaitSource => "wait_source",
            Step::GenerateArtifacts => "generate_artifacts",
            Step::WaitArtifacts => "wait_artifacts",
            Step::Done => "done",
            Step::Error => "error",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个产物任务
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub artifact_type: ArtifactType,
    pub task_id: Option<String>,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskRecord {
    pub fn started(artifact_type: ArtifactType, task_id: Option<String>, status: TaskStatus) -> Self {
        Self {
            artifact_type,
            task_id,
            status,
            error: None,
        }
    }

    pub fn failed(artifact_type: ArtifactType, error: impl Into<String>) -> Self {
        Self {
            artifact_type,
            task_id: None,
            status: TaskStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// 持久化的流水线状态
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineState {
    pub status: PipelineStatus,
    pub step: Option<Step>,
    pub step_detail: String,
    pub source_ref: Option<SourceRef>,
    pub notebook_id: Option<String>,
    pub notebook_url: Option<String>,
    pub notebook_title: Option<String>,
    pub source_id: Option<String>,
    pub tasks: Vec<TaskRecord>,
    pub error: Option<String>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub step_started_at: Option<i64>,
}

impl PipelineState {
    /// 空闲模板
    pub fn idle() -> Self {
        Self::default()
    }

    /// 新任务的初始记录，整条覆盖旧记录
    pub fn started(source_ref: SourceRef, now_ms: i64) -> Self {
        Self {
            status: PipelineStatus::Running,
            step: Some(Step::Auth),
            step_detail: "Checking sign-in…".to_string(),
            source_ref: Some(source_ref),
            started_at: Some(now_ms),
            step_started_at: Some(now_ms),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == PipelineStatus::Running
    }

    /// 正在运行中的阶段
    pub fn active_step(&self) -> Option<Step> {
        if self.is_running() {
            self.step
        } else {
            None
        }
    }

    /// 进入新阶段并重置阶段计时
    pub fn enter_step(&mut self, step: Step, detail: impl Into<String>, now_ms: i64) {
        self.step = Some(step);
        self.step_detail = detail.into();
        self.step_started_at = Some(now_ms);
    }

    /// 当前阶段已耗时
    pub fn step_elapsed(&self, now_ms: i64) -> Duration {
        let started = self.step_started_at.unwrap_or(now_ms);
        Duration::from_millis(now_ms.saturating_sub(started).max(0) as u64)
    }

    /// 终止为失败
    pub fn fail(&mut self, message: impl Into<String>, now_ms: i64) {
        let message = message.into();
        self.status = PipelineStatus::Error;
        self.step = Some(Step::Error);
        self.step_detail = message.clone();
        self.error = Some(message);
        self.completed_at = Some(now_ms);
    }

    /// 终止为完成
    pub fn complete(&mut self, summary: impl Into<String>, now_ms: i64) {
        self.status = PipelineStatus::Completed;
        self.step = Some(Step::Done);
        self.step_detail = summary.into();
        self.error = None;
        self.completed_at = Some(now_ms);
    }

    /// 同一次运行的标识（用于丢弃过期 tick 的结果）
    pub fn run_key(&self) -> Option<i64> {
        self.started_at
    }

    pub fn completed_count(&self) -> usize {
        self.count_status(TaskStatus::Completed)
    }

    pub fn failed_count(&self) -> usize {
        self.count_status(TaskStatus::Failed)
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.status.is_active()).count()
    }

    fn count_status(&self, status: TaskStatus) -> usize {
        self.tasks.iter().filter(|t| t.status == status).count()
    }
}
