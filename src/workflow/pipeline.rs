//! 笔记本生成流水线 - 流程层
//!
//! 核心职责：定义"一次生成"的完整流程
//!
//! 流程顺序：
//! 1. 登录 → 创建笔记本 → 添加来源（启动命令内同步完成）
//! 2. 等待来源解析（定时 tick）
//! 3. 依次请求产物 → 等待全部产物结束（定时 tick）
//!
//! 所有状态写入都带上本次运行的标识，运行被中止或被新任务覆盖后，
//! 还在路上的调用结果会被丢弃。

use crate::clients::NotebookApi;
use crate::config::{Config, PipelineTiming};
use crate::error::{AppError, AppResult};
use crate::infrastructure::{ExternalScheduler, StateStore, WakeScheduler};
use crate::models::{
    ArtifactSettings, FileDescriptor, PipelineState, SourceKind, SourceRef, Step,
};
use crate::services::{CompletionEffects, DesktopEffects};
use crate::utils::{truncate_text, Clock, SystemClock};
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info, warn};

/// 流水线
///
/// - 持有远端能力、状态存储、唤醒调度和完成副作用
/// - 对外暴露启动、查询、重置、中止和 tick
/// - 不持有任何跨 tick 的内存状态，一切从持久化状态重新计算
pub struct Pipeline {
    pub(super) api: Arc<dyn NotebookApi>,
    pub(super) store: StateStore,
    pub(super) scheduler: Arc<dyn WakeScheduler>,
    pub(super) effects: Arc<dyn CompletionEffects>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) settings: ArtifactSettings,
    pub(super) timing: PipelineTiming,
    pub(super) config: Config,
}

impl Pipeline {
    /// 创建新的流水线
    ///
    /// 默认使用外部唤醒、桌面副作用、系统时钟和默认产物设置
    pub fn new(config: &Config, api: Arc<dyn NotebookApi>, store: StateStore) -> Self {
        Self {
            api,
            store,
            scheduler: Arc::new(ExternalScheduler::new()),
            effects: Arc::new(DesktopEffects),
            clock: Arc::new(SystemClock),
            settings: ArtifactSettings::default(),
            timing: config.timing(),
            config: config.clone(),
        }
    }

    pub fn with_settings(mut self, settings: ArtifactSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<dyn WakeScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_effects(mut self, effects: Arc<dyn CompletionEffects>) -> Self {
        self.effects = effects;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_timing(mut self, timing: PipelineTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn scheduler(&self) -> &Arc<dyn WakeScheduler> {
        &self.scheduler
    }

    pub fn timing(&self) -> PipelineTiming {
        self.timing
    }

    pub fn settings(&self) -> &ArtifactSettings {
        &self.settings
    }

    pub(super) fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    // ========== 命令 ==========

    /// 以 URL / YouTube / 文本启动新任务
    ///
    /// 同步完成登录、创建笔记本、添加来源，然后进入等待来源阶段并设置唤醒。
    /// 旧记录（无论是否在运行）被整条覆盖。
    ///
    /// # 参数
    /// - `source`: URL 或粘贴的文本
    /// - `kind`: 来源类型
    ///
    /// # 返回
    /// 进入等待阶段后的状态；初始化失败时状态记为错误并返回原始错误
    pub async fn start_pipeline(&self, source: &str, kind: SourceKind) -> AppResult<PipelineState> {
        if source.trim().is_empty() {
            return Err(AppError::InvalidState("来源不能为空".to_string()));
        }
        self.run_setup(SourceRef::from_input(source, kind)).await
    }

    /// 以本地文件启动新任务
    pub async fn start_pipeline_from_file(&self, file: FileDescriptor) -> AppResult<PipelineState> {
        self.run_setup(SourceRef::File { file }).await
    }

    pub async fn get_state(&self) -> AppResult<PipelineState> {
        self.store.get().await
    }

    /// 清空为初始状态
    pub async fn reset_state(&self) -> AppResult<PipelineState> {
        self.scheduler.clear();
        let state = self.store.replace(PipelineState::idle()).await?;
        info!("🔄 状态已重置");
        Ok(state)
    }

    /// 中止正在运行的任务
    ///
    /// 取消唤醒并把状态改回空闲。已经发出的请求会继续完成，
    /// 但其结果在提交时因运行标识不匹配而被丢弃。
    pub async fn abort_pipeline(&self) -> AppResult<PipelineState> {
        self.scheduler.clear();
        let mut aborted = false;
        let state = self
            .store
            .update(|state| {
                if state.is_running() {
                    *state = PipelineState::idle();
                    aborted = true;
                }
            })
            .await?;

        if aborted {
            info!("⏹️ 流水线已中止");
        }
        Ok(state)
    }

    /// 宿主重启后，按持久化状态恢复唤醒
    pub async fn resume(&self) -> AppResult<PipelineState> {
        let state = self.store.get().await?;
        if state.active_step().map(|s| s.is_polling()).unwrap_or(false) {
            info!("♻️ 恢复轮询阶段: {}", state.step_detail);
            self.scheduler.arm(self.timing.poll_interval);
        }
        Ok(state)
    }

    // ========== 初始化阶段 ==========

    async fn run_setup(&self, source_ref: SourceRef) -> AppResult<PipelineState> {
        if self.settings.enabled_types().is_empty() {
            return Err(AppError::Config("没有开启任何产物类型".to_string()));
        }

        self.scheduler.clear();
        let now = self.now();
        let state = self
            .store
            .replace(PipelineState::started(source_ref.clone(), now))
            .await?;
        let run_key = state.run_key();
        info!(
            "🚀 开始新任务: {}",
            truncate_text(&source_ref.display_name(), 80)
        );

        let mut notebook_id = None;
        match self.setup_phases(run_key, &source_ref, &mut notebook_id).await {
            Ok(state) => Ok(state),
            Err(e) => {
                self.fail_setup(run_key, &e, notebook_id.as_deref()).await?;
                Err(e)
            }
        }
    }

    async fn setup_phases(
        &self,
        run_key: Option<i64>,
        source_ref: &SourceRef,
        notebook_id: &mut Option<String>,
    ) -> AppResult<PipelineState> {
        // ① 登录
        self.api.ensure_signed_in().await?;
        info!("✓ 已登录");

        // ② 创建笔记本
        let now = self.now();
        self.advance(run_key, move |s| {
            s.enter_step(Step::CreateNotebook, "Creating notebook…", now)
        })
        .await?;

        let title = truncate_text(&source_ref.display_name(), 100);
        let notebook = self.api.create_notebook(&title).await?;
        let id = notebook
            .id
            .ok_or_else(|| AppError::ProtocolDecode("创建笔记本后没有拿到ID".to_string()))?;
        *notebook_id = Some(id.clone());
        let url = self.config.notebook_url(&id);
        info!("✓ 笔记本已创建: {}", url);

        let now = self.now();
        self.advance(run_key, move |s| {
            s.notebook_id = Some(id);
            s.notebook_url = Some(url);
            s.notebook_title = Some(notebook.title);
            s.enter_step(Step::AddSource, "Adding source…", now);
        })
        .await?;

        // ③ 添加来源
        let notebook_id = notebook_id.clone().unwrap_or_default();
        let source_id = match source_ref {
            SourceRef::File { file } => {
                let bytes = fs::read(&file.path).await?;
                self.api
                    .add_file_source(&notebook_id, &file.filename, bytes, &file.mime_type)
                    .await?
            }
            other => self.api.add_source(&notebook_id, other).await?,
        };
        info!("✓ 来源已添加: {}", source_id);

        // ④ 进入轮询
        let now = self.now();
        let state = self
            .advance(run_key, move |s| {
                s.source_id = Some(source_id);
                s.enter_step(Step::WaitSource, "Waiting for source to be processed…", now);
            })
            .await?;

        self.scheduler.arm(self.timing.poll_interval);
        info!(
            "⏳ 等待来源解析，每 {}s 检查一次",
            self.timing.poll_interval.as_secs()
        );
        Ok(state)
    }

    /// 初始化失败：记为错误并删除已创建的笔记本（来源还没就绪，没有任何产出）
    async fn fail_setup(
        &self,
        run_key: Option<i64>,
        cause: &AppError,
        notebook_id: Option<&str>,
    ) -> AppResult<()> {
        self.scheduler.clear();

        if !matches!(cause, AppError::AbortedByUser) {
            let now = self.now();
            let detail = cause.to_string();
            let committed = self
                .commit(run_key, move |s| {
                    let context = match s.step {
                        Some(Step::Auth) => "Sign-in check failed",
                        Some(Step::CreateNotebook) => "Could not create notebook",
                        Some(Step::AddSource) => "Could not add source",
                        _ => "Setup failed",
                    };
                    s.fail(format!("{}: {}", context, detail), now);
                })
                .await?;

            if let Some(state) = committed {
                let message = state.error.clone().unwrap_or_default();
                error!("❌ {}", message);
                self.effects.notify("Pipeline failed", &message, None).await;
            }
        } else {
            info!("⏹️ 初始化过程中任务被中止");
        }

        if let Some(id) = notebook_id {
            self.delete_notebook_quietly(id).await;
        }
        Ok(())
    }

    // ========== 状态提交 ==========

    /// 只在同一次运行仍在进行时提交修改
    ///
    /// # 返回
    /// 提交后的状态；运行已结束或被替换时为 `None`
    pub(super) async fn commit<F>(
        &self,
        run_key: Option<i64>,
        mutate: F,
    ) -> AppResult<Option<PipelineState>>
    where
        F: FnOnce(&mut PipelineState) + Send,
    {
        let mut applied = false;
        let state = self
            .store
            .update(|state| {
                if state.is_running() && state.run_key() == run_key {
                    mutate(state);
                    applied = true;
                }
            })
            .await?;

        Ok(applied.then_some(state))
    }

    /// 同 `commit`，运行已不在时返回 `AbortedByUser`
    async fn advance<F>(&self, run_key: Option<i64>, mutate: F) -> AppResult<PipelineState>
    where
        F: FnOnce(&mut PipelineState) + Send,
    {
        self.commit(run_key, mutate)
            .await?
            .ok_or(AppError::AbortedByUser)
    }

    pub(super) async fn delete_notebook_quietly(&self, notebook_id: &str) {
        if let Err(e) = self.api.delete_notebook(notebook_id).await {
            warn!("⚠️ 删除笔记本 {} 失败: {}", notebook_id, e);
        }
    }
}
