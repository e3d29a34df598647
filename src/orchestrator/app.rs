//! 应用装配 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：读取产物设置，创建传输层、客户端、状态存储和调度器
//! 2. **宿主模式**：外部唤醒（cron 执行 `tick`）或进程内定时唤醒（`run`）
//! 3. **前台等待**：`start --wait` 使用有界的就绪等待，然后在前台逐次 tick
//!
//! 只做装配和调度，不做具体业务判断

use crate::clients::{NotebookApi, NotebookClient};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{
    ExternalScheduler, HttpTransport, IntervalScheduler, StateStore, Wake, WakeScheduler,
};
use crate::models::{load_artifact_settings, PipelineState};
use crate::orchestrator::readiness;
use crate::services::DesktopEffects;
use crate::workflow::Pipeline;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 唤醒方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    /// 进程外部唤醒，每次进程只执行一个命令
    External,
    /// 进程内定时唤醒
    Interval,
}

/// 应用主结构
pub struct App {
    config: Config,
    api: Arc<dyn NotebookApi>,
    pipeline: Pipeline,
    wakes: Option<mpsc::Receiver<Wake>>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config, mode: HostMode) -> AppResult<Self> {
        let settings = load_artifact_settings(&config.settings_file).await?;
        let enabled: Vec<&str> = settings
            .enabled_types()
            .iter()
            .map(|t| t.label())
            .collect();
        info!("🧩 已开启的产物: {}", enabled.join(", "));

        let transport = HttpTransport::new(&config)?;
        let api: Arc<dyn NotebookApi> = Arc::new(NotebookClient::new(transport));
        let store = StateStore::file(&config.state_file);

        let (scheduler, wakes) = match mode {
            HostMode::External => {
                let scheduler: Arc<dyn WakeScheduler> = Arc::new(ExternalScheduler::new());
                (scheduler, None)
            }
            HostMode::Interval => {
                let (interval, rx) = IntervalScheduler::new();
                let scheduler: Arc<dyn WakeScheduler> = Arc::new(interval);
                (scheduler, Some(rx))
            }
        };

        let pipeline = Pipeline::new(&config, api.clone(), store)
            .with_settings(settings)
            .with_scheduler(scheduler)
            .with_effects(Arc::new(DesktopEffects));

        Ok(Self {
            config,
            api,
            pipeline,
            wakes,
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 进程内定时唤醒，直到任务结束或收到 Ctrl-C
    pub async fn run_daemon(&mut self) -> AppResult<PipelineState> {
        let mut wakes = self.wakes.take().ok_or_else(|| {
            AppError::InvalidState("外部唤醒模式下不能运行守护循环".to_string())
        })?;

        let state = self.pipeline.resume().await?;
        if !state.is_running() {
            info!("💤 没有运行中的任务");
            return Ok(state);
        }

        // 先立即执行一次，不等第一个周期；停滞的非轮询阶段在这里收尾
        let mut state = self.pipeline.tick().await?;
        if state.is_running() && !is_polling(&state) {
            warn!("⚠️ 任务停在非轮询阶段，没有可等待的唤醒: {}", state.step_detail);
            return Ok(state);
        }
        while is_polling(&state) {
            tokio::select! {
                wake = wakes.recv() => {
                    if wake.is_none() {
                        break;
                    }
                    state = self.pipeline.tick().await?;
                    info!("📍 {}", state.step_detail);
                }
                _ = tokio::signal::ctrl_c() => {
                    warn!("⏸️ 收到中断信号，停止唤醒（任务状态保留，可稍后继续）");
                    self.pipeline.scheduler().clear();
                    break;
                }
            }
        }

        Ok(state)
    }

    /// 前台等待来源就绪，然后逐次 tick 直到结束
    ///
    /// 等待来源时使用有界轮询，Ctrl-C 作为取消条件
    pub async fn wait_in_foreground(&self) -> AppResult<PipelineState> {
        let state = self.pipeline.get_state().await?;
        let (Some(notebook_id), Some(source_id)) = (&state.notebook_id, &state.source_id) else {
            return Ok(state);
        };

        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::SeqCst);
            }
        });

        let timing = self.pipeline.timing();
        let max_attempts = (timing.source_timeout.as_secs() / timing.poll_interval.as_secs().max(1))
            .max(1) as usize;
        let ready = readiness::wait_for_source_ready(
            self.api.as_ref(),
            notebook_id,
            source_id,
            timing.poll_interval,
            max_attempts,
            || cancelled.load(Ordering::SeqCst),
        )
        .await;

        if let Err(e) = ready {
            watcher.abort();
            if matches!(e, AppError::AbortedByUser) {
                warn!("⏸️ 已停止前台等待，任务仍可由 tick 继续");
                return self.pipeline.get_state().await;
            }
            // 其余情况交给 tick 按阶段规则收尾
            warn!("⚠️ 前台等待结束: {}", e);
        }

        let mut state = self.pipeline.tick().await?;
        while is_polling(&state) && !cancelled.load(Ordering::SeqCst) {
            tokio::time::sleep(timing.poll_interval).await;
            state = self.pipeline.tick().await?;
            info!("📍 {}", state.step_detail);
        }
        watcher.abort();

        Ok(state)
    }
}

/// 处于需要定时唤醒的阶段
fn is_polling(state: &PipelineState) -> bool {
    state.active_step().map(|s| s.is_polling()).unwrap_or(false)
}
