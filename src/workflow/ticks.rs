//! 轮询阶段的 tick - 流程层
//!
//! 每次唤醒执行一次，只依据持久化状态计算，不依赖上一次 tick 的内存。
//! 空闲或已结束时 tick 什么也不做；非轮询阶段只检查是否停滞。
//! 轮询调用出错时不推进状态，由阶段超时兜底。

use crate::error::{AppError, AppResult};
use crate::models::{PipelineState, SourceStatus, Step, TaskRecord, TaskStatus};
use crate::workflow::pipeline::Pipeline;
use crate::workflow::summary::{self, Outcome};
use tracing::{debug, error, info, warn};

impl Pipeline {
    /// 执行一次 tick
    ///
    /// # 返回
    /// tick 之后的状态
    pub async fn tick(&self) -> AppResult<PipelineState> {
        let state = self.store.get().await?;

        match state.active_step() {
            Some(Step::WaitSource) => self.tick_wait_source(state).await,
            Some(Step::WaitArtifacts) => self.tick_wait_artifacts(state).await,
            Some(step) => self.tick_stalled_step(state, step).await,
            None => {
                if self.scheduler.is_armed() {
                    self.scheduler.clear();
                }
                debug!("没有运行中的任务，跳过 tick");
                Ok(state)
            }
        }
    }

    /// 非轮询阶段由命令或 tick 同步推进，正常情况下不会停留太久。
    /// 超过产物生成时限仍未离开，说明推进它的进程已经退出，按失败结束。
    async fn tick_stalled_step(
        &self,
        state: PipelineState,
        step: Step,
    ) -> AppResult<PipelineState> {
        let elapsed = state.step_elapsed(self.now());
        if elapsed <= self.timing.generation_timeout {
            debug!("阶段 {} 不需要轮询，跳过 tick", step);
            return Ok(state);
        }

        warn!("⚠️ 阶段 {} 已停留 {}s，判定为中断", step, elapsed.as_secs());
        self.fail_run(
            state.run_key(),
            format!(
                "Pipeline stalled during {} (no progress for {}s)",
                step,
                elapsed.as_secs()
            ),
            AppError::PhaseTimeout {
                phase: step.to_string(),
            },
            None,
        )
        .await
    }

    // ========== 等待来源 ==========

    async fn tick_wait_source(&self, state: PipelineState) -> AppResult<PipelineState> {
        let run_key = state.run_key();
        let Some(notebook_id) = state.notebook_id.clone() else {
            return self
                .fail_run(
                    run_key,
                    "Notebook id missing from state".to_string(),
                    AppError::InvalidState("等待来源时没有笔记本ID".to_string()),
                    None,
                )
                .await;
        };

        let elapsed = state.step_elapsed(self.now());
        if elapsed > self.timing.source_timeout {
            return self
                .fail_run(
                    run_key,
                    format!(
                        "Source was not processed within {}s",
                        self.timing.source_timeout.as_secs()
                    ),
                    AppError::PhaseTimeout {
                        phase: Step::WaitSource.to_string(),
                    },
                    Some(&notebook_id),
                )
                .await;
        }

        let sources = match self.api.list_sources(&notebook_id).await {
            Ok(sources) => sources,
            Err(e) => return self.poll_error(Step::WaitSource, e).await,
        };

        let source = match &state.source_id {
            Some(id) => sources.iter().find(|s| &s.id == id),
            None => sources.first(),
        };

        match source.map(|s| s.status) {
            None => {
                debug!("来源还没有出现在列表中");
                self.touch(run_key, "Waiting for source to appear…".to_string())
                    .await
            }
            Some(SourceStatus::Processing) => {
                self.touch(
                    run_key,
                    format!("Processing source… ({}s)", elapsed.as_secs()),
                )
                .await
            }
            Some(SourceStatus::Error) => {
                // 笔记本里已经有来源记录，保留
                self.fail_run(
                    run_key,
                    "Source could not be processed".to_string(),
                    AppError::SourceProcessing("来源状态为错误".to_string()),
                    None,
                )
                .await
            }
            Some(SourceStatus::Ready) => {
                let source_id = source.map(|s| s.id.clone()).unwrap_or_default();
                self.generate_artifacts(run_key, &notebook_id, &source_id)
                    .await
            }
        }
    }

    /// 依次请求所有开启的产物，整批写入任务列表后进入等待产物阶段
    async fn generate_artifacts(
        &self,
        run_key: Option<i64>,
        notebook_id: &str,
        source_id: &str,
    ) -> AppResult<PipelineState> {
        let now = self.now();
        if self
            .commit(run_key, move |s| {
                s.enter_step(
                    Step::GenerateArtifacts,
                    "Source ready, requesting artifacts…",
                    now,
                )
            })
            .await?
            .is_none()
        {
            return self.store.get().await;
        }
        info!("✓ 来源已就绪，开始请求产物");

        match self.api.get_notebook_title(notebook_id).await {
            Ok(Some(title)) => {
                self.commit(run_key, move |s| s.notebook_title = Some(title))
                    .await?;
            }
            Ok(None) => {}
            Err(e) => warn!("⚠️ 获取笔记本标题失败: {}", e),
        }

        let types = self.settings.enabled_types();
        let total = types.len();
        let source_ids = vec![source_id.to_string()];
        let mut tasks = Vec::with_capacity(total);

        for (index, artifact) in types.into_iter().enumerate() {
            if index > 0 && !self.timing.artifact_spacing.is_zero() {
                tokio::time::sleep(self.timing.artifact_spacing).await;
            }

            let detail = format!("Requesting {} ({}/{})…", artifact.label(), index + 1, total);
            if self
                .commit(run_key, move |s| s.step_detail = detail)
                .await?
                .is_none()
            {
                info!("⏹️ 任务已结束，停止请求产物");
                return self.store.get().await;
            }

            let record = match self
                .api
                .generate_artifact(notebook_id, &source_ids, artifact, &self.settings)
                .await
            {
                Ok(result) => match result.task_id {
                    Some(task_id) => {
                        info!("✓ 已请求 {} (任务 {})", artifact.label(), task_id);
                        TaskRecord::started(artifact, Some(task_id), result.status)
                    }
                    None => {
                        let cause = AppError::ArtifactGeneration {
                            artifact: artifact.to_string(),
                            message: "响应中没有任务ID".to_string(),
                        };
                        warn!("⚠️ {}", cause);
                        TaskRecord::failed(artifact, "No task id returned")
                    }
                },
                Err(e) => {
                    warn!("⚠️ 请求 {} 失败: {}", artifact.label(), e);
                    TaskRecord::failed(artifact, e.to_string())
                }
            };
            tasks.push(record);
        }

        let now = self.now();
        let Some(state) = self
            .commit(run_key, move |s| {
                s.tasks = tasks;
                s.enter_step(
                    Step::WaitArtifacts,
                    format!("Waiting for {} artifacts…", total),
                    now,
                );
            })
            .await?
        else {
            return self.store.get().await;
        };

        if state.active_count() == 0 {
            // 全部同步完成或全部请求失败
            return self.finish(run_key, state).await;
        }
        Ok(state)
    }

    // ========== 等待产物 ==========

    async fn tick_wait_artifacts(&self, state: PipelineState) -> AppResult<PipelineState> {
        let run_key = state.run_key();
        let Some(notebook_id) = state.notebook_id.clone() else {
            return self
                .fail_run(
                    run_key,
                    "Notebook id missing from state".to_string(),
                    AppError::InvalidState("等待产物时没有笔记本ID".to_string()),
                    None,
                )
                .await;
        };

        let elapsed = state.step_elapsed(self.now());
        if elapsed > self.timing.generation_timeout {
            // 笔记本里已有内容，不删除
            return self
                .fail_run(
                    run_key,
                    format!(
                        "Artifact generation timed out after {}s ({}/{} ready)",
                        self.timing.generation_timeout.as_secs(),
                        state.completed_count(),
                        state.tasks.len()
                    ),
                    AppError::PhaseTimeout {
                        phase: Step::WaitArtifacts.to_string(),
                    },
                    None,
                )
                .await;
        }

        let statuses = match self.api.list_artifact_statuses(&notebook_id).await {
            Ok(statuses) => statuses,
            Err(e) => return self.poll_error(Step::WaitArtifacts, e).await,
        };

        let Some(state) = self
            .commit(run_key, |s| {
                for task in s.tasks.iter_mut().filter(|t| t.status.is_active()) {
                    let Some(reported) = task.task_id.as_ref().and_then(|id| statuses.get(id))
                    else {
                        continue;
                    };
                    if reported.status == task.status {
                        continue;
                    }
                    match reported.status {
                        TaskStatus::Completed => info!("✓ {} 已完成", task.artifact_type.label()),
                        TaskStatus::Failed => {
                            warn!("⚠️ {} 生成失败", task.artifact_type.label());
                            task.error = Some("Generation failed".to_string());
                        }
                        _ => {}
                    }
                    task.status = reported.status;
                }
                s.step_detail = summary::progress_detail(s);
            })
            .await?
        else {
            return self.store.get().await;
        };

        if state.active_count() == 0 {
            return self.finish(run_key, state).await;
        }
        Ok(state)
    }

    // ========== 结束 ==========

    /// 所有任务结束：一个都没完成记为失败，否则完成并触发副作用
    async fn finish(&self, run_key: Option<i64>, state: PipelineState) -> AppResult<PipelineState> {
        let summary = match summary::settle_state(&state) {
            Outcome::Failed(message) => {
                let cause = AppError::ArtifactGeneration {
                    artifact: "all".to_string(),
                    message: format!("{} 个任务全部失败", state.tasks.len()),
                };
                return self.fail_run(run_key, message, cause, None).await;
            }
            Outcome::Completed(summary) => summary,
        };

        let now = self.now();
        let committed = summary.clone();
        let Some(state) = self
            .commit(run_key, move |s| s.complete(committed, now))
            .await?
        else {
            return self.store.get().await;
        };

        self.scheduler.clear();
        info!("🎉 {}", summary);

        let title = state
            .notebook_title
            .clone()
            .unwrap_or_else(|| "Notebook ready".to_string());
        self.effects.play_chime().await;
        self.effects
            .notify(&title, &summary, state.notebook_url.as_deref())
            .await;
        if self.config.auto_open_notebook {
            if let Some(url) = &state.notebook_url {
                self.effects.open_url(url).await;
            }
        }
        Ok(state)
    }

    /// 终止为失败
    ///
    /// # 参数
    /// - `message`: 写入状态的可读信息
    /// - `cause`: 日志用的错误分类
    /// - `delete_notebook`: 需要清理时传入笔记本ID
    async fn fail_run(
        &self,
        run_key: Option<i64>,
        message: String,
        cause: AppError,
        delete_notebook: Option<&str>,
    ) -> AppResult<PipelineState> {
        let now = self.now();
        let committed = message.clone();
        let Some(state) = self
            .commit(run_key, move |s| s.fail(committed, now))
            .await?
        else {
            return self.store.get().await;
        };

        self.scheduler.clear();
        error!("❌ {} ({})", message, cause);

        let open_url = match delete_notebook {
            Some(id) => {
                self.delete_notebook_quietly(id).await;
                None
            }
            None => state.notebook_url.as_deref(),
        };
        self.effects
            .notify("Pipeline failed", &message, open_url)
            .await;
        Ok(state)
    }

    /// 轮询调用出错：不推进状态，等下一次 tick
    async fn poll_error(&self, step: Step, cause: AppError) -> AppResult<PipelineState> {
        if cause.is_transient() {
            warn!("⚠️ [{}] 暂时性错误，下次 tick 重试: {}", step, cause);
        } else {
            error!("❌ [{}] 轮询失败，下次 tick 重试: {}", step, cause);
        }
        self.store.get().await
    }

    /// 只更新进度描述
    async fn touch(&self, run_key: Option<i64>, detail: String) -> AppResult<PipelineState> {
        match self.commit(run_key, move |s| s.step_detail = detail).await? {
            Some(state) => Ok(state),
            None => self.store.get().await,
        }
    }
}
