//! 有界的来源就绪等待 - 编排层
//!
//! 给允许长时间占用的前台调用者使用（例如 `start --wait`）。
//! 与 tick 机制等价但不共享任何可变状态：只读远端，不写流水线状态。

use crate::clients::NotebookApi;
use crate::error::{AppError, AppResult};
use crate::models::{SourceInfo, SourceStatus};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 轮询直到来源就绪
///
/// 每次网络等待前后都检查取消条件。
///
/// # 参数
/// - `api`: 远端能力
/// - `notebook_id`: 笔记本ID
/// - `source_id`: 要等待的来源ID
/// - `interval`: 两次检查之间的间隔
/// - `max_attempts`: 最多检查次数
/// - `is_cancelled`: 取消条件
///
/// # 返回
/// 就绪的来源；出错、超过次数或被取消时返回对应错误
pub async fn wait_for_source_ready<F>(
    api: &dyn NotebookApi,
    notebook_id: &str,
    source_id: &str,
    interval: Duration,
    max_attempts: usize,
    is_cancelled: F,
) -> AppResult<SourceInfo>
where
    F: Fn() -> bool,
{
    for attempt in 1..=max_attempts {
        if is_cancelled() {
            return Err(AppError::AbortedByUser);
        }

        let result = api.list_sources(notebook_id).await;

        if is_cancelled() {
            return Err(AppError::AbortedByUser);
        }

        match result {
            Ok(sources) => match sources.into_iter().find(|s| s.id == source_id) {
                Some(source) if source.status == SourceStatus::Ready => {
                    info!("✓ 来源已就绪 (第 {} 次检查)", attempt);
                    return Ok(source);
                }
                Some(source) if source.status == SourceStatus::Error => {
                    return Err(AppError::SourceProcessing(format!(
                        "来源 {} 处理失败",
                        source.title
                    )));
                }
                Some(_) => debug!("来源处理中 ({}/{})", attempt, max_attempts),
                None => debug!("来源尚未出现 ({}/{})", attempt, max_attempts),
            },
            Err(e) if e.is_transient() => {
                warn!("⚠️ 检查来源失败，稍后重试: {}", e);
            }
            Err(e) => return Err(e),
        }

        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }

    Err(AppError::PhaseTimeout {
        phase: "wait_source".to_string(),
    })
}
