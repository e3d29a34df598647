//! 结束判定
//!
//! 所有任务离开进行中之后，按完成数决定最终结果

use crate::models::PipelineState;

/// 最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 至少一个产物完成
    Completed(String),
    /// 一个都没有完成
    Failed(String),
}

/// 根据完成数和失败数计算结果
///
/// # 参数
/// - `completed`: 已完成数量
/// - `failed`: 已失败数量
/// - `total`: 请求的产物总数
pub fn settle(completed: usize, failed: usize, total: usize) -> Outcome {
    if completed == 0 {
        return Outcome::Failed(format!(
            "No artifacts were generated ({}/{} failed)",
            failed, total
        ));
    }

    if completed == total {
        Outcome::Completed(format!("{}/{} artifacts ready", completed, total))
    } else {
        Outcome::Completed(format!(
            "{}/{} artifacts ready ({} failed)",
            completed, total, failed
        ))
    }
}

/// 按当前任务列表计算结果
pub fn settle_state(state: &PipelineState) -> Outcome {
    settle(
        state.completed_count(),
        state.failed_count(),
        state.tasks.len(),
    )
}

/// 进行中的进度描述
pub fn progress_detail(state: &PipelineState) -> String {
    format!(
        "{}/{} artifacts ready, {} in progress",
        state.completed_count(),
        state.tasks.len(),
        state.active_count()
    )
}
