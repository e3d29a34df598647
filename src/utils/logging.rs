/// 日志工具模块
///
/// 提供日志初始化和输出的辅助函数
use crate::config::Config;
use crate::models::PipelineState;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先，否则默认 `notebook_pipeline=info`，verbose 时为 `debug`。
/// 重复初始化不会报错。
///
/// # 参数
/// - `verbose`: 是否输出调试日志
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("notebook_pipeline={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 笔记本生成流水线");
    info!("🌐 服务地址: {}", config.base_url);
    info!("💾 状态文件: {}", config.state_file.display());
    info!(
        "⏱️ 轮询间隔: {}s | 来源超时: {}s | 生成超时: {}s",
        config.poll_interval_secs, config.source_timeout_secs, config.generation_timeout_secs
    );
    info!("{}", "=".repeat(60));
}

/// 打印当前状态概要
///
/// # 参数
/// - `state`: 流水线状态
pub fn log_state(state: &PipelineState) {
    info!("{}", "─".repeat(60));
    info!("📊 状态: {:?}", state.status);
    if let Some(step) = state.step {
        info!("📍 阶段: {} | {}", step, truncate_text(&state.step_detail, 80));
    }
    if let Some(url) = &state.notebook_url {
        info!("📓 笔记本: {}", url);
    }
    for task in &state.tasks {
        info!(
            "  - {} {:?} {}",
            task.artifact_type.label(),
            task.status,
            task.error.as_deref().unwrap_or_default()
        );
    }
    if let Some(error) = &state.error {
        info!("❌ 错误: {}", error);
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("一二三四五", 3), "一二三...");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(false);
        init(true);
    }
}
