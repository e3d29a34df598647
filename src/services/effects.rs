//! 完成副作用 - 业务能力层
//!
//! 只负责"通知用户"能力：提示音、系统通知、打开笔记本。
//! 都是即发即忘，失败只记日志，不影响流水线状态。

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::process::Command;
use tracing::{info, warn};

/// 流水线结束时触发的副作用
#[async_trait]
pub trait CompletionEffects: Send + Sync {
    /// 播放提示音
    async fn play_chime(&self);

    /// 发送系统通知
    ///
    /// # 参数
    /// - `title`: 通知标题
    /// - `message`: 可读的摘要
    /// - `open_url`: 点击通知时打开的地址
    async fn notify(&self, title: &str, message: &str, open_url: Option<&str>);

    /// 打开笔记本地址
    async fn open_url(&self, url: &str);
}

/// 桌面环境的实现
///
/// 通知和提示音走日志，打开地址调用系统命令
pub struct DesktopEffects;

impl DesktopEffects {
    fn opener() -> &'static str {
        if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        }
    }
}

#[async_trait]
impl CompletionEffects for DesktopEffects {
    async fn play_chime(&self) {
        // 终端响铃
        eprint!("\x07");
    }

    async fn notify(&self, title: &str, message: &str, open_url: Option<&str>) {
        match open_url {
            Some(url) => info!("🔔 {}: {} ({})", title, message, url),
            None => info!("🔔 {}: {}", title, message),
        }
    }

    async fn open_url(&self, url: &str) {
        match Command::new(Self::opener()).arg(url).spawn() {
            Ok(_) => info!("🌐 已打开 {}", url),
            Err(e) => warn!("⚠️ 无法打开 {}: {}", url, e),
        }
    }
}

/// 一次副作用调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEffect {
    Chime,
    Notify {
        title: String,
        message: String,
        open_url: Option<String>,
    },
    Open(String),
}

/// 只记录调用的实现，用于测试和无界面环境
#[derive(Default)]
pub struct RecordingEffects {
    calls: Mutex<Vec<RecordedEffect>>,
}

impl RecordingEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// 到目前为止的全部调用
    pub fn calls(&self) -> Vec<RecordedEffect> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn record(&self, effect: RecordedEffect) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(effect);
        }
    }
}

#[async_trait]
impl CompletionEffects for RecordingEffects {
    async fn play_chime(&self) {
        self.record(RecordedEffect::Chime);
    }

    async fn notify(&self, title: &str, message: &str, open_url: Option<&str>) {
        self.record(RecordedEffect::Notify {
            title: title.to_string(),
            message: message.to_string(),
            open_url: open_url.map(str::to_string),
        });
    }

    async fn open_url(&self, url: &str) {
        self.record(RecordedEffect::Open(url.to_string()));
    }
}
