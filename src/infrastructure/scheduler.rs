//! 唤醒调度 - 基础设施层
//!
//! 轮询阶段不在进程内循环，而是由外部周期性唤醒，每次唤醒执行一次 tick。
//! 宿主可能在两次唤醒之间被杀掉，所以调度器只负责"提醒"，不携带任何状态。

use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// 周期唤醒信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wake;

/// 周期唤醒的调度接口
pub trait WakeScheduler: Send + Sync {
    /// 按给定周期开始唤醒，已有的唤醒会被替换
    fn arm(&self, period: Duration);

    /// 取消待触发的唤醒
    fn clear(&self);

    fn is_armed(&self) -> bool;
}

/// 进程内的定时唤醒
///
/// 后台任务按周期往通道里发送 [`Wake`]，由宿主循环接收后调用 tick。
/// 错过的周期直接跳过，不补发。
pub struct IntervalScheduler {
    tx: mpsc::Sender<Wake>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl IntervalScheduler {
    /// 创建调度器和接收唤醒的通道
    pub fn new() -> (Self, mpsc::Receiver<Wake>) {
        let (tx, rx) = mpsc::channel(1);
        (
            Self {
                tx,
                timer: Mutex::new(None),
            },
            rx,
        )
    }
}

impl WakeScheduler for IntervalScheduler {
    fn arm(&self, period: Duration) {
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // 第一次 tick 立即返回
            interval.tick().await;
            loop {
                interval.tick().await;
                // 通道满说明上一次唤醒还没处理，丢弃即可
                match tx.try_send(Wake) {
                    Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });

        if let Ok(mut timer) = self.timer.lock() {
            if let Some(previous) = timer.replace(handle) {
                previous.abort();
            }
        }
        debug!("⏰ 已设置唤醒，周期 {:?}", period);
    }

    fn clear(&self) {
        if let Ok(mut timer) = self.timer.lock() {
            if let Some(handle) = timer.take() {
                handle.abort();
                debug!("⏰ 已取消唤醒");
            }
        }
    }

    fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .map(|timer| timer.as_ref().map(|h| !h.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }
}

impl Drop for IntervalScheduler {
    fn drop(&mut self) {
        self.clear();
    }
}

/// 由进程外部唤醒（例如 cron 定时执行 `tick` 子命令）
///
/// 只记录期望的周期，宿主据此决定是否继续调度
#[derive(Default)]
pub struct ExternalScheduler {
    period: Mutex<Option<Duration>>,
}

impl ExternalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前期望的唤醒周期
    pub fn period(&self) -> Option<Duration> {
        self.period.lock().map(|p| *p).unwrap_or(None)
    }
}

impl WakeScheduler for ExternalScheduler {
    fn arm(&self, period: Duration) {
        if let Ok(mut current) = self.period.lock() {
            *current = Some(period);
        }
    }

    fn clear(&self) {
        if let Ok(mut current) = self.period.lock() {
            *current = None;
        }
    }

    fn is_armed(&self) -> bool {
        self.period().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interval_scheduler_emits_wakes() {
        let (scheduler, mut rx) = IntervalScheduler::new();
        scheduler.arm(Duration::from_secs(30));
        assert!(scheduler.is_armed());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(rx.recv().await, Some(Wake));

        scheduler.clear();
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_previous_timer() {
        let (scheduler, mut rx) = IntervalScheduler::new();
        scheduler.arm(Duration::from_secs(1000));
        scheduler.arm(Duration::from_secs(5));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(rx.recv().await, Some(Wake));
        scheduler.clear();
    }

    #[test]
    fn test_external_scheduler_records_period() {
        let scheduler = ExternalScheduler::new();
        assert!(!scheduler.is_armed());
        scheduler.arm(Duration::from_secs(30));
        assert_eq!(scheduler.period(), Some(Duration::from_secs(30)));
        scheduler.clear();
        assert!(!scheduler.is_armed());
    }
}
