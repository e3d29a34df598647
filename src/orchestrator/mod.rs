//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责装配和唤醒调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用装配
//! - 创建传输层、客户端、状态存储和调度器
//! - 进程内定时唤醒的守护循环
//! - 前台等待（`start --wait`）
//!
//! ### `readiness` - 有界的来源就绪等待
//! - 带取消条件的前台轮询，不写流水线状态
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator (装配、唤醒)
//!     ↓
//! workflow::Pipeline (启动命令 + tick)
//!     ↓
//! clients (领域操作) / services (完成副作用)
//!     ↓
//! api (编解码) + infrastructure (传输、凭证、状态存储、调度)
//! ```

pub mod app;
pub mod readiness;

pub use app::{App, HostMode};
pub use readiness::wait_for_source_ready;
