//! # Notebook Pipeline
//!
//! 把一个文档或链接变成包含多种生成产物（音频、视频、报告、测验……）的笔记本
//!
//! ## 架构设计
//!
//! 本系统采用分层架构，只向下依赖：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `SessionContext` - 凭证缓存，401/403 后失效
//! - `HttpTransport` - 唯一发出网络请求的地方
//! - `StateStore` - 串行化的状态读写
//! - `WakeScheduler` - 周期唤醒
//!
//! ### ② 协议层（Api）
//! - `api/` - 纯函数：请求封装、响应分帧解码、通用ID提取
//!
//! ### ③ 领域操作层（Clients）
//! - `clients/` - 每个远端能力一个方法：参数骨架 + 结果解读
//! - `NotebookApi` - 流程层依赖的能力接口
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 启动命令中的同步初始化与两个轮询阶段的 tick
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/` - 应用装配、守护循环、前台等待
//!
//! ## 模块结构

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{NotebookApi, NotebookClient};
pub use config::{Config, PipelineTiming};
pub use error::{AppError, AppResult};
pub use infrastructure::{StateStore, WakeScheduler};
pub use models::{PipelineState, PipelineStatus, SourceKind, Step};
pub use orchestrator::{App, HostMode};
pub use workflow::Pipeline;
