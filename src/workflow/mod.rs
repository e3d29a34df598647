//! 流程层
//!
//! 定义"一次生成"的完整流程：启动命令中的同步初始化，以及两个轮询阶段的 tick

pub mod pipeline;
pub mod summary;
mod ticks;

pub use pipeline::Pipeline;
pub use summary::Outcome;
