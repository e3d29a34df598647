//! API 模块
//!
//! 远端协议的纯逻辑部分：方法常量、编解码、结果提取

pub mod codec;
pub mod extract;
pub mod rpc_methods;

// 重新导出常用函数
pub use codec::{decode, encode, parse_frames, Frame};
pub use extract::{extract_id, extract_id_with_depth};
