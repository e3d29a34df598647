//! 领域操作层
//!
//! 每个远端能力一个方法，构建在传输层之上

pub mod notebook_client;
pub mod params;

pub use notebook_client::{NotebookApi, NotebookClient};
