//! 基础设施层
//!
//! 持有稀缺资源（HTTP 客户端、凭证缓存、状态文件、定时器），只暴露能力

pub mod scheduler;
pub mod session;
pub mod state_store;
pub mod transport;

pub use scheduler::{ExternalScheduler, IntervalScheduler, Wake, WakeScheduler};
pub use session::{Credentials, SessionContext};
pub use state_store::{JsonFileStore, MemoryStore, StatePersistence, StateStore};
pub use transport::HttpTransport;
