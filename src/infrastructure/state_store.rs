//! 状态存储 - 基础设施层
//!
//! 流水线状态是唯一共享的可变资源。所有写入都是"读最新值 → 修改 → 写回"，
//! 并通过同一把异步锁排队，用户命令和定时 tick 不会互相覆盖。

use crate::error::AppResult;
use crate::models::PipelineState;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

/// 状态持久化后端
#[async_trait]
pub trait StatePersistence: Send + Sync {
    /// 读取状态，从未写入过时返回 `None`
    async fn load(&self) -> AppResult<Option<PipelineState>>;

    /// 整条写入状态
    async fn save(&self, state: &PipelineState) -> AppResult<()>;
}

/// JSON 文件后端，先写临时文件再改名
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl StatePersistence for JsonFileStore {
    async fn load(&self) -> AppResult<Option<PipelineState>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn save(&self, state: &PipelineState) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(state)?;
        fs::write(&tmp_path, data).await?;
        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

/// 内存后端
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<Option<PipelineState>>,
}

#[async_trait]
impl StatePersistence for MemoryStore {
    async fn load(&self) -> AppResult<Option<PipelineState>> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &PipelineState) -> AppResult<()> {
        *self.state.lock().await = Some(state.clone());
        Ok(())
    }
}

/// 串行化的状态存储
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn StatePersistence>,
    queue: Arc<Mutex<()>>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn StatePersistence>) -> Self {
        Self {
            backend,
            queue: Arc::new(Mutex::new(())),
        }
    }

    /// JSON 文件存储
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonFileStore::new(path)))
    }

    /// 内存存储
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    /// 读取当前状态，没有记录时返回空闲模板
    pub async fn get(&self) -> AppResult<PipelineState> {
        let _turn = self.queue.lock().await;
        self.load_or_idle().await
    }

    /// 读-改-写
    ///
    /// 闭包拿到的是最新持久化的值；没有改动时不写回。
    ///
    /// # 返回
    /// 写入后的状态
    pub async fn update<F>(&self, mutate: F) -> AppResult<PipelineState>
    where
        F: FnOnce(&mut PipelineState) + Send,
    {
        let _turn = self.queue.lock().await;
        let current = self.load_or_idle().await?;
        let mut next = current.clone();
        mutate(&mut next);

        if next != current {
            self.backend.save(&next).await?;
            debug!("状态已写入: {:?} / {:?}", next.status, next.step);
        }
        Ok(next)
    }

    /// 整条覆盖
    pub async fn replace(&self, state: PipelineState) -> AppResult<PipelineState> {
        self.update(move |current| *current = state).await
    }

    async fn load_or_idle(&self) -> AppResult<PipelineState> {
        Ok(self.backend.load().await?.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PipelineStatus, Step};

    #[tokio::test]
    async fn test_empty_store_is_idle() {
        let store = StateStore::in_memory();
        assert_eq!(store.get().await.unwrap(), PipelineState::idle());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let store = StateStore::in_memory();
        let mut handles = Vec::new();

        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(|state| {
                        let n: usize = state.step_detail.parse().unwrap_or(0);
                        state.step_detail = (n + 1).to_string();
                        if i % 7 == 0 {
                            state.status = PipelineStatus::Running;
                        }
                    })
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.get().await.unwrap().step_detail, "50");
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = StateStore::file(&path);
        store
            .update(|state| {
                state.status = PipelineStatus::Running;
                state.step = Some(Step::WaitSource);
                state.notebook_id = Some("nb-1".to_string());
            })
            .await
            .unwrap();

        let reopened = StateStore::file(&path);
        let state = reopened.get().await.unwrap();
        assert_eq!(state.step, Some(Step::WaitSource));
        assert_eq!(state.notebook_id.as_deref(), Some("nb-1"));
        assert!(!path.with_extension("json.tmp").exists());
    }
}
