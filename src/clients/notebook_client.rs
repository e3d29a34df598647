/// 笔记本服务客户端
///
/// 每个远端能力一个方法：参数整形 + 传输调用 + 结果解读。
/// 响应没有稳定 schema，结果解读一律"先按已知位置取，再交给通用提取器"。
use crate::api::extract::extract_id;
use crate::api::rpc_methods as rpc;
use crate::clients::params;
use crate::error::{AppError, AppResult};
use crate::infrastructure::HttpTransport;
use crate::models::artifact_options::{
    AudioOptions, DataTableOptions, InfographicOptions, QuizOptions, ReportOptions,
    SlideDeckOptions, VideoOptions,
};
use crate::models::{
    ArtifactSettings, ArtifactStatus, ArtifactType, GenerationResult, NotebookInfo, SourceInfo,
    SourceRef, SourceStatus, TaskStatus,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// 编排层依赖的远端能力
///
/// 流水线只依赖这个 trait，测试中可以替换为脚本化的实现。
#[async_trait]
pub trait NotebookApi: Send + Sync {
    /// 确认已登录（获取凭证）
    async fn ensure_signed_in(&self) -> AppResult<()>;

    async fn create_notebook(&self, title: &str) -> AppResult<NotebookInfo>;

    async fn delete_notebook(&self, notebook_id: &str) -> AppResult<()>;

    /// 添加 URL / YouTube / 文本来源，返回来源ID
    async fn add_source(&self, notebook_id: &str, source: &SourceRef) -> AppResult<String>;

    /// 通过可续传上传添加文件来源，返回来源ID
    async fn add_file_source(
        &self,
        notebook_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> AppResult<String>;

    async fn list_sources(&self, notebook_id: &str) -> AppResult<Vec<SourceInfo>>;

    /// 笔记本显示标题，取不到时为 `None`
    async fn get_notebook_title(&self, notebook_id: &str) -> AppResult<Option<String>>;

    /// 按类型请求生成一个产物
    async fn generate_artifact(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        artifact: ArtifactType,
        settings: &ArtifactSettings,
    ) -> AppResult<GenerationResult>;

    /// 一次调用取回所有产物状态
    async fn list_artifact_statuses(
        &self,
        notebook_id: &str,
    ) -> AppResult<HashMap<String, ArtifactStatus>>;
}

/// 基于 HTTP 传输的实现
pub struct NotebookClient {
    transport: HttpTransport,
}

impl NotebookClient {
    /// 创建新的客户端
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    fn notebook_path(notebook_id: &str) -> String {
        format!("/notebook/{}", notebook_id)
    }

    async fn call_in(
        &self,
        method_id: &str,
        params: &Value,
        notebook_id: &str,
        allow_empty: bool,
    ) -> AppResult<Value> {
        self.transport
            .call(method_id, params, &Self::notebook_path(notebook_id), allow_empty)
            .await
    }

    pub async fn add_url_source(&self, notebook_id: &str, url: &str) -> AppResult<String> {
        let result = self
            .call_in(rpc::ADD_SOURCE, &params::add_url_source(notebook_id, url), notebook_id, false)
            .await?;
        parse_source_id(&result, "URL")
    }

    pub async fn add_youtube_source(&self, notebook_id: &str, url: &str) -> AppResult<String> {
        let result = self
            .call_in(
                rpc::ADD_SOURCE,
                &params::add_youtube_source(notebook_id, url),
                notebook_id,
                false,
            )
            .await?;
        parse_source_id(&result, "YouTube")
    }

    pub async fn add_text_source(
        &self,
        notebook_id: &str,
        title: &str,
        content: &str,
    ) -> AppResult<String> {
        let result = self
            .call_in(
                rpc::ADD_SOURCE,
                &params::add_text_source(notebook_id, title, content),
                notebook_id,
                false,
            )
            .await?;
        parse_source_id(&result, "文本")
    }

    /// 创建空笔记，返回笔记ID
    pub async fn create_note(&self, notebook_id: &str, title: &str) -> AppResult<String> {
        let result = self
            .call_in(rpc::CREATE_NOTE, &params::create_note(notebook_id, title), notebook_id, false)
            .await?;

        result
            .get(0)
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| extract_id(&result))
            .ok_or_else(|| AppError::ProtocolDecode("创建笔记的响应中没有笔记ID".to_string()))
    }

    /// 写入笔记内容
    pub async fn update_note(
        &self,
        notebook_id: &str,
        note_id: &str,
        title: &str,
        content: &str,
    ) -> AppResult<()> {
        self.call_in(
            rpc::UPDATE_NOTE,
            &params::update_note(notebook_id, note_id, title, content),
            notebook_id,
            true,
        )
        .await?;
        Ok(())
    }

    pub async fn generate_audio(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &AudioOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::audio(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_video(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &VideoOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::video(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_report(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &ReportOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::report(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_quiz(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &QuizOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::quiz(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_flashcards(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &QuizOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::flashcards(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_infographic(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &InfographicOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::infographic(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_slide_deck(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &SlideDeckOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::slide_deck(notebook_id, source_ids, options))
            .await
    }

    pub async fn generate_data_table(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        options: &DataTableOptions,
    ) -> AppResult<GenerationResult> {
        self.create_artifact(notebook_id, params::data_table(notebook_id, source_ids, options))
            .await
    }

    /// 思维导图是同步的：拿到内容后写入一条新笔记，直接视为完成
    pub async fn generate_mind_map(
        &self,
        notebook_id: &str,
        source_ids: &[String],
    ) -> AppResult<GenerationResult> {
        let result = self
            .call_in(rpc::ACT_ON_SOURCES, &params::mind_map(source_ids), notebook_id, false)
            .await?;

        let content = parse_mind_map_content(&result).ok_or_else(|| AppError::ArtifactGeneration {
            artifact: ArtifactType::MindMap.to_string(),
            message: "响应中没有思维导图内容".to_string(),
        })?;

        let title = ArtifactType::MindMap.label();
        let note_id = self.create_note(notebook_id, title).await?;
        self.update_note(notebook_id, &note_id, title, &content).await?;
        info!("✓ 思维导图已写入笔记 {}", note_id);

        Ok(GenerationResult {
            task_id: Some(note_id),
            status: TaskStatus::Completed,
        })
    }

    async fn create_artifact(&self, notebook_id: &str, params: Value) -> AppResult<GenerationResult> {
        let result = self
            .call_in(rpc::CREATE_ARTIFACT, &params, notebook_id, false)
            .await?;
        Ok(parse_generation_result(&result))
    }
}

#[async_trait]
impl NotebookApi for NotebookClient {
    async fn ensure_signed_in(&self) -> AppResult<()> {
        self.transport.session().ensure_credentials().await?;
        Ok(())
    }

    async fn create_notebook(&self, title: &str) -> AppResult<NotebookInfo> {
        let result = self
            .transport
            .call(rpc::CREATE_NOTEBOOK, &params::create_notebook(title), "/", false)
            .await?;

        let id = parse_notebook_id(&result);
        if id.is_none() {
            warn!("⚠️ 创建笔记本的响应中没有找到ID: {}", result);
        }

        Ok(NotebookInfo {
            id,
            title: title.to_string(),
        })
    }

    async fn delete_notebook(&self, notebook_id: &str) -> AppResult<()> {
        self.transport
            .call(rpc::DELETE_NOTEBOOK, &params::delete_notebook(notebook_id), "/", true)
            .await?;
        info!("🗑️ 已删除笔记本 {}", notebook_id);
        Ok(())
    }

    async fn add_source(&self, notebook_id: &str, source: &SourceRef) -> AppResult<String> {
        match source {
            SourceRef::Url { url } => self.add_url_source(notebook_id, url).await,
            SourceRef::Youtube { url } => self.add_youtube_source(notebook_id, url).await,
            SourceRef::Text { title, content } => {
                self.add_text_source(notebook_id, title, content).await
            }
            SourceRef::File { .. } => Err(AppError::InvalidState(
                "文件来源需要通过 add_file_source 上传".to_string(),
            )),
        }
    }

    async fn add_file_source(
        &self,
        notebook_id: &str,
        filename: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> AppResult<String> {
        // 1. 注册占位来源
        let result = self
            .call_in(
                rpc::REGISTER_FILE_SOURCE,
                &params::register_file_source(notebook_id, filename),
                notebook_id,
                false,
            )
            .await?;
        let source_id = parse_source_id(&result, "文件")?;
        debug!("文件来源占位ID: {}", source_id);

        // 2. 打开上传会话
        let upload_url = self
            .transport
            .start_resumable_upload(notebook_id, &source_id, filename, mime_type, bytes.len())
            .await?;

        // 3. 上传字节并结束
        let size = bytes.len();
        self.transport.upload_bytes(&upload_url, bytes).await?;
        info!("✓ 文件已上传: {} ({} 字节)", filename, size);

        Ok(source_id)
    }

    async fn list_sources(&self, notebook_id: &str) -> AppResult<Vec<SourceInfo>> {
        let result = self
            .call_in(rpc::GET_NOTEBOOK, &params::get_notebook(notebook_id), notebook_id, false)
            .await?;
        Ok(parse_sources(&result))
    }

    async fn get_notebook_title(&self, notebook_id: &str) -> AppResult<Option<String>> {
        let result = self
            .call_in(rpc::GET_NOTEBOOK, &params::get_notebook(notebook_id), notebook_id, false)
            .await?;
        Ok(parse_notebook_title(&result))
    }

    async fn generate_artifact(
        &self,
        notebook_id: &str,
        source_ids: &[String],
        artifact: ArtifactType,
        settings: &ArtifactSettings,
    ) -> AppResult<GenerationResult> {
        match artifact {
            ArtifactType::Audio => self.generate_audio(notebook_id, source_ids, &settings.audio).await,
            ArtifactType::Video => self.generate_video(notebook_id, source_ids, &settings.video).await,
            ArtifactType::Report => {
                self.generate_report(notebook_id, source_ids, &settings.report).await
            }
            ArtifactType::Quiz => self.generate_quiz(notebook_id, source_ids, &settings.quiz).await,
            ArtifactType::Flashcards => {
                self.generate_flashcards(notebook_id, source_ids, &settings.flashcards)
                    .await
            }
            ArtifactType::MindMap => self.generate_mind_map(notebook_id, source_ids).await,
            ArtifactType::Infographic => {
                self.generate_infographic(notebook_id, source_ids, &settings.infographic)
                    .await
            }
            ArtifactType::SlideDeck => {
                self.generate_slide_deck(notebook_id, source_ids, &settings.slide_deck)
                    .await
            }
            ArtifactType::DataTable => {
                self.generate_data_table(notebook_id, source_ids, &settings.data_table)
                    .await
            }
        }
    }

    async fn list_artifact_statuses(
        &self,
        notebook_id: &str,
    ) -> AppResult<HashMap<String, ArtifactStatus>> {
        let result = self
            .call_in(rpc::LIST_ARTIFACTS, &params::list_artifacts(notebook_id), notebook_id, true)
            .await?;
        Ok(parse_artifact_statuses(&result))
    }
}

// ========== 结果解读 ==========

/// 新建笔记本：第三位是ID，否则交给通用提取器
pub fn parse_notebook_id(result: &Value) -> Option<String> {
    result
        .get(2)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| extract_id(result))
}

/// 添加来源：`[[[[来源ID], 标题, ...]]]`
pub fn parse_source_id(result: &Value, kind: &str) -> AppResult<String> {
    result
        .pointer("/0/0/0/0")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| extract_id(result))
        .ok_or_else(|| AppError::ProtocolDecode(format!("添加{}来源的响应中没有来源ID", kind)))
}

/// 笔记本详情外层可能多包一层
fn notebook_body(result: &Value) -> &Value {
    match result.get(0) {
        Some(first) if first.is_array() => first,
        _ => result,
    }
}

/// 笔记本详情：`[[标题, [来源...], ID, ...]]`
pub fn parse_sources(result: &Value) -> Vec<SourceInfo> {
    let Some(entries) = notebook_body(result).get(1).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let raw_id = entry.get(0)?;
            let id = raw_id
                .as_str()
                .map(str::to_string)
                .or_else(|| raw_id.get(0).and_then(Value::as_str).map(str::to_string))
                .or_else(|| extract_id(raw_id))?;

            let title = entry
                .get(1)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let status = SourceStatus::from_code(entry.pointer("/3/1").and_then(Value::as_i64));

            Some(SourceInfo { id, title, status })
        })
        .collect()
}

pub fn parse_notebook_title(result: &Value) -> Option<String> {
    notebook_body(result)
        .get(0)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// 生成请求的结果：`[[任务ID, 标题, 类型, 来源, 状态码, ...]]`
pub fn parse_generation_result(result: &Value) -> GenerationResult {
    let artifact = match result.get(0) {
        Some(first) if first.is_array() => first,
        _ => result,
    };

    let task_id = artifact
        .get(0)
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| extract_id(result));
    let status = TaskStatus::from_code(artifact.get(4).and_then(Value::as_i64));

    GenerationResult { task_id, status }
}

/// 产物列表：`[[[ID, 标题, 类型代码, 来源, 状态码, ...], ...]]`
pub fn parse_artifact_statuses(result: &Value) -> HashMap<String, ArtifactStatus> {
    let list = match result.get(0) {
        Some(first) if first.get(0).map(Value::is_array).unwrap_or(false) => first,
        _ => result,
    };

    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get(0)?.as_str()?.to_string();
                    let status = ArtifactStatus {
                        status: TaskStatus::from_code(item.get(4).and_then(Value::as_i64)),
                        type_code: item.get(2).and_then(Value::as_i64),
                    };
                    Some((id, status))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// 思维导图内容：通常是 `[[JSON字符串, ...]]`
pub fn parse_mind_map_content(result: &Value) -> Option<String> {
    if result.is_null() {
        return None;
    }
    result
        .pointer("/0/0")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| serde_json::to_string(result).ok())
}
