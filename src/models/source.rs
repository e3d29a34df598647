use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 启动命令中来源字符串的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Url,
    Youtube,
    Text,
}

/// 本地文件描述（字节由宿主读取，不在状态中保存）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub filename: String,
    pub mime_type: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl FileDescriptor {
    /// 由本地路径构造，未指定 MIME 时按扩展名推断
    pub fn from_path(path: impl Into<PathBuf>, mime_type: Option<String>, size: Option<u64>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_type.unwrap_or_else(|| guess_mime(&filename).to_string());
        Self {
            filename,
            mime_type,
            path,
            size,
        }
    }
}

fn guess_mime(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// 持久化状态里记录的来源
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "sourceType", rename_all = "snake_case")]
pub enum SourceRef {
    Url { url: String },
    Youtube { url: String },
    Text { title: String, content: String },
    File { file: FileDescriptor },
}

impl SourceRef {
    /// 从启动命令的参数构造
    pub fn from_input(source: &str, kind: SourceKind) -> Self {
        match kind {
            SourceKind::Url => SourceRef::Url {
                url: source.trim().to_string(),
            },
            SourceKind::Youtube => SourceRef::Youtube {
                url: source.trim().to_string(),
            },
            SourceKind::Text => {
                let title = source
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(|line| line.chars().take(60).collect::<String>())
                    .unwrap_or_else(|| "Pasted text".to_string());
                SourceRef::Text {
                    title,
                    content: source.to_string(),
                }
            }
        }
    }

    /// 用作笔记本默认标题
    pub fn display_name(&self) -> String {
        match self {
            SourceRef::Url { url } | SourceRef::Youtube { url } => url.clone(),
            SourceRef::Text { title, .. } => title.clone(),
            SourceRef::File { file } => file.filename.clone(),
        }
    }
}

/// 来源解析状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Processing,
    Ready,
    Error,
}

impl SourceStatus {
    /// 1 处理中，2 就绪，3 出错；缺失的状态块视为就绪
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(1) => SourceStatus::Processing,
            Some(3) => SourceStatus::Error,
            _ => SourceStatus::Ready,
        }
    }
}

/// 来源列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: String,
    pub title: String,
    pub status: SourceStatus,
}

/// 新建笔记本的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookInfo {
    /// 响应里找不到 ID 时为 `None`，由调用方处理
    pub id: Option<String>,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_title_from_first_line() {
        let source = SourceRef::from_input("\n\n  Chapter One  \nbody text", SourceKind::Text);
        assert_eq!(source.display_name(), "Chapter One");
    }

    #[test]
    fn test_source_ref_serde_tag() {
        let source = SourceRef::from_input("https://example.com/a", SourceKind::Url);
        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["sourceType"], "url");
        assert_eq!(json["url"], "https://example.com/a");
    }

    #[test]
    fn test_file_descriptor_guesses_mime() {
        let file = FileDescriptor::from_path("/tmp/docs/Paper.PDF", None, Some(10));
        assert_eq!(file.filename, "Paper.PDF");
        assert_eq!(file.mime_type, "application/pdf");

        let explicit = FileDescriptor::from_path("notes.bin", Some("text/plain".to_string()), None);
        assert_eq!(explicit.mime_type, "text/plain");
    }
}
