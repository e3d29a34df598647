use serde::{Deserialize, Serialize};
use std::fmt;

/// 产物类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Audio,
    Video,
    Report,
    Quiz,
    Flashcards,
    MindMap,
    Infographic,
    SlideDeck,
    DataTable,
}

impl ArtifactType {
    /// 按请求顺序排列的全部类型
    pub const ALL: [ArtifactType; 9] = [
        ArtifactType::Audio,
        ArtifactType::Video,
        ArtifactType::Report,
        ArtifactType::Quiz,
        ArtifactType::Flashcards,
        ArtifactType::MindMap,
        ArtifactType::Infographic,
        ArtifactType::SlideDeck,
        ArtifactType::DataTable,
    ];

    /// 远端的产物类型代码
    pub fn type_code(&self) -> i64 {
        match self {
            ArtifactType::Audio => 1,
            ArtifactType::Report => 2,
            ArtifactType::Video => 3,
            ArtifactType::Quiz | ArtifactType::Flashcards => 4,
            ArtifactType::MindMap => 5,
            ArtifactType::Infographic => 7,
            ArtifactType::SlideDeck => 8,
            ArtifactType::DataTable => 9,
        }
    }

    /// 思维导图直接返回内容，不产生可轮询的任务
    pub fn is_synchronous(&self) -> bool {
        matches!(self, ArtifactType::MindMap)
    }

    /// 显示名称
    pub fn label(&self) -> &'static str {
        match self {
            ArtifactType::Audio => "Audio Overview",
            ArtifactType::Video => "Video Overview",
            ArtifactType::Report => "Report",
            ArtifactType::Quiz => "Quiz",
            ArtifactType::Flashcards => "Flashcards",
            ArtifactType::MindMap => "Mind Map",
            ArtifactType::Infographic => "Infographic",
            ArtifactType::SlideDeck => "Slide Deck",
            ArtifactType::DataTable => "Data Table",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 产物任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    InProgress,
    Pending,
    Completed,
    Failed,
}

impl TaskStatus {
    /// 远端状态码：1 处理中，2 排队，3 完成，4 失败，其他视为处理中
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(2) => TaskStatus::Pending,
            Some(3) => TaskStatus::Completed,
            Some(4) => TaskStatus::Failed,
            _ => TaskStatus::InProgress,
        }
    }

    /// 仍需继续轮询
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::InProgress | TaskStatus::Pending)
    }
}

/// 一次生成请求的归一化结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub task_id: Option<String>,
    pub status: TaskStatus,
}

/// 批量状态查询中单个产物的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub status: TaskStatus,
    pub type_code: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TaskStatus::from_code(Some(1)), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_code(Some(2)), TaskStatus::Pending);
        assert_eq!(TaskStatus::from_code(Some(3)), TaskStatus::Completed);
        assert_eq!(TaskStatus::from_code(Some(4)), TaskStatus::Failed);
        assert_eq!(TaskStatus::from_code(Some(99)), TaskStatus::InProgress);
        assert_eq!(TaskStatus::from_code(None), TaskStatus::InProgress);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&ArtifactType::SlideDeck).unwrap(),
            "\"slide_deck\""
        );
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
