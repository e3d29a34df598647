//! 各类产物的开关与选项
//!
//! 所有字段都有默认值，配置文件里缺失的键按默认处理。
//! 默认只开启音频和信息图。

use crate::models::artifact::ArtifactType;
use serde::{Deserialize, Serialize};

fn default_language() -> String {
    "en".to_string()
}

/// 音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    #[default]
    DeepDive,
    Brief,
    Critique,
    Debate,
}

impl AudioFormat {
    pub fn code(&self) -> i64 {
        match self {
            AudioFormat::DeepDive => 1,
            AudioFormat::Brief => 2,
            AudioFormat::Critique => 3,
            AudioFormat::Debate => 4,
        }
    }
}

/// 音频长度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioLength {
    Short,
    #[default]
    Default,
    Long,
}

impl AudioLength {
    pub fn code(&self) -> i64 {
        match self {
            AudioLength::Short => 1,
            AudioLength::Default => 2,
            AudioLength::Long => 3,
        }
    }
}

/// 视频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoFormat {
    #[default]
    Explainer,
    Brief,
}

impl VideoFormat {
    pub fn code(&self) -> i64 {
        match self {
            VideoFormat::Explainer => 1,
            VideoFormat::Brief => 2,
        }
    }
}

/// 视频画面风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoStyle {
    #[default]
    Auto,
    Custom,
    Classic,
    Whiteboard,
    Kawaii,
    Anime,
    Watercolor,
    RetroPrint,
    Heritage,
    PaperCraft,
}

impl VideoStyle {
    pub fn code(&self) -> i64 {
        match self {
            VideoStyle::Auto => 1,
            VideoStyle::Custom => 2,
            VideoStyle::Classic => 3,
            VideoStyle::Whiteboard => 4,
            VideoStyle::Kawaii => 5,
            VideoStyle::Anime => 6,
            VideoStyle::Watercolor => 7,
            VideoStyle::RetroPrint => 8,
            VideoStyle::Heritage => 9,
            VideoStyle::PaperCraft => 10,
        }
    }
}

/// 报告格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    BriefingDoc,
    StudyGuide,
    BlogPost,
    Custom,
}

impl ReportFormat {
    /// 报告模板的标题与描述，远端按文字而不是代码区分格式
    pub fn template(&self) -> (&'static str, &'static str) {
        match self {
            ReportFormat::BriefingDoc => (
                "Briefing Doc",
                "Key insights and important quotes",
            ),
            ReportFormat::StudyGuide => (
                "Study Guide",
                "Short-answer quiz, essay questions, glossary",
            ),
            ReportFormat::BlogPost => (
                "Blog Post",
                "Insightful takeaways in readable article format",
            ),
            ReportFormat::Custom => ("Custom Report", "Create your own report"),
        }
    }
}

/// 测验 / 闪卡数量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizQuantity {
    Fewer,
    #[default]
    Standard,
}

impl QuizQuantity {
    pub fn code(&self) -> i64 {
        match self {
            QuizQuantity::Fewer => 1,
            QuizQuantity::Standard => 2,
        }
    }
}

/// 测验 / 闪卡难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl QuizDifficulty {
    pub fn code(&self) -> i64 {
        match self {
            QuizDifficulty::Easy => 1,
            QuizDifficulty::Medium => 2,
            QuizDifficulty::Hard => 3,
        }
    }
}

/// 信息图方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfographicOrientation {
    #[default]
    Landscape,
    Portrait,
    Square,
}

impl InfographicOrientation {
    pub fn code(&self) -> i64 {
        match self {
            InfographicOrientation::Landscape => 1,
            InfographicOrientation::Portrait => 2,
            InfographicOrientation::Square => 3,
        }
    }
}

/// 信息图详细程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfographicDetail {
    Concise,
    #[default]
    Standard,
    Detailed,
}

impl InfographicDetail {
    pub fn code(&self) -> i64 {
        match self {
            InfographicDetail::Concise => 1,
            InfographicDetail::Standard => 2,
            InfographicDetail::Detailed => 3,
        }
    }
}

/// 幻灯片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDeckFormat {
    #[default]
    DetailedDeck,
    PresenterSlides,
}

impl SlideDeckFormat {
    pub fn code(&self) -> i64 {
        match self {
            SlideDeckFormat::DetailedDeck => 1,
            SlideDeckFormat::PresenterSlides => 2,
        }
    }
}

/// 幻灯片长度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideDeckLength {
    #[default]
    Default,
    Short,
}

impl SlideDeckLength {
    pub fn code(&self) -> i64 {
        match self {
            SlideDeckLength::Default => 1,
            SlideDeckLength::Short => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioOptions {
    pub enabled: bool,
    pub format: AudioFormat,
    pub length: AudioLength,
    pub language: String,
    pub instructions: String,
}

impl Default for AudioOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            format: AudioFormat::default(),
            length: AudioLength::default(),
            language: default_language(),
            instructions: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoOptions {
    pub enabled: bool,
    pub format: VideoFormat,
    pub style: VideoStyle,
    pub language: String,
    pub instructions: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            format: VideoFormat::default(),
            style: VideoStyle::default(),
            language: default_language(),
            instructions: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportOptions {
    pub enabled: bool,
    pub format: ReportFormat,
    pub language: String,
    pub instructions: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            format: ReportFormat::default(),
            language: default_language(),
            instructions: String::new(),
        }
    }
}

/// 测验与闪卡共用
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizOptions {
    pub enabled: bool,
    pub quantity: QuizQuantity,
    pub difficulty: QuizDifficulty,
    pub language: String,
    pub instructions: String,
}

impl Default for QuizOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            quantity: QuizQuantity::default(),
            difficulty: QuizDifficulty::default(),
            language: default_language(),
            instructions: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MindMapOptions {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfographicOptions {
    pub enabled: bool,
    pub orientation: InfographicOrientation,
    pub detail: InfographicDetail,
    pub language: String,
    pub instructions: String,
}

impl Default for InfographicOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            orientation: InfographicOrientation::default(),
            detail: InfographicDetail::default(),
            language: default_language(),
            instructions: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideDeckOptions {
    pub enabled: bool,
    pub format: SlideDeckFormat,
    pub length: SlideDeckLength,
    pub language: String,
    pub instructions: String,
}

impl Default for SlideDeckOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            format: SlideDeckFormat::default(),
            length: SlideDeckLength::default(),
            language: default_language(),
            instructions: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTableOptions {
    pub enabled: bool,
    pub language: String,
    pub instructions: String,
}

impl Default for DataTableOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            language: default_language(),
            instructions: String::new(),
        }
    }
}

/// 全部产物设置
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactSettings {
    pub audio: AudioOptions,
    pub video: VideoOptions,
    pub report: ReportOptions,
    pub quiz: QuizOptions,
    pub flashcards: QuizOptions,
    pub mind_map: MindMapOptions,
    pub infographic: InfographicOptions,
    pub slide_deck: SlideDeckOptions,
    pub data_table: DataTableOptions,
}

impl ArtifactSettings {
    /// 某类产物是否开启
    pub fn is_enabled(&self, artifact: ArtifactType) -> bool {
        match artifact {
            ArtifactType::Audio => self.audio.enabled,
            ArtifactType::Video => self.video.enabled,
            ArtifactType::Report => self.report.enabled,
            ArtifactType::Quiz => self.quiz.enabled,
            ArtifactType::Flashcards => self.flashcards.enabled,
            ArtifactType::MindMap => self.mind_map.enabled,
            ArtifactType::Infographic => self.infographic.enabled,
            ArtifactType::SlideDeck => self.slide_deck.enabled,
            ArtifactType::DataTable => self.data_table.enabled,
        }
    }

    /// 按固定顺序返回已开启的产物类型
    pub fn enabled_types(&self) -> Vec<ArtifactType> {
        ArtifactType::ALL
            .into_iter()
            .filter(|t| self.is_enabled(*t))
            .collect()
    }

    /// 只开启给定类型，其余选项保持默认
    pub fn only(types: &[ArtifactType]) -> Self {
        let mut settings = Self::default();
        for artifact in ArtifactType::ALL {
            settings.set_enabled(artifact, types.contains(&artifact));
        }
        settings
    }

    pub fn set_enabled(&mut self, artifact: ArtifactType, enabled: bool) {
        match artifact {
            ArtifactType::Audio => self.audio.enabled = enabled,
            ArtifactType::Video => self.video.enabled = enabled,
            ArtifactType::Report => self.report.enabled = enabled,
            ArtifactType::Quiz => self.quiz.enabled = enabled,
            ArtifactType::Flashcards => self.flashcards.enabled = enabled,
            ArtifactType::MindMap => self.mind_map.enabled = enabled,
            ArtifactType::Infographic => self.infographic.enabled = enabled,
            ArtifactType::SlideDeck => self.slide_deck.enabled = enabled,
            ArtifactType::DataTable => self.data_table.enabled = enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_audio_and_infographic() {
        let settings = ArtifactSettings::default();
        assert_eq!(
            settings.enabled_types(),
            vec![ArtifactType::Audio, ArtifactType::Infographic]
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: ArtifactSettings = toml::from_str(
            r#"
            [video]
            enabled = true
            style = "whiteboard"

            [audio]
            length = "long"
            "#,
        )
        .unwrap();

        assert!(settings.video.enabled);
        assert_eq!(settings.video.style, VideoStyle::Whiteboard);
        assert_eq!(settings.video.format, VideoFormat::Explainer);
        // 未写 enabled 的音频仍然保持默认开启
        assert!(settings.audio.enabled);
        assert_eq!(settings.audio.length.code(), 3);
        assert!(settings.infographic.enabled);
        assert!(!settings.quiz.enabled);
    }

    #[test]
    fn test_only() {
        let settings = ArtifactSettings::only(&[ArtifactType::MindMap, ArtifactType::Quiz]);
        assert_eq!(
            settings.enabled_types(),
            vec![ArtifactType::Quiz, ArtifactType::MindMap]
        );
    }
}
