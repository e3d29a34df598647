use std::path::PathBuf;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 远端服务根地址
    pub base_url: String,
    /// 可续传上传服务根地址
    pub upload_base_url: String,
    /// 从已登录浏览器导出的 Cookie 头
    pub cookies: String,
    /// 请求语言
    pub locale: String,
    /// 流水线状态文件
    pub state_file: PathBuf,
    /// 产物设置文件
    pub settings_file: PathBuf,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 完成后是否自动打开笔记本
    pub auto_open_notebook: bool,
    // --- 流水线时间参数 ---
    pub poll_interval_secs: u64,
    pub source_timeout_secs: u64,
    pub generation_timeout_secs: u64,
    pub artifact_spacing_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://notebooklm.google.com".to_string(),
            upload_base_url: "https://notebooklm.google.com".to_string(),
            cookies: String::new(),
            locale: "en".to_string(),
            state_file: PathBuf::from("pipeline_state.json"),
            settings_file: PathBuf::from("artifact_settings.toml"),
            verbose_logging: false,
            auto_open_notebook: false,
            poll_interval_secs: 30,
            source_timeout_secs: 600,
            generation_timeout_secs: 2400,
            artifact_spacing_ms: 1500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            base_url: std::env::var("NOTEBOOK_BASE_URL").unwrap_or(default.base_url),
            upload_base_url: std::env::var("NOTEBOOK_UPLOAD_URL").unwrap_or(default.upload_base_url),
            cookies: std::env::var("NOTEBOOK_COOKIES").unwrap_or(default.cookies),
            locale: std::env::var("NOTEBOOK_LOCALE").unwrap_or(default.locale),
            state_file: std::env::var("PIPELINE_STATE_FILE").map(PathBuf::from).unwrap_or(default.state_file),
            settings_file: std::env::var("ARTIFACT_SETTINGS_FILE").map(PathBuf::from).unwrap_or(default.settings_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            auto_open_notebook: std::env::var("AUTO_OPEN_NOTEBOOK").ok().and_then(|v| v.parse().ok()).unwrap_or(default.auto_open_notebook),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_secs),
            source_timeout_secs: std::env::var("SOURCE_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.source_timeout_secs),
            generation_timeout_secs: std::env::var("GENERATION_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.generation_timeout_secs),
            artifact_spacing_ms: std::env::var("ARTIFACT_SPACING_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.artifact_spacing_ms),
        }
    }

    /// 流水线时间参数
    pub fn timing(&self) -> PipelineTiming {
        PipelineTiming {
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            source_timeout: Duration::from_secs(self.source_timeout_secs),
            generation_timeout: Duration::from_secs(self.generation_timeout_secs),
            artifact_spacing: Duration::from_millis(self.artifact_spacing_ms),
        }
    }

    /// 笔记本的浏览器地址
    pub fn notebook_url(&self, notebook_id: &str) -> String {
        format!("{}/notebook/{}", self.base_url.trim_end_matches('/'), notebook_id)
    }
}

/// 流水线时间参数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineTiming {
    /// 轮询阶段的唤醒间隔
    pub poll_interval: Duration,
    /// 来源解析超时
    pub source_timeout: Duration,
    /// 产物生成超时
    pub generation_timeout: Duration,
    /// 相邻两次产物请求的间隔
    pub artifact_spacing: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Config::default().timing()
    }
}
