use crate::error::AppResult;
use crate::models::artifact_options::ArtifactSettings;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载产物设置
///
/// 文件不存在时返回默认设置（音频 + 信息图）；
/// 文件存在但无法解析时返回错误，避免静默忽略用户的配置。
pub async fn load_artifact_settings(path: &Path) -> AppResult<ArtifactSettings> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        tracing::info!("未找到产物设置文件 {}，使用默认设置", path.display());
        return Ok(ArtifactSettings::default());
    }

    let content = fs::read_to_string(path).await?;
    let settings: ArtifactSettings = toml::from_str(&content)?;

    tracing::info!(
        "已加载产物设置: {}，开启 {} 类产物",
        path.file_name().unwrap_or_default().to_string_lossy(),
        settings.enabled_types().len()
    );

    Ok(settings)
}
