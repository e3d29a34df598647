use serde_json::Value;
use thiserror::Error;

/// 应用程序错误类型
///
/// 前半部分是远端服务协议层面的错误分类，后半部分包装第三方库错误。
#[derive(Debug, Error)]
pub enum AppError {
    /// 未登录（获取凭证时被重定向到登录页）
    #[error("未登录: 请先在浏览器中登录后导出 Cookie")]
    AuthRequired,

    /// 会话中途凭证被拒绝（401/403），凭证缓存已失效
    #[error("凭证已过期 (HTTP {status})")]
    AuthExpired { status: u16 },

    /// 远端限流
    #[error("请求被限流 (方法: {method})")]
    RateLimited { method: String },

    /// 非 2xx 的 HTTP 响应
    #[error("传输错误: HTTP {status}")]
    Transport { status: u16 },

    /// 响应结构无法识别
    #[error("协议解析失败: {0}")]
    ProtocolDecode(String),

    /// 远端针对某次调用返回的错误帧
    #[error("RPC 错误 (方法: {method}, code: {code})")]
    Rpc { method: String, code: Value },

    /// 响应中不存在请求方法对应的帧
    #[error("RPC 无结果 (方法: {method})")]
    NoResult { method: String },

    /// 来源解析失败
    #[error("来源处理失败: {0}")]
    SourceProcessing(String),

    /// 产物生成失败
    #[error("产物生成失败 ({artifact}): {message}")]
    ArtifactGeneration { artifact: String, message: String },

    /// 阶段超时
    #[error("阶段超时: {phase}")]
    PhaseTimeout { phase: String },

    /// 用户中止
    #[error("用户已中止")]
    AbortedByUser,

    /// 可续传上传中的某一步失败
    #[error("文件上传失败 ({stage}): {message}")]
    Upload { stage: String, message: String },

    /// 当前状态不允许该命令
    #[error("状态错误: {0}")]
    InvalidState(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML 解析失败: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("文件读写失败: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 创建 RPC 错误
    pub fn rpc(method: impl Into<String>, code: Value) -> Self {
        AppError::Rpc {
            method: method.into(),
            code,
        }
    }

    /// 创建上传错误
    pub fn upload(stage: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Upload {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// 轮询阶段可以留到下一次 tick 重试的错误
    ///
    /// 网络、限流、凭证过期、帧缺失都属于瞬时错误；
    /// 远端明确返回的错误帧和本地配置错误则不是。
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::AuthExpired { .. }
                | AppError::RateLimited { .. }
                | AppError::Transport { .. }
                | AppError::NoResult { .. }
                | AppError::ProtocolDecode(_)
                | AppError::Http(_)
        )
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transient_classification() {
        assert!(AppError::Transport { status: 502 }.is_transient());
        assert!(AppError::AuthExpired { status: 401 }.is_transient());
        assert!(AppError::NoResult {
            method: "gArtLc".to_string()
        }
        .is_transient());
        assert!(!AppError::rpc("gArtLc", json!(3)).is_transient());
        assert!(!AppError::AuthRequired.is_transient());
    }

    #[test]
    fn test_rpc_error_display_carries_code() {
        let err = AppError::rpc("CCqFvf", json!([3]));
        let text = err.to_string();
        assert!(text.contains("CCqFvf"));
        assert!(text.contains("[3]"));
    }
}
