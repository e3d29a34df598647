//! HTTP 传输 - 基础设施层
//!
//! 唯一发出网络请求的地方：batchexecute 调用和可续传上传。
//! 不做任何业务判断，401/403 时让凭证失效并返回 `AuthExpired`，
//! 是否重试由调用方决定。

use crate::api::codec;
use crate::api::rpc_methods::BATCH_EXECUTE_PATH;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::session::SessionContext;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, Response, Url};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// HTTP 传输
pub struct HttpTransport {
    http: Client,
    session: SessionContext,
    base_url: String,
    upload_base_url: String,
    locale: String,
    cookies: String,
}

impl HttpTransport {
    /// 根据配置创建传输层
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("notebook-pipeline/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, config))
    }

    /// 使用外部构建的 reqwest 客户端
    pub fn with_client(http: Client, config: &Config) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            session: SessionContext::new(http.clone(), base_url.clone(), config.cookies.clone()),
            http,
            base_url,
            upload_base_url: config.upload_base_url.trim_end_matches('/').to_string(),
            locale: config.locale.clone(),
            cookies: config.cookies.clone(),
        }
    }

    /// 会话上下文
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// 执行一次 RPC 调用
    ///
    /// # 参数
    /// - `method_id`: 方法ID
    /// - `params`: 位置参数
    /// - `source_path`: 页面上下文路径，例如 `/notebook/<id>`
    /// - `allow_empty`: 没有结果帧时是否返回 `null`
    ///
    /// # 返回
    /// 解码后的负载
    pub async fn call(
        &self,
        method_id: &str,
        params: &Value,
        source_path: &str,
        allow_empty: bool,
    ) -> AppResult<Value> {
        let credentials = self.session.ensure_credentials().await?;
        let body = codec::encode(method_id, params, Some(&credentials.csrf_token))?;

        let url = Url::parse_with_params(
            &format!("{}{}", self.base_url, BATCH_EXECUTE_PATH),
            &[
                ("rpcids", method_id),
                ("source-path", source_path),
                ("hl", self.locale.as_str()),
                ("rt", "c"),
                ("f.sid", credentials.session_id.as_str()),
            ],
        )
        .map_err(|e| AppError::Config(format!("无效的服务地址 {}: {}", self.base_url, e)))?;

        debug!("调用 RPC {} (source-path: {})", method_id, source_path);

        let response = self
            .with_cookies(self.http.post(url))
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header("X-Same-Domain", "1")
            .header("Origin", self.base_url.as_str())
            .header("Referer", format!("{}/", self.base_url))
            .body(body)
            .send()
            .await?;

        let response = self.check_status(response, method_id).await?;
        let text = response.text().await?;
        debug!("RPC {} 响应 {} 字节", method_id, text.len());

        codec::decode(&text, method_id, allow_empty)
    }

    /// 打开可续传上传会话
    ///
    /// # 返回
    /// 上传字节用的会话地址
    pub async fn start_resumable_upload(
        &self,
        notebook_id: &str,
        source_id: &str,
        filename: &str,
        mime_type: &str,
        size: usize,
    ) -> AppResult<String> {
        let url = format!("{}/upload/_/?authuser=0", self.upload_base_url);
        let body = json!({
            "PROJECT_ID": notebook_id,
            "SOURCE_NAME": filename,
            "SOURCE_ID": source_id,
        });

        let response = self
            .with_cookies(self.http.post(&url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded;charset=utf-8")
            .header("x-goog-upload-command", "start")
            .header("x-goog-upload-protocol", "resumable")
            .header("x-goog-upload-header-content-length", size.to_string())
            .header("x-goog-upload-header-content-type", mime_type)
            .body(serde_json::to_string(&body)?)
            .send()
            .await
            .map_err(|e| AppError::upload("start", e.to_string()))?;

        let response = self.check_status(response, "upload:start").await?;

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AppError::upload("start", "响应中缺少上传地址"))
    }

    /// 上传文件字节并结束会话
    pub async fn upload_bytes(&self, upload_url: &str, bytes: Vec<u8>) -> AppResult<()> {
        let response = self
            .with_cookies(self.http.post(upload_url))
            .header("x-goog-upload-command", "upload, finalize")
            .header("x-goog-upload-offset", "0")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::upload("finalize", e.to_string()))?;

        self.check_status(response, "upload:finalize").await?;
        Ok(())
    }

    fn with_cookies(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.cookies.is_empty() {
            request
        } else {
            request.header(COOKIE, &self.cookies)
        }
    }

    /// 401/403 让凭证失效，其他非 2xx 作为传输错误
    async fn check_status(&self, response: Response, what: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        if code == 401 || code == 403 {
            warn!("{} 被拒绝 (HTTP {})，凭证失效", what, code);
            self.session.invalidate().await;
            return Err(AppError::AuthExpired { status: code });
        }

        warn!("{} 返回 HTTP {}", what, code);
        Err(AppError::Transport { status: code })
    }
}
