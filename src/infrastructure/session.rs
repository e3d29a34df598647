//! 会话凭证 - 基础设施层
//!
//! 持有两个不透明凭证（CSRF 令牌和会话 ID）的进程内缓存。
//! 传输层在 401/403 时调用 `invalidate()`，下一次调用重新获取。

use crate::error::{AppError, AppResult};
use regex::Regex;
use reqwest::header::COOKIE;
use reqwest::{Client, Url};
use std::sync::OnceLock;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 会话凭证
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub csrf_token: String,
    pub session_id: String,
}

fn csrf_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""SNlM0e"\s*:\s*"([^"]+)""#).expect("静态正则"))
}

fn session_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""FdrFJe"\s*:\s*"([^"]+)""#).expect("静态正则"))
}

/// 从页面 HTML 中提取两个凭证
pub fn extract_credentials(html: &str) -> AppResult<Credentials> {
    let csrf_token = csrf_pattern()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::ProtocolDecode("页面中缺少 CSRF 令牌".to_string()))?;

    let session_id = session_pattern()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| AppError::ProtocolDecode("页面中缺少会话 ID".to_string()))?;

    Ok(Credentials {
        csrf_token,
        session_id,
    })
}

/// 请求是否被重定向到了登录页
pub fn is_login_url(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default();
    let path = url.path();
    host.starts_with("accounts.")
        || path.contains("ServiceLogin")
        || path.contains("/signin")
}

/// 会话上下文
///
/// 职责：
/// - 缓存凭证
/// - 缺失时抓取首页并提取凭证
/// - 只负责凭证，不认识任何业务方法
pub struct SessionContext {
    http: Client,
    base_url: String,
    cookies: String,
    cached: Mutex<Option<Credentials>>,
}

impl SessionContext {
    /// 创建新的会话上下文
    pub fn new(http: Client, base_url: impl Into<String>, cookies: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            cookies: cookies.into(),
            cached: Mutex::new(None),
        }
    }

    /// 返回缓存的凭证，没有则重新获取
    pub async fn ensure_credentials(&self) -> AppResult<Credentials> {
        let mut cached = self.cached.lock().await;
        if let Some(credentials) = cached.as_ref() {
            return Ok(credentials.clone());
        }

        let credentials = self.fetch().await?;
        *cached = Some(credentials.clone());
        Ok(credentials)
    }

    /// 丢弃缓存并立即重新获取
    pub async fn refresh(&self) -> AppResult<Credentials> {
        self.invalidate().await;
        self.ensure_credentials().await
    }

    /// 清空缓存
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        if cached.take().is_some() {
            warn!("🔑 凭证已失效，下次调用时重新获取");
        }
    }

    /// 当前是否持有凭证
    pub async fn has_credentials(&self) -> bool {
        self.cached.lock().await.is_some()
    }

    async fn fetch(&self) -> AppResult<Credentials> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        debug!("正在获取会话凭证: {}", url);

        let mut request = self.http.get(&url);
        if !self.cookies.is_empty() {
            request = request.header(COOKIE, &self.cookies);
        }
        let response = request.send().await?;

        if is_login_url(response.url()) {
            warn!("请求被重定向到登录页: {}", response.url());
            return Err(AppError::AuthRequired);
        }

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::AuthRequired);
        }
        if !status.is_success() {
            return Err(AppError::Transport {
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let credentials = extract_credentials(&html)?;
        info!("✓ 已获取会话凭证");
        Ok(credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<script>window.WIZ_global_data = {"SNlM0e":"csrf-abc:123","FdrFJe":"-4242","other":1};</script>"#;

    #[test]
    fn test_extract_credentials() {
        let credentials = extract_credentials(PAGE).unwrap();
        assert_eq!(credentials.csrf_token, "csrf-abc:123");
        assert_eq!(credentials.session_id, "-4242");
    }

    #[test]
    fn test_extract_credentials_missing_token() {
        let result = extract_credentials(r#"{"FdrFJe":"-1"}"#);
        assert!(matches!(result, Err(AppError::ProtocolDecode(_))));
    }

    #[test]
    fn test_login_url_detection() {
        assert!(is_login_url(
            &Url::parse("https://accounts.google.com/v3/signin/identifier").unwrap()
        ));
        assert!(is_login_url(&Url::parse("http://127.0.0.1/ServiceLogin?x").unwrap()));
        assert!(!is_login_url(&Url::parse("https://notebooklm.google.com/").unwrap()));
    }

    #[tokio::test]
    async fn test_credentials_cached_until_invalidated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("cookie", "SID=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(3)
            .mount(&server)
            .await;

        let session = SessionContext::new(Client::new(), server.uri(), "SID=1");
        let first = session.ensure_credentials().await.unwrap();
        let second = session.ensure_credentials().await.unwrap();
        assert_eq!(first, second);

        session.invalidate().await;
        assert!(!session.has_credentials().await);
        session.ensure_credentials().await.unwrap();

        let refreshed = session.refresh().await.unwrap();
        assert_eq!(refreshed, first);
    }

    #[tokio::test]
    async fn test_redirect_to_login_is_auth_required() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/ServiceLogin", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ServiceLogin"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>sign in</html>"))
            .mount(&server)
            .await;

        let session = SessionContext::new(Client::new(), server.uri(), "");
        let result = session.ensure_credentials().await;
        assert!(matches!(result, Err(AppError::AuthRequired)));
    }

    #[tokio::test]
    async fn test_page_without_tokens_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let session = SessionContext::new(Client::new(), server.uri(), "");
        assert!(matches!(
            session.ensure_credentials().await,
            Err(AppError::ProtocolDecode(_))
        ));
    }
}
