//! RPC 编解码 - 纯函数
//!
//! 请求：`f.req=[[[方法ID, 参数JSON, null, "generic"]]]&at=<csrf>`
//!
//! 响应：`)]}'` 前缀行之后是按行分隔的分块，每块要么是一个 JSON 值，
//! 要么是一行十进制长度标记加上下一行的 JSON 值。解码逐行容错，
//! 单行坏数据只会被跳过，不会让整次解码失败。

use crate::api::rpc_methods::{ANTI_XSSI_PREFIX, ERROR_TAG, REQUEST_KIND, SUCCESS_TAG};
use crate::error::{AppError, AppResult};
use serde_json::{json, Value};
use tracing::debug;

/// 解码出的单个帧
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `["wrb.fr", 方法ID, 负载, ...]`
    Success {
        method: String,
        payload: Value,
        /// 负载之后的附加字段（限流标记出现在这里）
        trailing: Vec<Value>,
    },
    /// `["er", 方法ID, code, ...]`
    Error { method: String, code: Value },
}

impl Frame {
    /// 帧所属的方法ID
    pub fn method(&self) -> &str {
        match self {
            Frame::Success { method, .. } | Frame::Error { method, .. } => method,
        }
    }
}

/// 构建请求信封（未编码）
///
/// 参数位置有意义，调用方传入的顺序原样保留。
pub fn build_envelope(method_id: &str, params: &Value) -> AppResult<String> {
    let params_json = serde_json::to_string(params)?;
    let envelope = json!([[[method_id, params_json, Value::Null, REQUEST_KIND]]]);
    Ok(serde_json::to_string(&envelope)?)
}

/// 编码请求体
///
/// # 参数
/// - `method_id`: 方法ID
/// - `params`: 位置参数
/// - `csrf_token`: CSRF 令牌，存在时作为第二个表单字段
///
/// # 返回
/// 返回 `application/x-www-form-urlencoded` 请求体
pub fn encode(method_id: &str, params: &Value, csrf_token: Option<&str>) -> AppResult<String> {
    let envelope = build_envelope(method_id, params)?;
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    form.append_pair("f.req", &envelope);
    if let Some(token) = csrf_token {
        form.append_pair("at", token);
    }
    Ok(form.finish())
}

/// 把原始响应文本拆成帧
///
/// 无法解析的行、非帧结构的值都会被忽略。
pub fn parse_frames(raw_text: &str) -> Vec<Frame> {
    let body = strip_prefix(raw_text);
    let lines: Vec<&str> = body.lines().collect();
    let mut frames = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        i += 1;

        if line.is_empty() {
            continue;
        }

        // 长度标记行：负载在下一行
        let chunk = if line.bytes().all(|b| b.is_ascii_digit()) {
            if i >= lines.len() {
                break;
            }
            let next = lines[i].trim();
            i += 1;
            next
        } else {
            line
        };

        match serde_json::from_str::<Value>(chunk) {
            Ok(value) => collect_frames(&value, &mut frames),
            Err(e) => {
                debug!("跳过无法解析的响应行 ({} 字节): {}", chunk.len(), e);
            }
        }
    }

    frames
}

/// 解码响应
///
/// # 参数
/// - `raw_text`: 原始响应文本
/// - `method_id`: 本次调用的方法ID，其他方法的帧会被忽略
/// - `allow_empty`: 没有匹配帧时是否返回 `null`
///
/// # 返回
/// 成功帧的负载；负载是字符串时会再做一次 JSON 解析
pub fn decode(raw_text: &str, method_id: &str, allow_empty: bool) -> AppResult<Value> {
    let frames = parse_frames(raw_text);

    // 错误帧优先
    if let Some(Frame::Error { code, .. }) = frames
        .iter()
        .find(|f| matches!(f, Frame::Error { .. }) && f.method() == method_id)
    {
        return Err(AppError::rpc(method_id, code.clone()));
    }

    let success = frames
        .into_iter()
        .find(|f| matches!(f, Frame::Success { .. }) && f.method() == method_id);

    match success {
        Some(Frame::Success {
            payload, trailing, ..
        }) => {
            if payload.is_null() && trailing.iter().any(is_rate_limit_marker) {
                return Err(AppError::RateLimited {
                    method: method_id.to_string(),
                });
            }
            Ok(unwrap_payload(payload))
        }
        _ if allow_empty => Ok(Value::Null),
        _ => Err(AppError::NoResult {
            method: method_id.to_string(),
        }),
    }
}

/// 去掉反爬前缀行
fn strip_prefix(raw_text: &str) -> &str {
    let trimmed = raw_text.trim_start();
    match trimmed.strip_prefix(ANTI_XSSI_PREFIX) {
        Some(rest) => rest.trim_start_matches(['\r', '\n']),
        None => trimmed,
    }
}

/// 单个分块既可能是一个帧，也可能是帧的数组
fn collect_frames(value: &Value, out: &mut Vec<Frame>) {
    let Some(items) = value.as_array() else {
        return;
    };

    if let Some(frame) = to_frame(items) {
        out.push(frame);
        return;
    }

    for item in items {
        if let Some(frame) = item.as_array().and_then(|inner| to_frame(inner)) {
            out.push(frame);
        }
    }
}

fn to_frame(items: &[Value]) -> Option<Frame> {
    let tag = items.first()?.as_str()?;
    let method = items.get(1).and_then(Value::as_str).unwrap_or_default();

    match tag {
        SUCCESS_TAG => Some(Frame::Success {
            method: method.to_string(),
            payload: items.get(2).cloned().unwrap_or(Value::Null),
            trailing: items.iter().skip(3).cloned().collect(),
        }),
        ERROR_TAG => Some(Frame::Error {
            method: method.to_string(),
            code: items.get(2).cloned().unwrap_or(Value::Null),
        }),
        _ => None,
    }
}

/// 负载本身常常是一段 JSON 字符串
fn unwrap_payload(payload: Value) -> Value {
    match payload {
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(inner) => inner,
            Err(_) => {
                debug!("负载不是 JSON 字符串，按原样返回");
                Value::String(text)
            }
        },
        other => other,
    }
}

/// 限流标记：`[8]`（RESOURCE_EXHAUSTED）或包含该字样的字符串
fn is_rate_limit_marker(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.first().and_then(Value::as_i64) == Some(8),
        Value::String(text) => {
            let upper = text.to_ascii_uppercase();
            upper.contains("RESOURCE_EXHAUSTED") || upper.contains("RATE_LIMIT")
        }
        _ => false,
    }
}
