//! 通用结果提取器
//!
//! 远端响应没有稳定的 schema，这里在任意嵌套的 JSON 中寻找第一个
//! "看起来像 ID" 的值。遍历有深度上限，并以节点地址做访问集合，
//! 找不到时返回 `None`，从不报错。

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// 默认最大深度
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// 对象节点中优先检查的键
const PREFERRED_KEYS: &[&str] = &[
    "id",
    "notebookId",
    "notebook_id",
    "projectId",
    "sourceId",
    "source_id",
    "artifactId",
    "uuid",
    "name",
];

fn path_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:notebook|source)s?/([A-Za-z0-9_-]{6,})").expect("静态正则")
    })
}

fn token_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{10,}$").expect("静态正则"))
}

/// 使用默认深度提取 ID
pub fn extract_id(node: &Value) -> Option<String> {
    extract_id_with_depth(node, DEFAULT_MAX_DEPTH)
}

/// 提取 ID
///
/// # 参数
/// - `node`: 任意 JSON 节点
/// - `max_depth`: 最大下钻层数，根节点为第 0 层
///
/// # 返回
/// 第一个像 ID 的字符串
pub fn extract_id_with_depth(node: &Value, max_depth: usize) -> Option<String> {
    let mut visited = HashSet::new();
    walk(node, 0, max_depth, &mut visited)
}

fn walk(
    node: &Value,
    depth: usize,
    max_depth: usize,
    visited: &mut HashSet<*const Value>,
) -> Option<String> {
    if depth > max_depth {
        return None;
    }

    match node {
        Value::String(text) => id_from_str(text),
        Value::Number(n) => {
            let text = n.to_string();
            (text.len() >= 10).then_some(text)
        }
        Value::Array(items) => {
            if !visited.insert(node as *const Value) {
                return None;
            }
            items
                .iter()
                .find_map(|item| walk(item, depth + 1, max_depth, visited))
        }
        Value::Object(map) => {
            if !visited.insert(node as *const Value) {
                return None;
            }
            for key in PREFERRED_KEYS {
                if let Some(found) = map
                    .get(*key)
                    .and_then(|child| walk(child, depth + 1, max_depth, visited))
                {
                    return Some(found);
                }
            }
            map.iter()
                .filter(|(key, _)| !PREFERRED_KEYS.contains(&key.as_str()))
                .find_map(|(_, child)| walk(child, depth + 1, max_depth, visited))
        }
        Value::Null | Value::Bool(_) => None,
    }
}

/// 字符串叶子：先找路径里的 ID，再看整体是否像 ID
fn id_from_str(text: &str) -> Option<String> {
    if let Some(caps) = path_pattern().captures(text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    token_pattern()
        .is_match(text)
        .then(|| text.to_string())
}
