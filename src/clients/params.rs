//! 各方法的位置参数骨架
//!
//! 远端没有命名字段，位置和嵌套层数就是协议本身。
//! 这些骨架来自抓包，原样保留，不要"整理"。

use crate::api::rpc_methods::{ARTIFACT_LIST_FILTER, CLIENT_MARKER};
use crate::models::artifact::ArtifactType;
use crate::models::artifact_options::{
    AudioOptions, DataTableOptions, InfographicOptions, QuizOptions, ReportOptions,
    SlideDeckOptions, VideoOptions,
};
use serde_json::{json, Value};

/// 添加来源时末尾固定的选项块
fn source_options_block() -> Value {
    json!([1, null, null, null, null, null, null, null, null, null, [1]])
}

fn nulls(count: usize) -> Vec<Value> {
    vec![Value::Null; count]
}

/// 空字符串按 `null` 传
fn opt_text(text: &str) -> Value {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::String(trimmed.to_string())
    }
}

/// 三层嵌套的来源列表：`[[[id]], [[id]]]`
pub fn source_ids_triple(source_ids: &[String]) -> Value {
    Value::Array(source_ids.iter().map(|id| json!([[id]])).collect())
}

/// 两层嵌套的来源列表：`[[id], [id]]`
pub fn source_ids_double(source_ids: &[String]) -> Value {
    Value::Array(source_ids.iter().map(|id| json!([id])).collect())
}

pub fn create_notebook(title: &str) -> Value {
    json!([title, null, null, [CLIENT_MARKER], [1]])
}

pub fn get_notebook(notebook_id: &str) -> Value {
    json!([notebook_id, null, [CLIENT_MARKER], null, 0])
}

pub fn delete_notebook(notebook_id: &str) -> Value {
    json!([[notebook_id], [CLIENT_MARKER]])
}

pub fn add_url_source(notebook_id: &str, url: &str) -> Value {
    json!([
        [[null, null, [url], null, null, null, null, null, null, null, 1]],
        notebook_id,
        [CLIENT_MARKER],
        source_options_block()
    ])
}

/// YouTube 链接放在第八位，而不是普通 URL 的第三位
pub fn add_youtube_source(notebook_id: &str, url: &str) -> Value {
    json!([
        [[null, null, null, null, null, null, null, [url], null, null, 1]],
        notebook_id,
        [CLIENT_MARKER],
        source_options_block()
    ])
}

pub fn add_text_source(notebook_id: &str, title: &str, content: &str) -> Value {
    json!([
        [[null, [title, content], null, 2, null, null, null, null, null, null, 1]],
        notebook_id,
        [CLIENT_MARKER],
        source_options_block()
    ])
}

pub fn register_file_source(notebook_id: &str, filename: &str) -> Value {
    json!([
        [[filename]],
        notebook_id,
        [CLIENT_MARKER],
        source_options_block()
    ])
}

pub fn list_artifacts(notebook_id: &str) -> Value {
    json!([[CLIENT_MARKER], notebook_id, ARTIFACT_LIST_FILTER])
}

pub fn create_note(notebook_id: &str, title: &str) -> Value {
    json!([notebook_id, "", [1], null, title])
}

pub fn update_note(notebook_id: &str, note_id: &str, title: &str, content: &str) -> Value {
    json!([notebook_id, note_id, [[[content, title, [], 0]]]])
}

pub fn mind_map(source_ids: &[String]) -> Value {
    let sources: Vec<Value> = source_ids.iter().map(|id| json!([[id]])).collect();
    json!([
        sources,
        null,
        null,
        null,
        null,
        ["interactive_mindmap", [["[CONTEXT]", ""]], ""],
        null,
        [CLIENT_MARKER, null, [1]]
    ])
}

/// 产物请求的外层：`[[2], 笔记本ID, 内层]`
fn artifact_request(notebook_id: &str, inner: Vec<Value>) -> Value {
    json!([[CLIENT_MARKER], notebook_id, inner])
}

/// 内层开头：`[null, null, 类型代码, 来源三层列表]`
fn artifact_head(artifact: ArtifactType, source_ids: &[String]) -> Vec<Value> {
    vec![
        Value::Null,
        Value::Null,
        json!(artifact.type_code()),
        source_ids_triple(source_ids),
    ]
}

pub fn audio(notebook_id: &str, source_ids: &[String], options: &AudioOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::Audio, source_ids);
    inner.extend(nulls(2));
    inner.push(json!([
        null,
        [
            opt_text(&options.instructions),
            options.length.code(),
            null,
            source_ids_double(source_ids),
            options.language,
            null,
            options.format.code()
        ]
    ]));
    artifact_request(notebook_id, inner)
}

pub fn report(notebook_id: &str, source_ids: &[String], options: &ReportOptions) -> Value {
    let (title, description) = options.format.template();
    let mut inner = artifact_head(ArtifactType::Report, source_ids);
    inner.extend(nulls(3));
    inner.push(json!([
        null,
        [
            title,
            description,
            null,
            source_ids_double(source_ids),
            options.language,
            opt_text(&options.instructions),
            null,
            true
        ]
    ]));
    artifact_request(notebook_id, inner)
}

pub fn video(notebook_id: &str, source_ids: &[String], options: &VideoOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::Video, source_ids);
    inner.extend(nulls(4));
    inner.push(json!([
        null,
        null,
        [
            source_ids_double(source_ids),
            options.language,
            opt_text(&options.instructions),
            null,
            options.format.code(),
            options.style.code()
        ]
    ]));
    artifact_request(notebook_id, inner)
}

pub fn quiz(notebook_id: &str, source_ids: &[String], options: &QuizOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::Quiz, source_ids);
    inner.extend(nulls(5));
    inner.push(json!([
        null,
        [
            2,
            null,
            opt_text(&options.instructions),
            null,
            null,
            null,
            null,
            [options.quantity.code(), options.difficulty.code()]
        ]
    ]));
    artifact_request(notebook_id, inner)
}

/// 闪卡与测验共用类型代码 4，变体标记为 1，数量与难度的顺序相反
pub fn flashcards(notebook_id: &str, source_ids: &[String], options: &QuizOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::Flashcards, source_ids);
    inner.extend(nulls(5));
    inner.push(json!([
        null,
        [
            1,
            null,
            opt_text(&options.instructions),
            null,
            null,
            null,
            [options.difficulty.code(), options.quantity.code()]
        ]
    ]));
    artifact_request(notebook_id, inner)
}

pub fn infographic(notebook_id: &str, source_ids: &[String], options: &InfographicOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::Infographic, source_ids);
    inner.extend(nulls(10));
    inner.push(json!([[
        opt_text(&options.instructions),
        options.language,
        null,
        options.orientation.code(),
        options.detail.code()
    ]]));
    artifact_request(notebook_id, inner)
}

pub fn slide_deck(notebook_id: &str, source_ids: &[String], options: &SlideDeckOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::SlideDeck, source_ids);
    inner.extend(nulls(12));
    inner.push(json!([[
        opt_text(&options.instructions),
        options.language,
        options.format.code(),
        options.length.code()
    ]]));
    artifact_request(notebook_id, inner)
}

pub fn data_table(notebook_id: &str, source_ids: &[String], options: &DataTableOptions) -> Value {
    let mut inner = artifact_head(ArtifactType::DataTable, source_ids);
    inner.extend(nulls(14));
    inner.push(json!([
        null,
        [opt_text(&options.instructions), options.language]
    ]));
    artifact_request(notebook_id, inner)
}
