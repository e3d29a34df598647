//! 远端服务的方法标识与固定常量
//!
//! 远端协议没有公开的 schema，这里的值全部来自抓包观察。

/// 创建笔记本
pub const CREATE_NOTEBOOK: &str = "CCqFvf";
/// 获取笔记本详情（包含来源列表和标题）
pub const GET_NOTEBOOK: &str = "rLM1Ne";
/// 删除笔记本
pub const DELETE_NOTEBOOK: &str = "WWINqb";
/// 添加 URL / YouTube / 文本来源
pub const ADD_SOURCE: &str = "izAoDd";
/// 注册文件来源占位
pub const REGISTER_FILE_SOURCE: &str = "o4cbdc";
/// 请求生成产物
pub const CREATE_ARTIFACT: &str = "R7cb6c";
/// 批量列出产物状态
pub const LIST_ARTIFACTS: &str = "gArtLc";
/// 对来源执行同步动作（思维导图）
pub const ACT_ON_SOURCES: &str = "yyryJe";
/// 创建笔记
pub const CREATE_NOTE: &str = "CYK0Xb";
/// 更新笔记
pub const UPDATE_NOTE: &str = "cYAfTb";

/// 请求类型标记，固定出现在信封第四位
pub const REQUEST_KIND: &str = "generic";

/// 响应体开头的反爬前缀
pub const ANTI_XSSI_PREFIX: &str = ")]}'";

/// 成功帧标记
pub const SUCCESS_TAG: &str = "wrb.fr";
/// 错误帧标记
pub const ERROR_TAG: &str = "er";

/// batchexecute 端点路径
pub const BATCH_EXECUTE_PATH: &str = "/_/LabsTailwindUi/data/batchexecute";

/// 产物列表过滤条件，排除系统推荐的占位产物
pub const ARTIFACT_LIST_FILTER: &str = "NOT artifact.status = \"ARTIFACT_STATUS_SUGGESTED\"";

/// 大多数调用都会携带的客户端标记 `[2]`
pub const CLIENT_MARKER: i64 = 2;
