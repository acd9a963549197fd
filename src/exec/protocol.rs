//! 执行服务的请求/响应契约与结果分类
//!
//! 服务端以 `type` 字符串区分结果：success / border_first / border_last / error；
//! 任何未知取值都归入 Outcome::Unknown，绝不让未识别的响应向上抛。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const TYPE_SUCCESS: &str = "success";
pub const TYPE_BORDER_FIRST: &str = "border_first";
pub const TYPE_BORDER_LAST: &str = "border_last";
pub const TYPE_ERROR: &str = "error";

/// /api/process 与 /api/debug 的请求体：源码 + 变量快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecRequest {
    pub code: String,
    pub variables: BTreeMap<String, i64>,
}

/// 运行/调试启动响应。variables 的键是服务端的变量编号，errors 仅错误时出现。
#[derive(Debug, Clone, Deserialize)]
pub struct ExecResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub variables: BTreeMap<String, i64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// 调试步进响应。variables 外层键是当前行号（恰好一个），内层是该行的变量绑定。
#[derive(Debug, Clone, Deserialize)]
pub struct StepResponse {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub variables: BTreeMap<String, BTreeMap<String, i64>>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// 执行/调试网络交换的分类结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 正常运行结果，或处于首末步之间的调试步
    Success(BTreeMap<String, i64>),
    /// 调试游标在第一条记录步
    BorderFirst(BTreeMap<String, i64>),
    /// 调试游标在最后一条记录步
    BorderLast(BTreeMap<String, i64>),
    /// 执行/解析失败，逐条消息
    Error(Vec<String>),
    /// 契约之外的 type 取值
    Unknown,
}

/// 步进响应的分类结果：Outcome + 待高亮的行号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub outcome: Outcome,
    pub line: Option<u32>,
}

fn classify(kind: &str, variables: BTreeMap<String, i64>, errors: Vec<String>) -> Outcome {
    match kind {
        TYPE_SUCCESS => Outcome::Success(variables),
        TYPE_BORDER_FIRST => Outcome::BorderFirst(variables),
        TYPE_BORDER_LAST => Outcome::BorderLast(variables),
        TYPE_ERROR => Outcome::Error(errors),
        _ => Outcome::Unknown,
    }
}

impl ExecResponse {
    pub fn into_outcome(self) -> Outcome {
        classify(&self.kind, self.variables, self.errors)
    }
}

impl StepResponse {
    /// 取第一个外层键作为高亮行，合并全部内层映射作为绑定
    pub fn into_outcome(self) -> StepOutcome {
        let line = self
            .variables
            .keys()
            .next()
            .and_then(|key| key.parse::<u32>().ok());
        let mut merged = BTreeMap::new();
        for (_, bindings) in self.variables {
            merged.extend(bindings);
        }
        StepOutcome {
            outcome: classify(&self.kind, merged, self.errors),
            line,
        }
    }
}
