//! 共享编辑面
//!
//! 全部 Workspace 轮流映射到同一块编辑状态：源码文本、变量字段、输出区、
//! 可编辑标志、调试高亮行与待聚焦字段。切换 Workspace 前必须先把这里的
//! 内容冲回原记录（见 registry）。

use serde::Serialize;

use super::vars::VariableStore;

/// 输出区内容：成功清单、错误清单、本地提示或空
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub enum OutputView {
    #[default]
    Empty,
    /// 变量清单（运行结果或调试步），名字已按 `x<键>` 格式化
    Listing {
        heading: String,
        bindings: Vec<(String, i64)>,
    },
    /// 执行/解析错误，逐条原样展示
    Errors(Vec<String>),
    /// 本地提示（如「没有可执行的代码」或通用失败信息）
    Notice(String),
}

impl OutputView {
    /// 关闭确认谓词只把 Empty 当作「没有输出」；提示信息也算输出
    pub fn is_empty(&self) -> bool {
        matches!(self, OutputView::Empty)
    }
}

/// 活动 Workspace 在界面上的镜像
#[derive(Debug, Clone, Default)]
pub struct EditingSurface {
    source_text: String,
    variables: VariableStore,
    output: OutputView,
    editable: bool,
    highlighted_line: Option<u32>,
    focused_field: Option<String>,
}

impl EditingSurface {
    pub fn new() -> Self {
        Self {
            editable: true,
            ..Self::default()
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn set_source_text(&mut self, text: String) {
        self.source_text = text;
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    pub fn output(&self) -> &OutputView {
        &self.output
    }

    pub fn set_output(&mut self, output: OutputView) {
        self.output = output;
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn highlighted_line(&self) -> Option<u32> {
        self.highlighted_line
    }

    pub fn set_highlighted_line(&mut self, line: Option<u32>) {
        self.highlighted_line = line;
    }

    pub fn focused_field(&self) -> Option<&str> {
        self.focused_field.as_deref()
    }

    pub fn set_focused_field(&mut self, name: Option<String>) {
        self.focused_field = name;
    }

    /// 取出当前镜像内容（冲回 Workspace 记录用）
    pub fn capture(&self) -> (String, VariableStore, OutputView) {
        (
            self.source_text.clone(),
            self.variables.clone(),
            self.output.clone(),
        )
    }

    /// 载入另一个 Workspace 的内容；高亮与聚焦随旧会话一并失效
    pub fn load(&mut self, source_text: String, mut variables: VariableStore, output: OutputView) {
        variables.sort_for_display();
        self.source_text = source_text;
        self.variables = variables;
        self.output = output;
        self.highlighted_line = None;
        self.focused_field = None;
    }
}
