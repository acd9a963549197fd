//! 状态定义：UiState 投影
//!
//! UI 只持有轻量投影：打开的 Workspace 列表、编辑面镜像、控制面模式与
//! 可用动作；完整状态由 SessionController 维护并在每条命令后重新投影。

use serde::Serialize;

use crate::controls::{Action, ControlMode};
use crate::workspace::{OutputView, VariableBinding, WorkspaceId};

/// UI 看到的「投影」状态，轻量且易于渲染
#[derive(Clone, Debug, Serialize)]
pub struct UiState {
    /// 打开的 Workspace id（升序）
    pub workspaces: Vec<WorkspaceId>,
    /// 当前活动 Workspace
    pub active: WorkspaceId,
    /// 编辑面镜像
    pub source_text: String,
    pub variables: Vec<VariableBinding>,
    pub output: OutputView,
    pub editable: bool,
    /// 控制面
    pub mode: ControlMode,
    pub busy: bool,
    pub actions: Vec<Action>,
    /// 编辑面重载计数：打开/切换/关闭导致编辑面换内容时递增，
    /// UI 据此重置本地编辑缓冲（关闭最后一个 Workspace 会以相同 id 重建，光看 active 不够）
    pub workspace_epoch: u64,
    /// 调试高亮行（步进响应的外层键）
    pub highlighted_line: Option<u32>,
    /// 新增变量后待聚焦的字段名
    pub focused_field: Option<String>,
    /// 一次性用户提示（如重命名被拒）
    pub notice: Option<String>,
    /// 等待确认关闭的 Workspace（有未执行的代码）
    pub pending_close: Option<WorkspaceId>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            workspaces: vec![1],
            active: 1,
            source_text: String::new(),
            variables: Vec::new(),
            output: OutputView::Empty,
            editable: true,
            mode: ControlMode::RunControls,
            busy: false,
            actions: Vec::new(),
            workspace_epoch: 0,
            highlighted_line: None,
            focused_field: None,
            notice: None,
            pending_close: None,
        }
    }
}
