//! 会话控制器：主控循环
//!
//! 持有显式上下文（注册表、共享编辑面、控制面、执行服务后端），在单个后台
//! 任务里顺序消费用户命令。每次网络交换都在循环内就地 await，因此同一时刻
//! 至多一个运行/调试/步进交换在途；busy 标志只是把这条互斥性呈现给控件。

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::config::{load_config, AppConfig};
use crate::controls::{AcceleratorKey, Action, ControlSurface};
use crate::core::UiState;
use crate::exec::{ExecBackend, ExecRequest, HttpExecBackend, Outcome, StepOutcome};
use crate::workspace::{
    CloseOutcome, EditingSurface, OutputView, RenameOutcome, WorkspaceId, WorkspaceRegistry,
};

/// 运行结果清单的标题行
const RUN_HEADING: &str = "Success! Variables:";
/// 调试步清单的标题行
const DEBUG_HEADING: &str = "Debugging:";
/// 源码为空时的本地提示，不发请求
const NO_CODE_MESSAGE: &str = "No code to execute.";
/// 契约之外的响应
const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";
/// 传输层失败的通用提示
const REQUEST_FAILED_MESSAGE: &str = "Could not reach the execution service.";
/// 重命名被拒时的提示
const RENAME_REJECTED_MESSAGE: &str = "Invalid or duplicate variable name. Reverting to original name.";

/// 从 UI 发往控制器的用户命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 新建并切换到空 Workspace
    OpenWorkspace,
    /// 切换活动 Workspace
    SwitchWorkspace(WorkspaceId),
    /// 关闭 Workspace；目标有未执行代码时需先以 confirmed=false 询问
    CloseWorkspace { id: WorkspaceId, confirmed: bool },
    /// 放弃待确认的关闭
    DismissClose,
    /// 覆写源码文本（编辑面镜像）
    SetSource(String),
    AddVariable,
    RemoveVariable(String),
    RenameVariable { old: String, candidate: String },
    SetVariableValue { name: String, raw: String },
    Run,
    Debug,
    StepForward,
    StepBackward,
    Stop,
    /// 原始加速键，按当前控制面模式解析
    Accelerator(AcceleratorKey),
    /// 退出应用
    Quit,
}

#[derive(Debug, Clone, Copy)]
enum StepDirection {
    Forward,
    Backward,
}

/// 会话控制器：全部可变状态的唯一属主
pub struct SessionController {
    registry: WorkspaceRegistry,
    surface: EditingSurface,
    controls: ControlSurface,
    backend: Arc<dyn ExecBackend>,
    notice: Option<String>,
    pending_close: Option<WorkspaceId>,
    workspace_epoch: u64,
}

impl SessionController {
    pub fn new(backend: Arc<dyn ExecBackend>) -> Self {
        let mut surface = EditingSurface::new();
        let registry = WorkspaceRegistry::new(&mut surface);
        Self {
            registry,
            surface,
            controls: ControlSurface::new(),
            backend,
            notice: None,
            pending_close: None,
            workspace_epoch: 0,
        }
    }

    /// 处理一条命令。提示、待确认标记与聚焦信号都是一次性的，进来先清。
    pub async fn handle_command(&mut self, command: Command) {
        self.notice = None;
        self.pending_close = None;
        self.surface.set_focused_field(None);

        match command {
            Command::OpenWorkspace => {
                self.registry.open(&mut self.surface);
                self.workspace_epoch += 1;
            }
            Command::SwitchWorkspace(id) => {
                match self.registry.switch_to(&mut self.surface, id) {
                    Ok(()) => self.workspace_epoch += 1,
                    Err(e) => tracing::warn!("switch failed: {}", e),
                }
            }
            Command::CloseWorkspace { id, confirmed } => self.close_workspace(id, confirmed),
            Command::DismissClose => {}
            Command::SetSource(text) => {
                if self.surface.is_editable() {
                    self.surface.set_source_text(text);
                }
            }
            Command::AddVariable => {
                let name = self.surface.variables_mut().add();
                self.surface.variables_mut().sort_for_display();
                self.surface.set_focused_field(Some(name));
            }
            Command::RemoveVariable(name) => {
                self.surface.variables_mut().remove(&name);
                self.surface.variables_mut().sort_for_display();
            }
            Command::RenameVariable { old, candidate } => {
                if self.surface.variables_mut().rename(&old, &candidate)
                    == RenameOutcome::Rejected
                {
                    self.notice = Some(RENAME_REJECTED_MESSAGE.to_string());
                }
                self.surface.variables_mut().sort_for_display();
            }
            Command::SetVariableValue { name, raw } => {
                self.surface.variables_mut().set_value(&name, &raw);
            }
            Command::Run => self.trigger(Action::Run).await,
            Command::Debug => self.trigger(Action::Debug).await,
            Command::StepForward => self.trigger(Action::StepForward).await,
            Command::StepBackward => self.trigger(Action::StepBackward).await,
            Command::Stop => self.trigger(Action::Stop).await,
            Command::Accelerator(key) => {
                if let Some(action) = self.controls.accelerator(key) {
                    self.trigger(action).await;
                }
            }
            Command::Quit => {}
        }
    }

    /// 当前状态投影
    pub fn ui_state(&self) -> UiState {
        UiState {
            workspaces: self.registry.ids(),
            active: self.registry.active_id(),
            source_text: self.surface.source_text().to_string(),
            variables: self.surface.variables().bindings().to_vec(),
            output: self.surface.output().clone(),
            editable: self.surface.is_editable(),
            mode: self.controls.mode(),
            busy: self.controls.is_busy(),
            actions: self.controls.available_actions(),
            workspace_epoch: self.workspace_epoch,
            highlighted_line: self.surface.highlighted_line(),
            focused_field: self.surface.focused_field().map(String::from),
            notice: self.notice.clone(),
            pending_close: self.pending_close,
        }
    }

    /// 经控制面把门后分发动作；不可用的动作静默忽略
    async fn trigger(&mut self, action: Action) {
        if !self.controls.permits(action) {
            tracing::debug!(?action, "action ignored: not currently available");
            return;
        }
        match action {
            Action::Run => self.run().await,
            Action::Debug => self.start_debug().await,
            Action::StepForward => self.step(StepDirection::Forward).await,
            Action::StepBackward => self.step(StepDirection::Backward).await,
            Action::Stop => self.stop_session().await,
        }
    }

    /// 整段执行。空源码只给本地提示；控件与可编辑性在尾部无条件恢复。
    async fn run(&mut self) {
        self.controls.begin_exchange();
        self.surface.set_editable(false);

        if self.surface.source_text().is_empty() {
            self.surface
                .set_output(OutputView::Notice(NO_CODE_MESSAGE.to_string()));
        } else {
            let request = self.current_request();
            match self.backend.process(&request).await {
                Ok(response) => self.render_outcome(response.into_outcome(), RUN_HEADING),
                Err(e) => {
                    tracing::error!("run request failed: {}", e);
                    self.surface
                        .set_output(OutputView::Notice(REQUEST_FAILED_MESSAGE.to_string()));
                }
            }
        }

        self.registry.flush_active(&self.surface);
        self.controls.end_exchange();
        self.surface.set_editable(true);
    }

    /// 启动调试。成功即切入调试角色并立刻取第一步；错误不进入调试。
    async fn start_debug(&mut self) {
        self.controls.begin_exchange();
        self.surface.set_editable(false);

        if self.surface.source_text().is_empty() {
            self.surface
                .set_output(OutputView::Notice(NO_CODE_MESSAGE.to_string()));
        } else {
            let request = self.current_request();
            match self.backend.debug(&request).await {
                Ok(response) => match response.into_outcome() {
                    Outcome::Success(_) => {
                        self.controls.enter_debug();
                        self.fetch_step(StepDirection::Forward).await;
                    }
                    Outcome::Error(errors) => {
                        self.surface.set_output(OutputView::Errors(errors));
                    }
                    _ => {
                        self.surface
                            .set_output(OutputView::Notice(UNKNOWN_ERROR_MESSAGE.to_string()));
                    }
                },
                Err(e) => {
                    tracing::error!("debug request failed: {}", e);
                    self.surface
                        .set_output(OutputView::Notice(REQUEST_FAILED_MESSAGE.to_string()));
                }
            }
        }

        self.registry.flush_active(&self.surface);
        self.controls.end_exchange();
        self.surface.set_editable(true);
    }

    /// 用户触发的一次步进
    async fn step(&mut self, direction: StepDirection) {
        self.controls.begin_exchange();
        self.fetch_step(direction).await;
        self.registry.flush_active(&self.surface);
        self.controls.end_exchange();
    }

    /// 执行一次步进交换并落地效果：边界标志、清单渲染、高亮行
    async fn fetch_step(&mut self, direction: StepDirection) {
        let result = match direction {
            StepDirection::Forward => self.backend.debug_next().await,
            StepDirection::Backward => self.backend.debug_previous().await,
        };
        match result {
            Ok(response) => {
                let StepOutcome { outcome, line } = response.into_outcome();
                self.controls.apply_step_outcome(&outcome);
                self.render_outcome(outcome, DEBUG_HEADING);
                if let Some(line) = line {
                    self.surface.set_highlighted_line(Some(line));
                }
            }
            Err(e) => {
                tracing::error!("debug step request failed: {}", e);
                self.surface
                    .set_output(OutputView::Notice(REQUEST_FAILED_MESSAGE.to_string()));
            }
        }
    }

    /// 停止会话：即发即忘地通知服务端，传输失败只记日志；随后回到运行角色
    async fn stop_session(&mut self) {
        if let Err(e) = self.backend.stop().await {
            tracing::warn!("stop request failed: {}", e);
        }
        self.controls.leave_debug();
        self.surface.set_highlighted_line(None);
        self.surface.set_editable(true);
    }

    fn close_workspace(&mut self, id: WorkspaceId, confirmed: bool) {
        match self.registry.close(&mut self.surface, id, confirmed) {
            Ok(CloseOutcome::ConfirmationRequired) => {
                self.pending_close = Some(id);
            }
            // 编辑面只在关闭的是活动 Workspace 时才换内容
            Ok(CloseOutcome::Closed { switched_to }) => {
                if switched_to.is_some() {
                    self.workspace_epoch += 1;
                }
            }
            Err(e) => tracing::warn!("close failed: {}", e),
        }
    }

    fn current_request(&self) -> ExecRequest {
        ExecRequest {
            code: self.surface.source_text().to_string(),
            variables: self.surface.variables().snapshot_for_request(),
        }
    }

    /// 把分类结果落到输出区
    fn render_outcome(&mut self, outcome: Outcome, heading: &str) {
        match outcome {
            Outcome::Success(vars) | Outcome::BorderFirst(vars) | Outcome::BorderLast(vars) => {
                self.surface.set_output(OutputView::Listing {
                    heading: heading.to_string(),
                    bindings: format_bindings(vars),
                });
            }
            Outcome::Error(errors) => {
                self.surface.set_output(OutputView::Errors(errors));
            }
            Outcome::Unknown => {
                self.surface
                    .set_output(OutputView::Notice(UNKNOWN_ERROR_MESSAGE.to_string()));
            }
        }
    }
}

/// 服务端的变量键是数字编号：按数值排序后格式化为 `x<键>`
fn format_bindings(vars: std::collections::BTreeMap<String, i64>) -> Vec<(String, i64)> {
    let mut entries: Vec<(String, i64)> = vars.into_iter().collect();
    entries.sort_by_key(|(key, _)| key.parse::<i64>().unwrap_or(i64::MAX));
    entries
        .into_iter()
        .map(|(key, value)| (format!("x{}", key), value))
        .collect()
}

/// 创建控制器运行时：返回命令发送端与状态接收端；后台任务消费命令并发布状态
pub fn create_controller(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<UiState>)> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let backend = Arc::new(HttpExecBackend::new(
        &cfg.service.base_url,
        cfg.service.request_timeout_secs,
    ));
    tracing::info!("Using execution service at {}", cfg.service.base_url);

    Ok(spawn_controller(backend))
}

/// 用给定后端启动命令循环（测试可传 Mock）
pub fn spawn_controller(
    backend: Arc<dyn ExecBackend>,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<UiState>) {
    let mut controller = SessionController::new(backend);
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(controller.ui_state());

    tokio::spawn(async move {
        while let Some(command) = cmd_rx.recv().await {
            if matches!(command, Command::Quit) {
                break;
            }
            controller.handle_command(command).await;
            let _ = state_tx.send(controller.ui_state());
        }
    });

    (cmd_tx, state_rx)
}
