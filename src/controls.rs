//! 控制面状态机
//!
//! 同一组物理控件在两种角色间整体切换：空闲时是 Run/Debug/Stop，调试中
//! 变成 Prev/Next/Stop。模式作为带标签的枚举建模，换入换出不可能错位叠加；
//! busy 标志在一次网络交换期间关掉触发控件，保证同时至多一个交换在途。

use serde::Serialize;

use crate::exec::Outcome;

/// 用户可触发的逻辑动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Run,
    Debug,
    StepBackward,
    StepForward,
    Stop,
}

/// 调试模式下的步进加速键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceleratorKey {
    F10,
    F11,
}

/// 控制面模式：运行角色或调试角色（含首末步边界标志）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlMode {
    RunControls,
    DebugControls { at_first: bool, at_last: bool },
}

/// 控制面：模式 + 交换在途标志
#[derive(Debug, Clone)]
pub struct ControlSurface {
    mode: ControlMode,
    busy: bool,
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlSurface {
    pub fn new() -> Self {
        Self {
            mode: ControlMode::RunControls,
            busy: false,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_debugging(&self) -> bool {
        matches!(self.mode, ControlMode::DebugControls { .. })
    }

    /// 判断动作当前是否可用
    pub fn permits(&self, action: Action) -> bool {
        if self.busy {
            return false;
        }
        match self.mode {
            ControlMode::RunControls => {
                matches!(action, Action::Run | Action::Debug | Action::Stop)
            }
            ControlMode::DebugControls { at_first, at_last } => match action {
                Action::StepBackward => !at_first,
                Action::StepForward => !at_last,
                Action::Stop => true,
                Action::Run | Action::Debug => false,
            },
        }
    }

    /// 当前可用动作列表（UI 投影用）
    pub fn available_actions(&self) -> Vec<Action> {
        [
            Action::Run,
            Action::Debug,
            Action::StepBackward,
            Action::StepForward,
            Action::Stop,
        ]
        .into_iter()
        .filter(|a| self.permits(*a))
        .collect()
    }

    /// 一次交换开始：触发控件整体失效
    pub fn begin_exchange(&mut self) {
        self.busy = true;
    }

    /// 一次交换结束：无论结果如何都恢复控件
    pub fn end_exchange(&mut self) {
        self.busy = false;
    }

    /// 进入调试角色。已在调试中则保持现状（换入不可叠加）。
    pub fn enter_debug(&mut self) {
        if self.is_debugging() {
            tracing::warn!("enter_debug while already debugging, keeping current mode");
            return;
        }
        self.mode = ControlMode::DebugControls {
            at_first: false,
            at_last: false,
        };
    }

    /// 回到运行角色。幂等。
    pub fn leave_debug(&mut self) {
        self.mode = ControlMode::RunControls;
    }

    /// 按步进结果重算边界标志。错误/未知结果不改动边界。
    pub fn apply_step_outcome(&mut self, outcome: &Outcome) {
        let ControlMode::DebugControls { .. } = self.mode else {
            return;
        };
        match outcome {
            Outcome::Success(_) => {
                self.mode = ControlMode::DebugControls {
                    at_first: false,
                    at_last: false,
                };
            }
            Outcome::BorderFirst(_) => {
                self.mode = ControlMode::DebugControls {
                    at_first: true,
                    at_last: false,
                };
            }
            Outcome::BorderLast(_) => {
                self.mode = ControlMode::DebugControls {
                    at_first: false,
                    at_last: true,
                };
            }
            Outcome::Error(_) | Outcome::Unknown => {}
        }
    }

    /// 加速键解析：仅调试角色下 F10/F11 映射到步进动作
    pub fn accelerator(&self, key: AcceleratorKey) -> Option<Action> {
        match self.mode {
            ControlMode::DebugControls { .. } => Some(match key {
                AcceleratorKey::F10 => Action::StepBackward,
                AcceleratorKey::F11 => Action::StepForward,
            }),
            ControlMode::RunControls => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn bindings() -> BTreeMap<String, i64> {
        BTreeMap::new()
    }

    #[test]
    fn idle_permits_run_and_debug_only() {
        let controls = ControlSurface::new();
        assert!(controls.permits(Action::Run));
        assert!(controls.permits(Action::Debug));
        assert!(controls.permits(Action::Stop));
        assert!(!controls.permits(Action::StepForward));
        assert!(!controls.permits(Action::StepBackward));
    }

    #[test]
    fn busy_disables_everything_until_exchange_ends() {
        let mut controls = ControlSurface::new();
        controls.begin_exchange();
        assert!(!controls.permits(Action::Run));
        assert!(!controls.permits(Action::Debug));
        controls.end_exchange();
        assert!(controls.permits(Action::Run));
    }

    #[test]
    fn boundary_flags_follow_step_outcomes() {
        let mut controls = ControlSurface::new();
        controls.enter_debug();

        controls.apply_step_outcome(&Outcome::BorderFirst(bindings()));
        assert!(!controls.permits(Action::StepBackward));
        assert!(controls.permits(Action::StepForward));

        controls.apply_step_outcome(&Outcome::Success(bindings()));
        assert!(controls.permits(Action::StepBackward));
        assert!(controls.permits(Action::StepForward));

        controls.apply_step_outcome(&Outcome::BorderLast(bindings()));
        assert!(controls.permits(Action::StepBackward));
        assert!(!controls.permits(Action::StepForward));
    }

    #[test]
    fn error_outcome_leaves_boundary_flags_alone() {
        let mut controls = ControlSurface::new();
        controls.enter_debug();
        controls.apply_step_outcome(&Outcome::BorderLast(bindings()));
        controls.apply_step_outcome(&Outcome::Error(vec!["boom".to_string()]));
        assert!(!controls.permits(Action::StepForward));
        controls.apply_step_outcome(&Outcome::Unknown);
        assert!(!controls.permits(Action::StepForward));
    }

    #[test]
    fn double_enter_keeps_boundary_state() {
        let mut controls = ControlSurface::new();
        controls.enter_debug();
        controls.apply_step_outcome(&Outcome::BorderFirst(bindings()));
        controls.enter_debug();
        assert_eq!(
            controls.mode(),
            ControlMode::DebugControls {
                at_first: true,
                at_last: false
            }
        );
    }

    #[test]
    fn leave_debug_is_idempotent() {
        let mut controls = ControlSurface::new();
        controls.enter_debug();
        controls.leave_debug();
        controls.leave_debug();
        assert_eq!(controls.mode(), ControlMode::RunControls);
        assert!(controls.permits(Action::Run));
    }

    #[test]
    fn accelerators_resolve_only_while_debugging() {
        let mut controls = ControlSurface::new();
        assert_eq!(controls.accelerator(AcceleratorKey::F10), None);
        assert_eq!(controls.accelerator(AcceleratorKey::F11), None);

        controls.enter_debug();
        assert_eq!(
            controls.accelerator(AcceleratorKey::F10),
            Some(Action::StepBackward)
        );
        assert_eq!(
            controls.accelerator(AcceleratorKey::F11),
            Some(Action::StepForward)
        );

        controls.leave_debug();
        assert_eq!(controls.accelerator(AcceleratorKey::F10), None);
    }
}
