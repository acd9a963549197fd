//! Workspace 注册表
//!
//! id → Workspace 记录的映射，负责新建、切换与关闭。切换/关闭一律先把
//! 共享编辑面冲回当前记录再动 id 指针，保证编辑内容不丢。

use std::collections::BTreeMap;

use crate::core::ClientError;

use super::surface::{EditingSurface, OutputView};
use super::vars::VariableStore;

pub type WorkspaceId = u32;

/// 一个打开的项目：源码、变量与最近一次渲染的输出
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub source_text: String,
    pub variables: VariableStore,
    pub last_output: OutputView,
}

impl Workspace {
    /// 有未执行的代码（有源码但从未产生输出）时关闭需要确认
    fn close_needs_confirmation(&self) -> bool {
        !self.source_text.is_empty() && self.last_output.is_empty()
    }
}

/// 关闭操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// 目标有未执行的代码，需要用户确认后带 confirmed 重发
    ConfirmationRequired,
    /// 已关闭；若关闭的是活动 Workspace，携带新激活的 id
    Closed { switched_to: Option<WorkspaceId> },
}

/// 打开中的全部 Workspace；恒有且仅有一个活动 id
#[derive(Debug)]
pub struct WorkspaceRegistry {
    workspaces: BTreeMap<WorkspaceId, Workspace>,
    active: WorkspaceId,
}

impl WorkspaceRegistry {
    /// 建表并打开第一个空 Workspace（id 1），载入编辑面
    pub fn new(surface: &mut EditingSurface) -> Self {
        let mut registry = Self {
            workspaces: BTreeMap::new(),
            active: 0,
        };
        registry.install_fresh(surface);
        registry
    }

    pub fn active_id(&self) -> WorkspaceId {
        self.active
    }

    pub fn ids(&self) -> Vec<WorkspaceId> {
        self.workspaces.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn get(&self, id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.get(&id)
    }

    /// 新建空 Workspace：冲回活动记录，分配最小未用 id，切换并载入
    pub fn open(&mut self, surface: &mut EditingSurface) -> WorkspaceId {
        self.flush_active(surface);
        self.install_fresh(surface)
    }

    /// 切换活动 Workspace：冲回旧记录，再载入目标。对已激活的 id 幂等。
    pub fn switch_to(
        &mut self,
        surface: &mut EditingSurface,
        id: WorkspaceId,
    ) -> Result<(), ClientError> {
        if !self.workspaces.contains_key(&id) {
            return Err(ClientError::UnknownWorkspace(id));
        }
        self.flush_active(surface);
        self.active = id;
        self.load_active(surface);
        Ok(())
    }

    /// 关闭 Workspace：先冲回活动记录；目标有未执行代码且未确认时要求确认。
    /// 关闭活动 Workspace 后切到剩余最小 id，一个不剩则开新的。
    pub fn close(
        &mut self,
        surface: &mut EditingSurface,
        id: WorkspaceId,
        confirmed: bool,
    ) -> Result<CloseOutcome, ClientError> {
        if !self.workspaces.contains_key(&id) {
            return Err(ClientError::UnknownWorkspace(id));
        }
        self.flush_active(surface);

        let target = &self.workspaces[&id];
        if target.close_needs_confirmation() && !confirmed {
            return Ok(CloseOutcome::ConfirmationRequired);
        }

        self.workspaces.remove(&id);

        if self.active != id {
            return Ok(CloseOutcome::Closed { switched_to: None });
        }

        let next = self.workspaces.keys().next().copied();
        match next {
            Some(next_id) => {
                self.active = next_id;
                self.load_active(surface);
                Ok(CloseOutcome::Closed {
                    switched_to: Some(next_id),
                })
            }
            None => {
                let fresh = self.install_fresh(surface);
                Ok(CloseOutcome::Closed {
                    switched_to: Some(fresh),
                })
            }
        }
    }

    /// 把共享编辑面的内容写回活动记录
    pub fn flush_active(&mut self, surface: &EditingSurface) {
        if let Some(active) = self.workspaces.get_mut(&self.active) {
            let (source_text, variables, output) = surface.capture();
            active.source_text = source_text;
            active.variables = variables;
            active.last_output = output;
        }
    }

    fn load_active(&self, surface: &mut EditingSurface) {
        if let Some(active) = self.workspaces.get(&self.active) {
            surface.load(
                active.source_text.clone(),
                active.variables.clone(),
                active.last_output.clone(),
            );
        }
    }

    fn install_fresh(&mut self, surface: &mut EditingSurface) -> WorkspaceId {
        let id = self.lowest_unused_id();
        self.workspaces.insert(id, Workspace::default());
        self.active = id;
        self.load_active(surface);
        id
    }

    fn lowest_unused_id(&self) -> WorkspaceId {
        let mut id = 1;
        while self.workspaces.contains_key(&id) {
            id += 1;
        }
        id
    }
}
