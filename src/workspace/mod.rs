//! Workspace 层：注册表（registry）、共享编辑面（surface）、变量字段（vars）

pub mod registry;
pub mod surface;
pub mod vars;

pub use registry::{CloseOutcome, Workspace, WorkspaceId, WorkspaceRegistry};
pub use surface::{EditingSurface, OutputView};
pub use vars::{RenameOutcome, VariableBinding, VariableStore};
