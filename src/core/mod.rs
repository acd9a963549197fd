//! 核心控制层：错误类型、UI 状态投影、会话控制器与命令循环

pub mod controller;
pub mod error;
pub mod state;

pub use controller::{create_controller, spawn_controller, Command, SessionController};
pub use error::ClientError;
pub use state::UiState;
