//! 执行服务客户端抽象
//!
//! 所有后端（HTTP / Mock）实现 ExecBackend：运行、调试启动、双向步进与停止。

use async_trait::async_trait;
use thiserror::Error;

use super::protocol::{ExecRequest, ExecResponse, StepResponse};

/// 执行服务交换中可能出现的传输层错误
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for ExecError {
    fn from(err: reqwest::Error) -> Self {
        ExecError::Network(err.to_string())
    }
}

/// 执行服务客户端 trait：每个方法对应一次网络交换
#[async_trait]
pub trait ExecBackend: Send + Sync {
    /// POST /api/process：整段执行
    async fn process(&self, request: &ExecRequest) -> Result<ExecResponse, ExecError>;

    /// POST /api/debug：启动调试会话并录制步
    async fn debug(&self, request: &ExecRequest) -> Result<ExecResponse, ExecError>;

    /// GET /api/debug/next：推进服务端调试游标
    async fn debug_next(&self) -> Result<StepResponse, ExecError>;

    /// GET /api/debug/previous：回退服务端调试游标
    async fn debug_previous(&self) -> Result<StepResponse, ExecError>;

    /// POST /api/stop：放弃当前运行/调试会话
    async fn stop(&self) -> Result<(), ExecError>;
}
