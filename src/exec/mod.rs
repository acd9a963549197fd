//! 执行服务层：客户端抽象与实现（HTTP / Mock）、请求/响应契约与结果分类

pub mod http;
pub mod mock;
pub mod protocol;
pub mod traits;

pub use http::HttpExecBackend;
pub use mock::MockExecBackend;
pub use protocol::{ExecRequest, ExecResponse, Outcome, StepOutcome, StepResponse};
pub use traits::{ExecBackend, ExecError};
