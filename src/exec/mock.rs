//! Mock 执行服务（测试用，无需后端）
//!
//! 每个端点一条脚本队列，按调用顺序弹出预设结果；队列空时返回网络错误，
//! 便于测试及早暴露多余的请求。附带调用计数，供「未发请求」类断言使用。

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::protocol::{ExecRequest, ExecResponse, StepResponse};
use super::traits::{ExecBackend, ExecError};

type Scripted<T> = Mutex<VecDeque<Result<T, ExecError>>>;

/// 脚本化 Mock 后端
#[derive(Default)]
pub struct MockExecBackend {
    process_queue: Scripted<ExecResponse>,
    debug_queue: Scripted<ExecResponse>,
    next_queue: Scripted<StepResponse>,
    previous_queue: Scripted<StepResponse>,
    stop_failure: Mutex<Option<ExecError>>,

    pub process_calls: AtomicUsize,
    pub debug_calls: AtomicUsize,
    pub next_calls: AtomicUsize,
    pub previous_calls: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl MockExecBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_process(&self, result: Result<ExecResponse, ExecError>) {
        self.process_queue.lock().unwrap().push_back(result);
    }

    pub fn push_debug(&self, result: Result<ExecResponse, ExecError>) {
        self.debug_queue.lock().unwrap().push_back(result);
    }

    pub fn push_next(&self, result: Result<StepResponse, ExecError>) {
        self.next_queue.lock().unwrap().push_back(result);
    }

    pub fn push_previous(&self, result: Result<StepResponse, ExecError>) {
        self.previous_queue.lock().unwrap().push_back(result);
    }

    /// 让后续的 stop 调用返回给定错误
    pub fn fail_stop_with(&self, error: ExecError) {
        *self.stop_failure.lock().unwrap() = Some(error);
    }

    fn pop<T>(queue: &Scripted<T>) -> Result<T, ExecError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExecError::Network("mock: no scripted response".to_string())))
    }

    /// 便捷构造：运行成功响应，键为服务端变量编号
    pub fn success_response(variables: &[(&str, i64)]) -> ExecResponse {
        ExecResponse {
            kind: super::protocol::TYPE_SUCCESS.to_string(),
            variables: to_map(variables),
            errors: Vec::new(),
        }
    }

    /// 便捷构造：错误响应
    pub fn error_response(errors: &[&str]) -> ExecResponse {
        ExecResponse {
            kind: super::protocol::TYPE_ERROR.to_string(),
            variables: BTreeMap::new(),
            errors: errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// 便捷构造：指定 type 的步进响应，单一外层行号
    pub fn step_response(kind: &str, line: u32, variables: &[(&str, i64)]) -> StepResponse {
        let mut outer = BTreeMap::new();
        outer.insert(line.to_string(), to_map(variables));
        StepResponse {
            kind: kind.to_string(),
            variables: outer,
            errors: Vec::new(),
        }
    }
}

fn to_map(variables: &[(&str, i64)]) -> BTreeMap<String, i64> {
    variables
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

#[async_trait]
impl ExecBackend for MockExecBackend {
    async fn process(&self, _request: &ExecRequest) -> Result<ExecResponse, ExecError> {
        self.process_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.process_queue)
    }

    async fn debug(&self, _request: &ExecRequest) -> Result<ExecResponse, ExecError> {
        self.debug_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.debug_queue)
    }

    async fn debug_next(&self) -> Result<StepResponse, ExecError> {
        self.next_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.next_queue)
    }

    async fn debug_previous(&self) -> Result<StepResponse, ExecError> {
        self.previous_calls.fetch_add(1, Ordering::SeqCst);
        Self::pop(&self.previous_queue)
    }

    async fn stop(&self) -> Result<(), ExecError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        match self.stop_failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
