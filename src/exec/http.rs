//! 执行服务的 HTTP 客户端
//!
//! 持有一个带超时的 reqwest Client 与服务根地址；非 2xx 状态一律按传输错误处理，
//! 响应体解析交给 serde。

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::protocol::{ExecRequest, ExecResponse, StepResponse};
use super::traits::{ExecBackend, ExecError};

/// HTTP 后端：base_url + 四个 API 路径
pub struct HttpExecBackend {
    client: Client,
    base_url: String,
}

impl HttpExecBackend {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        request: &ExecRequest,
    ) -> Result<T, ExecError> {
        let response = self.client.post(self.url(path)).json(request).send().await?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExecError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ExecError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ExecError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ExecError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl ExecBackend for HttpExecBackend {
    async fn process(&self, request: &ExecRequest) -> Result<ExecResponse, ExecError> {
        self.post_json("/api/process", request).await
    }

    async fn debug(&self, request: &ExecRequest) -> Result<ExecResponse, ExecError> {
        self.post_json("/api/debug", request).await
    }

    async fn debug_next(&self) -> Result<StepResponse, ExecError> {
        self.get_json("/api/debug/next").await
    }

    async fn debug_previous(&self) -> Result<StepResponse, ExecError> {
        self.get_json("/api/debug/previous").await
    }

    async fn stop(&self) -> Result<(), ExecError> {
        let response = self.client.post(self.url("/api/stop")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExecError::Status(status.as_u16()));
        }
        Ok(())
    }
}
