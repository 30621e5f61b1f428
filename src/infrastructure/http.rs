//! HTTP 与 JSON-RPC 原语
//!
//! 引擎全部网络访问走这两个原语，每次调用都带超时。
//! 上层把它们当作可失败、非事务性的调用。

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

/// 复用连接池的 HTTP 客户端封装
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("IronForge/1.0")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// GET 并解析为 JSON，非 2xx 视为失败
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("GET {} returned malformed json", url))
    }

    /// GET 带自定义请求头
    pub async fn get_json_with_headers(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Value> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("GET {} returned malformed json", url))
    }

    /// GET，区分 429 以便上层中止该来源的剩余请求
    pub async fn get_json_rate_limited(&self, url: &str) -> Result<RateLimitedResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;
        let status = response.status();
        if status.as_u16() == 429 {
            return Ok(RateLimitedResponse::RateLimited);
        }
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }
        let value = response
            .json::<Value>()
            .await
            .with_context(|| format!("GET {} returned malformed json", url))?;
        Ok(RateLimitedResponse::Ok(value))
    }

    /// POST JSON 请求体并解析响应
    pub async fn post_json(&self, url: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        let status = response.status();
        if !status.is_success() {
            // 远端错误正文对广播失败诊断有用，带回去
            let text = response.text().await.unwrap_or_default();
            bail!("POST {} returned {}: {}", url, status, text);
        }
        response
            .json::<Value>()
            .await
            .with_context(|| format!("POST {} returned malformed json", url))
    }

    /// JSON-RPC 2.0 调用，返回 `result` 字段
    pub async fn rpc_call(&self, url: &str, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = self.post_json(url, &body).await?;
        if let Some(error) = response.get("error") {
            if !error.is_null() {
                bail!(
                    "rpc {} error: {}",
                    method,
                    error
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string())
                );
            }
        }
        response
            .get("result")
            .cloned()
            .with_context(|| format!("rpc {} returned no result", method))
    }

    /// 批量 JSON-RPC（返回响应数组）
    pub async fn rpc_batch(&self, url: &str, batch: &Value) -> Result<Vec<Value>> {
        let response = self.post_json(url, batch).await?;
        match response {
            Value::Array(items) => Ok(items),
            other => bail!("rpc batch returned non-array: {}", other),
        }
    }
}

/// 含 429 信号的响应
pub enum RateLimitedResponse {
    Ok(Value),
    RateLimited,
}
