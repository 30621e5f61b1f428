//! 通用 provider 降级执行器
//!
//! 同一逻辑查询的多个数据源按优先级排成列表，顺序尝试；
//! HTTP 成功不代表数据可用，由接受谓词（而非状态码）决定是否继续降级。
//! 单个 provider 超时或抛错按失败跳过；列表穷尽后返回显式的空哨兵值，
//! 让「确认为零」与「查询失败」对上层保持可区分（由 provider_index 标记）。
//!
//! 列表内严格串行：只有 provider N 被拒绝后才会尝试 N+1，
//! 避免对免费公共 API 造成重复负载。

use std::time::Duration;

use futures::future::BoxFuture;
use std::future::Future;

/// 一个待尝试的数据源
pub struct ProviderCall<T> {
    pub name: &'static str,
    future: BoxFuture<'static, anyhow::Result<T>>,
}

impl<T> ProviderCall<T> {
    pub fn new(
        name: &'static str,
        future: impl Future<Output = anyhow::Result<T>> + Send + 'static,
    ) -> Self {
        Self {
            name,
            future: Box::pin(future),
        }
    }
}

/// 降级执行结果
#[derive(Debug, Clone)]
pub struct ProviderResult<T> {
    pub value: T,
    /// 命中的 provider 序号；`None` 表示列表穷尽，value 为空哨兵
    pub provider_index: Option<usize>,
}

impl<T> ProviderResult<T> {
    pub fn is_exhausted(&self) -> bool {
        self.provider_index.is_none()
    }
}

/// 降级执行器
#[derive(Clone)]
pub struct FallbackClient {
    call_timeout: Duration,
}

impl FallbackClient {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    /// 顺序尝试各 provider，返回第一个通过接受谓词的结果
    pub async fn first_acceptable<T>(
        &self,
        label: &str,
        providers: Vec<ProviderCall<T>>,
        accept: impl Fn(&T) -> bool,
        empty: T,
    ) -> ProviderResult<T> {
        for (index, provider) in providers.into_iter().enumerate() {
            let name = provider.name;
            match tokio::time::timeout(self.call_timeout, provider.future).await {
                Err(_) => {
                    tracing::warn!(
                        query = label,
                        provider = name,
                        timeout_secs = self.call_timeout.as_secs(),
                        "provider timed out, trying next"
                    );
                }
                Ok(Err(e)) => {
                    tracing::warn!(query = label, provider = name, error = %e, "provider failed, trying next");
                }
                Ok(Ok(value)) => {
                    if accept(&value) {
                        tracing::debug!(query = label, provider = name, index, "provider accepted");
                        return ProviderResult {
                            value,
                            provider_index: Some(index),
                        };
                    }
                    tracing::debug!(
                        query = label,
                        provider = name,
                        "provider returned empty result, trying next"
                    );
                }
            }
        }
        tracing::warn!(query = label, "all providers exhausted");
        ProviderResult {
            value: empty,
            provider_index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn client() -> FallbackClient {
        FallbackClient::new(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_first_nonempty_wins_and_later_not_invoked() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c1 = calls.clone();
        let c2 = calls.clone();
        let c3 = calls.clone();

        let providers = vec![
            ProviderCall::new("empty", async move {
                c1.fetch_add(1, Ordering::SeqCst);
                Ok(0u64)
            }),
            ProviderCall::new("data", async move {
                c2.fetch_add(1, Ordering::SeqCst);
                Ok(42u64)
            }),
            ProviderCall::new("untouched", async move {
                c3.fetch_add(1, Ordering::SeqCst);
                Ok(7u64)
            }),
        ];

        let result = client()
            .first_acceptable("test", providers, |v| *v != 0, 0)
            .await;

        assert_eq!(result.value, 42);
        assert_eq!(result.provider_index, Some(1));
        // 第三个 provider 不应被调用
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_provider_skipped() {
        let providers = vec![
            ProviderCall::new("failing", async { anyhow::bail!("boom") }),
            ProviderCall::new("data", async { Ok(9u64) }),
        ];
        let result = client()
            .first_acceptable("test", providers, |v| *v != 0, 0)
            .await;
        assert_eq!(result.value, 9);
        assert_eq!(result.provider_index, Some(1));
    }

    #[tokio::test]
    async fn test_timeout_provider_skipped() {
        let providers = vec![
            ProviderCall::new("slow", async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1u64)
            }),
            ProviderCall::new("fast", async { Ok(2u64) }),
        ];
        let result = client()
            .first_acceptable("test", providers, |v| *v != 0, 0)
            .await;
        assert_eq!(result.value, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_empty_sentinel() {
        let providers: Vec<ProviderCall<u64>> = vec![
            ProviderCall::new("empty1", async { Ok(0u64) }),
            ProviderCall::new("failing", async { anyhow::bail!("down") }),
        ];
        let result = client()
            .first_acceptable("test", providers, |v| *v != 0, 0)
            .await;
        assert_eq!(result.value, 0);
        assert!(result.is_exhausted());
    }
}
