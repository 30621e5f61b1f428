//! 基础设施：HTTP 原语、降级执行器、时效缓存、日志

pub mod cache;
pub mod http;
pub mod logging;
pub mod provider_fallback;

pub use cache::TtlCache;
pub use http::HttpClient;
pub use provider_fallback::{FallbackClient, ProviderCall, ProviderResult};
