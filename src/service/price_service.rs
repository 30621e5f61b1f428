//! 价格服务
//!
//! 三层缓存（构造注入，带显式 clear）：
//! - 原生币价格：按展示货币单条缓存，TTL 60 秒
//! - 代币价格：按 (platform, currency) 缓存合约地址→价格映射，TTL 60 秒，
//!   降级源的结果合并进同一条目，已解析的价格不重复请求
//! - 美元汇率：按目标货币缓存，TTL 10 分钟，只用于把 USD 报价换算为展示货币
//!
//! 代币价格降级链：CoinGecko → GeckoTerminal → DexScreener（仅 Solana）。
//! 任一来源返回 429 即中止该来源的剩余请求落入下一层；对限流聚合器的
//! 逐合约请求之间加显式间隔，不做并发。
//!
//! 切换展示货币时必须调用 [`PriceService::clear_price_caches`]，
//! 避免展示到旧货币的价格；汇率与代币清单缓存不受影响。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::domain::chain_config::ChainRegistry;
use crate::infrastructure::cache::TtlCache;
use crate::infrastructure::http::{HttpClient, RateLimitedResponse};

/// GeckoTerminal 网络 ID
fn geckoterminal_network(platform: &str) -> Option<&'static str> {
    match platform {
        "ethereum" => Some("eth"),
        "solana" => Some("solana"),
        _ => None,
    }
}

/// DexScreener 上可信的 Solana DEX
const TRUSTED_DEX_IDS: [&str; 4] = ["raydium", "orca", "meteora", "jupiter"];

pub struct PriceService {
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    registry: ChainRegistry,
    native_cache: TtlCache<String, HashMap<String, f64>>,
    token_cache: TtlCache<(String, String), HashMap<String, f64>>,
    fx_cache: TtlCache<String, f64>,
}

impl PriceService {
    pub fn new(http: Arc<HttpClient>, config: Arc<EngineConfig>) -> Self {
        let native_ttl = Duration::from_secs(config.native_price_ttl_secs);
        let token_ttl = Duration::from_secs(config.token_price_ttl_secs);
        let fx_ttl = Duration::from_secs(config.fx_ttl_secs);
        Self {
            http,
            config,
            registry: ChainRegistry::new(),
            native_cache: TtlCache::new(native_ttl),
            token_cache: TtlCache::new(token_ttl),
            fx_cache: TtlCache::new(fx_ttl),
        }
    }

    /// 原生币价格（chain 标识 → 展示货币计价）
    ///
    /// 全部来源失败时返回空映射，「拿不到价格」对上层是显式的空结果。
    pub async fn get_native_prices(&self, currency: &str) -> HashMap<String, f64> {
        let cur = currency.to_lowercase();
        if let Some(cached) = self.native_cache.get(&cur).await {
            return cached;
        }

        let ids: Vec<&str> = self
            .registry
            .list_all()
            .iter()
            .map(|c| c.coingecko_id)
            .collect();
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.config.coingecko_url,
            ids.join(","),
            cur
        );

        match self.http.get_json(&url).await {
            Ok(data) => {
                let mut prices = HashMap::new();
                for config in self.registry.list_all() {
                    let price = data
                        .pointer(&format!("/{}/{}", config.coingecko_id, cur))
                        .and_then(Value::as_f64)
                        .unwrap_or(0.0);
                    prices.insert(config.chain.as_str().to_string(), price);
                }
                self.native_cache.insert(cur, prices.clone()).await;
                prices
            }
            Err(e) => {
                tracing::warn!(error = %e, "native price fetch failed");
                HashMap::new()
            }
        }
    }

    /// USD → 目标货币汇率（Frankfurter，缓存 10 分钟）
    async fn usd_rate(&self, currency: &str) -> f64 {
        let cur = currency.to_uppercase();
        if cur == "USD" {
            return 1.0;
        }
        if let Some(rate) = self.fx_cache.get(&cur).await {
            return rate;
        }

        let url = format!("{}/latest?from=USD&to={}", self.config.frankfurter_url, cur);
        match self.http.get_json(&url).await {
            Ok(data) => {
                let rate = data
                    .pointer(&format!("/rates/{}", cur))
                    .and_then(Value::as_f64)
                    .unwrap_or(1.0);
                self.fx_cache.insert(cur, rate).await;
                rate
            }
            Err(e) => {
                tracing::warn!(error = %e, "fx rate fetch failed, assuming 1.0");
                1.0
            }
        }
    }

    /// 代币价格（合约地址 → 展示货币计价）
    pub async fn get_token_prices(
        &self,
        platform: &str,
        contracts: &[String],
        currency: &str,
    ) -> HashMap<String, f64> {
        if contracts.is_empty() {
            return HashMap::new();
        }
        let cur = currency.to_lowercase();
        let cache_key = (platform.to_string(), cur.clone());

        // Solana mint 地址区分大小写，仅 EVM 合约地址统一小写
        let normalize = |addr: &str| -> String {
            if platform == "ethereum" {
                addr.to_lowercase()
            } else {
                addr.to_string()
            }
        };
        let all_addrs: Vec<String> = contracts.iter().map(|a| normalize(a)).collect();

        // 新条目从有效缓存合并，已解析的价格不再请求
        let mut prices = self.token_cache.get(&cache_key).await.unwrap_or_default();
        let missing: Vec<String> = all_addrs
            .iter()
            .filter(|a| !prices.contains_key(*a))
            .cloned()
            .collect();
        if missing.is_empty() {
            return prices;
        }

        // ─── 第一层：CoinGecko（免费档单合约逐次请求） ───
        for (i, addr) in missing.iter().enumerate() {
            let url = format!(
                "{}/simple/token_price/{}?contract_addresses={}&vs_currencies={}",
                self.config.coingecko_url, platform, addr, cur
            );
            match self.http.get_json_rate_limited(&url).await {
                Ok(RateLimitedResponse::RateLimited) => {
                    tracing::warn!(tried = i, "coingecko rate limited, dropping to next tier");
                    break;
                }
                Ok(RateLimitedResponse::Ok(data)) => {
                    if let Some(object) = data.as_object() {
                        for (resp_addr, price_obj) in object {
                            let price = price_obj.get(&cur).and_then(Value::as_f64).unwrap_or(0.0);
                            prices.insert(normalize(resp_addr), price);
                        }
                    }
                }
                Err(e) => {
                    tracing::debug!(contract = %addr, error = %e, "coingecko token price failed");
                }
            }
            if i < missing.len() - 1 {
                tokio::time::sleep(Duration::from_millis(1200)).await;
            }
        }

        // ─── 第二层：GeckoTerminal（USD 报价 × 汇率） ───
        let missing_after_cg: Vec<String> = all_addrs
            .iter()
            .filter(|a| prices.get(*a).copied().unwrap_or(0.0) == 0.0)
            .cloned()
            .collect();
        if !missing_after_cg.is_empty() {
            if let Some(network) = geckoterminal_network(platform) {
                let fx = self.usd_rate(currency).await;
                for (i, addr) in missing_after_cg.iter().enumerate() {
                    let url = format!(
                        "{}/networks/{}/tokens/{}",
                        self.config.geckoterminal_url, network, addr
                    );
                    match self.http.get_json_rate_limited(&url).await {
                        Ok(RateLimitedResponse::RateLimited) => {
                            tracing::warn!(tried = i, "geckoterminal rate limited");
                            break;
                        }
                        Ok(RateLimitedResponse::Ok(data)) => {
                            if let Some(usd) = parse_price(
                                data.pointer("/data/attributes/price_usd"),
                            ) {
                                if usd > 0.0 {
                                    prices.insert(addr.clone(), usd * fx);
                                }
                            }
                        }
                        Err(e) => {
                            tracing::debug!(contract = %addr, error = %e, "geckoterminal failed");
                        }
                    }
                    if i < missing_after_cg.len() - 1 {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                }
            }
        }

        // ─── 第三层：DexScreener（仅 Solana，取可信 DEX 的最高量对） ───
        if platform == "solana" {
            let missing_after_gt: Vec<String> = all_addrs
                .iter()
                .filter(|a| prices.get(*a).copied().unwrap_or(0.0) == 0.0)
                .cloned()
                .collect();
            if !missing_after_gt.is_empty() {
                let fx = self.usd_rate(currency).await;
                for (i, addr) in missing_after_gt.iter().enumerate() {
                    let url = format!("{}/dex/tokens/{}", self.config.dexscreener_url, addr);
                    if let Ok(data) = self.http.get_json(&url).await {
                        let mut pairs: Vec<&Value> = data
                            .get("pairs")
                            .and_then(Value::as_array)
                            .into_iter()
                            .flatten()
                            .filter(|p| {
                                p.get("chainId").and_then(Value::as_str) == Some("solana")
                                    && p.get("dexId")
                                        .and_then(Value::as_str)
                                        .map(|d| TRUSTED_DEX_IDS.contains(&d))
                                        .unwrap_or(false)
                            })
                            .collect();
                        pairs.sort_by(|a, b| {
                            let volume = |p: &&Value| {
                                p.pointer("/volume/h24").and_then(Value::as_f64).unwrap_or(0.0)
                            };
                            volume(b).partial_cmp(&volume(a)).unwrap_or(std::cmp::Ordering::Equal)
                        });
                        if let Some(best) = pairs.first() {
                            if let Some(usd) = parse_price(best.get("priceUsd")) {
                                if usd > 0.0 {
                                    prices.insert(addr.clone(), usd * fx);
                                }
                            }
                        }
                    }
                    if i < missing_after_gt.len() - 1 {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                    }
                }
            }
        }

        let resolved = prices.values().filter(|p| **p > 0.0).count();
        tracing::info!(
            platform,
            resolved,
            total = all_addrs.len(),
            "token prices resolved"
        );
        self.token_cache.insert(cache_key, prices.clone()).await;
        prices
    }

    /// 展示货币切换时调用：失效原生与代币价格缓存
    /// （汇率与代币清单缓存保留）
    pub async fn clear_price_caches(&self) {
        self.native_cache.clear().await;
        self.token_cache.clear().await;
        tracing::info!("price caches cleared");
    }
}

/// 报价字段可能是数字或字符串，经 Decimal 解析保持精度
fn parse_price(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<Decimal>().ok()?.to_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 端点不可达的配置：任何网络请求都会失败
    fn offline_service() -> PriceService {
        let config = Arc::new(EngineConfig {
            coingecko_url: "http://127.0.0.1:1".to_string(),
            geckoterminal_url: "http://127.0.0.1:1".to_string(),
            dexscreener_url: "http://127.0.0.1:1".to_string(),
            frankfurter_url: "http://127.0.0.1:1".to_string(),
            ..EngineConfig::default()
        });
        PriceService::new(
            Arc::new(HttpClient::new(Duration::from_millis(200))),
            config,
        )
    }

    #[tokio::test]
    async fn test_fresh_cache_read_skips_network() {
        let service = offline_service();
        let mut seeded = HashMap::new();
        seeded.insert("bitcoin".to_string(), 65000.0);
        service
            .native_cache
            .insert("usd".to_string(), seeded.clone())
            .await;

        // 端点不可达：若发生网络请求会得到空映射，
        // 返回种子值证明 TTL 内读取未触发抓取
        let prices = service.get_native_prices("USD").await;
        assert_eq!(prices.get("bitcoin"), Some(&65000.0));
    }

    #[tokio::test]
    async fn test_exhausted_fetch_returns_empty() {
        let service = offline_service();
        let prices = service.get_native_prices("usd").await;
        assert!(prices.is_empty());
    }

    #[tokio::test]
    async fn test_currency_change_clears_price_not_fx() {
        let service = offline_service();
        service
            .native_cache
            .insert("usd".to_string(), HashMap::from([("eth".to_string(), 1.0)]))
            .await;
        service
            .token_cache
            .insert(
                ("ethereum".to_string(), "usd".to_string()),
                HashMap::from([("0xabc".to_string(), 2.0)]),
            )
            .await;
        service.fx_cache.insert("EUR".to_string(), 0.9).await;

        service.clear_price_caches().await;

        assert!(service.native_cache.get(&"usd".to_string()).await.is_none());
        assert!(service
            .token_cache
            .get(&("ethereum".to_string(), "usd".to_string()))
            .await
            .is_none());
        // 汇率缓存保留
        assert_eq!(service.fx_cache.get(&"EUR".to_string()).await, Some(0.9));
    }

    #[tokio::test]
    async fn test_resolved_prices_not_refetched() {
        let service = offline_service();
        let key = ("ethereum".to_string(), "usd".to_string());
        service
            .token_cache
            .insert(
                key,
                HashMap::from([("0xdac17f958d2ee523a2206206994597c13d831ec7".to_string(), 1.0)]),
            )
            .await;

        // 已解析的合约直接命中，不触发（必然失败的）网络请求
        let prices = service
            .get_token_prices(
                "ethereum",
                &["0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string()],
                "usd",
            )
            .await;
        assert_eq!(
            prices.get("0xdac17f958d2ee523a2206206994597c13d831ec7"),
            Some(&1.0)
        );
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(Some(&serde_json::json!(1.5))), Some(1.5));
        assert_eq!(parse_price(Some(&serde_json::json!("0.000123"))), Some(0.000123));
        assert_eq!(parse_price(Some(&serde_json::json!("garbage"))), None);
        assert_eq!(parse_price(None), None);
    }
}
