//! 代币服务
//!
//! 代币清单来自公共注册表（Uniswap token list），落盘缓存 24 小时，
//! 过期或缺失时重新抓取并立即回写。余额发现：
//! - ERC-20：对精选合约列表做批量 `eth_call balanceOf`，多 RPC 降级，
//!   批量无结果时回落 Blockscout 枚举
//! - SPL：`getTokenAccountsByOwner` 查两个代币程序，按 mint 去重，
//!   只保留清单内的已知代币
//!
//! 找到的代币经 PriceService 标价后返回。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::domain::chain_config::Chain;
use crate::infrastructure::http::HttpClient;
use crate::service::price_service::PriceService;
use crate::utils::amount::format_units;

/// 清单条目（Uniswap token list 字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenListEntry {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u32,
    #[serde(rename = "chainId")]
    pub chain_id: i64,
    #[serde(rename = "logoURI", skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

/// 按链拆分的代币清单
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenList {
    pub ethereum: Vec<TokenListEntry>,
    pub solana: Vec<TokenListEntry>,
}

/// 持仓代币
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBalance {
    pub contract_address: String,
    pub symbol: String,
    pub name: String,
    pub balance: String,
    pub decimals: u32,
    pub logo_uri: Option<String>,
    pub price: f64,
}

/// 批量查余额的常见 ERC-20 合约
const CHECKED_ERC20: [(&str, &str, &str, u32); 20] = [
    ("0xdAC17F958D2ee523a2206206994597C13D831ec7", "USDT", "Tether USD", 6),
    ("0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", "USDC", "USD Coin", 6),
    ("0x6B175474E89094C44Da98b954EedeAC495271d0F", "DAI", "Dai Stablecoin", 18),
    ("0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599", "WBTC", "Wrapped BTC", 8),
    ("0x514910771AF9Ca656af840dff83E8264EcF986CA", "LINK", "Chainlink", 18),
    ("0x1f9840a85d5aF5bf1D1762F925BDADdC4201F984", "UNI", "Uniswap", 18),
    ("0x7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9", "AAVE", "Aave", 18),
    ("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "WETH", "Wrapped Ether", 18),
    ("0x6982508145454Ce325dDbE47a25d4ec3d2311933", "PEPE", "Pepe", 18),
    ("0x5A98FcBEA516Cf06857215779Fd812CA3beF1B32", "LDO", "Lido DAO", 18),
    ("0xC011a73ee8576Fb46F5E1c5751cA3B9Fe0af2a6F", "SNX", "Synthetix", 18),
    ("0x9f8F72aA9304c8B593d555F12eF6589cC3A579A2", "MKR", "Maker", 18),
    ("0x6De037ef9aD2725EB40118Bb1702EBb27e4Aeb24", "RNDR", "Render Token", 18),
    ("0xB50721BCf8d664c30412Cfbc6cf7a15145234ad1", "ARB", "Arbitrum", 18),
    ("0x95aD61b0a150d79219dCF64E1E6Cc01f0B64C4cE", "SHIB", "Shiba Inu", 18),
    ("0xaea46A60368A7bD060eec7DF8CBa43b7EF41Ad85", "FET", "Fetch.ai", 18),
    ("0xec53bF9167f50cDEB3Ae105f56099aaaB9061F83", "EIGEN", "EigenLayer", 18),
    ("0x7D1AfA7B718fb893dB30A3aBc0Cfc608AaCfeBB0", "POL", "Polygon", 18),
    ("0xF57e7e7C23978C3cAEC3C3548E3D615c346e79fF", "IMX", "Immutable X", 18),
    ("0x4d224452801ACEd8B2F0aebE155379bb5D594381", "APE", "ApeCoin", 18),
];

/// SPL 代币程序（原版 + Token-2022）
const SPL_PROGRAM_IDS: [&str; 2] = [
    "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA",
    "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb",
];

pub struct TokenService {
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    prices: Arc<PriceService>,
}

impl TokenService {
    pub fn new(http: Arc<HttpClient>, config: Arc<EngineConfig>, prices: Arc<PriceService>) -> Self {
        Self {
            http,
            config,
            prices,
        }
    }

    fn cache_path(&self) -> PathBuf {
        self.config.cache_dir.join("token-list.json")
    }

    /// 代币清单：磁盘缓存（24h TTL）→ 公共注册表
    pub async fn get_token_list(&self) -> Result<TokenList> {
        let path = self.cache_path();
        if let Ok(metadata) = std::fs::metadata(&path) {
            let fresh = metadata
                .modified()
                .ok()
                .and_then(|mtime| mtime.elapsed().ok())
                .map(|age| age < Duration::from_secs(self.config.token_list_ttl_secs))
                .unwrap_or(false);
            if fresh {
                if let Ok(raw) = std::fs::read_to_string(&path) {
                    if let Ok(list) = serde_json::from_str::<TokenList>(&raw) {
                        tracing::debug!("token list loaded from disk cache");
                        return Ok(list);
                    }
                }
            }
            tracing::info!("token list cache expired, refreshing");
        }
        self.refresh_token_list().await
    }

    /// 抓取注册表，按 chainId 拆分，立即回写磁盘
    async fn refresh_token_list(&self) -> Result<TokenList> {
        let data = self
            .http
            .get_json(&self.config.token_list_url)
            .await
            .context("token list fetch failed")?;
        let tokens: Vec<TokenListEntry> = data
            .get("tokens")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|t| serde_json::from_value(t.clone()).ok())
                    .collect()
            })
            .unwrap_or_default();

        let list = TokenList {
            ethereum: tokens.iter().filter(|t| t.chain_id == 1).cloned().collect(),
            solana: tokens
                .iter()
                .filter(|t| t.chain_id == 501000101)
                .cloned()
                .collect(),
        };

        if let Err(e) = self.persist(&list) {
            tracing::warn!(error = %e, "token list cache write failed");
        } else {
            tracing::info!(
                ethereum = list.ethereum.len(),
                solana = list.solana.len(),
                "token list cached to disk"
            );
        }
        Ok(list)
    }

    fn persist(&self, list: &TokenList) -> Result<()> {
        std::fs::create_dir_all(&self.config.cache_dir)?;
        std::fs::write(self.cache_path(), serde_json::to_string(list)?)?;
        Ok(())
    }

    /// 查某链某地址的代币持仓并标价
    pub async fn get_token_balances(
        &self,
        chain: Chain,
        address: &str,
        currency: &str,
    ) -> Vec<TokenBalance> {
        let list = self.get_token_list().await.unwrap_or_default();

        let (platform, mut found) = match chain {
            Chain::Ethereum => {
                let mut tokens = self.fetch_erc20_balances(address, &list.ethereum).await;
                if tokens.is_empty() {
                    tracing::debug!("rpc batch found nothing, trying blockscout");
                    tokens = self
                        .fetch_blockscout_erc20(address, &list.ethereum)
                        .await
                        .unwrap_or_default();
                }
                ("ethereum", tokens)
            }
            Chain::Solana => ("solana", self.fetch_spl_balances(address, &list.solana).await),
            _ => return Vec::new(),
        };

        if found.is_empty() {
            return Vec::new();
        }

        let contracts: Vec<String> = found.iter().map(|t| t.contract_address.clone()).collect();
        let prices = self
            .prices
            .get_token_prices(platform, &contracts, currency)
            .await;
        for token in &mut found {
            let key = if platform == "ethereum" {
                token.contract_address.to_lowercase()
            } else {
                token.contract_address.clone()
            };
            token.price = prices.get(&key).copied().unwrap_or(0.0);
        }
        found
    }

    /// 批量 eth_call balanceOf，端点逐个降级
    async fn fetch_erc20_balances(
        &self,
        address: &str,
        list: &[TokenListEntry],
    ) -> Vec<TokenBalance> {
        let call_data = balance_of_calldata(address);
        let batch: Vec<Value> = CHECKED_ERC20
            .iter()
            .enumerate()
            .map(|(i, (contract, _, _, _))| {
                json!({
                    "jsonrpc": "2.0",
                    "id": i + 1,
                    "method": "eth_call",
                    "params": [{ "to": contract, "data": call_data }, "latest"],
                })
            })
            .collect();
        let batch = Value::Array(batch);

        let mut results = Vec::new();
        for rpc in &self.config.eth_rpc_endpoints {
            match self.http.rpc_batch(rpc, &batch).await {
                Ok(items) if !items.is_empty() => {
                    results = items;
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(rpc = %rpc, error = %e, "erc20 batch call failed");
                }
            }
        }

        let mut found = Vec::new();
        for (i, (contract, symbol, name, decimals)) in CHECKED_ERC20.iter().enumerate() {
            let Some(result) = results
                .iter()
                .find(|r| r.get("id").and_then(Value::as_u64) == Some(i as u64 + 1))
                .and_then(|r| r.get("result"))
                .and_then(Value::as_str)
            else {
                continue;
            };
            let Some(raw) = result
                .strip_prefix("0x")
                .and_then(|h| u128::from_str_radix(h, 16).ok())
            else {
                continue;
            };
            if raw == 0 {
                continue;
            }
            let list_entry = list
                .iter()
                .find(|t| t.address.eq_ignore_ascii_case(contract));
            found.push(TokenBalance {
                contract_address: contract.to_string(),
                symbol: symbol.to_string(),
                name: name.to_string(),
                balance: format_units(raw, *decimals),
                decimals: *decimals,
                logo_uri: list_entry.and_then(|t| t.logo_uri.clone()),
                price: 0.0,
            });
        }
        tracing::debug!(count = found.len(), "erc20 tokens with balance");
        found
    }

    /// Blockscout 枚举地址持有的全部 ERC-20（过滤到清单内条目）
    async fn fetch_blockscout_erc20(
        &self,
        address: &str,
        list: &[TokenListEntry],
    ) -> Result<Vec<TokenBalance>> {
        let url = format!(
            "{}/api/v2/addresses/{}/tokens?type=ERC-20",
            self.config.blockscout_url, address
        );
        let data = self.http.get_json(&url).await?;

        let mut found = Vec::new();
        for item in data
            .get("items")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let Some(contract) = item.pointer("/token/address_hash").and_then(Value::as_str)
            else {
                continue;
            };
            let Some(raw) = item
                .get("value")
                .and_then(Value::as_str)
                .and_then(|v| v.parse::<u128>().ok())
            else {
                continue;
            };
            if raw == 0 {
                continue;
            }
            // 清单之外的代币跳过（垃圾币过滤）
            let Some(entry) = list.iter().find(|t| t.address.eq_ignore_ascii_case(contract))
            else {
                continue;
            };
            let decimals = item
                .pointer("/token/decimals")
                .and_then(Value::as_str)
                .and_then(|d| d.parse().ok())
                .unwrap_or(entry.decimals);
            found.push(TokenBalance {
                contract_address: contract.to_string(),
                symbol: entry.symbol.clone(),
                name: entry.name.clone(),
                balance: format_units(raw, decimals),
                decimals,
                logo_uri: entry.logo_uri.clone(),
                price: 0.0,
            });
        }
        tracing::debug!(count = found.len(), "blockscout erc20 tokens");
        Ok(found)
    }

    /// SPL 持仓：两个代币程序、多端点降级、按 mint 去重
    async fn fetch_spl_balances(
        &self,
        address: &str,
        list: &[TokenListEntry],
    ) -> Vec<TokenBalance> {
        let mut accounts: Vec<Value> = Vec::new();
        for rpc in &self.config.sol_rpc_endpoints {
            let mut combined = Vec::new();
            let mut ok = false;
            for program_id in SPL_PROGRAM_IDS {
                match self
                    .http
                    .rpc_call(
                        rpc,
                        "getTokenAccountsByOwner",
                        json!([address, { "programId": program_id }, { "encoding": "jsonParsed" }]),
                    )
                    .await
                {
                    Ok(result) => {
                        ok = true;
                        if let Some(values) = result.get("value").and_then(Value::as_array) {
                            combined.extend(values.iter().cloned());
                        }
                    }
                    Err(e) => {
                        tracing::debug!(rpc = %rpc, error = %e, "spl account query failed");
                    }
                }
            }
            if ok && !combined.is_empty() {
                accounts = combined;
                break;
            }
        }

        let mut seen_mints = std::collections::HashSet::new();
        let mut found = Vec::new();
        for account in &accounts {
            let Some(info) = account.pointer("/account/data/parsed/info") else {
                continue;
            };
            let Some(mint) = info.get("mint").and_then(Value::as_str) else {
                continue;
            };
            if !seen_mints.insert(mint.to_string()) {
                continue;
            }
            let Some(raw) = info
                .pointer("/tokenAmount/amount")
                .and_then(Value::as_str)
                .and_then(|v| v.parse::<u128>().ok())
            else {
                continue;
            };
            if raw == 0 {
                continue;
            }
            let decimals = info
                .pointer("/tokenAmount/decimals")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32;
            // 未知代币跳过
            let Some(entry) = list.iter().find(|t| t.address == mint) else {
                continue;
            };
            found.push(TokenBalance {
                contract_address: mint.to_string(),
                symbol: entry.symbol.clone(),
                name: entry.name.clone(),
                balance: format_units(raw, decimals),
                decimals,
                logo_uri: entry.logo_uri.clone(),
                price: 0.0,
            });
        }
        tracing::debug!(count = found.len(), "spl tokens with balance");
        found
    }
}

/// balanceOf(address) 调用数据：selector 0x70a08231 + 左补零地址
fn balance_of_calldata(address: &str) -> String {
    let stripped = address.trim_start_matches("0x").to_lowercase();
    format!("0x70a08231{:0>64}", stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_of_calldata() {
        let data = balance_of_calldata("0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x70a08231"));
        assert!(data.ends_with("9858effd232b4033e47d90003d41ec34ecaeda94"));
        // 前 24 个补位为零
        assert_eq!(&data[10..34], "000000000000000000000000");
    }

    fn offline_service(cache_dir: PathBuf, ttl_secs: u64) -> TokenService {
        let config = Arc::new(EngineConfig {
            token_list_url: "http://127.0.0.1:1".to_string(),
            cache_dir,
            token_list_ttl_secs: ttl_secs,
            ..EngineConfig::default()
        });
        let http = Arc::new(HttpClient::new(Duration::from_millis(200)));
        let prices = Arc::new(PriceService::new(http.clone(), config.clone()));
        TokenService::new(http, config, prices)
    }

    #[tokio::test]
    async fn test_token_list_served_from_fresh_disk_cache() {
        let dir = tempfile::tempdir().unwrap();
        let list = TokenList {
            ethereum: vec![TokenListEntry {
                address: "0xdAC17F958D2ee523a2206206994597C13D831ec7".to_string(),
                symbol: "USDT".to_string(),
                name: "Tether USD".to_string(),
                decimals: 6,
                chain_id: 1,
                logo_uri: None,
            }],
            solana: vec![],
        };
        std::fs::write(
            dir.path().join("token-list.json"),
            serde_json::to_string(&list).unwrap(),
        )
        .unwrap();

        // 注册表端点不可达：命中磁盘缓存才可能成功
        let service = offline_service(dir.path().to_path_buf(), 86400);
        let loaded = service.get_token_list().await.unwrap();
        assert_eq!(loaded.ethereum.len(), 1);
        assert_eq!(loaded.ethereum[0].symbol, "USDT");
    }

    #[tokio::test]
    async fn test_expired_token_list_forces_refetch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("token-list.json"),
            serde_json::to_string(&TokenList::default()).unwrap(),
        )
        .unwrap();

        // TTL 为 0：缓存立即过期，必须重抓，端点不可达因此报错
        let service = offline_service(dir.path().to_path_buf(), 0);
        assert!(service.get_token_list().await.is_err());
    }
}
