//! 配置管理模块
//!
//! 引擎所有外部端点、超时与缓存参数集中于此，由调用方构造后注入，
//! 不使用任何进程级全局状态。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Ethereum JSON-RPC 端点（按优先级排列）
    pub eth_rpc_endpoints: Vec<String>,
    /// Solana JSON-RPC 端点（按优先级排列）
    pub sol_rpc_endpoints: Vec<String>,
    /// EVM 链 ID（EIP-155 签名用）
    pub evm_chain_id: u64,

    // 区块浏览器 / 索引服务
    pub etherscan_url: String,
    pub ethplorer_url: String,
    pub blockscout_url: String,
    pub blockchair_url: String,
    pub blockcypher_url: String,
    pub mempool_space_url: String,
    pub btcscan_url: String,
    pub litecoinspace_url: String,
    pub solscan_url: String,

    // 价格 / 汇率 / 代币清单
    pub coingecko_url: String,
    pub geckoterminal_url: String,
    pub dexscreener_url: String,
    pub frankfurter_url: String,
    pub token_list_url: String,

    /// 单个 HTTP 请求超时（秒）
    pub request_timeout_secs: u64,
    /// fallback 层单个 provider 的本地超时（秒）
    pub provider_timeout_secs: u64,

    // 缓存 TTL
    pub native_price_ttl_secs: u64,
    pub token_price_ttl_secs: u64,
    pub fx_ttl_secs: u64,
    pub token_list_ttl_secs: u64,

    /// 磁盘缓存目录（代币清单）
    pub cache_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            eth_rpc_endpoints: vec![
                "https://ethereum-rpc.publicnode.com".to_string(),
                "https://cloudflare-eth.com".to_string(),
                "https://eth.llamarpc.com".to_string(),
            ],
            sol_rpc_endpoints: vec![
                "https://api.mainnet-beta.solana.com".to_string(),
                "https://solana-mainnet.g.alchemy.com/v2/demo".to_string(),
                "https://rpc.ankr.com/solana".to_string(),
            ],
            evm_chain_id: 1,
            etherscan_url: "https://api.etherscan.io/api".to_string(),
            ethplorer_url: "https://api.ethplorer.io".to_string(),
            blockscout_url: "https://eth.blockscout.com".to_string(),
            blockchair_url: "https://api.blockchair.com".to_string(),
            blockcypher_url: "https://api.blockcypher.com/v1".to_string(),
            mempool_space_url: "https://mempool.space/api".to_string(),
            btcscan_url: "https://btcscan.org/api".to_string(),
            litecoinspace_url: "https://litecoinspace.org/api".to_string(),
            solscan_url: "https://api-v2.solscan.io/v2".to_string(),
            coingecko_url: "https://api.coingecko.com/api/v3".to_string(),
            geckoterminal_url: "https://api.geckoterminal.com/api/v2".to_string(),
            dexscreener_url: "https://api.dexscreener.com/latest".to_string(),
            frankfurter_url: "https://api.frankfurter.app".to_string(),
            token_list_url: "https://ipfs.io/ipns/tokens.uniswap.org".to_string(),
            request_timeout_secs: 15,
            provider_timeout_secs: 20,
            native_price_ttl_secs: 60,
            token_price_ttl_secs: 60,
            fx_ttl_secs: 600,
            token_list_ttl_secs: 24 * 60 * 60,
            cache_dir: PathBuf::from(".ironforge-cache"),
        }
    }
}

impl EngineConfig {
    /// 从环境变量加载（其余字段保持默认值）
    ///
    /// 支持的变量：
    /// - `IRONFORGE_ETH_RPC`: 逗号分隔的 RPC 端点列表
    /// - `IRONFORGE_SOL_RPC`: 逗号分隔的 RPC 端点列表
    /// - `IRONFORGE_CACHE_DIR`: 磁盘缓存目录
    /// - `IRONFORGE_REQUEST_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        // .env 不存在时静默跳过
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(endpoints) = std::env::var("IRONFORGE_ETH_RPC") {
            let list: Vec<String> = endpoints
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !list.is_empty() {
                config.eth_rpc_endpoints = list;
            }
        }
        if let Ok(endpoints) = std::env::var("IRONFORGE_SOL_RPC") {
            let list: Vec<String> = endpoints
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !list.is_empty() {
                config.sol_rpc_endpoints = list;
            }
        }
        if let Ok(dir) = std::env::var("IRONFORGE_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Ok(secs) = std::env::var("IRONFORGE_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout_secs = secs;
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(!config.eth_rpc_endpoints.is_empty());
        assert!(!config.sol_rpc_endpoints.is_empty());
        assert_eq!(config.native_price_ttl_secs, 60);
        assert_eq!(config.fx_ttl_secs, 600);
        assert_eq!(config.token_list_ttl_secs, 86400);
    }
}
