//! 引擎装配
//!
//! 按配置构造各服务并持有它们。缓存归各服务所有、随引擎注入，
//! 没有进程级全局状态；UI/CLI 持有一个 [`WalletEngine`] 即可完成
//! 派生 → 签名 → 广播 → 查询的全部流程。

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::domain::multi_chain_wallet::MultiChainWalletService;
use crate::infrastructure::http::HttpClient;
use crate::service::{
    BalanceService, EvmSender, FeeService, PriceService, SolanaSender, TokenService, UtxoSender,
};

pub struct WalletEngine {
    pub config: Arc<EngineConfig>,
    pub wallet: MultiChainWalletService,
    pub balances: BalanceService,
    pub fees: FeeService,
    pub prices: Arc<PriceService>,
    pub tokens: TokenService,
    pub evm: EvmSender,
    pub solana: SolanaSender,
    pub utxo: UtxoSender,
}

impl WalletEngine {
    pub fn new(config: EngineConfig) -> Self {
        let config = Arc::new(config);
        let http = Arc::new(HttpClient::new(config.request_timeout()));
        let prices = Arc::new(PriceService::new(http.clone(), config.clone()));

        Self {
            wallet: MultiChainWalletService::new(),
            balances: BalanceService::new(http.clone(), config.clone()),
            fees: FeeService::new(http.clone(), config.clone()),
            tokens: TokenService::new(http.clone(), config.clone(), prices.clone()),
            evm: EvmSender::new(
                config
                    .eth_rpc_endpoints
                    .first()
                    .cloned()
                    .unwrap_or_default(),
                config.evm_chain_id,
            ),
            solana: SolanaSender::new(http.clone(), config.sol_rpc_endpoints.clone()),
            utxo: UtxoSender::new(http, config.blockcypher_url.clone()),
            prices,
            config,
        }
    }

    /// 展示货币切换入口：失效价格缓存，避免旧货币报价残留
    pub async fn on_currency_changed(&self) {
        self.prices.clear_price_caches().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_assembles_from_config() {
        let engine = WalletEngine::new(EngineConfig::default());
        assert_eq!(engine.config.evm_chain_id, 1);
        // 同一配置贯穿各服务
        assert!(!engine.config.eth_rpc_endpoints.is_empty());
    }
}
