//! 费率估算
//!
//! 每条链给出 slow / average / fast 三档，值带单位
//! （gwei、sat/vB、microlamports），估算源不可用时回落到静态缺省值。

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::domain::chain_config::Chain;
use crate::domain::fee::{FeeEstimate, FeeRate};
use crate::infrastructure::http::HttpClient;

pub struct FeeService {
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
}

impl FeeService {
    pub fn new(http: Arc<HttpClient>, config: Arc<EngineConfig>) -> Self {
        Self { http, config }
    }

    pub async fn estimate_fees(&self, chain: Chain) -> FeeEstimate {
        match chain {
            Chain::Ethereum => self.estimate_eth_fees().await,
            Chain::Bitcoin => {
                self.estimate_utxo_fees(&self.config.mempool_space_url, btc_defaults())
                    .await
            }
            Chain::Litecoin => {
                self.estimate_utxo_fees(&self.config.litecoinspace_url, ltc_defaults())
                    .await
            }
            Chain::Dogecoin => doge_defaults(),
            Chain::Solana => self.estimate_sol_fees().await,
        }
    }

    /// ETH：Blockscout gas oracle → 节点 gasPrice → 静态缺省
    async fn estimate_eth_fees(&self) -> FeeEstimate {
        let url = format!("{}/api/v2/stats", self.config.blockscout_url);
        if let Ok(data) = self.http.get_json(&url).await {
            if let Some(gp) = data.get("gas_prices") {
                let pick = |key: &str, fallback: f64| -> f64 {
                    gp.get(key).and_then(Value::as_f64).unwrap_or(fallback)
                };
                return FeeEstimate {
                    slow: FeeRate::Gwei(pick("slow", 0.5)),
                    average: FeeRate::Gwei(pick("average", 1.0)),
                    fast: FeeRate::Gwei(pick("fast", 3.0)),
                };
            }
        }
        tracing::debug!("blockscout gas oracle unavailable, falling back to rpc");

        for rpc in &self.config.eth_rpc_endpoints {
            if let Ok(result) = self.http.rpc_call(rpc, "eth_gasPrice", json!([])).await {
                if let Some(hexpart) = result.as_str().and_then(|s| s.strip_prefix("0x")) {
                    if let Ok(wei) = u128::from_str_radix(hexpart, 16) {
                        let gwei = wei as f64 / 1e9;
                        return FeeEstimate {
                            slow: FeeRate::Gwei(gwei * 0.8),
                            average: FeeRate::Gwei(gwei),
                            fast: FeeRate::Gwei(gwei * 1.5),
                        };
                    }
                }
            }
        }

        FeeEstimate {
            slow: FeeRate::Gwei(0.5),
            average: FeeRate::Gwei(1.0),
            fast: FeeRate::Gwei(3.0),
        }
    }

    /// Esplora 系推荐费接口 (mempool.space / litecoinspace)
    async fn estimate_utxo_fees(&self, base_url: &str, defaults: FeeEstimate) -> FeeEstimate {
        let url = format!("{}/v1/fees/recommended", base_url);
        match self.http.get_json(&url).await {
            Ok(data) => {
                let pick = |key: &str, fallback: u64| -> u64 {
                    data.get(key).and_then(Value::as_u64).unwrap_or(fallback)
                };
                FeeEstimate {
                    slow: FeeRate::SatPerVbyte(pick("economyFee", 1)),
                    average: FeeRate::SatPerVbyte(pick("halfHourFee", 2)),
                    fast: FeeRate::SatPerVbyte(pick("fastestFee", 5)),
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "fee endpoint unavailable, using defaults");
                defaults
            }
        }
    }

    /// SOL：近期优先费分位数（p25 / p50 / p75），带下限
    async fn estimate_sol_fees(&self) -> FeeEstimate {
        for rpc in &self.config.sol_rpc_endpoints {
            if let Ok(result) = self
                .http
                .rpc_call(rpc, "getRecentPrioritizationFees", json!([]))
                .await
            {
                let mut fees: Vec<u64> = result
                    .as_array()
                    .into_iter()
                    .flatten()
                    .rev()
                    .take(50)
                    .filter_map(|x| x.get("prioritizationFee").and_then(Value::as_u64))
                    .collect();
                if !fees.is_empty() {
                    fees.sort_unstable();
                    let percentile = |p: f64| -> u64 {
                        fees[((fees.len() as f64 * p) as usize).min(fees.len() - 1)]
                    };
                    return FeeEstimate {
                        slow: FeeRate::MicroLamports(percentile(0.25).max(100)),
                        average: FeeRate::MicroLamports(percentile(0.50).max(1_000)),
                        fast: FeeRate::MicroLamports(percentile(0.75).max(10_000)),
                    };
                }
            }
        }
        FeeEstimate {
            slow: FeeRate::MicroLamports(100),
            average: FeeRate::MicroLamports(1_000),
            fast: FeeRate::MicroLamports(50_000),
        }
    }
}

fn btc_defaults() -> FeeEstimate {
    FeeEstimate {
        slow: FeeRate::SatPerVbyte(1),
        average: FeeRate::SatPerVbyte(2),
        fast: FeeRate::SatPerVbyte(5),
    }
}

fn ltc_defaults() -> FeeEstimate {
    FeeEstimate {
        slow: FeeRate::SatPerVbyte(1),
        average: FeeRate::SatPerVbyte(1),
        fast: FeeRate::SatPerVbyte(2),
    }
}

/// DOGE 最低中继费较高，直接用静态阶梯
fn doge_defaults() -> FeeEstimate {
    FeeEstimate {
        slow: FeeRate::SatPerVbyte(100),
        average: FeeRate::SatPerVbyte(500),
        fast: FeeRate::SatPerVbyte(1_000),
    }
}
