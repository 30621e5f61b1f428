//! 余额与交易历史聚合
//!
//! 一个账户的各链查询并发执行（collect all，单链失败降级为零，
//! 不让整个请求失败）；单链内部的多数据源严格串行降级，
//! 由通用执行器按接受谓词推进。余额与历史永远实时查询，不走缓存。
//!
//! 金额一律为最小单位整数，经 `utils::amount` 转十进制字符串，
//! 浮点数不参与。

use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::EngineConfig;
use crate::domain::chain_config::{Chain, ChainRegistry};
use crate::domain::multi_chain_wallet::ChainAddress;
use crate::error::WalletResult;
use crate::infrastructure::http::HttpClient;
use crate::infrastructure::provider_fallback::{FallbackClient, ProviderCall};
use crate::utils::amount::format_units;

/// 一条转账记录
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    /// "send" | "receive"
    pub direction: String,
    pub amount: String,
    pub symbol: String,
    pub confirmed: bool,
    pub confirmations: u64,
    pub timestamp: i64,
    pub from: String,
    pub to: String,
}

/// 单链查询结果
#[derive(Debug, Clone, Default)]
pub struct ChainData {
    pub balance: String,
    pub transactions: Vec<TransactionRecord>,
}

impl ChainData {
    fn empty() -> Self {
        Self {
            balance: "0".to_string(),
            transactions: Vec::new(),
        }
    }

    /// 接受谓词：零余额且零交易视为不可用，继续降级
    fn has_data(&self) -> bool {
        self.balance != "0" || !self.transactions.is_empty()
    }
}

/// 聚合后的单链余额
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChainBalance {
    pub chain: Chain,
    pub symbol: String,
    pub balance: String,
    pub transactions: Vec<TransactionRecord>,
}

pub struct BalanceService {
    http: Arc<HttpClient>,
    fallback: FallbackClient,
    config: Arc<EngineConfig>,
    registry: ChainRegistry,
}

impl BalanceService {
    pub fn new(http: Arc<HttpClient>, config: Arc<EngineConfig>) -> Self {
        let fallback = FallbackClient::new(config.provider_timeout());
        Self {
            http,
            fallback,
            config,
            registry: ChainRegistry::new(),
        }
    }

    /// 并发抓取一组链地址的余额与历史
    pub async fn get_multi_chain_balances(&self, addresses: &[ChainAddress]) -> Vec<ChainBalance> {
        let futures = addresses.iter().map(|entry| async {
            let data = self.fetch_chain_data(entry.chain, &entry.address).await;
            ChainBalance {
                chain: entry.chain,
                symbol: entry.symbol.clone(),
                balance: data.balance,
                transactions: data.transactions,
            }
        });
        futures::future::join_all(futures).await
    }

    /// 单链查询：按该链的 provider 优先级列表降级
    pub async fn fetch_chain_data(&self, chain: Chain, address: &str) -> ChainData {
        let providers = self.providers_for(chain, address);
        let result = self
            .fallback
            .first_acceptable(chain.as_str(), providers, ChainData::has_data, ChainData::empty())
            .await;
        result.value
    }

    fn providers_for(&self, chain: Chain, address: &str) -> Vec<ProviderCall<ChainData>> {
        let http = self.http.clone();
        let config = self.config.clone();
        let decimals = self.registry.get(chain).decimals;
        let symbol = self.registry.get(chain).symbol;
        let address = address.to_string();

        match chain {
            Chain::Ethereum => vec![
                ProviderCall::new("rpc+etherscan", {
                    let (http, config, address) = (http.clone(), config.clone(), address.clone());
                    async move { fetch_eth_rpc_data(http, config, address).await }
                }),
                ProviderCall::new("ethplorer", {
                    let (http, config, address) = (http.clone(), config.clone(), address.clone());
                    async move { fetch_ethplorer_data(http, config, address).await }
                }),
                ProviderCall::new("blockchair", {
                    let (http, config, address) = (http, config, address);
                    async move {
                        fetch_blockchair_data(http, config, "ethereum", address, 18, "ETH").await
                    }
                }),
            ],
            Chain::Bitcoin => vec![
                ProviderCall::new("blockcypher", {
                    let (http, config, address) = (http.clone(), config.clone(), address.clone());
                    async move {
                        fetch_blockcypher_data(http, config, "btc", address, decimals, symbol).await
                    }
                }),
                ProviderCall::new("mempool.space", {
                    let http = http.clone();
                    let base = config.mempool_space_url.clone();
                    let address = address.clone();
                    async move { fetch_esplora_data(http, base, address, decimals, symbol).await }
                }),
                ProviderCall::new("btcscan", {
                    let http = http.clone();
                    let base = config.btcscan_url.clone();
                    let address = address.clone();
                    async move { fetch_esplora_data(http, base, address, decimals, symbol).await }
                }),
                ProviderCall::new("blockchair", {
                    async move {
                        fetch_blockchair_data(http, config, "bitcoin", address, decimals, symbol)
                            .await
                    }
                }),
            ],
            Chain::Litecoin => vec![
                ProviderCall::new("blockcypher", {
                    let (http, config, address) = (http.clone(), config.clone(), address.clone());
                    async move {
                        fetch_blockcypher_data(http, config, "ltc", address, decimals, symbol).await
                    }
                }),
                ProviderCall::new("litecoinspace", {
                    let http = http.clone();
                    let base = config.litecoinspace_url.clone();
                    let address = address.clone();
                    async move { fetch_esplora_data(http, base, address, decimals, symbol).await }
                }),
                ProviderCall::new("blockchair", {
                    async move {
                        fetch_blockchair_data(http, config, "litecoin", address, decimals, symbol)
                            .await
                    }
                }),
            ],
            Chain::Dogecoin => vec![
                ProviderCall::new("blockcypher", {
                    let (http, config, address) = (http.clone(), config.clone(), address.clone());
                    async move {
                        fetch_blockcypher_data(http, config, "doge", address, decimals, symbol)
                            .await
                    }
                }),
                ProviderCall::new("blockchair", {
                    async move {
                        fetch_blockchair_data(http, config, "dogecoin", address, decimals, symbol)
                            .await
                    }
                }),
            ],
            Chain::Solana => vec![
                ProviderCall::new("solana-rpc", {
                    let (http, config, address) = (http.clone(), config.clone(), address.clone());
                    async move { fetch_sol_rpc_data(http, config, address).await }
                }),
                ProviderCall::new("solscan", {
                    async move { fetch_solscan_data(http, config, address).await }
                }),
            ],
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 数值解析辅助
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// JSON 数值 / 十进制字符串 / 0x-hex 字符串 → u128
fn value_to_u128(value: &Value) -> u128 {
    match value {
        Value::Number(n) => n.as_u64().map(u128::from).unwrap_or(0),
        Value::String(s) => {
            if let Some(hexpart) = s.strip_prefix("0x") {
                u128::from_str_radix(hexpart, 16).unwrap_or(0)
            } else {
                s.parse().unwrap_or(0)
            }
        }
        _ => 0,
    }
}

fn value_to_i128(value: &Value) -> i128 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .unwrap_or(0),
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ethereum providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// 公共 RPC 查余额（首个可用端点）+ Etherscan 查历史
async fn fetch_eth_rpc_data(
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    address: String,
) -> anyhow::Result<ChainData> {
    let mut balance = "0".to_string();
    for rpc in &config.eth_rpc_endpoints {
        match http
            .rpc_call(rpc, "eth_getBalance", json!([address, "latest"]))
            .await
        {
            Ok(result) => {
                let wei = value_to_u128(&result);
                balance = format_units(wei, 18);
                break;
            }
            Err(e) => {
                tracing::debug!(rpc = %rpc, error = %e, "eth balance rpc failed");
            }
        }
    }

    let url = format!(
        "{}?module=account&action=txlist&address={}&startblock=0&endblock=99999999&page=1&offset=10&sort=desc",
        config.etherscan_url, address
    );
    let mut transactions = Vec::new();
    if let Ok(data) = http.get_json(&url).await {
        if data.get("status").and_then(Value::as_str) == Some("1") {
            if let Some(result) = data.get("result").and_then(Value::as_array) {
                let addr_lower = address.to_lowercase();
                for tx in result.iter().take(10) {
                    let from = str_field(tx, "from").to_lowercase();
                    let confirmations: u64 = str_field(tx, "confirmations").parse().unwrap_or(0);
                    transactions.push(TransactionRecord {
                        hash: str_field(tx, "hash"),
                        direction: if from == addr_lower { "send" } else { "receive" }.to_string(),
                        amount: format_units(value_to_u128(&tx["value"]), 18),
                        symbol: "ETH".to_string(),
                        confirmed: str_field(tx, "txreceipt_status") == "1" && confirmations > 0,
                        confirmations,
                        timestamp: str_field(tx, "timeStamp").parse().unwrap_or_else(|_| now_ts()),
                        from: str_field(tx, "from"),
                        to: str_field(tx, "to"),
                    });
                }
            }
        }
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

/// Ethplorer：余额 + 含代币转账的历史
async fn fetch_ethplorer_data(
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    address: String,
) -> anyhow::Result<ChainData> {
    let addr_lower = address.to_lowercase();

    let info = http
        .get_json(&format!(
            "{}/getAddressInfo/{}?apiKey=freekey",
            config.ethplorer_url, address
        ))
        .await?;
    let balance = info
        .pointer("/ETH/rawBalance")
        .map(|v| format_units(value_to_u128(v), 18))
        .unwrap_or_else(|| "0".to_string());

    let mut transactions = Vec::new();
    if let Ok(history) = http
        .get_json(&format!(
            "{}/getAddressHistory/{}?apiKey=freekey&limit=20&type=transfer",
            config.ethplorer_url, address
        ))
        .await
    {
        for op in history
            .get("operations")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let hash = str_field(op, "transactionHash");
            if hash.is_empty() {
                continue;
            }
            let from = str_field(op, "from").to_lowercase();
            let to = str_field(op, "to").to_lowercase();
            if from != addr_lower && to != addr_lower {
                continue;
            }
            let decimals: u32 = op
                .pointer("/tokenInfo/decimals")
                .map(|v| value_to_u128(v) as u32)
                .filter(|d| *d > 0 && *d <= 36)
                .unwrap_or(18);
            transactions.push(TransactionRecord {
                hash,
                direction: if from == addr_lower { "send" } else { "receive" }.to_string(),
                amount: format_units(value_to_u128(&op["value"]), decimals),
                symbol: op
                    .pointer("/tokenInfo/symbol")
                    .and_then(Value::as_str)
                    .unwrap_or("ETH")
                    .to_string(),
                confirmed: true,
                confirmations: 1,
                timestamp: op
                    .get("timestamp")
                    .and_then(Value::as_i64)
                    .unwrap_or_else(now_ts),
                from: str_field(op, "from"),
                to: str_field(op, "to"),
            });
        }
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UTXO providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// BlockCypher 地址全量接口
async fn fetch_blockcypher_data(
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    coin: &'static str,
    address: String,
    decimals: u32,
    symbol: &'static str,
) -> anyhow::Result<ChainData> {
    let url = format!(
        "{}/{}/main/addrs/{}/full?limit=10",
        config.blockcypher_url, coin, address
    );
    let data = http.get_json(&url).await?;

    let balance = data
        .get("final_balance")
        .map(|v| format_units(value_to_u128(v), decimals))
        .unwrap_or_else(|| "0".to_string());

    let mut transactions = Vec::new();
    for tx in data
        .get("txs")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .take(10)
    {
        let in_addrs = |io: &Value| -> bool {
            io.get("addresses")
                .and_then(Value::as_array)
                .map(|a| a.iter().any(|x| x.as_str() == Some(address.as_str())))
                .unwrap_or(false)
        };
        let inputs = tx.get("inputs").and_then(Value::as_array);
        let outputs = tx.get("outputs").and_then(Value::as_array);
        let is_sent = inputs.map(|a| a.iter().any(&in_addrs)).unwrap_or(false);

        let sum_for = |items: Option<&Vec<Value>>, key: &str, ours: bool| -> u128 {
            items
                .into_iter()
                .flatten()
                .filter(|&io| in_addrs(io) == ours)
                .map(|io| value_to_u128(&io[key]))
                .sum()
        };

        let amount_sats = if is_sent {
            let spent = sum_for(inputs, "output_value", true);
            let change = sum_for(outputs, "value", true);
            spent.saturating_sub(change)
        } else {
            sum_for(outputs, "value", true)
        };

        let confirmations = tx
            .get("confirmations")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let timestamp = tx
            .get("confirmed")
            .or_else(|| tx.get("received"))
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.timestamp())
            .unwrap_or_else(now_ts);

        let first_addr = |items: Option<&Vec<Value>>| -> String {
            items
                .into_iter()
                .flatten()
                .next()
                .and_then(|io| io.pointer("/addresses/0"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        transactions.push(TransactionRecord {
            hash: str_field(tx, "hash"),
            direction: if is_sent { "send" } else { "receive" }.to_string(),
            amount: format_units(amount_sats, decimals),
            symbol: symbol.to_string(),
            confirmed: confirmations > 0,
            confirmations,
            timestamp,
            from: first_addr(inputs),
            to: first_addr(outputs),
        });
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

/// Esplora 兼容接口 (mempool.space / btcscan / litecoinspace)
async fn fetch_esplora_data(
    http: Arc<HttpClient>,
    base_url: String,
    address: String,
    decimals: u32,
    symbol: &'static str,
) -> anyhow::Result<ChainData> {
    let info = http
        .get_json(&format!("{}/address/{}", base_url, address))
        .await?;
    let stat = |path: &str| -> u128 { info.pointer(path).map(value_to_u128).unwrap_or(0) };
    let funded = stat("/chain_stats/funded_txo_sum") + stat("/mempool_stats/funded_txo_sum");
    let spent = stat("/chain_stats/spent_txo_sum") + stat("/mempool_stats/spent_txo_sum");
    let balance = format_units(funded.saturating_sub(spent), decimals);

    let txs = http
        .get_json(&format!("{}/address/{}/txs", base_url, address))
        .await?;
    let mut transactions = Vec::new();
    for tx in txs.as_array().into_iter().flatten().take(10) {
        let vin = tx.get("vin").and_then(Value::as_array);
        let vout = tx.get("vout").and_then(Value::as_array);

        let is_sent = vin
            .into_iter()
            .flatten()
            .any(|v| v.pointer("/prevout/scriptpubkey_address").and_then(Value::as_str) == Some(address.as_str()));

        let amount_sats = if is_sent {
            let spent: u128 = vin
                .into_iter()
                .flatten()
                .filter(|v| {
                    v.pointer("/prevout/scriptpubkey_address").and_then(Value::as_str)
                        == Some(address.as_str())
                })
                .map(|v| v.pointer("/prevout/value").map(value_to_u128).unwrap_or(0))
                .sum();
            let change: u128 = vout
                .into_iter()
                .flatten()
                .filter(|v| {
                    v.get("scriptpubkey_address").and_then(Value::as_str)
                        == Some(address.as_str())
                })
                .map(|v| value_to_u128(&v["value"]))
                .sum();
            spent.saturating_sub(change)
        } else {
            vout.into_iter()
                .flatten()
                .filter(|v| {
                    v.get("scriptpubkey_address").and_then(Value::as_str)
                        == Some(address.as_str())
                })
                .map(|v| value_to_u128(&v["value"]))
                .sum()
        };

        let confirmed = tx
            .pointer("/status/confirmed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        transactions.push(TransactionRecord {
            hash: str_field(tx, "txid"),
            direction: if is_sent { "send" } else { "receive" }.to_string(),
            amount: format_units(amount_sats, decimals),
            symbol: symbol.to_string(),
            confirmed,
            confirmations: u64::from(confirmed),
            timestamp: tx
                .pointer("/status/block_time")
                .and_then(Value::as_i64)
                .unwrap_or_else(now_ts),
            from: tx
                .pointer("/vin/0/prevout/scriptpubkey_address")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            to: tx
                .pointer("/vout/0/scriptpubkey_address")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

/// Blockchair dashboards（UTXO 与 ETH 通用兜底）
async fn fetch_blockchair_data(
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    chain_name: &'static str,
    address: String,
    decimals: u32,
    symbol: &'static str,
) -> anyhow::Result<ChainData> {
    let url = format!(
        "{}/{}/dashboards/address/{}?transaction_details=true&limit=10",
        config.blockchair_url, chain_name, address
    );
    let json = http.get_json(&url).await?;

    let data = json
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow::anyhow!("blockchair: no data"))?;
    let addr_data = data
        .get(&address)
        .or_else(|| data.get(&address.to_lowercase()))
        .or_else(|| data.values().next())
        .ok_or_else(|| anyhow::anyhow!("blockchair: address missing"))?;

    let balance = addr_data
        .pointer("/address/balance")
        .map(|v| format_units(value_to_u128(v), decimals))
        .unwrap_or_else(|| "0".to_string());

    let mut transactions = Vec::new();
    // UTXO dashboards 返回 transactions；ETH dashboards 返回 calls
    for tx in addr_data
        .get("transactions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .take(10)
    {
        let change = tx.get("balance_change").map(value_to_i128).unwrap_or(0);
        let confirmed = tx.get("block_id").and_then(Value::as_i64).unwrap_or(0) > 0;
        transactions.push(TransactionRecord {
            hash: str_field(tx, "hash"),
            direction: if change < 0 { "send" } else { "receive" }.to_string(),
            amount: format_units(change.unsigned_abs(), decimals),
            symbol: symbol.to_string(),
            confirmed,
            confirmations: u64::from(confirmed),
            timestamp: parse_blockchair_time(tx.get("time")),
            from: String::new(),
            to: String::new(),
        });
    }
    let addr_lower = address.to_lowercase();
    for call in addr_data
        .get("calls")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .take(10)
    {
        if !call
            .get("transferred")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            continue;
        }
        let sender = str_field(call, "sender").to_lowercase();
        let confirmed = call.get("block_id").and_then(Value::as_i64).unwrap_or(0) > 0;
        transactions.push(TransactionRecord {
            hash: str_field(call, "transaction_hash"),
            direction: if sender == addr_lower { "send" } else { "receive" }.to_string(),
            amount: format_units(value_to_u128(&call["value"]), decimals),
            symbol: symbol.to_string(),
            confirmed,
            confirmations: u64::from(confirmed),
            timestamp: parse_blockchair_time(call.get("time")),
            from: str_field(call, "sender"),
            to: str_field(call, "recipient"),
        });
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

/// Blockchair 的 "YYYY-MM-DD HH:MM:SS" 时间戳
fn parse_blockchair_time(value: Option<&Value>) -> i64 {
    value
        .and_then(Value::as_str)
        .and_then(|s| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc().timestamp())
        })
        .unwrap_or_else(now_ts)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Solana providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Solana RPC：getBalance + 签名列表 + 逐笔余额差
async fn fetch_sol_rpc_data(
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    address: String,
) -> anyhow::Result<ChainData> {
    let rpc = config
        .sol_rpc_endpoints
        .first()
        .ok_or_else(|| anyhow::anyhow!("no solana rpc configured"))?;

    let mut balance = "0".to_string();
    if let Ok(result) = http.rpc_call(rpc, "getBalance", json!([address])).await {
        if let Some(lamports) = result.get("value") {
            balance = format_units(value_to_u128(lamports), 9);
        }
    }

    let mut transactions = Vec::new();
    let signatures = http
        .rpc_call(
            rpc,
            "getSignaturesForAddress",
            json!([address, { "limit": 10 }]),
        )
        .await
        .unwrap_or(Value::Null);

    for sig in signatures.as_array().into_iter().flatten().take(10) {
        let signature = str_field(sig, "signature");
        let Ok(tx) = http
            .rpc_call(
                rpc,
                "getTransaction",
                json!([signature, { "encoding": "jsonParsed", "maxSupportedTransactionVersion": 0 }]),
            )
            .await
        else {
            continue;
        };

        let keys: Vec<String> = tx
            .pointer("/transaction/message/accountKeys")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|k| {
                k.as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| str_field(k, "pubkey"))
            })
            .collect();
        let Some(addr_index) = keys.iter().position(|k| k == &address) else {
            continue;
        };

        let pre = tx
            .pointer(&format!("/meta/preBalances/{}", addr_index))
            .map(value_to_i128)
            .unwrap_or(0);
        let post = tx
            .pointer(&format!("/meta/postBalances/{}", addr_index))
            .map(value_to_i128)
            .unwrap_or(0);
        let diff = post - pre;

        let status = sig
            .get("confirmationStatus")
            .and_then(Value::as_str)
            .unwrap_or("");
        transactions.push(TransactionRecord {
            hash: signature,
            direction: if diff < 0 { "send" } else { "receive" }.to_string(),
            amount: format_units(diff.unsigned_abs(), 9),
            symbol: "SOL".to_string(),
            confirmed: status == "finalized" || status == "confirmed",
            confirmations: match status {
                "finalized" => 32,
                "confirmed" => 1,
                _ => 0,
            },
            timestamp: sig
                .get("blockTime")
                .and_then(Value::as_i64)
                .unwrap_or_else(now_ts),
            from: keys.first().cloned().unwrap_or_default(),
            to: keys.get(1).cloned().unwrap_or_default(),
        });
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

fn solscan_headers() -> [(&'static str, &'static str); 4] {
    [
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/145.0.0.0 Safari/537.36",
        ),
        ("Referer", "https://solscan.io/"),
        ("Origin", "https://solscan.io/"),
        ("Accept", "application/json"),
    ]
}

/// Solscan 兜底（余额 + 历史）
async fn fetch_solscan_data(
    http: Arc<HttpClient>,
    config: Arc<EngineConfig>,
    address: String,
) -> anyhow::Result<ChainData> {
    let headers = solscan_headers();

    let account = http
        .get_json_with_headers(
            &format!(
                "{}/account?address={}&view_as=account",
                config.solscan_url, address
            ),
            &headers,
        )
        .await?;
    let mut balance = "0".to_string();
    if account.get("success").and_then(Value::as_bool) == Some(true) {
        if let Some(lamports) = account.pointer("/data/lamports") {
            balance = format_units(value_to_u128(lamports), 9);
        }
    }

    let txs = http
        .get_json_with_headers(
            &format!(
                "{}/account/transaction?address={}&page_size=10&sort=desc",
                config.solscan_url, address
            ),
            &headers,
        )
        .await?;

    let mut transactions = Vec::new();
    for tx in txs
        .pointer("/data/transactions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .take(10)
    {
        let signers: Vec<&str> = tx
            .get("signer")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        let is_send = signers.contains(&address.as_str());
        let success = tx.get("status").and_then(Value::as_str) == Some("Success");
        transactions.push(TransactionRecord {
            hash: str_field(tx, "txHash"),
            direction: if is_send { "send" } else { "receive" }.to_string(),
            amount: format_units(value_to_u128(&tx["sol_value"]), 9),
            symbol: "SOL".to_string(),
            confirmed: success,
            confirmations: u64::from(success),
            timestamp: tx
                .get("blockTime")
                .and_then(Value::as_i64)
                .unwrap_or_else(now_ts),
            from: signers.first().map(|s| s.to_string()).unwrap_or_default(),
            to: address.clone(),
        });
    }

    Ok(ChainData {
        balance,
        transactions,
    })
}

// 允许服务层单独复用链数据抓取
impl BalanceService {
    /// 仅查余额（发送前的余额校验等场景）
    pub async fn get_balance(&self, chain: Chain, address: &str) -> WalletResult<String> {
        Ok(self.fetch_chain_data(chain, address).await.balance)
    }
}
