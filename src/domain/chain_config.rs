//! 多链配置模块
//!
//! 定义支持的五条链及其曲线、派生路径模板与地址编码参数。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 支持的链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Bitcoin,
    Litecoin,
    Dogecoin,
    Solana,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Bitcoin => "bitcoin",
            Chain::Litecoin => "litecoin",
            Chain::Dogecoin => "dogecoin",
            Chain::Solana => "solana",
        }
    }

    /// 全部链（派生多链账户时的固定顺序）
    pub fn all() -> [Chain; 5] {
        [
            Chain::Ethereum,
            Chain::Bitcoin,
            Chain::Solana,
            Chain::Litecoin,
            Chain::Dogecoin,
        ]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Chain {
    type Err = crate::error::WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            "bitcoin" | "btc" => Ok(Chain::Bitcoin),
            "litecoin" | "ltc" => Ok(Chain::Litecoin),
            "dogecoin" | "doge" => Ok(Chain::Dogecoin),
            "solana" | "sol" => Ok(Chain::Solana),
            other => Err(crate::error::WalletError::ChainNotSupported(
                other.to_string(),
            )),
        }
    }
}

/// 加密曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// secp256k1 曲线 (Ethereum, Bitcoin, Litecoin, Dogecoin)
    Secp256k1,
    /// ed25519 曲线 (Solana)
    Ed25519,
}

/// 链配置
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub chain: Chain,
    pub name: &'static str,
    pub symbol: &'static str,
    pub curve_type: CurveType,
    /// BIP44 coin type
    pub coin_type: u32,
    /// 最小单位精度
    pub decimals: u32,
    /// UTXO 链 P2PKH 地址版本字节
    pub address_version: Option<u8>,
    /// UTXO 链 WIF 版本字节
    pub wif_version: Option<u8>,
    /// BlockCypher 链路径（UTXO 交易骨架/广播）
    pub blockcypher_path: Option<&'static str>,
    /// CoinGecko 币种 ID
    pub coingecko_id: &'static str,
}

impl ChainConfig {
    /// 生成该链 index 对应的派生路径
    ///
    /// EVM/UTXO 链使用 BIP44 `m/44'/coin'/0'/0/{index}`；
    /// Solana 使用 SLIP-0010 全硬化路径 `m/44'/501'/{index}'/0'`。
    pub fn derivation_path(&self, index: u32) -> String {
        match self.curve_type {
            CurveType::Secp256k1 => format!("m/44'/{}'/0'/0/{}", self.coin_type, index),
            CurveType::Ed25519 => format!("m/44'/{}'/{}'/0'", self.coin_type, index),
        }
    }
}

/// 链配置注册表
pub struct ChainRegistry {
    configs: Vec<ChainConfig>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self {
            configs: vec![
                ChainConfig {
                    chain: Chain::Ethereum,
                    name: "Ethereum",
                    symbol: "ETH",
                    curve_type: CurveType::Secp256k1,
                    coin_type: 60,
                    decimals: 18,
                    address_version: None,
                    wif_version: None,
                    blockcypher_path: None,
                    coingecko_id: "ethereum",
                },
                ChainConfig {
                    chain: Chain::Bitcoin,
                    name: "Bitcoin",
                    symbol: "BTC",
                    curve_type: CurveType::Secp256k1,
                    coin_type: 0,
                    decimals: 8,
                    address_version: Some(0x00),
                    wif_version: Some(0x80),
                    blockcypher_path: Some("btc/main"),
                    coingecko_id: "bitcoin",
                },
                ChainConfig {
                    chain: Chain::Litecoin,
                    name: "Litecoin",
                    symbol: "LTC",
                    curve_type: CurveType::Secp256k1,
                    coin_type: 2,
                    decimals: 8,
                    address_version: Some(0x30),
                    wif_version: Some(0xB0),
                    blockcypher_path: Some("ltc/main"),
                    coingecko_id: "litecoin",
                },
                ChainConfig {
                    chain: Chain::Dogecoin,
                    name: "Dogecoin",
                    symbol: "DOGE",
                    curve_type: CurveType::Secp256k1,
                    coin_type: 3,
                    decimals: 8,
                    address_version: Some(0x1e),
                    wif_version: Some(0x9E),
                    blockcypher_path: Some("doge/main"),
                    coingecko_id: "dogecoin",
                },
                ChainConfig {
                    chain: Chain::Solana,
                    name: "Solana",
                    symbol: "SOL",
                    curve_type: CurveType::Ed25519,
                    coin_type: 501,
                    decimals: 9,
                    address_version: None,
                    wif_version: None,
                    blockcypher_path: None,
                    coingecko_id: "solana",
                },
            ],
        }
    }

    pub fn get(&self, chain: Chain) -> &ChainConfig {
        // 注册表覆盖全部 Chain 变体
        self.configs
            .iter()
            .find(|c| c.chain == chain)
            .expect("all chains registered")
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<&ChainConfig> {
        self.configs
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn list_all(&self) -> &[ChainConfig] {
        &self.configs
    }

    pub fn list_by_curve(&self, curve: CurveType) -> Vec<&ChainConfig> {
        self.configs
            .iter()
            .filter(|c| c.curve_type == curve)
            .collect()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_registry() {
        let registry = ChainRegistry::new();

        let eth = registry.get(Chain::Ethereum);
        assert_eq!(eth.coin_type, 60);
        assert_eq!(eth.curve_type, CurveType::Secp256k1);

        let sol = registry.get_by_symbol("SOL").unwrap();
        assert_eq!(sol.chain, Chain::Solana);
        assert_eq!(sol.curve_type, CurveType::Ed25519);

        assert_eq!(registry.list_by_curve(CurveType::Secp256k1).len(), 4);
        assert_eq!(registry.list_by_curve(CurveType::Ed25519).len(), 1);
    }

    #[test]
    fn test_derivation_paths() {
        let registry = ChainRegistry::new();
        assert_eq!(
            registry.get(Chain::Ethereum).derivation_path(0),
            "m/44'/60'/0'/0/0"
        );
        assert_eq!(
            registry.get(Chain::Litecoin).derivation_path(7),
            "m/44'/2'/0'/0/7"
        );
        // Solana 全硬化，index 在第三段
        assert_eq!(
            registry.get(Chain::Solana).derivation_path(3),
            "m/44'/501'/3'/0'"
        );
    }

    #[test]
    fn test_chain_parsing() {
        assert_eq!("ETH".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert_eq!("dogecoin".parse::<Chain>().unwrap(), Chain::Dogecoin);
        assert!("cardano".parse::<Chain>().is_err());
    }
}
