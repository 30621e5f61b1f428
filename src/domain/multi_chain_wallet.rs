//! 多链钱包服务
//!
//! 一个助记词 + 一个账户索引 → 五条链各一个地址与可导出私钥。
//! 派生是纯计算：同样输入在任何进程、任何时刻产生字节一致的结果。

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::domain::chain_config::{Chain, ChainRegistry, CurveType};
use crate::domain::derivation::{
    self, DerivationStrategy, DerivationStrategyFactory, Secp256k1Strategy,
};
use crate::error::{WalletError, WalletResult};
use crate::utils::base58;

/// 某条链上的账户地址
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChainAddress {
    pub chain: Chain,
    pub symbol: String,
    pub name: String,
    pub address: String,
}

/// 多链账户：同一 index 在各链的地址
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct MultiChainAccount {
    pub index: u32,
    pub name: String,
    /// 主地址（EVM 链）
    pub address: String,
    /// 主链私钥（hex），仅在显式导出流程中返回给调用方
    pub private_key: String,
    pub addresses: Vec<ChainAddress>,
}

/// 单链可导出私钥（链原生外部格式）
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChainPrivateKey {
    pub chain: Chain,
    pub symbol: String,
    pub private_key: String,
}

/// 多链钱包服务
pub struct MultiChainWalletService {
    registry: ChainRegistry,
}

impl MultiChainWalletService {
    pub fn new() -> Self {
        Self {
            registry: ChainRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// 生成 12 词助记词（128 位熵）
    pub fn generate_mnemonic(&self) -> WalletResult<String> {
        let mut entropy = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(mnemonic.to_string())
    }

    /// BIP39 校验（导入入口）
    pub fn validate_mnemonic(&self, mnemonic: &str) -> WalletResult<()> {
        Mnemonic::parse_in(Language::English, mnemonic)
            .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
        Ok(())
    }

    /// 派生一个多链账户
    ///
    /// 种子只在本次调用内存在。每条链使用自己的路径模板，
    /// 根种子相同。
    pub fn derive_multi_chain_account(
        &self,
        mnemonic: &str,
        index: u32,
    ) -> WalletResult<MultiChainAccount> {
        let seed = derivation::seed_from_mnemonic(mnemonic)?;

        let mut addresses = Vec::with_capacity(Chain::all().len());
        let mut primary_address = String::new();
        let mut primary_key = String::new();

        for chain in Chain::all() {
            let config = self.registry.get(chain);
            let strategy = DerivationStrategyFactory::create_strategy(config.curve_type);
            let keypair = strategy.derive_keypair(&*seed, &config.derivation_path(index))?;
            let address = strategy.format_address(&keypair, config)?;

            if chain == Chain::Ethereum {
                primary_address = address.clone();
                primary_key = format!("0x{}", hex::encode(keypair.private_key.as_slice()));
            }

            addresses.push(ChainAddress {
                chain,
                symbol: config.symbol.to_string(),
                name: config.name.to_string(),
                address,
            });
        }

        Ok(MultiChainAccount {
            index,
            name: format!("Account {}", index + 1),
            address: primary_address,
            private_key: primary_key,
            addresses,
        })
    }

    /// 导出各链私钥（链原生外部格式）
    ///
    /// ETH：raw hex；UTXO 链：各自版本字节的 WIF；
    /// Solana：64 字节 keypair（种子 ‖ 公钥）的 Base58。
    pub fn derive_all_private_keys(
        &self,
        mnemonic: &str,
        index: u32,
    ) -> WalletResult<Vec<ChainPrivateKey>> {
        let seed = derivation::seed_from_mnemonic(mnemonic)?;
        let mut keys = Vec::with_capacity(Chain::all().len());

        for chain in Chain::all() {
            let config = self.registry.get(chain);
            let strategy = DerivationStrategyFactory::create_strategy(config.curve_type);
            let keypair = strategy.derive_keypair(&*seed, &config.derivation_path(index))?;

            let exported = match (config.curve_type, config.wif_version) {
                (CurveType::Secp256k1, Some(version)) => {
                    let mut raw = [0u8; 32];
                    raw.copy_from_slice(&keypair.private_key);
                    base58::encode_wif(&raw, version)
                }
                (CurveType::Secp256k1, None) => {
                    format!("0x{}", hex::encode(keypair.private_key.as_slice()))
                }
                (CurveType::Ed25519, _) => {
                    let mut pair = Zeroizing::new(Vec::with_capacity(64));
                    pair.extend_from_slice(&keypair.private_key);
                    pair.extend_from_slice(&keypair.public_key);
                    base58::encode(&pair)
                }
            };

            keys.push(ChainPrivateKey {
                chain,
                symbol: config.symbol.to_string(),
                private_key: exported,
            });
        }

        Ok(keys)
    }

    /// 从私钥反推地址
    ///
    /// 接受各链原生密钥格式，另支持 raw hex 兜底；
    /// 字节长度与链的密钥尺寸不符时拒绝。
    pub fn address_from_private_key(&self, chain: Chain, private_key: &str) -> WalletResult<String> {
        let config = self.registry.get(chain);

        match chain {
            Chain::Ethereum => {
                let raw = decode_hex_key32(private_key)?;
                let keypair = secp256k1_keypair_from_raw(&raw)?;
                Secp256k1Strategy.format_address(&keypair, config)
            }
            Chain::Bitcoin | Chain::Litecoin | Chain::Dogecoin => {
                let raw = if private_key.starts_with("0x") {
                    decode_hex_key32(private_key)?
                } else {
                    Zeroizing::new(base58::decode_wif(private_key)?)
                };
                let keypair = secp256k1_keypair_from_raw(&raw)?;
                Secp256k1Strategy.format_address(&keypair, config)
            }
            Chain::Solana => {
                let decoded = Zeroizing::new(base58::decode(private_key)?);
                match decoded.len() {
                    // keypair 格式：后 32 字节即公钥
                    64 => Ok(base58::encode(&decoded[32..])),
                    32 => {
                        let mut secret = [0u8; 32];
                        secret.copy_from_slice(&decoded);
                        let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
                        Ok(base58::encode(&signing_key.verifying_key().to_bytes()))
                    }
                    other => Err(WalletError::InvalidPrivateKey(format!(
                        "solana key decodes to {} bytes, expected 32 or 64",
                        other
                    ))),
                }
            }
        }
    }
}

impl Default for MultiChainWalletService {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_hex_key32(private_key: &str) -> WalletResult<Zeroizing<[u8; 32]>> {
    let stripped = private_key.strip_prefix("0x").unwrap_or(private_key);
    let bytes = hex::decode(stripped)
        .map_err(|e| WalletError::InvalidPrivateKey(format!("invalid hex: {}", e)))?;
    if bytes.len() != 32 {
        return Err(WalletError::InvalidPrivateKey(format!(
            "key is {} bytes, expected 32",
            bytes.len()
        )));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(Zeroizing::new(out))
}

fn secp256k1_keypair_from_raw(
    raw: &[u8; 32],
) -> WalletResult<crate::domain::derivation::KeyPair> {
    use k256::ecdsa::SigningKey;

    let signing_key = SigningKey::from_slice(raw)
        .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
    let verifying_key = signing_key.verifying_key();

    Ok(crate::domain::derivation::KeyPair {
        curve: CurveType::Secp256k1,
        private_key: Zeroizing::new(raw.to_vec()),
        public_key: verifying_key.to_encoded_point(true).as_bytes().to_vec(),
        public_key_uncompressed: Some(verifying_key.to_encoded_point(false).as_bytes().to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_derive_multi_chain_account() {
        let service = MultiChainWalletService::new();
        let account = service.derive_multi_chain_account(TEST_MNEMONIC, 0).unwrap();

        assert_eq!(account.index, 0);
        assert_eq!(account.name, "Account 1");
        assert_eq!(account.addresses.len(), 5);
        assert_eq!(
            account.address,
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );

        let btc = account
            .addresses
            .iter()
            .find(|a| a.chain == Chain::Bitcoin)
            .unwrap();
        assert_eq!(btc.address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let service = MultiChainWalletService::new();
        let a = service.derive_multi_chain_account(TEST_MNEMONIC, 0).unwrap();
        let b = service.derive_multi_chain_account(TEST_MNEMONIC, 0).unwrap();
        for (x, y) in a.addresses.iter().zip(b.addresses.iter()) {
            assert_eq!(x.address, y.address);
        }
        assert_eq!(a.private_key, b.private_key);
    }

    #[test]
    fn test_index_changes_every_address() {
        let service = MultiChainWalletService::new();
        let a0 = service.derive_multi_chain_account(TEST_MNEMONIC, 0).unwrap();
        let a1 = service.derive_multi_chain_account(TEST_MNEMONIC, 1).unwrap();
        for (x, y) in a0.addresses.iter().zip(a1.addresses.iter()) {
            assert_eq!(x.chain, y.chain);
            assert_ne!(x.address, y.address, "chain {} unchanged", x.chain);
        }
    }

    #[test]
    fn test_derive_all_private_keys_formats() {
        let service = MultiChainWalletService::new();
        let keys = service.derive_all_private_keys(TEST_MNEMONIC, 0).unwrap();
        assert_eq!(keys.len(), 5);

        let eth = keys.iter().find(|k| k.chain == Chain::Ethereum).unwrap();
        assert!(eth.private_key.starts_with("0x"));
        assert_eq!(eth.private_key.len(), 66);

        // 压缩 WIF 的主网前缀字符
        let btc = keys.iter().find(|k| k.chain == Chain::Bitcoin).unwrap();
        assert!(btc.private_key.starts_with('K') || btc.private_key.starts_with('L'));

        let sol = keys.iter().find(|k| k.chain == Chain::Solana).unwrap();
        assert_eq!(base58::decode(&sol.private_key).unwrap().len(), 64);
    }

    #[test]
    fn test_exported_keys_round_trip_to_addresses() {
        let service = MultiChainWalletService::new();
        let account = service.derive_multi_chain_account(TEST_MNEMONIC, 0).unwrap();
        let keys = service.derive_all_private_keys(TEST_MNEMONIC, 0).unwrap();

        for key in keys {
            let derived = service
                .address_from_private_key(key.chain, &key.private_key)
                .unwrap();
            let expected = account
                .addresses
                .iter()
                .find(|a| a.chain == key.chain)
                .unwrap();
            assert_eq!(derived, expected.address, "chain {}", key.chain);
        }
    }

    #[test]
    fn test_wrong_key_length_rejected() {
        let service = MultiChainWalletService::new();
        // 31 字节 hex
        let short = format!("0x{}", hex::encode([0x11u8; 31]));
        assert!(matches!(
            service.address_from_private_key(Chain::Bitcoin, &short),
            Err(WalletError::InvalidPrivateKey(_))
        ));
        // 33 字节 base58
        let long = base58::encode(&[0x22u8; 33]);
        assert!(matches!(
            service.address_from_private_key(Chain::Solana, &long),
            Err(WalletError::InvalidPrivateKey(_))
        ));
    }

    #[test]
    fn test_generated_mnemonic_validates() {
        let service = MultiChainWalletService::new();
        let mnemonic = service.generate_mnemonic().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 12);
        service.validate_mnemonic(&mnemonic).unwrap();
    }
}
