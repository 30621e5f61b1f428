//! 密钥派生策略
//!
//! 为两类曲线提供统一的派生 + 地址编码接口：
//! - secp256k1：标准 BIP32 子钥派生（本引擎只需要私钥派生）
//! - ed25519：SLIP-0010，全部路径段必须硬化
//!
//! 助记词与种子只在派生调用内部存在，用后即焚，不保留为进程状态。

use bip39::{Language, Mnemonic};
use coins_bip32::path::DerivationPath;
use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::domain::chain_config::{ChainConfig, CurveType};
use crate::error::{WalletError, WalletResult};
use crate::utils::base58;

type HmacSha512 = Hmac<Sha512>;

/// 派生结果：曲线标记的密钥对
///
/// 私钥缓冲区随 Drop 自动清零。调用方不应在签名操作之外保留它。
pub struct KeyPair {
    pub curve: CurveType,
    /// 32 字节原始私钥
    pub private_key: Zeroizing<Vec<u8>>,
    /// 压缩公钥（secp256k1: 33 字节；ed25519: 32 字节）
    pub public_key: Vec<u8>,
    /// 未压缩公钥（仅 secp256k1，EVM 地址计算用）
    pub public_key_uncompressed: Option<Vec<u8>>,
}

/// 助记词 → BIP39 种子（空口令）
///
/// 校验和不通过返回 `InvalidMnemonic`。
pub fn seed_from_mnemonic(mnemonic: &str) -> WalletResult<Zeroizing<[u8; 64]>> {
    let parsed = Mnemonic::parse_in(Language::English, mnemonic)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(parsed.to_seed("")))
}

/// 派生策略
pub trait DerivationStrategy: Send + Sync {
    /// 从种子与路径派生密钥对
    fn derive_keypair(&self, seed: &[u8], path: &str) -> WalletResult<KeyPair>;

    /// 将公钥编码为该链的地址字符串
    fn format_address(&self, keypair: &KeyPair, config: &ChainConfig) -> WalletResult<String>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Secp256k1 策略 (Ethereum, Bitcoin, Litecoin, Dogecoin)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Secp256k1Strategy;

impl DerivationStrategy for Secp256k1Strategy {
    fn derive_keypair(&self, seed: &[u8], path: &str) -> WalletResult<KeyPair> {
        use coins_bip32::prelude::*;
        use k256::ecdsa::SigningKey;

        let derivation_path = path
            .parse::<DerivationPath>()
            .map_err(|e| WalletError::InvalidDerivationPath(format!("{}: {}", path, e)))?;

        let master_key = XPriv::root_from_seed(seed, None)
            .map_err(|e| WalletError::Signing(format!("master key derivation failed: {}", e)))?;

        let derived_key = master_key
            .derive_path(&derivation_path)
            .map_err(|e| WalletError::Signing(format!("child key derivation failed: {}", e)))?;

        let signing_key: &SigningKey = derived_key.as_ref();
        let private_key = Zeroizing::new(signing_key.to_bytes().to_vec());

        let verifying_key = signing_key.verifying_key();
        let compressed = verifying_key.to_encoded_point(true).as_bytes().to_vec();
        let uncompressed = verifying_key.to_encoded_point(false).as_bytes().to_vec();

        Ok(KeyPair {
            curve: CurveType::Secp256k1,
            private_key,
            public_key: compressed,
            public_key_uncompressed: Some(uncompressed),
        })
    }

    fn format_address(&self, keypair: &KeyPair, config: &ChainConfig) -> WalletResult<String> {
        match config.address_version {
            // UTXO 链：Hash160(压缩公钥) + 版本字节 → Base58Check
            Some(version) => Ok(utxo_address(&keypair.public_key, version)),
            // EVM 链：Keccak(未压缩公钥) 后 20 字节，EIP-55 大小写
            None => {
                let uncompressed = keypair
                    .public_key_uncompressed
                    .as_ref()
                    .ok_or_else(|| WalletError::Signing("missing uncompressed key".into()))?;
                Ok(evm_address(uncompressed))
            }
        }
    }
}

/// Hash160: SHA-256 后接 RIPEMD-160
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    let ripe = Ripemd160::digest(sha);
    let mut out = [0u8; 20];
    out.copy_from_slice(&ripe);
    out
}

/// 压缩公钥 → UTXO P2PKH 地址
pub fn utxo_address(compressed_pubkey: &[u8], version: u8) -> String {
    let hash = hash160(compressed_pubkey);
    let mut payload = [0u8; 21];
    payload[0] = version;
    payload[1..].copy_from_slice(&hash);
    base58::encode_check(&payload)
}

/// 未压缩公钥 → EIP-55 校验和大小写的 EVM 地址
pub fn evm_address(uncompressed_pubkey: &[u8]) -> String {
    use sha3::{Digest as Sha3Digest, Keccak256};

    // 去掉 0x04 前缀后做 Keccak256，取后 20 字节
    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);
    let address = ethers::types::Address::from_slice(&hash[12..]);
    ethers::utils::to_checksum(&address, None)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Ed25519 策略 (Solana) — SLIP-0010
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct Ed25519Strategy;

impl Ed25519Strategy {
    const MASTER_SECRET: &'static [u8] = b"ed25519 seed";

    /// 解析全硬化路径，返回去掉硬化标记的索引序列
    ///
    /// SLIP-0010 的 ed25519 不存在非硬化子钥派生，
    /// 任何非硬化段都是 `InvalidDerivationPath`。
    fn parse_hardened_path(path: &str) -> WalletResult<Vec<u32>> {
        let rest = path
            .trim()
            .strip_prefix("m/")
            .ok_or_else(|| WalletError::InvalidDerivationPath(path.to_string()))?;

        let mut indices = Vec::new();
        for segment in rest.split('/') {
            if segment.is_empty() {
                continue;
            }
            let num = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(|| {
                    WalletError::InvalidDerivationPath(format!(
                        "ed25519 derivation requires hardened segments, got '{}'",
                        segment
                    ))
                })?;
            let index: u32 = num
                .parse()
                .map_err(|_| WalletError::InvalidDerivationPath(path.to_string()))?;
            indices.push(index);
        }
        if indices.is_empty() {
            return Err(WalletError::InvalidDerivationPath(path.to_string()));
        }
        Ok(indices)
    }

    /// SLIP-0010 派生出 32 字节 ed25519 种子
    fn derive_secret(seed: &[u8], path: &str) -> WalletResult<Zeroizing<[u8; 32]>> {
        let indices = Self::parse_hardened_path(path)?;

        // master: I = HMAC-SHA512(key="ed25519 seed", data=seed)
        let mut mac = HmacSha512::new_from_slice(Self::MASTER_SECRET)
            .map_err(|e| WalletError::Signing(format!("hmac init failed: {}", e)))?;
        mac.update(seed);
        let mut buf = [0u8; 64];
        buf.copy_from_slice(&mac.finalize().into_bytes());

        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&buf[..32]);
        chain_code.copy_from_slice(&buf[32..]);
        buf.zeroize();

        // child: I = HMAC-SHA512(key=chain, data=0x00 || key || be32(index | 0x80000000))
        for index in indices {
            let hardened = index | 0x8000_0000;
            let mut mac = HmacSha512::new_from_slice(&chain_code)
                .map_err(|e| WalletError::Signing(format!("hmac init failed: {}", e)))?;
            mac.update(&[0x00]);
            mac.update(&key);
            mac.update(&hardened.to_be_bytes());

            let mut buf = [0u8; 64];
            buf.copy_from_slice(&mac.finalize().into_bytes());
            key.zeroize();
            chain_code.zeroize();
            key.copy_from_slice(&buf[..32]);
            chain_code.copy_from_slice(&buf[32..]);
            buf.zeroize();
        }

        chain_code.zeroize();
        Ok(Zeroizing::new(key))
    }
}

impl DerivationStrategy for Ed25519Strategy {
    fn derive_keypair(&self, seed: &[u8], path: &str) -> WalletResult<KeyPair> {
        let secret = Self::derive_secret(seed, path)?;
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&secret);
        let public_key = signing_key.verifying_key().to_bytes().to_vec();

        Ok(KeyPair {
            curve: CurveType::Ed25519,
            private_key: Zeroizing::new(secret.to_vec()),
            public_key,
            public_key_uncompressed: None,
        })
    }

    fn format_address(&self, keypair: &KeyPair, _config: &ChainConfig) -> WalletResult<String> {
        // Solana 地址即公钥的 Base58 编码，无校验和无版本字节
        Ok(base58::encode(&keypair.public_key))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 策略工厂
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct DerivationStrategyFactory;

impl DerivationStrategyFactory {
    pub fn create_strategy(curve_type: CurveType) -> Box<dyn DerivationStrategy> {
        match curve_type {
            CurveType::Secp256k1 => Box::new(Secp256k1Strategy),
            CurveType::Ed25519 => Box::new(Ed25519Strategy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain_config::{Chain, ChainRegistry};

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_invalid_mnemonic_rejected() {
        assert!(matches!(
            seed_from_mnemonic("abandon abandon abandon"),
            Err(WalletError::InvalidMnemonic(_))
        ));
        // 最后一个词换掉会破坏校验和
        let bad = TEST_MNEMONIC.replace("about", "abandon");
        assert!(matches!(
            seed_from_mnemonic(&bad),
            Err(WalletError::InvalidMnemonic(_))
        ));
    }

    #[test]
    fn test_ethereum_derivation_known_vector() {
        let registry = ChainRegistry::new();
        let config = registry.get(Chain::Ethereum);
        let seed = seed_from_mnemonic(TEST_MNEMONIC).unwrap();

        let strategy = Secp256k1Strategy;
        let keypair = strategy
            .derive_keypair(&*seed, &config.derivation_path(0))
            .unwrap();
        let address = strategy.format_address(&keypair, config).unwrap();

        // BIP44 标准测试向量
        assert_eq!(address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn test_bitcoin_derivation_known_vector() {
        let registry = ChainRegistry::new();
        let config = registry.get(Chain::Bitcoin);
        let seed = seed_from_mnemonic(TEST_MNEMONIC).unwrap();

        let strategy = Secp256k1Strategy;
        let keypair = strategy
            .derive_keypair(&*seed, &config.derivation_path(0))
            .unwrap();
        let address = strategy.format_address(&keypair, config).unwrap();

        assert_eq!(address, "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA");
    }

    #[test]
    fn test_slip0010_master_key_vector() {
        // SLIP-0010 官方测试向量：seed 000102...0f
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let mut mac = HmacSha512::new_from_slice(b"ed25519 seed").unwrap();
        mac.update(&seed);
        let result = mac.finalize().into_bytes();
        assert_eq!(
            hex::encode(&result[..32]),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
    }

    #[test]
    fn test_solana_derivation_deterministic() {
        let registry = ChainRegistry::new();
        let config = registry.get(Chain::Solana);
        let seed = seed_from_mnemonic(TEST_MNEMONIC).unwrap();

        let strategy = Ed25519Strategy;
        let k1 = strategy
            .derive_keypair(&*seed, &config.derivation_path(0))
            .unwrap();
        let k2 = strategy
            .derive_keypair(&*seed, &config.derivation_path(0))
            .unwrap();
        assert_eq!(*k1.private_key, *k2.private_key);
        assert_eq!(k1.public_key, k2.public_key);

        let address = strategy.format_address(&k1, config).unwrap();
        assert!(address.len() >= 32 && address.len() <= 44);

        // 不同 index 派生不同密钥
        let k3 = strategy
            .derive_keypair(&*seed, &config.derivation_path(1))
            .unwrap();
        assert_ne!(k1.public_key, k3.public_key);
    }

    #[test]
    fn test_ed25519_rejects_non_hardened_path() {
        let seed = seed_from_mnemonic(TEST_MNEMONIC).unwrap();
        let strategy = Ed25519Strategy;
        let result = strategy.derive_keypair(&*seed, "m/44'/501'/0'/0");
        assert!(matches!(
            result,
            Err(WalletError::InvalidDerivationPath(_))
        ));
    }

    #[test]
    fn test_utxo_version_byte_prefixes() {
        let seed = seed_from_mnemonic(TEST_MNEMONIC).unwrap();
        let registry = ChainRegistry::new();
        let strategy = Secp256k1Strategy;

        let ltc_config = registry.get(Chain::Litecoin);
        let ltc = strategy
            .derive_keypair(&*seed, &ltc_config.derivation_path(0))
            .unwrap();
        let ltc_addr = strategy.format_address(&ltc, ltc_config).unwrap();
        assert!(ltc_addr.starts_with('L') || ltc_addr.starts_with('M'));

        let doge_config = registry.get(Chain::Dogecoin);
        let doge = strategy
            .derive_keypair(&*seed, &doge_config.derivation_path(0))
            .unwrap();
        let doge_addr = strategy.format_address(&doge, doge_config).unwrap();
        assert!(doge_addr.starts_with('D'));
    }

    #[test]
    fn test_version_byte_does_not_affect_other_chain() {
        // 同一公钥在不同版本字节下产生不同地址，互不影响
        let seed = seed_from_mnemonic(TEST_MNEMONIC).unwrap();
        let strategy = Secp256k1Strategy;
        let keypair = strategy.derive_keypair(&*seed, "m/44'/0'/0'/0/0").unwrap();

        let btc = utxo_address(&keypair.public_key, 0x00);
        let as_doge = utxo_address(&keypair.public_key, 0x1e);
        assert_ne!(btc, as_doge);
        assert_eq!(btc, utxo_address(&keypair.public_key, 0x00));
    }
}
