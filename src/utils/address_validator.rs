//! 地址格式校验模块
//!
//! 统一的按链地址校验。校验是语法级的（正则 + EVM 的 EIP-55 大小写），
//! 不保证地址在链上可达。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::chain_config::Chain;
use crate::error::WalletResult;

static BTC_LEGACY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[13][a-km-zA-HJ-NP-Z1-9]{25,34}$").unwrap());
static BTC_BECH32_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)bc1[a-z0-9]{39,59}$").unwrap());
static LTC_LEGACY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[LM3][a-km-zA-HJ-NP-Z1-9]{26,33}$").unwrap());
static LTC_BECH32_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?i)ltc1[a-z0-9]{39,59}$").unwrap());
static DOGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^D[5-9A-HJ-NP-U][a-km-zA-HJ-NP-Z1-9]{31,33}$").unwrap());
static SOL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap());

/// 地址校验器
pub struct AddressValidator;

impl AddressValidator {
    /// 校验地址格式是否符合该链的语法
    pub fn validate(chain: Chain, address: &str) -> bool {
        match chain {
            Chain::Ethereum => Self::validate_evm_address(address),
            Chain::Bitcoin => {
                BTC_LEGACY_RE.is_match(address) || BTC_BECH32_RE.is_match(address)
            }
            Chain::Litecoin => {
                LTC_LEGACY_RE.is_match(address) || LTC_BECH32_RE.is_match(address)
            }
            Chain::Dogecoin => DOGE_RE.is_match(address),
            Chain::Solana => SOL_RE.is_match(address),
        }
    }

    /// 校验通过返回 Ok(())，否则返回 `InvalidAddress`
    pub fn require_valid(chain: Chain, address: &str) -> WalletResult<()> {
        if Self::validate(chain, address) {
            Ok(())
        } else {
            Err(crate::error::WalletError::invalid_address(
                chain.as_str(),
                address,
            ))
        }
    }

    /// EVM 地址：0x + 40 hex，含大写字母时额外做 EIP-55 校验
    fn validate_evm_address(address: &str) -> bool {
        if !address.starts_with("0x") || address.len() != 42 {
            return false;
        }
        let hex_part = &address[2..];
        if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
        if hex_part.chars().any(|c| c.is_uppercase()) {
            return Self::verify_eip55_checksum(address);
        }
        true
    }

    /// EIP-55 Checksum 校验
    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(address: &str) -> bool {
        use sha3::{Digest, Keccak256};

        let addr_lower = address[2..].to_lowercase();
        let hash = Keccak256::digest(addr_lower.as_bytes());

        for (i, ch) in address[2..].chars().enumerate() {
            if ch.is_alphabetic() {
                let hash_byte = hash[i / 2];
                let nibble = if i % 2 == 0 {
                    hash_byte >> 4
                } else {
                    hash_byte & 0x0f
                };
                if ch.is_uppercase() != (nibble >= 8) {
                    return false;
                }
            }
        }
        true
    }
}
