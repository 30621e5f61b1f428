//! 费率类型
//!
//! 各链费率单位不同（gwei / sat/vB / microlamports），用带单位的
//! 枚举承载，避免跨链单位混淆。

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// 带单位的费率
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "snake_case")]
pub enum FeeRate {
    /// EVM 链 legacy gas price（gwei）
    Gwei(f64),
    /// UTXO 链费率（聪/虚拟字节）
    SatPerVbyte(u64),
    /// Solana 优先费（micro-lamports / compute unit）
    MicroLamports(u64),
}

impl FeeRate {
    pub fn expect_gwei(&self) -> WalletResult<f64> {
        match self {
            FeeRate::Gwei(v) => Ok(*v),
            other => Err(WalletError::InvalidAmount(format!(
                "fee rate unit mismatch: expected gwei, got {:?}",
                other
            ))),
        }
    }

    pub fn expect_sat_per_vbyte(&self) -> WalletResult<u64> {
        match self {
            FeeRate::SatPerVbyte(v) => Ok(*v),
            other => Err(WalletError::InvalidAmount(format!(
                "fee rate unit mismatch: expected sat/vB, got {:?}",
                other
            ))),
        }
    }

    pub fn expect_micro_lamports(&self) -> WalletResult<u64> {
        match self {
            FeeRate::MicroLamports(v) => Ok(*v),
            other => Err(WalletError::InvalidAmount(format!(
                "fee rate unit mismatch: expected microlamports, got {:?}",
                other
            ))),
        }
    }
}

/// 三档费率估算结果
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub slow: FeeRate,
    pub average: FeeRate,
    pub fast: FeeRate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_mismatch_rejected() {
        let rate = FeeRate::SatPerVbyte(5);
        assert_eq!(rate.expect_sat_per_vbyte().unwrap(), 5);
        assert!(rate.expect_gwei().is_err());
        assert!(rate.expect_micro_lamports().is_err());
    }
}
