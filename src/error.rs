//! 统一错误类型
//!
//! 错误分为五类：输入校验、派生/签名、数据提供方、广播、存储。
//! 调用方通过 [`WalletError::kind`] 区分「输入无效」「网络不可用」
//! 与「该账户类型不支持此操作」。

use std::time::Duration;

use thiserror::Error;

/// 错误类别（对应处理策略）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 输入校验失败：同步返回，不产生任何副作用，重试无意义
    InvalidInput,
    /// 派生/签名失败：对当前操作致命，不自动重试
    Signing,
    /// 数据提供方失败：由 fallback 层内部恢复，仅在穷尽后暴露
    Provider,
    /// 广播被远端拒绝：原样透传，绝不自动重发
    Broadcast,
    /// 钱包存储层失败
    Store,
}

#[derive(Debug, Error)]
pub enum WalletError {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 输入校验
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// BIP39 校验和不通过
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// 派生路径格式错误（固定模板下不应出现）
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(String),

    #[error("invalid {chain} address: {address}")]
    InvalidAddress { chain: String, address: String },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// 私钥格式或长度不符合链的要求
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Base58 等编码中出现非法字符或校验和错误
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// 私钥派生出的地址与声称的发送地址不一致
    #[error("private key does not match the sender address")]
    KeyMismatch,

    #[error("unsupported chain: {0}")]
    ChainNotSupported(String),

    /// 账户类型不支持该操作（如从观察账户发起转账）
    #[error("account cannot perform this action: {0}")]
    AccountNotSignable(String),

    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 签名 / 派生
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    #[error("signing failed: {0}")]
    Signing(String),

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 数据提供方 / 广播
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    #[error("provider request failed: {0}")]
    Provider(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("rpc error: {0}")]
    Rpc(String),

    /// 远端拒绝已签名交易，消息原样透传
    #[error("broadcast rejected: {0}")]
    Broadcast(String),

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 存储（外部协作方）
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    #[error("wrong password or corrupt wallet data")]
    WrongPasswordOrCorrupt,

    #[error("wallet store error: {0}")]
    Store(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::InvalidMnemonic(_)
            | WalletError::InvalidDerivationPath(_)
            | WalletError::InvalidAddress { .. }
            | WalletError::InvalidAmount(_)
            | WalletError::InvalidPrivateKey(_)
            | WalletError::InvalidEncoding(_)
            | WalletError::KeyMismatch
            | WalletError::ChainNotSupported(_)
            | WalletError::AccountNotSignable(_)
            | WalletError::InsufficientBalance(_) => ErrorKind::InvalidInput,
            WalletError::Signing(_) => ErrorKind::Signing,
            WalletError::Provider(_) | WalletError::Timeout(_) | WalletError::Rpc(_) => {
                ErrorKind::Provider
            }
            WalletError::Broadcast(_) => ErrorKind::Broadcast,
            WalletError::WrongPasswordOrCorrupt | WalletError::Store(_) => ErrorKind::Store,
        }
    }

    pub fn invalid_address(chain: impl Into<String>, address: impl Into<String>) -> Self {
        WalletError::InvalidAddress {
            chain: chain.into(),
            address: address.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(
            WalletError::InvalidMnemonic("bad checksum".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            WalletError::Timeout(Duration::from_secs(10)).kind(),
            ErrorKind::Provider
        );
        assert_eq!(
            WalletError::Broadcast("tx rejected".into()).kind(),
            ErrorKind::Broadcast
        );
        assert_eq!(WalletError::WrongPasswordOrCorrupt.kind(), ErrorKind::Store);
    }
}
