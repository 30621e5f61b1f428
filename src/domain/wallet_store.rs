//! 钱包存储契约
//!
//! 加密存储是外部协作方：引擎只消费解密后的 [`WalletDocument`]，
//! 自己不实现任何口令加密，也绝不记录助记词、私钥或口令。

use async_trait::async_trait;

use crate::domain::account::WalletDocument;
use crate::error::WalletResult;

/// 外部钱包存储
///
/// 实现方负责口令派生与认证加密；认证失败必须返回
/// [`crate::error::WalletError::WrongPasswordOrCorrupt`]，
/// `save` 必须原子覆盖。
#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn load(&self, password: &str) -> WalletResult<WalletDocument>;

    async fn save(&self, password: &str, document: &WalletDocument) -> WalletResult<()>;

    async fn exists(&self) -> bool;

    async fn delete(&self) -> WalletResult<()>;
}
