//! IronForge Core - 本地多链钱包引擎
//!
//! 一个助记词派生五条链（Ethereum / Bitcoin / Litecoin / Dogecoin /
//! Solana）的账户与密钥，构建并签名各链的原生与代币转账，
//! 并在多个互不可靠的公共数据源之间做有序降级的余额/费率/价格查询。
//!
//! 口令加密存储、界面与进程管理是外部协作方（见 `domain::wallet_store`）；
//! 引擎自身绝不记录或外泄助记词、私钥与口令。

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod infrastructure;
pub mod service;
pub mod utils;

pub use config::EngineConfig;
pub use engine::WalletEngine;
pub use error::{ErrorKind, WalletError, WalletResult};

// 统一模块导出
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::engine::WalletEngine;
    pub use crate::domain::{
        Account, Chain, ChainRegistry, FeeEstimate, FeeRate, MultiChainAccount,
        MultiChainWalletService, WalletDocument, WalletStore,
    };
    pub use crate::error::{ErrorKind, WalletError, WalletResult};
    pub use crate::service::{
        BalanceService, EvmSender, FeeService, PriceService, SolanaSender, TokenService,
        UtxoSender,
    };
}
