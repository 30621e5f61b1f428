//! 领域模型：链配置、账户、派生、费率与存储契约

pub mod account;
pub mod chain_config;
pub mod derivation;
pub mod fee;
pub mod multi_chain_wallet;
pub mod wallet_store;

pub use account::{Account, WalletDocument};
pub use chain_config::{Chain, ChainConfig, ChainRegistry, CurveType};
pub use fee::{FeeEstimate, FeeRate};
pub use multi_chain_wallet::{
    ChainAddress, ChainPrivateKey, MultiChainAccount, MultiChainWalletService,
};
pub use wallet_store::WalletStore;
