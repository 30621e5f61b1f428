//! 服务层：余额聚合、费率估算、价格、代币与各链交易发送

pub mod balance_service;
pub mod evm_sender;
pub mod fee_service;
pub mod price_service;
pub mod solana_sender;
pub mod token_service;
pub mod utxo_sender;

use serde::{Deserialize, Serialize};

/// 代币描述（合约地址 / mint 地址 + 精度）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub contract_address: String,
    pub decimals: u32,
    pub symbol: String,
}

pub use balance_service::BalanceService;
pub use evm_sender::EvmSender;
pub use fee_service::FeeService;
pub use price_service::PriceService;
pub use solana_sender::SolanaSender;
pub use token_service::TokenService;
pub use utxo_sender::UtxoSender;
