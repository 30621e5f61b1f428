//! EVM 交易发送
//!
//! 原生转账与 ERC-20 transfer 两种形态。签名与 RLP 编码交给 ethers，
//! 本模块负责参数组装与单位换算。费率参数按 legacy gas price（gwei）
//! 解释，保持广播兼容性。
//!
//! 全部输入校验在任何网络调用之前完成；签名在广播前同步完成。

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TransactionRequest, U256},
};

use crate::domain::chain_config::Chain;
use crate::domain::fee::FeeRate;
use crate::error::{WalletError, WalletResult};
use crate::service::TokenDescriptor;
use crate::utils::address_validator::AddressValidator;

/// ERC-20 transfer(address,uint256) 函数选择器
const TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

pub struct EvmSender {
    rpc_url: String,
    chain_id: u64,
}

impl EvmSender {
    pub fn new(rpc_url: String, chain_id: u64) -> Self {
        Self { rpc_url, chain_id }
    }

    /// 原生 ETH 转账
    pub async fn send_native(
        &self,
        private_key: &str,
        from: &str,
        to: &str,
        amount: &str,
        fee_rate: Option<FeeRate>,
    ) -> WalletResult<String> {
        AddressValidator::require_valid(Chain::Ethereum, to)?;
        let value = parse_evm_amount(amount, 18)?;
        let wallet = self.wallet_for(private_key, Some(from))?;

        let to_address: Address = to
            .parse()
            .map_err(|_| WalletError::invalid_address("ethereum", to))?;

        let mut tx = TransactionRequest::new().to(to_address).value(value);
        if let Some(gas_price) = gas_price_from(fee_rate)? {
            tx = tx.gas_price(gas_price);
        }

        self.broadcast(wallet, tx).await
    }

    /// ERC-20 transfer 合约调用
    pub async fn send_erc20(
        &self,
        private_key: &str,
        from: &str,
        to: &str,
        amount: &str,
        fee_rate: Option<FeeRate>,
        token: &TokenDescriptor,
    ) -> WalletResult<String> {
        AddressValidator::require_valid(Chain::Ethereum, to)?;
        let raw_amount = parse_evm_amount(amount, token.decimals)?;
        let wallet = self.wallet_for(private_key, Some(from))?;

        let to_address: Address = to
            .parse()
            .map_err(|_| WalletError::invalid_address("ethereum", to))?;
        let contract: Address = token
            .contract_address
            .parse()
            .map_err(|_| WalletError::invalid_address("ethereum", &token.contract_address))?;

        let data = build_erc20_transfer_data(to_address, raw_amount);

        let mut tx = TransactionRequest::new()
            .to(contract)
            .value(U256::zero())
            .data(Bytes::from(data));
        if let Some(gas_price) = gas_price_from(fee_rate)? {
            tx = tx.gas_price(gas_price);
        }

        tracing::info!(token = %token.symbol, "submitting erc20 transfer");
        self.broadcast(wallet, tx).await
    }

    /// 私钥解析 + 发送地址一致性检查
    fn wallet_for(&self, private_key: &str, from: Option<&str>) -> WalletResult<LocalWallet> {
        let wallet: LocalWallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|_| WalletError::InvalidPrivateKey("not a valid evm key".to_string()))?;
        let wallet = wallet.with_chain_id(self.chain_id);

        if let Some(from) = from {
            let claimed: Address = from
                .parse()
                .map_err(|_| WalletError::invalid_address("ethereum", from))?;
            if wallet.address() != claimed {
                return Err(WalletError::KeyMismatch);
            }
        }
        Ok(wallet)
    }

    async fn broadcast(&self, wallet: LocalWallet, tx: TransactionRequest) -> WalletResult<String> {
        let provider = Provider::<Http>::try_from(self.rpc_url.as_str())
            .map_err(|e| WalletError::Rpc(format!("invalid rpc url: {}", e)))?;
        let client = SignerMiddleware::new(provider, wallet);

        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| WalletError::Broadcast(e.to_string()))?;
        let tx_hash = format!("{:?}", *pending);
        tracing::info!(tx_hash = %tx_hash, "evm transaction submitted");
        Ok(tx_hash)
    }
}

/// 人类可读金额 → U256 最小单位，非正数拒绝
fn parse_evm_amount(amount: &str, decimals: u32) -> WalletResult<U256> {
    // 用整数金额模块做校验与换算（u128 覆盖不了的超大额走 ethers 解析）
    match crate::utils::amount::parse_positive_units(amount, decimals) {
        Ok(value) => Ok(U256::from(value)),
        Err(WalletError::InvalidAmount(msg)) if msg.contains("overflows") => {
            let parsed = ethers::utils::parse_units(amount, decimals)
                .map_err(|e| WalletError::InvalidAmount(e.to_string()))?;
            Ok(parsed.into())
        }
        Err(e) => Err(e),
    }
}

fn gas_price_from(fee_rate: Option<FeeRate>) -> WalletResult<Option<U256>> {
    match fee_rate {
        None => Ok(None),
        Some(rate) => {
            let gwei = rate.expect_gwei()?;
            if gwei <= 0.0 {
                return Ok(None);
            }
            let wei = ethers::utils::parse_units(format!("{:.4}", gwei), "gwei")
                .map_err(|e| WalletError::InvalidAmount(e.to_string()))?;
            Ok(Some(wei.into()))
        }
    }
}

/// transfer(address,uint256) 调用数据
fn build_erc20_transfer_data(to: Address, amount: U256) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&TRANSFER_SELECTOR);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(to.as_bytes());
    let mut amount_buf = [0u8; 32];
    amount.to_big_endian(&mut amount_buf);
    data.extend_from_slice(&amount_buf);
    data
}
