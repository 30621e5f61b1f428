//! UTXO 链交易发送 (BTC / LTC / DOGE)
//!
//! 币选择不在本引擎范围内：交易骨架由外部构建端点（BlockCypher）生成，
//! 本模块对返回的每个 sighash 做 ECDSA 签名并手工 DER 编码，
//! 再把完整骨架提交广播。骨架创建或广播的远端错误原样透传；
//! 本地签名失败对该笔交易致命，不会发出部分签名。

use std::sync::Arc;

use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature, SigningKey};
use serde_json::{json, Value};
use zeroize::Zeroizing;

use crate::domain::chain_config::{Chain, ChainRegistry};
use crate::domain::fee::FeeRate;
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::http::HttpClient;
use crate::utils::{address_validator::AddressValidator, amount, base58};

pub struct UtxoSender {
    http: Arc<HttpClient>,
    base_url: String,
    registry: ChainRegistry,
}

impl UtxoSender {
    pub fn new(http: Arc<HttpClient>, base_url: String) -> Self {
        Self {
            http,
            base_url,
            registry: ChainRegistry::new(),
        }
    }

    /// 发送一笔 UTXO 转账，返回交易哈希
    pub async fn send(
        &self,
        chain: Chain,
        private_key: &str,
        from: &str,
        to: &str,
        amount_str: &str,
        fee_rate: Option<FeeRate>,
    ) -> WalletResult<String> {
        let config = self.registry.get(chain);
        let bc_path = config
            .blockcypher_path
            .ok_or_else(|| WalletError::ChainNotSupported(chain.to_string()))?;

        // 全部输入校验先于任何网络调用
        AddressValidator::require_valid(chain, from)?;
        AddressValidator::require_valid(chain, to)?;
        let satoshis = amount::parse_positive_units(amount_str, config.decimals)?;
        let raw_key = decode_raw_key(private_key)?;

        let signing_key = SigningKey::from_slice(raw_key.as_slice())
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        let pubkey_hex = hex::encode(
            signing_key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes(),
        );

        let preference = match fee_rate {
            Some(rate) => preference_for(rate.expect_sat_per_vbyte()?),
            None => "medium",
        };

        // 1. 请求交易骨架
        let new_tx_url = format!("{}/{}/txs/new", self.base_url, bc_path);
        let request = json!({
            "inputs": [{ "addresses": [from] }],
            "outputs": [{ "addresses": [to], "value": satoshis }],
            "preference": preference,
        });
        let mut skeleton = self
            .http
            .post_json(&new_tx_url, &request)
            .await
            .map_err(|e| WalletError::Rpc(e.to_string()))?;

        if let Some(errors) = skeleton.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .filter_map(|e| e.get("error").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(WalletError::Rpc(joined));
            }
        }

        // 2. 对每个 tosign 摘要签名，签名与公钥按序对齐
        let to_sign: Vec<String> = skeleton
            .get("tosign")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let mut signatures = Vec::with_capacity(to_sign.len());
        let mut pubkeys = Vec::with_capacity(to_sign.len());
        for digest_hex in &to_sign {
            let digest = hex::decode(digest_hex)
                .map_err(|e| WalletError::Signing(format!("bad tosign digest: {}", e)))?;
            let signature: Signature = signing_key
                .sign_prehash(&digest)
                .map_err(|e| WalletError::Signing(e.to_string()))?;
            let signature = signature.normalize_s().unwrap_or(signature);
            let (r, s) = signature.split_bytes();
            signatures.push(hex::encode(der_encode_signature(&r, &s)));
            pubkeys.push(pubkey_hex.clone());
        }

        skeleton["signatures"] = json!(signatures);
        skeleton["pubkeys"] = json!(pubkeys);

        // 3. 广播完整骨架
        let send_url = format!("{}/{}/txs/send", self.base_url, bc_path);
        let result = self
            .http
            .post_json(&send_url, &skeleton)
            .await
            .map_err(|e| WalletError::Broadcast(e.to_string()))?;

        let tx_hash = result
            .pointer("/tx/hash")
            .or_else(|| result.get("hash"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::info!(chain = %chain, tx_hash = %tx_hash, "utxo transaction submitted");
        Ok(tx_hash)
    }
}

/// WIF 或 0x-hex 私钥 → 32 字节原始私钥
///
/// 长度不是 32 字节一律拒绝，此检查发生在任何网络调用之前。
fn decode_raw_key(private_key: &str) -> WalletResult<Zeroizing<[u8; 32]>> {
    if let Some(stripped) = private_key.strip_prefix("0x") {
        let bytes = hex::decode(stripped)
            .map_err(|e| WalletError::InvalidPrivateKey(format!("invalid hex: {}", e)))?;
        if bytes.len() != 32 {
            return Err(WalletError::InvalidPrivateKey(format!(
                "key is {} bytes, expected 32",
                bytes.len()
            )));
        }
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&bytes);
        Ok(out)
    } else {
        Ok(Zeroizing::new(base58::decode_wif(private_key)?))
    }
}

/// sat/vB 费率映射到 BlockCypher 的三档偏好
fn preference_for(sat_per_vbyte: u64) -> &'static str {
    if sat_per_vbyte <= 100 {
        "low"
    } else if sat_per_vbyte <= 500 {
        "medium"
    } else {
        "high"
    }
}

/// (r, s) → DER
///
/// 整数段去掉多余前导零；最高位为 1 时补一个 0x00 以满足
/// DER 非负整数规则。
fn der_encode_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    fn trim_to_der_int(bytes: &[u8]) -> Vec<u8> {
        let mut slice = bytes;
        while slice.len() > 1 && slice[0] == 0x00 {
            slice = &slice[1..];
        }
        let mut out = Vec::with_capacity(slice.len() + 1);
        if slice[0] & 0x80 != 0 {
            out.push(0x00);
        }
        out.extend_from_slice(slice);
        out
    }

    let r = trim_to_der_int(r);
    let s = trim_to_der_int(s);

    let mut der = Vec::with_capacity(6 + r.len() + s.len());
    der.push(0x30);
    der.push((4 + r.len() + s.len()) as u8);
    der.push(0x02);
    der.push(r.len() as u8);
    der.extend_from_slice(&r);
    der.push(0x02);
    der.push(s.len() as u8);
    der.extend_from_slice(&s);
    der
}
