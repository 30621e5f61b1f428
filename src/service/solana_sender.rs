//! Solana 交易发送
//!
//! 从零构建 legacy 线格式消息：账户表排序、3 字节头、compact-u16 长度、
//! 指令索引压缩，然后用发送方 32 字节种子做 Ed25519 签名。
//! SPL 转账会派生双方的关联代币账户（ATA），目标 ATA 不存在时
//! 前置一条幂等创建指令。
//!
//! 签名完全在本地完成后才发出唯一一次广播调用，不存在部分提交。

use std::sync::Arc;

use base64::Engine;
use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::Signer as _;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::fee::FeeRate;
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::http::HttpClient;
use crate::service::TokenDescriptor;
use crate::utils::{amount, base58};

const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";
const COMPUTE_BUDGET_PROGRAM_ID: &str = "ComputeBudget111111111111111111111111111111";
/// PDA 派生的域分隔串
const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// 账户元信息（消息账户表条目）
#[derive(Debug, Clone)]
struct AccountMeta {
    pubkey: [u8; 32],
    is_signer: bool,
    is_writable: bool,
}

/// 未编译指令
#[derive(Debug, Clone)]
struct Instruction {
    program_id: [u8; 32],
    accounts: Vec<AccountMeta>,
    data: Vec<u8>,
}

pub struct SolanaSender {
    http: Arc<HttpClient>,
    rpc_endpoints: Vec<String>,
}

impl SolanaSender {
    pub fn new(http: Arc<HttpClient>, rpc_endpoints: Vec<String>) -> Self {
        Self {
            http,
            rpc_endpoints,
        }
    }

    /// 原生 SOL 转账
    pub async fn send_native(
        &self,
        private_key: &str,
        from: &str,
        to: &str,
        amount_sol: &str,
        fee_rate: Option<FeeRate>,
    ) -> WalletResult<String> {
        let (secret, from_pubkey) = decode_keypair(private_key, from)?;
        let to_pubkey = decode_pubkey(to, "recipient")?;
        let lamports = parse_lamports(amount_sol, 9)?;

        let mut instructions = Vec::new();
        push_priority_fee(&mut instructions, fee_rate)?;

        // System program transfer: u32 指令号 2 + u64 lamports
        let mut data = Vec::with_capacity(12);
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&lamports.to_le_bytes());
        instructions.push(Instruction {
            program_id: [0u8; 32],
            accounts: vec![
                AccountMeta {
                    pubkey: from_pubkey,
                    is_signer: true,
                    is_writable: true,
                },
                AccountMeta {
                    pubkey: to_pubkey,
                    is_signer: false,
                    is_writable: true,
                },
            ],
            data,
        });

        self.sign_and_broadcast(&secret, from_pubkey, instructions)
            .await
    }

    /// SPL 代币转账
    pub async fn send_spl_token(
        &self,
        private_key: &str,
        from: &str,
        to: &str,
        amount_tokens: &str,
        fee_rate: Option<FeeRate>,
        token: &TokenDescriptor,
    ) -> WalletResult<String> {
        let (secret, from_pubkey) = decode_keypair(private_key, from)?;
        let to_pubkey = decode_pubkey(to, "recipient")?;
        let mint_pubkey = decode_pubkey(&token.contract_address, "mint")?;
        let raw_amount = parse_lamports(amount_tokens, token.decimals)?;

        let token_program = self.resolve_token_program(&token.contract_address).await;
        let from_ata = derive_associated_token_account(&from_pubkey, &mint_pubkey, &token_program)?;
        let to_ata = derive_associated_token_account(&to_pubkey, &mint_pubkey, &token_program)?;

        // 目标 ATA 已在链上时不附加创建指令
        let needs_create = !self.account_exists(&base58::encode(&to_ata)).await;
        let instructions = build_spl_instructions(
            from_pubkey,
            to_pubkey,
            mint_pubkey,
            token_program,
            from_ata,
            to_ata,
            raw_amount,
            fee_rate,
            needs_create,
        )?;

        tracing::info!(token = %token.symbol, "submitting spl transfer");
        self.sign_and_broadcast(&secret, from_pubkey, instructions)
            .await
    }

    /// 取 blockhash → 组消息 → 签名 → 单次广播
    async fn sign_and_broadcast(
        &self,
        secret: &Zeroizing<[u8; 32]>,
        fee_payer: [u8; 32],
        instructions: Vec<Instruction>,
    ) -> WalletResult<String> {
        let blockhash_result = self
            .query_rpc(
                "getLatestBlockhash",
                json!([{ "commitment": "finalized" }]),
            )
            .await
            .map_err(|e| WalletError::Rpc(e.to_string()))?;
        let blockhash_str = blockhash_result
            .pointer("/value/blockhash")
            .and_then(Value::as_str)
            .ok_or_else(|| WalletError::Rpc("no blockhash in response".to_string()))?;
        let blockhash = base58::decode(blockhash_str)?;

        let message = build_message(fee_payer, &instructions, &blockhash)?;

        // 签名是同步的 CPU 运算，在广播调用之前完成
        let signing_key = ed25519_dalek::SigningKey::from_bytes(secret);
        let signature = signing_key.sign(&message);

        let mut raw_tx = Vec::with_capacity(1 + 64 + message.len());
        raw_tx.push(1);
        raw_tx.extend_from_slice(&signature.to_bytes());
        raw_tx.extend_from_slice(&message);
        let encoded = base64::engine::general_purpose::STANDARD.encode(&raw_tx);

        let signature = self
            .broadcast_rpc(
                "sendTransaction",
                json!([encoded, {
                    "encoding": "base64",
                    "skipPreflight": false,
                    "preflightCommitment": "confirmed",
                }]),
            )
            .await?;
        let tx_sig = signature
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| signature.to_string());
        tracing::info!(tx_sig = %tx_sig, "solana transaction submitted");
        Ok(tx_sig)
    }

    /// 查询类 RPC：端点按序尝试，任何失败都换下一个
    async fn query_rpc(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let mut last_error = None;
        for endpoint in &self.rpc_endpoints {
            match self.http.rpc_call(endpoint, method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, method, error = %e, "solana rpc failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no solana rpc endpoints configured")))
    }

    /// 广播 RPC：传输失败换端点，远端明确拒绝立即终止，
    /// 同一笔交易不做自动重发
    async fn broadcast_rpc(&self, method: &str, params: Value) -> WalletResult<Value> {
        let body = json!({"jsonrpc": "2.0", "id": 1, "method": method, "params": params});
        let mut last_error = None;
        for endpoint in &self.rpc_endpoints {
            match self.http.post_json(endpoint, &body).await {
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "broadcast transport failed");
                    last_error = Some(e);
                }
                Ok(response) => {
                    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
                        let message = error
                            .get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                            .unwrap_or_else(|| error.to_string());
                        return Err(WalletError::Broadcast(message));
                    }
                    if let Some(result) = response.get("result") {
                        return Ok(result.clone());
                    }
                    last_error = Some(anyhow::anyhow!("empty rpc response"));
                }
            }
        }
        Err(WalletError::Rpc(
            last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "all solana rpc endpoints failed".to_string()),
        ))
    }

    async fn account_exists(&self, address: &str) -> bool {
        match self
            .query_rpc("getAccountInfo", json!([address, { "encoding": "base64" }]))
            .await
        {
            Ok(result) => result
                .get("value")
                .map(|v| !v.is_null())
                .unwrap_or(false),
            // 查询失败按已存在处理，跳过创建指令
            Err(_) => true,
        }
    }

    /// mint 归属哪个代币程序（Token / Token-2022）
    async fn resolve_token_program(&self, mint: &str) -> [u8; 32] {
        let default = decode_const_pubkey(TOKEN_PROGRAM_ID);
        match self
            .query_rpc("getAccountInfo", json!([mint, { "encoding": "base64" }]))
            .await
        {
            Ok(result) => {
                let owner = result.pointer("/value/owner").and_then(Value::as_str);
                if owner == Some(TOKEN_2022_PROGRAM_ID) {
                    decode_const_pubkey(TOKEN_2022_PROGRAM_ID)
                } else {
                    default
                }
            }
            Err(_) => default,
        }
    }
}

/// Base58 keypair 解码并核对发送地址
fn decode_keypair(private_key: &str, from: &str) -> WalletResult<(Zeroizing<[u8; 32]>, [u8; 32])> {
    let decoded = Zeroizing::new(base58::decode(private_key)?);
    if decoded.len() != 64 {
        return Err(WalletError::InvalidPrivateKey(format!(
            "solana keypair decodes to {} bytes, expected 64",
            decoded.len()
        )));
    }
    let mut secret = Zeroizing::new([0u8; 32]);
    secret.copy_from_slice(&decoded[..32]);
    let mut pubkey = [0u8; 32];
    pubkey.copy_from_slice(&decoded[32..]);

    if base58::encode(&pubkey) != from {
        return Err(WalletError::KeyMismatch);
    }
    Ok((secret, pubkey))
}

fn decode_pubkey(address: &str, what: &str) -> WalletResult<[u8; 32]> {
    let decoded = base58::decode(address)?;
    if decoded.len() != 32 {
        return Err(WalletError::invalid_address(
            "solana",
            format!("{} ({})", address, what),
        ));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&decoded);
    Ok(out)
}

/// 常量程序 ID 解码
fn decode_const_pubkey(address: &str) -> [u8; 32] {
    let decoded = bs58::decode(address).into_vec().expect("valid program id");
    let mut out = [0u8; 32];
    out.copy_from_slice(&decoded);
    out
}

fn parse_lamports(amount_str: &str, decimals: u32) -> WalletResult<u64> {
    let value = amount::parse_positive_units(amount_str, decimals)?;
    u64::try_from(value)
        .map_err(|_| WalletError::InvalidAmount(format!("amount overflows u64: {}", amount_str)))
}

fn push_priority_fee(
    instructions: &mut Vec<Instruction>,
    fee_rate: Option<FeeRate>,
) -> WalletResult<()> {
    if let Some(rate) = fee_rate {
        let micro_lamports = rate.expect_micro_lamports()?;
        if micro_lamports > 0 {
            // ComputeBudget SetComputeUnitPrice: u8 指令号 3 + u64 价格
            let mut data = Vec::with_capacity(9);
            data.push(3);
            data.extend_from_slice(&micro_lamports.to_le_bytes());
            instructions.push(Instruction {
                program_id: decode_const_pubkey(COMPUTE_BUDGET_PROGRAM_ID),
                accounts: vec![],
                data,
            });
        }
    }
    Ok(())
}

/// SPL 转账的指令序列：可选优先费 → 可选幂等 ATA 创建 → Transfer
#[allow(clippy::too_many_arguments)]
fn build_spl_instructions(
    from_pubkey: [u8; 32],
    to_pubkey: [u8; 32],
    mint_pubkey: [u8; 32],
    token_program: [u8; 32],
    from_ata: [u8; 32],
    to_ata: [u8; 32],
    raw_amount: u64,
    fee_rate: Option<FeeRate>,
    needs_create: bool,
) -> WalletResult<Vec<Instruction>> {
    let mut instructions = Vec::new();
    push_priority_fee(&mut instructions, fee_rate)?;

    if needs_create {
        instructions.push(Instruction {
            program_id: decode_const_pubkey(ASSOCIATED_TOKEN_PROGRAM_ID),
            accounts: vec![
                AccountMeta {
                    pubkey: from_pubkey,
                    is_signer: true,
                    is_writable: true,
                },
                AccountMeta {
                    pubkey: to_ata,
                    is_signer: false,
                    is_writable: true,
                },
                AccountMeta {
                    pubkey: to_pubkey,
                    is_signer: false,
                    is_writable: false,
                },
                AccountMeta {
                    pubkey: mint_pubkey,
                    is_signer: false,
                    is_writable: false,
                },
                AccountMeta {
                    pubkey: [0u8; 32],
                    is_signer: false,
                    is_writable: false,
                },
                AccountMeta {
                    pubkey: token_program,
                    is_signer: false,
                    is_writable: false,
                },
            ],
            // CreateIdempotent
            data: vec![1],
        });
    }

    // SPL Transfer: u8 指令号 3 + u64 数量
    let mut data = Vec::with_capacity(9);
    data.push(3);
    data.extend_from_slice(&raw_amount.to_le_bytes());
    instructions.push(Instruction {
        program_id: token_program,
        accounts: vec![
            AccountMeta {
                pubkey: from_ata,
                is_signer: false,
                is_writable: true,
            },
            AccountMeta {
                pubkey: to_ata,
                is_signer: false,
                is_writable: true,
            },
            AccountMeta {
                pubkey: from_pubkey,
                is_signer: true,
                is_writable: false,
            },
        ],
        data,
    });
    Ok(instructions)
}

/// 派生关联代币账户地址（canonical bump）
///
/// 从 bump=255 向下搜索，sha256(wallet ‖ token_program ‖ mint ‖ bump ‖
/// ata_program ‖ "ProgramDerivedAddress")，取第一个不在 Ed25519 曲线上的
/// 结果。曲线判定用点解压缩：解压失败即离曲线。
fn derive_associated_token_account(
    wallet: &[u8; 32],
    mint: &[u8; 32],
    token_program: &[u8; 32],
) -> WalletResult<[u8; 32]> {
    let ata_program = decode_const_pubkey(ASSOCIATED_TOKEN_PROGRAM_ID);

    for bump in (0u16..=255).rev() {
        let mut hasher = Sha256::new();
        hasher.update(wallet);
        hasher.update(token_program);
        hasher.update(mint);
        hasher.update([bump as u8]);
        hasher.update(ata_program);
        hasher.update(PDA_MARKER);
        let hash = hasher.finalize();

        let mut candidate = [0u8; 32];
        candidate.copy_from_slice(&hash);
        if is_off_curve(&candidate) {
            return Ok(candidate);
        }
    }
    Err(WalletError::Signing(
        "no valid bump for associated token account".to_string(),
    ))
}

/// 点不在 Ed25519 曲线上 ⇔ 不存在对应私钥，可安全用作 PDA
fn is_off_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_none()
}

/// 组装 legacy 线格式消息
///
/// 账户表：费用支付方固定在 0 位，其余按 (is_signer, is_writable)
/// 权重降序；头部三字节为 [需签名数, 只读已签名数, 只读未签名数]。
fn build_message(
    fee_payer: [u8; 32],
    instructions: &[Instruction],
    recent_blockhash: &[u8],
) -> WalletResult<Vec<u8>> {
    if recent_blockhash.len() != 32 {
        return Err(WalletError::Rpc("blockhash is not 32 bytes".to_string()));
    }

    // 合并去重账户表，费用支付方先置入
    let mut metas: Vec<AccountMeta> = vec![AccountMeta {
        pubkey: fee_payer,
        is_signer: true,
        is_writable: true,
    }];
    for ix in instructions {
        for account in &ix.accounts {
            if let Some(existing) = metas.iter_mut().find(|m| m.pubkey == account.pubkey) {
                existing.is_signer |= account.is_signer;
                existing.is_writable |= account.is_writable;
            } else {
                metas.push(account.clone());
            }
        }
        if !metas.iter().any(|m| m.pubkey == ix.program_id) {
            metas.push(AccountMeta {
                pubkey: ix.program_id,
                is_signer: false,
                is_writable: false,
            });
        }
    }

    // 除 0 位外按权重降序（稳定排序保持同权重的插入序）
    let mut rest = metas.split_off(1);
    rest.sort_by_key(|m| {
        let weight = (m.is_signer as u8) * 2 + (m.is_writable as u8);
        std::cmp::Reverse(weight)
    });
    metas.extend(rest);

    let mut num_required_signatures = 0u8;
    let mut num_readonly_signed = 0u8;
    let mut num_readonly_unsigned = 0u8;
    for meta in &metas {
        if meta.is_signer {
            num_required_signatures += 1;
            if !meta.is_writable {
                num_readonly_signed += 1;
            }
        } else if !meta.is_writable {
            num_readonly_unsigned += 1;
        }
    }

    let index_of = |pubkey: &[u8; 32]| -> WalletResult<u8> {
        metas
            .iter()
            .position(|m| &m.pubkey == pubkey)
            .map(|i| i as u8)
            .ok_or_else(|| WalletError::Signing("account missing from table".to_string()))
    };

    let mut message = Vec::with_capacity(128);
    message.push(num_required_signatures);
    message.push(num_readonly_signed);
    message.push(num_readonly_unsigned);
    message.extend_from_slice(&compact_u16(metas.len() as u16));
    for meta in &metas {
        message.extend_from_slice(&meta.pubkey);
    }
    message.extend_from_slice(recent_blockhash);
    message.extend_from_slice(&compact_u16(instructions.len() as u16));
    for ix in instructions {
        message.push(index_of(&ix.program_id)?);
        message.extend_from_slice(&compact_u16(ix.accounts.len() as u16));
        for account in &ix.accounts {
            message.push(index_of(&account.pubkey)?);
        }
        message.extend_from_slice(&compact_u16(ix.data.len() as u16));
        message.extend_from_slice(&ix.data);
    }
    Ok(message)
}

/// compact-u16 变长编码
fn compact_u16(value: u16) -> Vec<u8> {
    let value = value as u32;
    if value < 0x80 {
        vec![value as u8]
    } else if value < 0x4000 {
        vec![(value & 0x7f | 0x80) as u8, (value >> 7) as u8]
    } else {
        vec![
            (value & 0x7f | 0x80) as u8,
            ((value >> 7) & 0x7f | 0x80) as u8,
            (value >> 14) as u8,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_u16() {
        assert_eq!(compact_u16(0), vec![0]);
        assert_eq!(compact_u16(1), vec![1]);
        assert_eq!(compact_u16(127), vec![0x7f]);
        assert_eq!(compact_u16(128), vec![0x80, 0x01]);
        assert_eq!(compact_u16(16383), vec![0xff, 0x7f]);
        assert_eq!(compact_u16(16384), vec![0x80, 0x80, 0x01]);
    }

    fn native_transfer_instructions(from: [u8; 32], to: [u8; 32]) -> Vec<Instruction> {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&1_000_000u64.to_le_bytes());
        vec![Instruction {
            program_id: [0u8; 32],
            accounts: vec![
                AccountMeta {
                    pubkey: from,
                    is_signer: true,
                    is_writable: true,
                },
                AccountMeta {
                    pubkey: to,
                    is_signer: false,
                    is_writable: true,
                },
            ],
            data,
        }]
    }

    #[test]
    fn test_message_layout_native_transfer() {
        let from = [1u8; 32];
        let to = [2u8; 32];
        let blockhash = [9u8; 32];
        let message =
            build_message(from, &native_transfer_instructions(from, to), &blockhash).unwrap();

        // 头部：1 个签名者，0 个只读签名者，1 个只读未签名（system program）
        assert_eq!(&message[..3], &[1, 0, 1]);
        // 账户数 3，费用支付方在 0 位
        assert_eq!(message[3], 3);
        assert_eq!(&message[4..36], &from);
        assert_eq!(&message[36..68], &to);
        assert_eq!(&message[68..100], &[0u8; 32]);
        // blockhash 紧随账户表
        assert_eq!(&message[100..132], &blockhash);
        // 1 条指令：program index 2，两个账户 [0, 1]，数据 12 字节
        assert_eq!(message[132], 1);
        assert_eq!(message[133], 2);
        assert_eq!(message[134], 2);
        assert_eq!(&message[135..137], &[0, 1]);
        assert_eq!(message[137], 12);
    }

    #[test]
    fn test_fee_payer_stays_first_with_priority_fee() {
        let from = [1u8; 32];
        let to = [2u8; 32];
        let mut instructions = Vec::new();
        push_priority_fee(&mut instructions, Some(FeeRate::MicroLamports(5000))).unwrap();
        instructions.extend(native_transfer_instructions(from, to));

        let message = build_message(from, &instructions, &[0u8; 32]).unwrap();
        assert_eq!(&message[4..36], &from);
        // 2 条指令，2 个只读程序账户
        assert_eq!(&message[..3], &[1, 0, 2]);
    }

    #[test]
    fn test_priority_fee_unit_mismatch_rejected() {
        let mut instructions = Vec::new();
        assert!(push_priority_fee(&mut instructions, Some(FeeRate::Gwei(1.0))).is_err());
    }

    #[test]
    fn test_ata_derivation_deterministic_and_off_curve() {
        let wallet = decode_const_pubkey(TOKEN_PROGRAM_ID);
        let mint = decode_const_pubkey(TOKEN_2022_PROGRAM_ID);
        let program = decode_const_pubkey(TOKEN_PROGRAM_ID);

        let a = derive_associated_token_account(&wallet, &mint, &program).unwrap();
        let b = derive_associated_token_account(&wallet, &mint, &program).unwrap();
        assert_eq!(a, b);
        assert!(is_off_curve(&a));

        // 不同 mint 派生不同 ATA
        let other_mint = decode_const_pubkey(ASSOCIATED_TOKEN_PROGRAM_ID);
        let c = derive_associated_token_account(&wallet, &other_mint, &program).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_existing_ata_gets_no_second_creation_instruction() {
        let from = [1u8; 32];
        let to = [2u8; 32];
        let mint = decode_const_pubkey(TOKEN_2022_PROGRAM_ID);
        let program = decode_const_pubkey(TOKEN_PROGRAM_ID);
        let from_ata = derive_associated_token_account(&from, &mint, &program).unwrap();
        let to_ata = derive_associated_token_account(&to, &mint, &program).unwrap();
        let ata_program = decode_const_pubkey(ASSOCIATED_TOKEN_PROGRAM_ID);

        // ATA 已存在：只有 Transfer 一条指令
        let existing = build_spl_instructions(
            from, to, mint, program, from_ata, to_ata, 500, None, false,
        )
        .unwrap();
        assert_eq!(existing.len(), 1);
        assert!(existing.iter().all(|ix| ix.program_id != ata_program));

        // ATA 不存在：前置一条幂等创建指令（CreateIdempotent 判别字节 1）
        let missing = build_spl_instructions(
            from, to, mint, program, from_ata, to_ata, 500, None, true,
        )
        .unwrap();
        assert_eq!(missing.len(), 2);
        assert_eq!(missing[0].program_id, ata_program);
        assert_eq!(missing[0].data, vec![1]);
        assert_eq!(
            missing
                .iter()
                .filter(|ix| ix.program_id == ata_program)
                .count(),
            1
        );
    }

    #[test]
    fn test_keypair_decode_validations() {
        // 长度错误
        let short = base58::encode(&[7u8; 32]);
        assert!(matches!(
            decode_keypair(&short, "anything"),
            Err(WalletError::InvalidPrivateKey(_))
        ));

        // 地址不匹配
        let signing = ed25519_dalek::SigningKey::from_bytes(&[3u8; 32]);
        let mut pair = Vec::with_capacity(64);
        pair.extend_from_slice(&[3u8; 32]);
        pair.extend_from_slice(&signing.verifying_key().to_bytes());
        let encoded = base58::encode(&pair);
        assert!(matches!(
            decode_keypair(&encoded, "11111111111111111111111111111111"),
            Err(WalletError::KeyMismatch)
        ));

        // 匹配时返回正确的公钥
        let address = base58::encode(&signing.verifying_key().to_bytes());
        let (_, pubkey) = decode_keypair(&encoded, &address).unwrap();
        assert_eq!(pubkey, signing.verifying_key().to_bytes());
    }

    #[test]
    fn test_on_curve_point_detected() {
        // 任意 ed25519 公钥必然在曲线上
        let signing = ed25519_dalek::SigningKey::from_bytes(&[5u8; 32]);
        let pubkey = signing.verifying_key().to_bytes();
        assert!(!is_off_curve(&pubkey));
    }
}
