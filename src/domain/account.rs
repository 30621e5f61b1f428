//! 账户模型
//!
//! 账户是三种互斥类型之一：种子派生、导入私钥、观察地址。
//! 类型在创建后不可变，只有显示名可以修改。

use serde::{Deserialize, Serialize};

use crate::domain::chain_config::Chain;
use crate::error::{WalletError, WalletResult};

/// 钱包账户
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "account_type", rename_all = "snake_case")]
pub enum Account {
    /// 从助记词种子派生，五条链地址均可派生
    FromSeed { index: u32, name: String },
    /// 导入的单链私钥（私钥随钱包文档持久化）
    FromImportedKey {
        chain: Chain,
        name: String,
        address: String,
        private_key: String,
    },
    /// 观察账户：只有地址，无任何密钥
    WatchOnly {
        chain: Chain,
        name: String,
        address: String,
    },
}

impl Account {
    pub fn name(&self) -> &str {
        match self {
            Account::FromSeed { name, .. }
            | Account::FromImportedKey { name, .. }
            | Account::WatchOnly { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, new_name: String) {
        match self {
            Account::FromSeed { name, .. }
            | Account::FromImportedKey { name, .. }
            | Account::WatchOnly { name, .. } => *name = new_name,
        }
    }

    /// 能否发起签名（观察账户不能）
    pub fn is_signable(&self) -> bool {
        !matches!(self, Account::WatchOnly { .. })
    }

    /// 是否可派生全部链的地址（仅种子账户）
    pub fn derives_all_chains(&self) -> bool {
        matches!(self, Account::FromSeed { .. })
    }

    /// 签名前的账户类型检查
    pub fn require_signable(&self) -> WalletResult<()> {
        if self.is_signable() {
            Ok(())
        } else {
            Err(WalletError::AccountNotSignable(format!(
                "'{}' is a watch-only account",
                self.name()
            )))
        }
    }
}

/// 解密后的钱包文档（WalletStore 的读写单元）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletDocument {
    pub mnemonic: String,
    pub accounts: Vec<Account>,
}

impl WalletDocument {
    pub fn new(mnemonic: String) -> Self {
        Self {
            mnemonic,
            accounts: vec![Account::FromSeed {
                index: 0,
                name: "Account 1".to_string(),
            }],
        }
    }

    /// 追加一个种子账户，index 为当前种子账户数量
    pub fn add_seed_account(&mut self) -> u32 {
        let next_index = self
            .accounts
            .iter()
            .filter(|a| a.derives_all_chains())
            .count() as u32;
        self.accounts.push(Account::FromSeed {
            index: next_index,
            name: format!("Account {}", next_index + 1),
        });
        next_index
    }

    pub fn rename_account(&mut self, position: usize, name: String) -> WalletResult<()> {
        let account = self
            .accounts
            .get_mut(position)
            .ok_or_else(|| WalletError::Store(format!("account {} not found", position)))?;
        account.set_name(name);
        Ok(())
    }

    /// 移除账户并把剩余种子账户的 index 重排为从 0 连续，
    /// 保证后续派生结果稳定。不允许移除最后一个账户。
    pub fn remove_account(&mut self, position: usize) -> WalletResult<()> {
        if self.accounts.len() <= 1 {
            return Err(WalletError::Store(
                "cannot remove the only account".to_string(),
            ));
        }
        if position >= self.accounts.len() {
            return Err(WalletError::Store(format!(
                "account {} not found",
                position
            )));
        }
        self.accounts.remove(position);

        let mut next = 0u32;
        for account in &mut self.accounts {
            if let Account::FromSeed { index, .. } = account {
                *index = next;
                next += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> WalletDocument {
        let mut doc = WalletDocument::new("test mnemonic".to_string());
        doc.add_seed_account();
        doc.accounts.push(Account::WatchOnly {
            chain: Chain::Bitcoin,
            name: "watched".to_string(),
            address: "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA".to_string(),
        });
        doc.add_seed_account();
        doc
    }

    #[test]
    fn test_seed_indices_contiguous_after_removal() {
        let mut doc = sample_document();
        // seed(0), seed(1), watch, seed(2)
        doc.remove_account(1).unwrap();

        let indices: Vec<u32> = doc
            .accounts
            .iter()
            .filter_map(|a| match a {
                Account::FromSeed { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_cannot_remove_last_account() {
        let mut doc = WalletDocument::new("m".to_string());
        assert!(doc.remove_account(0).is_err());
    }

    #[test]
    fn test_watch_only_not_signable() {
        let account = Account::WatchOnly {
            chain: Chain::Ethereum,
            name: "w".to_string(),
            address: "0x0000000000000000000000000000000000000000".to_string(),
        };
        assert!(!account.is_signable());
        assert!(matches!(
            account.require_signable(),
            Err(WalletError::AccountNotSignable(_))
        ));
    }

    #[test]
    fn test_rename_preserves_variant() {
        let mut doc = sample_document();
        doc.rename_account(2, "cold storage".to_string()).unwrap();
        assert_eq!(doc.accounts[2].name(), "cold storage");
        assert!(matches!(doc.accounts[2], Account::WatchOnly { .. }));
    }

    #[test]
    fn test_account_serde_tagging() {
        let account = Account::FromSeed {
            index: 0,
            name: "Account 1".to_string(),
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("\"account_type\":\"from_seed\""));
        let back: Account = serde_json::from_str(&json).unwrap();
        assert!(back.derives_all_chains());
    }
}
