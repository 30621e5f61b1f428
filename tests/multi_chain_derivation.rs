//! 多链派生集成测试
//!
//! 覆盖：确定性、跨链隔离、已知测试向量、私钥导出格式往返。

use ironforge_core::domain::{Chain, MultiChainWalletService};
use ironforge_core::utils::base58;

const MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

#[test]
fn derivation_is_byte_identical_across_calls() {
    let service = MultiChainWalletService::new();

    let first = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();
    let second = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();

    assert_eq!(first.address, second.address);
    assert_eq!(first.private_key, second.private_key);
    for (a, b) in first.addresses.iter().zip(second.addresses.iter()) {
        assert_eq!(a.chain, b.chain);
        assert_eq!(a.address, b.address);
    }
}

#[test]
fn known_vectors_for_standard_mnemonic() {
    let service = MultiChainWalletService::new();
    let account = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();

    let address_of = |chain: Chain| -> &str {
        &account
            .addresses
            .iter()
            .find(|a| a.chain == chain)
            .unwrap()
            .address
    };

    // m/44'/60'/0'/0/0 与 m/44'/0'/0'/0/0 的公开测试向量
    assert_eq!(
        address_of(Chain::Ethereum),
        "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
    );
    assert_eq!(
        address_of(Chain::Bitcoin),
        "1LqBGSKuX5yYUonjxT5qGfpUsXKYYWeabA"
    );

    // 各链地址前缀符合版本字节
    assert!(address_of(Chain::Litecoin).starts_with('L'));
    assert!(address_of(Chain::Dogecoin).starts_with('D'));
    let sol = address_of(Chain::Solana);
    assert!(sol.len() >= 32 && sol.len() <= 44);
}

#[test]
fn changing_index_changes_all_five_addresses() {
    let service = MultiChainWalletService::new();
    let a0 = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();
    let a1 = service.derive_multi_chain_account(MNEMONIC, 1).unwrap();

    assert_eq!(a0.addresses.len(), 5);
    for (x, y) in a0.addresses.iter().zip(a1.addresses.iter()) {
        assert_ne!(x.address, y.address, "chain {} address unchanged", x.chain);
    }
}

#[test]
fn all_five_chains_have_distinct_addresses() {
    let service = MultiChainWalletService::new();
    let account = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();

    let mut addresses: Vec<&str> = account
        .addresses
        .iter()
        .map(|a| a.address.as_str())
        .collect();
    addresses.sort_unstable();
    addresses.dedup();
    assert_eq!(addresses.len(), 5);
}

#[test]
fn exported_private_keys_recover_their_addresses() {
    let service = MultiChainWalletService::new();
    let account = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();
    let keys = service.derive_all_private_keys(MNEMONIC, 0).unwrap();

    for key in &keys {
        let derived = service
            .address_from_private_key(key.chain, &key.private_key)
            .unwrap();
        let expected = account
            .addresses
            .iter()
            .find(|a| a.chain == key.chain)
            .unwrap();
        assert_eq!(derived, expected.address, "chain {}", key.chain);
    }
}

#[test]
fn utxo_keys_export_as_wif_and_round_trip() {
    let service = MultiChainWalletService::new();
    let keys = service.derive_all_private_keys(MNEMONIC, 0).unwrap();

    for chain in [Chain::Bitcoin, Chain::Litecoin, Chain::Dogecoin] {
        let wif = &keys.iter().find(|k| k.chain == chain).unwrap().private_key;
        let raw = base58::decode_wif(wif).unwrap();
        assert_eq!(raw.len(), 32);

        // raw hex 兜底路径得到同一地址
        let from_wif = service.address_from_private_key(chain, wif).unwrap();
        let from_hex = service
            .address_from_private_key(chain, &format!("0x{}", hex::encode(raw)))
            .unwrap();
        assert_eq!(from_wif, from_hex);
    }
}

#[test]
fn solana_export_is_keypair_seed_then_pubkey() {
    let service = MultiChainWalletService::new();
    let account = service.derive_multi_chain_account(MNEMONIC, 0).unwrap();
    let keys = service.derive_all_private_keys(MNEMONIC, 0).unwrap();

    let sol_key = &keys
        .iter()
        .find(|k| k.chain == Chain::Solana)
        .unwrap()
        .private_key;
    let decoded = base58::decode(sol_key).unwrap();
    assert_eq!(decoded.len(), 64);

    // 后 32 字节就是地址公钥
    let sol_address = &account
        .addresses
        .iter()
        .find(|a| a.chain == Chain::Solana)
        .unwrap()
        .address;
    assert_eq!(&base58::encode(&decoded[32..]), sol_address);
}

#[test]
fn invalid_inputs_fail_synchronously() {
    use ironforge_core::{ErrorKind, WalletError};

    let service = MultiChainWalletService::new();

    let err = service
        .derive_multi_chain_account("not a mnemonic at all", 0)
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = service
        .address_from_private_key(Chain::Bitcoin, "0xdeadbeef")
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidPrivateKey(_)));
}
