//! Base58 / Base58Check / WIF 编解码
//!
//! 纯函数模块，无 I/O。前导零字节按标准规则映射为前导 '1' 字符。

use sha2::{Digest, Sha256};

use crate::error::{WalletError, WalletResult};

/// Base58 编码
pub fn encode(bytes: &[u8]) -> String {
    bs58::encode(bytes).into_string()
}

/// Base58 解码，非法字符返回 `InvalidEncoding`
pub fn decode(s: &str) -> WalletResult<Vec<u8>> {
    bs58::decode(s)
        .into_vec()
        .map_err(|e| WalletError::InvalidEncoding(format!("invalid base58 string: {}", e)))
}

/// 双重 SHA256 的前 4 字节
fn checksum(payload: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}

/// Base58Check：payload 追加 4 字节校验和后编码
pub fn encode_check(payload: &[u8]) -> String {
    let mut buf = Vec::with_capacity(payload.len() + 4);
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&checksum(payload));
    encode(&buf)
}

/// WIF 编码：version(1) + key(32) + 压缩标志(0x01) → Base58Check
pub fn encode_wif(raw_key: &[u8; 32], version: u8) -> String {
    let mut payload = Vec::with_capacity(34);
    payload.push(version);
    payload.extend_from_slice(raw_key);
    payload.push(0x01);
    encode_check(&payload)
}

/// WIF 解码：接受 37（未压缩）或 38（压缩）字节的解码结果，
/// 校验尾部 4 字节校验和，返回 `[1..33)` 的 32 字节原始私钥。
pub fn decode_wif(wif: &str) -> WalletResult<[u8; 32]> {
    let decoded = decode(wif)?;

    // version(1) + key(32) + [compressed(1)] + checksum(4)
    if decoded.len() != 37 && decoded.len() != 38 {
        return Err(WalletError::InvalidPrivateKey(format!(
            "WIF decodes to {} bytes, expected 37 or 38",
            decoded.len()
        )));
    }

    let (payload, check) = decoded.split_at(decoded.len() - 4);
    if checksum(payload) != check {
        return Err(WalletError::InvalidEncoding(
            "WIF checksum mismatch".to_string(),
        ));
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&decoded[1..33]);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cases: Vec<Vec<u8>> = vec![
            vec![],
            vec![0x00],
            vec![0x00, 0x00, 0x01],
            vec![0xff; 32],
            vec![0x00, 0x00, 0x00, 0xde, 0xad, 0xbe, 0xef],
            (0u8..=255).collect(),
        ];
        for bytes in cases {
            let encoded = encode(&bytes);
            assert_eq!(decode(&encoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_leading_zeros_map_to_ones() {
        let encoded = encode(&[0x00, 0x00, 0x01]);
        assert!(encoded.starts_with("11"));
        assert_eq!(decode(&encoded).unwrap(), vec![0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_invalid_character_rejected() {
        // '0' 与 'O' 不在 Base58 字母表中
        assert!(decode("0OIl").is_err());
    }

    #[test]
    fn test_wif_round_trip_all_versions() {
        let key = [0x42u8; 32];
        // BTC / LTC / DOGE 主网版本字节
        for version in [0x80u8, 0xB0, 0x9E] {
            let wif = encode_wif(&key, version);
            assert_eq!(decode_wif(&wif).unwrap(), key);
        }
    }

    #[test]
    fn test_known_wif_vector() {
        // 比特币 wiki 压缩 WIF 测试向量
        let key =
            hex::decode("0c28fca386c7a227600b2fe50b7cae11ec86d3bf1fbe471be89827e19d72aa1d")
                .unwrap();
        let mut key32 = [0u8; 32];
        key32.copy_from_slice(&key);
        assert_eq!(
            encode_wif(&key32, 0x80),
            "KwdMAjGmerYanjeui5SHS7JkmpZvVipYvB2LJGU1ZxJwYvP98617"
        );
    }

    #[test]
    fn test_wif_checksum_verified() {
        let key = [0x01u8; 32];
        let wif = encode_wif(&key, 0x80);
        // 篡改最后一个字符破坏校验和
        let mut tampered: Vec<char> = wif.chars().collect();
        let last = tampered.len() - 1;
        tampered[last] = if tampered[last] == '2' { '3' } else { '2' };
        let tampered: String = tampered.into_iter().collect();
        assert!(decode_wif(&tampered).is_err());
    }

    #[test]
    fn test_wif_wrong_length_rejected() {
        // 31 字节 key 的伪 WIF
        let mut payload = vec![0x80u8];
        payload.extend_from_slice(&[0x11u8; 31]);
        payload.push(0x01);
        let bad = encode_check(&payload);
        assert!(decode_wif(&bad).is_err());
    }
}
