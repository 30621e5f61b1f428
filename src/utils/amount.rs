//! 金额换算：最小单位整数 ↔ 十进制字符串
//!
//! 全部使用 u128 整数运算，浮点数不参与金额计算。
//! 只有展示层在整数转十进制字符串之后才允许使用浮点。

use crate::error::{WalletError, WalletResult};

/// 最小单位整数转十进制字符串
///
/// 例：`format_units(1_500_000_000_000_000_000, 18)` → `"1.5"`
pub fn format_units(value: u128, decimals: u32) -> String {
    if decimals == 0 {
        return value.to_string();
    }
    let divisor = 10u128.pow(decimals);
    let whole = value / divisor;
    let frac = value % divisor;
    if frac == 0 {
        return whole.to_string();
    }
    let frac_str = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, frac_str.trim_end_matches('0'))
}

/// 十进制字符串转最小单位整数
///
/// 小数位数超过资产精度时拒绝，不做静默舍入。
pub fn parse_units(amount: &str, decimals: u32) -> WalletResult<u128> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(WalletError::InvalidAmount("empty amount".to_string()));
    }

    let (whole, frac) = match amount.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(WalletError::InvalidAmount(amount.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(WalletError::InvalidAmount(format!(
            "not a decimal number: {}",
            amount
        )));
    }
    if frac.len() > decimals as usize {
        return Err(WalletError::InvalidAmount(format!(
            "too many decimal places for asset with {} decimals: {}",
            decimals, amount
        )));
    }

    let whole_val: u128 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| WalletError::InvalidAmount(amount.to_string()))?
    };

    let mut frac_padded = frac.to_string();
    while frac_padded.len() < decimals as usize {
        frac_padded.push('0');
    }
    let frac_val: u128 = if frac_padded.is_empty() {
        0
    } else {
        frac_padded
            .parse()
            .map_err(|_| WalletError::InvalidAmount(amount.to_string()))?
    };

    let scale = 10u128.pow(decimals);
    whole_val
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_val))
        .ok_or_else(|| WalletError::InvalidAmount(format!("amount overflows: {}", amount)))
}

/// 解析后额外要求非零（转账金额入口）
pub fn parse_positive_units(amount: &str, decimals: u32) -> WalletResult<u128> {
    let value = parse_units(amount, decimals)?;
    if value == 0 {
        return Err(WalletError::InvalidAmount(
            "amount must be positive".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(1_500_000_000_000_000_000, 18), "1.5");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(1, 9), "0.000000001");
        assert_eq!(format_units(100_000_000, 8), "1");
        assert_eq!(format_units(123_456_789, 8), "1.23456789");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1.5", 18).unwrap(), 1_500_000_000_000_000_000);
        assert_eq!(parse_units("0.000000001", 9).unwrap(), 1);
        assert_eq!(parse_units("1", 8).unwrap(), 100_000_000);
        assert_eq!(parse_units("0", 8).unwrap(), 0);
        assert_eq!(parse_units(".5", 8).unwrap(), 50_000_000);
        assert_eq!(parse_units("2.", 8).unwrap(), 200_000_000);
    }

    #[test]
    fn test_parse_round_trip() {
        for s in ["1.5", "0.00000001", "21000000", "0.123456", "999.999"] {
            let v = parse_units(s, 8).unwrap();
            assert_eq!(parse_units(&format_units(v, 8), 8).unwrap(), v);
        }
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_units("", 8).is_err());
        assert!(parse_units("abc", 8).is_err());
        assert!(parse_units("-1", 8).is_err());
        assert!(parse_units("1.2.3", 8).is_err());
        assert!(parse_units(".", 8).is_err());
        // 小数位超过精度：拒绝而非舍入
        assert!(parse_units("0.123456789", 8).is_err());
    }

    #[test]
    fn test_positive_required() {
        assert!(parse_positive_units("0", 8).is_err());
        assert!(parse_positive_units("0.0", 8).is_err());
        assert_eq!(parse_positive_units("0.5", 8).unwrap(), 50_000_000);
    }
}
