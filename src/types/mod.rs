//! Common Types Module
//!
//! 애플리케이션 전반에서 사용되는 공통 타입 정의

use serde::{Deserialize, Serialize};

/// Ethereum 지갑 주소 타입
///
/// 생성 시점에 형식 검증 + 소문자 정규화.
/// identity key는 항상 소문자 주소 (case-insensitive 비교를 저장 전에 해결)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn new(addr: &str) -> Result<Self, String> {
        let addr = addr.to_lowercase();
        if addr.starts_with("0x")
            && addr.len() == 42
            && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            Ok(Self(addr))
        } else {
            Err("Invalid wallet address format".to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 리더보드 표시용 마스킹: `0x1234...7890` (앞 6자리 + 뒤 4자리)
///
/// 저장 규칙상 42자 소문자지만, 외부에서 들어온 짧은 값도 패닉 없이 처리
pub fn mask_wallet(addr: &str) -> String {
    if addr.len() <= 10 {
        return addr.to_string();
    }
    format!("{}...{}", &addr[..6], &addr[addr.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_address_valid() {
        let addr = WalletAddress::new("0x1234567890123456789012345678901234567890");
        assert!(addr.is_ok());
    }

    #[test]
    fn test_wallet_address_lowercased() {
        let addr = WalletAddress::new("0xABCDEF7890123456789012345678901234567890").unwrap();
        assert_eq!(
            addr.as_str(),
            "0xabcdef7890123456789012345678901234567890"
        );
    }

    #[test]
    fn test_wallet_address_invalid() {
        assert!(WalletAddress::new("invalid").is_err());
        assert!(WalletAddress::new("0x123").is_err());
        // 42자지만 hex가 아님
        assert!(WalletAddress::new("0xzz34567890123456789012345678901234567890").is_err());
    }

    #[test]
    fn test_mask_wallet() {
        // 42자 전체 주소 → 앞 6자리 + 뒤 4자리
        let addr = WalletAddress::new("0x1234567890123456789012345678901234567890").unwrap();
        assert_eq!(mask_wallet(addr.as_str()), "0x1234...7890");
    }

    #[test]
    fn test_mask_wallet_short_input() {
        assert_eq!(mask_wallet("0x1234"), "0x1234");
    }
}
