//! TON standard address
//!
//! An address is a workchain id plus a 256-bit account id. It has a raw text
//! form (`workchain:hex`) and a user-friendly checksummed base64 form.

use crate::crc::CRC16;
use crate::tvm::error::{EncodingError, Result};
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const FLAG_TEST_ONLY: u8 = 0x80;

/// Length of a decoded user-friendly address
const FRIENDLY_LEN: usize = 36;

/// Represents a TON blockchain address
///
/// Equality and hashing only consider the workchain and the account id;
/// the friendly-form flags are presentation details.
#[derive(Debug, Clone, Copy)]
pub struct Address {
    /// Workchain ID (-1 for masterchain, 0 for basechain)
    pub workchain: i8,
    /// 32-byte hash part of the address
    pub hash_part: [u8; 32],
    /// Whether the address is bounceable
    pub is_bounceable: bool,
    /// Whether this is a test-only address
    pub is_test_only: bool,
}

impl Address {
    /// Creates a new address from workchain and hash part
    pub fn new(workchain: i8, hash_part: [u8; 32]) -> Self {
        Self {
            workchain,
            hash_part,
            is_bounceable: true,
            is_test_only: false,
        }
    }

    /// Parses an address from string (raw hex or user-friendly base64)
    pub fn parse(address: &str) -> Result<Self> {
        if address.contains(':') {
            Self::from_hex(address)
        } else {
            Self::from_friendly(address)
        }
    }

    /// Parses address from raw format: "workchain:hash"
    pub fn from_hex(address: &str) -> Result<Self> {
        let (workchain, hash_hex) = address
            .split_once(':')
            .ok_or_else(|| EncodingError::InvalidAddress("missing ':' separator".to_string()))?;

        let workchain = workchain
            .parse::<i8>()
            .map_err(|e| EncodingError::InvalidAddress(format!("bad workchain: {}", e)))?;

        if hash_hex.len() != 64 {
            return Err(EncodingError::InvalidAddress(
                "hash part must be 64 hex characters".to_string(),
            ));
        }

        let mut hash_part = [0u8; 32];
        hex::decode_to_slice(hash_hex, &mut hash_part)
            .map_err(|e| EncodingError::InvalidAddress(format!("bad hash part: {}", e)))?;

        Ok(Self::new(workchain, hash_part))
    }

    /// Parses address from user-friendly base64 format (url-safe or standard alphabet)
    pub fn from_friendly(address: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(address.trim_end_matches('='))
            .or_else(|_| base64::engine::general_purpose::STANDARD.decode(address))
            .map_err(|e| EncodingError::InvalidAddress(format!("bad base64: {}", e)))?;

        if decoded.len() != FRIENDLY_LEN {
            return Err(EncodingError::InvalidAddress(format!(
                "friendly address must decode to {} bytes, got {}",
                FRIENDLY_LEN,
                decoded.len()
            )));
        }

        let expected_crc = u16::from_be_bytes([decoded[34], decoded[35]]);
        let actual_crc = CRC16.checksum(&decoded[..34]);
        if expected_crc != actual_crc {
            return Err(EncodingError::InvalidAddress(format!(
                "checksum mismatch: expected {:04x}, got {:04x}",
                expected_crc, actual_crc
            )));
        }

        let mut tag = decoded[0];
        let is_test_only = tag & FLAG_TEST_ONLY != 0;
        tag &= !FLAG_TEST_ONLY;

        let is_bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            other => {
                return Err(EncodingError::InvalidAddress(format!(
                    "unknown friendly tag 0x{:02x}",
                    other
                )));
            }
        };

        let mut hash_part = [0u8; 32];
        hash_part.copy_from_slice(&decoded[2..34]);

        Ok(Self {
            workchain: decoded[1] as i8,
            hash_part,
            is_bounceable,
            is_test_only,
        })
    }

    /// Formats the address in user-friendly form with explicit flags
    pub fn to_friendly_with(&self, url_safe: bool, bounceable: bool, test_only: bool) -> String {
        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if test_only {
            tag |= FLAG_TEST_ONLY;
        }

        let mut data = Vec::with_capacity(FRIENDLY_LEN);
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.hash_part);
        data.extend_from_slice(&CRC16.checksum(&data).to_be_bytes());

        if url_safe {
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&data)
        } else {
            base64::engine::general_purpose::STANDARD.encode(&data)
        }
    }

    /// Formats the address in url-safe user-friendly form using its own flags
    pub fn to_friendly(&self) -> String {
        self.to_friendly_with(true, self.is_bounceable, self.is_test_only)
    }

    /// Converts to raw format (workchain:hash)
    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Sets the bounceable flag
    pub fn set_bounceable(&mut self, bounceable: bool) {
        self.is_bounceable = bounceable;
    }

    /// Sets the test-only flag
    pub fn set_test_only(&mut self, test_only: bool) {
        self.is_test_only = test_only;
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.workchain == other.workchain && self.hash_part == other.hash_part
    }
}

impl Eq for Address {}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.workchain.hash(state);
        self.hash_part.hash(state);
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_friendly())
    }
}

impl std::str::FromStr for Address {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_friendly())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex() {
        let addr =
            Address::from_hex("0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8")
                .unwrap();
        assert_eq!(addr.workchain, 0);
        assert_eq!(
            addr.to_hex(),
            "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8"
        );
    }

    #[test]
    fn test_address_friendly() {
        let addr_str = "EQCD39VS5jcptHL8vMjEXrzGaRcCVYto7HUn4bpAOg8xqB2N";
        let addr = Address::from_friendly(addr_str).unwrap();
        assert_eq!(addr.workchain, 0);
        assert!(addr.is_bounceable);
        assert_eq!(
            addr.to_hex(),
            "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8"
        );
        assert_eq!(addr.to_friendly(), addr_str);
    }

    #[test]
    fn test_friendly_round_trip_keeps_flags() {
        let mut addr = Address::new(-1, [0x5A; 32]);
        addr.set_bounceable(false);
        addr.set_test_only(true);

        let parsed = Address::from_friendly(&addr.to_friendly()).unwrap();
        assert_eq!(parsed, addr);
        assert!(!parsed.is_bounceable);
        assert!(parsed.is_test_only);
        assert_eq!(parsed.workchain, -1);
    }

    #[test]
    fn test_standard_alphabet_is_accepted() {
        let addr = Address::new(0, [0xFB; 32]);
        let standard = addr.to_friendly_with(false, true, false);
        assert_eq!(Address::from_friendly(&standard).unwrap(), addr);
    }

    #[test]
    fn test_bad_checksum_is_rejected() {
        let mut friendly = Address::new(0, [7; 32]).to_friendly().into_bytes();
        let last = friendly.len() - 1;
        friendly[last] = if friendly[last] == b'A' { b'B' } else { b'A' };
        let friendly = String::from_utf8(friendly).unwrap();

        assert!(matches!(
            Address::from_friendly(&friendly),
            Err(EncodingError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_zero_address_formats() {
        let zero_addr = Address::new(0, [0u8; 32]);

        assert_eq!(
            zero_addr.to_hex(),
            "0:0000000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(
            zero_addr.to_friendly_with(true, true, false),
            "EQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAM9c"
        );
        assert_eq!(
            zero_addr.to_friendly_with(true, false, false),
            "UQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAJKZ"
        );
    }

    #[test]
    fn test_equality_ignores_flags() {
        let a = Address::new(0, [1; 32]);
        let mut b = a;
        b.set_bounceable(false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_uses_friendly_form() {
        let addr = Address::new(0, [3; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_friendly()));

        let raw = format!("\"{}\"", addr.to_hex());
        let parsed: Address = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, addr);
    }
}
