// Issue identifier
// 12-byte object ids rendered as 24 lowercase hex digits

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// Random bytes shared by every id minted in this process
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

/// Per-process counter, seeded randomly, 24 bits used
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// Opaque unique identifier assigned by the store on insert.
///
/// Layout: 4-byte big-endian creation second, 5 process-random bytes,
/// 3-byte counter. Ids minted later in the same process sort after
/// earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IssueId([u8; 12]);

impl IssueId {
    /// Mint a fresh identifier
    pub fn generate() -> Self {
        let secs = u32::try_from(Utc::now().timestamp()).unwrap_or(u32::MAX);
        let unique = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let count = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen_range(0..=COUNTER_MASK)))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse the 24-digit hex form. Anything else is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        if text.len() != 24 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        let mut bytes = [0u8; 12];
        for (slot, pair) in bytes.iter_mut().zip(text.as_bytes().chunks_exact(2)) {
            let digits = std::str::from_utf8(pair).ok()?;
            *slot = u8::from_str_radix(digits, 16).ok()?;
        }
        Some(Self(bytes))
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for IssueId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid issue id: {value}"))
    }
}

impl From<IssueId> for String {
    fn from(id: IssueId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<IssueId> = (0..1000).map(|_| IssueId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_display_is_24_hex_digits() {
        let text = IssueId::generate().to_string();
        assert_eq!(text.len(), 24);
        assert!(text.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(text, text.to_lowercase());
    }

    #[test]
    fn test_parse_accepts_display_form() {
        let id = IssueId::generate();
        assert_eq!(IssueId::parse(&id.to_string()), Some(id));
        assert_eq!(
            IssueId::parse("65A1B2C3D4E5F60718293A4B"),
            IssueId::parse("65a1b2c3d4e5f60718293a4b")
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(IssueId::parse(""), None);
        assert_eq!(IssueId::parse("not-an-id"), None);
        assert_eq!(IssueId::parse("65a1b2c3d4e5f60718293a4"), None);
        assert_eq!(IssueId::parse("65a1b2c3d4e5f60718293a4bc"), None);
        assert_eq!(IssueId::parse("+5a1b2c3d4e5f60718293a4b"), None);
        assert_eq!(IssueId::parse("zza1b2c3d4e5f60718293a4b"), None);
    }

    #[test]
    fn test_serde_uses_hex_string() {
        let id = IssueId::parse("65a1b2c3d4e5f60718293a4b").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""65a1b2c3d4e5f60718293a4b""#);
        let back: IssueId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<IssueId>(r#""bogus""#).is_err());
    }
}
