//! The 20-byte content address used for every object and ref.
use std::fmt;

use crate::num;

/// A git object hash: 20 raw bytes, rendered as 40 lowercase hex characters.
///
/// Both representations must round-trip: [`Hash::from_raw`] / [`Hash::raw`]
/// for the 20-byte form embedded in tree entries, [`Hash::from_hex`] /
/// the `Display` impl for the hex form used everywhere else.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; 20]);

impl Hash {
    /// Decodes a hash from its 40-character hex representation.
    pub fn from_hex(s: &str) -> Option<Hash> {
        let decoded = num::parse_hex(s.as_bytes())?;
        if decoded.len() != 20 {
            return None;
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&decoded);
        Some(Hash(raw))
    }

    /// Wraps 20 raw bytes (as embedded in a tree entry) as a `Hash`.
    pub fn from_raw(raw: [u8; 20]) -> Hash {
        Hash(raw)
    }

    /// The 20 raw bytes of this hash.
    pub fn raw(&self) -> &[u8; 20] {
        &self.0
    }

    /// The 40-character lowercase hex rendering of this hash.
    pub fn to_hex(&self) -> String {
        format!("{}", self)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Hash({})", self)
    }
}

#[cfg(test)]
mod test {
    use super::Hash;

    #[test]
    fn hex_round_trips_through_raw() {
        let hex = "94546d68dc6002b85cc2d7df077c7c6bb080abb0";
        let hash = Hash::from_hex(hex).unwrap();
        assert_eq!(hash.to_hex(), hex);
        assert_eq!(Hash::from_raw(*hash.raw()), hash);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Hash::from_hex("abcd").is_none());
        assert!(Hash::from_hex(&"ab".repeat(21)).is_none());
    }

    #[test]
    fn rejects_non_hex() {
        assert!(Hash::from_hex(&"zz".repeat(20)).is_none());
    }

    #[test]
    fn display_matches_from_hex_input() {
        assert_eq!(
            format!("{}", Hash(*b"abababababababababac")),
            "6162616261626162616261626162616261626163"
        );
    }
}
