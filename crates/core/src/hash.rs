//! Blake3 digests for blocks and proof-of-work guesses.

use std::fmt;

/// A 256-bit blake3 digest.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Lowercase hex, 64 chars, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Number of leading `0` characters in [`Hash::to_hex`].
    ///
    /// Counted on nibbles so the mining loop never allocates.
    pub fn leading_zero_nibbles(&self) -> usize {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte >> 4 == 0 {
                count += 1;
            }
            break;
        }
        count
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Blake3 digest of `data`.
pub fn hash(data: &[u8]) -> Hash {
    Hash(blake3::hash(data).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zero_prefix(h: &Hash) -> usize {
        h.to_hex().chars().take_while(|c| *c == '0').count()
    }

    #[test]
    fn test_same_input_same_digest() {
        assert_eq!(hash(b"100"), hash(b"100"));
        assert_ne!(hash(b"100"), hash(b"101"));
    }

    #[test]
    fn test_display_is_hex() {
        let shown = hash(b"block").to_string();
        assert_eq!(shown.len(), 64);
        assert!(shown.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_leading_zero_nibbles() {
        let mut bytes = [0xffu8; 32];
        bytes[0] = 0x00;
        bytes[1] = 0x0a;
        assert_eq!(Hash(bytes).leading_zero_nibbles(), 3);
        assert_eq!(Hash([0u8; 32]).leading_zero_nibbles(), 64);
        assert_eq!(Hash([0xf0; 32]).leading_zero_nibbles(), 0);
        assert_eq!(Hash([0x01; 32]).leading_zero_nibbles(), 1);
    }

    #[test]
    fn test_leading_zero_nibbles_agrees_with_hex() {
        for n in 0..2000u32 {
            let h = hash(&n.to_le_bytes());
            assert_eq!(h.leading_zero_nibbles(), zero_prefix(&h));
        }
    }
}
