use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

/// Hash de 256 bits usado para identificar blocos, transações e contas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash256([u8; 32]);

impl Hash256 {
    /// Creates a zeroed hash
    #[must_use]
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Creates a hash from a 32-byte array
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes of the hash
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Computes the SHA3-256 digest of the provided data
    #[must_use]
    pub fn sha3_256(data: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(data);
        let result = hasher.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        Self(hash)
    }

    /// Checks if the hash satisfies the specified difficulty
    /// (number of leading zero bits)
    ///
    /// Equivalente ao teste por bytes: todos os bytes em `[0, diff/8)` nulos
    /// e, se `diff % 8 != 0`, `hash[diff/8] < 1 << (8 - diff % 8)`.
    #[must_use]
    pub fn meets_difficulty(&self, difficulty: u8) -> bool {
        self.leading_zeros() >= u32::from(difficulty)
    }

    /// Counts the number of leading zero bits in the hash
    #[must_use]
    pub fn leading_zeros(&self) -> u32 {
        let mut zeros = 0;
        for &byte in &self.0 {
            if byte == 0 {
                zeros += 8;
            } else {
                zeros += byte.leading_zeros();
                break;
            }
        }
        zeros
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_creation_and_display() {
        let hash = Hash256::zero();
        assert_eq!(
            hash.to_string(),
            "0000000000000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_sha3_256_hashing() {
        let data = b"vintem";
        let hash = Hash256::sha3_256(data);
        // Dados válidos devem produzir hash não-zero
        assert_ne!(hash, Hash256::zero());

        // Hash deve ser determinístico
        assert_eq!(hash, Hash256::sha3_256(data));
    }

    #[test]
    fn test_difficulty_check() {
        let mut bytes = [0u8; 32];
        bytes[4] = 1;
        let easy_hash = Hash256::from_bytes(bytes);
        assert!(easy_hash.meets_difficulty(20));
        assert!(!easy_hash.meets_difficulty(40));
    }

    #[test]
    fn test_difficulty_boundary_byte() {
        // Dificuldade 9: byte 0 nulo e byte 1 < 0x80
        let mut valid = [0xFFu8; 32];
        valid[0] = 0x00;
        valid[1] = 0x7F;
        assert!(Hash256::from_bytes(valid).meets_difficulty(9));

        let mut invalid = [0xFFu8; 32];
        invalid[0] = 0x00;
        invalid[1] = 0x80;
        assert!(!Hash256::from_bytes(invalid).meets_difficulty(9));
    }

    #[test]
    fn test_leading_zeros_count() {
        let mut bytes = [0u8; 32];
        bytes[3] = 128;
        let hash = Hash256::from_bytes(bytes);
        // 3 bytes de zeros (24 bits); o quarto byte começa com bit 1
        assert_eq!(hash.leading_zeros(), 24);
    }
}
