//! Time-Sorted Identifiers
//!
//! 64-bit ids built from a millisecond timestamp and a per-process sequence,
//! rendered as 13 characters of Crockford Base32. Newer ids sort after older
//! ones lexicographically, which keeps creation-ordered index scans cheap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Crockford Base32 alphabet (no I, L, O, U).
const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Bits reserved for the sequence tail below the timestamp.
const SEQUENCE_BITS: u64 = 22;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

static SEQUENCE: OnceLock<AtomicU64> = OnceLock::new();

pub struct TsidGenerator;

impl TsidGenerator {
    /// Generate a new 13-character TSID.
    pub fn generate() -> String {
        let millis = chrono::Utc::now().timestamp_millis() as u64;
        let seq = SEQUENCE
            .get_or_init(|| AtomicU64::new(rand::random::<u64>() & SEQUENCE_MASK))
            .fetch_add(1, Ordering::Relaxed);

        let value = (millis << SEQUENCE_BITS) | (seq & SEQUENCE_MASK);
        Self::encode(value)
    }

    /// Encode a 64-bit value as 13 Crockford Base32 characters,
    /// most significant bits first.
    fn encode(value: u64) -> String {
        let mut out = String::with_capacity(13);
        for i in (0..13).rev() {
            let index = ((value >> (i * 5)) & 0x1F) as usize;
            out.push(ALPHABET[index] as char);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_tsid_format() {
        let id = TsidGenerator::generate();
        assert_eq!(id.len(), 13);
        assert!(id.chars().all(|c| {
            matches!(c, '0'..='9' | 'A'..='H' | 'J'..='K' | 'M'..='N' | 'P'..='T' | 'V'..='Z')
        }));
    }

    #[test]
    fn test_tsid_uniqueness() {
        let ids: HashSet<String> = (0..1000).map(|_| TsidGenerator::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_tsid_sortability() {
        let id1 = TsidGenerator::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TsidGenerator::generate();
        assert!(id2 > id1, "id2 ({}) should sort after id1 ({})", id2, id1);
    }
}
