//! Evaluation cache for full position scores.
//!
//! `Board::evaluate` walks close to twenty evaluation terms per call, far
//! more expensive than the incremental material/PST scores used by
//! `evaluate_simple`. Caching its result keyed on the full Zobrist hash
//! avoids recomputing it for positions reached by transposition.
//!
//! Unlike [`crate::pawn_hash::PawnHashTable`], which buckets two slots per
//! index to absorb pawn-hash collisions, this table is direct-mapped: one
//! slot per index, overwritten unconditionally on a miss. Positions churn
//! much faster than pawn structure, so a second slot buys little.

use std::sync::atomic::{AtomicU64, Ordering};

/// A single lockless slot using the XOR technique for thread-safety
/// without locks: `key_xor` stores `hash ^ score`, so a probe can detect a
/// torn read (a write racing a read) by recombining and comparing.
#[repr(C)]
struct EvalSlot {
    key_xor: AtomicU64,
    score: AtomicU64,
}

impl EvalSlot {
    fn new() -> Self {
        EvalSlot {
            key_xor: AtomicU64::new(0),
            score: AtomicU64::new(0),
        }
    }

    fn store(&self, hash: u64, score: i32) {
        let packed = score as u32 as u64;
        self.score.store(packed, Ordering::Relaxed);
        self.key_xor.store(hash ^ packed, Ordering::Relaxed);
    }

    fn probe(&self, hash: u64) -> Option<i32> {
        let key_xor = self.key_xor.load(Ordering::Relaxed);
        let packed = self.score.load(Ordering::Relaxed);

        // packed == 0 is ambiguous with an empty slot, so a stored score of
        // exactly zero is treated as a miss. Harmless: it just forces one
        // extra recompute for an otherwise-dead-even position.
        if key_xor ^ packed == hash && packed != 0 {
            Some(packed as u32 as i32)
        } else {
            None
        }
    }

    fn clear(&self) {
        self.key_xor.store(0, Ordering::Relaxed);
        self.score.store(0, Ordering::Relaxed);
    }
}

/// Thread-safe, direct-mapped evaluation cache keyed by Zobrist hash.
///
/// Can be safely shared across threads in SMP search; `probe`/`store` only
/// need `&self`.
pub struct EvaluationTable {
    slots: Vec<EvalSlot>,
    mask: usize,
}

// Safety: EvalSlot uses AtomicU64, which is Send + Sync.
unsafe impl Send for EvaluationTable {}
unsafe impl Sync for EvaluationTable {}

impl EvaluationTable {
    /// Create a new evaluation cache with the given size in kilobytes.
    #[must_use]
    pub fn new(size_kb: usize) -> Self {
        let slot_size = std::mem::size_of::<EvalSlot>();
        let mut num_slots = (size_kb * 1024) / slot_size;

        num_slots = num_slots.next_power_of_two() / 2;
        if num_slots == 0 {
            num_slots = 1024;
        }

        let mut slots = Vec::with_capacity(num_slots);
        for _ in 0..num_slots {
            slots.push(EvalSlot::new());
        }

        EvaluationTable {
            slots,
            mask: num_slots - 1,
        }
    }

    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Probe the cache for a previously computed score.
    #[must_use]
    pub fn probe(&self, hash: u64) -> Option<i32> {
        self.slots[self.index(hash)].probe(hash)
    }

    /// Store a computed score, overwriting whatever occupied the slot.
    pub fn store(&self, hash: u64, score: i32) {
        self.slots[self.index(hash)].store(hash, score);
    }

    /// Clear all entries, e.g. on `ucinewgame`.
    pub fn clear(&self) {
        for slot in &self.slots {
            slot.clear();
        }
    }
}

impl Default for EvaluationTable {
    fn default() -> Self {
        Self::new(1024) // 1 MB default
    }
}

impl std::fmt::Debug for EvaluationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationTable")
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_and_probe() {
        let table = EvaluationTable::new(64);
        let hash = 0x123456789ABCDEF0;

        table.store(hash, 150);

        assert_eq!(table.probe(hash), Some(150));
    }

    #[test]
    fn test_negative_score_roundtrip() {
        let table = EvaluationTable::new(64);
        let hash = 0xDEADBEEFCAFEBABE;

        table.store(hash, -327);

        assert_eq!(table.probe(hash), Some(-327));
    }

    #[test]
    fn test_no_false_positives() {
        let table = EvaluationTable::new(64);
        let hash1 = 0x123456789ABCDEF0;
        let hash2 = 0xFEDCBA9876543210;

        table.store(hash1, 100);

        assert!(table.probe(hash2).is_none());
    }

    #[test]
    fn test_direct_mapped_overwrite() {
        // Two hashes colliding on the same index: the second store wins,
        // unlike the bucketed pawn hash table.
        let table = EvaluationTable::new(64);
        let mask = table.mask as u64;
        let hash1 = 0;
        let hash2 = mask + 1; // same index as hash1, different key

        table.store(hash1, 11);
        table.store(hash2, 22);

        assert!(table.probe(hash1).is_none());
        assert_eq!(table.probe(hash2), Some(22));
    }

    #[test]
    fn test_clear() {
        let table = EvaluationTable::new(64);
        let hash = 0x123456789ABCDEF0;

        table.store(hash, 100);
        assert!(table.probe(hash).is_some());

        table.clear();
        assert!(table.probe(hash).is_none());
    }
}
