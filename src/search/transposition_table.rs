//! Fixed-size transposition table keyed by Zobrist hash.
//!
//! Direct-mapped (`hash & mask`) with depth-preferred replacement and
//! search-age eviction. This is the single-threaded table; the shared caches
//! in [`crate::search::threading`] reuse its entry type and replacement rule.

use crate::moves::move_descriptions::Move;

/// Score of a mate delivered at the root. A mate `p` plies away scores
/// `MATE - p`.
pub const MATE: i32 = 30_000;

/// Scores at or beyond this magnitude encode a forced mate.
pub const MATE_BOUND: i32 = MATE - 1_000;

/// Maximum search ply (and PV length).
pub const MAX_PLY: usize = 64;

/// Number of leading slots sampled by `hashfull`.
const HASHFULL_SAMPLE: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    pub key: u64,
    pub depth: u8,
    pub score: i32,
    pub bound: Bound,
    pub best_move: Option<Move>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TTStats {
    pub probes: u64,
    pub hits: u64,
    pub stores: u64,
}

impl TTStats {
    pub fn merge(&mut self, rhs: TTStats) {
        self.probes += rhs.probes;
        self.hits += rhs.hits;
        self.stores += rhs.stores;
    }
}

#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_BOUND
}

/// Re-bias a mate score from "distance from root" to "distance from this node".
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

/// Inverse of [`score_to_tt`] for a probe at `ply`.
#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

/// Replacement rule shared by every table flavour: overwrite an empty slot,
/// the same position, an equal-or-shallower entry, or one from an older search.
#[inline]
pub(crate) fn should_replace(
    existing: Option<(u64, u8, u8)>,
    key: u64,
    depth: u8,
    current_age: u8,
) -> bool {
    match existing {
        None => true,
        Some((existing_key, existing_depth, existing_age)) => {
            existing_key == key || existing_depth <= depth || existing_age != current_age
        }
    }
}

/// Slot count for a byte budget: the largest power of two that fits, at least 1.
#[inline]
pub(crate) fn slot_count_for_bytes(bytes: usize, slot_size: usize) -> usize {
    let raw = (bytes / slot_size.max(1)).max(1);
    1usize << (usize::BITS - 1 - raw.leading_zeros())
}

#[derive(Debug, Clone, Copy, Default)]
struct TTSlot {
    entry: Option<TTEntry>,
    age: u8,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    slots: Vec<TTSlot>,
    mask: usize,
    current_age: u8,
    stats: TTStats,
}

impl TranspositionTable {
    pub fn new_with_mb(size_mb: usize) -> Self {
        Self::new_with_bytes(size_mb.max(1) * 1024 * 1024)
    }

    pub fn new_with_bytes(bytes: usize) -> Self {
        let count = slot_count_for_bytes(bytes, std::mem::size_of::<TTSlot>());
        Self {
            slots: vec![TTSlot::default(); count],
            mask: count - 1,
            current_age: 0,
            stats: TTStats::default(),
        }
    }

    /// Advance the age once per root search.
    #[inline]
    pub fn new_search(&mut self) {
        self.current_age = self.current_age.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.slots.fill(TTSlot::default());
        self.current_age = 0;
        self.stats = TTStats::default();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> TTStats {
        self.stats
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn probe(&mut self, key: u64) -> Option<TTEntry> {
        self.stats.probes += 1;
        let hit = self.slots[self.index(key)].entry.filter(|e| e.key == key);
        if hit.is_some() {
            self.stats.hits += 1;
        }
        hit
    }

    pub fn store(&mut self, entry: TTEntry) {
        self.stats.stores += 1;
        let idx = self.index(entry.key);
        let slot = &mut self.slots[idx];
        let existing = slot.entry.map(|e| (e.key, e.depth, slot.age));
        if should_replace(existing, entry.key, entry.depth, self.current_age) {
            *slot = TTSlot {
                entry: Some(entry),
                age: self.current_age,
            };
        }
    }

    /// Per-mille of sampled slots written during the current search.
    pub fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(HASHFULL_SAMPLE);
        let used = self.slots[..sample]
            .iter()
            .filter(|s| s.entry.is_some() && s.age == self.current_age)
            .count();
        (used * 1000 / sample) as u32
    }
}
