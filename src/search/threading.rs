//! Shared state for parallel (Lazy SMP) search.
//!
//! Workers never share a `Position` or move orderer. What they do share
//! lives here: a transposition cache behind the [`TranspositionCache`]
//! trait, and [`SharedSearchState`] carrying the stop flag, the aggregated
//! node counter and the search budgets. [`SearchContext`] bundles both and
//! is owned by whoever drives the engine; nothing here is global.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
    Arc, Mutex,
};
use std::time::{Duration, Instant};

use log::info;

use crate::moves::move_descriptions::Move;
use crate::search::transposition_table::{
    should_replace, slot_count_for_bytes, Bound, TTEntry, TTStats, TranspositionTable, MATE,
    MAX_PLY,
};

/// Cache operations available to concurrent workers.
///
/// Implementations must tolerate concurrent `probe`/`store` from any number
/// of threads. A racing store may be lost or read back as a miss, but a probe
/// never returns an entry that was not stored for the probed key.
pub trait TranspositionCache: Send + Sync {
    fn probe(&self, key: u64) -> Option<TTEntry>;
    fn store(&self, entry: TTEntry);
    /// Advance the age once per root search.
    fn new_search(&self);
    fn clear(&self);
    /// Per-mille of sampled slots written during the current search.
    fn hashfull(&self) -> u32;
    fn stats(&self) -> TTStats;
    fn capacity(&self) -> usize;
}

#[derive(Debug, Default)]
struct AtomicTTStats {
    probes: AtomicU64,
    hits: AtomicU64,
    stores: AtomicU64,
}

impl AtomicTTStats {
    fn snapshot(&self) -> TTStats {
        TTStats {
            probes: self.probes.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.probes.store(0, Ordering::Relaxed);
        self.hits.store(0, Ordering::Relaxed);
        self.stores.store(0, Ordering::Relaxed);
    }
}

/// Transposition cache split into a fixed number of mutex-guarded stripes.
///
/// The stripe is picked from the high half of the key and the slot inside a
/// stripe from the low bits, so the lock count never grows with the table.
#[derive(Debug)]
pub struct StripedTranspositionTable {
    stripes: Vec<Mutex<TranspositionTable>>,
}

impl StripedTranspositionTable {
    pub const DEFAULT_STRIPES: usize = 64;

    pub fn new_with_mb(total_mb: usize, stripe_count: usize) -> Self {
        let stripes = stripe_count.max(1);
        let bytes_per_stripe = (total_mb.max(1) * 1024 * 1024) / stripes;
        let mut vec = Vec::with_capacity(stripes);
        for _ in 0..stripes {
            vec.push(Mutex::new(TranspositionTable::new_with_bytes(bytes_per_stripe)));
        }
        Self { stripes: vec }
    }

    #[inline]
    fn stripe(&self, key: u64) -> &Mutex<TranspositionTable> {
        &self.stripes[((key >> 32) as usize) % self.stripes.len()]
    }

    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }
}

impl TranspositionCache for StripedTranspositionTable {
    fn probe(&self, key: u64) -> Option<TTEntry> {
        let Ok(mut guard) = self.stripe(key).lock() else {
            return None;
        };
        guard.probe(key)
    }

    fn store(&self, entry: TTEntry) {
        if let Ok(mut guard) = self.stripe(entry.key).lock() {
            guard.store(entry);
        }
    }

    fn new_search(&self) {
        for stripe in &self.stripes {
            if let Ok(mut guard) = stripe.lock() {
                guard.new_search();
            }
        }
    }

    fn clear(&self) {
        for stripe in &self.stripes {
            if let Ok(mut guard) = stripe.lock() {
                guard.clear();
            }
        }
    }

    fn hashfull(&self) -> u32 {
        let samples: Vec<u32> = self
            .stripes
            .iter()
            .filter_map(|s| s.lock().ok().map(|g| g.hashfull()))
            .collect();
        if samples.is_empty() {
            return 0;
        }
        samples.iter().sum::<u32>() / samples.len() as u32
    }

    fn stats(&self) -> TTStats {
        let mut merged = TTStats::default();
        for stripe in &self.stripes {
            if let Ok(guard) = stripe.lock() {
                merged.merge(guard.stats());
            }
        }
        merged
    }

    fn capacity(&self) -> usize {
        self.stripes
            .iter()
            .filter_map(|s| s.lock().ok().map(|g| g.len()))
            .sum()
    }
}

// Layout of the lockless data word.
const MOVE_MASK: u64 = (1 << 26) - 1;
const SCORE_SHIFT: u32 = 26;
const DEPTH_SHIFT: u32 = 42;
const BOUND_SHIFT: u32 = 50;
const AGE_SHIFT: u32 = 52;
const RESERVED_SHIFT: u32 = 60;

#[derive(Debug, Default)]
struct LocklessSlot {
    key_xor_data: AtomicU64,
    data: AtomicU64,
}

/// Lock-free transposition cache.
///
/// Each slot is two relaxed atomic words: `key ^ data` and `data`, where
/// `data` packs move (bits 0-25), score (26-41, two's complement), depth
/// (42-49), bound tag (50-51, zero means empty) and age (52-59). Bits 60-63
/// are always zero.
///
/// A writer racing another writer can leave the words from different
/// stores. XOR-ing them back then yields a key that almost never matches,
/// and the decoded fields are checked for self-consistency as well, so a torn
/// slot reads as a miss.
#[derive(Debug)]
pub struct LocklessTranspositionTable {
    slots: Box<[LocklessSlot]>,
    mask: usize,
    age: AtomicU8,
    stats: AtomicTTStats,
}

impl LocklessTranspositionTable {
    pub fn new_with_mb(size_mb: usize) -> Self {
        let bytes = size_mb.max(1) * 1024 * 1024;
        let count = slot_count_for_bytes(bytes, std::mem::size_of::<LocklessSlot>());
        let slots: Vec<LocklessSlot> = (0..count).map(|_| LocklessSlot::default()).collect();
        Self {
            slots: slots.into_boxed_slice(),
            mask: count - 1,
            age: AtomicU8::new(0),
            stats: AtomicTTStats::default(),
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    /// Read one slot. The recovered key is `word0 ^ data`; `None` when the
    /// slot is empty or its fields do not decode to a plausible entry.
    fn load_slot(&self, index: usize) -> Option<(TTEntry, u8)> {
        let slot = &self.slots[index];
        let data = slot.data.load(Ordering::Relaxed);
        let key = slot.key_xor_data.load(Ordering::Relaxed) ^ data;

        if data >> RESERVED_SHIFT != 0 {
            return None;
        }
        let bound = match (data >> BOUND_SHIFT) & 0x3 {
            1 => Bound::Exact,
            2 => Bound::Lower,
            3 => Bound::Upper,
            _ => return None,
        };
        let score = i32::from(((data >> SCORE_SHIFT) & 0xFFFF) as u16 as i16);
        let depth = ((data >> DEPTH_SHIFT) & 0xFF) as u8;
        if score.abs() > MATE || usize::from(depth) > MAX_PLY {
            return None;
        }
        let packed_move = (data & MOVE_MASK) as u32;
        let best_move = match Move::from_packed(packed_move)? {
            mv if mv.is_null() => None,
            mv => Some(mv),
        };
        let age = ((data >> AGE_SHIFT) & 0xFF) as u8;

        Some((
            TTEntry {
                key,
                depth,
                score,
                bound,
                best_move,
            },
            age,
        ))
    }

    fn store_slot(&self, index: usize, entry: &TTEntry, age: u8) {
        let bound_tag: u64 = match entry.bound {
            Bound::Exact => 1,
            Bound::Lower => 2,
            Bound::Upper => 3,
        };
        let score = entry.score.clamp(-MATE, MATE) as i16 as u16;
        let depth = entry.depth.min(MAX_PLY as u8);
        let data = (u64::from(entry.best_move.map_or(0, Move::to_packed)) & MOVE_MASK)
            | (u64::from(score) << SCORE_SHIFT)
            | (u64::from(depth) << DEPTH_SHIFT)
            | (bound_tag << BOUND_SHIFT)
            | (u64::from(age) << AGE_SHIFT);

        let slot = &self.slots[index];
        slot.key_xor_data.store(entry.key ^ data, Ordering::Relaxed);
        slot.data.store(data, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn corrupt_data_word(&self, key: u64, xor: u64) {
        let slot = &self.slots[self.index(key)];
        let data = slot.data.load(Ordering::Relaxed);
        slot.data.store(data ^ xor, Ordering::Relaxed);
    }
}

impl TranspositionCache for LocklessTranspositionTable {
    fn probe(&self, key: u64) -> Option<TTEntry> {
        self.stats.probes.fetch_add(1, Ordering::Relaxed);
        let hit = self
            .load_slot(self.index(key))
            .map(|(entry, _)| entry)
            .filter(|entry| entry.key == key);
        if hit.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    fn store(&self, entry: TTEntry) {
        self.stats.stores.fetch_add(1, Ordering::Relaxed);
        let index = self.index(entry.key);
        let current_age = self.age.load(Ordering::Relaxed);
        let existing = self
            .load_slot(index)
            .map(|(old, age)| (old.key, old.depth, age));
        if should_replace(existing, entry.key, entry.depth, current_age) {
            self.store_slot(index, &entry, current_age);
        }
    }

    fn new_search(&self) {
        self.age.fetch_add(1, Ordering::Relaxed);
    }

    fn clear(&self) {
        for slot in self.slots.iter() {
            slot.key_xor_data.store(0, Ordering::Relaxed);
            slot.data.store(0, Ordering::Relaxed);
        }
        self.age.store(0, Ordering::Relaxed);
        self.stats.reset();
    }

    fn hashfull(&self) -> u32 {
        let sample = self.slots.len().min(1_000);
        let current_age = self.age.load(Ordering::Relaxed);
        let used = (0..sample)
            .filter(|&i| matches!(self.load_slot(i), Some((_, age)) if age == current_age))
            .count();
        (used * 1000 / sample) as u32
    }

    fn stats(&self) -> TTStats {
        self.stats.snapshot()
    }

    fn capacity(&self) -> usize {
        self.slots.len()
    }
}

/// Which shared cache a [`SearchContext`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheKind {
    #[default]
    Striped,
    Lockless,
}

/// Engine-level resources, adjustable through UCI `setoption`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub hash_mb: usize,
    pub threads: usize,
    pub cache_kind: CacheKind,
    pub lock_stripes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: 16,
            threads: 1,
            cache_kind: CacheKind::Striped,
            lock_stripes: StripedTranspositionTable::DEFAULT_STRIPES,
        }
    }
}

impl EngineConfig {
    #[inline]
    pub fn normalized_threads(self) -> usize {
        self.threads.max(1)
    }

    #[inline]
    pub fn helper_threads(self) -> usize {
        self.normalized_threads() - 1
    }
}

/// Cancellation and accounting shared by every worker of a search.
#[derive(Debug)]
pub struct SharedSearchState {
    /// External stop request; stays set until [`SharedSearchState::reset_stop`].
    stop: AtomicBool,
    /// Internal halt raised when any worker or the coordinator finishes.
    halt: AtomicBool,
    nodes_visited: AtomicU64,
    node_budget: AtomicU64, // 0 means unlimited
    deadline: Mutex<Option<Instant>>,
}

impl SharedSearchState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stop: AtomicBool::new(false),
            halt: AtomicBool::new(false),
            nodes_visited: AtomicU64::new(0),
            node_budget: AtomicU64::new(0),
            deadline: Mutex::new(None),
        })
    }

    #[inline]
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset_stop(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    #[inline]
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn halt(&self) {
        self.halt.store(true, Ordering::Relaxed);
    }

    /// True once the search must unwind for any reason.
    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.halt.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes_visited.load(Ordering::Relaxed)
    }

    /// Reset counters and budgets for a new root search. The external stop
    /// flag is left alone so a stop issued before the search still applies.
    pub fn begin_search(&self, node_budget: Option<u64>, movetime: Option<Duration>) {
        self.halt.store(false, Ordering::Relaxed);
        self.nodes_visited.store(0, Ordering::Relaxed);
        self.node_budget
            .store(node_budget.unwrap_or(0), Ordering::Relaxed);
        if let Ok(mut guard) = self.deadline.lock() {
            *guard = movetime.map(|t| Instant::now() + t);
        }
    }

    /// Adds `n` to the aggregated counter and returns true if any budget is
    /// exhausted.
    #[inline]
    pub fn bump_nodes_and_check_budget(&self, n: u64) -> bool {
        let new_nodes = self.nodes_visited.fetch_add(n, Ordering::Relaxed) + n;
        self.budget_exhausted_at(new_nodes)
    }

    #[inline]
    pub fn budget_exhausted(&self) -> bool {
        self.budget_exhausted_at(self.nodes())
    }

    fn budget_exhausted_at(&self, nodes: u64) -> bool {
        let limit = self.node_budget.load(Ordering::Relaxed);
        if limit != 0 && nodes >= limit {
            return true;
        }
        self.deadline_passed()
    }

    pub fn deadline_passed(&self) -> bool {
        let Ok(guard) = self.deadline.lock() else {
            return false;
        };
        guard.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Everything a search needs besides the position: the shared cache, the
/// shared control block, and the configuration they were built from.
///
/// Cloning is cheap and yields a handle to the same cache and stop flag, so
/// a front-end can keep one clone to call [`SearchContext::stop`] while
/// another drives the search.
#[derive(Clone)]
pub struct SearchContext {
    config: EngineConfig,
    cache: Arc<dyn TranspositionCache>,
    shared: Arc<SharedSearchState>,
}

impl SearchContext {
    pub fn new(config: EngineConfig) -> Self {
        let cache: Arc<dyn TranspositionCache> = match config.cache_kind {
            CacheKind::Striped => Arc::new(StripedTranspositionTable::new_with_mb(
                config.hash_mb,
                config.lock_stripes,
            )),
            CacheKind::Lockless => Arc::new(LocklessTranspositionTable::new_with_mb(config.hash_mb)),
        };
        info!(
            "transposition cache: {:?}, {} MB, {} slots, {} thread(s)",
            config.cache_kind,
            config.hash_mb,
            cache.capacity(),
            config.normalized_threads()
        );
        Self {
            config,
            cache,
            shared: SharedSearchState::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    #[inline]
    pub fn cache(&self) -> &dyn TranspositionCache {
        self.cache.as_ref()
    }

    #[inline]
    pub fn shared(&self) -> &SharedSearchState {
        &self.shared
    }

    /// Ask any running search on this context to return as soon as possible.
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    pub fn reset_stop(&self) {
        self.shared.reset_stop();
    }

    /// Forget everything learned from previous games.
    pub fn new_game(&self) {
        self.cache.clear();
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for SearchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchContext")
            .field("config", &self.config)
            .field("capacity", &self.cache.capacity())
            .field("shared", &self.shared)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_types::{PieceKind, E1, E8, G1};
    use crate::moves::move_descriptions::MoveFlag;
    use std::thread;

    fn sample_entry(key: u64) -> TTEntry {
        TTEntry {
            key,
            depth: 7,
            score: -MATE + 12,
            bound: Bound::Lower,
            best_move: Some(Move::new(E1, G1, PieceKind::King, None, None, MoveFlag::Castle)),
        }
    }

    fn round_trips(cache: &dyn TranspositionCache) {
        let entry = sample_entry(0xDEAD_BEEF_1234_5678);
        cache.store(entry);
        assert_eq!(cache.probe(entry.key), Some(entry));
        assert_eq!(cache.probe(entry.key ^ 1), None);

        let quiet = TTEntry {
            key: 42,
            depth: 0,
            score: 17,
            bound: Bound::Exact,
            best_move: None,
        };
        cache.store(quiet);
        assert_eq!(cache.probe(42), Some(quiet));
        assert!(cache.stats().hits >= 2);

        cache.clear();
        assert_eq!(cache.probe(entry.key), None);
    }

    #[test]
    fn striped_cache_round_trips() {
        let tt = StripedTranspositionTable::new_with_mb(1, 8);
        assert_eq!(tt.stripe_count(), 8);
        round_trips(&tt);
    }

    #[test]
    fn lockless_cache_round_trips() {
        let tt = LocklessTranspositionTable::new_with_mb(1);
        assert!(tt.capacity().is_power_of_two());
        round_trips(&tt);
    }

    #[test]
    fn corrupted_lockless_slot_reads_as_miss() {
        let tt = LocklessTranspositionTable::new_with_mb(1);
        let entry = sample_entry(0x0123_4567_89AB_CDEF);

        // Flipping a score bit breaks the key check.
        tt.store(entry);
        tt.corrupt_data_word(entry.key, 1 << (SCORE_SHIFT + 3));
        assert_eq!(tt.probe(entry.key), None);

        // A reserved bit marks the word as not ours even before the key check.
        tt.store(entry);
        assert_eq!(tt.probe(entry.key), Some(entry));
        tt.corrupt_data_word(entry.key, 1 << RESERVED_SHIFT);
        assert_eq!(tt.probe(entry.key), None);
    }

    #[test]
    fn lockless_replacement_follows_age_and_depth() {
        let tt = LocklessTranspositionTable::new_with_mb(1);
        let deep = sample_entry(5);
        tt.store(deep);
        let shallow_collision = TTEntry {
            key: 5 + tt.capacity() as u64,
            depth: 1,
            ..deep
        };
        tt.store(shallow_collision);
        assert_eq!(tt.probe(5), Some(deep));

        tt.new_search();
        tt.store(shallow_collision);
        assert_eq!(tt.probe(5), None);
        assert_eq!(tt.probe(shallow_collision.key), Some(shallow_collision));
        assert_eq!(tt.hashfull(), 1);
    }

    #[test]
    fn concurrent_writers_never_yield_foreign_entries() {
        let tt = LocklessTranspositionTable::new_with_mb(1);
        let slots = tt.capacity() as u64;
        thread::scope(|scope| {
            for t in 0..4u64 {
                let tt = &tt;
                scope.spawn(move || {
                    for i in 0..20_000u64 {
                        // Keys collide on a handful of slots.
                        let key = (i % 8) + slots * (t * 100_000 + i);
                        tt.store(TTEntry {
                            key,
                            depth: (i % 32) as u8,
                            score: (key % 2_000) as i32,
                            bound: Bound::Exact,
                            best_move: None,
                        });
                        if let Some(hit) = tt.probe(key) {
                            assert_eq!(hit.key, key);
                            assert_eq!(hit.score, (key % 2_000) as i32);
                        }
                    }
                });
            }
        });
    }

    #[test]
    fn shared_state_stop_and_budget() {
        let state = SharedSearchState::new();
        assert!(!state.should_stop());
        state.request_stop();
        assert!(state.should_stop() && state.stop_requested());
        state.begin_search(None, None);
        assert!(state.should_stop(), "begin_search keeps an external stop");
        state.reset_stop();
        assert!(!state.should_stop());

        state.begin_search(Some(5), None);
        assert!(!state.bump_nodes_and_check_budget(4));
        assert!(state.bump_nodes_and_check_budget(1));
        assert_eq!(state.nodes(), 5);

        state.begin_search(None, Some(Duration::ZERO));
        assert!(state.deadline_passed());
        state.halt();
        assert!(state.should_stop());
        state.begin_search(None, None);
        assert!(!state.should_stop() && !state.budget_exhausted());
    }

    #[test]
    fn context_clones_share_stop_and_cache() {
        let ctx = SearchContext::new(EngineConfig {
            hash_mb: 1,
            threads: 0,
            cache_kind: CacheKind::Lockless,
            lock_stripes: 4,
        });
        assert_eq!(ctx.config().normalized_threads(), 1);
        assert_eq!(ctx.config().helper_threads(), 0);

        let handle = ctx.clone();
        handle.cache().store(sample_entry(E8 as u64));
        assert!(ctx.cache().probe(E8 as u64).is_some());
        handle.stop();
        assert!(ctx.shared().stop_requested());
        ctx.reset_stop();
        assert!(!handle.shared().stop_requested());
        ctx.new_game();
        assert!(handle.cache().probe(E8 as u64).is_none());
    }
}
