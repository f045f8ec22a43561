//! Iterative deepening search with negamax alpha-beta pruning and Lazy SMP.
//!
//! Search features:
//! - Principal Variation Search with fail-soft bounds.
//! - Transposition-table cutoffs (non-PV nodes) and hash-move ordering.
//! - Null-move pruning with a verification search at high depth.
//! - Late Move Reductions with re-search on fail-high.
//! - Check and single-reply extensions.
//! - Mate-distance pruning.
//! - Quiescence over captures and promotions, evasions when in check, and
//!   quiet checks at the first quiescence ply outside null-move subtrees.
//!
//! Parallelism is Lazy SMP: every worker runs the same iterative deepening
//! loop on its own copy of the root position and shares only the
//! transposition cache, the control block in [`SearchContext`] and a
//! [`SharedBest`] record. The calling thread coordinates.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use arrayvec::ArrayVec;
use log::{debug, info, trace};

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_generator::{
    generate_legal_captures, generate_legal_moves, gives_check,
};
use crate::moves::move_descriptions::{Move, MoveList};
use crate::search::board_scoring::Evaluator;
use crate::search::move_ordering::MoveOrderer;
use crate::search::threading::{SearchContext, SharedSearchState, TranspositionCache};
use crate::search::transposition_table::{
    is_mate_score, score_from_tt, score_to_tt, Bound, TTEntry, MATE, MATE_BOUND, MAX_PLY,
};

/// Deepest iteration the driver will start.
pub const MAX_SEARCH_DEPTH: u8 = (MAX_PLY - 4) as u8;

const INFINITE: i32 = MATE + 1;
const DRAW_SCORE: i32 = 0;
const NODE_CHECK_INTERVAL: u64 = 2048;
const COORDINATOR_POLL: Duration = Duration::from_millis(5);

const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_DEEP_REDUCTION_DEPTH: i32 = 6;
const NULL_MOVE_VERIFY_DEPTH: i32 = 8;
const LMR_MIN_DEPTH: i32 = 3;
const LMR_MIN_INDEX: usize = 4;
const LMR_DEEP_INDEX: usize = 8;
const LMR_DEEP_DEPTH: i32 = 6;

/// Fixed-capacity principal variation.
pub type PvLine = ArrayVec<Move, MAX_PLY>;

/// Switches for the depth-altering heuristics. Turning all of them off
/// leaves a plain alpha-beta search whose root value does not depend on move
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruningConfig {
    pub null_move: bool,
    pub late_move_reductions: bool,
    pub tt_cutoffs: bool,
}

impl PruningConfig {
    pub const DISABLED: PruningConfig = PruningConfig {
        null_move: false,
        late_move_reductions: false,
        tt_cutoffs: false,
    };
}

impl Default for PruningConfig {
    fn default() -> Self {
        Self {
            null_move: true,
            late_move_reductions: true,
            tt_cutoffs: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub max_depth: Option<u8>,
    pub max_nodes: Option<u64>,
    pub movetime: Option<Duration>,
    /// Worker count; 0 uses the context's configured thread count.
    pub threads: usize,
    /// Ignore the clock and keep going until stopped.
    pub infinite: bool,
    pub pruning: PruningConfig,
}

impl SearchLimits {
    pub fn depth(depth: u8) -> Self {
        Self {
            max_depth: Some(depth),
            ..Self::default()
        }
    }
}

/// Progress snapshot emitted once per newly completed depth.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: u8,
    pub score: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    pub nps: u64,
    pub pv: PvLine,
    pub hashfull: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Checkmate,
    Stalemate,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: PvLine,
    /// Set when the root itself has no legal moves.
    pub terminal: Option<Terminal>,
}

#[derive(Debug, Clone, Default)]
struct BestLine {
    depth: u8,
    score: i32,
    best_move: Option<Move>,
    pv: PvLine,
}

/// Best completed iteration across all workers.
///
/// A line replaces the current one when it comes from a deeper iteration, or
/// from the same depth with a strictly higher score. Ties keep the earlier
/// writer.
#[derive(Debug, Default)]
pub(crate) struct SharedBest {
    inner: Mutex<Option<BestLine>>,
}

impl SharedBest {
    fn offer(&self, line: BestLine) -> bool {
        let Ok(mut guard) = self.inner.lock() else {
            return false;
        };
        let replace = match guard.as_ref() {
            None => true,
            Some(current) => {
                line.depth > current.depth
                    || (line.depth == current.depth && line.score > current.score)
            }
        };
        if replace {
            *guard = Some(line);
        }
        replace
    }

    fn snapshot(&self) -> Option<BestLine> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }
}

struct DepthReport {
    worker: usize,
    line: BestLine,
}

/// Search `position` within `limits` and return the best move found.
///
/// Runs `limits.threads` workers (or the context's configured count) and
/// blocks until they finish. `on_progress` runs on the calling thread once
/// per newly completed depth. A stop requested through
/// [`SearchContext::stop`] before or during the call is honoured and
/// cleared on return.
pub fn search<E, F>(
    context: &SearchContext,
    position: &Position,
    limits: &SearchLimits,
    evaluator: &E,
    mut on_progress: F,
) -> SearchResult
where
    E: Evaluator + ?Sized,
    F: FnMut(&SearchReport),
{
    let started_at = Instant::now();
    let shared = context.shared();
    let cache = context.cache();

    let mut root = position.clone();
    let mut root_moves = MoveList::new();
    generate_legal_moves(&mut root, &mut root_moves);

    if root_moves.is_empty() {
        let (terminal, score) = if root.in_check() {
            (Terminal::Checkmate, -MATE)
        } else {
            (Terminal::Stalemate, DRAW_SCORE)
        };
        info!("search: root is terminal ({terminal:?})");
        shared.reset_stop();
        return SearchResult {
            best_move: None,
            score,
            depth: 0,
            nodes: 0,
            elapsed: started_at.elapsed(),
            pv: PvLine::new(),
            terminal: Some(terminal),
        };
    }

    let threads = match limits.threads {
        0 => context.config().normalized_threads(),
        n => n,
    };
    let max_depth = limits
        .max_depth
        .unwrap_or(MAX_SEARCH_DEPTH)
        .clamp(1, MAX_SEARCH_DEPTH);
    let movetime = if limits.infinite { None } else { limits.movetime };

    shared.begin_search(limits.max_nodes, movetime);
    cache.new_search();
    info!(
        "search start: max depth {max_depth}, threads {threads}, nodes {:?}, movetime {:?}, infinite {}",
        limits.max_nodes, movetime, limits.infinite
    );

    let best = SharedBest::default();
    let (tx, rx) = mpsc::channel::<DepthReport>();

    let partial = thread::scope(|scope| {
        let handles: Vec<_> = (0..threads)
            .map(|id| {
                let tx = tx.clone();
                let best = &best;
                let root_moves = root_moves.clone();
                let start_depth = if id == 0 {
                    1
                } else {
                    (1 + (id % 2) as u8).min(max_depth)
                };
                let mut worker =
                    Worker::new(id, position.clone(), evaluator, cache, shared, limits.pruning);
                scope.spawn(move || {
                    worker.run(root_moves, start_depth, max_depth, limits.infinite, best, &tx)
                })
            })
            .collect();
        drop(tx);

        let mut last_reported = 0u8;
        loop {
            match rx.recv_timeout(COORDINATOR_POLL) {
                Ok(report) => {
                    trace!("worker {} completed depth {}", report.worker, report.line.depth);
                    if report.line.depth > last_reported {
                        let line = best
                            .snapshot()
                            .filter(|l| l.depth == report.line.depth)
                            .unwrap_or(report.line);
                        last_reported = line.depth;
                        let elapsed = started_at.elapsed();
                        let nodes = shared.nodes();
                        let progress = SearchReport {
                            depth: line.depth,
                            score: line.score,
                            nodes,
                            elapsed,
                            nps: nodes_per_second(nodes, elapsed),
                            pv: line.pv,
                            hashfull: cache.hashfull(),
                        };
                        debug!(
                            "depth {} score {} nodes {} pv {}",
                            progress.depth,
                            progress.score,
                            progress.nodes,
                            format_pv(&progress.pv)
                        );
                        on_progress(&progress);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if !shared.should_stop() && shared.budget_exhausted() {
                shared.halt();
            }
        }

        while limits.infinite && !shared.stop_requested() {
            thread::sleep(COORDINATOR_POLL);
        }

        let outcomes: Vec<Option<(Move, i32)>> = handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect();
        outcomes.into_iter().next().flatten()
    });

    let elapsed = started_at.elapsed();
    let nodes = shared.nodes();
    shared.reset_stop();

    let result = match best.snapshot() {
        Some(line) => SearchResult {
            best_move: line.best_move,
            score: line.score,
            depth: line.depth,
            nodes,
            elapsed,
            pv: line.pv,
            terminal: None,
        },
        None => {
            // Nothing completed: keep the best root move seen at depth 1, or
            // fall back to the first generated move.
            let (best_move, score) = partial.unwrap_or((root_moves[0], DRAW_SCORE));
            let mut pv = PvLine::new();
            pv.push(best_move);
            SearchResult {
                best_move: Some(best_move),
                score,
                depth: 0,
                nodes,
                elapsed,
                pv,
                terminal: None,
            }
        }
    };

    info!(
        "search done: depth {} score {} nodes {} time {} ms best {}",
        result.depth,
        result.score,
        result.nodes,
        elapsed.as_millis(),
        result.best_move.map_or_else(|| "(none)".to_owned(), |m| m.to_string())
    );
    result
}

fn nodes_per_second(nodes: u64, elapsed: Duration) -> u64 {
    let ms = elapsed.as_millis() as u64;
    if ms == 0 {
        0
    } else {
        nodes.saturating_mul(1000) / ms
    }
}

fn format_pv(pv: &[Move]) -> String {
    pv.iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[inline]
fn update_pv(pv: &mut PvLine, mv: Move, child: &PvLine) {
    pv.clear();
    pv.push(mv);
    for &m in child.iter() {
        if pv.try_push(m).is_err() {
            break;
        }
    }
}

/// One Lazy SMP thread: private position copy, ordering tables and node
/// counter, shared cache and control block.
struct Worker<'a, E: Evaluator + ?Sized> {
    id: usize,
    position: Position,
    evaluator: &'a E,
    cache: &'a dyn TranspositionCache,
    shared: &'a SharedSearchState,
    pruning: PruningConfig,
    orderer: MoveOrderer,
    unflushed: u64,
    /// Null moves on the current path.
    null_depth: u32,
    stats: WorkerStats,
    prev_best: Option<Move>,
    root_partial: Option<(Move, i32)>,
}

/// Per-worker pruning counters, logged when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WorkerStats {
    null_cutoffs: u64,
    null_verifications: u64,
}

impl<'a, E: Evaluator + ?Sized> Worker<'a, E> {
    fn new(
        id: usize,
        position: Position,
        evaluator: &'a E,
        cache: &'a dyn TranspositionCache,
        shared: &'a SharedSearchState,
        pruning: PruningConfig,
    ) -> Self {
        Self {
            id,
            position,
            evaluator,
            cache,
            shared,
            pruning,
            orderer: MoveOrderer::new(),
            unflushed: 0,
            null_depth: 0,
            stats: WorkerStats::default(),
            prev_best: None,
            root_partial: None,
        }
    }

    /// Iterative deepening from `start_depth`. Returns the partial depth-1
    /// result when not even one iteration completed.
    fn run(
        &mut self,
        mut root_moves: MoveList,
        start_depth: u8,
        max_depth: u8,
        infinite: bool,
        best: &SharedBest,
        reports: &Sender<DepthReport>,
    ) -> Option<(Move, i32)> {
        trace!("worker {} start at depth {}", self.id, start_depth);
        let mut completed = 0u8;
        let mut partial = None;
        let mut finished = false;

        for depth in start_depth..=max_depth {
            let Some((score, pv)) = self.search_root(&mut root_moves, depth) else {
                if completed == 0 {
                    partial = self.root_partial;
                }
                break;
            };
            completed = depth;
            self.prev_best = pv.first().copied();
            let line = BestLine {
                depth,
                score,
                best_move: self.prev_best,
                pv,
            };
            best.offer(line.clone());
            reports
                .send(DepthReport {
                    worker: self.id,
                    line,
                })
                .ok();

            let mate_proven = is_mate_score(score) && MATE - score.abs() <= i32::from(depth);
            if depth == max_depth || (mate_proven && !infinite) {
                finished = true;
                break;
            }
        }

        self.flush_nodes();
        if finished {
            self.shared.halt();
        }
        trace!(
            "worker {} stop after depth {} ({} null cutoffs, {} verified)",
            self.id,
            completed,
            self.stats.null_cutoffs,
            self.stats.null_verifications
        );
        partial
    }

    fn flush_nodes(&mut self) {
        if self.unflushed > 0 {
            if self.shared.bump_nodes_and_check_budget(self.unflushed) {
                self.shared.halt();
            }
            self.unflushed = 0;
        }
    }

    /// Count a node; false once the search must unwind. Stop, halt and the
    /// budgets are only polled when the local counter is flushed.
    #[inline]
    fn visit_node(&mut self) -> bool {
        self.unflushed += 1;
        if self.unflushed >= NODE_CHECK_INTERVAL {
            self.flush_nodes();
            return !self.shared.should_stop();
        }
        true
    }

    #[inline]
    fn evaluate(&self) -> i32 {
        self.evaluator
            .evaluate(&self.position)
            .clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
    }

    /// Score of a rule draw at an interior node, or `None` when play goes on.
    /// A mate delivered on the move that reaches the fifty-move limit is still
    /// mate.
    fn rule_draw_score(&mut self, ply: usize) -> Option<i32> {
        if self.position.is_repetition() || self.position.has_insufficient_material() {
            return Some(DRAW_SCORE);
        }
        if !self.position.is_fifty_move_draw() {
            return None;
        }
        if self.position.in_check() {
            let mut moves = MoveList::new();
            generate_legal_moves(&mut self.position, &mut moves);
            if moves.is_empty() {
                return Some(-MATE + ply as i32);
            }
        }
        Some(DRAW_SCORE)
    }

    /// Null move is tried only where passing is unlikely to be the best move:
    /// not in check, not at the root, with enough depth left, with a piece
    /// other than pawns to move, and never against a mate bound.
    fn null_move_allowed(&self, depth: i32, beta: i32, ply: usize, in_check: bool) -> bool {
        self.pruning.null_move
            && !in_check
            && ply > 0
            && depth >= NULL_MOVE_MIN_DEPTH
            && self
                .position
                .has_non_pawn_material(self.position.side_to_move())
            && !is_mate_score(beta)
    }

    fn search_root(&mut self, root_moves: &mut MoveList, depth: u8) -> Option<(i32, PvLine)> {
        self.root_partial = None;
        let key = self.position.zobrist_key();
        let hash_move = self
            .prev_best
            .or_else(|| self.cache.probe(key).and_then(|e| e.best_move));
        self.orderer
            .score_moves(root_moves, &self.position, 0, hash_move);

        let depth = i32::from(depth);
        let beta = INFINITE;
        let mut alpha = -INFINITE;
        let mut best_score = -INFINITE;
        let mut best_pv = PvLine::new();
        let mut child_pv = PvLine::new();

        for (index, mv) in root_moves.iter().copied().enumerate() {
            self.position.make_move(mv);
            let new_depth = depth - 1 + i32::from(self.position.in_check());
            let score = if index == 0 {
                self.alpha_beta(-beta, -alpha, new_depth, 1, true, &mut child_pv)
                    .map(|s| -s)
            } else {
                match self.alpha_beta(-alpha - 1, -alpha, new_depth, 1, true, &mut child_pv) {
                    Some(s) if -s > alpha => self
                        .alpha_beta(-beta, -alpha, new_depth, 1, true, &mut child_pv)
                        .map(|s| -s),
                    other => other.map(|s| -s),
                }
            };
            self.position.unmake_move();
            let score = score?;

            if score > best_score {
                best_score = score;
                update_pv(&mut best_pv, mv, &child_pv);
                self.root_partial = Some((mv, score));
            }
            alpha = alpha.max(score);
        }

        self.cache.store(TTEntry {
            key,
            depth: depth as u8,
            score: score_to_tt(best_score, 0),
            bound: Bound::Exact,
            best_move: best_pv.first().copied(),
        });
        Some((best_score, best_pv))
    }

    /// Negamax with fail-soft bounds. `None` means the search was stopped
    /// and the value must be discarded.
    fn alpha_beta(
        &mut self,
        mut alpha: i32,
        mut beta: i32,
        depth: i32,
        ply: usize,
        allow_null: bool,
        pv: &mut PvLine,
    ) -> Option<i32> {
        pv.clear();
        if depth <= 0 {
            return self.quiescence(alpha, beta, ply, 0);
        }
        if !self.visit_node() {
            return None;
        }

        if ply > 0 {
            if let Some(score) = self.rule_draw_score(ply) {
                return Some(score);
            }
            alpha = alpha.max(-MATE + ply as i32);
            beta = beta.min(MATE - ply as i32 - 1);
            if alpha >= beta {
                return Some(alpha);
            }
        }
        if ply >= MAX_PLY - 1 {
            return Some(self.evaluate());
        }

        let pv_node = beta - alpha > 1;
        let key = self.position.zobrist_key();
        let mut hash_move = None;
        if let Some(entry) = self.cache.probe(key) {
            hash_move = entry.best_move;
            if self.pruning.tt_cutoffs && i32::from(entry.depth) >= depth {
                let tt_score = score_from_tt(entry.score, ply);
                // Bounds narrow the window everywhere; cutoffs only off the PV.
                match entry.bound {
                    Bound::Exact if !pv_node => return Some(tt_score),
                    Bound::Exact => {}
                    Bound::Lower => alpha = alpha.max(tt_score),
                    Bound::Upper => beta = beta.min(tt_score),
                }
                if alpha >= beta {
                    return Some(tt_score);
                }
            }
        }

        let side = self.position.side_to_move();
        let in_check = self.position.in_check();
        let mut child_pv = PvLine::new();

        if allow_null && self.null_move_allowed(depth, beta, ply, in_check) {
            let reduction = if depth >= NULL_MOVE_DEEP_REDUCTION_DEPTH {
                3
            } else {
                2
            };
            self.position.make_null_move();
            self.null_depth += 1;
            let score = self.alpha_beta(
                -beta,
                -beta + 1,
                depth - 1 - reduction,
                ply + 1,
                false,
                &mut child_pv,
            );
            self.null_depth -= 1;
            self.position.unmake_null_move();
            let score = -(score?);

            if score >= beta {
                // Never trust a mate proven by passing.
                let score = if is_mate_score(score) { beta } else { score };
                if depth < NULL_MOVE_VERIFY_DEPTH {
                    self.stats.null_cutoffs += 1;
                    return Some(score);
                }
                self.stats.null_verifications += 1;
                let verified =
                    self.alpha_beta(beta - 1, beta, depth - 1, ply, false, &mut child_pv)?;
                if verified >= beta {
                    self.stats.null_cutoffs += 1;
                    return Some(score);
                }
            }
        }

        let mut moves = MoveList::new();
        generate_legal_moves(&mut self.position, &mut moves);
        if moves.is_empty() {
            return Some(if in_check {
                -MATE + ply as i32
            } else {
                DRAW_SCORE
            });
        }
        self.orderer
            .score_moves(&mut moves, &self.position, ply, hash_move);
        let single_reply = moves.len() == 1;

        let alpha_orig = alpha;
        let mut best_score = -INFINITE;
        let mut best_move = None;

        for (index, mv) in moves.iter().copied().enumerate() {
            let quiet = mv.is_quiet();
            let killer = self.orderer.is_killer(ply, mv);

            self.position.make_move(mv);
            let gives_check = self.position.in_check();
            let new_depth = depth - 1 + i32::from(gives_check || single_reply);

            let score = if index == 0 {
                self.alpha_beta(-beta, -alpha, new_depth, ply + 1, true, &mut child_pv)
                    .map(|s| -s)
            } else {
                let reduction = if self.pruning.late_move_reductions
                    && depth >= LMR_MIN_DEPTH
                    && index >= LMR_MIN_INDEX
                    && quiet
                    && !killer
                    && !gives_check
                    && !in_check
                {
                    if index >= LMR_DEEP_INDEX && depth >= LMR_DEEP_DEPTH {
                        2
                    } else {
                        1
                    }
                } else {
                    0
                };
                self.search_late_move(alpha, beta, new_depth, reduction, ply, &mut child_pv)
            };
            self.position.unmake_move();
            let score = score?;

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
            if score > alpha {
                alpha = score;
                update_pv(pv, mv, &child_pv);
                if alpha >= beta {
                    if quiet {
                        self.orderer.record_killer(ply, mv);
                        self.orderer.record_history(side, mv, depth as u8);
                        if let Some(previous) = self.position.last_move() {
                            self.orderer.record_counter_move(previous, mv);
                        }
                    }
                    self.store(key, depth, best_score, Bound::Lower, best_move, ply);
                    return Some(best_score);
                }
                if quiet {
                    self.orderer.record_history(side, mv, depth as u8);
                }
            }
        }

        let bound = if alpha > alpha_orig {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.store(key, depth, best_score, bound, best_move, ply);
        Some(best_score)
    }

    /// Null-window probe (reduced when `reduction > 0`), widened to the full
    /// window only when it lands inside it. Returns the score from the
    /// parent's point of view.
    fn search_late_move(
        &mut self,
        alpha: i32,
        beta: i32,
        new_depth: i32,
        reduction: i32,
        ply: usize,
        child_pv: &mut PvLine,
    ) -> Option<i32> {
        let mut score = -self.alpha_beta(
            -alpha - 1,
            -alpha,
            new_depth - reduction,
            ply + 1,
            true,
            child_pv,
        )?;
        if reduction > 0 && score > alpha {
            score = -self.alpha_beta(-alpha - 1, -alpha, new_depth, ply + 1, true, child_pv)?;
        }
        if score > alpha && score < beta {
            score = -self.alpha_beta(-beta, -alpha, new_depth, ply + 1, true, child_pv)?;
        }
        Some(score)
    }

    fn store(
        &self,
        key: u64,
        depth: i32,
        score: i32,
        bound: Bound,
        best_move: Option<Move>,
        ply: usize,
    ) {
        self.cache.store(TTEntry {
            key,
            depth: depth.clamp(0, MAX_PLY as i32) as u8,
            score: score_to_tt(score, ply),
            bound,
            best_move,
        });
    }

    fn quiescence(&mut self, mut alpha: i32, beta: i32, ply: usize, qply: u32) -> Option<i32> {
        if !self.visit_node() {
            return None;
        }
        if qply == 0 && ply > 0 {
            if let Some(score) = self.rule_draw_score(ply) {
                return Some(score);
            }
        }
        if ply >= MAX_PLY - 1 {
            return Some(self.evaluate());
        }

        let in_check = self.position.in_check();
        let mut moves = MoveList::new();
        let mut best_score;

        if in_check {
            generate_legal_moves(&mut self.position, &mut moves);
            if moves.is_empty() {
                return Some(-MATE + ply as i32);
            }
            best_score = -MATE + ply as i32;
        } else {
            let stand_pat = self.evaluate();
            if stand_pat >= beta {
                return Some(stand_pat);
            }
            alpha = alpha.max(stand_pat);
            best_score = stand_pat;

            if qply == 0 && self.null_depth == 0 {
                generate_legal_moves(&mut self.position, &mut moves);
                let position = &mut self.position;
                moves.retain(|mv| mv.is_tactical() || gives_check(position, *mv));
            } else {
                generate_legal_captures(&mut self.position, &mut moves);
            }
        }

        self.orderer
            .score_moves(&mut moves, &self.position, ply, None);

        for mv in moves.iter().copied() {
            self.position.make_move(mv);
            let score = self.quiescence(-beta, -alpha, ply + 1, qply + 1);
            self.position.unmake_move();
            let score = -(score?);

            if score > best_score {
                best_score = score;
            }
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    break;
                }
            }
        }
        Some(best_score)
    }
}
