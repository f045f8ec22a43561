//! Full-tree legal move counting for generator validation and benchmarking.

use std::thread;

use crate::game_state::chess_types::*;
use crate::move_generation::legal_move_generator::generate_legal_moves;
use crate::moves::move_descriptions::{Move, MoveList};

/// Leaf statistics gathered at the final ply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerftCounts {
    pub nodes: u64,
    pub captures: u64,
    pub en_passant: u64,
    pub castles: u64,
    pub promotions: u64,
    pub checks: u64,
    pub checkmates: u64,
}

impl PerftCounts {
    pub fn merge(&mut self, rhs: PerftCounts) {
        self.nodes += rhs.nodes;
        self.captures += rhs.captures;
        self.en_passant += rhs.en_passant;
        self.castles += rhs.castles;
        self.promotions += rhs.promotions;
        self.checks += rhs.checks;
        self.checkmates += rhs.checkmates;
    }
}

/// Number of leaf nodes `depth` plies below `position`.
pub fn perft(position: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = MoveList::new();
    generate_legal_moves(position, &mut moves);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in moves {
        position.make_move(mv);
        nodes += perft(position, depth - 1);
        position.unmake_move();
    }
    nodes
}

/// Per-root-move leaf counts, in generation order.
pub fn perft_divide(position: &mut Position, depth: u8) -> Vec<(Move, u64)> {
    let mut moves = MoveList::new();
    generate_legal_moves(position, &mut moves);

    moves
        .into_iter()
        .map(|mv| {
            position.make_move(mv);
            let nodes = perft(position, depth.saturating_sub(1));
            position.unmake_move();
            (mv, nodes)
        })
        .collect()
}

/// Leaf counts with capture/castle/check breakdowns.
pub fn perft_with_counts(position: &mut Position, depth: u8) -> PerftCounts {
    let mut total = PerftCounts::default();
    if depth == 0 {
        total.nodes = 1;
        return total;
    }

    let mut moves = MoveList::new();
    generate_legal_moves(position, &mut moves);
    let mut replies = MoveList::new();

    for mv in moves {
        position.make_move(mv);
        if depth == 1 {
            total.nodes += 1;
            total.captures += u64::from(mv.is_capture());
            total.en_passant += u64::from(mv.is_en_passant());
            total.castles += u64::from(mv.is_castle());
            total.promotions += u64::from(mv.is_promotion());
            if position.in_check() {
                total.checks += 1;
                generate_legal_moves(position, &mut replies);
                total.checkmates += u64::from(replies.is_empty());
            }
        } else {
            total.merge(perft_with_counts(position, depth - 1));
        }
        position.unmake_move();
    }
    total
}

/// Splits root moves across `threads` scoped workers, each with its own
/// copy of the position.
pub fn perft_multi_threaded(position: &Position, depth: u8, threads: usize) -> u64 {
    if depth <= 1 {
        return perft(&mut position.clone(), depth);
    }

    let mut root = position.clone();
    let mut moves = MoveList::new();
    generate_legal_moves(&mut root, &mut moves);
    let threads = threads.clamp(1, moves.len().max(1));
    let chunk = moves.len().div_ceil(threads).max(1);

    thread::scope(|scope| {
        let handles: Vec<_> = moves
            .chunks(chunk)
            .map(|slice| {
                let mut local = position.clone();
                scope.spawn(move || {
                    slice
                        .iter()
                        .map(|&mv| {
                            local.make_move(mv);
                            let n = perft(&mut local, depth - 1);
                            local.unmake_move();
                            n
                        })
                        .sum::<u64>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::chess_rules::STARTING_POSITION_FEN;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    const POSITION_4: &str = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
    const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";
    const POSITION_6: &str =
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10";

    fn check(fen: &str, expected: &[u64]) {
        let mut position = Position::from_fen(fen).expect("FEN should parse");
        let before = position.clone();
        for (i, &nodes) in expected.iter().enumerate() {
            let depth = (i + 1) as u8;
            assert_eq!(perft(&mut position, depth), nodes, "{fen} depth {depth}");
        }
        assert_eq!(position, before);
    }

    #[test]
    fn perft_depth_zero_counts_single_node() {
        let mut position = Position::new_game();
        assert_eq!(perft(&mut position, 0), 1);
        assert_eq!(perft_with_counts(&mut position, 0).nodes, 1);
    }

    #[test]
    fn startpos_reference_counts() {
        check(STARTING_POSITION_FEN, &[20, 400, 8_902, 197_281]);
    }

    #[test]
    fn kiwipete_reference_counts() {
        check(KIWIPETE, &[48, 2_039, 97_862]);
    }

    #[test]
    fn endgame_reference_counts() {
        check(POSITION_3, &[14, 191, 2_812, 43_238]);
    }

    #[test]
    fn promotion_heavy_reference_counts() {
        check(POSITION_4, &[6, 264, 9_467]);
        check(POSITION_5, &[44, 1_486, 62_379]);
    }

    #[test]
    fn middlegame_reference_counts() {
        check(POSITION_6, &[46, 2_079, 89_890]);
    }

    #[test]
    fn kiwipete_leaf_breakdown() {
        let mut position = Position::from_fen(KIWIPETE).expect("FEN should parse");
        let counts = perft_with_counts(&mut position, 2);
        assert_eq!(
            counts,
            PerftCounts {
                nodes: 2_039,
                captures: 351,
                en_passant: 1,
                castles: 91,
                promotions: 0,
                checks: 3,
                checkmates: 0,
            }
        );
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut position = Position::from_fen(KIWIPETE).expect("FEN should parse");
        let divide = perft_divide(&mut position, 2);
        assert_eq!(divide.len(), 48);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
    }

    #[test]
    fn multi_threaded_matches_single_threaded() {
        let position = Position::from_fen(POSITION_3).expect("FEN should parse");
        assert_eq!(perft_multi_threaded(&position, 3, 4), 2_812);
        assert_eq!(perft_multi_threaded(&position, 1, 4), 14);
    }
}
