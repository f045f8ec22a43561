//! Move ordering heuristics: hash move, MVV-LVA, killers, counter moves and
//! history.
//!
//! Ordering only changes how fast alpha-beta cuts; it never changes which
//! moves are searched.

use crate::game_state::chess_types::*;
use crate::moves::move_descriptions::Move;
use crate::search::transposition_table::MAX_PLY;

const HASH_MOVE_SCORE: i32 = 2_000_000;
const CAPTURE_BASE: i32 = 1_000_000;
const PROMOTION_BASE: i32 = 900_000;
const KILLER_PRIMARY_SCORE: i32 = 800_000;
const KILLER_SECONDARY_SCORE: i32 = 700_000;
const COUNTER_MOVE_SCORE: i32 = 600_000;
const HISTORY_MAX: i32 = 50_000;

type HistoryTable = [[[i32; BOARD_SQUARES]; 6]; 2];

/// Quiet reply that last refuted the opponent's move, indexed by that move's
/// `[from][to]`.
type CounterMoveTable = [[Move; BOARD_SQUARES]; BOARD_SQUARES];

/// Per-worker ordering state. Never shared between threads.
#[derive(Debug, Clone)]
pub struct MoveOrderer {
    killers: [[Move; 2]; MAX_PLY],
    history: Box<HistoryTable>,
    counter_moves: Box<CounterMoveTable>,
}

impl Default for MoveOrderer {
    fn default() -> Self {
        Self {
            killers: [[Move::NULL; 2]; MAX_PLY],
            history: Box::new([[[0; BOARD_SQUARES]; 6]; 2]),
            counter_moves: Box::new([[Move::NULL; BOARD_SQUARES]; BOARD_SQUARES]),
        }
    }
}

impl MoveOrderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.killers = [[Move::NULL; 2]; MAX_PLY];
        self.history.iter_mut().flatten().for_each(|row| row.fill(0));
        self.counter_moves
            .iter_mut()
            .for_each(|row| row.fill(Move::NULL));
    }

    /// Assign `Move::score` to every move, then sort best first.
    pub fn score_moves(
        &self,
        moves: &mut [Move],
        position: &Position,
        ply: usize,
        hash_move: Option<Move>,
    ) {
        let side = position.side_to_move();
        let killers = self.killers_at(ply);
        let counter = position
            .last_move()
            .map_or(Move::NULL, |previous| self.counter_move(previous));
        for mv in moves.iter_mut() {
            mv.score = self.move_score(*mv, side, killers, counter, hash_move);
        }
        moves.sort_unstable_by_key(|m| std::cmp::Reverse(m.score));
    }

    fn move_score(
        &self,
        mv: Move,
        side: Color,
        killers: [Move; 2],
        counter: Move,
        hash_move: Option<Move>,
    ) -> i32 {
        if Some(mv) == hash_move {
            return HASH_MOVE_SCORE;
        }
        if mv.is_capture() {
            return CAPTURE_BASE + mvv_lva(mv) + mv.promotion().map_or(0, PieceKind::value);
        }
        if let Some(promotion) = mv.promotion() {
            return PROMOTION_BASE + promotion.value();
        }
        if mv == killers[0] {
            return KILLER_PRIMARY_SCORE;
        }
        if mv == killers[1] {
            return KILLER_SECONDARY_SCORE;
        }
        if !counter.is_null() && mv == counter {
            return COUNTER_MOVE_SCORE;
        }
        self.history[side.index()][mv.moved_piece().index()][usize::from(mv.to())]
    }

    #[inline]
    pub fn killers_at(&self, ply: usize) -> [Move; 2] {
        self.killers.get(ply).copied().unwrap_or([Move::NULL; 2])
    }

    #[inline]
    pub fn is_killer(&self, ply: usize, mv: Move) -> bool {
        let [first, second] = self.killers_at(ply);
        mv == first || mv == second
    }

    pub fn record_killer(&mut self, ply: usize, mv: Move) {
        let Some(slot) = self.killers.get_mut(ply) else {
            return;
        };
        if slot[0] == mv {
            return;
        }
        slot[1] = slot[0];
        slot[0] = mv;
    }

    /// Remember `reply` as the refutation of `previous`. Null moves and
    /// captures are ignored.
    pub fn record_counter_move(&mut self, previous: Move, reply: Move) {
        if previous.is_null() || reply.is_null() || !reply.is_quiet() {
            return;
        }
        self.counter_moves[usize::from(previous.from())][usize::from(previous.to())] = reply;
    }

    #[inline]
    pub fn counter_move(&self, previous: Move) -> Move {
        if previous.is_null() {
            return Move::NULL;
        }
        self.counter_moves[usize::from(previous.from())][usize::from(previous.to())]
    }

    /// Reward a quiet move by `depth²`. When an entry would pass the cap the
    /// whole table is halved so relative order survives.
    pub fn record_history(&mut self, side: Color, mv: Move, depth: u8) {
        let bonus = i32::from(depth) * i32::from(depth);
        let (piece, to) = (mv.moved_piece().index(), usize::from(mv.to()));
        if self.history[side.index()][piece][to] + bonus > HISTORY_MAX {
            self.history
                .iter_mut()
                .flatten()
                .flatten()
                .for_each(|v| *v /= 2);
        }
        let entry = &mut self.history[side.index()][piece][to];
        *entry = (*entry + bonus).min(HISTORY_MAX);
    }

    #[inline]
    pub fn history_score(&self, side: Color, mv: Move) -> i32 {
        self.history[side.index()][mv.moved_piece().index()][usize::from(mv.to())]
    }
}

/// Most valuable victim first; among equal victims, least valuable attacker.
#[inline]
pub fn mvv_lva(mv: Move) -> i32 {
    let victim = mv.captured().map_or(0, PieceKind::value);
    let attacker = match mv.moved_piece() {
        PieceKind::King => 1_000,
        kind => kind.value(),
    };
    victim * 16 - attacker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generation::legal_move_generator::generate_legal_moves;
    use crate::moves::move_descriptions::MoveList;
    use crate::utils::long_algebraic::long_algebraic_to_move;

    fn legal(position: &mut Position) -> MoveList {
        let mut moves = MoveList::new();
        generate_legal_moves(position, &mut moves);
        moves
    }

    #[test]
    fn priority_hash_capture_promotion_killer_history() {
        // White can capture the d5 rook with a pawn or the queen, promote on
        // a8, or play quiet moves.
        let mut position =
            Position::from_fen("4k3/P7/8/3r4/4P3/8/3Q4/4K3 w - - 0 1").expect("FEN should parse");
        let quiet = long_algebraic_to_move("d2d3", &mut position).expect("legal");
        let killer = long_algebraic_to_move("d2d4", &mut position).expect("legal");
        let hash = long_algebraic_to_move("e1f1", &mut position).expect("legal");
        let pawn_takes = long_algebraic_to_move("e4d5", &mut position).expect("legal");
        let queen_takes = long_algebraic_to_move("d2d5", &mut position).expect("legal");
        let promote = long_algebraic_to_move("a7a8q", &mut position).expect("legal");

        let mut orderer = MoveOrderer::new();
        orderer.record_killer(3, killer);
        orderer.record_history(Color::Light, quiet, 5);

        let mut moves = legal(&mut position);
        orderer.score_moves(&mut moves, &position, 3, Some(hash));
        let order: Vec<Move> = moves.iter().copied().collect();
        let rank = |mv: Move| order.iter().position(|&m| m == mv).expect("present");

        assert_eq!(rank(hash), 0);
        assert!(rank(pawn_takes) < rank(queen_takes));
        assert!(rank(queen_takes) < rank(promote));
        assert!(rank(promote) < rank(killer));
        assert!(rank(killer) < rank(quiet));
        assert_eq!(moves[rank(quiet)].score, 25);
    }

    #[test]
    fn killers_shift_and_ignore_duplicates() {
        let mut position = Position::new_game();
        let moves = legal(&mut position);
        let mut orderer = MoveOrderer::new();
        orderer.record_killer(2, moves[0]);
        orderer.record_killer(2, moves[0]);
        assert_eq!(orderer.killers_at(2), [moves[0], Move::NULL]);
        orderer.record_killer(2, moves[1]);
        assert_eq!(orderer.killers_at(2), [moves[1], moves[0]]);
        assert!(orderer.is_killer(2, moves[0]) && !orderer.is_killer(3, moves[0]));
        // Out-of-range plies are ignored.
        orderer.record_killer(MAX_PLY + 5, moves[2]);
        assert_eq!(orderer.killers_at(MAX_PLY + 5), [Move::NULL; 2]);
    }

    #[test]
    fn counter_move_ranks_between_killers_and_history() {
        let mut position = Position::new_game();
        let e4 = long_algebraic_to_move("e2e4", &mut position).expect("legal");
        position.make_move(e4);
        let killer = long_algebraic_to_move("g8f6", &mut position).expect("legal");
        let counter = long_algebraic_to_move("b8c6", &mut position).expect("legal");
        let quiet = long_algebraic_to_move("a7a6", &mut position).expect("legal");

        let mut orderer = MoveOrderer::new();
        orderer.record_killer(1, killer);
        orderer.record_counter_move(e4, counter);
        orderer.record_history(Color::Dark, quiet, 40);
        assert_eq!(orderer.counter_move(e4), counter);

        let mut moves = legal(&mut position);
        orderer.score_moves(&mut moves, &position, 1, None);
        let rank = |mv: Move| moves.iter().position(|&m| m == mv).expect("present");
        assert!(rank(killer) < rank(counter));
        assert!(rank(counter) < rank(quiet));
        assert_eq!(moves[rank(counter)].score, COUNTER_MOVE_SCORE);
        assert_eq!(moves[rank(quiet)].score, 1_600);

        // Null moves never index the table.
        orderer.record_counter_move(Move::NULL, quiet);
        assert_eq!(orderer.counter_move(Move::NULL), Move::NULL);
        orderer.clear();
        assert_eq!(orderer.counter_move(e4), Move::NULL);
    }

    #[test]
    fn captures_are_not_stored_as_counter_moves() {
        let mut position =
            Position::from_fen("4k3/8/8/3r4/4P3/8/8/4K3 b - - 0 1").expect("FEN should parse");
        let previous = long_algebraic_to_move("e8d8", &mut position).expect("legal");
        position.make_move(previous);
        let capture = long_algebraic_to_move("e4d5", &mut position).expect("legal");
        let mut orderer = MoveOrderer::new();
        orderer.record_counter_move(previous, capture);
        assert_eq!(orderer.counter_move(previous), Move::NULL);
    }

    #[test]
    fn history_is_capped_and_halved() {
        let mut position = Position::new_game();
        let moves = legal(&mut position);
        let (a, b) = (moves[0], moves[1]);
        let mut orderer = MoveOrderer::new();
        orderer.record_history(Color::Light, b, 10);
        for _ in 0..600 {
            orderer.record_history(Color::Light, a, 10);
        }
        assert!(orderer.history_score(Color::Light, a) <= HISTORY_MAX);
        assert!(orderer.history_score(Color::Light, b) < 100);
        orderer.clear();
        assert_eq!(orderer.history_score(Color::Light, a), 0);
    }
}
