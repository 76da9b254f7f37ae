use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::board::{generate_pseudo_legal, ChessMove, Position};
use crate::evaluation::evaluate;
use crate::movegen::order_moves;
use crate::tt::{TTFlag, TranspositionTable};
use crate::types::{Score, SearchResult, DEFAULT_HASH_MB, SCORE_INFINITY, SCORE_MATE};

/// Mutable state threaded through one alpha-beta search call tree: node
/// counter, the stop flag polled by the time manager, and the table shared
/// across iterative-deepening iterations.
pub struct SearchState {
    pub nodes: u64,
    pub start_time: Instant,
    pub stop: Arc<AtomicBool>,
    pub time_limit_ms: u64,
    pub tt: TranspositionTable,
    pub root_best_move: Option<ChessMove>,
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            nodes: 0,
            start_time: Instant::now(),
            stop: Arc::new(AtomicBool::new(false)),
            time_limit_ms: 0,
            tt: TranspositionTable::new(DEFAULT_HASH_MB),
            root_best_move: None,
        }
    }

    pub fn reset(&mut self) {
        self.nodes = 0;
        self.stop.store(false, Ordering::SeqCst);
        self.start_time = Instant::now();
        self.tt.new_search();
        self.root_best_move = None;
    }

    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::new(mb);
    }

    fn check_time(&self) {
        if self.time_limit_ms > 0 {
            let elapsed = self.start_time.elapsed().as_millis() as u64;
            if elapsed >= self.time_limit_ms {
                self.stop.store(true, Ordering::Relaxed);
            }
        }
    }

    fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

/// Follow the TT's hash-move chain from `pos` to reconstruct a principal
/// variation for UCI `info` output. Purely diagnostic: search correctness
/// never depends on this.
fn extract_pv(pos: &Position, tt: &TranspositionTable, max_moves: usize) -> Vec<ChessMove> {
    let mut pv = Vec::new();
    let mut current = *pos;
    let mut seen: Vec<u64> = Vec::new();

    for _ in 0..max_moves {
        let hash = current.get_hash();
        if seen.contains(&hash) {
            break;
        }
        seen.push(hash);

        let Some(entry) = tt.probe(hash, 0) else { break };
        let Some(mv) = entry.best_move else { break };
        if !current.legal(mv) {
            break;
        }
        pv.push(mv);
        current.make_move(mv);
    }

    pv
}

fn format_score(score: Score) -> String {
    if score.abs() > SCORE_MATE - 100 {
        let mate_ply = SCORE_MATE - score.abs();
        let mate_moves = (mate_ply + 1) / 2;
        if score > 0 {
            format!("score mate {}", mate_moves)
        } else {
            format!("score mate -{}", mate_moves)
        }
    } else {
        format!("score cp {}", score)
    }
}

/// Iterative deepening driver: repeatedly call [`alpha_beta`] at increasing
/// depth, stopping when the time budget or `max_depth` runs out. Each
/// iteration reuses the TT populated by the previous one, so deeper
/// iterations are cheap relative to a cold search at the same depth.
pub fn search(pos: &Position, state: &mut SearchState, max_depth: u8) -> SearchResult {
    let mut best_move: Option<ChessMove> = None;
    let mut best_score: Score = -SCORE_INFINITY;

    for depth in 1..=max_depth {
        state.nodes = 0;
        state.root_best_move = None;
        let mut search_pos = *pos;
        let score = alpha_beta(&mut search_pos, state, depth, 0, -SCORE_INFINITY, SCORE_INFINITY);

        if state.is_stopped() {
            if best_move.is_none() {
                best_move = state.root_best_move;
            }
            break;
        }

        best_score = score;
        if let Some(mv) = state.root_best_move {
            best_move = Some(mv);
        }

        let elapsed_ms = state.start_time.elapsed().as_millis().max(1) as u64;
        let nps = state.nodes * 1000 / elapsed_ms;
        let pv = extract_pv(pos, &state.tt, depth as usize);
        let pv_str: String = pv.iter().map(|m| m.to_string()).collect::<Vec<_>>().join(" ");

        tracing::info!(
            depth,
            nodes = state.nodes,
            time_ms = elapsed_ms,
            nps,
            pv = %pv_str,
            "{}",
            format_score(best_score)
        );

        if state.time_limit_ms > 0 {
            let elapsed = state.start_time.elapsed().as_millis() as u64;
            if elapsed > state.time_limit_ms / 2 {
                break;
            }
        }

        if best_score.abs() > SCORE_MATE - 100 {
            break;
        }
    }

    SearchResult {
        best_move,
        score: best_score,
        depth: max_depth,
        nodes: state.nodes,
    }
}

/// Fail-soft alpha-beta over pseudo-legal moves: a child whose own king ends
/// up attacked after the move is simply skipped rather than filtered out in
/// advance, so no separate legal-move pass runs per node.
pub fn alpha_beta(
    pos: &mut Position,
    state: &mut SearchState,
    depth: u8,
    ply: usize,
    mut alpha: Score,
    beta: Score,
) -> Score {
    state.nodes += 1;
    if state.nodes & 2047 == 0 {
        state.check_time();
    }
    if state.is_stopped() {
        return 0;
    }

    let hash = pos.get_hash();
    let mut hash_move: Option<ChessMove> = None;

    if let Some(entry) = state.tt.probe(hash, ply) {
        hash_move = entry.best_move;
        if entry.depth >= depth {
            if let Some(score) = TranspositionTable::retrieve_score(entry, ply, alpha, beta) {
                return score;
            }
        }
    }

    if depth == 0 {
        return evaluate(pos);
    }

    let mut pseudo = crate::board::MoveList::new();
    generate_pseudo_legal(pos, &mut pseudo);
    let ordered = order_moves_pseudo(&pseudo, hash_move);

    let original_alpha = alpha;
    let mut best_score = -SCORE_INFINITY;
    let mut best_move: Option<ChessMove> = None;
    let mut legal_moves_seen = 0u32;

    for mv in ordered {
        let undo = pos.make_move(mv);
        let mover = !pos.side_to_move();
        let king_sq = pos.king_square(mover);
        let still_legal = match king_sq {
            Some(sq) => !pos.attacked_by(sq, pos.side_to_move()),
            None => false,
        };

        if !still_legal {
            pos.unmake_move(mv, undo);
            continue;
        }
        legal_moves_seen += 1;

        let score = -alpha_beta(pos, state, depth - 1, ply + 1, -beta, -alpha);
        pos.unmake_move(mv, undo);

        if state.is_stopped() {
            return best_score;
        }

        if score > best_score {
            best_score = score;
            best_move = Some(mv);
            if ply == 0 {
                state.root_best_move = Some(mv);
            }
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            break;
        }
    }

    if legal_moves_seen == 0 {
        let in_check = pos.in_check();
        best_score = if in_check {
            -SCORE_MATE + ply as Score
        } else {
            0
        };
    } else {
        let flag = if best_score >= beta {
            TTFlag::LowerBound
        } else if best_score <= original_alpha {
            TTFlag::UpperBound
        } else {
            TTFlag::Exact
        };
        state.tt.store(hash, depth, best_score, flag, best_move, ply);
    }

    best_score
}

/// Hash move first, then the rest of the pseudo-legal list in generation
/// order — the same policy as [`order_moves`], restated here over a
/// pseudo-legal buffer so the search loop doesn't pay for a second full
/// legal-move generation per node.
fn order_moves_pseudo(
    pseudo: &crate::board::MoveList,
    hash_move: Option<ChessMove>,
) -> crate::board::MoveList {
    let mut ordered = crate::board::MoveList::new();
    if let Some(hm) = hash_move {
        if pseudo.contains(&hm) {
            ordered.push(hm);
        }
    }
    for &mv in pseudo {
        if Some(mv) != hash_move {
            ordered.push(mv);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn init() {
        crate::board::init();
    }

    #[test]
    fn test_search_finds_move() {
        init();
        let pos = Position::default();
        let mut state = SearchState::new();
        let result = search(&pos, &mut state, 3);
        assert!(result.best_move.is_some());
    }

    #[test]
    fn test_search_finds_mate_in_one() {
        init();
        let pos = Position::from_str("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
            .unwrap();
        let mut state = SearchState::new();
        let result = search(&pos, &mut state, 2);
        let best = result.best_move.unwrap();
        assert_eq!(best.to_string(), "h5f7", "Expected Qxf7# but got {}", best);
    }

    #[test]
    fn test_checkmate_score() {
        init();
        let mut pos = Position::from_str("rnbqkbnr/pppp1ppp/4p3/8/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        let mut state = SearchState::new();
        let score = alpha_beta(&mut pos, &mut state, 1, 0, -SCORE_INFINITY, SCORE_INFINITY);
        assert!(score < -SCORE_MATE + 200, "Checkmate score should be very negative, got {}", score);
    }

    #[test]
    fn test_stalemate_is_zero() {
        init();
        let mut pos = Position::from_str("7k/8/6Q1/8/8/8/8/6K1 b - - 0 1").unwrap();
        let mut state = SearchState::new();
        let score = alpha_beta(&mut pos, &mut state, 1, 0, -SCORE_INFINITY, SCORE_INFINITY);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_tt_reduces_nodes() {
        init();
        let pos = Position::default();
        let mut state = SearchState::new();

        search(&pos, &mut state, 4);
        let nodes_first = state.nodes;

        state.reset();
        search(&pos, &mut state, 4);
        let nodes_second = state.nodes;

        assert!(
            nodes_second <= nodes_first,
            "Second search ({} nodes) should use <= first ({} nodes) due to TT",
            nodes_second,
            nodes_first
        );
    }

    #[test]
    fn test_stop_preserves_best_move() {
        init();
        let pos = Position::default();
        let mut state = SearchState::new();
        state.time_limit_ms = 1;
        state.start_time = Instant::now();
        let result = search(&pos, &mut state, 20);
        assert!(result.best_move.is_some(), "Should find a move even when stopped early");
    }

    #[test]
    fn test_pv_extraction() {
        init();
        let pos = Position::default();
        let mut state = SearchState::new();
        search(&pos, &mut state, 4);
        let pv = extract_pv(&pos, &state.tt, 4);
        assert!(!pv.is_empty(), "PV should contain at least one move after search");
    }

    #[test]
    fn test_mate_score_format() {
        assert_eq!(format_score(SCORE_MATE - 1), "score mate 1");
        assert_eq!(format_score(SCORE_MATE - 3), "score mate 2");
        assert_eq!(format_score(-(SCORE_MATE - 1)), "score mate -1");
        assert_eq!(format_score(-(SCORE_MATE - 3)), "score mate -2");
        assert_eq!(format_score(100), "score cp 100");
        assert_eq!(format_score(-50), "score cp -50");
    }
}
