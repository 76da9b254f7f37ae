//! Exact leaf-count move-generation test driver, independent of search or
//! evaluation: it only exercises `generate_legal` and make/unmake.

use crate::board::{generate_legal, ChessMove, Position};

/// Count legal leaf positions reachable in exactly `depth` plies. Depth 0
/// counts the current position itself.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generate_legal(pos);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut count = 0u64;
    for mv in moves {
        let undo = pos.make_move(mv);
        count += perft(pos, depth - 1);
        pos.unmake_move(mv, undo);
    }
    count
}

/// Per-root-move leaf counts, used to localize a perft mismatch against a
/// reference engine: diff the (move, count) pairs instead of a single total.
pub fn divide(pos: &mut Position, depth: u32) -> Vec<(ChessMove, u64)> {
    let moves = generate_legal(pos);
    let mut results = Vec::with_capacity(moves.len());

    for mv in moves {
        let undo = pos.make_move(mv);
        let count = if depth == 0 { 1 } else { perft(pos, depth - 1) };
        pos.unmake_move(mv, undo);
        results.push((mv, count));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn init() {
        crate::board::init();
    }

    #[test]
    fn test_perft_startpos_depth4() {
        init();
        let mut pos = Position::default();
        assert_eq!(perft(&mut pos, 4), 197_281);
    }

    #[test]
    fn test_perft_kiwipete_depth3() {
        init();
        let mut pos =
            Position::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        assert_eq!(perft(&mut pos, 3), 97_862);
    }

    #[test]
    fn test_divide_sums_to_perft() {
        init();
        let mut pos = Position::default();
        let total: u64 = divide(&mut pos, 3).iter().map(|(_, c)| c).sum();
        assert_eq!(total, perft(&mut Position::default(), 3));
    }
}
