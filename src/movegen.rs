use crate::board::{generate_legal, ChessMove, MoveList, Position};

/// Order moves for search: the hash move first (if it's actually legal in
/// this position), then every other legal move in generator order. No
/// capture scoring, no killers, no history — ordering stops at the hash
/// move on purpose.
pub fn order_moves(pos: &Position, hash_move: Option<ChessMove>) -> MoveList {
    let legal = generate_legal(pos);

    let mut ordered = MoveList::new();
    if let Some(hm) = hash_move {
        if legal.contains(&hm) {
            ordered.push(hm);
        }
    }
    for mv in legal {
        if Some(mv) != hash_move {
            ordered.push(mv);
        }
    }
    ordered
}
