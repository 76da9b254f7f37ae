mod attacks;
mod bitboard;
mod chessmove;
mod magic;
mod movegen;
mod piece;
mod position;
mod square;
mod undo;
mod zobrist;

#[allow(unused_imports)]
pub use attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks};
#[allow(unused_imports)]
pub use bitboard::{BitBoard, EMPTY};
pub use chessmove::{ChessMove, MoveFlag};
#[allow(unused_imports)]
pub use movegen::{generate_legal, generate_pseudo_legal, MoveList};
pub use piece::{Color, Piece};
#[allow(unused_imports)]
pub use position::{GameStatus, Position, BK, BQ, WK, WQ};
#[allow(unused_imports)]
pub use square::{File, Rank, Square, ALL_SQUARES};
pub use undo::UndoRecord;

/// Init attack tables and Zobrist keys. Must be called before any board operations.
pub fn init() {
    attacks::init_attacks();
    zobrist::init_zobrist();
}
