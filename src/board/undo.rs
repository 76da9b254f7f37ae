use super::bitboard::BitBoard;
use super::chessmove::ChessMove;
use super::piece::Piece;
use super::square::Square;

/// Everything `make_move` destroys that `unmake_move` needs back: the move
/// itself, whatever it captured, and the board-wide state that doesn't
/// belong to any single square (castling rights, en passant, clocks, hash).
#[derive(Clone, Copy)]
pub struct UndoRecord {
    pub mv: ChessMove,
    pub captured: Option<Piece>,
    pub captured_square: Option<Square>,
    pub castling_rights: u8,
    pub ep_square: Option<Square>,
    pub halfmove_clock: u16,
    pub hash: u64,
    pub checkers: BitBoard,
}
