use thiserror::Error;

/// Failure modes for [`crate::fen::parse_fen`] / `Position::from_fen`.
///
/// The core favors this explicit taxonomy over silent best-effort recovery: a
/// caller can match on the variant to report exactly which field was bad.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN needs at least 4 whitespace-separated fields, got {0}")]
    FieldCount(usize),
    #[error("invalid piece character '{0}' in placement field")]
    BadPiece(char),
    #[error("piece placement field overflowed the board (rank/file out of range)")]
    RankOverflow,
    #[error("invalid side-to-move field '{0}', expected 'w' or 'b'")]
    BadSide(String),
    #[error("invalid castling-rights character '{0}'")]
    BadCastling(char),
    #[error("invalid en-passant square '{0}'")]
    BadEnPassant(String),
}
