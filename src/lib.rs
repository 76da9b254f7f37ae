//! Core of a bitboard chess engine: attack tables, move generation, make/unmake
//! over an undo stack, Zobrist hashing, a tapered PeSTO-style evaluator, and an
//! alpha-beta search over a transposition table. The UCI loop in [`uci`] is a
//! thin external collaborator layered on top, not part of the core itself.

pub mod board;
pub mod error;
pub mod evaluation;
pub mod fen;
pub mod logging;
pub mod movegen;
pub mod perft;
pub mod pst;
pub mod search;
pub mod tt;
pub mod types;
pub mod uci;

/// Build attack tables and Zobrist keys. Idempotent; safe to call from multiple
/// threads or multiple times.
pub fn init_all() {
    board::init();
}
