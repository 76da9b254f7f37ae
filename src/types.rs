use crate::board::ChessMove;

pub type Score = i32;

pub const SCORE_INFINITY: Score = 30_000;
pub const SCORE_MATE: Score = 29_000;
pub const MAX_PLY: usize = 128;
pub const DEFAULT_DEPTH: u8 = 5;
pub const DEFAULT_HASH_MB: usize = 64;

/// Engine-wide configuration, set up once and threaded through the UCI loop.
pub struct EngineConfig {
    pub hash_mb: usize,
    /// Inert placeholder for an external collaborator's opening-book or
    /// tablebase path. The core reads this field nowhere; it exists only so
    /// `setoption` handling in `uci` has somewhere to put a path string
    /// without the core needing to know what it's for.
    pub book_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_mb: DEFAULT_HASH_MB,
            book_path: None,
        }
    }
}

pub struct SearchResult {
    pub best_move: Option<ChessMove>,
    pub score: Score,
    pub depth: u8,
    pub nodes: u64,
}
