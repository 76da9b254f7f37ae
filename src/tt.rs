use crate::board::ChessMove;
use crate::types::{Score, SCORE_MATE};

/// How an entry's stored score bounds the true value at the depth it was
/// searched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TTFlag {
    /// The search completed inside the window: the score is exact.
    Exact,
    /// A beta cutoff fired: the true score is at least this value.
    LowerBound,
    /// Every move failed low: the true score is at most this value.
    UpperBound,
}

/// One slot of the transposition table, keyed by the full Zobrist hash
/// (kept alongside the entry so a lookup can detect a hash collision
/// rather than trust an index match alone).
#[derive(Clone, Copy)]
pub struct TTEntry {
    pub key: u64,
    pub depth: u8,
    pub score: Score,
    pub flag: TTFlag,
    pub best_move: Option<ChessMove>,
    pub age: u8,
}

impl Default for TTEntry {
    fn default() -> Self {
        Self {
            key: 0,
            depth: 0,
            score: 0,
            flag: TTFlag::Exact,
            best_move: None,
            age: 0,
        }
    }
}

/// A fixed-size, power-of-two-slot hash table mapping `hash & mask` to the
/// most useful entry seen for that slot. Replacement is depth-preferred
/// with aging: a shallower entry from an earlier `new_search()` generation
/// loses to anything from the current one, even at equal depth.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    mask: usize,
    generation: u8,
}

impl TranspositionTable {
    /// Build a table sized to fit within `mb` megabytes, rounded down to a
    /// power-of-two entry count (minimum 1024 slots regardless of budget).
    pub fn new(mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TTEntry>();
        let num_entries = (mb * 1024 * 1024) / entry_size;
        let size = (num_entries.next_power_of_two() / 2).max(1024);

        Self {
            entries: vec![TTEntry::default(); size],
            mask: size - 1,
            generation: 0,
        }
    }

    /// Start a new search generation so next search's stores win replacement
    /// ties against entries left over from the previous one.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn probe(&self, hash: u64, _ply: usize) -> Option<&TTEntry> {
        let entry = &self.entries[hash as usize & self.mask];
        if entry.key == hash {
            Some(entry)
        } else {
            None
        }
    }

    /// Translate a stored entry into a score usable at `ply`, honoring its
    /// bound type against the caller's current window. Mate scores are
    /// stored relative to the root (mate-in-5-from-root) and must be
    /// re-based onto `ply` (mate-in-3-from-here) before use.
    pub fn retrieve_score(entry: &TTEntry, ply: usize, alpha: Score, beta: Score) -> Option<Score> {
        let mut score = entry.score;
        if score > SCORE_MATE - 100 {
            score -= ply as Score;
        } else if score < -SCORE_MATE + 100 {
            score += ply as Score;
        }

        match entry.flag {
            TTFlag::Exact => Some(score),
            TTFlag::LowerBound => (score >= beta).then_some(score),
            TTFlag::UpperBound => (score <= alpha).then_some(score),
        }
    }

    /// Store a search result, subject to the depth/aging replacement policy.
    pub fn store(
        &mut self,
        hash: u64,
        depth: u8,
        mut score: Score,
        flag: TTFlag,
        best_move: Option<ChessMove>,
        ply: usize,
    ) {
        let idx = hash as usize & self.mask;
        let entry = &self.entries[idx];

        let should_replace = entry.key == 0
            || entry.key == hash
            || depth >= entry.depth
            || entry.age != self.generation;
        if !should_replace {
            return;
        }

        // Re-base the mate score onto the root before storing it, the
        // inverse of the adjustment `retrieve_score` applies on the way out.
        if score > SCORE_MATE - 100 {
            score += ply as Score;
        } else if score < -SCORE_MATE + 100 {
            score -= ply as Score;
        }

        self.entries[idx] = TTEntry {
            key: hash,
            depth,
            score,
            flag,
            best_move,
            age: self.generation,
        };
    }

    /// Number of slots the table was sized to, for diagnostics and tests.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = TTEntry::default();
        }
        self.generation = 0;
    }
}
