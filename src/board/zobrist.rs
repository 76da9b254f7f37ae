use std::sync::LazyLock;

/// One pregenerated random 64-bit key per piece/color/square triple, plus
/// side-to-move, castling-rights, and en-passant-file keys. A position's
/// hash is the XOR of every key that applies to it; XOR being its own
/// inverse is what lets `make_move`/`unmake_move` update the hash in O(1)
/// per move instead of recomputing it from all occupied squares.
struct ZobristKeys {
    /// [piece_type][color][square], square indexed a8=0..h1=63 like the rest
    /// of the board.
    piece: [[[u64; 64]; 2]; 6],
    /// XORed in whenever it's Black's turn.
    side: u64,
    /// One key per castling-rights bitmask (4 bits -> 16 combinations).
    castling: [u64; 16],
    /// One key per en-passant file; XORed in only while an en-passant
    /// capture is actually available.
    ep: [u64; 8],
}

/// Fixed seed so every run of the engine derives the same key table: a
/// transposition-table hash collision is reproducible across runs instead
/// of depending on process startup entropy.
static KEYS: LazyLock<ZobristKeys> = LazyLock::new(|| {
    let mut rng = XorShift64(0x3243F6A8885A308D);

    let mut piece = [[[0u64; 64]; 2]; 6];
    for piece_keys in &mut piece {
        for color_keys in piece_keys {
            for key in color_keys {
                *key = rng.next();
            }
        }
    }

    let side = rng.next();

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = rng.next();
    }

    let mut ep = [0u64; 8];
    for key in &mut ep {
        *key = rng.next();
    }

    ZobristKeys { piece, side, castling, ep }
});

/// Force-init all Zobrist keys. Can be called at startup, but keys are also
/// lazily initialized on first access.
pub fn init_zobrist() {
    LazyLock::force(&KEYS);
}

#[inline]
pub fn piece_key(piece: usize, color: usize, sq: usize) -> u64 {
    KEYS.piece[piece][color][sq]
}

#[inline]
pub fn side_key() -> u64 {
    KEYS.side
}

#[inline]
pub fn castling_key(rights: u8) -> u64 {
    KEYS.castling[rights as usize & 0xF]
}

#[inline]
pub fn ep_key(file: usize) -> u64 {
    KEYS.ep[file]
}

/// xorshift64 PRNG used only to seed the key tables above, not at search time.
struct XorShift64(u64);

impl XorShift64 {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_nonzero() {
        init_zobrist();
        assert_ne!(piece_key(0, 0, 0), 0);
        assert_ne!(side_key(), 0);
        assert_ne!(castling_key(0b1111), 0);
        assert_ne!(ep_key(0), 0);
    }

    #[test]
    fn test_keys_unique() {
        init_zobrist();
        // Square indices follow this board's a8=0..h1=63 numbering.
        let k1 = piece_key(0, 0, 0); // White pawn on a8
        let k2 = piece_key(0, 0, 1); // White pawn on b8
        let k3 = piece_key(1, 0, 0); // White knight on a8
        let k4 = piece_key(0, 1, 0); // Black pawn on a8
        assert_ne!(k1, k2);
        assert_ne!(k1, k3);
        assert_ne!(k1, k4);
    }

    #[test]
    fn test_xor_cancellation() {
        init_zobrist();
        let mut hash = 0u64;
        let key = piece_key(3, 0, 28);
        hash ^= key;
        hash ^= key;
        assert_eq!(hash, 0);
    }
}
