use std::sync::LazyLock;

use super::bitboard::BitBoard;
use super::magic::{find_magic, MagicEntry, Rng, BISHOP_BITS, ROOK_BITS};
use super::piece::Color;
use super::square::Square;

struct LeaperTables {
    knight: [BitBoard; 64],
    king: [BitBoard; 64],
    pawn: [[BitBoard; 64]; 2],
}

struct SliderTables {
    bishop_table: Vec<BitBoard>,
    rook_table: Vec<BitBoard>,
    bishop_entries: [MagicEntry; 64],
    rook_entries: [MagicEntry; 64],
}

static LEAPERS: LazyLock<LeaperTables> = LazyLock::new(build_leaper_tables);
static SLIDERS: LazyLock<SliderTables> = LazyLock::new(build_slider_tables);

/// Force-build all attack tables. Called at startup; tables also build
/// lazily on first lookup, so this is only needed to pay the cost up front.
pub fn init_attacks() {
    LazyLock::force(&LEAPERS);
    LazyLock::force(&SLIDERS);
}

// --- Leaper lookup functions ---

#[inline]
pub fn knight_attacks(sq: Square) -> BitBoard {
    LEAPERS.knight[sq.to_index()]
}

#[inline]
pub fn king_attacks(sq: Square) -> BitBoard {
    LEAPERS.king[sq.to_index()]
}

#[inline]
pub fn pawn_attacks(color: Color, sq: Square) -> BitBoard {
    LEAPERS.pawn[color.to_index()][sq.to_index()]
}

// --- Slider lookup functions ---

#[inline]
pub fn bishop_attacks(sq: Square, occupied: BitBoard) -> BitBoard {
    let entry = &SLIDERS.bishop_entries[sq.to_index()];
    let idx = magic_index(entry, occupied);
    SLIDERS.bishop_table[idx]
}

#[inline]
pub fn rook_attacks(sq: Square, occupied: BitBoard) -> BitBoard {
    let entry = &SLIDERS.rook_entries[sq.to_index()];
    let idx = magic_index(entry, occupied);
    SLIDERS.rook_table[idx]
}

#[inline]
#[allow(dead_code)] // Public API, used in tests; callers compose bishop|rook directly
pub fn queen_attacks(sq: Square, occupied: BitBoard) -> BitBoard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

/// Compute magic table index for a given occupancy.
#[inline]
fn magic_index(entry: &MagicEntry, occupied: BitBoard) -> usize {
    let blockers = occupied & entry.mask;
    let hash = blockers.0.wrapping_mul(entry.magic);
    entry.offset as usize + (hash >> entry.shift) as usize
}

// --- Initialization ---

fn build_leaper_tables() -> LeaperTables {
    let knight_offsets: [(i8, i8); 8] = [
        (-2, -1), (-2, 1), (-1, -2), (-1, 2),
        (1, -2), (1, 2), (2, -1), (2, 1),
    ];
    let king_offsets: [(i8, i8); 8] = [
        (-1, -1), (-1, 0), (-1, 1),
        (0, -1),           (0, 1),
        (1, -1),  (1, 0),  (1, 1),
    ];

    let mut knight = [BitBoard(0); 64];
    let mut king = [BitBoard(0); 64];
    let mut pawn = [[BitBoard(0); 64]; 2];

    for sq in 0..64u8 {
        let r = (sq >> 3) as i8;
        let f = (sq & 7) as i8;

        let mut nbb = 0u64;
        for (dr, df) in knight_offsets {
            let (nr, nf) = (r + dr, f + df);
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                nbb |= 1u64 << (nr * 8 + nf);
            }
        }
        knight[sq as usize] = BitBoard(nbb);

        let mut kbb = 0u64;
        for (dr, df) in king_offsets {
            let (nr, nf) = (r + dr, f + df);
            if (0..8).contains(&nr) && (0..8).contains(&nf) {
                kbb |= 1u64 << (nr * 8 + nf);
            }
        }
        king[sq as usize] = BitBoard(kbb);

        // White's forward direction is toward decreasing rank index (rank 0 =
        // FEN rank 8), i.e. r - 1; Black's is r + 1.
        let mut white = 0u64;
        let mut black = 0u64;
        if r - 1 >= 0 {
            if f > 0 { white |= 1u64 << ((r - 1) * 8 + (f - 1)); }
            if f + 1 < 8 { white |= 1u64 << ((r - 1) * 8 + (f + 1)); }
        }
        if r + 1 < 8 {
            if f > 0 { black |= 1u64 << ((r + 1) * 8 + (f - 1)); }
            if f + 1 < 8 { black |= 1u64 << ((r + 1) * 8 + (f + 1)); }
        }
        pawn[0][sq as usize] = BitBoard(white);
        pawn[1][sq as usize] = BitBoard(black);
    }

    LeaperTables { knight, king, pawn }
}

fn build_slider_tables() -> SliderTables {
    let mut rng = Rng(0x12345678_9ABCDEF0); // fixed seed for deterministic init

    let mut bishop_total = 0usize;
    let mut rook_total = 0usize;
    for sq in 0..64 {
        bishop_total += 1 << BISHOP_BITS[sq];
        rook_total += 1 << ROOK_BITS[sq];
    }

    let mut bishop_table = vec![BitBoard(0); bishop_total];
    let mut rook_table = vec![BitBoard(0); rook_total];
    let mut bishop_entries: [MagicEntry; 64] = std::array::from_fn(|_| MagicEntry {
        mask: BitBoard(0),
        magic: 0,
        shift: 0,
        offset: 0,
    });
    let mut rook_entries: [MagicEntry; 64] = std::array::from_fn(|_| MagicEntry {
        mask: BitBoard(0),
        magic: 0,
        shift: 0,
        offset: 0,
    });

    let mut offset = 0u32;
    for sq in 0..64 {
        let mask = bishop_mask(sq);
        let bits = BISHOP_BITS[sq];
        let shift = 64 - bits;
        let magic = find_magic(mask, bits, &|occ| bishop_attacks_slow(sq, occ), &mut rng);

        bishop_entries[sq] = MagicEntry { mask: BitBoard(mask), magic, shift, offset };

        let mut occ = 0u64;
        loop {
            let idx = offset as usize + ((occ.wrapping_mul(magic)) >> shift) as usize;
            bishop_table[idx] = BitBoard(bishop_attacks_slow(sq, occ));
            occ = occ.wrapping_sub(mask) & mask;
            if occ == 0 { break; }
        }

        offset += 1u32 << bits;
    }

    offset = 0;
    for sq in 0..64 {
        let mask = rook_mask(sq);
        let bits = ROOK_BITS[sq];
        let shift = 64 - bits;
        let magic = find_magic(mask, bits, &|occ| rook_attacks_slow(sq, occ), &mut rng);

        rook_entries[sq] = MagicEntry { mask: BitBoard(mask), magic, shift, offset };

        let mut occ = 0u64;
        loop {
            let idx = offset as usize + ((occ.wrapping_mul(magic)) >> shift) as usize;
            rook_table[idx] = BitBoard(rook_attacks_slow(sq, occ));
            occ = occ.wrapping_sub(mask) & mask;
            if occ == 0 { break; }
        }

        offset += 1u32 << bits;
    }

    SliderTables { bishop_table, rook_table, bishop_entries, rook_entries }
}

// --- Reference (slow) ray-trace generators used during init only ---

fn bishop_mask(sq: usize) -> u64 {
    let mut mask = 0u64;
    let r = (sq / 8) as i8;
    let f = (sq % 8) as i8;

    for &(dr, df) in &[(1i8, 1i8), (1, -1), (-1, 1), (-1, -1)] {
        let mut nr = r + dr;
        let mut nf = f + df;
        while nr > 0 && nr < 7 && nf > 0 && nf < 7 {
            mask |= 1u64 << (nr * 8 + nf);
            nr += dr;
            nf += df;
        }
    }
    mask
}

fn rook_mask(sq: usize) -> u64 {
    let mut mask = 0u64;
    let r = (sq / 8) as i8;
    let f = (sq % 8) as i8;

    for nf in 1..7i8 {
        if nf != f {
            mask |= 1u64 << (r * 8 + nf);
        }
    }
    for nr in 1..7i8 {
        if nr != r {
            mask |= 1u64 << (nr * 8 + f);
        }
    }
    mask
}

fn bishop_attacks_slow(sq: usize, occupied: u64) -> u64 {
    let mut attacks = 0u64;
    let r = (sq / 8) as i8;
    let f = (sq % 8) as i8;

    for &(dr, df) in &[(1i8, 1i8), (1, -1), (-1, 1), (-1, -1)] {
        let mut nr = r + dr;
        let mut nf = f + df;
        while (0..8).contains(&nr) && (0..8).contains(&nf) {
            let bit = 1u64 << (nr * 8 + nf);
            attacks |= bit;
            if occupied & bit != 0 { break; }
            nr += dr;
            nf += df;
        }
    }
    attacks
}

fn rook_attacks_slow(sq: usize, occupied: u64) -> u64 {
    let mut attacks = 0u64;
    let r = (sq / 8) as i8;
    let f = (sq % 8) as i8;

    for &(dr, df) in &[(0i8, 1i8), (0, -1), (1, 0), (-1, 0)] {
        let mut nr = r + dr;
        let mut nf = f + df;
        while (0..8).contains(&nr) && (0..8).contains(&nf) {
            let bit = 1u64 << (nr * 8 + nf);
            attacks |= bit;
            if occupied & bit != 0 { break; }
            nr += dr;
            nf += df;
        }
    }
    attacks
}


// precompute attack tables for every piece type on every square, built once behind LazyLock.
// Excluding edges from the slider occupancy masks: a piece on the edge can't block further travel
// regardless, so leaving it out of the mask shrinks the table without changing any lookup result.
