use crate::board::{BitBoard, Color, Piece, Position, Square, ALL_SQUARES};
use crate::pst::{self, EG_PIECE_VALUE, EG_TABLE, MG_PIECE_VALUE, MG_TABLE, PHASE_WEIGHT, TOTAL_PHASE};
use crate::types::Score;

fn piece_index(piece: Piece) -> usize {
    match piece {
        Piece::Pawn => pst::PAWN,
        Piece::Knight => pst::KNIGHT,
        Piece::Bishop => pst::BISHOP,
        Piece::Rook => pst::ROOK,
        Piece::Queen => pst::QUEEN,
        Piece::King => pst::KING,
    }
}

const DOUBLED_PAWN: (i32, i32) = (-12, -29);
const ISOLATED_PAWN: (i32, i32) = (-11, -15);
const PASSED_PAWN: [(i32, i32); 8] = [
    (0, 0), (5, 15), (7, 22), (13, 36), (21, 62), (34, 119), (51, 198), (0, 0),
];
const BISHOP_PAIR: (i32, i32) = (47, 64);
const KNIGHT_SUPPORTED: (i32, i32) = (11, 13);
const BISHOP_OBSTRUCTED: (i32, i32) = (-11, -11);
const ROOK_OPEN_FILE: (i32, i32) = (48, 20);
const ROOK_SEMI_OPEN_FILE: (i32, i32) = (20, 10);
const TRAPPED_ROOK: (i32, i32) = (-44, -13);
const PAWN_ON_MINOR: (i32, i32) = (55, 33);
const PAWN_ON_MAJOR: (i32, i32) = (68, 48);
const MINOR_ON_MAJOR: (i32, i32) = (33, 20);
const ROOK_ON_QUEEN: (i32, i32) = (42, 28);
const HANGING: (i32, i32) = (-14, -20);
const SPACE_BONUS: (i32, i32) = (7, 0);

// Mobility curves: score per count of available destination squares.
const KNIGHT_MOBILITY: [(i32, i32); 9] = [
    (-30, -30), (-20, -22), (-10, -12), (0, -2), (8, 8), (15, 16), (20, 22), (24, 26), (26, 28),
];
const BISHOP_MOBILITY: [(i32, i32); 14] = [
    (-28, -30), (-18, -20), (-8, -10), (0, 0), (6, 8), (12, 14), (18, 18),
    (22, 22), (26, 25), (29, 27), (31, 29), (32, 30), (33, 31), (34, 32),
];
const ROOK_MOBILITY: [(i32, i32); 15] = [
    (-22, -30), (-14, -20), (-6, -10), (0, 0), (4, 8), (8, 14), (12, 20), (16, 26),
    (19, 30), (22, 33), (24, 35), (26, 37), (27, 38), (28, 39), (29, 40),
];
const QUEEN_MOBILITY: [(i32, i32); 28] = [
    (-10, -16), (-7, -12), (-4, -8), (-1, -4), (2, 0), (4, 3), (6, 6), (8, 9),
    (10, 12), (12, 14), (13, 16), (14, 18), (15, 19), (16, 20), (17, 21), (18, 22),
    (19, 23), (19, 24), (20, 24), (20, 25), (21, 25), (21, 26), (22, 26), (22, 27),
    (23, 27), (23, 28), (24, 28), (24, 29),
];

// Attacker weights for king safety: knight, bishop, rook, queen.
const KING_ATTACK_WEIGHT: [i32; 4] = [31, 33, 53, 93];

const PAWN_SHIELD: [i32; 8] = [-40, -5, 10, 18, 24, 28, 30, 15];

fn king_safety_curve(index: usize) -> (i32, i32) {
    // Monotone curve, roughly quadratic up to the clamp at 99, matching the
    // shape of the classic "king danger table" used by many engines.
    let i = index.min(99) as i32;
    let mg = -(i * i) / 45;
    let eg = -(i * i) / 90;
    (mg, eg)
}

/// Evaluate a position from the side-to-move's perspective. Pure function:
/// no mutable state, no caching, no I/O.
pub fn evaluate(pos: &Position) -> Score {
    let mut mg = [0i32; 2];
    let mut eg = [0i32; 2];
    let mut phase = 0i32;

    for sq in ALL_SQUARES {
        if let Some(piece) = pos.piece_on(sq) {
            let color = pos.color_on(sq).unwrap();
            let idx = piece_index(piece);
            let side = color.to_index();

            mg[side] += MG_PIECE_VALUE[idx];
            eg[side] += EG_PIECE_VALUE[idx];

            let pst_sq = if color == Color::White { sq } else { sq.flip() };
            mg[side] += MG_TABLE[idx][pst_sq.to_index()];
            eg[side] += EG_TABLE[idx][pst_sq.to_index()];

            phase += PHASE_WEIGHT[idx];
        }
    }

    add_pawn_structure(pos, &mut mg, &mut eg);
    add_imbalance(pos, &mut mg, &mut eg);
    add_piece_specific(pos, &mut mg, &mut eg);
    add_mobility(pos, &mut mg, &mut eg);
    add_threats(pos, &mut mg, &mut eg);
    add_passed_pawns(pos, &mut mg, &mut eg);
    add_space(pos, &mut mg, &mut eg);
    add_king_safety(pos, &mut mg, &mut eg);

    phase = phase.min(TOTAL_PHASE);

    let mg_total = mg[0] - mg[1];
    let eg_total = eg[0] - eg[1];
    let score = (mg_total * phase + eg_total * (TOTAL_PHASE - phase)) / TOTAL_PHASE;

    if pos.side_to_move() == Color::White {
        score
    } else {
        -score
    }
}

fn file_of(sq: Square) -> usize {
    sq.file().to_index()
}

fn pawns_on_file(pawns: BitBoard, file: usize) -> u32 {
    let mut count = 0;
    for sq in pawns.iter() {
        if file_of(sq) == file {
            count += 1;
        }
    }
    count
}

fn add_pawn_structure(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        let pawns = pos.pieces(Piece::Pawn) & pos.color_combined(color);

        for file in 0..8 {
            let count = pawns_on_file(pawns, file);
            if count > 1 {
                mg[side] += DOUBLED_PAWN.0 * (count as i32 - 1);
                eg[side] += DOUBLED_PAWN.1 * (count as i32 - 1);
            }
        }

        for sq in pawns.iter() {
            let file = file_of(sq);
            let left = if file > 0 { pawns_on_file(pawns, file - 1) } else { 0 };
            let right = if file < 7 { pawns_on_file(pawns, file + 1) } else { 0 };
            if left == 0 && right == 0 {
                mg[side] += ISOLATED_PAWN.0;
                eg[side] += ISOLATED_PAWN.1;
            }
        }
    }
}

/// Count of each piece type for one color, used for the bishop-pair bonus
/// and the pair-interaction table.
fn piece_counts(pos: &Position, color: Color) -> [i32; 5] {
    let mut counts = [0i32; 5];
    for (idx, piece) in [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
        .into_iter()
        .enumerate()
    {
        counts[idx] = (pos.pieces(piece) & pos.color_combined(color)).popcnt() as i32;
    }
    counts
}

// Interaction bonus (opening, endgame) per (own-piece-type, own-count) pair,
// indexed [piece][other_piece]: own minor/major pieces gain or lose value
// depending on how many of another type the same side holds. A small,
// hand-tuned 5x5 table in the spirit of the classic "imbalance" term.
const PAIR_INTERACTION: [[(i32, i32); 5]; 5] = [
    [(0, 0), (2, 1), (2, 1), (0, 0), (-2, 0)],   // pawn row
    [(2, 1), (0, 0), (1, 1), (-1, 0), (-3, -1)], // knight row
    [(2, 1), (1, 1), (0, 0), (0, 0), (-2, 0)],   // bishop row
    [(0, 0), (-1, 0), (0, 0), (0, 0), (-4, -2)], // rook row
    [(-2, 0), (-3, -1), (-2, 0), (-4, -2), (0, 0)], // queen row
];

fn add_imbalance(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        if (pos.pieces(Piece::Bishop) & pos.color_combined(color)).popcnt() >= 2 {
            mg[side] += BISHOP_PAIR.0;
            eg[side] += BISHOP_PAIR.1;
        }

        let counts = piece_counts(pos, color);
        for i in 0..5 {
            for j in 0..5 {
                if counts[i] > 0 && counts[j] > 0 {
                    let (m, e) = PAIR_INTERACTION[i][j];
                    mg[side] += m * counts[i] * counts[j] / 4;
                    eg[side] += e * counts[i] * counts[j] / 4;
                }
            }
        }
    }
}

fn add_piece_specific(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        let own_pawns = pos.pieces(Piece::Pawn) & pos.color_combined(color);

        for sq in (pos.pieces(Piece::Knight) & pos.color_combined(color)).iter() {
            if !(crate::board::pawn_attacks(color, sq) & own_pawns).is_empty() {
                mg[side] += KNIGHT_SUPPORTED.0;
                eg[side] += KNIGHT_SUPPORTED.1;
            }
        }

        for sq in (pos.pieces(Piece::Bishop) & pos.color_combined(color)).iter() {
            let dark = (sq.to_index() + sq.to_index() / 8) % 2 == 0;
            let mut obstructed = 0;
            for pawn_sq in own_pawns.iter() {
                let pawn_dark = (pawn_sq.to_index() + pawn_sq.to_index() / 8) % 2 == 0;
                if pawn_dark == dark {
                    obstructed += 1;
                }
            }
            mg[side] += BISHOP_OBSTRUCTED.0 * obstructed;
            eg[side] += BISHOP_OBSTRUCTED.1 * obstructed;
        }

        for sq in (pos.pieces(Piece::Rook) & pos.color_combined(color)).iter() {
            let file = file_of(sq);
            let friendly_on_file = pawns_on_file(own_pawns, file);
            let enemy_pawns = pos.pieces(Piece::Pawn) & pos.color_combined(!color);
            let enemy_on_file = pawns_on_file(enemy_pawns, file);
            if friendly_on_file == 0 && enemy_on_file == 0 {
                mg[side] += ROOK_OPEN_FILE.0;
                eg[side] += ROOK_OPEN_FILE.1;
            } else if friendly_on_file == 0 {
                mg[side] += ROOK_SEMI_OPEN_FILE.0;
                eg[side] += ROOK_SEMI_OPEN_FILE.1;
            }
        }

        if let Some(trapped) = trapped_rook_count(pos, color) {
            mg[side] += TRAPPED_ROOK.0 * trapped;
            eg[side] += TRAPPED_ROOK.1 * trapped;
        }
    }
}

/// A rook is "trapped" when the king has castled to its own side and the
/// rook on that corner has not moved off the back rank toward the center.
fn trapped_rook_count(pos: &Position, color: Color) -> Option<i32> {
    use crate::board::{Rank, File};
    let back = if color == Color::White { Rank::from_fen_number(1) } else { Rank::from_fen_number(8) };
    let king_sq = pos.king_square(color)?;
    if king_sq.rank().to_index() != back.to_index() {
        return None;
    }
    let king_file = king_sq.file().to_index();
    let mut count = 0;
    if king_file >= 6 {
        let corner = Square::make_square(back, File::from_index(7));
        if pos.piece_on(corner) == Some(Piece::Rook) && pos.color_on(corner) == Some(color) {
            count += 1;
        }
    } else if king_file <= 1 {
        let corner = Square::make_square(back, File::from_index(0));
        if pos.piece_on(corner) == Some(Piece::Rook) && pos.color_on(corner) == Some(color) {
            count += 1;
        }
    }
    Some(count)
}

fn add_mobility(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        let own = pos.color_combined(color);
        let enemy_pawns = pos.pieces(Piece::Pawn) & pos.color_combined(!color);
        let pawn_attacked = pawn_attack_set(pos, !color);
        let excluded = own | enemy_pawns | pawn_attacked;
        let occupied = pos.combined();

        for sq in (pos.pieces(Piece::Knight) & own).iter() {
            let count = (crate::board::knight_attacks(sq) & !excluded).popcnt() as usize;
            let (m, e) = KNIGHT_MOBILITY[count.min(8)];
            mg[side] += m;
            eg[side] += e;
        }
        for sq in (pos.pieces(Piece::Bishop) & own).iter() {
            let count = (crate::board::bishop_attacks(sq, occupied) & !excluded).popcnt() as usize;
            let (m, e) = BISHOP_MOBILITY[count.min(13)];
            mg[side] += m;
            eg[side] += e;
        }
        for sq in (pos.pieces(Piece::Rook) & own).iter() {
            let count = (crate::board::rook_attacks(sq, occupied) & !excluded).popcnt() as usize;
            let (m, e) = ROOK_MOBILITY[count.min(14)];
            mg[side] += m;
            eg[side] += e;
        }
        for sq in (pos.pieces(Piece::Queen) & own).iter() {
            let count = ((crate::board::bishop_attacks(sq, occupied) | crate::board::rook_attacks(sq, occupied)) & !excluded).popcnt() as usize;
            let (m, e) = QUEEN_MOBILITY[count.min(27)];
            mg[side] += m;
            eg[side] += e;
        }
    }
}

fn pawn_attack_set(pos: &Position, color: Color) -> BitBoard {
    let mut set = BitBoard(0);
    for sq in (pos.pieces(Piece::Pawn) & pos.color_combined(color)).iter() {
        set |= crate::board::pawn_attacks(color, sq);
    }
    set
}

fn add_threats(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        let enemy = !color;
        let pawn_attacks = pawn_attack_set(pos, color);
        let minors = pos.pieces(Piece::Knight) | pos.pieces(Piece::Bishop);
        let majors = pos.pieces(Piece::Rook) | pos.pieces(Piece::Queen);

        let pawn_on_minor = (pawn_attacks & minors & pos.color_combined(enemy)).popcnt() as i32;
        mg[side] += PAWN_ON_MINOR.0 * pawn_on_minor;
        eg[side] += PAWN_ON_MINOR.1 * pawn_on_minor;

        let pawn_on_major = (pawn_attacks & majors & pos.color_combined(enemy)).popcnt() as i32;
        mg[side] += PAWN_ON_MAJOR.0 * pawn_on_major;
        eg[side] += PAWN_ON_MAJOR.1 * pawn_on_major;

        let occupied = pos.combined();
        let mut minor_on_major = 0;
        let mut rook_on_queen = 0;
        for sq in (minors & pos.color_combined(color)).iter() {
            let reach = if pos.piece_on(sq) == Some(Piece::Knight) {
                crate::board::knight_attacks(sq)
            } else {
                crate::board::bishop_attacks(sq, occupied)
            };
            minor_on_major += (reach & majors & pos.color_combined(enemy)).popcnt() as i32;
        }
        for sq in (pos.pieces(Piece::Rook) & pos.color_combined(color)).iter() {
            let reach = crate::board::rook_attacks(sq, occupied);
            rook_on_queen += (reach & pos.pieces(Piece::Queen) & pos.color_combined(enemy)).popcnt() as i32;
        }
        mg[side] += MINOR_ON_MAJOR.0 * minor_on_major;
        eg[side] += MINOR_ON_MAJOR.1 * minor_on_major;
        mg[side] += ROOK_ON_QUEEN.0 * rook_on_queen;
        eg[side] += ROOK_ON_QUEEN.1 * rook_on_queen;

        let hanging = hanging_count(pos, color);
        mg[side] += HANGING.0 * hanging;
        eg[side] += HANGING.1 * hanging;
    }
}

fn hanging_count(pos: &Position, color: Color) -> i32 {
    let enemy = !color;
    let mut count = 0;
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        for sq in (pos.pieces(piece) & pos.color_combined(color)).iter() {
            if pos.attacked_by(sq, enemy) && !pos.attacked_by(sq, color) {
                count += 1;
            }
        }
    }
    count
}

fn add_passed_pawns(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        let own_pawns = pos.pieces(Piece::Pawn) & pos.color_combined(color);
        let enemy_pawns = pos.pieces(Piece::Pawn) & pos.color_combined(!color);
        let enemy_king = match pos.king_square(!color) {
            Some(k) => k,
            None => continue,
        };
        let own_rooks = pos.pieces(Piece::Rook) & pos.color_combined(color);
        let enemy_rooks = pos.pieces(Piece::Rook) & pos.color_combined(!color);

        for sq in own_pawns.iter() {
            if !is_passed(sq, color, enemy_pawns) {
                continue;
            }
            let rank_from_own_side = rank_from_side(sq, color);
            let (mut bonus_mg, mut bonus_eg) = PASSED_PAWN[rank_from_own_side.min(7)];

            let promo_sq = promotion_square(sq, color);
            let dist = chebyshev(enemy_king, promo_sq) as i32;
            let scale = (10 + dist) as f64 / 10.0;
            bonus_mg = (bonus_mg as f64 * scale) as i32;
            bonus_eg = (bonus_eg as f64 * scale) as i32;

            let file = file_of(sq);
            if pawns_on_file(own_rooks, file) > 0 {
                bonus_mg = bonus_mg * 3 / 2;
                bonus_eg = bonus_eg * 3 / 2;
            }
            if rear_span_has_rook(sq, color, enemy_rooks) {
                bonus_mg /= 2;
                bonus_eg /= 2;
            }

            mg[side] += bonus_mg;
            eg[side] += bonus_eg;
        }
    }
}

fn is_passed(sq: Square, color: Color, enemy_pawns: BitBoard) -> bool {
    let file = file_of(sq) as i32;
    let rank = sq.rank().to_index() as i32;
    for p in enemy_pawns.iter() {
        let pf = file_of(p) as i32;
        if (pf - file).abs() > 1 {
            continue;
        }
        let pr = p.rank().to_index() as i32;
        let ahead = match color {
            Color::White => pr < rank,
            Color::Black => pr > rank,
        };
        if ahead {
            return false;
        }
    }
    true
}

fn rank_from_side(sq: Square, color: Color) -> usize {
    let rank = sq.rank().to_index();
    match color {
        Color::White => 7 - rank,
        Color::Black => rank,
    }
}

fn promotion_square(sq: Square, color: Color) -> Square {
    use crate::board::Rank;
    let rank = if color == Color::White { Rank::from_fen_number(8) } else { Rank::from_fen_number(1) };
    Square::make_square(rank, sq.file())
}

fn chebyshev(a: Square, b: Square) -> u32 {
    let af = file_of(a) as i32;
    let bf = file_of(b) as i32;
    let ar = a.rank().to_index() as i32;
    let br = b.rank().to_index() as i32;
    (af - bf).unsigned_abs().max((ar - br).unsigned_abs())
}

fn rear_span_has_rook(sq: Square, color: Color, enemy_rooks: BitBoard) -> bool {
    let file = file_of(sq) as i32;
    let rank = sq.rank().to_index() as i32;
    for r in enemy_rooks.iter() {
        if file_of(r) as i32 != file {
            continue;
        }
        let rr = r.rank().to_index() as i32;
        let behind = match color {
            Color::White => rr > rank,
            Color::Black => rr < rank,
        };
        if behind {
            return true;
        }
    }
    false
}

fn add_space(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        if !space_active(pos, color) {
            continue;
        }
        let occupied = pos.combined();
        let own = pos.color_combined(color);
        let enemy_pawn_attacks = pawn_attack_set(pos, !color);
        let zone = center_zone(color);

        let mut count = 0;
        for piece in [Piece::Knight, Piece::Bishop, Piece::Rook] {
            for sq in (pos.pieces(piece) & own).iter() {
                let reach = match piece {
                    Piece::Knight => crate::board::knight_attacks(sq),
                    Piece::Bishop => crate::board::bishop_attacks(sq, occupied),
                    Piece::Rook => crate::board::rook_attacks(sq, occupied),
                    _ => unreachable!(),
                };
                count += (reach & zone & !enemy_pawn_attacks).popcnt() as i32;
            }
        }
        mg[side] += SPACE_BONUS.0 * count;
        eg[side] += SPACE_BONUS.1 * count;
    }
}

fn space_active(pos: &Position, color: Color) -> bool {
    use crate::board::{File, Rank};
    let back = if color == Color::White { Rank::from_fen_number(1) } else { Rank::from_fen_number(8) };
    let d_home = if color == Color::White { Rank::from_fen_number(2) } else { Rank::from_fen_number(7) };
    let queen_home = Square::make_square(back, File::from_index(3));
    let d_pawn_home = Square::make_square(d_home, File::from_index(3));
    pos.piece_on(queen_home) == Some(Piece::Queen)
        && pos.color_on(queen_home) == Some(color)
        && pos.piece_on(d_pawn_home) == Some(Piece::Pawn)
        && pos.color_on(d_pawn_home) == Some(color)
}

fn center_zone(color: Color) -> BitBoard {
    use crate::board::{File, Rank};
    let mut zone = BitBoard(0);
    let ranks: [u8; 4] = if color == Color::White { [5, 6, 7, 8] } else { [1, 2, 3, 4] };
    for &fen_rank in &ranks {
        for file in 2..6 {
            let sq = Square::make_square(Rank::from_fen_number(fen_rank), File::from_index(file));
            zone |= BitBoard::from_square(sq);
        }
    }
    zone
}

fn add_king_safety(pos: &Position, mg: &mut [i32; 2], eg: &mut [i32; 2]) {
    for color in [Color::White, Color::Black] {
        let side = color.to_index();
        let king_sq = match pos.king_square(color) {
            Some(k) => k,
            None => continue,
        };
        let own_pawns = pos.pieces(Piece::Pawn) & pos.color_combined(color);

        let king_file = file_of(king_sq) as i32;
        for f in (king_file - 1)..=(king_file + 1) {
            if !(0..8).contains(&f) {
                continue;
            }
            let nearest = nearest_pawn_rank(own_pawns, f as usize, color);
            mg[side] += PAWN_SHIELD[nearest.min(7)];
            eg[side] += PAWN_SHIELD[nearest.min(7)] / 2;
        }

        let adjacent = crate::board::king_attacks(king_sq);
        let mut weight = 0i32;
        for (piece, w) in [
            (Piece::Knight, KING_ATTACK_WEIGHT[0]),
            (Piece::Bishop, KING_ATTACK_WEIGHT[1]),
            (Piece::Rook, KING_ATTACK_WEIGHT[2]),
            (Piece::Queen, KING_ATTACK_WEIGHT[3]),
        ] {
            let occupied = pos.combined();
            for sq in (pos.pieces(piece) & pos.color_combined(!color)).iter() {
                let reach = match piece {
                    Piece::Knight => crate::board::knight_attacks(sq),
                    Piece::Bishop => crate::board::bishop_attacks(sq, occupied),
                    Piece::Rook => crate::board::rook_attacks(sq, occupied),
                    Piece::Queen => crate::board::bishop_attacks(sq, occupied) | crate::board::rook_attacks(sq, occupied),
                    _ => unreachable!(),
                };
                if !(reach & adjacent).is_empty() {
                    weight += w;
                }
            }
        }

        let (penalty_mg, penalty_eg) = king_safety_curve(weight.min(99) as usize);
        mg[side] += penalty_mg;
        eg[side] += penalty_eg;
    }
}

fn nearest_pawn_rank(pawns: BitBoard, file: usize, color: Color) -> usize {
    let mut best: Option<usize> = None;
    for sq in pawns.iter() {
        if file_of(sq) != file {
            continue;
        }
        let dist = rank_from_side(sq, color);
        best = Some(best.map_or(dist, |b| b.min(dist)));
    }
    best.unwrap_or(0)
}
