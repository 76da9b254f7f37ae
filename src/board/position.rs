use std::fmt;
use std::str::FromStr;

use super::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use super::bitboard::{BitBoard, EMPTY};
use super::chessmove::{ChessMove, MoveFlag};
use super::piece::{Color, Piece};
use super::square::{File, Rank, Square};
use super::undo::UndoRecord;
use super::zobrist;
use crate::error::FenError;

/// Castling rights stored as a 4-bit mask.
/// Bit 0: White kingside, Bit 1: White queenside, Bit 2: Black kingside, Bit 3: Black queenside.
pub const WK: u8 = 1;
pub const WQ: u8 = 2;
pub const BK: u8 = 4;
pub const BQ: u8 = 8;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
}

/// A chess position: piece placement plus the state needed to make and
/// unmake moves (side to move, castling rights, en passant target,
/// clocks, and an incrementally maintained Zobrist hash).
///
/// Pieces are stored twice: as six per-type bitboards split by two
/// per-color bitboards (fast for pattern queries — "every white pawn",
/// "all occupied squares") and as a flat 64-entry mailbox (fast for
/// single-square lookups, used by the evaluator and the UCI move parser).
/// Both views are kept in sync on every `make_move`/`unmake_move`.
#[derive(Clone, Copy, Debug)]
pub struct Position {
    pieces: [BitBoard; 6],
    colors: [BitBoard; 2],
    mailbox: [Option<(Piece, Color)>; 64],
    side_to_move: Color,
    castling: u8,
    ep_square: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    hash: u64,
    checkers: BitBoard,
}

impl Position {
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.mailbox[sq.to_index()].map(|(p, _)| p)
    }

    #[inline]
    pub fn color_on(&self, sq: Square) -> Option<Color> {
        self.mailbox[sq.to_index()].map(|(_, c)| c)
    }

    pub fn checkers(&self) -> BitBoard {
        self.checkers
    }

    pub fn in_check(&self) -> bool {
        !self.checkers.is_empty()
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.ep_square
    }

    pub fn color_combined(&self, color: Color) -> BitBoard {
        self.colors[color.to_index()]
    }

    pub fn pieces(&self, piece: Piece) -> BitBoard {
        self.pieces[piece.to_index()]
    }

    pub fn combined(&self) -> BitBoard {
        self.colors[0] | self.colors[1]
    }

    pub fn get_hash(&self) -> u64 {
        self.hash
    }

    pub fn castling_rights(&self) -> u8 {
        self.castling
    }

    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        let bb = self.pieces[Piece::King.to_index()] & self.colors[color.to_index()];
        if bb.is_empty() {
            None
        } else {
            Some(Square::new(bb.0.trailing_zeros() as u8))
        }
    }

    /// Is `sq` attacked by any piece of `by`? The sole legality and
    /// check-detection oracle: castling's pass-through squares, a king's
    /// destination square, and post-move self-check all route through here.
    pub fn attacked_by(&self, sq: Square, by: Color) -> bool {
        let occupied = self.combined();
        let attackers = self.colors[by.to_index()];

        if !(knight_attacks(sq) & self.pieces[Piece::Knight.to_index()] & attackers).is_empty() {
            return true;
        }
        if !(king_attacks(sq) & self.pieces[Piece::King.to_index()] & attackers).is_empty() {
            return true;
        }
        // pawn_attacks(by, sq) gives squares a `by`-colored pawn on `sq` would
        // attack; a `by` pawn attacks `sq` from the mirrored direction, i.e.
        // the set of squares from which `!by` would attack `sq` via a pawn push.
        if !(pawn_attacks(!by, sq) & self.pieces[Piece::Pawn.to_index()] & attackers).is_empty() {
            return true;
        }
        let diag = self.pieces[Piece::Bishop.to_index()] | self.pieces[Piece::Queen.to_index()];
        if !(bishop_attacks(sq, occupied) & diag & attackers).is_empty() {
            return true;
        }
        let straight = self.pieces[Piece::Rook.to_index()] | self.pieces[Piece::Queen.to_index()];
        if !(rook_attacks(sq, occupied) & straight & attackers).is_empty() {
            return true;
        }
        false
    }

    pub fn status(&self) -> GameStatus {
        if self.has_legal_move() {
            GameStatus::Ongoing
        } else if self.in_check() {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        }
    }

    fn has_legal_move(&self) -> bool {
        use super::movegen::{generate_pseudo_legal, MoveList};
        let mut moves = MoveList::new();
        generate_pseudo_legal(self, &mut moves);
        let mut pos = *self;
        for mv in moves {
            let undo = pos.make_move(mv);
            let legal = !pos.attacked_by(
                pos.king_square(!pos.side_to_move).expect("king missing"),
                pos.side_to_move,
            );
            pos.unmake_move(mv, undo);
            if legal {
                return true;
            }
        }
        false
    }

    #[inline]
    fn put_piece(&mut self, piece: Piece, color: Color, sq: Square) {
        let bb = BitBoard::from_square(sq);
        self.pieces[piece.to_index()] |= bb;
        self.colors[color.to_index()] |= bb;
        self.mailbox[sq.to_index()] = Some((piece, color));
        self.hash ^= zobrist::piece_key(piece.to_index(), color.to_index(), sq.to_index());
    }

    #[inline]
    fn remove_piece(&mut self, piece: Piece, color: Color, sq: Square) {
        let bb = BitBoard::from_square(sq);
        self.pieces[piece.to_index()] ^= bb;
        self.colors[color.to_index()] ^= bb;
        self.mailbox[sq.to_index()] = None;
        self.hash ^= zobrist::piece_key(piece.to_index(), color.to_index(), sq.to_index());
    }

    /// Apply `mv` in place and return the information needed to undo it.
    /// Does not check legality; the caller filters with `attacked_by` after
    /// the fact, using the king-in-check test as the sole legality oracle.
    ///
    /// 1. hash out the old castling rights and en passant file
    /// 2. record what's being destroyed (capture, rights, clocks)
    /// 3. remove the moving piece from its source square
    /// 4. resolve and remove any captured piece (en passant captures a
    ///    pawn that is not on the destination square)
    /// 5. place the moving (or promoted) piece on the destination square
    /// 6. for castling, also relocate the rook
    /// 7. update castling rights via the from/to castling mask
    /// 8. set a new en passant square on a double pawn push
    /// 9. update the halfmove clock and fullmove number
    /// 10. hash in the new castling rights, en passant file, and side key
    /// 11. recompute cached checkers for the side now to move
    pub fn make_move(&mut self, mv: ChessMove) -> UndoRecord {
        let src = mv.get_source();
        let dst = mv.get_dest();
        let us = self.side_to_move;
        let them = !us;

        let piece = self.piece_on(src).expect("no piece on source square");
        let (captured, captured_square) = if mv.is_en_passant() {
            (Some(Piece::Pawn), Some(ep_capture_square(us, dst)))
        } else {
            let cap = self.piece_on(dst);
            (cap, cap.map(|_| dst))
        };

        let record = UndoRecord {
            mv,
            captured,
            captured_square,
            castling_rights: self.castling,
            ep_square: self.ep_square,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
            checkers: self.checkers,
        };

        self.hash ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.ep_square {
            self.hash ^= zobrist::ep_key(ep.file().to_index());
        }

        self.remove_piece(piece, us, src);

        if let (Some(cap), Some(cap_sq)) = (captured, captured_square) {
            self.remove_piece(cap, them, cap_sq);
        }

        let placed = mv.get_promotion().unwrap_or(piece);
        self.put_piece(placed, us, dst);

        if mv.is_castling() {
            let (rook_src, rook_dst) = castling_rook_squares(src, dst);
            self.remove_piece(Piece::Rook, us, rook_src);
            self.put_piece(Piece::Rook, us, rook_dst);
        }

        self.castling &= CASTLING_MASK[src.to_index()];
        self.castling &= CASTLING_MASK[dst.to_index()];

        self.ep_square = None;
        if piece == Piece::Pawn {
            let src_rank = src.rank().to_index();
            let dst_rank = dst.rank().to_index();
            if src_rank.abs_diff(dst_rank) == 2 {
                let ep_rank = (src_rank + dst_rank) / 2;
                self.ep_square = Some(Square::make_square(Rank::from_index(ep_rank), src.file()));
            }
        }

        if piece == Piece::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        if us == Color::Black {
            self.fullmove_number += 1;
        }

        self.hash ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.ep_square {
            self.hash ^= zobrist::ep_key(ep.file().to_index());
        }
        self.side_to_move = them;
        self.hash ^= zobrist::side_key();

        self.checkers = self.compute_checkers();

        record
    }

    /// Reverse exactly what `make_move` did, using the values it recorded.
    /// `mv` must be the move the record came from.
    pub fn unmake_move(&mut self, mv: ChessMove, undo: UndoRecord) {
        let src = mv.get_source();
        let dst = mv.get_dest();
        let them = self.side_to_move; // side that just moved, before we flip back
        let us = !them;

        self.side_to_move = us;

        let placed_piece = self.piece_on(dst).expect("no piece on destination square");
        let moved_piece = if mv.get_promotion().is_some() { Piece::Pawn } else { placed_piece };
        self.remove_piece(placed_piece, us, dst);
        self.put_piece(moved_piece, us, src);

        if mv.is_castling() {
            let (rook_src, rook_dst) = castling_rook_squares(src, dst);
            self.remove_piece(Piece::Rook, us, rook_dst);
            self.put_piece(Piece::Rook, us, rook_src);
        }

        if let (Some(cap), Some(cap_sq)) = (undo.captured, undo.captured_square) {
            self.put_piece(cap, them, cap_sq);
        }

        self.castling = undo.castling_rights;
        self.ep_square = undo.ep_square;
        self.halfmove_clock = undo.halfmove_clock;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }
        self.hash = undo.hash;
        self.checkers = undo.checkers;
    }

    /// Make a move, filter it against the single legality oracle
    /// (`attacked_by` on the king that just moved into danger), and undo it
    /// if illegal. Returns the updated position only when the move survives.
    pub fn try_make_move(&self, mv: ChessMove) -> Option<Position> {
        let mut pos = *self;
        let undo = pos.make_move(mv);
        let mover = !pos.side_to_move;
        if pos.attacked_by(pos.king_square(mover)?, pos.side_to_move) {
            pos.unmake_move(mv, undo);
            return None;
        }
        Some(pos)
    }

    pub fn legal(&self, mv: ChessMove) -> bool {
        use super::movegen::{generate_pseudo_legal, MoveList};
        let mut moves = MoveList::new();
        generate_pseudo_legal(self, &mut moves);
        moves.contains(&mv) && self.try_make_move(mv).is_some()
    }

    fn compute_checkers(&self) -> BitBoard {
        let us = self.side_to_move;
        match self.king_square(us) {
            Some(king_sq) if self.attacked_by(king_sq, !us) => self.attackers_of(king_sq, !us),
            _ => EMPTY,
        }
    }

    fn attackers_of(&self, sq: Square, by: Color) -> BitBoard {
        let occupied = self.combined();
        let attackers = self.colors[by.to_index()];
        let mut result = EMPTY;
        result |= knight_attacks(sq) & self.pieces[Piece::Knight.to_index()] & attackers;
        result |= king_attacks(sq) & self.pieces[Piece::King.to_index()] & attackers;
        result |= pawn_attacks(!by, sq) & self.pieces[Piece::Pawn.to_index()] & attackers;
        let diag = self.pieces[Piece::Bishop.to_index()] | self.pieces[Piece::Queen.to_index()];
        result |= bishop_attacks(sq, occupied) & diag & attackers;
        let straight = self.pieces[Piece::Rook.to_index()] | self.pieces[Piece::Queen.to_index()];
        result |= rook_attacks(sq, occupied) & straight & attackers;
        result
    }

    fn compute_hash(&self) -> u64 {
        let mut h = 0u64;
        for piece in Piece::ALL {
            for color in [Color::White, Color::Black] {
                let mut bb = self.pieces[piece.to_index()] & self.colors[color.to_index()];
                while !bb.is_empty() {
                    let sq_idx = bb.0.trailing_zeros() as usize;
                    h ^= zobrist::piece_key(piece.to_index(), color.to_index(), sq_idx);
                    bb.0 &= bb.0 - 1;
                }
            }
        }
        if self.side_to_move == Color::Black {
            h ^= zobrist::side_key();
        }
        h ^= zobrist::castling_key(self.castling);
        if let Some(ep) = self.ep_square {
            h ^= zobrist::ep_key(ep.file().to_index());
        }
        h
    }
}

/// The pawn an en-passant capture actually removes sits one rank behind the
/// destination square, toward whichever side just pushed it two ranks.
fn ep_capture_square(mover: Color, dst: Square) -> Square {
    match mover {
        Color::White => Square::new(dst.to_index() as u8 + 8),
        Color::Black => Square::new(dst.to_index() as u8 - 8),
    }
}

fn castling_rook_squares(king_src: Square, king_dst: Square) -> (Square, Square) {
    let rank = king_src.rank();
    if king_dst.file().to_index() == 6 {
        (
            Square::make_square(rank, File::from_index(7)),
            Square::make_square(rank, File::from_index(5)),
        )
    } else {
        (
            Square::make_square(rank, File::from_index(0)),
            Square::make_square(rank, File::from_index(3)),
        )
    }
}

// Index by the square a piece moves from or to; AND the current rights with
// this mask. Handles king moves, rook moves, and rook captures uniformly.
// a1=56 (White queenside rook), h1=63 (White kingside rook), e1=60 (White king),
// a8=0 (Black queenside rook), h8=7 (Black kingside rook), e8=4 (Black king).
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0xFFu8; 64];
    mask[56] = 0xFF ^ WQ;
    mask[63] = 0xFF ^ WK;
    mask[60] = 0xFF ^ (WK | WQ);
    mask[0] = 0xFF ^ BQ;
    mask[7] = 0xFF ^ BK;
    mask[4] = 0xFF ^ (BK | BQ);
    mask
};

impl Default for Position {
    fn default() -> Self {
        Position::from_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("invalid starting FEN")
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.pieces == other.pieces
            && self.colors == other.colors
            && self.side_to_move == other.side_to_move
            && self.castling == other.castling
            && self.ep_square == other.ep_square
    }
}

impl Eq for Position {}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::FieldCount(parts.len()));
        }

        let mut pieces = [EMPTY; 6];
        let mut colors = [EMPTY; 2];
        let mut mailbox: [Option<(Piece, Color)>; 64] = [None; 64];

        // Rank index 0 is FEN rank 8, the first rank the placement field
        // lists, so we walk the field top-to-bottom without reversing.
        let mut rank = 0i8;
        let mut file = 0i8;
        for ch in parts[0].chars() {
            if ch == '/' {
                rank += 1;
                file = 0;
                continue;
            }
            if let Some(skip) = ch.to_digit(10) {
                file += skip as i8;
                continue;
            }
            if !(0..8).contains(&rank) || !(0..8).contains(&file) {
                return Err(FenError::RankOverflow);
            }

            let color = if ch.is_uppercase() { Color::White } else { Color::Black };
            let piece = match ch.to_ascii_lowercase() {
                'p' => Piece::Pawn,
                'n' => Piece::Knight,
                'b' => Piece::Bishop,
                'r' => Piece::Rook,
                'q' => Piece::Queen,
                'k' => Piece::King,
                _ => return Err(FenError::BadPiece(ch)),
            };

            let sq = Square::make_square(Rank::from_index(rank as usize), File::from_index(file as usize));
            let bb = BitBoard::from_square(sq);
            pieces[piece.to_index()] |= bb;
            colors[color.to_index()] |= bb;
            mailbox[sq.to_index()] = Some((piece, color));
            file += 1;
        }

        let side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::BadSide(other.to_string())),
        };

        let mut castling = 0u8;
        for ch in parts[2].chars() {
            match ch {
                'K' => castling |= WK,
                'Q' => castling |= WQ,
                'k' => castling |= BK,
                'q' => castling |= BQ,
                '-' => {}
                other => return Err(FenError::BadCastling(other)),
            }
        }

        let ep_square = if parts[3] == "-" {
            None
        } else {
            let bytes = parts[3].as_bytes();
            if bytes.len() != 2 {
                return Err(FenError::BadEnPassant(parts[3].to_string()));
            }
            let f = bytes[0].wrapping_sub(b'a');
            let fen_rank = (bytes[1] as char).to_digit(10).ok_or_else(|| FenError::BadEnPassant(parts[3].to_string()))?;
            if f >= 8 || !(1..=8).contains(&fen_rank) {
                return Err(FenError::BadEnPassant(parts[3].to_string()));
            }
            Some(Square::make_square(Rank::from_fen_number(fen_rank as u8), File::from_index(f as usize)))
        };

        let halfmove_clock = parts.get(4).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0).min(200);
        let fullmove_number = parts.get(5).and_then(|s| s.parse::<u16>().ok()).unwrap_or(1).clamp(1, 2000);

        let mut pos = Position {
            pieces,
            colors,
            mailbox,
            side_to_move,
            castling,
            ep_square,
            halfmove_clock,
            fullmove_number,
            hash: 0,
            checkers: EMPTY,
        };

        pos.hash = pos.compute_hash();
        pos.checkers = pos.compute_checkers();

        Ok(pos)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in 0..8 {
            let mut empty_count = 0;
            for file in 0..8 {
                let sq = Square::make_square(Rank::from_index(rank), File::from_index(file));
                if let Some(piece) = self.piece_on(sq) {
                    if empty_count > 0 {
                        write!(f, "{}", empty_count)?;
                        empty_count = 0;
                    }
                    let color = self.color_on(sq).unwrap();
                    write!(f, "{}", piece_to_char(piece, color))?;
                } else {
                    empty_count += 1;
                }
            }
            if empty_count > 0 {
                write!(f, "{}", empty_count)?;
            }
            if rank < 7 {
                write!(f, "/")?;
            }
        }

        write!(f, " {}", if self.side_to_move == Color::White { "w" } else { "b" })?;

        write!(f, " ")?;
        if self.castling == 0 {
            write!(f, "-")?;
        } else {
            if self.castling & WK != 0 { write!(f, "K")?; }
            if self.castling & WQ != 0 { write!(f, "Q")?; }
            if self.castling & BK != 0 { write!(f, "k")?; }
            if self.castling & BQ != 0 { write!(f, "q")?; }
        }

        write!(f, " ")?;
        if let Some(ep) = self.ep_square {
            write!(f, "{}", ep)?;
        } else {
            write!(f, "-")?;
        }

        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)?;

        Ok(())
    }
}

fn piece_to_char(piece: Piece, color: Color) -> char {
    let ch = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    if color == Color::White { ch.to_ascii_uppercase() } else { ch }
}
