use arrayvec::ArrayVec;

use super::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};
use super::bitboard::{BitBoard, EMPTY};
use super::chessmove::ChessMove;
use super::piece::{Color, Piece};
use super::position::{Position, BK, BQ, WK, WQ};
use super::square::{File, Rank, Square};

/// Bounded move buffer: no chess position has more than a few dozen legal
/// moves, but pseudo-legal generation can briefly overcount captures and
/// promotions, so 256 leaves ample headroom without allocating.
pub type MoveList = ArrayVec<ChessMove, 256>;

/// Generate every pseudo-legal move for the side to move: piece movement
/// rules only, making no attempt to rule out moves that leave the mover's
/// own king in check. Legality is decided afterward, once, by making the
/// move and testing `Position::attacked_by` on the king — there is no
/// separate pin-detection pass.
pub fn generate_pseudo_legal(pos: &Position, moves: &mut MoveList) {
    let us = pos.side_to_move();
    let them = !us;
    let our_pieces = pos.color_combined(us);
    let their_pieces = pos.color_combined(them);
    let occupied = pos.combined();
    let empty = !occupied;

    generate_pawn_moves(pos, us, our_pieces, their_pieces, empty, moves);

    let knights = pos.pieces(Piece::Knight) & our_pieces;
    for sq in knights.iter() {
        for dst in (knight_attacks(sq) & !our_pieces).iter() {
            moves.push(ChessMove::new(sq, dst, None));
        }
    }

    let bishops = pos.pieces(Piece::Bishop) & our_pieces;
    for sq in bishops.iter() {
        for dst in (bishop_attacks(sq, occupied) & !our_pieces).iter() {
            moves.push(ChessMove::new(sq, dst, None));
        }
    }

    let rooks = pos.pieces(Piece::Rook) & our_pieces;
    for sq in rooks.iter() {
        for dst in (rook_attacks(sq, occupied) & !our_pieces).iter() {
            moves.push(ChessMove::new(sq, dst, None));
        }
    }

    let queens = pos.pieces(Piece::Queen) & our_pieces;
    for sq in queens.iter() {
        let attacks = (bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)) & !our_pieces;
        for dst in attacks.iter() {
            moves.push(ChessMove::new(sq, dst, None));
        }
    }

    let king_bb = pos.pieces(Piece::King) & our_pieces;
    if !king_bb.is_empty() {
        let king_sq = Square::new(king_bb.0.trailing_zeros() as u8);
        for dst in (king_attacks(king_sq) & !our_pieces).iter() {
            moves.push(ChessMove::new(king_sq, dst, None));
        }
        generate_castling(pos, king_sq, us, occupied, moves);
    }
}

const PROMOTION_PIECES: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

fn generate_pawn_moves(
    pos: &Position,
    us: Color,
    our_pieces: BitBoard,
    their_pieces: BitBoard,
    empty: BitBoard,
    moves: &mut MoveList,
) {
    let pawns = pos.pieces(Piece::Pawn) & our_pieces;

    // White advances toward decreasing rank index (rank 0 is FEN rank 8);
    // Black advances the opposite way.
    let (push_dir, start_rank, promo_rank): (i8, usize, usize) = if us == Color::White {
        (-8, Rank::from_fen_number(2).to_index(), Rank::from_fen_number(8).to_index())
    } else {
        (8, Rank::from_fen_number(7).to_index(), Rank::from_fen_number(1).to_index())
    };

    for sq in pawns.iter() {
        let sq_idx = sq.to_index() as i8;

        let push_idx = sq_idx + push_dir;
        if (0..64).contains(&push_idx) {
            let push_sq = Square::new(push_idx as u8);
            if !(BitBoard::from_square(push_sq) & empty).is_empty() {
                if push_sq.rank().to_index() == promo_rank {
                    for p in PROMOTION_PIECES {
                        moves.push(ChessMove::new(sq, push_sq, Some(p)));
                    }
                } else {
                    moves.push(ChessMove::new(sq, push_sq, None));

                    if sq.rank().to_index() == start_rank {
                        let double_idx = sq_idx + push_dir * 2;
                        let double_sq = Square::new(double_idx as u8);
                        if !(BitBoard::from_square(double_sq) & empty).is_empty() {
                            moves.push(ChessMove::new(sq, double_sq, None));
                        }
                    }
                }
            }
        }

        let captures = pawn_attacks(us, sq) & their_pieces;
        for dst in captures.iter() {
            if dst.rank().to_index() == promo_rank {
                for p in PROMOTION_PIECES {
                    moves.push(ChessMove::new(sq, dst, Some(p)));
                }
            } else {
                moves.push(ChessMove::new(sq, dst, None));
            }
        }

        if let Some(ep_sq) = pos.en_passant() {
            if !(pawn_attacks(us, sq) & BitBoard::from_square(ep_sq)).is_empty() {
                moves.push(ChessMove::en_passant(sq, ep_sq));
            }
        }
    }
}

/// Castling is legal only when none of three squares are attacked: the
/// king's own square (it isn't already in check), the square it passes
/// through, and the square it lands on. The in-between squares must also
/// be empty.
fn generate_castling(pos: &Position, king_sq: Square, us: Color, occupied: BitBoard, moves: &mut MoveList) {
    let rights = pos.castling_rights();
    let back_rank = if us == Color::White {
        Rank::from_fen_number(1)
    } else {
        Rank::from_fen_number(8)
    };
    let (ks_right, qs_right) = if us == Color::White { (WK, WQ) } else { (BK, BQ) };
    let them = !us;

    if rights & ks_right != 0 {
        let f_sq = Square::make_square(back_rank, File::from_index(5));
        let g_sq = Square::make_square(back_rank, File::from_index(6));

        if (BitBoard::from_square(f_sq) | BitBoard::from_square(g_sq)) & occupied == EMPTY
            && !pos.attacked_by(king_sq, them)
            && !pos.attacked_by(f_sq, them)
            && !pos.attacked_by(g_sq, them)
        {
            moves.push(ChessMove::castling(king_sq, g_sq));
        }
    }

    if rights & qs_right != 0 {
        let d_sq = Square::make_square(back_rank, File::from_index(3));
        let c_sq = Square::make_square(back_rank, File::from_index(2));
        let b_sq = Square::make_square(back_rank, File::from_index(1));

        if (BitBoard::from_square(d_sq) | BitBoard::from_square(c_sq) | BitBoard::from_square(b_sq)) & occupied == EMPTY
            && !pos.attacked_by(king_sq, them)
            && !pos.attacked_by(d_sq, them)
            && !pos.attacked_by(c_sq, them)
        {
            moves.push(ChessMove::castling(king_sq, c_sq));
        }
    }
}

/// All *legal* moves for the side to move: pseudo-legal generation followed
/// by the single legality filter (make, test the mover's king, unmake).
pub fn generate_legal(pos: &Position) -> MoveList {
    let mut pseudo = MoveList::new();
    generate_pseudo_legal(pos, &mut pseudo);

    let mut legal = MoveList::new();
    let mut scratch = *pos;
    for mv in pseudo {
        let undo = scratch.make_move(mv);
        let mover = !scratch.side_to_move();
        let king_sq = scratch.king_square(mover);
        let ok = match king_sq {
            Some(sq) => !scratch.attacked_by(sq, scratch.side_to_move()),
            None => false,
        };
        scratch.unmake_move(mv, undo);
        if ok {
            legal.push(mv);
        }
    }
    legal
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn init() {
        super::super::init();
    }

    fn perft(pos: &Position, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let mut pos = *pos;
        let moves = generate_legal(&pos);
        let mut count = 0u64;
        for mv in moves {
            let undo = pos.make_move(mv);
            count += perft(&pos, depth - 1);
            pos.unmake_move(mv, undo);
        }
        count
    }

    #[test]
    fn test_startpos_moves() {
        init();
        let pos = Position::default();
        assert_eq!(generate_legal(&pos).len(), 20);
    }

    #[test]
    fn test_perft_depth1() {
        init();
        assert_eq!(perft(&Position::default(), 1), 20);
    }

    #[test]
    fn test_perft_depth2() {
        init();
        assert_eq!(perft(&Position::default(), 2), 400);
    }

    #[test]
    fn test_perft_depth3() {
        init();
        assert_eq!(perft(&Position::default(), 3), 8902);
    }

    #[test]
    fn test_perft_depth4() {
        init();
        assert_eq!(perft(&Position::default(), 4), 197_281);
    }

    #[test]
    fn test_kiwipete_depth1() {
        init();
        let pos = Position::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(perft(&pos, 1), 48);
    }

    #[test]
    fn test_kiwipete_depth2() {
        init();
        let pos = Position::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(perft(&pos, 2), 2039);
    }

    #[test]
    fn test_kiwipete_depth3() {
        init();
        let pos = Position::from_str("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        assert_eq!(perft(&pos, 3), 97_862);
    }

    #[test]
    fn test_position3_depth2() {
        init();
        let pos = Position::from_str("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(perft(&pos, 2), 191);
    }

    #[test]
    fn test_position3_depth3() {
        init();
        let pos = Position::from_str("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
        assert_eq!(perft(&pos, 3), 2812);
    }

    #[test]
    fn test_no_pseudo_legal_leaves_own_king_hanging() {
        init();
        // pinned knight: moving it off the pin line must be pseudo-legal but not legal.
        let pos = Position::from_str("4k3/8/8/8/8/8/4n3/4K3 b - - 0 1").unwrap();
        let legal = generate_legal(&pos);
        for mv in legal {
            assert!(pos.legal(mv));
        }
    }

    #[test]
    fn test_castling_blocked_one_side_by_attacked_pass_through_square() {
        init();
        // Black bishop on a6 rakes the a6-f1 diagonal, covering f1 (the
        // kingside pass-through square) but none of the queenside squares.
        let pos = Position::from_str("4k3/8/b7/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let king_sq = pos.king_square(Color::White).unwrap();
        let occupied = pos.combined();

        let mut moves = MoveList::new();
        generate_castling(&pos, king_sq, Color::White, occupied, &mut moves);

        let g1 = Square::make_square(Rank::from_fen_number(1), File::from_index(6));
        let c1 = Square::make_square(Rank::from_fen_number(1), File::from_index(2));

        assert!(
            !moves.iter().any(|mv| mv.get_dest() == g1),
            "kingside castling must be rejected when f1 is attacked"
        );
        assert!(
            moves.iter().any(|mv| mv.get_dest() == c1),
            "queenside castling must still be generated when its squares are safe"
        );
    }
}
