use std::str::FromStr;

use halcyon::board::{generate_legal, ChessMove, Color, GameStatus, Piece, Position};

/// A handful of Bratko-Kopec test positions, embedded directly rather than
/// loaded from a data file: "<FEN> bm <move(s)>; id \"<name>\";"
const BK_POSITIONS: &[&str] = &[
    "1k1r4/pp1b1R2/3q2pp/4p3/2B5/4Q3/PPP2B2/2K5 b - - bm Qd1+; id \"BK.01\";",
    "3r1k2/4npp1/1ppr3p/p6P/P2PPPP1/1NR5/5K2/2R5 w - - bm d5; id \"BK.02\";",
    "2q1rr1k/3bbnnp/p2p1pp1/2pPp3/PpP1P1P1/1P2BNNP/2BQ1PRK/7R b - - bm f5; id \"BK.03\";",
    "rnbqkb1r/p3pppp/1p6/2ppP3/3N4/2P5/PPP1QPPP/R1B1KB1R w KQkq - bm e6; id \"BK.04\";",
    "r1b2rk1/2q1b1pp/p2ppn2/1p6/3QP3/1BN1B3/PPP3PP/R4RK1 w - - bm Nd5; id \"BK.05\";",
    "2r3k1/pppR1pp1/4p3/4P1P1/5P2/1P4K1/P1P5/8 w - - bm g6; id \"BK.06\";",
    "1nk1r1r1/pp2n1pp/4p3/1NPp4/2qP4/6P1/PP1R1PBP/R2Q2K1 w - - bm Nd6+; id \"BK.07\";",
    "4b3/p3kp2/6p1/3pP2p/2pP1P2/4K1P1/P3N2P/8 w - - bm f5; id \"BK.08\";",
];

struct Epd {
    fen: String,
    best_moves: Vec<String>,
    id: String,
}

fn parse_epd_line(line: &str) -> Option<Epd> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let bm_idx = line.find(" bm ")?;
    let fen = line[..bm_idx].to_string();
    let rest = &line[bm_idx + 4..];

    let semi_idx = rest.find(';')?;
    let moves_str = &rest[..semi_idx];
    let best_moves: Vec<String> = moves_str.split_whitespace().map(str::to_string).collect();

    let id = rest
        .find("id \"")
        .and_then(|start| {
            let content = &rest[start + 4..];
            content.find('"').map(|end| content[..end].to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    Some(Epd { fen, best_moves, id })
}

fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
        Piece::Pawn => 'P',
    }
}

fn disambiguation(pos: &Position, mv: ChessMove, piece: Piece) -> String {
    let mut needs_file = false;
    let mut needs_rank = false;
    let mut ambiguous = false;

    for other in generate_legal(pos) {
        if other == mv || other.get_dest() != mv.get_dest() {
            continue;
        }
        if pos.piece_on(other.get_source()) != Some(piece) {
            continue;
        }
        ambiguous = true;
        if other.get_source().file() == mv.get_source().file() {
            needs_rank = true;
        }
        if other.get_source().rank() == mv.get_source().rank() {
            needs_file = true;
        }
    }

    if !ambiguous {
        return String::new();
    }
    if !needs_file && !needs_rank {
        needs_file = true;
    }

    let mut s = String::new();
    if needs_file {
        s.push((b'a' + mv.get_source().file().to_index() as u8) as char);
    }
    if needs_rank {
        s.push((b'1' + mv.get_source().rank().to_index() as u8) as char);
    }
    s
}

fn add_check_suffix(pos: &Position, mv: ChessMove, mut san: String) -> String {
    let Some(after) = pos.try_make_move(mv) else {
        return san;
    };
    match after.status() {
        GameStatus::Checkmate => san.push('#'),
        _ if after.in_check() => san.push('+'),
        _ => {}
    }
    san
}

/// Convert a legal move to SAN notation for the position it's played from.
fn move_to_san(pos: &Position, mv: ChessMove) -> String {
    let piece = pos.piece_on(mv.get_source()).unwrap();
    let is_capture = pos.piece_on(mv.get_dest()).is_some()
        || (piece == Piece::Pawn && mv.get_source().file() != mv.get_dest().file());

    if piece == Piece::King {
        let from_file = mv.get_source().file().to_index();
        let to_file = mv.get_dest().file().to_index();
        if from_file == 4 && to_file == 6 {
            return add_check_suffix(pos, mv, "O-O".to_string());
        }
        if from_file == 4 && to_file == 2 {
            return add_check_suffix(pos, mv, "O-O-O".to_string());
        }
    }

    let mut san = String::new();

    if piece == Piece::Pawn {
        if is_capture {
            san.push((b'a' + mv.get_source().file().to_index() as u8) as char);
        }
    } else {
        san.push(piece_char(piece));
        san.push_str(&disambiguation(pos, mv, piece));
    }

    if is_capture {
        san.push('x');
    }

    san.push((b'a' + mv.get_dest().file().to_index() as u8) as char);
    san.push((b'1' + mv.get_dest().rank().to_index() as u8) as char);

    if let Some(promo) = mv.get_promotion() {
        san.push('=');
        san.push(piece_char(promo));
    }

    add_check_suffix(pos, mv, san)
}

/// Material-only evaluation used to sanity-check that a legal reply exists
/// from every BK position, independent of the full evaluator under test.
fn simple_evaluate(pos: &Position) -> i32 {
    const VALUES: [i32; 6] = [100, 320, 330, 500, 900, 20000];
    let mut score = 0i32;

    for sq in halcyon::board::ALL_SQUARES {
        if let Some(piece) = pos.piece_on(sq) {
            let color = pos.color_on(sq).unwrap();
            let idx = match piece {
                Piece::Pawn => 0,
                Piece::Knight => 1,
                Piece::Bishop => 2,
                Piece::Rook => 3,
                Piece::Queen => 4,
                Piece::King => 5,
            };
            let val = VALUES[idx];
            score += if color == Color::White { val } else { -val };
        }
    }

    if pos.side_to_move() == Color::White {
        score
    } else {
        -score
    }
}

#[test]
fn test_bk_suite() {
    halcyon::board::init();

    let mut total = 0;
    for line in BK_POSITIONS {
        let Some(epd) = parse_epd_line(line) else { continue };
        total += 1;

        let pos = Position::from_str(&epd.fen)
            .unwrap_or_else(|e| panic!("invalid FEN in {}: {e}", epd.id));

        let mut best_move = None;
        let mut best_score = i32::MIN;
        for mv in generate_legal(&pos) {
            let Some(after) = pos.try_make_move(mv) else { continue };
            let score = -simple_evaluate(&after);
            if score > best_score {
                best_score = score;
                best_move = Some(mv);
            }
        }

        assert!(best_move.is_some(), "no legal reply in {}", epd.id);
    }

    assert_eq!(total, BK_POSITIONS.len(), "expected all embedded BK positions to parse");
}

#[test]
fn test_epd_parser() {
    let line = "1k1r4/pp1b1R2/3q2pp/4p3/2B5/4Q3/PPP2B2/2K5 b - - bm Qd1+; id \"BK.01\";";
    let epd = parse_epd_line(line).unwrap();
    assert_eq!(epd.fen, "1k1r4/pp1b1R2/3q2pp/4p3/2B5/4Q3/PPP2B2/2K5 b - -");
    assert_eq!(epd.best_moves, vec!["Qd1+"]);
    assert_eq!(epd.id, "BK.01");
}

#[test]
fn test_uci_to_san_conversion() {
    halcyon::board::init();
    let pos = Position::from_str("1k1r4/pp1b1R2/3q2pp/4p3/2B5/4Q3/PPP2B2/2K5 b - -").unwrap();
    for mv in generate_legal(&pos) {
        if mv.to_string() == "d6d1" {
            assert_eq!(move_to_san(&pos, mv), "Qd1+");
            return;
        }
    }
    panic!("d6d1 not found as legal move");
}
