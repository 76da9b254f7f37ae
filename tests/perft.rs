//! Known-good leaf counts for early plies from standard test positions.
//! These are the classic perft anchors used to validate a move generator's
//! handling of castling, en passant, promotion and check evasions together.

use std::str::FromStr;

use halcyon::board::Position;
use halcyon::perft::perft;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
const POSITION_4: &str = "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1";
const POSITION_5: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

fn init() {
    halcyon::board::init();
}

#[test]
fn startpos_perft() {
    init();
    let mut pos = Position::default();
    assert_eq!(perft(&mut pos, 1), 20);
    assert_eq!(perft(&mut pos, 2), 400);
    assert_eq!(perft(&mut pos, 3), 8_902);
    assert_eq!(perft(&mut pos, 4), 197_281);
    assert_eq!(perft(&mut pos, 5), 4_865_609);
}

// Depth 6 from the start position is the same well-known anchor
// (119,060,324 leaves) but costs tens of seconds even in release mode, so
// it's ignored by default; run explicitly with `cargo test -- --ignored`.
#[test]
#[ignore]
fn startpos_perft_depth_6() {
    init();
    let mut pos = Position::default();
    assert_eq!(perft(&mut pos, 6), 119_060_324);
}

#[test]
fn kiwipete_perft() {
    init();
    let mut pos = Position::from_str(KIWIPETE).unwrap();
    assert_eq!(perft(&mut pos, 1), 48);
    assert_eq!(perft(&mut pos, 2), 2_039);
    assert_eq!(perft(&mut pos, 3), 97_862);
    assert_eq!(perft(&mut pos, 4), 4_085_603);
}

#[test]
fn position_3_perft() {
    init();
    let mut pos = Position::from_str(POSITION_3).unwrap();
    assert_eq!(perft(&mut pos, 1), 14);
    assert_eq!(perft(&mut pos, 2), 191);
    assert_eq!(perft(&mut pos, 3), 2_812);
    assert_eq!(perft(&mut pos, 4), 43_238);
}

#[test]
fn position_4_perft() {
    init();
    let mut pos = Position::from_str(POSITION_4).unwrap();
    assert_eq!(perft(&mut pos, 1), 6);
    assert_eq!(perft(&mut pos, 2), 264);
    assert_eq!(perft(&mut pos, 3), 9_467);
}

#[test]
fn position_5_perft() {
    init();
    let mut pos = Position::from_str(POSITION_5).unwrap();
    assert_eq!(perft(&mut pos, 1), 44);
    assert_eq!(perft(&mut pos, 2), 1_486);
    assert_eq!(perft(&mut pos, 3), 62_379);
}
