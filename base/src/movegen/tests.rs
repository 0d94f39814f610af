use super::*;
use crate::game::NoTag;

fn moves_of<const M: GenMode>(b: &Board) -> Vec<Move> {
    get_moves::<M, NoTag>(b, &()).into_iter().map(|x| x.0).collect()
}

#[test]
/// Test that we can play Qf3+, the critical move in the Fried Liver opening.
fn best_queen_fried_liver() {
    let b = Board::from_fen("r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7").unwrap();
    let m = Move::normal(Square::D1, Square::F3);
    let moves = moves_of::<ALL>(&b);
    assert!(moves.contains(&m));
    for m in moves {
        assert!(is_legal(m, &b));
    }
}

#[test]
/// Test that capturing a pawn is generated.
fn pawn_capture_generated() {
    let b =
        Board::from_fen("rnbqkbnr/ppppp1pp/8/5p2/4P3/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 2").unwrap();
    let m = Move::normal(Square::E4, Square::F5);
    for m in moves_of::<ALL>(&b) {
        assert!(is_legal(m, &b));
    }
    assert!(moves_of::<ALL>(&b).contains(&m));
    assert!(moves_of::<CAPTURES>(&b).contains(&m));
}

#[test]
/// The pawn is checking the king. Is move enumeration correct?
fn enumerate_pawn_checking_king() {
    let b =
        Board::from_fen("r1bq1b1r/ppp2kpp/2n5/3n4/2B5/8/PPP1pPPP/RN1Q1K1R w - - 0 10").unwrap();
    for m in moves_of::<ALL>(&b) {
        assert!(is_legal(m, &b));
    }
}

#[test]
/// Check that the king has exactly one move in this position.
fn king_has_only_one_move() {
    let b = Board::from_fen("2k5/4R3/8/5K2/3R4/8/8/8 b - - 2 2").unwrap();
    assert!(has_moves(&b));
    assert_eq!(moves_of::<ALL>(&b).len(), 1);
    assert!(is_legal(Move::normal(Square::C8, Square::B8), &b));
}

#[test]
/// Test that queenside castling actually works.
fn queenside_castle() {
    let b = Board::from_fen(
        "r3kb1r/ppp1p1pp/2nq1n2/1B1p4/3P4/2N2Q2/PPP2PPP/R1B1K2R b KQkq - 0 8",
    )
    .unwrap();
    let m = Move::castling(Square::E8, Square::C8);
    assert!(moves_of::<ALL>(&b).contains(&m));
    assert!(is_legal(m, &b));
}

#[test]
/// Test that Black cannot castle because there is a knight in the way.
fn no_queenside_castle_through_knight() {
    let b = Board::from_fen(
        "rn2kb1r/ppp1p1pp/3q1n2/1B1p4/3P4/2N2Q2/PPP2PPP/R1B1K2R b KQkq - 0 8",
    )
    .unwrap();
    let m = Move::castling(Square::E8, Square::C8);
    assert!(!moves_of::<ALL>(&b).contains(&m));
}

#[test]
/// Test that kingside castling works when the path is clear.
fn kingside_castle() {
    let b = Board::from_fen(
        "r1bqk2r/pppp1ppp/2n2n2/2b1p3/2B1P3/2N2N2/PPPP1PPP/R1BQK2R w KQkq - 4 4",
    )
    .unwrap();
    let m = Move::castling(Square::E1, Square::G1);
    assert!(moves_of::<ALL>(&b).contains(&m));
    assert!(is_legal(m, &b));
}

#[test]
/// A king in check must escape, block, or capture the checker.
fn king_must_respond_to_check() {
    let b = Board::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
    assert!(has_moves(&b));
    for m in moves_of::<ALL>(&b) {
        assert!(is_legal(m, &b));
    }
}

#[test]
/// A position with no legal moves and an attacked king is checkmate, so
/// `has_moves` should be false.
fn no_moves_on_mate() {
    // scholar's mate
    let b = Board::from_fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4")
        .unwrap();
    assert!(!has_moves(&b));
}

#[test]
/// Test that every generated capture is actually a capture.
fn captures_are_captures() {
    let b = Board::from_fen("r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7")
        .unwrap();
    for m in moves_of::<CAPTURES>(&b) {
        assert!(b.is_move_capture(m));
    }
}

#[test]
/// Test that every generated quiet move is not a capture.
fn quiets_are_not_captures() {
    let b = Board::from_fen("r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7")
        .unwrap();
    for m in moves_of::<QUIETS>(&b) {
        assert!(!b.is_move_capture(m));
    }
}

#[test]
/// The union of captures and quiets should equal the set of all moves.
fn captures_and_quiets_partition_all() {
    let b = Board::from_fen("r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7")
        .unwrap();
    let all: std::collections::HashSet<Move> = moves_of::<ALL>(&b).into_iter().collect();
    let mut split: std::collections::HashSet<Move> = moves_of::<CAPTURES>(&b).into_iter().collect();
    split.extend(moves_of::<QUIETS>(&b));
    assert_eq!(all, split);
}
