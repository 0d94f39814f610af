/*
  Harrier, a UCI-compatible chess engine.
  Copyright (C) 2022 The Harrier Authors (see AUTHORS.md file)

  Harrier is free software: you can redistribute it and/or modify
  it under the terms of the GNU General Public License as published by
  the Free Software Foundation, either version 3 of the License, or
  (at your option) any later version.

  Harrier is distributed in the hope that it will be useful,
  but WITHOUT ANY WARRANTY; without even the implied warranty of
  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
  GNU General Public License for more details.

  You should have received a copy of the GNU General Public License
  along with this program.  If not, see <http://www.gnu.org/licenses/>.
*/

//! Static position evaluation: turning a `Board` into a `Score` the search
//! can compare.
//!
//! The evaluation is the sum of a handful of rules (material, piece-square
//! tables, doubled pawns, open rooks), each contributing its own quantity.
//! Every rule is tapered: it's computed once for a midgame weighting and
//! once for an endgame weighting, and `blend` interpolates between the two
//! according to how much material is left on the board, so the evaluation
//! doesn't jump discontinuously as the game transitions between phases.
//!
//! Rather than recomputing a position's score from scratch at every leaf,
//! `ScoreTag` tags each move with the delta it makes to the score, so the
//! cumulative score of a line is just a running sum carried alongside the
//! game tree. Only at the leaf do we apply rules (like doubled pawns) that
//! can't cheaply be expressed as a per-move delta.

use std::cmp::{max, min};

use harrier_base::{
    game::{TaggedGame, Tagger},
    Bitboard, Board, Color, Eval, Move, Piece, Score,
};

use crate::{
    material::material_delta,
    pick::candidacy,
    pst::{pst_delta, pst_evaluate},
};

use super::material;

/// Mask containing ones along the A file. Bitshifting left by a number from 0
/// through 7 will cause it to become a mask for each file.
const A_FILE_MASK: Bitboard = Bitboard::new(0x0101010101010101);

/// The value of having your own pawn doubled.
pub const DOUBLED_PAWN_VALUE: Score = Score::centipawns(-34, -28);
/// The value of having a rook with no same-colored pawns in front of it which
/// are not advanced past the 3rd rank.
pub const OPEN_ROOK_VALUE: Score = Score::centipawns(7, 46);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreTag;

pub type ScoredGame = TaggedGame<ScoreTag>;

impl Tagger for ScoreTag {
    type Tag = (Score, Eval);
    type Cookie = Score;

    /// Compute the change in scoring that a move made on a board will cause.
    fn tag_move(m: Move, b: &Board) -> Self::Tag {
        let delta = pst_delta(b, m) + material_delta(b, m);
        (delta, candidacy(b, m, delta))
    }

    fn update_cookie(
        _: Move,
        tag: &Self::Tag,
        b: &Board,
        prev_cookie: &Self::Cookie,
    ) -> Self::Cookie {
        match b.player_to_move {
            Color::White => *prev_cookie + tag.0,
            Color::Black => *prev_cookie - tag.0,
        }
    }

    /// Compute a static, cumulative-invariant evaluation of a position.
    /// It is much faster in search to use cumulative evaluation, but this should be used when
    /// importing positions.
    /// Static evaluation will not include the leaf rules (such as number of
    /// doubled pawns), as this will be handled by `leaf_evaluate` at the end of
    /// the search tree.
    fn init_cookie(b: &Board) -> Self::Cookie {
        material::evaluate(b) + pst_evaluate(b)
    }
}

/// Evaluate a leaf position on a game whose cumulative values have been
/// computed correctly.
pub fn leaf_evaluate(g: &ScoredGame) -> Eval {
    let b = g.board();

    match g.is_over() {
        (true, Some(_)) => {
            return match b.player_to_move {
                Color::Black => Eval::mate_in(0),
                Color::White => -Eval::mate_in(0),
            }
        }
        (true, None) => {
            return Eval::DRAW;
        }
        _ => {}
    };

    let b = g.board();
    let leaf_val = leaf_rules(b);

    (leaf_val + *g.cookie()).blend(phase_of(b))
}

/// Get the score gained from evaluations that are only performed at the leaf.
fn leaf_rules(b: &Board) -> Score {
    // Add losses due to doubled pawns
    let mut score = DOUBLED_PAWN_VALUE * net_doubled_pawns(b);

    // Add gains from open rooks
    score += OPEN_ROOK_VALUE * net_open_rooks(b);

    score
}

/// Count the net number of "open" rooks (unblocked by any of their own
/// pawns still standing between them and the far edge of the board) in a
/// position. Positive favors White, negative favors Black.
pub fn net_open_rooks(b: &Board) -> i8 {
    /// Ranks 1-4, the half of the board White's pawns start closest to.
    const WHITE_HALF: Bitboard = Bitboard::new(0x0000_0000_FFFF_FFFF);
    /// Ranks 5-8, the half of the board Black's pawns start closest to.
    const BLACK_HALF: Bitboard = Bitboard::new(0xFFFF_FFFF_0000_0000);
    let mut net_open_rooks = 0i8;
    let rooks = b[Piece::Rook];
    let pawns = b[Piece::Pawn];
    let white = b[Color::White];
    let black = b[Color::Black];

    // count white rooks
    for wrook_sq in rooks & white {
        if wrook_sq.rank() >= 3 {
            net_open_rooks += 1;
            continue;
        }
        let pawns_in_col = (pawns & white) & (A_FILE_MASK << wrook_sq.file() as u8);
        let important_pawns = WHITE_HALF & pawns_in_col;
        // check that the forward-most pawn of the important pawns is in front
        // of or behind the rook
        if important_pawns.leading_zeros() > (63 - (wrook_sq as u32)) {
            // all the important pawns are behind the rook
            net_open_rooks += 1;
        }
    }

    // count black rooks
    for brook_sq in rooks & black {
        if brook_sq.rank() <= 4 {
            net_open_rooks -= 1;
            continue;
        }
        let pawns_in_col = (pawns & black) & (A_FILE_MASK << brook_sq.file() as u8);
        let important_pawns = BLACK_HALF & pawns_in_col;
        // check that the lowest-rank pawn that could block the rook is behind
        // the rook
        if important_pawns.trailing_zeros() > brook_sq as u32 {
            net_open_rooks -= 1;
        }
    }

    net_open_rooks
}

/// Count the number of doubled pawns, in net. For instance, if White had 1
/// doubled pawn, and Black had 2, this function would return -1.
pub fn net_doubled_pawns(b: &Board) -> i8 {
    let white_occupancy = b[Color::White];
    let pawns = b[Piece::Pawn];
    let mut npawns: i8 = 0;
    let mut col_mask = Bitboard::new(0x0101010101010101);
    for _ in 0..8 {
        let col_pawns = pawns & col_mask;

        // all ones on the A column, shifted left by the col
        let num_black_doubled_pawns = match ((!white_occupancy) & col_pawns).len() {
            0 => 0,
            x => x as i8 - 1,
        };
        let num_white_doubled_pawns = match (white_occupancy & col_pawns).len() {
            0 => 0,
            x => x as i8 - 1,
        };

        npawns -= num_black_doubled_pawns;
        npawns += num_white_doubled_pawns;

        col_mask <<= 1;
    }

    npawns
}

/// Get a blending float describing the current phase of the game. Will range
/// from 0 (full endgame) to 1 (full midgame).
pub fn phase_of(b: &Board) -> f32 {
    const MG_LIMIT: Eval = Eval::centipawns(2500);
    const EG_LIMIT: Eval = Eval::centipawns(1400);
    // amount of non-pawn material in the board, under midgame values
    let mg_npm = {
        let mut total = Eval::DRAW;
        for pt in Piece::NON_PAWN_TYPES {
            total += material::value(pt).mg * b[pt].len();
        }
        total
    };
    let bounded_npm = max(EG_LIMIT, min(MG_LIMIT, mg_npm));

    (EG_LIMIT - bounded_npm).float_val() / (EG_LIMIT - MG_LIMIT).float_val()
}

#[cfg(test)]
mod tests {
    use super::*;
    use harrier_base::movegen::ALL;

    fn delta_helper(fen: &str) {
        let mut g = ScoredGame::from_fen(fen).unwrap();
        for (m, tag) in g.get_moves::<ALL>() {
            g.make_move(m, tag);
            // println!("{g}");
            assert_eq!(ScoreTag::init_cookie(g.board()), *g.cookie());
            g.undo().unwrap();
        }
    }

    #[test]
    fn delta_captures() {
        delta_helper("r1bq1b1r/ppp2kpp/2n5/3n4/2BPp3/2P5/PP3PPP/RNBQK2R b KQ d3 0 8");
    }

    #[test]
    fn delta_promotion() {
        // undoubling capture promotion is possible
        delta_helper("r4bkr/pPpq2pp/2n1b3/3n4/2BPp3/2P5/1P3PPP/RNBQK2R w KQ - 1 13");
    }

    #[test]
    fn certainly_endgame() {
        assert_eq!(
            phase_of(&Board::from_fen("8/5k2/6p1/8/5PPP/8/pb3P2/6K1 w - - 0 37").unwrap()),
            0.0
        );
    }

    #[test]
    fn certainly_midgame() {
        assert_eq!(phase_of(&Board::default()), 1.0);
    }
}
