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

//! `MovePicker`: an iterator that hands the search the next move to try, in
//! an order chosen to maximize alpha-beta cutoffs.
//!
//! Move generation is deferred as long as possible. The transposition move
//! (if any) and the killer move are tried straight from memory, with no move
//! generation at all, and either of them is often enough to cause a cutoff
//! before a single `Move` is generated. Generation happens in phases: good
//! captures before quiet moves before bad captures, since a capture that
//! wins material is statistically the most likely kind of move to cut a
//! node off early. Captures that lose material outright get sent to the
//! very back of the order instead, past even the quiet moves.

use std::mem::swap;

use harrier_base::{
    game::Tagger,
    movegen::{get_moves, is_legal, CAPTURES, QUIETS},
    Board, Eval, Move, Score,
};

use crate::{
    evaluate::{phase_of, ScoreTag},
    material,
};

/// Estimate how promising `m` is for ordering purposes, pessimistically:
/// `delta` is the PST/material swing the move already causes, and we assume
/// on top of that the worst case, that the moving piece itself gets
/// recaptured for nothing. `m` must be legal in `b`.
///
/// # Panics
///
/// Panics if `m` is not a legal move in `b`.
pub fn candidacy(b: &Board, m: Move, delta: Score) -> Eval {
    let mover_type = b.type_at_square(m.from_square()).unwrap();
    let phase = phase_of(b);

    let mover_value = material::value(mover_type);
    let worst_case_delta = delta - mover_value;
    worst_case_delta.blend(phase)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePicker {
    /// The buffer of captures to select from, paired with their PST deltas and
    /// then their final candidacies.
    capture_buffer: Vec<(Move, (Score, Eval))>,
    /// The buffer of quiet moves to select from, paired with their PST deltas
    /// and then their final candidacies.
    quiet_buffer: Vec<(Move, (Score, Eval))>,
    /// Index of the next not-yet-returned capture in `capture_buffer`.
    capture_index: usize,
    /// Index of the next not-yet-returned quiet move in `quiet_buffer`.
    quiet_index: usize,
    /// Moves already handed out (the transposition and killer moves), so
    /// they aren't returned a second time once generation reaches them.
    ignored: Vec<Move>,
    /// The position moves are being picked for.
    board: Board,
    /// Which stage of move selection we're currently serving from.
    phase: PickPhase,
    /// The move read out of the transposition table for this position, if
    /// any. Assumed already verified legal by the caller.
    transposition_move: Option<Move>,
    /// This node's killer move, if one has been recorded.
    killer_move: Option<Move>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Which stage of the move-ordering pipeline the picker is currently
/// serving from. Stages run in declaration order, skipping over any that
/// have nothing to offer.
enum PickPhase {
    /// Hand out the transposition move, if there is one.
    Transposition,
    /// Generate captures, then fall through into `GoodCapture`.
    PreGoodCapture,
    /// Hand out captures with non-negative candidacy, best first.
    GoodCapture,
    /// Hand out the killer move, if it's still legal here.
    Killer,
    /// Generate quiet moves, then fall through into `Quiet`.
    PreQuiet,
    /// Hand out quiet moves, best first.
    Quiet,
    /// Hand out whatever captures were left behind in `GoodCapture` for
    /// having negative candidacy.
    BadCaptures,
}

impl MovePicker {
    /// Build a `MovePicker` over `b`, preferring `transposition_move` and
    /// `killer_move` (in that order) ahead of freshly generated moves.
    /// Move generation is deferred until actually needed, but this should
    /// still only be constructed at a point where the search is committed
    /// to examining this node's moves.
    ///
    /// `transposition_move`, if given, must already be known legal in `b`.
    pub fn new(
        b: Board,
        transposition_move: Option<Move>,
        killer_move: Option<Move>,
    ) -> MovePicker {
        MovePicker {
            capture_buffer: Vec::new(),
            quiet_buffer: Vec::new(),
            capture_index: 0,
            quiet_index: 0,
            ignored: Vec::new(),
            board: b,
            phase: PickPhase::Transposition,
            transposition_move,
            killer_move,
        }
    }

    /// Mark `m` as already handed out, so later phases skip over it instead
    /// of returning it a second time. `m` must not be `Move::BAD_MOVE`.
    fn ignore(&mut self, m: Move) {
        if !self.ignored.contains(&m) {
            self.ignored.push(m);
        }
    }
}

/// Find the highest-candidacy move among `moves[idx..]` and swap it into
/// `moves[idx]`, returning it. One step of a selection sort: repeated calls
/// with increasing `idx` yield moves in descending order without sorting
/// moves that are never reached. Requires `idx < moves.len()`.
fn select_best(moves: &mut [(Move, (Score, Eval))], idx: usize) -> (Move, (Score, Eval)) {
    let mut best_entry = moves[idx];
    for entry in moves.iter_mut().skip(idx + 1) {
        // insertion sort to get the best move.
        // insertion sort is slower if we need to see every move,
        // but often we don't due to beta cutoff
        if entry.1 .1 > best_entry.1 .1 {
            // swap out the next-best move
            swap(entry, &mut best_entry);
        }
    }

    best_entry
}

impl Iterator for MovePicker {
    type Item = (Move, (Score, Eval));

    /// Advance to the next phase that has a move to offer and return it.
    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            PickPhase::Transposition => {
                self.phase = PickPhase::PreGoodCapture;
                match self.transposition_move {
                    None => self.next(),
                    Some(m) => {
                        // legality of the transposition move is the caller's responsibility
                        self.ignore(m);
                        Some((m, ScoreTag::tag_move(m, &self.board)))
                    }
                }
            }
            PickPhase::PreGoodCapture => {
                // generate moves, and then move along
                self.phase = PickPhase::GoodCapture;
                self.capture_buffer =
                    get_moves::<CAPTURES, ScoreTag>(&self.board, &Score::centipawns(0, 0));
                self.next()
            }
            PickPhase::GoodCapture => {
                if self.capture_index >= self.capture_buffer.len() {
                    // out of captures
                    self.phase = PickPhase::Killer;
                    return self.next();
                }
                let capture_entry = select_best(&mut self.capture_buffer, self.capture_index);
                if capture_entry.1 .1 < Eval::DRAW {
                    // we are now in bad captures, move on
                    self.phase = PickPhase::Killer;
                    // make sure to leave this move in place
                    self.capture_buffer[self.capture_index] = capture_entry;
                    return self.next();
                }
                // make sure to get a new capture next time
                self.capture_index += 1;
                if self.ignored.contains(&capture_entry.0) {
                    // don't bother with ignored moves
                    return self.next();
                }
                Some(capture_entry)
            }
            PickPhase::Killer => {
                self.phase = PickPhase::PreQuiet;
                match self.killer_move {
                    None => self.next(),
                    Some(m) => match is_legal(m, &self.board) {
                        true => {
                            self.ignore(m);
                            Some((m, ScoreTag::tag_move(m, &self.board)))
                        }
                        false => self.next(),
                    },
                }
            }
            PickPhase::PreQuiet => {
                // generate quiet moves
                self.phase = PickPhase::Quiet;
                self.quiet_buffer =
                    get_moves::<QUIETS, ScoreTag>(&self.board, &Score::centipawns(0, 0));
                self.next()
            }
            PickPhase::Quiet => {
                if self.quiet_index >= self.quiet_buffer.len() {
                    // out of quiets
                    self.phase = PickPhase::BadCaptures;
                    return self.next();
                }
                let quiet_entry = select_best(&mut self.quiet_buffer, self.quiet_index);
                self.quiet_index += 1;
                if self.ignored.contains(&quiet_entry.0) {
                    // don't bother with ignored moves
                    return self.next();
                }
                Some(quiet_entry)
            }
            PickPhase::BadCaptures => {
                if self.capture_index >= self.capture_buffer.len() {
                    // all out of moves!
                    return None;
                }
                let capture_entry = select_best(&mut self.capture_buffer, self.capture_index);
                self.capture_index += 1;
                if self.ignored.contains(&capture_entry.0) {
                    // don't bother with ignored moves
                    return self.next();
                }
                Some(capture_entry)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.phase {
            // check the size of the moves buffer
            PickPhase::GoodCapture | PickPhase::PreQuiet => {
                let n = self.capture_buffer.len() - self.capture_index;
                let n_ignored = self.ignored.len();
                if n_ignored >= n {
                    (0, None)
                } else {
                    (n - n_ignored, None)
                }
            }
            PickPhase::Quiet | PickPhase::BadCaptures => {
                // need to get through both the quiets and the bad captures
                let n = self.capture_buffer.len() - self.capture_index + self.quiet_buffer.len()
                    - self.quiet_index;
                let n_ignored = self.ignored.len();
                if n_ignored >= n {
                    (0, Some(n))
                } else {
                    (n - n_ignored, Some(n))
                }
            }
            _ => (0, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use harrier_base::{algebraic::algebraic_from_move, game::NoTag, movegen::ALL};

    use super::*;

    #[test]
    /// Test that all moves are generated in the move picker and that there are
    /// no duplicates.
    fn generation_correctness() {
        let b = Board::from_fen("r2q1rk1/ppp2ppp/3b4/4Pb2/4Q3/2PB4/P1P2PPP/R1B1K2R w KQ - 5 12")
            .unwrap();
        let mp = MovePicker::new(b, None, None);

        let mp_moves = mp.map(|(m, _)| m);
        let mg_moves = get_moves::<ALL, NoTag>(&b, &());
        for m in mp_moves.clone() {
            assert!(mg_moves.contains(&(m, ())));
            println!("{}", algebraic_from_move(m, &b));
        }

        for (m, _) in mg_moves {
            println!("looking for {m} in movepicker moves");
            assert!(mp_moves.clone().any(|m2| m2 == m));
        }

        for m in mp_moves.clone() {
            assert_eq!(mp_moves.clone().filter(|&m2| m2 == m).count(), 1);
        }
    }
}
