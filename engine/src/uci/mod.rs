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

use crate::Move;

mod parse;
mod send;
pub use parse::*;

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
/// Every message a UCI GUI can send down to the engine. `UciParser` turns
/// raw stdin lines into these; `thread::run_uci` (or its equivalent driver)
/// acts on them.
pub enum UciCommand {
    /// Handshake opener: the engine answers with its `Id` and `Option`
    /// messages, then `Ok`. Skipping the `Ok` gets the process killed by the
    /// GUI.
    Uci,
    /// Toggle whether the engine emits `info string` diagnostics. Off by
    /// default.
    Debug(bool),
    /// "Are you ready?" — the engine may delay its `ReadyOk` reply until any
    /// in-flight search finishes, but must eventually send one.
    IsReady,
    /// Set engine option `name` to `value` (or to no value, for a button-type
    /// option).
    SetOption { name: String, value: Option<String> },
    /// The next search will belong to a fresh game; no relation should be
    /// assumed to whatever was searched before. Not guaranteed to precede
    /// every game.
    NewGame,
    /// Load the position to search next: start from `fen` (or the standard
    /// starting position if `None`), then play `moves` in order to reach it.
    Position {
        /// `None` means the normal chess starting position.
        fen: Option<String>,
        /// Moves played, in order, after loading `fen`.
        moves: Vec<Move>,
    },
    /// Start searching the position set up by the preceding `Position`,
    /// under the constraints in the option list.
    Go(Vec<GoOption>),
    /// Stop searching as soon as possible and report the best move found so
    /// far.
    Stop,
    /// The opponent played the move the engine was pondering on. Search
    /// continues, now counting real time against the position actually
    /// reached.
    PonderHit,
    /// Shut down as soon as possible.
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// One constraint or piece of context attached to a `UciCommand::Go`. A
/// single `Go` carries a list of these, e.g. a depth limit plus a node cap.
pub enum GoOption {
    /// Only consider these moves as candidates for the best move.
    SearchMoves(Vec<Move>),
    /// Search the suggested ponder-move (the last move of the preceding
    /// `Position`) without a time limit, until `PonderHit` or `Stop`.
    Ponder,
    /// White's remaining clock time, in milliseconds.
    WhiteTime(u32),
    /// Black's remaining clock time, in milliseconds.
    BlackTime(u32),
    /// White's per-move time increment, in milliseconds.
    WhiteInc(u32),
    /// Black's per-move time increment, in milliseconds.
    BlackInc(u32),
    /// Moves remaining until the next time control; absent entirely means
    /// sudden death once `WhiteTime`/`BlackTime` run out.
    MovesToGo(u8),
    /// Search to exactly this many plies.
    Depth(u8),
    /// Stop once this many nodes have been visited.
    Nodes(u64),
    /// Look for a forced mate within this many moves.
    Mate(u8),
    /// Search for exactly this many milliseconds.
    MoveTime(u32),
    /// Search with no time or node bound until told to `Stop`.
    Infinite,
}

pub use send::{EngineInfo, OptionType, UciMessage};
