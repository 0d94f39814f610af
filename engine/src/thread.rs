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

//! The main search driver.
//!
//! A `MainSearch` owns the transposition table and search limit for one engine instance and
//! runs iterative deepening to completion on the calling thread. There is no internal
//! parallelism: each depth is searched fully before the next begins, and `evaluate` is a
//! blocking call that returns only once the configured depth or time limit is reached.

use std::time::Instant;

use harrier_base::Eval;

use crate::{
    evaluate::ScoredGame,
    uci::{EngineInfo, UciMessage},
};

use super::{
    config::SearchConfig,
    limit::SearchLimit,
    search::{search, SearchResult},
    transposition::TTable,
    SearchError,
};

#[derive(Debug)]
/// The primary search driver for an engine.
pub struct MainSearch {
    /// The configuration of the search, controlling the search parameters.
    pub config: SearchConfig,
    /// The transposition table, persisted across moves within a game.
    pub ttable: TTable,
    /// The limit to the search.
    pub limit: SearchLimit,
}

impl MainSearch {
    /// Construct a new main search with a fresh, empty transposition table.
    pub fn new() -> MainSearch {
        MainSearch {
            config: SearchConfig::new(),
            ttable: TTable::default(),
            limit: SearchLimit::new(),
        }
    }

    /// Evaluate a position via iterative deepening, searching depth 1, then 2, and so on, up to
    /// `self.config.depth`, stopping early once `self.limit` reports the search is over. Returns
    /// the result of the deepest iteration to complete.
    ///
    /// # Error
    ///
    /// An error will be returned according to the cases outlined in
    /// `SearchError`. Such errors are rare, and are generally either the result
    /// of an internal bug or a critical OS interrupt. However, a timeout error
    /// is most likely if the search times out before it can do any computation.
    pub fn evaluate(&mut self, g: &ScoredGame) -> SearchResult {
        self.ttable.age_up(2);
        let tic = Instant::now();
        let mut best_result = Err(SearchError::Timeout);

        for depth in 1..=self.config.depth {
            if self.limit.is_over() {
                break;
            }

            let iteration = search(
                g.clone(),
                depth,
                &self.ttable,
                &self.config,
                &self.limit,
                true,
                Eval::MIN,
                Eval::MAX,
            );

            if let Ok(ref info) = iteration {
                best_result = Ok(info.clone());
                let elapsed = Instant::now() - tic;
                println!(
                    "{}",
                    UciMessage::Info(&[
                        EngineInfo::Depth(depth),
                        EngineInfo::Time(elapsed),
                        EngineInfo::Nodes(info.num_nodes_evaluated),
                        EngineInfo::NodeSpeed(
                            info.num_nodes_evaluated * 1000 / (elapsed.as_millis() as u64 + 1)
                        ),
                        EngineInfo::HashFull(self.ttable.fill_rate_permill()),
                        EngineInfo::Score {
                            eval: info.eval,
                            is_lower_bound: false,
                            is_upper_bound: false
                        }
                    ])
                );
            } else {
                // a timeout on this iteration means the previous iteration's result stands
                break;
            }
        }

        if let Ok(ref mut info) = best_result {
            // normalize evaluation to be in absolute terms
            info.eval = info.eval.in_perspective(g.board().player_to_move);
        }
        best_result
    }
}

impl Default for MainSearch {
    fn default() -> Self {
        MainSearch::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{cmp::max, time::Instant};

    use super::*;

    /// Compare the speed of a search on a given transposition depth with its
    /// adjacent depths.
    fn transposition_speed_comparison(fen: &str, depth: u8, transposition_depth: u8) {
        let g = ScoredGame::from_fen(fen).unwrap();
        for tdepth in max(0, transposition_depth - 1)..=(transposition_depth + 1) {
            let mut main = MainSearch::new();
            main.config.depth = depth;
            main.config.max_transposition_depth = tdepth;

            let tic = Instant::now();
            main.evaluate(&g).unwrap();
            let toc = Instant::now();
            println!(
                "tdepth {tdepth}: {:.3}s, hashfill permill {}",
                (toc - tic).as_secs_f32(),
                main.ttable.fill_rate_permill()
            );
        }
    }

    #[test]
    fn transposition_speed_fried_liver() {
        transposition_speed_comparison(
            "r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7",
            11,
            8,
        );
    }
}
