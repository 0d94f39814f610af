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

//! The main UCI procedure.
//!
//! This code handles the central logic of actually running an engine. We listen for commands
//! from the GUI one line at a time and service them in order. A `go` command blocks the loop
//! until the search completes or its time/node/depth limit is reached; there is no background
//! search thread, so a `stop` received while a search is in flight can only take effect once the
//! running iteration notices the limit has been marked over.

use std::{io::stdin, time::Duration};

use harrier_base::game::Tagger;
use harrier_engine::{
    evaluate::{ScoreTag, ScoredGame},
    thread::MainSearch,
    time::get_search_time,
    transposition::TTable,
    uci::{parse_line, EngineInfo, GoOption, OptionType, UciCommand, UciMessage},
};

/// Run a UCI engine.
fn main() {
    // whether we are in debug mode
    let mut debug = false;
    let mut searcher = MainSearch::new();
    let mut game = ScoredGame::new();

    loop {
        let mut buf = String::new();
        if stdin().read_line(&mut buf).is_err() {
            debug_info("failed to read line", debug);
        };
        let command = match parse_line(&buf, game.board()) {
            Ok(cmd) => cmd,
            Err(e) => {
                // print out the error to the frontend and continue on to the
                // next line
                debug_info(&format!("failed to parse line: {e}"), debug);
                continue;
            }
        };
        match command {
            UciCommand::Uci => {
                // identify the engine
                println!(
                    "{}",
                    UciMessage::Id {
                        name: Some("Harrier 0.1.0"),
                        author: Some("The Harrier Authors"),
                    }
                );

                add_option(
                    "Hash",
                    OptionType::Spin {
                        default: 16,
                        min: 1,
                        max: 4096,
                    },
                );

                println!("{}", UciMessage::UciOk)
            }
            UciCommand::Debug(new_debug) => {
                // activate or deactivate debug mode
                debug = new_debug;
            }
            UciCommand::IsReady => {
                // we were born ready
                println!("{}", UciMessage::ReadyOk);
            }
            UciCommand::SetOption { name, value } => match name.as_str() {
                "Hash" => match value {
                    None => debug_info("error: no value given for `Hash`", debug),
                    Some(num_str) => match num_str.parse::<usize>() {
                        Ok(mb) => searcher.ttable.resize(mb),
                        _ => debug_info("error: illegal parameter for `Hash`", debug),
                    },
                },
                _ => debug_info(&format!("error: unknown option key `{}`", name), debug),
            },
            UciCommand::NewGame => {
                game = ScoredGame::new();
                searcher.limit.stop();
                // clear the transposition table, preserving its size
                let old_bit_size = searcher.ttable.bit_size();
                searcher.ttable = TTable::with_capacity(old_bit_size);
            }
            UciCommand::Position { fen, moves } => {
                game = match fen {
                    None => ScoredGame::new(),
                    Some(fen) => ScoredGame::from_fen(&fen).unwrap(),
                };
                for m in moves {
                    let tag = ScoreTag::tag_move(m, game.board());
                    game.make_move(m, tag);
                }
            }
            UciCommand::Go(opts) => {
                debug_info("go command received", debug);
                go(&opts, &mut searcher, &game, debug);
            }
            UciCommand::Stop => {
                // the search, if any, already returned by the time we read this line
                searcher.limit.stop();
            }
            UciCommand::PonderHit => {
                debug_info("ponderhit received, but pondering is not supported", debug);
            }
            UciCommand::Quit => {
                break;
            }
        }
    }
}

/// Execute a UCI `go` command: configure the search limit from the given options, then run the
/// search to completion (blocking) and print the resulting `bestmove`.
fn go(opts: &[GoOption], searcher: &mut MainSearch, game: &ScoredGame, debug: bool) {
    // time remaining for players
    let (mut wtime, mut btime) = (None, None);

    // increments. by default assumed to be zero
    let (mut winc, mut binc) = (0, 0);

    // number of moves until increment achieved. if `None`, there is no increment.
    let mut movestogo = None;

    let mut infinite = false;
    let mut movetime = None;

    *searcher.limit.nodes_cap.lock().unwrap() = None;

    // by default, set the depth to search to be 99, so that the timer is the
    // sole limiting factor
    searcher.config.depth = 99;
    for opt in opts {
        match opt {
            GoOption::SearchMoves(_) => {
                unimplemented!("no implementation of searching move subsets")
            }
            GoOption::Ponder => {
                infinite = true;
            }
            &GoOption::WhiteTime(time) => {
                wtime = Some(time);
            }
            &GoOption::BlackTime(time) => {
                btime = Some(time);
            }
            &GoOption::WhiteInc(inc) => {
                winc = inc;
            }
            &GoOption::BlackInc(inc) => {
                binc = inc;
            }
            GoOption::MovesToGo(n) => {
                movestogo = Some(*n);
            }
            &GoOption::Depth(d) => {
                searcher.config.depth = d;
            }
            &GoOption::Nodes(num) => {
                *searcher.limit.nodes_cap.lock().unwrap() = Some(num);
            }
            GoOption::Mate(_) => unimplemented!(),
            &GoOption::MoveTime(msecs) => {
                movetime = Some(Duration::from_millis(msecs as u64));
            }
            GoOption::Infinite => {
                // on an infinite search, we will go as deep as we want
                // 99 is basically infinite in exponential growth
                searcher.config.depth = 99;
                infinite = true;
            }
        }
    }

    // configure timeout condition
    {
        let mut search_duration_guard = searcher.limit.search_duration.lock().unwrap();
        if infinite {
            *search_duration_guard = None;
        } else if let Some(mt) = movetime {
            *search_duration_guard = Some(mt)
        } else {
            *search_duration_guard = Some(Duration::from_millis(get_search_time(
                movestogo,
                (winc, binc),
                (wtime.unwrap(), btime.unwrap()),
                game.board().player_to_move,
            ) as u64));
        }
        debug_info(&format!("search time: {:?}", *search_duration_guard), debug);
    }

    searcher.limit.start().unwrap();

    debug_info("starting evaluation", debug);
    let search_result = searcher.evaluate(game);
    debug_info("finished evaluation", debug);

    match search_result {
        Ok(info) => {
            println!(
                "{}",
                UciMessage::BestMove {
                    m: info.pv[0],
                    ponder: info.pv.get(1).copied(),
                }
            );
        }
        Err(e) => {
            debug_info(&format!("search failed: {:?}", e), debug);
        }
    }
}

/// Print out a debug info message to the console. Will have no effect if
/// `debug` is `false`.
fn debug_info(s: &str, debug: bool) {
    if debug {
        println!("{}", UciMessage::Info(&[EngineInfo::String(s)]));
    }
}

/// Send out a message to add an option for the frontend.
fn add_option(name: &str, opt: OptionType) {
    println!("{}", UciMessage::Option { name, opt })
}
