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

//! An interactive, text-based front end for Harrier.
//!
//! This is not the UCI loop (see `harrier_engine::main`, built as the `harrier_engine` binary):
//! it is a small human-friendly shell, intended for manually driving a game against the engine
//! from a terminal. Slash-prefixed tokens are commands; anything else is parsed as an algebraic
//! move to play immediately.

use std::{
    fmt, io,
    io::BufRead,
    time::Duration,
};

use harrier_base::{
    algebraic::{algebraic_from_move, move_from_algebraic},
    game::Tagger,
    movegen::ALL,
    perft::perft_from_board,
    Move, Piece,
};
use harrier_engine::{
    evaluate::{leaf_evaluate, ScoreTag, ScoredGame},
    thread::MainSearch,
};

/// A text-based application for running Harrier.
pub struct HarrierApp<'a> {
    /// The currently-played game.
    game: ScoredGame,

    /// The engine to play against.
    engine: MainSearch,

    /// The input stream to receive messages from.
    input_stream: Box<dyn io::Read + 'a>,

    /// The output stream to send messages to.
    output_stream: Box<dyn io::Write + 'a>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The set of commands which this command line program can execute.
enum Command {
    /// Quit the currently-running application.
    Quit,

    /// Echo an error message to the output stream.
    EchoError(String),

    /// Set the search depth the engine will play at.
    SetDepth(u8),

    /// Play a move.
    PlayMove {
        /// The move to play.
        m: Move,
        /// Whether the engine should make an immediate reply to the move.
        engine_reply: bool,
    },

    /// Load a FEN (Forsyth-Edwards Notation) string of a board.
    LoadFen(String),

    /// Undo the most recent moves.
    Undo(usize),

    /// List the available moves to the user.
    ListMoves,

    /// Request that the engine play the next move.
    EngineMove,

    /// Set the amount of time for which the engine can search, in milliseconds.
    SetTimeout(u64),

    /// Print out the history of the game currently being played.
    PrintHistory,

    /// List the available slash commands.
    Help,

    /// Print the board in its current state.
    ShowBoard,

    /// Print each piece type's bitboard for the current position.
    ShowBitboards,

    /// Run `perft` from the current position to the given depth.
    Perft(u8),

    /// Print the static evaluation of the current position.
    Evaluate,

    /// Let the engine play both sides for the given number of plies.
    AutoPlay(usize),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Quit => write!(f, "quit"),
            Command::EchoError(s) => write!(f, "echo error {s}"),
            Command::SetDepth(d) => write!(f, "set depth {d}"),
            Command::PlayMove {
                m,
                engine_reply: reply,
            } => write!(f, "play move {m}; reply? {reply}"),
            Command::LoadFen(s) => write!(f, "load fen {s}"),
            Command::Undo(n) => write!(f, "undo {n}"),
            Command::ListMoves => write!(f, "list moves"),
            Command::EngineMove => write!(f, "play engine move"),
            Command::SetTimeout(n) => write!(f, "set timeout {:.3}", *n as f32 / 1000.),
            Command::PrintHistory => write!(f, "print history"),
            Command::Help => write!(f, "help"),
            Command::ShowBoard => write!(f, "show board"),
            Command::ShowBitboards => write!(f, "show bitboards"),
            Command::Perft(depth) => write!(f, "perft {depth}"),
            Command::Evaluate => write!(f, "evaluate"),
            Command::AutoPlay(n) => write!(f, "auto-play {n}"),
        }
    }
}

type CommandResult = Result<(), String>;

type ParseResult = Result<Command, String>;

impl<'a> HarrierApp<'a> {
    /// Run the command line application.
    /// Will continue running until the user specifies to quit.
    pub fn run(&mut self) -> io::Result<()> {
        let mut has_quit = false;
        let mut user_input = String::with_capacity(64);
        while !has_quit {
            let board = self.game.board();
            writeln!(self.output_stream, "{board}")?;
            writeln!(self.output_stream, "Type out a move or enter a command.")?;

            let mut buf_reader = io::BufReader::new(&mut self.input_stream);
            buf_reader.read_line(&mut user_input)?;

            let parse_result = self.parse_command(&user_input);
            let command = match parse_result {
                Ok(cmd) => cmd,
                Err(s) => Command::EchoError(s),
            };

            let execution_result = match command {
                Command::Quit => {
                    has_quit = true;
                    writeln!(self.output_stream, "Now quitting.")?;
                    Ok(())
                }
                _ => self.execute_command(command),
            };

            if let Err(s) = execution_result {
                writeln!(
                    self.output_stream,
                    "an error occurred while executing the command: {s}"
                )?;
            }

            user_input.clear();
        }
        Ok(())
    }

    /// Parse the given text command, and create a new `Command` to describe it.
    /// Will return an `Err` if it cannot parse the given command.
    fn parse_command(&self, s: &str) -> ParseResult {
        let mut token_iter = s.split_ascii_whitespace();
        let first_token = token_iter.next();
        let command_block = first_token.ok_or("no token given")?;

        if command_block.starts_with('/') {
            let command_name = command_block.get(1..).ok_or("no command specified")?;

            match command_name {
                "q" | "quit" => Ok(Command::Quit),
                "d" | "depth" => Ok(Command::SetDepth(
                    token_iter
                        .next()
                        .ok_or("required a depth to search to")?
                        .parse::<u8>()
                        .map_err(|_| "failed to parse depth")?,
                )),
                "l" | "load" => {
                    let fen_str = s[command_block.len()..].trim().into();
                    Ok(Command::LoadFen(fen_str))
                }
                "u" | "undo" => {
                    let num_undo = token_iter
                        .next()
                        .map(|s| s.parse::<usize>())
                        .unwrap_or(Ok(1)) // no token given -> assume you wanted to undo 1
                        .map_err(|_| "could not parse number to undo")?;
                    match num_undo {
                        0 => Err("cannot undo 0 moves".into()),
                        n => Ok(Command::Undo(n)),
                    }
                }
                "m" | "move" => Ok(Command::EngineMove),
                "p" | "history" => Ok(Command::PrintHistory),
                "t" | "timeout" => Ok(Command::SetTimeout(
                    token_iter
                        .next()
                        .ok_or("required number of milliseconds until timeout")?
                        .parse::<u64>()
                        .map_err(|_| "failed to parse timeout")?,
                )),
                "list" => Ok(Command::ListMoves),
                "h" | "help" => Ok(Command::Help),
                "b" | "board" => Ok(Command::ShowBoard),
                "bb" | "bitboards" => Ok(Command::ShowBitboards),
                "perft" => Ok(Command::Perft(
                    token_iter
                        .next()
                        .ok_or("required a depth to run perft to")?
                        .parse::<u8>()
                        .map_err(|_| "failed to parse perft depth")?,
                )),
                "e" | "eval" => Ok(Command::Evaluate),
                "auto" => Ok(Command::AutoPlay(
                    token_iter
                        .next()
                        .map(|s| s.parse::<usize>())
                        .unwrap_or(Ok(1)) // no token given -> assume one ply
                        .map_err(|_| "could not parse number of plies to auto-play")?,
                )),
                _ => Err("unrecognized command".into()),
            }
        } else {
            // this is a move
            self.parse_move_token(first_token)
                .map(|m| Command::PlayMove {
                    m,
                    engine_reply: true,
                })
        }
    }

    /// Parse a token for an algebraic move.
    fn parse_move_token(&self, move_token: Option<&str>) -> Result<Move, String> {
        let m_str = move_token.ok_or("no move token given")?;
        move_from_algebraic(m_str, self.game.board()).map_err(String::from)
    }

    fn execute_command(&mut self, c: Command) -> CommandResult {
        match c {
            Command::EchoError(s) => self.echo_error(&s),
            Command::LoadFen(fen) => self.load_fen(&fen),
            Command::PlayMove { m, engine_reply } => self.try_move(m, engine_reply),
            Command::ListMoves => self.list_moves(),
            Command::Undo(n) => self.game.undo_n(n).map_err(String::from),
            Command::SetDepth(d) => {
                self.engine.config.depth = d;
                Ok(())
            }
            Command::EngineMove => self.play_engine_move(),
            Command::SetTimeout(num) => {
                *self.engine.limit.search_duration.lock().unwrap() =
                    Some(Duration::from_millis(num));
                Ok(())
            }
            Command::PrintHistory => writeln!(self.output_stream, "{}", self.game)
                .map_err(|_| "write failed".into()),
            Command::Help => self.print_help(),
            Command::ShowBoard => writeln!(self.output_stream, "{}", self.game.board())
                .map_err(|_| "write failed".into()),
            Command::ShowBitboards => self.show_bitboards(),
            Command::Perft(depth) => {
                let count = perft_from_board(self.game.board(), depth);
                writeln!(self.output_stream, "{count} leaf nodes")
                    .map_err(|_| "write failed".into())
            }
            Command::Evaluate => {
                let eval = leaf_evaluate(&self.game);
                writeln!(self.output_stream, "{eval}").map_err(|_| "write failed".into())
            }
            Command::AutoPlay(n) => {
                for _ in 0..n {
                    self.play_engine_move()?;
                }
                Ok(())
            }
            Command::Quit => unreachable!("quit is handled by the caller"),
        }
    }

    /// List the slash commands this shell understands.
    fn print_help(&mut self) -> CommandResult {
        writeln!(
            self.output_stream,
            "/q quit | /d <n> set depth | /l <fen> load FEN | /u [n] undo | \
             /m engine move | /p history | /t <ms> set timeout | /list legal moves | \
             /h help | /b board | /bb bitboards | /perft <n> | /e evaluate | \
             /auto [n] auto-play\nany other input is parsed as an algebraic move"
        )
        .map_err(|_| "write failed".into())
    }

    /// Print the bitboard for every piece type in the current position.
    fn show_bitboards(&mut self) -> CommandResult {
        let b = *self.game.board();
        for pt in Piece::ALL_TYPES {
            writeln!(self.output_stream, "{pt:?}:\n{}", b[pt])
                .map_err(|_| "failed to write bitboards")?;
        }
        Ok(())
    }

    /// Echo out an error string to the user.
    fn echo_error(&mut self, s: &str) -> CommandResult {
        writeln!(self.output_stream, "error: {s}").map_err(|_| "write failed".into())
    }

    /// Attempt to load a FEN string into the game.
    fn load_fen(&mut self, fen: &str) -> CommandResult {
        self.game = ScoredGame::from_fen(fen)?;
        Ok(())
    }

    /// Attempt to play a move.
    fn try_move(&mut self, m: Move, engine_reply: bool) -> CommandResult {
        let tag = ScoreTag::tag_move(m, self.game.board());
        self.game.make_move(m, tag);
        if engine_reply {
            self.play_engine_move()?;
        }

        Ok(())
    }

    /// Print out a list of the available moves in this position.
    fn list_moves(&mut self) -> CommandResult {
        let b = *self.game.board();
        for (m, _) in self.game.get_moves::<ALL>() {
            writeln!(self.output_stream, "{}", algebraic_from_move(m, &b))
                .map_err(|_| "failed to write move list")?;
        }
        Ok(())
    }

    /// Have the engine play a move.
    fn play_engine_move(&mut self) -> CommandResult {
        self.engine
            .limit
            .start()
            .map_err(|_| String::from("poisoned limit locks"))?;
        let info = self
            .engine
            .evaluate(&self.game)
            .map_err(|_| "evaluation failed")?;
        let best_move = info.pv[0];

        writeln!(
            self.output_stream,
            "depth {}: the engine played {}: {}",
            info.depth,
            algebraic_from_move(best_move, self.game.board()),
            info.eval
        )
        .map_err(|_| "failed to write to output")?;

        let tag = ScoreTag::tag_move(best_move, self.game.board());
        self.game.make_move(best_move, tag);

        Ok(())
    }
}

impl<'a> Default for HarrierApp<'a> {
    fn default() -> HarrierApp<'a> {
        let mut engine = MainSearch::new();
        *engine.limit.search_duration.lock().unwrap() = Some(Duration::from_secs(5));
        HarrierApp {
            game: ScoredGame::default(),
            engine,
            input_stream: Box::new(io::stdin()),
            output_stream: Box::new(io::stdout()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harrier_base::Square;

    #[test]
    /// Test that the quit input yields a quit command.
    fn test_parse_quit() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/q"), Ok(Command::Quit));
    }

    #[test]
    /// Test that move input yields a move command.
    fn test_parse_move() {
        let app = HarrierApp::default();

        assert_eq!(
            app.parse_command("e4"),
            Ok(Command::PlayMove {
                m: Move::normal(Square::E2, Square::E4),
                engine_reply: true,
            })
        );
    }

    #[test]
    /// Test that load input yields a load fen command.
    fn test_parse_load() {
        let app = HarrierApp::default();
        assert_eq!(
            app.parse_command("/l r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7"),
            Ok(Command::LoadFen(
                "r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7".into()
            ))
        );
    }

    #[test]
    /// Test that executing a FEN load is successful.
    fn test_execute_load() {
        let mut app = HarrierApp::default();
        assert_eq!(
            app.execute_command(Command::LoadFen(
                "r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7".into()
            )),
            Ok(())
        );
        assert_eq!(
            app.game,
            ScoredGame::from_fen("r1bq1b1r/ppp2kpp/2n5/3np3/2B5/8/PPPP1PPP/RNBQK2R w KQ - 0 7")
                .unwrap()
        );
    }

    #[test]
    /// Test that we can parse a depth-setting command.
    fn test_parse_depth() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/d 8"), Ok(Command::SetDepth(8)));
    }

    #[test]
    /// Test that a garbage input does not parse correctly.
    fn test_garbage_failure() {
        let app = HarrierApp::default();
        assert!(app.parse_command("garbage").is_err());
    }

    #[test]
    /// `/p` must print history, not play a move: the two were swapped with
    /// `/h` (which must mean help) at one point.
    fn test_parse_history_not_play() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/p"), Ok(Command::PrintHistory));
    }

    #[test]
    fn test_parse_help() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/h"), Ok(Command::Help));
    }

    #[test]
    fn test_parse_show_board() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/b"), Ok(Command::ShowBoard));
    }

    #[test]
    fn test_parse_show_bitboards() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/bb"), Ok(Command::ShowBitboards));
    }

    #[test]
    fn test_parse_perft() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/perft 3"), Ok(Command::Perft(3)));
    }

    #[test]
    fn test_parse_evaluate() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/e"), Ok(Command::Evaluate));
    }

    #[test]
    fn test_parse_auto_default_ply() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/auto"), Ok(Command::AutoPlay(1)));
    }

    #[test]
    fn test_parse_auto_with_ply() {
        let app = HarrierApp::default();
        assert_eq!(app.parse_command("/auto 4"), Ok(Command::AutoPlay(4)));
    }

    #[test]
    /// Perft from the starting position to depth 1 should count the 20
    /// legal opening moves.
    fn test_execute_perft() {
        let mut app = HarrierApp::default();
        assert_eq!(app.execute_command(Command::Perft(1)), Ok(()));
    }
}
