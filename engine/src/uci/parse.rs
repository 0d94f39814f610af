use harrier_base::Board;

use crate::Move;

use super::{GoOption, UciCommand};

/// Either a parsed `UciCommand`, or the text of whatever went wrong turning
/// the line into one. Per the UCI protocol, a parse failure is something to
/// log or ignore, never something to crash the engine over.
pub type UciParseResult = Result<UciCommand, String>;

/// Parse one line of GUI input into a `UciCommand`. `board` is the position
/// currently loaded, needed only so that `go searchmoves` can resolve move
/// tokens against it.
pub fn parse_line(line: &str, board: &Board) -> UciParseResult {
    let mut tokens = line.split_ascii_whitespace();
    let first_tok = tokens.next().ok_or("line contains no tokens")?;
    match first_tok {
        "uci" => Ok(UciCommand::Uci),
        "debug" => match tokens.next() {
            Some("on") | None => Ok(UciCommand::Debug(true)),
            Some("off") => Ok(UciCommand::Debug(false)),
            _ => Err("unrecognized option".into()),
        },
        "isready" => Ok(UciCommand::IsReady),
        "setoption" => parse_set_option(&mut tokens),
        "ucinewgame" => Ok(UciCommand::NewGame),
        "position" => parse_position(&mut tokens),
        "go" => parse_go(&mut tokens, board),
        "stop" => Ok(UciCommand::Stop),
        "ponderhit" => Ok(UciCommand::PonderHit),
        "quit" => Ok(UciCommand::Quit),
        _ => Err("unrecognized UCI command".into()),
    }
}

/// Parse the body of a `setoption` command, i.e. everything after the
/// `setoption` token has been consumed and the next token is expected to be
/// `name`.
fn parse_set_option(tokens: &mut dyn Iterator<Item = &str>) -> UciParseResult {
    // consume `name` token
    let name_tok = tokens
        .next()
        .ok_or("reached end of line while searching for `name` field in `setoption`")?;
    if name_tok != "name" {
        return Err(format!(
            "expected token `name` for `setoption`, got `{name_tok}`"
        ));
    }

    // parse key
    let mut key = String::new();
    loop {
        let key_tok = match tokens.next() {
            Some(tok) => tok,
            None => {
                return Ok(UciCommand::SetOption {
                    name: key,
                    value: None,
                })
            }
        };
        if key_tok == "value" {
            // we now expect a value string
            break;
        }
        if !key.is_empty() {
            key += " ";
        }
        key += key_tok;
    }

    // optionally parse value
    let mut value = String::new();
    loop {
        let val_tok = match tokens.next() {
            Some(val) => val,
            None => {
                return Ok(UciCommand::SetOption {
                    name: key,
                    value: Some(value),
                })
            }
        };

        if !value.is_empty() {
            value += " ";
        }
        value += val_tok;
    }
}

/// Parse the body of a `position` command, i.e. everything after the
/// `position` token, which starts with either `fen <FEN> moves ...` or
/// `startpos moves ...`.
fn parse_position(tokens: &mut dyn Iterator<Item = &str>) -> UciParseResult {
    let start_fen = match tokens
        .next()
        .ok_or_else(|| "reached EOL while parsing position".to_string())?
    {
        "fen" => {
            // Extract
            let mut fen = String::new();
            let mut next_tok = tokens.next().ok_or("reached EOL while parsing FEN")?;
            loop {
                if next_tok == "moves" {
                    break;
                }
                if !fen.is_empty() {
                    fen += " ";
                }
                fen += next_tok;

                next_tok = tokens.next().ok_or("reached EOL while parsing FEN")?;
            }
            Some(fen)
        }
        "startpos" => {
            let moves_tok = tokens.next().ok_or("reached EOL while parsing position")?;
            if moves_tok != "moves" {
                return Err(format!(
                    "expected token `moves` after `startpos`, got {moves_tok}"
                ));
            }

            None
        }
        _ => return Err("illegal starting position token".to_string()),
    };

    let board = Board::from_fen(
        start_fen
            .as_deref()
            .unwrap_or("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
    )?;

    let mut moves = Vec::new();
    for m_result in tokens.map(|tok| Move::from_uci(tok, &board)) {
        match m_result {
            Ok(m) => moves.push(m),
            Err(e) => return Err(format!("could not parse UCI move: {e}")),
        };
    }

    Ok(UciCommand::Position {
        fen: start_fen,
        moves,
    })
}

/// Parse the body of a `go` command, i.e. everything after the `go` token.
/// `board` resolves the move tokens under `searchmoves`.
fn parse_go(tokens: &mut dyn Iterator<Item = &str>, board: &Board) -> UciParseResult {
    let mut opts = Vec::new();
    let mut peeks = tokens.peekable();
    while let Some(opt_tok) = peeks.next() {
        opts.push(match opt_tok {
            "searchmoves" => GoOption::SearchMoves(parse_search_moves(&mut peeks, board)),
            "ponder" => GoOption::Ponder,
            "wtime" => GoOption::WhiteTime(parse_u32(peeks.next())?),
            "btime" => GoOption::BlackTime(parse_u32(peeks.next())?),
            "winc" => GoOption::WhiteInc(parse_u32(peeks.next())?),
            "binc" => GoOption::BlackInc(parse_u32(peeks.next())?),
            "movestogo" => GoOption::MovesToGo(parse_u8(peeks.next())?),
            "depth" => GoOption::Depth(parse_u8(peeks.next())?),
            "nodes" => GoOption::Nodes(parse_int(peeks.next())?),
            "mate" => GoOption::Mate(parse_u8(peeks.next())?),
            "movetime" => GoOption::MoveTime(parse_u32(peeks.next())?),
            "infinite" => GoOption::Infinite,
            _ => return Err(format!("unrecognized option {opt_tok} for `go`")),
        });
    }

    Ok(UciCommand::Go(opts))
}

/// Consume tokens following `searchmoves` for as long as they parse as legal
/// moves on `board`; the first token that doesn't is left unconsumed, since
/// it must be the next `go` option keyword.
fn parse_search_moves<'a, I: Iterator<Item = &'a str>>(
    peeks: &mut std::iter::Peekable<I>,
    board: &Board,
) -> Vec<Move> {
    let mut moves = Vec::new();
    while let Some(&m_tok) = peeks.peek() {
        match Move::from_uci(m_tok, board) {
            Ok(m) => {
                moves.push(m);
                peeks.next();
            }
            Err(_) => break,
        }
    }
    moves
}

/// Parse a single required integer token, failing on EOF or a malformed
/// number.
fn parse_int(x: Option<&str>) -> Result<u64, String> {
    match x {
        None => Err("reached EOF while parsing int".into()),
        Some(s) => s
            .parse()
            .map_err(|e| format!("could not parse int due to error: {e}")),
    }
}

/// `parse_int`, narrowed to `u32` for the clock- and increment-valued `go`
/// options.
fn parse_u32(x: Option<&str>) -> Result<u32, String> {
    u32::try_from(parse_int(x)?).map_err(|e| format!("value out of range for u32: {e}"))
}

/// `parse_int`, narrowed to `u8` for the depth- and ply-valued `go` options.
fn parse_u8(x: Option<&str>) -> Result<u8, String> {
    u8::try_from(parse_int(x)?).map_err(|e| format!("value out of range for u8: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use harrier_base::Square;

    #[test]
    /// Test that an ordinary "startpos" UCI position command is parsed
    /// correctly.
    fn test_position_starting() {
        assert_eq!(
            parse_line("position startpos moves\n", &Board::default()),
            Ok(UciCommand::Position {
                fen: None,
                moves: Vec::new()
            })
        );
    }

    #[test]
    /// Test that a FEN is properly loaded from a UCI position command.
    fn test_position_fen() {
        assert_eq!(
            parse_line(
                "position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 moves\n",
                &Board::default()
            ),
            Ok(UciCommand::Position {
                fen: Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".into()),
                moves: Vec::new()
            })
        );
    }

    #[test]
    /// Test that a FEN is properly loaded from a UCI position command.
    fn test_position_fen_then_moves() {
        assert_eq!(
            parse_line("position fen rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 moves c7c5 g1f3\n", &Board::default()), 
            Ok(UciCommand::Position {
                fen: Some("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1".into()), 
                moves: vec![
                    Move::normal(Square::C7, Square::C5),
                    Move::normal(Square::G1, Square::F3)
                ]
            })
        );
    }

    #[test]
    /// Test that an option with no value is correctly set.
    fn test_setoption_key_only() {
        assert_eq!(
            parse_line("setoption name MyOption\n", &Board::default()),
            Ok(UciCommand::SetOption {
                name: "MyOption".into(),
                value: None
            })
        );
    }

    #[test]
    /// Test that a key-value pair for a setoption is correct.
    fn test_setoption_key_value() {
        assert_eq!(
            parse_line("setoption name my option value 4 or 5\n", &Board::default()),
            Ok(UciCommand::SetOption {
                name: "my option".into(),
                value: Some("4 or 5".into())
            })
        );
    }

    #[test]
    /// Test that a simple `go` command is parsed correctly.
    fn test_go_simple() {
        assert_eq!(
            parse_line("go depth 7 nodes 25\n", &Board::default()),
            Ok(UciCommand::Go(vec![
                GoOption::Depth(7),
                GoOption::Nodes(25),
            ]))
        );
    }

    #[test]
    /// Test that a `go` command with every option is parsed correctly. In
    /// practice this command would be invalid since the `infinite` option
    /// would remove the validity of all others.
    fn test_go_all() {
        assert_eq!(
            parse_line(
                "go depth 7 nodes 250 infinite searchmoves e2e4 wtime 1 btime 2 winc 3 binc 4 movestogo 5 mate 6 movetime 7 ponder\n", 
            &Board::default()
        ),
            Ok(UciCommand::Go(vec![
                GoOption::Depth(7),
                GoOption::Nodes(250),
                GoOption::Infinite,
                GoOption::SearchMoves(vec![Move::normal(Square::E2, Square::E4)]),
                GoOption::WhiteTime(1),
                GoOption::BlackTime(2),
                GoOption::WhiteInc(3),
                GoOption::BlackInc(4),
                GoOption::MovesToGo(5),
                GoOption::Mate(6),
                GoOption::MoveTime(7),
                GoOption::Ponder,
            ]))
        );
    }

    #[test]
    /// Test that a `go searchmoves` does not cause the moves to eat future
    /// options.
    fn test_go_searchmoves() {
        assert_eq!(
            parse_line("go searchmoves e2e4 infinite\n", &Board::default()),
            Ok(UciCommand::Go(vec![
                GoOption::SearchMoves(vec![Move::normal(Square::E2, Square::E4)]),
                GoOption::Infinite,
            ]))
        );
    }

    #[test]
    /// Test that a `uci` command is parsed correctly.
    fn test_uci() {
        assert_eq!(parse_line("uci\n", &Board::default()), Ok(UciCommand::Uci));
    }

    #[test]
    /// Test that the `debug` commands are parsed correctly.
    fn test_debug() {
        assert_eq!(
            parse_line("debug on\n", &Board::default()),
            Ok(UciCommand::Debug(true))
        );

        assert_eq!(
            parse_line("debug off\n", &Board::default()),
            Ok(UciCommand::Debug(false))
        );
    }
}
