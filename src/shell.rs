//! Line-oriented debugging shell: sets up positions, plays moves and runs
//! perft from a text stream.
//!
//! This is not a UCI implementation. The commands are meant for humans and
//! test scripts poking at the move generator.
//!
//! | Command | Effect |
//! |---------|--------|
//! | `position [startpos \| fen <fen>] [moves <move>...]` | Sets the position. |
//! | `push <move>...` | Plays UCI or SAN moves. |
//! | `moves` | Lists legal moves in UCI notation. |
//! | `d` | Prints the board. |
//! | `fen` | Prints the FEN. |
//! | `hash` | Prints the Polyglot key. |
//! | `check` | Prints check, mate and draw status. |
//! | `perft <depth>`, `perft_cache <depth>`, `perft_parallel <depth>` | Counts nodes. |
//! | `divide <depth>` | Counts nodes per root move. |
//! | `version` | Prints the build version. |
//! | `quit` | Stops the shell. |

use std::io::{BufRead, Write};

use itertools::Itertools;

use crate::chess::core::Move;
use crate::chess::position::{MoveParseError, Position};
use crate::perft;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    SetPosition {
        fen: Option<String>,
        moves: Vec<String>,
    },
    Push(Vec<String>),
    Moves,
    Display,
    Fen,
    Hash,
    Check,
    Perft(u8),
    PerftCache(u8),
    PerftParallel(u8),
    Divide(u8),
    Version,
    Quit,
    Unknown(String),
}

fn parse_setposition(input: &str, parts: &[&str]) -> Command {
    let moves_index = parts.iter().position(|&x| x == "moves");
    let setup_end = moves_index.unwrap_or(parts.len());
    let fen = match parts.get(1) {
        Some(&"startpos") if setup_end == 2 => None,
        Some(&"fen") if setup_end > 2 => Some(parts[2..setup_end].join(" ")),
        _ => return Command::Unknown(input.trim().to_string()),
    };
    let moves = moves_index.map_or_else(Vec::new, |index| {
        parts[index + 1..].iter().map(|s| (*s).to_string()).collect()
    });
    Command::SetPosition { fen, moves }
}

fn parse_depth(input: &str, parts: &[&str], command: fn(u8) -> Command) -> Command {
    match parts {
        [_, depth] => depth
            .parse()
            .map_or_else(|_| Command::Unknown(input.trim().to_string()), command),
        _ => Command::Unknown(input.trim().to_string()),
    }
}

impl Command {
    fn parse(input: &str) -> Self {
        let parts: Vec<&str> = input.split_whitespace().collect();

        if parts.is_empty() {
            return Self::Unknown(input.to_string());
        }

        match parts[0] {
            "position" => parse_setposition(input, &parts),
            "push" if parts.len() > 1 => {
                Self::Push(parts[1..].iter().map(|s| (*s).to_string()).collect())
            },
            "moves" => Self::Moves,
            "d" => Self::Display,
            "fen" => Self::Fen,
            "hash" => Self::Hash,
            "check" => Self::Check,
            "perft" => parse_depth(input, &parts, Self::Perft),
            "perft_cache" => parse_depth(input, &parts, Self::PerftCache),
            "perft_parallel" => parse_depth(input, &parts, Self::PerftParallel),
            "divide" => parse_depth(input, &parts, Self::Divide),
            "version" => Self::Version,
            "quit" => Self::Quit,
            _ => Self::Unknown(input.trim().to_string()),
        }
    }
}

/// Plays a move written either in UCI or in SAN.
fn push(position: &mut Position, notation: &str) -> anyhow::Result<Move> {
    match position.push_uci(notation) {
        Ok(played) => Ok(played),
        Err(e)
            if matches!(
                e.downcast_ref::<MoveParseError>(),
                Some(MoveParseError::Malformed { .. })
            ) =>
        {
            position.push_san(notation)
        },
        Err(e) => Err(e),
    }
}

/// The shell owns the current position and executes the commands read from
/// the input, writing responses to the output.
pub struct Shell<'a, R: BufRead, W: Write> {
    position: Position,
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    /// Creates a shell with the starting position and provided I/O.
    #[must_use]
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self {
            position: Position::starting(),
            input,
            output,
        }
    }

    /// Reads and executes commands until "quit" or the end of input.
    ///
    /// Rejected commands (unknown, malformed, illegal moves) are reported to
    /// the output as `error: ...` lines and leave the position unchanged.
    ///
    /// # Errors
    ///
    /// Only I/O failures stop the shell.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            let result = match Command::parse(&line) {
                Command::SetPosition { fen, moves } => self.handle_position(fen.as_deref(), &moves),
                Command::Push(moves) => self.handle_push(&moves),
                Command::Moves => self.handle_moves(),
                Command::Display => write!(self.output, "{:?}", self.position).map_err(Into::into),
                Command::Fen => writeln!(self.output, "{}", self.position).map_err(Into::into),
                Command::Hash => writeln!(self.output, "{:016x}", self.position.zobrist_hash())
                    .map_err(Into::into),
                Command::Check => self.handle_check(),
                Command::Perft(depth) => {
                    writeln!(self.output, "{}", perft::perft(&self.position, depth))
                        .map_err(Into::into)
                },
                Command::PerftCache(depth) => {
                    writeln!(self.output, "{}", perft::perft_cache(&self.position, depth))
                        .map_err(Into::into)
                },
                Command::PerftParallel(depth) => writeln!(
                    self.output,
                    "{}",
                    perft::perft_parallel(&self.position, depth)
                )
                .map_err(Into::into),
                Command::Divide(depth) => self.handle_divide(depth),
                Command::Version => writeln!(
                    self.output,
                    "{} {}",
                    env!("CARGO_PKG_NAME"),
                    crate::engine_version()
                )
                .map_err(Into::into),
                Command::Quit => break,
                Command::Unknown(command) => Err(anyhow::anyhow!("unknown command: {command}")),
            };
            if let Err(e) = result {
                if e.is::<std::io::Error>() {
                    return Err(e);
                }
                log::warn!("rejected {:?}: {e:#}", line.trim());
                writeln!(self.output, "error: {e:#}")?;
            }
        }
        self.output.flush()?;
        Ok(())
    }

    /// Changes the position only if the setup and every move are accepted.
    fn handle_position(&mut self, fen: Option<&str>, moves: &[String]) -> anyhow::Result<()> {
        let mut position = match fen {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::starting(),
        };
        for next_move in moves {
            let _ = push(&mut position, next_move)?;
        }
        log::debug!("position set to {position}");
        self.position = position;
        Ok(())
    }

    fn handle_push(&mut self, moves: &[String]) -> anyhow::Result<()> {
        let mut position = self.position;
        for next_move in moves {
            let _ = push(&mut position, next_move)?;
        }
        self.position = position;
        Ok(())
    }

    fn handle_moves(&mut self) -> anyhow::Result<()> {
        let moves = self
            .position
            .legal_moves()
            .iter()
            .map(Move::to_string)
            .sorted()
            .join(" ");
        writeln!(self.output, "{moves}")?;
        Ok(())
    }

    fn handle_check(&mut self) -> anyhow::Result<()> {
        writeln!(self.output, "check: {}", self.position.is_check())?;
        writeln!(self.output, "checkmate: {}", self.position.is_checkmate())?;
        writeln!(self.output, "stalemate: {}", self.position.is_stalemate())?;
        writeln!(self.output, "draw: {}", self.position.is_draw())?;
        Ok(())
    }

    fn handle_divide(&mut self, depth: u8) -> anyhow::Result<()> {
        let counts = perft::divide(&self.position, depth);
        for (root_move, nodes) in &counts {
            writeln!(self.output, "{root_move}: {nodes}")?;
        }
        writeln!(
            self.output,
            "total: {}",
            counts.iter().map(|(_, nodes)| nodes).sum::<u64>()
        )?;
        Ok(())
    }
}
