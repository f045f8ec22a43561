//! UCI protocol front-end and command loop.
//!
//! Parses UCI commands, keeps the current position and engine configuration,
//! runs `go` requests on a background thread so `stop` can be served, and
//! emits protocol-compliant output.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, warn};

use crate::errors::UciError;
use crate::game_state::chess_types::Color;
use crate::game_state::game_state::Position;
use crate::search::board_scoring::MaterialEvaluator;
use crate::search::iterative_deepening::{search, SearchLimits, SearchReport, SearchResult};
use crate::search::threading::{CacheKind, EngineConfig, SearchContext};
use crate::search::transposition_table::{is_mate_score, MATE};
use crate::utils::long_algebraic::{long_algebraic_to_move, move_to_long_algebraic};

const UCI_ENGINE_NAME: &str = "Plum Search";
const UCI_ENGINE_AUTHOR: &str = "jwkunz";

const MAX_HASH_MB: usize = 4096;
const MAX_THREADS: usize = 256;

/// Share of the remaining clock spent on one move.
const CLOCK_DIVISOR: u64 = 30;

type SharedOutput = Arc<Mutex<dyn Write + Send>>;

pub fn run_stdio_loop() -> io::Result<()> {
    let stdin = io::stdin();
    let mut uci = UciState::new(Arc::new(Mutex::new(io::stdout())));

    for line in stdin.lock().lines() {
        let line = line?;
        if uci.handle_command(&line)? {
            break;
        }
    }
    uci.stop_search();

    Ok(())
}

/// Write one protocol line and flush, tolerating a poisoned lock.
fn emit(out: &SharedOutput, line: &str) -> io::Result<()> {
    let mut guard = match out.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    writeln!(guard, "{line}")?;
    guard.flush()
}

/// Parameters of a `go` command before they are turned into limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GoParams {
    depth: Option<u8>,
    nodes: Option<u64>,
    movetime_ms: Option<u64>,
    wtime_ms: Option<u64>,
    btime_ms: Option<u64>,
    winc_ms: Option<u64>,
    binc_ms: Option<u64>,
    infinite: bool,
}

impl GoParams {
    /// An explicit movetime wins; otherwise budget `remaining / 30 + inc / 2`
    /// from the mover's clock.
    fn to_limits(self, side_to_move: Color) -> SearchLimits {
        let (remaining, increment) = match side_to_move {
            Color::Light => (self.wtime_ms, self.winc_ms),
            Color::Dark => (self.btime_ms, self.binc_ms),
        };
        let clock_budget =
            remaining.map(|ms| ms / CLOCK_DIVISOR + increment.unwrap_or(0) / 2);
        SearchLimits {
            max_depth: self.depth,
            max_nodes: self.nodes,
            movetime: self
                .movetime_ms
                .or(clock_budget)
                .map(|ms| Duration::from_millis(ms.max(1))),
            infinite: self.infinite,
            ..SearchLimits::default()
        }
    }
}

struct UciState {
    config: EngineConfig,
    context: SearchContext,
    position: Position,
    out: SharedOutput,
    search_thread: Option<JoinHandle<()>>,
}

impl UciState {
    fn new(out: SharedOutput) -> Self {
        let config = EngineConfig::default();
        Self {
            config,
            context: SearchContext::new(config),
            position: Position::new_game(),
            out,
            search_thread: None,
        }
    }

    /// Returns `Ok(true)` when the loop should exit. Only output failures are
    /// errors here; bad commands are reported to the GUI and logged.
    fn handle_command(&mut self, line: &str) -> io::Result<bool> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }

        let cmd = trimmed.split_whitespace().next().unwrap_or_default();
        let outcome = match cmd {
            "uci" => self.handle_uci(),
            "isready" => emit(&self.out, "readyok").map_err(UciError::from),
            "setoption" => self.handle_setoption(trimmed),
            "ucinewgame" => {
                self.stop_search();
                self.context.new_game();
                self.position = Position::new_game();
                Ok(())
            }
            "position" => self.handle_position(trimmed),
            "go" => self.handle_go(trimmed),
            "stop" => {
                self.stop_search();
                Ok(())
            }
            "quit" => return Ok(true),
            other => {
                debug!("ignoring unknown UCI command '{other}'");
                Ok(())
            }
        };

        match outcome {
            Ok(()) => Ok(false),
            Err(UciError::Io(err)) => Err(err),
            Err(err) => {
                warn!("{cmd}: {err}");
                emit(&self.out, &format!("info string {cmd} error: {err}"))?;
                Ok(false)
            }
        }
    }

    fn handle_uci(&self) -> Result<(), UciError> {
        let defaults = EngineConfig::default();
        emit(&self.out, &format!("id name {UCI_ENGINE_NAME}"))?;
        emit(&self.out, &format!("id author {UCI_ENGINE_AUTHOR}"))?;
        emit(
            &self.out,
            &format!(
                "option name Hash type spin default {} min 1 max {MAX_HASH_MB}",
                defaults.hash_mb
            ),
        )?;
        emit(
            &self.out,
            &format!(
                "option name Threads type spin default {} min 1 max {MAX_THREADS}",
                defaults.threads
            ),
        )?;
        emit(
            &self.out,
            &format!(
                "option name LocklessHash type check default {}",
                defaults.cache_kind == CacheKind::Lockless
            ),
        )?;
        emit(&self.out, "uciok")?;
        Ok(())
    }

    fn handle_setoption(&mut self, line: &str) -> Result<(), UciError> {
        let mut name_tokens = Vec::<&str>::new();
        let mut value_tokens = Vec::<&str>::new();
        let mut mode = "";

        for tok in line.split_whitespace().skip(1) {
            match tok {
                "name" => mode = "name",
                "value" => mode = "value",
                _ if mode == "name" => name_tokens.push(tok),
                _ if mode == "value" => value_tokens.push(tok),
                _ => {}
            }
        }

        let name = name_tokens.join(" ");
        let value = value_tokens.join(" ");
        let invalid = || UciError::InvalidOption {
            name: name.clone(),
            value: value.clone(),
        };

        let mut config = self.config;
        if name.eq_ignore_ascii_case("Hash") {
            let parsed = value.parse::<usize>().map_err(|_| invalid())?;
            config.hash_mb = parsed.clamp(1, MAX_HASH_MB);
        } else if name.eq_ignore_ascii_case("Threads") {
            let parsed = value.parse::<usize>().map_err(|_| invalid())?;
            config.threads = parsed.clamp(1, MAX_THREADS);
        } else if name.eq_ignore_ascii_case("LocklessHash") {
            config.cache_kind = match value.to_ascii_lowercase().as_str() {
                "true" | "1" | "on" => CacheKind::Lockless,
                "false" | "0" | "off" => CacheKind::Striped,
                _ => return Err(invalid()),
            };
        } else {
            return Err(invalid());
        }

        if config != self.config {
            self.stop_search();
            self.config = config;
            self.context = SearchContext::new(config);
        }
        Ok(())
    }

    fn handle_position(&mut self, line: &str) -> Result<(), UciError> {
        let mut tokens = line.split_whitespace().skip(1).peekable();

        let mut position = match tokens.next() {
            Some("startpos") => Position::new_game(),
            Some("fen") => {
                let mut fen_parts = Vec::<&str>::new();
                while let Some(&next) = tokens.peek() {
                    if next == "moves" {
                        break;
                    }
                    fen_parts.push(next);
                    tokens.next();
                }
                if fen_parts.is_empty() {
                    return Err(UciError::Malformed("missing FEN after 'position fen'".to_owned()));
                }
                Position::from_fen(&fen_parts.join(" "))?
            }
            Some(other) => {
                return Err(UciError::Malformed(format!(
                    "unsupported position token '{other}'"
                )))
            }
            None => return Err(UciError::Malformed("incomplete position command".to_owned())),
        };

        if tokens.next() == Some("moves") {
            for lan in tokens {
                let mv = long_algebraic_to_move(lan, &mut position)?;
                position.make_move(mv);
            }
        }

        self.position = position;
        Ok(())
    }

    fn handle_go(&mut self, line: &str) -> Result<(), UciError> {
        let limits = parse_go_params(line)?.to_limits(self.position.side_to_move());
        self.stop_search();

        // Reset before spawning; a `stop` may follow `go` immediately.
        self.context.reset_stop();

        let context = self.context.clone();
        let position = self.position.clone();
        let out = Arc::clone(&self.out);
        let handle = thread::Builder::new()
            .name("uci-search".to_owned())
            .spawn(move || {
                let result = search(&context, &position, &limits, &MaterialEvaluator, |report| {
                    if let Err(err) = emit(&out, &format_info(report)) {
                        warn!("failed to write search info: {err}");
                    }
                });
                if let Err(err) = emit(&out, &format_bestmove(&result)) {
                    warn!("failed to write bestmove: {err}");
                }
            })?;
        self.search_thread = Some(handle);
        Ok(())
    }

    /// Cancel any running search and wait for its `bestmove`.
    fn stop_search(&mut self) {
        if self.search_thread.is_some() {
            self.context.stop();
        }
        self.wait_for_search();
    }

    fn wait_for_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }
}

fn parse_go_params(line: &str) -> Result<GoParams, UciError> {
    fn value<'a, T: std::str::FromStr>(
        key: &str,
        tokens: &mut impl Iterator<Item = &'a str>,
    ) -> Result<T, UciError> {
        let raw = tokens
            .next()
            .ok_or_else(|| UciError::Malformed(format!("missing value for '{key}'")))?;
        raw.parse::<T>()
            .map_err(|_| UciError::Malformed(format!("invalid value '{raw}' for '{key}'")))
    }

    let mut params = GoParams::default();
    let mut tokens = line.split_whitespace().skip(1);
    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => params.depth = Some(value(tok, &mut tokens)?),
            "nodes" => params.nodes = Some(value(tok, &mut tokens)?),
            "movetime" => params.movetime_ms = Some(value(tok, &mut tokens)?),
            "wtime" => params.wtime_ms = Some(value(tok, &mut tokens)?),
            "btime" => params.btime_ms = Some(value(tok, &mut tokens)?),
            "winc" => params.winc_ms = Some(value(tok, &mut tokens)?),
            "binc" => params.binc_ms = Some(value(tok, &mut tokens)?),
            "infinite" => params.infinite = true,
            other => debug!("ignoring go token '{other}'"),
        }
    }
    Ok(params)
}

/// `cp <n>` for ordinary scores, `mate <moves>` (negative when being mated)
/// for mate scores.
fn format_score(score: i32) -> String {
    if is_mate_score(score) {
        let plies = MATE - score.abs();
        let moves = (plies + 1) / 2;
        if score > 0 {
            format!("mate {moves}")
        } else {
            format!("mate -{moves}")
        }
    } else {
        format!("cp {score}")
    }
}

fn format_info(report: &SearchReport) -> String {
    let pv = report
        .pv
        .iter()
        .map(|&mv| move_to_long_algebraic(mv))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "info depth {} score {} nodes {} nps {} time {} hashfull {} pv {}",
        report.depth,
        format_score(report.score),
        report.nodes,
        report.nps,
        report.elapsed.as_millis(),
        report.hashfull,
        pv
    )
}

fn format_bestmove(result: &SearchResult) -> String {
    match result.best_move {
        Some(mv) => format!("bestmove {}", move_to_long_algebraic(mv)),
        None => "bestmove 0000".to_owned(),
    }
}
