//! Line-oriented text protocol for driving the engine from a host process.
//!
//! Framing follows the Go Text Protocol: each request is an optional numeric
//! id, a command and its arguments on one line; each response is
//! `=[id] text` on success or `?[id] message` on failure, followed by a blank
//! line.
//!
//! ## Commands
//!
//! - `name`, `version`, `protocol_version`, `list_commands`,
//!   `known_command <cmd>`, `quit`
//! - `newgame [pairs]` - Reset to the start position with an empty registry
//! - `position <fen>` - Reset to a position with an empty registry
//! - `fen` - Current position
//! - `portals` - Registry as JSON
//! - `snapshot` / `load <json>` - Export / import position and registry
//! - `moves <sq>` - Legal moves of one piece
//! - `legal` - All legal moves for the side to move
//! - `play <move>` - Play `e2e4`, `e7e8q`, `a1h5[a4]` or `portal:a4-h4`
//! - `portal <a> <b>` - Place a portal pair for the side to move
//! - `outcome` - `ongoing`, `checkmate <color>`, `stalemate` or `draw <reason>`
//! - `board` - ASCII diagram
//!
//! ## Example
//!
//! ```ignore
//! use portal_chess::protocol::Engine;
//! let mut engine = Engine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use log::{debug, warn};

use crate::board::Square;
use crate::game::{Game, GameConfig, Snapshot};
use crate::moves::ActionRequest;

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "board",
    "fen",
    "known_command",
    "legal",
    "list_commands",
    "load",
    "moves",
    "name",
    "newgame",
    "outcome",
    "play",
    "portal",
    "portals",
    "position",
    "protocol_version",
    "quit",
    "snapshot",
    "version",
];

/// Protocol engine state.
pub struct Engine {
    game: Game,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self { game: Game::default() }
    }

    pub fn with_game(game: Game) -> Self {
        Self { game }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Run the command loop on stdin/stdout until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Run the command loop over arbitrary streams.
    pub fn serve<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            if !success {
                debug!("{command}: {message}");
            }
            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end > 0 {
            if let Ok(id) = trimmed[..end].parse::<u32>() {
                return (Some(id), trimmed[end..].trim());
            }
        }
        (None, trimmed)
    }

    /// Execute a command and return (success, response).
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "1".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => {
                let Some(cmd) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                (true, known.to_string())
            }

            "quit" => (true, String::new()),

            "newgame" => {
                let pairs = match args.first() {
                    Some(s) => match s.parse::<usize>() {
                        Ok(n) => n,
                        Err(_) => return (false, format!("invalid portal count '{s}'")),
                    },
                    None => self.game.config().portal_pairs,
                };
                self.reset(GameConfig::with_portal_pairs(pairs))
            }

            "position" => {
                if args.is_empty() {
                    return (false, "missing FEN".to_string());
                }
                let config = GameConfig {
                    portal_pairs: self.game.config().portal_pairs,
                    start_fen: args.join(" "),
                };
                self.reset(config)
            }

            "fen" => (true, self.game.position().to_fen()),

            "portals" => (true, self.game.portals().to_json()),

            "snapshot" => (true, self.game.snapshot().to_json()),

            "load" => {
                let json = args.join(" ");
                match Snapshot::from_json(&json).and_then(|s| Game::from_snapshot(&s)) {
                    Ok(game) => {
                        self.game = game;
                        (true, String::new())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            "moves" => {
                let Some(arg) = args.first() else {
                    return (false, "missing square".to_string());
                };
                match arg.parse::<Square>() {
                    Ok(sq) => (true, join(self.game.moves_for(sq))),
                    Err(e) => (false, e.to_string()),
                }
            }

            "legal" => (true, join(self.game.legal_moves())),

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing move".to_string());
                };
                let request: ActionRequest = match arg.parse() {
                    Ok(r) => r,
                    Err(e) => return (false, e.to_string()),
                };
                match self.game.play(&request) {
                    Ok(mv) => (true, mv.to_string()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "portal" => {
                if args.len() < 2 {
                    return (false, "missing arguments".to_string());
                }
                let (a, b) = match (args[0].parse::<Square>(), args[1].parse::<Square>()) {
                    (Ok(a), Ok(b)) => (a, b),
                    (Err(e), _) | (_, Err(e)) => return (false, e.to_string()),
                };
                let owner = self.game.side_to_move();
                match self.game.place_portal(a, b, owner) {
                    Ok(()) => (true, String::new()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "outcome" => (true, self.game.outcome().to_string()),

            "board" => (true, format!("\n{}", self.game.position())),

            _ => {
                warn!("unknown command: {command}");
                (false, format!("unknown command: {command}"))
            }
        }
    }

    fn reset(&mut self, config: GameConfig) -> (bool, String) {
        match Game::new(config) {
            Ok(game) => {
                self.game = game;
                (true, String::new())
            }
            Err(e) => (false, e.to_string()),
        }
    }
}

fn join<T: ToString>(items: Vec<T>) -> String {
    items.iter().map(T::to_string).collect::<Vec<_>>().join(" ")
}
