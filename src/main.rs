//! portal-chess: a chess rules engine with linked portal squares.
//!
//! ## Usage
//!
//! - `portal-chess` - Start the text protocol server on stdin/stdout
//! - `portal-chess serve` - Same as above
//! - `portal-chess demo` - Walk through a few portal moves
//! - `portal-chess moves <sq> --portal a4-h4` - List legal moves of one piece
//! - `portal-chess playout --games 10` - Play random games

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;

use portal_chess::board::{Color, Square};
use portal_chess::constants::{DEFAULT_PORTAL_PAIRS, MAX_GAME_PLIES, START_FEN};
use portal_chess::game::{Game, GameConfig, Snapshot};
use portal_chess::playout::playout;
use portal_chess::portal::PortalRegistry;
use portal_chess::protocol::Engine;

/// portal-chess: a chess rules engine with linked portal squares
#[derive(Parser)]
#[command(name = "portal-chess")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum number of live portal pairs (2 to 4)
    #[arg(long, global = true, default_value_t = DEFAULT_PORTAL_PAIRS)]
    portal_pairs: usize,

    /// Starting position in FEN
    #[arg(long, global = true)]
    fen: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the text protocol on stdin/stdout
    Serve,
    /// Run a short demonstration of portal moves
    Demo,
    /// List the legal moves of the piece on a square
    Moves {
        /// Square of the piece, e.g. `a1`
        square: String,
        /// Portal pair to place first, e.g. `a4-h4`; may be repeated
        #[arg(long = "portal")]
        portals: Vec<String>,
    },
    /// Play random games and report their outcomes
    Playout {
        /// Number of games
        #[arg(long, default_value_t = 1)]
        games: usize,
        /// Seed for the first game; later games use seed + i
        #[arg(long)]
        seed: Option<u64>,
        /// Ply limit per game
        #[arg(long, default_value_t = MAX_GAME_PLIES)]
        max_plies: usize,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let config = GameConfig {
        portal_pairs: cli.portal_pairs,
        start_fen: cli.fen.clone().unwrap_or_else(|| START_FEN.to_string()),
    };

    match cli.command {
        Some(Commands::Serve) | None => {
            let game = Game::new(config).context("invalid game configuration")?;
            let mut engine = Engine::with_game(game);
            engine.run().context("protocol I/O failed")?;
        }
        Some(Commands::Demo) => run_demo()?,
        Some(Commands::Moves { square, portals }) => run_moves(config, &square, &portals)?,
        Some(Commands::Playout {
            games,
            seed,
            max_plies,
        }) => run_playouts(config, games, seed, max_plies)?,
    }
    Ok(())
}

fn run_moves(config: GameConfig, square: &str, portals: &[String]) -> Result<()> {
    let game = Game::new(config).context("invalid game configuration")?;
    let sq: Square = square.parse()?;

    let mut registry = game.portals().clone();
    for pair in portals {
        let Some((a, b)) = pair.split_once('-') else {
            bail!("portal '{pair}' is not of the form a4-h4");
        };
        let owner = game.side_to_move();
        registry = registry
            .place(game.position().board(), a.parse()?, b.parse()?, owner)
            .with_context(|| format!("cannot place portal {pair}"))?;
    }

    let snapshot = Snapshot {
        fen: game.position().to_fen(),
        portals: registry,
    };
    let game = Game::from_snapshot(&snapshot)?;
    for m in game.moves_for(sq) {
        println!("{m}");
    }
    Ok(())
}

fn run_playouts(config: GameConfig, games: usize, seed: Option<u64>, max_plies: usize) -> Result<()> {
    let base = seed.unwrap_or_else(|| fastrand::u64(..));
    for i in 0..games {
        let seed = base.wrapping_add(i as u64);
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut game = Game::new(config.clone()).context("invalid game configuration")?;
        let result = playout(&mut game, &mut rng, max_plies);
        info!(
            "game {i} (seed {seed}): {} after {} plies, {} portal moves, {} placements",
            result.outcome,
            result.moves.len(),
            result.portal_moves,
            result.placements
        );
        println!("{seed} {} {}", result.moves.len(), result.outcome);
    }
    Ok(())
}

fn run_demo() -> Result<()> {
    println!("portal-chess: chess with linked portal squares\n");

    let fen = "4k3/8/7p/8/8/8/8/R3K3 w - - 0 1";
    let mut game = Game::new(GameConfig {
        start_fen: fen.to_string(),
        ..GameConfig::default()
    })?;
    println!("=== Position ===");
    println!("{}", game.position());

    let (a, b): (Square, Square) = ("a4".parse()?, "h4".parse()?);
    println!("=== Rook moves without portals ===");
    print_moves(&game, "a1")?;

    let registry = PortalRegistry::new(DEFAULT_PORTAL_PAIRS)?.place(game.position().board(), a, b, Color::White)?;
    game = Game::from_snapshot(&Snapshot {
        fen: fen.to_string(),
        portals: registry,
    })?;
    println!("=== Rook moves with portal {a}-{b} ===");
    print_moves(&game, "a1")?;

    let played = game.play(&"a1h6".parse()?)?;
    println!("=== After {played} ===");
    println!("{}", game.position());
    println!("outcome: {}", game.outcome());
    Ok(())
}

fn print_moves(game: &Game, square: &str) -> Result<()> {
    let sq: Square = square.parse()?;
    let moves: Vec<String> = game.moves_for(sq).iter().map(|m| m.to_string()).collect();
    println!("{}\n", moves.join(" "));
    Ok(())
}
