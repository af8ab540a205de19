//! portal-chess: a chess rules engine with linked portal squares.
//!
//! Players may spend a turn placing a pair of linked portal squares. Rooks,
//! bishops, queens and pawns that land on a portal continue from its far
//! end in the same direction; knights and kings only ever land on them.
//! Everything else is standard chess: castling, en passant, promotion,
//! check, checkmate, stalemate and the usual draws.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, portal limits, draw rules
//! - [`board`] - Squares, pieces and the 8x8 grid
//! - [`position`] - Board state, rights, counters and FEN
//! - [`moves`] - Move values and their text notation
//! - [`movegen`] - Standard pseudo-legal move generation
//! - [`portal`] - Portal pairs and the evicting registry
//! - [`portal_moves`] - Portal-aware move generation
//! - [`rules`] - Legality, committing moves, game outcome
//! - [`game`] - Game session with repetition history and snapshots
//! - [`protocol`] - Line-oriented text protocol
//! - [`playout`] - Random game simulation
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```
//! use portal_chess::board::{Color, Square};
//! use portal_chess::game::{Game, GameConfig};
//!
//! let mut game = Game::new(GameConfig {
//!     start_fen: "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".to_string(),
//!     ..GameConfig::default()
//! })
//! .unwrap();
//!
//! let a4: Square = "a4".parse().unwrap();
//! let h4: Square = "h4".parse().unwrap();
//! game.place_portal(a4, h4, Color::White).unwrap();
//! game.play(&"e8d8".parse().unwrap()).unwrap();
//!
//! // The rook on a1 now reaches h5 by way of a4 -> h4.
//! let moves = game.moves_for("a1".parse().unwrap());
//! assert!(moves.iter().any(|m| m.to_string() == "a1h5[a4]"));
//! ```

pub mod board;
pub mod constants;
pub mod error;
pub mod game;
pub mod movegen;
pub mod moves;
pub mod playout;
pub mod portal;
pub mod portal_moves;
pub mod position;
pub mod protocol;
pub mod rules;
