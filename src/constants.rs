//! Constants for board geometry, piece movement, portal limits and draw rules.
//!
//! Squares are numbered `rank * 8 + file` with a1 = 0 and h8 = 63, so
//! "north" is towards rank 8 (White's forward direction).

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of files (and ranks) on the board.
pub const N: u8 = 8;

/// Total number of squares.
pub const NUM_SQUARES: usize = (N as usize) * (N as usize);

/// Standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// =============================================================================
// Portal Registry Limits
// =============================================================================

/// Smallest allowed maximum number of live portal pairs.
pub const MIN_PORTAL_PAIRS: usize = 2;

/// Largest allowed maximum number of live portal pairs.
pub const MAX_PORTAL_PAIRS: usize = 4;

/// Maximum number of live portal pairs when a game does not say otherwise.
pub const DEFAULT_PORTAL_PAIRS: usize = 3;

// =============================================================================
// Draw Rules
// =============================================================================

/// Half-moves without a capture or pawn move after which the game is drawn.
pub const FIFTY_MOVE_PLIES: u32 = 100;

/// Number of occurrences of the same position that draws the game.
pub const REPETITION_COUNT: usize = 3;

// =============================================================================
// Playouts
// =============================================================================

/// Hard cap on the length of a random playout, in plies.
pub const MAX_GAME_PLIES: usize = 300;

/// Probability that a playout tries a portal placement instead of a piece move.
pub const PROB_PLACE_PORTAL: f64 = 0.15;

// =============================================================================
// Movement Offsets (file delta, rank delta)
// =============================================================================

pub const ROOK_DIRS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

pub const QUEEN_DIRS: [(i8, i8); 8] = [
    (0, 1),
    (1, 0),
    (0, -1),
    (-1, 0),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// The 8 king steps; same set as the queen's unit directions.
pub const KING_OFFSETS: [(i8, i8); 8] = QUEEN_DIRS;
