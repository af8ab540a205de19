//! Error types returned by the engine.
//!
//! Every rejection is recoverable: the caller keeps its previous snapshot.

use crate::board::Square;

/// Rejected portal placement.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// A piece stands on one of the chosen squares
    #[error("square {0} is occupied by a piece")]
    OccupiedSquare(Square),

    /// One of the chosen squares already hosts a portal endpoint
    #[error("square {0} already hosts a portal endpoint")]
    DuplicatePortalEndpoint(Square),

    /// Both endpoints are the same square
    #[error("a portal cannot link {0} to itself")]
    SelfLoop(Square),

    /// Capacity outside the allowed range, or more live pairs than the capacity
    #[error("portal capacity invariant violated: {0}")]
    CapacityInvariantViolation(String),

    /// The placing color is not the side to move
    #[error("it is not {0}'s turn")]
    NotYourTurn(crate::board::Color),

    /// Placement is not allowed while the placer is in check
    #[error("cannot place a portal while in check")]
    KingInCheck,

    /// The new layout would leave the placer's king attacked
    #[error("placement would leave the king attacked")]
    ExposesKing,

    /// The game has already ended
    #[error("the game is over")]
    GameOver,
}

/// Rejected piece move.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("no piece on {0}")]
    NoPieceAtSource(Square),

    #[error("the piece on {0} does not belong to the side to move")]
    WrongSideToMove(Square),

    #[error("{from} cannot move to {to}")]
    IllegalDestination { from: Square, to: Square },

    #[error("moving {from} to {to} would leave the king attacked")]
    WouldLeaveKingAttacked { from: Square, to: Square },

    #[error("the game is over")]
    GameOver,

    /// A placement action was submitted and rejected
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

/// Rejected import of a position, registry or snapshot.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("malformed import: {0}")]
    MalformedImport(String),
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::MalformedImport(err.to_string())
    }
}
