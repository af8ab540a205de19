//! Legality, the commit path and game outcomes.
//!
//! Every function takes an immutable `(Position, PortalRegistry)` snapshot.
//! Moves are tried on clones; a rejected request never changes the caller's
//! snapshot.

use std::fmt;

use log::debug;

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::constants::FIFTY_MOVE_PLIES;
use crate::error::{MoveError, PlacementError};
use crate::movegen::GenMode;
use crate::moves::{ActionRequest, Move, MoveRequest, PieceMove, Special};
use crate::portal::PortalRegistry;
use crate::portal_moves::{extended_moves, moves_for};
use crate::position::Position;

// =============================================================================
// Attacks and check
// =============================================================================

/// True if any piece of color `by` has a portal-aware move onto `sq`.
pub fn is_attacked(pos: &Position, reg: &PortalRegistry, sq: Square, by: Color) -> bool {
    pos.board()
        .pieces()
        .filter(|(_, p)| p.color == by)
        .any(|(from, _)| {
            extended_moves(pos, reg, from, GenMode::Attacks)
                .iter()
                .any(|m| m.to == sq)
        })
}

/// True if the king of `color` is attacked.
pub fn is_in_check(pos: &Position, reg: &PortalRegistry, color: Color) -> bool {
    match pos.king_square(color) {
        Some(king) => is_attacked(pos, reg, king, color.opponent()),
        None => false,
    }
}

// =============================================================================
// Legal moves
// =============================================================================

/// Legal moves of the piece on `from`, whichever side owns it.
pub fn legal_moves_for(pos: &Position, reg: &PortalRegistry, from: Square) -> Vec<PieceMove> {
    moves_for(pos, reg, from)
        .into_iter()
        .filter(|m| is_legal(pos, reg, m))
        .collect()
}

/// All legal piece moves for the side to move.
pub fn legal_moves(pos: &Position, reg: &PortalRegistry) -> Vec<PieceMove> {
    let side = pos.side_to_move();
    let mut out = Vec::new();
    for (from, _) in pos.board().pieces().filter(|(_, p)| p.color == side) {
        out.extend(legal_moves_for(pos, reg, from));
    }
    out
}

/// Short-circuiting form of `!legal_moves(..).is_empty()`.
pub fn has_legal_move(pos: &Position, reg: &PortalRegistry) -> bool {
    let side = pos.side_to_move();
    pos.board()
        .pieces()
        .filter(|(_, p)| p.color == side)
        .any(|(from, _)| moves_for(pos, reg, from).iter().any(|m| is_legal(pos, reg, m)))
}

/// A pseudo-legal move is legal if it does not leave the mover's king
/// attacked. Castling additionally needs the king out of check and the
/// square it crosses unattacked.
fn is_legal(pos: &Position, reg: &PortalRegistry, m: &PieceMove) -> bool {
    let Some(piece) = pos.piece_at(m.from) else {
        return false;
    };

    if m.is_castle() {
        if is_in_check(pos, reg, piece.color) {
            return false;
        }
        let step = if m.special == Special::CastleKingSide { 1 } else { -1 };
        let Some(transit) = m.from.offset(step, 0) else {
            return false;
        };
        if is_in_check(&pos.with_piece_moved(m.from, transit), reg, piece.color) {
            return false;
        }
    }

    !is_in_check(&commit(pos, m), reg, piece.color)
}

// =============================================================================
// Commit path
// =============================================================================

/// Play a generated move on a copy of `pos`. No legality checks.
fn commit(pos: &Position, m: &PieceMove) -> Position {
    let mut next = pos.clone();
    let Some(moving) = next.board.take(m.from) else {
        return next;
    };
    let color = moving.color;

    match m.special {
        Special::EnPassant => {
            if let Some(victim) = Square::from_file_rank(m.to.file(), m.from.rank()) {
                next.board.take(victim);
            }
        }
        Special::CastleKingSide => move_rook(&mut next.board, color, 7, 5),
        Special::CastleQueenSide => move_rook(&mut next.board, color, 0, 3),
        Special::None | Special::DoublePush => {}
    }

    let placed = match m.promotion {
        Some(kind) => Piece::new(kind, color),
        None => moving,
    };
    next.board.set(m.to, Some(placed));

    if moving.kind == PieceKind::King {
        next.castling.clear(color);
    }
    next.castling.touch(m.from);
    next.castling.touch(m.to);

    // Only a standard double push leaves an en-passant target.
    next.en_passant = match m.special {
        Special::DoublePush if !m.is_portal_move() => m.from.offset(0, color.forward()),
        _ => None,
    };

    if moving.kind == PieceKind::Pawn || m.is_capture() {
        next.halfmove_clock = 0;
    } else {
        next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    }

    next.pass_turn();
    next
}

fn move_rook(board: &mut Board, color: Color, from_file: u8, to_file: u8) {
    let back = color.back_rank();
    if let (Some(from), Some(to)) = (
        Square::from_file_rank(from_file, back),
        Square::from_file_rank(to_file, back),
    ) {
        let rook = board.take(from);
        board.set(to, rook);
    }
}

/// Turn a parsed request into the engine's own move value.
///
/// A piece request is matched against the generated moves of its origin: a
/// via-chain, when given, must match exactly; without one the first
/// generated move to that destination and promotion is taken. Legality is
/// left to [`apply`].
pub fn lookup(pos: &Position, reg: &PortalRegistry, request: &ActionRequest) -> Result<Move, MoveError> {
    match request {
        ActionRequest::PlacePortal { a, b } => Ok(Move::PlacePortal { a: *a, b: *b }),
        ActionRequest::Piece(r) => find_move(pos, reg, r).map(Move::Piece),
    }
}

fn find_move(pos: &Position, reg: &PortalRegistry, request: &MoveRequest) -> Result<PieceMove, MoveError> {
    let from = request.from;
    let piece = pos.piece_at(from).ok_or(MoveError::NoPieceAtSource(from))?;
    if piece.color != pos.side_to_move() {
        return Err(MoveError::WrongSideToMove(from));
    }
    moves_for(pos, reg, from)
        .into_iter()
        .find(|m| m.matches(request))
        .ok_or(MoveError::IllegalDestination { from, to: request.to })
}

/// Validate and commit one action for the side to move.
pub fn apply(pos: &Position, reg: &PortalRegistry, mv: &Move) -> Result<(Position, PortalRegistry), MoveError> {
    let m = match mv {
        Move::PlacePortal { a, b } => return Ok(place_portal(pos, reg, *a, *b, pos.side_to_move())?),
        Move::Piece(m) => m,
    };
    if outcome(pos, reg).over {
        return Err(MoveError::GameOver);
    }

    // Re-derive the move so capture and special flags come from the generator.
    let request = MoveRequest {
        from: m.from,
        to: m.to,
        promotion: m.promotion,
        via: m.via.clone(),
    };
    let m = find_move(pos, reg, &request).inspect_err(|e| debug!("rejected {request:?}: {e}"))?;
    if !is_legal(pos, reg, &m) {
        debug!("rejected {m}: king would be attacked");
        return Err(MoveError::WouldLeaveKingAttacked { from: m.from, to: m.to });
    }

    let next = commit(pos, &m);
    debug!("{} played {m}", pos.side_to_move());
    Ok((next, reg.clone()))
}

/// Place a portal pair as a turn-consuming action.
pub fn place_portal(
    pos: &Position,
    reg: &PortalRegistry,
    a: Square,
    b: Square,
    owner: Color,
) -> Result<(Position, PortalRegistry), PlacementError> {
    if outcome(pos, reg).over {
        return Err(PlacementError::GameOver);
    }
    if owner != pos.side_to_move() {
        return Err(PlacementError::NotYourTurn(owner));
    }
    if is_in_check(pos, reg, owner) {
        return Err(PlacementError::KingInCheck);
    }

    let next_reg = reg.place(pos.board(), a, b, owner)?;
    if is_in_check(pos, &next_reg, owner) {
        debug!("rejected portal {a}-{b}: opens a line to the {owner} king");
        return Err(PlacementError::ExposesKing);
    }

    let mut next = pos.clone();
    next.en_passant = None;
    next.halfmove_clock = next.halfmove_clock.saturating_add(1);
    next.pass_turn();
    debug!("{owner} placed portal {a}-{b}");
    Ok((next, next_reg))
}

// =============================================================================
// Outcome
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DrawReason {
    InsufficientMaterial,
    FiftyMoveRule,
    Repetition,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Reason {
    Checkmate,
    Stalemate,
    Draw(DrawReason),
}

/// Whether the game has ended, and how.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GameOutcome {
    pub over: bool,
    pub winner: Option<Color>,
    pub reason: Option<Reason>,
}

impl GameOutcome {
    pub const ONGOING: GameOutcome = GameOutcome {
        over: false,
        winner: None,
        reason: None,
    };

    pub fn checkmate(winner: Color) -> Self {
        Self {
            over: true,
            winner: Some(winner),
            reason: Some(Reason::Checkmate),
        }
    }

    pub fn stalemate() -> Self {
        Self {
            over: true,
            winner: None,
            reason: Some(Reason::Stalemate),
        }
    }

    pub fn draw(reason: DrawReason) -> Self {
        Self {
            over: true,
            winner: None,
            reason: Some(Reason::Draw(reason)),
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.reason, self.winner) {
            (Some(Reason::Checkmate), Some(w)) => write!(f, "checkmate {w}"),
            (Some(Reason::Stalemate), _) => write!(f, "stalemate"),
            (Some(Reason::Draw(DrawReason::InsufficientMaterial)), _) => write!(f, "draw insufficient-material"),
            (Some(Reason::Draw(DrawReason::FiftyMoveRule)), _) => write!(f, "draw fifty-move"),
            (Some(Reason::Draw(DrawReason::Repetition)), _) => write!(f, "draw repetition"),
            _ => write!(f, "ongoing"),
        }
    }
}

/// Derive the outcome of a snapshot. Repetition needs history and is
/// decided by [`crate::game::Game`].
pub fn outcome(pos: &Position, reg: &PortalRegistry) -> GameOutcome {
    let side = pos.side_to_move();
    if !has_legal_move(pos, reg) {
        return if is_in_check(pos, reg, side) {
            GameOutcome::checkmate(side.opponent())
        } else {
            GameOutcome::stalemate()
        };
    }
    if insufficient_material(pos.board()) {
        return GameOutcome::draw(DrawReason::InsufficientMaterial);
    }
    if pos.halfmove_clock() >= FIFTY_MOVE_PLIES {
        return GameOutcome::draw(DrawReason::FiftyMoveRule);
    }
    GameOutcome::ONGOING
}

/// K v K, K+minor v K, and K+B v K+B with both bishops on one square color.
pub fn insufficient_material(board: &Board) -> bool {
    let others: Vec<(Square, Piece)> = board
        .pieces()
        .filter(|(_, p)| p.kind != PieceKind::King)
        .collect();

    match others.as_slice() {
        [] => true,
        [(_, p)] => matches!(p.kind, PieceKind::Knight | PieceKind::Bishop),
        [(s1, p1), (s2, p2)] => {
            p1.kind == PieceKind::Bishop
                && p2.kind == PieceKind::Bishop
                && p1.color != p2.color
                && s1.is_dark() == s2.is_dark()
        }
        _ => false,
    }
}
