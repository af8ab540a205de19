//! Portal-aware move generation.
//!
//! Wraps [`crate::movegen`] with the portal rules:
//!
//! 1. a portal square always interrupts a slide (and the middle square of a
//!    pawn double push): moves passing *through* one are dropped;
//! 2. landing on a portal square is refused when the far end holds a piece
//!    of the mover's color, and a pawn may not advance straight onto a
//!    portal whose far end holds an enemy;
//! 3. rooks, bishops, queens and pawns that land on an empty portal square
//!    may continue from the far end, keeping their direction of travel
//!    (one square forward for pawns). Each portal is used at most once per
//!    chain, which bounds the recursion by the number of live portals. A
//!    pawn never exits onto its own back rank.
//!
//! All occupancy questions are asked of a virtual board with the moving
//! piece lifted off its origin, so a piece never blocks itself. Continuations
//! are probed on cloned positions; the caller's position is never mutated.

use log::trace;

use crate::board::{Color, Piece, PieceKind, Square};
use crate::movegen::{self, GenMode, push_pawn_move};
use crate::moves::{PieceMove, Special};
use crate::portal::PortalRegistry;
use crate::position::Position;

/// Pseudo-legal moves of the piece on `from`, portals included.
pub fn moves_for(pos: &Position, reg: &PortalRegistry, from: Square) -> Vec<PieceMove> {
    extended_moves(pos, reg, from, GenMode::All)
}

/// Portal-aware pseudo-legal moves in the given generation mode.
pub fn extended_moves(pos: &Position, reg: &PortalRegistry, from: Square, mode: GenMode) -> Vec<PieceMove> {
    let Some(piece) = pos.piece_at(from) else {
        return Vec::new();
    };

    let ctx = Traversal {
        pos,
        lifted: pos.without_piece(from),
        reg,
        piece,
        origin: from,
    };

    let mut out = Vec::new();
    let mut entries: Vec<(Square, (i8, i8))> = Vec::new();

    for m in movegen::generate(pos, from, mode) {
        if ctx.intercepted(&m) || !ctx.landing_allowed(&m) {
            continue;
        }
        if ctx.can_enter(&m) && !entries.iter().any(|(sq, _)| *sq == m.to) {
            if let Some(dir) = ctx.approach(from, m.to) {
                entries.push((m.to, dir));
            }
        }
        out.push(m);
    }

    for (entry, dir) in entries {
        ctx.traverse(entry, dir, &[], &[], &mut out);
    }

    dedup(out, from)
}

/// Keep the first move per (destination, promotion) and drop null moves.
fn dedup(moves: Vec<PieceMove>, origin: Square) -> Vec<PieceMove> {
    let mut out: Vec<PieceMove> = Vec::with_capacity(moves.len());
    for m in moves {
        if m.to == origin {
            continue;
        }
        if out.iter().any(|o| o.to == m.to && o.promotion == m.promotion) {
            continue;
        }
        out.push(m);
    }
    out
}

struct Traversal<'a> {
    pos: &'a Position,
    /// `pos` with the moving piece removed
    lifted: Position,
    reg: &'a PortalRegistry,
    piece: Piece,
    origin: Square,
}

impl Traversal<'_> {
    #[inline]
    fn color(&self) -> Color {
        self.piece.color
    }

    /// Step 1: the path strictly between origin and destination crosses a portal.
    fn intercepted(&self, m: &PieceMove) -> bool {
        let checks_path = self.piece.kind.is_slider() || m.special == Special::DoublePush;
        checks_path && m.from.between(m.to).into_iter().any(|sq| self.reg.is_portal(sq))
    }

    /// Step 2: landing rules for portal squares.
    fn landing_allowed(&self, m: &PieceMove) -> bool {
        let Some(far) = self.reg.linked_to(m.to) else {
            return true;
        };
        match self.lifted.board().color_at(far) {
            Some(c) if c == self.color() => false,
            Some(_) => !(self.piece.kind == PieceKind::Pawn && is_straight(m)),
            None => true,
        }
    }

    /// The move lands on an empty portal square with a piece that may use it.
    fn can_enter(&self, m: &PieceMove) -> bool {
        self.piece.kind.uses_portals()
            && !m.is_capture()
            && m.special != Special::EnPassant
            && self.reg.is_portal(m.to)
    }

    /// Direction of travel a continuation must keep.
    fn approach(&self, from: Square, entry: Square) -> Option<(i8, i8)> {
        if self.piece.kind == PieceKind::Pawn {
            Some((0, self.color().forward()))
        } else {
            from.direction_to(entry)
        }
    }

    /// Step 3: follow the portal at `entry`, emitting the exit landing and
    /// every direction-consistent continuation past it.
    fn traverse(
        &self,
        entry: Square,
        dir: (i8, i8),
        via: &[Square],
        visited: &[u32],
        out: &mut Vec<PieceMove>,
    ) {
        let Some(link) = self.reg.link(entry) else {
            return;
        };
        if visited.contains(&link.id) {
            return;
        }
        let exit = link.exit;
        if self.piece.kind == PieceKind::Pawn && exit.rank() == self.color().back_rank() {
            return;
        }

        let mut chain = via.to_vec();
        chain.push(entry);
        let mut seen = visited.to_vec();
        seen.push(link.id);

        trace!(
            "{:?} from {} enters portal #{} at {} -> {}",
            self.piece.kind, self.origin, link.id, entry, exit
        );

        match self.lifted.piece_at(exit) {
            Some(target) if target.color == self.color() => {}
            Some(target) => {
                // A pawn travels straight through a portal and never captures that way.
                if self.piece.kind.is_slider() {
                    let mut m = self.chained(exit, &chain);
                    m.capture = Some(target.kind);
                    out.push(m);
                }
            }
            None => {
                self.push_landing(self.chained(exit, &chain), out);
                self.continue_from(exit, dir, &chain, &seen, out);
            }
        }
    }

    /// Probe moves from `exit` on a clone with the piece relocated there.
    fn continue_from(
        &self,
        exit: Square,
        dir: (i8, i8),
        chain: &[Square],
        seen: &[u32],
        out: &mut Vec<PieceMove>,
    ) {
        let probe = self.pos.with_piece_moved(self.origin, exit);
        for cm in movegen::generate(&probe, exit, GenMode::Attacks) {
            if !self.consistent(exit, dir, &cm) {
                continue;
            }
            if self.intercepted(&cm) || !self.landing_allowed(&cm) {
                continue;
            }
            let enters = self.can_enter(&cm);
            let to = cm.to;

            let mut m = self.chained(to, chain);
            m.capture = cm.capture;
            m.promotion = cm.promotion;
            out.push(m);

            // A pawn stepping onto a portal on its last rank passes through
            // unpromoted, once; it promotes only if it comes to rest there.
            if enters && cm.promotion.is_none_or(|p| p == PieceKind::Queen) {
                self.traverse(to, dir, chain, seen, out);
            }
        }
    }

    /// Direction consistency for a continuation generated at `exit`.
    fn consistent(&self, exit: Square, dir: (i8, i8), cm: &PieceMove) -> bool {
        if self.piece.kind == PieceKind::Pawn {
            cm.special == Special::None && !cm.is_capture() && exit.offset(dir.0, dir.1) == Some(cm.to)
        } else {
            exit.direction_to(cm.to) == Some(dir)
        }
    }

    fn chained(&self, to: Square, chain: &[Square]) -> PieceMove {
        let mut m = PieceMove::new(self.origin, to, self.piece.kind);
        m.via = chain.to_vec();
        m
    }

    fn push_landing(&self, m: PieceMove, out: &mut Vec<PieceMove>) {
        if self.piece.kind == PieceKind::Pawn {
            push_pawn_move(m, self.color(), out);
        } else {
            out.push(m);
        }
    }
}

#[inline]
fn is_straight(m: &PieceMove) -> bool {
    m.from.file() == m.to.file()
}
