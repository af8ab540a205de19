//! Move values and their text notation.
//!
//! Notation:
//! - standard moves in coordinate form: `e2e4`, promotions `e7e8q`
//! - portal moves list the entry squares in brackets: `a1h5[a4]`, `a1c8[a4,h6]`
//! - placements: `portal:a4-h4`

use std::fmt;
use std::str::FromStr;

use crate::board::{PieceKind, Square};
use crate::error::StateError;

/// Special handling needed when a move is committed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Special {
    #[default]
    None,
    /// Pawn two-square advance; sets the en-passant target
    DoublePush,
    /// Pawn capture onto the en-passant target
    EnPassant,
    CastleKingSide,
    CastleQueenSide,
}

/// A relocation of one piece, optionally through portals.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PieceMove {
    pub from: Square,
    pub to: Square,
    /// Kind of the moving piece
    pub piece: PieceKind,
    /// Portal entry squares in the order they were used; empty for a standard move
    pub via: Vec<Square>,
    /// Kind of the captured piece, if any
    pub capture: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub special: Special,
}

impl PieceMove {
    pub fn new(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            via: Vec::new(),
            capture: None,
            promotion: None,
            special: Special::None,
        }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        self.capture.is_some()
    }

    #[inline]
    pub fn is_portal_move(&self) -> bool {
        !self.via.is_empty()
    }

    #[inline]
    pub fn is_castle(&self) -> bool {
        matches!(self.special, Special::CastleKingSide | Special::CastleQueenSide)
    }

    /// True if `request` names this move. A request without a via-chain
    /// matches on origin, destination and promotion alone.
    pub fn matches(&self, request: &MoveRequest) -> bool {
        self.from == request.from
            && self.to == request.to
            && self.promotion == request.promotion
            && (request.via.is_empty() || request.via == self.via)
    }
}

impl fmt::Display for PieceMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{}", p.to_char())?;
        }
        if !self.via.is_empty() {
            let via: Vec<String> = self.via.iter().map(|s| s.to_string()).collect();
            write!(f, "[{}]", via.join(","))?;
        }
        Ok(())
    }
}

/// Anything a player can do on their turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Piece(PieceMove),
    /// Place a linked portal pair for the side to move
    PlacePortal { a: Square, b: Square },
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Piece(m) => write!(f, "{m}"),
            Move::PlacePortal { a, b } => write!(f, "portal:{a}-{b}"),
        }
    }
}

impl From<PieceMove> for Move {
    fn from(m: PieceMove) -> Self {
        Move::Piece(m)
    }
}

/// A parsed piece-move request, resolved against the legal moves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub via: Vec<Square>,
}

impl FromStr for MoveRequest {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || StateError::MalformedImport(format!("bad move '{s}'"));

        let (head, via) = match s.find('[') {
            Some(open) => {
                let inner = s[open..]
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(bad)?;
                let via = inner
                    .split(',')
                    .map(str::parse)
                    .collect::<Result<Vec<Square>, _>>()?;
                (&s[..open], via)
            }
            None => (s, Vec::new()),
        };

        if !head.is_ascii() || (head.len() != 4 && head.len() != 5) {
            return Err(bad());
        }
        let from: Square = head[0..2].parse()?;
        let to: Square = head[2..4].parse()?;
        let promotion = match head.chars().nth(4) {
            Some(c) => match PieceKind::from_char(c) {
                Some(k) if PieceKind::PROMOTIONS.contains(&k) => Some(k),
                _ => return Err(bad()),
            },
            None => None,
        };

        Ok(MoveRequest {
            from,
            to,
            promotion,
            via,
        })
    }
}

/// Parse either a piece-move request or a `portal:a4-h4` placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionRequest {
    Piece(MoveRequest),
    PlacePortal { a: Square, b: Square },
}

impl FromStr for ActionRequest {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(rest) = s.strip_prefix("portal:") {
            let (a, b) = rest
                .split_once('-')
                .ok_or_else(|| StateError::MalformedImport(format!("bad placement '{s}'")))?;
            return Ok(ActionRequest::PlacePortal {
                a: a.parse()?,
                b: b.parse()?,
            });
        }
        Ok(ActionRequest::Piece(s.parse()?))
    }
}
