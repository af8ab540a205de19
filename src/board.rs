//! Squares, colors, pieces and the 8x8 grid that holds them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{N, NUM_SQUARES};
use crate::error::StateError;

// =============================================================================
// Color
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank delta of a pawn step.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank (0-based) pawns start on.
    #[inline]
    pub fn pawn_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => N - 2,
        }
    }

    /// Rank (0-based) pawns promote on.
    #[inline]
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => N - 1,
            Color::Black => 0,
        }
    }

    /// Rank (0-based) the king and rooks start on.
    #[inline]
    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => N - 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

impl FromStr for Color {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "w" | "white" => Ok(Color::White),
            "b" | "black" => Ok(Color::Black),
            _ => Err(StateError::MalformedImport(format!("unknown color '{s}'"))),
        }
    }
}

// =============================================================================
// Pieces
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Kinds a pawn may promote to.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Lowercase letter used in FEN and move text.
    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Rook, bishop and queen move along rays.
    #[inline]
    pub fn is_slider(self) -> bool {
        matches!(self, PieceKind::Rook | PieceKind::Bishop | PieceKind::Queen)
    }

    /// Knights and kings never pass through portals.
    #[inline]
    pub fn uses_portals(self) -> bool {
        self.is_slider() || self == PieceKind::Pawn
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// FEN letter: uppercase for White, lowercase for Black.
    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }
}

// =============================================================================
// Square
// =============================================================================

/// A board square, `rank * 8 + file`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square(u8);

impl Square {
    pub fn new(index: u8) -> Option<Square> {
        ((index as usize) < NUM_SQUARES).then_some(Square(index))
    }

    pub fn from_file_rank(file: u8, rank: u8) -> Option<Square> {
        (file < N && rank < N).then(|| Square(rank * N + file))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn file(self) -> u8 {
        self.0 % N
    }

    #[inline]
    pub fn rank(self) -> u8 {
        self.0 / N
    }

    /// The square `df` files and `dr` ranks away, if it is on the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..N as i8).contains(&file) && (0..N as i8).contains(&rank) {
            Square::from_file_rank(file as u8, rank as u8)
        } else {
            None
        }
    }

    /// Unit step from `self` towards `to` when both lie on a common rank,
    /// file or diagonal.
    pub fn direction_to(self, to: Square) -> Option<(i8, i8)> {
        let df = to.file() as i8 - self.file() as i8;
        let dr = to.rank() as i8 - self.rank() as i8;
        if (df, dr) == (0, 0) {
            return None;
        }
        if df == 0 || dr == 0 || df.abs() == dr.abs() {
            Some((df.signum(), dr.signum()))
        } else {
            None
        }
    }

    /// Squares strictly between `self` and `to` along a shared line.
    pub fn between(self, to: Square) -> Vec<Square> {
        let mut out = Vec::new();
        let Some((df, dr)) = self.direction_to(to) else {
            return out;
        };
        let mut cur = self.offset(df, dr);
        while let Some(sq) = cur {
            if sq == to {
                break;
            }
            out.push(sq);
            cur = sq.offset(df, dr);
        }
        out
    }

    /// True for dark squares (a1 is dark).
    #[inline]
    pub fn is_dark(self) -> bool {
        (self.file() + self.rank()) % 2 == 0
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..NUM_SQUARES as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(StateError::MalformedImport(format!("bad square '{s}'")));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::from_file_rank(file, rank)
            .ok_or_else(|| StateError::MalformedImport(format!("bad square '{s}'")))
    }
}

impl TryFrom<String> for Square {
    type Error = StateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> String {
        sq.to_string()
    }
}

// =============================================================================
// Board
// =============================================================================

/// The 8x8 grid of optional pieces.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [Option<Piece>; NUM_SQUARES],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [None; NUM_SQUARES],
        }
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()]
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.cells[sq.index()].is_none()
    }

    /// Color of the piece on `sq`, if any.
    #[inline]
    pub fn color_at(&self, sq: Square) -> Option<Color> {
        self.get(sq).map(|p| p.color)
    }

    pub(crate) fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.cells[sq.index()] = piece;
    }

    pub(crate) fn take(&mut self, sq: Square) -> Option<Piece> {
        self.cells[sq.index()].take()
    }

    /// All occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.get(sq).map(|p| (sq, p)))
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(sq, _)| sq)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..N).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..N {
                let ch = Square::from_file_rank(file, rank)
                    .and_then(|sq| self.get(sq))
                    .map(Piece::to_char)
                    .unwrap_or('.');
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_text_roundtrip() {
        for sq in Square::all() {
            let parsed: Square = sq.to_string().parse().unwrap();
            assert_eq!(sq, parsed);
        }
        assert_eq!("a1".parse::<Square>().unwrap().index(), 0);
        assert_eq!("h8".parse::<Square>().unwrap().index(), 63);
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn test_offset_stays_on_board() {
        let h4: Square = "h4".parse().unwrap();
        assert_eq!(h4.offset(1, 0), None);
        assert_eq!(h4.offset(0, 1), "h5".parse().ok());
        let a1: Square = "a1".parse().unwrap();
        assert_eq!(a1.offset(-1, -1), None);
    }

    #[test]
    fn test_direction_and_between() {
        let a1: Square = "a1".parse().unwrap();
        let a4: Square = "a4".parse().unwrap();
        let d4: Square = "d4".parse().unwrap();
        assert_eq!(a1.direction_to(a4), Some((0, 1)));
        assert_eq!(a1.direction_to(d4), Some((1, 1)));
        assert_eq!(a4.direction_to(d4), Some((1, 0)));
        assert_eq!(a1.direction_to("b3".parse().unwrap()), None);
        let between: Vec<String> = a1.between(a4).iter().map(|s| s.to_string()).collect();
        assert_eq!(between, ["a2", "a3"]);
    }

    #[test]
    fn test_piece_chars() {
        assert_eq!(Piece::from_char('Q'), Some(Piece::new(PieceKind::Queen, Color::White)));
        assert_eq!(Piece::from_char('n'), Some(Piece::new(PieceKind::Knight, Color::Black)));
        assert_eq!(Piece::from_char('x'), None);
        assert_eq!(Piece::new(PieceKind::King, Color::White).to_char(), 'K');
    }

    #[test]
    fn test_square_color() {
        assert!("a1".parse::<Square>().unwrap().is_dark());
        assert!(!"h1".parse::<Square>().unwrap().is_dark());
        assert!("h8".parse::<Square>().unwrap().is_dark());
    }
}
