//! Chess position representation and FEN import/export.
//!
//! A [`Position`] is pure data: the board, the side to move, castling
//! rights, the en-passant target and the move counters. Nothing outside the
//! crate can mutate one directly; new positions are produced by the commit
//! path in [`crate::rules`].

use std::fmt;

use crate::board::{Board, Color, Piece, PieceKind, Square};
use crate::constants::{N, START_FEN};
use crate::error::StateError;

/// Which castling moves are still available.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_king_side: true,
        white_queen_side: true,
        black_king_side: true,
        black_queen_side: true,
    };

    pub fn king_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_king_side,
            Color::Black => self.black_king_side,
        }
    }

    pub fn queen_side(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queen_side,
            Color::Black => self.black_queen_side,
        }
    }

    pub(crate) fn clear(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_king_side = false;
                self.white_queen_side = false;
            }
            Color::Black => {
                self.black_king_side = false;
                self.black_queen_side = false;
            }
        }
    }

    /// Drop the right tied to a rook home square once anything moves from
    /// or onto it.
    pub(crate) fn touch(&mut self, sq: Square) {
        match (sq.file(), sq.rank()) {
            (0, 0) => self.white_queen_side = false,
            (7, 0) => self.white_king_side = false,
            (0, 7) => self.black_queen_side = false,
            (7, 7) => self.black_king_side = false,
            _ => {}
        }
    }

    fn to_fen(self) -> String {
        let mut s = String::new();
        if self.white_king_side {
            s.push('K');
        }
        if self.white_queen_side {
            s.push('Q');
        }
        if self.black_king_side {
            s.push('k');
        }
        if self.black_queen_side {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }

    fn from_fen(field: &str) -> Result<Self, StateError> {
        let mut rights = CastlingRights::default();
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            match c {
                'K' => rights.white_king_side = true,
                'Q' => rights.white_queen_side = true,
                'k' => rights.black_king_side = true,
                'q' => rights.black_queen_side = true,
                _ => {
                    return Err(StateError::MalformedImport(format!(
                        "bad castling field '{field}'"
                    )));
                }
            }
        }
        Ok(rights)
    }
}

/// A chess position (board state plus the rights needed by the rules).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    pub(crate) board: Board,
    pub(crate) side_to_move: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        match Self::from_fen(START_FEN) {
            Ok(pos) => pos,
            Err(e) => unreachable!("START_FEN is valid: {e}"),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board.king_square(color)
    }

    /// A copy with the piece on `from` relocated to `to`, everything else
    /// untouched. Used to probe continuations past a portal exit without
    /// mutating the caller's position.
    pub(crate) fn with_piece_moved(&self, from: Square, to: Square) -> Position {
        let mut next = self.clone();
        let piece = next.board.take(from);
        next.board.set(to, piece);
        next
    }

    /// A copy with the piece on `sq` removed.
    pub(crate) fn without_piece(&self, sq: Square) -> Position {
        let mut next = self.clone();
        next.board.take(sq);
        next
    }

    /// Hand the turn to the other side, advancing the full-move number after Black.
    pub(crate) fn pass_turn(&mut self) {
        if self.side_to_move == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = self.side_to_move.opponent();
    }

    // =========================================================================
    // FEN
    // =========================================================================

    /// Parse a FEN string. The half-move and full-move fields are optional
    /// and default to `0` and `1`.
    pub fn from_fen(fen: &str) -> Result<Position, StateError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(StateError::MalformedImport(format!(
                "expected 4 to 6 FEN fields, got {}",
                fields.len()
            )));
        }

        let board = parse_placement(fields[0])?;
        let side_to_move: Color = fields[1].parse()?;
        let castling = CastlingRights::from_fen(fields[2])?;
        let en_passant = match fields[3] {
            "-" => None,
            s => Some(s.parse::<Square>()?),
        };
        let halfmove_clock: u32 = match fields.get(4) {
            Some(s) => s
                .parse()
                .map_err(|_| StateError::MalformedImport(format!("bad half-move clock '{s}'")))?,
            None => 0,
        };
        let fullmove_number: u32 = match fields.get(5) {
            Some(s) => s
                .parse()
                .map_err(|_| StateError::MalformedImport(format!("bad full-move number '{s}'")))?,
            None => 1,
        };

        let pos = Position {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number: fullmove_number.max(1),
        };
        pos.validate()?;
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..N).rev() {
            let mut empty = 0;
            for file in 0..N {
                let piece = Square::from_file_rank(file, rank).and_then(|sq| self.board.get(sq));
                match piece {
                    Some(p) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(p.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let ep = self
            .en_passant
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".into());

        format!(
            "{placement} {side} {} {ep} {} {}",
            self.castling.to_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Structural checks on an imported position.
    fn validate(&self) -> Result<(), StateError> {
        for color in [Color::White, Color::Black] {
            let kings = self
                .board
                .pieces()
                .filter(|(_, p)| p.kind == PieceKind::King && p.color == color)
                .count();
            if kings != 1 {
                return Err(StateError::MalformedImport(format!(
                    "expected exactly one {color} king, found {kings}"
                )));
            }
        }

        if let Some((sq, _)) = self
            .board
            .pieces()
            .find(|(sq, p)| p.kind == PieceKind::Pawn && (sq.rank() == 0 || sq.rank() == N - 1))
        {
            return Err(StateError::MalformedImport(format!("pawn on back rank at {sq}")));
        }

        if let Some(ep) = self.en_passant {
            // The target sits behind a pawn of the side that just moved.
            let expected_rank = self.side_to_move.opponent().pawn_rank() as i8
                + self.side_to_move.opponent().forward();
            if ep.rank() as i8 != expected_rank {
                return Err(StateError::MalformedImport(format!(
                    "en-passant target {ep} is on the wrong rank"
                )));
            }
        }

        // Rights must agree with the home squares.
        for color in [Color::White, Color::Black] {
            let back = color.back_rank();
            let home = |file: u8, kind: PieceKind| {
                Square::from_file_rank(file, back)
                    .and_then(|sq| self.board.get(sq))
                    .is_some_and(|p| p.kind == kind && p.color == color)
            };
            let king_home = home(4, PieceKind::King);
            if self.castling.king_side(color) && !(king_home && home(N - 1, PieceKind::Rook)) {
                return Err(StateError::MalformedImport(format!(
                    "{color} king-side castling right without king and rook at home"
                )));
            }
            if self.castling.queen_side(color) && !(king_home && home(0, PieceKind::Rook)) {
                return Err(StateError::MalformedImport(format!(
                    "{color} queen-side castling right without king and rook at home"
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board)?;
        writeln!(f, "{} to move", self.side_to_move)
    }
}

fn parse_placement(field: &str) -> Result<Board, StateError> {
    let rows: Vec<&str> = field.split('/').collect();
    if rows.len() != N as usize {
        return Err(StateError::MalformedImport(format!(
            "expected {N} ranks, got {}",
            rows.len()
        )));
    }

    let mut board = Board::empty();
    for (i, row) in rows.iter().enumerate() {
        let rank = N - 1 - i as u8;
        let mut file: u8 = 0;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
            } else {
                let piece = Piece::from_char(c).ok_or_else(|| {
                    StateError::MalformedImport(format!("unknown piece '{c}'"))
                })?;
                let sq = Square::from_file_rank(file, rank).ok_or_else(|| {
                    StateError::MalformedImport(format!("rank {} is too long", rank + 1))
                })?;
                board.set(sq, Some(piece));
                file += 1;
            }
            if file > N {
                return Err(StateError::MalformedImport(format!(
                    "rank {} is too long",
                    rank + 1
                )));
            }
        }
        if file != N {
            return Err(StateError::MalformedImport(format!(
                "rank {} has {file} files",
                rank + 1
            )));
        }
    }
    Ok(board)
}
