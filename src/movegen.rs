//! Standard (portal-unaware) pseudo-legal move generation.
//!
//! Every function here is a pure function of a [`Position`] and a square.
//! King safety is not considered; that is the job of [`crate::rules`].

use crate::board::{Color, Piece, PieceKind, Square};
use crate::constants::{BISHOP_DIRS, KING_OFFSETS, KNIGHT_OFFSETS, QUEEN_DIRS, ROOK_DIRS};
use crate::moves::{PieceMove, Special};
use crate::position::Position;

/// Whether castling candidates are produced.
///
/// Attack detection must not generate castling: deciding whether castling
/// is allowed itself needs attack detection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GenMode {
    /// Every pseudo-legal move, castling included
    All,
    /// Moves that can capture or block; castling omitted
    Attacks,
}

/// Pseudo-legal moves of the piece on `from`, ignoring portals.
pub fn standard_moves(pos: &Position, from: Square) -> Vec<PieceMove> {
    generate(pos, from, GenMode::All)
}

/// Pseudo-legal moves of the piece on `from` in the given mode.
pub fn generate(pos: &Position, from: Square, mode: GenMode) -> Vec<PieceMove> {
    let Some(piece) = pos.piece_at(from) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    match piece.kind {
        PieceKind::Pawn => pawn_moves(pos, from, piece.color, &mut out),
        PieceKind::Knight => step_moves(pos, from, piece, &KNIGHT_OFFSETS, &mut out),
        PieceKind::King => {
            step_moves(pos, from, piece, &KING_OFFSETS, &mut out);
            if mode == GenMode::All {
                castle_moves(pos, from, piece.color, &mut out);
            }
        }
        PieceKind::Rook => slide_moves(pos, from, piece, &ROOK_DIRS, &mut out),
        PieceKind::Bishop => slide_moves(pos, from, piece, &BISHOP_DIRS, &mut out),
        PieceKind::Queen => slide_moves(pos, from, piece, &QUEEN_DIRS, &mut out),
    }
    out
}

/// Ray-cast in each direction until the board edge or a piece.
/// Own pieces block; an enemy piece is captured and then blocks.
fn slide_moves(pos: &Position, from: Square, piece: Piece, dirs: &[(i8, i8)], out: &mut Vec<PieceMove>) {
    for &(df, dr) in dirs {
        let mut cur = from.offset(df, dr);
        while let Some(to) = cur {
            match pos.piece_at(to) {
                None => out.push(PieceMove::new(from, to, piece.kind)),
                Some(target) => {
                    if target.color != piece.color {
                        let mut m = PieceMove::new(from, to, piece.kind);
                        m.capture = Some(target.kind);
                        out.push(m);
                    }
                    break;
                }
            }
            cur = to.offset(df, dr);
        }
    }
}

/// Fixed offsets, filtered by own-piece occupancy.
fn step_moves(pos: &Position, from: Square, piece: Piece, offsets: &[(i8, i8)], out: &mut Vec<PieceMove>) {
    for &(df, dr) in offsets {
        let Some(to) = from.offset(df, dr) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(target) if target.color == piece.color => {}
            target => {
                let mut m = PieceMove::new(from, to, piece.kind);
                m.capture = target.map(|t| t.kind);
                out.push(m);
            }
        }
    }
}

fn pawn_moves(pos: &Position, from: Square, color: Color, out: &mut Vec<PieceMove>) {
    let fwd = color.forward();

    // Straight advances
    if let Some(one) = from.offset(0, fwd) {
        if pos.board().is_empty(one) {
            push_pawn_move(PieceMove::new(from, one, PieceKind::Pawn), color, out);

            if from.rank() == color.pawn_rank() {
                if let Some(two) = one.offset(0, fwd) {
                    if pos.board().is_empty(two) {
                        let mut m = PieceMove::new(from, two, PieceKind::Pawn);
                        m.special = Special::DoublePush;
                        out.push(m);
                    }
                }
            }
        }
    }

    // Diagonal captures, including en passant
    for df in [-1, 1] {
        let Some(to) = from.offset(df, fwd) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(target) if target.color != color => {
                let mut m = PieceMove::new(from, to, PieceKind::Pawn);
                m.capture = Some(target.kind);
                push_pawn_move(m, color, out);
            }
            None if pos.en_passant() == Some(to) => {
                let mut m = PieceMove::new(from, to, PieceKind::Pawn);
                m.capture = Some(PieceKind::Pawn);
                m.special = Special::EnPassant;
                out.push(m);
            }
            _ => {}
        }
    }
}

/// Push a pawn move, expanding it into the four promotions on the last rank.
pub(crate) fn push_pawn_move(m: PieceMove, color: Color, out: &mut Vec<PieceMove>) {
    if m.to.rank() == color.promotion_rank() {
        for kind in PieceKind::PROMOTIONS {
            let mut p = m.clone();
            p.promotion = Some(kind);
            out.push(p);
        }
    } else {
        out.push(m);
    }
}

/// Castling candidates: right still held, king and rook at home, squares
/// between them empty. Attack conditions are checked by the evaluator.
fn castle_moves(pos: &Position, from: Square, color: Color, out: &mut Vec<PieceMove>) {
    let back = color.back_rank();
    if Some(from) != Square::from_file_rank(4, back) {
        return;
    }
    let rights = pos.castling();
    let own_rook = |file: u8| {
        Square::from_file_rank(file, back)
            .and_then(|sq| pos.piece_at(sq))
            .is_some_and(|p| p.kind == PieceKind::Rook && p.color == color)
    };
    let empty = |files: &[u8]| {
        files.iter().all(|&f| {
            Square::from_file_rank(f, back).is_some_and(|sq| pos.board().is_empty(sq))
        })
    };

    if rights.king_side(color) && own_rook(7) && empty(&[5, 6]) {
        if let Some(to) = Square::from_file_rank(6, back) {
            let mut m = PieceMove::new(from, to, PieceKind::King);
            m.special = Special::CastleKingSide;
            out.push(m);
        }
    }
    if rights.queen_side(color) && own_rook(0) && empty(&[1, 2, 3]) {
        if let Some(to) = Square::from_file_rank(2, back) {
            let mut m = PieceMove::new(from, to, PieceKind::King);
            m.special = Special::CastleQueenSide;
            out.push(m);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn dests(pos: &Position, from: &str) -> Vec<String> {
        let mut v: Vec<String> = standard_moves(pos, sq(from))
            .iter()
            .map(|m| m.to_string())
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_start_position_counts() {
        let pos = Position::new();
        let total: usize = pos
            .board()
            .pieces()
            .filter(|(_, p)| p.color == Color::White)
            .map(|(s, _)| standard_moves(&pos, s).len())
            .sum();
        assert_eq!(total, 20);
    }

    #[test]
    fn test_rook_blocked_by_own_and_captures_enemy() {
        let pos = Position::from_fen("4k3/8/8/8/r7/8/P7/R3K3 w - - 0 1").unwrap();
        // a2 own pawn blocks the file; the rank is open until the king on e1.
        assert_eq!(dests(&pos, "a1"), ["a1b1", "a1c1", "a1d1"]);

        let pos = Position::from_fen("4k3/8/8/8/r7/8/8/R3K3 w - - 0 1").unwrap();
        let d = dests(&pos, "a1");
        assert!(d.contains(&"a1a4".to_string()));
        assert!(!d.contains(&"a1a5".to_string()));
        let capture = standard_moves(&pos, sq("a1"))
            .into_iter()
            .find(|m| m.to == sq("a4"))
            .unwrap();
        assert_eq!(capture.capture, Some(PieceKind::Rook));
    }

    #[test]
    fn test_knight_in_corner() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/2P5/N3K3 w - - 0 1").unwrap();
        assert_eq!(dests(&pos, "a1"), ["a1b3"]);
    }

    #[test]
    fn test_pawn_double_push_needs_both_squares() {
        let pos = Position::from_fen("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1").unwrap();
        assert!(dests(&pos, "e2").is_empty());

        let pos = Position::from_fen("4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(dests(&pos, "e2"), ["e2e3"]);

        let pos = Position::from_fen("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let moves = standard_moves(&pos, sq("e2"));
        let double = moves.iter().find(|m| m.to == sq("e4")).unwrap();
        assert_eq!(double.special, Special::DoublePush);
    }

    #[test]
    fn test_pawn_captures_and_en_passant() {
        let pos =
            Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let moves = standard_moves(&pos, sq("e5"));
        let ep = moves.iter().find(|m| m.to == sq("d6")).unwrap();
        assert_eq!(ep.special, Special::EnPassant);
        assert_eq!(ep.capture, Some(PieceKind::Pawn));
        assert_eq!(dests(&pos, "e5"), ["e5d6", "e5e6"]);
    }

    #[test]
    fn test_black_pawn_direction_and_promotion() {
        let pos = Position::from_fen("4k3/8/8/8/8/8/p7/1N2K3 b - - 0 1").unwrap();
        let d = dests(&pos, "a2");
        assert_eq!(d, ["a2a1b", "a2a1n", "a2a1q", "a2a1r", "a2b1b", "a2b1n", "a2b1q", "a2b1r"]);
    }

    #[test]
    fn test_castling_candidates() {
        let pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let moves = standard_moves(&pos, sq("e1"));
        assert!(moves.iter().any(|m| m.special == Special::CastleKingSide && m.to == sq("g1")));
        assert!(moves.iter().any(|m| m.special == Special::CastleQueenSide && m.to == sq("c1")));
        assert!(generate(&pos, sq("e1"), GenMode::Attacks)
            .iter()
            .all(|m| !m.is_castle()));

        let blocked = Position::from_fen("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1").unwrap();
        assert!(standard_moves(&blocked, sq("e1")).iter().all(|m| !m.is_castle()));
    }

    #[test]
    fn test_empty_square_has_no_moves() {
        let pos = Position::new();
        assert!(standard_moves(&pos, sq("e4")).is_empty());
    }
}
