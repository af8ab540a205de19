//! Random playouts (game simulation).
//!
//! A playout plays uniformly random legal actions from a game until it ends
//! or hits the ply limit. Now and then the side to move places a random
//! portal pair instead of moving a piece. Used for smoke runs from the CLI
//! and for property tests of the legality invariant.

use log::{debug, trace};

use crate::board::Square;
use crate::constants::{MAX_GAME_PLIES, PROB_PLACE_PORTAL};
use crate::game::Game;
use crate::moves::Move;
use crate::rules::GameOutcome;

/// Result of one playout.
#[derive(Clone, Debug)]
pub struct PlayoutResult {
    pub outcome: GameOutcome,
    /// Every action played, in order
    pub moves: Vec<Move>,
    pub portal_moves: usize,
    pub placements: usize,
}

/// Play random actions until the game ends or `max_plies` is reached.
pub fn playout(game: &mut Game, rng: &mut fastrand::Rng, max_plies: usize) -> PlayoutResult {
    let mut moves = Vec::new();
    let mut portal_moves = 0;
    let mut placements = 0;

    while moves.len() < max_plies {
        if game.outcome().over {
            break;
        }
        let Some(mv) = choose_random_move(game, rng) else {
            break;
        };
        trace!("ply {}: {mv}", game.ply());
        if let Err(e) = game.apply(&mv) {
            // Generated actions are legal; anything else is an engine bug.
            debug!("playout aborted on {mv}: {e}");
            break;
        }
        match &mv {
            Move::Piece(m) if m.is_portal_move() => portal_moves += 1,
            Move::PlacePortal { .. } => placements += 1,
            Move::Piece(_) => {}
        }
        moves.push(mv);
    }

    PlayoutResult {
        outcome: game.outcome(),
        moves,
        portal_moves,
        placements,
    }
}

/// Playout from a fresh default game with the default ply limit.
pub fn random_game(seed: u64) -> PlayoutResult {
    let mut rng = fastrand::Rng::with_seed(seed);
    playout(&mut Game::default(), &mut rng, MAX_GAME_PLIES)
}

/// Pick a random legal action, trying a placement first with small probability.
fn choose_random_move(game: &Game, rng: &mut fastrand::Rng) -> Option<Move> {
    if rng.f64() < PROB_PLACE_PORTAL {
        if let Some(mv) = random_placement(game, rng) {
            return Some(mv);
        }
    }
    let moves = game.legal_moves();
    if moves.is_empty() {
        return None;
    }
    Some(Move::Piece(moves[rng.usize(..moves.len())].clone()))
}

/// A placement the rules accept, from a few random tries.
fn random_placement(game: &Game, rng: &mut fastrand::Rng) -> Option<Move> {
    let free: Vec<Square> = Square::all()
        .filter(|&sq| game.position().board().is_empty(sq) && !game.portals().is_portal(sq))
        .collect();
    if free.len() < 2 {
        return None;
    }
    for _ in 0..8 {
        let a = free[rng.usize(..free.len())];
        let b = free[rng.usize(..free.len())];
        if a == b {
            continue;
        }
        let mut trial = game.clone();
        if trial.place_portal(a, b, game.side_to_move()).is_ok() {
            return Some(Move::PlacePortal { a, b });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playout_terminates() {
        let result = random_game(7);
        assert!(result.moves.len() <= MAX_GAME_PLIES);
        if result.moves.len() < MAX_GAME_PLIES {
            assert!(result.outcome.over);
        }
    }

    #[test]
    fn test_playout_is_deterministic_for_a_seed() {
        let a = random_game(42);
        let b = random_game(42);
        assert_eq!(a.moves, b.moves);
        assert_eq!(a.outcome, b.outcome);
    }

    #[test]
    fn test_playout_respects_ply_limit() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut game = Game::default();
        let result = playout(&mut game, &mut rng, 10);
        assert_eq!(result.moves.len(), 10);
        assert_eq!(game.ply(), 10);
    }
}
