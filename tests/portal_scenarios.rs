//! Portal rule scenarios.
//!
//! Each test sets up a position (and usually a registry imported as JSON, so
//! that pieces may stand on portal squares) and checks the exact set of legal
//! moves the engine offers.

use portal_chess::board::{Color, PieceKind, Square};
use portal_chess::game::{Game, GameConfig, Snapshot};
use portal_chess::moves::PieceMove;
use portal_chess::playout::playout;
use portal_chess::portal::PortalRegistry;
use portal_chess::rules;

// =============================================================================
// Helper functions
// =============================================================================

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

/// Build a game from a FEN and a list of `(a, b)` portal pairs, owner White.
fn game_with(fen: &str, pairs: &[(&str, &str)]) -> Game {
    let portals: Vec<String> = pairs
        .iter()
        .enumerate()
        .map(|(i, (a, b))| {
            format!(
                r#"{{"squareA":"{a}","squareB":"{b}","owner":"white","id":{}}}"#,
                i + 1
            )
        })
        .collect();
    let json = format!(r#"{{"capacity":4,"portals":[{}]}}"#, portals.join(","));
    let snapshot = Snapshot {
        fen: fen.to_string(),
        portals: PortalRegistry::from_json(&json).unwrap(),
    };
    Game::from_snapshot(&snapshot).unwrap()
}

/// Sorted text form of the legal moves from `from`.
fn moves_from(game: &Game, from: &str) -> Vec<String> {
    let mut v: Vec<String> = game.moves_for(sq(from)).iter().map(|m| m.to_string()).collect();
    v.sort();
    v
}

fn find<'a>(moves: &'a [PieceMove], to: &str) -> Option<&'a PieceMove> {
    moves.iter().find(|m| m.to == sq(to))
}

// =============================================================================
// Rook through a4 <-> h4
// =============================================================================

#[test]
fn test_rook_continues_north_after_exit() {
    let game = game_with("3k4/8/8/8/8/8/8/R2K4 w - - 0 1", &[("a4", "h4")]);
    assert_eq!(
        moves_from(&game, "a1"),
        [
            "a1a2", "a1a3", "a1a4", "a1b1", "a1c1", "a1h4[a4]", "a1h5[a4]", "a1h6[a4]",
            "a1h7[a4]", "a1h8[a4]"
        ]
    );
}

#[test]
fn test_rook_captures_on_chained_square_and_stops() {
    let game = game_with("3k4/8/7p/8/8/8/8/R2K4 w - - 0 1", &[("a4", "h4")]);
    let moves = game.moves_for(sq("a1"));

    let capture = find(&moves, "h6").unwrap();
    assert_eq!(capture.capture, Some(PieceKind::Pawn));
    assert_eq!(capture.via, vec![sq("a4")]);
    assert!(find(&moves, "h7").is_none());
    assert!(find(&moves, "h8").is_none());
    assert_eq!(find(&moves, "h5").unwrap().via, vec![sq("a4")]);
}

#[test]
fn test_enemy_on_adjacent_exit() {
    // a4 <-> a5 with a black knight standing on a5.
    let game = game_with("3k4/8/8/n7/8/8/8/R2K4 w - - 0 1", &[("a4", "a5")]);
    assert_eq!(
        moves_from(&game, "a1"),
        ["a1a2", "a1a3", "a1a4", "a1a5[a4]", "a1b1", "a1c1"]
    );
    let moves = game.moves_for(sq("a1"));
    assert_eq!(find(&moves, "a5").unwrap().capture, Some(PieceKind::Knight));
}

#[test]
fn test_occupied_entry_is_a_plain_capture() {
    let game = game_with("3k4/8/8/8/n7/8/8/R2K4 w - - 0 1", &[("a4", "h4")]);
    let moves = game.moves_for(sq("a1"));
    let capture = find(&moves, "a4").unwrap();
    assert!(capture.via.is_empty());
    assert_eq!(capture.capture, Some(PieceKind::Knight));
    assert!(moves.iter().all(|m| m.via.is_empty()));
}

// =============================================================================
// Per-piece traversal rules
// =============================================================================

#[test]
fn test_queen_keeps_diagonal_through_portal() {
    let game = game_with("7k/8/8/8/8/8/8/Q3K3 w - - 0 1", &[("c3", "e2")]);
    let moves = game.moves_for(sq("a1"));
    // a1 -> b2 -> c3 (portal) -> e2 -> f3 -> g4 -> h5
    for to in ["e2", "f3", "g4", "h5"] {
        assert_eq!(find(&moves, to).unwrap().via, vec![sq("c3")], "{to}");
    }
    assert!(find(&moves, "d4").is_none(), "diagonal is cut at c3");
    assert!(find(&moves, "d1").unwrap().via.is_empty());
}

#[test]
fn test_black_pawn_steps_south_after_exit() {
    let game = game_with("4k3/3p4/8/8/8/8/8/4K3 b - - 0 1", &[("d6", "g4")]);
    assert_eq!(moves_from(&game, "d7"), ["d7d6", "d7g3[d6]", "d7g4[d6]"]);
}

#[test]
fn test_pawn_never_exits_on_its_own_back_rank() {
    let mut white = game_with("4k3/8/8/8/8/8/4P3/K7 w - - 0 1", &[("e3", "c1")]);
    assert_eq!(moves_from(&white, "e2"), ["e2e3"]);
    assert!(white.play(&"e2c1".parse().unwrap()).is_err());

    let black = game_with("4k3/3p4/8/8/8/8/8/4K3 b - - 0 1", &[("d6", "f8")]);
    assert_eq!(moves_from(&black, "d7"), ["d7d6"]);

    // Standing on the entry is still fine, and the game stays importable.
    white.play(&"e2e3".parse().unwrap()).unwrap();
    let restored = Game::from_snapshot(&white.snapshot()).unwrap();
    assert_eq!(restored.position(), white.position());
}

#[test]
fn test_pawn_passes_last_rank_portal_unpromoted() {
    // e3 -> d7, then d8 is itself a portal to h5.
    let game = game_with("k7/8/8/8/8/8/4P3/K7 w - - 0 1", &[("e3", "d7"), ("d8", "h5")]);
    assert_eq!(
        moves_from(&game, "e2"),
        [
            "e2d7[e3]", "e2d8b[e3]", "e2d8n[e3]", "e2d8q[e3]", "e2d8r[e3]", "e2e3",
            "e2h5[e3,d8]", "e2h6[e3,d8]"
        ]
    );
    let moves = game.moves_for(sq("e2"));
    let through = find(&moves, "h6").unwrap();
    assert_eq!(through.promotion, None);
    assert_eq!(through.piece, PieceKind::Pawn);
}

#[test]
fn test_knight_and_king_only_land() {
    let game = game_with("4k3/8/8/8/8/8/8/1N2K3 w - - 0 1", &[("c3", "h6"), ("d2", "a6")]);
    for from in ["b1", "e1"] {
        let moves = game.moves_for(sq(from));
        assert!(moves.iter().all(|m| m.via.is_empty()), "{from}");
    }
    assert!(find(&game.moves_for(sq("b1")), "c3").is_some());
    assert!(find(&game.moves_for(sq("e1")), "d2").is_some());
}

#[test]
fn test_chain_uses_each_portal_once() {
    let game = game_with(
        "4k3/8/8/8/8/8/8/R3K3 w - - 0 1",
        &[("a2", "a5"), ("a6", "a3"), ("a4", "h4")],
    );
    for m in game.moves_for(sq("a1")) {
        let mut seen = m.via.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), m.via.len(), "{m}");
        assert!(m.via.len() <= game.portals().len());
    }
}

// =============================================================================
// Check through portals
// =============================================================================

#[test]
fn test_check_through_portal_and_its_block() {
    let game = game_with("8/8/7k/1r6/8/8/8/R3K3 b - - 0 1", &[("a4", "h4")]);
    assert!(game.is_in_check());

    // Only interposing on h5 saves the king with the rook.
    assert_eq!(moves_from(&game, "b5"), ["b5h5"]);

    let king = moves_from(&game, "h6");
    assert!(!king.contains(&"h6h7".to_string()));
    assert!(!king.contains(&"h6h5".to_string()));
    assert!(king.contains(&"h6g6".to_string()));
}

#[test]
fn test_placement_cannot_open_a_line_to_own_king() {
    let mut game = game_with("6k1/8/8/8/r7/8/8/4K3 w - - 0 1", &[]);
    let before = game.snapshot();
    assert!(game.place_portal(sq("a3"), sq("e2"), Color::White).is_err());
    assert_eq!(game.snapshot(), before);
    game.place_portal(sq("a3"), sq("c2"), Color::White).unwrap();
}

// =============================================================================
// Registry through the game API
// =============================================================================

#[test]
fn test_eviction_through_game() {
    let mut game = Game::new(GameConfig {
        portal_pairs: 2,
        start_fen: "4k3/8/8/8/8/8/8/R3K3 w - - 0 1".to_string(),
    })
    .unwrap();
    game.place_portal(sq("a3"), sq("h3"), Color::White).unwrap();
    game.place_portal(sq("b6"), sq("g6"), Color::Black).unwrap();
    game.place_portal(sq("c4"), sq("f4"), Color::White).unwrap();

    let ids: Vec<u32> = game.portals().portals().iter().map(|p| p.id).collect();
    assert_eq!(ids, [2, 3]);
    assert!(!game.portals().is_portal(sq("a3")));
    assert!(!game.portals().is_portal(sq("h3")));
    assert_eq!(game.portals().linked_to(sq("f4")), Some(sq("c4")));
}

// =============================================================================
// Properties over random games
// =============================================================================

#[test]
fn test_random_games_keep_portal_invariants() {
    for seed in 0..4 {
        let mut rng = fastrand::Rng::with_seed(seed);
        let mut game = Game::default();
        let result = playout(&mut game, &mut rng, 80);

        let mut replay = Game::default();
        for mv in &result.moves {
            let pos = replay.position().clone();
            let reg = replay.portals().clone();
            let mover = pos.side_to_move();

            for m in rules::legal_moves(&pos, &reg) {
                let piece = pos.piece_at(m.from).unwrap();
                if matches!(piece.kind, PieceKind::Knight | PieceKind::King) {
                    assert!(m.via.is_empty(), "seed {seed}: {m}");
                }
                let mut seen = m.via.clone();
                seen.sort();
                seen.dedup();
                assert_eq!(seen.len(), m.via.len(), "seed {seed}: {m}");
                assert_ne!(m.from, m.to);
            }

            replay.apply(mv).unwrap();
            let reloaded = Game::from_snapshot(&replay.snapshot()).unwrap();
            assert_eq!(reloaded.position(), replay.position(), "seed {seed}: {mv}");
            assert!(
                !rules::is_in_check(replay.position(), replay.portals(), mover),
                "seed {seed}: {mv} left the king attacked"
            );

            let reg = replay.portals();
            assert!(reg.len() <= reg.capacity());
            let ids: Vec<u32> = reg.portals().iter().map(|p| p.id).collect();
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            let mut endpoints: Vec<Square> = reg.portals().iter().flat_map(|p| [p.a, p.b]).collect();
            let n = endpoints.len();
            endpoints.sort();
            endpoints.dedup();
            assert_eq!(endpoints.len(), n);
        }
        assert_eq!(replay.position(), game.position());
        assert_eq!(replay.portals(), game.portals());
    }
}
