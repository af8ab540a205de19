//! A game session: current snapshot, configuration and repetition history.

use log::info;
use serde::{Deserialize, Serialize};

use crate::board::{Color, Square};
use crate::constants::{DEFAULT_PORTAL_PAIRS, REPETITION_COUNT, START_FEN};
use crate::error::{MoveError, PlacementError, StateError};
use crate::moves::{ActionRequest, Move, PieceMove};
use crate::portal::PortalRegistry;
use crate::position::Position;
use crate::rules::{self, DrawReason, GameOutcome};

/// Settings fixed for the lifetime of a game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Maximum number of live portal pairs
    pub portal_pairs: usize,
    pub start_fen: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            portal_pairs: DEFAULT_PORTAL_PAIRS,
            start_fen: START_FEN.to_string(),
        }
    }
}

impl GameConfig {
    pub fn with_portal_pairs(portal_pairs: usize) -> Self {
        Self {
            portal_pairs,
            ..Self::default()
        }
    }
}

/// Board, side, rights and portal layout; what "the same position" means
/// for repetition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RepetitionKey {
    placement: String,
    layout: Vec<(Square, Square)>,
}

impl RepetitionKey {
    pub fn new(pos: &Position, reg: &PortalRegistry) -> Self {
        // First four FEN fields: board, side, castling, en passant.
        let fen = pos.to_fen();
        let placement = fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ");
        Self {
            placement,
            layout: reg.layout(),
        }
    }
}

/// A position plus its registry, as exchanged with hosts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub fen: String,
    pub portals: PortalRegistry,
}

impl Snapshot {
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => unreachable!("snapshot always serializes: {e}"),
        }
    }

    pub fn from_json(s: &str) -> Result<Self, StateError> {
        let snapshot: Snapshot = serde_json::from_str(s)?;
        Position::from_fen(&snapshot.fen)?;
        Ok(snapshot)
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    portals: PortalRegistry,
    config: GameConfig,
    /// One key per snapshot reached, the current one last
    history: Vec<RepetitionKey>,
}

impl Default for Game {
    fn default() -> Self {
        match Self::new(GameConfig::default()) {
            Ok(game) => game,
            Err(e) => unreachable!("default config is valid: {e}"),
        }
    }
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self, StateError> {
        let position = Position::from_fen(&config.start_fen)?;
        let portals = PortalRegistry::new(config.portal_pairs)
            .map_err(|e| StateError::MalformedImport(e.to_string()))?;
        info!(
            "new game: {} portal pairs, {}",
            config.portal_pairs,
            position.to_fen()
        );
        Ok(Self::start(position, portals, config))
    }

    /// Resume from an imported snapshot. History starts afresh.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, StateError> {
        let position = Position::from_fen(&snapshot.fen)?;
        let config = GameConfig {
            portal_pairs: snapshot.portals.capacity(),
            start_fen: snapshot.fen.clone(),
        };
        info!("loaded snapshot with {} live portals", snapshot.portals.len());
        Ok(Self::start(position, snapshot.portals.clone(), config))
    }

    fn start(position: Position, portals: PortalRegistry, config: GameConfig) -> Self {
        let history = vec![RepetitionKey::new(&position, &portals)];
        Self {
            position,
            portals,
            config,
            history,
        }
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn portals(&self) -> &PortalRegistry {
        &self.portals
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    /// Number of plies (moves and placements) played in this session.
    pub fn ply(&self) -> usize {
        self.history.len() - 1
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fen: self.position.to_fen(),
            portals: self.portals.clone(),
        }
    }

    /// Legal moves of the piece on `sq`.
    pub fn moves_for(&self, sq: Square) -> Vec<PieceMove> {
        rules::legal_moves_for(&self.position, &self.portals, sq)
    }

    pub fn legal_moves(&self) -> Vec<PieceMove> {
        rules::legal_moves(&self.position, &self.portals)
    }

    pub fn is_in_check(&self) -> bool {
        rules::is_in_check(&self.position, &self.portals, self.side_to_move())
    }

    /// Commit a move or placement for the side to move.
    pub fn apply(&mut self, mv: &Move) -> Result<(), MoveError> {
        if self.is_repetition() {
            return Err(MoveError::GameOver);
        }
        let (position, portals) = rules::apply(&self.position, &self.portals, mv)?;
        self.commit(position, portals);
        Ok(())
    }

    /// Resolve a parsed request and commit it; returns the move played.
    pub fn play(&mut self, request: &ActionRequest) -> Result<Move, MoveError> {
        let mv = rules::lookup(&self.position, &self.portals, request)?;
        self.apply(&mv)?;
        Ok(mv)
    }

    pub fn place_portal(&mut self, a: Square, b: Square, owner: Color) -> Result<(), PlacementError> {
        if self.is_repetition() {
            return Err(PlacementError::GameOver);
        }
        let (position, portals) = rules::place_portal(&self.position, &self.portals, a, b, owner)?;
        self.commit(position, portals);
        Ok(())
    }

    fn commit(&mut self, position: Position, portals: PortalRegistry) {
        self.history.push(RepetitionKey::new(&position, &portals));
        self.position = position;
        self.portals = portals;
    }

    /// How often the current key has occurred, this time included.
    pub fn repetitions(&self) -> usize {
        match self.history.last() {
            Some(current) => self.history.iter().filter(|k| *k == current).count(),
            None => 0,
        }
    }

    fn is_repetition(&self) -> bool {
        self.repetitions() >= REPETITION_COUNT
    }

    pub fn outcome(&self) -> GameOutcome {
        let outcome = rules::outcome(&self.position, &self.portals);
        if !outcome.over && self.is_repetition() {
            return GameOutcome::draw(DrawReason::Repetition);
        }
        outcome
    }
}
