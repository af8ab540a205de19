//! Portal pairs and the bounded, evicting registry that holds them.
//!
//! The registry is an immutable value: [`PortalRegistry::place`] returns a
//! new registry and leaves the receiver untouched, so earlier snapshots stay
//! valid for undo, replay and speculative check tests.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Square};
use crate::constants::{DEFAULT_PORTAL_PAIRS, MAX_PORTAL_PAIRS, MIN_PORTAL_PAIRS, NUM_SQUARES};
use crate::error::{PlacementError, StateError};

/// A bidirectional link between two distinct squares.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Portal {
    #[serde(rename = "squareA")]
    pub a: Square,
    #[serde(rename = "squareB")]
    pub b: Square,
    pub owner: Color,
    pub id: u32,
}

impl Portal {
    /// The endpoint linked to `sq`, if `sq` is one of this portal's endpoints.
    pub fn other_end(&self, sq: Square) -> Option<Square> {
        if sq == self.a {
            Some(self.b)
        } else if sq == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Endpoints as an ordered pair, smaller square first.
    pub fn endpoints(&self) -> (Square, Square) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }
}

/// One side of a link, as seen from a square.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    /// The square at the other end
    pub exit: Square,
    /// Identity of the portal pair
    pub id: u32,
}

/// All live portals, keyed by square for lookup and ordered by id for eviction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistryRecord", into = "RegistryRecord")]
pub struct PortalRegistry {
    capacity: usize,
    next_id: u32,
    /// Ascending by id
    portals: Vec<Portal>,
    links: [Option<Link>; NUM_SQUARES],
}

impl Default for PortalRegistry {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_PORTAL_PAIRS,
            next_id: 1,
            portals: Vec::new(),
            links: [None; NUM_SQUARES],
        }
    }
}

impl PortalRegistry {
    /// An empty registry holding at most `capacity` pairs.
    pub fn new(capacity: usize) -> Result<Self, PlacementError> {
        check_capacity(capacity)?;
        Ok(Self {
            capacity,
            ..Self::default()
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.portals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.portals.is_empty()
    }

    /// Live portals, oldest first.
    pub fn portals(&self) -> &[Portal] {
        &self.portals
    }

    /// Identity the next placement will receive.
    #[inline]
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    #[inline]
    pub fn link(&self, sq: Square) -> Option<Link> {
        self.links[sq.index()]
    }

    #[inline]
    pub fn linked_to(&self, sq: Square) -> Option<Square> {
        self.link(sq).map(|l| l.exit)
    }

    #[inline]
    pub fn is_portal(&self, sq: Square) -> bool {
        self.links[sq.index()].is_some()
    }

    pub fn get(&self, id: u32) -> Option<&Portal> {
        self.portals.iter().find(|p| p.id == id)
    }

    /// Endpoint pairs oldest first; identities and owners left out.
    pub fn layout(&self) -> Vec<(Square, Square)> {
        self.portals.iter().map(Portal::endpoints).collect()
    }

    /// Link `a` and `b` for `owner`, evicting the oldest pair when full.
    ///
    /// Both squares must be empty of pieces and of portal endpoints; the
    /// endpoint check is made against the registry as it stands, before any
    /// eviction.
    pub fn place(
        &self,
        board: &Board,
        a: Square,
        b: Square,
        owner: Color,
    ) -> Result<PortalRegistry, PlacementError> {
        if a == b {
            return Err(PlacementError::SelfLoop(a));
        }
        for sq in [a, b] {
            if !board.is_empty(sq) {
                return Err(PlacementError::OccupiedSquare(sq));
            }
            if self.is_portal(sq) {
                return Err(PlacementError::DuplicatePortalEndpoint(sq));
            }
        }

        let mut portals = self.portals.clone();
        if portals.len() >= self.capacity {
            let evicted = portals.remove(0);
            debug!(
                "portal #{} {}-{} evicted to make room",
                evicted.id, evicted.a, evicted.b
            );
        }
        portals.push(Portal {
            a,
            b,
            owner,
            id: self.next_id,
        });

        let next_id = successor(self.next_id)?;
        Self::build(self.capacity, next_id, portals)
    }

    /// Assemble a registry, checking every structural invariant.
    fn build(capacity: usize, next_id: u32, mut portals: Vec<Portal>) -> Result<Self, PlacementError> {
        check_capacity(capacity)?;
        if portals.len() > capacity {
            return Err(PlacementError::CapacityInvariantViolation(format!(
                "{} pairs exceed capacity {capacity}",
                portals.len()
            )));
        }
        portals.sort_by_key(|p| p.id);

        let mut links = [None; NUM_SQUARES];
        let mut last_id = 0;
        for p in &portals {
            if p.a == p.b {
                return Err(PlacementError::SelfLoop(p.a));
            }
            if p.id == 0 || p.id == last_id {
                return Err(PlacementError::CapacityInvariantViolation(format!(
                    "portal identity {} is invalid or repeated",
                    p.id
                )));
            }
            last_id = p.id;
            for (sq, exit) in [(p.a, p.b), (p.b, p.a)] {
                if links[sq.index()].is_some() {
                    return Err(PlacementError::DuplicatePortalEndpoint(sq));
                }
                links[sq.index()] = Some(Link { exit, id: p.id });
            }
        }

        Ok(Self {
            capacity,
            next_id: next_id.max(successor(last_id)?),
            portals,
            links,
        })
    }

    // =========================================================================
    // Structured encoding
    // =========================================================================

    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(s) => s,
            Err(e) => unreachable!("registry always serializes: {e}"),
        }
    }

    pub fn from_json(s: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(s)?)
    }
}

/// The identity after `id`; identities are never reused, so running out is an error.
fn successor(id: u32) -> Result<u32, PlacementError> {
    id.checked_add(1).ok_or_else(|| {
        PlacementError::CapacityInvariantViolation(format!("portal identities exhausted after {id}"))
    })
}

fn check_capacity(capacity: usize) -> Result<(), PlacementError> {
    if (MIN_PORTAL_PAIRS..=MAX_PORTAL_PAIRS).contains(&capacity) {
        Ok(())
    } else {
        Err(PlacementError::CapacityInvariantViolation(format!(
            "capacity {capacity} is outside {MIN_PORTAL_PAIRS}..={MAX_PORTAL_PAIRS}"
        )))
    }
}

/// Wire form of a registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryRecord {
    pub capacity: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<u32>,
    pub portals: Vec<Portal>,
}

impl TryFrom<RegistryRecord> for PortalRegistry {
    type Error = PlacementError;

    fn try_from(rec: RegistryRecord) -> Result<Self, Self::Error> {
        PortalRegistry::build(rec.capacity, rec.next_id.unwrap_or(1), rec.portals)
    }
}

impl From<PortalRegistry> for RegistryRecord {
    fn from(reg: PortalRegistry) -> Self {
        RegistryRecord {
            capacity: reg.capacity,
            next_id: Some(reg.next_id),
            portals: reg.portals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn empty_board() -> Board {
        Board::empty()
    }

    #[test]
    fn test_place_links_both_ways() {
        let reg = PortalRegistry::new(3).unwrap();
        let reg = reg.place(&empty_board(), sq("a4"), sq("h4"), Color::White).unwrap();
        assert_eq!(reg.linked_to(sq("a4")), Some(sq("h4")));
        assert_eq!(reg.linked_to(sq("h4")), Some(sq("a4")));
        assert_eq!(reg.linked_to(sq("b4")), None);
        assert_eq!(reg.portals()[0].id, 1);
        assert_eq!(reg.portals()[0].other_end(sq("h4")), Some(sq("a4")));
        assert_eq!(reg.portals()[0].other_end(sq("b4")), None);
        assert_eq!(reg.next_id(), 2);
    }

    #[test]
    fn test_place_does_not_touch_original() {
        let reg = PortalRegistry::new(2).unwrap();
        let next = reg.place(&empty_board(), sq("a4"), sq("h4"), Color::White).unwrap();
        assert!(reg.is_empty());
        assert_eq!(next.len(), 1);
    }

    #[test]
    fn test_place_rejections() {
        let reg = PortalRegistry::new(3).unwrap();
        let board = crate::position::Position::new().board().clone();

        assert_eq!(
            reg.place(&board, sq("d4"), sq("d4"), Color::White),
            Err(PlacementError::SelfLoop(sq("d4")))
        );
        assert_eq!(
            reg.place(&board, sq("e2"), sq("d4"), Color::White),
            Err(PlacementError::OccupiedSquare(sq("e2")))
        );

        let reg = reg.place(&board, sq("d4"), sq("e5"), Color::White).unwrap();
        assert_eq!(
            reg.place(&board, sq("c3"), sq("e5"), Color::Black),
            Err(PlacementError::DuplicatePortalEndpoint(sq("e5")))
        );
    }

    #[test]
    fn test_eviction_removes_lowest_id() {
        let board = empty_board();
        let mut reg = PortalRegistry::new(2).unwrap();
        reg = reg.place(&board, sq("a3"), sq("h3"), Color::White).unwrap();
        reg = reg.place(&board, sq("a4"), sq("h4"), Color::Black).unwrap();
        reg = reg.place(&board, sq("a5"), sq("h5"), Color::White).unwrap();

        assert_eq!(reg.len(), 2);
        assert!(reg.get(1).is_none());
        assert!(!reg.is_portal(sq("a3")));
        assert!(!reg.is_portal(sq("h3")));
        assert_eq!(reg.linked_to(sq("a4")), Some(sq("h4")));
        assert_eq!(reg.linked_to(sq("h5")), Some(sq("a5")));
        let ids: Vec<u32> = reg.portals().iter().map(|p| p.id).collect();
        assert_eq!(ids, [2, 3]);
    }

    #[test]
    fn test_endpoint_of_evicted_pair_still_counts_as_taken() {
        let board = empty_board();
        let mut reg = PortalRegistry::new(2).unwrap();
        reg = reg.place(&board, sq("a3"), sq("h3"), Color::White).unwrap();
        reg = reg.place(&board, sq("a4"), sq("h4"), Color::Black).unwrap();
        assert_eq!(
            reg.place(&board, sq("a3"), sq("c6"), Color::White),
            Err(PlacementError::DuplicatePortalEndpoint(sq("a3")))
        );
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(PortalRegistry::new(1).is_err());
        assert!(PortalRegistry::new(2).is_ok());
        assert!(PortalRegistry::new(4).is_ok());
        assert!(matches!(
            PortalRegistry::new(5),
            Err(PlacementError::CapacityInvariantViolation(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let board = empty_board();
        let reg = PortalRegistry::new(3)
            .unwrap()
            .place(&board, sq("a4"), sq("h4"), Color::White)
            .unwrap()
            .place(&board, sq("c5"), sq("f2"), Color::Black)
            .unwrap();
        let json = reg.to_json();
        assert!(json.contains("\"squareA\":\"a4\""));
        assert!(json.contains("\"owner\":\"black\""));
        let back = PortalRegistry::from_json(&json).unwrap();
        assert_eq!(back, reg);
    }

    #[test]
    fn test_json_without_next_id_continues_after_highest() {
        let json = r#"{"capacity":2,"portals":[{"squareA":"a4","squareB":"h4","owner":"white","id":7}]}"#;
        let reg = PortalRegistry::from_json(json).unwrap();
        assert_eq!(reg.next_id(), 8);
    }

    #[test]
    fn test_json_rejects_broken_registries() {
        let too_many = r#"{"capacity":2,"portals":[
            {"squareA":"a3","squareB":"h3","owner":"white","id":1},
            {"squareA":"a4","squareB":"h4","owner":"white","id":2},
            {"squareA":"a5","squareB":"h5","owner":"white","id":3}]}"#;
        assert!(PortalRegistry::from_json(too_many).is_err());

        let shared = r#"{"capacity":3,"portals":[
            {"squareA":"a3","squareB":"h3","owner":"white","id":1},
            {"squareA":"a3","squareB":"h4","owner":"black","id":2}]}"#;
        assert!(PortalRegistry::from_json(shared).is_err());

        let self_loop = r#"{"capacity":3,"portals":[
            {"squareA":"a3","squareB":"a3","owner":"white","id":1}]}"#;
        assert!(PortalRegistry::from_json(self_loop).is_err());

        let bad_square = r#"{"capacity":3,"portals":[
            {"squareA":"z3","squareB":"a3","owner":"white","id":1}]}"#;
        assert!(PortalRegistry::from_json(bad_square).is_err());

        let last_id = r#"{"capacity":3,"portals":[
            {"squareA":"a3","squareB":"h3","owner":"white","id":4294967295}]}"#;
        assert!(matches!(
            PortalRegistry::from_json(last_id),
            Err(StateError::MalformedImport(_))
        ));

        assert!(PortalRegistry::from_json("not json").is_err());
    }

    #[test]
    fn test_place_refuses_when_identities_run_out() {
        let json = r#"{"capacity":3,"nextId":4294967295,"portals":[]}"#;
        let reg = PortalRegistry::from_json(json).unwrap();
        assert!(matches!(
            reg.place(&Board::empty(), sq("a3"), sq("h3"), Color::White),
            Err(PlacementError::CapacityInvariantViolation(_))
        ));
    }
}
