//! Core world-object types shared by the snapshot, ledger, and state machine.
//!
//! These are plain data rows as the engine adapter reports them each tick.
//! Ids are engine-assigned and shared across agents, bases, and nodes; a
//! wreck keeps the id of the object that died.

use serde::{Deserialize, Serialize};

use super::geometry::Point;

/// Engine-assigned id for any world object (agent, base, or resource node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Team affiliation from the controlling team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    Own,
    Enemy,
}

/// Weapon stats as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponSpec {
    /// Maximum firing range
    pub range: f32,
    /// Ticks between shots
    pub cooldown_ticks: u32,
}

/// Arena dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaSpec {
    pub width: f32,
    pub height: f32,
}

/// One mobile unit as seen this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub id: ObjectId,
    pub team: TeamSide,
    pub pos: Point,
    /// Heading in degrees, 0..360
    pub heading_deg: f32,
    pub health: f32,
    pub max_health: f32,
    pub cargo: u32,
    pub cargo_capacity: u32,
    pub alive: bool,
    /// `None` for unarmed harvest-only hulls
    pub weapon: Option<WeaponSpec>,
}

impl AgentView {
    /// Armed units re-evaluate their guards every tick
    #[inline]
    pub fn is_combat_capable(&self) -> bool {
        self.weapon.is_some()
    }

    /// Health as a 0..1 fraction (0 when max_health is degenerate)
    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            0.0
        } else {
            (self.health / self.max_health).clamp(0.0, 1.0)
        }
    }

    /// Cargo space still available
    #[inline]
    pub fn cargo_room(&self) -> u32 {
        self.cargo_capacity.saturating_sub(self.cargo)
    }
}

/// One base as seen this tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseView {
    pub id: ObjectId,
    pub team: TeamSide,
    pub pos: Point,
    pub health: f32,
    pub cargo: u32,
    pub alive: bool,
    /// Agents inside this radius of the base recover health
    pub healing_radius: f32,
}

/// Whether a node spawned on the field or is the remains of a dead object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Field,
    Wreck,
}

/// One drainable resource node as seen this tick.
///
/// A node with payload 0 is terminal; the snapshot filters it out of every
/// target query but keeps the row for id lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: ObjectId,
    pub pos: Point,
    pub payload: u32,
    pub kind: NodeKind,
}
