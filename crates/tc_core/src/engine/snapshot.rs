//! Per-tick read-only world view.
//!
//! Rebuilt from the engine's raw lists on every callback and immutable within
//! the tick. Nothing here is cached across ticks: unit death, movement, and
//! payload drain invalidate the previous view continuously.
//!
//! Dead agents and dead bases that still carry cargo are folded into the node
//! list as wrecks at build time, so harvest-target queries see one uniform
//! list of drainable objects.

use serde::{Deserialize, Serialize};

use super::geometry::{self, Point};
use super::types::{AgentView, ArenaSpec, BaseView, NodeKind, NodeView, ObjectId, TeamSide};

/// Read-only view of the arena for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    arena: ArenaSpec,
    agents: Vec<AgentView>,
    bases: Vec<BaseView>,
    nodes: Vec<NodeView>,
}

impl WorldSnapshot {
    /// Build the snapshot from the engine's raw per-tick lists.
    ///
    /// `field_nodes` are the engine-reported resource nodes; wrecks are
    /// derived here from dead cargo-bearing agents and bases.
    pub fn build(
        arena: ArenaSpec,
        agents: Vec<AgentView>,
        bases: Vec<BaseView>,
        field_nodes: Vec<NodeView>,
    ) -> Self {
        let mut nodes = field_nodes;
        for a in &agents {
            if !a.alive && a.cargo > 0 {
                nodes.push(NodeView { id: a.id, pos: a.pos, payload: a.cargo, kind: NodeKind::Wreck });
            }
        }
        for b in &bases {
            if !b.alive && b.cargo > 0 {
                nodes.push(NodeView { id: b.id, pos: b.pos, payload: b.cargo, kind: NodeKind::Wreck });
            }
        }
        Self { arena, agents, bases, nodes }
    }

    #[inline]
    pub fn arena(&self) -> ArenaSpec {
        self.arena
    }

    /// Living own-team agents
    pub fn own_agents(&self) -> impl Iterator<Item = &AgentView> {
        self.agents.iter().filter(|a| a.team == TeamSide::Own && a.alive)
    }

    /// Living enemy agents
    pub fn enemy_agents(&self) -> impl Iterator<Item = &AgentView> {
        self.agents.iter().filter(|a| a.team == TeamSide::Enemy && a.alive)
    }

    /// Living enemy bases
    pub fn enemy_bases(&self) -> impl Iterator<Item = &BaseView> {
        self.bases.iter().filter(|b| b.team == TeamSide::Enemy && b.alive)
    }

    /// The own team's base row, if it still stands
    pub fn own_base(&self) -> Option<&BaseView> {
        self.bases.iter().find(|b| b.team == TeamSide::Own && b.alive)
    }

    /// Drainable nodes: field nodes plus wrecks, payload > 0 only
    pub fn resource_nodes(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.iter().filter(|n| n.payload > 0)
    }

    /// Raw agent row lookup (dead rows included)
    pub fn agent(&self, id: ObjectId) -> Option<&AgentView> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Raw base row lookup (dead rows included)
    pub fn base(&self, id: ObjectId) -> Option<&BaseView> {
        self.bases.iter().find(|b| b.id == id)
    }

    /// Node row lookup (drained rows included)
    pub fn node(&self, id: ObjectId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Remaining payload of a drainable target, 0 if absent or drained
    pub fn payload_of(&self, id: ObjectId) -> u32 {
        self.node(id).map(|n| n.payload).unwrap_or(0)
    }

    /// Position of any known world object
    pub fn position_of(&self, id: ObjectId) -> Option<Point> {
        self.agent(id)
            .map(|a| a.pos)
            .or_else(|| self.base(id).map(|b| b.pos))
            .or_else(|| self.node(id).map(|n| n.pos))
    }

    /// Drainable nodes ordered by distance from `from`, id breaking ties
    pub fn nodes_by_distance(&self, from: Point) -> Vec<&NodeView> {
        let mut nodes: Vec<&NodeView> = self.resource_nodes().collect();
        nodes.sort_by(|a, b| {
            geometry::distance_squared(from, a.pos)
                .total_cmp(&geometry::distance_squared(from, b.pos))
                .then(a.id.cmp(&b.id))
        });
        nodes
    }

    /// Living enemy agents ordered by distance from `from`, id breaking ties
    pub fn enemies_by_distance(&self, from: Point) -> Vec<&AgentView> {
        let mut enemies: Vec<&AgentView> = self.enemy_agents().collect();
        enemies.sort_by(|a, b| {
            geometry::distance_squared(from, a.pos)
                .total_cmp(&geometry::distance_squared(from, b.pos))
                .then(a.id.cmp(&b.id))
        });
        enemies
    }

    /// Count living agents on one side
    pub fn count_alive(&self, team: TeamSide) -> usize {
        self.agents.iter().filter(|a| a.team == team && a.alive).count()
    }

    /// True if any living agent hostile to `base` is within `range` of it
    pub fn is_enemy_in_base_range(&self, base: &BaseView, range: f32) -> bool {
        self.agents.iter().any(|a| {
            a.alive && a.team != base.team && geometry::distance(a.pos, base.pos) <= range
        })
    }
}
