//! Per-agent role state machine.
//!
//! Moore-style: the state decides what the agent asks for next (the
//! [`Directive`]), the guards decide transitions. Guards run in a fixed
//! priority order whenever an agent goes idle, and every tick for
//! combat-capable agents:
//!
//! 1. low health away from home overrides everything (return to base)
//! 2. clear shot at an enemy in weapon range fires
//! 3. a still-viable claimed resource target is continued
//! 4. a locally outnumbered collector demotes to defender
//! 5. nothing left to fight or harvest parks the agent at base
//!
//! Roles are a closed enum dispatched through one `match`; adding a role
//! means adding a variant and a guard, not a subclass.

use serde::{Deserialize, Serialize};

use super::constants::combat;
use super::geometry;
use super::ledger::AllocationLedger;
use super::snapshot::WorldSnapshot;
use super::types::{AgentView, NodeKind, NodeView, ObjectId, TeamSide};

/// Team role of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Harvests any drainable node
    Collector,
    /// Harvests wrecks only (destroyed units and bases)
    Scavenger,
    /// Holds a slot on the home defense ring and fires on intruders
    Defender,
    /// Holds a slot around an undefended enemy base
    Besieger,
    /// Seeks and engages the nearest live enemy
    Warrior,
}

impl Role {
    /// Rank for claim eviction and per-tick processing order; higher wins
    pub fn priority(self) -> u8 {
        match self {
            Role::Defender => 5,
            Role::Warrior => 4,
            Role::Besieger => 3,
            Role::Scavenger => 2,
            Role::Collector => 1,
        }
    }

    /// Roles that hold resource claims
    pub fn harvests(self) -> bool {
        matches!(self, Role::Collector | Role::Scavenger)
    }
}

/// Sub-state orthogonal to the role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Substate {
    /// Executing the role's normal directive
    Working,
    /// Health guard tripped: heading home to repair
    ReturnToBase,
    /// Terminal: no enemies and no resources remain
    IdleAtBase,
}

/// Full machine state for one agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleState {
    pub role: Role,
    pub substate: Substate,
}

impl RoleState {
    pub fn spawn(role: Role) -> Self {
        Self { role, substate: Substate::Working }
    }
}

/// What the state machine wants the agent to do next.
///
/// The dispatcher turns a directive into a queue of primitive intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Fly to the node and load from it
    Harvest(ObjectId),
    /// Bring cargo home
    Deliver,
    /// Take a standoff against this enemy agent and fire
    Engage(ObjectId),
    /// Take a siege slot against this enemy base and fire
    Besiege(ObjectId),
    /// Acquire or keep a slot on the home defense ring
    Defend,
    /// Head for the home base (repair or park)
    ReturnHome,
    /// Hold position and re-query next tick
    Hold,
}

/// Spawn-time role quota: the first `collectors` spawns harvest, the rest
/// fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleQuota {
    pub collectors: usize,
}

impl Default for RoleQuota {
    fn default() -> Self {
        Self { collectors: 3 }
    }
}

impl RoleQuota {
    pub fn initial_role(&self, spawn_index: usize) -> Role {
        if spawn_index < self.collectors {
            Role::Collector
        } else {
            Role::Warrior
        }
    }
}

/// Run the guard chain for one agent and produce its next state and
/// directive. Pure with respect to the ledger: claims are only read here;
/// the dispatcher requests or releases them when acting on the directive.
pub fn evaluate(
    agent: &AgentView,
    state: RoleState,
    snapshot: &WorldSnapshot,
    ledger: &AllocationLedger,
) -> (RoleState, Directive) {
    let home = snapshot.own_base();
    let near_home = home
        .map(|b| geometry::distance(agent.pos, b.pos) <= b.healing_radius)
        .unwrap_or(false);

    // Guard 1: repair override
    if agent.health_fraction() < combat::REPAIR_THRESHOLD && !near_home {
        return (RoleState { role: state.role, substate: Substate::ReturnToBase }, Directive::ReturnHome);
    }
    if state.substate == Substate::ReturnToBase {
        if agent.health_fraction() < combat::RESUME_THRESHOLD {
            let directive = if near_home { Directive::Hold } else { Directive::ReturnHome };
            return (state, directive);
        }
        // Repaired: resume the role through the remaining guards
    }
    let state = RoleState { role: state.role, substate: Substate::Working };

    // Guard 2: fire branch
    if let Some(weapon) = agent.weapon {
        let shot = snapshot
            .enemies_by_distance(agent.pos)
            .into_iter()
            .find(|e| {
                geometry::distance(agent.pos, e.pos) <= weapon.range
                    && fire_line_clear(agent, e.pos, snapshot)
            })
            .map(|e| e.id);
        if let Some(enemy) = shot {
            return (state, Directive::Engage(enemy));
        }
    }

    // Full harvesters deliver before anything else resource-shaped
    if state.role.harvests() && agent.cargo > 0 && agent.cargo_room() == 0 {
        return (state, Directive::Deliver);
    }

    // Guard 3: continue a still-viable claim
    if state.role.harvests() && agent.cargo_room() > 0 {
        if let Some(claim) = ledger.claim_of(agent.id) {
            if snapshot.payload_of(claim.target) > 0 {
                return (state, Directive::Harvest(claim.target));
            }
        }
    }

    // Guard 4: outnumbered collectors fall back to defense
    if state.role == Role::Collector
        && snapshot.count_alive(TeamSide::Enemy) > snapshot.count_alive(TeamSide::Own)
    {
        log::debug!("[role] {:?} demoted Collector -> Defender (outnumbered)", agent.id);
        return (RoleState { role: Role::Defender, substate: Substate::Working }, Directive::Defend);
    }

    // Role defaults
    let directive = match state.role {
        Role::Collector => collector_default(agent, snapshot, ledger),
        Role::Scavenger => scavenger_default(agent, snapshot, ledger),
        Role::Defender => Some(Directive::Defend),
        Role::Besieger => besieger_default(agent, snapshot),
        Role::Warrior => warrior_default(agent, snapshot),
    };
    if let Some(directive) = directive {
        return (state, directive);
    }

    // Guard 5: world exhausted, park at base
    let exhausted = snapshot.enemy_agents().next().is_none()
        && snapshot.enemy_bases().next().is_none()
        && snapshot.resource_nodes().next().is_none();
    if exhausted {
        let directive = if near_home { Directive::Hold } else { Directive::ReturnHome };
        return (RoleState { role: state.role, substate: Substate::IdleAtBase }, directive);
    }
    (state, Directive::Hold)
}

/// True if no live teammate sits within fire-line clearance of the segment
/// from the shooter to `target_pos`. Dead teammates never block a shot.
pub fn fire_line_clear(shooter: &AgentView, target_pos: geometry::Point, snapshot: &WorldSnapshot) -> bool {
    !snapshot.own_agents().filter(|m| m.id != shooter.id).any(|m| {
        geometry::segment_circle_intersects(
            shooter.pos,
            target_pos,
            m.pos,
            super::constants::unit::FIRE_LINE_CLEARANCE,
        )
    })
}

fn collector_default(
    agent: &AgentView,
    snapshot: &WorldSnapshot,
    ledger: &AllocationLedger,
) -> Option<Directive> {
    if agent.cargo_room() > 0 {
        if let Some(node) = best_claimable(agent, snapshot, ledger, |_| true) {
            return Some(Directive::Harvest(node));
        }
    }
    if agent.cargo > 0 {
        return Some(Directive::Deliver);
    }
    None
}

fn scavenger_default(
    agent: &AgentView,
    snapshot: &WorldSnapshot,
    ledger: &AllocationLedger,
) -> Option<Directive> {
    if agent.cargo_room() > 0 {
        if let Some(node) = best_claimable(agent, snapshot, ledger, |n| n.kind == NodeKind::Wreck) {
            return Some(Directive::Harvest(node));
        }
    }
    if agent.cargo > 0 {
        return Some(Directive::Deliver);
    }
    None
}

fn besieger_default(agent: &AgentView, snapshot: &WorldSnapshot) -> Option<Directive> {
    // An enemy base with no live guard in range is siegeable
    let mut bases: Vec<_> = snapshot.enemy_bases().collect();
    bases.sort_by(|a, b| {
        geometry::distance_squared(agent.pos, a.pos)
            .total_cmp(&geometry::distance_squared(agent.pos, b.pos))
            .then(a.id.cmp(&b.id))
    });
    if let Some(base) = bases
        .iter()
        .find(|b| !snapshot.is_enemy_in_base_range(b, combat::BASE_GUARD_RANGE))
    {
        return Some(Directive::Besiege(base.id));
    }
    // Every base is guarded: fight like a warrior until one opens up
    warrior_default(agent, snapshot)
}

fn warrior_default(agent: &AgentView, snapshot: &WorldSnapshot) -> Option<Directive> {
    if let Some(enemy) = snapshot.enemies_by_distance(agent.pos).first() {
        return Some(Directive::Engage(enemy.id));
    }
    let mut bases: Vec<_> = snapshot.enemy_bases().collect();
    bases.sort_by(|a, b| {
        geometry::distance_squared(agent.pos, a.pos)
            .total_cmp(&geometry::distance_squared(agent.pos, b.pos))
            .then(a.id.cmp(&b.id))
    });
    bases.first().map(|b| Directive::Besiege(b.id))
}

/// Nearest node passing `filter` with unclaimed capacity; richer payload
/// breaks distance ties, id keeps the rest deterministic.
fn best_claimable(
    agent: &AgentView,
    snapshot: &WorldSnapshot,
    ledger: &AllocationLedger,
    filter: impl Fn(&NodeView) -> bool,
) -> Option<ObjectId> {
    let mut nodes: Vec<&NodeView> = snapshot
        .resource_nodes()
        .filter(|n| filter(n) && ledger.remaining_capacity(n.id, snapshot) > 0)
        .collect();
    nodes.sort_by(|a, b| {
        geometry::distance_squared(agent.pos, a.pos)
            .total_cmp(&geometry::distance_squared(agent.pos, b.pos))
            .then(b.payload.cmp(&a.payload))
            .then(a.id.cmp(&b.id))
    });
    nodes.first().map(|n| n.id)
}
