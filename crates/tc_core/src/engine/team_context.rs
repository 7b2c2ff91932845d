//! Per-team controller: owns the agents' machine state, the allocation
//! ledger, and the position claim table.
//!
//! Agents are rows in a vector and refer to each other, to targets, and to
//! the ledger by id only; there are no back-pointers between a team object
//! and its members. One `TeamContext` lives for the duration of a match.
//!
//! Event handling is synchronous and single-threaded. Every call sweeps the
//! claim tables before anything may request a claim, so the per-tick
//! ordering contract (sweep first, then requests in role-priority order)
//! holds no matter how the engine interleaves callbacks. Sweeps are
//! idempotent, so repeated events within one tick are safe.

use serde::{Deserialize, Serialize};

use super::action_queue::{ActionQueue, Intent, MoveTarget};
use super::constants::{combat, formation};
use super::geometry;
use super::ledger::{AllocationLedger, ClaimOutcome, ClaimPriority, PositionClaims};
use super::position_solver::{self, PositionPolicy};
use super::role_machine::{self, Directive, RoleQuota, RoleState, Substate};
use super::snapshot::WorldSnapshot;
use super::types::{AgentView, ObjectId};
use crate::error::{CoreError, Result};

/// Callback from the engine, one agent per event (`Tick` covers the team)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    Spawn { agent: ObjectId },
    Arrived { agent: ObjectId },
    LoadComplete { agent: ObjectId },
    UnloadComplete { agent: ObjectId },
    Idle { agent: ObjectId },
    Destroyed { agent: ObjectId },
    Tick,
}

/// Primitive command handed back to the engine, one outstanding per agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    MoveTo(MoveTarget),
    LoadFrom(ObjectId),
    UnloadTo(ObjectId),
    TurnTo(ObjectId),
    Fire(ObjectId),
    Hold,
}

/// Per-agent bookkeeping owned by the team
#[derive(Debug)]
struct AgentRecord {
    id: ObjectId,
    state: RoleState,
    queue: ActionQueue,
    directive: Option<Directive>,
    cooldown: u32,
}

/// Coordination state for one team
#[derive(Debug)]
pub struct TeamContext {
    quota: RoleQuota,
    agents: Vec<AgentRecord>,
    ledger: AllocationLedger,
    claims: PositionClaims,
}

impl TeamContext {
    pub fn new(quota: RoleQuota) -> Self {
        Self { quota, agents: Vec::new(), ledger: AllocationLedger::new(), claims: PositionClaims::new() }
    }

    /// Handle one engine callback against this tick's snapshot.
    ///
    /// Returns the commands to issue, in deterministic order: for team-wide
    /// events agents are processed by descending role priority, then id.
    pub fn handle_event(
        &mut self,
        event: EngineEvent,
        snapshot: &WorldSnapshot,
    ) -> Result<Vec<(ObjectId, Command)>> {
        // Claim hygiene precedes every request in the tick
        self.ledger.sweep(snapshot);
        self.claims.sweep(snapshot);

        match event {
            EngineEvent::Spawn { agent } => {
                if self.agents.iter().any(|r| r.id == agent) {
                    return Err(CoreError::DuplicateSpawn(agent));
                }
                let role = self.quota.initial_role(self.agents.len());
                log::debug!("[team] spawn {:?} as {:?}", agent, role);
                self.agents.push(AgentRecord {
                    id: agent,
                    state: RoleState::spawn(role),
                    queue: ActionQueue::new(),
                    directive: None,
                    cooldown: 0,
                });
                let idx = self.agents.len() - 1;
                Ok(self.step_agent(idx, snapshot, false).map(|c| vec![(agent, c)]).unwrap_or_default())
            }
            EngineEvent::Arrived { agent }
            | EngineEvent::LoadComplete { agent }
            | EngineEvent::UnloadComplete { agent }
            | EngineEvent::Idle { agent } => {
                let idx = self.index_of(agent)?;
                if let EngineEvent::LoadComplete { .. } = event {
                    // A completed load retires the claim
                    if let Some(Intent::Load(target)) = self.agents[idx].queue.outstanding().copied() {
                        self.ledger.release_claim(agent, target);
                    }
                }
                self.agents[idx].queue.advance();
                Ok(self.step_agent(idx, snapshot, false).map(|c| vec![(agent, c)]).unwrap_or_default())
            }
            EngineEvent::Destroyed { agent } => {
                let idx = self.index_of(agent)?;
                log::debug!("[team] {:?} destroyed, releasing claims", agent);
                self.ledger.release_all(agent);
                self.claims.release_agent(agent);
                self.agents[idx].queue.clear();
                self.agents[idx].directive = None;
                Ok(Vec::new())
            }
            EngineEvent::Tick => {
                for rec in &mut self.agents {
                    rec.cooldown = rec.cooldown.saturating_sub(1);
                }
                let mut order: Vec<usize> = (0..self.agents.len()).collect();
                order.sort_by_key(|&i| {
                    (std::cmp::Reverse(self.agents[i].state.role.priority()), self.agents[i].id)
                });
                let mut commands = Vec::new();
                for idx in order {
                    let id = self.agents[idx].id;
                    if let Some(cmd) = self.step_agent(idx, snapshot, true) {
                        commands.push((id, cmd));
                    }
                }
                Ok(commands)
            }
        }
    }

    /// Machine state of an agent, for inspection
    pub fn role_of(&self, agent: ObjectId) -> Option<RoleState> {
        self.agents.iter().find(|r| r.id == agent).map(|r| r.state)
    }

    pub fn ledger(&self) -> &AllocationLedger {
        &self.ledger
    }

    pub fn position_claims(&self) -> &PositionClaims {
        &self.claims
    }

    fn index_of(&self, agent: ObjectId) -> Result<usize> {
        self.agents
            .iter()
            .position(|r| r.id == agent)
            .ok_or(CoreError::UnknownAgent(agent))
    }

    /// Advance one agent: invalidate stale plans, re-run the guard chain
    /// when due, and emit the next primitive command.
    fn step_agent(&mut self, idx: usize, snapshot: &WorldSnapshot, on_tick: bool) -> Option<Command> {
        let id = self.agents[idx].id;
        let view: AgentView = match snapshot.agent(id) {
            Some(v) if v.alive => v.clone(),
            _ => {
                // The record outlives the unit; claims go back to the pool
                self.ledger.release_all(id);
                self.claims.release_agent(id);
                self.agents[idx].queue.clear();
                self.agents[idx].directive = None;
                return None;
            }
        };

        // Stale reference: the world invalidated something the queue still
        // intends to act on. Rebuild wholesale, never resume.
        let stale = queue_is_stale(&self.agents[idx].queue, snapshot);
        if stale {
            log::debug!("[team] {:?} queue went stale, rebuilding", id);
            self.agents[idx].queue.clear();
            self.agents[idx].directive = None;
        }

        let combat_capable = view.is_combat_capable();
        // Guards run when the agent is idle, and every tick for armed agents
        let evaluate_now = self.agents[idx].queue.is_idle() || (on_tick && combat_capable);
        if evaluate_now {
            let old = self.agents[idx].state;
            let (next, directive) = role_machine::evaluate(&view, old, snapshot, &self.ledger);
            if next != old {
                log::debug!("[team] {:?} {:?} -> {:?}", id, old, next);
                // Leaving the working state or switching role abandons
                // whatever was reserved under the old assignment
                if next.role != old.role || next.substate != Substate::Working {
                    self.ledger.release_all(id);
                    self.claims.release_agent(id);
                }
                self.agents[idx].state = next;
            }
            if self.agents[idx].directive != Some(directive) || self.agents[idx].queue.is_idle() {
                let intents =
                    plan_intents(&view, self.agents[idx].state, directive, snapshot, &mut self.ledger, &mut self.claims);
                self.agents[idx].queue.rebuild(intents);
                self.agents[idx].directive = Some(directive);
            }
        } else if on_tick && !combat_capable {
            // Harvesters mid-plan are left alone between events
            return None;
        }

        let rec = &mut self.agents[idx];
        if let Some(Intent::Fire(_)) = rec.queue.peek() {
            if rec.cooldown > 0 {
                return Some(Command::Hold);
            }
        }
        let intent = rec.queue.next()?;
        Some(match intent {
            Intent::Hold => {
                // Holds complete immediately; nothing stays outstanding
                rec.queue.advance();
                Command::Hold
            }
            Intent::Fire(t) => {
                rec.cooldown = view.weapon.map(|w| w.cooldown_ticks).unwrap_or(0);
                Command::Fire(t)
            }
            Intent::Move(mt) => Command::MoveTo(mt),
            Intent::Load(t) => Command::LoadFrom(t),
            Intent::Unload(t) => Command::UnloadTo(t),
            Intent::Turn(t) => Command::TurnTo(t),
        })
    }
}

/// True if any intent still queued acts on a target the snapshot no longer
/// supports: a drained load source, a dead unload base, a dead enemy.
fn queue_is_stale(queue: &ActionQueue, snapshot: &WorldSnapshot) -> bool {
    queue.intents().any(|intent| match intent {
        Intent::Load(t) => snapshot.payload_of(*t) == 0,
        Intent::Unload(t) => snapshot.base(*t).map(|b| !b.alive).unwrap_or(true),
        Intent::Turn(t) | Intent::Fire(t) => !object_engageable(*t, snapshot),
        Intent::Move(MoveTarget::Object(t)) => {
            snapshot.payload_of(*t) == 0 && !object_engageable(*t, snapshot)
        }
        Intent::Move(MoveTarget::Point(_)) | Intent::Hold => false,
    })
}

fn object_engageable(id: ObjectId, snapshot: &WorldSnapshot) -> bool {
    snapshot.agent(id).map(|a| a.alive).unwrap_or(false)
        || snapshot.base(id).map(|b| b.alive).unwrap_or(false)
}

/// Turn a directive into the intent queue that realizes it
fn plan_intents(
    view: &AgentView,
    state: RoleState,
    directive: Directive,
    snapshot: &WorldSnapshot,
    ledger: &mut AllocationLedger,
    claims: &mut PositionClaims,
) -> Vec<Intent> {
    match directive {
        Directive::Harvest(node) => plan_harvest(view, state, node, snapshot, ledger),
        Directive::Deliver => match snapshot.own_base() {
            Some(b) => vec![Intent::Move(MoveTarget::Object(b.id)), Intent::Unload(b.id)],
            None => vec![Intent::Hold],
        },
        Directive::Engage(enemy) => {
            let (Some(epos), Some(weapon)) =
                (snapshot.agent(enemy).map(|e| e.pos), view.weapon)
            else {
                return vec![Intent::Hold];
            };
            let policy = PositionPolicy::Attack {
                target: enemy,
                preferred_range: weapon.range * combat::STANDOFF_RANGE_FACTOR,
                must_clear_friendly_fire: true,
            };
            match position_solver::solve(view, epos, &policy, snapshot, claims) {
                Some(standoff) => {
                    if let Some(slot) = standoff.slot {
                        claims.claim(slot, view.id);
                    }
                    if geometry::distance(view.pos, standoff.point) < 5.0 {
                        vec![Intent::Turn(enemy), Intent::Fire(enemy)]
                    } else {
                        vec![
                            Intent::Move(MoveTarget::Point(standoff.point)),
                            Intent::Turn(enemy),
                            Intent::Fire(enemy),
                        ]
                    }
                }
                None => vec![Intent::Hold],
            }
        }
        Directive::Besiege(base) => {
            let Some(bpos) = snapshot.base(base).map(|b| b.pos) else {
                return vec![Intent::Hold];
            };
            let ring = view
                .weapon
                .map(|w| w.range * combat::STANDOFF_RANGE_FACTOR)
                .unwrap_or(formation::DEFENSE_RING_RADIUS);
            let policy =
                PositionPolicy::Besiege { base, ring_radius: ring, slot_count: formation::SIEGE_SLOTS };
            match position_solver::solve(view, bpos, &policy, snapshot, claims) {
                Some(standoff) => {
                    if let Some(slot) = standoff.slot {
                        claims.claim(slot, view.id);
                    }
                    if geometry::distance(view.pos, standoff.point) < 5.0 {
                        vec![Intent::Turn(base), Intent::Fire(base)]
                    } else {
                        vec![
                            Intent::Move(MoveTarget::Point(standoff.point)),
                            Intent::Turn(base),
                            Intent::Fire(base),
                        ]
                    }
                }
                None => vec![Intent::Hold],
            }
        }
        Directive::Defend => {
            let Some(home) = snapshot.own_base() else {
                return vec![Intent::Hold];
            };
            let policy = PositionPolicy::Defend {
                ring_radius: formation::DEFENSE_RING_RADIUS,
                slot_count: formation::DEFENSE_SLOTS,
            };
            match position_solver::solve(view, home.pos, &policy, snapshot, claims) {
                Some(standoff) => {
                    if let Some(slot) = standoff.slot {
                        claims.claim(slot, view.id);
                    }
                    if geometry::distance(view.pos, standoff.point) < 5.0 {
                        vec![Intent::Hold]
                    } else {
                        vec![Intent::Move(MoveTarget::Point(standoff.point))]
                    }
                }
                None => vec![Intent::Hold],
            }
        }
        Directive::ReturnHome => match snapshot.own_base() {
            Some(b) => vec![Intent::Move(MoveTarget::Object(b.id))],
            None => vec![Intent::Hold],
        },
        Directive::Hold => vec![Intent::Hold],
    }
}

/// Secure a claim on `node` (following redirects and denials to the next
/// best alternative) and emit the fly-and-load pair.
fn plan_harvest(
    view: &AgentView,
    state: RoleState,
    node: ObjectId,
    snapshot: &WorldSnapshot,
    ledger: &mut AllocationLedger,
) -> Vec<Intent> {
    let want = view.cargo_room();
    if want == 0 {
        return vec![Intent::Hold];
    }
    if let Some(claim) = ledger.claim_of(view.id) {
        if claim.target == node {
            return vec![Intent::Move(MoveTarget::Object(node)), Intent::Load(node)];
        }
    }
    let mut target = node;
    for _ in 0..3 {
        let Some(pos) = snapshot.node(target).map(|n| n.pos) else {
            return vec![Intent::Hold];
        };
        let priority = ClaimPriority {
            role_rank: state.role.priority(),
            distance_to_target: geometry::distance(view.pos, pos),
        };
        match ledger.request_claim(view.id, priority, target, want, snapshot) {
            ClaimOutcome::Accepted { .. } => {
                return vec![Intent::Move(MoveTarget::Object(target)), Intent::Load(target)];
            }
            ClaimOutcome::Redirected { alternative: Some(alt) } => target = alt,
            ClaimOutcome::Redirected { alternative: None } => return vec![Intent::Hold],
            ClaimOutcome::Denied => {
                match ledger.nearest_alternative(view.pos, target, snapshot) {
                    Some(alt) => target = alt,
                    None => return vec![Intent::Hold],
                }
            }
        }
    }
    vec![Intent::Hold]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::role_machine::Role;
    use crate::engine::snapshot::test_fixtures::*;
    use crate::engine::types::TeamSide;

    fn one_collector() -> TeamContext {
        TeamContext::new(RoleQuota { collectors: 1 })
    }

    #[test]
    fn test_spawn_assigns_quota_role_and_issues_first_command() {
        let snap = snapshot(
            vec![harvester(1, (300.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 50)],
        );
        let mut team = one_collector();

        let cmds = team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();
        assert_eq!(
            cmds,
            vec![(ObjectId(1), Command::MoveTo(MoveTarget::Object(ObjectId(101))))]
        );
        assert_eq!(team.role_of(ObjectId(1)).unwrap().role, Role::Collector);
        let claim = team.ledger().claim_of(ObjectId(1)).expect("claim");
        assert_eq!(claim.target, ObjectId(101));
        assert_eq!(claim.amount, 40);
    }

    /// Full collector loop: fly out, load, bring it home, unload, go again.
    #[test]
    fn test_harvest_cycle_through_engine_events() {
        let snap = snapshot(
            vec![harvester(1, (300.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 50)],
        );
        let mut team = one_collector();
        team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();

        let cmds = team.handle_event(EngineEvent::Arrived { agent: ObjectId(1) }, &snap).unwrap();
        assert_eq!(cmds, vec![(ObjectId(1), Command::LoadFrom(ObjectId(101)))]);

        // Load done: hold is full, node partially drained
        let mut full = harvester(1, (350.0, 400.0));
        full.cargo = 40;
        let loaded = snapshot(
            vec![full],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 10)],
        );
        let cmds =
            team.handle_event(EngineEvent::LoadComplete { agent: ObjectId(1) }, &loaded).unwrap();
        assert_eq!(cmds, vec![(ObjectId(1), Command::MoveTo(MoveTarget::Object(ObjectId(50))))]);
        // The completed load retired the claim
        assert!(team.ledger().claim_of(ObjectId(1)).is_none());

        let cmds =
            team.handle_event(EngineEvent::Arrived { agent: ObjectId(1) }, &loaded).unwrap();
        assert_eq!(cmds, vec![(ObjectId(1), Command::UnloadTo(ObjectId(50)))]);

        // Unload done: empty again, the leftover payload is the next target
        let empty = snapshot(
            vec![harvester(1, (100.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 10)],
        );
        let cmds =
            team.handle_event(EngineEvent::UnloadComplete { agent: ObjectId(1) }, &empty).unwrap();
        assert_eq!(cmds, vec![(ObjectId(1), Command::MoveTo(MoveTarget::Object(ObjectId(101))))]);
        assert_eq!(team.ledger().claim_of(ObjectId(1)).unwrap().amount, 10);
    }

    /// A teammate drains the node mid-flight: the queue is rebuilt wholesale
    /// onto the next viable target, never resumed.
    #[test]
    fn test_stale_target_rebuilds_queue_on_tick() {
        let snap = snapshot(
            vec![harvester(1, (300.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 50), node(102, (500.0, 400.0), 50)],
        );
        let mut team = one_collector();
        let cmds = team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();
        assert_eq!(cmds[0].1, Command::MoveTo(MoveTarget::Object(ObjectId(101))));

        let drained = snapshot(
            vec![harvester(1, (320.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 0), node(102, (500.0, 400.0), 50)],
        );
        let cmds = team.handle_event(EngineEvent::Tick, &drained).unwrap();
        assert_eq!(cmds, vec![(ObjectId(1), Command::MoveTo(MoveTarget::Object(ObjectId(102))))]);
        assert_eq!(team.ledger().claim_of(ObjectId(1)).unwrap().target, ObjectId(102));
    }

    #[test]
    fn test_duplicate_spawn_and_unknown_agent_are_errors() {
        let snap = snapshot(
            vec![harvester(1, (300.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![],
        );
        let mut team = one_collector();
        team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();

        let err = team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap);
        assert!(matches!(err, Err(CoreError::DuplicateSpawn(ObjectId(1)))));
        let err = team.handle_event(EngineEvent::Arrived { agent: ObjectId(9) }, &snap);
        assert!(matches!(err, Err(CoreError::UnknownAgent(ObjectId(9)))));
    }

    /// Destruction releases the claim before the sweep would catch it, so a
    /// teammate querying in the same tick already sees the capacity free.
    #[test]
    fn test_destroyed_agent_releases_claims_immediately() {
        let snap = snapshot(
            vec![harvester(1, (300.0, 400.0))],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 50)],
        );
        let mut team = one_collector();
        team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();
        assert!(team.ledger().claim_of(ObjectId(1)).is_some());

        let cmds =
            team.handle_event(EngineEvent::Destroyed { agent: ObjectId(1) }, &snap).unwrap();
        assert!(cmds.is_empty());
        assert!(team.ledger().claim_of(ObjectId(1)).is_none());
        assert_eq!(team.ledger().remaining_capacity(ObjectId(101), &snap), 50);
    }

    /// Warrior fire discipline: move to the standoff, turn, fire, then hold
    /// until the weapon cooldown expires.
    #[test]
    fn test_fire_cooldown_gates_repeat_shots() {
        let enemy = agent(9, TeamSide::Enemy, (600.0, 400.0));
        let snap = snapshot(
            vec![agent(1, TeamSide::Own, (600.0, 300.0)), enemy.clone()],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![],
        );
        let mut team = TeamContext::new(RoleQuota { collectors: 0 });

        let cmds = team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();
        let standoff = match cmds[0].1 {
            Command::MoveTo(MoveTarget::Point(p)) => p,
            other => panic!("expected a move to the standoff, got {:?}", other),
        };
        // Best ring point is the one facing the home base
        assert!((geometry::distance(standoff, (438.0, 400.0))) < 1.0);

        // Arrived at the standoff; the enemy has not moved
        let at_standoff = snapshot(
            vec![agent(1, TeamSide::Own, standoff), enemy.clone()],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![],
        );
        let cmds =
            team.handle_event(EngineEvent::Arrived { agent: ObjectId(1) }, &at_standoff).unwrap();
        assert_eq!(cmds[0].1, Command::TurnTo(ObjectId(9)));
        let cmds =
            team.handle_event(EngineEvent::Idle { agent: ObjectId(1) }, &at_standoff).unwrap();
        assert_eq!(cmds[0].1, Command::Fire(ObjectId(9)));

        // Already in position: the replan goes straight to turn-and-fire
        let cmds =
            team.handle_event(EngineEvent::Idle { agent: ObjectId(1) }, &at_standoff).unwrap();
        assert_eq!(cmds[0].1, Command::TurnTo(ObjectId(9)));
        // The queued shot is gated by the cooldown set when the first fired
        let cmds =
            team.handle_event(EngineEvent::Idle { agent: ObjectId(1) }, &at_standoff).unwrap();
        assert_eq!(cmds[0].1, Command::Hold);

        for _ in 0..3 {
            let cmds = team.handle_event(EngineEvent::Tick, &at_standoff).unwrap();
            assert_eq!(cmds[0].1, Command::Hold);
        }
        let cmds = team.handle_event(EngineEvent::Tick, &at_standoff).unwrap();
        assert_eq!(cmds[0].1, Command::Fire(ObjectId(9)));
    }

    /// One tick, three agents with invalidated plans: commands come out in
    /// role-priority order, id breaking ties.
    #[test]
    fn test_tick_processes_agents_in_priority_order() {
        let first = snapshot(
            vec![
                harvester(3, (200.0, 400.0)),
                agent(1, TeamSide::Own, (300.0, 300.0)),
                agent(2, TeamSide::Own, (300.0, 500.0)),
                agent(9, TeamSide::Enemy, (900.0, 400.0)),
            ],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 50)],
        );
        let mut team = one_collector();
        for id in [3, 1, 2] {
            team.handle_event(EngineEvent::Spawn { agent: ObjectId(id) }, &first).unwrap();
        }
        assert_eq!(team.role_of(ObjectId(3)).unwrap().role, Role::Collector);
        assert_eq!(team.role_of(ObjectId(1)).unwrap().role, Role::Warrior);

        // Next tick: the engaged enemy is dead and the claimed node drained,
        // so all three agents must replan at once
        let mut dead = agent(9, TeamSide::Enemy, (900.0, 400.0));
        dead.alive = false;
        let second = snapshot(
            vec![
                harvester(3, (220.0, 400.0)),
                agent(1, TeamSide::Own, (400.0, 300.0)),
                agent(2, TeamSide::Own, (400.0, 500.0)),
                dead,
                agent(10, TeamSide::Enemy, (900.0, 600.0)),
            ],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![node(101, (350.0, 400.0), 0), node(102, (500.0, 400.0), 50)],
        );
        let cmds = team.handle_event(EngineEvent::Tick, &second).unwrap();

        let order: Vec<ObjectId> = cmds.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![ObjectId(1), ObjectId(2), ObjectId(3)]);
        assert!(matches!(cmds[0].1, Command::MoveTo(MoveTarget::Point(_))));
        assert!(matches!(cmds[1].1, Command::MoveTo(MoveTarget::Point(_))));
        assert_eq!(cmds[2].1, Command::MoveTo(MoveTarget::Object(ObjectId(102))));
    }

    /// Warriors engaging the same enemy never share a standoff slot.
    #[test]
    fn test_two_warriors_get_distinct_standoffs() {
        let snap = snapshot(
            vec![
                agent(1, TeamSide::Own, (300.0, 300.0)),
                agent(2, TeamSide::Own, (300.0, 500.0)),
                agent(9, TeamSide::Enemy, (900.0, 400.0)),
            ],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![],
        );
        let mut team = TeamContext::new(RoleQuota { collectors: 0 });
        let a = team.handle_event(EngineEvent::Spawn { agent: ObjectId(1) }, &snap).unwrap();
        let b = team.handle_event(EngineEvent::Spawn { agent: ObjectId(2) }, &snap).unwrap();

        let (pa, pb) = match (a[0].1, b[0].1) {
            (Command::MoveTo(MoveTarget::Point(pa)), Command::MoveTo(MoveTarget::Point(pb))) => {
                (pa, pb)
            }
            other => panic!("expected two standoff moves, got {:?}", other),
        };
        assert!(geometry::distance(pa, pb) > 1.0);
        assert_ne!(
            team.position_claims().slot_of(ObjectId(1)),
            team.position_claims().slot_of(ObjectId(2))
        );
    }
}
