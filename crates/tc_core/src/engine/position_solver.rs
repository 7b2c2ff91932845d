//! Standoff position solver.
//!
//! Given a target and a safety policy, produces the best conflict-free point
//! to act from: attack rings that keep fire lines clear of teammates, fixed
//! defense and siege slots, and flee points that maximize clearance from
//! danger.
//!
//! Failure degrades gracefully instead of raising: when every candidate
//! fails a hard constraint the solver walks a relaxation ladder (bounds
//! margin last) and finally returns `None`, at which point the caller holds
//! position and re-queries next tick. An agent is never stalled by an
//! unsolvable position.

use super::constants::{arena, solver, unit};
use super::geometry::{self, Point};
use super::ledger::{PositionClaims, SlotKey};
use super::snapshot::WorldSnapshot;
use super::types::{AgentView, ObjectId};

/// Safety policy for a position request
#[derive(Debug, Clone, PartialEq)]
pub enum PositionPolicy {
    /// Standoff ring around an enemy target at `preferred_range`, falling
    /// back to shorter rings when no candidate on the full ring qualifies.
    ///
    /// With `must_clear_friendly_fire` set (the normal case) the fire-line
    /// filter is a hard constraint: the solver returns `None` rather than a
    /// point whose shot would graze a teammate. Unset, the filter is the
    /// first constraint relaxed.
    Attack { target: ObjectId, preferred_range: f32, must_clear_friendly_fire: bool },
    /// Fixed slots evenly spaced around the home base; lowest free index wins
    Defend { ring_radius: f32, slot_count: u8 },
    /// Fixed slots evenly spaced around an enemy base
    Besiege { base: ObjectId, ring_radius: f32, slot_count: u8 },
    /// Break away from `danger_points` without leaving the sector: candidates
    /// near the current position, ranked by minimum distance to any danger
    Flee { danger_points: Vec<Point>, min_clearance: f32, search_radius: f32 },
}

/// A solved position, with the slot to claim when the policy uses slots
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Standoff {
    pub point: Point,
    pub slot: Option<SlotKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relax {
    Strict,
    NoMargin,
    NoFireLine,
    NoFireLineNoMargin,
}

impl Relax {
    fn margin(self) -> f32 {
        match self {
            Relax::Strict | Relax::NoFireLine => arena::WALL_MARGIN,
            Relax::NoMargin | Relax::NoFireLineNoMargin => 0.0,
        }
    }

    fn checks_fire_line(self) -> bool {
        matches!(self, Relax::Strict | Relax::NoMargin)
    }
}

/// Solve a position for `requester` acting on `anchor` under `policy`.
///
/// `anchor` is the position of the policy's subject: the attack or siege
/// target, the home base for `Defend`, ignored for `Flee`.
pub fn solve(
    requester: &AgentView,
    anchor: Point,
    policy: &PositionPolicy,
    snapshot: &WorldSnapshot,
    claims: &PositionClaims,
) -> Option<Standoff> {
    match policy {
        PositionPolicy::Attack { target, preferred_range, must_clear_friendly_fire } => {
            solve_attack(requester, *target, anchor, *preferred_range, *must_clear_friendly_fire, snapshot, claims)
        }
        PositionPolicy::Defend { ring_radius, slot_count } => {
            solve_ring_slots(requester, anchor, *ring_radius, *slot_count, None, snapshot, claims)
        }
        PositionPolicy::Besiege { base, ring_radius, slot_count } => {
            solve_ring_slots(requester, anchor, *ring_radius, *slot_count, Some(*base), snapshot, claims)
        }
        PositionPolicy::Flee { danger_points, min_clearance, search_radius } => {
            solve_flee(requester, danger_points, *min_clearance, *search_radius, snapshot)
        }
    }
}

fn solve_attack(
    requester: &AgentView,
    target: ObjectId,
    target_pos: Point,
    preferred_range: f32,
    must_clear_friendly_fire: bool,
    snapshot: &WorldSnapshot,
    claims: &PositionClaims,
) -> Option<Standoff> {
    let spec = snapshot.arena();
    let home = snapshot.own_base().map(|b| b.pos);
    // Dead teammates neither block a candidate nor shadow a fire line
    let mates: Vec<&AgentView> =
        snapshot.own_agents().filter(|a| a.id != requester.id).collect();

    let ladder: &[Relax] = if must_clear_friendly_fire {
        &[Relax::Strict, Relax::NoMargin]
    } else {
        &[Relax::Strict, Relax::NoFireLine, Relax::NoFireLineNoMargin]
    };

    for &relax in ladder {
        for (ring_idx, &scale) in solver::RING_SCALES.iter().enumerate() {
            let radius = preferred_range * scale;
            if radius <= unit::ENVELOPE {
                continue;
            }
            let mut best: Option<(f32, f32, Standoff)> = None;
            for step in 0..solver::RING_STEPS {
                let angle = step as f32 * (360.0 / solver::RING_STEPS as f32);
                let cand = geometry::point_at(target_pos, angle, radius);
                if !geometry::within_bounds(cand, spec.width, spec.height, relax.margin()) {
                    continue;
                }
                if mates.iter().any(|m| geometry::distance(cand, m.pos) < unit::ENVELOPE) {
                    continue;
                }
                if relax.checks_fire_line()
                    && mates.iter().any(|m| {
                        geometry::segment_circle_intersects(
                            cand,
                            target_pos,
                            m.pos,
                            unit::FIRE_LINE_CLEARANCE,
                        )
                    })
                {
                    continue;
                }
                let slot = SlotKey::Standoff {
                    target,
                    index: (ring_idx * solver::RING_STEPS + step) as u8,
                };
                if let Some(holder) = claims.holder(slot) {
                    if holder != requester.id {
                        continue;
                    }
                }
                // Rank: ease of retreat first, then travel cost
                let base_dist = home.map(|h| geometry::distance(cand, h)).unwrap_or(0.0);
                let req_dist = geometry::distance(cand, requester.pos);
                let candidate = (base_dist, req_dist, Standoff { point: cand, slot: Some(slot) });
                let better = match &best {
                    None => true,
                    Some((bd, rd, _)) => {
                        base_dist.total_cmp(bd).then(req_dist.total_cmp(rd))
                            == std::cmp::Ordering::Less
                    }
                };
                if better {
                    best = Some(candidate);
                }
            }
            if let Some((_, _, standoff)) = best {
                return Some(standoff);
            }
        }
    }
    log::debug!(
        "[solver] no attack standoff for {:?} on {:?} within search budget",
        requester.id,
        target
    );
    None
}

/// Fixed-slot rings (defense and siege): lowest free in-bounds index wins.
/// `siege_base` selects the slot namespace.
fn solve_ring_slots(
    requester: &AgentView,
    center: Point,
    ring_radius: f32,
    slot_count: u8,
    siege_base: Option<ObjectId>,
    snapshot: &WorldSnapshot,
    claims: &PositionClaims,
) -> Option<Standoff> {
    let spec = snapshot.arena();
    for margin in [arena::WALL_MARGIN, 0.0] {
        for index in 0..slot_count {
            let slot = match siege_base {
                Some(base) => SlotKey::Siege { base, index },
                None => SlotKey::Defense(index),
            };
            if let Some(holder) = claims.holder(slot) {
                if holder != requester.id {
                    continue;
                }
            }
            let angle = index as f32 * (360.0 / slot_count as f32);
            let point = geometry::point_at(center, angle, ring_radius);
            if !geometry::within_bounds(point, spec.width, spec.height, margin) {
                continue;
            }
            return Some(Standoff { point, slot: Some(slot) });
        }
    }
    None
}

fn solve_flee(
    requester: &AgentView,
    danger_points: &[Point],
    min_clearance: f32,
    search_radius: f32,
    snapshot: &WorldSnapshot,
) -> Option<Standoff> {
    if danger_points.is_empty() {
        return Some(Standoff { point: requester.pos, slot: None });
    }
    let spec = snapshot.arena();
    for margin in [arena::WALL_MARGIN, 0.0] {
        // (meets min_clearance, clearance, point); strictly-better replaces
        let mut best: Option<(bool, f32, Point)> = None;
        for ring in [search_radius, search_radius * 0.5] {
            for step in 0..solver::FLEE_STEPS {
                let angle = step as f32 * (360.0 / solver::FLEE_STEPS as f32);
                let cand = geometry::point_at(requester.pos, angle, ring);
                if !geometry::within_bounds(cand, spec.width, spec.height, margin) {
                    continue;
                }
                let clearance = danger_points
                    .iter()
                    .map(|&d| geometry::distance(cand, d))
                    .fold(f32::INFINITY, f32::min);
                let meets = clearance >= min_clearance;
                let better = match &best {
                    None => true,
                    Some((bm, bc, _)) => (meets, clearance) > (*bm, *bc),
                };
                if better {
                    best = Some((meets, clearance, cand));
                }
            }
        }
        if let Some((_, _, point)) = best {
            return Some(Standoff { point, slot: None });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::snapshot::test_fixtures::*;
    use crate::engine::types::TeamSide;

    fn attack(target: u32, range: f32) -> PositionPolicy {
        PositionPolicy::Attack {
            target: ObjectId(target),
            preferred_range: range,
            must_clear_friendly_fire: true,
        }
    }

    #[test]
    fn test_attack_standoff_sits_on_preferred_ring() {
        let requester = agent(1, TeamSide::Own, (200.0, 400.0));
        let enemy = agent(9, TeamSide::Enemy, (600.0, 400.0));
        let snap = snapshot(
            vec![requester.clone(), enemy],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![],
        );
        let claims = PositionClaims::new();

        let standoff =
            solve(&requester, (600.0, 400.0), &attack(9, 160.0), &snap, &claims).expect("standoff");
        assert!((geometry::distance(standoff.point, (600.0, 400.0)) - 160.0).abs() < 0.5);
        assert!(standoff.slot.is_some());
    }

    #[test]
    fn test_attack_ranked_toward_own_base() {
        let requester = agent(1, TeamSide::Own, (600.0, 200.0));
        let enemy = agent(9, TeamSide::Enemy, (600.0, 400.0));
        let home = base(50, TeamSide::Own, (100.0, 400.0));
        let snap = snapshot(vec![requester.clone(), enemy], vec![home], vec![]);
        let claims = PositionClaims::new();

        let standoff =
            solve(&requester, (600.0, 400.0), &attack(9, 150.0), &snap, &claims).expect("standoff");
        // Best candidate is the ring point facing the home base, not the
        // one nearest the requester
        assert!(standoff.point.0 < 600.0);
        assert!((geometry::distance(standoff.point, (100.0, 400.0)) - 350.0).abs() < 1.0);
    }

    #[test]
    fn test_attack_fire_line_clear_of_live_teammates() {
        let requester = agent(1, TeamSide::Own, (200.0, 400.0));
        let target_pos = (600.0, 400.0);
        // Teammates scattered around the near side of the target
        let mates = vec![
            agent(2, TeamSide::Own, (430.0, 400.0)),
            agent(3, TeamSide::Own, (500.0, 330.0)),
            agent(4, TeamSide::Own, (500.0, 470.0)),
        ];
        let mut agents = vec![requester.clone(), agent(9, TeamSide::Enemy, target_pos)];
        agents.extend(mates.clone());
        let snap = snapshot(agents, vec![base(50, TeamSide::Own, (100.0, 400.0))], vec![]);
        let claims = PositionClaims::new();

        let standoff =
            solve(&requester, target_pos, &attack(9, 170.0), &snap, &claims).expect("standoff");
        for m in &mates {
            assert!(
                !geometry::segment_circle_intersects(
                    standoff.point,
                    target_pos,
                    m.pos,
                    unit::FIRE_LINE_CLEARANCE
                ),
                "fire line from {:?} grazes teammate at {:?}",
                standoff.point,
                m.pos
            );
        }
    }

    #[test]
    fn test_attack_falls_back_to_shorter_ring_when_outer_blocked() {
        let target_pos = (600.0, 400.0);
        let requester = agent(1, TeamSide::Own, (200.0, 400.0));
        // Live teammates parked on every full-range ring point
        let mut agents = vec![requester.clone(), agent(9, TeamSide::Enemy, target_pos)];
        for step in 0..solver::RING_STEPS {
            let angle = step as f32 * (360.0 / solver::RING_STEPS as f32);
            let pos = geometry::point_at(target_pos, angle, 240.0);
            agents.push(agent(100 + step as u32, TeamSide::Own, pos));
        }
        let snap = snapshot(agents.clone(), vec![base(50, TeamSide::Own, (100.0, 400.0))], vec![]);
        let claims = PositionClaims::new();

        let standoff = solve(
            &requester,
            target_pos,
            &PositionPolicy::Attack {
                target: ObjectId(9),
                preferred_range: 240.0,
                must_clear_friendly_fire: false,
            },
            &snap,
            &claims,
        )
        .expect("fallback ring");
        assert!((geometry::distance(standoff.point, target_pos) - 180.0).abs() < 0.5);

        // Same layout with the blockers dead: the full ring is usable again
        for a in agents.iter_mut().skip(2) {
            a.alive = false;
        }
        let snap = snapshot(agents, vec![base(50, TeamSide::Own, (100.0, 400.0))], vec![]);
        let standoff = solve(
            &requester,
            target_pos,
            &PositionPolicy::Attack {
                target: ObjectId(9),
                preferred_range: 240.0,
                must_clear_friendly_fire: false,
            },
            &snap,
            &claims,
        )
        .expect("full ring");
        assert!((geometry::distance(standoff.point, target_pos) - 240.0).abs() < 0.5);
    }

    #[test]
    fn test_attack_returns_none_when_rings_leave_arena() {
        let requester = agent(1, TeamSide::Own, (50.0, 50.0));
        let enemy = agent(9, TeamSide::Enemy, (50.0, 50.0));
        let snap = WorldSnapshot::build(
            crate::engine::types::ArenaSpec { width: 100.0, height: 100.0 },
            vec![requester.clone(), enemy],
            vec![],
            vec![],
        );
        let claims = PositionClaims::new();
        // Every ring (400, 300, 200) lies outside a 100x100 arena even with
        // the margin relaxed: give up rather than stall or violate
        assert_eq!(solve(&requester, (50.0, 50.0), &attack(9, 400.0), &snap, &claims), None);
    }

    #[test]
    fn test_attack_skips_claimed_slot() {
        let requester = agent(1, TeamSide::Own, (200.0, 400.0));
        let enemy = agent(9, TeamSide::Enemy, (600.0, 400.0));
        let snap = snapshot(
            vec![requester.clone(), enemy],
            vec![base(50, TeamSide::Own, (100.0, 400.0))],
            vec![],
        );
        let mut claims = PositionClaims::new();

        let first =
            solve(&requester, (600.0, 400.0), &attack(9, 160.0), &snap, &claims).expect("first");
        claims.claim(first.slot.unwrap(), ObjectId(77));
        let second =
            solve(&requester, (600.0, 400.0), &attack(9, 160.0), &snap, &claims).expect("second");
        assert_ne!(first.slot, second.slot);
        assert!(geometry::distance(first.point, second.point) > 1.0);
    }

    #[test]
    fn test_defense_ring_lowest_free_slot() {
        let requester = agent(1, TeamSide::Own, (200.0, 400.0));
        let home = base(50, TeamSide::Own, (600.0, 400.0));
        let snap = snapshot(vec![requester.clone()], vec![home], vec![]);
        let mut claims = PositionClaims::new();
        claims.claim(SlotKey::Defense(0), ObjectId(10));
        claims.claim(SlotKey::Defense(1), ObjectId(11));

        let policy = PositionPolicy::Defend { ring_radius: 120.0, slot_count: 4 };
        let standoff = solve(&requester, (600.0, 400.0), &policy, &snap, &claims).expect("slot");
        assert_eq!(standoff.slot, Some(SlotKey::Defense(2)));
        assert!((geometry::distance(standoff.point, (600.0, 400.0)) - 120.0).abs() < 0.5);
    }

    #[test]
    fn test_defense_ring_skips_out_of_bounds_slots() {
        let requester = agent(1, TeamSide::Own, (200.0, 400.0));
        // Base hugging the right wall: slot 0 (due east) would leave bounds
        let home = base(50, TeamSide::Own, (1150.0, 400.0));
        let snap = snapshot(vec![requester.clone()], vec![home], vec![]);
        let claims = PositionClaims::new();

        let policy = PositionPolicy::Defend { ring_radius: 120.0, slot_count: 4 };
        let standoff = solve(&requester, (1150.0, 400.0), &policy, &snap, &claims).expect("slot");
        assert_ne!(standoff.slot, Some(SlotKey::Defense(0)));
        let spec = snap.arena();
        assert!(geometry::within_bounds(standoff.point, spec.width, spec.height, 0.0));
    }

    #[test]
    fn test_flee_moves_away_from_danger() {
        let requester = agent(1, TeamSide::Own, (600.0, 400.0));
        let snap = snapshot(vec![requester.clone()], vec![], vec![]);
        let danger = vec![(800.0, 400.0), (750.0, 500.0)];

        let policy = PositionPolicy::Flee {
            danger_points: danger.clone(),
            min_clearance: 250.0,
            search_radius: 150.0,
        };
        let standoff = solve(&requester, requester.pos, &policy, &snap, &PositionClaims::new())
            .expect("flee point");
        let before: f32 =
            danger.iter().map(|&d| geometry::distance(requester.pos, d)).fold(f32::INFINITY, f32::min);
        let after: f32 =
            danger.iter().map(|&d| geometry::distance(standoff.point, d)).fold(f32::INFINITY, f32::min);
        assert!(after > before, "flee must gain clearance: {} -> {}", before, after);
        assert!(geometry::distance(requester.pos, standoff.point) <= 150.0 + 0.5);
    }

    #[test]
    fn test_flee_without_danger_holds_position() {
        let requester = agent(1, TeamSide::Own, (600.0, 400.0));
        let snap = snapshot(vec![requester.clone()], vec![], vec![]);
        let policy =
            PositionPolicy::Flee { danger_points: vec![], min_clearance: 100.0, search_radius: 150.0 };
        let standoff =
            solve(&requester, requester.pos, &policy, &snap, &PositionClaims::new()).unwrap();
        assert_eq!(standoff.point, requester.pos);
    }

    #[cfg(all(test, feature = "proptest"))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: an accepted Attack solve never returns a point whose
            /// fire line grazes a live teammate; it returns None instead.
            #[test]
            fn prop_friendly_fire_exclusion(
                mates in prop::collection::vec((100.0f32..1100.0, 100.0f32..700.0), 0..12)
            ) {
                let requester = agent(1, TeamSide::Own, (200.0, 400.0));
                let target_pos = (600.0, 400.0);
                let mut agents = vec![requester.clone(), agent(9, TeamSide::Enemy, target_pos)];
                for (i, &(x, y)) in mates.iter().enumerate() {
                    agents.push(agent(100 + i as u32, TeamSide::Own, (x, y)));
                }
                let snap = snapshot(agents, vec![base(50, TeamSide::Own, (100.0, 400.0))], vec![]);
                let claims = PositionClaims::new();

                if let Some(standoff) =
                    solve(&requester, target_pos, &attack(9, 170.0), &snap, &claims)
                {
                    for &(x, y) in &mates {
                        prop_assert!(!geometry::segment_circle_intersects(
                            standoff.point,
                            target_pos,
                            (x, y),
                            unit::FIRE_LINE_CLEARANCE
                        ));
                    }
                }
            }
        }
    }
}
