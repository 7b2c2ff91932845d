//! Allocation ledger: claim tracking for contested targets.
//!
//! The ledger is the single writer of claim state for one team. Agents read
//! their own claim and request new ones; nothing else mutates the tables.
//!
//! First-come-first-served allocation starves convoys: several half-loaded
//! drones fly to a node already claimed past its remaining payload, then
//! divert, wasting the travel. The eviction rule here (role rank, then
//! distance-to-target, nearer wins) approximates an online matching that
//! keeps wasted travel low while staying cheap enough to run every tick.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::geometry::{self, Point};
use super::snapshot::WorldSnapshot;
use super::types::ObjectId;

/// Priority of a claim, for eviction ordering.
///
/// Higher role rank wins; within a rank the nearer claimant wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClaimPriority {
    pub role_rank: u8,
    pub distance_to_target: f32,
}

impl ClaimPriority {
    /// Strict ordering: true if `self` may evict `other`
    pub fn outranks(&self, other: &ClaimPriority) -> bool {
        if self.role_rank != other.role_rank {
            return self.role_rank > other.role_rank;
        }
        self.distance_to_target < other.distance_to_target
    }
}

/// One reservation of capacity on a drainable target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub target: ObjectId,
    pub claimant: ObjectId,
    pub amount: u32,
    pub priority: ClaimPriority,
}

/// Result of a claim request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claim recorded; `granted` may be smaller than the requested amount
    /// when only part of the payload was still unclaimed.
    Accepted { granted: u32 },
    /// The requester was evicted since its last query and must pick a new
    /// target. `alternative` is the nearest node with free capacity at
    /// eviction time, when one existed.
    Redirected { alternative: Option<ObjectId> },
    /// No room and no evictable lower-priority claim; the caller picks its
    /// own alternative.
    Denied,
}

/// Claim table for one team.
///
/// Claims live in insertion order in a plain vector; the populations here are
/// small and linear scans keep every resolution order deterministic.
#[derive(Debug, Default)]
pub struct AllocationLedger {
    claims: Vec<Claim>,
    /// Evicted agents owed a `Redirected` on their next query
    pending_redirects: FxHashMap<ObjectId, Option<ObjectId>>,
}

impl AllocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop claims whose claimant died or whose target is dead or drained,
    /// then shrink whatever over-subscription external drain left behind.
    ///
    /// Must run once per tick before any request. Idempotent: a second call
    /// with no intervening mutation is a no-op.
    pub fn sweep(&mut self, snapshot: &WorldSnapshot) {
        self.claims.retain(|c| {
            let claimant_alive = snapshot.agent(c.claimant).map(|a| a.alive).unwrap_or(false);
            let target_live = snapshot.payload_of(c.target) > 0;
            if !claimant_alive || !target_live {
                log::debug!(
                    "[ledger] sweep drops claim {:?} -> {:?} ({} units)",
                    c.claimant,
                    c.target,
                    c.amount
                );
            }
            claimant_alive && target_live
        });
        self.rebalance(snapshot);
        self.pending_redirects
            .retain(|id, _| snapshot.agent(*id).map(|a| a.alive).unwrap_or(false));
        self.verify(snapshot);
    }

    /// Request `amount` of capacity on `target`.
    ///
    /// A pending redirect is delivered first and consumes the query: an
    /// evicted agent always sees `Redirected` before any new claim of its
    /// own can succeed.
    pub fn request_claim(
        &mut self,
        claimant: ObjectId,
        priority: ClaimPriority,
        target: ObjectId,
        amount: u32,
        snapshot: &WorldSnapshot,
    ) -> ClaimOutcome {
        if let Some(alternative) = self.pending_redirects.remove(&claimant) {
            log::debug!("[ledger] delivering redirect to {:?} -> {:?}", claimant, alternative);
            return ClaimOutcome::Redirected { alternative };
        }
        let payload = snapshot.payload_of(target);
        if amount == 0 || payload == 0 {
            return ClaimOutcome::Denied;
        }

        // A new request supersedes whatever the agent held before.
        self.release_all(claimant);

        let already: u32 = self.claimed_total(target);
        let room = payload.saturating_sub(already);
        if amount <= room {
            self.claims.push(Claim { target, claimant, amount, priority });
            return ClaimOutcome::Accepted { granted: amount };
        }

        // Not enough unclaimed payload: evict strictly lower-priority claims,
        // lowest first, until the shortfall is covered or they run out.
        let mut need = amount - room;
        let mut victims: Vec<usize> = self
            .claims
            .iter()
            .enumerate()
            .filter(|(_, c)| c.target == target && priority.outranks(&c.priority))
            .map(|(i, _)| i)
            .collect();
        victims.sort_by(|&a, &b| {
            let (ca, cb) = (&self.claims[a], &self.claims[b]);
            ca.priority
                .role_rank
                .cmp(&cb.priority.role_rank)
                .then(cb.priority.distance_to_target.total_cmp(&ca.priority.distance_to_target))
                .then(ca.claimant.cmp(&cb.claimant))
        });

        let mut evicted: Vec<ObjectId> = Vec::new();
        for idx in victims {
            if need == 0 {
                break;
            }
            let take = need.min(self.claims[idx].amount);
            self.claims[idx].amount -= take;
            need -= take;
            if self.claims[idx].amount == 0 {
                evicted.push(self.claims[idx].claimant);
            }
        }
        let granted = amount - need;
        if granted == 0 && room == 0 {
            return ClaimOutcome::Denied;
        }

        // Record redirects before removing the zeroed claims so the
        // alternative search sees the post-eviction capacity picture.
        self.claims.retain(|c| !(c.target == target && c.amount == 0));
        for victim in evicted {
            let alternative = snapshot
                .agent(victim)
                .map(|a| a.pos)
                .and_then(|pos| self.nearest_alternative(pos, target, snapshot));
            log::debug!(
                "[ledger] {:?} evicted from {:?} by {:?}, redirect -> {:?}",
                victim,
                target,
                claimant,
                alternative
            );
            self.pending_redirects.insert(victim, alternative);
        }

        let granted = granted.max(room.min(amount));
        self.claims.push(Claim { target, claimant, amount: granted, priority });
        ClaimOutcome::Accepted { granted }
    }

    /// Release one claim. Idempotent; safe mid-flight.
    pub fn release_claim(&mut self, claimant: ObjectId, target: ObjectId) {
        self.claims.retain(|c| !(c.claimant == claimant && c.target == target));
    }

    /// Release every claim held by `claimant`. Idempotent.
    pub fn release_all(&mut self, claimant: ObjectId) {
        self.claims.retain(|c| c.claimant != claimant);
    }

    /// Payload minus active claims, floor 0
    pub fn remaining_capacity(&self, target: ObjectId, snapshot: &WorldSnapshot) -> u32 {
        snapshot.payload_of(target).saturating_sub(self.claimed_total(target))
    }

    /// Sum of active claim amounts on `target`
    pub fn claimed_total(&self, target: ObjectId) -> u32 {
        self.claims.iter().filter(|c| c.target == target).map(|c| c.amount).sum()
    }

    /// The claim currently held by `claimant`, if any
    pub fn claim_of(&self, claimant: ObjectId) -> Option<Claim> {
        self.claims.iter().find(|c| c.claimant == claimant).copied()
    }

    /// True if `claimant` is owed a redirect on its next query
    pub fn has_pending_redirect(&self, claimant: ObjectId) -> bool {
        self.pending_redirects.contains_key(&claimant)
    }

    /// Nearest node (by `from`) with unclaimed capacity, excluding `exclude`
    pub fn nearest_alternative(
        &self,
        from: Point,
        exclude: ObjectId,
        snapshot: &WorldSnapshot,
    ) -> Option<ObjectId> {
        snapshot
            .nodes_by_distance(from)
            .into_iter()
            .find(|n| n.id != exclude && self.remaining_capacity(n.id, snapshot) > 0)
            .map(|n| n.id)
    }

    /// One-line JSON summary of the claim table, for debug logging
    pub fn debug_summary(&self) -> String {
        #[derive(Serialize)]
        struct Row {
            claimant: u32,
            target: u32,
            amount: u32,
        }
        let rows: Vec<Row> = self
            .claims
            .iter()
            .map(|c| Row { claimant: c.claimant.0, target: c.target.0, amount: c.amount })
            .collect();
        serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
    }

    /// Shrink claims where external drain pushed a target over-subscribed.
    /// Fully shrunk claimants get a redirect, same as an eviction.
    fn rebalance(&mut self, snapshot: &WorldSnapshot) {
        let mut targets: Vec<ObjectId> = self.claims.iter().map(|c| c.target).collect();
        targets.sort();
        targets.dedup();

        for target in targets {
            let payload = snapshot.payload_of(target);
            let mut excess = self.claimed_total(target).saturating_sub(payload);
            if excess == 0 {
                continue;
            }
            let mut order: Vec<usize> = self
                .claims
                .iter()
                .enumerate()
                .filter(|(_, c)| c.target == target)
                .map(|(i, _)| i)
                .collect();
            order.sort_by(|&a, &b| {
                let (ca, cb) = (&self.claims[a], &self.claims[b]);
                ca.priority
                    .role_rank
                    .cmp(&cb.priority.role_rank)
                    .then(cb.priority.distance_to_target.total_cmp(&ca.priority.distance_to_target))
                    .then(ca.claimant.cmp(&cb.claimant))
            });
            let mut shrunk: Vec<ObjectId> = Vec::new();
            for idx in order {
                if excess == 0 {
                    break;
                }
                let take = excess.min(self.claims[idx].amount);
                self.claims[idx].amount -= take;
                excess -= take;
                if self.claims[idx].amount == 0 {
                    shrunk.push(self.claims[idx].claimant);
                }
            }
            self.claims.retain(|c| !(c.target == target && c.amount == 0));
            for victim in shrunk {
                let alternative = snapshot
                    .agent(victim)
                    .map(|a| a.pos)
                    .and_then(|pos| self.nearest_alternative(pos, target, snapshot));
                log::debug!(
                    "[ledger] {:?} shrunk off drained {:?}, redirect -> {:?}",
                    victim,
                    target,
                    alternative
                );
                self.pending_redirects.insert(victim, alternative);
            }
        }
    }

    /// Post-sweep contract check: a violation here is a ledger bug, never a
    /// runtime condition, so it must not pass silently.
    fn verify(&self, snapshot: &WorldSnapshot) {
        let mut targets: Vec<ObjectId> = self.claims.iter().map(|c| c.target).collect();
        targets.sort();
        targets.dedup();
        for target in targets {
            let payload = snapshot.payload_of(target);
            let claimed = self.claimed_total(target);
            if claimed > payload || payload == 0 {
                contract_violation(&format!(
                    "target {:?}: claimed {} vs payload {}",
                    target, claimed, payload
                ));
            }
        }
    }
}

fn contract_violation(msg: &str) {
    log::error!("allocation contract violated: {}", msg);
    debug_assert!(false, "allocation contract violated: {}", msg);
    #[cfg(feature = "strict_contracts")]
    panic!("allocation contract violated: {}", msg);
}

// ============================================================
// Position claims
// ============================================================

/// A geometric slot an agent can hold exclusively (capacity always 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKey {
    /// Indexed slot on the defense ring around the home base
    Defense(u8),
    /// Indexed slot on the siege ring around an enemy base
    Siege { base: ObjectId, index: u8 },
    /// Indexed standoff point on an attack ring around a target
    Standoff { target: ObjectId, index: u8 },
}

/// Exclusive slot table: at most one live agent per slot, one slot per agent
#[derive(Debug, Default)]
pub struct PositionClaims {
    slots: FxHashMap<SlotKey, ObjectId>,
}

impl PositionClaims {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slot. Fails if another agent holds it; re-claiming one's own
    /// slot succeeds. Claiming releases any other slot the agent held.
    pub fn claim(&mut self, slot: SlotKey, agent: ObjectId) -> bool {
        match self.slots.get(&slot) {
            Some(&holder) if holder != agent => false,
            _ => {
                self.release_agent(agent);
                self.slots.insert(slot, agent);
                true
            }
        }
    }

    /// Current holder of a slot
    pub fn holder(&self, slot: SlotKey) -> Option<ObjectId> {
        self.slots.get(&slot).copied()
    }

    /// True if nobody holds the slot
    pub fn is_free(&self, slot: SlotKey) -> bool {
        !self.slots.contains_key(&slot)
    }

    /// The slot held by `agent`, if any
    pub fn slot_of(&self, agent: ObjectId) -> Option<SlotKey> {
        self.slots.iter().find(|(_, &a)| a == agent).map(|(&s, _)| s)
    }

    /// Release whatever slot `agent` holds. Idempotent.
    pub fn release_agent(&mut self, agent: ObjectId) {
        self.slots.retain(|_, &mut a| a != agent);
    }

    /// Drop slots held by dead agents
    pub fn sweep(&mut self, snapshot: &WorldSnapshot) {
        self.slots
            .retain(|_, &mut a| snapshot.agent(a).map(|v| v.alive).unwrap_or(false));
    }

    /// Lowest free index on the defense ring.
    ///
    /// A promoted defender inherits exactly the dead defender's slot rather
    /// than stacking onto an occupied one.
    pub fn lowest_free_defense_slot(&self, slot_count: u8) -> Option<u8> {
        (0..slot_count).find(|&i| self.is_free(SlotKey::Defense(i)))
    }

    /// Lowest free index on the siege ring around `base`
    pub fn lowest_free_siege_slot(&self, base: ObjectId, slot_count: u8) -> Option<u8> {
        (0..slot_count).find(|&i| self.is_free(SlotKey::Siege { base, index: i }))
    }
}
