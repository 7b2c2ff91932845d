//! Per-agent FIFO of primitive intents.
//!
//! Each intent maps 1:1 to an engine command. The queue emits at most one
//! intent at a time: `next` hands out the head and marks it outstanding,
//! `advance` retires it when the engine confirms completion. When the world
//! invalidates the current target the owner rebuilds the queue wholesale;
//! a stale queue is never patched in place.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::geometry::Point;
use super::types::ObjectId;

/// Destination of a move: a fixed point or a (possibly moving) object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MoveTarget {
    Point(Point),
    Object(ObjectId),
}

/// Primitive intent, one engine command each
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Intent {
    Move(MoveTarget),
    Load(ObjectId),
    Unload(ObjectId),
    Turn(ObjectId),
    Fire(ObjectId),
    Hold,
}

impl Intent {
    /// True if this intent acts on `id`
    pub fn references(&self, id: ObjectId) -> bool {
        match self {
            Intent::Move(MoveTarget::Object(t))
            | Intent::Load(t)
            | Intent::Unload(t)
            | Intent::Turn(t)
            | Intent::Fire(t) => *t == id,
            Intent::Move(MoveTarget::Point(_)) | Intent::Hold => false,
        }
    }
}

/// Ordered intent queue for one agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionQueue {
    pending: VecDeque<Intent>,
    outstanding: Option<Intent>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an intent
    pub fn push(&mut self, intent: Intent) {
        self.pending.push_back(intent);
    }

    /// Replace the whole queue, dropping the outstanding intent
    pub fn rebuild(&mut self, intents: Vec<Intent>) {
        self.pending = intents.into();
        self.outstanding = None;
    }

    /// Drop everything, including the outstanding intent
    pub fn clear(&mut self) {
        self.pending.clear();
        self.outstanding = None;
    }

    /// Pop the next intent and mark it outstanding.
    ///
    /// Returns `None` while a previous intent is still in flight: the engine
    /// gets one command per agent at a time.
    pub fn next(&mut self) -> Option<Intent> {
        if self.outstanding.is_some() {
            return None;
        }
        let intent = self.pending.pop_front()?;
        self.outstanding = Some(intent);
        Some(intent)
    }

    /// Head of the queue without emitting it
    pub fn peek(&self) -> Option<&Intent> {
        if self.outstanding.is_some() {
            None
        } else {
            self.pending.front()
        }
    }

    /// Confirm completion of the outstanding intent
    pub fn advance(&mut self) {
        self.outstanding = None;
    }

    /// The intent currently in flight, if any
    pub fn outstanding(&self) -> Option<&Intent> {
        self.outstanding.as_ref()
    }

    /// The in-flight intent (if any) followed by the pending ones
    pub fn intents(&self) -> impl Iterator<Item = &Intent> {
        self.outstanding.iter().chain(self.pending.iter())
    }

    /// Nothing in flight and nothing pending
    pub fn is_idle(&self) -> bool {
        self.outstanding.is_none() && self.pending.is_empty()
    }

    /// True if any in-flight or pending intent acts on `id`
    pub fn references(&self, id: ObjectId) -> bool {
        self.outstanding.map(|i| i.references(id)).unwrap_or(false)
            || self.pending.iter().any(|i| i.references(id))
    }

    /// All object ids the queue still intends to act on
    pub fn referenced_targets(&self) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut push = |intent: &Intent| match intent {
            Intent::Move(MoveTarget::Object(t))
            | Intent::Load(t)
            | Intent::Unload(t)
            | Intent::Turn(t)
            | Intent::Fire(t) => {
                if !out.contains(t) {
                    out.push(*t);
                }
            }
            _ => {}
        };
        if let Some(i) = &self.outstanding {
            push(i);
        }
        for i in &self.pending {
            push(i);
        }
        out
    }
}
