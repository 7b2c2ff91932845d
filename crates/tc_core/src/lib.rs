//! # tc_core - Tactical Coordination Core
//!
//! Deterministic per-team strategy layer for a turn-based 2D arena game.
//! The host engine owns physics and rendering; this crate owns the
//! decisions: role assignment, claim-based target allocation, conflict-free
//! standoff positioning, and the per-agent action queues the engine drains.
//!
//! ## Features
//! - Fully deterministic: same snapshots and events, same commands
//! - Event-driven: one synchronous call per engine callback, no threads
//! - Claim conservation: a drainable target is never over-subscribed

pub mod engine;
pub mod error;

// Re-export the embedding surface
pub use engine::role_machine::{Role, RoleQuota, RoleState, Substate};
pub use engine::snapshot::WorldSnapshot;
pub use engine::team_context::{Command, EngineEvent, TeamContext};
pub use engine::types::{AgentView, ArenaSpec, BaseView, NodeKind, NodeView, ObjectId, TeamSide, WeaponSpec};
pub use error::{CoreError, Result};
