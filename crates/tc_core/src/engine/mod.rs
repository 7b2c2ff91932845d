pub mod action_queue;
pub mod constants;
pub mod geometry;
pub mod ledger;
pub mod position_solver;
pub mod role_machine;
pub mod snapshot;
pub mod team_context;
pub mod types;
