pub mod effective_stats;
pub mod lifecycle;
pub mod resolution;
pub mod rng;
pub mod state_machine;

pub use lifecycle::finalize_if_terminal;
pub use state_machine::{snapshot_participant, start_combat, submit_action, TURN_CAP};
