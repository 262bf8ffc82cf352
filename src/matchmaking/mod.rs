pub mod queue;
pub mod rating;

pub use queue::{cancel, enqueue, finalize_pvp_match, run_pairing_pass, PairedMatch};
