//! Deterministic, replayable RNG for a single combat.
//!
//! Only `(seed, cursor)` is persisted on `CombatState` — both are plain
//! `u64`s, trivial to serialize into the CAS'd blob in C2. To resume
//! drawing at a given cursor we reseed and fast-forward, which keeps the
//! state representation simple at the cost of replaying up to ~200 draws
//! per action, cheap at this turn cap.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub fn seed_from(combat_id: &str, server_epoch: i64) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    combat_id.hash(&mut hasher);
    server_epoch.hash(&mut hasher);
    hasher.finish()
}

pub struct CombatRng {
    rng: ChaCha8Rng,
    pub cursor: u64,
}

impl CombatRng {
    /// Reconstructs the generator at `cursor` draws past `seed`.
    pub fn resume(seed: u64, cursor: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for _ in 0..cursor {
            let _: u64 = rng.gen();
        }
        Self { rng, cursor }
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        self.cursor += 1;
        self.rng.gen::<f64>()
    }

    pub fn next_bool(&mut self, probability: f64) -> bool {
        self.next_unit() < probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resuming_at_same_cursor_replays_identically() {
        let seed = seed_from("combat-1", 42);
        let mut a = CombatRng::resume(seed, 0);
        let seq_a: Vec<f64> = (0..5).map(|_| a.next_unit()).collect();

        let mut b = CombatRng::resume(seed, 0);
        let seq_b: Vec<f64> = (0..5).map(|_| b.next_unit()).collect();

        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn resuming_mid_stream_continues_the_same_sequence() {
        let seed = seed_from("combat-2", 7);
        let mut full = CombatRng::resume(seed, 0);
        let full_seq: Vec<f64> = (0..10).map(|_| full.next_unit()).collect();

        let mut resumed = CombatRng::resume(seed, 5);
        let tail: Vec<f64> = (0..5).map(|_| resumed.next_unit()).collect();

        assert_eq!(&full_seq[5..10], tail.as_slice());
    }
}
