use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Single source of randomness for one turn. The seeded variant is keyed by
/// (encounter seed, turn number) so a recorded turn replays bit-for-bit; the
/// scripted variant feeds tests a fixed outcome tape.
#[derive(Debug, Clone)]
pub enum TurnRng {
    Scripted { outcomes: Vec<u8>, index: usize },
    Seeded { rng: StdRng },
}

impl TurnRng {
    pub fn scripted(outcomes: Vec<u8>) -> Self {
        TurnRng::Scripted { outcomes, index: 0 }
    }

    pub fn seeded(encounter_seed: u64, turn_number: u32) -> Self {
        let seed = encounter_seed ^ (turn_number as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        TurnRng::Seeded {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next percentage roll in 1..=100. A scripted tape that runs dry panics
    /// with the reason so the failing test names the roll it was missing.
    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        match self {
            TurnRng::Scripted { outcomes, index } => {
                if *index >= outcomes.len() {
                    panic!(
                        "TurnRng exhausted! Tried to get a value for: '{}'. Need more scripted values.",
                        reason
                    );
                }
                let outcome = outcomes[*index];

                #[cfg(test)]
                println!("[RNG] Consumed {} for: {}", outcome, reason);

                *index += 1;
                outcome
            }
            TurnRng::Seeded { rng } => rng.random_range(1..=100),
        }
    }

    /// Uniform index in 0..bound, used by the tie-break shuffle.
    pub fn next_index(&mut self, bound: usize, reason: &str) -> usize {
        debug_assert!(bound > 0);
        match self {
            TurnRng::Scripted { .. } => (self.next_outcome(reason) as usize - 1) % bound,
            TurnRng::Seeded { rng } => rng.random_range(0..bound),
        }
    }

    /// Fisher-Yates shuffle drawing every swap from this source.
    pub fn shuffle<T>(&mut self, items: &mut [T], reason: &str) {
        for i in (1..items.len()).rev() {
            let j = self.next_index(i + 1, reason);
            items.swap(i, j);
        }
    }
}
