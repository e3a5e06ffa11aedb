use std::fmt;

use keepsake_core::CardState;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Upper bound on misses a random player will make at one gate.
const RANDOM_MAX_MISSES: u32 = 8;

/// Which passphrase a player is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Outer,
    Gift(usize),
}

/// What a policy can see when asked for a passphrase.
#[derive(Debug, Clone, Copy)]
pub struct GateView<'a> {
    pub kind: GateKind,
    pub expected: &'a str,
    pub chances_remaining: u8,
    pub misses: u32,
}

/// Policy interface for automated playthroughs.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Answer the yes/no question on `card`.
    fn answer(&mut self, card: CardState) -> bool;

    /// Type something into the passphrase box.
    fn guess(&mut self, gate: &GateView<'_>) -> String;

    /// Whether to open an image on the gallery page.
    fn browse_gallery(&mut self) -> bool {
        false
    }
}

/// Built-in player behaviours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Says yes and knows every code.
    Perfect,
    /// Knows every code but fumbles the first attempt and the casing.
    Clumsy,
    /// Refuses twice, then burns one full set of chances at every gate.
    Stubborn,
    /// Never says yes.
    Refuser,
    /// Seeded random answers and misses.
    Random,
}

impl GameplayStrategy {
    #[cfg(test)]
    pub const ALL: [Self; 5] = [
        Self::Perfect,
        Self::Clumsy,
        Self::Stubborn,
        Self::Refuser,
        Self::Random,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Perfect => "Perfect",
            Self::Clumsy => "Clumsy",
            Self::Stubborn => "Stubborn",
            Self::Refuser => "Refuser",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Perfect => Box::new(PerfectPolicy),
            Self::Clumsy => Box::new(ClumsyPolicy),
            Self::Stubborn => Box::new(StubbornPolicy::default()),
            Self::Refuser => Box::new(RefuserPolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct PerfectPolicy;
struct ClumsyPolicy;
struct RefuserPolicy;

#[derive(Default)]
struct StubbornPolicy {
    refusals: u32,
}

struct RandomPolicy {
    rng: ChaCha20Rng,
    planned_misses: Option<u32>,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            planned_misses: None,
        }
    }
}

impl PlayerPolicy for PerfectPolicy {
    fn name(&self) -> &'static str {
        "Perfect"
    }

    fn answer(&mut self, card: CardState) -> bool {
        // On "are you sure?" a false answer returns to the main question.
        card == CardState::MainQuestion
    }

    fn guess(&mut self, gate: &GateView<'_>) -> String {
        gate.expected.to_string()
    }

    fn browse_gallery(&mut self) -> bool {
        true
    }
}

impl PlayerPolicy for ClumsyPolicy {
    fn name(&self) -> &'static str {
        "Clumsy"
    }

    fn answer(&mut self, card: CardState) -> bool {
        card == CardState::MainQuestion
    }

    fn guess(&mut self, gate: &GateView<'_>) -> String {
        if gate.misses == 0 {
            format!("{} ", gate.expected)
        } else {
            gate.expected.to_uppercase()
        }
    }
}

impl PlayerPolicy for StubbornPolicy {
    fn name(&self) -> &'static str {
        "Stubborn"
    }

    fn answer(&mut self, card: CardState) -> bool {
        match card {
            CardState::MainQuestion if self.refusals < 2 => {
                self.refusals += 1;
                false
            }
            CardState::MainQuestion | CardState::AreYouSure => true,
            _ => false,
        }
    }

    fn guess(&mut self, gate: &GateView<'_>) -> String {
        if gate.misses < 3 {
            wrong_guess(gate)
        } else {
            gate.expected.to_string()
        }
    }
}

impl PlayerPolicy for RefuserPolicy {
    fn name(&self) -> &'static str {
        "Refuser"
    }

    fn answer(&mut self, card: CardState) -> bool {
        card == CardState::AreYouSure
    }

    fn guess(&mut self, gate: &GateView<'_>) -> String {
        wrong_guess(gate)
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn answer(&mut self, card: CardState) -> bool {
        match card {
            CardState::MainQuestion => self.rng.gen_bool(0.6),
            _ => self.rng.gen_bool(0.5),
        }
    }

    fn guess(&mut self, gate: &GateView<'_>) -> String {
        let planned = match self.planned_misses {
            Some(planned) if gate.misses > 0 => planned,
            _ => {
                let planned = self.rng.gen_range(0..=RANDOM_MAX_MISSES);
                self.planned_misses = Some(planned);
                planned
            }
        };
        if gate.misses < planned {
            return wrong_guess(gate);
        }
        self.planned_misses = None;
        gate.expected
            .chars()
            .map(|ch| {
                if self.rng.gen_bool(0.5) {
                    ch.to_uppercase().collect::<String>()
                } else {
                    ch.to_lowercase().collect::<String>()
                }
            })
            .collect()
    }

    fn browse_gallery(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

fn wrong_guess(gate: &GateView<'_>) -> String {
    format!("{}#miss{}", gate.expected, gate.misses)
}
