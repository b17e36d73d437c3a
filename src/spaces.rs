//! The capability contract shared by step/reset environments, and the
//! description of what they accept and emit.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;

use crate::{Action, EnvError, Observation};

/// A sequential environment driven by one caller through reset/step.
pub trait Environment {
    type Action;
    type Observation;
    type Error;

    /// Starts a new episode and returns its first observation.
    fn reset(&mut self) -> Result<Self::Observation, Self::Error>;

    /// Applies the action to the running episode.
    fn step(
        &mut self,
        action: Self::Action,
    ) -> Result<StepResult<Self::Observation>, Self::Error>;

    fn action_space(&self) -> ActionSpace;

    fn observation_space(&self) -> ObservationSpace;
}

/// What one transition produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult<O> {
    pub observation: O,
    pub reward: f64,
    pub done: bool,
    /// Always empty for now.
    pub info: HashMap<String, f64>,
}

/// Discrete actions `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionSpace {
    pub n: u8,
}

impl ActionSpace {
    pub fn contains(&self, action: u8) -> bool {
        action < self.n
    }

    /// Picks an action uniformly from `0..n`.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<Action, EnvError> {
        if self.n == 0 {
            return Err(EnvError::EmptyActionSpace);
        }
        Action::try_from(rng.gen_range(0..self.n))
    }
}

impl Default for ActionSpace {
    fn default() -> Self {
        ActionSpace { n: Action::COUNT }
    }
}

/// Inclusive bounds of every observation field.
///
/// The count signal is signed. `Observation::count_index` shifts it by
/// `COUNT_SIGNAL_OFFSET` into `0..=92` for consumers that need a
/// non-negative discrete slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationSpace {
    pub player_sum: (u16, u16),
    pub dealer_up_card: (u8, u8),
    pub count_signal: (i32, i32),
}

pub const COUNT_SIGNAL_OFFSET: i32 = 46;

impl ObservationSpace {
    pub fn contains(&self, observation: &Observation) -> bool {
        in_range(observation.player_sum, self.player_sum)
            && in_range(observation.dealer_up_card, self.dealer_up_card)
            && in_range(observation.count_signal, self.count_signal)
    }

    /// Number of distinct values of each field, in observation order.
    pub fn cardinalities(&self) -> [usize; 5] {
        [
            (self.player_sum.1 - self.player_sum.0 + 1) as usize,
            (self.dealer_up_card.1 - self.dealer_up_card.0 + 1) as usize,
            2,
            2,
            (self.count_signal.1 - self.count_signal.0 + 1) as usize,
        ]
    }
}

fn in_range<T: PartialOrd>(value: T, (lo, hi): (T, T)) -> bool {
    lo <= value && value <= hi
}

impl Default for ObservationSpace {
    fn default() -> Self {
        ObservationSpace {
            player_sum: (0, 31),
            dealer_up_card: (0, 10),
            count_signal: (-COUNT_SIGNAL_OFFSET, COUNT_SIGNAL_OFFSET),
        }
    }
}
