mod cardcount;
mod error;
pub mod simulation;
pub mod spaces;

use serde_enum_str::{Deserialize_enum_str, Serialize_enum_str};
use strum_macros::{Display, EnumIter};

pub use cardcount::CardCount;
pub use error::EnvError;
pub use simulation::{
    count::{card_weight, RunningCount},
    hand::{compare, has_usable_ace, hand_value, is_bust, is_natural, score, Hand},
    shoe::{Shoe, DECK_TEMPLATE, RESHUFFLE_THRESHOLD},
    BlackjackCountingEnv, Observation,
};
pub use spaces::{ActionSpace, Environment, ObservationSpace, StepResult, COUNT_SIGNAL_OFFSET};

/// Payout toggles fixed at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rule {
    /// Legacy bonus: a winning natural pays 1.5 instead of 1.
    pub natural: bool,
    /// Sutton & Barto rule: a natural against a non-natural dealer always wins 1.
    /// Takes precedence over `natural`.
    pub sab: bool,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize_enum_str, Deserialize_enum_str,
)]
pub enum Action {
    Stick,
    Hit,
    Double,
}

impl Action {
    pub const COUNT: u8 = 3;

    pub fn index(self) -> u8 {
        match self {
            Action::Stick => 0,
            Action::Hit => 1,
            Action::Double => 2,
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = EnvError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Stick),
            1 => Ok(Action::Hit),
            2 => Ok(Action::Double),
            _ => Err(EnvError::InvalidAction(value)),
        }
    }
}

impl From<Action> for u8 {
    fn from(action: Action) -> u8 {
        action.index()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
pub enum EpisodePhase {
    /// Constructed or hard-reset; no cards have been dealt yet.
    #[default]
    NotStarted,
    AwaitingAction,
    Terminal,
}
