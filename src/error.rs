use thiserror::Error;

use crate::EpisodePhase;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnvError {
    #[error("Invalid action {0}: must be 0 (stick), 1 (hit) or 2 (double)")]
    InvalidAction(u8),
    #[error("{operation} is only allowed in {required} phase, current phase is {actual}")]
    PhaseNotAllowed {
        operation: &'static str,
        required: EpisodePhase,
        actual: EpisodePhase,
    },
    #[error("Shoe is empty")]
    EmptyShoe,
    #[error("Cannot sample from an empty action space")]
    EmptyActionSpace,
}
