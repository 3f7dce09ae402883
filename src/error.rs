//! Propagation error types

use crate::state::State;

/// Errors surfaced by a propagation call.
///
/// Step rejection inside the adaptive loop is normal control flow and is
/// never reported here; every variant below is fatal for the call that
/// raised it. Variants carry the last reached time and state where that
/// supports diagnostics or resumption by the caller.
#[derive(Debug, Clone)]
pub enum PropagationError {
    /// Position magnitude collapsed to zero during a vector-field evaluation
    /// (collision with the attracting body)
    Singularity { t: f64 },

    /// A velocity-aligned perturbation was evaluated at zero speed, where
    /// its direction is undefined
    ZeroVelocity { t: f64 },

    /// The adaptive step size underflowed while still failing tolerance
    NonConvergence { t: f64, state: State },

    /// Requested output times are not monotone in the direction of
    /// propagation; rejected before any integration work
    InvalidTimeGrid { index: usize, message: String },

    /// The configured ceiling on trial steps was reached; carries the
    /// trajectory assembled up to that point
    StepBudgetExceeded { t: f64, partial: Vec<State> },

    /// The initial state is unusable
    InvalidState { message: String },

    /// The tolerance or step configuration is unusable
    InvalidConfig { message: String },
}

impl std::fmt::Display for PropagationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Singularity { t } => {
                write!(f, "position magnitude collapsed to zero at t = {t}")
            }
            Self::ZeroVelocity { t } => {
                write!(
                    f,
                    "velocity magnitude is zero at t = {t}; thrust direction undefined"
                )
            }
            Self::NonConvergence { t, .. } => {
                write!(f, "step size underflowed at t = {t} without meeting tolerance")
            }
            Self::InvalidTimeGrid { index, message } => {
                write!(f, "invalid time grid at index {index}: {message}")
            }
            Self::StepBudgetExceeded { t, partial } => {
                write!(
                    f,
                    "step budget exceeded at t = {t} after {} checkpoints",
                    partial.len()
                )
            }
            Self::InvalidState { message } => {
                write!(f, "invalid initial state: {message}")
            }
            Self::InvalidConfig { message } => {
                write!(f, "invalid configuration: {message}")
            }
        }
    }
}

impl std::error::Error for PropagationError {}
