//! Perturbing accelerations beyond the central two-body term
//!
//! # Architecture
//!
//! Each provider implements the [`Perturbation`] trait, which computes an
//! acceleration contribution at a given time and state. Providers are
//! supplied to the propagator as plain values; there is no registry.
//!
//! Multiple providers are combined with [`CompositePerturbation`], which
//! sums all contributions. Plain closures of the right shape are accepted
//! directly.
//!
//! # Available providers
//!
//! - [`NoPerturbation`]: zero acceleration (pure two-body motion)
//! - [`ConstantThrust`]: fixed magnitude along the velocity direction
//! - [`J2Perturbation`]: attractor oblateness
//! - [`ExponentialDrag`]: drag against an exponentially decaying atmosphere

mod drag;
mod gravity;
mod thrust;

pub use drag::ExponentialDrag;
pub use gravity::J2Perturbation;
pub use thrust::ConstantThrust;

use crate::error::PropagationError;
use crate::state::State;
use nalgebra::Vector3;

/// Trait for perturbing-acceleration providers.
///
/// Implementations must be pure functions of `(t, state, k)`: any bound
/// parameters are captured at construction and never mutated afterwards, so
/// repeated evaluation at the same arguments yields the same acceleration.
/// The integrator's error estimation relies on this.
///
/// # Thread safety
///
/// Providers must be `Send + Sync` so independent propagations can run on
/// separate threads.
pub trait Perturbation: Send + Sync {
    /// Acceleration contribution at time `t` for the given state and
    /// gravitational parameter, in the caller's unit system
    fn acceleration(&self, t: f64, state: &State, k: f64)
        -> Result<Vector3<f64>, PropagationError>;

    /// Provider name for logging
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Pure two-body motion: no perturbing acceleration at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPerturbation;

impl Perturbation for NoPerturbation {
    fn acceleration(
        &self,
        _t: f64,
        _state: &State,
        _k: f64,
    ) -> Result<Vector3<f64>, PropagationError> {
        Ok(Vector3::zeros())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Plain closures are accepted as providers.
impl<F> Perturbation for F
where
    F: Fn(f64, &State, f64) -> Result<Vector3<f64>, PropagationError> + Send + Sync,
{
    fn acceleration(
        &self,
        t: f64,
        state: &State,
        k: f64,
    ) -> Result<Vector3<f64>, PropagationError> {
        self(t, state, k)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Sums the contributions of an arbitrary set of providers.
pub struct CompositePerturbation {
    providers: Vec<Box<dyn Perturbation>>,
}

impl Default for CompositePerturbation {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositePerturbation {
    /// Create an empty composite (equivalent to [`NoPerturbation`])
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider to the composite
    pub fn add(&mut self, provider: Box<dyn Perturbation>) {
        log::debug!("adding perturbation: {}", provider.name());
        self.providers.push(provider);
    }

    /// Number of providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Perturbation for CompositePerturbation {
    fn acceleration(
        &self,
        t: f64,
        state: &State,
        k: f64,
    ) -> Result<Vector3<f64>, PropagationError> {
        let mut total = Vector3::zeros();
        for provider in &self.providers {
            total += provider.acceleration(t, state, k)?;
        }
        Ok(total)
    }

    fn name(&self) -> &'static str {
        "composite"
    }
}
