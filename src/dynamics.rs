//! Equation of motion for perturbed two-body flight
//!
//! Maps the flat state vector `[r, v]` to its time derivative `[v, a]`,
//! where the acceleration combines the central `-k·r/|r|³` term with an
//! injected perturbing acceleration.

use crate::error::PropagationError;
use crate::perturbations::Perturbation;
use crate::state::State;
use nalgebra::Vector6;

/// Fraction of the initial radius below which the central term is treated
/// as a collision with the attracting body. Relative rather than absolute
/// because the unit system is the caller's.
pub(crate) const COLLISION_RADIUS_FACTOR: f64 = 1e-8;

/// Two-body vector field with a pluggable perturbing acceleration.
///
/// Evaluation is deterministic and side-effect free; identical inputs
/// always produce identical derivatives.
pub struct TwoBodyDynamics<'a> {
    k: f64,
    collision_radius: f64,
    perturbation: &'a dyn Perturbation,
}

impl<'a> TwoBodyDynamics<'a> {
    /// Create a vector field for gravitational parameter `k`.
    ///
    /// `collision_radius` is the radius at or below which evaluation fails
    /// with [`PropagationError::Singularity`] instead of emitting non-finite
    /// values.
    pub fn new(k: f64, collision_radius: f64, perturbation: &'a dyn Perturbation) -> Self {
        Self {
            k,
            collision_radius,
            perturbation,
        }
    }

    /// Evaluate the derivative at `(t, y)`.
    pub fn derivative(&self, t: f64, y: &Vector6<f64>) -> Result<Vector6<f64>, PropagationError> {
        let state = State::from_vector(y);
        let r = state.radius();
        if r <= self.collision_radius {
            return Err(PropagationError::Singularity { t });
        }

        let r3 = r * r * r;
        let accel =
            -self.k / r3 * state.position + self.perturbation.acceleration(t, &state, self.k)?;

        Ok(Vector6::new(
            state.velocity.x,
            state.velocity.y,
            state.velocity.z,
            accel.x,
            accel.y,
            accel.z,
        ))
    }
}
