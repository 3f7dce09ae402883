//! Propagation driver
//!
//! Orchestrates the adaptive integrator to satisfy a grid of requested
//! output times and assembles the resulting trajectory.

use crate::dynamics::{TwoBodyDynamics, COLLISION_RADIUS_FACTOR};
use crate::error::PropagationError;
use crate::integrator::{Rk45, Step};
use crate::perturbations::Perturbation;
use crate::state::State;
use nalgebra::Vector6;

/// Tolerance and step configuration for a propagation call.
///
/// Validated once at call entry; integration never starts with an unusable
/// configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropagatorConfig {
    /// Relative error tolerance per step
    pub rtol: f64,

    /// Absolute error tolerance per step
    pub atol: f64,

    /// Minimum allowed step size (0 = machine precision floor only)
    pub min_step: f64,

    /// Maximum allowed step size
    pub max_step: f64,

    /// Ceiling on trial steps (accepted and rejected) per call
    pub max_steps: usize,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-10,
            atol: 1e-12,
            min_step: 0.0,
            max_step: f64::INFINITY,
            max_steps: 1_000_000,
        }
    }
}

impl PropagatorConfig {
    /// Quick propagation settings (lower accuracy, fewer steps)
    pub fn fast() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-8,
            max_steps: 100_000,
            ..Default::default()
        }
    }

    /// High-precision settings
    pub fn high_precision() -> Self {
        Self {
            rtol: 1e-12,
            atol: 1e-13,
            max_steps: 10_000_000,
            ..Default::default()
        }
    }

    /// Check the configuration for usability
    pub fn validate(&self) -> Result<(), PropagationError> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(PropagationError::InvalidConfig {
                message: format!("rtol must be positive and finite, got {}", self.rtol),
            });
        }
        if !self.atol.is_finite() || self.atol < 0.0 {
            return Err(PropagationError::InvalidConfig {
                message: format!("atol must be non-negative and finite, got {}", self.atol),
            });
        }
        if !self.min_step.is_finite() || self.min_step < 0.0 {
            return Err(PropagationError::InvalidConfig {
                message: format!("min_step must be non-negative and finite, got {}", self.min_step),
            });
        }
        if !(self.max_step > self.min_step) {
            return Err(PropagationError::InvalidConfig {
                message: format!(
                    "max_step ({}) must exceed min_step ({})",
                    self.max_step, self.min_step
                ),
            });
        }
        if self.max_steps == 0 {
            return Err(PropagationError::InvalidConfig {
                message: "max_steps must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Numerical orbit propagator for one attractor.
///
/// Owns the gravitational parameter and the tolerance configuration; each
/// [`propagate`](Propagator::propagate) call runs an independent
/// integration with no state shared across calls.
pub struct Propagator {
    k: f64,
    config: PropagatorConfig,
}

impl Propagator {
    /// Create a propagator with default tolerances for gravitational
    /// parameter `k`
    pub fn new(k: f64) -> Self {
        Self {
            k,
            config: PropagatorConfig::default(),
        }
    }

    /// Create with a custom configuration
    pub fn with_config(k: f64, config: PropagatorConfig) -> Self {
        Self { k, config }
    }

    /// Get configuration reference
    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    /// Compute the state at every requested time offset.
    ///
    /// `time_grid` entries are offsets from the epoch of `state0` and must
    /// be monotone in the direction of propagation: non-decreasing for a
    /// forward grid, non-increasing for a grid that descends from zero
    /// (backward propagation). A requested time equal to the current
    /// integration frontier, in particular 0, returns the frontier state
    /// without any integration work.
    ///
    /// The returned trajectory has exactly one state per grid entry, in
    /// grid order.
    pub fn propagate(
        &self,
        state0: &State,
        time_grid: &[f64],
        perturbation: &dyn Perturbation,
    ) -> Result<Vec<State>, PropagationError> {
        self.config.validate()?;
        if !self.k.is_finite() || self.k <= 0.0 {
            return Err(PropagationError::InvalidConfig {
                message: format!("gravitational parameter must be positive and finite, got {}", self.k),
            });
        }
        if !state0.is_finite() {
            return Err(PropagationError::InvalidState {
                message: "initial state has non-finite components".to_string(),
            });
        }
        if state0.radius() == 0.0 {
            return Err(PropagationError::InvalidState {
                message: "initial position magnitude is zero".to_string(),
            });
        }
        let direction = grid_direction(time_grid)?;

        let mut trajectory = Vec::with_capacity(time_grid.len());
        let Some(&t_end) = time_grid.last() else {
            return Ok(trajectory);
        };

        log::debug!(
            "propagating {} checkpoints over [0, {t_end}] with rtol={:.1e}, atol={:.1e}",
            time_grid.len(),
            self.config.rtol,
            self.config.atol
        );

        let dynamics = TwoBodyDynamics::new(
            self.k,
            state0.radius() * COLLISION_RADIUS_FACTOR,
            perturbation,
        );
        let field = |t: f64, y: &Vector6<f64>| dynamics.derivative(t, y);
        let integrator = Rk45::from_config(&self.config);

        // Integration frontier
        let mut t = 0.0;
        let mut y = state0.to_vector();
        let mut f_frontier: Option<Vector6<f64>> = None;
        let mut h_abs: Option<f64> = None;
        let mut last_step: Option<Step> = None;
        let mut steps_taken = 0usize;

        for &t_req in time_grid {
            while direction * (t_req - t) > 0.0 {
                let f_t = match f_frontier {
                    Some(v) => v,
                    None => field(t, &y)?,
                };
                let h_guess = match h_abs {
                    Some(h) => h,
                    None => integrator.initial_step(t, &y, &f_t, direction, &field)?,
                };
                if steps_taken >= self.config.max_steps {
                    return Err(PropagationError::StepBudgetExceeded {
                        t,
                        partial: trajectory,
                    });
                }

                let outcome = match integrator.adaptive_step(
                    t,
                    &y,
                    &f_t,
                    h_guess,
                    direction,
                    t_end,
                    self.config.max_steps - steps_taken,
                    &field,
                ) {
                    Ok(outcome) => outcome,
                    Err(PropagationError::StepBudgetExceeded { t: t_hit, .. }) => {
                        return Err(PropagationError::StepBudgetExceeded {
                            t: t_hit,
                            partial: trajectory,
                        });
                    }
                    Err(e) => return Err(e),
                };

                steps_taken += outcome.trials;
                t = outcome.step.t_end;
                y = outcome.step.y_end;
                f_frontier = Some(outcome.step.f_end);
                h_abs = Some(outcome.h_next);
                last_step = Some(outcome.step);
            }

            // A checkpoint behind the frontier always lies inside the last
            // accepted step; the frontier itself is served directly.
            match &last_step {
                Some(step) if t_req != t => {
                    trajectory.push(State::from_vector(&step.interpolate(t_req)));
                }
                _ => trajectory.push(State::from_vector(&y)),
            }
        }

        log::debug!("propagation complete after {steps_taken} trial steps");
        Ok(trajectory)
    }
}

/// Propagate `state0` through `time_grid` under gravitational parameter `k`
/// and the given perturbing acceleration.
///
/// Convenience wrapper over [`Propagator`]; returns one state per entry of
/// `time_grid`, in grid order.
pub fn propagate(
    state0: &State,
    k: f64,
    time_grid: &[f64],
    config: &PropagatorConfig,
    perturbation: &dyn Perturbation,
) -> Result<Vec<State>, PropagationError> {
    Propagator::with_config(k, config.clone()).propagate(state0, time_grid, perturbation)
}

/// Validate grid ordering and infer the direction of propagation.
///
/// The first entry differing from zero sets the direction; every later
/// entry must keep the grid monotone in that direction. A grid of zeros is
/// trivially forward.
fn grid_direction(time_grid: &[f64]) -> Result<f64, PropagationError> {
    let mut direction = 0.0;
    let mut prev = 0.0;
    for (index, &t) in time_grid.iter().enumerate() {
        if !t.is_finite() {
            return Err(PropagationError::InvalidTimeGrid {
                index,
                message: format!("time {t} is not finite"),
            });
        }
        if direction == 0.0 && t != 0.0 {
            direction = t.signum();
        }
        if direction * (t - prev) < 0.0 {
            return Err(PropagationError::InvalidTimeGrid {
                index,
                message: format!(
                    "time {t} breaks {} ordering",
                    if direction > 0.0 {
                        "non-decreasing"
                    } else {
                        "non-increasing"
                    }
                ),
            });
        }
        prev = t;
    }
    Ok(if direction == 0.0 { 1.0 } else { direction })
}
