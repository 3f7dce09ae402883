//! Adaptive Runge-Kutta integration with dense output
//!
//! Implements the Dormand-Prince 5(4) embedded pair. Each trial step
//! evaluates seven stages (six fresh evaluations, since the last stage of
//! an accepted step is the first stage of the next) and forms a fifth-order
//! solution together with a fourth-order companion; their difference is the
//! local error estimate driving step-size control.
//!
//! Accepted steps carry the coefficients of the standard quartic
//! interpolant, so the solution can be evaluated at any time inside the
//! step without further vector-field work.

use crate::error::PropagationError;
use crate::propagator::PropagatorConfig;
use crate::state::State;
use nalgebra::Vector6;

/// A vector field evaluation: `(t, y) -> dy/dt`, fallible.
pub type VectorField<'a> =
    dyn Fn(f64, &Vector6<f64>) -> Result<Vector6<f64>, PropagationError> + 'a;

const DIM: usize = 6;
const STAGES: usize = 7;

// Dormand-Prince 5(4) tableau.
const C: [f64; STAGES] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0];

const A: [[f64; 6]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0, 0.0],
    [
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        0.0,
        0.0,
    ],
    [
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        0.0,
    ],
];

/// Fifth-order solution weights.
const B: [f64; 6] = [
    35.0 / 384.0,
    0.0,
    500.0 / 1113.0,
    125.0 / 192.0,
    -2187.0 / 6784.0,
    11.0 / 84.0,
];

/// Difference between the fifth- and fourth-order weights; dotted with the
/// stages this yields the local error estimate.
const E: [f64; STAGES] = [
    71.0 / 57600.0,
    0.0,
    -71.0 / 16695.0,
    71.0 / 1920.0,
    -17253.0 / 339200.0,
    22.0 / 525.0,
    -1.0 / 40.0,
];

/// Dense-output weights for the quartic interpolant.
const D: [f64; STAGES] = [
    -12715105075.0 / 11282082432.0,
    0.0,
    87487479700.0 / 32700410799.0,
    -10690763975.0 / 1880347072.0,
    701980252875.0 / 199316789632.0,
    -1453857185.0 / 822651844.0,
    69997945.0 / 29380423.0,
];

/// Exponent of the error norm in the step-size controller, 1/(order + 1)
/// for the fourth-order error estimate.
const ERROR_EXPONENT: f64 = -0.2;

/// One accepted integration step with its dense-output coefficients.
#[derive(Debug, Clone)]
pub struct Step {
    /// Step start time
    pub t_start: f64,

    /// Step end time
    pub t_end: f64,

    /// Signed step size actually taken
    pub h: f64,

    /// Scaled local error norm of the accepted trial (≤ 1)
    pub error: f64,

    /// State vector at the step end
    pub y_end: Vector6<f64>,

    /// Derivative at the step end, reusable as the next first stage
    pub f_end: Vector6<f64>,

    /// Interpolation coefficients
    cont: [Vector6<f64>; 5],
}

impl Step {
    /// Whether `t` lies within this step (inclusive of both endpoints)
    pub fn contains(&self, t: f64) -> bool {
        let theta = (t - self.t_start) / self.h;
        (0.0..=1.0).contains(&theta)
    }

    /// Evaluate the interpolant at a time inside the step.
    ///
    /// Exact at both endpoints; no vector-field evaluations.
    pub fn interpolate(&self, t: f64) -> Vector6<f64> {
        let theta = (t - self.t_start) / self.h;
        let theta1 = 1.0 - theta;
        self.cont[0]
            + theta
                * (self.cont[1]
                    + theta1 * (self.cont[2] + theta * (self.cont[3] + theta1 * self.cont[4])))
    }
}

/// Result of one adaptive advance: the accepted step, the suggested size
/// for the next one, and how many trials (accepted plus rejected) it cost.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub step: Step,
    pub h_next: f64,
    pub trials: usize,
}

/// Dormand-Prince 5(4) integrator with proportional step-size control.
#[derive(Debug, Clone)]
pub struct Rk45 {
    /// Relative error tolerance
    pub rtol: f64,

    /// Absolute error tolerance
    pub atol: f64,

    /// Minimum allowed step size
    pub min_step: f64,

    /// Maximum allowed step size
    pub max_step: f64,

    /// Safety factor for step size adjustment
    pub safety: f64,

    /// Maximum step growth factor
    pub max_growth: f64,

    /// Maximum step shrink factor
    pub max_shrink: f64,
}

impl Rk45 {
    /// Create with the given tolerances and unrestricted step bounds
    pub fn new(rtol: f64, atol: f64) -> Self {
        Self {
            rtol,
            atol,
            min_step: 0.0,
            max_step: f64::INFINITY,
            safety: 0.9,
            max_growth: 10.0,
            max_shrink: 0.2,
        }
    }

    /// Create from a propagation configuration
    pub fn from_config(config: &PropagatorConfig) -> Self {
        Self {
            min_step: config.min_step,
            max_step: config.max_step,
            ..Self::new(config.rtol, config.atol)
        }
    }

    /// Smallest usable step magnitude near time `t`
    fn step_floor(&self, t: f64) -> f64 {
        (10.0 * f64::EPSILON * t.abs()).max(self.min_step)
    }

    /// RMS of the componentwise error scaled by `atol + rtol·max(|y|, |y_new|)`
    fn error_norm(&self, err: &Vector6<f64>, y: &Vector6<f64>, y_new: &Vector6<f64>) -> f64 {
        let mut sum = 0.0;
        for n in 0..DIM {
            let scale = self.atol + self.rtol * y[n].abs().max(y_new[n].abs());
            let e = err[n] / scale;
            sum += e * e;
        }
        (sum / DIM as f64).sqrt()
    }

    /// Choose a starting step size from the initial state and derivative.
    ///
    /// The standard two-trial bootstrap: a first guess from the ratio of
    /// state to derivative magnitudes, refined with one probe evaluation
    /// estimating the local curvature.
    pub fn initial_step(
        &self,
        t0: f64,
        y0: &Vector6<f64>,
        f0: &Vector6<f64>,
        direction: f64,
        f: &VectorField,
    ) -> Result<f64, PropagationError> {
        let mut d0_sq = 0.0;
        let mut d1_sq = 0.0;
        for n in 0..DIM {
            let scale = self.atol + self.rtol * y0[n].abs();
            d0_sq += (y0[n] / scale).powi(2);
            d1_sq += (f0[n] / scale).powi(2);
        }
        let d0 = (d0_sq / DIM as f64).sqrt();
        let d1 = (d1_sq / DIM as f64).sqrt();

        let h0 = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };

        let y1 = *y0 + (h0 * direction) * *f0;
        let f1 = f(t0 + h0 * direction, &y1)?;

        let mut d2_sq = 0.0;
        for n in 0..DIM {
            let scale = self.atol + self.rtol * y0[n].abs();
            d2_sq += ((f1[n] - f0[n]) / scale).powi(2);
        }
        let d2 = (d2_sq / DIM as f64).sqrt() / h0;

        let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
            1e-6_f64.max(h0 * 1e-3)
        } else {
            (0.01 / d1.max(d2)).powf(-ERROR_EXPONENT)
        };

        Ok((100.0 * h0).min(h1).min(self.max_step))
    }

    /// Advance one accepted step from `(t, y)`, retrying with smaller sizes
    /// until the local error estimate meets tolerance.
    ///
    /// `f_start` must be the derivative at `(t, y)`. The step never crosses
    /// `t_limit`. Fails with [`PropagationError::NonConvergence`] when the
    /// step size underflows and with [`PropagationError::StepBudgetExceeded`]
    /// (empty partial trajectory; the driver owns the full one) when more
    /// than `max_trials` trials would be needed.
    #[allow(clippy::too_many_arguments)]
    pub fn adaptive_step(
        &self,
        t: f64,
        y: &Vector6<f64>,
        f_start: &Vector6<f64>,
        h_abs: f64,
        direction: f64,
        t_limit: f64,
        max_trials: usize,
        f: &VectorField,
    ) -> Result<StepOutcome, PropagationError> {
        let floor = self.step_floor(t);
        let mut h_abs = h_abs.min(self.max_step).max(floor);
        let mut rejected = false;
        let mut trials = 0usize;

        loop {
            if h_abs < floor {
                return Err(PropagationError::NonConvergence {
                    t,
                    state: State::from_vector(y),
                });
            }
            if trials >= max_trials {
                return Err(PropagationError::StepBudgetExceeded {
                    t,
                    partial: Vec::new(),
                });
            }
            trials += 1;

            let mut t_new = t + direction * h_abs;
            if direction * (t_new - t_limit) > 0.0 {
                t_new = t_limit;
            }
            let h = t_new - t;
            if h == 0.0 {
                return Err(PropagationError::NonConvergence {
                    t,
                    state: State::from_vector(y),
                });
            }

            let mut k = [Vector6::zeros(); STAGES];
            k[0] = *f_start;
            for i in 1..STAGES - 1 {
                let mut y_stage = *y;
                for j in 0..i {
                    y_stage += h * A[i][j] * k[j];
                }
                k[i] = f(t + C[i] * h, &y_stage)?;
            }

            let mut y_new = *y;
            for j in 0..STAGES - 1 {
                y_new += h * B[j] * k[j];
            }
            k[STAGES - 1] = f(t_new, &y_new)?;

            let mut err = Vector6::zeros();
            for j in 0..STAGES {
                err += E[j] * k[j];
            }
            err *= h;

            let error = self.error_norm(&err, y, &y_new);

            if error.is_finite() && error <= 1.0 {
                let factor = if error == 0.0 {
                    self.max_growth
                } else {
                    (self.safety * error.powf(ERROR_EXPONENT))
                        .clamp(self.max_shrink, self.max_growth)
                };
                // Never grow straight out of a rejection
                let factor = if rejected { factor.min(1.0) } else { factor };
                let h_next = (h_abs * factor).min(self.max_step);

                let dy = y_new - y;
                let bspl = h * k[0] - dy;
                let mut dense = Vector6::zeros();
                for j in 0..STAGES {
                    dense += D[j] * k[j];
                }
                let cont = [*y, dy, bspl, dy - h * k[STAGES - 1] - bspl, h * dense];

                return Ok(StepOutcome {
                    step: Step {
                        t_start: t,
                        t_end: t_new,
                        h,
                        error,
                        y_end: y_new,
                        f_end: k[STAGES - 1],
                        cont,
                    },
                    h_next,
                    trials,
                });
            }

            let factor = if error.is_finite() {
                (self.safety * error.powf(ERROR_EXPONENT)).max(self.max_shrink)
            } else {
                self.max_shrink
            };
            log::trace!(
                "step rejected at t = {t}: error norm {error:.3e}, h {h_abs:.3e} -> {:.3e}",
                h_abs * factor
            );
            h_abs *= factor;
            rejected = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use nalgebra::Vector3;

    const MU_EARTH: f64 = 398_600.4418; // km³/s²

    fn two_body(t: f64, y: &Vector6<f64>) -> Result<Vector6<f64>, PropagationError> {
        let state = State::from_vector(y);
        let r = state.radius();
        if r <= 1e-4 {
            return Err(PropagationError::Singularity { t });
        }
        let accel = -MU_EARTH / (r * r * r) * state.position;
        Ok(Vector6::new(
            state.velocity.x,
            state.velocity.y,
            state.velocity.z,
            accel.x,
            accel.y,
            accel.z,
        ))
    }

    #[test]
    fn test_step_preserves_circular_orbit() {
        let integrator = Rk45::new(1e-10, 1e-12);

        let r = 6_771.0;
        let v = (MU_EARTH / r).sqrt();
        let y = State::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0)).to_vector();
        let f0 = two_body(0.0, &y).unwrap();

        let outcome = integrator
            .adaptive_step(0.0, &y, &f0, 10.0, 1.0, f64::INFINITY, 1_000, &two_body)
            .unwrap();

        let new_state = State::from_vector(&outcome.step.y_end);
        assert!((new_state.radius() - r).abs() / r < 1e-9);
        assert!((new_state.speed() - v).abs() / v < 1e-9);
        assert!(outcome.step.error <= 1.0);
        assert!(outcome.h_next > 0.0);
    }

    #[test]
    fn test_initial_step_is_reasonable() {
        let integrator = Rk45::new(1e-10, 1e-12);

        let r = 6_771.0;
        let v = (MU_EARTH / r).sqrt();
        let y = State::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0)).to_vector();
        let f0 = two_body(0.0, &y).unwrap();

        let h = integrator.initial_step(0.0, &y, &f0, 1.0, &two_body).unwrap();

        // A sane fraction of the ~5550 s orbital period
        assert!(h.is_finite());
        assert!(h > 1e-3);
        assert!(h < 1_000.0);
    }

    #[test]
    fn test_dense_output_endpoints_and_linearity() {
        // Constant-derivative field: the solution is linear in time and the
        // interpolant must reproduce it exactly
        let c = Vector6::new(1.0, -2.0, 0.5, 0.0, 3.0, -1.0);
        let field = move |_t: f64, _y: &Vector6<f64>| -> Result<Vector6<f64>, PropagationError> {
            Ok(c)
        };

        let integrator = Rk45::new(1e-10, 1e-12);
        let y0 = Vector6::zeros();

        let outcome = integrator
            .adaptive_step(0.0, &y0, &c, 2.0, 1.0, 2.0, 1_000, &field)
            .unwrap();
        let step = outcome.step;
        assert_eq!(step.t_end, 2.0);

        let start = step.interpolate(step.t_start);
        let mid = step.interpolate(0.5 * (step.t_start + step.t_end));
        let end = step.interpolate(step.t_end);

        for n in 0..6 {
            assert!((start[n] - y0[n]).abs() < 1e-12);
            assert!((mid[n] - c[n]).abs() < 1e-12);
            assert!((end[n] - 2.0 * c[n]).abs() < 1e-12);
        }
        assert!(step.contains(1.0));
        assert!(!step.contains(2.5));
    }

    #[test]
    fn test_step_clamps_at_limit() {
        let integrator = Rk45::new(1e-10, 1e-12);

        let r = 6_771.0;
        let v = (MU_EARTH / r).sqrt();
        let y = State::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0)).to_vector();
        let f0 = two_body(0.0, &y).unwrap();

        let outcome = integrator
            .adaptive_step(0.0, &y, &f0, 100.0, 1.0, 1.5, 1_000, &two_body)
            .unwrap();

        assert_eq!(outcome.step.t_end, 1.5);
    }

    #[test]
    fn test_budget_of_zero_trials_fails() {
        let integrator = Rk45::new(1e-10, 1e-12);

        let r = 6_771.0;
        let v = (MU_EARTH / r).sqrt();
        let y = State::new(Vector3::new(r, 0.0, 0.0), Vector3::new(0.0, v, 0.0)).to_vector();
        let f0 = two_body(0.0, &y).unwrap();

        let result =
            integrator.adaptive_step(0.0, &y, &f0, 10.0, 1.0, f64::INFINITY, 0, &two_body);
        assert!(matches!(
            result,
            Err(PropagationError::StepBudgetExceeded { .. })
        ));
    }
}
