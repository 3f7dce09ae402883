//! Orbital state representation
//!
//! Provides the position/velocity pair that flows through the propagator,
//! together with its flat 6-vector form used by the numerical integrator.
//!
//! All quantities are plain numbers in whatever consistent unit system the
//! caller chose (e.g. km and km/s with k in km³/s²). Unit bookkeeping is the
//! calling layer's responsibility.

use nalgebra::{Vector3, Vector6};

/// Position and velocity of a body relative to its attractor.
///
/// States are immutable units of data: every propagation step produces a new
/// `State` rather than mutating an existing one.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    /// Position relative to the attractor center
    pub position: Vector3<f64>,

    /// Velocity relative to the attractor center
    pub velocity: Vector3<f64>,
}

impl State {
    /// Create a new state
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>) -> Self {
        Self { position, velocity }
    }

    /// Rebuild a state from the integrator's flat 6-vector form
    pub fn from_vector(y: &Vector6<f64>) -> Self {
        Self {
            position: Vector3::new(y[0], y[1], y[2]),
            velocity: Vector3::new(y[3], y[4], y[5]),
        }
    }

    /// Flatten into the 6-vector form the integrator works on
    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        )
    }

    /// Distance from the attractor center
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Speed relative to the attractor center
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Specific orbital energy (vis-viva) for gravitational parameter `k`
    pub fn specific_energy(&self, k: f64) -> f64 {
        0.5 * self.velocity.norm_squared() - k / self.radius()
    }

    /// Semi-major axis for gravitational parameter `k` (negative for
    /// hyperbolic trajectories)
    pub fn semi_major_axis(&self, k: f64) -> f64 {
        -k / (2.0 * self.specific_energy(k))
    }

    /// Orbital period for gravitational parameter `k`
    ///
    /// Returns `None` for parabolic or hyperbolic trajectories.
    pub fn period(&self, k: f64) -> Option<f64> {
        let a = self.semi_major_axis(k);
        if a > 0.0 {
            Some(2.0 * std::f64::consts::PI * (a.powi(3) / k).sqrt())
        } else {
            None
        }
    }

    /// Whether every component is finite
    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|c| c.is_finite()) && self.velocity.iter().all(|c| c.is_finite())
    }
}
