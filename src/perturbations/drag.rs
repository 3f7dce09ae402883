//! Atmospheric drag against an exponential density profile
//!
//! Computes `a = -½ ρ |v|² (Cd × A / m) v̂` with `ρ(h) = ρ₀ × exp(-h / H)`,
//! the simplest density model. All parameters share the caller's unit
//! system.

use super::Perturbation;
use crate::error::PropagationError;
use crate::state::State;
use nalgebra::Vector3;

/// Drag from an exponentially decaying, non-rotating atmosphere.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialDrag {
    /// Reference density at zero altitude
    pub rho0: f64,

    /// Density scale height
    pub scale_height: f64,

    /// Attractor radius defining zero altitude
    pub body_radius: f64,

    /// Ballistic term Cd × A / m
    pub cd_area_over_mass: f64,

    /// Altitude above which density is treated as zero
    pub max_altitude: f64,
}

impl ExponentialDrag {
    /// Create a drag model with no altitude cutoff
    pub fn new(rho0: f64, scale_height: f64, body_radius: f64, cd_area_over_mass: f64) -> Self {
        Self {
            rho0,
            scale_height,
            body_radius,
            cd_area_over_mass,
            max_altitude: f64::INFINITY,
        }
    }

    /// Set the altitude above which drag is skipped
    pub fn with_max_altitude(mut self, max_altitude: f64) -> Self {
        self.max_altitude = max_altitude;
        self
    }
}

impl Perturbation for ExponentialDrag {
    fn acceleration(
        &self,
        _t: f64,
        state: &State,
        _k: f64,
    ) -> Result<Vector3<f64>, PropagationError> {
        let altitude = state.radius() - self.body_radius;
        if altitude > self.max_altitude {
            return Ok(Vector3::zeros());
        }

        let rho = self.rho0 * (-altitude / self.scale_height).exp();

        // Drag vanishes with speed; the zero-speed limit is exactly zero
        let speed = state.speed();
        if speed == 0.0 {
            return Ok(Vector3::zeros());
        }

        // a = -½ ρ v² (Cd A / m) v̂ = -½ ρ v (Cd A / m) × velocity
        Ok(-0.5 * rho * speed * self.cd_area_over_mass * state.velocity)
    }

    fn name(&self) -> &'static str {
        "exponential drag"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_opposes_velocity() {
        let drag = ExponentialDrag::new(1e-5, 50.0, 6_378.137, 1e-3);
        let state = State::new(Vector3::new(6_678.0, 0.0, 0.0), Vector3::new(0.0, 7.73, 0.0));

        let accel = drag.acceleration(0.0, &state, 398_600.4418).unwrap();

        assert!(accel.y < 0.0);
        assert_eq!(accel.x, 0.0);
        assert!(accel.norm() > 0.0);
    }

    #[test]
    fn test_drag_decays_with_altitude() {
        let drag = ExponentialDrag::new(1e-5, 50.0, 6_378.137, 1e-3);
        let velocity = Vector3::new(0.0, 7.5, 0.0);

        let low = State::new(Vector3::new(6_678.0, 0.0, 0.0), velocity);
        let high = State::new(Vector3::new(6_978.0, 0.0, 0.0), velocity);

        let a_low = drag.acceleration(0.0, &low, 398_600.4418).unwrap();
        let a_high = drag.acceleration(0.0, &high, 398_600.4418).unwrap();

        assert!(a_low.norm() > a_high.norm());
    }

    #[test]
    fn test_drag_above_cutoff_is_zero() {
        let drag = ExponentialDrag::new(1e-5, 50.0, 6_378.137, 1e-3).with_max_altitude(1_000.0);
        let state = State::new(
            Vector3::new(6_378.137 + 2_000.0, 0.0, 0.0),
            Vector3::new(0.0, 7.0, 0.0),
        );

        let accel = drag.acceleration(0.0, &state, 398_600.4418).unwrap();
        assert_eq!(accel, Vector3::zeros());
    }
}
