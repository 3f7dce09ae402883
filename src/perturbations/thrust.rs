//! Constant thrust along the flight direction

use super::Perturbation;
use crate::error::PropagationError;
use crate::state::State;
use nalgebra::Vector3;

/// Constant-magnitude acceleration along the instantaneous velocity
/// direction, the canonical low-thrust spiral model.
///
/// The magnitude is captured at construction; evaluation stays a pure
/// function of the state. The direction is undefined at zero speed, so that
/// case fails with [`PropagationError::ZeroVelocity`] instead of dividing
/// by zero.
#[derive(Debug, Clone, Copy)]
pub struct ConstantThrust {
    magnitude: f64,
}

impl ConstantThrust {
    /// Create a thrust of the given acceleration magnitude
    pub fn new(magnitude: f64) -> Self {
        Self { magnitude }
    }

    /// Acceleration magnitude
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }
}

impl Perturbation for ConstantThrust {
    fn acceleration(
        &self,
        t: f64,
        state: &State,
        _k: f64,
    ) -> Result<Vector3<f64>, PropagationError> {
        let speed = state.speed();
        if speed == 0.0 {
            return Err(PropagationError::ZeroVelocity { t });
        }
        Ok(self.magnitude / speed * state.velocity)
    }

    fn name(&self) -> &'static str {
        "constant thrust"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thrust_along_velocity() {
        let thrust = ConstantThrust::new(1e-7);
        let state = State::new(Vector3::new(6_878.0, 0.0, 0.0), Vector3::new(0.0, 7.61, 0.0));

        let accel = thrust.acceleration(0.0, &state, 398_600.4418).unwrap();

        // Magnitude preserved, direction along velocity
        assert!((accel.norm() - 1e-7).abs() < 1e-20);
        assert_eq!(accel.x, 0.0);
        assert!(accel.y > 0.0);
    }

    #[test]
    fn test_zero_velocity_fails() {
        let thrust = ConstantThrust::new(1e-7);
        let state = State::new(Vector3::new(6_878.0, 0.0, 0.0), Vector3::zeros());

        let result = thrust.acceleration(10.0, &state, 398_600.4418);
        assert!(matches!(
            result,
            Err(PropagationError::ZeroVelocity { t }) if t == 10.0
        ));
    }
}
