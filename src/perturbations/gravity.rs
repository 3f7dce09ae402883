//! Attractor oblateness perturbation

use super::Perturbation;
use crate::error::PropagationError;
use crate::state::State;
use nalgebra::Vector3;

/// J2 zonal harmonic perturbation, the dominant non-spherical gravity term
/// for oblate attractors.
///
/// Uses the standard J2 formula in Cartesian coordinates. The J2
/// coefficient and the attractor's equatorial radius are captured at
/// construction and must share the caller's unit system (e.g. for Earth in
/// kilometres, `J2Perturbation::new(1.08263e-3, 6378.137)`).
#[derive(Debug, Clone, Copy)]
pub struct J2Perturbation {
    j2: f64,
    body_radius: f64,
}

impl J2Perturbation {
    /// Create a J2 perturbation for the given coefficient and equatorial
    /// radius
    pub fn new(j2: f64, body_radius: f64) -> Self {
        Self { j2, body_radius }
    }
}

impl Perturbation for J2Perturbation {
    fn acceleration(
        &self,
        _t: f64,
        state: &State,
        k: f64,
    ) -> Result<Vector3<f64>, PropagationError> {
        let x = state.position.x;
        let y = state.position.y;
        let z = state.position.z;
        let r = state.radius();

        let r2 = r * r;
        let r5 = r2 * r2 * r;
        let re2 = self.body_radius * self.body_radius;

        // Common factor: (3/2) × J2 × k × Re² / r⁵
        let factor = 1.5 * self.j2 * k * re2 / r5;
        let z2_r2 = (z * z) / r2;

        Ok(Vector3::new(
            factor * x * (5.0 * z2_r2 - 1.0),
            factor * y * (5.0 * z2_r2 - 1.0),
            factor * z * (5.0 * z2_r2 - 3.0),
        ))
    }

    fn name(&self) -> &'static str {
        "J2"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU_EARTH: f64 = 398_600.4418; // km³/s²
    const EARTH_J2: f64 = 1.08263e-3;
    const EARTH_RADIUS_KM: f64 = 6_378.137;

    #[test]
    fn test_j2_pulls_toward_equator() {
        let j2 = J2Perturbation::new(EARTH_J2, EARTH_RADIUS_KM);

        // 45° latitude position: z²/r² = 0.5
        let r = 6_778.0;
        let state = State::new(
            Vector3::new(r * 0.707, 0.0, r * 0.707),
            Vector3::new(0.0, 7.66, 0.0),
        );

        let accel = j2.acceleration(0.0, &state, MU_EARTH).unwrap();

        // Northern hemisphere: out-of-plane component points south
        assert!(accel.z < 0.0);

        // Small compared to the central term
        let central = MU_EARTH / (r * r);
        assert!(accel.norm() < 1e-2 * central);
        assert!(accel.norm() > 1e-5 * central);
    }

    #[test]
    fn test_j2_equatorial_is_radial() {
        let j2 = J2Perturbation::new(EARTH_J2, EARTH_RADIUS_KM);
        let state = State::new(Vector3::new(6_778.0, 0.0, 0.0), Vector3::new(0.0, 7.66, 0.0));

        let accel = j2.acceleration(0.0, &state, MU_EARTH).unwrap();

        // In the equatorial plane J2 strengthens the inward pull
        assert!(accel.x < 0.0);
        assert_eq!(accel.y, 0.0);
        assert_eq!(accel.z, 0.0);
    }
}
