//! Numerical two-body orbit propagation with pluggable perturbations
//!
//! This crate propagates the trajectory of a body around a central
//! attractor by direct numerical integration of the equation of motion
//! (Cowell's method), so that arbitrary perturbing accelerations such as
//! thrust, drag, or higher-order gravity can be included alongside the
//! central `-k·r/|r|³` term.
//!
//! # Architecture
//!
//! The crate is organized around small, composable pieces:
//!
//! - **State**: immutable position/velocity pair flowing through the system
//! - **Perturbation**: pluggable acceleration providers, supplied as plain
//!   values (trait objects or closures)
//! - **Integrator**: adaptive Dormand-Prince 5(4) with dense output
//! - **Propagator**: walks a grid of requested output times and assembles
//!   the trajectory
//!
//! Inputs and outputs are plain scalars and vectors in whatever consistent
//! unit system the caller chose; unit tagging and orbital-element
//! conversions belong to the calling layer.
//!
//! # Example
//!
//! ```ignore
//! use cowell::{propagate, PropagatorConfig, NoPerturbation, State};
//! use nalgebra::Vector3;
//!
//! // Circular low Earth orbit, km and km/s
//! let k = 398_600.4418; // km³/s²
//! let r = 6_778.137;
//! let state0 = State::new(
//!     Vector3::new(r, 0.0, 0.0),
//!     Vector3::new(0.0, (k / r).sqrt(), 0.0),
//! );
//!
//! let trajectory = propagate(
//!     &state0,
//!     k,
//!     &[0.0, 1_000.0, 2_000.0],
//!     &PropagatorConfig::default(),
//!     &NoPerturbation,
//! )?;
//! ```

pub mod dynamics;
pub mod error;
pub mod integrator;
pub mod perturbations;
pub mod propagator;
pub mod state;

// Re-export the public surface
pub use error::PropagationError;
pub use perturbations::{
    CompositePerturbation, ConstantThrust, ExponentialDrag, J2Perturbation, NoPerturbation,
    Perturbation,
};
pub use propagator::{propagate, Propagator, PropagatorConfig};
pub use state::State;
