//! This is the documentation for the **lensray** software package, a sequential ray tracer for rotationally
//! symmetric and toric lens systems.
//!
//! An optical system is described by an ordered list of [`Surface`](surface::Surface)s separated by
//! [`Gap`](gap::Gap)s filled with homogeneous materials. Two independent models operate on this description:
//!
//!   - the real (skew) ray tracer in [`raytrace`], which intersects exact surface shapes and refracts rays
//!     following Snell's law.
//!   - the first-order [`ParaxialModel`](paraxial::ParaxialModel) based on ray-transfer matrices, which yields
//!     focal lengths, principal planes, aperture stop, pupils as well as marginal and chief rays.
//!
//! Systems are assembled with a [`SystemBuilder`], which can also be read from a YAML document.
//!
//! The library emits messages via the [`log`] crate but does not install a logger.
pub mod error;
pub mod fields;
pub mod gap;
pub mod optical_system;
pub mod paraxial;
pub mod pupil_sampling;
pub mod ray;
pub mod raytrace;
pub mod refractive_index;
pub mod sequential_model;
pub mod surface;
pub mod utils;

pub use optical_system::{OpticalSystem, SystemBuilder};
