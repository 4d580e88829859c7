#![warn(missing_docs)]
//! Module for handling optical surfaces
//!
//! A sequential model consists of [`Surface`]s. The first one is always an [`Surface::Object`], the last one an
//! [`Surface::Image`]. In between, refracting [`Conic`] or [`Toric`] surfaces and reflecting [`Surface::Mirror`]s
//! are placed.
//!
//! All geometric calculations of a surface are done in its local frame: the vertex of the surface is located at the
//! origin and the optical axis is the z axis. [`Surface::calc_intersect_and_normal`] handles the shift of a
//! [`Ray`] into this frame.
//!
//! ## Example
//!
//! ```rust
//! use lensray::{millimeter, surface::Surface};
//!
//! let surface = Surface::conic(millimeter!(25.8), 0.0, millimeter!(12.5)).unwrap();
//! assert_eq!(surface.semi_diameter(), millimeter!(12.5));
//! assert!(Surface::conic(millimeter!(25.8), 0.0, millimeter!(-1.0)).is_err());
//! ```
mod conic;
mod plane;
mod toric;

pub use conic::Conic;
pub use plane::Plane;
pub use toric::Toric;

use crate::{error::LensResult, meter, ray::Ray};
use nalgebra::{Point3, Vector3};
use num::Zero;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// Relative tolerance of the clear aperture check, absorbing rounding errors of rays passing exactly through the
/// rim.
const CLIP_TOLERANCE: f64 = 1e-12;

/// Trait for handling the geometry of refracting surfaces.
///
/// All functions work in the local frame of the surface (vertex at origin, optical axis along z).
pub trait GeoSurface {
    /// Returns the sag (axial displacement from the vertex plane) at the given transverse position.
    ///
    /// All values are given in SI base units (meter). `NaN` is returned if the position lies outside the domain
    /// of the surface function.
    fn sag(&self, x: f64, y: f64) -> f64;
    /// Calculate intersection point and its normal vector of a [`Ray`] with a [`GeoSurface`].
    ///
    /// The ray is expected in the local frame of the surface. The returned normal vector is normalized and points
    /// against the propagation direction of the ray. This function returns `None` if the ray does not intersect
    /// with the surface in forward direction.
    fn calc_intersect_and_normal_do(&self, ray: &Ray) -> Option<(Point3<Length>, Vector3<f64>)>;
    /// Returns the semi-diameter (clear aperture radius) of this [`GeoSurface`].
    fn semi_diameter(&self) -> Length;
}

/// The surfaces of a sequential optical system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, strum::Display)]
pub enum Surface {
    /// The object plane. Infinitely extended, flat and non-refracting.
    Object,
    /// The image plane. Infinitely extended, flat and non-refracting.
    Image,
    /// A rotationally symmetric conic surface.
    Conic(Conic),
    /// An anamorphic surface with different radii of curvature in the x-z and y-z meridians.
    Toric(Toric),
    /// A reflecting conic surface.
    ///
    /// Sequential models are unfolded at mirrors: behind a mirror the optical axis is flipped, so the following
    /// gaps keep positive thicknesses and the following surfaces are described as seen by the reflected light.
    Mirror(Conic),
}

impl Surface {
    /// Create a new [`Surface::Conic`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the parameters violate the invariants of a [`Conic`].
    pub fn conic(
        radius_of_curvature: Length,
        conic_constant: f64,
        semi_diameter: Length,
    ) -> LensResult<Self> {
        Ok(Self::Conic(Conic::new(
            radius_of_curvature,
            conic_constant,
            semi_diameter,
        )?))
    }
    /// Create a new [`Surface::Toric`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the parameters violate the invariants of a [`Toric`].
    pub fn toric(
        radius_of_curvature: Length,
        radius_of_revolution: Length,
        conic_constant: f64,
        semi_diameter: Length,
    ) -> LensResult<Self> {
        Ok(Self::Toric(Toric::new(
            radius_of_curvature,
            radius_of_revolution,
            conic_constant,
            semi_diameter,
        )?))
    }
    /// Create a new [`Surface::Mirror`].
    ///
    /// A negative radius of curvature denotes a mirror which is concave towards the incoming light.
    ///
    /// # Errors
    ///
    /// This function will return an error if the parameters violate the invariants of a [`Conic`].
    pub fn mirror(
        radius_of_curvature: Length,
        conic_constant: f64,
        semi_diameter: Length,
    ) -> LensResult<Self> {
        Ok(Self::Mirror(Conic::new(
            radius_of_curvature,
            conic_constant,
            semi_diameter,
        )?))
    }
    /// Create a flat, circular surface with the given semi-diameter.
    ///
    /// # Errors
    ///
    /// This function will return an error if the semi-diameter is negative or `NaN`.
    pub fn flat(semi_diameter: Length) -> LensResult<Self> {
        Self::conic(meter!(f64::INFINITY), 0.0, semi_diameter)
    }
    /// Returns the radius of curvature of this [`Surface`].
    ///
    /// For a [`Toric`] this is the radius of the generating curve in the y-z meridian. [`Surface::Object`] and
    /// [`Surface::Image`] always return +infinity.
    #[must_use]
    pub fn radius_of_curvature(&self) -> Length {
        match self {
            Self::Object | Self::Image => meter!(f64::INFINITY),
            Self::Conic(c) | Self::Mirror(c) => c.radius_of_curvature(),
            Self::Toric(t) => t.radius_of_curvature(),
        }
    }
    /// Returns the semi-diameter of this [`Surface`].
    ///
    /// [`Surface::Object`] and [`Surface::Image`] always return +infinity.
    #[must_use]
    pub fn semi_diameter(&self) -> Length {
        match self {
            Self::Object | Self::Image => meter!(f64::INFINITY),
            Self::Conic(c) | Self::Mirror(c) => c.semi_diameter(),
            Self::Toric(t) => t.semi_diameter(),
        }
    }
    /// Returns the paraxial curvature (in 1/m) of this surface in the y-z meridian.
    ///
    /// Flat surfaces as well as the object and image planes return 0.0.
    #[must_use]
    pub fn paraxial_curvature(&self) -> f64 {
        let radius = self.radius_of_curvature();
        if radius.is_finite() {
            1.0 / radius.value
        } else {
            0.0
        }
    }
    /// Returns `true` if this [`Surface`] changes the ray direction when passing from one medium into the next.
    #[must_use]
    pub const fn is_refracting(&self) -> bool {
        matches!(self, Self::Conic(_) | Self::Toric(_))
    }
    /// Returns `true` if this [`Surface`] reflects the incoming light.
    #[must_use]
    pub const fn is_reflecting(&self) -> bool {
        matches!(self, Self::Mirror(_))
    }
    /// Check all invariants of this [`Surface`].
    ///
    /// This is necessary for surfaces which were not created by their constructors (e.g. deserialized ones).
    ///
    /// # Errors
    ///
    /// This function will return an error if an invariant is violated.
    pub fn validate(&self) -> LensResult<()> {
        match self {
            Self::Object | Self::Image => Ok(()),
            Self::Conic(c) | Self::Mirror(c) => c.validate(),
            Self::Toric(t) => t.validate(),
        }
    }
    /// Returns the sag of this [`Surface`] at the given transverse position.
    ///
    /// Object and image planes are flat.
    #[must_use]
    pub fn sag(&self, x: Length, y: Length) -> Length {
        match self {
            Self::Object | Self::Image => Length::zero(),
            Self::Conic(c) | Self::Mirror(c) => meter!(c.sag(x.value, y.value)),
            Self::Toric(t) => meter!(t.sag(x.value, y.value)),
        }
    }
    /// Returns the largest absolute sag of this [`Surface`] within its clear aperture.
    ///
    /// This is used to place rays in front of the surface. Surfaces with an infinite semi-diameter or a sag
    /// function not defined up to the semi-diameter return the absolute radius of curvature (or zero if flat).
    #[must_use]
    pub fn axial_extent(&self) -> Length {
        let semi_diameter = self.semi_diameter();
        let fallback = if self.radius_of_curvature().is_finite() {
            self.radius_of_curvature().abs()
        } else {
            Length::zero()
        };
        if !semi_diameter.is_finite() {
            return fallback;
        }
        let extent = self
            .sag(Length::zero(), semi_diameter)
            .abs()
            .max(self.sag(semi_diameter, Length::zero()).abs());
        if extent.is_finite() {
            extent
        } else {
            fallback
        }
    }
    /// Calculate the intersection point and the surface normal of a [`Ray`] with this [`Surface`].
    ///
    /// The surface vertex is located on the optical axis at `vertex_z`. The ray is given in global coordinates
    /// and the returned intersection point is also in global coordinates. The returned normal vector is
    /// normalized and points against the ray direction.
    ///
    /// This function returns `None` if the ray does not hit the surface in forward direction. It does **not**
    /// check the clear aperture. Use [`Surface::clips`] for this.
    #[must_use]
    pub fn calc_intersect_and_normal(
        &self,
        ray: &Ray,
        vertex_z: Length,
    ) -> Option<(Point3<Length>, Vector3<f64>)> {
        let local_ray = ray.translated_along_z(-vertex_z);
        let (intersection, normal) = match self {
            Self::Object | Self::Image => Plane.calc_intersect_and_normal_do(&local_ray),
            Self::Conic(c) | Self::Mirror(c) => c.calc_intersect_and_normal_do(&local_ray),
            Self::Toric(t) => t.calc_intersect_and_normal_do(&local_ray),
        }?;
        Some((
            Point3::new(intersection.x, intersection.y, intersection.z + vertex_z),
            normal,
        ))
    }
    /// Returns `true` if the given point lies outside the clear aperture of this [`Surface`].
    ///
    /// Only the transverse (x, y) components of the point are considered.
    #[must_use]
    pub fn clips(&self, point: &Point3<Length>) -> bool {
        let semi_diameter = self.semi_diameter();
        if !semi_diameter.is_finite() {
            return false;
        }
        let radius = point.x.value.hypot(point.y.value);
        radius > semi_diameter.value * (1.0 + CLIP_TOLERANCE)
    }
}

/// Turn a (not necessarily normalized) surface normal into a unit vector pointing against the ray direction.
pub(crate) fn face_forward(normal: Vector3<f64>, direction: &Vector3<f64>) -> Vector3<f64> {
    let normal = normal.normalize();
    if normal.dot(direction) > 0.0 {
        -normal
    } else {
        normal
    }
}
