//! Conic surface
//!
//! A rotationally symmetric surface of second order (sphere, paraboloid, ellipsoid, hyperboloid) with its vertex at
//! the local origin and the optical axis as symmetry axis.
use super::{face_forward, plane::distance_to_vertex_plane, GeoSurface};
use crate::{
    error::{LensError, LensResult},
    meter,
    ray::Ray,
};
use nalgebra::{vector, Point3, Vector3};
use roots::{find_roots_quadratic, Roots};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

/// A conic surface given by its vertex radius of curvature and its conic constant.
///
/// The sag of the surface is
///
/// `z = c r² / (1 + sqrt(1 - (1 + k) c² r²))`
///
/// with `c = 1 / radius_of_curvature` and `k` the conic constant (0: sphere, -1: paraboloid, < -1: hyperboloid,
/// otherwise ellipsoid). A positive radius of curvature places the center of curvature behind the vertex (+z).
/// An infinite radius of curvature denotes a flat surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conic {
    radius_of_curvature: Length,
    conic_constant: f64,
    semi_diameter: Length,
}

impl Conic {
    /// Create a new [`Conic`].
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the semi-diameter is negative or `NaN`
    ///   - the radius of curvature is zero or `NaN`
    ///   - the conic constant is not finite
    pub fn new(
        radius_of_curvature: Length,
        conic_constant: f64,
        semi_diameter: Length,
    ) -> LensResult<Self> {
        let conic = Self {
            radius_of_curvature,
            conic_constant,
            semi_diameter,
        };
        conic.validate()?;
        Ok(conic)
    }
    /// Check the invariants of this [`Conic`].
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the invariants listed in [`Conic::new`] is violated.
    pub fn validate(&self) -> LensResult<()> {
        if self.semi_diameter.is_nan() || self.semi_diameter.is_sign_negative() {
            return Err(LensError::InvalidGeometry(
                "semi-diameter must be >= 0.0".into(),
            ));
        }
        if self.radius_of_curvature.is_nan() || self.radius_of_curvature.value == 0.0 {
            return Err(LensError::InvalidGeometry(
                "radius of curvature must be != 0.0 and not NaN".into(),
            ));
        }
        if !self.conic_constant.is_finite() {
            return Err(LensError::InvalidGeometry(
                "conic constant must be finite".into(),
            ));
        }
        Ok(())
    }
    /// Returns the vertex radius of curvature of this [`Conic`].
    #[must_use]
    pub const fn radius_of_curvature(&self) -> Length {
        self.radius_of_curvature
    }
    /// Returns the conic constant of this [`Conic`].
    #[must_use]
    pub const fn conic_constant(&self) -> f64 {
        self.conic_constant
    }
    fn curvature(&self) -> f64 {
        if self.radius_of_curvature.is_finite() {
            1.0 / self.radius_of_curvature.value
        } else {
            0.0
        }
    }
}

impl GeoSurface for Conic {
    fn sag(&self, x: f64, y: f64) -> f64 {
        let c = self.curvature();
        let r2 = x.mul_add(x, y * y);
        let kk = 1.0 + self.conic_constant;
        c * r2 / (1.0 + (kk * c * c).mul_add(-r2, 1.0).sqrt())
    }
    fn calc_intersect_and_normal_do(&self, ray: &Ray) -> Option<(Point3<Length>, Vector3<f64>)> {
        let dir = ray.direction();
        let pos = ray.position().map(|c| c.value).coords;
        let c = self.curvature();
        if c == 0.0 {
            let t = distance_to_vertex_plane(ray)?;
            let intersection_point = pos + t * dir;
            return Some((
                meter!(intersection_point.x, intersection_point.y, 0.0),
                face_forward(vector![0.0, 0.0, -1.0], &dir),
            ));
        }
        let kk = 1.0 + self.conic_constant;
        // implicit conic formula (vertex at origin)
        // c * (x^2 + y^2 + (1+k) z^2) - 2z = 0
        //
        // insert ray (p: position, d: direction) => a t^2 + b t + cc = 0 with
        // a = c * (d_x^2 + d_y^2 + (1+k) d_z^2)
        // b = 2 * (c * (p_x d_x + p_y d_y + (1+k) p_z d_z) - d_z)
        // cc = c * (p_x^2 + p_y^2 + (1+k) p_z^2) - 2 p_z
        let a = c * (kk * dir.z).mul_add(dir.z, dir.x.mul_add(dir.x, dir.y * dir.y));
        let b = 2.0 * c.mul_add(
            (kk * pos.z).mul_add(dir.z, pos.x.mul_add(dir.x, pos.y * dir.y)),
            -dir.z,
        );
        let cc = c.mul_add(
            (kk * pos.z).mul_add(pos.z, pos.x.mul_add(pos.x, pos.y * pos.y)),
            -2.0 * pos.z,
        );
        let candidates: Vec<f64> = match find_roots_quadratic(a, b, cc) {
            Roots::No(_) => return None,
            Roots::One(t) => t.to_vec(),
            Roots::Two(t) => t.to_vec(),
            _ => unreachable!(),
        };
        // only the branch containing the vertex is part of the surface
        let t = candidates
            .into_iter()
            .filter(|t| *t >= 0.0)
            .filter(|t| kk * c * t.mul_add(dir.z, pos.z) <= 1.0)
            .reduce(f64::min)?;
        let intersection_point = pos + t * dir;
        let normal_vector = vector![
            c * intersection_point.x,
            c * intersection_point.y,
            (c * kk).mul_add(intersection_point.z, -1.0)
        ];
        Some((
            meter!(
                intersection_point.x,
                intersection_point.y,
                intersection_point.z
            ),
            face_forward(normal_vector, &dir),
        ))
    }
    fn semi_diameter(&self) -> Length {
        self.semi_diameter
    }
}
