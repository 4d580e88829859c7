//! Toric surface
//!
//! An anamorphic surface generated by revolving a conic curve lying in the y-z meridian about an axis parallel to
//! the y axis. The distance of this axis from the vertex is the radius of revolution.
use super::{face_forward, GeoSurface};
use crate::{
    error::{LensError, LensResult},
    meter,
    ray::Ray,
};
use approx::abs_diff_eq;
use nalgebra::{vector, Point3, Vector3};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

const MAX_ITERATIONS: usize = 50;
const TOLERANCE: f64 = 1e-12;

/// A toric surface.
///
/// The generating curve in the y-z meridian is the conic `zy(y) = c y² / (1 + sqrt(1 - (1 + k) c² y²))` with
/// `c = 1 / radius_of_curvature`. This curve is revolved about an axis parallel to y located at
/// `z = radius_of_revolution`, so the x-z meridian is a circular arc of radius `radius_of_revolution`.
///
///   - `radius_of_revolution = ∞`: cylinder with power only in the y-z meridian
///   - `radius_of_revolution = radius_of_curvature` and `k = 0`: sphere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toric {
    radius_of_curvature: Length,
    radius_of_revolution: Length,
    conic_constant: f64,
    semi_diameter: Length,
}

/// Sag and its partial derivatives at a transverse position.
struct SagGradient {
    sag: f64,
    dx: f64,
    dy: f64,
}

impl Toric {
    /// Create a new [`Toric`].
    ///
    /// A radius of revolution of zero is accepted. Such a surface is degenerated and never intersected by a ray.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the semi-diameter is negative or `NaN`
    ///   - the radius of revolution is negative or `NaN`
    ///   - the radius of curvature is zero or `NaN`
    ///   - the conic constant is not finite
    pub fn new(
        radius_of_curvature: Length,
        radius_of_revolution: Length,
        conic_constant: f64,
        semi_diameter: Length,
    ) -> LensResult<Self> {
        let toric = Self {
            radius_of_curvature,
            radius_of_revolution,
            conic_constant,
            semi_diameter,
        };
        toric.validate()?;
        Ok(toric)
    }
    /// Check the invariants of this [`Toric`].
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the invariants listed in [`Toric::new`] is violated.
    pub fn validate(&self) -> LensResult<()> {
        if self.semi_diameter.is_nan() || self.semi_diameter.is_sign_negative() {
            return Err(LensError::InvalidGeometry(
                "semi-diameter must be >= 0.0".into(),
            ));
        }
        if self.radius_of_revolution.is_nan() || self.radius_of_revolution.is_sign_negative() {
            return Err(LensError::InvalidGeometry(
                "radius of revolution must be >= 0.0".into(),
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
    /// Returns the radius of curvature of the generating curve (y-z meridian).
    #[must_use]
    pub const fn radius_of_curvature(&self) -> Length {
        self.radius_of_curvature
    }
    /// Returns the radius of revolution (x-z meridian).
    #[must_use]
    pub const fn radius_of_revolution(&self) -> Length {
        self.radius_of_revolution
    }
    /// Returns the conic constant of the generating curve.
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
    fn curvature_of_revolution(&self) -> f64 {
        if self.radius_of_revolution.is_finite() {
            1.0 / self.radius_of_revolution.value
        } else {
            0.0
        }
    }
    fn sag_and_gradient(&self, x: f64, y: f64) -> SagGradient {
        let c = self.curvature();
        let kk = 1.0 + self.conic_constant;
        let root_y = (kk * c * c).mul_add(-y * y, 1.0).sqrt();
        let zy = c * y * y / (1.0 + root_y);
        let dzy = c * y / root_y;
        let c_rev = self.curvature_of_revolution();
        let cw = c_rev / c_rev.mul_add(-zy, 1.0);
        let root_x = (cw * cw).mul_add(-x * x, 1.0).sqrt();
        SagGradient {
            sag: zy + cw * x * x / (1.0 + root_x),
            dx: cw * x / root_x,
            dy: dzy / root_x,
        }
    }
}

impl GeoSurface for Toric {
    fn sag(&self, x: f64, y: f64) -> f64 {
        if self.radius_of_revolution.value == 0.0 {
            return f64::NAN;
        }
        self.sag_and_gradient(x, y).sag
    }
    fn calc_intersect_and_normal_do(&self, ray: &Ray) -> Option<(Point3<Length>, Vector3<f64>)> {
        if self.radius_of_revolution.value == 0.0 {
            return None;
        }
        let dir = ray.direction();
        let pos = ray.position().map(|c| c.value).coords;
        if abs_diff_eq!(dir.z, 0.0) {
            return None;
        }
        // Newton iteration of g(t) = z(t) - sag(x(t), y(t)) starting at the vertex plane
        let mut t = -pos.z / dir.z;
        let mut converged = false;
        for _ in 0..MAX_ITERATIONS {
            let p = pos + t * dir;
            let sg = self.sag_and_gradient(p.x, p.y);
            let g = p.z - sg.sag;
            let dg = sg.dy.mul_add(-dir.y, sg.dx.mul_add(-dir.x, dir.z));
            if !g.is_finite() || !dg.is_normal() {
                return None;
            }
            let delta = g / dg;
            t -= delta;
            if delta.abs() < TOLERANCE {
                converged = true;
                break;
            }
        }
        if !converged || t < 0.0 {
            return None;
        }
        let intersection_point = pos + t * dir;
        let sg = self.sag_and_gradient(intersection_point.x, intersection_point.y);
        let normal_vector = vector![sg.dx, sg.dy, -1.0];
        if !normal_vector.iter().all(|c| c.is_finite()) {
            return None;
        }
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::{millimeter, nanometer, surface::Conic};
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    #[test]
    fn new() {
        assert!(Toric::new(millimeter!(10.0), millimeter!(20.0), 0.0, millimeter!(5.0)).is_ok());
        assert!(Toric::new(millimeter!(10.0), millimeter!(0.0), 0.0, millimeter!(5.0)).is_ok());
        assert!(Toric::new(
            millimeter!(f64::INFINITY),
            millimeter!(f64::INFINITY),
            0.0,
            millimeter!(5.0)
        )
        .is_ok());
        assert_matches!(
            Toric::new(millimeter!(10.0), millimeter!(-20.0), 0.0, millimeter!(5.0)),
            Err(LensError::InvalidGeometry(_))
        );
        assert_matches!(
            Toric::new(millimeter!(10.0), millimeter!(20.0), 0.0, millimeter!(-5.0)),
            Err(LensError::InvalidGeometry(_))
        );
        assert_matches!(
            Toric::new(millimeter!(10.0), millimeter!(f64::NAN), 0.0, millimeter!(5.0)),
            Err(LensError::InvalidGeometry(_))
        );
        assert_matches!(
            Toric::new(millimeter!(0.0), millimeter!(20.0), 0.0, millimeter!(5.0)),
            Err(LensError::InvalidGeometry(_))
        );
    }
    #[test]
    fn sag_equals_sphere() {
        let toric = Toric::new(meter!(10.0), meter!(10.0), 0.0, meter!(5.0)).unwrap();
        let sphere = Conic::new(meter!(10.0), 0.0, meter!(5.0)).unwrap();
        for (x, y) in [(0.0, 0.0), (3.0, 4.0), (1.0, -2.0), (-4.5, 0.5)] {
            assert_abs_diff_eq!(toric.sag(x, y), sphere.sag(x, y), epsilon = 1e-12);
        }
    }
    #[test]
    fn sag_cylinder() {
        let toric = Toric::new(meter!(10.0), meter!(f64::INFINITY), 0.0, meter!(5.0)).unwrap();
        assert_eq!(toric.sag(5.0, 0.0), 0.0);
        assert_abs_diff_eq!(toric.sag(5.0, 5.0), 10.0 - 75.0_f64.sqrt(), epsilon = 1e-12);
        let toric = Toric::new(meter!(f64::INFINITY), meter!(10.0), 0.0, meter!(5.0)).unwrap();
        assert_eq!(toric.sag(0.0, 5.0), 0.0);
        assert_abs_diff_eq!(toric.sag(5.0, 3.0), 10.0 - 75.0_f64.sqrt(), epsilon = 1e-12);
    }
    #[test]
    fn intersect_like_sphere() {
        let toric = Toric::new(meter!(10.0), meter!(10.0), 0.0, meter!(10.0)).unwrap();
        let ray = Ray::new_collimated(meter!(0.0, 5.0, -10.0), nanometer!(1000.0)).unwrap();
        let (point, normal) = toric.calc_intersect_and_normal_do(&ray).unwrap();
        assert_abs_diff_eq!(point.z.value, 10.0 - 75.0_f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(
            normal,
            vector![0.0, 0.5, -(0.75_f64.sqrt())],
            epsilon = 1e-9
        );
        let ray = Ray::new_collimated(meter!(5.0, 0.0, -10.0), nanometer!(1000.0)).unwrap();
        let (point, normal) = toric.calc_intersect_and_normal_do(&ray).unwrap();
        assert_abs_diff_eq!(point.z.value, 10.0 - 75.0_f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(
            normal,
            vector![0.5, 0.0, -(0.75_f64.sqrt())],
            epsilon = 1e-9
        );
    }
    #[test]
    fn intersect_cylinder() {
        let toric = Toric::new(meter!(10.0), meter!(f64::INFINITY), 0.0, meter!(10.0)).unwrap();
        let ray = Ray::new_collimated(meter!(5.0, 0.0, -10.0), nanometer!(1000.0)).unwrap();
        let (point, normal) = toric.calc_intersect_and_normal_do(&ray).unwrap();
        assert_abs_diff_eq!(point.z.value, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normal, vector![0.0, 0.0, -1.0], epsilon = 1e-12);
    }
    #[test]
    fn intersect_tilted_ray() {
        let toric = Toric::new(meter!(20.0), meter!(15.0), 0.0, meter!(10.0)).unwrap();
        let ray = Ray::new(
            meter!(0.5, -1.0, -5.0),
            vector![0.05, 0.1, 1.0],
            nanometer!(1000.0),
        )
        .unwrap();
        let (point, normal) = toric.calc_intersect_and_normal_do(&ray).unwrap();
        let p = point.map(|c| c.value);
        assert_abs_diff_eq!(p.z, toric.sag(p.x, p.y), epsilon = 1e-10);
        assert_abs_diff_eq!(normal.norm(), 1.0, epsilon = 1e-12);
        assert!(normal.dot(&ray.direction()) < 0.0);
    }
    #[test]
    fn intersect_miss() {
        let toric = Toric::new(meter!(10.0), meter!(10.0), 0.0, meter!(10.0)).unwrap();
        let ray = Ray::new_collimated(meter!(0.0, 11.0, -10.0), nanometer!(1000.0)).unwrap();
        assert!(toric.calc_intersect_and_normal_do(&ray).is_none());
        let ray = Ray::new(
            meter!(0.0, 1.0, -10.0),
            vector![0.0, 1.0, 0.0],
            nanometer!(1000.0),
        )
        .unwrap();
        assert!(toric.calc_intersect_and_normal_do(&ray).is_none());
    }
    #[test]
    fn zero_radius_of_revolution() {
        let toric = Toric::new(meter!(10.0), meter!(0.0), 0.0, meter!(10.0)).unwrap();
        let ray = Ray::new_collimated(meter!(0.0, 0.0, -10.0), nanometer!(1000.0)).unwrap();
        assert!(toric.calc_intersect_and_normal_do(&ray).is_none());
        assert!(toric.sag(0.0, 0.0).is_nan());
    }
}
