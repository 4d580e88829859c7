//! Flat surface
//!
//! An infinitely large flat surface oriented perpendicular to the optical axis (xy plane) through the local origin.

use super::GeoSurface;
use crate::{meter, ray::Ray};
use approx::abs_diff_eq;
use nalgebra::{Point3, Vector3};
use uom::si::f64::Length;

/// An infinitely large flat surface with its normal collinear to the optical axis.
///
/// This is the geometry of the object and image planes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plane;

/// Distance along a ray (in units of its direction vector) to the local z = 0 plane.
///
/// Returns `None` for rays parallel to the plane or if the plane lies behind the ray.
pub(crate) fn distance_to_vertex_plane(ray: &Ray) -> Option<f64> {
    let dir = ray.direction();
    if abs_diff_eq!(dir.z, 0.0) {
        return None;
    }
    let t = -ray.position().z.value / dir.z;
    if t < 0.0 {
        None
    } else {
        Some(t)
    }
}

impl GeoSurface for Plane {
    fn sag(&self, _x: f64, _y: f64) -> f64 {
        0.0
    }
    fn calc_intersect_and_normal_do(&self, ray: &Ray) -> Option<(Point3<Length>, Vector3<f64>)> {
        let t = distance_to_vertex_plane(ray)?;
        let pos = ray.position().map(|c| c.value);
        let dir = ray.direction();
        let intersection_point = meter!(t.mul_add(dir.x, pos.x), t.mul_add(dir.y, pos.y), 0.0);
        let normal_vector = super::face_forward(Vector3::new(0.0, 0.0, -1.0), &dir);
        Some((intersection_point, normal_vector))
    }
    fn semi_diameter(&self) -> Length {
        meter!(f64::INFINITY)
    }
}
