#![warn(missing_docs)]
//! Sequential real ray tracing
//!
//! [`trace`] propagates a batch of [`Ray`]s through all surfaces of a [`SequentialModel`]. Rays are traced
//! independently (and in parallel). A ray which misses a surface, hits it outside its clear aperture or is totally
//! reflected does not abort the trace. It is marked as terminated at this surface and excluded from all following
//! surfaces.
use std::collections::HashMap;

use itertools::Itertools;
use log::debug;
use nalgebra::Point2;
use num::Zero;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::{
    error::LensResult, meter, ray::Ray, sequential_model::SequentialModel, utils::usize_to_f64,
};

/// Reason for the termination of a ray during a real ray trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Termination {
    /// the ray does not hit the surface in forward direction
    NoIntersection,
    /// the ray hits the surface outside its clear aperture
    Vignetted,
    /// no refracted ray exists at the surface
    TotalInternalReflection,
}

/// The state of a ray recorded at a surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RayRecord {
    /// transverse (x, y) coordinates of the intersection point
    Intercept(Point2<Length>),
    /// the ray was terminated at the given surface (this or an earlier one)
    Terminated {
        /// index of the surface where the ray was terminated
        surface: usize,
        /// reason of the termination
        reason: Termination,
    },
}
impl RayRecord {
    /// Returns the intercept coordinates or `None` if the ray was terminated.
    #[must_use]
    pub const fn intercept(&self) -> Option<Point2<Length>> {
        match self {
            Self::Intercept(p) => Some(*p),
            Self::Terminated { .. } => None,
        }
    }
}

/// Result of a real ray trace, indexed by `[surface][ray]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RayTraceResult {
    records: Vec<Vec<RayRecord>>,
    nr_of_rays: usize,
}

impl RayTraceResult {
    /// Returns the shape `(surfaces, rays, 2)` of this [`RayTraceResult`].
    ///
    /// The last dimension denotes the two transverse components (x, y) recorded per surface and ray.
    #[must_use]
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.records.len(), self.nr_of_rays, 2)
    }
    /// Returns the records of all rays at the given surface.
    ///
    /// Returns `None` if the surface index is out of range.
    #[must_use]
    pub fn surface(&self, surface: usize) -> Option<&[RayRecord]> {
        self.records.get(surface).map(Vec::as_slice)
    }
    /// Returns the record of the given ray at the given surface.
    #[must_use]
    pub fn record(&self, surface: usize, ray: usize) -> Option<&RayRecord> {
        self.records.get(surface).and_then(|r| r.get(ray))
    }
    /// Returns the transverse intercept of the given ray at the given surface.
    ///
    /// Returns `None` if the indices are out of range or the ray was terminated at or before this surface.
    #[must_use]
    pub fn intercept(&self, surface: usize, ray: usize) -> Option<Point2<Length>> {
        self.record(surface, ray).and_then(RayRecord::intercept)
    }
    /// Returns the surface index and reason if the given ray was terminated during the trace.
    #[must_use]
    pub fn termination(&self, ray: usize) -> Option<(usize, Termination)> {
        self.records
            .iter()
            .filter_map(|r| r.get(ray))
            .find_map(|record| match record {
                RayRecord::Terminated { surface, reason } => Some((*surface, *reason)),
                RayRecord::Intercept(_) => None,
            })
    }
    /// Returns the number of rays which reached the given surface.
    #[must_use]
    pub fn nr_of_valid_rays(&self, surface: usize) -> usize {
        self.valid_intercepts(surface).count()
    }
    /// Returns the centroid of all valid intercepts at the given surface.
    ///
    /// Returns `None` if no ray reached this surface.
    #[must_use]
    pub fn centroid(&self, surface: usize) -> Option<Point2<Length>> {
        let nr_of_rays = self.nr_of_valid_rays(surface);
        if nr_of_rays.is_zero() {
            return None;
        }
        let (sum_x, sum_y) = self
            .valid_intercepts(surface)
            .fold((0.0, 0.0), |(x, y), p| (x + p.x.value, y + p.y.value));
        let n = usize_to_f64(nr_of_rays);
        Some(meter!(sum_x / n, sum_y / n))
    }
    /// Returns the rms radius of all valid intercepts around their centroid at the given surface.
    ///
    /// Returns `None` if no ray reached this surface.
    #[must_use]
    pub fn rms_radius(&self, surface: usize) -> Option<Length> {
        let centroid = self.centroid(surface)?;
        let sum_of_squares: f64 = self
            .valid_intercepts(surface)
            .map(|p| {
                let dx = (p.x - centroid.x).value;
                let dy = (p.y - centroid.y).value;
                dx.mul_add(dx, dy * dy)
            })
            .sum();
        Some(meter!(
            (sum_of_squares / usize_to_f64(self.nr_of_valid_rays(surface))).sqrt()
        ))
    }
    fn valid_intercepts(&self, surface: usize) -> impl Iterator<Item = Point2<Length>> + '_ {
        self.records
            .get(surface)
            .into_iter()
            .flatten()
            .filter_map(RayRecord::intercept)
    }
}

/// Trace a batch of rays through a [`SequentialModel`].
///
/// The surface vertices are located as given by [`SequentialModel::vertex_positions`] (surface 1 at z = 0). The
/// rays are given in these global coordinates and are expected to start in object space. Row 0 of the result holds
/// the transverse launch positions of the rays.
///
/// # Errors
///
/// This function will return an error if a refractive index cannot be determined for a wavelength of the batch.
/// Rays failing at a surface are not errors but recorded as [`RayRecord::Terminated`].
pub fn trace(rays: &[Ray], model: &SequentialModel) -> LensResult<RayTraceResult> {
    let vertex_positions = model.vertex_positions();
    let mut refractive_indices: HashMap<u64, Vec<f64>> = HashMap::new();
    for wavelength in rays.iter().map(Ray::wavelength).unique_by(|w| w.value.to_bits()) {
        refractive_indices.insert(
            wavelength.value.to_bits(),
            model.refractive_indices(wavelength)?,
        );
    }
    let per_ray = rays
        .par_iter()
        .map(|ray| {
            let indices = &refractive_indices[&ray.wavelength().value.to_bits()];
            trace_ray(ray.clone(), model, &vertex_positions, indices)
        })
        .collect::<LensResult<Vec<Vec<RayRecord>>>>()?;
    let records: Vec<Vec<RayRecord>> = (0..model.nr_of_surfaces())
        .map(|surface| per_ray.iter().map(|r| r[surface]).collect())
        .collect();
    let result = RayTraceResult {
        records,
        nr_of_rays: rays.len(),
    };
    let nr_of_terminated = (0..rays.len())
        .filter(|ray| result.termination(*ray).is_some())
        .count();
    debug!(
        "traced {} rays through {} surfaces, {nr_of_terminated} rays terminated",
        rays.len(),
        model.nr_of_surfaces()
    );
    Ok(result)
}

fn trace_ray(
    mut ray: Ray,
    model: &SequentialModel,
    vertex_positions: &[Length],
    indices: &[f64],
) -> LensResult<Vec<RayRecord>> {
    let mut records = Vec::with_capacity(model.nr_of_surfaces());
    let launch = ray.position();
    records.push(RayRecord::Intercept(Point2::new(launch.x, launch.y)));
    ray.set_refractive_index(indices[0])?;
    let mut terminated: Option<(usize, Termination)> = None;
    for (idx, step) in model.steps().enumerate() {
        let surface_idx = idx + 1;
        if let Some((surface, reason)) = terminated {
            records.push(RayRecord::Terminated { surface, reason });
            continue;
        }
        let n2 = if step.gap_after.is_some() {
            indices[surface_idx]
        } else {
            ray.refractive_index()
        };
        match ray.refract_on_surface(step.surface, vertex_positions[surface_idx], n2)? {
            None => {
                let pos = ray.position();
                records.push(RayRecord::Intercept(Point2::new(pos.x, pos.y)));
            }
            Some(reason) => {
                terminated = Some((surface_idx, reason));
                records.push(RayRecord::Terminated {
                    surface: surface_idx,
                    reason,
                });
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        gap::Gap,
        millimeter, nanometer,
        refractive_index::{RefrIndexConst, RefractiveIndexType},
        surface::Surface,
    };
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;
    use nalgebra::vector;

    fn convexplano() -> SequentialModel {
        SequentialModel::new(
            vec![
                Surface::Object,
                Surface::conic(millimeter!(25.8), 0.0, millimeter!(12.5)).unwrap(),
                Surface::flat(millimeter!(12.5)).unwrap(),
                Surface::Image,
            ],
            vec![
                Gap::new(millimeter!(f64::INFINITY), RefractiveIndexType::default()).unwrap(),
                Gap::new(
                    millimeter!(5.3),
                    RefractiveIndexType::Const(RefrIndexConst::new(1.515).unwrap()),
                )
                .unwrap(),
                Gap::new(millimeter!(46.59874), RefractiveIndexType::default()).unwrap(),
            ],
        )
        .unwrap()
    }
    fn collimated(y: f64) -> Ray {
        Ray::new_collimated(millimeter!(0.0, y, -10.0), nanometer!(587.6)).unwrap()
    }
    #[test]
    fn shape() {
        let model = convexplano();
        let rays: Vec<Ray> = (0..5).map(|i| collimated(f64::from(i))).collect();
        let result = trace(&rays, &model).unwrap();
        assert_eq!(result.shape(), (4, 5, 2));
        let result = trace(&[], &model).unwrap();
        assert_eq!(result.shape(), (4, 0, 2));
        assert!(result.centroid(3).is_none());
    }
    #[test]
    fn on_axis_ray() {
        let model = convexplano();
        let result = trace(&[collimated(0.0)], &model).unwrap();
        for surface in 0..4 {
            let p = result.intercept(surface, 0).unwrap();
            assert_eq!(p, millimeter!(0.0, 0.0));
        }
        assert!(result.termination(0).is_none());
    }
    #[test]
    fn paraxial_ray_focuses() {
        let model = convexplano();
        let result = trace(&[collimated(0.01)], &model).unwrap();
        let launch = result.intercept(0, 0).unwrap();
        assert_eq!(launch.y, millimeter!(0.01));
        // the image plane is located in the paraxial focus
        let image = result.intercept(3, 0).unwrap();
        assert_abs_diff_eq!(image.y.value, 0.0, epsilon = 1e-7);
    }
    #[test]
    fn marginal_ray_heights() {
        let model = convexplano();
        let result = trace(&[collimated(12.5)], &model).unwrap();
        assert_abs_diff_eq!(result.intercept(1, 0).unwrap().y.value, 0.0125, epsilon = 1e-12);
        let at_flat = result.intercept(2, 0).unwrap().y.value;
        assert!(at_flat < 0.0125);
        assert!(at_flat > 0.0110);
        // spherical aberration: the real marginal ray crosses the axis before the paraxial focus
        assert!(result.intercept(3, 0).unwrap().y.value < 0.0);
    }
    #[test]
    fn vignetted_ray() {
        let model = convexplano();
        let rays = vec![collimated(0.0), collimated(13.0), collimated(-5.0)];
        let result = trace(&rays, &model).unwrap();
        assert_eq!(
            result.termination(1),
            Some((1, Termination::Vignetted))
        );
        for surface in 1..4 {
            assert!(result.intercept(surface, 1).is_none());
            assert_matches!(
                result.record(surface, 1),
                Some(RayRecord::Terminated {
                    surface: 1,
                    reason: Termination::Vignetted
                })
            );
        }
        assert!(result.termination(0).is_none());
        assert!(result.termination(2).is_none());
        assert_eq!(result.nr_of_valid_rays(0), 3);
        assert_eq!(result.nr_of_valid_rays(3), 2);
    }
    #[test]
    fn missed_surface() {
        let model = convexplano();
        let ray = Ray::new(
            millimeter!(0.0, 0.0, -10.0),
            vector![0.0, 1.0, 0.0],
            nanometer!(587.6),
        )
        .unwrap();
        let result = trace(&[ray], &model).unwrap();
        assert_eq!(result.termination(0), Some((1, Termination::NoIntersection)));
    }
    #[test]
    fn idempotent() {
        let model = convexplano();
        let rays: Vec<Ray> = (-6..=6).map(|i| collimated(f64::from(i) * 2.0)).collect();
        let first = trace(&rays, &model).unwrap();
        let second = trace(&rays, &model).unwrap();
        assert_eq!(first, second);
    }
    #[test]
    fn centroid_and_rms() {
        let model = convexplano();
        let rays = vec![collimated(-2.0), collimated(2.0)];
        let result = trace(&rays, &model).unwrap();
        let centroid = result.centroid(0).unwrap();
        assert_eq!(centroid, millimeter!(0.0, 0.0));
        assert_abs_diff_eq!(result.rms_radius(0).unwrap().value, 0.002, epsilon = 1e-15);
        let centroid = result.centroid(3).unwrap();
        assert_abs_diff_eq!(centroid.y.value, 0.0, epsilon = 1e-12);
    }
    #[test]
    fn total_internal_reflection_in_batch() {
        // glass block with a strongly curved exit face, critical angle asin(1/1.5)
        let model = SequentialModel::new(
            vec![
                Surface::Object,
                Surface::flat(millimeter!(10.0)).unwrap(),
                Surface::conic(millimeter!(-10.0), 0.0, millimeter!(9.0)).unwrap(),
                Surface::Image,
            ],
            vec![
                Gap::new(millimeter!(f64::INFINITY), RefractiveIndexType::default()).unwrap(),
                Gap::new(
                    millimeter!(20.0),
                    RefractiveIndexType::Const(RefrIndexConst::new(1.5).unwrap()),
                )
                .unwrap(),
                Gap::new(millimeter!(30.0), RefractiveIndexType::default()).unwrap(),
            ],
        )
        .unwrap();
        let rays = vec![collimated(0.0), collimated(2.0), collimated(8.0), collimated(-3.0)];
        let result = trace(&rays, &model).unwrap();
        assert_eq!(
            result.termination(2),
            Some((2, Termination::TotalInternalReflection))
        );
        assert_abs_diff_eq!(result.intercept(1, 2).unwrap().y.value, 0.008, epsilon = 1e-15);
        assert_eq!(
            result.record(3, 2),
            Some(&RayRecord::Terminated {
                surface: 2,
                reason: Termination::TotalInternalReflection
            })
        );
        for ray in [0, 1, 3] {
            assert!(result.termination(ray).is_none());
            assert!(result.intercept(3, ray).is_some());
        }
        assert_eq!(result.nr_of_valid_rays(2), 3);
        assert_eq!(result.nr_of_valid_rays(3), 3);
        // focal length of the exit face is 20 mm, so the surviving off-axis rays cross the axis
        assert!(result.intercept(3, 1).unwrap().y.value < 0.0);
        assert!(result.intercept(3, 3).unwrap().y.value > 0.0);
    }
    #[test]
    fn cylinder_lens_focuses_in_y_only() {
        // plano-convex cylinder lens with the y-z profile of the plano-convex test lens
        let model = SequentialModel::new(
            vec![
                Surface::Object,
                Surface::toric(
                    millimeter!(25.8),
                    millimeter!(f64::INFINITY),
                    0.0,
                    millimeter!(12.5),
                )
                .unwrap(),
                Surface::flat(millimeter!(12.5)).unwrap(),
                Surface::Image,
            ],
            vec![
                Gap::new(millimeter!(f64::INFINITY), RefractiveIndexType::default()).unwrap(),
                Gap::new(
                    millimeter!(5.3),
                    RefractiveIndexType::Const(RefrIndexConst::new(1.515).unwrap()),
                )
                .unwrap(),
                Gap::new(millimeter!(46.59874), RefractiveIndexType::default()).unwrap(),
            ],
        )
        .unwrap();
        let rays: Vec<Ray> = [(1.0, 0.0), (0.0, 0.01), (1.0, 0.01), (5.0, 5.0)]
            .iter()
            .map(|(x, y)| Ray::new_collimated(millimeter!(*x, *y, -10.0), nanometer!(587.6)).unwrap())
            .collect();
        let result = trace(&rays, &model).unwrap();
        for ray in 0..rays.len() {
            assert!(result.termination(ray).is_none());
        }
        // no power in the x-z meridian
        let image = result.intercept(3, 0).unwrap();
        assert_abs_diff_eq!(image.x.value, 0.001, epsilon = 1e-15);
        assert_abs_diff_eq!(image.y.value, 0.0, epsilon = 1e-15);
        // paraxial focus in the y-z meridian
        let image = result.intercept(3, 1).unwrap();
        assert_abs_diff_eq!(image.y.value, 0.0, epsilon = 1e-7);
        let image = result.intercept(3, 2).unwrap();
        assert_abs_diff_eq!(image.x.value, 0.001, epsilon = 1e-15);
        assert_abs_diff_eq!(image.y.value, 0.0, epsilon = 1e-7);
        let image = result.intercept(3, 3).unwrap();
        assert_abs_diff_eq!(image.x.value, 0.005, epsilon = 1e-15);
        assert!(image.y.value < 0.0);
    }
    #[test]
    fn concave_mirror_focus() {
        let model = SequentialModel::new(
            vec![
                Surface::Object,
                Surface::mirror(millimeter!(-100.0), 0.0, millimeter!(20.0)).unwrap(),
                Surface::Image,
            ],
            vec![
                Gap::new(millimeter!(f64::INFINITY), RefractiveIndexType::default()).unwrap(),
                Gap::new(millimeter!(50.0), RefractiveIndexType::default()).unwrap(),
            ],
        )
        .unwrap();
        let rays = vec![collimated(0.0), collimated(0.1), collimated(10.0), collimated(25.0)];
        let result = trace(&rays, &model).unwrap();
        assert_eq!(result.intercept(1, 2).unwrap(), millimeter!(0.0, 10.0));
        // the image plane is located at R/2 behind the (unfolded) mirror
        assert_eq!(result.intercept(2, 0).unwrap(), millimeter!(0.0, 0.0));
        assert_abs_diff_eq!(result.intercept(2, 1).unwrap().y.value, 0.0, epsilon = 1e-9);
        // spherical aberration: the real marginal ray crosses the axis before the paraxial focus
        assert!(result.intercept(2, 2).unwrap().y.value < 0.0);
        assert_eq!(result.termination(3), Some((1, Termination::Vignetted)));
    }
    #[test]
    fn chromatic_batch() {
        let model = SequentialModel::new(
            vec![
                Surface::Object,
                Surface::conic(millimeter!(25.8), 0.0, millimeter!(12.5)).unwrap(),
                Surface::flat(millimeter!(12.5)).unwrap(),
                Surface::Image,
            ],
            vec![
                Gap::new(millimeter!(f64::INFINITY), RefractiveIndexType::default()).unwrap(),
                Gap::new(
                    millimeter!(5.3),
                    RefractiveIndexType::Sellmeier1(
                        crate::refractive_index::RefrIndexSellmeier1::default(),
                    ),
                )
                .unwrap(),
                Gap::new(millimeter!(46.59874), RefractiveIndexType::default()).unwrap(),
            ],
        )
        .unwrap();
        let blue = Ray::new_collimated(millimeter!(0.0, 5.0, -10.0), nanometer!(486.1)).unwrap();
        let red = Ray::new_collimated(millimeter!(0.0, 5.0, -10.0), nanometer!(656.3)).unwrap();
        let result = trace(&[blue, red], &model).unwrap();
        // higher index for blue light => stronger bending
        assert!(result.intercept(3, 0).unwrap().y < result.intercept(3, 1).unwrap().y);
    }
}
