#![warn(missing_docs)]
//! Paraxial (first-order) model of a sequential optical system
//!
//! The paraxial model describes the propagation of rays close to the optical axis by 2x2 ray-transfer matrices
//! acting on the ray state `(height, angle)`. The angle is the paraxial slope of the ray.
//!
//!   - refraction at a surface of curvature `c` from index `n` into index `n'`: `[[1, 0], [(n - n') c / n', n / n']]`
//!   - transfer over a gap of thickness `t`: `[[1, t], [0, 1]]`
//!
//! All longitudinal locations reported by [`ParaxialModel`] are measured from the vertex of surface 1 (the first
//! surface after the object plane), positive towards the image. All matrices are given in SI base units.
use std::fmt::Display;

use approx::abs_diff_eq;
use log::warn;
use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::millimeter};

use crate::{
    error::{LensError, LensResult},
    fields::FieldSpec,
    meter,
    sequential_model::SequentialModel,
};

/// Systems with a smaller power (in 1/m) are regarded as afocal.
const AFOCAL_TOLERANCE: f64 = 1e-10;

/// State of a paraxial ray at a plane: height above the optical axis and paraxial slope (angle).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParaxialRay {
    height: Length,
    angle: f64,
}
impl ParaxialRay {
    /// Create a new [`ParaxialRay`].
    #[must_use]
    pub const fn new(height: Length, angle: f64) -> Self {
        Self { height, angle }
    }
    /// Returns the height of this [`ParaxialRay`].
    #[must_use]
    pub const fn height(&self) -> Length {
        self.height
    }
    /// Returns the angle (paraxial slope) of this [`ParaxialRay`].
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.angle
    }
    /// Propagate this ray in a homogeneous medium by the given axial distance.
    #[must_use]
    pub fn propagate(&self, distance: Length) -> Self {
        Self {
            height: self.height + distance * self.angle,
            angle: self.angle,
        }
    }
    /// Returns the axial distance from the current plane to the point where this ray crosses the optical axis.
    ///
    /// # Errors
    ///
    /// This function will return an error if the ray runs parallel to the axis.
    pub fn z_intercept(&self) -> LensResult<Length> {
        if self.angle == 0.0 {
            return Err(LensError::Paraxial(
                "ray parallel to the optical axis does not cross it".into(),
            ));
        }
        Ok(-self.height / self.angle)
    }
    /// Apply a ray-transfer matrix (given in SI units) to this ray.
    #[must_use]
    pub fn transform(&self, matrix: &Matrix2<f64>) -> Self {
        let result = matrix * Vector2::new(self.height.value, self.angle);
        Self {
            height: meter!(result[0]),
            angle: result[1],
        }
    }
    fn scaled(&self, factor: f64) -> Self {
        Self {
            height: self.height * factor,
            angle: self.angle * factor,
        }
    }
}

/// Ray-transfer matrix for refraction at a surface with the given curvature (in 1/m).
///
/// `n0` is the refractive index in front of and `n1` the index behind the surface.
#[must_use]
pub fn refraction_matrix(curvature: f64, n0: f64, n1: f64) -> Matrix2<f64> {
    Matrix2::new(1.0, 0.0, (n0 - n1) * curvature / n1, n0 / n1)
}
/// Ray-transfer matrix for the reflection at a mirror with the given curvature (in 1/m).
///
/// The reflected ray is expressed in the unfolded frame (optical axis flipped behind the mirror). A mirror which is
/// concave towards the incoming light (negative curvature) focuses at a distance of `|R|/2`.
#[must_use]
pub fn reflection_matrix(curvature: f64) -> Matrix2<f64> {
    Matrix2::new(1.0, 0.0, 2.0 * curvature, 1.0)
}
/// Ray-transfer matrix for the propagation over a gap of the given thickness.
///
/// An infinite thickness (object at infinity) is treated as zero.
#[must_use]
pub fn transfer_matrix(thickness: Length) -> Matrix2<f64> {
    let t = if thickness.is_finite() {
        thickness.value
    } else {
        0.0
    };
    Matrix2::new(1.0, t, 0.0, 1.0)
}

/// A pupil given by its axial location and its semi-diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pupil {
    location: Length,
    semi_diameter: Length,
}
impl Pupil {
    /// Returns the axial location of this [`Pupil`] measured from the vertex of surface 1.
    ///
    /// The location may be infinite for telecentric systems.
    #[must_use]
    pub const fn location(&self) -> Length {
        self.location
    }
    /// Returns the semi-diameter of this [`Pupil`].
    #[must_use]
    pub const fn semi_diameter(&self) -> Length {
        self.semi_diameter
    }
}
/// The image of the aperture stop seen from object space.
pub type EntrancePupil = Pupil;
/// The image of the aperture stop seen from image space.
pub type ExitPupil = Pupil;

/// First-order properties of a sequential optical system at a given wavelength.
///
/// All quantities are calculated once during construction.
#[derive(Debug, Clone)]
pub struct ParaxialModel {
    wavelength: Length,
    curvatures: Vec<f64>,
    reflecting: Vec<bool>,
    semi_diameters: Vec<Length>,
    thicknesses: Vec<Length>,
    indices: Vec<f64>,
    vertex_positions: Vec<Length>,
    object_at_infinity: bool,
    fields: Vec<FieldSpec>,
    aperture_stop: usize,
    marginal_ray: Vec<ParaxialRay>,
    entrance_pupil: EntrancePupil,
    exit_pupil: ExitPupil,
    system_matrix: Matrix2<f64>,
}

impl ParaxialModel {
    /// Create the [`ParaxialModel`] of a [`SequentialModel`] at the given wavelength.
    ///
    /// The aperture stop is determined automatically unless `aperture_stop` designates a surface explicitly.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - a refractive index cannot be calculated for the given wavelength
    ///   - the designated aperture stop is not a surface between object and image plane
    pub fn new(
        model: &SequentialModel,
        fields: &[FieldSpec],
        wavelength: Length,
        aperture_stop: Option<usize>,
    ) -> LensResult<Self> {
        let indices = model.refractive_indices(wavelength)?;
        let mut paraxial = Self {
            wavelength,
            curvatures: model
                .surfaces()
                .iter()
                .map(crate::surface::Surface::paraxial_curvature)
                .collect(),
            reflecting: model
                .surfaces()
                .iter()
                .map(crate::surface::Surface::is_reflecting)
                .collect(),
            semi_diameters: model
                .surfaces()
                .iter()
                .map(crate::surface::Surface::semi_diameter)
                .collect(),
            thicknesses: model.gaps().iter().map(crate::gap::Gap::thickness).collect(),
            indices,
            vertex_positions: model.vertex_positions(),
            object_at_infinity: model.is_object_at_infinity(),
            fields: fields.to_vec(),
            aperture_stop: 1,
            marginal_ray: Vec::new(),
            entrance_pupil: Pupil {
                location: meter!(0.0),
                semi_diameter: meter!(0.0),
            },
            exit_pupil: Pupil {
                location: meter!(0.0),
                semi_diameter: meter!(0.0),
            },
            system_matrix: Matrix2::identity(),
        };
        paraxial.system_matrix = paraxial.calc_system_matrix();
        let pseudo_marginal = paraxial.pseudo_marginal_ray_trace();
        let ratios = paraxial.aperture_ratios(&pseudo_marginal);
        paraxial.aperture_stop = match aperture_stop {
            Some(stop) => {
                if !(1..=paraxial.last_real_surface()).contains(&stop) {
                    return Err(LensError::OpticalSystem(format!(
                        "aperture stop {stop} must be a surface between object and image plane"
                    )));
                }
                stop
            }
            None => Self::find_aperture_stop(&ratios),
        };
        let scale_factor = ratios[paraxial.aperture_stop];
        paraxial.marginal_ray = if scale_factor.is_finite() {
            pseudo_marginal.iter().map(|r| r.scaled(scale_factor)).collect()
        } else {
            pseudo_marginal
        };
        paraxial.entrance_pupil = paraxial.calc_entrance_pupil();
        paraxial.exit_pupil = paraxial.calc_exit_pupil();
        if paraxial.is_afocal() {
            warn!("system is afocal, focal lengths and principal planes are infinite");
        }
        Ok(paraxial)
    }
    /// Returns the wavelength this [`ParaxialModel`] was calculated for.
    #[must_use]
    pub const fn wavelength(&self) -> Length {
        self.wavelength
    }
    /// Returns the number of surfaces (including object and image plane).
    #[must_use]
    pub fn nr_of_surfaces(&self) -> usize {
        self.curvatures.len()
    }
    fn last_real_surface(&self) -> usize {
        self.nr_of_surfaces() - 2
    }
    /// Returns the ray-transfer matrix from the plane of surface `surface - 1` (behind its refraction) to the plane
    /// of surface `surface` (behind its refraction).
    ///
    /// # Panics
    ///
    /// This function panics if `surface` is zero or out of range.
    #[must_use]
    pub fn surface_matrix(&self, surface: usize) -> Matrix2<f64> {
        self.interface_matrix(surface) * transfer_matrix(self.thicknesses[surface - 1])
    }
    /// Refraction or reflection matrix of the given surface without the preceding transfer.
    fn interface_matrix(&self, surface: usize) -> Matrix2<f64> {
        if self.reflecting[surface] {
            return reflection_matrix(self.curvatures[surface]);
        }
        let n0 = self.indices[surface - 1];
        let n1 = self.indices.get(surface).copied().unwrap_or(n0);
        refraction_matrix(self.curvatures[surface], n0, n1)
    }
    /// Trace paraxial rays through all surfaces.
    ///
    /// The rays are given in object space at the object plane (or, for an object at infinity, at the vertex plane
    /// of surface 1). The result is indexed by `[surface][ray]`. Row 0 contains the input rays.
    #[must_use]
    pub fn trace(&self, rays: &[ParaxialRay]) -> Vec<Vec<ParaxialRay>> {
        let mut results = Vec::with_capacity(self.nr_of_surfaces());
        results.push(rays.to_vec());
        for surface in 1..self.nr_of_surfaces() {
            let matrix = self.surface_matrix(surface);
            let next: Vec<ParaxialRay> = results[surface - 1]
                .iter()
                .map(|r| r.transform(&matrix))
                .collect();
            results.push(next);
        }
        results
    }
    fn trace_single(&self, ray: ParaxialRay) -> Vec<ParaxialRay> {
        self.trace(&[ray]).into_iter().flatten().collect()
    }
    fn pseudo_marginal_ray_trace(&self) -> Vec<ParaxialRay> {
        let ray = if self.object_at_infinity {
            ParaxialRay::new(meter!(1.0), 0.0)
        } else {
            ParaxialRay::new(meter!(0.0), 1.0)
        };
        self.trace_single(ray)
    }
    fn aperture_ratios(&self, pseudo_marginal: &[ParaxialRay]) -> Vec<f64> {
        self.semi_diameters
            .iter()
            .zip(pseudo_marginal)
            .map(|(sd, ray)| {
                let height = ray.height().value.abs();
                if height == 0.0 {
                    f64::INFINITY
                } else {
                    sd.value / height
                }
            })
            .collect()
    }
    fn find_aperture_stop(ratios: &[f64]) -> usize {
        let mut stop = 1;
        let mut min_ratio = f64::INFINITY;
        for (idx, ratio) in ratios.iter().enumerate().take(ratios.len() - 1).skip(1) {
            if *ratio < min_ratio {
                min_ratio = *ratio;
                stop = idx;
            }
        }
        if !min_ratio.is_finite() {
            warn!("no surface limits the axial beam, using surface 1 as aperture stop");
        }
        stop
    }
    fn calc_entrance_pupil(&self) -> EntrancePupil {
        let stop = self.aperture_stop;
        if stop == 1 {
            return Pupil {
                location: meter!(0.0),
                semi_diameter: self.semi_diameters[1],
            };
        }
        // trace a ray from the center of the stop backwards into object space
        let mut height = 0.0;
        let mut angle = 1.0;
        for surface in (1..stop).rev() {
            height -= self.thicknesses[surface].value * angle;
            angle = if self.reflecting[surface] {
                (2.0 * self.curvatures[surface]).mul_add(-height, angle)
            } else {
                let n0 = self.indices[surface - 1];
                let n1 = self.indices[surface];
                let power_term = (n0 - n1) * self.curvatures[surface] / n1;
                power_term.mul_add(-height, angle) * n1 / n0
            };
        }
        let location = -height / angle;
        let semi_diameter = self.marginal_ray[0]
            .angle()
            .mul_add(location, self.marginal_ray[1].height().value)
            .abs();
        Pupil {
            location: meter!(location),
            semi_diameter: meter!(semi_diameter),
        }
    }
    fn calc_exit_pupil(&self) -> ExitPupil {
        let stop = self.aperture_stop;
        let last = self.last_real_surface();
        if stop == last {
            return Pupil {
                location: self.vertex_positions[stop],
                semi_diameter: self.semi_diameters[stop],
            };
        }
        // image the center of the stop through the trailing surfaces
        let mut ray = ParaxialRay::new(meter!(0.0), 1.0);
        for surface in stop + 1..=last {
            ray = ray.transform(&self.surface_matrix(surface));
        }
        let local = -ray.height().value / ray.angle();
        let marginal = self.marginal_ray[last];
        Pupil {
            location: self.vertex_positions[last] + meter!(local),
            semi_diameter: meter!(marginal
                .angle()
                .mul_add(local, marginal.height().value)
                .abs()),
        }
    }
    fn calc_system_matrix(&self) -> Matrix2<f64> {
        let mut matrix = Matrix2::identity();
        for surface in 1..=self.last_real_surface() {
            let surface_matrix = if surface == 1 {
                self.interface_matrix(1)
            } else {
                self.surface_matrix(surface)
            };
            matrix = surface_matrix * matrix;
        }
        matrix
    }
    /// Returns the system matrix `M = R_{N-2}·T_{N-3}·…·T_1·R_1` from the vertex of surface 1 to the vertex
    /// of the last surface in front of the image plane.
    #[must_use]
    pub const fn system_matrix(&self) -> Matrix2<f64> {
        self.system_matrix
    }
    /// Returns `true` if the system has no optical power.
    #[must_use]
    pub fn is_afocal(&self) -> bool {
        abs_diff_eq!(self.system_matrix[(1, 0)], 0.0, epsilon = AFOCAL_TOLERANCE)
    }
    fn focal_quantity(&self, value: impl FnOnce(f64, f64, f64, f64) -> f64) -> Length {
        if self.is_afocal() {
            return meter!(f64::INFINITY);
        }
        let m = &self.system_matrix;
        meter!(value(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]))
    }
    /// Returns the effective focal length of the system.
    ///
    /// Returns +∞ for afocal systems.
    #[must_use]
    pub fn effective_focal_length(&self) -> Length {
        self.focal_quantity(|_, _, c, _| -1.0 / c)
    }
    /// Returns the back focal length, measured from the last surface in front of the image plane.
    ///
    /// Returns +∞ for afocal systems.
    #[must_use]
    pub fn back_focal_length(&self) -> Length {
        self.focal_quantity(|a, _, c, _| -a / c)
    }
    /// Returns the front focal length, i.e. the location of the front focal point measured from surface 1.
    ///
    /// Returns +∞ for afocal systems.
    #[must_use]
    pub fn front_focal_length(&self) -> Length {
        self.focal_quantity(|_, _, c, d| d / c)
    }
    /// Returns the location of the front principal plane measured from surface 1.
    ///
    /// Returns +∞ for afocal systems.
    #[must_use]
    pub fn front_principal_plane(&self) -> Length {
        let det = self.system_matrix.determinant();
        self.focal_quantity(|_, _, c, d| (d - det) / c)
    }
    /// Returns the location of the back principal plane measured from surface 1.
    ///
    /// Returns +∞ for afocal systems.
    #[must_use]
    pub fn back_principal_plane(&self) -> Length {
        let z_last = self.vertex_positions[self.last_real_surface()];
        let offset = self.focal_quantity(|a, _, c, _| (1.0 - a) / c);
        z_last + offset
    }
    /// Returns the index of the aperture stop surface.
    #[must_use]
    pub const fn aperture_stop(&self) -> usize {
        self.aperture_stop
    }
    /// Returns the [`EntrancePupil`] of the system.
    #[must_use]
    pub const fn entrance_pupil(&self) -> EntrancePupil {
        self.entrance_pupil
    }
    /// Returns the [`ExitPupil`] of the system.
    #[must_use]
    pub const fn exit_pupil(&self) -> ExitPupil {
        self.exit_pupil
    }
    /// Returns the marginal ray at every surface (row 0: object space).
    ///
    /// Its height at the aperture stop equals the stop semi-diameter. If no surface limits the axial beam, the
    /// unscaled pseudo-marginal ray is returned.
    #[must_use]
    pub fn marginal_ray(&self) -> &[ParaxialRay] {
        &self.marginal_ray
    }
    /// Returns the chief ray of the field with the largest magnitude at every surface.
    ///
    /// # Errors
    ///
    /// This function will return an error if no fields are defined or the chief ray of this field cannot be
    /// determined (see [`ParaxialModel::chief_ray_for`]).
    pub fn chief_ray(&self) -> LensResult<Vec<ParaxialRay>> {
        let field = self
            .fields
            .iter()
            .max_by(|a, b| a.magnitude().total_cmp(&b.magnitude()))
            .ok_or_else(|| LensError::Field("no fields defined".into()))?;
        self.chief_ray_for(field)
    }
    /// Returns the chief ray of the given field at every surface (row 0: object space).
    ///
    /// The chief ray crosses the optical axis in the entrance pupil and thus in the center of the aperture stop.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the entrance pupil is located at infinity
    ///   - an object height is given for an object at infinity
    ///   - the object plane coincides with the entrance pupil
    pub fn chief_ray_for(&self, field: &FieldSpec) -> LensResult<Vec<ParaxialRay>> {
        let z_ep = self.entrance_pupil.location();
        if !z_ep.is_finite() {
            return Err(LensError::Paraxial(
                "chief ray is undefined for an entrance pupil at infinity".into(),
            ));
        }
        let object_distance = self.thicknesses[0];
        let ray = match field {
            FieldSpec::Angle { angle, .. } => {
                let slope = angle.value.tan();
                if self.object_at_infinity {
                    ParaxialRay::new(-z_ep * slope, slope)
                } else {
                    ParaxialRay::new(-(object_distance + z_ep) * slope, slope)
                }
            }
            FieldSpec::ObjectHeight { height, .. } => {
                if self.object_at_infinity {
                    return Err(LensError::Field(
                        "object height fields require a finite object distance".into(),
                    ));
                }
                let distance = object_distance + z_ep;
                if distance.value == 0.0 {
                    return Err(LensError::Paraxial(
                        "object plane coincides with the entrance pupil".into(),
                    ));
                }
                ParaxialRay::new(*height, -(*height / distance).value)
            }
        };
        Ok(self.trace_single(ray))
    }
}

impl Display for ParaxialModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "aperture stop:          {}", self.aperture_stop)?;
        writeln!(
            f,
            "entrance pupil:         {:.5} mm (semi-diameter {:.5} mm)",
            self.entrance_pupil.location.get::<millimeter>(),
            self.entrance_pupil.semi_diameter.get::<millimeter>()
        )?;
        writeln!(
            f,
            "exit pupil:             {:.5} mm (semi-diameter {:.5} mm)",
            self.exit_pupil.location.get::<millimeter>(),
            self.exit_pupil.semi_diameter.get::<millimeter>()
        )?;
        writeln!(
            f,
            "effective focal length: {:.5} mm",
            self.effective_focal_length().get::<millimeter>()
        )?;
        writeln!(
            f,
            "front focal length:     {:.5} mm",
            self.front_focal_length().get::<millimeter>()
        )?;
        writeln!(
            f,
            "back focal length:      {:.5} mm",
            self.back_focal_length().get::<millimeter>()
        )?;
        writeln!(
            f,
            "front principal plane:  {:.5} mm",
            self.front_principal_plane().get::<millimeter>()
        )?;
        write!(
            f,
            "back principal plane:   {:.5} mm",
            self.back_principal_plane().get::<millimeter>()
        )
    }
}
