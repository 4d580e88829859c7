#![warn(missing_docs)]
//! Construction of optical systems and generation of ray fans
//!
//! An [`OpticalSystem`] is assembled with a [`SystemBuilder`]. The builder can be filled programmatically or read
//! from a YAML document:
//!
//! ```rust
//! use lensray::{degree, millimeter, nanometer, SystemBuilder};
//! use lensray::{fields::FieldSpec, gap::Gap, surface::Surface};
//! use lensray::refractive_index::{RefrIndexConst, RefractiveIndexType};
//!
//! let glass = RefractiveIndexType::Const(RefrIndexConst::new(1.515).unwrap());
//! let system = SystemBuilder::new()
//!     .surface(Surface::Object)
//!     .surface(Surface::conic(millimeter!(25.8), 0.0, millimeter!(12.5)).unwrap())
//!     .surface(Surface::flat(millimeter!(12.5)).unwrap())
//!     .surface(Surface::Image)
//!     .gap(Gap::new(millimeter!(f64::INFINITY), RefractiveIndexType::default()).unwrap())
//!     .gap(Gap::new(millimeter!(5.3), glass).unwrap())
//!     .gap(Gap::new(millimeter!(46.6), RefractiveIndexType::default()).unwrap())
//!     .field(FieldSpec::angle(degree!(0.0), nanometer!(587.6)).unwrap())
//!     .build()
//!     .unwrap();
//! assert_eq!(system.paraxial().aperture_stop(), 1);
//! ```
use std::fmt::Display;

use log::info;
use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::{
    error::{LensError, LensResult},
    fields::{validate_fields, FieldSpec},
    gap::Gap,
    meter,
    paraxial::ParaxialModel,
    pupil_sampling::PupilSampling,
    ray::Ray,
    raytrace::{self, RayTraceResult},
    sequential_model::SequentialModel,
    surface::Surface,
};

/// Normalized pupil coordinates farther away from the pupil center are skipped.
const PUPIL_RADIUS_TOLERANCE: f64 = 1e-12;

/// Description of an optical system before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemBuilder {
    surfaces: Vec<Surface>,
    gaps: Vec<Gap>,
    fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aperture_stop: Option<usize>,
}
impl SystemBuilder {
    /// Creates a new, empty [`SystemBuilder`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// Append a [`Surface`].
    #[must_use]
    pub fn surface(mut self, surface: Surface) -> Self {
        self.surfaces.push(surface);
        self
    }
    /// Append a [`Gap`] behind the surfaces added so far.
    #[must_use]
    pub fn gap(mut self, gap: Gap) -> Self {
        self.gaps.push(gap);
        self
    }
    /// Add a field point.
    #[must_use]
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
    /// Designate the surface with the given index as aperture stop.
    ///
    /// Without this setting, the aperture stop is determined from the semi-diameters of the surfaces.
    #[must_use]
    pub const fn aperture_stop(mut self, surface: usize) -> Self {
        self.aperture_stop = Some(surface);
        self
    }
    /// Read a [`SystemBuilder`] from a YAML document.
    ///
    /// # Errors
    ///
    /// This function will return an error if the document cannot be parsed.
    pub fn from_yaml(yaml: &str) -> LensResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| LensError::Config(format!("parsing of system description failed: {e}")))
    }
    /// Write this [`SystemBuilder`] as YAML document.
    ///
    /// # Errors
    ///
    /// This function will return an error if the serialization fails.
    pub fn to_yaml(&self) -> LensResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| LensError::Config(format!("serialization of system description failed: {e}")))
    }
    /// Validate the description and build the [`OpticalSystem`].
    ///
    /// The paraxial model is calculated at the wavelength of the first field.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the surfaces and gaps do not form a valid [`SequentialModel`]
    ///   - no fields or an inconsistent set of fields is given
    ///   - the paraxial model cannot be calculated (e.g. invalid aperture stop index)
    pub fn build(&self) -> LensResult<OpticalSystem> {
        let model = SequentialModel::new(self.surfaces.clone(), self.gaps.clone())?;
        validate_fields(&self.fields)?;
        let wavelength = self.fields[0].wavelength();
        let paraxial = ParaxialModel::new(&model, &self.fields, wavelength, self.aperture_stop)?;
        info!(
            "built optical system with {} surfaces, aperture stop at surface {}",
            model.nr_of_surfaces(),
            paraxial.aperture_stop()
        );
        Ok(OpticalSystem {
            model,
            fields: self.fields.clone(),
            paraxial,
        })
    }
}

/// A validated optical system together with its paraxial model.
#[derive(Debug, Clone)]
pub struct OpticalSystem {
    model: SequentialModel,
    fields: Vec<FieldSpec>,
    paraxial: ParaxialModel,
}
impl OpticalSystem {
    /// Returns a reference to the [`SequentialModel`] of this [`OpticalSystem`].
    #[must_use]
    pub const fn sequential_model(&self) -> &SequentialModel {
        &self.model
    }
    /// Returns the fields of this [`OpticalSystem`].
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
    /// Returns the [`ParaxialModel`] at the reference wavelength (wavelength of the first field).
    #[must_use]
    pub const fn paraxial(&self) -> &ParaxialModel {
        &self.paraxial
    }
    /// Calculate the [`ParaxialModel`] at another wavelength.
    ///
    /// The aperture stop of the reference model is kept.
    ///
    /// # Errors
    ///
    /// This function will return an error if a refractive index cannot be calculated for the given wavelength.
    pub fn paraxial_model_at(&self, wavelength: Length) -> LensResult<ParaxialModel> {
        ParaxialModel::new(
            &self.model,
            &self.fields,
            wavelength,
            Some(self.paraxial.aperture_stop()),
        )
    }
    /// Generate the rays of a field sampling the entrance pupil.
    ///
    /// Every pupil sample inside the unit circle yields one ray. Normalized pupil coordinates are scaled by the
    /// entrance pupil semi-diameter.
    ///
    ///   - Object at infinity: the rays are parallel, inclined by the field angle in the y-z plane and pass
    ///     through their pupil points. They start on a plane in front of surface 1.
    ///   - Finite object: the rays start at the object point and are aimed at their pupil points.
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - the field or the pupil sampling is invalid
    ///   - the entrance pupil is located at infinity or is infinitely large
    ///   - an object height is given for an object at infinity
    ///   - a ray cannot be created (e.g. zero wavelength)
    pub fn rays(&self, field: &FieldSpec, sampling: &PupilSampling) -> LensResult<Vec<Ray>> {
        field.validate()?;
        sampling.validate()?;
        let pupil = self.paraxial.entrance_pupil();
        let z_ep = pupil.location();
        if !z_ep.is_finite() {
            return Err(LensError::Paraxial(
                "cannot aim rays at an entrance pupil at infinity".into(),
            ));
        }
        if !pupil.semi_diameter().is_finite() {
            return Err(LensError::Paraxial(
                "cannot sample an entrance pupil of infinite size".into(),
            ));
        }
        let pupil_points = sampling
            .iter()
            .filter(|p| p.coords.norm() <= 1.0 + PUPIL_RADIUS_TOLERANCE)
            .map(|p| scale_to_pupil(&p, pupil.semi_diameter(), z_ep));
        let wavelength = field.wavelength();
        if self.model.is_object_at_infinity() {
            let FieldSpec::Angle { angle, .. } = field else {
                return Err(LensError::Field(
                    "object height fields require a finite object distance".into(),
                ));
            };
            let (sin, cos) = angle.value.sin_cos();
            let direction = Vector3::new(0.0, sin, cos);
            let z_launch = z_ep.min(meter!(0.0)) - self.model.surfaces()[1].axial_extent();
            let dz = z_launch - z_ep;
            pupil_points
                .map(|p| {
                    let start = Point3::new(p.x, p.y + dz * (sin / cos), z_launch);
                    Ray::new(start, direction, wavelength)
                })
                .collect()
        } else {
            let object_distance = self.model.object_distance();
            let object_height = match field {
                FieldSpec::Angle { angle, .. } => -(object_distance + z_ep) * angle.value.tan(),
                FieldSpec::ObjectHeight { height, .. } => *height,
            };
            let object_point = Point3::new(meter!(0.0), object_height, -object_distance);
            pupil_points
                .map(|p| {
                    let direction = Vector3::new(
                        (p.x - object_point.x).value,
                        (p.y - object_point.y).value,
                        (p.z - object_point.z).value,
                    );
                    Ray::new(object_point, direction, wavelength)
                })
                .collect()
        }
    }
    /// Trace the given rays through this [`OpticalSystem`].
    ///
    /// # Errors
    ///
    /// This function will return an error if a refractive index cannot be determined for a wavelength of the rays.
    pub fn trace(&self, rays: &[Ray]) -> LensResult<RayTraceResult> {
        raytrace::trace(rays, &self.model)
    }
    /// Generate the rays of a field and trace them through this [`OpticalSystem`].
    ///
    /// # Errors
    ///
    /// This function will return an error under the conditions of [`OpticalSystem::rays`] and
    /// [`OpticalSystem::trace`].
    pub fn trace_field(
        &self,
        field: &FieldSpec,
        sampling: &PupilSampling,
    ) -> LensResult<RayTraceResult> {
        let rays = self.rays(field, sampling)?;
        self.trace(&rays)
    }
}

fn scale_to_pupil(point: &Point2<f64>, semi_diameter: Length, z_ep: Length) -> Point3<Length> {
    Point3::new(semi_diameter * point.x, semi_diameter * point.y, z_ep)
}

impl Display for OpticalSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "surfaces:               {}", self.model.nr_of_surfaces())?;
        for field in &self.fields {
            writeln!(f, "field:                  {field}")?;
        }
        write!(f, "{}", self.paraxial)
    }
}
