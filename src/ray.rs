#![warn(missing_docs)]
//! Module for handling real (finite, skew) optical rays
use nalgebra::{vector, Point3, Vector3};
use num::Zero;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uom::si::{
    f64::Length,
    length::{millimeter, nanometer},
};

use crate::{
    error::{LensError, LensResult},
    raytrace::Termination,
    surface::Surface,
};

///Struct that contains all information about a real optical ray
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ray {
    /// Stores the current position of the ray
    pos: Point3<Length>,
    /// Stores the current propagation direction of the ray (stored as direction cosine)
    dir: Vector3<f64>,
    /// Wavelength of the ray
    wvl: Length,
    /// refractive index of the medium this ray is propagating in.
    refractive_index: f64,
}
impl Ray {
    /// Creates a new [`Ray`].
    ///
    /// The dircetion vector is normalized. The direction is thus stored as (`direction cosine`)[`https://en.wikipedia.org/wiki/Direction_cosine`]
    ///
    /// # Errors
    /// This function returns an error if
    ///  - the given wavelength is <= 0.0, `NaN` or +inf
    ///  - the position contains non-finite values
    ///  - the direction vector has a zero length or contains non-finite values
    pub fn new(
        position: Point3<Length>,
        direction: Vector3<f64>,
        wave_length: Length,
    ) -> LensResult<Self> {
        if wave_length.is_zero() || wave_length.is_sign_negative() || !wave_length.is_finite() {
            return Err(LensError::Other("wavelength must be >0".into()));
        }
        if !(position.x.is_finite() && position.y.is_finite() && position.z.is_finite()) {
            return Err(LensError::Other("position must be finite".into()));
        }
        if direction.norm().is_zero() || !direction.iter().all(|c| c.is_finite()) {
            return Err(LensError::Other(
                "length of direction must be >0 and finite".into(),
            ));
        }
        Ok(Self {
            pos: position,
            dir: direction.normalize(),
            wvl: wave_length,
            refractive_index: 1.0,
        })
    }
    /// Create a new collimated ray.
    ///
    /// Generate a ray collinear with the z axis (optical axis).
    ///
    /// # Errors
    /// This function returns an error if the given wavelength is <= 0.0, `NaN` or +inf
    pub fn new_collimated(position: Point3<Length>, wave_length: Length) -> LensResult<Self> {
        Self::new(position, Vector3::z(), wave_length)
    }
    /// Returns the position of this [`Ray`].
    #[must_use]
    pub const fn position(&self) -> Point3<Length> {
        self.pos
    }
    /// Returns the direction of this [`Ray`] as (normalized) directional cosine.
    #[must_use]
    pub const fn direction(&self) -> Vector3<f64> {
        self.dir
    }
    /// Returns the wavelength of this [`Ray`].
    #[must_use]
    pub const fn wavelength(&self) -> Length {
        self.wvl
    }
    /// Returns the refractive index of the medium this [`Ray`] currently propagates in.
    #[must_use]
    pub const fn refractive_index(&self) -> f64 {
        self.refractive_index
    }
    /// Sets the refractive index of the medium this [`Ray`] currently propagates in.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given refractive index is <1.0 or not finite.
    pub fn set_refractive_index(&mut self, refractive_index: f64) -> LensResult<()> {
        if refractive_index < 1.0 || !refractive_index.is_finite() {
            return Err(LensError::Other(
                "refractive index must be >=1.0 and finite".into(),
            ));
        }
        self.refractive_index = refractive_index;
        Ok(())
    }
    /// Returns a copy of this [`Ray`] shifted along the optical axis by the given distance.
    #[must_use]
    pub fn translated_along_z(&self, distance: Length) -> Self {
        let mut ray = self.clone();
        ray.pos.z += distance;
        ray
    }
    /// Propagate a ray freely along its direction by the given length.
    ///
    /// # Errors
    /// This functions returns an error if the propagation length is not finite.
    pub fn propagate(&mut self, length: Length) -> LensResult<()> {
        if !length.is_finite() {
            return Err(LensError::Other(
                "propagation length must be finite".into(),
            ));
        }
        self.pos += vector![
            length * self.dir.x,
            length * self.dir.y,
            length * self.dir.z
        ];
        Ok(())
    }
    /// Refract the [`Ray`] on a given [`Surface`] using Snellius' law.
    ///
    /// The vertex of the surface is located on the optical axis at `vertex_z`. The initial refractive index is
    /// (already) stored in the ray itself. The refractive index behind the surface is given by the parameter `n2`.
    ///
    /// On success, the ray is moved to the intersection point, its direction is replaced by the refracted direction
    /// and `None` is returned. [`Surface::Object`] and [`Surface::Image`] do not change the direction. At a
    /// [`Surface::Mirror`] the ray is reflected and the frame is unfolded (mirrored at the vertex plane), so the ray
    /// continues towards +z. If the ray cannot pass the surface, the reason is returned as [`Termination`]:
    ///   - [`Termination::NoIntersection`]: the ray misses the surface. The ray is unmodified.
    ///   - [`Termination::Vignetted`]: the intersection point lies outside the clear aperture. The ray is moved to
    ///     the intersection point.
    ///   - [`Termination::TotalInternalReflection`]: no refracted solution exists. The ray is moved to the
    ///     intersection point.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given refractive index `n2` if <1.0 or not finite.
    pub fn refract_on_surface(
        &mut self,
        surface: &Surface,
        vertex_z: Length,
        n2: f64,
    ) -> LensResult<Option<Termination>> {
        if n2 < 1.0 || !n2.is_finite() {
            return Err(LensError::Other(
                "the refractive index must be >=1.0 and finite".into(),
            ));
        }
        let Some((intersection_point, surface_normal)) =
            surface.calc_intersect_and_normal(self, vertex_z)
        else {
            return Ok(Some(Termination::NoIntersection));
        };
        self.pos = intersection_point;
        if surface.clips(&intersection_point) {
            return Ok(Some(Termination::Vignetted));
        }
        if surface.is_reflecting() {
            self.reflect_unfolded(&surface_normal, vertex_z);
            self.refractive_index = n2;
            return Ok(None);
        }
        if !surface.is_refracting() {
            self.refractive_index = n2;
            return Ok(None);
        }
        // Snell's law in vector form (src: https://www.starkeffects.com/snells-law-vector.shtml)
        // mu=n_1 / n_2
        // s1: incoming direction
        // n: surface normal (pointing against s1)
        // s2: refracted dir
        //
        // s2 = mu * [ n x ( -n x s1) ] - n* sqrt(1 - mu^2 * (n x s1) dot (n x s1))
        let mu = self.refractive_index / n2;
        let s1 = self.dir.normalize();
        let n = surface_normal.normalize();
        let n_cross_s1 = n.cross(&s1);
        let dis = (mu * mu).mul_add(-n_cross_s1.dot(&n_cross_s1), 1.0);
        if dis.is_sign_negative() {
            return Ok(Some(Termination::TotalInternalReflection));
        }
        let refract_dir = mu * n.cross(&(-1.0 * n_cross_s1)) - n * dis.sqrt();
        self.dir = refract_dir.normalize();
        self.refractive_index = n2;
        Ok(None)
    }
    /// Reflect the direction at a surface with the given normal and mirror the frame at the vertex plane.
    ///
    /// After unfolding, the reflected ray again propagates towards +z.
    fn reflect_unfolded(&mut self, surface_normal: &Vector3<f64>, vertex_z: Length) {
        let n = surface_normal.normalize();
        let reflected = self.dir - 2.0 * self.dir.dot(&n) * n;
        self.dir = vector![reflected.x, reflected.y, -reflected.z].normalize();
        self.pos.z = 2.0 * vertex_z - self.pos.z;
    }
}

impl Display for Ray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pos: ({:.3} mm, {:.3} mm, {:.3} mm), dir: ({:.3}, {:.3}, {:.3}), wavelength: {:.3} nm, n: {:.4}",
            self.pos.x.get::<millimeter>(),
            self.pos.y.get::<millimeter>(),
            self.pos.z.get::<millimeter>(),
            self.dir.x,
            self.dir.y,
            self.dir.z,
            self.wvl.get::<nanometer>(),
            self.refractive_index
        )
    }
}
