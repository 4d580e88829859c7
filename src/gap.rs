//! The homogeneous medium between two surfaces of a sequential model.
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use crate::{
    error::{LensError, LensResult},
    refractive_index::RefractiveIndexType,
};

/// A gap of given axial thickness filled with a homogeneous material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    thickness: Length,
    material: RefractiveIndexType,
}
impl Gap {
    /// Create a new [`Gap`].
    ///
    /// An infinite thickness is accepted here. Only the object space gap of a
    /// [`SequentialModel`](crate::sequential_model::SequentialModel) may use it.
    ///
    /// # Errors
    ///
    /// This function will return an error if the thickness is negative or `NaN`.
    pub fn new(thickness: Length, material: RefractiveIndexType) -> LensResult<Self> {
        let gap = Self {
            thickness,
            material,
        };
        gap.validate()?;
        Ok(gap)
    }
    /// Check the invariants of this [`Gap`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the thickness is negative or `NaN`.
    pub fn validate(&self) -> LensResult<()> {
        if self.thickness.is_nan() || self.thickness.is_sign_negative() {
            return Err(LensError::OpticalSystem(
                "gap thickness must be >= 0.0".into(),
            ));
        }
        Ok(())
    }
    /// Returns the axial thickness of this [`Gap`].
    #[must_use]
    pub const fn thickness(&self) -> Length {
        self.thickness
    }
    /// Returns a reference to the material of this [`Gap`].
    #[must_use]
    pub const fn material(&self) -> &RefractiveIndexType {
        &self.material
    }
    /// Returns the refractive index of the material of this [`Gap`] for the given wavelength.
    ///
    /// # Errors
    ///
    /// This function will return an error if the material model fails for the given wavelength.
    pub fn refractive_index(&self, wavelength: Length) -> LensResult<f64> {
        self.material.get_refractive_index(wavelength)
    }
}
