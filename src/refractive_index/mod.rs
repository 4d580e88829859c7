//! Module for handling the refractive index of an optical material.
//!
//! The gaps of a sequential model are filled with homogeneous media. Their refractive index is looked up for the
//! wavelength of the traced ray using one of the models of [`RefractiveIndexType`].
#![warn(missing_docs)]
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

pub mod refr_index_const;
pub mod refr_index_schott;
pub mod refr_index_sellmeier1;

pub use refr_index_const::RefrIndexConst;
pub use refr_index_schott::RefrIndexSchott;
pub use refr_index_sellmeier1::RefrIndexSellmeier1;

use crate::error::{LensError, LensResult};

/// Available models for the calculation of refractive index
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum RefractiveIndexType {
    /// Trivial model returning a wavelength-independant constant
    Const(RefrIndexConst),
    /// Sellmeier 1 model
    Sellmeier1(RefrIndexSellmeier1),
    /// Schott model
    Schott(RefrIndexSchott),
}

impl Default for RefractiveIndexType {
    fn default() -> Self {
        Self::Const(RefrIndexConst::default())
    }
}

impl RefractiveIndexType {
    /// Get the refractive index value of the [`RefractiveIndexType`] for the given wavelength.
    ///
    /// # Errors
    ///
    /// This function returns an error if the the refractive index could not be calculated e.g.:
    ///   - the model would calculate a value below 1.0, NaN or infinity
    pub fn get_refractive_index(&self, wavelength: Length) -> LensResult<f64> {
        let refr_index = match self {
            Self::Const(refr_index_const) => refr_index_const.get_refractive_index(wavelength)?,
            Self::Sellmeier1(refr_index_sellmeier1) => {
                refr_index_sellmeier1.get_refractive_index(wavelength)?
            }
            Self::Schott(refr_index_schott) => {
                refr_index_schott.get_refractive_index(wavelength)?
            }
        };
        if refr_index < 1.0 || !refr_index.is_finite() {
            return Err(LensError::RefractiveIndex(
                "refractive index calculated by model is <1.0 or not finite".into(),
            ));
        }
        Ok(refr_index)
    }
}

impl Display for RefractiveIndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Const(_) => write!(f, "Constant"),
            Self::Sellmeier1(_) => write!(f, "Sellmeier equation"),
            Self::Schott(_) => write!(f, "Schott equation"),
        }
    }
}
/// All refractive index models must implement this trait.
pub trait RefractiveIndex {
    /// Get the refractive index value of the current model for the given wavelength.
    ///
    /// # Errors
    ///
    /// This function returns an error if the the refractive index could not be calculated.
    fn get_refractive_index(&self, wavelength: Length) -> LensResult<f64>;
}
