#![warn(missing_docs)]
//! Field definitions
//!
//! A field point describes the off-axis object point rays are launched from. It is either given as an angle (for
//! objects at infinity or finite distance) or as a transverse object height (finite object distance only). Each
//! field carries the wavelength of its rays.
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use uom::si::{
    angle::degree,
    f64::{Angle, Length},
    length::{millimeter, nanometer},
};

use crate::error::{LensError, LensResult};

/// A field point of an optical system.
///
/// Off-axis field points are located in the y-z plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldSpec {
    /// A field given as angle of the incoming (collimated) beam with respect to the optical axis.
    Angle {
        /// field angle
        angle: Angle,
        /// wavelength
        wavelength: Length,
    },
    /// A field given as height of the object point above the optical axis.
    ObjectHeight {
        /// object height
        height: Length,
        /// wavelength
        wavelength: Length,
    },
}

fn check_wavelength(wavelength: Length) -> LensResult<()> {
    if wavelength.is_sign_negative() || !wavelength.is_finite() {
        return Err(LensError::InvalidGeometry(
            "wavelength must be >= 0.0 and finite".into(),
        ));
    }
    Ok(())
}

impl FieldSpec {
    /// Create a new [`FieldSpec::Angle`].
    ///
    /// # Errors
    ///
    /// This function will return
    ///   - [`LensError::InvalidGeometry`] if the wavelength is negative or not finite
    ///   - [`LensError::Field`] if the angle is not finite or its magnitude is >= 90°
    pub fn angle(angle: Angle, wavelength: Length) -> LensResult<Self> {
        let field = Self::Angle { angle, wavelength };
        field.validate()?;
        Ok(field)
    }
    /// Create a new [`FieldSpec::ObjectHeight`].
    ///
    /// # Errors
    ///
    /// This function will return
    ///   - [`LensError::InvalidGeometry`] if the wavelength is negative or not finite
    ///   - [`LensError::Field`] if the height is not finite
    pub fn object_height(height: Length, wavelength: Length) -> LensResult<Self> {
        let field = Self::ObjectHeight { height, wavelength };
        field.validate()?;
        Ok(field)
    }
    /// Check the invariants of this [`FieldSpec`].
    ///
    /// # Errors
    ///
    /// This function will return an error if one of the invariants listed in [`FieldSpec::angle`] or
    /// [`FieldSpec::object_height`] is violated.
    pub fn validate(&self) -> LensResult<()> {
        check_wavelength(self.wavelength())?;
        match self {
            Self::Angle { angle, .. } => {
                if !angle.is_finite() || angle.get::<degree>().abs() >= 90.0 {
                    return Err(LensError::Field(
                        "field angle must be finite and within (-90°, 90°)".into(),
                    ));
                }
            }
            Self::ObjectHeight { height, .. } => {
                if !height.is_finite() {
                    return Err(LensError::Field("object height must be finite".into()));
                }
            }
        }
        Ok(())
    }
    /// Returns the wavelength of this [`FieldSpec`].
    #[must_use]
    pub const fn wavelength(&self) -> Length {
        match self {
            Self::Angle { wavelength, .. } | Self::ObjectHeight { wavelength, .. } => *wavelength,
        }
    }
    /// Returns the absolute value of the field (angle in radians or height in meters).
    ///
    /// This is used for comparing fields of the same kind.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        match self {
            Self::Angle { angle, .. } => angle.value.abs(),
            Self::ObjectHeight { height, .. } => height.value.abs(),
        }
    }
    /// Returns `true` if both fields are of the same kind (angle or object height).
    #[must_use]
    pub fn is_same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Angle { angle, wavelength } => write!(
                f,
                "angle: {:.3}°, wavelength: {:.3} nm",
                angle.get::<degree>(),
                wavelength.get::<nanometer>()
            ),
            Self::ObjectHeight { height, wavelength } => write!(
                f,
                "object height: {:.3} mm, wavelength: {:.3} nm",
                height.get::<millimeter>(),
                wavelength.get::<nanometer>()
            ),
        }
    }
}

/// Check a set of fields for consistency.
///
/// # Errors
///
/// This function will return an error if
///   - the list of fields is empty
///   - any field is invalid
///   - the fields are of different kinds
pub fn validate_fields(fields: &[FieldSpec]) -> LensResult<()> {
    let Some(first) = fields.first() else {
        return Err(LensError::Field("at least one field is required".into()));
    };
    for field in fields {
        field.validate()?;
        if !field.is_same_kind(first) {
            return Err(LensError::Field(
                "all fields must be of the same type".into(),
            ));
        }
    }
    Ok(())
}
