#![warn(missing_docs)]
//! Lensray specific error structures
use std::{error::Error, fmt::Display};

/// Lensray specific Result type
pub type LensResult<T> = std::result::Result<T, LensError>;

/// Errors that can be returned by various lensray functions.
///
/// Per-ray failures during a real ray trace (missed surfaces, vignetting, total internal reflection) are not
/// reported through this type but recorded as [`Termination`](crate::raytrace::Termination) in the trace result.
#[derive(Debug, PartialEq, Eq)]
pub enum LensError {
    /// a surface was constructed with parameters violating its invariants (e.g. negative semi-diameter)
    InvalidGeometry(String),
    /// invalid field or pupil sampling definitions
    Field(String),
    /// errors while assembling a sequential surface / gap model or an [`OpticalSystem`](crate::OpticalSystem)
    OpticalSystem(String),
    /// errors while evaluating a refractive index model
    RefractiveIndex(String),
    /// first-order quantities which cannot be determined
    Paraxial(String),
    /// errors while reading or writing a system description
    Config(String),
    /// errors not falling in one of the categories above
    Other(String),
}

impl Display for LensError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGeometry(m) => {
                write!(f, "InvalidGeometry:{m}")
            }
            Self::Field(m) => {
                write!(f, "Field:{m}")
            }
            Self::OpticalSystem(m) => {
                write!(f, "OpticalSystem:{m}")
            }
            Self::RefractiveIndex(m) => {
                write!(f, "RefractiveIndex:{m}")
            }
            Self::Paraxial(m) => {
                write!(f, "Paraxial:{m}")
            }
            Self::Config(m) => {
                write!(f, "Config:{m}")
            }
            Self::Other(m) => write!(f, "Lensray Error:Other:{m}"),
        }
    }
}
impl Error for LensError {}

impl std::convert::From<String> for LensError {
    fn from(msg: String) -> Self {
        Self::Other(msg)
    }
}
