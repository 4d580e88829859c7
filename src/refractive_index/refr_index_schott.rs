//! Refractive index following the Schott dispersion formula
use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::micrometer};

use super::RefractiveIndex;
use crate::error::{LensError, LensResult};

/// Schott model: `n² = a0 + a1 λ² + a2 λ⁻² + a3 λ⁻⁴ + a4 λ⁻⁶ + a5 λ⁻⁸` with λ in µm.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct RefrIndexSchott {
    a0: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    a4: f64,
    a5: f64,
}
impl RefrIndexSchott {
    /// Create a new refractive index model following the Schott equation.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given coefficients are not finite.
    pub fn new(a0: f64, a1: f64, a2: f64, a3: f64, a4: f64, a5: f64) -> LensResult<Self> {
        if [a0, a1, a2, a3, a4, a5].iter().any(|a| !a.is_finite()) {
            return Err(LensError::RefractiveIndex(
                "all coefficients must be finite.".into(),
            ));
        }
        Ok(Self {
            a0,
            a1,
            a2,
            a3,
            a4,
            a5,
        })
    }
}
impl RefractiveIndex for RefrIndexSchott {
    fn get_refractive_index(&self, wavelength: Length) -> LensResult<f64> {
        let lambda = wavelength.get::<micrometer>();
        Ok(f64::sqrt(
            self.a5.mul_add(
                lambda.powi(-8),
                self.a4.mul_add(
                    lambda.powi(-6),
                    self.a3.mul_add(
                        lambda.powi(-4),
                        self.a2
                            .mul_add(lambda.powi(-2), self.a1.mul_add(lambda.powi(2), self.a0)),
                    ),
                ),
            ),
        ))
    }
}
