//! Refractive index following the Sellmeier 1 dispersion formula
use serde::{Deserialize, Serialize};
use uom::si::{f64::Length, length::micrometer};

use super::RefractiveIndex;
use crate::error::LensResult;

/// Sellmeier 1 model: `n² = 1 + Σ kᵢ λ² / (λ² − lᵢ)` with λ in µm.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RefrIndexSellmeier1 {
    k1: f64,
    k2: f64,
    k3: f64,
    l1: f64,
    l2: f64,
    l3: f64,
}
impl RefrIndexSellmeier1 {
    /// Create a new Sellmeier 1 model from its six coefficients (`lᵢ` in µm²).
    #[must_use]
    pub const fn new(k1: f64, k2: f64, k3: f64, l1: f64, l2: f64, l3: f64) -> Self {
        Self {
            k1,
            k2,
            k3,
            l1,
            l2,
            l3,
        }
    }
    /// Schott N-BK7
    #[must_use]
    pub const fn nbk7() -> Self {
        Self::new(
            1.039_612_12,
            0.231_792_344,
            1.010_469_45,
            0.006_000_698_67,
            0.020_017_914_4,
            103.560_653,
        )
    }
}
impl Default for RefrIndexSellmeier1 {
    fn default() -> Self {
        Self::nbk7()
    }
}
impl RefractiveIndex for RefrIndexSellmeier1 {
    fn get_refractive_index(&self, wavelength: Length) -> LensResult<f64> {
        let lambda = wavelength.get::<micrometer>();
        let l_sq = lambda * lambda;
        Ok(f64::sqrt(
            1.0 + self.k1 * l_sq / (l_sq - self.l1)
                + self.k2 * l_sq / (l_sq - self.l2)
                + self.k3 * l_sq / (l_sq - self.l3),
        ))
    }
}
