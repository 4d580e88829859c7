//! Wavelength-independent refractive index
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;

use super::RefractiveIndex;
use crate::error::{LensError, LensResult};

/// Refractive index model returning the same value for all wavelengths.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct RefrIndexConst {
    refractive_index: f64,
}
impl RefrIndexConst {
    /// Create a new constant refractive index model.
    ///
    /// # Errors
    ///
    /// This function will return an error if the given refractive index is < 1.0 or not finite.
    pub fn new(refractive_index: f64) -> LensResult<Self> {
        if refractive_index < 1.0 || !refractive_index.is_finite() {
            return Err(LensError::RefractiveIndex(
                "refractive index must be >=1.0 and finite".into(),
            ));
        }
        Ok(Self { refractive_index })
    }
}
impl Default for RefrIndexConst {
    /// Vacuum (n = 1.0)
    fn default() -> Self {
        Self {
            refractive_index: 1.0,
        }
    }
}
impl RefractiveIndex for RefrIndexConst {
    fn get_refractive_index(&self, _wavelength: Length) -> LensResult<f64> {
        Ok(self.refractive_index)
    }
}
#[cfg(test)]
mod test {
    use super::*;
    use crate::nanometer;
    #[test]
    fn new() {
        assert!(RefrIndexConst::new(0.99).is_err());
        assert!(RefrIndexConst::new(f64::NAN).is_err());
        assert!(RefrIndexConst::new(f64::INFINITY).is_err());
        let refr = RefrIndexConst::new(1.5).unwrap();
        assert_eq!(refr.refractive_index, 1.5);
    }
    #[test]
    fn get_refractive_index() {
        let refr = RefrIndexConst::new(1.515).unwrap();
        assert_eq!(refr.get_refractive_index(nanometer!(400.0)).unwrap(), 1.515);
        assert_eq!(refr.get_refractive_index(nanometer!(1053.0)).unwrap(), 1.515);
    }
    #[test]
    fn vacuum() {
        let refr = RefrIndexConst::default();
        assert_eq!(refr.get_refractive_index(nanometer!(587.6)).unwrap(), 1.0);
    }
}
