#![warn(missing_docs)]
//! Module for handling pupil sampling
//!
//! A pupil sampling generates normalized pupil coordinates `(px, py)`. The unit circle corresponds to the edge of
//! the entrance pupil. The coordinates are mapped onto concrete rays by
//! [`OpticalSystem::rays`](crate::OpticalSystem::rays).
//!
//! ## Example
//!
//! ```rust
//! use lensray::pupil_sampling::{PupilSampling, SquareGrid};
//!
//! let sampling: PupilSampling = SquareGrid::new(1.0).unwrap().into();
//! let points = sampling.generate();
//! assert_eq!(points.len(), 9);
//! // iteration may be restarted at any time
//! assert_eq!(sampling.iter().count(), 9);
//! ```
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

mod hexapolar;
mod square_grid;

pub use hexapolar::Hexapolar;
pub use square_grid::{SquareGrid, MAX_HALF_WIDTH};

/// Lazy iterator over normalized pupil coordinates.
pub type PupilIter<'a> = Box<dyn Iterator<Item = Point2<f64>> + Send + 'a>;

/// Trait for the generation of pupil coordinates
pub trait PupilDistribution {
    /// Returns a fresh, lazy iterator over the normalized pupil coordinates.
    fn iter(&self) -> PupilIter<'_>;
    /// Generate the pupil coordinates.
    fn generate(&self) -> Vec<Point2<f64>> {
        self.iter().collect()
    }
}

/// Available pupil samplings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PupilSampling {
    /// square lattice of points
    SquareGrid(SquareGrid),
    /// center point surrounded by concentric rings of points
    Hexapolar(Hexapolar),
}
impl PupilSampling {
    /// Returns a fresh, lazy iterator over the normalized pupil coordinates of this [`PupilSampling`].
    #[must_use]
    pub fn iter(&self) -> PupilIter<'_> {
        self.distribution().iter()
    }
    /// Generate all normalized pupil coordinates of this [`PupilSampling`].
    #[must_use]
    pub fn generate(&self) -> Vec<Point2<f64>> {
        self.distribution().generate()
    }
    /// Check the invariants of the underlying distribution.
    ///
    /// # Errors
    ///
    /// This function will return an error if the parameters of the distribution are invalid.
    pub fn validate(&self) -> crate::error::LensResult<()> {
        match self {
            Self::SquareGrid(grid) => SquareGrid::new(grid.spacing()).map(|_| ()),
            Self::Hexapolar(_) => Ok(()),
        }
    }
    fn distribution(&self) -> &dyn PupilDistribution {
        match self {
            Self::SquareGrid(grid) => grid,
            Self::Hexapolar(hexapolar) => hexapolar,
        }
    }
}
impl Default for PupilSampling {
    fn default() -> Self {
        Self::Hexapolar(Hexapolar::default())
    }
}
impl<'a> IntoIterator for &'a PupilSampling {
    type Item = Point2<f64>;
    type IntoIter = PupilIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
impl From<SquareGrid> for PupilSampling {
    fn from(grid: SquareGrid) -> Self {
        Self::SquareGrid(grid)
    }
}
impl From<Hexapolar> for PupilSampling {
    fn from(hexapolar: Hexapolar) -> Self {
        Self::Hexapolar(hexapolar)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn into_iter() {
        let sampling = PupilSampling::from(SquareGrid::new(0.5).unwrap());
        let mut count = 0;
        for point in &sampling {
            assert!(point.x.abs() <= 1.0 && point.y.abs() <= 1.0);
            count += 1;
        }
        assert_eq!(count, 25);
    }
    #[test]
    fn restartable() {
        let sampling = PupilSampling::from(Hexapolar::new(2));
        let first: Vec<_> = sampling.iter().collect();
        let second: Vec<_> = sampling.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first, sampling.generate());
    }
    #[test]
    fn validate() {
        assert!(PupilSampling::from(SquareGrid::new(0.5).unwrap())
            .validate()
            .is_ok());
        let sampling: PupilSampling = serde_yaml::from_str("!SquareGrid\nspacing: 1.5\n").unwrap();
        assert!(sampling.validate().is_err());
    }
}
