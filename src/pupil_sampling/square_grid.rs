//! Square lattice of pupil coordinates
use super::{PupilDistribution, PupilIter};
use crate::{
    error::{LensError, LensResult},
    utils::{f64_to_usize, usize_to_f64},
};
use itertools::iproduct;
use log::warn;
use nalgebra::point;
use serde::{Deserialize, Serialize};

/// Maximum number of lattice points on each side of the pupil center along one axis.
pub const MAX_HALF_WIDTH: usize = 10_000;

/// Square lattice of normalized pupil coordinates.
///
/// The lattice contains all points `(i * spacing, j * spacing)` with integer `i`, `j` inside the bounding square
/// `[-1, 1]²` of the pupil. The center of the pupil is always part of the lattice. A spacing of zero only yields
/// the pupil center. At most [`MAX_HALF_WIDTH`] points are placed on each side of the center, so a spacing below
/// `1 / MAX_HALF_WIDTH` only covers the central part of the pupil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquareGrid {
    spacing: f64,
}
impl SquareGrid {
    /// Create a new [`SquareGrid`].
    ///
    /// # Errors
    ///
    /// This function will return an error if the spacing is outside the interval `[0.0, 1.0]` (or `NaN`).
    pub fn new(spacing: f64) -> LensResult<Self> {
        if !(0.0..=1.0).contains(&spacing) {
            return Err(LensError::InvalidGeometry(
                "spacing must be within the interval [0.0, 1.0]".into(),
            ));
        }
        let grid = Self { spacing };
        if grid.lattice_extent() > usize_to_f64(MAX_HALF_WIDTH) {
            warn!(
                "pupil spacing {spacing:e} is too small, lattice truncated to {MAX_HALF_WIDTH} points on each side of the center"
            );
        }
        Ok(grid)
    }
    /// Returns the spacing of this [`SquareGrid`].
    #[must_use]
    pub const fn spacing(&self) -> f64 {
        self.spacing
    }
    /// Number of lattice points fitting on each side of the center along one axis, without truncation.
    fn lattice_extent(&self) -> f64 {
        if self.spacing == 0.0 {
            0.0
        } else {
            // allow for rounding errors of e.g. 1.0 / 0.1
            (1.0 / self.spacing + 1e-9).floor()
        }
    }
    fn half_width(&self) -> usize {
        f64_to_usize(self.lattice_extent()).min(MAX_HALF_WIDTH)
    }
    /// Returns the number of points generated by this [`SquareGrid`].
    #[must_use]
    pub fn nr_of_points(&self) -> usize {
        let side = 2 * self.half_width() + 1;
        side * side
    }
}

impl PupilDistribution for SquareGrid {
    fn iter(&self) -> PupilIter<'_> {
        let n = self.half_width();
        let spacing = self.spacing;
        let coordinate = move |k: usize| (usize_to_f64(k) - usize_to_f64(n)) * spacing;
        Box::new(
            iproduct!(0..=2 * n, 0..=2 * n)
                .map(move |(j, i)| point![coordinate(i), coordinate(j)]),
        )
    }
}
