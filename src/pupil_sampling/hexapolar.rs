//! Circular, hexapolar pupil sampling
use super::{PupilDistribution, PupilIter};
use nalgebra::{point, Point2};
use serde::{Deserialize, Serialize};
use std::iter;

/// Circular, hexapolar distribution of normalized pupil coordinates.
///
/// The center point is surrounded by `nr_of_rings` equidistant rings. The outermost ring lies on the pupil edge.
/// Ring `i` (counted from 1) holds `6 * i` points.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Copy)]
pub struct Hexapolar {
    nr_of_rings: u8,
}
impl Hexapolar {
    /// Create a new [`Hexapolar`] distribution generator.
    ///
    /// If `nr_of_rings` is zero only the central point at (0,0) is generated.
    #[must_use]
    pub const fn new(nr_of_rings: u8) -> Self {
        Self { nr_of_rings }
    }
    /// Returns the number of rings of this [`Hexapolar`].
    #[must_use]
    pub const fn nr_of_rings(&self) -> u8 {
        self.nr_of_rings
    }
    /// Returns the number of points generated by this [`Hexapolar`].
    #[must_use]
    pub fn nr_of_points(&self) -> usize {
        let n = usize::from(self.nr_of_rings);
        1 + 3 * n * (n + 1)
    }
}
impl Default for Hexapolar {
    fn default() -> Self {
        Self { nr_of_rings: 7 }
    }
}

impl PupilDistribution for Hexapolar {
    fn iter(&self) -> PupilIter<'_> {
        let nr_of_rings = self.nr_of_rings;
        let rings = (1..=nr_of_rings).flat_map(move |ring| {
            let radius = f64::from(ring) / f64::from(nr_of_rings);
            let points_per_ring = 6 * u16::from(ring);
            let angle_step = 2.0 * std::f64::consts::PI / f64::from(points_per_ring);
            (0..points_per_ring).map(move |point_nr| {
                let (sin, cos) = (f64::from(point_nr) * angle_step).sin_cos();
                point![radius * cos, radius * sin]
            })
        });
        Box::new(iter::once(Point2::origin()).chain(rings))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    #[test]
    fn generate_one() {
        let g = Hexapolar::new(0);
        assert_eq!(g.generate(), vec![Point2::origin()]);
        assert_eq!(g.nr_of_points(), 1);
    }
    #[test]
    fn generate() {
        let g = Hexapolar::new(1);
        assert_eq!(g.generate().len(), 7);
        let g = Hexapolar::new(2);
        assert_eq!(g.generate().len(), 19);
        assert_eq!(g.nr_of_points(), 19);
    }
    #[test]
    fn generate_max() {
        let g = Hexapolar::new(u8::MAX);
        assert_eq!(g.generate().len(), 195_841);
        assert_eq!(g.nr_of_points(), 195_841);
    }
    #[test]
    fn outer_ring_on_pupil_edge() {
        let g = Hexapolar::new(3);
        let points = g.generate();
        let outer = &points[points.len() - 18..];
        for p in outer {
            assert_abs_diff_eq!(p.coords.norm(), 1.0, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(points[1].x, 1.0 / 3.0, epsilon = 1e-12);
    }
}
