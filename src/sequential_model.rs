#![warn(missing_docs)]
//! The sequential model of an optical system
//!
//! A [`SequentialModel`] is an ordered list of [`Surface`]s separated by [`Gap`]s. Gap `i` lies between surface
//! `i` and surface `i + 1`. The first surface is the object plane, the last one the image plane.
use num::Zero;
use uom::si::f64::Length;

use crate::{
    error::{LensError, LensResult},
    gap::Gap,
    meter,
    surface::Surface,
};

/// A single step of a sequential trace: passing a surface from the medium before into the medium after it.
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    /// the gap in front of the surface
    pub gap_before: &'a Gap,
    /// the surface
    pub surface: &'a Surface,
    /// the gap behind the surface (`None` for the image plane)
    pub gap_after: Option<&'a Gap>,
}

/// Validated sequence of surfaces and gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct SequentialModel {
    surfaces: Vec<Surface>,
    gaps: Vec<Gap>,
}

impl SequentialModel {
    /// Create a new [`SequentialModel`].
    ///
    /// # Errors
    ///
    /// This function will return an error if
    ///   - less than three surfaces are given
    ///   - the first surface is not [`Surface::Object`] or the last one is not [`Surface::Image`]
    ///   - [`Surface::Object`] or [`Surface::Image`] appear elsewhere in the sequence
    ///   - the number of gaps is not the number of surfaces minus one
    ///   - a gap thickness is negative or not finite (only the object space gap may be infinite)
    ///   - a surface violates its invariants
    pub fn new(surfaces: Vec<Surface>, gaps: Vec<Gap>) -> LensResult<Self> {
        if surfaces.len() < 3 {
            return Err(LensError::OpticalSystem(
                "a sequential model needs at least three surfaces".into(),
            ));
        }
        if surfaces.len() != gaps.len() + 1 {
            return Err(LensError::OpticalSystem(format!(
                "number of gaps ({}) must be number of surfaces ({}) minus one",
                gaps.len(),
                surfaces.len()
            )));
        }
        if surfaces.first() != Some(&Surface::Object) {
            return Err(LensError::OpticalSystem(
                "first surface must be the object plane".into(),
            ));
        }
        if surfaces.last() != Some(&Surface::Image) {
            return Err(LensError::OpticalSystem(
                "last surface must be the image plane".into(),
            ));
        }
        let last_idx = surfaces.len() - 1;
        for (idx, surface) in surfaces.iter().enumerate() {
            if (1..last_idx).contains(&idx) && matches!(surface, Surface::Object | Surface::Image) {
                return Err(LensError::OpticalSystem(format!(
                    "surface {idx} must not be an object or image plane"
                )));
            }
            surface.validate()?;
        }
        for (idx, gap) in gaps.iter().enumerate() {
            gap.validate()?;
            if idx > 0 && !gap.thickness().is_finite() {
                return Err(LensError::OpticalSystem(format!(
                    "thickness of gap {idx} must be finite"
                )));
            }
        }
        Ok(Self { surfaces, gaps })
    }
    /// Returns a reference to the surfaces of this [`SequentialModel`].
    #[must_use]
    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }
    /// Returns a reference to the gaps of this [`SequentialModel`].
    #[must_use]
    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }
    /// Returns the number of surfaces (including object and image plane).
    #[must_use]
    pub fn nr_of_surfaces(&self) -> usize {
        self.surfaces.len()
    }
    /// Returns the index of the last surface in front of the image plane.
    #[must_use]
    pub fn last_real_surface(&self) -> usize {
        self.surfaces.len() - 2
    }
    /// Returns `true` if the object is located at infinity (infinite object space gap).
    #[must_use]
    pub fn is_object_at_infinity(&self) -> bool {
        self.gaps
            .first()
            .is_some_and(|gap| gap.thickness().is_infinite())
    }
    /// Returns the axial positions of all surface vertices.
    ///
    /// The positions are measured from the vertex of surface 1. The object plane is located at `-t₀` (which is
    /// `-∞` for an object at infinity).
    #[must_use]
    pub fn vertex_positions(&self) -> Vec<Length> {
        let mut positions = Vec::with_capacity(self.surfaces.len());
        positions.push(-self.gaps[0].thickness());
        let mut z = Length::zero();
        positions.push(z);
        for gap in &self.gaps[1..] {
            z += gap.thickness();
            positions.push(z);
        }
        positions
    }
    /// Returns the tracing steps for the surfaces 1 ... N-1.
    pub fn steps(&self) -> impl Iterator<Item = Step<'_>> + '_ {
        self.surfaces
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, surface)| Step {
                gap_before: &self.gaps[idx - 1],
                surface,
                gap_after: self.gaps.get(idx),
            })
    }
    /// Returns the refractive indices of all gaps for the given wavelength.
    ///
    /// # Errors
    ///
    /// This function will return an error if a material model fails for the given wavelength.
    pub fn refractive_indices(&self, wavelength: Length) -> LensResult<Vec<f64>> {
        self.gaps
            .iter()
            .map(|gap| gap.refractive_index(wavelength))
            .collect()
    }
    /// Returns the axial distance from the object plane to the vertex of surface 1.
    ///
    /// Returns +∞ for an object at infinity.
    #[must_use]
    pub fn object_distance(&self) -> Length {
        self.gaps.first().map_or_else(|| meter!(0.0), Gap::thickness)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        millimeter,
        refractive_index::{RefrIndexConst, RefractiveIndexType},
    };
    use assert_matches::assert_matches;

    fn air(thickness: f64) -> Gap {
        Gap::new(millimeter!(thickness), RefractiveIndexType::default()).unwrap()
    }
    fn glass(thickness: f64) -> Gap {
        Gap::new(
            millimeter!(thickness),
            RefractiveIndexType::Const(RefrIndexConst::new(1.5).unwrap()),
        )
        .unwrap()
    }
    fn lens() -> Vec<Surface> {
        vec![
            Surface::Object,
            Surface::conic(millimeter!(25.8), 0.0, millimeter!(12.5)).unwrap(),
            Surface::flat(millimeter!(12.5)).unwrap(),
            Surface::Image,
        ]
    }
    #[test]
    fn new() {
        let model =
            SequentialModel::new(lens(), vec![air(f64::INFINITY), glass(5.3), air(46.6)]).unwrap();
        assert_eq!(model.nr_of_surfaces(), 4);
        assert_eq!(model.last_real_surface(), 2);
        assert!(model.is_object_at_infinity());
        assert_eq!(model.surfaces().len(), 4);
        assert_eq!(model.gaps().len(), 3);
    }
    #[test]
    fn new_wrong_counts() {
        assert_matches!(
            SequentialModel::new(lens(), vec![air(10.0), glass(5.3)]),
            Err(LensError::OpticalSystem(_))
        );
        assert_matches!(
            SequentialModel::new(vec![Surface::Object, Surface::Image], vec![air(10.0)]),
            Err(LensError::OpticalSystem(_))
        );
    }
    #[test]
    fn new_wrong_order() {
        let mut surfaces = lens();
        surfaces.swap(0, 1);
        assert_matches!(
            SequentialModel::new(surfaces, vec![air(10.0), glass(5.3), air(46.6)]),
            Err(LensError::OpticalSystem(_))
        );
        let mut surfaces = lens();
        surfaces.swap(2, 3);
        assert_matches!(
            SequentialModel::new(surfaces, vec![air(10.0), glass(5.3), air(46.6)]),
            Err(LensError::OpticalSystem(_))
        );
        let mut surfaces = lens();
        surfaces[1] = Surface::Image;
        assert_matches!(
            SequentialModel::new(surfaces, vec![air(10.0), glass(5.3), air(46.6)]),
            Err(LensError::OpticalSystem(_))
        );
    }
    #[test]
    fn new_infinite_inner_gap() {
        assert_matches!(
            SequentialModel::new(lens(), vec![air(10.0), glass(f64::INFINITY), air(46.6)]),
            Err(LensError::OpticalSystem(_))
        );
    }
    #[test]
    fn vertex_positions() {
        let model = SequentialModel::new(lens(), vec![air(10.0), glass(5.0), air(45.0)]).unwrap();
        assert!(!model.is_object_at_infinity());
        assert_eq!(model.object_distance(), millimeter!(10.0));
        let z = model.vertex_positions();
        assert_eq!(z[0], millimeter!(-10.0));
        assert_eq!(z[1], millimeter!(0.0));
        assert_eq!(z[2], millimeter!(5.0));
        approx::assert_abs_diff_eq!(z[3].value, 0.05, epsilon = 1e-15);
        let model =
            SequentialModel::new(lens(), vec![air(f64::INFINITY), glass(5.0), air(45.0)]).unwrap();
        assert_eq!(model.vertex_positions()[0], millimeter!(f64::NEG_INFINITY));
    }
    #[test]
    fn steps() {
        let model = SequentialModel::new(lens(), vec![air(10.0), glass(5.0), air(45.0)]).unwrap();
        let steps: Vec<_> = model.steps().collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].gap_before, &air(10.0));
        assert_eq!(steps[0].gap_after, Some(&glass(5.0)));
        assert_eq!(steps[2].surface, &Surface::Image);
        assert!(steps[2].gap_after.is_none());
    }
    #[test]
    fn refractive_indices() {
        let model = SequentialModel::new(lens(), vec![air(10.0), glass(5.0), air(45.0)]).unwrap();
        assert_eq!(
            model
                .refractive_indices(crate::nanometer!(587.6))
                .unwrap(),
            vec![1.0, 1.5, 1.0]
        );
    }
}
