use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::Cell;

#[cfg(test)]
#[path = "cell_ranges_tests.rs"]
mod cell_ranges_tests;

/// Half-open integer ranges of lattice translations, one per axis.
///
/// Axes beyond the periodic directions of the cell that produced the ranges hold the singleton
/// range $`[0, 1)`$.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticeRanges {
    /// The inclusive lower bounds.
    pub begin: [i64; 3],

    /// The exclusive upper bounds.
    pub end: [i64; 3],
}

impl Default for LatticeRanges {
    fn default() -> Self {
        LatticeRanges {
            begin: [0; 3],
            end: [1; 3],
        }
    }
}

impl LatticeRanges {
    /// Returns the number of integer triples in the box spanned by the ranges, saturating at
    /// [`i64::MAX`].
    pub fn npoint(&self) -> i64 {
        self.begin
            .iter()
            .zip(self.end.iter())
            .map(|(b, e)| e.saturating_sub(*b).max(0))
            .fold(1, i64::saturating_mul)
    }

    /// Checks if an integer triple lies inside the box spanned by the ranges.
    pub fn contains(&self, index: &[i64; 3]) -> bool {
        (0..3).all(|i| (self.begin[i]..self.end[i]).contains(&index[i]))
    }
}

impl Cell {
    /// Estimates, for each periodic direction, the integer lattice translations that can bring
    /// `origin` to within `rcut` of `center`.
    ///
    /// Each direction is bounded independently using the spacing between its lattice planes, so
    /// the resulting box is a superset of the translations inside the cutoff sphere.
    ///
    /// # Arguments
    ///
    /// * `origin` - The point to be translated.
    /// * `center` - The centre of the cutoff sphere.
    /// * `rcut` - The cutoff radius.
    ///
    /// # Returns
    ///
    /// The half-open translation ranges.
    pub fn set_ranges_rcut(
        &self,
        origin: &Point3<f64>,
        center: &Point3<f64>,
        rcut: f64,
    ) -> LatticeRanges {
        let frac = self.to_frac(&(center.coords - origin.coords));
        let mut ranges = LatticeRanges::default();
        for i in 0..self.nvec {
            let step = rcut / self.rspacings[i];
            ranges.begin[i] = (frac[i] - step).ceil() as i64;
            ranges.end[i] = (frac[i] + step).ceil() as i64;
        }
        ranges
    }
}
