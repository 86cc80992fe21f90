use nalgebra::{Point3, Vector3};
use ndarray::Array2;
use num_traits::ToPrimitive;

use super::{Cell, CellError, LatticeRanges};

#[cfg(test)]
#[path = "cell_selection_tests.rs"]
mod cell_selection_tests;

/// Maps a lattice index onto the grid extent `[0, shape)`.
///
/// # Arguments
///
/// * `i` - The candidate index.
/// * `shape` - The extent of the grid along this axis. This must be positive.
/// * `pbc_active` - Boolean indicating if the grid is periodic along this axis.
///
/// # Returns
///
/// `i` itself if it already lies within the extent, its non-negative remainder modulo `shape` if
/// the axis is periodic, or `None` if the axis is not periodic and `i` has no image on the grid.
pub fn smart_wrap(i: i64, shape: i64, pbc_active: bool) -> Option<i64> {
    if (0..shape).contains(&i) {
        Some(i)
    } else if pbc_active {
        Some(i.rem_euclid(shape))
    } else {
        None
    }
}

/// A structure describing how one axis is traversed during lattice selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisDescriptor {
    /// The first candidate index.
    pub begin: i64,

    /// One past the last candidate index.
    pub end: i64,

    /// The extent of the grid along this axis.
    pub shape: i64,

    /// Boolean indicating if the grid is periodic along this axis.
    pub pbc_active: bool,
}

impl AxisDescriptor {
    /// An axis visited exactly once, at index zero.
    fn singleton() -> Self {
        AxisDescriptor {
            begin: 0,
            end: 1,
            shape: 1,
            pbc_active: false,
        }
    }

    /// Wraps a candidate index along this axis. See [`smart_wrap`].
    pub fn wrap(&self, i: i64) -> Option<i64> {
        smart_wrap(i, self.shape, self.pbc_active)
    }
}

impl Cell {
    /// Builds the descriptors of all three axes for a lattice selection. Axes beyond the
    /// periodic directions of this cell are singletons.
    pub fn axis_descriptors(
        &self,
        ranges: &LatticeRanges,
        shape: &[i64],
        pbc_active: &[bool],
    ) -> [AxisDescriptor; 3] {
        let mut axes = [AxisDescriptor::singleton(); 3];
        for (i, axis) in axes.iter_mut().enumerate().take(self.nvec) {
            *axis = AxisDescriptor {
                begin: ranges.begin[i],
                end: ranges.end[i],
                shape: shape[i],
                pbc_active: pbc_active[i],
            };
        }
        axes
    }

    /// Selects the grid points whose lattice translations of `origin` lie strictly within `rcut`
    /// of `center`.
    ///
    /// Every integer triple in `ranges` is wrapped onto the grid axis by axis. When an axis has
    /// no image on a non-periodic grid, the remaining inner iterations for that index are
    /// skipped. For the surviving triples, the unwrapped triple is used as fractional coordinates
    /// to locate the translated point.
    ///
    /// # Arguments
    ///
    /// * `origin` - The position of the grid point with index zero.
    /// * `center` - The centre of the cutoff sphere.
    /// * `rcut` - The cutoff radius.
    /// * `ranges` - The candidate translations, usually from [`Self::set_ranges_rcut`].
    /// * `shape` - The grid extent along each periodic direction.
    /// * `pbc_active` - Booleans indicating if the grid is periodic along each direction.
    /// * `indexes` - The output buffer. For every selected point, the first [`Self::nvec`]
    /// wrapped indices are written consecutively. This must be large enough to hold all selected
    /// points.
    ///
    /// # Returns
    ///
    /// The number of selected points, or an error if the cell is not periodic.
    #[allow(clippy::too_many_arguments)]
    pub fn select_inside(
        &self,
        origin: &Point3<f64>,
        center: &Point3<f64>,
        rcut: f64,
        ranges: &LatticeRanges,
        shape: &[i64],
        pbc_active: &[bool],
        indexes: &mut [i64],
    ) -> Result<usize, CellError> {
        if self.nvec == 0 {
            return Err(CellError::NonPeriodic);
        }
        let nvec = self.nvec;
        let axes = self.axis_descriptors(ranges, shape, pbc_active);
        log::debug!("Lattice selection axes: {axes:?}");

        let mut nselect = 0;
        for i0 in axes[0].begin..axes[0].end {
            let j0 = match axes[0].wrap(i0) {
                Some(j) => j,
                None => continue,
            };
            for i1 in axes[1].begin..axes[1].end {
                let j1 = match axes[1].wrap(i1) {
                    Some(j) => j,
                    None => continue,
                };
                for i2 in axes[2].begin..axes[2].end {
                    let j2 = match axes[2].wrap(i2) {
                        Some(j) => j,
                        None => continue,
                    };

                    let frac = Vector3::new(i0 as f64, i1 as f64, i2 as f64);
                    let d = (origin.coords + self.to_cart(&frac) - center.coords).norm();
                    if d < rcut {
                        log::trace!(
                            "i = ({i0}, {i1}, {i2}), j = ({j0}, {j1}, {j2}), d = {d:.6e}, rcut = {rcut:.6e}"
                        );
                        let wrapped = [j0, j1, j2];
                        indexes[nselect * nvec..(nselect + 1) * nvec]
                            .copy_from_slice(&wrapped[..nvec]);
                        nselect += 1;
                    }
                }
            }
        }
        Ok(nselect)
    }

    /// Returns the length of an index buffer large enough for every candidate that
    /// [`Self::select_inside`] visits, *i.e.* the number of candidates over the padded axes
    /// times [`Self::nvec`].
    ///
    /// # Returns
    ///
    /// The buffer length, or an error if it cannot be represented.
    pub fn selection_capacity(
        &self,
        ranges: &LatticeRanges,
        shape: &[i64],
        pbc_active: &[bool],
    ) -> Result<usize, CellError> {
        self.axis_descriptors(ranges, shape, pbc_active)
            .iter()
            .map(|axis| axis.end.checked_sub(axis.begin).map(|n| n.max(0)))
            .chain(std::iter::once(self.nvec.to_i64()))
            .try_fold(1i64, |acc, n| n.and_then(|n| acc.checked_mul(n)))
            .and_then(|capacity| capacity.to_usize())
            .ok_or(CellError::SelectionTooLarge)
    }

    /// Selects grid points as in [`Self::select_inside`], but with a buffer sized by
    /// [`Self::selection_capacity`].
    ///
    /// # Returns
    ///
    /// The selected wrapped indices, one row per selected point and one column per periodic
    /// direction.
    pub fn select_inside_indices(
        &self,
        origin: &Point3<f64>,
        center: &Point3<f64>,
        rcut: f64,
        ranges: &LatticeRanges,
        shape: &[i64],
        pbc_active: &[bool],
    ) -> Result<Array2<i64>, CellError> {
        if self.nvec == 0 {
            return Err(CellError::NonPeriodic);
        }
        let mut buffer = vec![0; self.selection_capacity(ranges, shape, pbc_active)?];
        let nselect =
            self.select_inside(origin, center, rcut, ranges, shape, pbc_active, &mut buffer)?;
        let nvec = self.nvec;
        Ok(Array2::from_shape_fn((nselect, nvec), |(i, j)| {
            buffer[i * nvec + j]
        }))
    }
}
