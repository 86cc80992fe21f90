//! Simulation cells with zero, one, two, or three periodic directions.

use std::error::Error;
use std::fmt;

use itertools::Itertools;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::io::format::write_subtitle;

mod cell_ranges;
mod cell_selection;

pub use cell_ranges::LatticeRanges;
pub use cell_selection::{smart_wrap, AxisDescriptor};


/// Relative threshold below which a set of lattice vectors is considered linearly dependent.
const DEGENERACY_THRESHOLD: f64 = 1e-10;

// =================
// Error definitions
// =================

/// An enumerated type for errors detected by [`Cell`] operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CellError {
    /// Variant for an axis index outside the active periodic directions of the cell.
    InvalidAxis {
        /// The requested axis.
        axis: usize,

        /// The number of active periodic directions of the cell.
        nvec: usize,
    },

    /// Variant for an operation that requires at least one periodic direction.
    NonPeriodic,

    /// Variant for an unsupported number of periodic directions.
    InvalidDimensionality(usize),

    /// Variant for lattice vectors that do not span as many dimensions as there are vectors.
    DegenerateVectors,

    /// Variant for translation ranges whose candidate count does not fit in memory.
    SelectionTooLarge,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellError::InvalidAxis { axis, nvec } => write!(
                f,
                "Cell error: axis index {axis} is not valid for a cell with {nvec} periodic direction(s)."
            ),
            CellError::NonPeriodic => write!(
                f,
                "Cell error: the cell must be at least 1D periodic for this operation."
            ),
            CellError::InvalidDimensionality(nvec) => write!(
                f,
                "Cell error: the number of periodic directions must be 0, 1, 2, or 3, but {nvec} was given."
            ),
            CellError::DegenerateVectors => {
                write!(f, "Cell error: the cell vectors are degenerate.")
            }
            CellError::SelectionTooLarge => write!(
                f,
                "Cell error: the number of candidate lattice translations is too large."
            ),
        }
    }
}

impl Error for CellError {}

// ==================
// Struct definitions
// ==================

/// A structure describing a simulation cell with up to three periodic directions.
///
/// Three real-space vector slots and three reciprocal vector slots are always stored, but only
/// the first [`Self::nvec`] of each describe periodic directions. The reciprocal vectors form the
/// dual basis of the real-space vectors, *i.e.* $`\mathbf{g}_i \cdot \mathbf{r}_j = \delta_{ij}`$.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCell", into = "RawCell")]
pub struct Cell {
    /// The number of active periodic directions.
    nvec: usize,

    /// The real-space lattice vectors.
    rvecs: [Vector3<f64>; 3],

    /// The reciprocal lattice vectors.
    gvecs: [Vector3<f64>; 3],

    /// The spacings between lattice planes, $`1 / |\mathbf{g}_i|`$.
    rspacings: [f64; 3],

    /// The spacings between reciprocal lattice planes, $`1 / |\mathbf{r}_i|`$.
    gspacings: [f64; 3],

    /// The length, area, or volume of the cell, depending on the number of periodic directions.
    volume: f64,
}

impl Default for Cell {
    fn default() -> Self {
        let basis = [Vector3::x(), Vector3::y(), Vector3::z()];
        Cell {
            nvec: 0,
            rvecs: basis,
            gvecs: basis,
            rspacings: [1.0; 3],
            gspacings: [1.0; 3],
            volume: 0.0,
        }
    }
}

impl Cell {
    /// Constructs a non-periodic cell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a cell from its periodic real-space lattice vectors only.
    ///
    /// The real-space basis is completed to three vectors with orthonormal vectors spanning the
    /// complement of the periodic directions, and the reciprocal vectors are obtained as the dual
    /// basis of the completed real-space basis. Fractional and Cartesian coordinates are therefore
    /// interconvertible for all three components regardless of the periodicity.
    ///
    /// # Arguments
    ///
    /// * `rvecs` - Zero to three real-space lattice vectors.
    ///
    /// # Returns
    ///
    /// The constructed cell, or an error if more than three vectors are given or if they are
    /// linearly dependent.
    pub fn from_rvecs(rvecs: &[Vector3<f64>]) -> Result<Self, CellError> {
        let nvec = rvecs.len();
        if nvec > 3 {
            return Err(CellError::InvalidDimensionality(nvec));
        }
        let mut full_rvecs = [Vector3::x(), Vector3::y(), Vector3::z()];
        full_rvecs[..nvec].copy_from_slice(rvecs);
        match nvec {
            1 => {
                let (c1, c2) =
                    orthonormal_complement(&rvecs[0]).ok_or(CellError::DegenerateVectors)?;
                full_rvecs[1] = c1;
                full_rvecs[2] = c2;
            }
            2 => {
                full_rvecs[2] = rvecs[0]
                    .cross(&rvecs[1])
                    .try_normalize(f64::MIN_POSITIVE)
                    .ok_or(CellError::DegenerateVectors)?;
            }
            _ => {}
        }

        let rmat = Matrix3::from_rows(&[
            full_rvecs[0].transpose(),
            full_rvecs[1].transpose(),
            full_rvecs[2].transpose(),
        ]);
        let scale: f64 = full_rvecs.iter().map(|rvec| rvec.norm()).product();
        if !(rmat.determinant().abs() > DEGENERACY_THRESHOLD * scale) {
            return Err(CellError::DegenerateVectors);
        }
        let gmat = rmat
            .try_inverse()
            .ok_or(CellError::DegenerateVectors)?
            .transpose();
        let full_gvecs = [
            gmat.row(0).transpose(),
            gmat.row(1).transpose(),
            gmat.row(2).transpose(),
        ];

        let mut cell = Cell::new();
        cell.update(&full_rvecs, &full_gvecs, nvec)?;
        Ok(cell)
    }

    /// Replaces the lattice vectors of this cell and recomputes all derived quantities.
    ///
    /// The reciprocal vectors must be the dual basis of the real-space vectors for the first
    /// `nvec` slots. This is not verified.
    ///
    /// # Arguments
    ///
    /// * `rvecs` - The real-space lattice vectors.
    /// * `gvecs` - The reciprocal lattice vectors.
    /// * `nvec` - The number of active periodic directions.
    ///
    /// # Returns
    ///
    /// An error if `nvec` is larger than three, in which case the cell is left unchanged.
    pub fn update(
        &mut self,
        rvecs: &[Vector3<f64>; 3],
        gvecs: &[Vector3<f64>; 3],
        nvec: usize,
    ) -> Result<(), CellError> {
        let volume = calc_volume(rvecs, nvec)?;
        self.nvec = nvec;
        self.rvecs = *rvecs;
        self.gvecs = *gvecs;
        for i in 0..3 {
            self.rspacings[i] = 1.0 / gvecs[i].norm();
            self.gspacings[i] = 1.0 / rvecs[i].norm();
        }
        self.volume = volume;
        Ok(())
    }

    /// Returns a periodic cell spanning a grid whose grid points are separated by the lattice
    /// vectors of this cell.
    ///
    /// # Arguments
    ///
    /// * `shape` - The number of grid points along each periodic direction of this cell.
    /// * `pbc_active` - Booleans indicating if the grid is periodic along each direction.
    ///
    /// # Returns
    ///
    /// The cell spanned by `shape[i]` times the $`i`$th lattice vector for every direction along
    /// which the grid is periodic.
    pub fn supercell(&self, shape: &[i64], pbc_active: &[bool]) -> Result<Cell, CellError> {
        let rvecs = self
            .rvecs
            .iter()
            .zip(shape.iter())
            .zip(pbc_active.iter())
            .take(self.nvec)
            .filter_map(|((rvec, &n), &pbc)| pbc.then(|| rvec * n as f64))
            .collect::<Vec<_>>();
        Cell::from_rvecs(&rvecs)
    }

    /// The number of active periodic directions.
    pub fn nvec(&self) -> usize {
        self.nvec
    }

    /// The length ($`n_\mathrm{vec} = 1`$), area ($`n_\mathrm{vec} = 2`$), or volume
    /// ($`n_\mathrm{vec} = 3`$) of the cell. This is zero for a non-periodic cell.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// The real-space lattice vectors of the periodic directions.
    pub fn rvecs(&self) -> &[Vector3<f64>] {
        &self.rvecs[..self.nvec]
    }

    /// The reciprocal lattice vectors of the periodic directions.
    pub fn gvecs(&self) -> &[Vector3<f64>] {
        &self.gvecs[..self.nvec]
    }

    /// The lattice plane spacings of the periodic directions.
    pub fn rspacings(&self) -> &[f64] {
        &self.rspacings[..self.nvec]
    }

    /// The reciprocal lattice plane spacings of the periodic directions.
    pub fn gspacings(&self) -> &[f64] {
        &self.gspacings[..self.nvec]
    }

    fn check_axis(&self, i: usize) -> Result<(), CellError> {
        if i < self.nvec {
            Ok(())
        } else {
            Err(CellError::InvalidAxis {
                axis: i,
                nvec: self.nvec,
            })
        }
    }

    /// Returns the spacing between lattice planes along periodic direction `i`.
    pub fn get_rspacing(&self, i: usize) -> Result<f64, CellError> {
        self.check_axis(i)?;
        Ok(self.rspacings[i])
    }

    /// Returns the spacing between reciprocal lattice planes along periodic direction `i`.
    pub fn get_gspacing(&self, i: usize) -> Result<f64, CellError> {
        self.check_axis(i)?;
        Ok(self.gspacings[i])
    }

    /// Returns the norm of the real-space lattice vector `i`.
    pub fn get_rlength(&self, i: usize) -> Result<f64, CellError> {
        self.check_axis(i)?;
        Ok(self.rvecs[i].norm())
    }

    /// Returns the norm of the reciprocal lattice vector `i`.
    pub fn get_glength(&self, i: usize) -> Result<f64, CellError> {
        self.check_axis(i)?;
        Ok(self.gvecs[i].norm())
    }

    /// Reduces in-place a displacement vector to an approximately minimal periodic image.
    ///
    /// The periodic directions are treated one after another: the fractional component along
    /// each direction is rounded to the nearest integer (halves are rounded down) and the
    /// corresponding multiple of the lattice vector is subtracted. This yields the true minimum
    /// image for orthogonal cells only.
    ///
    /// # Arguments
    ///
    /// * `delta` - The displacement vector to be reduced.
    pub fn mic(&self, delta: &mut Vector3<f64>) {
        for (rvec, gvec) in self.rvecs.iter().zip(self.gvecs.iter()).take(self.nvec) {
            let x = (gvec.dot(delta) - 0.5).ceil();
            *delta -= rvec * x;
        }
    }

    /// Converts Cartesian coordinates to fractional coordinates.
    pub fn to_frac(&self, cart: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            self.gvecs[0].dot(cart),
            self.gvecs[1].dot(cart),
            self.gvecs[2].dot(cart),
        )
    }

    /// Converts fractional coordinates to Cartesian coordinates.
    pub fn to_cart(&self, frac: &Vector3<f64>) -> Vector3<f64> {
        self.rvecs[0] * frac[0] + self.rvecs[1] * frac[1] + self.rvecs[2] * frac[2]
    }

    /// Returns the integer lattice translation that brings a point into the cell centred at the
    /// origin, using the same rounding as [`Self::mic`].
    ///
    /// Only the first [`Self::nvec`] entries are meaningful; the remaining ones are zero.
    pub fn to_center(&self, cart: &Vector3<f64>) -> [i64; 3] {
        let mut center = [0; 3];
        for (c, gvec) in center.iter_mut().zip(self.gvecs.iter()).take(self.nvec) {
            *c = -(gvec.dot(cart) - 0.5).ceil() as i64;
        }
        center
    }

    /// Adds in-place an integer linear combination of the periodic lattice vectors to a
    /// displacement vector.
    ///
    /// # Arguments
    ///
    /// * `delta` - The displacement vector to be modified.
    /// * `r` - The integer coefficients, at least one per periodic direction.
    pub fn add_vec(&self, delta: &mut Vector3<f64>, r: &[i64]) {
        debug_assert!(r.len() >= self.nvec);
        for (rvec, &n) in self.rvecs.iter().zip(r.iter()).take(self.nvec) {
            *delta += rvec * n as f64;
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, &format!("{}D periodic cell", self.nvec))?;
        let measure = match self.nvec {
            1 => "Length",
            2 => "Area",
            _ => "Volume",
        };
        writeln!(f, "{measure}: {:.7}", self.volume)?;
        if self.nvec == 0 {
            return Ok(());
        }
        writeln!(f, "{}", "┈".repeat(71))?;
        writeln!(
            f,
            "{:>2}  {:>30}  {:>15}  {:>15}",
            "#", "Lattice vector", "Plane spacing", "Length"
        )?;
        writeln!(f, "{}", "┈".repeat(71))?;
        for i in 0..self.nvec {
            writeln!(
                f,
                "{i:>2}  {:>30}  {:>15.7}  {:>15.7}",
                format!(
                    "({})",
                    self.rvecs[i].iter().map(|x| format!("{x:+.5}")).join(", ")
                ),
                self.rspacings[i],
                self.rvecs[i].norm(),
            )?;
        }
        writeln!(f, "{}", "┈".repeat(71))?;
        Ok(())
    }
}

// -------------
// Serialisation
// -------------

/// The minimal state from which a [`Cell`] can be rebuilt.
#[derive(Clone, Serialize, Deserialize)]
struct RawCell {
    nvec: usize,
    rvecs: [Vector3<f64>; 3],
    gvecs: [Vector3<f64>; 3],
}

impl TryFrom<RawCell> for Cell {
    type Error = CellError;

    fn try_from(raw: RawCell) -> Result<Self, Self::Error> {
        let mut cell = Cell::new();
        cell.update(&raw.rvecs, &raw.gvecs, raw.nvec)?;
        Ok(cell)
    }
}

impl From<Cell> for RawCell {
    fn from(cell: Cell) -> Self {
        RawCell {
            nvec: cell.nvec,
            rvecs: cell.rvecs,
            gvecs: cell.gvecs,
        }
    }
}

// =========
// Functions
// =========

/// Computes the content measure spanned by the first `nvec` lattice vectors.
///
/// # Returns
///
/// Zero, the length, the parallelogram area, or the parallelepiped volume for `nvec` equal to
/// zero, one, two, or three, respectively, or an error for any other `nvec`.
fn calc_volume(rvecs: &[Vector3<f64>; 3], nvec: usize) -> Result<f64, CellError> {
    match nvec {
        0 => Ok(0.0),
        1 => Ok(rvecs[0].norm()),
        2 => {
            let overlap = rvecs[0].dot(&rvecs[1]);
            let gram = rvecs[0].norm_squared() * rvecs[1].norm_squared() - overlap * overlap;
            Ok(gram.max(0.0).sqrt())
        }
        3 => Ok(rvecs[0].dot(&rvecs[1].cross(&rvecs[2])).abs()),
        _ => Err(CellError::InvalidDimensionality(nvec)),
    }
}

/// Returns two orthonormal vectors perpendicular to `vec`, forming a right-handed triple with it,
/// or `None` if `vec` vanishes.
fn orthonormal_complement(vec: &Vector3<f64>) -> Option<(Vector3<f64>, Vector3<f64>)> {
    let u = vec.try_normalize(f64::MIN_POSITIVE)?;
    let mut e = Vector3::<f64>::zeros();
    e[u.iamin()] = 1.0;
    let c1 = (e - u * u.dot(&e)).normalize();
    let c2 = u.cross(&c1);
    Some((c1, c2))
}
