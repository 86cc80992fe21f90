//! Driver for selecting the points of a (partially) periodic grid inside cutoff spheres.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use nalgebra::Point3;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, LatticeRanges};
use crate::drivers::PBCellDriver;
use crate::io::format::{
    log_subtitle, log_title, nice_bool, pbcell_output, pbcell_warn, PBCellOutput,
};
use crate::io::{write_pbcell_binary, PBCellFileType};

#[cfg(test)]
#[path = "lattice_selection_tests.rs"]
mod lattice_selection_tests;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

fn default_true() -> bool {
    true
}

/// A structure containing control parameters for lattice point selection.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct LatticeSelectionParams {
    /// The position of the grid point with index zero.
    pub origin: Point3<f64>,

    /// The centres of the cutoff spheres. A selection is carried out for each centre
    /// independently.
    #[builder(setter(custom))]
    pub centres: Vec<Point3<f64>>,

    /// The cutoff radius.
    pub rcut: f64,

    /// The number of grid points along each periodic direction of the grid cell.
    #[builder(setter(custom))]
    pub shape: Vec<i64>,

    /// Booleans indicating if the grid is periodic along each periodic direction of the grid
    /// cell. Along non-periodic directions, translations falling outside the grid are discarded.
    #[builder(setter(custom))]
    pub pbc_active: Vec<bool>,

    /// Boolean indicating if every selected point is to be checked against the cutoff using the
    /// minimum-image convention of the periodic supercell of the grid.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub mic_check: bool,

    /// Boolean indicating if the selected indices are to be written to the output.
    #[builder(default = "false")]
    #[serde(default)]
    pub write_indices: bool,

    /// Optional name for saving the selections as a binary file of type
    /// [`PBCellFileType::Sel`]. If `None`, the selections will not be saved.
    #[builder(default = "None")]
    #[serde(default)]
    pub result_save_name: Option<String>,
}

impl LatticeSelectionParams {
    /// Returns a builder to construct a [`LatticeSelectionParams`] structure.
    pub fn builder() -> LatticeSelectionParamsBuilder {
        LatticeSelectionParamsBuilder::default()
    }
}

impl LatticeSelectionParamsBuilder {
    pub fn centres(&mut self, centres: &[Point3<f64>]) -> &mut Self {
        self.centres = Some(centres.to_vec());
        self
    }

    pub fn shape(&mut self, shape: &[i64]) -> &mut Self {
        self.shape = Some(shape.to_vec());
        self
    }

    pub fn pbc_active(&mut self, pbc_active: &[bool]) -> &mut Self {
        self.pbc_active = Some(pbc_active.to_vec());
        self
    }
}

impl Default for LatticeSelectionParams {
    fn default() -> Self {
        LatticeSelectionParams::builder()
            .origin(Point3::origin())
            .centres(&[Point3::origin()])
            .rcut(1.0)
            .shape(&[10, 10, 10])
            .pbc_active(&[true, true, true])
            .build()
            .expect("Unable to build default lattice selection parameters.")
    }
}

impl fmt::Display for LatticeSelectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Grid origin: ({})",
            self.origin.iter().map(|x| format!("{x:+.5}")).join(", ")
        )?;
        writeln!(f, "Cutoff radius: {:.5e}", self.rcut)?;
        writeln!(f, "Grid shape: {}", self.shape.iter().join(" × "))?;
        writeln!(
            f,
            "Periodic grid directions: {}",
            self.pbc_active.iter().map(|&pbc| nice_bool(pbc)).join(", ")
        )?;
        writeln!(f, "Number of cutoff centres: {}", self.centres.len())?;
        writeln!(f)?;
        writeln!(
            f,
            "Minimum-image verification: {}",
            nice_bool(self.mic_check)
        )?;
        writeln!(
            f,
            "Write selected indices: {}",
            nice_bool(self.write_indices)
        )?;
        writeln!(
            f,
            "Save selections to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", PBCellFileType::Sel.ext())
            } else {
                nice_bool(false)
            }
        )?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure containing the grid points selected around one cutoff centre.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatticeSelection {
    /// The centre of the cutoff sphere.
    pub centre: Point3<f64>,

    /// The candidate translations considered for this centre.
    pub ranges: LatticeRanges,

    /// The wrapped indices of the selected grid points, one row per point.
    pub indices: Array2<i64>,

    /// The number of selected points found beyond the cutoff under the minimum-image convention
    /// of the periodic supercell. This is zero if `mic_check` is off.
    pub mic_violations: usize,
}

/// A structure to contain lattice selection results.
#[derive(Clone, Builder, Debug)]
pub struct LatticeSelectionResult<'a> {
    /// The control parameters used to obtain this set of lattice selection results.
    parameters: &'a LatticeSelectionParams,

    /// The selections, one for each cutoff centre, in the order of the centres.
    pub selections: Vec<LatticeSelection>,
}

impl<'a> LatticeSelectionResult<'a> {
    fn builder() -> LatticeSelectionResultBuilder<'a> {
        LatticeSelectionResultBuilder::default()
    }

    /// Returns the control parameters used to obtain this set of results.
    pub fn parameters(&self) -> &LatticeSelectionParams {
        self.parameters
    }
}

// ------
// Driver
// ------

/// A driver for selecting the points of a grid spanned by the lattice vectors of a cell that lie
/// within a cutoff radius of given centres.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct LatticeSelectionDriver<'a> {
    /// The control parameters for lattice selection.
    parameters: &'a LatticeSelectionParams,

    /// The cell whose lattice vectors separate neighbouring grid points.
    cell: &'a Cell,

    /// The result of the lattice selection.
    #[builder(setter(skip), default = "None")]
    result: Option<LatticeSelectionResult<'a>>,
}

impl<'a> LatticeSelectionDriverBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        let params = self
            .parameters
            .ok_or("No lattice selection parameters found.".to_string())?;
        let cell = self
            .cell
            .ok_or("No cell for lattice selection found.".to_string())?;
        let nvec = cell.nvec();
        if nvec == 0 {
            return Err(
                "Lattice selection requires a cell with at least one periodic direction."
                    .to_string(),
            );
        }
        if !(params.rcut.is_finite() && params.rcut > 0.0) {
            return Err(format!(
                "The cutoff radius must be positive and finite, but {} was given.",
                params.rcut
            ));
        }
        if params.shape.len() < nvec || params.pbc_active.len() < nvec {
            return Err(format!(
                "Grid shape and periodicity must be given for all {nvec} periodic direction(s) of the cell."
            ));
        }
        if let Some(n) = params.shape.iter().take(nvec).find(|&&n| n <= 0) {
            return Err(format!("Grid extents must be positive, but {n} was found."));
        }
        Ok(())
    }
}

impl<'a> LatticeSelectionDriver<'a> {
    /// Returns a builder to construct a [`LatticeSelectionDriver`] structure.
    pub fn builder() -> LatticeSelectionDriverBuilder<'a> {
        LatticeSelectionDriverBuilder::default()
    }

    /// Executes lattice selection for all cutoff centres.
    fn select_lattice_points(&mut self) -> Result<(), anyhow::Error> {
        log_title("Lattice Point Selection");
        pbcell_output!("");
        let params = self.parameters;
        let cell = self.cell;
        params.log_output_display();
        cell.log_output_display();
        pbcell_output!("");

        let mic_cell = if params.mic_check {
            let supercell = cell.supercell(&params.shape, &params.pbc_active)?;
            let min_spacing = supercell
                .rspacings()
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);
            if 2.0 * params.rcut > min_spacing {
                pbcell_warn!(
                    "Cutoff diameter {:.5e} exceeds the smallest supercell spacing {:.5e}. Selected images might repeat.",
                    2.0 * params.rcut,
                    min_spacing
                );
            }
            Some(supercell)
        } else {
            None
        };

        let selections = params
            .centres
            .par_iter()
            .map(|centre| {
                let ranges = cell.set_ranges_rcut(&params.origin, centre, params.rcut);
                let indices = cell.select_inside_indices(
                    &params.origin,
                    centre,
                    params.rcut,
                    &ranges,
                    &params.shape,
                    &params.pbc_active,
                )?;
                let mic_violations = mic_cell
                    .as_ref()
                    .map(|supercell| {
                        count_mic_violations(
                            cell,
                            supercell,
                            &params.origin,
                            centre,
                            params.rcut,
                            &indices,
                        )
                    })
                    .unwrap_or(0);
                Ok::<_, anyhow::Error>(LatticeSelection {
                    centre: *centre,
                    ranges,
                    indices,
                    mic_violations,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        log_subtitle("Selected grid points");
        pbcell_output!("");
        let count_length = selections.len().to_string().len();
        let rule = "┈".repeat(count_length + 76);
        pbcell_output!("{rule}");
        pbcell_output!(
            "{:>count_length$}  {:>36}  {:>12}  {:>10}  {:>10}",
            "#",
            "Centre",
            "Box points",
            "Selected",
            "MIC viol."
        );
        pbcell_output!("{rule}");
        for (i, selection) in selections.iter().enumerate() {
            pbcell_output!(
                "{i:>count_length$}  {:>36}  {:>12}  {:>10}  {:>10}",
                format!(
                    "({})",
                    selection
                        .centre
                        .iter()
                        .map(|x| format!("{x:+.5}"))
                        .join(", ")
                ),
                selection.ranges.npoint(),
                selection.indices.nrows(),
                if mic_cell.is_some() {
                    selection.mic_violations.to_string()
                } else {
                    "--".to_string()
                }
            );
        }
        pbcell_output!("{rule}");
        pbcell_output!("");

        let total_violations: usize = selections.iter().map(|sel| sel.mic_violations).sum();
        if total_violations > 0 {
            pbcell_warn!(
                "{total_violations} selected point(s) lie beyond the cutoff under the minimum-image convention. The cell might be too skewed for axis-sequential image reduction."
            );
        }

        if params.write_indices {
            for (i, selection) in selections.iter().enumerate() {
                log_subtitle(&format!("Selected indices for centre #{i}"));
                selection.indices.rows().into_iter().for_each(|row| {
                    pbcell_output!("  ({})", row.iter().join(", "));
                });
                pbcell_output!("");
            }
        }

        if let Some(name) = params.result_save_name.as_ref() {
            write_pbcell_binary(name, PBCellFileType::Sel, &selections)?;
            pbcell_output!(
                "Lattice selections saved as {name}.{}.",
                PBCellFileType::Sel.ext()
            );
            pbcell_output!("");
        }

        let result = LatticeSelectionResult::builder()
            .parameters(params)
            .selections(selections)
            .build()
            .map_err(|err| format_err!(err))?;
        self.result = Some(result);
        Ok(())
    }
}

impl<'a> PBCellDriver for LatticeSelectionDriver<'a> {
    type Params = LatticeSelectionParams;

    type Outcome = LatticeSelectionResult<'a>;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No lattice selection results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.select_lattice_points()
    }
}

// =========
// Functions
// =========

/// Counts the selected grid points whose minimum-image distance to `centre` is not below `rcut`.
///
/// # Arguments
///
/// * `cell` - The grid cell.
/// * `supercell` - The periodic supercell of the grid.
/// * `origin` - The position of the grid point with index zero.
/// * `centre` - The centre of the cutoff sphere.
/// * `rcut` - The cutoff radius.
/// * `indices` - The selected wrapped indices.
fn count_mic_violations(
    cell: &Cell,
    supercell: &Cell,
    origin: &Point3<f64>,
    centre: &Point3<f64>,
    rcut: f64,
    indices: &Array2<i64>,
) -> usize {
    indices
        .rows()
        .into_iter()
        .filter(|row| {
            let mut delta = origin.coords - centre.coords;
            cell.add_vec(&mut delta, &row.to_vec());
            supercell.mic(&mut delta);
            delta.norm() >= rcut
        })
        .count()
}
