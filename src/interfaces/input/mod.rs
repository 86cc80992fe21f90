//! Input specification for PBCell calculations from YAML files.

use anyhow::{self, Context};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::drivers::lattice_selection::{LatticeSelectionDriver, LatticeSelectionParams};
use crate::drivers::PBCellDriver;
use crate::interfaces::InputHandle;
use crate::io::format::{log_macsec_begin, log_macsec_end, pbcell_output, PBCellOutput};
use crate::io::{read_pbcell_binary, write_pbcell_binary, PBCellFileType};


/// An enumerated type representing possible ways of specifying the cell in a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CellInputKind {
    /// Variant indicating that the periodic real-space lattice vectors will be given explicitly.
    /// An empty list gives a non-periodic cell.
    Vectors(Vec<Vector3<f64>>),

    /// Variant indicating that the cell will be read in from a `PBCell` [`PBCellFileType::Cel`]
    /// binary file. The associated string gives the name of the file without its `.pbcell.cel`
    /// extension.
    FromFile(String),
}

impl Default for CellInputKind {
    fn default() -> Self {
        CellInputKind::Vectors(vec![Vector3::x(), Vector3::y(), Vector3::z()])
    }
}

impl CellInputKind {
    /// Constructs the cell described by this specification.
    pub fn to_cell(&self) -> Result<Cell, anyhow::Error> {
        match self {
            CellInputKind::Vectors(rvecs) => Cell::from_rvecs(rvecs)
                .with_context(|| "Unable to construct a cell from the specified lattice vectors"),
            CellInputKind::FromFile(name) => {
                read_pbcell_binary::<Cell, _>(name, PBCellFileType::Cel)
                    .with_context(|| format!("Unable to read a cell from `{name}`"))
            }
        }
    }
}

/// A structure containing `PBCell` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// Specification of the cell.
    pub cell: CellInputKind,

    /// Optional name for saving the constructed cell as a binary file of type
    /// [`PBCellFileType::Cel`]. If `None`, the cell will not be saved.
    ///
    /// If not specified, this will be taken to be `None`.
    #[serde(default)]
    pub cell_save_name: Option<String>,

    /// Specification for lattice selection. If `None`, no lattice selection will be performed.
    ///
    /// If not specified, this will be taken to be `None`.
    #[serde(default)]
    pub lattice_selection: Option<LatticeSelectionParams>,
}

impl Default for Input {
    fn default() -> Self {
        Input {
            cell: CellInputKind::default(),
            cell_save_name: None,
            lattice_selection: Some(LatticeSelectionParams::default()),
        }
    }
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        log_macsec_begin("Cell construction");
        pbcell_output!("");
        let cell = self.cell.to_cell()?;
        cell.log_output_display();
        pbcell_output!("");
        if let Some(name) = self.cell_save_name.as_ref() {
            write_pbcell_binary(name, PBCellFileType::Cel, &cell)?;
            pbcell_output!("Cell saved as {name}.{}.", PBCellFileType::Cel.ext());
            pbcell_output!("");
        }
        log_macsec_end("Cell construction");
        pbcell_output!("");

        if let Some(ls_params) = self.lattice_selection.as_ref() {
            log_macsec_begin("Lattice selection");
            pbcell_output!("");
            let mut ls_driver = LatticeSelectionDriver::builder()
                .parameters(ls_params)
                .cell(&cell)
                .build()
                .with_context(|| "Unable to construct a lattice selection driver")?;
            ls_driver
                .run()
                .with_context(|| "Unable to execute the lattice selection driver successfully")?;
            log_macsec_end("Lattice selection");
            pbcell_output!("");
        }
        Ok(())
    }
}
