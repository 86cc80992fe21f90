use std::env;
use std::fs;

use nalgebra::{Point3, Vector3};

use crate::cell::Cell;
use crate::drivers::lattice_selection::{
    LatticeSelection, LatticeSelectionDriver, LatticeSelectionParams,
};
use crate::drivers::PBCellDriver;
use crate::io::{read_pbcell_binary, PBCellFileType};

fn cubic_cell(a: f64) -> Cell {
    Cell::from_rvecs(&[
        Vector3::new(a, 0.0, 0.0),
        Vector3::new(0.0, a, 0.0),
        Vector3::new(0.0, 0.0, a),
    ])
    .unwrap()
}

#[test]
fn test_drivers_lattice_selection_cubic() {
    let cell = cubic_cell(1.0);
    let params = LatticeSelectionParams::builder()
        .origin(Point3::origin())
        .centres(&[Point3::origin(), Point3::new(0.5, 0.5, 0.5)])
        .rcut(1.5)
        .shape(&[4, 4, 4])
        .pbc_active(&[true, true, true])
        .write_indices(true)
        .build()
        .unwrap();
    let mut ls_driver = LatticeSelectionDriver::builder()
        .parameters(&params)
        .cell(&cell)
        .build()
        .unwrap();
    assert!(ls_driver.result().is_err());
    ls_driver.run().unwrap();

    let ls_res = ls_driver.result().unwrap();
    assert_eq!(ls_res.parameters().rcut, 1.5);
    assert_eq!(ls_res.selections.len(), 2);

    let selection_0 = &ls_res.selections[0];
    assert_eq!(selection_0.centre, Point3::origin());
    assert_eq!(selection_0.ranges.npoint(), 27);
    assert_eq!(selection_0.indices.dim(), (19, 3));
    assert_eq!(selection_0.mic_violations, 0);

    let selection_1 = &ls_res.selections[1];
    assert_eq!(selection_1.indices.dim(), (8, 3));
    assert!(selection_1
        .indices
        .iter()
        .all(|&j| j == 0 || j == 1));
    assert_eq!(selection_1.mic_violations, 0);
}

#[test]
fn test_drivers_lattice_selection_small_grid() {
    // The cutoff sphere is wider than the supercell, so wrapped indices repeat.
    let cell = cubic_cell(1.0);
    let params = LatticeSelectionParams::builder()
        .origin(Point3::origin())
        .centres(&[Point3::origin()])
        .rcut(1.5)
        .shape(&[2, 2, 2])
        .pbc_active(&[true, true, true])
        .build()
        .unwrap();
    let mut ls_driver = LatticeSelectionDriver::builder()
        .parameters(&params)
        .cell(&cell)
        .build()
        .unwrap();
    ls_driver.run().unwrap();
    let selection = &ls_driver.result().unwrap().selections[0];
    assert_eq!(selection.indices.nrows(), 19);
    assert_eq!(selection.mic_violations, 0);
}

#[test]
fn test_drivers_lattice_selection_skewed_mic_violation() {
    // The minimum image of (0.1, 0.2, 0) in this cell is (-0.4, 0, 0), beyond the cutoff.
    let cell = Cell::from_rvecs(&[Vector3::new(1.0, 0.0, 0.0), Vector3::new(2.5, 0.2, 0.0)])
        .unwrap();
    let params = LatticeSelectionParams::builder()
        .origin(Point3::new(0.1, 0.2, 0.0))
        .centres(&[Point3::origin()])
        .rcut(0.3)
        .shape(&[1, 1])
        .pbc_active(&[true, true])
        .build()
        .unwrap();
    let mut ls_driver = LatticeSelectionDriver::builder()
        .parameters(&params)
        .cell(&cell)
        .build()
        .unwrap();
    ls_driver.run().unwrap();
    let selection = &ls_driver.result().unwrap().selections[0];
    assert_eq!(selection.indices, ndarray::array![[0i64, 0]]);
    assert_eq!(selection.mic_violations, 1);

    let mut unchecked_params = params.clone();
    unchecked_params.mic_check = false;
    let mut ls_driver = LatticeSelectionDriver::builder()
        .parameters(&unchecked_params)
        .cell(&cell)
        .build()
        .unwrap();
    ls_driver.run().unwrap();
    assert_eq!(ls_driver.result().unwrap().selections[0].mic_violations, 0);
}

#[test]
fn test_drivers_lattice_selection_save() {
    let name = env::temp_dir().join(format!("pbcell_lattice_selection_{}", std::process::id()));
    let name = name.to_string_lossy().to_string();
    let cell = Cell::from_rvecs(&[Vector3::new(4.922, 0.0, 0.0), Vector3::new(2.462, 4.262, 0.0)])
        .unwrap();
    let params = LatticeSelectionParams::builder()
        .origin(Point3::new(0.1, -0.2, 0.3))
        .centres(&[Point3::new(3.0, 1.0, 0.0), Point3::new(-7.0, 2.0, 1.0)])
        .rcut(6.0)
        .shape(&[5, 6])
        .pbc_active(&[true, false])
        .result_save_name(Some(name.clone()))
        .build()
        .unwrap();
    let mut ls_driver = LatticeSelectionDriver::builder()
        .parameters(&params)
        .cell(&cell)
        .build()
        .unwrap();
    ls_driver.run().unwrap();
    let selections = &ls_driver.result().unwrap().selections;
    assert!(selections
        .iter()
        .all(|selection| selection.indices.ncols() == 2));

    let selections_read: Vec<LatticeSelection> =
        read_pbcell_binary(&name, PBCellFileType::Sel).unwrap();
    assert_eq!(selections_read.len(), selections.len());
    for (read, orig) in selections_read.iter().zip(selections.iter()) {
        assert_eq!(read.centre, orig.centre);
        assert_eq!(read.ranges, orig.ranges);
        assert_eq!(read.indices, orig.indices);
        assert_eq!(read.mic_violations, orig.mic_violations);
    }
    fs::remove_file(format!("{name}.{}", PBCellFileType::Sel.ext())).unwrap();
}

#[test]
fn test_drivers_lattice_selection_invalid() {
    let cell = cubic_cell(2.0);
    let params = LatticeSelectionParams::default();

    assert!(LatticeSelectionDriver::builder()
        .parameters(&params)
        .cell(&Cell::new())
        .build()
        .is_err());
    assert!(LatticeSelectionDriver::builder()
        .cell(&cell)
        .build()
        .is_err());

    let mut bad_params = params.clone();
    bad_params.rcut = -1.0;
    assert!(LatticeSelectionDriver::builder()
        .parameters(&bad_params)
        .cell(&cell)
        .build()
        .is_err());

    let mut bad_params = params.clone();
    bad_params.rcut = f64::NAN;
    assert!(LatticeSelectionDriver::builder()
        .parameters(&bad_params)
        .cell(&cell)
        .build()
        .is_err());

    let mut bad_params = params.clone();
    bad_params.shape = vec![4, 4];
    assert!(LatticeSelectionDriver::builder()
        .parameters(&bad_params)
        .cell(&cell)
        .build()
        .is_err());

    let mut bad_params = params.clone();
    bad_params.shape = vec![4, 0, 4];
    assert!(LatticeSelectionDriver::builder()
        .parameters(&bad_params)
        .cell(&cell)
        .build()
        .is_err());

    let mut bad_params = params;
    bad_params.pbc_active = vec![true];
    assert!(LatticeSelectionDriver::builder()
        .parameters(&bad_params)
        .cell(&cell)
        .build()
        .is_err());
}

#[test]
fn test_drivers_lattice_selection_params_yaml() {
    let yaml = "\
origin: [0.0, 0.0, 0.0]
centres:
  - [1.0, 2.0, 3.0]
rcut: 2.5
shape: [3, 3, 3]
pbc_active: [true, false, true]
";
    let params: LatticeSelectionParams = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(params.centres, vec![Point3::new(1.0, 2.0, 3.0)]);
    assert!(params.mic_check);
    assert!(!params.write_indices);
    assert!(params.result_save_name.is_none());
    assert!(params.to_string().contains("Periodic grid directions: yes, no, yes"));
}
