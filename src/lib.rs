//! # PBCell: Periodic simulation cells
//!
//! PBCell is a library and a small program, written in Rust, for handling simulation cells with
//! zero, one, two, or three periodic directions. It provides:
//! - construction of cells from real-space cell vectors, with the reciprocal vectors, the
//!   spacings between lattice planes, and the periodic volume derived automatically,
//! - conversions between Cartesian and fractional coordinates,
//! - the minimum image convention for relative vectors,
//! - estimation of the lattice translations that can bring a point within a cutoff radius of a
//!   centre, and
//! - selection of the points of a (possibly periodic) grid that lie within a cutoff radius of a
//!   centre, accounting for all periodic images.
//!
//! This documentation details the public API of the `pbcell` crate.
//!
//! ## Examples and usage
//!
//! For most items (structs, enums, functions, and traits), their usages are illustrated in test
//! functions.
//!
//! The compiled `pbcell` binary reads a YAML input file given by `--config` and writes its main
//! output to the file given by `--output` (with the `.out` extension), or to the console if no
//! output file is specified. When run without `--config`, a template input file
//! `pbcell_template.yml` is written instead.
//!
//! ## License
//!
//! GNU Lesser General Public License v3.0.

pub mod cell;
pub mod drivers;
pub mod interfaces;
pub mod io;
