use nalgebra::{Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cell::cell_tests::random_cell;
use crate::cell::{Cell, LatticeRanges};

fn setup_ranges_rcut(
    rng: &mut StdRng,
    nvec: usize,
) -> (Cell, Point3<f64>, Point3<f64>, f64, LatticeRanges) {
    let a = 10.0_f64.powf(rng.gen_range(-1.0..1.0));
    let cell = random_cell(rng, a, nvec);
    let origin = Point3::from(Vector3::<f64>::from_fn(|_, _| rng.gen_range(-3.0 * a..3.0 * a)));
    let center = Point3::from(Vector3::<f64>::from_fn(|_, _| rng.gen_range(-3.0 * a..3.0 * a)));
    let rcut = rng.gen_range(0.2 * a..5.0 * a);
    let ranges = cell.set_ranges_rcut(&origin, &center, rcut);
    (cell, origin, center, rcut, ranges)
}

/// Checks that every translation in a margin of two around `ranges` but outside `ranges` brings
/// `origin` beyond `rcut` of `center`.
fn check_ranges_superset(
    cell: &Cell,
    origin: &Point3<f64>,
    center: &Point3<f64>,
    rcut: f64,
    ranges: &LatticeRanges,
) {
    let nvec = cell.nvec();
    let mut low = ranges.begin;
    let mut high = ranges.end;
    for i in 0..nvec {
        low[i] -= 2;
        high[i] += 2;
    }
    for i0 in low[0]..high[0] {
        for i1 in low[1]..high[1] {
            for i2 in low[2]..high[2] {
                let index = [i0, i1, i2];
                if ranges.contains(&index) {
                    continue;
                }
                let mut tmp = origin.coords;
                cell.add_vec(&mut tmp, &index[..nvec]);
                assert!(
                    (tmp - center.coords).norm() > rcut,
                    "Translation {index:?} outside {ranges:?} lies within the cutoff."
                );
            }
        }
    }
}

#[test]
fn test_cell_ranges_rcut_cubic() {
    let cell = Cell::from_rvecs(&[Vector3::x(), Vector3::y(), Vector3::z()]).unwrap();
    let ranges = cell.set_ranges_rcut(&Point3::origin(), &Point3::new(0.2, 0.0, 0.0), 1.5);
    assert_eq!(ranges.begin, [-1, -1, -1]);
    assert_eq!(ranges.end, [2, 2, 2]);
    assert_eq!(ranges.npoint(), 27);
    assert!(ranges.contains(&[1, -1, 0]));
    assert!(!ranges.contains(&[2, 0, 0]));
}

#[test]
fn test_cell_ranges_rcut_3d() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut counter = 0;
    while counter < 20 {
        let (cell, origin, center, rcut, ranges) = setup_ranges_rcut(&mut rng, 3);
        let npoint: i64 = (0..3)
            .map(|i| ranges.end[i] - ranges.begin[i] + 4)
            .product();
        if npoint > 10000 {
            continue;
        }
        check_ranges_superset(&cell, &origin, &center, rcut, &ranges);
        counter += 1;
    }
}

#[test]
fn test_cell_ranges_rcut_2d() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..50 {
        let (cell, origin, center, rcut, ranges) = setup_ranges_rcut(&mut rng, 2);
        assert_eq!((ranges.begin[2], ranges.end[2]), (0, 1));
        check_ranges_superset(&cell, &origin, &center, rcut, &ranges);
    }
}

#[test]
fn test_cell_ranges_rcut_1d() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let (cell, origin, center, rcut, ranges) = setup_ranges_rcut(&mut rng, 1);
        assert_eq!(ranges.begin[1..], [0, 0]);
        assert_eq!(ranges.end[1..], [1, 1]);
        check_ranges_superset(&cell, &origin, &center, rcut, &ranges);
    }
}

#[test]
fn test_cell_ranges_rcut_0d() {
    let mut rng = StdRng::seed_from_u64(0);
    let (_, _, _, _, ranges) = setup_ranges_rcut(&mut rng, 0);
    assert_eq!(ranges, LatticeRanges::default());
    assert_eq!(ranges.npoint(), 1);
}

#[test]
fn test_cell_ranges_npoint_saturates() {
    let ranges = LatticeRanges {
        begin: [i64::MIN, 0, 0],
        end: [i64::MAX, 2, 1],
    };
    assert_eq!(ranges.npoint(), i64::MAX);
    let ranges = LatticeRanges {
        begin: [3, 0, 0],
        end: [1, 2, 1],
    };
    assert_eq!(ranges.npoint(), 0);
}
