//! Rank-0 transpose problems: square, rectangular, tuple-valued.

use fftune::problem::transpose_tensor;
use fftune::{BufSpec, BufToken, Flags, Planner, Problem, RealData};

fn check_in_place(n0: usize, n1: usize, vl: usize) {
    let prb = Problem::transpose_in_place(n0, n1, vl, BufSpec::aligned(BufToken(0)));
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
    let src: Vec<f64> = (0..n0 * n1 * vl).map(|i| i as f64).collect();
    let mut buf = src.clone();
    plan.apply_transpose(RealData::InPlace(&mut buf)).unwrap();
    for row in 0..n0 {
        for col in 0..n1 {
            for t in 0..vl {
                assert_eq!(
                    buf[(col * n0 + row) * vl + t],
                    src[(row * n1 + col) * vl + t],
                    "{n0}x{n1} vl={vl} ({row},{col},{t})"
                );
            }
        }
    }
}

#[test]
fn rectangular_in_place() {
    // 3x5 exercises the coprime path, 6x4 the gcd path
    check_in_place(3, 5, 1);
    check_in_place(6, 4, 1);
    check_in_place(2, 9, 1);
}

#[test]
fn square_in_place() {
    check_in_place(7, 7, 1);
    check_in_place(16, 16, 1);
}

#[test]
fn tuple_elements_move_together() {
    check_in_place(3, 5, 2);
    check_in_place(4, 4, 3);
}

#[test]
fn out_of_place_copies_transposed() {
    let (n0, n1) = (5usize, 8usize);
    let prb = Problem::transpose(
        transpose_tensor(n0, n1, 1),
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
    let mut src: Vec<f64> = (0..n0 * n1).map(|i| i as f64 * 0.25).collect();
    let mut dst = vec![0.0; n0 * n1];
    plan.apply_transpose(RealData::OutOfPlace {
        input: &mut src,
        output: &mut dst,
    })
    .unwrap();
    for row in 0..n0 {
        for col in 0..n1 {
            assert_eq!(dst[col * n0 + row], src[row * n1 + col]);
        }
    }
}

#[test]
fn forced_algorithms_agree() {
    // pin each rectangular strategy in turn and compare results
    let (n0, n1) = (6usize, 4usize);
    let src: Vec<f64> = (0..n0 * n1).map(|i| (i * i) as f64).collect();
    let mut results = Vec::new();
    for drop in ["transpose-cut", "transpose-gcd"] {
        let mut planner = Planner::<f64>::new();
        planner.retain_solvers(|name| name != drop);
        let prb = Problem::transpose_in_place(n0, n1, 1, BufSpec::aligned(BufToken(0)));
        let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
        let mut buf = src.clone();
        plan.apply_transpose(RealData::InPlace(&mut buf)).unwrap();
        results.push(buf);
    }
    assert_eq!(results[0], results[1]);
    for row in 0..n0 {
        for col in 0..n1 {
            assert_eq!(results[0][col * n0 + row], src[row * n1 + col]);
        }
    }
}
