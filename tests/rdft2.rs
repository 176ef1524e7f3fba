//! Real-to-halfcomplex transforms against a naive real-input DFT.

use fftune::{BufSpec, BufToken, Complex, Flags, Planner, Problem, Rdft2Data, Rdft2Kind};

fn signal(n: usize, seed: u64) -> Vec<f64> {
    let mut state = seed.wrapping_mul(0x9e3779b97f4a7c15).wrapping_add(1);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0
        })
        .collect()
}

/// Forward spectrum of a real signal, packed bins 0..=n/2.
fn naive_r2c(x: &[f64]) -> Vec<Complex<f64>> {
    let n = x.len();
    (0..=n / 2)
        .map(|k| {
            let mut acc = Complex::zero();
            for (j, &v) in x.iter().enumerate() {
                let theta = -2.0 * std::f64::consts::PI * ((j * k) % n) as f64 / n as f64;
                acc = acc + Complex::expi(theta).scale(v);
            }
            acc
        })
        .collect()
}

fn forward(n: usize, x: &[f64]) -> Vec<Complex<f64>> {
    let prb = Problem::rdft2_1d(
        n,
        Rdft2Kind::R2hc,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
    let mut real = x.to_vec();
    let mut cplx = vec![Complex::zero(); n / 2 + 1];
    plan.apply_rdft2(Rdft2Data {
        real: &mut real,
        cplx: &mut cplx,
    })
    .unwrap();
    cplx
}

fn backward(n: usize, s: &[Complex<f64>]) -> Vec<f64> {
    let prb = Problem::rdft2_1d(
        n,
        Rdft2Kind::Hc2r,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
    let mut real = vec![0.0; n];
    let mut cplx = s.to_vec();
    plan.apply_rdft2(Rdft2Data {
        real: &mut real,
        cplx: &mut cplx,
    })
    .unwrap();
    real
}

#[test]
fn even_lengths_match_naive_spectrum() {
    // even n takes the packed half-length complex path
    for n in [4usize, 8, 10, 16, 24] {
        let x = signal(n, n as u64);
        let want = naive_r2c(&x);
        let got = forward(n, &x);
        let tol = n as f64 * 4.0 * f64::EPSILON * 8.0;
        for (k, (g, w)) in got.iter().zip(want.iter()).enumerate() {
            assert!(
                (g.re - w.re).abs() <= tol && (g.im - w.im).abs() <= tol,
                "n={n} bin {k}: ({}, {}) vs ({}, {})",
                g.re,
                g.im,
                w.re,
                w.im
            );
        }
    }
}

#[test]
fn odd_lengths_match_naive_spectrum() {
    for n in [3usize, 5, 7, 9, 13] {
        let x = signal(n, 40 + n as u64);
        let want = naive_r2c(&x);
        let got = forward(n, &x);
        let tol = n as f64 * 4.0 * f64::EPSILON * 8.0;
        for (k, (g, w)) in got.iter().zip(want.iter()).enumerate() {
            assert!(
                (g.re - w.re).abs() <= tol && (g.im - w.im).abs() <= tol,
                "n={n} bin {k}"
            );
        }
    }
}

#[test]
fn c2r_round_trip_scales_by_n() {
    for n in [5usize, 8, 12, 15] {
        let x = signal(n, 70 + n as u64);
        let spectrum = forward(n, &x);
        let back = backward(n, &spectrum);
        let tol = n as f64 * 4.0 * f64::EPSILON * 16.0;
        for (k, (b, o)) in back.iter().zip(x.iter()).enumerate() {
            assert!((b - n as f64 * o).abs() <= tol, "n={n} element {k}: {b}");
        }
    }
}

#[test]
fn batched_rows_transform_independently() {
    use fftune::{Dim, Tensor};
    let (n, rows) = (8usize, 3usize);
    let h = n / 2;
    // vector strides: real plane in reals, halfcomplex plane in complex
    let prb = Problem::rdft2(
        Tensor::one_d(n, 1, 1),
        Tensor::new(vec![Dim {
            n: rows,
            is: n as isize,
            os: (h + 1) as isize,
        }]),
        Rdft2Kind::R2hc,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();

    let mut real: Vec<f64> = (0..rows).flat_map(|r| signal(n, r as u64 + 11)).collect();
    let wants: Vec<Vec<Complex<f64>>> = real.chunks(n).map(|row| naive_r2c(row)).collect();
    let mut cplx = vec![Complex::zero(); rows * (h + 1)];
    plan.apply_rdft2(Rdft2Data {
        real: &mut real,
        cplx: &mut cplx,
    })
    .unwrap();
    let tol = n as f64 * 4.0 * f64::EPSILON * 8.0;
    for (r, want) in wants.iter().enumerate() {
        let row = &cplx[r * (h + 1)..(r + 1) * (h + 1)];
        for (k, (g, w)) in row.iter().zip(want.iter()).enumerate() {
            assert!(
                (g.re - w.re).abs() <= tol && (g.im - w.im).abs() <= tol,
                "row {r} bin {k}"
            );
        }
    }
}
