//! Real-to-real transform kinds against their series definitions.

use fftune::{BufSpec, BufToken, Flags, Planner, Problem, R2rKind, RealData};

const PI: f64 = std::f64::consts::PI;

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

fn run(n: usize, kind: R2rKind, input: &[f64]) -> Vec<f64> {
    let prb = Problem::rdft_1d(
        n,
        kind,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
    let mut inp = input.to_vec();
    let mut out = vec![0.0; n];
    plan.apply_r2r(RealData::OutOfPlace {
        input: &mut inp,
        output: &mut out,
    })
    .unwrap();
    out
}

fn assert_close(got: &[f64], want: &[f64], tol: f64, what: &str) {
    for (k, (g, w)) in got.iter().zip(want.iter()).enumerate() {
        assert!((g - w).abs() <= tol, "{what} element {k}: {g} vs {w}");
    }
}

#[test]
fn r2hc_matches_known_spectrum() {
    // halfcomplex of [1,2,3,4]: re 10, -2, -2 then im 2
    let got = run(4, R2rKind::R2hc, &[1.0, 2.0, 3.0, 4.0]);
    assert_close(&got, &[10.0, -2.0, -2.0, 2.0], 1e-12, "r2hc");
}

#[test]
fn hc2r_inverts_unnormalized() {
    let got = run(4, R2rKind::Hc2r, &[10.0, -2.0, -2.0, 2.0]);
    assert_close(&got, &[4.0, 8.0, 12.0, 16.0], 1e-12, "hc2r");
}

#[test]
fn halfcomplex_round_trip_scales_by_n() {
    for n in [3usize, 4, 5, 8, 12, 13] {
        let x = signal(n, n as u64);
        let spectrum = run(n, R2rKind::R2hc, &x);
        let back = run(n, R2rKind::Hc2r, &spectrum);
        let tol = n as f64 * 4.0 * f64::EPSILON * 8.0;
        for (k, (b, o)) in back.iter().zip(x.iter()).enumerate() {
            assert!((b - n as f64 * o).abs() <= tol, "n={n} element {k}");
        }
    }
}

#[test]
fn dht_applied_twice_scales_by_n() {
    for n in [4usize, 7, 10, 16] {
        let x = signal(n, 31 + n as u64);
        let once = run(n, R2rKind::Dht, &x);
        let twice = run(n, R2rKind::Dht, &once);
        let tol = n as f64 * 8.0 * f64::EPSILON * 16.0;
        for (k, (t, o)) in twice.iter().zip(x.iter()).enumerate() {
            assert!((t - n as f64 * o).abs() <= tol, "n={n} element {k}");
        }
    }
}

#[test]
fn dct_families_match_their_series() {
    let n = 9;
    let x = signal(n, 5);
    let tol = 1e-11;

    // REDFT00: X_k = x_0 + (-1)^k x_{n-1} + 2 sum x_j cos(pi j k / (n-1))
    let want: Vec<f64> = (0..n)
        .map(|k| {
            let edge = if k % 2 == 0 { x[n - 1] } else { -x[n - 1] };
            x[0] + edge
                + 2.0
                    * (1..n - 1)
                        .map(|j| x[j] * (PI * (j * k) as f64 / (n - 1) as f64).cos())
                        .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Redft00, &x), &want, tol, "redft00");

    // REDFT10: X_k = 2 sum x_j cos(pi (2j+1) k / 2n)
    let want: Vec<f64> = (0..n)
        .map(|k| {
            2.0 * (0..n)
                .map(|j| x[j] * (PI * ((2 * j + 1) * k) as f64 / (2 * n) as f64).cos())
                .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Redft10, &x), &want, tol, "redft10");

    // REDFT01: X_k = x_0 + 2 sum_{j>=1} x_j cos(pi j (2k+1) / 2n)
    let want: Vec<f64> = (0..n)
        .map(|k| {
            x[0] + 2.0
                * (1..n)
                    .map(|j| x[j] * (PI * (j * (2 * k + 1)) as f64 / (2 * n) as f64).cos())
                    .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Redft01, &x), &want, tol, "redft01");

    // REDFT11: X_k = 2 sum x_j cos(pi (2j+1)(2k+1) / 4n)
    let want: Vec<f64> = (0..n)
        .map(|k| {
            2.0 * (0..n)
                .map(|j| {
                    x[j] * (PI * ((2 * j + 1) * (2 * k + 1)) as f64 / (4 * n) as f64).cos()
                })
                .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Redft11, &x), &want, tol, "redft11");
}

#[test]
fn dst_families_match_their_series() {
    let n = 8;
    let x = signal(n, 6);
    let tol = 1e-11;

    // RODFT00: X_k = 2 sum x_j sin(pi (j+1)(k+1) / (n+1))
    let want: Vec<f64> = (0..n)
        .map(|k| {
            2.0 * (0..n)
                .map(|j| x[j] * (PI * ((j + 1) * (k + 1)) as f64 / (n + 1) as f64).sin())
                .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Rodft00, &x), &want, tol, "rodft00");

    // RODFT10: X_k = 2 sum x_j sin(pi (2j+1)(k+1) / 2n)
    let want: Vec<f64> = (0..n)
        .map(|k| {
            2.0 * (0..n)
                .map(|j| x[j] * (PI * ((2 * j + 1) * (k + 1)) as f64 / (2 * n) as f64).sin())
                .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Rodft10, &x), &want, tol, "rodft10");

    // RODFT01: X_k = (-1)^k x_{n-1} + 2 sum_{j<n-1} x_j sin(pi (j+1)(2k+1) / 2n)
    let want: Vec<f64> = (0..n)
        .map(|k| {
            let edge = if k % 2 == 0 { x[n - 1] } else { -x[n - 1] };
            edge + 2.0
                * (0..n - 1)
                    .map(|j| x[j] * (PI * ((j + 1) * (2 * k + 1)) as f64 / (2 * n) as f64).sin())
                    .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Rodft01, &x), &want, tol, "rodft01");

    // RODFT11: X_k = 2 sum x_j sin(pi (2j+1)(2k+1) / 4n)
    let want: Vec<f64> = (0..n)
        .map(|k| {
            2.0 * (0..n)
                .map(|j| {
                    x[j] * (PI * ((2 * j + 1) * (2 * k + 1)) as f64 / (4 * n) as f64).sin()
                })
                .sum::<f64>()
        })
        .collect();
    assert_close(&run(n, R2rKind::Rodft11, &x), &want, tol, "rodft11");
}

#[test]
fn in_place_r2hc_matches_out_of_place() {
    let n = 8;
    let x = signal(n, 9);
    let want = run(n, R2rKind::R2hc, &x);
    let prb = Problem::rdft_1d(
        n,
        R2rKind::R2hc,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(0)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();
    let mut buf = x;
    plan.apply_r2r(RealData::InPlace(&mut buf)).unwrap();
    assert_close(&buf, &want, 1e-12, "in-place r2hc");
}
