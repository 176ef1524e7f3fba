//! Complex DFT results against a naive reference transform.

use fftune::{BufSpec, BufToken, Complex, DftData, Flags, Planner, Problem, Sign};

fn naive(sign: Sign, x: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let n = x.len();
    let s = sign.as_int() as f64;
    (0..n)
        .map(|k| {
            let mut acc = Complex::zero();
            for (j, &v) in x.iter().enumerate() {
                let theta = s * 2.0 * std::f64::consts::PI * ((j * k) % n) as f64 / n as f64;
                acc = acc + v * Complex::expi(theta);
            }
            acc
        })
        .collect()
}

/// Pseudo-random but reproducible test signal.
fn signal(n: usize, seed: u64) -> Vec<Complex<f64>> {
    let mut state = seed.wrapping_mul(0x9e3779b97f4a7c15).wrapping_add(1);
    (0..n)
        .map(|_| {
            let mut next = || {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 1.0
            };
            Complex::new(next(), next())
        })
        .collect()
}

fn tolerance(n: usize, data: &[Complex<f64>]) -> f64 {
    let peak = data
        .iter()
        .map(|c| c.re.abs().max(c.im.abs()))
        .fold(1.0f64, f64::max);
    n as f64 * 4.0 * f64::EPSILON * peak
}

fn assert_close(got: &[Complex<f64>], want: &[Complex<f64>], tol: f64, what: &str) {
    for (k, (g, w)) in got.iter().zip(want.iter()).enumerate() {
        assert!(
            (g.re - w.re).abs() <= tol && (g.im - w.im).abs() <= tol,
            "{what} bin {k}: got ({}, {}) want ({}, {}) tol {tol}",
            g.re,
            g.im,
            w.re,
            w.im,
        );
    }
}

fn out_of_place(n: usize, sign: Sign) -> Problem {
    Problem::dft_1d(
        n,
        sign,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    )
}

fn in_place(n: usize, sign: Sign) -> Problem {
    Problem::dft_1d(
        n,
        sign,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(0)),
    )
}

#[test]
fn impulse_spreads_flat() {
    // delta at 0 transforms to all-ones, either sign
    let mut planner = Planner::<f64>::new();
    for sign in [Sign::Forward, Sign::Backward] {
        let plan = planner.plan(&out_of_place(8, sign), Flags::ESTIMATE).unwrap();
        let mut input = vec![Complex::zero(); 8];
        input[0] = Complex::new(1.0, 0.0);
        let mut output = vec![Complex::zero(); 8];
        plan.apply_dft(DftData::OutOfPlace {
            input: &mut input,
            output: &mut output,
        })
        .unwrap();
        for (k, c) in output.iter().enumerate() {
            assert!(
                (c.re - 1.0).abs() < 1e-12 && c.im.abs() < 1e-12,
                "bin {k}: ({}, {})",
                c.re,
                c.im
            );
        }
    }
}

#[test]
fn constant_concentrates_into_bin_zero() {
    let mut planner = Planner::<f64>::new();
    let plan = planner
        .plan(&out_of_place(4, Sign::Forward), Flags::ESTIMATE)
        .unwrap();
    let mut input = vec![Complex::new(1.0, 0.0); 4];
    let mut output = vec![Complex::zero(); 4];
    plan.apply_dft(DftData::OutOfPlace {
        input: &mut input,
        output: &mut output,
    })
    .unwrap();
    assert!((output[0].re - 4.0).abs() < 1e-12 && output[0].im.abs() < 1e-12);
    for c in &output[1..] {
        assert!(c.re.abs() < 1e-12 && c.im.abs() < 1e-12);
    }
}

#[test]
fn shifted_prime_impulse_yields_unit_twiddles() {
    // delta at 1, n = 13: forward bin k is exp(-2*pi*i*k/13)
    let mut planner = Planner::<f64>::new();
    let plan = planner
        .plan(&out_of_place(13, Sign::Forward), Flags::ESTIMATE)
        .unwrap();
    let mut input = vec![Complex::zero(); 13];
    input[1] = Complex::new(1.0, 0.0);
    let mut output = vec![Complex::zero(); 13];
    plan.apply_dft(DftData::OutOfPlace {
        input: &mut input,
        output: &mut output,
    })
    .unwrap();
    for (k, c) in output.iter().enumerate() {
        let w = Complex::expi(-2.0 * std::f64::consts::PI * k as f64 / 13.0);
        assert!(
            (c.re - w.re).abs() < 1e-10 && (c.im - w.im).abs() < 1e-10,
            "bin {k}"
        );
    }
}

#[test]
fn matches_naive_across_sizes_and_signs() {
    // powers of two, composites with odd factors, primes
    let mut planner = Planner::<f64>::new();
    for n in [2usize, 3, 4, 5, 6, 7, 8, 9, 12, 13, 15, 16, 20, 25, 32, 36] {
        for sign in [Sign::Forward, Sign::Backward] {
            let plan = planner.plan(&out_of_place(n, sign), Flags::ESTIMATE).unwrap();
            let mut input = signal(n, n as u64);
            let want = naive(sign, &input);
            let tol = tolerance(n, &want);
            let mut output = vec![Complex::zero(); n];
            plan.apply_dft(DftData::OutOfPlace {
                input: &mut input,
                output: &mut output,
            })
            .unwrap();
            assert_close(&output, &want, tol, &format!("n={n} {sign:?}"));
        }
    }
}

#[test]
fn in_place_agrees_with_out_of_place() {
    let mut planner = Planner::<f64>::new();
    for n in [4usize, 10, 13, 24] {
        let plan = planner.plan(&in_place(n, Sign::Forward), Flags::ESTIMATE).unwrap();
        let mut buf = signal(n, 7 * n as u64);
        let want = naive(Sign::Forward, &buf);
        let tol = tolerance(n, &want);
        plan.apply_dft(DftData::InPlace(&mut buf)).unwrap();
        assert_close(&buf, &want, tol, &format!("in-place n={n}"));
    }
}

#[test]
fn forward_then_backward_restores_scaled_input() {
    // transforms are unnormalized: round trip is n times the input
    let mut planner = Planner::<f64>::new();
    for n in [6usize, 13, 16, 27] {
        let fwd = planner.plan(&out_of_place(n, Sign::Forward), Flags::ESTIMATE).unwrap();
        let bwd = planner.plan(&out_of_place(n, Sign::Backward), Flags::ESTIMATE).unwrap();
        let original = signal(n, 100 + n as u64);
        let mut stage = original.clone();
        let mut spectrum = vec![Complex::zero(); n];
        fwd.apply_dft(DftData::OutOfPlace {
            input: &mut stage,
            output: &mut spectrum,
        })
        .unwrap();
        let mut restored = vec![Complex::zero(); n];
        bwd.apply_dft(DftData::OutOfPlace {
            input: &mut spectrum,
            output: &mut restored,
        })
        .unwrap();
        let scale = 1.0 / n as f64;
        let tol = tolerance(n, &original);
        for (k, (r, o)) in restored.iter().zip(original.iter()).enumerate() {
            let r = r.scale(scale);
            assert!(
                (r.re - o.re).abs() <= tol && (r.im - o.im).abs() <= tol,
                "n={n} element {k}"
            );
        }
    }
}

#[test]
fn f32_small_sizes_match_naive_both_signs() {
    // single precision routes through the vector codelets where the host
    // has them; the shifted impulse pins the transform sign per bin
    let mut planner = Planner::<f32>::new();
    for n in [2usize, 4] {
        for sign in [Sign::Forward, Sign::Backward] {
            let plan = planner.plan(&out_of_place(n, sign), Flags::ESTIMATE).unwrap();
            let mut input = vec![Complex::<f32>::zero(); n];
            input[1] = Complex::new(1.0, 0.0);
            let mut output = vec![Complex::<f32>::zero(); n];
            plan.apply_dft(DftData::OutOfPlace {
                input: &mut input,
                output: &mut output,
            })
            .unwrap();
            for (k, c) in output.iter().enumerate() {
                let theta =
                    sign.as_int() as f32 * 2.0 * std::f32::consts::PI * k as f32 / n as f32;
                let w = Complex::expi(theta);
                assert!(
                    (c.re - w.re).abs() < 1e-5 && (c.im - w.im).abs() < 1e-5,
                    "n={n} {sign:?} bin {k}: ({}, {}) want ({}, {}) plan {}",
                    c.re,
                    c.im,
                    w.re,
                    w.im,
                    plan.print()
                );
            }
        }
    }
}

#[test]
fn batched_rows_transform_independently() {
    use fftune::{Dim, Tensor};
    let (n, rows) = (8usize, 3usize);
    let sz = Tensor::one_d(n, 1, 1);
    let vecsz = Tensor::new(vec![Dim {
        n: rows,
        is: n as isize,
        os: n as isize,
    }]);
    let prb = Problem::dft(
        sz,
        vecsz,
        Sign::Forward,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();

    let mut input: Vec<Complex<f64>> = (0..rows)
        .flat_map(|r| signal(n, r as u64 + 1))
        .collect();
    let wants: Vec<Vec<Complex<f64>>> = input
        .chunks(n)
        .map(|row| naive(Sign::Forward, row))
        .collect();
    let mut output = vec![Complex::zero(); rows * n];
    plan.apply_dft(DftData::OutOfPlace {
        input: &mut input,
        output: &mut output,
    })
    .unwrap();
    for (r, want) in wants.iter().enumerate() {
        let tol = tolerance(n, want);
        assert_close(&output[r * n..(r + 1) * n], want, tol, &format!("row {r}"));
    }
}
