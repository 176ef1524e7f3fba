//! Alignment contracts between plan-time promises and execute-time buffers.

use fftune::{BufSpec, BufToken, Complex, DftData, ExecuteError, Flags, Planner, Problem, Sign};

const N: usize = 8;

/// Backing store one element longer than needed, so either the base or the
/// base plus one is off the 16-byte boundary.
fn misalignable() -> Vec<Complex<f32>> {
    vec![Complex::zero(); N + 1]
}

fn misaligned(buf: &mut Vec<Complex<f32>>) -> &mut [Complex<f32>] {
    if buf.as_ptr() as usize % 16 == 0 {
        &mut buf[1..N + 1]
    } else {
        &mut buf[..N]
    }
}

fn impulse(slice: &mut [Complex<f32>]) {
    for c in slice.iter_mut() {
        *c = Complex::zero();
    }
    slice[0] = Complex::new(1.0, 0.0);
}

#[test]
fn aligned_plans_reject_misaligned_buffers() {
    let prb = Problem::dft_1d(
        N,
        Sign::Forward,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f32>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE).unwrap();

    let mut input = misalignable();
    let mut output = vec![Complex::zero(); N];
    let err = plan.apply_dft(DftData::OutOfPlace {
        input: misaligned(&mut input),
        output: &mut output,
    });
    assert_eq!(err, Err(ExecuteError::Misaligned));

    // the same plan runs fine on naturally aligned storage
    let mut input = vec![Complex::zero(); N];
    impulse(&mut input);
    plan.apply_dft(DftData::OutOfPlace {
        input: &mut input,
        output: &mut output,
    })
    .unwrap();
}

#[test]
fn unaligned_flag_lifts_the_requirement() {
    let prb = Problem::dft_1d(
        N,
        Sign::Forward,
        BufSpec::unaligned(BufToken(0)),
        BufSpec::unaligned(BufToken(1)),
    );
    let mut planner = Planner::<f32>::new();
    let plan = planner.plan(&prb, Flags::ESTIMATE | Flags::UNALIGNED).unwrap();

    let mut istore = misalignable();
    let mut ostore = misalignable();
    let input = misaligned(&mut istore);
    impulse(input);
    let output = misaligned(&mut ostore);
    plan.apply_dft(DftData::OutOfPlace { input, output })
        .unwrap();
    for (k, c) in misaligned(&mut ostore).iter().enumerate() {
        assert!(
            (c.re - 1.0).abs() < 1e-5 && c.im.abs() < 1e-5,
            "bin {k}: ({}, {})",
            c.re,
            c.im
        );
    }
}

#[test]
fn unaligned_results_match_aligned_results() {
    let tainted = Problem::dft_1d(
        N,
        Sign::Forward,
        BufSpec::unaligned(BufToken(0)),
        BufSpec::unaligned(BufToken(1)),
    );
    let clean = Problem::dft_1d(
        N,
        Sign::Forward,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    );
    let mut planner = Planner::<f32>::new();
    let tainted_plan = planner.plan(&tainted, Flags::ESTIMATE | Flags::UNALIGNED).unwrap();
    let clean_plan = planner.plan(&clean, Flags::ESTIMATE).unwrap();

    let src: Vec<Complex<f32>> = (0..N)
        .map(|i| Complex::new(i as f32 * 0.5 - 1.0, 0.25 * i as f32))
        .collect();

    let mut istore = misalignable();
    let mut ostore = misalignable();
    {
        let input = misaligned(&mut istore);
        input.copy_from_slice(&src);
    }
    let want = {
        let mut input = src.clone();
        let mut output = vec![Complex::zero(); N];
        clean_plan
            .apply_dft(DftData::OutOfPlace {
                input: &mut input,
                output: &mut output,
            })
            .unwrap();
        output
    };
    let got = {
        let input = misaligned(&mut istore);
        let output = misaligned(&mut ostore);
        tainted_plan
            .apply_dft(DftData::OutOfPlace { input, output })
            .unwrap();
        misaligned(&mut ostore).to_vec()
    };
    for (k, (g, w)) in got.iter().zip(want.iter()).enumerate() {
        assert!(
            (g.re - w.re).abs() < 1e-4 && (g.im - w.im).abs() < 1e-4,
            "bin {k}: ({}, {}) vs ({}, {})",
            g.re,
            g.im,
            w.re,
            w.im
        );
    }
}
