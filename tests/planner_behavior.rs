//! Planner-level behavior: determinism, strategy agreement, measurement.

use fftune::{BufSpec, BufToken, Complex, DftData, Flags, Planner, Problem, Sign};

fn line(n: usize) -> Problem {
    Problem::dft_1d(
        n,
        Sign::Forward,
        BufSpec::aligned(BufToken(0)),
        BufSpec::aligned(BufToken(1)),
    )
}

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

#[test]
fn estimate_plans_are_deterministic() {
    // fresh planners, same problem, same winning strategy
    for n in [8usize, 13, 24, 60] {
        let a = Planner::<f64>::new().plan(&line(n), Flags::ESTIMATE).unwrap();
        let b = Planner::<f64>::new().plan(&line(n), Flags::ESTIMATE).unwrap();
        assert_eq!(a.print(), b.print(), "n={n}");
    }
}

#[test]
fn rader_and_bluestein_agree_on_primes() {
    let n = 13usize;
    let input = signal(n, 3);
    let mut outputs = Vec::new();
    for (drop, keep) in [("dft-bluestein", "rader"), ("dft-rader", "bluestein")] {
        let mut planner = Planner::<f64>::new();
        planner.retain_solvers(|name| name != drop && name != "dft-generic");
        let plan = planner.plan(&line(n), Flags::ESTIMATE).unwrap();
        assert!(plan.print().contains(keep), "print: {}", plan.print());
        let mut inp = input.clone();
        let mut out = vec![Complex::zero(); n];
        plan.apply_dft(DftData::OutOfPlace {
            input: &mut inp,
            output: &mut out,
        })
        .unwrap();
        outputs.push(out);
    }
    let tol = n as f64 * 8.0 * f64::EPSILON * 8.0;
    for (k, (r, b)) in outputs[0].iter().zip(outputs[1].iter()).enumerate() {
        assert!(
            (r.re - b.re).abs() <= tol && (r.im - b.im).abs() <= tol,
            "bin {k}: rader ({}, {}) bluestein ({}, {})",
            r.re,
            r.im,
            b.re,
            b.im
        );
    }
}

#[test]
fn measured_plans_carry_a_measurement_and_stay_correct() {
    let n = 16usize;
    let mut planner = Planner::<f64>::new();
    let plan = planner.plan(&line(n), Flags::MEASURE).unwrap();
    assert!(plan.cost().measured.is_some());

    // measurement scribbled on throwaway buffers only; the plan still works
    let mut input = vec![Complex::zero(); n];
    input[0] = Complex::new(1.0, 0.0);
    let mut output = vec![Complex::zero(); n];
    plan.apply_dft(DftData::OutOfPlace {
        input: &mut input,
        output: &mut output,
    })
    .unwrap();
    for c in &output {
        assert!((c.re - 1.0).abs() < 1e-12 && c.im.abs() < 1e-12);
    }
}

#[test]
fn wisdom_only_succeeds_after_a_plan_and_fails_cold() {
    let mut planner = Planner::<f64>::new();
    assert!(planner
        .plan(&line(12), Flags::ESTIMATE | Flags::WISDOM_ONLY)
        .is_none());
    planner.plan(&line(12), Flags::ESTIMATE).unwrap();
    assert!(planner
        .plan(&line(12), Flags::ESTIMATE | Flags::WISDOM_ONLY)
        .is_some());
}

#[test]
fn time_limited_exhaustive_planning_terminates() {
    let mut planner = Planner::<f64>::new();
    planner.set_timelimit(Some(0.25));
    let plan = planner.plan(&line(32), Flags::EXHAUSTIVE).unwrap();
    let mut buf = signal(32, 8);
    let mut out = vec![Complex::zero(); 32];
    plan.apply_dft(DftData::OutOfPlace {
        input: &mut buf,
        output: &mut out,
    })
    .unwrap();
}
