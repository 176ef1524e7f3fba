//! Rader's algorithm for prime sizes: a size-`n` DFT becomes a cyclic
//! convolution of length `n-1` over the multiplicative group of `Z_n`,
//! realized as two child DFTs around a pointwise product with a
//! precomputed omega table.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::plan::{PlanNode, RaderNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, Sign};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Tensor;
use crate::twiddle::{pow_mod, TwiddleKind, TwiddleSlot};

use super::{cmul_ops, dft_1d_geometry, is_prime};

/// Smallest generator of the multiplicative group mod prime `n`.
pub(crate) fn find_generator(n: usize) -> Option<usize> {
    let order = n - 1;
    let factors = prime_factors(order);
    'outer: for g in 2..n {
        for &q in &factors {
            if pow_mod(g as u64, (order / q) as u64, n as u64) == 1 {
                continue 'outer;
            }
        }
        return Some(g);
    }
    None
}

fn prime_factors(mut n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut f = 2;
    while f * f <= n {
        if n % f == 0 {
            out.push(f);
            while n % f == 0 {
                n /= f;
            }
        }
        f += if f == 2 { 1 } else { 2 };
    }
    if n > 1 {
        out.push(n);
    }
    out
}

struct RaderSolver;

impl<T: Float> Solver<T> for RaderSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-rader"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        let (d, v) = dft_1d_geometry(p)?;
        let n = d.n;
        // codelets cover the small primes
        if n < 7 || !is_prime(n) {
            return None;
        }
        let g = find_generator(n)?;
        let scratch_spec = plr.scratch_spec();
        let child_prb = Problem::dft(
            Tensor::one_d(n - 1, 1, 1),
            Tensor::rank0(),
            Sign::Forward,
            scratch_spec,
            scratch_spec,
        );
        let child = plr.mkplan(&child_prb)?;
        let nm1 = n - 1;
        let ginv = pow_mod(g as u64, (n - 2) as u64, n as u64);
        let mut in_perm = Vec::with_capacity(nm1);
        let mut out_perm = Vec::with_capacity(nm1);
        let (mut fwd, mut bwd): (u64, u64) = (1, 1);
        for _ in 0..nm1 {
            in_perm.push(fwd as u32);
            out_perm.push(bwd as u32);
            fwd = fwd * g as u64 % n as u64;
            bwd = bwd * ginv % n as u64;
        }
        let per_vec = child.ops.repeat(2)
            + cmul_ops(nm1 as f64)
            + OpCounts::new(4.0 * n as f64, 0.0, 0.0, 4.0 * n as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::Rader(RaderNode {
            n,
            is: 2 * d.is,
            os: 2 * d.os,
            v,
            child: Box::new(child.node),
            omega: TwiddleSlot::new(n, TwiddleKind::RaderOmega { sign: p.sign, root: g }),
            in_perm,
            out_perm,
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); nm1]),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(RaderSolver));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generators_generate() {
        for n in [7usize, 11, 13, 23, 97] {
            let g = find_generator(n).unwrap();
            let mut seen = alloc::vec![false; n];
            let mut x: u64 = 1;
            for _ in 0..n - 1 {
                assert!(!seen[x as usize]);
                seen[x as usize] = true;
                x = x * g as u64 % n as u64;
            }
            assert_eq!(x, 1);
        }
    }
}
