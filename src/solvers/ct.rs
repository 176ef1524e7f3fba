//! Cooley-Tukey decimation in time. The child transform is a vector of `r`
//! size-`m` DFTs gathered into contiguous scratch; the parent node applies
//! twiddles and the size-`r` butterflies on the way out.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::flags::Flags;
use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::plan::{CtNode, PlanNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Tensor;
use crate::twiddle::{TwiddleKind, TwiddleSlot};

use super::{cmul_ops, dft_1d_geometry, smallest_prime_factor};

struct CtSolver {
    /// Fixed radix, or `None` to pick the smallest prime factor.
    radix: Option<usize>,
    name: &'static str,
}

impl<T: Float> Solver<T> for CtSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        let (d, v) = dft_1d_geometry(p)?;
        let n = d.n;
        let r = match self.radix {
            Some(r) => {
                if n % r != 0 || n == r {
                    return None;
                }
                r
            }
            None => {
                let f = smallest_prime_factor(n)?;
                // the fixed-radix siblings already cover these splits
                if matches!(f, 2 | 3 | 5) {
                    return None;
                }
                f
            }
        };
        let m = n / r;
        // impatient searches skip the wide radices on very long transforms;
        // radix 2 and 4 stay available so everything remains plannable
        if plr.flags().contains(Flags::NO_FIXED_RADIX_LARGE_N) && r > 4 && m > 65536 {
            return None;
        }
        let child_prb = Problem::dft(
            Tensor::one_d(m, r as isize * d.is, 1),
            Tensor::one_d(r, d.is, m as isize),
            p.sign,
            p.inp,
            plr.scratch_spec(),
        );
        let child = plr.mkplan(&child_prb)?;
        let stage = {
            let (rf, mf) = (r as f64, m as f64);
            cmul_ops(mf * rf * (rf + 1.0)) + OpCounts::new(0.0, 0.0, 0.0, 4.0 * n as f64)
        };
        let ops = (child.ops + stage).repeat(v.vl);
        let node = PlanNode::Ct(CtNode {
            r,
            m,
            n,
            os: 2 * d.os,
            v,
            tw: TwiddleSlot::new(n, TwiddleKind::Full(p.sign)),
            child: Box::new(child.node),
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); n + r]),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    for (radix, name) in [
        (2, "dft-ct-2"),
        (3, "dft-ct-3"),
        (4, "dft-ct-4"),
        (5, "dft-ct-5"),
        (8, "dft-ct-8"),
        (16, "dft-ct-16"),
    ] {
        table.push(Box::new(CtSolver {
            radix: Some(radix),
            name,
        }));
    }
    table.push(Box::new(CtSolver {
        radix: None,
        name: "dft-ct-generic",
    }));
}
