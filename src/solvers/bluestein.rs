//! Bluestein's chirp-z fallback: any length as a convolution padded to a
//! power of two. Never the fastest, always applicable, so it guarantees
//! O(n log n) for every size.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::plan::{BluesteinNode, PlanNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, Sign};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Tensor;
use crate::twiddle::{TwiddleKind, TwiddleSlot};

use super::{cmul_ops, dft_1d_geometry};

struct BluesteinSolver;

impl<T: Float> Solver<T> for BluesteinSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-bluestein"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        let (d, v) = dft_1d_geometry(p)?;
        let n = d.n;
        // the padded child is a power of two, so recursion bottoms out in
        // the Cooley-Tukey path as long as we refuse powers of two here
        if n < 2 || n.is_power_of_two() {
            return None;
        }
        let nb = (2 * n - 1).next_power_of_two();
        let scratch_spec = plr.scratch_spec();
        let child_prb = Problem::dft(
            Tensor::one_d(nb, 1, 1),
            Tensor::rank0(),
            Sign::Forward,
            scratch_spec,
            scratch_spec,
        );
        let child = plr.mkplan(&child_prb)?;
        let per_vec = child.ops.repeat(2)
            + cmul_ops((2 * n + nb) as f64)
            + OpCounts::new(0.0, 0.0, 0.0, 2.0 * nb as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::Bluestein(BluesteinNode {
            n,
            nb,
            is: 2 * d.is,
            os: 2 * d.os,
            v,
            child: Box::new(child.node),
            chirp: TwiddleSlot::new(n, TwiddleKind::Chirp(p.sign)),
            fb: None,
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); nb]),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(BluesteinSolver));
}
