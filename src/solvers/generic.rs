//! The O(n^2) matrix-multiplication DFT. Correct for every length and
//! stride pattern; the impatient flag set keeps it away from sizes where
//! the recursive solvers do better.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::flags::Flags;
use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::plan::{GenericDftNode, PlanNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::twiddle::{TwiddleKind, TwiddleSlot};

use super::{cmul_ops, dft_1d_geometry, is_prime};

struct GenericDftSolver;

impl<T: Float> Solver<T> for GenericDftSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-generic"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        let (d, v) = dft_1d_geometry(p)?;
        let n = d.n;
        let flags = plr.flags();
        let large_ok = flags.contains(Flags::ALLOW_LARGE_GENERIC);
        if flags.contains(Flags::NO_SLOW) && n > 16 && !large_ok {
            return None;
        }
        if flags.contains(Flags::NO_UGLY) && n > 16 && !is_prime(n) && !large_ok {
            return None;
        }
        let per_vec = cmul_ops((n * n) as f64) + OpCounts::new(0.0, 0.0, 0.0, 4.0 * n as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::GenericDft(GenericDftNode {
            n,
            is: 2 * d.is,
            os: 2 * d.os,
            v,
            tw: TwiddleSlot::new(n, TwiddleKind::Full(p.sign)),
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); n]),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(GenericDftSolver));
}
