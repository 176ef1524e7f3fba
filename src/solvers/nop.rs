//! Do-nothing solvers for degenerate problems: an empty iteration space,
//! or a rank-0 in-place copy whose read and write strides coincide.

use alloc::boxed::Box;

use crate::num::Float;
use crate::ops::OpCounts;
use crate::plan::PlanNode;
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Tensor;

struct NopSolver {
    kind: ProblemKind,
    name: &'static str,
}

fn identity_space(sz: &Tensor, vecsz: &Tensor, in_place: bool) -> bool {
    if sz.is_minus_infinity() || vecsz.is_minus_infinity() {
        return true;
    }
    in_place && sz.rnk() == Some(0) && vecsz.dims().iter().all(|d| d.is == d.os)
}

impl<T: Float> Solver<T> for NopSolver {
    fn kind(&self) -> ProblemKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let applies = match prb {
            Problem::Dft(p) => identity_space(&p.sz, &p.vecsz, prb.in_place()),
            Problem::Rdft(p) => identity_space(&p.sz, &p.vecsz, prb.in_place()),
            Problem::Rdft2(p) => p.sz.is_minus_infinity() || p.vecsz.is_minus_infinity(),
            Problem::Transpose(p) => p.vecsz.is_minus_infinity(),
            Problem::Unsolvable => false,
        };
        applies.then(|| NodePlan::new(PlanNode::Nop, OpCounts::zero()))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    for (kind, name) in [
        (ProblemKind::Dft, "dft-nop"),
        (ProblemKind::Rdft, "rdft-nop"),
        (ProblemKind::Rdft2, "rdft2-nop"),
        (ProblemKind::Transpose, "transpose-nop"),
    ] {
        table.push(Box::new(NopSolver { kind, name }));
    }
}
