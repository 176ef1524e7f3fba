//! Indirection: split an out-of-place transform into a pure data movement
//! and an in-place transform. "Before" copies then transforms on the
//! output strides; "after" transforms on the input strides then copies,
//! which requires permission to scribble on the input.

use alloc::boxed::Box;

use crate::flags::Flags;
use crate::num::Float;
use crate::plan::{PlanNode, SeqNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Tensor;

use super::restride;

struct IndirectSolver {
    before: bool,
}

impl<T: Float> Solver<T> for IndirectSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        if self.before {
            "dft-indirect-before"
        } else {
            "dft-indirect-after"
        }
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        let flags = plr.flags();
        if flags.contains(Flags::NO_INDIRECT) {
            return None;
        }
        if prb.in_place() || p.sz.rnk().unwrap_or(0) < 1 {
            return None;
        }
        if !self.before && !flags.destroys_input() {
            return None;
        }
        // the copy is a rank-0 problem over the whole iteration space
        let space = p.sz.append(&p.vecsz);
        let copy_prb = Problem::dft(Tensor::rank0(), space, p.sign, p.inp, p.out);
        let (inner_spec, inner_sz, inner_vecsz) = if self.before {
            (p.out, restride(&p.sz, true), restride(&p.vecsz, true))
        } else {
            (p.inp, restride(&p.sz, false), restride(&p.vecsz, false))
        };
        let inner_prb = Problem::dft(inner_sz, inner_vecsz, p.sign, inner_spec, inner_spec);
        let copy = plr.mkplan(&copy_prb)?;
        let inner = plr.mkplan(&inner_prb)?;
        let ops = copy.ops + inner.ops;
        let node = if self.before {
            PlanNode::IndirectBefore(SeqNode {
                first: Box::new(copy.node),
                second: Box::new(inner.node),
            })
        } else {
            PlanNode::IndirectAfter(SeqNode {
                first: Box::new(inner.node),
                second: Box::new(copy.node),
            })
        };
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(IndirectSolver { before: true }));
    table.push(Box::new(IndirectSolver { before: false }));
}
