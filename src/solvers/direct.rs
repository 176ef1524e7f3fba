//! One solver per registered codelet descriptor. The descriptor's `okp`
//! carries the whole applicability story; the solver just lowers strides.

use alloc::boxed::Box;

use crate::codelet::{scalar_codelets, CodeletApply, CodeletDesc, CodeletKind};
use crate::num::Float;
use crate::plan::{DirectDftNode, DirectR2rNode, PlanNode, VecLoop};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};

pub(crate) struct DirectSolver<T: Float> {
    desc: CodeletDesc<T>,
}

impl<T: Float> Solver<T> for DirectSolver<T> {
    fn kind(&self) -> ProblemKind {
        match self.desc.kind {
            CodeletKind::Dft => ProblemKind::Dft,
            CodeletKind::R2r(_) => ProblemKind::Rdft,
        }
    }

    fn name(&self) -> &'static str {
        self.desc.name
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        if !self.desc.okp(prb, plr.flags()) {
            return None;
        }
        match (prb, self.desc.apply) {
            (Problem::Dft(p), CodeletApply::Dft(kernel)) => {
                let d = p.sz.dims()[0];
                let (vl, ivs, ovs) = p.vecsz.tornk1()?;
                let node = PlanNode::DirectDft(DirectDftNode {
                    name: self.desc.name,
                    kernel,
                    n: d.n,
                    is: 2 * d.is,
                    os: 2 * d.os,
                    v: VecLoop {
                        vl,
                        ivs: 2 * ivs,
                        ovs: 2 * ovs,
                    },
                    sign: p.sign,
                });
                Some(NodePlan::new(node, self.desc.ops.repeat(vl)))
            }
            (Problem::Rdft(p), CodeletApply::R2r(kernel)) => {
                let d = p.sz.dims()[0];
                let (vl, ivs, ovs) = p.vecsz.tornk1()?;
                let node = PlanNode::DirectR2r(DirectR2rNode {
                    name: self.desc.name,
                    kernel,
                    n: d.n,
                    is: d.is,
                    os: d.os,
                    v: VecLoop { vl, ivs, ovs },
                });
                Some(NodePlan::new(node, self.desc.ops.repeat(vl)))
            }
            _ => None,
        }
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    for desc in scalar_codelets::<T>() {
        table.push(Box::new(DirectSolver { desc }));
    }
    #[cfg(feature = "simd")]
    for desc in crate::simd::codelets::<T>() {
        table.push(Box::new(DirectSolver { desc }));
    }
}
