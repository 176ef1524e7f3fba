//! Peel one vector dimension into an explicit loop around a child plan.
//! The outermost (largest-stride) dimension peels first so the child keeps
//! the cache-friendly inner loops.

use alloc::boxed::Box;

use crate::flags::Flags;
use crate::num::Float;
use crate::plan::{PlanNode, VecLoop, VrankLoopNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};

use super::without_dim;

struct VrankSolver {
    kind: ProblemKind,
    name: &'static str,
}

impl<T: Float> Solver<T> for VrankSolver {
    fn kind(&self) -> ProblemKind {
        self.kind
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        if plr.flags().contains(Flags::NO_VRANK_SPLITS) {
            return None;
        }
        let (child_prb, v) = match prb {
            Problem::Dft(p) => {
                let rnk = p.vecsz.rnk()?;
                if rnk < 1 {
                    return None;
                }
                let d = p.vecsz.dims()[rnk - 1];
                let rest = without_dim(&p.vecsz, rnk - 1);
                (
                    Problem::dft(p.sz.clone(), rest, p.sign, p.inp, p.out),
                    VecLoop {
                        vl: d.n,
                        ivs: 2 * d.is,
                        ovs: 2 * d.os,
                    },
                )
            }
            Problem::Rdft(p) => {
                let rnk = p.vecsz.rnk()?;
                if rnk < 1 {
                    return None;
                }
                let d = p.vecsz.dims()[rnk - 1];
                let rest = without_dim(&p.vecsz, rnk - 1);
                (
                    Problem::rdft(p.sz.clone(), rest, p.kinds.clone(), p.inp, p.out),
                    VecLoop {
                        vl: d.n,
                        ivs: d.is,
                        ovs: d.os,
                    },
                )
            }
            Problem::Rdft2(p) => {
                let rnk = p.vecsz.rnk()?;
                if rnk < 1 {
                    return None;
                }
                let d = p.vecsz.dims()[rnk - 1];
                let rest = without_dim(&p.vecsz, rnk - 1);
                (
                    Problem::rdft2(p.sz.clone(), rest, p.kind, p.real, p.cplx),
                    VecLoop {
                        vl: d.n,
                        // real plane steps in T units, halfcomplex in pairs
                        ivs: d.is,
                        ovs: 2 * d.os,
                    },
                )
            }
            _ => return None,
        };
        if child_prb.kind() != Some(self.kind) {
            return None;
        }
        let child = plr.mkplan(&child_prb)?;
        let ops = child.ops.repeat(v.vl);
        let node = PlanNode::VrankLoop(VrankLoopNode {
            v,
            inner: Box::new(child.node),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    for (kind, name) in [
        (ProblemKind::Dft, "dft-vrank"),
        (ProblemKind::Rdft, "rdft-vrank"),
        (ProblemKind::Rdft2, "rdft2-vrank"),
    ] {
        table.push(Box::new(VrankSolver { kind, name }));
    }
}
