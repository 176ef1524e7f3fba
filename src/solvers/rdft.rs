//! Real transform strategies beyond the direct codelets: the naive
//! definition-based fallback, the DHT fixup over r2hc, and halfcomplex
//! transforms routed through a full complex DFT.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::flags::Flags;
use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::plan::{DhtViaR2hcNode, GenericR2rNode, PlanNode, R2rViaDftNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, R2rKind, Sign};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Tensor;

use super::rdft_1d_geometry;

struct GenericR2rSolver;

impl<T: Float> Solver<T> for GenericR2rSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft
    }

    fn name(&self) -> &'static str {
        "rdft-generic"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft(p) = prb else { return None };
        let (d, v) = rdft_1d_geometry(p)?;
        let n = d.n;
        let kind = p.kinds[0];
        // the logical size of REDFT00 is 2(n-1); n = 1 has no transform
        if kind == R2rKind::Redft00 && n < 2 {
            return None;
        }
        let flags = plr.flags();
        let has_fast_path = matches!(kind, R2rKind::R2hc | R2rKind::Hc2r | R2rKind::Dht);
        if has_fast_path
            && flags.contains(Flags::NO_SLOW)
            && n > 64
            && !flags.contains(Flags::ALLOW_LARGE_GENERIC)
        {
            return None;
        }
        let nf = n as f64;
        // per-point trig evaluation dominates; charge it to `other`
        let per_vec = OpCounts::new(2.0 * nf * nf, 2.0 * nf * nf, 0.0, 16.0 * nf * nf);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::GenericR2r(GenericR2rNode {
            kind,
            n,
            is: d.is,
            os: d.os,
            v,
            scratch: RefCell::new(alloc::vec![T::zero(); n]),
        });
        Some(NodePlan::new(node, ops))
    }
}

struct DhtViaR2hcSolver;

impl<T: Float> Solver<T> for DhtViaR2hcSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft
    }

    fn name(&self) -> &'static str {
        "rdft-dht-r2hc"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft(p) = prb else { return None };
        let (d, v) = rdft_1d_geometry(p)?;
        if p.kinds[0] != R2rKind::Dht {
            return None;
        }
        let child_prb = Problem::rdft(
            p.sz.clone(),
            p.vecsz.clone(),
            alloc::vec![R2rKind::R2hc],
            p.inp,
            p.out,
        );
        let child = plr.mkplan(&child_prb)?;
        let fixup = OpCounts::new(2.0 * d.n as f64, 0.0, 0.0, 2.0 * d.n as f64).repeat(v.vl);
        let ops = child.ops + fixup;
        let node = PlanNode::DhtViaR2hc(DhtViaR2hcNode {
            n: d.n,
            os: d.os,
            v,
            child: Box::new(child.node),
        });
        Some(NodePlan::new(node, ops))
    }
}

struct R2rViaDftSolver {
    dir: R2rKind,
    name: &'static str,
}

impl<T: Float> Solver<T> for R2rViaDftSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft(p) = prb else { return None };
        if plr.flags().contains(Flags::NO_DFT_R2HC) {
            return None;
        }
        let (d, v) = rdft_1d_geometry(p)?;
        if p.kinds[0] != self.dir {
            return None;
        }
        let n = d.n;
        let sign = match self.dir {
            R2rKind::R2hc => Sign::Forward,
            _ => Sign::Backward,
        };
        let scratch_spec = plr.scratch_spec();
        let child_prb = Problem::dft(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            sign,
            scratch_spec,
            scratch_spec,
        );
        let child = plr.mkplan(&child_prb)?;
        let per_vec = child.ops + OpCounts::new(0.0, 0.0, 0.0, 4.0 * n as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::R2rViaDft(R2rViaDftNode {
            kind: self.dir,
            n,
            is: d.is,
            os: d.os,
            v,
            child: Box::new(child.node),
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); n]),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(GenericR2rSolver));
    table.push(Box::new(DhtViaR2hcSolver));
    table.push(Box::new(R2rViaDftSolver {
        dir: R2rKind::R2hc,
        name: "rdft-r2hc-dft",
    }));
    table.push(Box::new(R2rViaDftSolver {
        dir: R2rKind::Hc2r,
        name: "rdft-hc2r-dft",
    }));
}
