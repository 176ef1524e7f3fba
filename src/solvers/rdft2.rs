//! Real-to-halfcomplex strategies: the even-length pack through a
//! half-size complex DFT, the naive definition fallback, and the rank
//! split that peels leading dimensions onto the halfcomplex plane.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::flags::Flags;
use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::plan::{PlanNode, Rdft2EvenNode, Rdft2GenericNode, Rdft2SplitNode, VecLoop};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, Rdft2Kind, Rdft2Problem, Sign};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::{Dim, Tensor};
use crate::twiddle::{TwiddleKind, TwiddleSlot};

use super::restride;

fn rdft2_1d_geometry(p: &Rdft2Problem) -> Option<(Dim, VecLoop)> {
    if p.sz.rnk() != Some(1) {
        return None;
    }
    let d = p.sz.dims()[0];
    let (vl, ivs, ovs) = p.vecsz.tornk1()?;
    Some((
        d,
        VecLoop {
            vl,
            ivs,
            ovs: 2 * ovs,
        },
    ))
}

struct Rdft2EvenSolver;

impl<T: Float> Solver<T> for Rdft2EvenSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft2
    }

    fn name(&self) -> &'static str {
        "rdft2-even"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft2(p) = prb else { return None };
        if !matches!(p.kind, Rdft2Kind::R2hc | Rdft2Kind::Hc2r) {
            return None;
        }
        let (d, v) = rdft2_1d_geometry(p)?;
        let n = d.n;
        if n < 2 || n % 2 != 0 {
            return None;
        }
        let h = n / 2;
        let sign = if p.kind.reads_real() {
            Sign::Forward
        } else {
            Sign::Backward
        };
        let scratch_spec = plr.scratch_spec();
        let child_prb = Problem::dft(
            Tensor::one_d(h, 1, 1),
            Tensor::rank0(),
            sign,
            scratch_spec,
            scratch_spec,
        );
        let child = plr.mkplan(&child_prb)?;
        let hf = h as f64;
        let per_vec = child.ops + OpCounts::new(8.0 * hf, 12.0 * hf, 0.0, 4.0 * n as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::Rdft2Even(Rdft2EvenNode {
            kind: p.kind,
            n,
            h,
            is: d.is,
            os: 2 * d.os,
            v,
            child: Box::new(child.node),
            tw: TwiddleSlot::new(n, TwiddleKind::Full(Sign::Forward)),
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); h]),
        });
        Some(NodePlan::new(node, ops))
    }
}

struct Rdft2GenericSolver;

impl<T: Float> Solver<T> for Rdft2GenericSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft2
    }

    fn name(&self) -> &'static str {
        "rdft2-generic"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft2(p) = prb else { return None };
        let (d, v) = rdft2_1d_geometry(p)?;
        let n = d.n;
        let h = n / 2;
        let flags = plr.flags();
        // even unshifted lengths have the packed path
        let has_fast_path =
            n % 2 == 0 && matches!(p.kind, Rdft2Kind::R2hc | Rdft2Kind::Hc2r);
        if has_fast_path
            && flags.contains(Flags::NO_SLOW)
            && n > 64
            && !flags.contains(Flags::ALLOW_LARGE_GENERIC)
        {
            return None;
        }
        let nf = n as f64;
        let per_vec = OpCounts::new(nf * nf, nf * nf, 0.0, 10.0 * nf * nf);
        let ops = per_vec.repeat(v.vl);
        let scratch = core::cmp::max(n, h + 1);
        let node = PlanNode::Rdft2Generic(Rdft2GenericNode {
            kind: p.kind,
            n,
            h,
            is: d.is,
            os: 2 * d.os,
            v,
            scratch: RefCell::new(alloc::vec![Complex::<T>::zero(); scratch]),
        });
        Some(NodePlan::new(node, ops))
    }
}

struct Rdft2RankSplitSolver;

impl<T: Float> Solver<T> for Rdft2RankSplitSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft2
    }

    fn name(&self) -> &'static str {
        "rdft2-rank-geq2"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft2(p) = prb else { return None };
        if plr.flags().contains(Flags::NO_RANK_SPLITS) {
            return None;
        }
        // the shifted kinds have no multi-dimensional meaning here
        if !matches!(p.kind, Rdft2Kind::R2hc | Rdft2Kind::Hc2r) {
            return None;
        }
        let rnk = p.sz.rnk()?;
        if rnk < 2 {
            return None;
        }
        let (rest, hc) = p.sz.split(rnk - 1);
        let hc_dim = hc.dims()[0];
        let h = hc_dim.n / 2;
        let rdft2_prb = Problem::rdft2(
            hc.clone(),
            p.vecsz.append(&rest),
            p.kind,
            p.real,
            p.cplx,
        );
        // leading dims become an ordinary complex transform on the
        // halfcomplex plane, batched over the h+1 packed outputs
        let sign = if p.kind.reads_real() {
            Sign::Forward
        } else {
            Sign::Backward
        };
        let cplx_vec = Tensor::one_d(h + 1, hc_dim.os, hc_dim.os).append(&restride(&p.vecsz, true));
        let cplx_prb = Problem::dft(restride(&rest, true), cplx_vec, sign, p.cplx, p.cplx);
        let rdft2 = plr.mkplan(&rdft2_prb)?;
        let cplx = plr.mkplan(&cplx_prb)?;
        let ops = rdft2.ops + cplx.ops;
        let node = PlanNode::Rdft2Split(Rdft2SplitNode {
            cplx: Box::new(cplx.node),
            rdft2: Box::new(rdft2.node),
            cplx_first: !p.kind.reads_real(),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(Rdft2EvenSolver));
    table.push(Box::new(Rdft2GenericSolver));
    table.push(Box::new(Rdft2RankSplitSolver));
}
