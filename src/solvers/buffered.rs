//! Bounce badly-laid-out transforms through a small contiguous buffer:
//! copy in, transform in place, copy out. Pays off when strides or taint
//! would otherwise force the slow paths.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::flags::Flags;
use crate::num::Float;
use crate::ops::OpCounts;
use crate::plan::{BufferedNode, CopyNode, PlanNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, R2rKind};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::{Dim, Tensor};

use super::{dft_1d_geometry, rdft_1d_geometry};

/// Largest buffer the solver will allocate, in bytes.
const BUFFER_BUDGET: usize = 65536;

fn copy_1d<T: Float>(n: usize, is: isize, os: isize, complex: bool) -> PlanNode<T> {
    if is == 1 && os == 1 {
        let len = if complex { 2 * n } else { n };
        return PlanNode::Copy(CopyNode::Memcpy { len });
    }
    let dims: Vec<Dim> = if complex {
        alloc::vec![Dim::new(n, 2 * is, 2 * os), Dim::new(2, 1, 1)]
    } else {
        alloc::vec![Dim::new(n, is, os)]
    };
    PlanNode::Copy(CopyNode::Loop { dims })
}

struct BufferedDftSolver;

impl<T: Float> Solver<T> for BufferedDftSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-buffered"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        if plr.flags().contains(Flags::NO_BUFFERING) {
            return None;
        }
        let (d, v) = dft_1d_geometry(p)?;
        let n = d.n;
        // only worth it when the problem is strided or tainted
        if d.is == 1 && d.os == 1 && p.inp.aligned && p.out.aligned {
            return None;
        }
        // crossing vector strides would let one batch clobber the next
        // batch's unread input
        if prb.in_place() && v.ivs != v.ovs {
            return None;
        }
        if 2 * n * core::mem::size_of::<T>() > BUFFER_BUDGET {
            return None;
        }
        let scratch_spec = plr.scratch_spec();
        let child_prb = Problem::dft(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            p.sign,
            scratch_spec,
            scratch_spec,
        );
        let child = plr.mkplan(&child_prb)?;
        let per_vec = child.ops + OpCounts::new(0.0, 0.0, 0.0, 8.0 * n as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::Buffered(BufferedNode {
            nbatch: v.vl,
            ivs: v.ivs,
            ovs: v.ovs,
            cpy_in: Box::new(copy_1d(n, d.is, 1, true)),
            inner: Box::new(child.node),
            cpy_out: Box::new(copy_1d(n, 1, d.os, true)),
            buf: RefCell::new(alloc::vec![T::zero(); 2 * n]),
        });
        Some(NodePlan::new(node, ops))
    }
}

struct BufferedRdftSolver;

impl<T: Float> Solver<T> for BufferedRdftSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft
    }

    fn name(&self) -> &'static str {
        "rdft-buffered"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft(p) = prb else { return None };
        if plr.flags().contains(Flags::NO_BUFFERING) {
            return None;
        }
        let (d, v) = rdft_1d_geometry(p)?;
        let n = d.n;
        if d.is == 1 && d.os == 1 && p.inp.aligned && p.out.aligned {
            return None;
        }
        if prb.in_place() && v.ivs != v.ovs {
            return None;
        }
        if n * core::mem::size_of::<T>() > BUFFER_BUDGET {
            return None;
        }
        let kind: R2rKind = p.kinds[0];
        let scratch_spec = plr.scratch_spec();
        let child_prb = Problem::rdft(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            alloc::vec![kind],
            scratch_spec,
            scratch_spec,
        );
        let child = plr.mkplan(&child_prb)?;
        let per_vec = child.ops + OpCounts::new(0.0, 0.0, 0.0, 4.0 * n as f64);
        let ops = per_vec.repeat(v.vl);
        let node = PlanNode::Buffered(BufferedNode {
            nbatch: v.vl,
            ivs: v.ivs,
            ovs: v.ovs,
            cpy_in: Box::new(copy_1d(n, d.is, 1, false)),
            inner: Box::new(child.node),
            cpy_out: Box::new(copy_1d(n, 1, d.os, false)),
            buf: RefCell::new(alloc::vec![T::zero(); n]),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(BufferedDftSolver));
    table.push(Box::new(BufferedRdftSolver));
}
