//! Rank-0 complex problems: no transform dimension left, only data
//! movement. Out-of-place becomes a copy; the in-place square permutation
//! becomes a transpose of interleaved pairs.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::num::Float;
use crate::ops::OpCounts;
use crate::plan::{CopyNode, PlanNode, TransposeSquareNode};
use crate::planner::Planner;
use crate::problem::{DftProblem, Problem, ProblemKind};
use crate::solver::{NodePlan, Solver, SolverTable};
use crate::tensor::Dim;

/// Copy plan over the lowered `T`-unit space of a complex rank-0 problem.
/// Shared with the indirection solvers.
pub(crate) fn dft_copy_node<T: Float>(p: &DftProblem) -> (PlanNode<T>, OpCounts) {
    let moved = 2.0 * p.vecsz.sz() as f64;
    if let Some((vl, 1, 1)) = p.vecsz.tornk1() {
        return (
            PlanNode::Copy(CopyNode::Memcpy { len: 2 * vl }),
            OpCounts::new(0.0, 0.0, 0.0, moved),
        );
    }
    let mut dims: Vec<Dim> = p
        .vecsz
        .dims()
        .iter()
        .map(|d| Dim::new(d.n, 2 * d.is, 2 * d.os))
        .collect();
    dims.push(Dim::new(2, 1, 1));
    (
        PlanNode::Copy(CopyNode::Loop { dims }),
        OpCounts::new(0.0, 0.0, 0.0, 2.0 * moved),
    )
}

struct Rank0Solver;

impl<T: Float> Solver<T> for Rank0Solver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-rank0"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        if p.sz.rnk() != Some(0) || prb.in_place() || p.vecsz.is_minus_infinity() {
            return None;
        }
        let (node, ops) = dft_copy_node(p);
        Some(NodePlan::new(node, ops))
    }
}

struct Rank0IpSquareSolver;

impl<T: Float> Solver<T> for Rank0IpSquareSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-rank0-ip-square"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        if p.sz.rnk() != Some(0) || !prb.in_place() || p.vecsz.rnk() != Some(2) {
            return None;
        }
        let d0 = p.vecsz.dims()[0];
        let d1 = p.vecsz.dims()[1];
        if d0.n != d1.n || d0.is != d1.os || d0.os != d1.is {
            return None;
        }
        let node = PlanNode::TransposeSquare(TransposeSquareNode {
            n: d0.n,
            vl: 2,
            rs: 2 * d0.is,
            cs: 2 * d1.is,
        });
        let moved = 2.0 * p.vecsz.sz() as f64;
        Some(NodePlan::new(node, OpCounts::new(0.0, 0.0, 0.0, moved)))
    }
}

/// Rank-0 real problems arise as children of the real indirection paths.
struct RdftRank0Solver;

impl<T: Float> Solver<T> for RdftRank0Solver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft
    }

    fn name(&self) -> &'static str {
        "rdft-rank0"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft(p) = prb else { return None };
        if p.sz.rnk() != Some(0) || prb.in_place() || p.vecsz.is_minus_infinity() {
            return None;
        }
        let moved = p.vecsz.sz() as f64;
        let node = if let Some((vl, 1, 1)) = p.vecsz.tornk1() {
            PlanNode::Copy(CopyNode::Memcpy { len: vl })
        } else if p.vecsz.rnk() == Some(2) {
            let d = p.vecsz.dims();
            PlanNode::Copy(CopyNode::TiledBuf {
                d0: d[0],
                d1: d[1],
                buf: RefCell::new(alloc::vec![T::zero(); tile_buf_len::<T>()]),
            })
        } else {
            PlanNode::Copy(CopyNode::Loop {
                dims: p.vecsz.dims().to_vec(),
            })
        };
        Some(NodePlan::new(node, OpCounts::new(0.0, 0.0, 0.0, 2.0 * moved)))
    }
}

pub(crate) fn tile_buf_len<T>() -> usize {
    let t = 64 / core::mem::size_of::<T>();
    let t = if t < 4 { 4 } else { t };
    t * t
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(Rank0Solver));
    table.push(Box::new(Rank0IpSquareSolver));
    table.push(Box::new(RdftRank0Solver));
}
