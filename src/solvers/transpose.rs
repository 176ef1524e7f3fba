//! Transpose strategies. Out-of-place permutations are tiled copies; the
//! in-place family covers the square case, the gcd block algorithm, and
//! the cut algorithm that strips the rectangle down to a square.

use alloc::boxed::Box;
use core::cell::RefCell;

use crate::num::Float;
use crate::ops::OpCounts;
use crate::plan::{
    CopyNode, PlanNode, TransposeCutNode, TransposeGcdNode, TransposeSquareNode,
};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, TransposeProblem};
use crate::solver::{NodePlan, Solver, SolverTable};

use super::rank0::tile_buf_len;

/// Decompose the canonical row-major tensor back into `(n0, n1, vl)`.
fn canonical_shape(p: &TransposeProblem) -> Option<(usize, usize, usize)> {
    let dims = p.vecsz.dims();
    let (d0, d1, vl) = match dims.len() {
        2 => (dims[0], dims[1], 1),
        3 => {
            let dv = dims[2];
            if dv.is != 1 || dv.os != 1 {
                return None;
            }
            (dims[0], dims[1], dv.n)
        }
        _ => return None,
    };
    let (n0, n1, v) = (d0.n, d1.n, vl as isize);
    if d0.is == n1 as isize * v && d0.os == v && d1.is == v && d1.os == n0 as isize * v {
        Some((n0, n1, vl))
    } else {
        None
    }
}

fn moved(p: &TransposeProblem) -> f64 {
    p.vecsz.sz() as f64
}

struct TransposeCopySolver;

impl<T: Float> Solver<T> for TransposeCopySolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Transpose
    }

    fn name(&self) -> &'static str {
        "transpose-copy"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Transpose(p) = prb else { return None };
        if prb.in_place() || p.vecsz.is_minus_infinity() {
            return None;
        }
        let dims = p.vecsz.dims();
        let node = if dims.len() == 2 {
            PlanNode::Copy(CopyNode::TiledBuf {
                d0: dims[0],
                d1: dims[1],
                buf: RefCell::new(alloc::vec![T::zero(); tile_buf_len::<T>()]),
            })
        } else {
            PlanNode::Copy(CopyNode::Loop {
                dims: dims.to_vec(),
            })
        };
        Some(NodePlan::new(
            node,
            OpCounts::new(0.0, 0.0, 0.0, 2.0 * moved(p)),
        ))
    }
}

struct TransposeSquareSolver;

impl<T: Float> Solver<T> for TransposeSquareSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Transpose
    }

    fn name(&self) -> &'static str {
        "transpose-square"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Transpose(p) = prb else { return None };
        if !prb.in_place() || p.vecsz.is_minus_infinity() {
            return None;
        }
        let dims = p.vecsz.dims();
        if dims.len() < 2 {
            return None;
        }
        let (d0, d1) = (dims[0], dims[1]);
        let vl = match dims.len() {
            2 => 1,
            3 if dims[2].is == 1 && dims[2].os == 1 => dims[2].n,
            _ => return None,
        };
        // any stride pattern works as long as it is its own transpose
        if d0.n != d1.n || d0.is != d1.os || d0.os != d1.is {
            return None;
        }
        let node = PlanNode::TransposeSquare(TransposeSquareNode {
            n: d0.n,
            vl,
            rs: d0.is,
            cs: d1.is,
        });
        Some(NodePlan::new(node, OpCounts::new(0.0, 0.0, 0.0, moved(p))))
    }
}

struct TransposeGcdSolver;

impl<T: Float> Solver<T> for TransposeGcdSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Transpose
    }

    fn name(&self) -> &'static str {
        "transpose-gcd"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Transpose(p) = prb else { return None };
        if !prb.in_place() {
            return None;
        }
        let (n0, n1, vl) = canonical_shape(p)?;
        if n0 == n1 {
            return None;
        }
        let d = gcd(n0, n1);
        // with a trivial gcd the buffer degenerates to the whole matrix;
        // the cut solver does strictly better there
        if d == 1 {
            return None;
        }
        let (n, m) = (n0 / d, n1 / d);
        let node = PlanNode::TransposeGcd(TransposeGcdNode {
            n,
            m,
            d,
            vl,
            buf: RefCell::new(alloc::vec![T::zero(); n * m * d * vl]),
        });
        Some(NodePlan::new(
            node,
            OpCounts::new(0.0, 0.0, 0.0, 3.0 * moved(p)),
        ))
    }
}

struct TransposeCutSolver;

impl<T: Float> Solver<T> for TransposeCutSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Transpose
    }

    fn name(&self) -> &'static str {
        "transpose-cut"
    }

    fn mkplan(&self, prb: &Problem, _plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Transpose(p) = prb else { return None };
        if !prb.in_place() {
            return None;
        }
        let (n0, n1, vl) = canonical_shape(p)?;
        if n0 == n1 {
            return None;
        }
        let strip = if n1 > n0 {
            (n1 - n0) * n0
        } else {
            (n0 - n1) * n1
        };
        let node = PlanNode::TransposeCut(TransposeCutNode {
            r: n0,
            c: n1,
            vl,
            buf: RefCell::new(alloc::vec![T::zero(); strip * vl]),
        });
        let extra = (strip * vl) as f64;
        Some(NodePlan::new(
            node,
            OpCounts::new(0.0, 0.0, 0.0, 2.0 * moved(p) + 2.0 * extra),
        ))
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(TransposeCopySolver));
    table.push(Box::new(TransposeSquareSolver));
    table.push(Box::new(TransposeGcdSolver));
    table.push(Box::new(TransposeCutSolver));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::transpose_tensor;

    #[test]
    fn canonical_shape_round_trips() {
        let t = transpose_tensor(6, 4, 3);
        let p = TransposeProblem {
            vecsz: t,
            inp: crate::buffer::BufSpec::aligned(crate::buffer::BufToken(0)),
            out: crate::buffer::BufSpec::aligned(crate::buffer::BufToken(0)),
        };
        assert_eq!(canonical_shape(&p), Some((6, 4, 3)));
    }

    #[test]
    fn gcd_small_cases() {
        assert_eq!(gcd(6, 4), 2);
        assert_eq!(gcd(3, 5), 1);
        assert_eq!(gcd(12, 12), 12);
    }
}
