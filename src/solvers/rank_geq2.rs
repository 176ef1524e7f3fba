//! Multi-dimensional transforms by rank splitting: transform the first
//! size dimension into the output, then the remaining dimensions in place
//! on the output.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::flags::Flags;
use crate::num::Float;
use crate::plan::{PlanNode, SeqNode};
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind, R2rKind};
use crate::solver::{NodePlan, Solver, SolverTable};

use super::restride;

struct DftRankSplitSolver;

impl<T: Float> Solver<T> for DftRankSplitSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Dft
    }

    fn name(&self) -> &'static str {
        "dft-rank-geq2"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Dft(p) = prb else { return None };
        if plr.flags().contains(Flags::NO_RANK_SPLITS) {
            return None;
        }
        if p.sz.rnk().unwrap_or(0) < 2 {
            return None;
        }
        let (first, rest) = p.sz.split(1);
        let first_prb = Problem::dft(first.clone(), p.vecsz.append(&rest), p.sign, p.inp, p.out);
        let rest_vec = restride(&p.vecsz, true).append(&restride(&first, true));
        let rest_prb = Problem::dft(restride(&rest, true), rest_vec, p.sign, p.out, p.out);
        let c1 = plr.mkplan(&first_prb)?;
        let c2 = plr.mkplan(&rest_prb)?;
        let ops = c1.ops + c2.ops;
        let node = PlanNode::RankSplit(SeqNode {
            first: Box::new(c1.node),
            second: Box::new(c2.node),
        });
        Some(NodePlan::new(node, ops))
    }
}

struct RdftRankSplitSolver;

impl<T: Float> Solver<T> for RdftRankSplitSolver {
    fn kind(&self) -> ProblemKind {
        ProblemKind::Rdft
    }

    fn name(&self) -> &'static str {
        "rdft-rank-geq2"
    }

    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>> {
        let Problem::Rdft(p) = prb else { return None };
        if plr.flags().contains(Flags::NO_RANK_SPLITS) {
            return None;
        }
        if p.sz.rnk().unwrap_or(0) < 2 {
            return None;
        }
        let (first, rest) = p.sz.split(1);
        let first_kinds: Vec<R2rKind> = p.kinds[..1].to_vec();
        let rest_kinds: Vec<R2rKind> = p.kinds[1..].to_vec();
        let first_prb = Problem::rdft(
            first.clone(),
            p.vecsz.append(&rest),
            first_kinds,
            p.inp,
            p.out,
        );
        let rest_vec = restride(&p.vecsz, true).append(&restride(&first, true));
        let rest_prb = Problem::rdft(restride(&rest, true), rest_vec, rest_kinds, p.out, p.out);
        let c1 = plr.mkplan(&first_prb)?;
        let c2 = plr.mkplan(&rest_prb)?;
        let ops = c1.ops + c2.ops;
        let node = PlanNode::RankSplit(SeqNode {
            first: Box::new(c1.node),
            second: Box::new(c2.node),
        });
        Some(NodePlan::new(node, ops))
    }
}

pub(crate) fn register<T: Float + 'static>(table: &mut SolverTable<T>) {
    table.push(Box::new(DftRankSplitSolver));
    table.push(Box::new(RdftRankSplitSolver));
}
