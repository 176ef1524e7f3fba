//! Solver abstraction and the registration table.
//!
//! A solver is one strategy for one problem kind. `mkplan` either refuses
//! (returns `None`) or produces a plan node plus the operation counts of the
//! whole subtree. Solvers recurse through the planner for child problems, so
//! subtrees go through memoization and the patience machinery like any top
//! level problem.
//!
//! Registration order is stable and doubles as the search order; wisdom
//! records refer to solvers by name, so names must stay unique.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::num::Float;
use crate::ops::OpCounts;
use crate::plan::PlanNode;
use crate::planner::Planner;
use crate::problem::{Problem, ProblemKind};

/// A realized subtree: the executable node and its summed operation counts.
pub(crate) struct NodePlan<T: Float> {
    pub node: PlanNode<T>,
    pub ops: OpCounts,
}

impl<T: Float> NodePlan<T> {
    pub(crate) fn new(node: PlanNode<T>, ops: OpCounts) -> Self {
        Self { node, ops }
    }
}

pub(crate) trait Solver<T: Float> {
    fn kind(&self) -> ProblemKind;
    fn name(&self) -> &'static str;
    fn mkplan(&self, prb: &Problem, plr: &mut Planner<T>) -> Option<NodePlan<T>>;
}

/// All registered solvers, indexed per problem kind in registration order.
/// Solvers are stateless, so the table shares across threads.
pub(crate) struct SolverTable<T: Float> {
    solvers: Vec<Box<dyn Solver<T> + Send + Sync>>,
    by_kind: [Vec<u32>; ProblemKind::COUNT],
}

impl<T: Float> SolverTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            solvers: Vec::new(),
            by_kind: Default::default(),
        }
    }

    pub(crate) fn push(&mut self, s: Box<dyn Solver<T> + Send + Sync>) {
        let idx = self.solvers.len() as u32;
        debug_assert!(self.index_of_name(s.name()).is_none(), "duplicate solver");
        self.by_kind[s.kind().index()].push(idx);
        self.solvers.push(s);
    }

    pub(crate) fn get(&self, idx: u32) -> &dyn Solver<T> {
        self.solvers[idx as usize].as_ref()
    }

    pub(crate) fn len(&self) -> usize {
        self.solvers.len()
    }

    /// Candidate solver indices for a problem kind, in search order.
    pub(crate) fn for_kind(&self, kind: ProblemKind) -> &[u32] {
        &self.by_kind[kind.index()]
    }

    pub(crate) fn index_of_name(&self, name: &str) -> Option<u32> {
        self.solvers
            .iter()
            .position(|s| s.name() == name)
            .map(|i| i as u32)
    }

    /// Keep only solvers whose name satisfies `pred`, reindexing. Any
    /// stored solver indices are invalid afterwards.
    pub(crate) fn retain<F: Fn(&str) -> bool>(&mut self, pred: F) {
        self.solvers.retain(|s| pred(s.name()));
        self.by_kind = Default::default();
        for (i, s) in self.solvers.iter().enumerate() {
            self.by_kind[s.kind().index()].push(i as u32);
        }
    }
}

/// The stock solver set, in the order the planner searches them.
pub(crate) fn default_table<T: Float + 'static>() -> SolverTable<T> {
    let mut table = SolverTable::new();
    crate::solvers::register_all(&mut table);
    table
}
