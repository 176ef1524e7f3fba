//! The planner: memoized search over the solver table.
//!
//! Planning walks the registered solvers for the problem's kind, prices
//! every candidate subtree, and records the winning solver per problem
//! digest. Recorded decisions replay on later queries when their flags
//! subsume the query's, so a composite plan re-assembles without another
//! search. A replay that no longer produces a plan marks the whole table
//! bogus; stale or foreign wisdom is wiped rather than trusted.
//!
//! Patience climbs a ladder from estimation upward. Each rung re-plans the
//! problem under progressively wider search flags, and with `std` the rungs
//! above [`Patience::Estimate`] time candidates on the actual machine
//! instead of trusting operation counts.

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::buffer::{BufSpec, BufToken};
use crate::fingerprint::Digest;
use crate::flags::{Flags, Patience};
use crate::num::Float;
use crate::plan::{Cost, Plan};
use crate::problem::{Problem, ProblemKind};
use crate::solver::{default_table, NodePlan, SolverTable};
use crate::twiddle::{TwiddleRegistry, Wakefulness};

#[cfg(feature = "std")]
use crate::buffer::Io;
#[cfg(feature = "std")]
use crate::num::Complex;
#[cfg(feature = "std")]
use crate::plan::problem_extents;
#[cfg(feature = "std")]
use crate::timer::{self, Deadline};
#[cfg(feature = "std")]
use std::time::Duration;

/// Largest per-plane probe buffer, in plane elements. Problems reaching
/// beyond this are priced by operation counts even under high patience.
#[cfg(feature = "std")]
const MEASURE_ELEMS_LIMIT: usize = 1 << 22;

/// How a candidate's cost was obtained, as seen by the cost hook.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CostKind {
    Estimated,
    Measured,
}

/// What [`Planner::forget`] discards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Forget {
    /// Drop every entry the last planning pass did not bless.
    Accursed,
    /// Drop the whole table.
    Everything,
}

/// One memoized decision: which solver won, under which search flags.
#[derive(Clone, Copy, Debug)]
struct WisdomEntry {
    slvndx: u32,
    flags: Flags,
    blessed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WisdomState {
    Ok,
    Bogus,
}

/// Planning counters, mostly for tests and diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlannerStats {
    pub lookups: u64,
    pub hits: u64,
    pub searches: u64,
}

/// Instrumentation points. All optional; the planner works with none set.
/// `Send` so planners can live behind the process-wide mutex in `api`.
pub struct Hooks<T: Float> {
    /// Adjust a candidate's cost before comparison.
    pub cost: Option<Box<dyn FnMut(&Problem, f64, CostKind) -> f64 + Send>>,
    /// Veto a recorded decision before replay.
    pub wisdom_ok: Option<Box<dyn FnMut(&Problem, Flags) -> bool + Send>>,
    /// Called when a recorded decision fails to replay.
    pub bogosity: Option<Box<dyn FnMut(&Problem) + Send>>,
    /// Called with every finished top-level plan.
    pub after_plan: Option<Box<dyn FnMut(&Plan<T>) + Send>>,
}

// manual: a derive would carry a `T: Default` bound
impl<T: Float> Default for Hooks<T> {
    fn default() -> Self {
        Self {
            cost: None,
            wisdom_ok: None,
            bogosity: None,
            after_plan: None,
        }
    }
}

/// Twiddle accuracy by element type: doubles get full-accuracy sincos
/// tables, singles are fine with the sqrt(n) two-level scheme.
pub(crate) fn wake_level<T: Float>() -> Wakefulness {
    if T::epsilon() < T::from_f64(1e-9) {
        Wakefulness::AwakeSincos
    } else {
        Wakefulness::AwakeSqrtn
    }
}

pub struct Planner<T: Float> {
    table: Arc<SolverTable<T>>,
    wisdom: HashMap<Digest, WisdomEntry>,
    state: WisdomState,
    /// Mapped flags of the search currently in progress.
    flags: Flags,
    twiddles: TwiddleRegistry<T>,
    pub hooks: Hooks<T>,
    /// Scratch storage identities, counting down so they never collide
    /// with caller-assigned tokens.
    next_token: u32,
    stats: PlannerStats,
    /// Cost and pricing mode of the most recent top-level search.
    last_cost: Option<(f64, CostKind)>,
    #[cfg(feature = "std")]
    timelimit: Option<Duration>,
    #[cfg(feature = "std")]
    deadline: Deadline,
    #[cfg(feature = "std")]
    granularity: Option<Duration>,
}

impl<T: Float + 'static> Planner<T> {
    pub fn new() -> Self {
        Self {
            table: Arc::new(default_table()),
            wisdom: HashMap::new(),
            state: WisdomState::Ok,
            flags: Flags::ESTIMATE.mapped(),
            twiddles: TwiddleRegistry::new(),
            hooks: Hooks::default(),
            next_token: u32::MAX,
            stats: PlannerStats::default(),
            last_cost: None,
            #[cfg(feature = "std")]
            timelimit: None,
            #[cfg(feature = "std")]
            deadline: Deadline::start(None),
            #[cfg(feature = "std")]
            granularity: None,
        }
    }

    /// Plan `prb` under `user_flags`, climbing the patience ladder from
    /// estimation up to the requested level. Returns `None` only when no
    /// registered solver applies at any rung.
    pub fn plan(&mut self, prb: &Problem, user_flags: Flags) -> Option<Plan<T>> {
        #[cfg(feature = "verbose-logging")]
        log::debug!("planning {} {:?}", prb, user_flags);
        let requested = user_flags.patience();
        // without a clock, everything above estimation degenerates to it
        #[cfg(not(feature = "std"))]
        let requested = core::cmp::min(requested, Patience::Estimate);

        let mut chosen: Option<(NodePlan<T>, Flags, Option<f64>)> = None;
        for pat in [
            Patience::Estimate,
            Patience::Measure,
            Patience::Patient,
            Patience::Exhaustive,
        ] {
            if pat > requested {
                break;
            }
            if self.state == WisdomState::Bogus {
                self.forget(Forget::Everything);
                self.state = WisdomState::Ok;
            }
            self.flags = user_flags.with_patience(pat).mapped();
            #[cfg(feature = "std")]
            {
                self.deadline = Deadline::start(self.timelimit);
            }
            self.last_cost = None;
            if let Some(np) = self.mkplan(prb) {
                let measured = match self.last_cost {
                    Some((c, CostKind::Measured)) => Some(c),
                    _ => None,
                };
                #[cfg(feature = "verbose-logging")]
                log::trace!("rung {:?} found {:?} plan", pat, np.ops);
                chosen = Some((np, self.flags, measured));
            }
        }
        let (mut winner, flags_used, measured) = chosen?;

        // walk the winning path once more with the blessing bit set, so
        // every wisdom entry it relies on survives forget(Accursed)
        self.flags = flags_used | Flags::BLESSING;
        if let Some(np) = self.mkplan(prb) {
            winner = np;
        }
        self.forget(Forget::Accursed);
        self.state = WisdomState::Ok;

        let estimated = winner.ops.weighted();
        let mut plan = Plan::assemble(prb, winner.node, winner.ops, flags_used);
        plan.set_cost(Cost {
            estimated,
            measured,
        });
        plan.awake(wake_level::<T>(), &mut self.twiddles);
        #[cfg(feature = "verbose-logging")]
        log::debug!("planned: {}", plan.print());
        if let Some(hook) = self.hooks.after_plan.as_mut() {
            hook(&plan);
        }
        Some(plan)
    }

    /// Solve one (sub)problem: replay recorded wisdom when admissible,
    /// otherwise search the solver table. Solvers call back into this for
    /// their children, so every subtree is memoized independently.
    pub(crate) fn mkplan(&mut self, prb: &Problem) -> Option<NodePlan<T>> {
        let kind = prb.kind()?;
        let digest = prb.digest();
        self.stats.lookups += 1;

        // while the table is known bogus, lookups fail fast; the next
        // planning pass wipes it
        let lookup = if self.state == WisdomState::Ok {
            self.wisdom.get(&digest).copied()
        } else {
            None
        };
        if let Some(entry) = lookup {
            let admitted = entry.flags.subsumes(self.flags)
                && match self.hooks.wisdom_ok.as_mut() {
                    Some(hook) => hook(prb, entry.flags),
                    None => true,
                };
            if admitted {
                let table = Arc::clone(&self.table);
                match table.get(entry.slvndx).mkplan(prb, self) {
                    Some(np) => {
                        self.stats.hits += 1;
                        if self.flags.blessing() {
                            if let Some(e) = self.wisdom.get_mut(&digest) {
                                e.blessed = true;
                            }
                        }
                        return Some(np);
                    }
                    None => {
                        // the recorded solver refused the very problem it
                        // once solved; the table cannot be trusted
                        self.state = WisdomState::Bogus;
                        #[cfg(feature = "verbose-logging")]
                        log::warn!("bogus wisdom for {}", prb);
                        if let Some(hook) = self.hooks.bogosity.as_mut() {
                            hook(prb);
                        }
                        self.wisdom.remove(&digest);
                    }
                }
            }
        }
        if self.flags.wisdom_only() {
            return None;
        }
        self.stats.searches += 1;
        self.search(prb, kind, digest)
    }

    fn search(
        &mut self,
        prb: &Problem,
        kind: ProblemKind,
        digest: Digest,
    ) -> Option<NodePlan<T>> {
        let table = Arc::clone(&self.table);
        let mut best: Option<(NodePlan<T>, u32, f64, CostKind)> = None;
        for &slvndx in table.for_kind(kind) {
            #[cfg(feature = "std")]
            if best.is_some() && self.deadline.expired() {
                break;
            }
            let Some(mut cand) = table.get(slvndx).mkplan(prb, self) else {
                continue;
            };
            let (cost, ck) = self.price(prb, &mut cand);
            // strict comparison keeps registration order on ties
            let better = match &best {
                Some((_, _, c, _)) => cost < *c,
                None => true,
            };
            if better {
                best = Some((cand, slvndx, cost, ck));
            }
        }
        let (np, slvndx, cost, ck) = best?;
        self.last_cost = Some((cost, ck));
        let mut recorded = self.flags;
        recorded.remove(Flags::BLESSING);
        self.wisdom.insert(
            digest,
            WisdomEntry {
                slvndx,
                flags: recorded,
                blessed: self.flags.blessing(),
            },
        );
        Some(np)
    }

    fn price(&mut self, prb: &Problem, cand: &mut NodePlan<T>) -> (f64, CostKind) {
        let mut cost = cand.ops.weighted();
        let mut ck = CostKind::Estimated;
        #[cfg(feature = "std")]
        if self.flags.patience() >= Patience::Measure {
            if let Some(m) = self.measure_candidate(prb, cand) {
                cost = m;
                ck = CostKind::Measured;
            }
        }
        if let Some(hook) = self.hooks.cost.as_mut() {
            cost = hook(prb, cost, ck);
        }
        (cost, ck)
    }

    /// Time one candidate on throwaway buffers sized to the problem's
    /// stride reach. Returns `None` when the reach is unbounded (negative
    /// strides) or too large to probe.
    #[cfg(feature = "std")]
    fn measure_candidate(&mut self, prb: &Problem, cand: &mut NodePlan<T>) -> Option<f64> {
        let (min_in, min_out, in_place) = problem_extents(prb);
        if min_in == usize::MAX || min_out == usize::MAX {
            return None;
        }
        if min_in.max(min_out) > MEASURE_ELEMS_LIMIT {
            return None;
        }
        let gran = *self
            .granularity
            .get_or_insert_with(timer::granularity);
        cand.node.awake(wake_level::<T>(), &mut self.twiddles);

        // zeroed input keeps repeated in-place applications from drifting
        // toward overflow: zero in, zero out
        let secs = match prb.kind()? {
            ProblemKind::Dft => {
                let mut a = alloc::vec![Complex::<T>::zero(); min_in.max(1)];
                let mut b = alloc::vec![Complex::<T>::zero(); min_out.max(1)];
                let io = if in_place {
                    let n = min_in.max(min_out).max(1);
                    a.resize(n, Complex::zero());
                    let p = a.as_mut_ptr();
                    Io::from_complex(p, p)
                } else {
                    Io::from_complex(a.as_mut_ptr(), b.as_mut_ptr())
                };
                prb.zero_input_raw(io);
                let node = &cand.node;
                timer::measure(gran, || unsafe { node.apply(io) })
            }
            ProblemKind::Rdft | ProblemKind::Transpose => {
                let mut a = alloc::vec![T::zero(); min_in.max(1)];
                let mut b = alloc::vec![T::zero(); min_out.max(1)];
                let io = if in_place {
                    let n = min_in.max(min_out).max(1);
                    a.resize(n, T::zero());
                    let p = a.as_mut_ptr();
                    Io::from_real(p, p)
                } else {
                    Io::from_real(a.as_mut_ptr(), b.as_mut_ptr())
                };
                prb.zero_input_raw(io);
                let node = &cand.node;
                timer::measure(gran, || unsafe { node.apply(io) })
            }
            ProblemKind::Rdft2 => {
                let mut real = alloc::vec![T::zero(); min_in.max(1)];
                let mut cplx = alloc::vec![Complex::<T>::zero(); min_out.max(1)];
                let io = Io::from_real_cplx(real.as_mut_ptr(), cplx.as_mut_ptr());
                prb.zero_input_raw(io);
                let node = &cand.node;
                timer::measure(gran, || unsafe { node.apply(io) })
            }
        };

        cand.node.awake(Wakefulness::Sleepy, &mut self.twiddles);
        self.twiddles.purge();
        Some(secs)
    }

    /// Mapped flags of the search in progress, for solvers.
    pub(crate) fn flags(&self) -> Flags {
        self.flags
    }

    /// Fresh aligned storage identity for a solver's internal buffer.
    /// Tokens never repeat within a planner, and the fingerprint only
    /// records placement, so scratch children still memoize.
    pub(crate) fn scratch_spec(&mut self) -> BufSpec {
        let t = self.next_token;
        self.next_token -= 1;
        BufSpec::aligned(BufToken(t))
    }

    pub fn forget(&mut self, amnesia: Forget) {
        match amnesia {
            Forget::Accursed => self.wisdom.retain(|_, e| e.blessed),
            Forget::Everything => self.wisdom.clear(),
        }
        self.twiddles.purge();
    }

    /// Rebuild the solver table keeping only solvers whose name satisfies
    /// `pred`. Recorded wisdom holds indices into the old table and is
    /// cleared.
    pub fn retain_solvers<F: Fn(&str) -> bool>(&mut self, pred: F) {
        let mut table = default_table();
        table.retain(pred);
        self.table = Arc::new(table);
        self.wisdom.clear();
    }

    pub fn stats(&self) -> PlannerStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = PlannerStats::default();
    }

    pub fn wisdom_len(&self) -> usize {
        self.wisdom.len()
    }

    /// Wall-clock budget per planning call, in seconds. `None`, negative,
    /// or non-finite values remove the limit.
    #[cfg(feature = "std")]
    pub fn set_timelimit(&mut self, seconds: Option<f64>) {
        self.timelimit = seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64);
    }

    /// Drop all recorded decisions, blessed or not.
    pub fn forget_wisdom(&mut self) {
        self.forget(Forget::Everything);
    }

    pub fn export_wisdom(
        &self,
        sink: &mut dyn crate::wisdom::WisdomSink,
    ) -> Result<(), crate::wisdom::WisdomError> {
        crate::wisdom::export(self, sink)
    }

    pub fn import_wisdom(
        &mut self,
        src: &mut dyn crate::wisdom::WisdomSource,
    ) -> Result<usize, crate::wisdom::WisdomError> {
        crate::wisdom::import(self, src)
    }

    /// Blessed entries as (digest, solver name, recorded flags), for
    /// wisdom export. Sorted by digest so exports are reproducible.
    pub(crate) fn exportable_wisdom(&self) -> Vec<(Digest, &'static str, Flags)> {
        let mut out: Vec<_> = self
            .wisdom
            .iter()
            .filter(|(_, e)| e.blessed)
            .map(|(d, e)| (*d, self.table.get(e.slvndx).name(), e.flags))
            .collect();
        out.sort_by_key(|(d, _, _)| d.0);
        out
    }

    /// Record one imported decision. Unknown solver names are skipped,
    /// which is how wisdom from a build with extra solvers degrades.
    pub(crate) fn absorb_wisdom(&mut self, digest: Digest, solver: &str, flags: Flags) -> bool {
        let Some(slvndx) = self.table.index_of_name(solver) else {
            return false;
        };
        self.wisdom.insert(
            digest,
            WisdomEntry {
                slvndx,
                flags,
                blessed: true,
            },
        );
        true
    }
}

impl<T: Float + 'static> Default for Planner<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::DftData;
    use crate::num::Complex;
    use crate::problem::Sign;
    use crate::tensor::Tensor;
    use alloc::vec;

    fn dft_line(n: usize) -> Problem {
        Problem::dft(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            Sign::Forward,
            BufSpec::aligned(BufToken(0)),
            BufSpec::aligned(BufToken(1)),
        )
    }

    #[test]
    fn planners_construct_for_any_float() {
        // `Float + 'static` is the whole bound; hooks default without
        // demanding `T: Default`
        fn fresh<T: Float + 'static>() -> Planner<T> {
            Planner::new()
        }
        let _ = fresh::<f32>();
        let _ = fresh::<f64>();
    }

    #[test]
    fn estimate_plans_a_small_dft() {
        let mut plr = Planner::<f64>::new();
        let plan = plr.plan(&dft_line(8), Flags::ESTIMATE).unwrap();
        assert_eq!(plan.kind(), ProblemKind::Dft);
        assert!(plan.ops().flops() > 0.0);
    }

    #[test]
    fn prime_sizes_are_plannable_at_estimate() {
        let mut plr = Planner::<f64>::new();
        let plan = plr.plan(&dft_line(13), Flags::ESTIMATE).unwrap();
        let mut inp = vec![Complex::new(0.0f64, 0.0); 13];
        let mut out = vec![Complex::new(0.0f64, 0.0); 13];
        inp[1] = Complex::new(1.0, 0.0);
        plan.apply_dft(DftData::OutOfPlace {
            input: &mut inp,
            output: &mut out,
        })
        .unwrap();
        // a unit impulse spreads to unit-magnitude bins
        for c in &out {
            let mag = (c.re * c.re + c.im * c.im).sqrt();
            assert!((mag - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn wisdom_replays_without_a_second_search() {
        let mut plr = Planner::<f64>::new();
        let prb = dft_line(16);
        let first = plr.plan(&prb, Flags::ESTIMATE).unwrap();
        let searches_after_first = plr.stats().searches;
        let second = plr.plan(&prb, Flags::ESTIMATE).unwrap();
        assert_eq!(plr.stats().searches, searches_after_first);
        assert_eq!(first.print(), second.print());
    }

    #[test]
    fn forgetting_everything_forces_a_fresh_search() {
        let mut plr = Planner::<f64>::new();
        let prb = dft_line(16);
        plr.plan(&prb, Flags::ESTIMATE).unwrap();
        let before = plr.stats().searches;
        plr.forget(Forget::Everything);
        assert_eq!(plr.wisdom_len(), 0);
        plr.plan(&prb, Flags::ESTIMATE).unwrap();
        assert!(plr.stats().searches > before);
    }

    #[test]
    fn unblessed_entries_do_not_survive_planning() {
        let mut plr = Planner::<f64>::new();
        plr.plan(&dft_line(12), Flags::ESTIMATE).unwrap();
        // everything left is on the winning path
        assert!(plr.wisdom_len() > 0);
        assert!(plr.exportable_wisdom().len() == plr.wisdom_len());
    }

    #[test]
    fn bogus_wisdom_is_dropped_and_replanned() {
        use alloc::sync::Arc;
        use core::sync::atomic::{AtomicU32, Ordering};

        let mut plr = Planner::<f64>::new();
        let prb = dft_line(8);
        // record a decision pointing at a solver of the wrong kind
        let flags = Flags::ESTIMATE.mapped();
        assert!(plr.absorb_wisdom(prb.digest(), "transpose-copy", flags));
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        plr.hooks.bogosity = Some(Box::new(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        }));
        let plan = plr.plan(&prb, Flags::ESTIMATE);
        assert!(plan.is_some());
        assert_eq!(fired.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn retained_solver_set_constrains_the_plan() {
        let mut plr = Planner::<f64>::new();
        plr.retain_solvers(|name| name == "dft-generic");
        let plan = plr.plan(&dft_line(8), Flags::ESTIMATE).unwrap();
        assert_eq!(plan.print(), "(dft-generic-8)");
    }

    #[test]
    fn wisdom_only_fails_on_unknown_problems() {
        let mut plr = Planner::<f64>::new();
        let plan = plr.plan(&dft_line(32), Flags::ESTIMATE | Flags::WISDOM_ONLY);
        assert!(plan.is_none());
        plr.plan(&dft_line(32), Flags::ESTIMATE).unwrap();
        let replay = plr.plan(&dft_line(32), Flags::ESTIMATE | Flags::WISDOM_ONLY);
        assert!(replay.is_some());
    }

    #[test]
    fn cost_hook_sees_every_candidate() {
        use alloc::sync::Arc;
        use core::sync::atomic::{AtomicU32, Ordering};

        let mut plr = Planner::<f64>::new();
        let seen = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&seen);
        plr.hooks.cost = Some(Box::new(move |_, cost, ck| {
            assert_eq!(ck, CostKind::Estimated);
            counter.fetch_add(1, Ordering::Relaxed);
            cost
        }));
        plr.plan(&dft_line(8), Flags::ESTIMATE).unwrap();
        // at least the direct codelet and the generic fallback compete
        assert!(seen.load(Ordering::Relaxed) >= 2);
    }
}
