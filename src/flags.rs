//! Planner flags: patience levels, permissions, and prohibitions.
//!
//! User-facing flags map to an internal mask through a declarative
//! implication table; solvers consult only the mapped form. The mask also
//! rides along in wisdom entries so that a recorded decision is replayed
//! only under a search regime at least as permissive as the one that
//! produced it.

use core::fmt;

/// Search effort, totally ordered. Higher levels widen the candidate set
/// and switch the cost function from estimation to measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Patience {
    Estimate = 0,
    Measure = 1,
    Patient = 2,
    Exhaustive = 3,
}

impl Patience {
    fn from_bits(b: u32) -> Self {
        match b & 0b11 {
            0 => Patience::Estimate,
            1 => Patience::Measure,
            2 => Patience::Patient,
            _ => Patience::Exhaustive,
        }
    }
}

mod bits {
    pub const PATIENCE: u32 = 0b11;

    pub const DESTROY_INPUT: u32 = 1 << 2;
    pub const PRESERVE_INPUT: u32 = 1 << 3;
    pub const UNALIGNED: u32 = 1 << 4;
    pub const CONSERVE_MEMORY: u32 = 1 << 5;
    pub const NO_SIMD: u32 = 1 << 6;
    pub const ALLOW_PRUNING: u32 = 1 << 7;
    pub const ALLOW_LARGE_GENERIC: u32 = 1 << 8;
    pub const WISDOM_ONLY: u32 = 1 << 9;

    pub const NO_BUFFERING: u32 = 1 << 10;
    pub const NO_INDIRECT: u32 = 1 << 11;
    pub const NO_RANK_SPLITS: u32 = 1 << 12;
    pub const NO_VRANK_SPLITS: u32 = 1 << 13;
    pub const NO_DFT_R2HC: u32 = 1 << 14;
    pub const NO_SLOW: u32 = 1 << 15;
    pub const NO_UGLY: u32 = 1 << 16;
    pub const NO_NONTHREADED: u32 = 1 << 17;
    pub const NO_FIXED_RADIX_LARGE_N: u32 = 1 << 18;
    pub const BLESSING: u32 = 1 << 19;

    /// Constraints that narrow the plan space. A wisdom entry recorded
    /// under a superset of the query's constraints is admissible.
    pub const PROHIBITIONS: u32 = PRESERVE_INPUT
        | CONSERVE_MEMORY
        | NO_SIMD
        | NO_BUFFERING
        | NO_INDIRECT
        | NO_RANK_SPLITS
        | NO_VRANK_SPLITS
        | NO_DFT_R2HC
        | NO_SLOW
        | NO_UGLY
        | NO_NONTHREADED
        | NO_FIXED_RADIX_LARGE_N;

    /// Grants that widen the plan space. A recorded entry must not rely on
    /// a grant the query withholds.
    pub const PERMISSIONS: u32 = DESTROY_INPUT | ALLOW_PRUNING | ALLOW_LARGE_GENERIC;

    pub const KNOWN: u32 = PATIENCE
        | PROHIBITIONS
        | PERMISSIONS
        | UNALIGNED
        | WISDOM_ONLY
        | BLESSING;
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u32);

impl Flags {
    pub const ESTIMATE: Flags = Flags(Patience::Estimate as u32);
    pub const MEASURE: Flags = Flags(Patience::Measure as u32);
    pub const PATIENT: Flags = Flags(Patience::Patient as u32);
    pub const EXHAUSTIVE: Flags = Flags(Patience::Exhaustive as u32);

    pub const DESTROY_INPUT: Flags = Flags(bits::DESTROY_INPUT);
    pub const PRESERVE_INPUT: Flags = Flags(bits::PRESERVE_INPUT);
    pub const UNALIGNED: Flags = Flags(bits::UNALIGNED);
    pub const CONSERVE_MEMORY: Flags = Flags(bits::CONSERVE_MEMORY);
    pub const NO_SIMD: Flags = Flags(bits::NO_SIMD);
    pub const ALLOW_PRUNING: Flags = Flags(bits::ALLOW_PRUNING);
    pub const ALLOW_LARGE_GENERIC: Flags = Flags(bits::ALLOW_LARGE_GENERIC);
    pub const WISDOM_ONLY: Flags = Flags(bits::WISDOM_ONLY);

    pub const NO_BUFFERING: Flags = Flags(bits::NO_BUFFERING);
    pub const NO_INDIRECT: Flags = Flags(bits::NO_INDIRECT);
    pub const NO_RANK_SPLITS: Flags = Flags(bits::NO_RANK_SPLITS);
    pub const NO_VRANK_SPLITS: Flags = Flags(bits::NO_VRANK_SPLITS);
    pub const NO_DFT_R2HC: Flags = Flags(bits::NO_DFT_R2HC);
    pub const NO_SLOW: Flags = Flags(bits::NO_SLOW);
    pub const NO_UGLY: Flags = Flags(bits::NO_UGLY);
    pub const NO_NONTHREADED: Flags = Flags(bits::NO_NONTHREADED);
    pub const NO_FIXED_RADIX_LARGE_N: Flags = Flags(bits::NO_FIXED_RADIX_LARGE_N);
    pub(crate) const BLESSING: Flags = Flags(bits::BLESSING);

    pub fn patience(self) -> Patience {
        Patience::from_bits(self.0)
    }

    pub fn with_patience(self, p: Patience) -> Flags {
        Flags((self.0 & !bits::PATIENCE) | p as u32)
    }

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    pub(crate) fn prohibitions(self) -> u32 {
        self.0 & bits::PROHIBITIONS
    }

    pub(crate) fn permissions(self) -> u32 {
        self.0 & bits::PERMISSIONS
    }

    pub(crate) fn blessing(self) -> bool {
        self.0 & bits::BLESSING != 0
    }

    pub(crate) fn wisdom_only(self) -> bool {
        self.0 & bits::WISDOM_ONLY != 0
    }

    pub(crate) fn destroys_input(self) -> bool {
        self.0 & bits::DESTROY_INPUT != 0
    }

    /// Raw bit image, as stored in wisdom.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Rebuild from a stored bit image, dropping bits this version does not
    /// know so that newer wisdom stays importable.
    pub fn from_bits(b: u32) -> Flags {
        Flags(b & bits::KNOWN)
    }

    /// Apply the implication table to a user flag set, producing the mask
    /// the planner and solvers consult.
    pub fn mapped(self) -> Flags {
        let mut out = self;
        for rule in MAPFLAGS {
            if rule.when.holds(self) {
                out.0 |= rule.set;
                out.0 &= !rule.clear;
            }
        }
        out
    }

    /// Whether a decision recorded under `self` may answer a query planned
    /// under `query`: at least as much effort, at least as constrained, and
    /// relying on no grant the query withholds.
    pub(crate) fn subsumes(self, query: Flags) -> bool {
        self.patience() >= query.patience()
            && query.prohibitions() & !self.prohibitions() == 0
            && self.permissions() & !query.permissions() == 0
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;
    fn bitor(self, rhs: Flags) -> Flags {
        // patience fields combine by maximum, not bitwise, so that
        // MEASURE | PATIENT does not read as EXHAUSTIVE
        let p = core::cmp::max(self.patience(), rhs.patience());
        Flags(((self.0 | rhs.0) & !bits::PATIENCE) | p as u32)
    }
}

impl core::ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        *self = *self | rhs;
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:?}, {:#x})", self.patience(), self.0 & !bits::PATIENCE)
    }
}

enum Cond {
    PatienceIs(Patience),
    PatienceAtMost(Patience),
    PatienceAtLeast(Patience),
    Has(u32),
}

impl Cond {
    fn holds(&self, f: Flags) -> bool {
        match *self {
            Cond::PatienceIs(p) => f.patience() == p,
            Cond::PatienceAtMost(p) => f.patience() <= p,
            Cond::PatienceAtLeast(p) => f.patience() >= p,
            Cond::Has(mask) => f.0 & mask != 0,
        }
    }
}

struct Implication {
    when: Cond,
    set: u32,
    clear: u32,
}

/// The implication table, applied in order. Later rules override earlier
/// ones, which is what lets high patience re-open searches the impatient
/// defaults close.
static MAPFLAGS: &[Implication] = &[
    Implication {
        when: Cond::PatienceAtMost(Patience::Measure),
        set: bits::NO_UGLY | bits::NO_FIXED_RADIX_LARGE_N,
        clear: 0,
    },
    Implication {
        when: Cond::PatienceIs(Patience::Estimate),
        set: bits::NO_SLOW,
        clear: 0,
    },
    Implication {
        when: Cond::Has(bits::CONSERVE_MEMORY),
        set: bits::NO_BUFFERING,
        clear: 0,
    },
    Implication {
        when: Cond::Has(bits::PRESERVE_INPUT),
        set: 0,
        clear: bits::DESTROY_INPUT,
    },
    Implication {
        when: Cond::Has(bits::UNALIGNED),
        set: bits::NO_SIMD,
        clear: 0,
    },
    Implication {
        when: Cond::PatienceAtLeast(Patience::Patient),
        set: 0,
        clear: bits::NO_UGLY | bits::NO_FIXED_RADIX_LARGE_N,
    },
    Implication {
        when: Cond::PatienceIs(Patience::Exhaustive),
        set: 0,
        clear: bits::NO_SLOW | bits::NO_UGLY | bits::NO_FIXED_RADIX_LARGE_N,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_maps_to_narrow_search() {
        let f = Flags::ESTIMATE.mapped();
        assert!(f.contains(Flags::NO_UGLY));
        assert!(f.contains(Flags::NO_SLOW));
        assert!(f.contains(Flags::NO_FIXED_RADIX_LARGE_N));
    }

    #[test]
    fn patient_reopens_ugly_solvers() {
        let f = Flags::PATIENT.mapped();
        assert!(!f.contains(Flags::NO_UGLY));
        assert!(!f.contains(Flags::NO_FIXED_RADIX_LARGE_N));
    }

    #[test]
    fn exhaustive_clears_everything_implied() {
        let f = Flags::EXHAUSTIVE.mapped();
        assert_eq!(f.prohibitions(), 0);
    }

    #[test]
    fn conserve_memory_implies_no_buffering() {
        let f = (Flags::MEASURE | Flags::CONSERVE_MEMORY).mapped();
        assert!(f.contains(Flags::NO_BUFFERING));
    }

    #[test]
    fn preserve_input_negates_destroy() {
        let f = (Flags::MEASURE | Flags::DESTROY_INPUT | Flags::PRESERVE_INPUT).mapped();
        assert!(!f.destroys_input());
        assert!(f.contains(Flags::PRESERVE_INPUT));
    }

    #[test]
    fn patience_combines_by_maximum() {
        let f = Flags::MEASURE | Flags::PATIENT;
        assert_eq!(f.patience(), Patience::Patient);
    }

    #[test]
    fn subsumption_requires_more_effort_and_more_constraints() {
        let recorded = Flags::PATIENT.mapped();
        let query_est = Flags::ESTIMATE.mapped();
        // estimate queries carry extra prohibitions the patient search
        // never honored
        assert!(!recorded.subsumes(query_est));
        assert!(recorded.subsumes(Flags::PATIENT.mapped()));
        assert!(!Flags::MEASURE.mapped().subsumes(Flags::PATIENT.mapped()));
    }

    #[test]
    fn destroy_grant_blocks_preserving_queries() {
        let recorded = Flags::MEASURE | Flags::DESTROY_INPUT;
        let query = Flags::MEASURE;
        assert!(!recorded.mapped().subsumes(query.mapped()));
    }

    #[test]
    fn unknown_bits_drop_on_import() {
        let f = Flags::from_bits(u32::MAX);
        assert_eq!(f.bits() & !super::bits::KNOWN, 0);
    }
}
