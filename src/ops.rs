//! Floating-point operation counts carried by every plan node.
//!
//! Counts are kept in `f64` so that vector loops can scale them without
//! overflow and so the estimator can mix them with stride penalties.

/// Real additions, multiplications, fused multiply-adds, and everything
/// else (loads, permutations, integer work) a plan performs per apply.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OpCounts {
    pub adds: f64,
    pub muls: f64,
    pub fmas: f64,
    pub other: f64,
}

impl OpCounts {
    pub const fn new(adds: f64, muls: f64, fmas: f64, other: f64) -> Self {
        Self {
            adds,
            muls,
            fmas,
            other,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Counts for a pass repeated `k` times.
    pub fn repeat(self, k: usize) -> Self {
        let k = k as f64;
        Self {
            adds: self.adds * k,
            muls: self.muls * k,
            fmas: self.fmas * k,
            other: self.other * k,
        }
    }

    /// Scalar cost heuristic used when no measurement is available.
    /// An fma retires two flops but rarely in one cycle, hence the weight.
    pub fn weighted(&self) -> f64 {
        self.adds + self.muls + 2.0 * self.fmas + self.other
    }

    pub fn flops(&self) -> f64 {
        self.adds + self.muls + 2.0 * self.fmas
    }
}

impl core::ops::Add for OpCounts {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            adds: self.adds + rhs.adds,
            muls: self.muls + rhs.muls,
            fmas: self.fmas + rhs.fmas,
            other: self.other + rhs.other,
        }
    }
}

impl core::ops::AddAssign for OpCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_scales_every_field() {
        let ops = OpCounts::new(4.0, 2.0, 1.0, 3.0);
        let tripled = ops.repeat(3);
        assert_eq!(tripled.adds, 12.0);
        assert_eq!(tripled.muls, 6.0);
        assert_eq!(tripled.fmas, 3.0);
        assert_eq!(tripled.other, 9.0);
    }

    #[test]
    fn weighted_counts_fma_twice() {
        let ops = OpCounts::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(ops.weighted(), 5.0);
        assert_eq!(OpCounts::zero().weighted(), 0.0);
    }
}
