//! Leaf kernel descriptors and the startup registry.
//!
//! A codelet is an opaque leaf: a fixed-size kernel plus the metadata the
//! planner needs to use it without looking inside. The descriptor carries the
//! transform length, the kind, expected operation counts, and a genus whose
//! `okp` predicate gates strides and alignment. Direct solvers are minted
//! one-per-descriptor at planner construction; the SIMD shim appends
//! additional descriptors when the host qualifies.

use alloc::vec::Vec;

use crate::flags::Flags;
use crate::kernels::{self, DftKernel, R2rKernel};
use crate::num::Float;
use crate::ops::OpCounts;
use crate::problem::{Problem, R2rKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeletKind {
    Dft,
    R2r(R2rKind),
}

/// Shape family of a codelet. `aligned_only` marks vectorized variants that
/// require untainted pointers and contiguous interleaved data.
#[derive(Clone, Copy, Debug)]
pub struct Genus {
    pub aligned_only: bool,
}

#[derive(Clone, Copy)]
pub enum CodeletApply<T: Float> {
    Dft(DftKernel<T>),
    R2r(R2rKernel<T>),
}

#[derive(Clone, Copy)]
pub struct CodeletDesc<T: Float> {
    pub name: &'static str,
    pub n: usize,
    pub kind: CodeletKind,
    pub ops: OpCounts,
    pub genus: Genus,
    pub apply: CodeletApply<T>,
}

impl<T: Float> CodeletDesc<T> {
    /// Applicability predicate: does this leaf fit the problem's inner loop?
    pub fn okp(&self, prb: &Problem, flags: Flags) -> bool {
        match (self.kind, prb) {
            (CodeletKind::Dft, Problem::Dft(p)) => {
                if p.sz.rnk() != Some(1) || p.sz.dims()[0].n != self.n {
                    return false;
                }
                if p.vecsz.tornk1().is_none() {
                    return false;
                }
                if self.genus.aligned_only {
                    let d = p.sz.dims()[0];
                    p.inp.aligned
                        && p.out.aligned
                        && !flags.contains(Flags::NO_SIMD)
                        && d.is == 1
                        && d.os == 1
                } else {
                    true
                }
            }
            (CodeletKind::R2r(k), Problem::Rdft(p)) => {
                p.sz.rnk() == Some(1)
                    && p.sz.dims()[0].n == self.n
                    && p.kinds.len() == 1
                    && p.kinds[0] == k
                    && p.vecsz.tornk1().is_some()
                    && !self.genus.aligned_only
            }
            _ => false,
        }
    }
}

const SCALAR: Genus = Genus {
    aligned_only: false,
};

/// The hand-written scalar leaf set. Operation counts are per invocation
/// with `vl == 1`, real flops.
pub(crate) fn scalar_codelets<T: Float>() -> Vec<CodeletDesc<T>> {
    alloc::vec![
        dft_desc("n1_2", 2, OpCounts::new(4.0, 0.0, 0.0, 4.0), kernels::dft2),
        dft_desc("n1_3", 3, OpCounts::new(12.0, 4.0, 4.0, 6.0), kernels::dft3),
        dft_desc("n1_4", 4, OpCounts::new(16.0, 0.0, 0.0, 8.0), kernels::dft4),
        dft_desc("n1_5", 5, OpCounts::new(32.0, 12.0, 4.0, 10.0), kernels::dft5),
        dft_desc("n1_8", 8, OpCounts::new(52.0, 4.0, 8.0, 16.0), kernels::dft8),
        dft_desc("n1_16", 16, OpCounts::new(136.0, 24.0, 16.0, 32.0), kernels::dft16),
        r2r_desc(
            "r2hc_2",
            2,
            R2rKind::R2hc,
            OpCounts::new(2.0, 0.0, 0.0, 2.0),
            kernels::r2hc2,
        ),
        r2r_desc(
            "r2hc_3",
            3,
            R2rKind::R2hc,
            OpCounts::new(4.0, 2.0, 0.0, 3.0),
            kernels::r2hc3,
        ),
        r2r_desc(
            "r2hc_4",
            4,
            R2rKind::R2hc,
            OpCounts::new(6.0, 0.0, 0.0, 4.0),
            kernels::r2hc4,
        ),
        r2r_desc(
            "r2hc_5",
            5,
            R2rKind::R2hc,
            OpCounts::new(12.0, 8.0, 0.0, 5.0),
            kernels::r2hc5,
        ),
        r2r_desc(
            "hc2r_2",
            2,
            R2rKind::Hc2r,
            OpCounts::new(2.0, 0.0, 0.0, 2.0),
            kernels::hc2r2,
        ),
        r2r_desc(
            "hc2r_3",
            3,
            R2rKind::Hc2r,
            OpCounts::new(4.0, 2.0, 0.0, 3.0),
            kernels::hc2r3,
        ),
        r2r_desc(
            "hc2r_4",
            4,
            R2rKind::Hc2r,
            OpCounts::new(6.0, 0.0, 0.0, 4.0),
            kernels::hc2r4,
        ),
        r2r_desc(
            "hc2r_5",
            5,
            R2rKind::Hc2r,
            OpCounts::new(12.0, 10.0, 0.0, 5.0),
            kernels::hc2r5,
        ),
    ]
}

fn dft_desc<T: Float>(
    name: &'static str,
    n: usize,
    ops: OpCounts,
    kernel: DftKernel<T>,
) -> CodeletDesc<T> {
    CodeletDesc {
        name,
        n,
        kind: CodeletKind::Dft,
        ops,
        genus: SCALAR,
        apply: CodeletApply::Dft(kernel),
    }
}

fn r2r_desc<T: Float>(
    name: &'static str,
    n: usize,
    kind: R2rKind,
    ops: OpCounts,
    kernel: R2rKernel<T>,
) -> CodeletDesc<T> {
    CodeletDesc {
        name,
        n,
        kind: CodeletKind::R2r(kind),
        ops,
        genus: SCALAR,
        apply: CodeletApply::R2r(kernel),
    }
}
