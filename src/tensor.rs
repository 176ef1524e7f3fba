//! Strided index descriptors shared by every problem kind.
//!
//! A [`Tensor`] is an ordered list of dimensions, each with an extent and a
//! pair of strides (input side, output side). Rank is either finite or the
//! minus-infinity sentinel that denotes an empty, do-nothing index set.
//! Tensors are immutable after construction; canonicalization returns new
//! values so equivalent descriptors hash identically.

use alloc::vec::Vec;

use crate::fingerprint::Fingerprinter;

/// One dimension: extent plus input/output strides in element units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dim {
    pub n: usize,
    pub is: isize,
    pub os: isize,
}

impl Dim {
    pub const fn new(n: usize, is: isize, os: isize) -> Self {
        Self { n, is, os }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tensor {
    dims: Vec<Dim>,
    minfty: bool,
}

impl Tensor {
    /// Build a finite-rank tensor. A zero extent in any dimension denotes an
    /// empty index set and collapses the whole tensor to minus-infinity.
    pub fn new(dims: Vec<Dim>) -> Self {
        if dims.iter().any(|d| d.n == 0) {
            return Self::minus_infinity();
        }
        Self {
            dims,
            minfty: false,
        }
    }

    pub fn rank0() -> Self {
        Self {
            dims: Vec::new(),
            minfty: false,
        }
    }

    pub fn one_d(n: usize, is: isize, os: isize) -> Self {
        Self::new(alloc::vec![Dim::new(n, is, os)])
    }

    pub fn minus_infinity() -> Self {
        Self {
            dims: Vec::new(),
            minfty: true,
        }
    }

    /// Finite rank, or `None` for the minus-infinity sentinel.
    pub fn rnk(&self) -> Option<usize> {
        if self.minfty {
            None
        } else {
            Some(self.dims.len())
        }
    }

    pub fn is_minus_infinity(&self) -> bool {
        self.minfty
    }

    pub fn dims(&self) -> &[Dim] {
        &self.dims
    }

    /// Strides are well-formed: no zero stride on a dimension that actually
    /// iterates. Minus-infinity is vacuously well-formed.
    pub fn kosher(&self) -> bool {
        self.dims
            .iter()
            .all(|d| d.n == 1 || (d.is != 0 && d.os != 0))
    }

    /// Concatenation. Minus-infinity absorbs.
    pub fn append(&self, other: &Tensor) -> Tensor {
        if self.minfty || other.minfty {
            return Tensor::minus_infinity();
        }
        let mut dims = Vec::with_capacity(self.dims.len() + other.dims.len());
        dims.extend_from_slice(&self.dims);
        dims.extend_from_slice(&other.dims);
        Tensor {
            dims,
            minfty: false,
        }
    }

    /// Split before `pos` into head and tail.
    pub fn split(&self, pos: usize) -> (Tensor, Tensor) {
        if self.minfty {
            return (Tensor::minus_infinity(), Tensor::minus_infinity());
        }
        let head = Tensor {
            dims: self.dims[..pos].to_vec(),
            minfty: false,
        };
        let tail = Tensor {
            dims: self.dims[pos..].to_vec(),
            minfty: false,
        };
        (head, tail)
    }

    /// Canonical form: unit extents dropped, dimensions sorted by
    /// `(|is|, |os|)` ascending (stable), then dimensions contiguous in both
    /// strides merged. Equivalent index sets compress to equal tensors.
    pub fn compress(&self) -> Tensor {
        if self.minfty {
            return Tensor::minus_infinity();
        }
        let mut dims: Vec<Dim> = self.dims.iter().copied().filter(|d| d.n != 1).collect();
        dims.sort_by_key(|d| (d.is.unsigned_abs(), d.os.unsigned_abs()));
        Tensor {
            dims: merge_contiguous(dims),
            minfty: false,
        }
    }

    /// Like [`compress`](Self::compress) but keeps the given dimension
    /// order, merging only adjacent contiguous pairs. Used where memory
    /// order matters, e.g. when sizing copy buffers.
    pub fn compress_contiguous(&self) -> Tensor {
        if self.minfty {
            return Tensor::minus_infinity();
        }
        let dims: Vec<Dim> = self.dims.iter().copied().filter(|d| d.n != 1).collect();
        Tensor {
            dims: merge_contiguous(dims),
            minfty: false,
        }
    }

    /// True when every dimension reads and writes through the same stride.
    pub fn inplace_strides(&self) -> bool {
        self.dims.iter().all(|d| d.is == d.os)
    }

    /// Total number of index tuples; zero for minus-infinity.
    pub fn sz(&self) -> usize {
        if self.minfty {
            return 0;
        }
        self.dims.iter().map(|d| d.n).product()
    }

    /// Largest absolute linear offset touched on either side. Used to size
    /// measurement and bounce buffers.
    pub fn max_index(&self) -> usize {
        self.dims
            .iter()
            .map(|d| (d.n - 1) * core::cmp::max(d.is.unsigned_abs(), d.os.unsigned_abs()))
            .sum()
    }

    /// `(lowest, highest)` linear offsets reachable through the input
    /// strides. Negative strides push the lower bound below zero.
    pub fn bounds_in(&self) -> (isize, isize) {
        let mut lo = 0isize;
        let mut hi = 0isize;
        for d in &self.dims {
            let span = (d.n - 1) as isize * d.is;
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        (lo, hi)
    }

    /// Input-stride bounds, output side.
    pub fn bounds_out(&self) -> (isize, isize) {
        let mut lo = 0isize;
        let mut hi = 0isize;
        for d in &self.dims {
            let span = (d.n - 1) as isize * d.os;
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        (lo, hi)
    }

    /// View a rank-0 or rank-1 tensor as a single vector dimension.
    /// Rank 0 is a single iteration with zero strides.
    pub fn tornk1(&self) -> Option<(usize, isize, isize)> {
        match self.rnk() {
            Some(0) => Some((1, 0, 0)),
            Some(1) => {
                let d = self.dims[0];
                Some((d.n, d.is, d.os))
            }
            _ => None,
        }
    }

    /// Whether an in-place transform over `sz` and `vecsz` touches the same
    /// set of locations on the read and write sides. Rejecting mismatched
    /// sets keeps in-place problems realizable at all.
    ///
    /// Equal `(|stride|, n)` multisets always qualify. Transpose-shaped
    /// tensors permute strides across dimensions instead, so both sides are
    /// also accepted when each telescopes into one dense block starting at
    /// the same base stride.
    pub fn inplace_locations(sz: &Tensor, vecsz: &Tensor) -> bool {
        let all = sz.append(vecsz);
        if all.minfty {
            return true;
        }
        let mut ins: Vec<(usize, usize)> = all
            .dims
            .iter()
            .map(|d| (d.is.unsigned_abs(), d.n))
            .collect();
        let mut outs: Vec<(usize, usize)> = all
            .dims
            .iter()
            .map(|d| (d.os.unsigned_abs(), d.n))
            .collect();
        ins.sort_unstable();
        outs.sort_unstable();
        if ins == outs {
            return true;
        }
        match (dense_span(&ins), dense_span(&outs)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn fingerprint(&self, f: &mut Fingerprinter) {
        f.tag("t");
        match self.rnk() {
            None => f.word(u64::MAX),
            Some(r) => {
                f.word(r as u64);
                for d in &self.dims {
                    f.word(d.n as u64);
                    f.int(d.is as i64);
                    f.int(d.os as i64);
                }
            }
        }
    }
}

/// `(base stride, covered count)` when sorted `(|stride|, n)` pairs
/// telescope: each stride is the previous stride times the previous extent,
/// so the side covers one dense block of `count` slots spaced `base` apart.
fn dense_span(sorted: &[(usize, usize)]) -> Option<(usize, usize)> {
    let &(base, _) = sorted.first()?;
    let mut step = base;
    let mut total = 1usize;
    for &(s, n) in sorted {
        if s != step {
            return None;
        }
        step = s * n;
        total *= n;
    }
    Some((base, total))
}

impl core::fmt::Display for Tensor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.minfty {
            return write!(f, "(t -infty)");
        }
        write!(f, "(t {}", self.dims.len())?;
        for d in &self.dims {
            write!(f, " ({} {} {})", d.n, d.is, d.os)?;
        }
        write!(f, ")")
    }
}

/// Merge adjacent pairs where the later dimension iterates exactly one step
/// of the earlier on both sides. Input must already be free of unit extents.
fn merge_contiguous(dims: Vec<Dim>) -> Vec<Dim> {
    let mut out: Vec<Dim> = Vec::with_capacity(dims.len());
    for d in dims {
        if let Some(last) = out.last_mut() {
            let span = last.n as isize;
            if d.is == last.is * span && d.os == last.os * span {
                last.n *= d.n;
                continue;
            }
        }
        out.push(d);
    }
    out
}


#[cfg(all(feature = "internal-tests", test))]
mod coverage_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_dim() -> impl Strategy<Value = Dim> {
        (1usize..6, 1isize..8, 1isize..8).prop_map(|(n, is, os)| Dim::new(n, is, os))
    }

    proptest! {
        #[test]
        fn compress_preserves_size(dims in proptest::collection::vec(arb_dim(), 0..5)) {
            let t = Tensor::new(dims);
            prop_assert_eq!(t.sz(), t.compress().sz());
        }

        #[test]
        fn compress_idempotent(dims in proptest::collection::vec(arb_dim(), 0..5)) {
            let t = Tensor::new(dims);
            let once = t.compress();
            prop_assert_eq!(once.clone(), once.compress());
        }

        #[test]
        fn append_rank_adds(a in proptest::collection::vec(arb_dim(), 0..4),
                            b in proptest::collection::vec(arb_dim(), 0..4)) {
            let ta = Tensor::new(a);
            let tb = Tensor::new(b);
            let ab = ta.append(&tb);
            prop_assert_eq!(ab.rnk(), Some(ta.dims().len() + tb.dims().len()));
        }
    }
}
