//! The problem algebra: immutable descriptions of transforms to plan.
//!
//! A problem is data, not behavior. Constructors canonicalize so that
//! equivalent requests fingerprint identically: tensors compress, equal
//! storage tokens join the two planes into an in-place record, and
//! impossible in-place stride patterns collapse to [`Problem::Unsolvable`].

use alloc::vec::Vec;
use core::fmt;

use crate::buffer::{BufSpec, Io};
use crate::fingerprint::{Digest, Fingerprinter};
use crate::num::Float;
use crate::tensor::Tensor;

/// Transform direction. `Forward` applies `e^{-2πi/n}` phases, the usual
/// engineering convention; `Backward` the conjugate. Numerically they are
/// the spectral signs −1 and +1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    Forward,
    Backward,
}

impl Sign {
    pub fn as_int(self) -> i32 {
        match self {
            Sign::Forward => -1,
            Sign::Backward => 1,
        }
    }

    pub fn reverse(self) -> Sign {
        match self {
            Sign::Forward => Sign::Backward,
            Sign::Backward => Sign::Forward,
        }
    }
}

/// Per-dimension real transform kinds. `R2hc`/`Hc2r` use the halfcomplex
/// layout `[r0, r1, …, r_{n/2}, i_{(n+1)/2−1}, …, i_1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum R2rKind {
    R2hc,
    Hc2r,
    Dht,
    Redft00,
    Redft10,
    Redft01,
    Redft11,
    Rodft00,
    Rodft10,
    Rodft01,
    Rodft11,
}

impl R2rKind {
    pub fn name(self) -> &'static str {
        match self {
            R2rKind::R2hc => "r2hc",
            R2rKind::Hc2r => "hc2r",
            R2rKind::Dht => "dht",
            R2rKind::Redft00 => "redft00",
            R2rKind::Redft10 => "redft10",
            R2rKind::Redft01 => "redft01",
            R2rKind::Redft11 => "redft11",
            R2rKind::Rodft00 => "rodft00",
            R2rKind::Rodft10 => "rodft10",
            R2rKind::Rodft01 => "rodft01",
            R2rKind::Rodft11 => "rodft11",
        }
    }
}

/// Real↔halfcomplex kinds for the last dimension of an r2c/c2r problem.
/// The II/III forms are the shifted variants that arise inside even/odd
/// decompositions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rdft2Kind {
    R2hc,
    Hc2r,
    R2hcII,
    Hc2rIII,
}

impl Rdft2Kind {
    pub fn name(self) -> &'static str {
        match self {
            Rdft2Kind::R2hc => "r2hc",
            Rdft2Kind::Hc2r => "hc2r",
            Rdft2Kind::R2hcII => "r2hcII",
            Rdft2Kind::Hc2rIII => "hc2rIII",
        }
    }

    pub fn reads_real(self) -> bool {
        matches!(self, Rdft2Kind::R2hc | Rdft2Kind::R2hcII)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DftProblem {
    pub sz: Tensor,
    pub vecsz: Tensor,
    pub sign: Sign,
    pub inp: BufSpec,
    pub out: BufSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RdftProblem {
    pub sz: Tensor,
    pub vecsz: Tensor,
    /// One kind per size dimension, kept in step with `sz` through
    /// canonicalization.
    pub kinds: Vec<R2rKind>,
    pub inp: BufSpec,
    pub out: BufSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rdft2Problem {
    /// All but the last dimension are ordinary; the last is the
    /// real↔halfcomplex one.
    pub sz: Tensor,
    pub vecsz: Tensor,
    pub kind: Rdft2Kind,
    pub real: BufSpec,
    pub cplx: BufSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransposeProblem {
    /// Rank-2 or rank-3 tensor whose strides describe the permutation; a
    /// third dimension is the tuple length.
    pub vecsz: Tensor,
    pub inp: BufSpec,
    pub out: BufSpec,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Problem {
    Dft(DftProblem),
    Rdft(RdftProblem),
    Rdft2(Rdft2Problem),
    Transpose(TransposeProblem),
    Unsolvable,
}

/// Problem families the solver registry indexes by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProblemKind {
    Dft,
    Rdft,
    Rdft2,
    Transpose,
}

impl ProblemKind {
    pub(crate) const COUNT: usize = 4;

    pub(crate) fn index(self) -> usize {
        match self {
            ProblemKind::Dft => 0,
            ProblemKind::Rdft => 1,
            ProblemKind::Rdft2 => 2,
            ProblemKind::Transpose => 3,
        }
    }
}

/// Join two plane specs when they name the same storage; alignment only
/// holds if both views claim it.
fn join_planes(a: BufSpec, b: BufSpec) -> (BufSpec, BufSpec, bool) {
    if a.same_storage(&b) {
        let joined = BufSpec {
            token: a.token,
            aligned: a.aligned && b.aligned,
        };
        (joined, joined, true)
    } else {
        (a, b, false)
    }
}

impl Problem {
    pub fn dft(sz: Tensor, vecsz: Tensor, sign: Sign, inp: BufSpec, out: BufSpec) -> Problem {
        if !sz.kosher() || !vecsz.kosher() {
            return Problem::Unsolvable;
        }
        let sz = sz.compress();
        let vecsz = vecsz.compress();
        let (inp, out, in_place) = join_planes(inp, out);
        if in_place && !Tensor::inplace_locations(&sz, &vecsz) {
            return Problem::Unsolvable;
        }
        Problem::Dft(DftProblem {
            sz,
            vecsz,
            sign,
            inp,
            out,
        })
    }

    /// Contiguous 1-d complex transform, the common case.
    pub fn dft_1d(n: usize, sign: Sign, inp: BufSpec, out: BufSpec) -> Problem {
        Problem::dft(Tensor::one_d(n, 1, 1), Tensor::rank0(), sign, inp, out)
    }

    pub fn rdft(
        sz: Tensor,
        vecsz: Tensor,
        kinds: Vec<R2rKind>,
        inp: BufSpec,
        out: BufSpec,
    ) -> Problem {
        if !sz.kosher() || !vecsz.kosher() {
            return Problem::Unsolvable;
        }
        if sz.is_minus_infinity() {
            let (inp, out, _) = join_planes(inp, out);
            return Problem::Rdft(RdftProblem {
                sz,
                vecsz: vecsz.compress(),
                kinds: Vec::new(),
                inp,
                out,
            });
        }
        if kinds.len() != sz.dims().len() {
            return Problem::Unsolvable;
        }
        // canonicalize while keeping each kind glued to its dimension:
        // drop unit extents, then stable-sort pairs by stride magnitude
        let mut pairs: Vec<(crate::tensor::Dim, R2rKind)> = sz
            .dims()
            .iter()
            .copied()
            .zip(kinds.iter().copied())
            .filter(|(d, _)| d.n != 1)
            .collect();
        pairs.sort_by_key(|(d, _)| (d.is.unsigned_abs(), d.os.unsigned_abs()));
        let sz = Tensor::new(pairs.iter().map(|(d, _)| *d).collect());
        let kinds: Vec<R2rKind> = pairs.into_iter().map(|(_, k)| k).collect();
        let vecsz = vecsz.compress();
        let (inp, out, in_place) = join_planes(inp, out);
        if in_place && !Tensor::inplace_locations(&sz, &vecsz) {
            return Problem::Unsolvable;
        }
        Problem::Rdft(RdftProblem {
            sz,
            vecsz,
            kinds,
            inp,
            out,
        })
    }

    pub fn rdft_1d(n: usize, kind: R2rKind, inp: BufSpec, out: BufSpec) -> Problem {
        Problem::rdft(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            alloc::vec![kind],
            inp,
            out,
        )
    }

    pub fn rdft2(
        sz: Tensor,
        vecsz: Tensor,
        kind: Rdft2Kind,
        real: BufSpec,
        cplx: BufSpec,
    ) -> Problem {
        if !sz.kosher() || !vecsz.kosher() {
            return Problem::Unsolvable;
        }
        if sz.rnk() == Some(0) {
            return Problem::Unsolvable;
        }
        // the last dimension carries the halfcomplex packing; compress only
        // the leading ones so it stays identifiable
        let sz = match sz.rnk() {
            None => sz,
            Some(r) => {
                let (rest, hc) = sz.split(r - 1);
                rest.compress().append(&hc)
            }
        };
        let vecsz = vecsz.compress();
        Problem::Rdft2(Rdft2Problem {
            sz,
            vecsz,
            kind,
            real,
            cplx,
        })
    }

    pub fn rdft2_1d(n: usize, kind: Rdft2Kind, real: BufSpec, cplx: BufSpec) -> Problem {
        Problem::rdft2(
            Tensor::one_d(n, 1, 1),
            Tensor::rank0(),
            kind,
            real,
            cplx,
        )
    }

    pub fn transpose(vecsz: Tensor, inp: BufSpec, out: BufSpec) -> Problem {
        if !vecsz.kosher() {
            return Problem::Unsolvable;
        }
        match vecsz.rnk() {
            None => {}
            Some(2) | Some(3) => {}
            _ => return Problem::Unsolvable,
        }
        let (inp, out, in_place) = join_planes(inp, out);
        if in_place && !Tensor::inplace_locations(&Tensor::rank0(), &vecsz) {
            return Problem::Unsolvable;
        }
        Problem::Transpose(TransposeProblem { vecsz, inp, out })
    }

    /// Row-major `n0 × n1` matrix of `vl`-tuples, transposed in place.
    pub fn transpose_in_place(n0: usize, n1: usize, vl: usize, buf: BufSpec) -> Problem {
        let vecsz = transpose_tensor(n0, n1, vl);
        Problem::transpose(vecsz, buf, buf)
    }

    pub fn kind(&self) -> Option<ProblemKind> {
        match self {
            Problem::Dft(_) => Some(ProblemKind::Dft),
            Problem::Rdft(_) => Some(ProblemKind::Rdft),
            Problem::Rdft2(_) => Some(ProblemKind::Rdft2),
            Problem::Transpose(_) => Some(ProblemKind::Transpose),
            Problem::Unsolvable => None,
        }
    }

    pub fn in_place(&self) -> bool {
        match self {
            Problem::Dft(p) => p.inp.same_storage(&p.out),
            Problem::Rdft(p) => p.inp.same_storage(&p.out),
            Problem::Rdft2(p) => p.real.same_storage(&p.cplx),
            Problem::Transpose(p) => p.inp.same_storage(&p.out),
            Problem::Unsolvable => false,
        }
    }

    /// Canonical content digest: covers kind, shape, strides, direction,
    /// in-place-ness, and alignment bits, never storage addresses. Wisdom
    /// stays valid across runs and hosts because of that.
    pub fn digest(&self) -> Digest {
        let mut f = Fingerprinter::new();
        self.fingerprint(&mut f);
        f.digest()
    }

    pub fn fingerprint(&self, f: &mut Fingerprinter) {
        match self {
            Problem::Dft(p) => {
                f.tag("dft");
                f.int(p.sign.as_int() as i64);
                plane_prints(f, p.inp, p.out);
                p.sz.fingerprint(f);
                p.vecsz.fingerprint(f);
            }
            Problem::Rdft(p) => {
                f.tag("rdft");
                f.word(p.kinds.len() as u64);
                for k in &p.kinds {
                    f.tag(k.name());
                }
                plane_prints(f, p.inp, p.out);
                p.sz.fingerprint(f);
                p.vecsz.fingerprint(f);
            }
            Problem::Rdft2(p) => {
                f.tag("rdft2");
                f.tag(p.kind.name());
                plane_prints(f, p.real, p.cplx);
                p.sz.fingerprint(f);
                p.vecsz.fingerprint(f);
            }
            Problem::Transpose(p) => {
                f.tag("transpose");
                plane_prints(f, p.inp, p.out);
                p.vecsz.fingerprint(f);
            }
            Problem::Unsolvable => f.tag("unsolvable"),
        }
    }

    /// Clear the input plane through the problem's own strides. Used to
    /// present a cold, well-defined input to the measurement loop.
    pub(crate) fn zero_input_raw<T: Float>(&self, io: Io<T>) {
        match self {
            Problem::Dft(p) => {
                let space = p.sz.append(&p.vecsz);
                zero_walk(&space, io.ri, true, io.ii);
            }
            Problem::Rdft(p) => {
                let space = p.sz.append(&p.vecsz);
                zero_walk(&space, io.ri, false, core::ptr::null_mut());
            }
            Problem::Rdft2(p) => {
                // measurement buffers are dense; clearing both planes keeps
                // either direction well-defined
                let space = p.sz.append(&p.vecsz);
                if p.kind.reads_real() {
                    zero_walk(&space, io.ri, false, core::ptr::null_mut());
                } else {
                    zero_walk(&space, io.ro, true, io.io);
                }
            }
            Problem::Transpose(p) => {
                zero_walk(&p.vecsz, io.ri, false, core::ptr::null_mut());
            }
            Problem::Unsolvable => {}
        }
    }
}

fn plane_prints(f: &mut Fingerprinter, a: BufSpec, b: BufSpec) {
    f.flag(a.same_storage(&b));
    f.flag(a.aligned);
    f.flag(b.aligned);
}

/// The canonical rank-3 transpose tensor: reads row-major `n0 × n1`,
/// writes row-major `n1 × n0`, innermost `vl` contiguous on both sides.
pub fn transpose_tensor(n0: usize, n1: usize, vl: usize) -> Tensor {
    let vl_i = vl as isize;
    let mut dims = alloc::vec![
        crate::tensor::Dim::new(n0, n1 as isize * vl_i, vl_i),
        crate::tensor::Dim::new(n1, vl_i, n0 as isize * vl_i),
    ];
    if vl != 1 {
        dims.push(crate::tensor::Dim::new(vl, 1, 1));
    }
    Tensor::new(dims)
}

/// Strided zero over the input side of `space`. Complex planes clear both
/// rails; strides are element strides, scaled for the rail layout by the
/// caller via `Io` construction.
fn zero_walk<T: Float>(space: &Tensor, base: *mut T, complex: bool, imag: *mut T) {
    if space.is_minus_infinity() {
        return;
    }
    let dims = space.dims();
    let total = space.sz();
    let scale: isize = if complex { 2 } else { 1 };
    let mut idx = alloc::vec![0usize; dims.len()];
    for _ in 0..total {
        let mut off = 0isize;
        for (d, &i) in dims.iter().zip(idx.iter()) {
            off += d.is * scale * i as isize;
        }
        unsafe {
            *base.offset(off) = T::zero();
            if complex {
                *imag.offset(off) = T::zero();
            }
        }
        // odometer
        for k in (0..dims.len()).rev() {
            idx[k] += 1;
            if idx[k] < dims[k].n {
                break;
            }
            idx[k] = 0;
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Dft(p) => write!(
                f,
                "(dft {} {} {} {})",
                p.sign.as_int(),
                placement(p.inp, p.out),
                p.sz,
                p.vecsz
            ),
            Problem::Rdft(p) => {
                write!(f, "(rdft (")?;
                for (i, k) in p.kinds.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", k.name())?;
                }
                write!(f, ") {} {} {})", placement(p.inp, p.out), p.sz, p.vecsz)
            }
            Problem::Rdft2(p) => write!(
                f,
                "(rdft2 {} {} {} {})",
                p.kind.name(),
                placement(p.real, p.cplx),
                p.sz,
                p.vecsz
            ),
            Problem::Transpose(p) => {
                write!(f, "(transpose {} {})", placement(p.inp, p.out), p.vecsz)
            }
            Problem::Unsolvable => write!(f, "(unsolvable)"),
        }
    }
}

fn placement(a: BufSpec, b: BufSpec) -> &'static str {
    match (a.same_storage(&b), a.aligned, b.aligned) {
        (true, true, true) => "ip/a",
        (true, _, _) => "ip/u",
        (false, true, true) => "op/aa",
        (false, true, false) => "op/au",
        (false, false, true) => "op/ua",
        (false, false, false) => "op/uu",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufToken;
    use crate::tensor::Dim;

    fn tok(i: u32) -> BufSpec {
        BufSpec::aligned(BufToken(i))
    }

    #[test]
    fn equal_tokens_join_in_place() {
        let p = Problem::dft_1d(8, Sign::Forward, tok(0), tok(0));
        assert!(p.in_place());
        match p {
            Problem::Dft(d) => assert_eq!(d.inp, d.out),
            _ => panic!("expected dft"),
        }
    }

    #[test]
    fn equivalent_layouts_share_digest() {
        // 8x4 row-major contiguous both sides == flat 32
        let a = Problem::dft(
            Tensor::new(alloc::vec![Dim::new(8, 4, 4), Dim::new(4, 1, 1)]),
            Tensor::rank0(),
            Sign::Forward,
            tok(0),
            tok(1),
        );
        let b = Problem::dft_1d(32, Sign::Forward, tok(5), tok(9));
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn sign_and_alignment_split_digests() {
        let fwd = Problem::dft_1d(16, Sign::Forward, tok(0), tok(1));
        let bwd = Problem::dft_1d(16, Sign::Backward, tok(0), tok(1));
        assert_ne!(fwd.digest(), bwd.digest());
        let unaligned = Problem::dft_1d(
            16,
            Sign::Forward,
            BufSpec::unaligned(BufToken(0)),
            tok(1),
        );
        assert_ne!(fwd.digest(), unaligned.digest());
    }

    #[test]
    fn impossible_in_place_strides_are_unsolvable() {
        // reads 16 distinct locations, writes only 8 of them
        let p = Problem::dft(
            Tensor::one_d(8, 2, 1),
            Tensor::rank0(),
            Sign::Forward,
            tok(0),
            tok(0),
        );
        assert_eq!(p, Problem::Unsolvable);
    }

    #[test]
    fn zero_stride_is_unsolvable() {
        let p = Problem::dft(
            Tensor::one_d(8, 0, 1),
            Tensor::rank0(),
            Sign::Forward,
            tok(0),
            tok(1),
        );
        assert_eq!(p, Problem::Unsolvable);
    }

    #[test]
    fn rdft_kinds_follow_their_dims_through_sorting() {
        let p = Problem::rdft(
            Tensor::new(alloc::vec![Dim::new(4, 8, 8), Dim::new(8, 1, 1)]),
            Tensor::rank0(),
            alloc::vec![R2rKind::Redft10, R2rKind::R2hc],
            tok(0),
            tok(1),
        );
        match p {
            Problem::Rdft(r) => {
                // dims sort by stride, kinds must ride along
                assert_eq!(r.sz.dims()[0].n, 8);
                assert_eq!(r.kinds[0], R2rKind::R2hc);
                assert_eq!(r.kinds[1], R2rKind::Redft10);
            }
            _ => panic!("expected rdft"),
        }
    }

    #[test]
    fn rdft_kind_count_must_match_rank() {
        let p = Problem::rdft(
            Tensor::one_d(8, 1, 1),
            Tensor::rank0(),
            alloc::vec![R2rKind::R2hc, R2rKind::Dht],
            tok(0),
            tok(1),
        );
        assert_eq!(p, Problem::Unsolvable);
    }

    #[test]
    fn transpose_requires_rank_2_or_3() {
        let p = Problem::transpose(Tensor::one_d(8, 1, 1), tok(0), tok(0));
        assert_eq!(p, Problem::Unsolvable);
        let good = Problem::transpose_in_place(3, 5, 1, tok(0));
        assert!(matches!(good, Problem::Transpose(_)));
    }

    #[test]
    fn print_forms_are_stable() {
        let p = Problem::dft_1d(4, Sign::Forward, tok(0), tok(1));
        let s = alloc::format!("{}", p);
        assert_eq!(s, "(dft -1 op/aa (t 1 (4 1 1)) (t 0))");
    }
}
