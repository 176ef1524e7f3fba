//! Executable plan trees.
//!
//! A [`Plan`] owns a tree of [`PlanNode`]s, one variant per solver family.
//! `apply` dispatches by `match` and calls children directly; there is no
//! table lookup at execute time. `awake` materializes twiddle tables through
//! the planner's shared registry and `print` emits the compact s-expression
//! used by the determinism tests and debugging output.
//!
//! Rail convention: complex planes are interleaved, imaginary rail one `T`
//! after the real rail; all node strides are in `T` units. For rdft2 nodes
//! the real plane rides the `ri` rail and the halfcomplex plane the `ro/io`
//! rails regardless of transform direction.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt::Write as _;

use crate::buffer::{DftData, Io, RealData, Rdft2Data};
use crate::flags::Flags;
use crate::kernels::{DftKernel, KernIo, R2rKernel, RealKernIo};
use crate::num::{Complex, Float};
use crate::ops::OpCounts;
use crate::problem::{Problem, ProblemKind, R2rKind, Rdft2Kind, Sign};
use crate::tensor::Dim;
use crate::twiddle::{TwiddleRegistry, TwiddleSlot, Wakefulness};

/// Compile-time cache-line estimate driving the tiled base cases, in bytes.
const CACHE_LINE: usize = 64;

fn tile_len<T>() -> usize {
    let t = CACHE_LINE / core::mem::size_of::<T>();
    if t < 4 {
        4
    } else {
        t
    }
}

/// Vector (batch) loop attached to a node, strides in `T` units.
#[derive(Clone, Copy, Debug)]
pub(crate) struct VecLoop {
    pub vl: usize,
    pub ivs: isize,
    pub ovs: isize,
}

impl VecLoop {
    pub(crate) fn single() -> Self {
        Self {
            vl: 1,
            ivs: 0,
            ovs: 0,
        }
    }
}

#[inline(always)]
unsafe fn ldc<T: Float>(io: &Io<T>, off: isize) -> Complex<T> {
    Complex::new(*io.ri.offset(off), *io.ii.offset(off))
}

#[inline(always)]
unsafe fn stc<T: Float>(io: &Io<T>, off: isize, v: Complex<T>) {
    *io.ro.offset(off) = v.re;
    *io.io.offset(off) = v.im;
}

/// In-place complex view over a contiguous scratch buffer.
fn scratch_io<T: Float>(s: &mut [Complex<T>]) -> Io<T> {
    let base = s.as_mut_ptr() as *mut T;
    Io {
        ri: base,
        ii: base.wrapping_add(1),
        ro: base,
        io: base.wrapping_add(1),
    }
}

pub(crate) struct DirectDftNode<T: Float> {
    pub name: &'static str,
    pub kernel: DftKernel<T>,
    pub n: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    pub sign: Sign,
}

pub(crate) struct DirectR2rNode<T: Float> {
    pub name: &'static str,
    pub kernel: R2rKernel<T>,
    pub n: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
}

pub(crate) struct GenericDftNode<T: Float> {
    pub n: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    pub tw: TwiddleSlot<T>,
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) struct CtNode<T: Float> {
    pub r: usize,
    pub m: usize,
    pub n: usize,
    pub os: isize,
    pub v: VecLoop,
    pub tw: TwiddleSlot<T>,
    /// Radix-`r` sub-transforms of size `m`, reading the caller's input and
    /// writing the contiguous scratch buffer.
    pub child: Box<PlanNode<T>>,
    /// `n` result slots plus `r` gather slots.
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) struct RaderNode<T: Float> {
    pub n: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    /// Forward size-`n-1` DFT, in place on the scratch buffer.
    pub child: Box<PlanNode<T>>,
    pub omega: TwiddleSlot<T>,
    /// `g^p mod n` for `p = 0..n-1`.
    pub in_perm: Vec<u32>,
    /// `g^{-q} mod n` for `q = 0..n-1`.
    pub out_perm: Vec<u32>,
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) struct BluesteinNode<T: Float> {
    pub n: usize,
    pub nb: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    /// Forward size-`nb` DFT, in place on the scratch buffer.
    pub child: Box<PlanNode<T>>,
    pub chirp: TwiddleSlot<T>,
    /// Forward DFT of the padded conjugate chirp, pre-scaled by `1/nb`.
    /// Built at awake by running `child`.
    pub fb: Option<Vec<Complex<T>>>,
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) struct BufferedNode<T: Float> {
    pub nbatch: usize,
    pub ivs: isize,
    pub ovs: isize,
    pub cpy_in: Box<PlanNode<T>>,
    pub inner: Box<PlanNode<T>>,
    pub cpy_out: Box<PlanNode<T>>,
    pub buf: RefCell<Vec<T>>,
}

pub(crate) struct VrankLoopNode<T: Float> {
    pub v: VecLoop,
    pub inner: Box<PlanNode<T>>,
}

/// `first` runs input to output, `second` runs in place on the output.
pub(crate) struct SeqNode<T: Float> {
    pub first: Box<PlanNode<T>>,
    pub second: Box<PlanNode<T>>,
}

pub(crate) struct Rdft2SplitNode<T: Float> {
    /// Complex transform over the leading dimensions, in place on the
    /// halfcomplex plane. Runs first for hc2r, last for r2hc.
    pub cplx: Box<PlanNode<T>>,
    pub rdft2: Box<PlanNode<T>>,
    pub cplx_first: bool,
}

pub(crate) enum CopyNode<T: Float> {
    Memcpy {
        len: usize,
    },
    Loop {
        dims: Vec<Dim>,
    },
    Tiled {
        d0: Dim,
        d1: Dim,
    },
    TiledBuf {
        d0: Dim,
        d1: Dim,
        buf: RefCell<Vec<T>>,
    },
}

pub(crate) struct TransposeSquareNode {
    pub n: usize,
    pub vl: usize,
    pub rs: isize,
    pub cs: isize,
}

/// In-place transpose of an `(n*d) x (m*d)` row-major matrix via block
/// swaps plus one buffered block-row rewrite; buffer holds `n*m*d` tuples.
pub(crate) struct TransposeGcdNode<T: Float> {
    pub n: usize,
    pub m: usize,
    pub d: usize,
    pub vl: usize,
    pub buf: RefCell<Vec<T>>,
}

/// In-place transpose of an `r x c` row-major matrix: square part in place,
/// leftover strip bounced through a buffer of `|r-c| * min(r,c)` tuples.
pub(crate) struct TransposeCutNode<T: Float> {
    pub r: usize,
    pub c: usize,
    pub vl: usize,
    pub buf: RefCell<Vec<T>>,
}

pub(crate) struct GenericR2rNode<T: Float> {
    pub kind: R2rKind,
    pub n: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    pub scratch: RefCell<Vec<T>>,
}

pub(crate) struct DhtViaR2hcNode<T: Float> {
    pub n: usize,
    pub os: isize,
    pub v: VecLoop,
    pub child: Box<PlanNode<T>>,
}

pub(crate) struct R2rViaDftNode<T: Float> {
    pub kind: R2rKind,
    pub n: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    /// Size-`n` complex DFT in place on scratch; forward for r2hc,
    /// backward for hc2r.
    pub child: Box<PlanNode<T>>,
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) struct Rdft2EvenNode<T: Float> {
    pub kind: Rdft2Kind,
    pub n: usize,
    pub h: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    /// Size-`n/2` complex DFT in place on scratch; forward for r2hc,
    /// backward for hc2r.
    pub child: Box<PlanNode<T>>,
    /// Forward roots of unity of order `n`, used as pack twiddles.
    pub tw: TwiddleSlot<T>,
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) struct Rdft2GenericNode<T: Float> {
    pub kind: Rdft2Kind,
    pub n: usize,
    pub h: usize,
    pub is: isize,
    pub os: isize,
    pub v: VecLoop,
    pub scratch: RefCell<Vec<Complex<T>>>,
}

pub(crate) enum PlanNode<T: Float> {
    Nop,
    DirectDft(DirectDftNode<T>),
    DirectR2r(DirectR2rNode<T>),
    GenericDft(GenericDftNode<T>),
    Ct(CtNode<T>),
    Rader(RaderNode<T>),
    Bluestein(BluesteinNode<T>),
    Buffered(BufferedNode<T>),
    VrankLoop(VrankLoopNode<T>),
    RankSplit(SeqNode<T>),
    IndirectBefore(SeqNode<T>),
    IndirectAfter(SeqNode<T>),
    Rdft2Split(Rdft2SplitNode<T>),
    Copy(CopyNode<T>),
    TransposeSquare(TransposeSquareNode),
    TransposeGcd(TransposeGcdNode<T>),
    TransposeCut(TransposeCutNode<T>),
    GenericR2r(GenericR2rNode<T>),
    DhtViaR2hc(DhtViaR2hcNode<T>),
    R2rViaDft(R2rViaDftNode<T>),
    Rdft2Even(Rdft2EvenNode<T>),
    Rdft2Generic(Rdft2GenericNode<T>),
}

impl<T: Float> PlanNode<T> {
    /// Run the node. Callers guarantee that every offset reachable through
    /// the baked strides stays inside the allocations behind `io`.
    pub(crate) unsafe fn apply(&self, io: Io<T>) {
        match self {
            PlanNode::Nop => {}
            PlanNode::DirectDft(n) => n.apply(io),
            PlanNode::DirectR2r(n) => n.apply(io),
            PlanNode::GenericDft(n) => n.apply(io),
            PlanNode::Ct(n) => n.apply(io),
            PlanNode::Rader(n) => n.apply(io),
            PlanNode::Bluestein(n) => n.apply(io),
            PlanNode::Buffered(n) => n.apply(io),
            PlanNode::VrankLoop(n) => {
                let mut io_v = io;
                for _ in 0..n.v.vl {
                    n.inner.apply(io_v);
                    io_v = io_v.shift(n.v.ivs, n.v.ovs);
                }
            }
            PlanNode::RankSplit(n) | PlanNode::IndirectBefore(n) => {
                n.first.apply(io);
                n.second.apply(Io {
                    ri: io.ro,
                    ii: io.io,
                    ro: io.ro,
                    io: io.io,
                });
            }
            PlanNode::IndirectAfter(n) => {
                n.first.apply(Io {
                    ri: io.ri,
                    ii: io.ii,
                    ro: io.ri,
                    io: io.ii,
                });
                n.second.apply(io);
            }
            PlanNode::Rdft2Split(n) => {
                let cio = Io {
                    ri: io.ro,
                    ii: io.io,
                    ro: io.ro,
                    io: io.io,
                };
                if n.cplx_first {
                    n.cplx.apply(cio);
                    n.rdft2.apply(io);
                } else {
                    n.rdft2.apply(io);
                    n.cplx.apply(cio);
                }
            }
            PlanNode::Copy(n) => n.apply(io),
            PlanNode::TransposeSquare(n) => {
                square_transpose(io.ri, n.n, n.rs, n.cs, n.vl);
            }
            PlanNode::TransposeGcd(n) => n.apply(io),
            PlanNode::TransposeCut(n) => n.apply(io),
            PlanNode::GenericR2r(n) => n.apply(io),
            PlanNode::DhtViaR2hc(n) => n.apply(io),
            PlanNode::R2rViaDft(n) => n.apply(io),
            PlanNode::Rdft2Even(n) => n.apply(io),
            PlanNode::Rdft2Generic(n) => n.apply(io),
        }
    }

    pub(crate) fn awake(&mut self, w: Wakefulness, reg: &mut TwiddleRegistry<T>) {
        let acc = w.accuracy();
        let sleepy = w == Wakefulness::Sleepy;
        match self {
            PlanNode::Nop
            | PlanNode::DirectDft(_)
            | PlanNode::DirectR2r(_)
            | PlanNode::Copy(_)
            | PlanNode::TransposeSquare(_)
            | PlanNode::TransposeGcd(_)
            | PlanNode::TransposeCut(_)
            | PlanNode::GenericR2r(_)
            | PlanNode::Rdft2Generic(_) => {}
            PlanNode::GenericDft(n) => {
                if sleepy {
                    n.tw.sleep();
                } else {
                    n.tw.wake(reg, acc);
                }
            }
            PlanNode::Ct(n) => {
                n.child.awake(w, reg);
                if sleepy {
                    n.tw.sleep();
                } else {
                    n.tw.wake(reg, acc);
                }
            }
            PlanNode::Rader(n) => {
                n.child.awake(w, reg);
                if sleepy {
                    n.omega.sleep();
                } else {
                    n.omega.wake(reg, acc);
                }
            }
            PlanNode::Bluestein(n) => {
                n.child.awake(w, reg);
                if sleepy {
                    n.chirp.sleep();
                    n.fb = None;
                } else {
                    n.chirp.wake(reg, acc);
                    n.build_fb();
                }
            }
            PlanNode::Buffered(n) => {
                n.cpy_in.awake(w, reg);
                n.inner.awake(w, reg);
                n.cpy_out.awake(w, reg);
            }
            PlanNode::VrankLoop(n) => n.inner.awake(w, reg),
            PlanNode::RankSplit(n) | PlanNode::IndirectBefore(n) | PlanNode::IndirectAfter(n) => {
                n.first.awake(w, reg);
                n.second.awake(w, reg);
            }
            PlanNode::Rdft2Split(n) => {
                n.cplx.awake(w, reg);
                n.rdft2.awake(w, reg);
            }
            PlanNode::DhtViaR2hc(n) => n.child.awake(w, reg),
            PlanNode::R2rViaDft(n) => n.child.awake(w, reg),
            PlanNode::Rdft2Even(n) => {
                n.child.awake(w, reg);
                if sleepy {
                    n.tw.sleep();
                } else {
                    n.tw.wake(reg, acc);
                }
            }
        }
    }

    pub(crate) fn print_into(&self, out: &mut String) {
        match self {
            PlanNode::Nop => out.push_str("(nop)"),
            PlanNode::DirectDft(n) => {
                let _ = write!(out, "(dft-direct-{} {})", n.n, n.name);
            }
            PlanNode::DirectR2r(n) => {
                let _ = write!(out, "(rdft-direct-{} {})", n.n, n.name);
            }
            PlanNode::GenericDft(n) => {
                let _ = write!(out, "(dft-generic-{})", n.n);
            }
            PlanNode::Ct(n) => {
                let _ = write!(out, "(dft-ct-{}/{} ", n.r, n.m);
                n.child.print_into(out);
                out.push(')');
            }
            PlanNode::Rader(n) => {
                let _ = write!(out, "(dft-rader-{} ", n.n);
                n.child.print_into(out);
                out.push(')');
            }
            PlanNode::Bluestein(n) => {
                let _ = write!(out, "(dft-bluestein-{}/{} ", n.n, n.nb);
                n.child.print_into(out);
                out.push(')');
            }
            PlanNode::Buffered(n) => {
                let _ = write!(out, "(buffered-{} ", n.nbatch);
                n.cpy_in.print_into(out);
                out.push(' ');
                n.inner.print_into(out);
                out.push(' ');
                n.cpy_out.print_into(out);
                out.push(')');
            }
            PlanNode::VrankLoop(n) => {
                let _ = write!(out, "(vrank-{} ", n.v.vl);
                n.inner.print_into(out);
                out.push(')');
            }
            PlanNode::RankSplit(n) => {
                out.push_str("(rank-split ");
                n.first.print_into(out);
                out.push(' ');
                n.second.print_into(out);
                out.push(')');
            }
            PlanNode::IndirectBefore(n) => {
                out.push_str("(indirect-before ");
                n.first.print_into(out);
                out.push(' ');
                n.second.print_into(out);
                out.push(')');
            }
            PlanNode::IndirectAfter(n) => {
                out.push_str("(indirect-after ");
                n.first.print_into(out);
                out.push(' ');
                n.second.print_into(out);
                out.push(')');
            }
            PlanNode::Rdft2Split(n) => {
                out.push_str("(rdft2-split ");
                n.rdft2.print_into(out);
                out.push(' ');
                n.cplx.print_into(out);
                out.push(')');
            }
            PlanNode::Copy(c) => match c {
                CopyNode::Memcpy { len } => {
                    let _ = write!(out, "(copy-memcpy-{})", len);
                }
                CopyNode::Loop { dims } => {
                    let _ = write!(out, "(copy-loop-{})", dims.len());
                }
                CopyNode::Tiled { d0, d1 } => {
                    let _ = write!(out, "(copy-tiled-{}x{})", d0.n, d1.n);
                }
                CopyNode::TiledBuf { d0, d1, .. } => {
                    let _ = write!(out, "(copy-tiledbuf-{}x{})", d0.n, d1.n);
                }
            },
            PlanNode::TransposeSquare(n) => {
                let _ = write!(out, "(transpose-square-{})", n.n);
            }
            PlanNode::TransposeGcd(n) => {
                let _ = write!(out, "(transpose-gcd-{}x{}/{})", n.n * n.d, n.m * n.d, n.d);
            }
            PlanNode::TransposeCut(n) => {
                let _ = write!(out, "(transpose-cut-{}x{})", n.r, n.c);
            }
            PlanNode::GenericR2r(n) => {
                let _ = write!(out, "(rdft-generic-{}-{})", n.kind.name(), n.n);
            }
            PlanNode::DhtViaR2hc(n) => {
                let _ = write!(out, "(rdft-dht-r2hc-{} ", n.n);
                n.child.print_into(out);
                out.push(')');
            }
            PlanNode::R2rViaDft(n) => {
                let _ = write!(out, "(rdft-{}-dft-{} ", n.kind.name(), n.n);
                n.child.print_into(out);
                out.push(')');
            }
            PlanNode::Rdft2Even(n) => {
                let _ = write!(out, "(rdft2-{}-even-{} ", n.kind.name(), n.n);
                n.child.print_into(out);
                out.push(')');
            }
            PlanNode::Rdft2Generic(n) => {
                let _ = write!(out, "(rdft2-{}-generic-{})", n.kind.name(), n.n);
            }
        }
    }
}

impl<T: Float> DirectDftNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        // swapping the rails on both planes computes the opposite-sign
        // transform, so one forward kernel serves both directions
        let io = match self.sign {
            Sign::Forward => io,
            Sign::Backward => io.swap_rails(),
        };
        (self.kernel)(KernIo {
            ri: io.ri,
            ii: io.ii,
            ro: io.ro,
            io: io.io,
            is: self.is,
            os: self.os,
            vl: self.v.vl,
            ivs: self.v.ivs,
            ovs: self.v.ovs,
        });
    }
}

impl<T: Float> DirectR2rNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        (self.kernel)(RealKernIo {
            ri: io.ri,
            ro: io.ro,
            is: self.is,
            os: self.os,
            vl: self.v.vl,
            ivs: self.v.ivs,
            ovs: self.v.ovs,
        });
    }
}

impl<T: Float> GenericDftNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let tw = self.tw.table();
        let n = self.n;
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        for _ in 0..self.v.vl {
            for (j, slot) in s.iter_mut().enumerate() {
                *slot = ldc(&io_v, j as isize * self.is);
            }
            for k in 0..n {
                let mut acc = Complex::zero();
                for j in 0..n {
                    acc = acc.add(s[j].mul(tw[j * k % n]));
                }
                stc(&io_v, k as isize * self.os, acc);
            }
            io_v = io_v.shift(self.v.ivs, self.v.ovs);
        }
    }
}

impl<T: Float> CtNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let tw = self.tw.table();
        let (r, m, n) = (self.r, self.m, self.n);
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        for _ in 0..self.v.vl {
            {
                let cio = scratch_io(&mut s[..n]);
                self.child.apply(Io {
                    ri: io_v.ri,
                    ii: io_v.ii,
                    ro: cio.ro,
                    io: cio.io,
                });
            }
            let (y, z) = s.split_at_mut(n);
            for k0 in 0..m {
                for b in 0..r {
                    z[b] = y[b * m + k0].mul(tw[b * k0 % n]);
                }
                for c in 0..r {
                    let mut acc = Complex::zero();
                    for (b, zb) in z.iter().enumerate() {
                        acc = acc.add(zb.mul(tw[b * c * m % n]));
                    }
                    stc(&io_v, ((c * m + k0) as isize) * self.os, acc);
                }
            }
            io_v = io_v.shift(self.v.ivs, self.v.ovs);
        }
    }
}

impl<T: Float> RaderNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let om = self.omega.table();
        let nm1 = self.n - 1;
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        for _ in 0..self.v.vl {
            let x0 = ldc(&io_v, 0);
            let mut total = x0;
            for p in 0..nm1 {
                let xp = ldc(&io_v, self.in_perm[p] as isize * self.is);
                s[p] = xp;
                total = total.add(xp);
            }
            self.child.apply(scratch_io(&mut s));
            for (slot, w) in s.iter_mut().zip(om.iter()) {
                *slot = slot.mul(*w);
            }
            // unscaled inverse via swapped rails; 1/(n-1) lives in omega
            self.child.apply(scratch_io(&mut s).swap_rails());
            stc(&io_v, 0, total);
            for q in 0..nm1 {
                stc(&io_v, self.out_perm[q] as isize * self.os, x0.add(s[q]));
            }
            io_v = io_v.shift(self.v.ivs, self.v.ovs);
        }
    }
}

impl<T: Float> BluesteinNode<T> {
    /// DFT of the padded conjugate chirp, scaled by `1/nb`. Runs the child
    /// plan, which must already be awake.
    fn build_fb(&mut self) {
        let ch = self.chirp.table();
        let nb = self.nb;
        let mut b = alloc::vec![Complex::<T>::zero(); nb];
        b[0] = ch[0].conj();
        for j in 1..self.n {
            let v = ch[j].conj();
            b[j] = v;
            b[nb - j] = v;
        }
        unsafe { self.child.apply(scratch_io(&mut b)) };
        let scale = T::from_f64(1.0 / nb as f64);
        for slot in b.iter_mut() {
            *slot = slot.scale(scale);
        }
        self.fb = Some(b);
    }

    unsafe fn apply(&self, io: Io<T>) {
        let ch = self.chirp.table();
        let fb = self.fb.as_ref().unwrap();
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        for _ in 0..self.v.vl {
            for slot in s.iter_mut() {
                *slot = Complex::zero();
            }
            for j in 0..self.n {
                s[j] = ldc(&io_v, j as isize * self.is).mul(ch[j]);
            }
            self.child.apply(scratch_io(&mut s));
            for (slot, f) in s.iter_mut().zip(fb.iter()) {
                *slot = slot.mul(*f);
            }
            self.child.apply(scratch_io(&mut s).swap_rails());
            for k in 0..self.n {
                stc(&io_v, k as isize * self.os, s[k].mul(ch[k]));
            }
            io_v = io_v.shift(self.v.ivs, self.v.ovs);
        }
    }
}

impl<T: Float> BufferedNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let mut buf = self.buf.borrow_mut();
        let b = buf.as_mut_ptr();
        let bio = Io {
            ri: b,
            ii: b.wrapping_add(1),
            ro: b,
            io: b.wrapping_add(1),
        };
        let mut io_v = io;
        for _ in 0..self.nbatch {
            self.cpy_in.apply(Io {
                ri: io_v.ri,
                ii: io_v.ii,
                ro: bio.ro,
                io: bio.io,
            });
            self.inner.apply(bio);
            self.cpy_out.apply(Io {
                ri: bio.ri,
                ii: bio.ii,
                ro: io_v.ro,
                io: io_v.io,
            });
            io_v = io_v.shift(self.ivs, self.ovs);
        }
    }
}

impl<T: Float> CopyNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        match self {
            CopyNode::Memcpy { len } => {
                core::ptr::copy_nonoverlapping(io.ri as *const T, io.ro, *len);
            }
            CopyNode::Loop { dims } => {
                copy_walk(io.ri, io.ro, dims);
            }
            CopyNode::Tiled { d0, d1 } => {
                let tile = tile_len::<T>();
                let mut i0 = 0;
                while i0 < d0.n {
                    let b0 = core::cmp::min(tile, d0.n - i0);
                    let mut i1 = 0;
                    while i1 < d1.n {
                        let b1 = core::cmp::min(tile, d1.n - i1);
                        for a in 0..b0 {
                            let r = (i0 + a) as isize;
                            for bcol in 0..b1 {
                                let c = (i1 + bcol) as isize;
                                *io.ro.offset(r * d0.os + c * d1.os) =
                                    *io.ri.offset(r * d0.is + c * d1.is);
                            }
                        }
                        i1 += b1;
                    }
                    i0 += b0;
                }
            }
            CopyNode::TiledBuf { d0, d1, buf } => {
                let tile = tile_len::<T>();
                let mut stage = buf.borrow_mut();
                let mut i0 = 0;
                while i0 < d0.n {
                    let b0 = core::cmp::min(tile, d0.n - i0);
                    let mut i1 = 0;
                    while i1 < d1.n {
                        let b1 = core::cmp::min(tile, d1.n - i1);
                        for a in 0..b0 {
                            let r = (i0 + a) as isize;
                            for bcol in 0..b1 {
                                let c = (i1 + bcol) as isize;
                                stage[a * tile + bcol] = *io.ri.offset(r * d0.is + c * d1.is);
                            }
                        }
                        for a in 0..b0 {
                            let r = (i0 + a) as isize;
                            for bcol in 0..b1 {
                                let c = (i1 + bcol) as isize;
                                *io.ro.offset(r * d0.os + c * d1.os) = stage[a * tile + bcol];
                            }
                        }
                        i1 += b1;
                    }
                    i0 += b0;
                }
            }
        }
    }
}

/// Odometer copy over arbitrary-rank strided dims.
unsafe fn copy_walk<T: Float>(src: *const T, dst: *mut T, dims: &[Dim]) {
    if dims.is_empty() {
        *dst = *src;
        return;
    }
    let total: usize = dims.iter().map(|d| d.n).product();
    let mut idx = alloc::vec![0usize; dims.len()];
    for _ in 0..total {
        let mut off_i = 0isize;
        let mut off_o = 0isize;
        for (d, &i) in dims.iter().zip(idx.iter()) {
            off_i += d.is * i as isize;
            off_o += d.os * i as isize;
        }
        *dst.offset(off_o) = *src.offset(off_i);
        for k in (0..dims.len()).rev() {
            idx[k] += 1;
            if idx[k] < dims[k].n {
                break;
            }
            idx[k] = 0;
        }
    }
}

/// Cache-oblivious in-place square transpose: recursive split down to a
/// tile-sized base case, touching only the upper triangle.
pub(crate) unsafe fn square_transpose<T: Float>(
    p: *mut T,
    n: usize,
    rs: isize,
    cs: isize,
    vl: usize,
) {
    square_rec(p, 0, n, 0, n, rs, cs, vl);
}

#[allow(clippy::too_many_arguments)]
unsafe fn square_rec<T: Float>(
    p: *mut T,
    r0: usize,
    r1: usize,
    c0: usize,
    c1: usize,
    rs: isize,
    cs: isize,
    vl: usize,
) {
    // no (i, j) with j > i inside this block
    if c1 <= r0 + 1 {
        return;
    }
    let tile = tile_len::<T>();
    if r1 - r0 <= tile && c1 - c0 <= tile {
        for i in r0..r1 {
            let jlo = core::cmp::max(c0, i + 1);
            for j in jlo..c1 {
                let a = p.offset(i as isize * rs + j as isize * cs);
                let b = p.offset(j as isize * rs + i as isize * cs);
                for t in 0..vl as isize {
                    core::ptr::swap(a.offset(t), b.offset(t));
                }
            }
        }
        return;
    }
    if r1 - r0 >= c1 - c0 {
        let rm = (r0 + r1) / 2;
        square_rec(p, r0, rm, c0, c1, rs, cs, vl);
        square_rec(p, rm, r1, c0, c1, rs, cs, vl);
    } else {
        let cm = (c0 + c1) / 2;
        square_rec(p, r0, r1, c0, cm, rs, cs, vl);
        square_rec(p, r0, r1, cm, c1, rs, cs, vl);
    }
}

impl<T: Float> TransposeGcdNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let (n, m, d, vl) = (self.n, self.m, self.d, self.vl);
        let p = io.ri;
        let cols = m * d;
        let vli = vl as isize;
        // step 1: swap the d x d grid of n x m blocks across the diagonal
        for i in 0..d {
            for j in i + 1..d {
                for r in 0..n {
                    for c in 0..m {
                        let a = p.offset((((i * n + r) * cols + j * m + c) * vl) as isize);
                        let b = p.offset((((j * n + r) * cols + i * m + c) * vl) as isize);
                        for t in 0..vli {
                            core::ptr::swap(a.offset(t), b.offset(t));
                        }
                    }
                }
            }
        }
        // step 2: each block-row occupies the same memory span before and
        // after the transpose, so rewrite one at a time through the buffer
        let mut buf = self.buf.borrow_mut();
        let span = n * m * d * vl;
        for i in 0..d {
            let base = p.add(i * span);
            core::ptr::copy_nonoverlapping(base as *const T, buf.as_mut_ptr(), span);
            for s in 0..m {
                for j in 0..d {
                    for r in 0..n {
                        let dst = base.add(((s * n * d) + j * n + r) * vl);
                        let src = buf.as_ptr().add((r * cols + j * m + s) * vl);
                        core::ptr::copy_nonoverlapping(src, dst, vl);
                    }
                }
            }
        }
    }
}

impl<T: Float> TransposeCutNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let (r, c, vl) = (self.r, self.c, self.vl);
        let p = io.ri;
        let mut buf = self.buf.borrow_mut();
        if c > r {
            // wide: stash the right strip, compact the square, transpose it,
            // then lay the transposed strip below it
            let w = c - r;
            for row in 0..r {
                core::ptr::copy_nonoverlapping(
                    p.add((row * c + r) * vl) as *const T,
                    buf.as_mut_ptr().add(row * w * vl),
                    w * vl,
                );
            }
            for row in 1..r {
                core::ptr::copy(p.add(row * c * vl) as *const T, p.add(row * r * vl), r * vl);
            }
            square_transpose(p, r, (r * vl) as isize, vl as isize, vl);
            for col in r..c {
                for row in 0..r {
                    core::ptr::copy_nonoverlapping(
                        buf.as_ptr().add((row * w + (col - r)) * vl),
                        p.add((col * r + row) * vl),
                        vl,
                    );
                }
            }
        } else {
            // tall: stash the bottom strip (a contiguous tail), transpose
            // the square, then widen each row and append the strip
            let w = r - c;
            core::ptr::copy_nonoverlapping(
                p.add(c * c * vl) as *const T,
                buf.as_mut_ptr(),
                w * c * vl,
            );
            square_transpose(p, c, (c * vl) as isize, vl as isize, vl);
            for col in (0..c).rev() {
                core::ptr::copy(p.add(col * c * vl) as *const T, p.add(col * r * vl), c * vl);
                for k in 0..w {
                    core::ptr::copy_nonoverlapping(
                        buf.as_ptr().add((k * c + col) * vl),
                        p.add((col * r + c + k) * vl),
                        vl,
                    );
                }
            }
        }
    }
}

impl<T: Float> GenericR2rNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let n = self.n;
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        for _ in 0..self.v.vl {
            for (j, slot) in s.iter_mut().enumerate() {
                *slot = *io_v.ri.offset(j as isize * self.is);
            }
            for k in 0..n {
                let out = r2r_point(self.kind, &s, n, k);
                *io_v.ro.offset(k as isize * self.os) = out;
            }
            io_v = io_v.shift(self.v.ivs, self.v.ovs);
        }
    }
}

/// One output point of the naive r2r transforms, FFTW kind definitions.
fn r2r_point<T: Float>(kind: R2rKind, x: &[T], n: usize, k: usize) -> T {
    let pi = core::f64::consts::PI;
    let cosw = |num: f64, den: f64| T::from_f64(<f64 as Float>::cos(pi * num / den));
    let sinw = |num: f64, den: f64| T::from_f64(<f64 as Float>::sin(pi * num / den));
    let two = T::from_f64(2.0);
    match kind {
        R2rKind::R2hc => {
            // out[k] = Re X[k] for k <= n/2, out[n-k] = Im X[k] otherwise
            if k <= n / 2 {
                let mut acc = T::zero();
                for (j, &xj) in x.iter().enumerate() {
                    acc = acc + xj * cosw((2 * (j * k % n)) as f64, n as f64);
                }
                acc
            } else {
                let kk = n - k;
                let mut acc = T::zero();
                for (j, &xj) in x.iter().enumerate() {
                    acc = acc - xj * sinw((2 * (j * kk % n)) as f64, n as f64);
                }
                acc
            }
        }
        R2rKind::Hc2r => {
            let mut acc = x[0];
            for f in 1..=n / 2 {
                let c = cosw((2 * (f * k % n)) as f64, n as f64);
                if 2 * f == n {
                    acc = acc + x[f] * c;
                } else {
                    let sn = sinw((2 * (f * k % n)) as f64, n as f64);
                    acc = acc + two * (x[f] * c - x[n - f] * sn);
                }
            }
            acc
        }
        R2rKind::Dht => {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                let a = (2 * (j * k % n)) as f64;
                acc = acc + xj * (cosw(a, n as f64) + sinw(a, n as f64));
            }
            acc
        }
        R2rKind::Redft00 => {
            let mut acc = x[0];
            if k % 2 == 0 {
                acc = acc + x[n - 1];
            } else {
                acc = acc - x[n - 1];
            }
            for (j, &xj) in x.iter().enumerate().take(n - 1).skip(1) {
                acc = acc + two * xj * cosw((j * k) as f64, (n - 1) as f64);
            }
            acc
        }
        R2rKind::Redft10 => {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                acc = acc + two * xj * cosw(((2 * j + 1) * k) as f64, (2 * n) as f64);
            }
            acc
        }
        R2rKind::Redft01 => {
            let mut acc = x[0];
            for (j, &xj) in x.iter().enumerate().skip(1) {
                acc = acc + two * xj * cosw((j * (2 * k + 1)) as f64, (2 * n) as f64);
            }
            acc
        }
        R2rKind::Redft11 => {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                acc = acc + two * xj * cosw(((2 * j + 1) * (2 * k + 1)) as f64, (4 * n) as f64);
            }
            acc
        }
        R2rKind::Rodft00 => {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                acc = acc + two * xj * sinw(((j + 1) * (k + 1)) as f64, (n + 1) as f64);
            }
            acc
        }
        R2rKind::Rodft10 => {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                acc = acc + two * xj * sinw(((2 * j + 1) * (k + 1)) as f64, (2 * n) as f64);
            }
            acc
        }
        R2rKind::Rodft01 => {
            let mut acc = if k % 2 == 0 { x[n - 1] } else { -x[n - 1] };
            for (j, &xj) in x.iter().enumerate().take(n - 1) {
                acc = acc + two * xj * sinw(((j + 1) * (2 * k + 1)) as f64, (2 * n) as f64);
            }
            acc
        }
        R2rKind::Rodft11 => {
            let mut acc = T::zero();
            for (j, &xj) in x.iter().enumerate() {
                acc = acc + two * xj * sinw(((2 * j + 1) * (2 * k + 1)) as f64, (4 * n) as f64);
            }
            acc
        }
    }
}

impl<T: Float> DhtViaR2hcNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        self.child.apply(io);
        // H[k] = Re - Im, H[n-k] = Re + Im of the halfcomplex output
        let mut io_v = io;
        for _ in 0..self.v.vl {
            for k in 1..=(self.n - 1) / 2 {
                let a = *io_v.ro.offset(k as isize * self.os);
                let b = *io_v.ro.offset((self.n - k) as isize * self.os);
                *io_v.ro.offset(k as isize * self.os) = a - b;
                *io_v.ro.offset((self.n - k) as isize * self.os) = a + b;
            }
            io_v = io_v.shift(0, self.v.ovs);
        }
    }
}

impl<T: Float> R2rViaDftNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let n = self.n;
        let h = n / 2;
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        for _ in 0..self.v.vl {
            match self.kind {
                R2rKind::R2hc => {
                    for (j, slot) in s.iter_mut().enumerate() {
                        *slot = Complex::new(*io_v.ri.offset(j as isize * self.is), T::zero());
                    }
                    self.child.apply(scratch_io(&mut s));
                    *io_v.ro = s[0].re;
                    for k in 1..=h {
                        *io_v.ro.offset(k as isize * self.os) = s[k].re;
                        if 2 * k != n {
                            *io_v.ro.offset((n - k) as isize * self.os) = s[k].im;
                        }
                    }
                }
                _ => {
                    // hc2r: rebuild the conjugate-symmetric spectrum, run the
                    // unscaled backward transform, keep the real rail
                    s[0] = Complex::new(*io_v.ri, T::zero());
                    for k in 1..=(n - 1) / 2 {
                        let re = *io_v.ri.offset(k as isize * self.is);
                        let im = *io_v.ri.offset((n - k) as isize * self.is);
                        s[k] = Complex::new(re, im);
                        s[n - k] = Complex::new(re, -im);
                    }
                    if n % 2 == 0 {
                        s[h] = Complex::new(*io_v.ri.offset(h as isize * self.is), T::zero());
                    }
                    self.child.apply(scratch_io(&mut s));
                    for j in 0..n {
                        *io_v.ro.offset(j as isize * self.os) = s[j].re;
                    }
                }
            }
            io_v = io_v.shift(self.v.ivs, self.v.ovs);
        }
    }
}

impl<T: Float> Rdft2EvenNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let h = self.h;
        let tw = self.tw.table();
        let half = T::from_f64(0.5);
        let mut io_v = io;
        let mut s = self.scratch.borrow_mut();
        let cplx = Io {
            ri: io.ro,
            ii: io.io,
            ro: io.ro,
            io: io.io,
        };
        let mut cplx_v = cplx;
        for _ in 0..self.v.vl {
            match self.kind {
                Rdft2Kind::R2hc => {
                    for (j, slot) in s.iter_mut().enumerate() {
                        *slot = Complex::new(
                            *io_v.ri.offset((2 * j) as isize * self.is),
                            *io_v.ri.offset((2 * j + 1) as isize * self.is),
                        );
                    }
                    self.child.apply(scratch_io(&mut s));
                    for k in 0..=h {
                        let zk = s[k % h];
                        let zhk = s[(h - k) % h];
                        let e = zk.add(zhk.conj()).scale(half);
                        let d = zk.sub(zhk.conj()).scale(half);
                        let o = Complex::new(d.im, -d.re);
                        let x = e.add(tw[k % self.n].mul(o));
                        stc(&cplx_v, k as isize * self.os, x);
                    }
                }
                _ => {
                    // hc2r: unpack the spectrum into the half-length
                    // transform, then deinterleave; output is n * x
                    for k in 0..h {
                        let xk = ldc(&cplx_v, k as isize * self.os);
                        let xhk = ldc(&cplx_v, (h - k) as isize * self.os);
                        let e2 = xk.add(xhk.conj());
                        let d2 = xk.sub(xhk.conj());
                        let u = d2.mul(tw[k % self.n].conj());
                        s[k] = e2.add(Complex::new(-u.im, u.re));
                    }
                    self.child.apply(scratch_io(&mut s));
                    for (j, slot) in s.iter().enumerate() {
                        *io_v.ri.offset((2 * j) as isize * self.is) = slot.re;
                        *io_v.ri.offset((2 * j + 1) as isize * self.is) = slot.im;
                    }
                }
            }
            io_v = io_v.shift(self.v.ivs, self.v.ivs);
            cplx_v = cplx_v.shift(self.v.ovs, self.v.ovs);
        }
    }
}

impl<T: Float> Rdft2GenericNode<T> {
    unsafe fn apply(&self, io: Io<T>) {
        let (n, h) = (self.n, self.h);
        let pi = core::f64::consts::PI;
        let mut io_v = io;
        let cplx = Io {
            ri: io.ro,
            ii: io.io,
            ro: io.ro,
            io: io.io,
        };
        let mut cplx_v = cplx;
        let mut s = self.scratch.borrow_mut();
        let two = T::from_f64(2.0);
        for _ in 0..self.v.vl {
            match self.kind {
                Rdft2Kind::R2hc | Rdft2Kind::R2hcII => {
                    let shifted = self.kind == Rdft2Kind::R2hcII;
                    for (j, slot) in s.iter_mut().enumerate().take(n) {
                        slot.re = *io_v.ri.offset(j as isize * self.is);
                    }
                    for k in 0..=h {
                        let mut re = T::zero();
                        let mut im = T::zero();
                        for j in 0..n {
                            let theta = if shifted {
                                -pi * (k * (2 * j + 1)) as f64 / n as f64
                            } else {
                                -2.0 * pi * ((k * j) % n) as f64 / n as f64
                            };
                            let (sn, cs) = <f64 as Float>::sin_cos(theta);
                            re = re + s[j].re * T::from_f64(cs);
                            im = im + s[j].re * T::from_f64(sn);
                        }
                        stc(&cplx_v, k as isize * self.os, Complex::new(re, im));
                    }
                }
                Rdft2Kind::Hc2r | Rdft2Kind::Hc2rIII => {
                    let shifted = self.kind == Rdft2Kind::Hc2rIII;
                    for (k, slot) in s.iter_mut().enumerate().take(h + 1) {
                        *slot = ldc(&cplx_v, k as isize * self.os);
                    }
                    for j in 0..n {
                        let mut acc = s[0].re;
                        let kmax = if n % 2 == 0 { h - 1 } else { h };
                        for k in 1..=kmax {
                            let theta = if shifted {
                                pi * (k * (2 * j + 1)) as f64 / n as f64
                            } else {
                                2.0 * pi * ((k * j) % n) as f64 / n as f64
                            };
                            let (sn, cs) = <f64 as Float>::sin_cos(theta);
                            acc = acc
                                + two * (s[k].re * T::from_f64(cs) - s[k].im * T::from_f64(sn));
                        }
                        if n % 2 == 0 {
                            // nyquist term appears once; for the shifted
                            // kind it is purely imaginary and alternates
                            if shifted {
                                let sgn = if j % 2 == 0 { -T::one() } else { T::one() };
                                acc = acc + sgn * s[h].im;
                            } else if j % 2 == 0 {
                                acc = acc + s[h].re;
                            } else {
                                acc = acc - s[h].re;
                            }
                        }
                        *io_v.ri.offset(j as isize * self.is) = acc;
                    }
                }
            }
            io_v = io_v.shift(self.v.ivs, self.v.ivs);
            cplx_v = cplx_v.shift(self.v.ovs, self.v.ovs);
        }
    }
}

/// Contract-violation errors detectable before any work starts. `apply`
/// itself never fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteError {
    KindMismatch,
    PlacementMismatch,
    BufferTooSmall,
    Misaligned,
    Sleepy,
}

impl core::fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ExecuteError::KindMismatch => write!(f, "buffers do not match the plan's problem kind"),
            ExecuteError::PlacementMismatch => {
                write!(f, "in-place/out-of-place placement differs from the plan")
            }
            ExecuteError::BufferTooSmall => write!(f, "buffer too small for the planned strides"),
            ExecuteError::Misaligned => {
                write!(f, "plan assumed aligned pointers; pass UNALIGNED to lift")
            }
            ExecuteError::Sleepy => write!(f, "plan has not been woken"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ExecuteError {}

/// Estimated and, when the planner measured, observed cost of a plan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cost {
    pub estimated: f64,
    pub measured: Option<f64>,
}

/// Buffer requirements derived from the problem at assembly time, checked
/// on every apply. Lengths are in the plane's natural elements; a problem
/// whose negative strides would reach below the slice start is marked
/// unsatisfiable by an infinite minimum.
#[derive(Clone, Copy, Debug)]
struct IoCheck {
    in_place: bool,
    min_in: usize,
    min_out: usize,
    align_in: bool,
    align_out: bool,
}

fn plane_min<'a>(dims: impl Iterator<Item = (usize, isize)> + 'a) -> usize {
    let mut lo = 0isize;
    let mut hi = 0isize;
    for (n, s) in dims {
        let span = (n as isize - 1) * s;
        if span < 0 {
            lo += span;
        } else {
            hi += span;
        }
    }
    if lo < 0 {
        usize::MAX
    } else {
        hi as usize + 1
    }
}

/// Minimum (input, output) extents in the planes' natural elements, plus
/// in-place-ness. Shared by execute-time validation and the measurement
/// buffers.
pub(crate) fn problem_extents(prb: &Problem) -> (usize, usize, bool) {
    match prb {
        Problem::Dft(p) => {
            let space = p.sz.append(&p.vecsz);
            (
                plane_min(space.dims().iter().map(|d| (d.n, d.is))),
                plane_min(space.dims().iter().map(|d| (d.n, d.os))),
                p.inp.same_storage(&p.out),
            )
        }
        Problem::Rdft(p) => {
            let space = p.sz.append(&p.vecsz);
            (
                plane_min(space.dims().iter().map(|d| (d.n, d.is))),
                plane_min(space.dims().iter().map(|d| (d.n, d.os))),
                p.inp.same_storage(&p.out),
            )
        }
        Problem::Rdft2(p) => {
            let dims = p.sz.dims();
            let last = dims.len().saturating_sub(1);
            let real = dims
                .iter()
                .map(|d| (d.n, d.is))
                .chain(p.vecsz.dims().iter().map(|d| (d.n, d.is)));
            let cplx = dims
                .iter()
                .enumerate()
                .map(|(i, d)| {
                    if i == last {
                        (d.n / 2 + 1, d.os)
                    } else {
                        (d.n, d.os)
                    }
                })
                .chain(p.vecsz.dims().iter().map(|d| (d.n, d.os)));
            (
                plane_min(real),
                plane_min(cplx),
                p.real.same_storage(&p.cplx),
            )
        }
        Problem::Transpose(p) => (
            plane_min(p.vecsz.dims().iter().map(|d| (d.n, d.is))),
            plane_min(p.vecsz.dims().iter().map(|d| (d.n, d.os))),
            p.inp.same_storage(&p.out),
        ),
        Problem::Unsolvable => (usize::MAX, usize::MAX, false),
    }
}

pub struct Plan<T: Float> {
    node: PlanNode<T>,
    kind: ProblemKind,
    ops: OpCounts,
    cost: Cost,
    wakefulness: Wakefulness,
    check: IoCheck,
}

impl<T: Float> Plan<T> {
    pub(crate) fn assemble(prb: &Problem, node: PlanNode<T>, ops: OpCounts, flags: Flags) -> Self {
        let unaligned_ok = flags.contains(Flags::UNALIGNED);
        let (min_in, min_out, in_place) = problem_extents(prb);
        let (a_in, a_out) = match prb {
            Problem::Dft(p) => (p.inp.aligned, p.out.aligned),
            Problem::Rdft(p) => (p.inp.aligned, p.out.aligned),
            Problem::Rdft2(p) => (p.real.aligned, p.cplx.aligned),
            Problem::Transpose(p) => (p.inp.aligned, p.out.aligned),
            Problem::Unsolvable => (false, false),
        };
        let check = IoCheck {
            in_place,
            min_in,
            min_out,
            align_in: a_in && !unaligned_ok,
            align_out: a_out && !unaligned_ok,
        };
        Self {
            node,
            kind: prb.kind().unwrap_or(ProblemKind::Dft),
            ops,
            cost: Cost {
                estimated: 0.0,
                measured: None,
            },
            wakefulness: Wakefulness::Sleepy,
            check,
        }
    }

    pub(crate) fn set_cost(&mut self, cost: Cost) {
        self.cost = cost;
    }

    pub(crate) fn awake(&mut self, w: Wakefulness, reg: &mut TwiddleRegistry<T>) {
        self.node.awake(w, reg);
        self.wakefulness = w;
    }

    pub fn kind(&self) -> ProblemKind {
        self.kind
    }

    pub fn ops(&self) -> OpCounts {
        self.ops
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn wakefulness(&self) -> Wakefulness {
        self.wakefulness
    }

    /// Compact s-expression of the plan shape, stable for a given solver
    /// set. Used by wisdom debugging and the determinism tests.
    pub fn print(&self) -> String {
        let mut out = String::new();
        self.node.print_into(&mut out);
        out
    }

    fn precheck(
        &self,
        kind: ProblemKind,
        in_place: bool,
        lens: (usize, usize),
        aligns: (bool, bool),
    ) -> Result<(), ExecuteError> {
        if self.kind != kind {
            return Err(ExecuteError::KindMismatch);
        }
        if self.wakefulness == Wakefulness::Sleepy {
            return Err(ExecuteError::Sleepy);
        }
        if self.check.in_place != in_place {
            return Err(ExecuteError::PlacementMismatch);
        }
        if lens.0 < self.check.min_in || lens.1 < self.check.min_out {
            return Err(ExecuteError::BufferTooSmall);
        }
        if (self.check.align_in && !aligns.0) || (self.check.align_out && !aligns.1) {
            return Err(ExecuteError::Misaligned);
        }
        Ok(())
    }

    pub fn apply_dft(&self, data: DftData<'_, T>) -> Result<(), ExecuteError> {
        self.precheck(
            ProblemKind::Dft,
            data.is_in_place(),
            data.lens(),
            data.alignments(),
        )?;
        let io = match data {
            DftData::InPlace(d) => {
                let p = d.as_mut_ptr();
                Io::from_complex(p, p)
            }
            DftData::OutOfPlace { input, output } => {
                Io::from_complex(input.as_mut_ptr(), output.as_mut_ptr())
            }
        };
        unsafe { self.node.apply(io) };
        Ok(())
    }

    pub fn apply_r2r(&self, data: RealData<'_, T>) -> Result<(), ExecuteError> {
        self.apply_real(ProblemKind::Rdft, data)
    }

    pub fn apply_transpose(&self, data: RealData<'_, T>) -> Result<(), ExecuteError> {
        self.apply_real(ProblemKind::Transpose, data)
    }

    fn apply_real(&self, kind: ProblemKind, data: RealData<'_, T>) -> Result<(), ExecuteError> {
        self.precheck(kind, data.is_in_place(), data.lens(), data.alignments())?;
        let io = match data {
            RealData::InPlace(d) => {
                let p = d.as_mut_ptr();
                Io::from_real(p, p)
            }
            RealData::OutOfPlace { input, output } => {
                Io::from_real(input.as_mut_ptr(), output.as_mut_ptr())
            }
        };
        unsafe { self.node.apply(io) };
        Ok(())
    }

    pub fn apply_rdft2(&self, data: Rdft2Data<'_, T>) -> Result<(), ExecuteError> {
        let aligns = (
            crate::buffer::ptr_aligned(data.real.as_ptr()),
            crate::buffer::ptr_aligned(data.cplx.as_ptr()),
        );
        self.precheck(
            ProblemKind::Rdft2,
            false,
            (data.real.len(), data.cplx.len()),
            aligns,
        )?;
        let io = Io::from_real_cplx(data.real.as_mut_ptr(), data.cplx.as_mut_ptr());
        unsafe { self.node.apply(io) };
        Ok(())
    }
}
