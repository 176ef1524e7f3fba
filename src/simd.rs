//! Host capability shim: vectorized codelet variants.
//!
//! Registers SSE descriptors for `f32` on x86-64 hosts that have the
//! instructions. The descriptors carry `aligned_only` genera, so their
//! `okp` already restricts them to contiguous interleaved untainted data;
//! NO_SIMD and pointer taint keep them out of a search. On every other
//! host or element type this module contributes nothing.

use alloc::vec::Vec;
use core::any::TypeId;

use crate::codelet::{CodeletApply, CodeletDesc, CodeletKind, Genus};
use crate::kernels::DftKernel;
use crate::num::Float;
use crate::ops::OpCounts;

const VECTOR: Genus = Genus { aligned_only: true };

#[cfg(target_arch = "x86_64")]
fn have_sse() -> bool {
    if cfg!(feature = "sse") {
        return true;
    }
    #[cfg(feature = "std")]
    {
        std::arch::is_x86_feature_detected!("sse2")
    }
    #[cfg(not(feature = "std"))]
    {
        cfg!(target_feature = "sse2")
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn have_sse() -> bool {
    false
}

pub(crate) fn codelets<T: Float>() -> Vec<CodeletDesc<T>> {
    let mut out = Vec::new();
    if !have_sse() || TypeId::of::<T>() != TypeId::of::<f32>() {
        return out;
    }
    #[cfg(target_arch = "x86_64")]
    {
        // T is f32 here; renaming the concrete kernel pointers to the
        // generic alias does not change their ABI
        let dft2: DftKernel<T> =
            unsafe { core::mem::transmute(sse::dft2_f32 as DftKernel<f32>) };
        let dft4: DftKernel<T> =
            unsafe { core::mem::transmute(sse::dft4_f32 as DftKernel<f32>) };
        out.push(CodeletDesc {
            name: "n1s_2",
            n: 2,
            kind: CodeletKind::Dft,
            ops: OpCounts::new(4.0, 0.0, 0.0, 2.0),
            genus: VECTOR,
            apply: CodeletApply::Dft(dft2),
        });
        out.push(CodeletDesc {
            name: "n1s_4",
            n: 4,
            kind: CodeletKind::Dft,
            ops: OpCounts::new(16.0, 0.0, 0.0, 4.0),
            genus: VECTOR,
            apply: CodeletApply::Dft(dft4),
        });
    }
    out
}

#[cfg(target_arch = "x86_64")]
mod sse {
    use core::arch::x86_64::*;

    use crate::kernels::KernIo;

    /// Interleaved base of a rail pair. Backward leaves arrive with the
    /// rails swapped (imaginary first); the kernels then see `(im, re)`
    /// pairs and owe the opposite-sign transform. `dft2_f32` is sign-free;
    /// `dft4_f32` flips its imaginary-unit constant.
    #[inline(always)]
    fn base_in(ri: *const f32, ii: *const f32) -> *const f32 {
        if ii < ri {
            ii
        } else {
            ri
        }
    }

    #[inline(always)]
    fn base_out(ro: *mut f32, io: *mut f32) -> *mut f32 {
        if io < ro {
            io
        } else {
            ro
        }
    }

    pub(super) unsafe fn dft2_f32(k: KernIo<f32>) {
        let mut src = base_in(k.ri, k.ii);
        let mut dst = base_out(k.ro, k.io);
        for _ in 0..k.vl {
            let x = _mm_loadu_ps(src);
            let lo = _mm_movelh_ps(x, x);
            let hi = _mm_movehl_ps(x, x);
            let s = _mm_add_ps(lo, hi);
            let d = _mm_sub_ps(lo, hi);
            _mm_storeu_ps(dst, _mm_movelh_ps(s, d));
            src = src.wrapping_offset(k.ivs);
            dst = dst.wrapping_offset(k.ovs);
        }
    }

    pub(super) unsafe fn dft4_f32(k: KernIo<f32>) {
        // swapped rails hold (im, re) pairs; the matching physical
        // transform multiplies by +i where the plain layout takes -i
        let neg_im = if k.ii < k.ri {
            _mm_set_ps(0.0, -0.0, 0.0, -0.0)
        } else {
            _mm_set_ps(-0.0, 0.0, -0.0, 0.0)
        };
        let mut src = base_in(k.ri, k.ii);
        let mut dst = base_out(k.ro, k.io);
        for _ in 0..k.vl {
            let x01 = _mm_loadu_ps(src);
            let x23 = _mm_loadu_ps(src.wrapping_offset(4));
            let a = _mm_movelh_ps(x01, x23); // x0 x2
            let b = _mm_movehl_ps(x23, x01); // x1 x3

            let all = _mm_movelh_ps(a, a);
            let ahh = _mm_movehl_ps(a, a);
            let ef = _mm_movelh_ps(_mm_add_ps(all, ahh), _mm_sub_ps(all, ahh)); // e f
            let bll = _mm_movelh_ps(b, b);
            let bhh = _mm_movehl_ps(b, b);
            let gh = _mm_movelh_ps(_mm_add_ps(bll, bhh), _mm_sub_ps(bll, bhh)); // g h

            let ee = _mm_movelh_ps(ef, ef);
            let ff = _mm_movehl_ps(ef, ef);
            let gg = _mm_movelh_ps(gh, gh);
            let hh = _mm_movehl_ps(gh, gh);
            // t = h * (-i): (re, im) -> (im, -re)
            let t = _mm_xor_ps(_mm_shuffle_ps(hh, hh, 0b10_11_00_01), neg_im);

            let y02 = _mm_movelh_ps(_mm_add_ps(ee, gg), _mm_sub_ps(ee, gg)); // y0 y2
            let y13 = _mm_movelh_ps(_mm_add_ps(ff, t), _mm_sub_ps(ff, t)); // y1 y3
            _mm_storeu_ps(dst, _mm_movelh_ps(y02, y13));
            _mm_storeu_ps(dst.wrapping_offset(4), _mm_movehl_ps(y13, y02));
            src = src.wrapping_offset(k.ivs);
            dst = dst.wrapping_offset(k.ovs);
        }
    }
}
