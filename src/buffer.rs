//! Buffer identity and alignment records.
//!
//! Problems never hold addresses. Each data plane is described by a
//! [`BufSpec`]: a token identifying the storage (equal tokens mean the same
//! allocation, which is how in-place transforms are declared) and an
//! `aligned` bit stating whether the plan may assume the natural codelet
//! boundary. Real slices arrive only at execute time and are re-validated
//! against the plan there.

use crate::num::{Complex, Float};

/// Natural alignment boundary assumed by aligned codelet variants, in
/// bytes. Matches one SSE vector.
pub const ALIGN_QUANTUM: usize = 16;

/// Opaque storage identity. Problems with equal tokens on both planes are
/// in-place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufToken(pub u32);

/// Placement record for one data plane.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufSpec {
    pub token: BufToken,
    pub aligned: bool,
}

impl BufSpec {
    pub const fn aligned(token: BufToken) -> Self {
        Self {
            token,
            aligned: true,
        }
    }

    pub const fn unaligned(token: BufToken) -> Self {
        Self {
            token,
            aligned: false,
        }
    }

    pub fn same_storage(&self, other: &BufSpec) -> bool {
        self.token == other.token
    }
}

/// Whether a pointer sits on the natural boundary.
pub fn ptr_aligned<T>(p: *const T) -> bool {
    (p as usize) % ALIGN_QUANTUM == 0
}

/// Complex buffers for a DFT apply.
pub enum DftData<'a, T: Float> {
    InPlace(&'a mut [Complex<T>]),
    OutOfPlace {
        input: &'a mut [Complex<T>],
        output: &'a mut [Complex<T>],
    },
}

impl<'a, T: Float> DftData<'a, T> {
    pub(crate) fn is_in_place(&self) -> bool {
        matches!(self, DftData::InPlace(_))
    }

    /// Lengths of (input, output) in complex elements.
    pub(crate) fn lens(&self) -> (usize, usize) {
        match self {
            DftData::InPlace(d) => (d.len(), d.len()),
            DftData::OutOfPlace { input, output } => (input.len(), output.len()),
        }
    }

    pub(crate) fn alignments(&self) -> (bool, bool) {
        match self {
            DftData::InPlace(d) => {
                let a = ptr_aligned(d.as_ptr());
                (a, a)
            }
            DftData::OutOfPlace { input, output } => {
                (ptr_aligned(input.as_ptr()), ptr_aligned(output.as_ptr()))
            }
        }
    }
}

/// Real buffers for r2r and transpose applies.
pub enum RealData<'a, T: Float> {
    InPlace(&'a mut [T]),
    OutOfPlace {
        input: &'a mut [T],
        output: &'a mut [T],
    },
}

impl<'a, T: Float> RealData<'a, T> {
    pub(crate) fn is_in_place(&self) -> bool {
        matches!(self, RealData::InPlace(_))
    }

    pub(crate) fn lens(&self) -> (usize, usize) {
        match self {
            RealData::InPlace(d) => (d.len(), d.len()),
            RealData::OutOfPlace { input, output } => (input.len(), output.len()),
        }
    }

    pub(crate) fn alignments(&self) -> (bool, bool) {
        match self {
            RealData::InPlace(d) => {
                let a = ptr_aligned(d.as_ptr());
                (a, a)
            }
            RealData::OutOfPlace { input, output } => {
                (ptr_aligned(input.as_ptr()), ptr_aligned(output.as_ptr()))
            }
        }
    }
}

/// Real plane plus halfcomplex plane for an r2c/c2r apply. Which plane is
/// read and which is written follows from the problem's kind.
pub struct Rdft2Data<'a, T: Float> {
    pub real: &'a mut [T],
    pub cplx: &'a mut [Complex<T>],
}

/// Raw pointer set threaded through plan nodes. Strides attached to the
/// pointers are in `T` units; interleaved complex planes double their
/// element strides during lowering so `ii = ri + 1`.
///
/// Unused planes hold dangling pointers and must not be dereferenced.
#[derive(Clone, Copy)]
pub(crate) struct Io<T> {
    pub ri: *mut T,
    pub ii: *mut T,
    pub ro: *mut T,
    pub io: *mut T,
}

impl<T: Float> Io<T> {
    pub(crate) fn unused() -> Self {
        Self {
            ri: core::ptr::null_mut(),
            ii: core::ptr::null_mut(),
            ro: core::ptr::null_mut(),
            io: core::ptr::null_mut(),
        }
    }

    /// Interleaved complex in/out planes.
    pub(crate) fn from_complex(input: *mut Complex<T>, output: *mut Complex<T>) -> Self {
        let ri = input as *mut T;
        let ro = output as *mut T;
        Self {
            ri,
            ii: ri.wrapping_add(1),
            ro,
            io: ro.wrapping_add(1),
        }
    }

    /// Single real plane pair; the imaginary slots stay unused.
    pub(crate) fn from_real(input: *mut T, output: *mut T) -> Self {
        Self {
            ri: input,
            ii: core::ptr::null_mut(),
            ro: output,
            io: core::ptr::null_mut(),
        }
    }

    /// Real plane on the r-input rail, interleaved complex plane on the
    /// output rails. r2c/c2r nodes pick read and write sides from their
    /// kind.
    pub(crate) fn from_real_cplx(real: *mut T, cplx: *mut Complex<T>) -> Self {
        let c = cplx as *mut T;
        Self {
            ri: real,
            ii: core::ptr::null_mut(),
            ro: c,
            io: c.wrapping_add(1),
        }
    }

    /// Shift both planes by a vector-loop step (`T` units).
    pub(crate) fn shift(self, ivs: isize, ovs: isize) -> Self {
        Self {
            ri: self.ri.wrapping_offset(ivs),
            ii: self.ii.wrapping_offset(ivs),
            ro: self.ro.wrapping_offset(ovs),
            io: self.io.wrapping_offset(ovs),
        }
    }

    /// Swap the real and imaginary rails on both planes. A forward plan
    /// applied through swapped rails computes the opposite-sign transform.
    pub(crate) fn swap_rails(self) -> Self {
        Self {
            ri: self.ii,
            ii: self.ri,
            ro: self.io,
            io: self.ro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_declare_in_place() {
        let a = BufSpec::aligned(BufToken(0));
        let b = BufSpec::unaligned(BufToken(0));
        let c = BufSpec::aligned(BufToken(1));
        assert!(a.same_storage(&b));
        assert!(!a.same_storage(&c));
    }

    #[test]
    fn complex_lowering_offsets_imaginary_rail() {
        let mut buf = [Complex::<f32>::zero(); 4];
        let p = buf.as_mut_ptr();
        let io = Io::from_complex(p, p);
        assert_eq!(io.ri as usize + core::mem::size_of::<f32>(), io.ii as usize);
        let swapped = io.swap_rails();
        assert_eq!(swapped.ri as usize, io.ii as usize);
        assert_eq!(swapped.ii as usize, io.ri as usize);
    }
}
