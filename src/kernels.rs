//! Hand-written leaf kernels behind the codelet descriptors.
//!
//! Every kernel loads its whole working set before the first store, so the
//! same kernel serves in-place and out-of-place leaves. Strides are in `T`
//! units; complex data is interleaved with the imaginary rail one element
//! after the real rail.

use crate::num::{Complex, Float};

/// Strided complex pointer set for one leaf invocation.
#[derive(Clone, Copy)]
pub(crate) struct KernIo<T> {
    pub ri: *const T,
    pub ii: *const T,
    pub ro: *mut T,
    pub io: *mut T,
    pub is: isize,
    pub os: isize,
    pub vl: usize,
    pub ivs: isize,
    pub ovs: isize,
}

impl<T> KernIo<T> {
    #[inline(always)]
    fn step(self) -> Self {
        Self {
            ri: self.ri.wrapping_offset(self.ivs),
            ii: self.ii.wrapping_offset(self.ivs),
            ro: self.ro.wrapping_offset(self.ovs),
            io: self.io.wrapping_offset(self.ovs),
            ..self
        }
    }
}

/// Leaf transform of a fixed size.
///
/// Callers guarantee that every index reachable through `is`/`os` and the
/// vector loop stays inside the allocations behind the pointers.
pub(crate) type DftKernel<T> = unsafe fn(KernIo<T>);

/// Strided real pointer set for r2r leaves.
#[derive(Clone, Copy)]
pub(crate) struct RealKernIo<T> {
    pub ri: *const T,
    pub ro: *mut T,
    pub is: isize,
    pub os: isize,
    pub vl: usize,
    pub ivs: isize,
    pub ovs: isize,
}

impl<T> RealKernIo<T> {
    #[inline(always)]
    fn step(self) -> Self {
        Self {
            ri: self.ri.wrapping_offset(self.ivs),
            ro: self.ro.wrapping_offset(self.ovs),
            ..self
        }
    }
}

pub(crate) type R2rKernel<T> = unsafe fn(RealKernIo<T>);

#[inline(always)]
unsafe fn ld<T: Float>(io: &KernIo<T>, k: isize) -> Complex<T> {
    Complex::new(*io.ri.offset(k * io.is), *io.ii.offset(k * io.is))
}

#[inline(always)]
unsafe fn st<T: Float>(io: &KernIo<T>, k: isize, v: Complex<T>) {
    *io.ro.offset(k * io.os) = v.re;
    *io.io.offset(k * io.os) = v.im;
}

pub(crate) unsafe fn dft2<T: Float>(mut io: KernIo<T>) {
    for _ in 0..io.vl {
        let x0 = ld(&io, 0);
        let x1 = ld(&io, 1);
        st(&io, 0, x0.add(x1));
        st(&io, 1, x0.sub(x1));
        io = io.step();
    }
}

pub(crate) unsafe fn dft3<T: Float>(mut io: KernIo<T>) {
    let s = T::from_f64(0.8660254037844386); // sin(2*pi/3)
    let half = T::from_f64(0.5);
    let wm = Complex::new(T::zero(), -s);
    for _ in 0..io.vl {
        let x0 = ld(&io, 0);
        let x1 = ld(&io, 1);
        let x2 = ld(&io, 2);
        let t1 = x1.add(x2);
        let t2 = x0.sub(t1.scale(half));
        let m = x1.sub(x2).mul(wm);
        st(&io, 0, x0.add(t1));
        st(&io, 1, t2.add(m));
        st(&io, 2, t2.sub(m));
        io = io.step();
    }
}

pub(crate) unsafe fn dft4<T: Float>(mut io: KernIo<T>) {
    let w1 = Complex::new(T::zero(), -T::one());
    for _ in 0..io.vl {
        let x0 = ld(&io, 0);
        let x1 = ld(&io, 1);
        let x2 = ld(&io, 2);
        let x3 = ld(&io, 3);
        let even0 = x0.add(x2);
        let even1 = x0.sub(x2);
        let odd0 = x1.add(x3);
        let odd1 = x1.sub(x3);
        let t = odd1.mul(w1);
        st(&io, 0, even0.add(odd0));
        st(&io, 2, even0.sub(odd0));
        st(&io, 1, even1.add(t));
        st(&io, 3, even1.sub(t));
        io = io.step();
    }
}

pub(crate) unsafe fn dft5<T: Float>(mut io: KernIo<T>) {
    let c1 = T::from_f64(0.30901699437494745); // cos(2*pi/5)
    let s1 = T::from_f64(0.9510565162951535); // sin(2*pi/5)
    let c2 = T::from_f64(-0.8090169943749475); // cos(4*pi/5)
    let s2 = T::from_f64(0.5877852522924731); // sin(4*pi/5)
    for _ in 0..io.vl {
        let x0 = ld(&io, 0);
        let x1 = ld(&io, 1);
        let x2 = ld(&io, 2);
        let x3 = ld(&io, 3);
        let x4 = ld(&io, 4);
        let t1 = x1.add(x4);
        let t2 = x2.add(x3);
        let t3 = x1.sub(x4);
        let t4 = x2.sub(x3);
        let a1 = x0.add(t1.scale(c1)).add(t2.scale(c2));
        let a2 = x0.add(t1.scale(c2)).add(t2.scale(c1));
        let b1 = t3.scale(s1).add(t4.scale(s2));
        let b2 = t3.scale(s2).sub(t4.scale(s1));
        let w1 = Complex::new(T::zero(), -T::one());
        let m1 = b1.mul(w1);
        let m2 = b2.mul(w1);
        st(&io, 0, x0.add(t1).add(t2));
        st(&io, 1, a1.add(m1));
        st(&io, 4, a1.sub(m1));
        st(&io, 2, a2.add(m2));
        st(&io, 3, a2.sub(m2));
        io = io.step();
    }
}

pub(crate) unsafe fn dft8<T: Float>(mut io: KernIo<T>) {
    let w1 = Complex::new(T::zero(), -T::one());
    let s = T::from_f64(core::f64::consts::FRAC_1_SQRT_2);
    for _ in 0..io.vl {
        let x0 = ld(&io, 0);
        let x1 = ld(&io, 1);
        let x2 = ld(&io, 2);
        let x3 = ld(&io, 3);
        let x4 = ld(&io, 4);
        let x5 = ld(&io, 5);
        let x6 = ld(&io, 6);
        let x7 = ld(&io, 7);

        // size-4 pass over the even slots
        let a0 = x0.add(x4);
        let a1 = x0.sub(x4);
        let a2 = x2.add(x6);
        let a3 = x2.sub(x6);
        let t = a3.mul(w1);
        let e0 = a0.add(a2);
        let e2 = a0.sub(a2);
        let e1 = a1.add(t);
        let e3 = a1.sub(t);

        // size-4 pass over the odd slots
        let b0 = x1.add(x5);
        let b1 = x1.sub(x5);
        let b2 = x3.add(x7);
        let b3 = x3.sub(x7);
        let t = b3.mul(w1);
        let o0 = b0.add(b2);
        let o2 = b0.sub(b2);
        let o1 = b1.add(t);
        let o3 = b1.sub(t);

        // twiddles and final butterflies
        let t0 = o0;
        let t1 = o1.mul(Complex::new(s, -s));
        let t2 = o2.mul(w1);
        let t3 = o3.mul(Complex::new(-s, -s));

        st(&io, 0, e0.add(t0));
        st(&io, 4, e0.sub(t0));
        st(&io, 1, e1.add(t1));
        st(&io, 5, e1.sub(t1));
        st(&io, 2, e2.add(t2));
        st(&io, 6, e2.sub(t2));
        st(&io, 3, e3.add(t3));
        st(&io, 7, e3.sub(t3));
        io = io.step();
    }
}

pub(crate) unsafe fn dft16<T: Float>(mut io: KernIo<T>) {
    let w1 = Complex::new(T::zero(), -T::one());
    let s = T::from_f64(core::f64::consts::FRAC_1_SQRT_2);
    let c16 = T::from_f64(0.9238795325112867); // cos(pi/8)
    let s16 = T::from_f64(0.3826834323650898); // sin(pi/8)
    for _ in 0..io.vl {
        let x: [Complex<T>; 16] = [
            ld(&io, 0),
            ld(&io, 1),
            ld(&io, 2),
            ld(&io, 3),
            ld(&io, 4),
            ld(&io, 5),
            ld(&io, 6),
            ld(&io, 7),
            ld(&io, 8),
            ld(&io, 9),
            ld(&io, 10),
            ld(&io, 11),
            ld(&io, 12),
            ld(&io, 13),
            ld(&io, 14),
            ld(&io, 15),
        ];

        // size-8 pass over the even slots
        let a0 = x[0].add(x[8]);
        let a1 = x[0].sub(x[8]);
        let a2 = x[4].add(x[12]);
        let a3 = x[4].sub(x[12]);
        let t = a3.mul(w1);
        let ea0 = a0.add(a2);
        let ea2 = a0.sub(a2);
        let ea1 = a1.add(t);
        let ea3 = a1.sub(t);
        let b0 = x[2].add(x[10]);
        let b1 = x[2].sub(x[10]);
        let b2 = x[6].add(x[14]);
        let b3 = x[6].sub(x[14]);
        let t = b3.mul(w1);
        let eb0 = b0.add(b2);
        let eb2 = b0.sub(b2);
        let eb1 = b1.add(t);
        let eb3 = b1.sub(t);
        let t0 = eb0;
        let t1 = eb1.mul(Complex::new(s, -s));
        let t2 = eb2.mul(w1);
        let t3 = eb3.mul(Complex::new(-s, -s));
        let e0 = ea0.add(t0);
        let e4 = ea0.sub(t0);
        let e1 = ea1.add(t1);
        let e5 = ea1.sub(t1);
        let e2 = ea2.add(t2);
        let e6 = ea2.sub(t2);
        let e3 = ea3.add(t3);
        let e7 = ea3.sub(t3);

        // size-8 pass over the odd slots
        let c0 = x[1].add(x[9]);
        let c1 = x[1].sub(x[9]);
        let c2 = x[5].add(x[13]);
        let c3 = x[5].sub(x[13]);
        let t = c3.mul(w1);
        let oa0 = c0.add(c2);
        let oa2 = c0.sub(c2);
        let oa1 = c1.add(t);
        let oa3 = c1.sub(t);
        let d0 = x[3].add(x[11]);
        let d1 = x[3].sub(x[11]);
        let d2 = x[7].add(x[15]);
        let d3 = x[7].sub(x[15]);
        let t = d3.mul(w1);
        let ob0 = d0.add(d2);
        let ob2 = d0.sub(d2);
        let ob1 = d1.add(t);
        let ob3 = d1.sub(t);
        let t0 = ob0;
        let t1 = ob1.mul(Complex::new(s, -s));
        let t2 = ob2.mul(w1);
        let t3 = ob3.mul(Complex::new(-s, -s));
        let o0 = oa0.add(t0);
        let o4 = oa0.sub(t0);
        let o1 = oa1.add(t1);
        let o5 = oa1.sub(t1);
        let o2 = oa2.add(t2);
        let o6 = oa2.sub(t2);
        let o3 = oa3.add(t3);
        let o7 = oa3.sub(t3);

        // final stage twiddles
        let t0 = o0;
        let t1 = o1.mul(Complex::new(c16, -s16));
        let t2 = o2.mul(Complex::new(s, -s));
        let t3 = o3.mul(Complex::new(s16, -c16));
        let t4 = o4.mul(w1);
        let t5 = o5.mul(Complex::new(-s16, -c16));
        let t6 = o6.mul(Complex::new(-s, -s));
        let t7 = o7.mul(Complex::new(-c16, -s16));

        st(&io, 0, e0.add(t0));
        st(&io, 8, e0.sub(t0));
        st(&io, 1, e1.add(t1));
        st(&io, 9, e1.sub(t1));
        st(&io, 2, e2.add(t2));
        st(&io, 10, e2.sub(t2));
        st(&io, 3, e3.add(t3));
        st(&io, 11, e3.sub(t3));
        st(&io, 4, e4.add(t4));
        st(&io, 12, e4.sub(t4));
        st(&io, 5, e5.add(t5));
        st(&io, 13, e5.sub(t5));
        st(&io, 6, e6.add(t6));
        st(&io, 14, e6.sub(t6));
        st(&io, 7, e7.add(t7));
        st(&io, 15, e7.sub(t7));
        io = io.step();
    }
}

#[inline(always)]
unsafe fn rld<T: Float>(io: &RealKernIo<T>, k: isize) -> T {
    *io.ri.offset(k * io.is)
}

#[inline(always)]
unsafe fn rst<T: Float>(io: &RealKernIo<T>, k: isize, v: T) {
    *io.ro.offset(k * io.os) = v;
}

pub(crate) unsafe fn r2hc2<T: Float>(mut io: RealKernIo<T>) {
    for _ in 0..io.vl {
        let x0 = rld(&io, 0);
        let x1 = rld(&io, 1);
        rst(&io, 0, x0 + x1);
        rst(&io, 1, x0 - x1);
        io = io.step();
    }
}

pub(crate) unsafe fn hc2r2<T: Float>(mut io: RealKernIo<T>) {
    for _ in 0..io.vl {
        let r0 = rld(&io, 0);
        let r1 = rld(&io, 1);
        rst(&io, 0, r0 + r1);
        rst(&io, 1, r0 - r1);
        io = io.step();
    }
}

pub(crate) unsafe fn r2hc3<T: Float>(mut io: RealKernIo<T>) {
    let s = T::from_f64(0.8660254037844386);
    let half = T::from_f64(0.5);
    for _ in 0..io.vl {
        let x0 = rld(&io, 0);
        let x1 = rld(&io, 1);
        let x2 = rld(&io, 2);
        let t = x1 + x2;
        rst(&io, 0, x0 + t);
        rst(&io, 1, x0 - half * t);
        rst(&io, 2, -s * (x1 - x2));
        io = io.step();
    }
}

pub(crate) unsafe fn hc2r3<T: Float>(mut io: RealKernIo<T>) {
    let s2 = T::from_f64(1.7320508075688772); // 2*sin(2*pi/3)
    for _ in 0..io.vl {
        let r0 = rld(&io, 0);
        let r1 = rld(&io, 1);
        let i1 = rld(&io, 2);
        let t = r0 - r1;
        rst(&io, 0, r0 + r1 + r1);
        rst(&io, 1, t - s2 * i1);
        rst(&io, 2, t + s2 * i1);
        io = io.step();
    }
}

pub(crate) unsafe fn r2hc4<T: Float>(mut io: RealKernIo<T>) {
    for _ in 0..io.vl {
        let x0 = rld(&io, 0);
        let x1 = rld(&io, 1);
        let x2 = rld(&io, 2);
        let x3 = rld(&io, 3);
        rst(&io, 0, x0 + x1 + x2 + x3);
        rst(&io, 1, x0 - x2);
        rst(&io, 2, x0 - x1 + x2 - x3);
        rst(&io, 3, x3 - x1);
        io = io.step();
    }
}

pub(crate) unsafe fn hc2r4<T: Float>(mut io: RealKernIo<T>) {
    for _ in 0..io.vl {
        let r0 = rld(&io, 0);
        let r1 = rld(&io, 1);
        let r2 = rld(&io, 2);
        let i1 = rld(&io, 3);
        let e = r0 + r2;
        let o = r0 - r2;
        let r1x2 = r1 + r1;
        let i1x2 = i1 + i1;
        rst(&io, 0, e + r1x2);
        rst(&io, 1, o - i1x2);
        rst(&io, 2, e - r1x2);
        rst(&io, 3, o + i1x2);
        io = io.step();
    }
}

pub(crate) unsafe fn r2hc5<T: Float>(mut io: RealKernIo<T>) {
    let c1 = T::from_f64(0.30901699437494745);
    let s1 = T::from_f64(0.9510565162951535);
    let c2 = T::from_f64(-0.8090169943749475);
    let s2 = T::from_f64(0.5877852522924731);
    for _ in 0..io.vl {
        let x0 = rld(&io, 0);
        let x1 = rld(&io, 1);
        let x2 = rld(&io, 2);
        let x3 = rld(&io, 3);
        let x4 = rld(&io, 4);
        let t1 = x1 + x4;
        let t2 = x2 + x3;
        let t3 = x1 - x4;
        let t4 = x2 - x3;
        rst(&io, 0, x0 + t1 + t2);
        rst(&io, 1, x0 + c1 * t1 + c2 * t2);
        rst(&io, 2, x0 + c2 * t1 + c1 * t2);
        rst(&io, 3, -(s2 * t3) + s1 * t4);
        rst(&io, 4, -(s1 * t3) - s2 * t4);
        io = io.step();
    }
}

pub(crate) unsafe fn hc2r5<T: Float>(mut io: RealKernIo<T>) {
    let c1 = T::from_f64(0.30901699437494745);
    let s1 = T::from_f64(0.9510565162951535);
    let c2 = T::from_f64(-0.8090169943749475);
    let s2 = T::from_f64(0.5877852522924731);
    let two = T::from_f64(2.0);
    for _ in 0..io.vl {
        let r0 = rld(&io, 0);
        let r1 = rld(&io, 1);
        let r2 = rld(&io, 2);
        let i2 = rld(&io, 3);
        let i1 = rld(&io, 4);
        let p1 = two * r1;
        let p2 = two * r2;
        let q1 = two * i1;
        let q2 = two * i2;
        rst(&io, 0, r0 + p1 + p2);
        rst(&io, 1, r0 + c1 * p1 + c2 * p2 - (s1 * q1 + s2 * q2));
        rst(&io, 2, r0 + c2 * p1 + c1 * p2 - (s2 * q1 - s1 * q2));
        rst(&io, 3, r0 + c2 * p1 + c1 * p2 + (s2 * q1 - s1 * q2));
        rst(&io, 4, r0 + c1 * p1 + c2 * p2 + (s1 * q1 + s2 * q2));
        io = io.step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn naive_dft(input: &[Complex<f64>]) -> Vec<Complex<f64>> {
        let n = input.len();
        let mut out = vec![Complex::zero(); n];
        for (k, slot) in out.iter_mut().enumerate() {
            let mut acc = Complex::zero();
            for (j, x) in input.iter().enumerate() {
                let ang = -2.0 * core::f64::consts::PI * (k * j % n) as f64 / n as f64;
                acc = acc.add(x.mul(Complex::new(ang.cos(), ang.sin())));
            }
            *slot = acc;
        }
        out
    }

    fn run_dft(kernel: DftKernel<f64>, n: usize) {
        let input: Vec<Complex<f64>> = (0..n)
            .map(|i| Complex::new(1.0 + i as f64, 0.5 - (i % 3) as f64))
            .collect();
        let want = naive_dft(&input);
        let mut buf = input.clone();
        let p = buf.as_mut_ptr() as *mut f64;
        let io = KernIo {
            ri: p,
            ii: unsafe { p.add(1) },
            ro: p,
            io: unsafe { p.add(1) },
            is: 2,
            os: 2,
            vl: 1,
            ivs: 0,
            ovs: 0,
        };
        unsafe { kernel(io) };
        for (got, want) in buf.iter().zip(want.iter()) {
            assert!((got.re - want.re).abs() < 1e-9, "{got:?} vs {want:?}");
            assert!((got.im - want.im).abs() < 1e-9, "{got:?} vs {want:?}");
        }
    }

    #[test]
    fn dft_kernels_match_naive() {
        run_dft(dft2, 2);
        run_dft(dft3, 3);
        run_dft(dft4, 4);
        run_dft(dft5, 5);
        run_dft(dft8, 8);
        run_dft(dft16, 16);
    }

    fn naive_r2hc(input: &[f64]) -> Vec<f64> {
        let n = input.len();
        let mut out = vec![0.0; n];
        for k in 0..=n / 2 {
            let mut re = 0.0;
            let mut im = 0.0;
            for (j, &x) in input.iter().enumerate() {
                let ang = -2.0 * core::f64::consts::PI * (k * j % n) as f64 / n as f64;
                re += x * ang.cos();
                im += x * ang.sin();
            }
            out[k] = re;
            if k > 0 && 2 * k != n {
                out[n - k] = im;
            }
        }
        out
    }

    fn run_r2r(kernel: R2rKernel<f64>, n: usize, reference: fn(&[f64]) -> Vec<f64>) {
        let input: Vec<f64> = (0..n).map(|i| (i as f64) * 0.75 - 1.0).collect();
        let want = reference(&input);
        let mut buf = input.clone();
        let io = RealKernIo {
            ri: buf.as_ptr(),
            ro: buf.as_mut_ptr(),
            is: 1,
            os: 1,
            vl: 1,
            ivs: 0,
            ovs: 0,
        };
        unsafe { kernel(io) };
        for (got, want) in buf.iter().zip(want.iter()) {
            assert!((got - want).abs() < 1e-9, "{buf:?} vs {want:?}");
        }
    }

    fn naive_hc2r(input: &[f64]) -> Vec<f64> {
        let n = input.len();
        let mut out = vec![0.0; n];
        for (j, slot) in out.iter_mut().enumerate() {
            let mut acc = input[0];
            for k in 1..=n / 2 {
                let ang = 2.0 * core::f64::consts::PI * (k * j % n) as f64 / n as f64;
                if 2 * k == n {
                    acc += input[k] * ang.cos();
                } else {
                    acc += 2.0 * (input[k] * ang.cos() - input[n - k] * ang.sin());
                }
            }
            *slot = acc;
        }
        out
    }

    #[test]
    fn r2hc_kernels_match_naive() {
        run_r2r(r2hc2, 2, naive_r2hc);
        run_r2r(r2hc3, 3, naive_r2hc);
        run_r2r(r2hc4, 4, naive_r2hc);
        run_r2r(r2hc5, 5, naive_r2hc);
    }

    #[test]
    fn hc2r_kernels_match_naive() {
        run_r2r(hc2r2, 2, naive_hc2r);
        run_r2r(hc2r3, 3, naive_hc2r);
        run_r2r(hc2r4, 4, naive_hc2r);
        run_r2r(hc2r5, 5, naive_hc2r);
    }

    #[test]
    fn r2hc4_matches_known_vector() {
        let mut buf = [1.0f64, 2.0, 3.0, 4.0];
        let io = RealKernIo {
            ri: buf.as_ptr(),
            ro: buf.as_mut_ptr(),
            is: 1,
            os: 1,
            vl: 1,
            ivs: 0,
            ovs: 0,
        };
        unsafe { r2hc4(io) };
        assert_eq!(buf, [10.0, -2.0, -2.0, 2.0]);
    }
}
