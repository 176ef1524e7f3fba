use core::f64::consts::PI as PI64;

// Minimal float trait for the generic transform machinery (no_std friendly)
pub trait Float:
    Copy
    + Clone
    + PartialEq
    + PartialOrd
    + core::fmt::Debug
    + core::ops::Add<Output = Self>
    + core::ops::Sub<Output = Self>
    + core::ops::Mul<Output = Self>
    + core::ops::Div<Output = Self>
    + core::ops::Neg<Output = Self>
    + 'static
{
    fn zero() -> Self;
    fn one() -> Self;
    fn from_f32(x: f32) -> Self;
    /// Lossy conversion from `f64`, rounding to the nearest representable
    /// value. Twiddle generation computes angles in `f64` and narrows here.
    fn from_f64(x: f64) -> Self;
    /// Attempt to convert a `usize` into the floating-point type.
    /// Returns `None` if the value cannot be represented exactly.
    fn from_usize(x: usize) -> Option<Self>;
    fn cos(self) -> Self;
    fn sin(self) -> Self;
    fn sin_cos(self) -> (Self, Self);
    fn pi() -> Self;
    /// Machine epsilon of the concrete type.
    fn epsilon() -> Self;
    fn abs(self) -> Self;
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }
}

// The #[allow(unconditional_recursion)] below silences a known linter false
// positive: f32::cos(self) resolves to the inherent method, not this trait.
#[allow(unconditional_recursion)]
impl Float for f32 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn from_f32(x: f32) -> Self {
        x
    }
    fn from_f64(x: f64) -> Self {
        x as f32
    }
    fn from_usize(x: usize) -> Option<Self> {
        const MAX_EXACT: usize = 1usize << 24;
        if x < MAX_EXACT {
            Some(x as f32)
        } else {
            None
        }
    }
    #[cfg(feature = "std")]
    fn cos(self) -> Self {
        f32::cos(self)
    }
    #[cfg(not(feature = "std"))]
    fn cos(self) -> Self {
        libm::cosf(self)
    }
    #[cfg(feature = "std")]
    fn sin(self) -> Self {
        f32::sin(self)
    }
    #[cfg(not(feature = "std"))]
    fn sin(self) -> Self {
        libm::sinf(self)
    }
    #[cfg(feature = "std")]
    fn sin_cos(self) -> (Self, Self) {
        f32::sin_cos(self)
    }
    #[cfg(not(feature = "std"))]
    fn sin_cos(self) -> (Self, Self) {
        libm::sincosf(self)
    }
    fn pi() -> Self {
        core::f32::consts::PI
    }
    fn epsilon() -> Self {
        f32::EPSILON
    }
    #[cfg(feature = "std")]
    fn abs(self) -> Self {
        f32::abs(self)
    }
    #[cfg(not(feature = "std"))]
    fn abs(self) -> Self {
        libm::fabsf(self)
    }
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f32::mul_add(self, a, b)
    }
}

#[allow(unconditional_recursion)]
impl Float for f64 {
    fn zero() -> Self {
        0.0
    }
    fn one() -> Self {
        1.0
    }
    fn from_f32(x: f32) -> Self {
        x as f64
    }
    fn from_f64(x: f64) -> Self {
        x
    }
    fn from_usize(x: usize) -> Option<Self> {
        const MAX_EXACT: usize = 1usize << 53;
        if x < MAX_EXACT {
            Some(x as f64)
        } else {
            None
        }
    }
    #[cfg(feature = "std")]
    fn cos(self) -> Self {
        f64::cos(self)
    }
    #[cfg(not(feature = "std"))]
    fn cos(self) -> Self {
        libm::cos(self)
    }
    #[cfg(feature = "std")]
    fn sin(self) -> Self {
        f64::sin(self)
    }
    #[cfg(not(feature = "std"))]
    fn sin(self) -> Self {
        libm::sin(self)
    }
    #[cfg(feature = "std")]
    fn sin_cos(self) -> (Self, Self) {
        f64::sin_cos(self)
    }
    #[cfg(not(feature = "std"))]
    fn sin_cos(self) -> (Self, Self) {
        libm::sincos(self)
    }
    fn pi() -> Self {
        PI64
    }
    fn epsilon() -> Self {
        f64::EPSILON
    }
    #[cfg(feature = "std")]
    fn abs(self) -> Self {
        f64::abs(self)
    }
    #[cfg(not(feature = "std"))]
    fn abs(self) -> Self {
        libm::fabs(self)
    }
    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f64::mul_add(self, a, b)
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Complex<T: Float> {
    pub re: T,
    pub im: T,
}

impl<T: Float> Complex<T> {
    pub fn new(re: T, im: T) -> Self {
        Self { re, im }
    }
    pub fn zero() -> Self {
        Self {
            re: T::zero(),
            im: T::zero(),
        }
    }
    #[inline(always)]
    pub fn expi(theta: T) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self { re: cos, im: sin }
    }
    #[inline(always)]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }
    #[inline(always)]
    pub fn scale(self, k: T) -> Self {
        Self {
            re: self.re * k,
            im: self.im * k,
        }
    }
    #[allow(clippy::should_implement_trait)]
    #[inline(always)]
    pub fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
    #[allow(clippy::should_implement_trait)]
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
    #[allow(clippy::should_implement_trait)]
    #[inline(always)]
    pub fn mul(self, other: Self) -> Self {
        #[cfg(all(
            target_feature = "fma",
            any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
        ))]
        {
            unsafe { self.mul_fma(other) }
        }
        #[cfg(not(all(
            target_feature = "fma",
            any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
        )))]
        {
            Self {
                re: self.re * other.re - self.im * other.im,
                im: self.re * other.im + self.im * other.re,
            }
        }
    }

    #[cfg(all(
        target_feature = "fma",
        any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")
    ))]
    #[target_feature(enable = "fma")]
    unsafe fn mul_fma(self, other: Self) -> Self {
        Self {
            re: self.re.mul_add(other.re, -(self.im * other.im)),
            im: self.re.mul_add(other.im, self.im * other.re),
        }
    }
}

impl<T: Float> core::ops::Neg for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl<T: Float> core::ops::Add for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn add(self, other: Self) -> Self {
        Self {
            re: self.re + other.re,
            im: self.im + other.im,
        }
    }
}

impl<T: Float> core::ops::Sub for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, other: Self) -> Self {
        Self {
            re: self.re - other.re,
            im: self.im - other.im,
        }
    }
}

impl<T: Float> core::ops::Mul for Complex<T> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        Complex::<T>::mul(self, other)
    }
}

pub type Complex32 = Complex<f32>;
pub type Complex64 = Complex<f64>;

#[cfg(all(feature = "internal-tests", test))]
mod tests {
    use super::*;

    #[test]
    fn test_complex_operations() {
        let a = Complex64::new(1.0, -2.0);
        let b = Complex64::new(3.0, 4.0);
        let c = a.mul(b);
        assert!((c.re - (1.0 * 3.0 - (-2.0) * 4.0)).abs() < 1e-6);
        let n = -a;
        assert_eq!(n.re, -1.0);
        assert_eq!(n.im, 2.0);
        let _e = Complex64::expi(<f64 as Float>::pi());
    }

    #[test]
    fn test_conj_and_scale() {
        let a = Complex32::new(2.0, -3.0);
        assert_eq!(a.conj(), Complex32::new(2.0, 3.0));
        assert_eq!(a.scale(0.5), Complex32::new(1.0, -1.5));
    }
}
