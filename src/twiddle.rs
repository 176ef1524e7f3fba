//! Shared twiddle tables, reference-counted and keyed by content.
//!
//! Plans do not own their trigonometric tables directly. Each table-bearing
//! node holds a [`TwiddleSlot`] that is filled on `awake` from the planner's
//! [`TwiddleRegistry`] and emptied on sleep. Tables are `Arc`s, so two plans
//! that need the same `(n, kind)` share one allocation; the registry purges
//! entries nobody references anymore.

use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::num::{Complex, Float};
use crate::problem::Sign;

/// Table lifecycle state of a plan, totally ordered by how much setup work
/// has been done. `AwakeSqrtn` tables are generated by iterative rotation
/// reseeded every ~sqrt(n) steps; `AwakeSincos` evaluates every entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Wakefulness {
    Sleepy,
    AwakeSqrtn,
    AwakeSincos,
}

impl Wakefulness {
    pub(crate) fn accuracy(self) -> Accuracy {
        match self {
            // callers never generate while sleepy; default to the cheap form
            Wakefulness::Sleepy | Wakefulness::AwakeSqrtn => Accuracy::Sqrtn,
            Wakefulness::AwakeSincos => Accuracy::Sincos,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Accuracy {
    Sqrtn,
    Sincos,
}

/// What a table contains, part of the registry key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum TwiddleKind {
    /// `n` roots of unity `exp(sign * 2*pi*i * j / n)`.
    Full(Sign),
    /// `n` chirp factors `exp(sign * pi*i * j^2 / n)` for Bluestein.
    Chirp(Sign),
    /// The `n-1` convolution multipliers of Rader's algorithm for prime `n`
    /// and generator `root`: the forward DFT of the permuted root-of-unity
    /// sequence, pre-scaled by `1/(n-1)`.
    RaderOmega { sign: Sign, root: usize },
}

pub(crate) struct TwiddleRegistry<T: Float> {
    cache: HashMap<(usize, TwiddleKind, Accuracy), Arc<[Complex<T>]>>,
}

impl<T: Float> TwiddleRegistry<T> {
    pub(crate) fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub(crate) fn get(
        &mut self,
        n: usize,
        kind: TwiddleKind,
        acc: Accuracy,
    ) -> Arc<[Complex<T>]> {
        let key = (n, kind, acc);
        if !self.cache.contains_key(&key) {
            let table = match kind {
                TwiddleKind::Full(sign) => full_table::<T>(n, sign, acc),
                TwiddleKind::Chirp(sign) => chirp_table::<T>(n, sign),
                TwiddleKind::RaderOmega { sign, root } => omega_table::<T>(n, sign, root),
            };
            self.cache.insert(key, Arc::from(table));
        }
        Arc::clone(self.cache.get(&key).unwrap())
    }

    /// Drop tables that no awake plan references anymore.
    pub(crate) fn purge(&mut self) {
        self.cache.retain(|_, t| Arc::strong_count(t) > 1);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.cache.len()
    }
}

/// A node's handle on one shared table. Empty while the plan is sleepy.
pub(crate) struct TwiddleSlot<T: Float> {
    pub n: usize,
    pub kind: TwiddleKind,
    table: Option<Arc<[Complex<T>]>>,
}

impl<T: Float> TwiddleSlot<T> {
    pub(crate) fn new(n: usize, kind: TwiddleKind) -> Self {
        Self {
            n,
            kind,
            table: None,
        }
    }

    pub(crate) fn wake(&mut self, reg: &mut TwiddleRegistry<T>, acc: Accuracy) {
        self.table = Some(reg.get(self.n, self.kind, acc));
    }

    pub(crate) fn sleep(&mut self) {
        self.table = None;
    }

    /// Panics if the owning plan was not woken; the plan-level wakefulness
    /// check in `apply_*` keeps that unreachable from the public surface.
    pub(crate) fn table(&self) -> &[Complex<T>] {
        self.table.as_deref().unwrap()
    }
}

fn full_table<T: Float>(n: usize, sign: Sign, acc: Accuracy) -> Vec<Complex<T>> {
    let sgn = sign.as_int() as f64;
    let mut table = Vec::with_capacity(n);
    match acc {
        Accuracy::Sincos => {
            for j in 0..n {
                table.push(root_of_unity::<T>(sgn, j as f64, n as f64));
            }
        }
        Accuracy::Sqrtn => {
            // iterative rotation, reseeded from sincos every sqrt(n) steps
            // so the accumulated error stays O(sqrt(n) * eps)
            let reseed = isqrt(n) + 1;
            let step = Complex::<T>::expi(T::from_f64(sgn * 2.0 * core::f64::consts::PI / n as f64));
            let mut w = Complex::new(T::one(), T::zero());
            for j in 0..n {
                if j % reseed == 0 {
                    w = root_of_unity::<T>(sgn, j as f64, n as f64);
                }
                table.push(w);
                w = w.mul(step);
            }
        }
    }
    table
}

fn chirp_table<T: Float>(n: usize, sign: Sign) -> Vec<Complex<T>> {
    let sgn = sign.as_int() as f64;
    let mut table = Vec::with_capacity(n);
    for j in 0..n {
        // exp(sign * pi*i * j^2 / n); j^2 reduced mod 2n before the divide
        let sq = (j * j) % (2 * n);
        let theta = sgn * core::f64::consts::PI * sq as f64 / n as f64;
        let (s, c) = <f64 as Float>::sin_cos(theta);
        table.push(Complex::new(T::from_f64(c), T::from_f64(s)));
    }
    table
}

/// Rader multipliers: `omega[t] = 1/(n-1) * sum_r b_r exp(-2*pi*i r t/(n-1))`
/// with `b_r = exp(sign * 2*pi*i * g^{-r} / n)`. Computed naively; this is
/// one-time awake work and `n` is a prime small enough to have been planned.
fn omega_table<T: Float>(n: usize, sign: Sign, root: usize) -> Vec<Complex<T>> {
    let nm1 = n - 1;
    let sgn = sign.as_int() as f64;
    let ginv = pow_mod(root as u64, (n - 2) as u64, n as u64);
    let mut b = Vec::with_capacity(nm1);
    let mut idx: u64 = 1;
    for _ in 0..nm1 {
        b.push(root_of_unity::<f64>(sgn, idx as f64, n as f64));
        idx = idx * ginv % n as u64;
    }
    let scale = 1.0 / nm1 as f64;
    let mut omega = Vec::with_capacity(nm1);
    for t in 0..nm1 {
        let mut acc = Complex::new(0.0f64, 0.0);
        for (r, br) in b.iter().enumerate() {
            let w = root_of_unity::<f64>(-1.0, (r * t % nm1) as f64, nm1 as f64);
            acc = acc.add(br.mul(w));
        }
        omega.push(Complex::new(
            T::from_f64(acc.re * scale),
            T::from_f64(acc.im * scale),
        ));
    }
    omega
}

/// `exp(sgn * 2*pi*i * j / n)` computed in f64 and narrowed.
fn root_of_unity<T: Float>(sgn: f64, j: f64, n: f64) -> Complex<T> {
    let theta = sgn * 2.0 * core::f64::consts::PI * j / n;
    let (s, c) = <f64 as Float>::sin_cos(theta);
    Complex::new(T::from_f64(c), T::from_f64(s))
}

pub(crate) fn pow_mod(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    let mut acc: u64 = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = (acc as u128 * base as u128 % modulus as u128) as u64;
        }
        base = (base as u128 * base as u128 % modulus as u128) as u64;
        exp >>= 1;
    }
    acc
}

fn isqrt(n: usize) -> usize {
    let mut r = 0usize;
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_shares_tables() {
        let mut reg = TwiddleRegistry::<f64>::new();
        let a = reg.get(16, TwiddleKind::Full(Sign::Forward), Accuracy::Sincos);
        let b = reg.get(16, TwiddleKind::Full(Sign::Forward), Accuracy::Sincos);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.len(), 1);
        drop(a);
        drop(b);
        reg.purge();
        assert_eq!(reg.len(), 0);
    }

    #[test]
    fn sqrtn_table_stays_close_to_sincos() {
        let n = 240;
        let fast = full_table::<f64>(n, Sign::Forward, Accuracy::Sqrtn);
        let exact = full_table::<f64>(n, Sign::Forward, Accuracy::Sincos);
        for (a, b) in fast.iter().zip(exact.iter()) {
            assert!((a.re - b.re).abs() < 1e-12);
            assert!((a.im - b.im).abs() < 1e-12);
        }
    }

    #[test]
    fn full_table_signs_are_conjugate() {
        let fwd = full_table::<f64>(8, Sign::Forward, Accuracy::Sincos);
        let bwd = full_table::<f64>(8, Sign::Backward, Accuracy::Sincos);
        for (f, b) in fwd.iter().zip(bwd.iter()) {
            assert!((f.re - b.re).abs() < 1e-15);
            assert!((f.im + b.im).abs() < 1e-15);
        }
    }

    #[test]
    fn pow_mod_matches_small_cases() {
        assert_eq!(pow_mod(2, 10, 1000), 24);
        assert_eq!(pow_mod(3, 0, 7), 1);
        assert_eq!(pow_mod(5, 3, 13), 125 % 13);
    }
}
