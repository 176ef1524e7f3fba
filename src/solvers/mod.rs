//! The stock solver set, one module per strategy family.
//!
//! Shared geometry helpers live here: a dft problem lowers complex element
//! strides to `T` units by doubling, real problems keep theirs.

pub(crate) mod bluestein;
pub(crate) mod buffered;
pub(crate) mod ct;
pub(crate) mod direct;
pub(crate) mod generic;
pub(crate) mod indirect;
pub(crate) mod nop;
pub(crate) mod rader;
pub(crate) mod rank0;
pub(crate) mod rank_geq2;
pub(crate) mod rdft;
pub(crate) mod rdft2;
pub(crate) mod transpose;
pub(crate) mod vrank_geq1;

use crate::num::Float;
use crate::ops::OpCounts;
use crate::plan::VecLoop;
use crate::problem::{DftProblem, RdftProblem};
use crate::solver::SolverTable;
use crate::tensor::{Dim, Tensor};

pub(crate) fn register_all<T: Float + 'static>(table: &mut SolverTable<T>) {
    nop::register(table);
    direct::register(table);
    rank0::register(table);
    ct::register(table);
    rader::register(table);
    bluestein::register(table);
    generic::register(table);
    buffered::register(table);
    indirect::register(table);
    rank_geq2::register(table);
    vrank_geq1::register(table);
    rdft::register(table);
    rdft2::register(table);
    transpose::register(table);
}

/// 1-d complex geometry: the transform dim plus the vector loop lowered to
/// `T` units.
pub(crate) fn dft_1d_geometry(p: &DftProblem) -> Option<(Dim, VecLoop)> {
    if p.sz.rnk() != Some(1) {
        return None;
    }
    let d = p.sz.dims()[0];
    let (vl, ivs, ovs) = p.vecsz.tornk1()?;
    Some((
        d,
        VecLoop {
            vl,
            ivs: 2 * ivs,
            ovs: 2 * ovs,
        },
    ))
}

/// 1-d single-kind real geometry; strides are already in `T` units.
pub(crate) fn rdft_1d_geometry(p: &RdftProblem) -> Option<(Dim, VecLoop)> {
    if p.sz.rnk() != Some(1) || p.kinds.len() != 1 {
        return None;
    }
    let d = p.sz.dims()[0];
    let (vl, ivs, ovs) = p.vecsz.tornk1()?;
    Some((d, VecLoop { vl, ivs, ovs }))
}

/// Same tensor with both strides replaced by one side's.
pub(crate) fn restride(t: &Tensor, take_output: bool) -> Tensor {
    Tensor::new(
        t.dims()
            .iter()
            .map(|d| {
                let s = if take_output { d.os } else { d.is };
                Dim::new(d.n, s, s)
            })
            .collect(),
    )
}

pub(crate) fn without_dim(t: &Tensor, idx: usize) -> Tensor {
    Tensor::new(
        t.dims()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, d)| *d)
            .collect(),
    )
}

/// Rough cost of `k` complex multiply plus accumulate steps.
pub(crate) fn cmul_ops(k: f64) -> OpCounts {
    OpCounts::new(4.0 * k, 4.0 * k, 0.0, 0.0)
}

pub(crate) fn smallest_prime_factor(n: usize) -> Option<usize> {
    if n < 4 {
        return None;
    }
    if n % 2 == 0 {
        return Some(2);
    }
    let mut f = 3;
    while f * f <= n {
        if n % f == 0 {
            return Some(f);
        }
        f += 2;
    }
    None
}

pub(crate) fn is_prime(n: usize) -> bool {
    n >= 2 && smallest_prime_factor(n).is_none()
}
