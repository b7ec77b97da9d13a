//! Dot products in three accuracy tiers.
//!
//! Every kernel keeps `U` independent accumulator chains of `V::WIDTH` lanes
//! each, so up to `U` multiply-accumulates are in flight at once. At the end
//! the chains are combined pairwise, the lanes are summed, and the elements
//! that did not fill a whole `U * V::WIDTH` block are folded in one by one.
//!
//! - [`dot_mul_add`]: `acc + a * b`, two roundings per term
//! - [`dot_fma`]: `fma(a, b, acc)`, one rounding per term
//! - [`dot_compensated`]: exact products accumulated in double-double
//!
//! [`DotKernels`] tabulates all three tiers for unroll factors
//! `UNROLL_MIN..=UNROLL_MAX` on a given [`Backend`].

#[cfg(target_arch = "x86_64")]
mod avx2;

use crate::doubledouble::{DoubleDouble, dd_add, dd_mul_single};
use crate::simd::{Backend, F64x4, Lanes};

pub const UNROLL_MIN: usize = 1;
pub const UNROLL_MAX: usize = 8;

pub type DotFn = fn(&[f64], &[f64]) -> f64;
pub type CompensatedDotFn = fn(&[f64], &[f64]) -> DoubleDouble;

/// Combines `acc[0..U]` as a balanced tree: neighbours first, then pairs of
/// pairs, and so on.
#[inline(always)]
fn reduce_pairwise<T: Copy, const U: usize>(mut acc: [T; U], combine: impl Fn(T, T) -> T) -> T {
    let mut stride = 1;
    while stride < U {
        let mut i = 0;
        while i + stride < U {
            acc[i] = combine(acc[i], acc[i + stride]);
            i += 2 * stride;
        }
        stride *= 2;
    }
    acc[0]
}

/// Dot product with a separate multiply and add per term.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
#[inline(always)]
pub fn dot_mul_add<V: Lanes, const U: usize>(a: &[f64], b: &[f64]) -> f64 {
    const { assert!(U > 0, "unroll factor must be positive") };
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let block = U * V::WIDTH;
    let main = a.len() - a.len() % block;

    let mut acc = [V::splat(0.0); U];
    for (a_block, b_block) in a[..main]
        .chunks_exact(block)
        .zip(b[..main].chunks_exact(block))
    {
        for (u, acc) in acc.iter_mut().enumerate() {
            let x = V::load(&a_block[u * V::WIDTH..]);
            let y = V::load(&b_block[u * V::WIDTH..]);
            *acc = *acc + x * y;
        }
    }

    let mut sum = reduce_pairwise(acc, |x, y| x + y).reduce_add();
    for (&x, &y) in a[main..].iter().zip(&b[main..]) {
        sum += x * y;
    }
    sum
}

/// Dot product with a fused multiply-add per term.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
#[inline(always)]
pub fn dot_fma<V: Lanes, const U: usize>(a: &[f64], b: &[f64]) -> f64 {
    const { assert!(U > 0, "unroll factor must be positive") };
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let block = U * V::WIDTH;
    let main = a.len() - a.len() % block;

    let mut acc = [V::splat(0.0); U];
    for (a_block, b_block) in a[..main]
        .chunks_exact(block)
        .zip(b[..main].chunks_exact(block))
    {
        for (u, acc) in acc.iter_mut().enumerate() {
            let x = V::load(&a_block[u * V::WIDTH..]);
            let y = V::load(&b_block[u * V::WIDTH..]);
            *acc = x.mul_add(y, *acc);
        }
    }

    let mut sum = reduce_pairwise(acc, |x, y| x + y).reduce_add();
    for (&x, &y) in a[main..].iter().zip(&b[main..]) {
        sum = x.mul_add(y, sum);
    }
    sum
}

/// Dot product accumulated in double-double.
///
/// Each term is formed exactly with [`dd_mul_single`] and added with
/// [`dd_add`]. The relative error is a small multiple of `eps^2` unless the
/// sum cancels almost completely.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
#[inline(always)]
pub fn dot_compensated<V: Lanes, const U: usize>(a: &[f64], b: &[f64]) -> DoubleDouble {
    const { assert!(U > 0, "unroll factor must be positive") };
    assert_eq!(a.len(), b.len(), "dot: length mismatch");

    let block = U * V::WIDTH;
    let main = a.len() - a.len() % block;

    let mut acc = [DoubleDouble::<V>::zero(); U];
    for (a_block, b_block) in a[..main]
        .chunks_exact(block)
        .zip(b[..main].chunks_exact(block))
    {
        for (u, acc) in acc.iter_mut().enumerate() {
            let x = V::load(&a_block[u * V::WIDTH..]);
            let y = V::load(&b_block[u * V::WIDTH..]);
            *acc = dd_add(*acc, dd_mul_single(x, y));
        }
    }

    let mut sum = reduce_pairwise(acc, dd_add).reduce_add();
    for (&x, &y) in a[main..].iter().zip(&b[main..]) {
        sum = dd_add(sum, dd_mul_single(x, y));
    }
    sum
}

macro_rules! unrolled {
    ($($f:ident)::+, $v:ty) => {
        [
            $($f)::+::<$v, 1>,
            $($f)::+::<$v, 2>,
            $($f)::+::<$v, 3>,
            $($f)::+::<$v, 4>,
            $($f)::+::<$v, 5>,
            $($f)::+::<$v, 6>,
            $($f)::+::<$v, 7>,
            $($f)::+::<$v, 8>,
        ]
    };
    ($($f:ident)::+) => {
        [
            $($f)::+::<1>,
            $($f)::+::<2>,
            $($f)::+::<3>,
            $($f)::+::<4>,
            $($f)::+::<5>,
            $($f)::+::<6>,
            $($f)::+::<7>,
            $($f)::+::<8>,
        ]
    };
}

/// All dot-product kernels of one backend, indexed by unroll factor.
#[derive(Clone, Debug)]
pub struct DotKernels {
    backend: Backend,
    mul_add: [DotFn; UNROLL_MAX],
    fma: [DotFn; UNROLL_MAX],
    compensated: [CompensatedDotFn; UNROLL_MAX],
}

impl DotKernels {
    /// Builds the table for `backend`, or `None` if the running CPU cannot
    /// execute its kernels.
    pub fn new(backend: Backend) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }

        let kernels = match backend {
            Backend::Scalar => Self::generic::<f64>(backend),
            Backend::Portable => Self::generic::<F64x4>(backend),
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2Fma => Self {
                backend,
                mul_add: unrolled!(avx2::dot_mul_add),
                fma: unrolled!(avx2::dot_fma),
                compensated: unrolled!(avx2::dot_compensated),
            },
            #[cfg(not(target_arch = "x86_64"))]
            Backend::Avx2Fma => return None,
        };
        tracing::debug!(backend = backend.name(), "built dot-product kernel table");
        Some(kernels)
    }

    /// Table for the best backend of the running CPU.
    pub fn detect() -> Self {
        match Self::new(Backend::detect()) {
            Some(kernels) => kernels,
            None => Self::generic::<f64>(Backend::Scalar),
        }
    }

    fn generic<V: Lanes>(backend: Backend) -> Self {
        Self {
            backend,
            mul_add: unrolled!(dot_mul_add, V),
            fma: unrolled!(dot_fma, V),
            compensated: unrolled!(dot_compensated, V),
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn mul_add(&self, unroll: usize) -> Option<DotFn> {
        Self::index(unroll).map(|i| self.mul_add[i])
    }

    pub fn fma(&self, unroll: usize) -> Option<DotFn> {
        Self::index(unroll).map(|i| self.fma[i])
    }

    pub fn compensated(&self, unroll: usize) -> Option<CompensatedDotFn> {
        Self::index(unroll).map(|i| self.compensated[i])
    }

    fn index(unroll: usize) -> Option<usize> {
        (UNROLL_MIN..=UNROLL_MAX)
            .contains(&unroll)
            .then(|| unroll - UNROLL_MIN)
    }
}
