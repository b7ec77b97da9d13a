//! Double-double arithmetic.
//!
//! A [`DoubleDouble`] is the unevaluated sum `hi + lo` of two lane values,
//! giving roughly 106 bits of significand. Operations are composed from the
//! error-free transformations in [`crate::eft`] and are generic over the lane
//! width, so `DoubleDouble<F64x4>` carries four independent double-double
//! numbers in two vectors.
//!
//! Results of [`dd_add_single`] and [`dd_mul_single`] are always normalized
//! (`|lo| <= ulp(hi) / 2`). The other operations finish with a renormalization
//! too, but their head is only as good as their error bound.

mod chain;

use std::ops::{Add, Mul, Neg};

use crate::eft::{two_product, two_sum, two_sum_ordered};
use crate::simd::Lanes;

pub use chain::{add_assign_all, mul_assign_all, product, sum};

/// Unevaluated sum of two lane values.
///
/// No equality or ordering is defined: compare `hi` and `lo` explicitly, or
/// convert to an arbitrary-precision reference.
#[derive(Clone, Copy, Debug, Default)]
#[repr(C)]
pub struct DoubleDouble<V = f64> {
    pub hi: V,
    pub lo: V,
}

impl<V: Lanes> DoubleDouble<V> {
    #[inline(always)]
    pub fn new(hi: V, lo: V) -> Self {
        Self { hi, lo }
    }

    #[inline(always)]
    pub fn zero() -> Self {
        Self::new(V::splat(0.0), V::splat(0.0))
    }

    /// Broadcasts one scalar double-double to every lane.
    #[inline(always)]
    pub fn splat(x: DoubleDouble) -> Self {
        Self::new(V::splat(x.hi), V::splat(x.lo))
    }

    /// Builds a vector double-double lane by lane.
    ///
    /// `f` is called twice per lane and must return the same value both times.
    #[inline(always)]
    pub fn from_lanes(mut f: impl FnMut(usize) -> DoubleDouble) -> Self {
        let hi = V::from_lanes(|i| f(i).hi);
        let lo = V::from_lanes(|i| f(i).lo);
        Self::new(hi, lo)
    }

    #[inline(always)]
    pub fn lane(self, index: usize) -> DoubleDouble {
        DoubleDouble::new(self.hi.lane(index), self.lo.lane(index))
    }

    /// Loads `V::WIDTH` consecutive double-doubles from interleaved storage.
    #[inline(always)]
    pub fn load_deinterleaved(src: &[DoubleDouble]) -> Self {
        let src = &src[..V::WIDTH];
        Self::new(
            V::from_lanes(|i| src[i].hi),
            V::from_lanes(|i| src[i].lo),
        )
    }

    /// Stores the lanes as `V::WIDTH` consecutive interleaved double-doubles.
    #[inline(always)]
    pub fn store_interleaved(self, dst: &mut [DoubleDouble]) {
        for (i, slot) in dst[..V::WIDTH].iter_mut().enumerate() {
            *slot = self.lane(i);
        }
    }

    /// Sums the lanes in double-double arithmetic.
    #[inline(always)]
    pub fn reduce_add(self) -> DoubleDouble {
        let mut acc = self.lane(0);
        for i in 1..V::WIDTH {
            acc = dd_add(acc, self.lane(i));
        }
        acc
    }

    /// Folds `lo` into `hi` so that `|lo| <= ulp(hi) / 2`.
    ///
    /// Requires `|hi| >= |lo|`, which holds for every value this module
    /// produces.
    #[inline(always)]
    pub fn renormalize(self) -> Self {
        let (hi, lo) = two_sum_ordered(self.hi, self.lo);
        Self::new(hi, lo)
    }
}

impl DoubleDouble {
    /// Rounds to the nearest double (up to one rounding of `hi + lo`).
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }
}

impl From<f64> for DoubleDouble {
    #[inline]
    fn from(x: f64) -> Self {
        DoubleDouble::new(x, 0.0)
    }
}

/// `a + b` for two doubles, exactly.
#[inline(always)]
pub fn dd_add_single<V: Lanes>(a: V, b: V) -> DoubleDouble<V> {
    let (hi, lo) = two_sum(a, b);
    DoubleDouble::new(hi, lo)
}

/// `a * b` for two doubles, exactly (barring underflow).
#[inline(always)]
pub fn dd_mul_single<V: Lanes>(a: V, b: V) -> DoubleDouble<V> {
    let (hi, lo) = two_product(a, b);
    DoubleDouble::new(hi, lo)
}

/// Double-double addition.
///
/// Adds heads and tails separately with [`two_sum`] and renormalizes twice.
/// At least as accurate as double addition for every sign combination,
/// including cancellation between the heads.
#[inline(always)]
pub fn dd_add<V: Lanes>(a: DoubleDouble<V>, b: DoubleDouble<V>) -> DoubleDouble<V> {
    let (hi, lo) = two_sum(a.hi, b.hi);
    let (tail_hi, tail_lo) = two_sum(a.lo, b.lo);
    let sum = DoubleDouble::new(hi, lo + tail_hi).renormalize();
    DoubleDouble::new(sum.hi, sum.lo + tail_lo).renormalize()
}

/// Double-double addition, assuming `|a| >= |b|`.
///
/// Uses the ordered two-sum on the heads and a single renormalization. The
/// ordering is a caller contract: it is not checked, and breaking it gives a
/// silently wrong tail.
#[inline(always)]
pub fn dd_add_fast<V: Lanes>(a: DoubleDouble<V>, b: DoubleDouble<V>) -> DoubleDouble<V> {
    let (hi, lo) = two_sum_ordered(a.hi, b.hi);
    DoubleDouble::new(hi, lo + (a.lo + b.lo)).renormalize()
}

/// Double-double plus double.
#[inline(always)]
pub fn dd_add_wide<V: Lanes>(a: DoubleDouble<V>, b: V) -> DoubleDouble<V> {
    let (hi, lo) = two_sum(a.hi, b);
    DoubleDouble::new(hi, lo + a.lo).renormalize()
}

/// Double-double multiplication.
///
/// Exact product of the heads plus both cross terms, folded in with fused
/// multiply-adds. `a.lo * b.lo` is below the result's precision and dropped.
#[inline(always)]
pub fn dd_mul<V: Lanes>(a: DoubleDouble<V>, b: DoubleDouble<V>) -> DoubleDouble<V> {
    let (hi, lo) = two_product(a.hi, b.hi);
    let lo = a.lo.mul_add(b.hi, a.hi.mul_add(b.lo, lo));
    DoubleDouble::new(hi, lo).renormalize()
}

impl<V: Lanes> Add for DoubleDouble<V> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        dd_add(self, rhs)
    }
}

impl Add<f64> for DoubleDouble {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: f64) -> Self {
        dd_add_wide(self, rhs)
    }
}

impl<V: Lanes> Mul for DoubleDouble<V> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        dd_mul(self, rhs)
    }
}

impl<V: Lanes> Neg for DoubleDouble<V> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.hi, -self.lo)
    }
}
