//! Portable fixed-width lane arrays.

use std::ops::{Add, Mul, Neg, Sub};

use super::Lanes;

/// `N` lanes of `f64` stored as a plain array.
///
/// All operations are written lane by lane and left to the autovectorizer.
/// Inside a function compiled with AVX2+FMA enabled, `F64x4` arithmetic lowers
/// to single `ymm` instructions.
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(transparent)]
pub struct F64x<const N: usize>(pub [f64; N]);

pub type F64x2 = F64x<2>;
pub type F64x4 = F64x<4>;
pub type F64x8 = F64x<8>;

impl<const N: usize> Add for F64x<N> {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] + rhs.0[i]))
    }
}

impl<const N: usize> Sub for F64x<N> {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] - rhs.0[i]))
    }
}

impl<const N: usize> Mul for F64x<N> {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i] * rhs.0[i]))
    }
}

impl<const N: usize> Neg for F64x<N> {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self {
        Self(self.0.map(|x| -x))
    }
}

impl<const N: usize> Lanes for F64x<N> {
    const WIDTH: usize = N;

    #[inline(always)]
    fn splat(x: f64) -> Self {
        Self([x; N])
    }

    #[inline(always)]
    fn load(src: &[f64]) -> Self {
        let src = &src[..N];
        Self(std::array::from_fn(|i| src[i]))
    }

    #[inline(always)]
    fn store(self, dst: &mut [f64]) {
        dst[..N].copy_from_slice(&self.0);
    }

    #[inline(always)]
    fn from_lanes(f: impl FnMut(usize) -> f64) -> Self {
        Self(std::array::from_fn(f))
    }

    #[inline(always)]
    fn lane(self, index: usize) -> f64 {
        self.0[index]
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        Self(std::array::from_fn(|i| self.0[i].mul_add(b.0[i], c.0[i])))
    }
}
