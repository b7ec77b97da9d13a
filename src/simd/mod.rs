//! Lane backends for the double-double kernels.
//!
//! Every kernel in this crate is generic over [`Lanes`], a fixed-width bundle
//! of `f64` values. `f64` itself is the width-1 backend. [`F64x`] provides
//! portable wide backends that the compiler vectorizes for whatever target
//! features the build enables.
//!
//! [`Backend`] names the combinations the kernel tables are built for:
//! - `Scalar`: `f64`, one lane
//! - `Portable`: `F64x4`, compiled with the build's baseline features
//! - `Avx2Fma`: `F64x4`, instantiated under `#[target_feature(enable = "avx2,fma")]`
//!   (x86-64 only, selected after runtime detection)

use std::ops::{Add, Mul, Neg, Sub};

mod portable;

pub use portable::{F64x, F64x2, F64x4, F64x8};

/// A fixed number of `f64` lanes with IEEE lane-wise arithmetic.
///
/// `mul_add` must round once (a true fused multiply-add). Every error-free
/// transformation in [`crate::eft`] depends on it.
pub trait Lanes:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + Neg<Output = Self>
{
    /// Number of `f64` lanes.
    const WIDTH: usize;

    fn splat(x: f64) -> Self;

    /// Loads `WIDTH` consecutive values from the front of `src`.
    fn load(src: &[f64]) -> Self;

    /// Stores `WIDTH` consecutive values to the front of `dst`.
    fn store(self, dst: &mut [f64]);

    /// Builds a vector lane by lane.
    fn from_lanes(f: impl FnMut(usize) -> f64) -> Self;

    fn lane(self, index: usize) -> f64;

    /// `self * b + c` with a single rounding.
    fn mul_add(self, b: Self, c: Self) -> Self;

    /// Sums the lanes left to right.
    #[inline(always)]
    fn reduce_add(self) -> f64 {
        let mut sum = self.lane(0);
        for i in 1..Self::WIDTH {
            sum += self.lane(i);
        }
        sum
    }
}

impl Lanes for f64 {
    const WIDTH: usize = 1;

    #[inline(always)]
    fn splat(x: f64) -> Self {
        x
    }

    #[inline(always)]
    fn load(src: &[f64]) -> Self {
        src[0]
    }

    #[inline(always)]
    fn store(self, dst: &mut [f64]) {
        dst[0] = self;
    }

    #[inline(always)]
    fn from_lanes(mut f: impl FnMut(usize) -> f64) -> Self {
        f(0)
    }

    #[inline(always)]
    fn lane(self, index: usize) -> f64 {
        debug_assert_eq!(index, 0, "scalar backend has a single lane");
        self
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        f64::mul_add(self, b, c)
    }

    #[inline(always)]
    fn reduce_add(self) -> f64 {
        self
    }
}

/// Kernel backend: a lane width plus the instruction set it is compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    Scalar,
    Portable,
    Avx2Fma,
}

impl Backend {
    /// Every backend, in table order.
    pub const ALL: [Backend; 3] = [Backend::Scalar, Backend::Portable, Backend::Avx2Fma];

    /// Picks the fastest backend the running CPU supports (AVX2+FMA > scalar).
    ///
    /// `Portable` is never picked automatically: without hardware FMA its
    /// `mul_add` lowers to a libm call per lane.
    pub fn detect() -> Self {
        let backend = if Backend::Avx2Fma.is_available() {
            Backend::Avx2Fma
        } else {
            Backend::Scalar
        };
        tracing::debug!(?backend, width = backend.width(), "detected kernel backend");
        backend
    }

    /// Whether kernels for this backend may run on the current CPU.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Scalar | Backend::Portable => true,
            Backend::Avx2Fma => avx2_fma_detected(),
        }
    }

    /// Backends usable on the current CPU.
    pub fn available() -> impl Iterator<Item = Backend> {
        Self::ALL.into_iter().filter(|b| b.is_available())
    }

    /// Number of `f64` lanes the backend's kernels process per vector.
    pub const fn width(self) -> usize {
        match self {
            Backend::Scalar => <f64 as Lanes>::WIDTH,
            Backend::Portable | Backend::Avx2Fma => <F64x4 as Lanes>::WIDTH,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Portable => "portable",
            Backend::Avx2Fma => "avx2+fma",
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn avx2_fma_detected() -> bool {
    is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
}

#[cfg(not(target_arch = "x86_64"))]
fn avx2_fma_detected() -> bool {
    false
}
