//! AVX2+FMA instantiations of the dot-product kernels.
//!
//! The safe wrappers are private and only reach callers through a
//! [`DotKernels`](super::DotKernels) table, which is built after the CPU
//! features have been detected.

use crate::doubledouble::DoubleDouble;
use crate::simd::F64x4;

#[target_feature(enable = "avx2,fma")]
unsafe fn dot_mul_add_avx2<const U: usize>(a: &[f64], b: &[f64]) -> f64 {
    super::dot_mul_add::<F64x4, U>(a, b)
}

#[target_feature(enable = "avx2,fma")]
unsafe fn dot_fma_avx2<const U: usize>(a: &[f64], b: &[f64]) -> f64 {
    super::dot_fma::<F64x4, U>(a, b)
}

#[target_feature(enable = "avx2,fma")]
unsafe fn dot_compensated_avx2<const U: usize>(a: &[f64], b: &[f64]) -> DoubleDouble {
    super::dot_compensated::<F64x4, U>(a, b)
}

pub(super) fn dot_mul_add<const U: usize>(a: &[f64], b: &[f64]) -> f64 {
    // SAFETY: only handed out by tables built with AVX2 and FMA detected.
    unsafe { dot_mul_add_avx2::<U>(a, b) }
}

pub(super) fn dot_fma<const U: usize>(a: &[f64], b: &[f64]) -> f64 {
    // SAFETY: only handed out by tables built with AVX2 and FMA detected.
    unsafe { dot_fma_avx2::<U>(a, b) }
}

pub(super) fn dot_compensated<const U: usize>(a: &[f64], b: &[f64]) -> DoubleDouble {
    // SAFETY: only handed out by tables built with AVX2 and FMA detected.
    unsafe { dot_compensated_avx2::<U>(a, b) }
}
