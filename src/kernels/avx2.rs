//! AVX2+FMA instantiations of the GEMM microkernel.

use crate::doubledouble::DoubleDouble;
use crate::simd::F64x4;

#[target_feature(enable = "avx2,fma")]
unsafe fn ddgemm_avx2<const G: usize, const NR: usize>(
    kc: usize,
    a: &[f64],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
) {
    super::ddgemm::ddgemm::<F64x4, G, NR>(kc, a, b, c)
}

pub(super) fn ddgemm<const G: usize, const NR: usize>(
    kc: usize,
    a: &[f64],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
) {
    // SAFETY: only reachable through a `KernelTable` built for `Backend::Avx2Fma`,
    // which requires AVX2 and FMA to be detected first.
    unsafe { ddgemm_avx2::<G, NR>(kc, a, b, c) }
}
