//! Double-double GEMM microkernel.

use crate::doubledouble::{DoubleDouble, dd_add, dd_mul};
use crate::simd::Lanes;

/// Computes an mr×NR tile: C += A_packed × B_packed, with mr = G × V::WIDTH.
///
/// The tile is held in G × NR double-double vector accumulators for the
/// whole kc loop and added into C once at the end, so every cell sees one
/// rounding sequence regardless of how C was initialized.
///
/// Layouts (W = `V::WIDTH`):
/// - `a`: `2 * kc * mr` doubles. For step `k` and row group `g`, the W heads
///   are at `a[2*k*mr + g*2*W ..][..W]` and the W tails follow them.
/// - `b`: `kc * NR` double-doubles, `b[k*NR + n]`.
/// - `c`: `mr * NR` double-doubles, column-major, `c[n*mr + m]`.
///
/// With `kc == 0` C is left untouched.
///
/// # Panics
///
/// Panics if `a` or `b` is shorter than the layout above, or if `c` does
/// not hold exactly `mr * NR` values.
#[inline(always)]
pub fn ddgemm<V: Lanes, const G: usize, const NR: usize>(
    kc: usize,
    a: &[f64],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
) {
    const { assert!(G > 0 && NR > 0, "empty tile") };
    let w = V::WIDTH;
    let mr = G * w;
    assert_eq!(c.len(), mr * NR, "C: expected {}x{} tile", mr, NR);
    if kc == 0 {
        return;
    }

    let a = &a[..2 * kc * mr];
    let b = &b[..kc * NR];

    let mut acc = [[DoubleDouble::<V>::zero(); NR]; G];
    for (a_k, b_k) in a.chunks_exact(2 * mr).zip(b.chunks_exact(NR)) {
        let a_groups: [DoubleDouble<V>; G] = std::array::from_fn(|g| {
            let group = &a_k[g * 2 * w..];
            DoubleDouble::new(V::load(group), V::load(&group[w..]))
        });

        for (n, &b_kn) in b_k.iter().enumerate() {
            let b_kn = DoubleDouble::<V>::splat(b_kn);
            for (acc_g, &a_g) in acc.iter_mut().zip(&a_groups) {
                acc_g[n] = dd_add(acc_g[n], dd_mul(a_g, b_kn));
            }
        }
    }

    for n in 0..NR {
        for (g, acc_g) in acc.iter().enumerate() {
            let cell = &mut c[n * mr + g * w..];
            let sum = dd_add(DoubleDouble::<V>::load_deinterleaved(cell), acc_g[n]);
            sum.store_interleaved(cell);
        }
    }
}
