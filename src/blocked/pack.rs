//! Panel packing for the double-double microkernels.
//!
//! A panels are split into head and tail planes per row group of `width`
//! rows, so the kernel loads `width` heads and `width` tails with two
//! contiguous vector loads. B panels keep whole double-doubles, `nr` per
//! reduction step.

use crate::doubledouble::DoubleDouble;

/// Packs rows `row..row + mr`, columns `col..col + kc` of a row-major
/// double-double matrix with `lda` columns into the microkernel A layout.
///
/// `out[2*p*mr + g*2*width + lane]` receives the head of
/// `a[(row + g*width + lane) * lda + col + p]`, and the tail goes `width`
/// slots later.
///
/// # Panics
///
/// Panics if `mr` is not a multiple of `width` or `out` is shorter than
/// `2 * kc * mr`.
#[allow(clippy::too_many_arguments)]
pub fn pack_a(
    a: &[DoubleDouble],
    lda: usize,
    row: usize,
    col: usize,
    mr: usize,
    kc: usize,
    width: usize,
    out: &mut [f64],
) {
    pack_a_with(lda, row, col, mr, kc, width, out, |i| a[i]);
}

/// [`pack_a`] for a plain `f64` matrix: every value is promoted to a
/// double-double with a zero tail.
#[allow(clippy::too_many_arguments)]
pub fn pack_a_f64(
    a: &[f64],
    lda: usize,
    row: usize,
    col: usize,
    mr: usize,
    kc: usize,
    width: usize,
    out: &mut [f64],
) {
    pack_a_with(lda, row, col, mr, kc, width, out, |i| DoubleDouble::from(a[i]));
}

#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn pack_a_with(
    lda: usize,
    row: usize,
    col: usize,
    mr: usize,
    kc: usize,
    width: usize,
    out: &mut [f64],
    value: impl Fn(usize) -> DoubleDouble,
) {
    assert_eq!(mr % width, 0, "mr={} is not a multiple of width={}", mr, width);
    let out = &mut out[..2 * kc * mr];

    for (p, step) in out.chunks_exact_mut(2 * mr).enumerate() {
        for (g, group) in step.chunks_exact_mut(2 * width).enumerate() {
            let (heads, tails) = group.split_at_mut(width);
            for lane in 0..width {
                let x = value((row + g * width + lane) * lda + col + p);
                heads[lane] = x.hi;
                tails[lane] = x.lo;
            }
        }
    }
}

/// Packs rows `row..row + kc`, columns `col..col + nr` of a row-major
/// matrix with `ldb` columns into `out[p*nr + j]`.
pub fn pack_b(
    b: &[DoubleDouble],
    ldb: usize,
    row: usize,
    col: usize,
    nr: usize,
    kc: usize,
    out: &mut [DoubleDouble],
) {
    for (p, step) in out[..kc * nr].chunks_exact_mut(nr).enumerate() {
        let start = (row + p) * ldb + col;
        step.copy_from_slice(&b[start..start + nr]);
    }
}
