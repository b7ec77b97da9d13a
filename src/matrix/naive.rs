use std::ops::Range;

use crate::doubledouble::{DoubleDouble, dd_add, dd_mul};

/// Double-double matrix multiplication using i-k-j loop order.
///
/// Every product is formed with [`dd_mul`] and added straight into C with
/// [`dd_add`]. This is the reference the blocked driver and the microkernel
/// table are checked against.
///
/// # Arguments
///
/// * `a` - Matrix A (m × k), row-major
/// * `b` - Matrix B (k × n), row-major
/// * `c` - Matrix C (m × n), row-major, accumulated into (C += A * B)
/// * `m` - Rows of A and C
/// * `n` - Columns of B and C
/// * `k` - Columns of A, rows of B
///
/// # Panics
///
/// Panics if the slice sizes don't match m, n, k.
pub fn ddgemm_naive(
    a: &[DoubleDouble],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
    m: usize,
    n: usize,
    k: usize,
) {
    assert_eq!(a.len(), m * k, "A: expected {}x{}={} elements", m, k, m * k);
    assert_eq!(b.len(), k * n, "B: expected {}x{}={} elements", k, n, k * n);
    assert_eq!(c.len(), m * n, "C: expected {}x{}={} elements", m, n, m * n);

    accumulate_block(a, b, c, n, k, 0..m, 0..n);
}

/// C[rows, cols] += A[rows, :] * B[:, cols], i-k-j order.
///
/// Used by the blocked driver for rows and columns left over after tiling.
pub(crate) fn accumulate_block(
    a: &[DoubleDouble],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
    n: usize,
    k: usize,
    rows: Range<usize>,
    cols: Range<usize>,
) {
    for i in rows {
        for p in 0..k {
            let a_ip = a[i * k + p];
            for j in cols.clone() {
                c[i * n + j] = dd_add(c[i * n + j], dd_mul(a_ip, b[p * n + j]));
            }
        }
    }
}
