//! MPFR ground truth for accuracy tests.
//!
//! Only compiled with the `mpfr` feature. Nothing in the kernels depends on
//! it.

use rug::Float;

use crate::doubledouble::DoubleDouble;

/// Working precision in bits. Any sum of `f64` values or of products of two
/// `f64` values is exact at this precision: a product spans at most
/// 2 × 1074 + 2 × 1024 bits of exponent range.
pub const PRECISION: u32 = 4400;

/// `hi + lo` exactly.
pub fn exact(x: DoubleDouble) -> Float {
    Float::with_val(PRECISION, x.hi) + x.lo
}

/// Sum of `values`, exactly.
pub fn exact_sum(values: &[f64]) -> Float {
    values
        .iter()
        .fold(Float::with_val(PRECISION, 0), |acc, &x| acc + x)
}

/// `sum(a[i] * b[i])`, exactly.
///
/// # Panics
///
/// Panics if `a` and `b` have different lengths.
pub fn exact_dot(a: &[f64], b: &[f64]) -> Float {
    assert_eq!(a.len(), b.len(), "dot: length mismatch");
    a.iter().zip(b).fold(Float::with_val(PRECISION, 0), |acc, (&x, &y)| {
        acc + Float::with_val(PRECISION, x) * y
    })
}

/// `|(hi + lo) - reference| / |reference|`, rounded to `f64`.
///
/// A zero reference gives 0 for an exact answer and infinity otherwise.
pub fn relative_error(reference: &Float, hi: f64, lo: f64) -> f64 {
    let error = (Float::with_val(PRECISION, hi) + lo - reference).abs();
    if reference.is_zero() {
        return if error.is_zero() { 0.0 } else { f64::INFINITY };
    }
    (error / reference.clone().abs()).to_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_keeps_both_parts() {
        let x = DoubleDouble::new(1.0, 2f64.powi(-100));
        let expected = Float::with_val(PRECISION, 1) + Float::with_val(PRECISION, 2f64.powi(-100));
        assert_eq!(exact(x), expected);
    }

    #[test]
    fn test_exact_dot_cancellation() {
        let r = exact_dot(&[1e300, 1.0, -1e300], &[1e10, 1e-300, 1e10]);
        assert_eq!(r.to_f64(), 1e-300);
    }

    #[test]
    fn test_relative_error() {
        let r = exact_sum(&[1.0, 2f64.powi(-80)]);
        assert_eq!(relative_error(&r, 1.0, 2f64.powi(-80)), 0.0);
        let e = relative_error(&r, 1.0, 0.0);
        assert!(e > 0.9 * 2f64.powi(-80) && e < 1.1 * 2f64.powi(-80));
        assert_eq!(relative_error(&Float::with_val(PRECISION, 0), 0.0, 0.0), 0.0);
        assert!(relative_error(&Float::with_val(PRECISION, 0), 1e-300, 0.0).is_infinite());
    }
}
