//! Error-free transformations.
//!
//! Each function returns the rounded result of a floating-point operation
//! together with the rounding error(s), so that the outputs sum exactly to the
//! mathematical result. All of them are branch-free and generic over
//! [`Lanes`], so the same code serves scalars and whole vectors.
//!
//! Round-to-nearest is assumed throughout.

use crate::simd::Lanes;

/// `a + b` split into `(round(a + b), error)`.
///
/// Works for any operand order. The error is zero whenever `a + b` is exactly
/// representable, and never exceeds half an ulp of the sum.
#[inline(always)]
pub fn two_sum<V: Lanes>(a: V, b: V) -> (V, V) {
    let sum = a + b;
    let b_virtual = sum - a;
    let a_virtual = sum - b_virtual;
    let b_roundoff = b - b_virtual;
    let a_roundoff = a - a_virtual;
    (sum, a_roundoff + b_roundoff)
}

/// `a + b` split into `(round(a + b), error)`, assuming `|a| >= |b|`.
///
/// Three operations instead of six. The ordering is not checked: with
/// `|a| < |b|` the error term is silently wrong.
#[inline(always)]
pub fn two_sum_ordered<V: Lanes>(a: V, b: V) -> (V, V) {
    let sum = a + b;
    let b_virtual = sum - a;
    (sum, b - b_virtual)
}

/// `a * b` split into `(round(a * b), error)`.
///
/// The error is recovered with a single-rounding fused multiply-add, which is
/// exact as long as the product does not underflow.
#[inline(always)]
pub fn two_product<V: Lanes>(a: V, b: V) -> (V, V) {
    let product = a * b;
    (product, a.mul_add(b, -product))
}

/// `a * b + c` split into `(fma(a, b, c), error_hi, error_lo)`.
///
/// The three outputs sum exactly to `a * b + c`, `|error_lo| <= |error_hi|`,
/// and together the errors stay within half an ulp of the head. This holds
/// under cancellation between `a * b` and `c` too.
#[inline(always)]
pub fn two_fma<V: Lanes>(a: V, b: V, c: V) -> (V, V, V) {
    let head = a.mul_add(b, c);
    let (product, product_error) = two_product(a, b);
    let (alpha_hi, alpha_lo) = two_sum(c, product_error);
    let (beta_hi, beta_lo) = two_sum(product, alpha_hi);
    let gamma = (beta_hi - head) + beta_lo;
    let (error_hi, error_lo) = two_sum_ordered(gamma, alpha_lo);
    (head, error_hi, error_lo)
}

/// Distance from `x` to the next double away from zero.
///
/// Zero gives the smallest subnormal and non-finite input gives NaN.
pub fn ulp(x: f64) -> f64 {
    if x == 0.0 {
        return f64::from_bits(1);
    }
    if !x.is_finite() {
        return f64::NAN;
    }
    let next = if x.is_sign_negative() {
        x.next_down()
    } else {
        x.next_up()
    };
    (next - x).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::F64x;
    use proptest::prelude::*;

    #[test]
    fn test_ulp() {
        assert_eq!(ulp(1.0), f64::EPSILON);
        assert_eq!(ulp(-1.0), f64::EPSILON);
        assert_eq!(ulp(0.75), f64::EPSILON / 2.0);
        assert_eq!(ulp(0.0), f64::from_bits(1));
        assert!(ulp(f64::INFINITY).is_nan());
    }

    #[test]
    fn test_two_sum_exact_case_has_zero_tail() {
        assert_eq!(two_sum(1.0, 2.0), (3.0, 0.0));
        assert_eq!(two_sum(0.5, -0.25), (0.25, 0.0));
    }

    #[test]
    fn test_two_sum_recovers_lost_bits() {
        let (s, e) = two_sum(1.0, 1e-20);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-20);

        // Operands in the "wrong" order still work for the general version.
        let (s, e) = two_sum(1e-20, 1.0);
        assert_eq!(s, 1.0);
        assert_eq!(e, 1e-20);
    }

    #[test]
    fn test_two_sum_ordered_matches_two_sum_when_ordered() {
        let pairs = [(3.0, 1e-17), (-7.5, 2.0f64.powi(-60)), (1e300, -1e280)];
        for (a, b) in pairs {
            assert_eq!(two_sum_ordered(a, b), two_sum(a, b));
        }
    }

    #[test]
    fn test_two_product_tail() {
        let x = 1.0 + 2f64.powi(-30);
        let (p, e) = two_product(x, x);
        assert_eq!(p, 1.0 + 2f64.powi(-29));
        assert_eq!(e, 2f64.powi(-60));
    }

    #[test]
    fn test_two_fma_cancellation() {
        // a*b and c cancel down to the bits only the product error carries.
        let x = 1.0 + 2f64.powi(-30);
        let (h, e_hi, e_lo) = two_fma(x, x, -(1.0 + 2f64.powi(-29)));
        assert_eq!(h, 2f64.powi(-60));
        assert_eq!(e_hi, 0.0);
        assert_eq!(e_lo, 0.0);
    }

    #[test]
    fn test_two_fma_head_is_fma() {
        let (a, b, c) = (0.1, 0.2, 0.3);
        let (h, e_hi, e_lo) = two_fma(a, b, c);
        assert_eq!(h, a.mul_add(b, c));
        assert!(e_lo.abs() <= e_hi.abs());
        assert!((e_hi + e_lo).abs() <= 0.5 * ulp(h));
    }

    #[test]
    fn test_vector_lanes_match_scalar() {
        let a = F64x::<4>([1.0, 0.1, -3.5, 1e16]);
        let b = F64x::<4>([1e-20, 0.7, 2.25, 1.0]);
        let (s, e) = two_sum(a, b);
        let (p, pe) = two_product(a, b);
        for i in 0..4 {
            assert_eq!((s.0[i], e.0[i]), two_sum(a.0[i], b.0[i]));
            assert_eq!((p.0[i], pe.0[i]), two_product(a.0[i], b.0[i]));
        }
    }

    fn finite() -> impl Strategy<Value = f64> {
        (-1.0e150..1.0e150f64).prop_filter("finite", |x| x.is_finite())
    }

    proptest! {
        #[test]
        fn ptest_two_sum_head_is_rounded_sum(a in finite(), b in finite()) {
            let (s, e) = two_sum(a, b);
            prop_assert_eq!(s, a + b);
            prop_assert!(e.abs() <= 0.5 * ulp(s));
        }

        #[test]
        fn ptest_two_sum_ordered_head(x in finite(), y in finite()) {
            let (a, b) = if x.abs() >= y.abs() { (x, y) } else { (y, x) };
            let (s, e) = two_sum_ordered(a, b);
            prop_assert_eq!(s, a + b);
            prop_assert!(e.abs() <= 0.5 * ulp(s));
            prop_assert_eq!(e, two_sum(a, b).1);
        }

        #[test]
        fn ptest_two_product_head(a in -1.0e100..1.0e100f64, b in -1.0e100..1.0e100f64) {
            let (p, e) = two_product(a, b);
            prop_assert_eq!(p, a * b);
            prop_assert!(e.abs() <= 0.5 * ulp(p));
        }

        #[test]
        fn ptest_two_fma_error_ordering(a in 0.0..1.0f64, b in 0.0..1.0f64, c in 0.0..1.0f64) {
            let (h, e_hi, e_lo) = two_fma(a, b, c);
            prop_assert_eq!(h, a.mul_add(b, c));
            prop_assert!(e_lo.abs() <= e_hi.abs());
            prop_assert!((e_hi + e_lo).abs() <= 0.5 * ulp(h));
        }

        #[test]
        fn ptest_deterministic(a in finite(), b in finite()) {
            prop_assert_eq!(two_sum(a, b), two_sum(a, b));
            prop_assert_eq!(two_product(a, b).0.to_bits(), two_product(a, b).0.to_bits());
        }
    }
}
