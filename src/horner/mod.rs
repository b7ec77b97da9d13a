//! Horner evaluation of a fixed degree-15 polynomial.
//!
//! The polynomial exists to time the evaluation schemes, not to approximate
//! anything. Iterating `x = p(x)` makes every evaluation depend on the
//! previous one, so [`iterate`] measures latency.

use crate::eft::{two_product, two_sum};
use crate::simd::Lanes;

/// Coefficients `c0..=c15` of the benchmark polynomial, lowest degree first.
pub static COEFFICIENTS: [f64; 16] = [
    f64::from_bits(0x3fe7_8f18_7ab0_28a6),
    f64::from_bits(0x3f43_f5db_1c89_5000),
    f64::from_bits(0x3fc7_a26b_65c2_b4f0),
    f64::from_bits(0x3fcb_f60f_17a4_7170),
    f64::from_bits(0x3fe9_aab2_397b_c0cd),
    f64::from_bits(0x3fde_29e3_de72_e176),
    f64::from_bits(0x3fae_cbb9_a473_c660),
    f64::from_bits(0x3fe6_97d6_c121_8d5e),
    f64::from_bits(0x3fdd_d0cb_5bd6_c8c6),
    f64::from_bits(0x3f83_35b4_defa_4ac0),
    f64::from_bits(0x3fe7_bb63_e139_2fe5),
    f64::from_bits(0x3fe0_3785_a13a_5632),
    f64::from_bits(0x3fda_b7eb_0148_2804),
    f64::from_bits(0x3fcf_8673_1715_8ce0),
    f64::from_bits(0x3fd2_fb1b_3016_c6e2),
    f64::from_bits(0x3fcc_da91_c1ea_93d0),
];

/// A way of running Horner's rule.
pub trait HornerScheme {
    const NAME: &'static str;

    /// `c[0] + x * (c[1] + x * (... + x * c[15]))`.
    fn evaluate<V: Lanes>(x: V, c: &[f64; 16]) -> V;
}

/// Compensated Horner: the rounding errors of every step are collected with
/// error-free transformations and added back at the end. The result is as
/// accurate as plain Horner in twice the working precision.
pub struct Compensated;

/// One fused multiply-add per step.
pub struct Fma;

/// Separate multiply and add per step, rounding after each.
pub struct MulAdd;

impl HornerScheme for Compensated {
    const NAME: &'static str = "HORNER/COMP";

    #[inline(always)]
    fn evaluate<V: Lanes>(x: V, c: &[f64; 16]) -> V {
        let mut s = V::splat(c[15]);
        let mut r = V::splat(0.0);
        for &ci in c[..15].iter().rev() {
            let (p, p_err) = two_product(s, x);
            let (sum, s_err) = two_sum(p, V::splat(ci));
            s = sum;
            r = r.mul_add(x, p_err + s_err);
        }
        s + r
    }
}

impl HornerScheme for Fma {
    const NAME: &'static str = "HORNER/FMA";

    #[inline(always)]
    fn evaluate<V: Lanes>(x: V, c: &[f64; 16]) -> V {
        c[..15]
            .iter()
            .rev()
            .fold(V::splat(c[15]), |s, &ci| s.mul_add(x, V::splat(ci)))
    }
}

impl HornerScheme for MulAdd {
    const NAME: &'static str = "HORNER/MAC";

    #[inline(always)]
    fn evaluate<V: Lanes>(x: V, c: &[f64; 16]) -> V {
        c[..15]
            .iter()
            .rev()
            .fold(V::splat(c[15]), |s, &ci| s * x + V::splat(ci))
    }
}

/// Evaluates the benchmark polynomial at `x`.
#[inline]
pub fn horner15<S: HornerScheme, V: Lanes>(x: V) -> V {
    S::evaluate(x, &COEFFICIENTS)
}

/// Replaces `x` by `p(x)` `iterations` times. Zero iterations return `x`.
pub fn iterate<S: HornerScheme, V: Lanes>(mut x: V, iterations: usize) -> V {
    for _ in 0..iterations {
        x = horner15::<S, V>(x);
    }
    x
}

/// `iterate` with the scheme chosen at run time.
#[derive(Clone, Copy, Debug)]
pub struct SchemeFn<V> {
    pub name: &'static str,
    pub iterate: fn(V, usize) -> V,
}

impl<V: Lanes> SchemeFn<V> {
    pub fn of<S: HornerScheme>() -> Self {
        Self {
            name: S::NAME,
            iterate: iterate::<S, V>,
        }
    }

    /// All three schemes, most accurate first.
    pub fn all() -> [Self; 3] {
        [Self::of::<Compensated>(), Self::of::<Fma>(), Self::of::<MulAdd>()]
    }
}
