#![cfg(feature = "mpfr")]

use ddkernels::blocked::pack_a;
use ddkernels::doubledouble::{dd_add, dd_add_fast, dd_add_single, dd_add_wide, dd_mul};
use ddkernels::dot::{DotKernels, UNROLL_MAX, UNROLL_MIN};
use ddkernels::eft::{two_fma, two_product, two_sum, ulp};
use ddkernels::kernels::{KernelTable, TILE_LAYOUT};
use ddkernels::reference::{PRECISION, exact, exact_dot, exact_sum, relative_error};
use ddkernels::{Backend, DoubleDouble};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rug::Float;

const U: f64 = f64::EPSILON / 2.0;

fn float(x: f64) -> Float {
    Float::with_val(PRECISION, x)
}

fn random_dd(rng: &mut StdRng) -> DoubleDouble {
    let hi: f64 = rng.gen_range(-1.0..1.0);
    dd_add_single(hi, U * hi * rng.gen_range(-1.0..1.0))
}

/// A positive normalized double-double scaled by a random power of two.
fn random_positive_dd(rng: &mut StdRng) -> DoubleDouble {
    let scale = 2f64.powi(rng.gen_range(-30..=30));
    let hi = rng.gen_range(0.5..1.0) * scale;
    dd_add_single(hi, U * hi * rng.gen_range(-1.0..1.0))
}

/// Operand pairs with equal or opposite signs.
fn operand_pairs(seed: u64, same_sign: bool) -> Vec<(DoubleDouble, DoubleDouble)> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..10_000)
        .map(|_| {
            let a = random_positive_dd(&mut rng);
            let b = random_positive_dd(&mut rng);
            if same_sign { (a, b) } else { (a, -b) }
        })
        .collect()
}

fn check_dd_add(same_sign: bool) {
    for (a, b) in operand_pairs(20, same_sign) {
        let reference = exact(a) + exact(b);
        let sum = dd_add(a, b);
        let err = relative_error(&reference, sum.hi, sum.lo);
        let plain = relative_error(&reference, (a.hi + b.hi) + (a.lo + b.lo), 0.0);
        assert!(err <= 4.0 * U * U, "dd_add({:?}, {:?}): {:e}", a, b, err);
        assert!(err <= plain, "dd_add({:?}, {:?}) worse than double", a, b);
    }
}

fn check_dd_add_fast(same_sign: bool) {
    for (a, b) in operand_pairs(21, same_sign) {
        let (a, b) = if a.hi.abs() >= b.hi.abs() { (a, b) } else { (b, a) };
        let reference = exact(a) + exact(b);
        let sum = dd_add_fast(a, b);
        let err = relative_error(&reference, sum.hi, sum.lo);
        let plain = relative_error(&reference, (a.hi + b.hi) + (a.lo + b.lo), 0.0);
        assert!(err <= plain, "dd_add_fast({:?}, {:?}) worse than double", a, b);
    }
}

fn check_dd_add_wide(same_sign: bool) {
    for (a, b) in operand_pairs(22, same_sign) {
        let b = b.hi;
        let reference = exact_sum(&[a.hi, a.lo, b]);
        let sum = dd_add_wide(a, b);
        let err = relative_error(&reference, sum.hi, sum.lo);
        let plain = relative_error(&reference, (a.hi + b) + a.lo, 0.0);
        assert!(err <= plain, "dd_add_wide({:?}, {}) worse than double", a, b);
    }
}

// ============================================================
// Error-free transformations
// ============================================================

#[test]
fn test_eft_are_error_free() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..10_000 {
        let a: f64 = rng.gen_range(-1e10..1e10);
        let b: f64 = rng.gen_range(-1e-5..1e-5);
        let c: f64 = rng.gen_range(-1.0..1.0);

        let (s, e) = two_sum(a, b);
        assert_eq!(float(s) + e, float(a) + b, "two_sum({}, {})", a, b);
        assert_eq!(s, a + b);
        assert!(e.abs() <= 0.5 * ulp(s), "two_sum({}, {}) tail", a, b);

        let (p, e) = two_product(a, b);
        assert_eq!(float(p) + e, float(a) * b, "two_product({}, {})", a, b);
        assert!(e.abs() <= 0.5 * ulp(p), "two_product({}, {}) tail", a, b);

        let (h, e_hi, e_lo) = two_fma(a, b, c);
        assert_eq!(
            float(h) + e_hi + e_lo,
            float(a) * b + c,
            "two_fma({}, {}, {})",
            a,
            b,
            c
        );
        assert!(e_lo.abs() <= e_hi.abs());
        assert!((e_hi + e_lo).abs() <= 0.5 * ulp(h), "two_fma({}, {}, {}) tail", a, b, c);
    }
}

// ============================================================
// Double-double arithmetic
// ============================================================

#[test]
fn test_dd_add_same_sign() {
    check_dd_add(true);
}

#[test]
fn test_dd_add_opposite_sign() {
    check_dd_add(false);
}

#[test]
fn test_dd_add_fast_same_sign() {
    check_dd_add_fast(true);
}

#[test]
fn test_dd_add_fast_opposite_sign() {
    check_dd_add_fast(false);
}

#[test]
fn test_dd_add_wide_same_sign() {
    check_dd_add_wide(true);
}

#[test]
fn test_dd_add_wide_opposite_sign() {
    check_dd_add_wide(false);
}

#[test]
fn test_dd_mul_relative_error() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..10_000 {
        let a = random_dd(&mut rng);
        let b = random_dd(&mut rng);

        let reference = exact(a) * exact(b);
        let product = dd_mul(a, b);
        let err = relative_error(&reference, product.hi, product.lo);
        assert!(err <= 16.0 * U * U, "dd_mul({:?}, {:?}): {:e}", a, b, err);
    }
}

// ============================================================
// Dot products
// ============================================================

#[test]
fn test_dot_error_bounds() {
    let n = 1027;
    let gamma = n as f64 * U / (1.0 - n as f64 * U);

    for seed in 0..16 {
        let mut rng = StdRng::seed_from_u64(seed);
        let a: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let b: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let reference = exact_dot(&a, &b);
        let abs_sum: f64 = a.iter().zip(&b).map(|(x, y)| (x * y).abs()).sum();
        let scale = reference.to_f64().abs();

        for backend in Backend::available() {
            let kernels = DotKernels::new(backend).unwrap();
            for unroll in UNROLL_MIN..=UNROLL_MAX {
                let c = kernels.compensated(unroll).unwrap()(&a, &b);
                let abs_err = relative_error(&reference, c.hi, c.lo) * scale;
                assert!(
                    abs_err <= 4.0 * n as f64 * U * U * abs_sum,
                    "{} compensated unroll={} seed={}",
                    backend.name(),
                    unroll,
                    seed
                );

                for (tier, dot) in [
                    ("mul+add", kernels.mul_add(unroll).unwrap()),
                    ("fma", kernels.fma(unroll).unwrap()),
                ] {
                    let abs_err = relative_error(&reference, dot(&a, &b), 0.0) * scale;
                    assert!(
                        abs_err <= gamma * abs_sum,
                        "{} {} unroll={} seed={}",
                        backend.name(),
                        tier,
                        unroll,
                        seed
                    );
                }
            }
        }
    }
}

#[test]
fn test_dot_accuracy_1027_elements() {
    let n = 1027;
    let kernels = DotKernels::detect();
    let mut well_conditioned = 0;

    for seed in 100..132 {
        let mut rng = StdRng::seed_from_u64(seed);
        let a: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let b: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let reference = exact_dot(&a, &b);

        let c = kernels.compensated(UNROLL_MAX).unwrap()(&a, &b);
        let err = relative_error(&reference, c.hi, c.lo);
        assert!(
            err < 10.0 * f64::EPSILON * f64::EPSILON,
            "compensated seed={}: {:e}",
            seed,
            err
        );

        // The plain tiers lose accuracy with the condition number.
        let abs_sum: f64 = a.iter().zip(&b).map(|(x, y)| (x * y).abs()).sum();
        if abs_sum / reference.to_f64().abs() > 32.0 {
            continue;
        }
        well_conditioned += 1;

        for (tier, dot) in [
            ("mul+add", kernels.mul_add(UNROLL_MAX).unwrap()),
            ("fma", kernels.fma(UNROLL_MAX).unwrap()),
        ] {
            let err = relative_error(&reference, dot(&a, &b), 0.0);
            assert!(err < 5.0 * f64::EPSILON, "{} seed={}: {:e}", tier, seed, err);
        }
    }
    assert!(well_conditioned > 0, "every sample was ill-conditioned");
}

// ============================================================
// ddgemm microkernels
// ============================================================

#[test]
fn test_ddgemm_long_reduction() {
    let kc = 1024;
    let mut rng = StdRng::seed_from_u64(3);

    for backend in Backend::available() {
        let table = KernelTable::new(backend).unwrap();
        for entry in table.entries() {
            let (mr, nr) = (entry.mr, entry.nr);
            // Positive data: no cancellation in the reduction.
            let a: Vec<DoubleDouble> = (0..mr * kc)
                .map(|_| dd_add_single(rng.r#gen::<f64>(), U * rng.r#gen::<f64>()))
                .collect();
            let b: Vec<DoubleDouble> = (0..kc * nr)
                .map(|_| dd_add_single(rng.r#gen::<f64>(), U * rng.r#gen::<f64>()))
                .collect();

            let mut packed = vec![0.0; 2 * kc * mr];
            pack_a(&a, kc, 0, 0, mr, kc, backend.width(), &mut packed);
            let mut c = vec![DoubleDouble::zero(); mr * nr];
            (entry.kernel)(kc, &packed, &b, &mut c);

            for row in 0..mr {
                for col in 0..nr {
                    let reference = (0..kc).fold(float(0.0), |acc, p| {
                        acc + exact(a[row * kc + p]) * exact(b[p * nr + col])
                    });
                    let cell = c[TILE_LAYOUT.index(mr, row, col)];
                    let err = relative_error(&reference, cell.hi, cell.lo);
                    assert!(
                        err < 1e-30,
                        "{} {}x{} at ({}, {}): {:e}",
                        backend.name(),
                        mr,
                        nr,
                        row,
                        col,
                        err
                    );
                }
            }
        }
    }
}
