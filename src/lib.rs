//! Double-double arithmetic and the kernels built on it.
//!
//! Everything here starts from error-free transformations: `two_sum`,
//! `two_product` and friends return a rounded result together with its exact
//! rounding error. Pairing a double with its error gives a double-double, a
//! ~106-bit number made of two `f64`s, and that in turn gives:
//!
//! - compensated dot products that are accurate to about `eps^2`
//! - compensated Horner evaluation
//! - a double-double GEMM microkernel, a table of tile shapes for it, and a
//!   cache-blocked driver
//!
//! ## Usage
//!
//! ```
//! use ddkernels::DoubleDouble;
//! use ddkernels::dot::DotKernels;
//!
//! let a = [1e16, 1.0, -1e16];
//! let b = [1.0, 1.0, 1.0];
//!
//! let kernels = DotKernels::detect();
//! let plain = kernels.fma(1).unwrap()(&a, &b);
//! let exact: DoubleDouble = kernels.compensated(1).unwrap()(&a, &b);
//!
//! assert_eq!(plain, 0.0);
//! assert_eq!(exact.hi, 1.0);
//! ```
//!
//! Multiplying double-double matrices:
//!
//! ```
//! use ddkernels::{DoubleDouble, multiply};
//!
//! let a = vec![DoubleDouble::from(1.0); 64 * 64];
//! let b = vec![DoubleDouble::from(1.0); 64 * 64];
//! let mut c = vec![DoubleDouble::zero(); 64 * 64];
//!
//! multiply(&a, &b, &mut c, 64, 64, 64).unwrap();
//! assert_eq!(c[0].hi, 64.0);
//! ```
//!
//! ## What's inside
//!
//! - Scalar, portable 4-lane and AVX2+FMA backends behind one `Lanes` trait
//! - Dot products with 1 to 8 independent accumulators
//! - mr×nr GEMM microkernels for mr ∈ {W, 2W, 3W} and nr ∈ 1..=8
//! - An MPFR reference (`mpfr` feature) for accuracy testing

pub mod blocked;
pub mod dot;
pub mod doubledouble;
pub mod eft;
pub mod horner;
pub mod kernels;
pub mod matrix;
#[cfg(feature = "mpfr")]
pub mod reference;
pub mod simd;

pub use blocked::{BlockError, ddgemm_blocked};
pub use doubledouble::DoubleDouble;
pub use kernels::{KernelTable, kc_for_block};
pub use matrix::naive::ddgemm_naive;
pub use simd::Backend;

/// Cache block used by [`multiply`]: a typical L1 data cache.
pub const DEFAULT_BLOCK_BYTES: usize = 32 * 1024;

/// Double-double matrix multiply: C += A * B
///
/// Picks the fastest available backend for your CPU (AVX2+FMA > scalar) and
/// its widest tile. Matrices are row-major: A is m×k, B is k×n, C is m×n.
///
/// # Errors
///
/// Returns [`BlockError::SizeMismatch`] if the slice sizes don't match m, n, k.
pub fn multiply(
    a: &[DoubleDouble],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
    m: usize,
    n: usize,
    k: usize,
) -> Result<(), BlockError> {
    let table = KernelTable::detect();
    let (mr, nr) = table.max_tile();
    ddgemm_blocked(&table, mr, nr, a, b, c, m, n, k, DEFAULT_BLOCK_BYTES)
}
