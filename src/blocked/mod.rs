//! Cache-blocked double-double GEMM.
//!
//! The driver breaks C += A × B into tiles that match a microkernel shape,
//! packs A and B panels into the layouts the kernels expect, and sizes the
//! reduction chunks so that one A panel and one B panel fit a cache block.
//!
//! - `pack`: panel packing, including promotion of plain `f64` A matrices
//! - `gemm_dd`: the blocked driver

pub mod gemm_dd;
pub mod pack;

use thiserror::Error;

pub use gemm_dd::ddgemm_blocked;
pub use pack::{pack_a, pack_a_f64, pack_b};

/// Configuration problems reported by [`ddgemm_blocked`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("no {mr}x{nr} kernel for the {backend} backend")]
    UnsupportedTile {
        mr: usize,
        nr: usize,
        backend: &'static str,
    },

    #[error("block of {block_bytes} bytes cannot hold one step of a {mr}x{nr} tile (need {min_bytes})")]
    BlockTooSmall {
        block_bytes: usize,
        mr: usize,
        nr: usize,
        min_bytes: usize,
    },

    #[error("{matrix}: expected {expected} elements, got {actual}")]
    SizeMismatch {
        matrix: &'static str,
        expected: usize,
        actual: usize,
    },
}
