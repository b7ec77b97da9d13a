//! Double-double GEMM microkernels and the table that selects them.
//!
//! One generic kernel, [`ddgemm::ddgemm`], is instantiated for every tile
//! shape the table offers. For a backend of lane width W:
//! - mr ∈ {W, 2W, 3W} (one to three vector row groups)
//! - nr ∈ 1..=8
//!
//! Callers pick a shape with [`KernelTable::select`] and size the reduction
//! depth with [`kc_for_block`].

#[cfg(target_arch = "x86_64")]
mod avx2;
pub mod ddgemm;

use std::mem::size_of;

use crate::doubledouble::DoubleDouble;
use crate::simd::{Backend, F64x4};

pub use ddgemm::ddgemm;

/// `fn(kc, a_panel, b_panel, c_tile)`, see [`ddgemm::ddgemm`] for the layouts.
pub type DdgemmFn = fn(usize, &[f64], &[DoubleDouble], &mut [DoubleDouble]);

/// Row-group counts offered per backend: mr = g × width.
pub const MR_MULTIPLES: [usize; 3] = [1, 2, 3];
pub const NR_MIN: usize = 1;
pub const NR_MAX: usize = 8;

/// Storage order of the C tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileLayout {
    /// `c[col * mr + row]`
    ColumnMajor,
}

impl TileLayout {
    #[inline]
    pub const fn index(self, mr: usize, row: usize, col: usize) -> usize {
        match self {
            TileLayout::ColumnMajor => col * mr + row,
        }
    }
}

/// The layout every kernel in this module reads and writes.
pub const TILE_LAYOUT: TileLayout = TileLayout::ColumnMajor;

/// Reduction depth that keeps one A panel and one B panel of an mr×nr tile
/// within `block_bytes`.
///
/// Both panels are counted at double-double width. The result can be zero
/// when the block is too small for a single step.
pub const fn kc_for_block(block_bytes: usize, mr: usize, nr: usize) -> usize {
    block_bytes / ((mr + nr) * size_of::<DoubleDouble>())
}

#[derive(Clone, Copy, Debug)]
pub struct KernelEntry {
    pub mr: usize,
    pub nr: usize,
    pub kernel: DdgemmFn,
}

macro_rules! nr_variants {
    ($($f:ident)::+ <$($arg:tt),*>) => {
        [
            $($f)::+::<$($arg,)* 1>,
            $($f)::+::<$($arg,)* 2>,
            $($f)::+::<$($arg,)* 3>,
            $($f)::+::<$($arg,)* 4>,
            $($f)::+::<$($arg,)* 5>,
            $($f)::+::<$($arg,)* 6>,
            $($f)::+::<$($arg,)* 7>,
            $($f)::+::<$($arg,)* 8>,
        ]
    };
}

/// Every tile shape of one backend.
#[derive(Clone, Debug)]
pub struct KernelTable {
    backend: Backend,
    entries: Vec<KernelEntry>,
}

impl KernelTable {
    /// Builds the table for `backend`, or `None` if the running CPU cannot
    /// execute its kernels.
    pub fn new(backend: Backend) -> Option<Self> {
        if !backend.is_available() {
            return None;
        }

        let w = backend.width();
        let entries = match backend {
            Backend::Scalar => scalar_entries(),
            Backend::Portable => {
                let mut entries = Vec::with_capacity(TABLE_LEN);
                push_row(&mut entries, w, nr_variants!(ddgemm<F64x4, 1>));
                push_row(&mut entries, 2 * w, nr_variants!(ddgemm<F64x4, 2>));
                push_row(&mut entries, 3 * w, nr_variants!(ddgemm<F64x4, 3>));
                entries
            }
            #[cfg(target_arch = "x86_64")]
            Backend::Avx2Fma => {
                let mut entries = Vec::with_capacity(TABLE_LEN);
                push_row(&mut entries, w, nr_variants!(avx2::ddgemm<1>));
                push_row(&mut entries, 2 * w, nr_variants!(avx2::ddgemm<2>));
                push_row(&mut entries, 3 * w, nr_variants!(avx2::ddgemm<3>));
                entries
            }
            #[cfg(not(target_arch = "x86_64"))]
            Backend::Avx2Fma => return None,
        };

        tracing::debug!(
            backend = backend.name(),
            kernels = entries.len(),
            "built ddgemm kernel table"
        );
        Some(Self { backend, entries })
    }

    /// Table for the best backend of the running CPU.
    pub fn detect() -> Self {
        match Self::new(Backend::detect()) {
            Some(table) => table,
            None => Self {
                backend: Backend::Scalar,
                entries: scalar_entries(),
            },
        }
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Entries ordered by mr, then nr.
    pub fn entries(&self) -> &[KernelEntry] {
        &self.entries
    }

    /// The kernel for an mr×nr tile, if this backend has one.
    pub fn select(&self, mr: usize, nr: usize) -> Option<DdgemmFn> {
        self.entries
            .iter()
            .find(|e| e.mr == mr && e.nr == nr)
            .map(|e| e.kernel)
    }

    /// The largest mr and nr in the table.
    pub fn max_tile(&self) -> (usize, usize) {
        let mr = MR_MULTIPLES[MR_MULTIPLES.len() - 1] * self.backend.width();
        (mr, NR_MAX)
    }
}

const TABLE_LEN: usize = MR_MULTIPLES.len() * (NR_MAX - NR_MIN + 1);

fn scalar_entries() -> Vec<KernelEntry> {
    let mut entries = Vec::with_capacity(TABLE_LEN);
    push_row(&mut entries, 1, nr_variants!(ddgemm<f64, 1>));
    push_row(&mut entries, 2, nr_variants!(ddgemm<f64, 2>));
    push_row(&mut entries, 3, nr_variants!(ddgemm<f64, 3>));
    entries
}

fn push_row(entries: &mut Vec<KernelEntry>, mr: usize, kernels: [DdgemmFn; NR_MAX]) {
    entries.extend(
        kernels
            .into_iter()
            .zip(NR_MIN..=NR_MAX)
            .map(|(kernel, nr)| KernelEntry { mr, nr, kernel }),
    );
}
