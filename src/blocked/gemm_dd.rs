//! Cache-blocked double-double GEMM over a microkernel table.

use std::mem::size_of;

use super::BlockError;
use super::pack::{pack_a, pack_b};
use crate::doubledouble::{DoubleDouble, dd_add};
use crate::kernels::{KernelTable, TILE_LAYOUT, kc_for_block};
use crate::matrix::naive::accumulate_block;

/// Cache-blocked matrix multiplication in double-double: C += A * B.
///
/// Matrices are row-major: A is m×k, B is k×n, C is m×n. The reduction
/// dimension is cut into chunks of `kc_for_block(block_bytes, mr, nr)`
/// steps. For each chunk all full mr-row panels of A are packed once, then
/// every nr-column panel of B is packed and swept across them with the
/// selected microkernel. Each tile is accumulated from zero and then added
/// into C. Rows and columns that do not fill a whole tile go through the
/// naive i-k-j loop.
///
/// # Errors
///
/// - [`BlockError::UnsupportedTile`] if `table` has no mr×nr kernel
/// - [`BlockError::BlockTooSmall`] if `block_bytes` does not fit one step
/// - [`BlockError::SizeMismatch`] if a slice does not match m, n, k
#[allow(clippy::too_many_arguments)]
pub fn ddgemm_blocked(
    table: &KernelTable,
    mr: usize,
    nr: usize,
    a: &[DoubleDouble],
    b: &[DoubleDouble],
    c: &mut [DoubleDouble],
    m: usize,
    n: usize,
    k: usize,
    block_bytes: usize,
) -> Result<(), BlockError> {
    let kernel = table.select(mr, nr).ok_or(BlockError::UnsupportedTile {
        mr,
        nr,
        backend: table.backend().name(),
    })?;
    check_len("A", a.len(), m * k)?;
    check_len("B", b.len(), k * n)?;
    check_len("C", c.len(), m * n)?;

    let kc = kc_for_block(block_bytes, mr, nr);
    if kc == 0 {
        return Err(BlockError::BlockTooSmall {
            block_bytes,
            mr,
            nr,
            min_bytes: (mr + nr) * size_of::<DoubleDouble>(),
        });
    }

    let width = table.backend().width();
    let m_main = (m / mr) * mr;
    let n_main = (n / nr) * nr;

    if m_main > 0 && n_main > 0 {
        // One packed A panel per mr rows, for the current k chunk.
        let panel_len = 2 * kc * mr;
        let mut a_panels = vec![0.0; (m_main / mr) * panel_len];
        let mut b_panel = vec![DoubleDouble::zero(); kc * nr];
        let mut tile = vec![DoubleDouble::zero(); mr * nr];

        for kk in (0..k).step_by(kc) {
            let k_block = kc.min(k - kk);
            let a_len = 2 * k_block * mr;

            for (panel, i) in a_panels.chunks_exact_mut(panel_len).zip((0..m_main).step_by(mr)) {
                pack_a(a, k, i, kk, mr, k_block, width, panel);
            }

            for j in (0..n_main).step_by(nr) {
                pack_b(b, n, kk, j, nr, k_block, &mut b_panel);

                for (panel, i) in a_panels.chunks_exact(panel_len).zip((0..m_main).step_by(mr)) {
                    tile.fill(DoubleDouble::zero());
                    kernel(k_block, &panel[..a_len], &b_panel[..k_block * nr], &mut tile);
                    scatter_tile(&tile, c, n, mr, nr, i, j);
                }
            }
        }
    }

    // Leftover rows across all columns, then leftover columns of the tiled rows.
    if m_main < m {
        accumulate_block(a, b, c, n, k, m_main..m, 0..n);
    }
    if n_main < n {
        accumulate_block(a, b, c, n, k, 0..m_main, n_main..n);
    }
    Ok(())
}

fn check_len(matrix: &'static str, actual: usize, expected: usize) -> Result<(), BlockError> {
    if actual == expected {
        Ok(())
    } else {
        Err(BlockError::SizeMismatch {
            matrix,
            expected,
            actual,
        })
    }
}

// Add a column-major tile into row-major C at (row, col).
fn scatter_tile(
    tile: &[DoubleDouble],
    c: &mut [DoubleDouble],
    ldc: usize,
    mr: usize,
    nr: usize,
    row: usize,
    col: usize,
) {
    for r in 0..mr {
        let c_row = &mut c[(row + r) * ldc + col..][..nr];
        for (q, cell) in c_row.iter_mut().enumerate() {
            *cell = dd_add(*cell, tile[TILE_LAYOUT.index(mr, r, q)]);
        }
    }
}
