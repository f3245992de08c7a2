//! The 10×10 cell grid and code recovery.

use std::fmt;

use fiducial_core::GrayImageView;
use serde::{Deserialize, Serialize};

use crate::crc::crc12;
use crate::hamming::hamming_decode;

/// Cells per side of the whole marker, border included.
pub const MARKER_GRID_WIDTH: usize = 10;

/// Cells per side of the inner code region.
pub const CODE_GRID_WIDTH: usize = 6;

const BORDER_WIDTH: usize = (MARKER_GRID_WIDTH - CODE_GRID_WIDTH) / 2;

/// One grid cell: accumulated pixel sum, pixel count, and the thresholded
/// value (1 = white in the unwarped image).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GridCell {
    pub sum: u32,
    pub pixels: u16,
    pub value: u8,
}

/// Thresholded cell grid of an unwarped marker, indexed `[row][col]`.
#[derive(Clone, Debug)]
pub struct CellGrid {
    cells: [[GridCell; MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH],
}

impl CellGrid {
    /// Average and threshold an unwarped marker image into cells.
    ///
    /// The image must be square with a side that is a multiple of the grid
    /// width; the caller has already re-thresholded it to black and white,
    /// so a mid-range `threshold` (127) separates the two.
    pub fn from_image(unwarped: &GrayImageView<'_>, threshold: u8) -> Self {
        assert_eq!(unwarped.width, unwarped.height, "unwarped marker must be square");
        assert!(
            unwarped.width % MARKER_GRID_WIDTH == 0,
            "image side must be a multiple of the grid width"
        );

        let cell_px = unwarped.width / MARKER_GRID_WIDTH;
        let mut cells = [[GridCell::default(); MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH];

        for (row, row_cells) in cells.iter_mut().enumerate() {
            for (col, cell) in row_cells.iter_mut().enumerate() {
                for j in 0..cell_px {
                    for i in 0..cell_px {
                        let x = col * cell_px + i;
                        let y = row * cell_px + j;
                        cell.sum += unwarped.get(x, y) as u32;
                        cell.pixels += 1;
                    }
                }
                let avg = cell.sum / cell.pixels as u32;
                cell.value = u8::from(avg > threshold as u32);
            }
        }

        Self { cells }
    }

    /// Build a grid directly from cell values (1 = white), mainly for
    /// synthetic grids in tests and tools.
    pub fn from_cell_values(values: [[u8; MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH]) -> Self {
        let mut cells = [[GridCell::default(); MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH];
        for row in 0..MARKER_GRID_WIDTH {
            for col in 0..MARKER_GRID_WIDTH {
                cells[row][col].value = values[row][col];
            }
        }
        Self { cells }
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> u8 {
        self.cells[row][col].value
    }
}

impl fmt::Display for CellGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "+{}+", " ".repeat(2 * MARKER_GRID_WIDTH + 2))?;
        for row in &self.cells {
            write!(f, "  ")?;
            for cell in row {
                write!(f, "{}", if cell.value == 0 { "# " } else { "  " })?;
            }
            writeln!(f)?;
        }
        writeln!(f, "+{}+", " ".repeat(2 * MARKER_GRID_WIDTH + 2))
    }
}

/// Code recovered from a grid: the raw grid-space number and the rotation
/// the grid needed before its blocks parity-checked.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecoveredCode {
    pub number: u8,
    pub rotation_offset: f32,
}

/// Read the 35 used cells of the inner region in all four orientations.
///
/// Cell `(x, y)` (code-region coordinates) feeds bit `p / 5` of block
/// `p % 5` with `p = y*6 + x`; the final position (5,5) is unused. Cells
/// are inverted on the way out so that a black cell is a set bit.
fn code_rotations(grid: &CellGrid) -> [[u8; 5]; 4] {
    let bw = BORDER_WIDTH;
    let gw = CODE_GRID_WIDTH;
    let mut codes = [[0u8; 5]; 4];

    for y in 0..gw {
        for x in 0..gw {
            let p = y * gw + x;
            if p == gw * gw - 1 {
                continue;
            }
            let block = p % 5;
            let bit = (p / 5) as u8;

            let reads = [
                grid.value(bw + y, bw + x),
                grid.value(bw + x, bw + (gw - 1) - y),
                grid.value(bw + (gw - 1) - y, bw + (gw - 1) - x),
                grid.value(bw + (gw - 1) - x, bw + y),
            ];
            for (rotation, &v) in reads.iter().enumerate() {
                codes[rotation][block] |= v << bit;
            }
        }
    }

    for rotation in codes.iter_mut() {
        for block in rotation.iter_mut() {
            *block = !*block & 0x7f;
        }
    }

    codes
}

/// Recover the marker number carried by a grid, trying each of the four
/// orientations until one passes the CRC.
///
/// The payload is five Hamming-decoded nibbles forming a 20-bit word: the
/// low 8 bits are the number `n`, the high 12 the CRC of `n + 1`.
pub fn recover_code(grid: &CellGrid) -> Option<RecoveredCode> {
    let codes = code_rotations(grid);

    for (rotation, blocks) in codes.iter().enumerate() {
        let mut data: u32 = 0;
        for (j, &block) in blocks.iter().enumerate() {
            data |= (hamming_decode(block) as u32) << (j * 4);
        }

        let number = (data & 0xff) as u8;
        let received_crc = ((data >> 8) & 0xfff) as u16;

        if crc12(number.wrapping_add(1)) == received_crc {
            return Some(RecoveredCode {
                number,
                rotation_offset: 90.0 * rotation as f32,
            });
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::code_cells;
    use fiducial_core::GrayImage;

    fn grid_for_number(number: u8) -> CellGrid {
        let pattern = code_cells(number);
        let mut values = [[0u8; MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH];
        for row in 0..MARKER_GRID_WIDTH {
            for col in 0..MARKER_GRID_WIDTH {
                let border = row < BORDER_WIDTH
                    || col < BORDER_WIDTH
                    || row >= MARKER_GRID_WIDTH - BORDER_WIDTH
                    || col >= MARKER_GRID_WIDTH - BORDER_WIDTH;
                let black = border || pattern[row - BORDER_WIDTH][col - BORDER_WIDTH];
                values[row][col] = u8::from(!black);
            }
        }
        CellGrid::from_cell_values(values)
    }

    fn rotate_values(grid: &CellGrid, quarter_turns: usize) -> CellGrid {
        let n = MARKER_GRID_WIDTH;
        let mut values = [[0u8; MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH];
        for row in 0..n {
            for col in 0..n {
                let (sr, sc) = match quarter_turns % 4 {
                    0 => (row, col),
                    1 => (n - 1 - col, row),
                    2 => (n - 1 - row, n - 1 - col),
                    _ => (col, n - 1 - row),
                };
                values[row][col] = grid.value(sr, sc);
            }
        }
        CellGrid::from_cell_values(values)
    }

    #[test]
    fn cell_averaging_binarises_a_rendered_grid() {
        // paint a 100x100 image from a synthetic grid and read it back
        let reference = grid_for_number(25);
        let mut img = GrayImage::new(100, 100);
        for y in 0..100 {
            for x in 0..100 {
                let v = if reference.value(y / 10, x / 10) == 1 { 255 } else { 0 };
                img.set(x, y, v);
            }
        }
        let grid = CellGrid::from_image(&img.as_view(), 127);
        for row in 0..MARKER_GRID_WIDTH {
            for col in 0..MARKER_GRID_WIDTH {
                assert_eq!(grid.value(row, col), reference.value(row, col));
            }
        }
    }

    #[test]
    fn every_assigned_number_round_trips() {
        for number in 0..=255u8 {
            if crate::table::translate_code(number).is_none() {
                continue;
            }
            let rec = recover_code(&grid_for_number(number)).expect("decode");
            assert_eq!(rec.number, number);
            assert_eq!(rec.rotation_offset, 0.0);
        }
    }

    #[test]
    fn single_cell_corruption_is_corrected() {
        let number = 25;
        for cy in 0..CODE_GRID_WIDTH {
            for cx in 0..CODE_GRID_WIDTH {
                if cy == CODE_GRID_WIDTH - 1 && cx == CODE_GRID_WIDTH - 1 {
                    continue; // unused cell
                }
                let mut values = [[0u8; MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH];
                let clean = grid_for_number(number);
                for row in 0..MARKER_GRID_WIDTH {
                    for col in 0..MARKER_GRID_WIDTH {
                        values[row][col] = clean.value(row, col);
                    }
                }
                values[BORDER_WIDTH + cy][BORDER_WIDTH + cx] ^= 1;

                let rec = recover_code(&CellGrid::from_cell_values(values)).expect("decode");
                assert_eq!(rec.number, number, "flipped cell ({cx},{cy})");
            }
        }
    }

    #[test]
    fn rotated_grids_decode_with_matching_offset() {
        for &number in &[15u8, 25, 56] {
            let grid = grid_for_number(number);
            for turns in 0..4usize {
                let rotated = rotate_values(&grid, turns);
                let rec = recover_code(&rotated).expect("decode");
                assert_eq!(rec.number, number, "number {number}, {turns} turns");
                assert_eq!(
                    rec.rotation_offset,
                    90.0 * turns as f32,
                    "number {number}, {turns} turns"
                );
            }
        }
    }

    #[test]
    fn garbage_grid_fails_all_orientations() {
        let mut values = [[0u8; MARKER_GRID_WIDTH]; MARKER_GRID_WIDTH];
        for (row, row_vals) in values.iter_mut().enumerate() {
            for (col, v) in row_vals.iter_mut().enumerate() {
                *v = ((row * 3 + col * 5) % 2) as u8;
            }
        }
        assert!(recover_code(&CellGrid::from_cell_values(values)).is_none());
    }

    #[test]
    fn display_draws_black_cells_as_hashes() {
        let grid = grid_for_number(0);
        let text = format!("{grid}");
        assert!(text.contains('#'));
        assert_eq!(text.lines().count(), MARKER_GRID_WIDTH + 2);
    }
}
