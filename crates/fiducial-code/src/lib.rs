//! The marker's code layer: 10×10 cell grid extraction, Hamming(7,4) blocks
//! with a 12-bit CRC, the user-space code table, and pattern synthesis for
//! printing or test image generation.

mod crc;
mod encode;
mod grid;
mod hamming;
mod table;

pub use crc::crc12;
pub use encode::{code_cells, encode_blocks};
pub use grid::{recover_code, CellGrid, GridCell, RecoveredCode, CODE_GRID_WIDTH, MARKER_GRID_WIDTH};
pub use hamming::{hamming_decode, hamming_encode};
pub use table::{grid_number_for_code, translate_code};
