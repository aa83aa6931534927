// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::context::DATA_UNIT_SIDE;

/// Yields the 64 `(row, col)` positions of an 8x8 block in JPEG zig-zag
/// order: along each anti-diagonal, turning at the edges.
#[derive(Clone, Debug, Default)]
pub struct ZigZagIter {
    row: usize,
    col: usize,
    done: bool,
}

impl ZigZagIter {
    pub fn new() -> Self {
        ZigZagIter::default()
    }
}

impl Iterator for ZigZagIter {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.done {
            return None;
        }
        let position = (self.row, self.col);
        if (self.row + self.col) % 2 == 1 {
            // Odd diagonals run down-left.
            if self.row + 1 == DATA_UNIT_SIDE {
                self.col += 1;
            } else if self.col == 0 {
                self.row += 1;
            } else {
                self.row += 1;
                self.col -= 1;
            }
        } else {
            // Even diagonals run up-right.
            if self.col + 1 == DATA_UNIT_SIDE {
                self.row += 1;
            } else if self.row == 0 {
                self.col += 1;
            } else {
                self.row -= 1;
                self.col += 1;
            }
        }
        if self.row >= DATA_UNIT_SIDE || self.col >= DATA_UNIT_SIDE {
            self.done = true;
        }
        Some(position)
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    /// Zig-zag index to natural row-major index, per ITU T.81 figure 5.
    const ZIGZAG_TO_NATURAL: [usize; 64] = [
        0, 1, 8, 16, 9, 2, 3, 10, //
        17, 24, 32, 25, 18, 11, 4, 5, //
        12, 19, 26, 33, 40, 48, 41, 34, //
        27, 20, 13, 6, 7, 14, 21, 28, //
        35, 42, 49, 56, 57, 50, 43, 36, //
        29, 22, 15, 23, 30, 37, 44, 51, //
        58, 59, 52, 45, 38, 31, 39, 46, //
        53, 60, 61, 54, 47, 55, 62, 63,
    ];

    #[test]
    fn diagonal_walk_matches_the_jpeg_permutation() {
        let positions: Vec<(usize, usize)> = ZigZagIter::new().collect();
        assert_eq!(positions.len(), 64);
        for (index, &(row, col)) in positions.iter().enumerate() {
            assert_eq!(row * DATA_UNIT_SIDE + col, ZIGZAG_TO_NATURAL[index]);
        }
    }

    #[test]
    fn writing_through_the_walk_inverts_the_permutation() {
        let mut block = [0usize; 64];
        for (value, (row, col)) in ZigZagIter::new().enumerate() {
            block[row * DATA_UNIT_SIDE + col] = value;
        }
        for (natural, &zigzag) in block.iter().enumerate() {
            assert_eq!(ZIGZAG_TO_NATURAL[zigzag], natural);
        }
    }
}
