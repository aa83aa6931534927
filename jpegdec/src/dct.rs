// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use crate::context::{DATA_UNIT_AREA, DATA_UNIT_SIDE};

/// 8x8 type-III (inverse) DCT over a precomputed cosine basis.
///
/// `basis[u][x]` holds `C(u) * cos((2x + 1) u pi / 16)` with
/// `C(0) = 1/sqrt(2)`, so the zero-frequency coefficient of the input maps to
/// the block mean. The basis is computed once per scan and reused for every
/// data unit.
pub struct Idct8 {
    basis: [[f64; DATA_UNIT_SIDE]; DATA_UNIT_SIDE],
}

impl Idct8 {
    pub fn new() -> Self {
        let mut basis = [[0.0; DATA_UNIT_SIDE]; DATA_UNIT_SIDE];
        for (u, row) in basis.iter_mut().enumerate() {
            let alpha = if u == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            for (x, element) in row.iter_mut().enumerate() {
                *element = alpha
                    * ((2.0 * x as f64 + 1.0) * u as f64 * PI
                        / (2.0 * DATA_UNIT_SIDE as f64))
                        .cos();
            }
        }
        Idct8 { basis }
    }

    /// Transforms `input` (frequency domain, natural order) into spatial
    /// samples in `output`, one separable pass per axis.
    pub fn inverse(&self, input: &[f64; DATA_UNIT_AREA], output: &mut [f64; DATA_UNIT_AREA]) {
        let mut rows = [0.0; DATA_UNIT_AREA];
        for u in 0..DATA_UNIT_SIDE {
            for y in 0..DATA_UNIT_SIDE {
                let mut sum = 0.0;
                for v in 0..DATA_UNIT_SIDE {
                    sum += self.basis[v][y] * input[u * DATA_UNIT_SIDE + v];
                }
                rows[u * DATA_UNIT_SIDE + y] = sum;
            }
        }
        for x in 0..DATA_UNIT_SIDE {
            for y in 0..DATA_UNIT_SIDE {
                let mut sum = 0.0;
                for u in 0..DATA_UNIT_SIDE {
                    sum += self.basis[u][x] * rows[u * DATA_UNIT_SIDE + y];
                }
                output[x * DATA_UNIT_SIDE + y] = 0.25 * sum;
            }
        }
    }
}

impl Default for Idct8 {
    fn default() -> Self {
        Idct8::new()
    }
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    use super::*;
    use crate::util::test::assert_all_almost_eq;

    /// The four-loop textbook formula,
    /// `f(x,y) = 1/4 sum_u sum_v C(u) C(v) F(u,v) cos((2x+1)u pi/16) cos((2y+1)v pi/16)`.
    fn reference_idct(input: &[f64; DATA_UNIT_AREA]) -> [f64; DATA_UNIT_AREA] {
        let mut output = [0.0; DATA_UNIT_AREA];
        for x in 0..DATA_UNIT_SIDE {
            for y in 0..DATA_UNIT_SIDE {
                let mut sum = 0.0;
                for u in 0..DATA_UNIT_SIDE {
                    for v in 0..DATA_UNIT_SIDE {
                        let cu = if u == 0 { FRAC_1_SQRT_2 } else { 1.0 };
                        let cv = if v == 0 { FRAC_1_SQRT_2 } else { 1.0 };
                        sum += cu
                            * cv
                            * input[u * DATA_UNIT_SIDE + v]
                            * ((2.0 * x as f64 + 1.0) * u as f64 * PI / 16.0).cos()
                            * ((2.0 * y as f64 + 1.0) * v as f64 * PI / 16.0).cos();
                    }
                }
                output[x * DATA_UNIT_SIDE + y] = 0.25 * sum;
            }
        }
        output
    }

    #[test]
    fn dc_only_input_becomes_the_block_mean() {
        let mut input = [0.0; DATA_UNIT_AREA];
        input[0] = 800.0;
        let mut output = [0.0; DATA_UNIT_AREA];
        Idct8::new().inverse(&input, &mut output);
        assert_all_almost_eq(&output, &[100.0; DATA_UNIT_AREA], 1e-9);
    }

    #[test]
    fn separable_passes_match_the_direct_formula() {
        let mut rng = XorShiftRng::seed_from_u64(0x1d_c7);
        let idct = Idct8::new();
        for _ in 0..16 {
            let mut input = [0.0; DATA_UNIT_AREA];
            for coefficient in &mut input {
                *coefficient = rng.gen_range(-2048.0..2048.0);
            }
            let mut output = [0.0; DATA_UNIT_AREA];
            idct.inverse(&input, &mut output);
            assert_all_almost_eq(&output, &reference_idct(&input), 1e-6);
        }
    }

    #[test]
    fn single_cosine_row() {
        // F(0,1) = 1: constant along rows, one cosine period along columns.
        let mut input = [0.0; DATA_UNIT_AREA];
        input[1] = 1.0;
        let mut output = [0.0; DATA_UNIT_AREA];
        Idct8::new().inverse(&input, &mut output);
        for x in 0..DATA_UNIT_SIDE {
            for y in 0..DATA_UNIT_SIDE {
                let expected =
                    0.25 * FRAC_1_SQRT_2 * ((2.0 * y as f64 + 1.0) * PI / 16.0).cos();
                assert_all_almost_eq(&[output[x * DATA_UNIT_SIDE + y]], &[expected], 1e-9);
            }
        }
    }
}
