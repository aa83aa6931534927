// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Asserts that two float slices agree element-wise within `tolerance`.
pub fn assert_all_almost_eq(left: &[f64], right: &[f64], tolerance: f64) {
    assert_eq!(left.len(), right.len());
    for (index, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        assert!(
            (l - r).abs() <= tolerance,
            "element {index}: `{l}` vs `{r}` (tolerance {tolerance})"
        );
    }
}
