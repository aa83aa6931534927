// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;

pub const APP_FIRST: u16 = 0xffe0;
pub const APP_LAST: u16 = 0xffef;

/// Marker ids of the baseline sequential subset. Anything else in a stream
/// is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u16)]
pub enum Marker {
    /// Start of image.
    Soi = 0xffd8,
    /// End of image.
    Eoi = 0xffd9,
    /// Comment.
    Com = 0xfffe,
    /// Quantization table definitions.
    Dqt = 0xffdb,
    /// Huffman table definitions.
    Dht = 0xffc4,
    /// Baseline frame header.
    Sof0 = 0xffc0,
    /// Start of scan.
    Sos = 0xffda,
    /// Application data; all of APP0..APP15 fold here and are ignored.
    App = 0xffe0,
}

impl Marker {
    pub fn from_code(code: u16) -> Option<Marker> {
        if (APP_FIRST..=APP_LAST).contains(&code) {
            Some(Marker::App)
        } else {
            Marker::from_u16(code)
        }
    }

    /// Priority for the stable processing reorder: the frame header before
    /// Huffman tables, those before quantization tables, the scan last.
    /// Comments and application data fit anywhere and keep their relative
    /// order.
    pub fn processing_order(self) -> u8 {
        match self {
            Marker::Com | Marker::App => 0,
            Marker::Sof0 => 1,
            Marker::Dht => 2,
            Marker::Dqt => 3,
            Marker::Sos => 4,
            // Never buffered as segments.
            Marker::Soi | Marker::Eoi => 5,
        }
    }
}
