// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::collections::HashMap;

use crate::huffman::HuffmanTree;

pub const DATA_UNIT_SIDE: usize = 8;
pub const DATA_UNIT_AREA: usize = DATA_UNIT_SIDE * DATA_UNIT_SIDE;

/// A quantization table in natural row-major order (the zig-zag inverse
/// permutation is applied while the DQT segment is parsed).
pub type QuantTable = [u16; DATA_UNIT_AREA];

/// Per-channel state from the frame header.
#[derive(Clone, Copy, Debug, Default)]
pub struct Channel {
    /// Sampling factor from SOF0, rewritten to the up-sampling multiplier
    /// `Hmax / H` once the frame header has been fully parsed. Multipliers
    /// outside {1, 2} are rejected there.
    pub horizontal_scale: u8,
    /// The vertical counterpart, `Vmax / V`.
    pub vertical_scale: u8,
    /// Quantization table id.
    pub qt_id: u8,
}

/// Mutable state shared between the segment handlers and the MCU pipeline.
/// Lives for the duration of one decode call; the tables become read-only
/// once segment processing reaches the scan.
#[derive(Debug, Default)]
pub struct DecoderContext {
    pub precision: u8,
    pub width: u16,
    pub height: u16,
    /// MCU size in pixels, derived from the sampling multipliers.
    pub mcu_width: usize,
    pub mcu_height: usize,
    /// Channels in SOF0 order until the scan header rewrites the list into
    /// scan order.
    pub channels: Vec<Channel>,
    pub dc_tables: HashMap<u8, HuffmanTree>,
    pub ac_tables: HashMap<u8, HuffmanTree>,
    pub quant_tables: HashMap<u8, QuantTable>,
    pub frame_header_seen: bool,
    pub scan_seen: bool,
}

impl DecoderContext {
    pub fn new() -> Self {
        DecoderContext::default()
    }
}
