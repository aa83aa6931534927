// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::BufRead;

use crate::bit_reader::BitReader;
use crate::context::{Channel, DecoderContext, DATA_UNIT_AREA, DATA_UNIT_SIDE};
use crate::dct::Idct8;
use crate::error::{Error, Result};
use crate::huffman::HuffmanTree;
use crate::image::ImageSink;
use crate::util::tracing_wrappers::*;
use crate::zigzag::ZigZagIter;

/// Decodes the entropy-coded scan payload into pixels, one MCU at a time.
///
/// The coefficient and sample blocks plus the RGB accumulator are reused
/// across MCUs; the per-channel DC predictors live for the whole scan.
pub struct ScanDecoder<'a, S> {
    context: &'a DecoderContext,
    sink: &'a mut S,
    dc_trees: Vec<HuffmanTree>,
    ac_trees: Vec<HuffmanTree>,
    previous_dc: Vec<f64>,
    coefficients: [f64; DATA_UNIT_AREA],
    samples: [f64; DATA_UNIT_AREA],
    idct: Idct8,
    rgb: RgbAccumulator,
}

impl<'a, S: ImageSink> ScanDecoder<'a, S> {
    /// `dc_trees`/`ac_trees` are the per-channel tables in scan order, as
    /// selected by the scan header.
    pub fn new(
        context: &'a DecoderContext,
        dc_trees: Vec<HuffmanTree>,
        ac_trees: Vec<HuffmanTree>,
        sink: &'a mut S,
    ) -> Self {
        ScanDecoder {
            previous_dc: vec![0.0; context.channels.len()],
            coefficients: [0.0; DATA_UNIT_AREA],
            samples: [0.0; DATA_UNIT_AREA],
            idct: Idct8::new(),
            rgb: RgbAccumulator::new(context.mcu_height, context.mcu_width),
            context,
            sink,
            dc_trees,
            ac_trees,
        }
    }

    /// Runs over all MCUs in raster order. Bits past the last MCU up to the
    /// next byte boundary are left unread.
    pub fn run<R: BufRead>(mut self, reader: &mut BitReader<R>) -> Result<()> {
        let mcu_rows = (self.context.height as usize).div_ceil(self.context.mcu_height);
        let mcu_cols = (self.context.width as usize).div_ceil(self.context.mcu_width);
        debug!(
            "scan: {mcu_rows}x{mcu_cols} MCUs of {}x{} pixels",
            self.context.mcu_height, self.context.mcu_width
        );

        for mcu_row in 0..mcu_rows {
            for mcu_col in 0..mcu_cols {
                trace!("MCU ({mcu_row}, {mcu_col})");
                self.decode_mcu(reader)?;
                self.rgb.flush(
                    &mut *self.sink,
                    mcu_row * self.context.mcu_height,
                    mcu_col * self.context.mcu_width,
                    self.context,
                );
            }
        }
        Ok(())
    }

    fn decode_mcu<R: BufRead>(&mut self, reader: &mut BitReader<R>) -> Result<()> {
        self.rgb.clear();
        for index in 0..self.context.channels.len() {
            let channel = self.context.channels[index];
            let unit_rows =
                self.context.mcu_height / (channel.vertical_scale as usize * DATA_UNIT_SIDE);
            let unit_cols =
                self.context.mcu_width / (channel.horizontal_scale as usize * DATA_UNIT_SIDE);
            for unit_row in 0..unit_rows {
                for unit_col in 0..unit_cols {
                    self.decode_data_unit(reader, index)?;
                    self.dequantize(channel.qt_id)?;
                    self.idct.inverse(&self.coefficients, &mut self.samples);
                    self.level_shift();
                    self.accumulate(
                        unit_row * DATA_UNIT_SIDE,
                        unit_col * DATA_UNIT_SIDE,
                        index,
                        channel,
                    );
                }
            }
        }
        Ok(())
    }

    /// Entropy-decodes one data unit: the DC difference, then the
    /// run-length-coded AC coefficients along the zig-zag path.
    fn decode_data_unit<R: BufRead>(
        &mut self,
        reader: &mut BitReader<R>,
        index: usize,
    ) -> Result<()> {
        self.coefficients.fill(0.0);

        let size = next_symbol(reader, &mut self.dc_trees[index])?;
        if size > 15 {
            return Err(Error::NotBaseline("DC coefficient bit length"));
        }
        let difference = f64::from(read_signed(reader, size)?);
        self.previous_dc[index] += difference;
        self.coefficients[0] = self.previous_dc[index];

        let mut cells = ZigZagIter::new().skip(1).peekable();
        while cells.peek().is_some() {
            let symbol = next_symbol(reader, &mut self.ac_trees[index])?;
            let zero_run = symbol >> 4;
            let size = symbol & 0x0f;
            if zero_run == 0 && size == 0 {
                // End of block: the rest stays zero.
                break;
            }
            for _ in 0..zero_run {
                cells.next().ok_or(Error::DataUnitOverflow)?;
            }
            let (row, col) = cells.next().ok_or(Error::DataUnitOverflow)?;
            self.coefficients[row * DATA_UNIT_SIDE + col] =
                f64::from(read_signed(reader, size)?);
        }
        Ok(())
    }

    fn dequantize(&mut self, qt_id: u8) -> Result<()> {
        let table = self
            .context
            .quant_tables
            .get(&qt_id)
            .ok_or(Error::MissingTable("quantization", qt_id))?;
        for (coefficient, &quantum) in self.coefficients.iter_mut().zip(table.iter()) {
            *coefficient *= f64::from(quantum);
        }
        Ok(())
    }

    /// Rounds, shifts into the unsigned sample range and clamps.
    fn level_shift(&mut self) {
        let shift = f64::from(1u32 << (self.context.precision - 1));
        let max = f64::from((1u32 << self.context.precision) - 1);
        for sample in &mut self.samples {
            *sample = (sample.round() + shift).clamp(0.0, max);
        }
    }

    /// Duplicates the 8x8 sample block by the channel's multipliers into the
    /// accumulator at the data unit's MCU-local offset.
    fn accumulate(&mut self, row0: usize, col0: usize, index: usize, channel: Channel) {
        let v_scale = channel.vertical_scale as usize;
        let h_scale = channel.horizontal_scale as usize;
        for row in 0..DATA_UNIT_SIDE {
            for col in 0..DATA_UNIT_SIDE {
                let value = self.samples[row * DATA_UNIT_SIDE + col];
                for dy in 0..v_scale {
                    for dx in 0..h_scale {
                        self.rgb.add(
                            (row0 + row * v_scale + dy, col0 + col * h_scale + dx),
                            index,
                            value,
                        );
                    }
                }
            }
        }
    }
}

/// Walks the tree bit by bit until it emits a symbol.
fn next_symbol<R: BufRead>(reader: &mut BitReader<R>, tree: &mut HuffmanTree) -> Result<u8> {
    loop {
        if let Some(symbol) = tree.walk(reader.read_bit()?)? {
            return Ok(symbol);
        }
    }
}

/// Reads `size` bits as a JPEG variable-length signed value: a leading 1 bit
/// gives the positive magnitude directly, a leading 0 bit the negative
/// complement `unsigned - 2^size + 1`.
fn read_signed<R: BufRead>(reader: &mut BitReader<R>, size: u8) -> Result<i32> {
    if size == 0 {
        return Ok(0);
    }
    let negative = !reader.read_bit()?;
    let mut magnitude: i32 = 1;
    for _ in 1..size {
        magnitude = magnitude * 2 + i32::from(negative ^ reader.read_bit()?);
    }
    Ok(if negative { -magnitude } else { magnitude })
}

/// MCU-sized floating-point accumulator for the three color planes.
struct RgbAccumulator {
    height: usize,
    width: usize,
    r: Vec<f64>,
    g: Vec<f64>,
    b: Vec<f64>,
}

impl RgbAccumulator {
    fn new(height: usize, width: usize) -> Self {
        RgbAccumulator {
            height,
            width,
            r: vec![0.0; height * width],
            g: vec![0.0; height * width],
            b: vec![0.0; height * width],
        }
    }

    fn clear(&mut self) {
        self.r.fill(0.0);
        self.g.fill(0.0);
        self.b.fill(0.0);
    }

    /// Adds one up-sampled sample. The channel's position in the scan decides
    /// its color role: Y (also the single grayscale channel), then Cb, then
    /// Cr, with the JFIF full-range BT.601 weights.
    fn add(&mut self, (row, col): (usize, usize), channel_index: usize, value: f64) {
        let cell = row * self.width + col;
        match channel_index {
            0 => {
                self.r[cell] += value;
                self.g[cell] += value;
                self.b[cell] += value;
            }
            1 => {
                self.g[cell] += -0.34414 * (value - 128.0);
                self.b[cell] += 1.772 * (value - 128.0);
            }
            2 => {
                self.r[cell] += 1.402 * (value - 128.0);
                self.g[cell] += -0.71414 * (value - 128.0);
            }
            _ => unreachable!("the frame header limits the channel count to 3"),
        }
    }

    /// Writes the accumulated block into the sink, rounded and clamped,
    /// cropping at the image border.
    fn flush<S: ImageSink>(
        &self,
        sink: &mut S,
        row0: usize,
        col0: usize,
        context: &DecoderContext,
    ) {
        let max = f64::from((1u32 << context.precision) - 1);
        for row in 0..self.height {
            if row0 + row >= context.height as usize {
                break;
            }
            for col in 0..self.width {
                if col0 + col >= context.width as usize {
                    break;
                }
                let cell = row * self.width + col;
                let pixel = sink.pixel_at_mut(row0 + row, col0 + col);
                pixel.r = self.r[cell].round().clamp(0.0, max) as u8;
                pixel.g = self.g[cell].round().clamp(0.0, max) as u8;
                pixel.b = self.b[cell].round().clamp(0.0, max) as u8;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn signed_values_follow_the_variable_length_encoding() {
        // '101' -> +5, '010' -> -5, then a zero-length value.
        let bytes = [0b1010_1000u8];
        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(read_signed(&mut reader, 3).unwrap(), 5);
        assert_eq!(read_signed(&mut reader, 3).unwrap(), -5);
        assert_eq!(read_signed(&mut reader, 0).unwrap(), 0);
    }

    #[test]
    fn signed_extremes() {
        // '1' -> +1, '0' -> -1.
        let bytes = [0b1000_0000u8];
        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(read_signed(&mut reader, 1).unwrap(), 1);
        assert_eq!(read_signed(&mut reader, 1).unwrap(), -1);
        // All-ones and all-zeros at the widest AC size.
        let bytes = [0xff, 0xfe, 0x00, 0x00];
        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(read_signed(&mut reader, 15).unwrap(), 0x7fff);
        assert_eq!(read_signed(&mut reader, 15).unwrap(), -0x7fff);
    }

    #[test]
    fn symbols_are_read_across_interior_nodes() {
        // Codes '00', '01', '10' for symbols 7, 8, 9.
        let mut tree = HuffmanTree::build(&[0, 3], &[7, 8, 9]).unwrap();
        let bytes = [0b1000_0100u8];
        let mut reader = BitReader::new(&bytes[..]);
        assert_eq!(next_symbol(&mut reader, &mut tree).unwrap(), 9);
        assert_eq!(next_symbol(&mut reader, &mut tree).unwrap(), 7);
        assert_eq!(next_symbol(&mut reader, &mut tree).unwrap(), 8);
    }
}
