// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::context::{Channel, DecoderContext, QuantTable, DATA_UNIT_AREA, DATA_UNIT_SIDE};
use crate::error::{Error, Result};
use crate::huffman::{HuffmanTree, MAX_TREE_DEPTH};
use crate::image::ImageSink;
use crate::markers::Marker;
use crate::scan::ScanDecoder;
use crate::segmenter::Segment;
use crate::util::tracing_wrappers::*;
use crate::zigzag::ZigZagIter;

/// Applies one segment to the decoder state. The segment bytes start at the
/// two-byte length prefix, which each handler re-reads. The scan handler
/// additionally drives the MCU pipeline over the entropy-coded payload that
/// follows its header fields.
pub fn handle_segment<S: ImageSink>(
    segment: &Segment,
    context: &mut DecoderContext,
    sink: &mut S,
) -> Result<()> {
    let mut reader = BitReader::new(segment.data.as_slice());
    match segment.marker {
        Marker::Sof0 => handle_sof0(&mut reader, context, sink),
        Marker::Dht => handle_dht(&mut reader, context),
        Marker::Dqt => handle_dqt(&mut reader, context),
        Marker::Com => handle_com(&mut reader, sink),
        Marker::App => Ok(()),
        Marker::Sos => handle_sos(&mut reader, context, sink),
        // SOI and EOI carry no payload and never reach the handlers.
        Marker::Soi | Marker::Eoi => Ok(()),
    }
}

fn handle_sof0<S: ImageSink>(
    reader: &mut BitReader<&[u8]>,
    context: &mut DecoderContext,
    sink: &mut S,
) -> Result<()> {
    if context.frame_header_seen {
        return Err(Error::DuplicateSegment(Marker::Sof0));
    }
    context.frame_header_seen = true;

    let length = reader.read_u16()?;
    context.precision = reader.read_byte()?;
    if context.precision != 8 {
        return Err(Error::NotBaseline("sample precision must be 8"));
    }
    context.height = reader.read_u16()?;
    context.width = reader.read_u16()?;
    if context.width == 0 || context.height == 0 {
        return Err(Error::NotBaseline("image dimensions must be non-zero"));
    }
    let channel_count = reader.read_byte()?;
    if channel_count != 1 && channel_count != 3 {
        return Err(Error::NotBaseline("channel count must be 1 or 3"));
    }
    if length != 8 + 3 * u16::from(channel_count) {
        return Err(Error::BadSegmentLength(length));
    }
    debug!(
        "frame {}x{}, {channel_count} channels",
        context.width, context.height
    );
    sink.set_size(context.width as usize, context.height as usize);

    context.channels = vec![Channel::default(); channel_count as usize];
    for _ in 0..channel_count {
        // Channel ids are 1-based on the wire.
        let id = reader.read_byte()?.wrapping_sub(1) as usize;
        let channel = context
            .channels
            .get_mut(id)
            .ok_or(Error::NotBaseline("channel id out of range"))?;
        channel.horizontal_scale = reader.read_nibble()?;
        channel.vertical_scale = reader.read_nibble()?;
        channel.qt_id = reader.read_byte()?;
    }

    let h_max = context.channels.iter().map(|c| c.horizontal_scale).max();
    let v_max = context.channels.iter().map(|c| c.vertical_scale).max();
    let (Some(h_max), Some(v_max)) = (h_max, v_max) else {
        return Err(Error::NotBaseline("channel count must be 1 or 3"));
    };

    for channel in &mut context.channels {
        if channel.horizontal_scale == 0 || channel.vertical_scale == 0 {
            return Err(Error::UnsupportedSampling(0));
        }
        // From here on the fields hold the up-sampling multipliers.
        channel.horizontal_scale = h_max / channel.horizontal_scale;
        channel.vertical_scale = v_max / channel.vertical_scale;
        let scale = channel.horizontal_scale.max(channel.vertical_scale);
        if scale > 2 {
            return Err(Error::UnsupportedSampling(scale));
        }
        context.mcu_width = context
            .mcu_width
            .max(DATA_UNIT_SIDE * channel.horizontal_scale as usize);
        context.mcu_height = context
            .mcu_height
            .max(DATA_UNIT_SIDE * channel.vertical_scale as usize);
    }
    debug!("MCU size {}x{}", context.mcu_height, context.mcu_width);

    Ok(())
}

fn handle_dht(reader: &mut BitReader<&[u8]>, context: &mut DecoderContext) -> Result<()> {
    let _length = reader.read_u16()?;
    while !reader.is_end()? {
        // The segment carries exactly its declared payload, so a table that
        // runs past it is structurally broken, not a truncated stream.
        read_huffman_table(reader, context).map_err(|error| match error {
            Error::UnexpectedEnd => Error::MalformedTree("table data runs past the segment"),
            other => other,
        })?;
    }
    Ok(())
}

fn read_huffman_table(reader: &mut BitReader<&[u8]>, context: &mut DecoderContext) -> Result<()> {
    let class = reader.read_nibble()?;
    let id = reader.read_nibble()?;
    if class > 1 {
        return Err(Error::MalformedTree("table class must be DC or AC"));
    }
    let mut code_lengths = [0u8; MAX_TREE_DEPTH];
    reader.fill(&mut code_lengths)?;
    let value_count: usize = code_lengths.iter().map(|&count| count as usize).sum();
    let mut values = vec![0u8; value_count];
    reader.fill(&mut values)?;
    debug!(
        "DHT {} table {id}, {value_count} values",
        if class == 1 { "AC" } else { "DC" }
    );

    let tree = HuffmanTree::build(&code_lengths, &values)?;
    let tables = if class == 1 {
        &mut context.ac_tables
    } else {
        &mut context.dc_tables
    };
    if tables.insert(id, tree).is_some() {
        return Err(Error::DuplicateSegment(Marker::Dht));
    }
    Ok(())
}

fn handle_dqt(reader: &mut BitReader<&[u8]>, context: &mut DecoderContext) -> Result<()> {
    let _length = reader.read_u16()?;
    while !reader.is_end()? {
        let element_size = reader.read_nibble()?;
        if element_size > 1 {
            return Err(Error::NotBaseline("quantization table element size"));
        }
        let id = reader.read_nibble()?;
        let mut table: QuantTable = [0; DATA_UNIT_AREA];
        // Values arrive in zig-zag order; store them de-zig-zagged.
        for (row, col) in ZigZagIter::new() {
            table[row * DATA_UNIT_SIDE + col] = if element_size == 1 {
                reader.read_u16()?
            } else {
                u16::from(reader.read_byte()?)
            };
        }
        debug!("DQT table {id}, {}-byte elements", element_size + 1);
        if context.quant_tables.insert(id, table).is_some() {
            return Err(Error::DuplicateSegment(Marker::Dqt));
        }
    }
    Ok(())
}

fn handle_com<S: ImageSink>(reader: &mut BitReader<&[u8]>, sink: &mut S) -> Result<()> {
    let length = reader.read_u16()?;
    let comment = reader.read_string(length as usize - 2)?;
    debug!("comment: {comment}");
    sink.set_comment(comment);
    Ok(())
}

fn handle_sos<S: ImageSink>(
    reader: &mut BitReader<&[u8]>,
    context: &mut DecoderContext,
    sink: &mut S,
) -> Result<()> {
    if context.scan_seen {
        return Err(Error::DuplicateSegment(Marker::Sos));
    }
    context.scan_seen = true;
    if !context.frame_header_seen {
        // The reorder pass puts SOF0 first, so reaching the scan without one
        // means the stream never carried a frame header.
        return Err(Error::UnexpectedEnd);
    }

    let length = reader.read_u16()?;
    let channel_count = reader.read_byte()? as usize;
    if channel_count != context.channels.len() {
        return Err(Error::NotBaseline("SOS and SOF0 channel counts differ"));
    }
    if length as usize != 6 + 2 * channel_count {
        return Err(Error::BadSegmentLength(length));
    }

    let mut scan_channels = Vec::with_capacity(channel_count);
    let mut scan_ids: Vec<usize> = Vec::with_capacity(channel_count);
    let mut dc_trees = Vec::with_capacity(channel_count);
    let mut ac_trees = Vec::with_capacity(channel_count);

    for _ in 0..channel_count {
        let id = reader.read_byte()?.wrapping_sub(1) as usize;
        let channel = *context
            .channels
            .get(id)
            .ok_or(Error::NotBaseline("scan references an unknown channel"))?;
        if scan_ids.contains(&id) {
            return Err(Error::NotBaseline("scan lists a channel twice"));
        }
        scan_ids.push(id);

        let dc_id = reader.read_nibble()?;
        let ac_id = reader.read_nibble()?;
        let dc = context
            .dc_tables
            .get(&dc_id)
            .ok_or(Error::MissingTable("DC", dc_id))?;
        let ac = context
            .ac_tables
            .get(&ac_id)
            .ok_or(Error::MissingTable("AC", ac_id))?;
        if !context.quant_tables.contains_key(&channel.qt_id) {
            return Err(Error::MissingTable("quantization", channel.qt_id));
        }
        debug!("scan channel {id}: DC table {dc_id}, AC table {ac_id}");
        dc_trees.push(dc.clone());
        ac_trees.push(ac.clone());
        scan_channels.push(channel);
    }

    // Ss, Se, Ah/Al. Baseline sequential pins them to 0, 63, 0.
    let spectral_start = reader.read_byte()?;
    let spectral_end = reader.read_byte()?;
    let approximation = reader.read_byte()?;
    if spectral_start != 0x00 || spectral_end != 0x3f || approximation != 0x00 {
        return Err(Error::NotBaseline("progressive scan parameters"));
    }

    // The scan interleave follows SOS order; rewrite the channel list to
    // match before the pipeline starts reading data units.
    context.channels = scan_channels;

    ScanDecoder::new(context, dc_trees, ac_trees, sink).run(reader)
}
