// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::BufRead;

use crate::bit_reader::BitReader;
use crate::context::DecoderContext;
use crate::error::{Error, Result};
use crate::image::{Image, ImageSink};
use crate::segmenter::split_segments;
use crate::segments::handle_segment;
use crate::util::tracing_wrappers::*;

/// Decodes a baseline sequential JPEG stream into `sink`.
pub fn decode_into<R: BufRead, S: ImageSink>(input: R, sink: &mut S) -> Result<()> {
    let mut reader = BitReader::new(input);
    let segments = split_segments(&mut reader)?;
    info!("collected {} segments", segments.len());

    let mut context = DecoderContext::new();
    for segment in &segments {
        handle_segment(segment, &mut context, sink)?;
    }
    if !context.frame_header_seen || !context.scan_seen {
        warn!("stream ended without a frame header or scan");
        return Err(Error::UnexpectedEnd);
    }
    Ok(())
}

/// Decodes a baseline sequential JPEG stream into a fresh [`Image`].
pub fn decode<R: BufRead>(input: R) -> Result<Image> {
    let mut image = Image::new();
    decode_into(input, &mut image)?;
    Ok(image)
}
