// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

use crate::markers::Marker;

/// Every way a decode can fail. Errors are never retried and a partial image
/// is never returned.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream does not open with an SOI marker")]
    BadMagic,
    #[error("Unexpected end of stream")]
    UnexpectedEnd,
    #[error("Invalid segment length {0}")]
    BadSegmentLength(u16),
    #[error("Unknown marker {0:#06x}")]
    UnknownMarker(u16),
    #[error("Segment or table of kind {0:?} defined twice")]
    DuplicateSegment(Marker),
    #[error("Malformed Huffman table: {0}")]
    MalformedTree(&'static str),
    #[error("Entropy stream walked off the Huffman tree")]
    InvalidCode,
    #[error("No {0} table with id {1}")]
    MissingTable(&'static str, u8),
    #[error("Not a baseline sequential stream: {0}")]
    NotBaseline(&'static str),
    #[error("Unsupported sampling factor multiplier {0}")]
    UnsupportedSampling(u8),
    #[error("Run length overflows the 64 coefficients of a data unit")]
    DataUnitOverflow,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
