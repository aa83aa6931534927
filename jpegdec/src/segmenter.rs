// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io::BufRead;

use byteorder::{BigEndian, ByteOrder};

use crate::bit_reader::BitReader;
use crate::error::{Error, Result};
use crate::markers::Marker;
use crate::util::tracing_wrappers::*;

/// One marker segment: its kind plus the raw bytes starting at the two-byte
/// length prefix. For the scan segment the entropy-coded payload follows the
/// header bytes, with byte stuffing already removed.
pub struct Segment {
    pub marker: Marker,
    pub data: Vec<u8>,
}

/// Splits a JPEG stream into its marker segments and stably reorders them
/// for processing: frame header, then Huffman tables, then quantization
/// tables, then the scan.
pub fn split_segments<R: BufRead>(reader: &mut BitReader<R>) -> Result<Vec<Segment>> {
    if Marker::from_code(reader.read_u16()?) != Some(Marker::Soi) {
        return Err(Error::BadMagic);
    }

    let mut segments: Vec<Segment> = Vec::new();
    let mut pending_code = None;

    loop {
        let code = match pending_code.take() {
            Some(code) => code,
            None => read_marker_code(reader)?,
        };
        let marker = Marker::from_code(code).ok_or(Error::UnknownMarker(code))?;

        match marker {
            Marker::Soi => return Err(Error::DuplicateSegment(Marker::Soi)),
            Marker::Eoi => break,
            _ => {}
        }

        let length = reader.read_u16()?;
        if length < 2 {
            return Err(Error::BadSegmentLength(length));
        }
        debug!("marker {marker:?}, declared length {length}");

        let mut data = Vec::with_capacity(length as usize);
        data.extend_from_slice(&length.to_be_bytes());
        for _ in 2..length {
            data.push(reader.read_byte()?);
        }

        if marker == Marker::Sos {
            pending_code = Some(read_scan_payload(reader, &mut data)?);
        }

        segments.push(Segment { marker, data });
    }

    // sort_by_key is stable, so comments and application data keep their
    // original relative order.
    segments.sort_by_key(|segment| segment.marker.processing_order());
    Ok(segments)
}

/// Reads the next two-byte marker code, collapsing runs of 0xff fill bytes.
fn read_marker_code<R: BufRead>(reader: &mut BitReader<R>) -> Result<u16> {
    let mut word = [reader.read_byte()?, reader.read_byte()?];
    while word == [0xff, 0xff] {
        word[1] = reader.read_byte()?;
    }
    Ok(BigEndian::read_u16(&word))
}

/// Consumes the entropy-coded bytes that follow a scan header. A 0xff 0x00
/// pair is an escaped literal 0xff; any other 0xff sequence is the next
/// marker code, which is returned.
fn read_scan_payload<R: BufRead>(reader: &mut BitReader<R>, data: &mut Vec<u8>) -> Result<u16> {
    loop {
        let byte = reader.read_byte()?;
        if byte != 0xff {
            data.push(byte);
            continue;
        }
        let second = reader.read_byte()?;
        if second == 0x00 {
            data.push(0xff);
        } else {
            return Ok(BigEndian::read_u16(&[0xff, second]));
        }
    }
}

#[cfg(test)]
mod test {
    use byteorder::WriteBytesExt;
    use test_log::test;

    use super::*;

    fn push_segment(bytes: &mut Vec<u8>, marker: u16, payload: &[u8]) {
        bytes.write_u16::<BigEndian>(marker).unwrap();
        bytes
            .write_u16::<BigEndian>(payload.len() as u16 + 2)
            .unwrap();
        bytes.extend_from_slice(payload);
    }

    #[test]
    fn missing_soi_is_bad_magic() {
        assert!(matches!(
            split_segments(&mut BitReader::new(&b"not a jpeg"[..])),
            Err(Error::BadMagic)
        ));
    }

    #[test]
    fn a_second_soi_is_rejected() {
        let bytes = [0xff, 0xd8, 0xff, 0xd8];
        assert!(matches!(
            split_segments(&mut BitReader::new(&bytes[..])),
            Err(Error::DuplicateSegment(Marker::Soi))
        ));
    }

    #[test]
    fn unknown_markers_are_rejected() {
        let mut bytes = vec![0xff, 0xd8];
        push_segment(&mut bytes, 0xffc2, &[0; 4]); // progressive frame header
        bytes.extend_from_slice(&[0xff, 0xd9]);
        assert!(matches!(
            split_segments(&mut BitReader::new(&bytes[..])),
            Err(Error::UnknownMarker(0xffc2))
        ));
    }

    #[test]
    fn declared_length_below_two_is_rejected() {
        let bytes = [0xff, 0xd8, 0xff, 0xfe, 0x00, 0x01];
        assert!(matches!(
            split_segments(&mut BitReader::new(&bytes[..])),
            Err(Error::BadSegmentLength(1))
        ));
    }

    #[test]
    fn fill_bytes_before_a_marker_collapse() {
        let mut bytes = vec![0xff, 0xd8, 0xff, 0xff]; // two fill bytes, then COM
        bytes.extend_from_slice(&[0xff, 0xfe, 0x00, 0x04, b'h', b'i']);
        bytes.extend_from_slice(&[0xff, 0xd9]);
        let segments = split_segments(&mut BitReader::new(&bytes[..])).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].marker, Marker::Com);
        assert_eq!(segments[0].data, [0x00, 0x04, b'h', b'i']);
    }

    #[test]
    fn scan_payload_is_unstuffed_and_terminated_by_a_marker() {
        let mut bytes = vec![0xff, 0xd8];
        push_segment(&mut bytes, 0xffda, &[0x01, 0x01, 0x00, 0x00, 0x3f, 0x00]);
        bytes.extend_from_slice(&[0x12, 0xff, 0x00, 0x34]); // scan with escaped 0xff
        bytes.extend_from_slice(&[0xff, 0xd9]);
        let segments = split_segments(&mut BitReader::new(&bytes[..])).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(
            segments[0].data,
            [0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3f, 0x00, 0x12, 0xff, 0x34]
        );
    }

    #[test]
    fn segments_are_reordered_for_processing() {
        let mut bytes = vec![0xff, 0xd8];
        push_segment(&mut bytes, 0xffe0, b"JFIF");
        push_segment(&mut bytes, 0xffdb, &[0; 65]);
        push_segment(&mut bytes, 0xffc4, &[0; 17]);
        push_segment(&mut bytes, 0xfffe, b"x");
        push_segment(&mut bytes, 0xffc0, &[0; 9]);
        push_segment(&mut bytes, 0xffda, &[0x01, 0x01, 0x00, 0x00, 0x3f, 0x00]);
        bytes.extend_from_slice(&[0xff, 0xd9]);
        let segments = split_segments(&mut BitReader::new(&bytes[..])).unwrap();
        let order: Vec<Marker> = segments.iter().map(|segment| segment.marker).collect();
        assert_eq!(
            order,
            [
                Marker::App,
                Marker::Com,
                Marker::Sof0,
                Marker::Dht,
                Marker::Dqt,
                Marker::Sos
            ]
        );
    }

    #[test]
    fn truncated_payload_is_unexpected_end() {
        let bytes = [0xff, 0xd8, 0xff, 0xfe, 0x00, 0x10, b'a'];
        assert!(matches!(
            split_segments(&mut BitReader::new(&bytes[..])),
            Err(Error::UnexpectedEnd)
        ));
    }
}
