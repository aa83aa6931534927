// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// One 8-bit RGB pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Where decoded output lands. The decoder sets the size exactly once
/// (before any pixel write), records at most one comment, and only touches
/// pixels inside the declared size.
pub trait ImageSink {
    fn set_size(&mut self, width: usize, height: usize);
    fn set_comment(&mut self, comment: String);
    fn pixel_at_mut(&mut self, row: usize, col: usize) -> &mut Pixel;
}

/// Owned RGB image, the default sink.
#[derive(Clone, Debug, Default)]
pub struct Image {
    width: usize,
    height: usize,
    pixels: Vec<Pixel>,
    comment: Option<String>,
}

impl Image {
    pub fn new() -> Image {
        Image::default()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn pixel(&self, row: usize, col: usize) -> Pixel {
        self.pixels[row * self.width + col]
    }
}

impl ImageSink for Image {
    fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Pixel::default(); width * height];
    }

    fn set_comment(&mut self, comment: String) {
        self.comment = Some(comment);
    }

    fn pixel_at_mut(&mut self, row: usize, col: usize) -> &mut Pixel {
        &mut self.pixels[row * self.width + col]
    }
}
