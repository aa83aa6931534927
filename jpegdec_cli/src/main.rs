// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use jpegdec::decode::decode;

pub mod enc;

#[derive(Parser)]
#[command(about = "Decode a baseline sequential JPEG file to binary PPM")]
struct Opt {
    /// Input JPEG file.
    input: PathBuf,
    /// Output PPM file.
    output: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(EnvFilter::from_default_env())
            .init();
    }
    let opt = Opt::parse();

    let file = File::open(&opt.input)
        .wrap_err_with(|| format!("Failed to open {:?}", opt.input))?;
    let image = decode(BufReader::new(file))
        .wrap_err_with(|| format!("Failed to decode {:?}", opt.input))?;
    if let Some(comment) = image.comment() {
        println!("comment: {comment}");
    }

    let mut writer = BufWriter::new(
        File::create(&opt.output)
            .wrap_err_with(|| format!("Failed to create {:?}", opt.output))?,
    );
    enc::pnm::to_ppm(&image, &mut writer)?;
    writer
        .flush()
        .wrap_err_with(|| format!("Failed to write decoded image to {:?}", opt.output))
}
