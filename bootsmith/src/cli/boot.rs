/*
 * SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::boot;

pub fn unpack_main(cli: &UnpackCli) -> Result<u8> {
    let status = boot::unpack(&cli.input, cli.skip_decomp, cli.hdr)
        .with_context(|| format!("Failed to unpack boot image: {:?}", cli.input))?;

    Ok(status.exit_code())
}

pub fn repack_main(cli: &RepackCli) -> Result<u8> {
    boot::repack(&cli.input, &cli.output, cli.skip_comp)
        .with_context(|| format!("Failed to repack boot image: {:?}", cli.input))?;

    Ok(0)
}

pub fn split_dtb_main(cli: &SplitDtbCli) -> Result<u8> {
    match boot::split_image_dtb(&cli.input, cli.skip_decomp) {
        Ok(()) => Ok(0),
        Err(boot::Error::DtbNotFound) => {
            eprintln!("No device tree found in {:?}", cli.input);
            Ok(1)
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to split image: {:?}", cli.input))
        }
    }
}

/// Unpack a boot image into well-known component files in the current
/// directory.
#[derive(Debug, Parser)]
pub struct UnpackCli {
    /// Path to input boot image.
    #[arg(value_name = "FILE", value_parser)]
    pub input: PathBuf,

    /// Do not decompress the kernel and ramdisk sections.
    #[arg(long)]
    pub skip_decomp: bool,

    /// Dump the header fields to the `header` file.
    #[arg(long)]
    pub hdr: bool,
}

/// Repack component files from the current directory into a new boot image.
#[derive(Debug, Parser)]
pub struct RepackCli {
    /// Path to the original boot image.
    #[arg(value_name = "IN_FILE", value_parser)]
    pub input: PathBuf,

    /// Path to output boot image.
    #[arg(value_name = "OUT_FILE", value_parser)]
    pub output: PathBuf,

    /// Do not recompress the kernel and ramdisk sections.
    #[arg(long)]
    pub skip_comp: bool,
}

/// Split an appended device tree blob out of a kernel image.
#[derive(Debug, Parser)]
pub struct SplitDtbCli {
    /// Path to input kernel or boot image.
    #[arg(value_name = "FILE", value_parser)]
    pub input: PathBuf,

    /// Do not decompress the kernel.
    #[arg(long)]
    pub skip_decomp: bool,
}
