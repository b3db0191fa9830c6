/*
 * SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    io,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cli::{boot, cpio};

#[derive(Debug, Subcommand)]
pub enum Command {
    Unpack(boot::UnpackCli),
    Repack(boot::RepackCli),
    SplitDtb(boot::SplitDtbCli),
    Cpio(cpio::CpioCli),
}

/// Manipulate Android boot images and their ramdisk cpio archives.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

/// Returns the process exit code. Several commands use the exit code as their
/// result channel, so errors that should exit non-zero without a diagnostic
/// are plain `Ok` values here.
pub fn main(logging_initialized: &AtomicBool) -> Result<u8> {
    let cli = Cli::parse();

    init_logging();
    logging_initialized.store(true, Ordering::SeqCst);

    match cli.command {
        Command::Unpack(c) => boot::unpack_main(&c),
        Command::Repack(c) => boot::repack_main(&c),
        Command::SplitDtb(c) => boot::split_dtb_main(&c),
        Command::Cpio(c) => cpio::cpio_main(&c),
    }
}
