/*
 * SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;

use crate::format::cpio::CpioArchive;

/// Execute whitespace-tokenized commands against a cpio archive, writing it
/// back only when a mutating command ran. `test` and `exists` short-circuit
/// and report through the exit code.
pub fn cpio_main(cli: &CpioCli) -> Result<u8> {
    let mut archive = CpioArchive::load_path(&cli.file)
        .with_context(|| format!("Failed to load cpio: {:?}", cli.file))?;
    let mut dirty = false;

    for raw in &cli.commands {
        let tokens = raw.split_whitespace().collect::<Vec<_>>();
        let Some((&op, args)) = tokens.split_first() else {
            continue;
        };

        match op {
            "test" => return Ok(archive.patch_status().exit_code()),
            "exists" => {
                let [path] = args else {
                    bail!("cpio exists: expected 1 argument");
                };
                return Ok(if archive.exists(path) { 0 } else { 1 });
            }
            "add" => {
                let [mode, path, src_file] = args else {
                    bail!("cpio add: expected 3 arguments");
                };
                let mode = u32::from_str_radix(mode, 8)
                    .with_context(|| format!("Invalid octal mode: {mode}"))?;
                let data = fs::read(src_file)
                    .with_context(|| format!("Failed to read source file: {src_file}"))?;

                debug!("Adding {path} with mode 0o{mode:o}");
                archive.add(mode, path, data);
                dirty = true;
            }
            "mkdir" => {
                let [mode, path] = args else {
                    bail!("cpio mkdir: expected 2 arguments");
                };
                let mode = u32::from_str_radix(mode, 8)
                    .with_context(|| format!("Invalid octal mode: {mode}"))?;

                debug!("Creating directory {path} with mode 0o{mode:o}");
                archive.mkdir(mode, path);
                dirty = true;
            }
            "rm" => {
                let [path] = args else {
                    bail!("cpio rm: expected 1 argument");
                };
                if !archive.rm(path) {
                    debug!("No entry to remove: {path}");
                }
                dirty = true;
            }
            "mv" => {
                let [from, to] = args else {
                    bail!("cpio mv: expected 2 arguments");
                };
                archive
                    .mv(from, to)
                    .with_context(|| format!("Failed to move {from} to {to}"))?;
                dirty = true;
            }
            _ => bail!("Unsupported cpio command: {op}"),
        }
    }

    if dirty {
        archive
            .save_path(&cli.file)
            .with_context(|| format!("Failed to write cpio: {:?}", cli.file))?;
    }

    Ok(0)
}

/// Manipulate a newc cpio archive in place.
#[derive(Debug, Parser)]
pub struct CpioCli {
    /// Path to the cpio archive.
    #[arg(value_name = "FILE", value_parser)]
    pub file: PathBuf,

    /// Commands to apply, each a whitespace-joined token list.
    #[arg(value_name = "CMD", required = true)]
    pub commands: Vec<String>,
}
