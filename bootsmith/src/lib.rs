/*
 * SPDX-FileCopyrightText: 2024 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

//! bootsmith is primarily an application, so the semver versioning covers the
//! CLI only. The Rust APIs can change at any time, even in patch releases.
//!
//! The CLI source files use concrete types wherever possible for simplicity,
//! while the "library"-style source files aim to be generic.

pub mod boot;
pub mod cli;
pub mod format;
pub mod hash;
pub mod mmap;
pub mod stream;
pub mod util;
