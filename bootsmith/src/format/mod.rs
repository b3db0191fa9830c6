/*
 * SPDX-FileCopyrightText: 2024 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

pub mod avb;
pub mod bootimage;
pub mod compression;
pub mod cpio;
pub mod padding;
