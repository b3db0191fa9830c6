// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only
//
// Only the structures needed to locate AVB metadata inside a boot image.
// Verification and signing are intentionally not implemented.

use std::mem;

use zerocopy::big_endian;
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const FOOTER_MAGIC: &[u8; 4] = b"AVBf";
pub const HEADER_MAGIC: &[u8; 4] = b"AVB0";

pub const RELEASE_STRING_SIZE: usize = 48;

/// Raw on-disk layout of the footer stored in the final bytes of a signed
/// partition image. All integers are big endian.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct Footer {
    /// Magic value. This should be equal to [`FOOTER_MAGIC`].
    pub magic: [u8; 4],
    pub version_major: big_endian::U32,
    pub version_minor: big_endian::U32,
    pub original_image_size: big_endian::U64,
    pub vbmeta_offset: big_endian::U64,
    pub vbmeta_size: big_endian::U64,
    pub reserved: [u8; 28],
}

/// Raw on-disk layout of the vbmeta image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct VbmetaImageHeader {
    /// Magic value. This should be equal to [`HEADER_MAGIC`].
    pub magic: [u8; 4],
    pub required_libavb_version_major: big_endian::U32,
    pub required_libavb_version_minor: big_endian::U32,
    pub authentication_data_block_size: big_endian::U64,
    pub auxiliary_data_block_size: big_endian::U64,
    pub algorithm_type: big_endian::U32,
    pub hash_offset: big_endian::U64,
    pub hash_size: big_endian::U64,
    pub signature_offset: big_endian::U64,
    pub signature_size: big_endian::U64,
    pub public_key_offset: big_endian::U64,
    pub public_key_size: big_endian::U64,
    pub public_key_metadata_offset: big_endian::U64,
    pub public_key_metadata_size: big_endian::U64,
    pub descriptors_offset: big_endian::U64,
    pub descriptors_size: big_endian::U64,
    pub rollback_index: big_endian::U64,
    pub flags: big_endian::U32,
    pub rollback_index_location: big_endian::U32,
    pub release_string: [u8; RELEASE_STRING_SIZE],
    pub reserved: [u8; 80],
}

/// Offset of the footer within `data`, if the final bytes carry one.
pub fn footer_offset(data: &[u8]) -> Option<usize> {
    let size = mem::size_of::<Footer>();
    if data.len() < size {
        return None;
    }

    let offset = data.len() - size;
    if data[offset..].starts_with(FOOTER_MAGIC) {
        Some(offset)
    } else {
        None
    }
}
