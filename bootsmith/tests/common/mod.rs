// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use bootsmith::{
    format::{
        bootimage::{BOOT_MAGIC, RawV2},
        compression::{self, FileFormat},
    },
    hash::{HashAlgorithm, Hasher},
};
use zerocopy::{FromZeros, IntoBytes};

pub const PAGE_SIZE: usize = 4096;

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut out = vec![];
    compression::compress_bytes(FileFormat::Gzip, data, &mut out).unwrap();
    out
}

pub fn page_align(buf: &mut Vec<u8>, page_size: usize) {
    while buf.len() % page_size != 0 {
        buf.push(0);
    }
}

/// A minimal valid flattened device tree: the 40-byte header followed by a
/// single BEGIN_NODE tag and an END tag.
pub fn minimal_fdt() -> Vec<u8> {
    let mut fdt = vec![];
    fdt.extend_from_slice(b"\xd0\x0d\xfe\xed"); // magic
    fdt.extend_from_slice(&48u32.to_be_bytes()); // totalsize
    fdt.extend_from_slice(&40u32.to_be_bytes()); // off_dt_struct
    fdt.extend_from_slice(&48u32.to_be_bytes()); // off_dt_strings
    fdt.extend_from_slice(&40u32.to_be_bytes()); // off_mem_rsvmap
    fdt.extend_from_slice(&17u32.to_be_bytes()); // version
    fdt.extend_from_slice(&16u32.to_be_bytes()); // last_comp_version
    fdt.extend_from_slice(&0u32.to_be_bytes()); // boot_cpuid_phys
    fdt.extend_from_slice(&0u32.to_be_bytes()); // size_dt_strings
    fdt.extend_from_slice(&8u32.to_be_bytes()); // size_dt_struct
    fdt.extend_from_slice(&1u32.to_be_bytes()); // FDT_BEGIN_NODE
    fdt.extend_from_slice(&9u32.to_be_bytes()); // FDT_END
    fdt
}

/// Build a v2 boot image with a correct SHA-1 id digest, the way mkbootimg
/// would.
pub fn build_v2_image(kernel: &[u8], ramdisk: &[u8], dtb: &[u8]) -> Vec<u8> {
    let mut hdr = RawV2::new_zeroed();
    hdr.v1.v0.magic = BOOT_MAGIC;
    hdr.v1.v0.kernel_size.set(kernel.len() as u32);
    hdr.v1.v0.kernel_addr.set(0x1000_8000);
    hdr.v1.v0.ramdisk_size.set(ramdisk.len() as u32);
    hdr.v1.v0.ramdisk_addr.set(0x1100_0000);
    hdr.v1.v0.tags_addr.set(0x1000_0100);
    hdr.v1.v0.page_size.set(PAGE_SIZE as u32);
    hdr.v1.v0.header_version.set(2);
    hdr.v1.v0.os_version.set((12 << 14) << 11 | (23 << 4) | 1);
    hdr.v1.v0.name[..4].copy_from_slice(b"test");
    hdr.v1.v0.cmdline[..14].copy_from_slice(b"console=ttyS0\0");
    hdr.v1.header_size.set(size_of::<RawV2>() as u32);
    hdr.dtb_size.set(dtb.len() as u32);
    hdr.dtb_addr.set(0x1180_0000);

    let mut hasher = Hasher::new(HashAlgorithm::Sha1);
    hasher.update(kernel);
    hasher.update(&(kernel.len() as u32).to_le_bytes());
    hasher.update(ramdisk);
    hasher.update(&(ramdisk.len() as u32).to_le_bytes());
    hasher.update(&0u32.to_le_bytes()); // second
    hasher.update(&0u32.to_le_bytes()); // recovery_dtbo
    hasher.update(dtb);
    hasher.update(&(dtb.len() as u32).to_le_bytes());
    hasher.finalize_into(&mut hdr.v1.v0.id);

    let mut image = hdr.as_bytes().to_vec();
    page_align(&mut image, PAGE_SIZE);

    for section in [kernel, ramdisk, dtb] {
        image.extend_from_slice(section);
        page_align(&mut image, PAGE_SIZE);
    }

    image
}
