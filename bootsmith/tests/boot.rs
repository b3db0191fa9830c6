// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::fs;

use bootsmith::{
    boot::{self, UnpackStatus},
    format::{
        bootimage::{
            BOOT_MAGIC, BootImage, MTK_MAGIC, RawMtkHeader, RawV0, RawVendorV3,
            VENDOR_BOOT_MAGIC,
        },
        cpio::CpioArchive,
    },
};
use zerocopy::{FromZeros, IntoBytes};

mod common;

use common::{build_v2_image, gzip, minimal_fdt, page_align};

fn sample_ramdisk() -> Vec<u8> {
    let mut archive = CpioArchive::new();
    archive.mkdir(0o755, "sbin");
    archive.add(0o750, "init", b"#!/bin/sh\nexec /sbin/real-init\n".to_vec());
    archive.add(0o644, "init.rc", b"on boot\n    start adbd\n".to_vec());

    let mut data = vec![];
    archive.save(&mut data).unwrap();
    data
}

#[test]
fn unpack_then_repack_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();

    let ramdisk = sample_ramdisk();
    let image = build_v2_image(b"raw kernel", &gzip(&ramdisk), &minimal_fdt());

    let src = dir.path().join("boot.img");
    fs::write(&src, &image).unwrap();

    let status = boot::unpack_in(dir.path(), &src, false, false).unwrap();
    assert_eq!(status, UnpackStatus::Ok);
    assert_eq!(status.exit_code(), 0);

    // The gzip ramdisk was decompressed into a loadable archive.
    let extracted = fs::read(dir.path().join(boot::RAMDISK_FILE)).unwrap();
    assert_eq!(extracted, ramdisk);
    let archive = CpioArchive::load(&extracted).unwrap();
    assert!(archive.exists("init"));

    assert_eq!(
        fs::read(dir.path().join(boot::KERNEL_FILE)).unwrap(),
        b"raw kernel"
    );
    assert_eq!(fs::read(dir.path().join(boot::DTB_FILE)).unwrap(), minimal_fdt());

    let dst = dir.path().join("new.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();

    assert_eq!(fs::read(&dst).unwrap(), image);
}

#[test]
fn unpack_skip_decomp_then_repack_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();

    let image = build_v2_image(b"raw kernel", &gzip(&sample_ramdisk()), &minimal_fdt());

    let src = dir.path().join("boot.img");
    fs::write(&src, &image).unwrap();

    boot::unpack_in(dir.path(), &src, true, false).unwrap();

    // Still compressed on disk, so repack keeps the bytes as-is.
    let extracted = fs::read(dir.path().join(boot::RAMDISK_FILE)).unwrap();
    assert_eq!(extracted, gzip(&sample_ramdisk()));

    let dst = dir.path().join("new.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();

    assert_eq!(fs::read(&dst).unwrap(), image);
}

#[test]
fn repack_applies_ramdisk_changes() {
    let dir = tempfile::tempdir().unwrap();

    let image = build_v2_image(b"raw kernel", &gzip(&sample_ramdisk()), &minimal_fdt());
    let src = dir.path().join("boot.img");
    fs::write(&src, &image).unwrap();

    boot::unpack_in(dir.path(), &src, false, false).unwrap();

    let ramdisk_path = dir.path().join(boot::RAMDISK_FILE);
    let mut archive = CpioArchive::load_path(&ramdisk_path).unwrap();
    archive.add(0o700, "sbin/patched", b"marker".to_vec());
    archive.save_path(&ramdisk_path).unwrap();

    let dst = dir.path().join("new.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();

    let new_boot = BootImage::open(&dst).unwrap();
    let mut decompressed = vec![];
    bootsmith::format::compression::decompress_bytes(
        new_boot.ramdisk_fmt(),
        new_boot.ramdisk().unwrap(),
        &mut decompressed,
    )
    .unwrap();

    let new_archive = CpioArchive::load(&decompressed).unwrap();
    assert!(new_archive.exists("sbin/patched"));
    assert!(new_archive.exists("init"));

    // The id digest was recomputed over the new sections.
    assert_ne!(
        new_boot.header().id().unwrap(),
        BootImage::open(&src).unwrap().header().id().unwrap()
    );
}

#[test]
fn repack_preserves_mtk_wrapper() {
    let dir = tempfile::tempdir().unwrap();

    let ramdisk = gzip(&sample_ramdisk());

    let mut mtk = RawMtkHeader::new_zeroed();
    mtk.magic.set(MTK_MAGIC);
    mtk.size.set(ramdisk.len() as u32);
    mtk.name[..6].copy_from_slice(b"ROOTFS");

    let mut wrapped = mtk.as_bytes().to_vec();
    wrapped.extend_from_slice(&ramdisk);

    let page_size = 2048usize;
    let mut hdr = RawV0::new_zeroed();
    hdr.magic = BOOT_MAGIC;
    hdr.kernel_size.set(6);
    hdr.ramdisk_size.set(wrapped.len() as u32);
    hdr.page_size.set(page_size as u32);

    let mut image = hdr.as_bytes().to_vec();
    page_align(&mut image, page_size);
    image.extend_from_slice(b"kernel");
    page_align(&mut image, page_size);
    image.extend_from_slice(&wrapped);
    page_align(&mut image, page_size);

    let src = dir.path().join("boot.img");
    fs::write(&src, &image).unwrap();

    boot::unpack_in(dir.path(), &src, false, false).unwrap();

    let dst = dir.path().join("new.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();

    let new_boot = BootImage::open(&dst).unwrap();
    assert_eq!(new_boot.ramdisk().unwrap(), ramdisk);

    let new_mtk = new_boot.mtk_ramdisk_header().unwrap();
    assert_eq!(&new_mtk.name[..6], b"ROOTFS");
    assert_eq!(new_mtk.size.get(), ramdisk.len() as u32);
}

#[test]
fn unpack_reports_vendor_images() {
    let dir = tempfile::tempdir().unwrap();

    let page_size = 4096usize;
    let ramdisk = gzip(&sample_ramdisk());
    let dtb = minimal_fdt();

    let mut hdr = RawVendorV3::new_zeroed();
    hdr.magic = VENDOR_BOOT_MAGIC;
    hdr.header_version.set(3);
    hdr.page_size.set(page_size as u32);
    hdr.ramdisk_size.set(ramdisk.len() as u32);
    hdr.header_size.set(size_of::<RawVendorV3>() as u32);
    hdr.dtb_size.set(dtb.len() as u32);

    let mut image = hdr.as_bytes().to_vec();
    page_align(&mut image, page_size);
    image.extend_from_slice(&ramdisk);
    page_align(&mut image, page_size);
    image.extend_from_slice(&dtb);
    page_align(&mut image, page_size);

    let src = dir.path().join("vendor_boot.img");
    fs::write(&src, &image).unwrap();

    let status = boot::unpack_in(dir.path(), &src, false, false).unwrap();
    assert_eq!(status, UnpackStatus::Vendor);
    assert_eq!(status.exit_code(), 3);

    assert!(dir.path().join(boot::RAMDISK_FILE).exists());
    assert!(dir.path().join(boot::DTB_FILE).exists());
    assert!(!dir.path().join(boot::KERNEL_FILE).exists());

    let dst = dir.path().join("new.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), image);
}

#[test]
fn unpack_reports_chromeos_images() {
    let dir = tempfile::tempdir().unwrap();

    let inner = build_v2_image(b"raw kernel", &gzip(&sample_ramdisk()), &minimal_fdt());
    let mut image = vec![0u8; 65536];
    image[..8].copy_from_slice(b"CHROMEOS");
    image.extend_from_slice(&inner);

    let src = dir.path().join("boot.img");
    fs::write(&src, &image).unwrap();

    let status = boot::unpack_in(dir.path(), &src, false, false).unwrap();
    assert_eq!(status, UnpackStatus::ChromeOs);
    assert_eq!(status.exit_code(), 2);

    // The wrapper is stripped on repack; re-signing adds it back.
    let dst = dir.path().join("new.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), inner);
}

#[test]
fn header_file_round_trips_and_applies_changes() {
    let dir = tempfile::tempdir().unwrap();

    let image = build_v2_image(b"raw kernel", &gzip(&sample_ramdisk()), &minimal_fdt());
    let src = dir.path().join("boot.img");
    fs::write(&src, &image).unwrap();

    boot::unpack_in(dir.path(), &src, false, true).unwrap();

    let header_path = dir.path().join(boot::HEADER_FILE);
    let contents = fs::read_to_string(&header_path).unwrap();
    assert!(contents.contains("name=test\n"));
    assert!(contents.contains("cmdline=console=ttyS0\n"));
    assert!(contents.contains("os_version=12.0.0\n"));
    assert!(contents.contains("os_patch_level=2023-01\n"));

    // An unedited header file must not change the output.
    let dst = dir.path().join("same.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();
    assert_eq!(fs::read(&dst).unwrap(), image);

    // An edited cmdline is applied on repack.
    let edited = contents.replace("console=ttyS0", "console=null quiet");
    fs::write(&header_path, edited).unwrap();

    let dst = dir.path().join("edited.img");
    boot::repack_in(dir.path(), &src, &dst, false).unwrap();

    let new_boot = BootImage::open(&dst).unwrap();
    let cmdline = new_boot.header().cmdline().unwrap();
    assert!(cmdline.starts_with(b"console=null quiet\0"));
}

#[test]
fn split_dtb_moves_appended_blob() {
    let dir = tempfile::tempdir().unwrap();

    let fdt = minimal_fdt();
    let mut kernel = b"kernel code".to_vec();
    kernel.extend_from_slice(&fdt);

    let kernel_path = dir.path().join(boot::KERNEL_FILE);
    fs::write(&kernel_path, &kernel).unwrap();

    boot::split_image_dtb_in(dir.path(), &kernel_path, false).unwrap();

    assert_eq!(fs::read(&kernel_path).unwrap(), b"kernel code");
    assert_eq!(fs::read(dir.path().join(boot::KER_DTB_FILE)).unwrap(), fdt);
}

#[test]
fn split_dtb_without_blob_fails() {
    let dir = tempfile::tempdir().unwrap();

    let kernel_path = dir.path().join(boot::KERNEL_FILE);
    fs::write(&kernel_path, b"no device tree here").unwrap();

    assert!(matches!(
        boot::split_image_dtb_in(dir.path(), &kernel_path, false),
        Err(boot::Error::DtbNotFound)
    ));
}
