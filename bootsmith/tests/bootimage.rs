// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::io::Write;

use assert_matches::assert_matches;
use bootsmith::format::{
    bootimage::{
        BOOT_MAGIC, BootFlags, BootHeader, BootImage, Error, LG_BUMP_MAGIC, MTK_MAGIC,
        RawMtkHeader, RawV0, RawV3, RawV4, RawVendorRamdiskTableEntry, RawVendorV4,
        RawZImageHeader, SEANDROID_MAGIC, VENDOR_BOOT_MAGIC, ZIMAGE_MAGIC, find_dtb_offset,
    },
    compression::FileFormat,
};
use zerocopy::{FromZeros, IntoBytes};

mod common;

use common::{PAGE_SIZE, build_v2_image, gzip, minimal_fdt, page_align};

fn try_open_image(data: &[u8]) -> Result<BootImage, Error> {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();

    BootImage::open(file.path())
}

fn open_image(data: &[u8]) -> BootImage {
    try_open_image(data).unwrap()
}

fn build_v0_image(
    kernel: &[u8],
    ramdisk: &[u8],
    second: &[u8],
    page_size: usize,
    patch: impl FnOnce(&mut RawV0),
) -> Vec<u8> {
    let mut hdr = RawV0::new_zeroed();
    hdr.magic = BOOT_MAGIC;
    hdr.kernel_size.set(kernel.len() as u32);
    hdr.ramdisk_size.set(ramdisk.len() as u32);
    hdr.second_size.set(second.len() as u32);
    hdr.page_size.set(page_size as u32);
    patch(&mut hdr);

    let mut image = hdr.as_bytes().to_vec();
    page_align(&mut image, page_size);

    for section in [kernel, ramdisk, second] {
        image.extend_from_slice(section);
        page_align(&mut image, page_size);
    }

    image
}

fn mtk_wrap(name: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mtk = RawMtkHeader::new_zeroed();
    mtk.magic.set(MTK_MAGIC);
    mtk.size.set(data.len() as u32);
    mtk.name[..name.len()].copy_from_slice(name);

    let mut out = mtk.as_bytes().to_vec();
    out.extend_from_slice(data);
    out
}

#[test]
fn parse_v0_image() {
    let ramdisk = gzip(b"ramdisk contents");
    let image = build_v0_image(b"raw kernel", &ramdisk, b"", 2048, |_| {});

    let boot = open_image(&image);

    assert_eq!(boot.header().header_version(), 0);
    assert_eq!(boot.header().page_size(), 2048);
    assert!(!boot.header().is_vendor());
    assert_eq!(boot.kernel().unwrap(), b"raw kernel");
    assert_eq!(boot.ramdisk().unwrap(), ramdisk);
    assert_eq!(boot.second(), None);
    assert_eq!(boot.kernel_fmt(), FileFormat::Unknown);
    assert_eq!(boot.ramdisk_fmt(), FileFormat::Gzip);
    assert_eq!(boot.flags(), BootFlags::empty());
    assert!(boot.tail().is_empty());
}

#[test]
fn parse_v2_image() {
    let ramdisk = gzip(b"ramdisk contents");
    let dtb = minimal_fdt();
    let image = build_v2_image(b"raw kernel", &ramdisk, &dtb);

    let boot = open_image(&image);

    assert_eq!(boot.header().header_version(), 2);
    assert_eq!(boot.header().page_size(), PAGE_SIZE as u32);
    assert_eq!(boot.kernel().unwrap(), b"raw kernel");
    assert_eq!(boot.ramdisk().unwrap(), ramdisk);
    assert_eq!(boot.dtb().unwrap(), dtb);
    // The SHA-1 digest leaves the upper id bytes zero.
    assert!(!boot.flags().contains(BootFlags::SHA256));
    assert_eq!(boot.payload().len(), image.len());
}

#[test]
fn sha256_digest_is_detected() {
    let image = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |hdr| {
        hdr.id[30] = 0xaa;
    });

    let boot = open_image(&image);
    assert!(boot.flags().contains(BootFlags::SHA256));
}

#[test]
fn parse_v3_and_v4_images() {
    let mut hdr = RawV3::new_zeroed();
    hdr.magic = BOOT_MAGIC;
    hdr.kernel_size.set(6);
    hdr.ramdisk_size.set(7);
    hdr.header_version.set(3);
    hdr.header_size.set(size_of::<RawV3>() as u32);

    let mut image = hdr.as_bytes().to_vec();
    page_align(&mut image, PAGE_SIZE);
    image.extend_from_slice(b"kernel");
    page_align(&mut image, PAGE_SIZE);
    image.extend_from_slice(b"ramdisk");
    page_align(&mut image, PAGE_SIZE);

    let boot = open_image(&image);
    assert_eq!(boot.header().header_version(), 3);
    assert_eq!(boot.header().page_size(), 4096);
    assert_eq!(boot.kernel().unwrap(), b"kernel");
    assert_eq!(boot.ramdisk().unwrap(), b"ramdisk");
    assert_eq!(boot.signature(), None);

    let mut hdr = RawV4::new_zeroed();
    hdr.v3.magic = BOOT_MAGIC;
    hdr.v3.kernel_size.set(6);
    hdr.v3.ramdisk_size.set(7);
    hdr.v3.header_version.set(4);
    hdr.v3.header_size.set(size_of::<RawV4>() as u32);
    hdr.signature_size.set(16);

    let mut image = hdr.as_bytes().to_vec();
    page_align(&mut image, PAGE_SIZE);
    image.extend_from_slice(b"kernel");
    page_align(&mut image, PAGE_SIZE);
    image.extend_from_slice(b"ramdisk");
    page_align(&mut image, PAGE_SIZE);
    image.extend_from_slice(&[0xab; 16]);
    page_align(&mut image, PAGE_SIZE);

    let boot = open_image(&image);
    assert_eq!(boot.header().header_version(), 4);
    assert_eq!(boot.signature().unwrap(), [0xab; 16]);
}

#[test]
fn parse_vendor_v4_image() {
    let page_size = 2048usize;
    let ramdisks: [&[u8]; 2] = [b"first vendor ramdisk", b"second one"];
    let bootconfig = b"androidboot.hardware=test\n";
    let dtb = minimal_fdt();

    let mut table = vec![];
    let mut offset = 0u32;
    for (i, r) in ramdisks.iter().enumerate() {
        let mut entry = RawVendorRamdiskTableEntry::new_zeroed();
        entry.ramdisk_size.set(r.len() as u32);
        entry.ramdisk_offset.set(offset);
        entry.ramdisk_type.set(1);
        entry.ramdisk_name[..9].copy_from_slice(b"ramdisk_0");
        entry.ramdisk_name[8] = b'0' + i as u8;
        table.extend_from_slice(entry.as_bytes());
        offset += r.len() as u32;
    }

    let total_ramdisk = ramdisks.iter().map(|r| r.len()).sum::<usize>();

    let mut hdr = RawVendorV4::new_zeroed();
    hdr.v3.magic = VENDOR_BOOT_MAGIC;
    hdr.v3.header_version.set(4);
    hdr.v3.page_size.set(page_size as u32);
    hdr.v3.ramdisk_size.set(total_ramdisk as u32);
    hdr.v3.name[..7].copy_from_slice(b"testhw\0");
    hdr.v3.header_size.set(size_of::<RawVendorV4>() as u32);
    hdr.v3.dtb_size.set(dtb.len() as u32);
    hdr.vendor_ramdisk_table_size.set(table.len() as u32);
    hdr.vendor_ramdisk_table_entry_num.set(ramdisks.len() as u32);
    hdr.vendor_ramdisk_table_entry_size
        .set(size_of::<RawVendorRamdiskTableEntry>() as u32);
    hdr.bootconfig_size.set(bootconfig.len() as u32);

    let mut image = hdr.as_bytes().to_vec();
    // Vendor images only align the header up, rather than reserving a page.
    page_align(&mut image, page_size);
    assert_eq!(image.len(), 4096);

    for r in &ramdisks {
        image.extend_from_slice(r);
    }
    page_align(&mut image, page_size);
    image.extend_from_slice(&dtb);
    page_align(&mut image, page_size);
    image.extend_from_slice(&table);
    page_align(&mut image, page_size);
    image.extend_from_slice(bootconfig);
    page_align(&mut image, page_size);

    let boot = open_image(&image);

    assert!(boot.header().is_vendor());
    assert_eq!(boot.header().header_version(), 4);
    assert_eq!(boot.kernel(), None);
    assert_eq!(boot.ramdisk().unwrap().len(), total_ramdisk);
    // Multi-blob vendor ramdisks are opaque.
    assert_eq!(boot.ramdisk_fmt(), FileFormat::Unknown);
    assert_eq!(boot.dtb().unwrap(), dtb);
    assert_eq!(boot.bootconfig().unwrap(), bootconfig);

    let entries = boot.vendor_ramdisk_entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].ramdisk_size.get(), ramdisks[0].len() as u32);
    assert_eq!(entries[1].ramdisk_offset.get(), ramdisks[0].len() as u32);
}

#[test]
fn parse_mtk_wrapped_ramdisk() {
    let ramdisk = gzip(b"ramdisk contents");
    let wrapped = mtk_wrap(b"ROOTFS", &ramdisk);
    let image = build_v0_image(b"kernel", &wrapped, b"", 2048, |_| {});

    let boot = open_image(&image);

    assert!(boot.flags().contains(BootFlags::MTK_RAMDISK));
    assert!(!boot.flags().contains(BootFlags::MTK_KERNEL));
    assert_eq!(boot.ramdisk().unwrap(), ramdisk);
    assert_eq!(boot.ramdisk_fmt(), FileFormat::Gzip);

    let mtk = boot.mtk_ramdisk_header().unwrap();
    assert_eq!(&mtk.name[..6], b"ROOTFS");
    assert_eq!(mtk.size.get(), ramdisk.len() as u32);
}

#[test]
fn parse_zimage_kernel() {
    let payload = gzip(b"decompressed kernel code");
    let trailing = b"appended data";

    let mut zimage = RawZImageHeader::new_zeroed();
    zimage.magic.set(ZIMAGE_MAGIC);
    zimage.start.set(0x8000);
    zimage
        .end
        .set(0x8000 + (size_of::<RawZImageHeader>() + payload.len()) as u32);

    let mut kernel = zimage.as_bytes().to_vec();
    kernel.extend_from_slice(&payload);
    kernel.extend_from_slice(trailing);

    let image = build_v0_image(&kernel, b"ramdisk", b"", 2048, |_| {});
    let boot = open_image(&image);

    assert!(boot.flags().contains(BootFlags::ZIMAGE_KERNEL));
    assert_eq!(boot.kernel().unwrap(), payload);
    assert_eq!(boot.kernel_fmt(), FileFormat::Gzip);
    assert_eq!(boot.zimage_prefix().unwrap().len(), size_of::<RawZImageHeader>());
    assert_eq!(boot.zimage_tail(), trailing);
    assert_eq!(boot.zimage_header().unwrap().start.get(), 0x8000);
}

#[test]
fn parse_kernel_with_appended_dtb() {
    let fdt = minimal_fdt();
    let mut kernel = b"raw kernel code".to_vec();
    kernel.extend_from_slice(&fdt);

    let image = build_v0_image(&kernel, b"ramdisk", b"", 2048, |_| {});
    let boot = open_image(&image);

    assert_eq!(boot.kernel().unwrap(), b"raw kernel code");
    assert_eq!(boot.kernel_dtb().unwrap(), fdt);
    assert_eq!(boot.header().kernel_size(), 15);
}

#[test]
fn parse_dhtb_wrapped_image() {
    let inner = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});

    let mut image = vec![0u8; 512];
    image[..8].copy_from_slice(b"DHTB\x01\x00\x00\x00");
    image[48..52].copy_from_slice(&(inner.len() as u32).to_le_bytes());
    image.extend_from_slice(&inner);

    let boot = open_image(&image);

    assert!(boot.flags().contains(BootFlags::DHTB));
    assert!(boot.flags().contains(BootFlags::SEANDROID));
    assert_eq!(boot.header_offset(), 512);
    assert_eq!(boot.kernel().unwrap(), b"kernel");
}

#[test]
fn parse_amonet_wrapped_image() {
    let inner = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});
    let mut image = mtk_wrap(b"AMONET", &inner);

    let boot = open_image(&image);
    assert!(boot.flags().contains(BootFlags::AMONET));
    assert_eq!(boot.header_offset(), 512);

    // Any other image-level MTK wrapper is not a boot image.
    image[8..14].copy_from_slice(b"RECOVE");
    assert_matches!(try_open_image(&image), Err(Error::UnknownFormat));
}

#[test]
fn parse_chromeos_wrapped_image() {
    let inner = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});

    let mut image = vec![0u8; 65536];
    image[..8].copy_from_slice(b"CHROMEOS");
    image.extend_from_slice(&inner);

    let boot = open_image(&image);
    assert!(boot.flags().contains(BootFlags::CHROMEOS));
    assert_eq!(boot.header_offset(), 65536);
    assert_eq!(boot.kernel().unwrap(), b"kernel");
}

#[test]
fn parse_tail_magic() {
    let mut image = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});
    let payload_len = image.len();
    image.extend_from_slice(SEANDROID_MAGIC);
    image.extend_from_slice(&[0xff; 4]);

    let boot = open_image(&image);
    assert!(boot.flags().contains(BootFlags::SEANDROID));
    assert_eq!(boot.payload().len(), payload_len);
    assert_eq!(boot.tail().len(), 20);

    let mut image = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});
    image.extend_from_slice(&LG_BUMP_MAGIC);

    let boot = open_image(&image);
    assert!(boot.flags().contains(BootFlags::LG_BUMP));
}

#[test]
fn parse_avb_footer() {
    let mut image = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});
    let payload_len = image.len();

    let mut vbmeta = vec![0u8; 256];
    vbmeta[..4].copy_from_slice(b"AVB0");
    image.extend_from_slice(&vbmeta);

    let mut footer = vec![0u8; 64];
    footer[..4].copy_from_slice(b"AVBf");
    footer[12..20].copy_from_slice(&(payload_len as u64).to_be_bytes());
    footer[20..28].copy_from_slice(&(payload_len as u64).to_be_bytes()); // vbmeta offset
    footer[28..36].copy_from_slice(&256u64.to_be_bytes()); // vbmeta size
    image.extend_from_slice(&footer);

    let boot = open_image(&image);

    assert!(boot.flags().contains(BootFlags::AVB));
    let parsed_footer = boot.avb_footer().unwrap();
    assert_eq!(parsed_footer.vbmeta_offset.get(), payload_len as u64);
    assert_eq!(parsed_footer.vbmeta_size.get(), 256);
    assert!(boot.vbmeta_header().is_some());
}

#[test]
fn parse_avb1_signature() {
    let mut image = build_v0_image(b"kernel", b"ramdisk", b"", 2048, |_| {});
    image.extend_from_slice(&[0x30, 0x82, 0x01, 0x00]);
    image.extend_from_slice(&[0u8; 60]);

    let boot = open_image(&image);
    assert!(boot.flags().contains(BootFlags::AVB1_SIGNED));
}

#[test]
fn header_fields_absent_on_variant() {
    let mut hdr = RawV3::new_zeroed();
    hdr.magic = BOOT_MAGIC;
    hdr.header_version.set(3);
    hdr.cmdline[..4].copy_from_slice(b"args");
    hdr.cmdline[512..517].copy_from_slice(b"extra");

    let mut header = BootHeader::parse(hdr.as_bytes(), false);

    assert_eq!(header.second_size(), 0);
    assert_eq!(header.page_size(), 4096);
    assert_eq!(header.name(), None);
    assert_eq!(header.id(), None);
    assert_eq!(&header.cmdline().unwrap()[..4], b"args");
    assert_eq!(&header.extra_cmdline().unwrap()[..5], b"extra");

    // Writes to absent fields are dropped.
    header.set_second_size(1234);
    assert_eq!(header.second_size(), 0);
    header.set_dtb_size(1234);
    assert_eq!(header.dtb_size(), 0);
}

#[test]
fn pxa_header_is_selected_by_address_word() {
    let mut data = vec![0u8; 2048];
    data[..8].copy_from_slice(b"ANDROID!");
    // The word at the v0 page_size offset is an address in the PXA layout.
    data[36..40].copy_from_slice(&0x0200_0000u32.to_le_bytes());
    data[44..48].copy_from_slice(&2048u32.to_le_bytes()); // pxa page_size

    let header = BootHeader::parse(&data, false);
    assert_eq!(header.page_size(), 2048);
    assert_eq!(header.header_version(), 0);
    assert!(header.id().is_some());
}

#[test]
fn find_dtb_requires_valid_header() {
    // A bare magic with an implausible header must be skipped.
    let mut data = b"junk\xd0\x0d\xfe\xedmore junk".to_vec();
    assert_eq!(find_dtb_offset(&data), None);

    let fdt = minimal_fdt();
    data.extend_from_slice(&fdt);
    assert_eq!(find_dtb_offset(&data), Some(data.len() - fdt.len()));
}

#[test]
fn reject_unknown_format() {
    assert_matches!(
        try_open_image(b"this is not a boot image at all"),
        Err(Error::UnknownFormat)
    );
}
