// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::{fmt, io, mem, ops::Range};

use bitflags::bitflags;
use bstr::ByteSlice;
use memchr::memmem;
use thiserror::Error;
use tracing::{debug, warn};
use zerocopy::{FromBytes, Immutable, IntoBytes, big_endian, little_endian};
use zerocopy_derive::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::{
    format::{
        avb::{self, Footer, VbmetaImageHeader},
        compression::FileFormat,
        padding::{self, ZeroPadding},
    },
    mmap::MappedFile,
    util,
};

pub const BOOT_MAGIC: [u8; 8] = *b"ANDROID!";
pub const VENDOR_BOOT_MAGIC: [u8; 8] = *b"VNDRBOOT";

pub const BOOT_NAME_SIZE: usize = 16;
pub const BOOT_PXA_NAME_SIZE: usize = 24;
pub const BOOT_ID_SIZE: usize = 32;
pub const BOOT_ARGS_SIZE: usize = 512;
pub const BOOT_EXTRA_ARGS_SIZE: usize = 1024;
pub const VENDOR_BOOT_ARGS_SIZE: usize = 2048;
pub const VENDOR_RAMDISK_NAME_SIZE: usize = 32;
pub const VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE: usize = 16;

pub const MTK_MAGIC: u32 = 0x5888_1688;
pub const ZIMAGE_MAGIC: u32 = 0x016f_2818;

pub const DHTB_MAGIC: &[u8; 8] = b"DHTB\x01\x00\x00\x00";
pub const SEANDROID_MAGIC: &[u8; 16] = b"SEANDROIDENFORCE";
pub const LG_BUMP_MAGIC: [u8; 16] = [
    0x41, 0xa9, 0xe4, 0x67, 0x74, 0x4d, 0x1d, 0x1b, 0xa4, 0x29, 0xf2, 0xec, 0xea, 0x65, 0x52, 0x79,
];

/// Size of the Chrome OS signing header prepended by vbutil_kernel.
const CHROMEOS_HEADER_SIZE: usize = 65536;

/// Loader pre-header carried by Nook HD boot images.
const NOOKHD_MAGICS: &[&[u8]] = &[
    b"Red Loader",
    b"Green Loader",
    b"Green Recovery",
    b"eMMC boot.img+secondloader",
];
const NOOKHD_PRE_HEADER_SIZE: usize = 1024 * 1024;

/// Loader pre-header carried by Nook Tablet (Acclaim) boot images.
const ACCLAIM_MAGIC: &[u8] = b"BauwksBoot";
const ACCLAIM_PRE_HEADER_SIZE: usize = 262144;

/// Name field of an image-level MTK header installed by the amonet exploit.
const AMONET_MAGIC: &[u8] = b"AMONET";

/// Gzip stream start inside a zImage self-extractor.
const ZIMAGE_PIGGY_MAGIC: &[u8; 3] = b"\x1f\x8b\x08";

const FDT_MAGIC: &[u8; 4] = b"\xd0\x0d\xfe\xed";
const FDT_BEGIN_NODE: u32 = 0x1;

const SHA1_DIGEST_SIZE: usize = 20;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unknown boot image format")]
    UnknownFormat,
    #[error("Page size must not be zero")]
    PageSizeZero,
    #[error("{0:?} section is out of bounds")]
    SectionOutOfBounds(&'static str),
    #[error("Boot image is truncated")]
    Truncated,
    #[error("Failed to map boot image")]
    Io(#[from] io::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Raw on-disk layout for the v0 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawV0 {
    /// Magic value. This should be equal to [`BOOT_MAGIC`].
    pub magic: [u8; 8],
    pub kernel_size: little_endian::U32,
    pub kernel_addr: little_endian::U32,
    pub ramdisk_size: little_endian::U32,
    pub ramdisk_addr: little_endian::U32,
    pub second_size: little_endian::U32,
    pub second_addr: little_endian::U32,
    pub tags_addr: little_endian::U32,
    pub page_size: little_endian::U32,
    /// Doubles as `extra_size` on Samsung-style v0 images; only v1+ treat
    /// this as a version number.
    pub header_version: little_endian::U32,
    pub os_version: little_endian::U32,
    pub name: [u8; BOOT_NAME_SIZE],
    pub cmdline: [u8; BOOT_ARGS_SIZE],
    pub id: [u8; BOOT_ID_SIZE],
    pub extra_cmdline: [u8; BOOT_EXTRA_ARGS_SIZE],
}

/// Raw on-disk layout for the v1 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawV1 {
    pub v0: RawV0,
    pub recovery_dtbo_size: little_endian::U32,
    pub recovery_dtbo_offset: little_endian::U64,
    pub header_size: little_endian::U32,
}

/// Raw on-disk layout for the v2 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawV2 {
    pub v1: RawV1,
    pub dtb_size: little_endian::U32,
    pub dtb_addr: little_endian::U64,
}

/// Raw on-disk layout for the Marvell PXA flavor of the v0 header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawPxa {
    /// Magic value. This should be equal to [`BOOT_MAGIC`].
    pub magic: [u8; 8],
    pub kernel_size: little_endian::U32,
    pub kernel_addr: little_endian::U32,
    pub ramdisk_size: little_endian::U32,
    pub ramdisk_addr: little_endian::U32,
    pub second_size: little_endian::U32,
    pub second_addr: little_endian::U32,
    pub extra_size: little_endian::U32,
    pub unknown: little_endian::U32,
    pub tags_addr: little_endian::U32,
    pub page_size: little_endian::U32,
    pub name: [u8; BOOT_PXA_NAME_SIZE],
    pub cmdline: [u8; BOOT_ARGS_SIZE],
    pub id: [u8; BOOT_ID_SIZE],
    pub extra_cmdline: [u8; BOOT_EXTRA_ARGS_SIZE],
}

/// Raw on-disk layout for the v3 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawV3 {
    /// Magic value. This should be equal to [`BOOT_MAGIC`].
    pub magic: [u8; 8],
    pub kernel_size: little_endian::U32,
    pub ramdisk_size: little_endian::U32,
    pub os_version: little_endian::U32,
    pub header_size: little_endian::U32,
    pub reserved: [little_endian::U32; 4],
    pub header_version: little_endian::U32,
    pub cmdline: [u8; BOOT_ARGS_SIZE + BOOT_EXTRA_ARGS_SIZE],
}

/// Raw on-disk layout for the v4 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawV4 {
    pub v3: RawV3,
    pub signature_size: little_endian::U32,
}

/// Raw on-disk layout for the vendor v3 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawVendorV3 {
    /// Magic value. This should be equal to [`VENDOR_BOOT_MAGIC`].
    pub magic: [u8; 8],
    pub header_version: little_endian::U32,
    pub page_size: little_endian::U32,
    pub kernel_addr: little_endian::U32,
    pub ramdisk_addr: little_endian::U32,
    pub ramdisk_size: little_endian::U32,
    pub cmdline: [u8; VENDOR_BOOT_ARGS_SIZE],
    pub tags_addr: little_endian::U32,
    pub name: [u8; BOOT_NAME_SIZE],
    pub header_size: little_endian::U32,
    pub dtb_size: little_endian::U32,
    pub dtb_addr: little_endian::U64,
}

/// Raw on-disk layout for the vendor v4 image header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawVendorV4 {
    pub v3: RawVendorV3,
    pub vendor_ramdisk_table_size: little_endian::U32,
    pub vendor_ramdisk_table_entry_num: little_endian::U32,
    pub vendor_ramdisk_table_entry_size: little_endian::U32,
    pub bootconfig_size: little_endian::U32,
}

/// Raw on-disk layout for the vendor v4 ramdisk table entry.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawVendorRamdiskTableEntry {
    pub ramdisk_size: little_endian::U32,
    pub ramdisk_offset: little_endian::U32,
    pub ramdisk_type: little_endian::U32,
    pub ramdisk_name: [u8; VENDOR_RAMDISK_NAME_SIZE],
    pub board_id: [little_endian::U32; VENDOR_RAMDISK_TABLE_ENTRY_BOARD_ID_SIZE],
}

/// 512-byte MediaTek wrapper prepended to kernel or ramdisk sections.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawMtkHeader {
    /// Magic value. This should be equal to [`MTK_MAGIC`].
    pub magic: little_endian::U32,
    /// Size of the wrapped content, excluding this header.
    pub size: little_endian::U32,
    pub name: [u8; 32],
    pub padding: [u8; 472],
}

/// Spreadtrum signed wrapper at the start of the image.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawDhtbHeader {
    /// Magic value. This should be equal to [`DHTB_MAGIC`].
    pub magic: [u8; 8],
    /// SHA-256 of the payload in the first 32 bytes.
    pub checksum: [u8; 40],
    pub size: little_endian::U32,
    pub padding: [u8; 460],
}

/// MSM-RADIO-UPDATE container header.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawBlobHeader {
    /// This should be equal to `-SIGNED-BY-SIGNBLOB-`.
    pub secure_magic: [u8; 20],
    pub datalen: little_endian::U32,
    pub signature: little_endian::U32,
    /// This should be equal to `MSM-RADIO-UPDATE`.
    pub magic: [u8; 16],
    pub hdr_version: little_endian::U32,
    pub hdr_size: little_endian::U32,
    pub part_offset: little_endian::U32,
    pub num_parts: little_endian::U32,
    pub unknown: [little_endian::U32; 7],
    pub name: [u8; 4],
    pub offset: little_endian::U32,
    pub size: little_endian::U32,
    pub version: little_endian::U32,
}

/// 52-byte prefix of an ARM zImage self-extractor.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
pub struct RawZImageHeader {
    pub code: [little_endian::U32; 9],
    /// Magic value. This should be equal to [`ZIMAGE_MAGIC`].
    pub magic: little_endian::U32,
    /// Absolute load/run address.
    pub start: little_endian::U32,
    /// End address; `end - start` is the zImage size.
    pub end: little_endian::U32,
    pub endian: little_endian::U32,
}

/// Flattened device tree blob header. All integers are big endian.
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(packed)]
struct RawFdtHeader {
    magic: big_endian::U32,
    totalsize: big_endian::U32,
    off_dt_struct: big_endian::U32,
    off_dt_strings: big_endian::U32,
    off_mem_rsvmap: big_endian::U32,
    version: big_endian::U32,
    last_comp_version: big_endian::U32,
    boot_cpuid_phys: big_endian::U32,
    size_dt_strings: big_endian::U32,
    size_dt_struct: big_endian::U32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BootFlags: u32 {
        const MTK_KERNEL = 1 << 0;
        const MTK_RAMDISK = 1 << 1;
        const CHROMEOS = 1 << 2;
        const DHTB = 1 << 3;
        const SEANDROID = 1 << 4;
        const LG_BUMP = 1 << 5;
        const SHA256 = 1 << 6;
        const BLOB = 1 << 7;
        const NOOKHD = 1 << 8;
        const ACCLAIM = 1 << 9;
        const AMONET = 1 << 10;
        const AVB1_SIGNED = 1 << 11;
        const AVB = 1 << 12;
        const ZIMAGE_KERNEL = 1 << 13;
    }
}

/// Copy the prefix of `data` into a zeroed instance of `T`, zero-filling
/// whatever the input doesn't cover.
fn read_padded<T: FromBytes + IntoBytes + Immutable>(data: &[u8]) -> T {
    let mut raw = T::new_zeroed();
    let bytes = raw.as_mut_bytes();
    let n = data.len().min(bytes.len());
    bytes[..n].copy_from_slice(&data[..n]);
    raw
}

/// A parsed image header of any supported variant, holding a heap-allocated
/// copy of the raw on-disk bytes. Fields a variant doesn't carry read as zero
/// and silently drop writes.
#[derive(Clone)]
pub enum BootHeader {
    V0(Box<RawV0>),
    V1(Box<RawV1>),
    V2(Box<RawV2>),
    Pxa(Box<RawPxa>),
    V3(Box<RawV3>),
    V4(Box<RawV4>),
    VendorV3(Box<RawVendorV3>),
    VendorV4(Box<RawVendorV4>),
}

impl BootHeader {
    /// Select and copy the header variant at the start of `data`. Boot images
    /// with an unrecognized version number fall back to the v0 layout, since
    /// that word doubles as `extra_size` there.
    pub fn parse(data: &[u8], vendor: bool) -> Self {
        if vendor {
            let v3 = read_padded::<RawVendorV3>(data);
            match v3.header_version.get() {
                4 => Self::VendorV4(Box::new(read_padded(data))),
                _ => Self::VendorV3(Box::new(v3)),
            }
        } else {
            let v0 = read_padded::<RawV0>(data);
            if v0.page_size.get() >= 0x0200_0000 {
                debug!("PXA_BOOT_HDR");
                Self::Pxa(Box::new(read_padded(data)))
            } else {
                match v0.header_version.get() {
                    1 => Self::V1(Box::new(read_padded(data))),
                    2 => Self::V2(Box::new(read_padded(data))),
                    3 => Self::V3(Box::new(read_padded(data))),
                    4 => Self::V4(Box::new(read_padded(data))),
                    _ => Self::V0(Box::new(v0)),
                }
            }
        }
    }

    fn as_v0(&self) -> Option<&RawV0> {
        match self {
            Self::V0(h) => Some(h),
            Self::V1(h) => Some(&h.v0),
            Self::V2(h) => Some(&h.v1.v0),
            _ => None,
        }
    }

    fn as_v0_mut(&mut self) -> Option<&mut RawV0> {
        match self {
            Self::V0(h) => Some(h),
            Self::V1(h) => Some(&mut h.v0),
            Self::V2(h) => Some(&mut h.v1.v0),
            _ => None,
        }
    }

    fn as_v1(&self) -> Option<&RawV1> {
        match self {
            Self::V1(h) => Some(h),
            Self::V2(h) => Some(&h.v1),
            _ => None,
        }
    }

    fn as_v1_mut(&mut self) -> Option<&mut RawV1> {
        match self {
            Self::V1(h) => Some(h),
            Self::V2(h) => Some(&mut h.v1),
            _ => None,
        }
    }

    fn as_v3(&self) -> Option<&RawV3> {
        match self {
            Self::V3(h) => Some(h),
            Self::V4(h) => Some(&h.v3),
            _ => None,
        }
    }

    fn as_v3_mut(&mut self) -> Option<&mut RawV3> {
        match self {
            Self::V3(h) => Some(h),
            Self::V4(h) => Some(&mut h.v3),
            _ => None,
        }
    }

    fn as_vendor(&self) -> Option<&RawVendorV3> {
        match self {
            Self::VendorV3(h) => Some(h),
            Self::VendorV4(h) => Some(&h.v3),
            _ => None,
        }
    }

    fn as_vendor_mut(&mut self) -> Option<&mut RawVendorV3> {
        match self {
            Self::VendorV3(h) => Some(h),
            Self::VendorV4(h) => Some(&mut h.v3),
            _ => None,
        }
    }

    pub fn is_vendor(&self) -> bool {
        matches!(self, Self::VendorV3(_) | Self::VendorV4(_))
    }

    pub fn kernel_size(&self) -> u32 {
        if let Some(h) = self.as_v0() {
            h.kernel_size.get()
        } else if let Self::Pxa(h) = self {
            h.kernel_size.get()
        } else if let Some(h) = self.as_v3() {
            h.kernel_size.get()
        } else {
            0
        }
    }

    pub fn set_kernel_size(&mut self, value: u32) {
        if let Some(h) = self.as_v0_mut() {
            h.kernel_size.set(value);
        } else if let Self::Pxa(h) = self {
            h.kernel_size.set(value);
        } else if let Some(h) = self.as_v3_mut() {
            h.kernel_size.set(value);
        }
    }

    pub fn ramdisk_size(&self) -> u32 {
        if let Some(h) = self.as_v0() {
            h.ramdisk_size.get()
        } else if let Self::Pxa(h) = self {
            h.ramdisk_size.get()
        } else if let Some(h) = self.as_v3() {
            h.ramdisk_size.get()
        } else if let Some(h) = self.as_vendor() {
            h.ramdisk_size.get()
        } else {
            0
        }
    }

    pub fn set_ramdisk_size(&mut self, value: u32) {
        if let Some(h) = self.as_v0_mut() {
            h.ramdisk_size.set(value);
        } else if let Self::Pxa(h) = self {
            h.ramdisk_size.set(value);
        } else if let Some(h) = self.as_v3_mut() {
            h.ramdisk_size.set(value);
        } else if let Some(h) = self.as_vendor_mut() {
            h.ramdisk_size.set(value);
        }
    }

    pub fn second_size(&self) -> u32 {
        if let Some(h) = self.as_v0() {
            h.second_size.get()
        } else if let Self::Pxa(h) = self {
            h.second_size.get()
        } else {
            0
        }
    }

    pub fn set_second_size(&mut self, value: u32) {
        if let Some(h) = self.as_v0_mut() {
            h.second_size.set(value);
        } else if let Self::Pxa(h) = self {
            h.second_size.set(value);
        }
    }

    pub fn extra_size(&self) -> u32 {
        match self {
            // The v0 version word doubles as the extra size.
            Self::V0(h) => h.header_version.get(),
            Self::Pxa(h) => h.extra_size.get(),
            _ => 0,
        }
    }

    pub fn set_extra_size(&mut self, value: u32) {
        match self {
            Self::V0(h) => h.header_version.set(value),
            Self::Pxa(h) => h.extra_size.set(value),
            _ => {}
        }
    }

    pub fn page_size(&self) -> u32 {
        if let Some(h) = self.as_v0() {
            h.page_size.get()
        } else if let Self::Pxa(h) = self {
            h.page_size.get()
        } else if self.as_v3().is_some() {
            // Fixed by the v3+ format.
            4096
        } else if let Some(h) = self.as_vendor() {
            h.page_size.get()
        } else {
            0
        }
    }

    pub fn header_version(&self) -> u32 {
        match self {
            Self::V0(_) | Self::Pxa(_) => 0,
            Self::V1(h) => h.v0.header_version.get(),
            Self::V2(h) => h.v1.v0.header_version.get(),
            Self::V3(h) => h.header_version.get(),
            Self::V4(h) => h.v3.header_version.get(),
            Self::VendorV3(h) => h.header_version.get(),
            Self::VendorV4(h) => h.v3.header_version.get(),
        }
    }

    pub fn os_version(&self) -> u32 {
        if let Some(h) = self.as_v0() {
            h.os_version.get()
        } else if let Some(h) = self.as_v3() {
            h.os_version.get()
        } else {
            0
        }
    }

    pub fn set_os_version(&mut self, value: u32) {
        if let Some(h) = self.as_v0_mut() {
            h.os_version.set(value);
        } else if let Some(h) = self.as_v3_mut() {
            h.os_version.set(value);
        }
    }

    pub fn recovery_dtbo_size(&self) -> u32 {
        self.as_v1().map_or(0, |h| h.recovery_dtbo_size.get())
    }

    pub fn set_recovery_dtbo_size(&mut self, value: u32) {
        if let Some(h) = self.as_v1_mut() {
            h.recovery_dtbo_size.set(value);
        }
    }

    pub fn recovery_dtbo_offset(&self) -> u64 {
        self.as_v1().map_or(0, |h| h.recovery_dtbo_offset.get())
    }

    pub fn set_recovery_dtbo_offset(&mut self, value: u64) {
        if let Some(h) = self.as_v1_mut() {
            h.recovery_dtbo_offset.set(value);
        }
    }

    /// The on-disk header size field, not the size of the variant itself.
    pub fn header_size(&self) -> u32 {
        if let Some(h) = self.as_v1() {
            h.header_size.get()
        } else if let Some(h) = self.as_v3() {
            h.header_size.get()
        } else if let Some(h) = self.as_vendor() {
            h.header_size.get()
        } else {
            0
        }
    }

    pub fn set_header_size(&mut self, value: u32) {
        if let Some(h) = self.as_v1_mut() {
            h.header_size.set(value);
        } else if let Some(h) = self.as_v3_mut() {
            h.header_size.set(value);
        } else if let Some(h) = self.as_vendor_mut() {
            h.header_size.set(value);
        }
    }

    pub fn dtb_size(&self) -> u32 {
        match self {
            Self::V2(h) => h.dtb_size.get(),
            _ => self.as_vendor().map_or(0, |h| h.dtb_size.get()),
        }
    }

    pub fn set_dtb_size(&mut self, value: u32) {
        if let Self::V2(h) = self {
            h.dtb_size.set(value);
        } else if let Some(h) = self.as_vendor_mut() {
            h.dtb_size.set(value);
        }
    }

    pub fn signature_size(&self) -> u32 {
        match self {
            Self::V4(h) => h.signature_size.get(),
            _ => 0,
        }
    }

    pub fn vendor_ramdisk_table_size(&self) -> u32 {
        match self {
            Self::VendorV4(h) => h.vendor_ramdisk_table_size.get(),
            _ => 0,
        }
    }

    pub fn vendor_ramdisk_table_entry_num(&self) -> u32 {
        match self {
            Self::VendorV4(h) => h.vendor_ramdisk_table_entry_num.get(),
            _ => 0,
        }
    }

    pub fn vendor_ramdisk_table_entry_size(&self) -> u32 {
        match self {
            Self::VendorV4(h) => h.vendor_ramdisk_table_entry_size.get(),
            _ => 0,
        }
    }

    pub fn bootconfig_size(&self) -> u32 {
        match self {
            Self::VendorV4(h) => h.bootconfig_size.get(),
            _ => 0,
        }
    }

    pub fn set_bootconfig_size(&mut self, value: u32) {
        if let Self::VendorV4(h) = self {
            h.bootconfig_size.set(value);
        }
    }

    pub fn name(&self) -> Option<&[u8]> {
        if let Some(h) = self.as_v0() {
            Some(&h.name)
        } else if let Self::Pxa(h) = self {
            Some(&h.name)
        } else {
            self.as_vendor().map(|h| h.name.as_slice())
        }
    }

    /// Replace the name, truncating to the field size and zero-padding.
    pub fn set_name(&mut self, value: &[u8]) {
        let field: Option<&mut [u8]> = if let Some(h) = self.as_v0_mut() {
            Some(&mut h.name)
        } else if let Self::Pxa(h) = self {
            Some(&mut h.name)
        } else {
            self.as_vendor_mut().map(|h| h.name.as_mut_slice())
        };

        if let Some(field) = field {
            copy_padded(field, value);
        }
    }

    pub fn cmdline(&self) -> Option<&[u8]> {
        if let Some(h) = self.as_v0() {
            Some(&h.cmdline)
        } else if let Self::Pxa(h) = self {
            Some(&h.cmdline)
        } else if let Some(h) = self.as_v3() {
            Some(&h.cmdline)
        } else {
            self.as_vendor().map(|h| h.cmdline.as_slice())
        }
    }

    /// Replace the cmdline, truncating to the field size and zero-padding.
    pub fn set_cmdline(&mut self, value: &[u8]) {
        let field: Option<&mut [u8]> = if let Some(h) = self.as_v0_mut() {
            Some(&mut h.cmdline)
        } else if let Self::Pxa(h) = self {
            Some(&mut h.cmdline)
        } else if let Some(h) = self.as_v3_mut() {
            Some(&mut h.cmdline)
        } else {
            self.as_vendor_mut().map(|h| h.cmdline.as_mut_slice())
        };

        if let Some(field) = field {
            copy_padded(field, value);
        }
    }

    pub fn id(&self) -> Option<&[u8]> {
        if let Some(h) = self.as_v0() {
            Some(&h.id)
        } else if let Self::Pxa(h) = self {
            Some(&h.id)
        } else {
            None
        }
    }

    pub fn id_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Self::V0(h) => Some(&mut h.id),
            Self::V1(h) => Some(&mut h.v0.id),
            Self::V2(h) => Some(&mut h.v1.v0.id),
            Self::Pxa(h) => Some(&mut h.id),
            _ => None,
        }
    }

    /// v3+ and vendor headers store the extra cmdline as the back half of the
    /// merged cmdline field.
    pub fn extra_cmdline(&self) -> Option<&[u8]> {
        if let Some(h) = self.as_v0() {
            Some(&h.extra_cmdline)
        } else if let Self::Pxa(h) = self {
            Some(&h.extra_cmdline)
        } else if let Some(h) = self.as_v3() {
            Some(&h.cmdline[BOOT_ARGS_SIZE..])
        } else {
            self.as_vendor().map(|h| &h.cmdline[BOOT_ARGS_SIZE..])
        }
    }

    /// Size of the raw header struct for this variant.
    pub fn struct_size(&self) -> usize {
        match self {
            Self::V0(_) => mem::size_of::<RawV0>(),
            Self::V1(_) => mem::size_of::<RawV1>(),
            Self::V2(_) => mem::size_of::<RawV2>(),
            Self::Pxa(_) => mem::size_of::<RawPxa>(),
            Self::V3(_) => mem::size_of::<RawV3>(),
            Self::V4(_) => mem::size_of::<RawV4>(),
            Self::VendorV3(_) => mem::size_of::<RawVendorV3>(),
            Self::VendorV4(_) => mem::size_of::<RawVendorV4>(),
        }
    }

    /// Bytes reserved for the header before the first section. Boot images
    /// reserve a full page; vendor images only align the header size up.
    pub fn hdr_space(&self) -> usize {
        let page_size = self.page_size() as usize;
        if self.is_vendor() {
            padding::round(self.struct_size(), page_size).unwrap()
        } else {
            page_size
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::V0(h) => h.as_bytes(),
            Self::V1(h) => h.as_bytes(),
            Self::V2(h) => h.as_bytes(),
            Self::Pxa(h) => h.as_bytes(),
            Self::V3(h) => h.as_bytes(),
            Self::V4(h) => h.as_bytes(),
            Self::VendorV3(h) => h.as_bytes(),
            Self::VendorV4(h) => h.as_bytes(),
        }
    }
}

impl fmt::Debug for BootHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::V0(_) => "V0",
            Self::V1(_) => "V1",
            Self::V2(_) => "V2",
            Self::Pxa(_) => "Pxa",
            Self::V3(_) => "V3",
            Self::V4(_) => "V4",
            Self::VendorV3(_) => "VendorV3",
            Self::VendorV4(_) => "VendorV4",
        };

        f.debug_struct("BootHeader")
            .field("variant", &variant)
            .field("kernel_size", &self.kernel_size())
            .field("ramdisk_size", &self.ramdisk_size())
            .field("page_size", &self.page_size())
            .field("header_version", &self.header_version())
            .finish()
    }
}

/// Truncating copy with zero fill, strscpy-style.
fn copy_padded(field: &mut [u8], value: &[u8]) {
    field.fill(0);
    let n = value.len().min(field.len());
    field[..n].copy_from_slice(&value[..n]);
}

/// Locate an embedded FDT blob. The magic alone shows up in vmlinux strings,
/// so candidates are validated against the FDT header before being accepted.
pub fn find_dtb_offset(data: &[u8]) -> Option<usize> {
    let finder = memmem::Finder::new(FDT_MAGIC);
    let mut start = 0usize;

    while let Some(rel) = finder.find(&data[start..]) {
        let pos = start + rel;
        let rest = &data[pos..];

        if let Ok((fdt, _)) = RawFdtHeader::ref_from_prefix(rest) {
            let totalsize = fdt.totalsize.get() as usize;
            let off_dt_struct = fdt.off_dt_struct.get() as usize;

            if totalsize <= rest.len() && off_dt_struct + 4 <= rest.len() {
                let tag = u32::from_be_bytes(
                    rest[off_dt_struct..off_dt_struct + 4].try_into().unwrap(),
                );
                if tag == FDT_BEGIN_NODE {
                    return Some(pos);
                }
            }
        }

        start = pos + FDT_MAGIC.len();
    }

    None
}

/// All parse results that do not borrow from the mapping; section locations
/// are kept as index ranges into it.
struct ImageInfo {
    header: BootHeader,
    flags: BootFlags,
    k_fmt: FileFormat,
    r_fmt: FileFormat,
    e_fmt: FileFormat,
    hdr_off: usize,
    payload: Range<usize>,
    tail: Range<usize>,
    kernel: Range<usize>,
    kernel_dtb: Range<usize>,
    ramdisk: Range<usize>,
    second: Range<usize>,
    extra: Range<usize>,
    recovery_dtbo: Range<usize>,
    dtb: Range<usize>,
    signature: Range<usize>,
    vendor_ramdisk_table: Range<usize>,
    bootconfig: Range<usize>,
    k_mtk: Range<usize>,
    r_mtk: Range<usize>,
    z_header: Range<usize>,
    z_tail: Range<usize>,
    avb_footer: Range<usize>,
    vbmeta: Range<usize>,
}

/// A parsed boot image. Owns the mapping of the input file; every section
/// accessor borrows from it. The image is never modified through this type.
pub struct BootImage {
    map: MappedFile,
    info: ImageInfo,
}

impl BootImage {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let map = MappedFile::open(path)?;
        Self::parse(map)
    }

    pub fn parse(map: MappedFile) -> Result<Self> {
        let info = parse_image(map.bytes())?;
        Ok(Self { map, info })
    }

    pub fn data(&self) -> &[u8] {
        self.map.bytes()
    }

    pub fn header(&self) -> &BootHeader {
        &self.info.header
    }

    pub fn flags(&self) -> BootFlags {
        self.info.flags
    }

    pub fn kernel_fmt(&self) -> FileFormat {
        self.info.k_fmt
    }

    pub fn ramdisk_fmt(&self) -> FileFormat {
        self.info.r_fmt
    }

    pub fn extra_fmt(&self) -> FileFormat {
        self.info.e_fmt
    }

    /// Offset of the image header, after any outer wrappers.
    pub fn header_offset(&self) -> usize {
        self.info.hdr_off
    }

    fn section(&self, range: &Range<usize>) -> Option<&[u8]> {
        if range.is_empty() {
            None
        } else {
            Some(&self.map.bytes()[range.clone()])
        }
    }

    pub fn kernel(&self) -> Option<&[u8]> {
        self.section(&self.info.kernel)
    }

    pub fn kernel_dtb(&self) -> Option<&[u8]> {
        self.section(&self.info.kernel_dtb)
    }

    pub fn ramdisk(&self) -> Option<&[u8]> {
        self.section(&self.info.ramdisk)
    }

    pub fn second(&self) -> Option<&[u8]> {
        self.section(&self.info.second)
    }

    pub fn extra(&self) -> Option<&[u8]> {
        self.section(&self.info.extra)
    }

    pub fn recovery_dtbo(&self) -> Option<&[u8]> {
        self.section(&self.info.recovery_dtbo)
    }

    pub fn dtb(&self) -> Option<&[u8]> {
        self.section(&self.info.dtb)
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.section(&self.info.signature)
    }

    pub fn vendor_ramdisk_table(&self) -> Option<&[u8]> {
        self.section(&self.info.vendor_ramdisk_table)
    }

    pub fn bootconfig(&self) -> Option<&[u8]> {
        self.section(&self.info.bootconfig)
    }

    /// The header-parsed region, from the image header to the end of the last
    /// section.
    pub fn payload(&self) -> &[u8] {
        &self.map.bytes()[self.info.payload.clone()]
    }

    pub fn payload_end(&self) -> usize {
        self.info.payload.end
    }

    /// Trailing bytes after the last section.
    pub fn tail(&self) -> &[u8] {
        &self.map.bytes()[self.info.tail.clone()]
    }

    pub fn mtk_kernel_header(&self) -> Option<&RawMtkHeader> {
        self.section(&self.info.k_mtk)
            .map(|s| RawMtkHeader::ref_from_bytes(s).unwrap())
    }

    pub fn mtk_ramdisk_header(&self) -> Option<&RawMtkHeader> {
        self.section(&self.info.r_mtk)
            .map(|s| RawMtkHeader::ref_from_bytes(s).unwrap())
    }

    /// Raw zImage self-extractor bytes preceding the compressed payload.
    pub fn zimage_prefix(&self) -> Option<&[u8]> {
        self.section(&self.info.z_header)
    }

    pub fn zimage_header(&self) -> Option<&RawZImageHeader> {
        self.zimage_prefix()
            .and_then(|s| RawZImageHeader::ref_from_prefix(s).ok())
            .map(|(h, _)| h)
    }

    /// Bytes between the end of the zImage and the end of the kernel section.
    pub fn zimage_tail(&self) -> &[u8] {
        &self.map.bytes()[self.info.z_tail.clone()]
    }

    pub fn avb_footer(&self) -> Option<&Footer> {
        self.section(&self.info.avb_footer)
            .map(|s| Footer::ref_from_bytes(s).unwrap())
    }

    pub fn vbmeta_header(&self) -> Option<&VbmetaImageHeader> {
        self.section(&self.info.vbmeta)
            .map(|s| VbmetaImageHeader::ref_from_prefix(s).unwrap().0)
    }

    /// Vendor v4 ramdisk table entries, when the table is present and its
    /// declared entry size matches the known layout.
    pub fn vendor_ramdisk_entries(&self) -> Vec<&RawVendorRamdiskTableEntry> {
        let Some(table) = self.vendor_ramdisk_table() else {
            return vec![];
        };

        let entry_size = self.info.header.vendor_ramdisk_table_entry_size() as usize;
        if entry_size != mem::size_of::<RawVendorRamdiskTableEntry>() {
            return vec![];
        }

        let entry_num = self.info.header.vendor_ramdisk_table_entry_num() as usize;

        table
            .chunks_exact(entry_size)
            .take(entry_num)
            .map(|c| RawVendorRamdiskTableEntry::ref_from_bytes(c).unwrap())
            .collect()
    }
}

impl fmt::Display for BootImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PAD: usize = 15;

        let hdr = &self.info.header;

        writeln!(f, "{:<PAD$} [{}]", "HEADER_VER", hdr.header_version())?;

        if !hdr.is_vendor() {
            writeln!(f, "{:<PAD$} [{}]", "KERNEL_SZ", hdr.kernel_size())?;
        }
        writeln!(f, "{:<PAD$} [{}]", "RAMDISK_SZ", hdr.ramdisk_size())?;

        match hdr {
            BootHeader::V0(_) | BootHeader::V1(_) | BootHeader::V2(_) | BootHeader::Pxa(_) => {
                writeln!(f, "{:<PAD$} [{}]", "SECOND_SZ", hdr.second_size())?;
                if matches!(hdr, BootHeader::V0(_) | BootHeader::Pxa(_)) {
                    writeln!(f, "{:<PAD$} [{}]", "EXTRA_SZ", hdr.extra_size())?;
                }
                if hdr.header_version() >= 1 {
                    writeln!(f, "{:<PAD$} [{}]", "RECOV_DTBO_SZ", hdr.recovery_dtbo_size())?;
                }
                if hdr.header_version() >= 2 {
                    writeln!(f, "{:<PAD$} [{}]", "DTB_SZ", hdr.dtb_size())?;
                }
            }
            BootHeader::VendorV3(_) | BootHeader::VendorV4(_) => {
                writeln!(f, "{:<PAD$} [{}]", "DTB_SZ", hdr.dtb_size())?;
                if matches!(hdr, BootHeader::VendorV4(_)) {
                    writeln!(f, "{:<PAD$} [{}]", "BOOTCONFIG_SZ", hdr.bootconfig_size())?;
                }
            }
            _ => {}
        }

        if let Some((version, patch_level)) = split_os_version(hdr.os_version()) {
            writeln!(f, "{:<PAD$} [{version}]", "OS_VERSION")?;
            writeln!(f, "{:<PAD$} [{patch_level}]", "OS_PATCH_LEVEL")?;
        }

        writeln!(f, "{:<PAD$} [{}]", "PAGESIZE", hdr.page_size())?;

        if let Some(name) = hdr.name() {
            writeln!(f, "{:<PAD$} [{}]", "NAME", name.trim_end_padding().as_bstr())?;
        }
        if let Some(cmdline) = hdr.cmdline() {
            writeln!(
                f,
                "{:<PAD$} [{}]",
                "CMDLINE",
                cmdline.trim_end_padding().as_bstr(),
            )?;
        }

        if let Some(id) = hdr.id() {
            if !util::is_zero(id) {
                let size = if self.info.flags.contains(BootFlags::SHA256) {
                    32
                } else {
                    SHA1_DIGEST_SIZE
                };

                write!(f, "{:<PAD$} [", "CHECKSUM")?;
                for b in &id[..size] {
                    write!(f, "{b:02x}")?;
                }
                writeln!(f, "]")?;
            }
        }

        if self.kernel().is_some() {
            writeln!(f, "{:<PAD$} [{}]", "KERNEL_FMT", self.info.k_fmt)?;
        }
        if self.ramdisk().is_some() {
            writeln!(f, "{:<PAD$} [{}]", "RAMDISK_FMT", self.info.r_fmt)?;
        }
        if self.extra().is_some() {
            writeln!(f, "{:<PAD$} [{}]", "EXTRA_FMT", self.info.e_fmt)?;
        }

        for entry in self.vendor_ramdisk_entries() {
            writeln!(
                f,
                "{:<PAD$} [{}] type [{}] size [{}]",
                "VND_RAMDISK",
                entry.ramdisk_name.trim_end_padding().as_bstr(),
                entry.ramdisk_type.get(),
                entry.ramdisk_size.get(),
            )?;
        }

        Ok(())
    }
}

impl fmt::Debug for BootImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootImage")
            .field("header", &self.info.header)
            .field("flags", &self.info.flags)
            .field("k_fmt", &self.info.k_fmt)
            .field("r_fmt", &self.info.r_fmt)
            .field("e_fmt", &self.info.e_fmt)
            .field("payload", &util::NumBytes(self.payload().len()))
            .field("tail", &util::NumBytes(self.tail().len()))
            .finish()
    }
}

/// Decode the packed os_version field into `a.b.c` and `YYYY-MM` strings.
pub fn split_os_version(raw: u32) -> Option<(String, String)> {
    if raw == 0 {
        return None;
    }

    let version = raw >> 11;
    let patch_level = raw & 0x7ff;

    let a = (version >> 14) & 0x7f;
    let b = (version >> 7) & 0x7f;
    let c = version & 0x7f;

    let year = (patch_level >> 4) + 2000;
    let month = patch_level & 0xf;

    Some((format!("{a}.{b}.{c}"), format!("{year}-{month:02}")))
}

/// Encode `a.b.c` version bits; the patch level bits are merged in by the
/// caller.
pub fn pack_os_version(a: u32, b: u32, c: u32) -> u32 {
    (((a & 0x7f) << 14) | ((b & 0x7f) << 7) | (c & 0x7f)) << 11
}

pub fn pack_os_patch_level(year: u32, month: u32) -> u32 {
    ((year.saturating_sub(2000) & 0x7f) << 4) | (month & 0xf)
}

fn parse_image(data: &[u8]) -> Result<ImageInfo> {
    let mut flags = BootFlags::empty();
    let mut base = 0usize;

    // Peel outer wrappers in fixed precedence until an AOSP header shows up.
    let vendor = loop {
        let cur = data.get(base..).ok_or(Error::Truncated)?;
        if cur.is_empty() {
            return Err(Error::Truncated);
        }

        match FileFormat::detect(cur) {
            FileFormat::Chromeos => {
                debug!("CHROMEOS_HDR");
                flags |= BootFlags::CHROMEOS;
                base += CHROMEOS_HEADER_SIZE;
            }
            FileFormat::Dhtb => {
                debug!("DHTB_HDR");
                flags |= BootFlags::DHTB | BootFlags::SEANDROID;
                base += mem::size_of::<RawDhtbHeader>();
            }
            FileFormat::Blob => {
                debug!("TEGRA_BLOB");
                flags |= BootFlags::BLOB;
                base += mem::size_of::<RawBlobHeader>();
            }
            FileFormat::Mtk => {
                // An MTK wrapper around the whole image is the amonet
                // exploit layout; the real image follows the 512-byte header.
                let mtk = read_padded::<RawMtkHeader>(cur);
                if mtk.name.trim_end_padding() == AMONET_MAGIC {
                    debug!("AMONET_HDR");
                    flags |= BootFlags::AMONET;
                    base += mem::size_of::<RawMtkHeader>();
                } else {
                    return Err(Error::UnknownFormat);
                }
            }
            FileFormat::Aosp => {
                let probe = read_padded::<RawV0>(cur);

                if NOOKHD_MAGICS.iter().any(|m| probe.cmdline.starts_with(m)) {
                    debug!("NOOKHD_LOADER");
                    flags |= BootFlags::NOOKHD;
                    base += NOOKHD_PRE_HEADER_SIZE;
                } else if probe.name.starts_with(ACCLAIM_MAGIC) {
                    debug!("ACCLAIM_LOADER");
                    flags |= BootFlags::ACCLAIM;
                    base += ACCLAIM_PRE_HEADER_SIZE;
                } else {
                    break false;
                }
            }
            FileFormat::AospVendor => {
                debug!("VENDOR_BOOT_HDR");
                break true;
            }
            _ => return Err(Error::UnknownFormat),
        }
    };

    let mut header = BootHeader::parse(&data[base..], vendor);

    let page_size = header.page_size() as usize;
    if page_size == 0 {
        return Err(Error::PageSizeZero);
    }

    let mut off = base + header.hdr_space();

    let take = |off: &mut usize, size: u32, what: &'static str| -> Result<Range<usize>> {
        let size = size as usize;
        if size == 0 {
            return Ok(0..0);
        }

        let start = *off;
        let end = start
            .checked_add(size)
            .filter(|&e| e <= data.len())
            .ok_or(Error::SectionOutOfBounds(what))?;

        debug!("{what} section at {start}, size {size}");

        // Sections are aligned relative to the image header, not the file.
        *off = padding::round(end - base, page_size).unwrap() + base;

        Ok(start..end)
    };

    let mut kernel = 0..0;
    let mut second = 0..0;
    let mut extra = 0..0;
    let mut recovery_dtbo = 0..0;
    let mut dtb = 0..0;
    let mut signature = 0..0;
    let mut vendor_ramdisk_table = 0..0;
    let mut bootconfig = 0..0;

    let mut ramdisk;

    if !vendor {
        kernel = take(&mut off, header.kernel_size(), "kernel")?;
        ramdisk = take(&mut off, header.ramdisk_size(), "ramdisk")?;
        second = take(&mut off, header.second_size(), "second")?;
        extra = take(&mut off, header.extra_size(), "extra")?;
        recovery_dtbo = take(&mut off, header.recovery_dtbo_size(), "recovery_dtbo")?;
        dtb = take(&mut off, header.dtb_size(), "dtb")?;
        signature = take(&mut off, header.signature_size(), "signature")?;
    } else {
        ramdisk = take(&mut off, header.ramdisk_size(), "vendor_ramdisk")?;
        dtb = take(&mut off, header.dtb_size(), "dtb")?;
        vendor_ramdisk_table = take(
            &mut off,
            header.vendor_ramdisk_table_size(),
            "vendor_ramdisk_table",
        )?;
        bootconfig = take(&mut off, header.bootconfig_size(), "bootconfig")?;
    }

    // Kernel block: appended dtb first, then MTK wrapper, then zImage, then
    // plain compression detection.
    let mut k_fmt = FileFormat::Unknown;
    let mut kernel_dtb = 0..0;
    let mut k_mtk = 0..0;
    let mut z_header = 0..0;
    let mut z_tail = 0..0;

    if !kernel.is_empty() {
        if let Some(dtb_off) = find_dtb_offset(&data[kernel.clone()]) {
            if dtb_off > 0 {
                kernel_dtb = kernel.start + dtb_off..kernel.end;
                kernel.end = kernel.start + dtb_off;
                header.set_kernel_size(dtb_off as u32);
                debug!("KERNEL_DTB [{}]", kernel_dtb.len());
            }
        }

        k_fmt = FileFormat::detect_lg(&data[kernel.clone()]);

        if k_fmt == FileFormat::Mtk {
            debug!("MTK_KERNEL_HDR");
            flags |= BootFlags::MTK_KERNEL;

            if kernel.len() < mem::size_of::<RawMtkHeader>() {
                return Err(Error::Truncated);
            }
            k_mtk = kernel.start..kernel.start + mem::size_of::<RawMtkHeader>();
            kernel.start = k_mtk.end;
            header.set_kernel_size(kernel.len() as u32);

            k_fmt = FileFormat::detect_lg(&data[kernel.clone()]);
        }

        if k_fmt == FileFormat::ZImage {
            let kernel_data = &data[kernel.clone()];

            if let Some(piggy) = memmem::find(kernel_data, ZIMAGE_PIGGY_MAGIC) {
                debug!("ZIMAGE_KERNEL");
                flags |= BootFlags::ZIMAGE_KERNEL;

                let zimage = read_padded::<RawZImageHeader>(kernel_data);
                let mut zimage_size =
                    zimage.end.get().wrapping_sub(zimage.start.get()) as usize;
                if zimage_size <= piggy || zimage_size > kernel_data.len() {
                    zimage_size = kernel_data.len();
                }

                z_header = kernel.start..kernel.start + piggy;
                z_tail = kernel.start + zimage_size..kernel.end;
                kernel = kernel.start + piggy..kernel.start + zimage_size;
                header.set_kernel_size(kernel.len() as u32);
                k_fmt = FileFormat::Gzip;
            } else {
                warn!("Could not find zImage gzip piggy");
                k_fmt = FileFormat::Unknown;
            }
        }

        debug!("KERNEL_FMT [{k_fmt}]");
    }

    // Ramdisk block: MTK wrapper, then compression detection. A vendor v4
    // ramdisk table makes the section an opaque multi-blob region.
    let mut r_fmt = FileFormat::Unknown;
    let mut r_mtk = 0..0;

    if !ramdisk.is_empty() && vendor_ramdisk_table.is_empty() {
        r_fmt = FileFormat::detect_lg(&data[ramdisk.clone()]);

        if r_fmt == FileFormat::Mtk {
            debug!("MTK_RAMDISK_HDR");
            flags |= BootFlags::MTK_RAMDISK;

            if ramdisk.len() < mem::size_of::<RawMtkHeader>() {
                return Err(Error::Truncated);
            }
            r_mtk = ramdisk.start..ramdisk.start + mem::size_of::<RawMtkHeader>();
            ramdisk.start = r_mtk.end;
            header.set_ramdisk_size(ramdisk.len() as u32);

            r_fmt = FileFormat::detect_lg(&data[ramdisk.clone()]);
        }

        debug!("RAMDISK_FMT [{r_fmt}]");
    }

    let mut e_fmt = FileFormat::Unknown;
    if !extra.is_empty() {
        e_fmt = FileFormat::detect_lg(&data[extra.clone()]);
    }

    let payload_end = off.min(data.len());
    let payload = base..payload_end;
    let tail = payload_end..data.len();
    let tail_data = &data[tail.clone()];

    if tail_data.starts_with(SEANDROID_MAGIC) {
        debug!("SAMSUNG_SEANDROID");
        flags |= BootFlags::SEANDROID;
    } else if tail_data.starts_with(&LG_BUMP_MAGIC) {
        debug!("LG_BUMP_IMAGE");
        flags |= BootFlags::LG_BUMP;
    }

    // LG's signer has been seen placing the bump magic anywhere within the
    // final 64 bytes.
    if !flags.contains(BootFlags::LG_BUMP) && data.len() >= LG_BUMP_MAGIC.len() {
        let last = &data[data.len().saturating_sub(64)..];
        if memmem::find(last, &LG_BUMP_MAGIC).is_some() {
            debug!("LG_BUMP_IMAGE");
            flags |= BootFlags::LG_BUMP;
        }
    }

    // An AVB1 boot signature is a bare DER SEQUENCE right after the payload.
    if tail_data.len() >= 2 && tail_data[0] == 0x30 && tail_data[1] == 0x82 {
        debug!("AVB1_SIGNED");
        flags |= BootFlags::AVB1_SIGNED;
    }

    let mut avb_footer = 0..0;
    let mut vbmeta = 0..0;

    if let Some(footer_off) = avb::footer_offset(data) {
        flags |= BootFlags::AVB;
        avb_footer = footer_off..data.len();

        let footer = Footer::ref_from_bytes(&data[avb_footer.clone()]).unwrap();
        let vbmeta_off = footer.vbmeta_offset.get() as usize;
        let vbmeta_size = footer.vbmeta_size.get() as usize;

        if let Some(end) = vbmeta_off.checked_add(vbmeta_size) {
            if let Some(region) = data.get(vbmeta_off..end) {
                if region.starts_with(avb::HEADER_MAGIC)
                    && vbmeta_size >= mem::size_of::<VbmetaImageHeader>()
                {
                    debug!("AVB_FOOTER");
                    vbmeta = vbmeta_off..end;
                }
            }
        }
    }

    // A digest wider than SHA-1 in the id field means SHA-256 was used.
    if let Some(id) = header.id() {
        if id[SHA1_DIGEST_SIZE + 4..].iter().any(|b| *b != 0) {
            flags |= BootFlags::SHA256;
        }
    }

    Ok(ImageInfo {
        header,
        flags,
        k_fmt,
        r_fmt,
        e_fmt,
        hdr_off: base,
        payload,
        tail,
        kernel,
        kernel_dtb,
        ramdisk,
        second,
        extra,
        recovery_dtbo,
        dtb,
        signature,
        vendor_ramdisk_table,
        bootconfig,
        k_mtk,
        r_mtk,
        z_header,
        z_tail,
        avb_footer,
        vbmeta,
    })
}
