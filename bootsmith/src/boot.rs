// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Drives the boot image parser, the codecs, and the hash layer to split an
//! image into its well-known component files and to reassemble them while
//! preserving the original layout byte for byte.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    mem,
    path::Path,
};

use bstr::ByteSlice;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    format::{
        avb::{self, Footer},
        bootimage::{
            self, BootFlags, BootHeader, BootImage, DHTB_MAGIC, RawBlobHeader, RawDhtbHeader,
            RawMtkHeader, RawZImageHeader, find_dtb_offset, pack_os_patch_level, pack_os_version,
            split_os_version,
        },
        compression::{self, FileFormat},
        padding::{self, ZeroPadding},
    },
    hash::{self, HashAlgorithm, Hasher},
    mmap::MappedFile,
    stream::{CountingWriter, WriteZerosExt},
};

use zerocopy::{FromBytes, IntoBytes};

pub const HEADER_FILE: &str = "header";
pub const KERNEL_FILE: &str = "kernel";
pub const KER_DTB_FILE: &str = "kernel_dtb";
pub const RAMDISK_FILE: &str = "ramdisk.cpio";
pub const SECOND_FILE: &str = "second";
pub const EXTRA_FILE: &str = "extra";
pub const RECV_DTBO_FILE: &str = "recovery_dtbo";
pub const DTB_FILE: &str = "dtb";
pub const VND_RAMDISK_TABLE_FILE: &str = "vendor_ramdisk_table";
pub const BOOTCONFIG_FILE: &str = "bootconfig";

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to parse boot image")]
    Image(#[from] bootimage::Error),
    #[error("Failed to recode section data")]
    Codec(#[from] compression::Error),
    #[error("No device tree found in the image")]
    DtbNotFound,
    #[error("I/O error")]
    Io(#[from] io::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Outcome of a successful unpack. Non-[`Self::Ok`] values tell the caller
/// that an outer wrapper has to be reapplied externally after repacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackStatus {
    Ok,
    /// Image was wrapped for Chrome OS verified boot and must be re-signed.
    ChromeOs,
    /// Image is a vendor boot image.
    Vendor,
}

impl UnpackStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::ChromeOs => 2,
            Self::Vendor => 3,
        }
    }
}

fn dump_raw(path: &Path, data: &[u8]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data)?;
    writer.flush()?;

    Ok(())
}

fn dump_section(path: &Path, data: &[u8], format: FileFormat, skip_decomp: bool) -> Result<()> {
    if !skip_decomp && format.is_compressed() {
        debug!("Decompressing {format} data to {path:?}");

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        compression::decompress_bytes(format, data, &mut writer)?;
        writer.flush()?;
    } else {
        dump_raw(path, data)?;
    }

    Ok(())
}

fn map_if_exists(path: &Path) -> Result<Option<MappedFile>> {
    match MappedFile::open(path) {
        Ok(m) => Ok(Some(m)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_header_file(path: &Path, header: &BootHeader) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    if let Some(name) = header.name() {
        writeln!(writer, "name={}", name.trim_end_padding().as_bstr())?;
    }
    if let Some(cmdline) = header.cmdline() {
        writeln!(writer, "cmdline={}", cmdline.trim_end_padding().as_bstr())?;
    }
    if let Some((version, patch_level)) = split_os_version(header.os_version()) {
        writeln!(writer, "os_version={version}")?;
        writeln!(writer, "os_patch_level={patch_level}")?;
    }

    writer.flush()?;

    Ok(())
}

/// Apply `key=value` lines from a previously dumped header file.
fn load_header_file(header: &mut BootHeader, path: &Path) -> Result<()> {
    let data = fs::read_to_string(path)?;

    for line in data.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };

        match key {
            "name" => header.set_name(value.as_bytes()),
            "cmdline" => header.set_cmdline(value.as_bytes()),
            "os_version" => {
                let mut parts = value.split('.');
                let a = parts.next().and_then(|p| p.parse::<u32>().ok());
                let b = parts.next().and_then(|p| p.parse::<u32>().ok());
                let c = parts.next().and_then(|p| p.parse::<u32>().ok());

                if let Some(a) = a {
                    let patch_level = header.os_version() & 0x7ff;
                    let version = pack_os_version(a, b.unwrap_or(0), c.unwrap_or(0));
                    header.set_os_version(version | patch_level);
                } else {
                    warn!("Invalid os_version: {value}");
                }
            }
            "os_patch_level" => {
                let parsed = value.split_once('-').and_then(|(y, m)| {
                    Some((y.parse::<u32>().ok()?, m.parse::<u32>().ok()?))
                });

                if let Some((year, month)) = parsed {
                    let version = header.os_version() & !0x7ff;
                    header.set_os_version(version | pack_os_patch_level(year, month));
                } else {
                    warn!("Invalid os_patch_level: {value}");
                }
            }
            _ => debug!("Ignoring unknown header key: {key}"),
        }
    }

    Ok(())
}

/// Unpack the image's sections into well-known files in the current
/// directory.
pub fn unpack(image: &Path, skip_decomp: bool, dump_hdr: bool) -> Result<UnpackStatus> {
    unpack_in(Path::new("."), image, skip_decomp, dump_hdr)
}

/// Unpack the image's sections into well-known files in `dir`.
pub fn unpack_in(
    dir: &Path,
    image: &Path,
    skip_decomp: bool,
    dump_hdr: bool,
) -> Result<UnpackStatus> {
    debug!("Unpacking boot image: {image:?}");

    let boot = BootImage::open(image)?;
    eprint!("{boot}");

    if dump_hdr {
        write_header_file(&dir.join(HEADER_FILE), boot.header())?;
    }

    if let Some(kernel) = boot.kernel() {
        dump_section(&dir.join(KERNEL_FILE), kernel, boot.kernel_fmt(), skip_decomp)?;
    }
    if let Some(kernel_dtb) = boot.kernel_dtb() {
        dump_raw(&dir.join(KER_DTB_FILE), kernel_dtb)?;
    }
    if let Some(ramdisk) = boot.ramdisk() {
        dump_section(
            &dir.join(RAMDISK_FILE),
            ramdisk,
            boot.ramdisk_fmt(),
            skip_decomp,
        )?;
    }
    if let Some(second) = boot.second() {
        dump_raw(&dir.join(SECOND_FILE), second)?;
    }
    if let Some(extra) = boot.extra() {
        dump_section(&dir.join(EXTRA_FILE), extra, boot.extra_fmt(), skip_decomp)?;
    }
    if let Some(recovery_dtbo) = boot.recovery_dtbo() {
        dump_raw(&dir.join(RECV_DTBO_FILE), recovery_dtbo)?;
    }
    if let Some(dtb) = boot.dtb() {
        dump_raw(&dir.join(DTB_FILE), dtb)?;
    }
    if let Some(table) = boot.vendor_ramdisk_table() {
        dump_raw(&dir.join(VND_RAMDISK_TABLE_FILE), table)?;
    }
    if let Some(bootconfig) = boot.bootconfig() {
        dump_raw(&dir.join(BOOTCONFIG_FILE), bootconfig)?;
    }

    if boot.flags().contains(BootFlags::CHROMEOS) {
        Ok(UnpackStatus::ChromeOs)
    } else if boot.header().is_vendor() {
        Ok(UnpackStatus::Vendor)
    } else {
        Ok(UnpackStatus::Ok)
    }
}

fn align_to_page<W: Write>(
    writer: &mut CountingWriter<W>,
    base: u64,
    page_size: u64,
) -> io::Result<()> {
    let pad = padding::calc(writer.stream_position() - base, page_size);
    writer.write_zeros_exact(pad)
}

/// Stream `data` into the writer, compressing it with `format` when it isn't
/// already compressed. Returns the number of bytes written.
fn write_section<W: Write>(
    writer: &mut CountingWriter<W>,
    data: &[u8],
    format: FileFormat,
    skip_comp: bool,
) -> Result<u64> {
    let before = writer.stream_position();

    if !skip_comp && !FileFormat::detect(data).is_compressed() && format.is_compressed() {
        debug!("Compressing section with {format}");
        compression::compress_bytes(format, data, &mut *writer)?;
    } else {
        writer.write_all(data)?;
    }

    Ok(writer.stream_position() - before)
}

/// Repack well-known files from the current directory into a new image laid
/// out like `src`.
pub fn repack(src: &Path, dst: &Path, skip_comp: bool) -> Result<()> {
    repack_in(Path::new("."), src, dst, skip_comp)
}

/// Repack well-known files from `dir` into a new image laid out like `src`.
/// Sections without a corresponding file keep the original image's bytes.
pub fn repack_in(dir: &Path, src: &Path, dst: &Path, skip_comp: bool) -> Result<()> {
    let boot = BootImage::open(src)?;
    eprint!("{boot}");

    debug!("Repacking to boot image: {dst:?}");

    let data = boot.data();
    let flags = boot.flags();
    let mut header = boot.header().clone();

    if flags.contains(BootFlags::AVB1_SIGNED) {
        warn!("Image is signed with AVB 1.0; the signature will not be regenerated");
    }

    let file = File::create(dst)?;
    let mut writer = CountingWriter::new(BufWriter::new(file));

    // Outer wrapper bytes. DHTB gets a placeholder that is rebuilt in the
    // patch pass; the Chrome OS header has to be reapplied by the signer.
    if flags.contains(BootFlags::DHTB) {
        writer.write_zeros_exact(mem::size_of::<RawDhtbHeader>() as u64)?;
    } else if !flags.contains(BootFlags::CHROMEOS) {
        writer.write_all(&data[..boot.header_offset()])?;
    }

    let header_off = writer.stream_position();
    writer.write_zeros_exact(header.hdr_space() as u64)?;

    let page_size = u64::from(header.page_size());
    let mtk_size = mem::size_of::<RawMtkHeader>() as u64;

    let mut off_kernel = 0u64;
    let mut off_second = 0u64;
    let mut off_extra = 0u64;
    let mut off_recovery_dtbo = 0u64;
    let mut off_dtb = 0u64;
    let mut kernel_dtb_size = 0u64;

    if !header.is_vendor() {
        off_kernel = writer.stream_position();

        if let Some(mtk) = boot.mtk_kernel_header() {
            writer.write_all(mtk.as_bytes())?;
        }
        if let Some(prefix) = boot.zimage_prefix() {
            writer.write_all(prefix)?;
        }

        let mut kernel_size = 0u64;
        let orig_inner = boot.kernel().map_or(0, <[u8]>::len);
        let kernel_file = map_if_exists(&dir.join(KERNEL_FILE))?;

        if flags.contains(BootFlags::ZIMAGE_KERNEL) && boot.zimage_prefix().is_some() {
            // The self-extractor hardcodes offsets, so the zImage size must
            // not change. The new payload is padded to the original size with
            // the plaintext size kept as the final word.
            let mut replacement = None;

            if let Some(m) = &kernel_file {
                let raw = m.bytes();
                let mut payload = Vec::new();

                if !skip_comp
                    && !FileFormat::detect(raw).is_compressed()
                    && boot.kernel_fmt().is_compressed()
                {
                    compression::compress_bytes(boot.kernel_fmt(), raw, &mut payload)?;
                } else {
                    payload.extend_from_slice(raw);
                }

                if payload.len() > orig_inner {
                    warn!("Recompressed kernel is too large, using the original kernel");
                } else {
                    replacement = Some((payload, raw.len() as u32));
                }
            }

            match replacement {
                Some((payload, plain_size)) => {
                    writer.write_all(&payload)?;

                    let pad = orig_inner - payload.len();
                    if pad >= 4 {
                        writer.write_zeros_exact((pad - 4) as u64)?;
                        writer.write_all(&plain_size.to_le_bytes())?;
                    } else {
                        writer.write_zeros_exact(pad as u64)?;
                    }
                }
                None => {
                    if let Some(kernel) = boot.kernel() {
                        writer.write_all(kernel)?;
                    }
                }
            }

            writer.write_all(boot.zimage_tail())?;
            kernel_size = (boot.zimage_prefix().map_or(0, <[u8]>::len)
                + orig_inner
                + boot.zimage_tail().len()) as u64;
        } else if let Some(m) = &kernel_file {
            kernel_size = write_section(&mut writer, m.bytes(), boot.kernel_fmt(), skip_comp)?;
        } else if let Some(kernel) = boot.kernel() {
            writer.write_all(kernel)?;
            kernel_size = kernel.len() as u64;
        }

        // A previously split device tree is appended back to the kernel.
        if let Some(m) = map_if_exists(&dir.join(KER_DTB_FILE))? {
            writer.write_all(m.bytes())?;
            kernel_dtb_size = m.len() as u64;
        } else if let Some(kernel_dtb) = boot.kernel_dtb() {
            writer.write_all(kernel_dtb)?;
            kernel_dtb_size = kernel_dtb.len() as u64;
        }
        kernel_size += kernel_dtb_size;

        if flags.contains(BootFlags::MTK_KERNEL) {
            kernel_size += mtk_size;
        }
        header.set_kernel_size(kernel_size as u32);
        align_to_page(&mut writer, header_off, page_size)?;
    }

    let off_ramdisk = writer.stream_position();
    {
        if let Some(mtk) = boot.mtk_ramdisk_header() {
            writer.write_all(mtk.as_bytes())?;
        }

        let mut ramdisk_size = 0u64;

        if let Some(m) = map_if_exists(&dir.join(RAMDISK_FILE))? {
            ramdisk_size = write_section(&mut writer, m.bytes(), boot.ramdisk_fmt(), skip_comp)?;
        } else if let Some(ramdisk) = boot.ramdisk() {
            writer.write_all(ramdisk)?;
            ramdisk_size = ramdisk.len() as u64;
        }

        if flags.contains(BootFlags::MTK_RAMDISK) {
            ramdisk_size += mtk_size;
        }
        header.set_ramdisk_size(ramdisk_size as u32);
        align_to_page(&mut writer, header_off, page_size)?;
    }

    if !header.is_vendor() {
        off_second = writer.stream_position();
        {
            let mut second_size = 0u64;
            if let Some(m) = map_if_exists(&dir.join(SECOND_FILE))? {
                writer.write_all(m.bytes())?;
                second_size = m.len() as u64;
            } else if let Some(second) = boot.second() {
                writer.write_all(second)?;
                second_size = second.len() as u64;
            }
            header.set_second_size(second_size as u32);
            align_to_page(&mut writer, header_off, page_size)?;
        }

        off_extra = writer.stream_position();
        {
            let mut extra_size = 0u64;
            if let Some(m) = map_if_exists(&dir.join(EXTRA_FILE))? {
                extra_size = write_section(&mut writer, m.bytes(), boot.extra_fmt(), skip_comp)?;
            } else if let Some(extra) = boot.extra() {
                writer.write_all(extra)?;
                extra_size = extra.len() as u64;
            }
            header.set_extra_size(extra_size as u32);
            align_to_page(&mut writer, header_off, page_size)?;
        }

        off_recovery_dtbo = writer.stream_position();
        {
            let mut dtbo_size = 0u64;
            if let Some(m) = map_if_exists(&dir.join(RECV_DTBO_FILE))? {
                writer.write_all(m.bytes())?;
                dtbo_size = m.len() as u64;
            } else if let Some(dtbo) = boot.recovery_dtbo() {
                writer.write_all(dtbo)?;
                dtbo_size = dtbo.len() as u64;
            }
            header.set_recovery_dtbo_size(dtbo_size as u32);
            align_to_page(&mut writer, header_off, page_size)?;
        }

        off_dtb = writer.stream_position();
        {
            let mut dtb_size = 0u64;
            if let Some(m) = map_if_exists(&dir.join(DTB_FILE))? {
                writer.write_all(m.bytes())?;
                dtb_size = m.len() as u64;
            } else if let Some(dtb) = boot.dtb() {
                writer.write_all(dtb)?;
                dtb_size = dtb.len() as u64;
            }
            header.set_dtb_size(dtb_size as u32);
            align_to_page(&mut writer, header_off, page_size)?;
        }

        // The VTS signature is not meaningful after modification, but the
        // bytes are kept so the image size doesn't change.
        if let Some(signature) = boot.signature() {
            writer.write_all(signature)?;
            align_to_page(&mut writer, header_off, page_size)?;
        }
    } else {
        off_dtb = writer.stream_position();
        {
            let mut dtb_size = 0u64;
            if let Some(m) = map_if_exists(&dir.join(DTB_FILE))? {
                writer.write_all(m.bytes())?;
                dtb_size = m.len() as u64;
            } else if let Some(dtb) = boot.dtb() {
                writer.write_all(dtb)?;
                dtb_size = dtb.len() as u64;
            }
            header.set_dtb_size(dtb_size as u32);
            align_to_page(&mut writer, header_off, page_size)?;
        }

        if let Some(m) = map_if_exists(&dir.join(VND_RAMDISK_TABLE_FILE))? {
            writer.write_all(m.bytes())?;
            align_to_page(&mut writer, header_off, page_size)?;
        } else if let Some(table) = boot.vendor_ramdisk_table() {
            writer.write_all(table)?;
            align_to_page(&mut writer, header_off, page_size)?;
        }

        let mut bootconfig_size = 0u64;
        if let Some(m) = map_if_exists(&dir.join(BOOTCONFIG_FILE))? {
            writer.write_all(m.bytes())?;
            bootconfig_size = m.len() as u64;
        } else if let Some(bootconfig) = boot.bootconfig() {
            writer.write_all(bootconfig)?;
            bootconfig_size = bootconfig.len() as u64;
        }
        header.set_bootconfig_size(bootconfig_size as u32);
        if bootconfig_size > 0 {
            align_to_page(&mut writer, header_off, page_size)?;
        }
    }

    let total = writer.stream_position();

    // The original trailing bytes are preserved verbatim, including any AVB
    // metadata and vendor signing magic.
    writer.write_all(boot.tail())?;

    writer.flush()?;
    let (inner, _) = writer.finish();
    drop(inner);

    // Patch pass over the written image.
    let mut out_map = MappedFile::open_rw(dst)?;
    let out = out_map
        .bytes_mut()
        .ok_or_else(|| io::Error::other("Output mapping is not writable"))?;

    let header_path = dir.join(HEADER_FILE);
    if header_path.exists() {
        load_header_file(&mut header, &header_path)?;
    }

    if header.header_size() != 0 {
        header.set_header_size(header.struct_size() as u32);
    }

    // Fix up the wrapper headers inside the kernel and ramdisk sections
    // first, since the id digest covers their bytes.
    if flags.contains(BootFlags::MTK_KERNEL) {
        let (mtk, _) = RawMtkHeader::mut_from_prefix(&mut out[off_kernel as usize..]).unwrap();
        mtk.size.set(header.kernel_size() - mtk_size as u32);
    }
    if flags.contains(BootFlags::MTK_RAMDISK) {
        let (mtk, _) = RawMtkHeader::mut_from_prefix(&mut out[off_ramdisk as usize..]).unwrap();
        mtk.size.set(header.ramdisk_size() - mtk_size as u32);
    }

    if flags.contains(BootFlags::ZIMAGE_KERNEL) && boot.zimage_prefix().is_some() {
        let mut zimage_off = off_kernel as usize;
        let mut overhead = kernel_dtb_size as u32 + boot.zimage_tail().len() as u32;
        if flags.contains(BootFlags::MTK_KERNEL) {
            zimage_off += mtk_size as usize;
            overhead += mtk_size as u32;
        }

        let (zimage, _) = RawZImageHeader::mut_from_prefix(&mut out[zimage_off..]).unwrap();
        let end = zimage
            .start
            .get()
            .wrapping_add(header.kernel_size() - overhead);
        zimage.end.set(end);
    }

    // Recompute the id digest over the final section bytes and sizes.
    if header.id().is_some() {
        let algorithm = if flags.contains(BootFlags::SHA256) {
            HashAlgorithm::Sha256
        } else {
            HashAlgorithm::Sha1
        };
        let mut hasher = Hasher::new(algorithm);

        let section = |off: u64, size: u32| &out[off as usize..off as usize + size as usize];

        hasher.update(section(off_kernel, header.kernel_size()));
        hasher.update(&header.kernel_size().to_le_bytes());
        hasher.update(section(off_ramdisk, header.ramdisk_size()));
        hasher.update(&header.ramdisk_size().to_le_bytes());
        hasher.update(section(off_second, header.second_size()));
        hasher.update(&header.second_size().to_le_bytes());

        let extra_size = header.extra_size();
        if extra_size != 0 {
            hasher.update(section(off_extra, extra_size));
            hasher.update(&extra_size.to_le_bytes());
        }

        let version = header.header_version();
        if version == 1 || version == 2 {
            hasher.update(section(off_recovery_dtbo, header.recovery_dtbo_size()));
            hasher.update(&header.recovery_dtbo_size().to_le_bytes());
        }
        if version == 2 {
            hasher.update(section(off_dtb, header.dtb_size()));
            hasher.update(&header.dtb_size().to_le_bytes());
        }

        let mut digest = [0u8; 32];
        let digest_size = algorithm.digest_size();
        hasher.finalize_into(&mut digest);

        let id = header.id_mut().unwrap();
        id.fill(0);
        id[..digest_size].copy_from_slice(&digest[..digest_size]);
    }

    let header_bytes = header.as_bytes();
    out[header_off as usize..header_off as usize + header_bytes.len()]
        .copy_from_slice(header_bytes);

    if flags.contains(BootFlags::DHTB) {
        let payload_size = total - mem::size_of::<RawDhtbHeader>() as u64;
        let digest = hash::sha256(&out[mem::size_of::<RawDhtbHeader>()..total as usize]);

        let (dhtb, _) = RawDhtbHeader::mut_from_prefix(&mut out[..]).unwrap();
        dhtb.magic = *DHTB_MAGIC;
        dhtb.checksum.fill(0);
        dhtb.checksum[..32].copy_from_slice(&digest);
        dhtb.size.set(payload_size as u32);
    } else if flags.contains(BootFlags::BLOB) {
        let payload_size = (total - mem::size_of::<RawBlobHeader>() as u64) as u32;

        let (blob, _) = RawBlobHeader::mut_from_prefix(&mut out[..]).unwrap();
        blob.datalen.set(payload_size);
        blob.size.set(payload_size);
    }

    // If the payload grew or shrank, the copied AVB footer points at the old
    // vbmeta location and has to be shifted along.
    if flags.contains(BootFlags::AVB) {
        let delta = total as i64 - boot.payload_end() as i64;

        if delta != 0 {
            if let Some(footer_off) = avb::footer_offset(out) {
                let (footer, _) = Footer::mut_from_prefix(&mut out[footer_off..]).unwrap();

                let image_size = footer.original_image_size.get() as i64 + delta;
                let vbmeta_off = footer.vbmeta_offset.get() as i64 + delta;
                footer.original_image_size.set(image_size as u64);
                footer.vbmeta_offset.set(vbmeta_off as u64);
            }
        }
    }

    out_map.flush()?;

    Ok(())
}

/// Split an appended device tree out of a kernel image in the current
/// directory.
pub fn split_image_dtb(image: &Path, skip_decomp: bool) -> Result<()> {
    split_image_dtb_in(Path::new("."), image, skip_decomp)
}

/// Split an appended device tree out of a kernel image, writing the kernel
/// and device tree to their well-known files in `dir`.
pub fn split_image_dtb_in(dir: &Path, image: &Path, skip_decomp: bool) -> Result<()> {
    // Read into memory rather than mapping, since the input is commonly the
    // kernel file this function rewrites.
    let data = fs::read(image)?;

    let dtb_off = find_dtb_offset(&data).ok_or(Error::DtbNotFound)?;
    debug!("Found DTB at offset {dtb_off}");

    let format = FileFormat::detect_lg(&data[..dtb_off]);
    dump_section(&dir.join(KERNEL_FILE), &data[..dtb_off], format, skip_decomp)?;
    dump_raw(&dir.join(KER_DTB_FILE), &data[dtb_off..])?;

    Ok(())
}
