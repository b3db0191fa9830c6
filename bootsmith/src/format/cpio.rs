/*
 * SPDX-FileCopyrightText: 2024 Andrew Gunnerson
 * SPDX-License-Identifier: GPL-3.0-only
 */

use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use bstr::ByteSlice;
use memchr::memmem;
use thiserror::Error;

use crate::{
    format::padding,
    mmap::MappedFile,
    stream::{CountingWriter, WriteZerosExt},
    util::NumBytes,
};

const MAGIC_NEW: &[u8; 6] = b"070701";

const CPIO_TRAILER: &str = "TRAILER!!!";

/// Fixed newc header size: magic plus 13 ASCII hex fields.
const HEADER_SIZE: usize = 110;

pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;

#[derive(Debug, Error)]
pub enum Error {
    #[error("No newc magic found in archive")]
    MagicNotFound,
    #[error("Bad newc magic at offset {0}: {magic:?}", magic = .1.as_bstr())]
    BadMagic(usize, Vec<u8>),
    #[error("Archive is truncated at offset {0}")]
    Truncated(usize),
    #[error("{0:?} field is not valid hex: {data:?}", data = .1.as_bstr())]
    InvalidHex(&'static str, Vec<u8>),
    #[error("Filename is not NUL-terminated")]
    NameNotTerminated,
    #[error("Filename is not UTF-8: {data:?}", data = .0.as_bstr())]
    NameNotUtf8(Vec<u8>),
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
    #[error("I/O error")]
    Io(#[from] io::Error),
}

type Result<T> = std::result::Result<T, Error>;

/// Parse a u32 formatted as an ASCII 8-char wide hex string.
fn parse_hex(name: &'static str, raw: &[u8]) -> Result<u32> {
    let mut value = 0u32;

    for b in raw {
        let digit = (*b as char)
            .to_digit(16)
            .ok_or_else(|| Error::InvalidHex(name, raw.to_vec()))?;

        value <<= 4;
        value |= digit;
    }

    Ok(value)
}

/// Write a u32 formatted as an ASCII 8-char wide hex string.
fn write_hex(mut writer: impl Write, mut value: u32) -> io::Result<()> {
    let mut buf = [b'0'; 8];
    let mut index = 7;

    while value != 0 {
        buf[index] = char::from_digit(value & 0xf, 16).unwrap() as u8;
        value >>= 4;
        index -= 1;
    }

    writer.write_all(&buf)
}

fn file_type(mode: u32) -> u32 {
    mode & S_IFMT
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct CpioEntry {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub rdev_maj: u32,
    pub rdev_min: u32,
    pub data: Vec<u8>,
}

impl CpioEntry {
    pub fn is_dir(&self) -> bool {
        file_type(self.mode) == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        file_type(self.mode) == S_IFREG
    }
}

impl fmt::Debug for CpioEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CpioEntry")
            .field("mode", &format_args!("0o{:o}", self.mode))
            .field("uid", &self.uid)
            .field("gid", &self.gid)
            .field("rdev_maj", &self.rdev_maj)
            .field("rdev_min", &self.rdev_min)
            .field("data", &NumBytes(self.data.len()))
            .finish()
    }
}

/// What a ramdisk has been patched with, as reported by the `test` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Stock,
    Magisk,
    /// SuperSU or Xposed style modifications.
    ThirdParty,
}

impl PatchStatus {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Stock => 0,
            Self::Magisk => 1,
            Self::ThirdParty => 2,
        }
    }
}

const MAGISK_PATHS: &[&str] = &[
    "init.magisk.rc",
    ".backup/.magisk",
    "overlay.d/sbin/magisk32.xz",
    "overlay.d/sbin/magisk64.xz",
];

const THIRD_PARTY_PATHS: &[&str] = &["sbin/launch_daemonsu.sh", "init.xposed.rc"];

/// An ordered mapping from normalized path to entry. Iteration follows the
/// path order, paths are unique, and the trailer plus `.`/`..` pseudo entries
/// are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpioArchive {
    entries: BTreeMap<String, CpioEntry>,
}

impl CpioArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an archive from a file. A nonexistent file yields an empty
    /// archive.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let map = match MappedFile::open(path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        Self::load(map.bytes())
    }

    /// Load an archive from raw bytes. Leading garbage before the first magic
    /// is skipped and concatenated archives after a trailer are merged.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut archive = Self::new();
        if data.is_empty() {
            return Ok(archive);
        }
        if data.len() < HEADER_SIZE {
            return Err(Error::Truncated(0));
        }

        let mut pos = 0usize;
        // Entry padding is aligned to the start of the containing archive,
        // which wrapper junk may shift away from the start of the file.
        let mut base = 0usize;

        loop {
            if pos + MAGIC_NEW.len() > data.len() {
                break;
            }

            if &data[pos..pos + MAGIC_NEW.len()] != MAGIC_NEW {
                if pos == 0 {
                    // Wrapper padding before the archive proper.
                    pos = memmem::find(data, MAGIC_NEW).ok_or(Error::MagicNotFound)?;
                    base = pos;
                } else {
                    return Err(Error::BadMagic(
                        pos,
                        data[pos..(pos + 6).min(data.len())].to_vec(),
                    ));
                }
            }

            if pos + HEADER_SIZE > data.len() {
                return Err(Error::Truncated(pos));
            }

            let header = &data[pos..pos + HEADER_SIZE];
            let mode = parse_hex("mode", &header[14..22])?;
            let uid = parse_hex("uid", &header[22..30])?;
            let gid = parse_hex("gid", &header[30..38])?;
            let filesize = parse_hex("filesize", &header[54..62])? as usize;
            let rdev_maj = parse_hex("rdevmajor", &header[78..86])?;
            let rdev_min = parse_hex("rdevminor", &header[86..94])?;
            let namesize = parse_hex("namesize", &header[94..102])? as usize;

            pos += HEADER_SIZE;

            if namesize == 0 || pos + namesize > data.len() {
                return Err(Error::Truncated(pos));
            }

            let mut name = &data[pos..pos + namesize];
            if name.last() != Some(&b'\0') {
                return Err(Error::NameNotTerminated);
            }
            name = &name[..name.len() - 1];

            pos += namesize;
            pos = base + padding::round(pos - base, 4).unwrap();

            if name == CPIO_TRAILER.as_bytes() {
                // A concatenated archive may follow the trailer padding.
                let search_from = pos.min(data.len());
                match memmem::find(&data[search_from..], MAGIC_NEW) {
                    Some(n) => {
                        pos = search_from + n;
                        base = pos;
                        continue;
                    }
                    None => break,
                }
            }

            if pos + filesize > data.len() {
                return Err(Error::Truncated(pos));
            }

            let content = data[pos..pos + filesize].to_vec();
            pos += filesize;
            pos = base + padding::round(pos - base, 4).unwrap();

            let name =
                String::from_utf8(name.to_vec()).map_err(|e| Error::NameNotUtf8(e.into_bytes()))?;
            let name = Self::normalize_path(&name);
            if name.is_empty() || name == "." || name == ".." {
                continue;
            }

            archive.entries.insert(
                name,
                CpioEntry {
                    mode,
                    uid,
                    gid,
                    rdev_maj,
                    rdev_min,
                    data: content,
                },
            );
        }

        Ok(archive)
    }

    pub fn save_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.save(&mut writer)?;
        writer.flush()?;

        Ok(())
    }

    /// Serialize all entries in path order, assigning synthetic inode numbers
    /// starting at 1, followed by the trailer.
    pub fn save(&self, writer: impl Write) -> Result<()> {
        let mut writer = CountingWriter::new(writer);
        let mut ino = 1u32;

        for (name, entry) in &self.entries {
            write_entry(&mut writer, ino, name, entry)?;
            ino += 1;
        }

        let trailer = CpioEntry {
            mode: S_IFREG,
            ..Default::default()
        };
        write_entry(&mut writer, ino, CPIO_TRAILER, &trailer)?;

        Ok(())
    }

    /// Split on `/` and drop empty and `.` segments.
    pub fn normalize_path(path: &str) -> String {
        path.split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CpioEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn get(&self, path: &str) -> Option<&CpioEntry> {
        self.entries.get(&Self::normalize_path(path))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.entries.contains_key(&Self::normalize_path(path))
    }

    /// Store `data` as a regular file. Only the permission bits of `mode` are
    /// kept.
    pub fn add(&mut self, mode: u32, path: &str, data: Vec<u8>) {
        self.entries.insert(
            Self::normalize_path(path),
            CpioEntry {
                mode: (mode & 0o7777) | S_IFREG,
                uid: 0,
                gid: 0,
                rdev_maj: 0,
                rdev_min: 0,
                data,
            },
        );
    }

    pub fn mkdir(&mut self, mode: u32, path: &str) {
        self.entries.insert(
            Self::normalize_path(path),
            CpioEntry {
                mode: (mode & 0o7777) | S_IFDIR,
                uid: 0,
                gid: 0,
                rdev_maj: 0,
                rdev_min: 0,
                data: vec![],
            },
        );
    }

    /// Returns whether a removal occurred.
    pub fn rm(&mut self, path: &str) -> bool {
        self.entries.remove(&Self::normalize_path(path)).is_some()
    }

    pub fn mv(&mut self, from: &str, to: &str) -> Result<()> {
        let from = Self::normalize_path(from);
        let entry = self
            .entries
            .remove(&from)
            .ok_or(Error::EntryNotFound(from))?;
        self.entries.insert(Self::normalize_path(to), entry);

        Ok(())
    }

    /// Classify the ramdisk by the root solution artifacts it contains.
    pub fn patch_status(&self) -> PatchStatus {
        if MAGISK_PATHS.iter().any(|p| self.exists(p)) {
            PatchStatus::Magisk
        } else if THIRD_PARTY_PATHS.iter().any(|p| self.exists(p)) {
            PatchStatus::ThirdParty
        } else {
            PatchStatus::Stock
        }
    }
}

fn write_entry(
    writer: &mut CountingWriter<impl Write>,
    ino: u32,
    name: &str,
    entry: &CpioEntry,
) -> Result<()> {
    writer.write_all(MAGIC_NEW)?;
    write_hex(&mut *writer, ino)?;
    write_hex(&mut *writer, entry.mode)?;
    write_hex(&mut *writer, entry.uid)?;
    write_hex(&mut *writer, entry.gid)?;
    write_hex(&mut *writer, if entry.is_dir() { 2 } else { 1 })?;
    write_hex(&mut *writer, 0)?; // mtime
    write_hex(&mut *writer, entry.data.len() as u32)?;
    write_hex(&mut *writer, 0)?; // devmajor
    write_hex(&mut *writer, 0)?; // devminor
    write_hex(&mut *writer, entry.rdev_maj)?;
    write_hex(&mut *writer, entry.rdev_min)?;
    write_hex(&mut *writer, name.len() as u32 + 1)?;
    write_hex(&mut *writer, 0)?; // check

    writer.write_all(name.as_bytes())?;
    writer.write_zeros_exact(1)?;
    padding::write_zeros(&mut *writer, 4)?;

    writer.write_all(&entry.data)?;
    padding::write_zeros(&mut *writer, 4)?;

    Ok(())
}
