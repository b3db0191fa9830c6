// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    fmt,
    io::{self, Cursor, Read, Write},
};

use flate2::{
    Compression,
    read::MultiGzDecoder,
    write::GzEncoder,
};
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use thiserror::Error;

static GZIP_MAGIC: &[u8; 2] = b"\x1f\x8b";
static GZIP_DEFLATED_MAGIC: &[u8; 2] = b"\x1f\x9e";
static LZOP_MAGIC: &[u8; 4] = b"\x89LZO";
static XZ_MAGIC: &[u8; 6] = b"\xfd7zXZ\x00";
static BZIP2_MAGIC: &[u8; 3] = b"BZh";
static LZ4_FRAME_MAGIC: &[u8; 4] = b"\x04\x22\x4d\x18";
static LZ4_FRAME_LEGACY_MAGIC: &[u8; 4] = b"\x03\x21\x4c\x18";
static LZ4_LEGACY_MAGIC: &[u8; 4] = b"\x02\x21\x4c\x18";
static MTK_MAGIC: &[u8; 4] = b"\x88\x16\x88\x58";
static DTB_MAGIC: &[u8; 4] = b"\xd0\x0d\xfe\xed";
static CHROMEOS_MAGIC: &[u8; 8] = b"CHROMEOS";
static AOSP_MAGIC: &[u8; 8] = b"ANDROID!";
static AOSP_VENDOR_MAGIC: &[u8; 8] = b"VNDRBOOT";
static DHTB_MAGIC: &[u8; 8] = b"DHTB\x01\x00\x00\x00";
static BLOB_MAGIC: &[u8; 20] = b"-SIGNED-BY-SIGNBLOB-";
static ZIMAGE_MAGIC: &[u8; 4] = b"\x18\x28\x6f\x01";

/// Offset of the zImage magic within the 52-byte self-extractor prefix.
const ZIMAGE_MAGIC_OFFSET: usize = 0x24;

/// Maximum plaintext size of a single block in the legacy lz4 format.
const LZ4_LEGACY_BLOCK_SIZE: usize = 8 * 1024 * 1024;
/// Plaintext block size used when producing legacy lz4 streams.
const LZ4_LEGACY_ENCODE_BLOCK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(FileFormat),
    #[error("Failed to encode {0} data")]
    Encode(FileFormat, #[source] io::Error),
    #[error("Failed to decode {0} data")]
    Decode(FileFormat, #[source] io::Error),
}

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Unknown,
    Chromeos,
    Aosp,
    AospVendor,
    Dhtb,
    Blob,
    Gzip,
    Zopfli,
    Xz,
    Lzma,
    Bzip2,
    Lz4,
    Lz4Legacy,
    Lz4Lg,
    Lzop,
    Mtk,
    Dtb,
    ZImage,
}

impl FileFormat {
    /// Identify a format from its magic bytes. [`FileFormat::Lz4Lg`] is never
    /// returned; use [`FileFormat::detect_lg`] when the distinction matters.
    pub fn detect(data: &[u8]) -> Self {
        if data.starts_with(CHROMEOS_MAGIC) {
            Self::Chromeos
        } else if data.starts_with(AOSP_MAGIC) {
            Self::Aosp
        } else if data.starts_with(AOSP_VENDOR_MAGIC) {
            Self::AospVendor
        } else if data.starts_with(GZIP_MAGIC) || data.starts_with(GZIP_DEFLATED_MAGIC) {
            Self::Gzip
        } else if data.starts_with(LZOP_MAGIC) {
            Self::Lzop
        } else if data.starts_with(XZ_MAGIC) {
            Self::Xz
        } else if is_lzma(data) {
            Self::Lzma
        } else if data.starts_with(BZIP2_MAGIC) {
            Self::Bzip2
        } else if data.starts_with(LZ4_FRAME_MAGIC) || data.starts_with(LZ4_FRAME_LEGACY_MAGIC) {
            Self::Lz4
        } else if data.starts_with(LZ4_LEGACY_MAGIC) {
            Self::Lz4Legacy
        } else if data.starts_with(MTK_MAGIC) {
            Self::Mtk
        } else if data.starts_with(DTB_MAGIC) {
            Self::Dtb
        } else if data.starts_with(DHTB_MAGIC) {
            Self::Dhtb
        } else if data.starts_with(BLOB_MAGIC) {
            Self::Blob
        } else if data.len() >= ZIMAGE_MAGIC_OFFSET + 4
            && &data[ZIMAGE_MAGIC_OFFSET..ZIMAGE_MAGIC_OFFSET + 4] == ZIMAGE_MAGIC
        {
            Self::ZImage
        } else {
            Self::Unknown
        }
    }

    /// Like [`FileFormat::detect`], but also distinguishes the LG flavor of
    /// the legacy lz4 format. LG streams end with a plaintext-size trailer
    /// instead of on a block boundary, so the entire block chain has to be
    /// walked.
    pub fn detect_lg(data: &[u8]) -> Self {
        let format = Self::detect(data);

        if format == Self::Lz4Legacy {
            let mut off = LZ4_LEGACY_MAGIC.len() as u64;
            let len = data.len() as u64;

            while off + 4 <= len {
                let size_off = off as usize;
                let block_size = u32::from_le_bytes(
                    data[size_off..size_off + 4].try_into().unwrap(),
                );
                off += 4;

                if off + u64::from(block_size) > len {
                    return Self::Lz4Lg;
                }

                off += u64::from(block_size);
            }
        }

        format
    }

    /// Total and injective over the enum.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "raw",
            Self::Chromeos => "chromeos",
            Self::Aosp => "aosp",
            Self::AospVendor => "aosp_vendor",
            Self::Dhtb => "dhtb",
            Self::Blob => "blob",
            Self::Gzip => "gzip",
            Self::Zopfli => "zopfli",
            Self::Xz => "xz",
            Self::Lzma => "lzma",
            Self::Bzip2 => "bzip2",
            Self::Lz4 => "lz4",
            Self::Lz4Legacy => "lz4_legacy",
            Self::Lz4Lg => "lz4_lg",
            Self::Lzop => "lzop",
            Self::Mtk => "mtk",
            Self::Dtb => "dtb",
            Self::ZImage => "zimage",
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            Self::Gzip
                | Self::Zopfli
                | Self::Xz
                | Self::Lzma
                | Self::Bzip2
                | Self::Lz4
                | Self::Lz4Legacy
                | Self::Lz4Lg
                | Self::Lzop
        )
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_lzma(data: &[u8]) -> bool {
    // An lzma-alone stream has no real magic. Match the properties byte for
    // preset levels plus the end-of-stream size marker.
    data.len() >= 13
        && data.starts_with(b"\x5d\x00\x00")
        && (data[12] == 0xff || data[12] == 0x00)
}

fn read_full(mut reader: impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut n = 0;

    while n < buf.len() {
        let count = reader.read(&mut buf[n..])?;
        if count == 0 {
            break;
        }
        n += count;
    }

    Ok(n)
}

/// Encoder for the Linux kernel's legacy "lz4c" stream: the 4-byte magic
/// followed by `(u32 LE compressed size, block)` pairs. The LG flavor appends
/// the total plaintext size as a trailing u32.
pub struct Lz4LegacyEncoder<W: Write> {
    writer: Option<W>,
    buf: Vec<u8>,
    n_filled: usize,
    total: u32,
    lg: bool,
}

impl<W: Write> Lz4LegacyEncoder<W> {
    pub fn new(mut writer: W, lg: bool) -> io::Result<Self> {
        writer.write_all(LZ4_LEGACY_MAGIC)?;

        Ok(Self {
            writer: Some(writer),
            buf: vec![0u8; LZ4_LEGACY_ENCODE_BLOCK_SIZE],
            n_filled: 0,
            total: 0,
            lg,
        })
    }

    fn write_block(&mut self, force: bool) -> io::Result<()> {
        if self.n_filled == 0 || (!force && self.n_filled < self.buf.len()) {
            return Ok(());
        }

        let compressed = lz4_flex::block::compress(&self.buf[..self.n_filled]);

        let writer = self.writer.as_mut().unwrap();
        writer.write_all(&(compressed.len() as u32).to_le_bytes())?;
        writer.write_all(&compressed)?;

        self.n_filled = 0;

        Ok(())
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.write_block(true)?;

        let mut writer = self.writer.take().unwrap();
        if self.lg {
            writer.write_all(&self.total.to_le_bytes())?;
        }

        Ok(writer)
    }
}

impl<W: Write> Drop for Lz4LegacyEncoder<W> {
    fn drop(&mut self) {
        if self.writer.is_some() {
            let _ = self.write_block(true);
        }
    }
}

impl<W: Write> Write for Lz4LegacyEncoder<W> {
    fn write(&mut self, mut buf: &[u8]) -> io::Result<usize> {
        let n = buf.len();

        while !buf.is_empty() {
            let to_copy = buf.len().min(self.buf.len() - self.n_filled);
            self.buf[self.n_filled..self.n_filled + to_copy].copy_from_slice(&buf[..to_copy]);

            self.n_filled += to_copy;
            self.total = self.total.wrapping_add(to_copy as u32);
            self.write_block(false)?;

            buf = &buf[to_copy..];
        }

        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Decoder for legacy lz4 streams. Decoding stops at a zero-size block, at
/// EOF, or at the LG plaintext-size trailer.
pub struct Lz4LegacyDecoder<R: Read> {
    reader: R,
    out_buf: Vec<u8>,
    out_len: usize,
    out_pos: usize,
    started: bool,
    done: bool,
}

impl<R: Read> Lz4LegacyDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            out_buf: Vec::new(),
            out_len: 0,
            out_pos: 0,
            started: false,
            done: false,
        }
    }

    /// Returns false when the stream has ended.
    fn next_block(&mut self) -> io::Result<bool> {
        if self.done {
            return Ok(false);
        }

        if !self.started {
            let mut magic = [0u8; 4];
            self.reader.read_exact(&mut magic)?;

            if magic != *LZ4_LEGACY_MAGIC {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("Bad lz4 legacy magic: {magic:02x?}"),
                ));
            }

            self.started = true;
        }

        let mut size_buf = [0u8; 4];
        let n = read_full(&mut self.reader, &mut size_buf)?;
        if n == 0 {
            self.done = true;
            return Ok(false);
        } else if n < size_buf.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        let block_size = u32::from_le_bytes(size_buf) as usize;
        if block_size == 0
            || block_size > lz4_flex::block::get_maximum_output_size(LZ4_LEGACY_BLOCK_SIZE)
        {
            // Explicit terminator or an implausible size, which is how the LG
            // trailer reads.
            self.done = true;
            return Ok(false);
        }

        let mut compressed = vec![0u8; block_size];
        let n = read_full(&mut self.reader, &mut compressed)?;
        if n == 0 {
            // The size word was the LG trailer.
            self.done = true;
            return Ok(false);
        } else if n < compressed.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        if self.out_buf.is_empty() {
            self.out_buf = vec![0u8; LZ4_LEGACY_BLOCK_SIZE];
        }

        self.out_len = lz4_flex::block::decompress_into(&compressed, &mut self.out_buf)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.out_pos = 0;

        Ok(true)
    }
}

impl<R: Read> Read for Lz4LegacyDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.out_pos == self.out_len {
            if !self.next_block()? {
                return Ok(0);
            }
        }

        let to_copy = buf.len().min(self.out_len - self.out_pos);
        buf[..to_copy].copy_from_slice(&self.out_buf[self.out_pos..self.out_pos + to_copy]);
        self.out_pos += to_copy;

        Ok(to_copy)
    }
}

pub enum CompressedReader<R: Read> {
    Gzip(MultiGzDecoder<R>),
    Lz4(FrameDecoder<R>),
    Lz4Legacy(Lz4LegacyDecoder<R>),
}

impl<R: Read> CompressedReader<R> {
    pub fn with_format(reader: R, format: FileFormat) -> Result<Self> {
        match format {
            FileFormat::Gzip | FileFormat::Zopfli => Ok(Self::Gzip(MultiGzDecoder::new(reader))),
            FileFormat::Lz4 => Ok(Self::Lz4(FrameDecoder::new(reader))),
            FileFormat::Lz4Legacy | FileFormat::Lz4Lg => {
                Ok(Self::Lz4Legacy(Lz4LegacyDecoder::new(reader)))
            }
            f => Err(Error::UnsupportedFormat(f)),
        }
    }
}

impl<R: Read> Read for CompressedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(r) => r.read(buf),
            Self::Lz4(r) => r.read(buf),
            Self::Lz4Legacy(r) => r.read(buf),
        }
    }
}

#[allow(clippy::large_enum_variant)]
pub enum CompressedWriter<W: Write> {
    Gzip(GzEncoder<W>),
    Lz4(FrameEncoder<W>),
    Lz4Legacy(Lz4LegacyEncoder<W>),
}

impl<W: Write> CompressedWriter<W> {
    pub fn new(writer: W, format: FileFormat) -> Result<Self> {
        match format {
            FileFormat::Gzip => Ok(Self::Gzip(GzEncoder::new(writer, Compression::new(6)))),
            FileFormat::Zopfli => Ok(Self::Gzip(GzEncoder::new(writer, Compression::new(9)))),
            FileFormat::Lz4 => Ok(Self::Lz4(FrameEncoder::new(writer))),
            FileFormat::Lz4Legacy => {
                let encoder = Lz4LegacyEncoder::new(writer, false)
                    .map_err(|e| Error::Encode(format, e))?;
                Ok(Self::Lz4Legacy(encoder))
            }
            FileFormat::Lz4Lg => {
                let encoder = Lz4LegacyEncoder::new(writer, true)
                    .map_err(|e| Error::Encode(format, e))?;
                Ok(Self::Lz4Legacy(encoder))
            }
            f => Err(Error::UnsupportedFormat(f)),
        }
    }

    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Gzip(w) => w.finish(),
            Self::Lz4(w) => w.finish().map_err(io::Error::other),
            Self::Lz4Legacy(w) => w.finish(),
        }
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Gzip(w) => w.write(buf),
            Self::Lz4(w) => w.write(buf),
            Self::Lz4Legacy(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Gzip(w) => w.flush(),
            Self::Lz4(w) => w.flush(),
            Self::Lz4Legacy(w) => w.flush(),
        }
    }
}

/// Write the complete compressed stream for `data` to `writer`.
pub fn compress_bytes(format: FileFormat, data: &[u8], writer: impl Write) -> Result<()> {
    let mut writer = CompressedWriter::new(writer, format)?;
    writer
        .write_all(data)
        .map_err(|e| Error::Encode(format, e))?;
    writer.finish().map_err(|e| Error::Encode(format, e))?;

    Ok(())
}

/// Decompress the complete stream in `data` to `writer`.
pub fn decompress_bytes(format: FileFormat, data: &[u8], mut writer: impl Write) -> Result<()> {
    let mut reader = CompressedReader::with_format(Cursor::new(data), format)?;
    io::copy(&mut reader, &mut writer).map_err(|e| Error::Decode(format, e))?;

    Ok(())
}
