// SPDX-FileCopyrightText: 2024-2025 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

use memmap2::{Mmap, MmapMut};

/// An owning handle over a shared mapping of an entire file. Every borrowed
/// section slice handed out by the boot image parser aliases this mapping, so
/// the handle must outlive them all. The underlying file descriptor is closed
/// as soon as the mapping exists.
pub struct MappedFile {
    map: Mapping,
}

enum Mapping {
    // Zero-length files cannot be mapped portably, but must still behave like
    // an empty byte view.
    Empty,
    Ro(Mmap),
    Rw(MmapMut),
}

impl MappedFile {
    /// Map an existing file read-only.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_file(&file, false)
    }

    /// Map an existing file as a writable shared mapping. Stores through
    /// [`Self::bytes_mut`] are carried through to the file.
    pub fn open_rw(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_file(&file, true)
    }

    /// Map an already-open file. The caller keeps ownership of the handle;
    /// the mapping stays valid after it is closed.
    pub fn from_file(file: &File, rw: bool) -> io::Result<Self> {
        let size = file.metadata()?.len();
        if size == 0 {
            return Ok(Self {
                map: Mapping::Empty,
            });
        }

        // SAFETY: The mapping is shared and the file could be mutated behind
        // our back by other processes. Nothing in this tool maps a file it is
        // concurrently rewriting through another handle.
        let map = if rw {
            Mapping::Rw(unsafe { MmapMut::map_mut(file)? })
        } else {
            Mapping::Ro(unsafe { Mmap::map(file)? })
        };

        Ok(Self { map })
    }

    pub fn len(&self) -> usize {
        match &self.map {
            Mapping::Empty => 0,
            Mapping::Ro(m) => m.len(),
            Mapping::Rw(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bytes(&self) -> &[u8] {
        match &self.map {
            Mapping::Empty => &[],
            Mapping::Ro(m) => m,
            Mapping::Rw(m) => m,
        }
    }

    /// Writable view of the mapping. Returns `None` for read-only mappings.
    pub fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.map {
            Mapping::Rw(m) => Some(m),
            _ => None,
        }
    }

    /// Synchronously write dirty pages back to the file. A no-op for
    /// read-only mappings.
    pub fn flush(&self) -> io::Result<()> {
        match &self.map {
            Mapping::Rw(m) => m.flush(),
            _ => Ok(()),
        }
    }
}
