/*
 * SPDX-FileCopyrightText: 2023 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::{ensure, Context, Result};
use mmap_rs::{Mmap, MmapFlags};
use std::path::Path;

/// A read-only memory mapping of a serialized unit container, exposed as
/// `AsRef<[W]>`.
///
/// The container format is a `u32` unit count followed by the raw units; the
/// mapping skips the header and restricts the visible slice to the stored
/// count, so artifact types generic over `AsRef<[W]>` can be backed by a
/// mapped file exactly like an owned `Vec<W>`.
pub struct MmapSlice<W> {
    mmap: Mmap,
    skip: usize,
    len: usize,
    _marker: core::marker::PhantomData<W>,
}

impl<W> core::fmt::Debug for MmapSlice<W> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MmapSlice")
            .field("mmap", &self.mmap.as_ptr())
            .field("len", &self.len)
            .finish()
    }
}

impl<W> MmapSlice<W> {
    /// Maps the container stored in `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let unit_size = core::mem::size_of::<W>();
        let header = core::mem::size_of::<u32>();
        let file_len = path
            .as_ref()
            .metadata()
            .with_context(|| format!("Cannot stat {}", path.as_ref().display()))?
            .len() as usize;
        ensure!(
            file_len >= header,
            "{} is too short for a unit container",
            path.as_ref().display()
        );
        let file = std::fs::File::open(path.as_ref())
            .with_context(|| format!("Cannot open {}", path.as_ref().display()))?;
        let mmap = unsafe {
            mmap_rs::MmapOptions::new(file_len)
                .with_context(|| format!("Cannot initialize mmap of size {}", file_len))?
                .with_flags(MmapFlags::empty())
                .with_file(&file, 0)
                .map()
                .with_context(|| format!("Cannot mmap {}", path.as_ref().display()))?
        };

        let mut count = [0_u8; 4];
        count.copy_from_slice(unsafe { std::slice::from_raw_parts(mmap.as_ptr(), 4) });
        let len = u32::from_ne_bytes(count) as usize;
        ensure!(
            file_len >= header + len * unit_size,
            "{} is truncated: {} units declared, {} bytes present",
            path.as_ref().display(),
            len,
            file_len
        );

        Ok(Self {
            mmap,
            skip: header / unit_size,
            len,
            _marker: core::marker::PhantomData,
        })
    }
}

impl<W> AsRef<[W]> for MmapSlice<W> {
    fn as_ref(&self) -> &[W] {
        unsafe { std::slice::from_raw_parts((self.mmap.as_ptr() as *const W).add(self.skip), self.len) }
    }
}
