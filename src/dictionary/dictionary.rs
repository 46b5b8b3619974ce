/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::DictionaryUnit;
use crate::utils::{bytes_of, bytes_of_mut, MmapSlice};
use anyhow::{ensure, Context, Result};
use std::io::{Read, Write};
use std::path::Path;

/// The read-only double-array index.
///
/// One packed 32-bit word per node; from node `i` the transition on byte `b`
/// leads to `i ^ offset(i) ^ b` and succeeds iff the label there is `b`.
/// The type is generic over its storage, so the same lookup code runs over
/// an owned buffer, a borrowed byte region, or a memory-mapped file.
pub struct Dictionary<B: AsRef<[DictionaryUnit]> = Vec<DictionaryUnit>> {
    units: B,
}

impl Dictionary<Vec<DictionaryUnit>> {
    pub(crate) fn from_units(units: Vec<DictionaryUnit>) -> Self {
        Self { units }
    }

    /// Reads a dictionary from a stream into owned storage.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut count = [0_u8; 4];
        reader
            .read_exact(&mut count)
            .context("Cannot read dictionary size")?;
        let count = u32::from_ne_bytes(count) as usize;
        let mut units = vec![DictionaryUnit::default(); count];
        reader
            .read_exact(bytes_of_mut(&mut units))
            .context("Cannot read dictionary units")?;
        Ok(Self { units })
    }
}

impl<'a> Dictionary<&'a [DictionaryUnit]> {
    /// Takes a zero-copy view of a dictionary serialized at the start of
    /// `data`, returning it together with the unconsumed remainder.
    ///
    /// The unit region must be 4-byte aligned; memory-mapped regions and
    /// back-to-back containers starting at an aligned address are.
    pub fn map(data: &'a [u8]) -> Result<(Self, &'a [u8])> {
        ensure!(data.len() >= 4, "data too short for a dictionary container");
        let mut count = [0_u8; 4];
        count.copy_from_slice(&data[..4]);
        let count = u32::from_ne_bytes(count) as usize;
        let total = 4 + count * 4;
        ensure!(
            data.len() >= total,
            "dictionary container truncated: {} units declared, {} bytes present",
            count,
            data.len()
        );
        let units = &data[4..total];
        ensure!(
            units.as_ptr() as usize % core::mem::align_of::<DictionaryUnit>() == 0,
            "dictionary units are misaligned"
        );
        let units =
            unsafe { core::slice::from_raw_parts(units.as_ptr() as *const DictionaryUnit, count) };
        Ok((Self { units }, &data[total..]))
    }
}

impl Dictionary<MmapSlice<DictionaryUnit>> {
    /// Memory-maps a dictionary file read-only.
    pub fn mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            units: MmapSlice::load(path)?,
        })
    }
}

impl<B: AsRef<[DictionaryUnit]>> Dictionary<B> {
    /// The root index.
    pub fn root(&self) -> u32 {
        0
    }

    /// The underlying unit array.
    pub fn units(&self) -> &[DictionaryUnit] {
        self.units.as_ref()
    }

    /// A single unit.
    pub fn unit(&self, index: u32) -> DictionaryUnit {
        self.units()[index as usize]
    }

    /// Number of units.
    pub fn size(&self) -> usize {
        self.units().len()
    }

    /// Size of the unit array in bytes.
    pub fn total_size(&self) -> usize {
        self.size() * core::mem::size_of::<DictionaryUnit>()
    }

    /// Size of the serialized container in bytes.
    pub fn file_size(&self) -> usize {
        core::mem::size_of::<u32>() + self.total_size()
    }

    /// Whether the node at `index` ends a key.
    pub fn has_value(&self, index: u32) -> bool {
        self.unit(index).has_leaf()
    }

    /// Value of the key ending at `index`.
    ///
    /// Meaningful only when [`has_value`](Self::has_value) holds.
    pub fn value(&self, index: u32) -> u32 {
        let unit = self.unit(index);
        self.unit(index ^ unit.offset()).value()
    }

    /// Follows the transition on `label`, updating `index` on success.
    pub fn follow(&self, label: u8, index: &mut u32) -> bool {
        let next_index = *index ^ self.unit(*index).offset() ^ u32::from(label);
        if self.unit(next_index).label() != u32::from(label) {
            return false;
        }
        *index = next_index;
        true
    }

    /// Follows transitions for every byte of `key`.
    pub fn follow_bytes(&self, key: &[u8], index: &mut u32) -> bool {
        for &label in key {
            if !self.follow(label, index) {
                return false;
            }
        }
        true
    }

    /// Like [`follow_bytes`](Self::follow_bytes), also counting the bytes
    /// consumed before the first miss.
    pub fn follow_bytes_counted(&self, key: &[u8], index: &mut u32, count: &mut usize) -> bool {
        for &label in key {
            if !self.follow(label, index) {
                return false;
            }
            *count += 1;
        }
        true
    }

    /// Whether `key` was inserted.
    pub fn contains(&self, key: &[u8]) -> bool {
        let mut index = self.root();
        self.follow_bytes(key, &mut index) && self.has_value(index)
    }

    /// Value associated with `key`, if any.
    pub fn find(&self, key: &[u8]) -> Option<u32> {
        let mut index = self.root();
        if self.follow_bytes(key, &mut index) && self.has_value(index) {
            Some(self.value(index))
        } else {
            None
        }
    }

    /// Writes the dictionary container to a stream.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer
            .write_all(&(self.size() as u32).to_ne_bytes())
            .context("Cannot write dictionary size")?;
        writer
            .write_all(bytes_of(self.units()))
            .context("Cannot write dictionary units")?;
        Ok(())
    }
}
