/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::unit::{map_units, read_units, write_units};
use super::GuideUnit;
use crate::utils::MmapSlice;
use anyhow::Result;
use std::io::{Read, Write};
use std::path::Path;

/// Value-ranked guide: like [`Guide`](crate::guide::Guide), but children are
/// ordered by a [`ValueOrder`](crate::guide::ValueOrder) on the best value
/// reachable in each subtree.
///
/// Built by [`RankedGuideBuilder`](crate::guide::RankedGuideBuilder); drives
/// [`RankedCompleter`](crate::search::RankedCompleter). A distinct type from
/// `Guide` so the two cannot be mixed up, although the layout is identical.
pub struct RankedGuide<B: AsRef<[GuideUnit]> = Vec<GuideUnit>> {
    units: B,
}

impl RankedGuide<Vec<GuideUnit>> {
    pub(crate) fn from_units(units: Vec<GuideUnit>) -> Self {
        Self { units }
    }

    /// Reads a ranked guide from a stream into owned storage.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            units: read_units(reader)?,
        })
    }
}

impl<'a> RankedGuide<&'a [GuideUnit]> {
    /// Takes a zero-copy view of a ranked guide serialized at the start of
    /// `data`, returning it together with the unconsumed remainder.
    pub fn map(data: &'a [u8]) -> Result<(Self, &'a [u8])> {
        let (units, rest) = map_units(data)?;
        Ok((Self { units }, rest))
    }
}

impl RankedGuide<MmapSlice<GuideUnit>> {
    /// Memory-maps a ranked guide file read-only.
    pub fn mmap<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            units: MmapSlice::load(path)?,
        })
    }
}

impl<B: AsRef<[GuideUnit]>> RankedGuide<B> {
    /// The root index.
    pub fn root(&self) -> u32 {
        0
    }

    /// Number of units.
    pub fn size(&self) -> usize {
        self.units.as_ref().len()
    }

    /// Size of the unit array in bytes.
    pub fn total_size(&self) -> usize {
        self.size() * core::mem::size_of::<GuideUnit>()
    }

    /// Size of the serialized container in bytes.
    pub fn file_size(&self) -> usize {
        core::mem::size_of::<u32>() + self.total_size()
    }

    /// Label of the first-ranked child of `index`, or 0.
    pub fn child(&self, index: u32) -> u8 {
        self.units.as_ref()[index as usize].child()
    }

    /// Label of the next-ranked sibling of `index`, or 0.
    pub fn sibling(&self, index: u32) -> u8 {
        self.units.as_ref()[index as usize].sibling()
    }

    /// Writes the ranked guide container to a stream.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_units(self.units.as_ref(), writer)
    }
}
