/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::utils::{bytes_of, bytes_of_mut};
use anyhow::{ensure, Context, Result};
use std::io::{Read, Write};

/// A guide entry: the label of the first child to visit from a node and the
/// label of the node's next sibling under its parent. 0 means none.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct GuideUnit {
    child: u8,
    sibling: u8,
}

impl GuideUnit {
    pub fn set_child(&mut self, child: u8) {
        self.child = child;
    }

    pub fn set_sibling(&mut self, sibling: u8) {
        self.sibling = sibling;
    }

    pub fn child(self) -> u8 {
        self.child
    }

    pub fn sibling(self) -> u8 {
        self.sibling
    }
}

pub(crate) fn write_units<W: Write>(units: &[GuideUnit], writer: &mut W) -> Result<()> {
    writer
        .write_all(&(units.len() as u32).to_ne_bytes())
        .context("Cannot write guide size")?;
    writer
        .write_all(bytes_of(units))
        .context("Cannot write guide units")?;
    Ok(())
}

pub(crate) fn read_units<R: Read>(reader: &mut R) -> Result<Vec<GuideUnit>> {
    let mut count = [0_u8; 4];
    reader.read_exact(&mut count).context("Cannot read guide size")?;
    let count = u32::from_ne_bytes(count) as usize;
    let mut units = vec![GuideUnit::default(); count];
    reader
        .read_exact(bytes_of_mut(&mut units))
        .context("Cannot read guide units")?;
    Ok(units)
}

pub(crate) fn map_units(data: &[u8]) -> Result<(&[GuideUnit], &[u8])> {
    ensure!(data.len() >= 4, "data too short for a guide container");
    let mut count = [0_u8; 4];
    count.copy_from_slice(&data[..4]);
    let count = u32::from_ne_bytes(count) as usize;
    let total = 4 + count * core::mem::size_of::<GuideUnit>();
    ensure!(
        data.len() >= total,
        "guide container truncated: {} units declared, {} bytes present",
        count,
        data.len()
    );
    let units =
        unsafe { core::slice::from_raw_parts(data[4..].as_ptr() as *const GuideUnit, count) };
    Ok((units, &data[total..]))
}
