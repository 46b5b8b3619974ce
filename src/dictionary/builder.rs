/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Dictionary, DictionaryUnit, ExtraUnit, LinkTable};
use crate::dawg::Dawg;
use anyhow::{ensure, Result};
use log::debug;

/// Number of units in a block.
const BLOCK_SIZE: u32 = 256;
/// Number of blocks kept unfixed.
const NUM_OF_UNFIXED_BLOCKS: u32 = 16;

/// Masks for offsets.
const UPPER_MASK: u32 = !(DictionaryUnit::OFFSET_MAX - 1);
const LOWER_MASK: u32 = 0xFF;

/// Compiles a list-form automaton into a double array.
///
/// Nodes are placed in depth-first order. For each state an offset is chosen
/// from a circular free list of unfixed slots so that every out-label lands
/// on a free slot; offsets of merging states are recorded in a [`LinkTable`]
/// and reused when the displacement stays encodable. Slot metadata lives in
/// blocks of 256 units, of which only the newest 16 stay linked: older
/// blocks are sealed, their unused slots turned into decoy-labeled fixed
/// units so stray probes miss cleanly.
pub struct DictionaryBuilder<'a> {
    dawg: &'a Dawg,
    units: Vec<DictionaryUnit>,
    extras: Vec<Option<Box<[ExtraUnit]>>>,
    labels: Vec<u8>,
    link_table: LinkTable,
    unfixed_index: u32,
    num_of_unused_units: u32,
}

impl<'a> DictionaryBuilder<'a> {
    /// Builds a dictionary, returning it together with the number of unused
    /// units.
    pub fn build(dawg: &'a Dawg) -> Result<(Dictionary, u32)> {
        let mut builder = Self {
            dawg,
            units: Vec::new(),
            extras: Vec::new(),
            labels: Vec::new(),
            link_table: LinkTable::new(dawg.num_of_merging_states()),
            unfixed_index: 0,
            num_of_unused_units: 0,
        };
        let dictionary = builder.compile()?;
        Ok((dictionary, builder.num_of_unused_units))
    }

    fn compile(&mut self) -> Result<Dictionary> {
        self.reserve_unit(0);
        self.extra_mut(0).set_is_used();
        let _ = self.units[0].set_offset(1);
        self.units[0].set_label(0);

        if self.dawg.size() > 1 {
            self.place(self.dawg.root(), 0)?;
        }

        self.fix_all_blocks();

        debug!(
            "double array compiled: {} units, {} unused",
            self.units.len(),
            self.num_of_unused_units
        );
        Ok(Dictionary::from_units(std::mem::take(&mut self.units)))
    }

    /// Lays out the children of the state reached by automaton transition
    /// `dawg_index`, whose double-array slot is `dic_index`.
    fn place(&mut self, dawg_index: u32, dic_index: u32) -> Result<()> {
        if self.dawg.is_leaf(dawg_index) {
            return Ok(());
        }

        // Reuses an existing offset if the child state merges and the
        // displacement stays encodable from here.
        let dawg_child_index = self.dawg.child(dawg_index);
        if self.dawg.is_merging(dawg_child_index) {
            let offset = self.link_table.find(dawg_child_index);
            if offset != 0 {
                let offset = offset ^ dic_index;
                if offset & UPPER_MASK == 0 || offset & LOWER_MASK == 0 {
                    if self.dawg.is_leaf(dawg_child_index) {
                        self.units[dic_index as usize].set_has_leaf();
                    }
                    ensure!(
                        self.units[dic_index as usize].set_offset(offset),
                        "offset {} exceeds the addressable range",
                        offset
                    );
                    return Ok(());
                }
            }
        }

        // Finds a good offset and arranges the child nodes there.
        let offset = self.arrange_child_nodes(dawg_index, dic_index)?;

        if self.dawg.is_merging(dawg_child_index) {
            self.link_table.insert(dawg_child_index, offset);
        }

        // Recurses in depth-first order.
        let mut dawg_child_index = dawg_child_index;
        loop {
            let dic_child_index = offset ^ u32::from(self.dawg.label(dawg_child_index));
            self.place(dawg_child_index, dic_child_index)?;
            dawg_child_index = self.dawg.sibling(dawg_child_index);
            if dawg_child_index == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Reserves slots for all children of `dawg_index` and returns the
    /// chosen offset.
    fn arrange_child_nodes(&mut self, dawg_index: u32, dic_index: u32) -> Result<u32> {
        self.labels.clear();
        let mut dawg_child_index = self.dawg.child(dawg_index);
        while dawg_child_index != 0 {
            self.labels.push(self.dawg.label(dawg_child_index));
            dawg_child_index = self.dawg.sibling(dawg_child_index);
        }

        let offset = self.find_good_offset(dic_index);
        ensure!(
            self.units[dic_index as usize].set_offset(dic_index ^ offset),
            "displacement {} exceeds the addressable range",
            dic_index ^ offset
        );

        let mut dawg_child_index = self.dawg.child(dawg_index);
        for i in 0..self.labels.len() {
            let dic_child_index = offset ^ u32::from(self.labels[i]);
            self.reserve_unit(dic_child_index);

            if self.dawg.is_leaf(dawg_child_index) {
                self.units[dic_index as usize].set_has_leaf();
                self.units[dic_child_index as usize].set_value(self.dawg.value(dawg_child_index));
            } else {
                self.units[dic_child_index as usize].set_label(self.labels[i]);
            }

            dawg_child_index = self.dawg.sibling(dawg_child_index);
        }
        self.extra_mut(offset).set_is_used();

        Ok(offset)
    }

    /// Scans the free list for an offset placing every collected label on an
    /// unfixed slot; falls back to fresh space past the end.
    fn find_good_offset(&self, index: u32) -> u32 {
        if self.unfixed_index >= self.num_of_units() {
            return self.num_of_units() | (index & 0xFF);
        }

        let mut unfixed_index = self.unfixed_index;
        loop {
            let offset = unfixed_index ^ u32::from(self.labels[0]);
            if self.is_good_offset(index, offset) {
                return offset;
            }
            unfixed_index = self.extra(unfixed_index).next();
            if unfixed_index == self.unfixed_index {
                break;
            }
        }

        self.num_of_units() | (index & 0xFF)
    }

    /// Checks that `offset` is unused, encodable relative to `index`, and
    /// collision-free for every collected label.
    fn is_good_offset(&self, index: u32, offset: u32) -> bool {
        if self.extra(offset).is_used() {
            return false;
        }

        let relative_offset = index ^ offset;
        if relative_offset & LOWER_MASK != 0 && relative_offset & UPPER_MASK != 0 {
            return false;
        }

        for i in 1..self.labels.len() {
            if self.extra(offset ^ u32::from(self.labels[i])).is_fixed() {
                return false;
            }
        }

        true
    }

    /// Takes the slot at `index` out of the free list and marks it fixed.
    fn reserve_unit(&mut self, index: u32) {
        if index >= self.num_of_units() {
            self.expand_dictionary();
        }

        if index == self.unfixed_index {
            self.unfixed_index = self.extra(index).next();
            if self.unfixed_index == index {
                self.unfixed_index = self.num_of_units();
            }
        }
        let prev = self.extra(index).prev();
        let next = self.extra(index).next();
        self.extra_mut(prev).set_next(next);
        self.extra_mut(next).set_prev(prev);
        self.extra_mut(index).set_is_fixed();
    }

    /// Appends one block, retiring the oldest unfixed block when the window
    /// is full, and splices the new slots into the circular free list.
    fn expand_dictionary(&mut self) {
        let src_num_of_units = self.num_of_units();
        let src_num_of_blocks = self.num_of_blocks();

        let dest_num_of_units = src_num_of_units + BLOCK_SIZE;
        let dest_num_of_blocks = src_num_of_blocks + 1;

        // Seals the block leaving the window.
        if dest_num_of_blocks > NUM_OF_UNFIXED_BLOCKS {
            self.fix_block(src_num_of_blocks - NUM_OF_UNFIXED_BLOCKS);
        }

        self.units
            .resize(dest_num_of_units as usize, DictionaryUnit::default());

        // The retired block's metadata backs the new one.
        if dest_num_of_blocks > NUM_OF_UNFIXED_BLOCKS {
            let retired = (src_num_of_blocks - NUM_OF_UNFIXED_BLOCKS) as usize;
            let mut block = self.extras[retired].take().expect("block already retired");
            for extra in block.iter_mut() {
                extra.clear();
            }
            self.extras.push(Some(block));
        } else {
            self.extras
                .push(Some(vec![ExtraUnit::default(); BLOCK_SIZE as usize].into_boxed_slice()));
        }

        // Creates a circular linked list for the new block.
        for i in src_num_of_units + 1..dest_num_of_units {
            self.extra_mut(i - 1).set_next(i);
            self.extra_mut(i).set_prev(i - 1);
        }
        self.extra_mut(src_num_of_units).set_prev(dest_num_of_units - 1);
        self.extra_mut(dest_num_of_units - 1).set_next(src_num_of_units);

        // Merges the new list with the existing one.
        let unfixed_index = self.unfixed_index;
        let prev = self.extra(unfixed_index).prev();
        self.extra_mut(src_num_of_units).set_prev(prev);
        self.extra_mut(dest_num_of_units - 1).set_next(unfixed_index);

        let prev = self.extra(unfixed_index).prev();
        self.extra_mut(prev).set_next(src_num_of_units);
        self.extra_mut(unfixed_index).set_prev(dest_num_of_units - 1);
    }

    /// Seals the blocks still in the window at the end of the build.
    fn fix_all_blocks(&mut self) {
        let begin = self
            .num_of_blocks()
            .saturating_sub(NUM_OF_UNFIXED_BLOCKS);
        let end = self.num_of_blocks();

        for block_id in begin..end {
            self.fix_block(block_id);
        }
    }

    /// Fixes every unused slot of a block with a decoy label so that any
    /// transition probing it fails the label check.
    fn fix_block(&mut self, block_id: u32) {
        let begin = block_id * BLOCK_SIZE;
        let end = begin + BLOCK_SIZE;

        let mut unused_offset_for_label = 0;
        for offset in begin..end {
            if !self.extra(offset).is_used() {
                unused_offset_for_label = offset;
                break;
            }
        }

        for index in begin..end {
            if !self.extra(index).is_fixed() {
                self.reserve_unit(index);
                self.units[index as usize].set_label((index ^ unused_offset_for_label) as u8);
                self.num_of_unused_units += 1;
            }
        }
    }

    fn num_of_units(&self) -> u32 {
        self.units.len() as u32
    }

    fn num_of_blocks(&self) -> u32 {
        self.extras.len() as u32
    }

    fn extra(&self, index: u32) -> &ExtraUnit {
        let block = self.extras[(index / BLOCK_SIZE) as usize]
            .as_ref()
            .expect("slot metadata accessed in a retired block");
        &block[(index % BLOCK_SIZE) as usize]
    }

    fn extra_mut(&mut self, index: u32) -> &mut ExtraUnit {
        let block = self.extras[(index / BLOCK_SIZE) as usize]
            .as_mut()
            .expect("slot metadata accessed in a retired block");
        &mut block[(index % BLOCK_SIZE) as usize]
    }
}
