/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Guide, GuideUnit};
use crate::dawg::Dawg;
use crate::dictionary::{Dictionary, DictionaryUnit};
use anyhow::{ensure, Result};

/// Builds the lexicographic [`Guide`] by walking the automaton and the
/// double array together.
///
/// For each node the guide records the label of its first non-terminal child
/// in automaton order, and each child records the label of the next sibling;
/// a bitset keeps subtrees shared between several parents from being walked
/// twice.
pub struct GuideBuilder<'a, B: AsRef<[DictionaryUnit]>> {
    dawg: &'a Dawg,
    dic: &'a Dictionary<B>,
    units: Vec<GuideUnit>,
    is_fixed_table: Vec<u8>,
}

impl<'a, B: AsRef<[DictionaryUnit]>> GuideBuilder<'a, B> {
    /// Builds a guide for `dic`, which must have been compiled from `dawg`.
    pub fn build(dawg: &'a Dawg, dic: &'a Dictionary<B>) -> Result<Guide> {
        if dawg.size() <= 1 {
            return Ok(Guide::from_units(Vec::new()));
        }

        let mut builder = Self {
            dawg,
            dic,
            units: vec![GuideUnit::default(); dic.size()],
            is_fixed_table: vec![0; dic.size().div_ceil(8)],
        };
        builder.walk(dawg.root(), dic.root())?;
        Ok(Guide::from_units(builder.units))
    }

    fn walk(&mut self, dawg_index: u32, dic_index: u32) -> Result<()> {
        if self.is_fixed(dic_index) {
            return Ok(());
        }
        self.set_is_fixed(dic_index);

        // Finds the first non-terminal child.
        let mut dawg_child_index = self.dawg.child(dawg_index);
        if self.dawg.label(dawg_child_index) == 0 {
            dawg_child_index = self.dawg.sibling(dawg_child_index);
            if dawg_child_index == 0 {
                return Ok(());
            }
        }
        self.units[dic_index as usize].set_child(self.dawg.label(dawg_child_index));

        loop {
            let child_label = self.dawg.label(dawg_child_index);
            let mut dic_child_index = dic_index;
            ensure!(
                self.dic.follow(child_label, &mut dic_child_index),
                "no transition on {:#04x} from node {}",
                child_label,
                dic_index
            );

            self.walk(dawg_child_index, dic_child_index)?;

            let dawg_sibling_index = self.dawg.sibling(dawg_child_index);
            if dawg_sibling_index != 0 {
                self.units[dic_child_index as usize]
                    .set_sibling(self.dawg.label(dawg_sibling_index));
            }

            dawg_child_index = dawg_sibling_index;
            if dawg_child_index == 0 {
                break;
            }
        }

        Ok(())
    }

    fn set_is_fixed(&mut self, index: u32) {
        self.is_fixed_table[index as usize / 8] |= 1 << (index % 8);
    }

    fn is_fixed(&self, index: u32) -> bool {
        self.is_fixed_table[index as usize / 8] & (1 << (index % 8)) != 0
    }
}
