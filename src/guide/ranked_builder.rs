/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{GuideUnit, MaxValueFirst, RankedGuide, ValueOrder};
use crate::dawg::Dawg;
use crate::dictionary::{Dictionary, DictionaryUnit};
use anyhow::{ensure, Result};

/// A child link collected while ranking: its label (0 for the terminal) and
/// the best value in its subtree.
#[derive(Clone, Copy, Debug)]
struct RankedLink {
    label: u8,
    value: u32,
}

/// Builds a [`RankedGuide`]: children of every node are stably sorted by a
/// [`ValueOrder`] on their subtree's best value, ties by ascending label.
///
/// The best value of a subtree already visited through another parent is not
/// recomputed by a re-walk: the ranked order places the best leaf along the
/// leftmost path, so following installed child links to a terminal finds it.
pub struct RankedGuideBuilder<'a, B: AsRef<[DictionaryUnit]>> {
    dawg: &'a Dawg,
    dic: &'a Dictionary<B>,
    units: Vec<GuideUnit>,
    links: Vec<RankedLink>,
    is_fixed_table: Vec<u8>,
}

impl<'a, B: AsRef<[DictionaryUnit]>> RankedGuideBuilder<'a, B> {
    /// Builds a ranked guide under the default [`MaxValueFirst`] order.
    pub fn build(dawg: &'a Dawg, dic: &'a Dictionary<B>) -> Result<RankedGuide> {
        Self::build_with_order::<MaxValueFirst>(dawg, dic)
    }

    /// Builds a ranked guide under the order `O`.
    pub fn build_with_order<O: ValueOrder>(
        dawg: &'a Dawg,
        dic: &'a Dictionary<B>,
    ) -> Result<RankedGuide> {
        if dawg.size() <= 1 {
            return Ok(RankedGuide::from_units(Vec::new()));
        }

        let mut builder = Self {
            dawg,
            dic,
            units: vec![GuideUnit::default(); dic.size()],
            links: Vec::new(),
            is_fixed_table: vec![0; dic.size().div_ceil(8)],
        };
        builder.walk::<O>(dawg.root(), dic.root())?;
        Ok(RankedGuide::from_units(builder.units))
    }

    /// Ranks the children of one node and returns the best value in its
    /// subtree.
    fn walk<O: ValueOrder>(&mut self, dawg_index: u32, dic_index: u32) -> Result<u32> {
        if self.is_fixed(dic_index) {
            return self.find_best_value(dic_index);
        }
        self.set_is_fixed(dic_index);

        let initial_num_links = self.links.len();
        self.enumerate_links::<O>(dawg_index, dic_index)?;

        self.links[initial_num_links..].sort_by(|lhs, rhs| {
            if lhs.value != rhs.value {
                if O::less(rhs.value, lhs.value) {
                    core::cmp::Ordering::Less
                } else {
                    core::cmp::Ordering::Greater
                }
            } else {
                lhs.label.cmp(&rhs.label)
            }
        });

        self.turn_links_to_units(dic_index, initial_num_links);

        let best_value = self.links[initial_num_links].value;
        self.links.truncate(initial_num_links);

        Ok(best_value)
    }

    /// Recovers the best value of an already-ranked subtree by following the
    /// installed child links to a terminal.
    fn find_best_value(&self, dic_index: u32) -> Result<u32> {
        let mut dic_index = dic_index;
        while self.units[dic_index as usize].child() != 0 {
            let child_label = self.units[dic_index as usize].child();
            ensure!(
                self.dic.follow(child_label, &mut dic_index),
                "no transition on {:#04x} from node {}",
                child_label,
                dic_index
            );
        }
        ensure!(
            self.dic.has_value(dic_index),
            "ranked subtree ends in a non-terminal node {}",
            dic_index
        );
        Ok(self.dic.value(dic_index))
    }

    /// Collects one link per child, terminal included, computing subtree
    /// values depth-first.
    fn enumerate_links<O: ValueOrder>(&mut self, dawg_index: u32, dic_index: u32) -> Result<()> {
        let mut dawg_child_index = self.dawg.child(dawg_index);
        while dawg_child_index != 0 {
            let child_label = self.dawg.label(dawg_child_index);
            let value = if child_label == 0 {
                ensure!(
                    self.dic.has_value(dic_index),
                    "terminal transition without a value at node {}",
                    dic_index
                );
                self.dic.value(dic_index)
            } else {
                let mut dic_child_index = dic_index;
                ensure!(
                    self.dic.follow(child_label, &mut dic_child_index),
                    "no transition on {:#04x} from node {}",
                    child_label,
                    dic_index
                );
                self.walk::<O>(dawg_child_index, dic_child_index)?
            };
            self.links.push(RankedLink {
                label: child_label,
                value,
            });
            dawg_child_index = self.dawg.sibling(dawg_child_index);
        }
        Ok(())
    }

    /// Writes the sorted links into guide units: the first link becomes the
    /// node's child, the rest form the sibling chain.
    ///
    /// A terminal link's chain slot is the guide entry of the node's value
    /// unit, which is otherwise unused.
    fn turn_links_to_units(&mut self, dic_index: u32, links_begin: usize) {
        let first_label = self.links[links_begin].label;
        self.units[dic_index as usize].set_child(first_label);
        let mut dic_child_index = self.follow_unchecked(dic_index, first_label);

        for i in links_begin + 1..self.links.len() {
            let sibling_label = self.links[i].label;
            let dic_sibling_index = self.follow_unchecked(dic_index, sibling_label);
            self.units[dic_child_index as usize].set_sibling(sibling_label);
            dic_child_index = dic_sibling_index;
        }
    }

    fn follow_unchecked(&self, index: u32, label: u8) -> u32 {
        index ^ self.dic.unit(index).offset() ^ u32::from(label)
    }

    fn set_is_fixed(&mut self, index: u32) {
        self.is_fixed_table[index as usize / 8] |= 1 << (index % 8);
    }

    fn is_fixed(&self, index: u32) -> bool {
        self.is_fixed_table[index as usize / 8] & (1 << (index % 8)) != 0
    }
}
