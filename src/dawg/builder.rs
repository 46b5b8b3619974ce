/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Dawg, TransitionUnit, WorkUnit};
use crate::pool::{BitPool, ObjectPool};
use crate::utils::mix32;
use crate::MAX_VALUE;
use anyhow::{bail, ensure, Result};
use log::debug;

/// Incremental builder of a minimal acyclic automaton.
///
/// Keys must be inserted in strictly ascending lexicographic order. The
/// builder keeps the path of the last inserted key as mutable in-progress
/// nodes; when a new key diverges from it, the nodes below the shared prefix
/// are fixed into contiguous transition runs, merging each run with a
/// previously fixed equivalent state when the fingerprint hash table holds
/// one.
#[derive(Debug)]
pub struct DawgBuilder {
    initial_hash_table_size: usize,
    base_pool: ObjectPool<TransitionUnit>,
    label_pool: ObjectPool<u8>,
    flag_pool: BitPool,
    work_pool: ObjectPool<WorkUnit>,
    hash_table: Vec<u32>,
    unfixed_units: Vec<u32>,
    recycled_units: Vec<u32>,
    num_of_states: usize,
    num_of_merged_transitions: usize,
    num_of_merging_states: usize,
}

impl Default for DawgBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DawgBuilder {
    const DEFAULT_INITIAL_HASH_TABLE_SIZE: usize = 1 << 8;

    /// Creates a builder with the default initial hash-table size.
    pub fn new() -> Self {
        Self::with_initial_hash_table_size(Self::DEFAULT_INITIAL_HASH_TABLE_SIZE)
    }

    /// Creates a builder whose fingerprint table starts at
    /// `initial_hash_table_size` buckets; the table doubles as needed.
    pub fn with_initial_hash_table_size(initial_hash_table_size: usize) -> Self {
        Self {
            initial_hash_table_size,
            base_pool: ObjectPool::new(),
            label_pool: ObjectPool::new(),
            flag_pool: BitPool::new(),
            work_pool: ObjectPool::new(),
            hash_table: Vec::new(),
            unfixed_units: Vec::new(),
            recycled_units: Vec::new(),
            num_of_states: 1,
            num_of_merged_transitions: 0,
            num_of_merging_states: 0,
        }
    }

    /// Number of units.
    pub fn size(&self) -> usize {
        self.base_pool.len()
    }

    /// Number of fixed transitions.
    pub fn num_of_transitions(&self) -> usize {
        self.base_pool.len() - 1
    }

    /// Number of distinct states fixed so far.
    pub fn num_of_states(&self) -> usize {
        self.num_of_states
    }

    /// Number of transitions saved by state merging so far.
    pub fn num_of_merged_transitions(&self) -> usize {
        self.num_of_merged_transitions
    }

    /// Inserts a key with its value.
    ///
    /// Fails on empty keys, keys containing a zero byte, values above
    /// [`MAX_VALUE`], and keys not strictly greater than the previously
    /// inserted key.
    pub fn insert(&mut self, key: &[u8], value: u32) -> Result<()> {
        ensure!(!key.is_empty(), "keys must not be empty");
        ensure!(
            !key.contains(&0),
            "keys must not contain a zero byte"
        );
        ensure!(
            value <= MAX_VALUE,
            "value {} does not fit in 31 bits",
            value
        );
        self.insert_key(key, value)
    }

    /// Fixes the remaining path and drains the builder into a [`Dawg`].
    ///
    /// The builder is left cleared and can be reused.
    pub fn finish(&mut self) -> Result<Dawg> {
        if self.hash_table.is_empty() {
            self.init();
        }

        self.fix_units(0);
        self.base_pool[0].set_base(self.work_pool[0].base());
        self.label_pool[0] = self.work_pool[0].label();

        let num_of_transitions = self.base_pool.len() - 1;
        let num_of_merged_states =
            num_of_transitions + self.num_of_merged_transitions + 1 - self.num_of_states;
        debug!(
            "automaton fixed: {} transitions, {} states, {} merged transitions, {} merging states",
            num_of_transitions,
            self.num_of_states,
            self.num_of_merged_transitions,
            self.num_of_merging_states
        );

        let dawg = Dawg::new(
            std::mem::take(&mut self.base_pool),
            std::mem::take(&mut self.label_pool),
            std::mem::take(&mut self.flag_pool),
            self.num_of_states,
            self.num_of_merged_transitions,
            num_of_merged_states,
            self.num_of_merging_states,
        );
        self.clear();
        Ok(dawg)
    }

    /// Re-initializes the builder, discarding any in-progress build.
    pub fn clear(&mut self) {
        self.base_pool.clear();
        self.label_pool.clear();
        self.flag_pool.clear();
        self.work_pool.clear();
        self.hash_table = Vec::new();
        self.unfixed_units.clear();
        self.recycled_units.clear();
        self.num_of_states = 1;
        self.num_of_merged_transitions = 0;
        self.num_of_merging_states = 0;
    }

    fn insert_key(&mut self, key: &[u8], value: u32) -> Result<()> {
        if self.hash_table.is_empty() {
            self.init();
        }

        let mut index = 0_u32;
        let mut key_pos = 0_usize;

        // Finds a separate unit.
        while key_pos <= key.len() {
            let child_index = self.work_pool[index as usize].child();
            if child_index == 0 {
                break;
            }

            let key_label = if key_pos < key.len() { key[key_pos] } else { 0 };
            let unit_label = self.work_pool[child_index as usize].label();

            if key_label < unit_label {
                bail!("keys must be inserted in ascending order");
            }
            if key_label > unit_label {
                self.work_pool[child_index as usize].set_has_sibling(true);
                self.fix_units(child_index);
                break;
            }

            index = child_index;
            key_pos += 1;
        }
        if key_pos > key.len() {
            // The whole key, terminal included, matched the previous one.
            bail!("keys must be inserted in ascending order (duplicate key)");
        }

        // Adds new units.
        while key_pos <= key.len() {
            let key_label = if key_pos < key.len() { key[key_pos] } else { 0 };
            let child_index = self.allocate_work_unit();

            if self.work_pool[index as usize].child() == 0 {
                self.work_pool[child_index as usize].set_is_state(true);
            }
            let sibling = self.work_pool[index as usize].child();
            self.work_pool[child_index as usize].set_sibling(sibling);
            self.work_pool[child_index as usize].set_label(key_label);
            self.work_pool[index as usize].set_child(child_index);
            self.unfixed_units.push(child_index);

            index = child_index;
            key_pos += 1;
        }
        self.work_pool[index as usize].set_value(value);
        Ok(())
    }

    fn init(&mut self) {
        self.hash_table = vec![0; self.initial_hash_table_size];
        self.allocate_work_unit();
        self.allocate_transition();
        self.work_pool[0].set_label(0xFF);
        self.unfixed_units.push(0);
    }

    /// Fixes the in-progress units above `index`, merging each finished
    /// sibling run with an equivalent fixed state when one exists.
    fn fix_units(&mut self, index: u32) {
        while *self.unfixed_units.last().expect("unfixed path is empty") != index {
            let unfixed_index = self.unfixed_units.pop().expect("unfixed path is empty");

            if self.num_of_states >= self.hash_table.len() - (self.hash_table.len() >> 2) {
                self.expand_hash_table();
            }

            let mut num_of_siblings = 0_u32;
            let mut i = unfixed_index;
            while i != 0 {
                num_of_siblings += 1;
                i = self.work_pool[i as usize].sibling();
            }

            let (mut matched_index, hash_id) = self.find_unit(unfixed_index);
            if matched_index != 0 {
                self.num_of_merged_transitions += num_of_siblings as usize;

                // Records a merging state.
                if !self.flag_pool.get(matched_index as usize) {
                    self.num_of_merging_states += 1;
                    self.flag_pool.set(matched_index as usize, true);
                }
            } else {
                // Fixes the run into pairs of base values and labels.
                let mut transition_index = 0_u32;
                for _ in 0..num_of_siblings {
                    transition_index = self.allocate_transition();
                }
                let mut i = unfixed_index;
                while i != 0 {
                    let unit = self.work_pool[i as usize];
                    self.base_pool[transition_index as usize].set_base(unit.base());
                    self.label_pool[transition_index as usize] = unit.label();
                    transition_index -= 1;
                    i = unit.sibling();
                }
                matched_index = transition_index + 1;
                self.hash_table[hash_id] = matched_index;
                self.num_of_states += 1;
            }

            // Recycles the fixed work units.
            let mut current = unfixed_index;
            while current != 0 {
                let next = self.work_pool[current as usize].sibling();
                self.recycled_units.push(current);
                current = next;
            }

            let parent = *self.unfixed_units.last().expect("unfixed path is empty");
            self.work_pool[parent as usize].set_child(matched_index);
        }
        self.unfixed_units.pop();
    }

    fn expand_hash_table(&mut self) {
        let hash_table_size = self.hash_table.len() << 1;
        self.hash_table = vec![0; hash_table_size];

        // Re-inserts the starts of all fixed transition runs.
        for index in 1..self.base_pool.len() as u32 {
            if self.label_pool[index as usize] == 0 || self.base_pool[index as usize].is_state() {
                let hash_id = self.find_transition(index);
                self.hash_table[hash_id] = index;
            }
        }
    }

    /// Finds the bucket for fixed run `index`; the table never holds two
    /// equal runs, so probing stops at the first empty slot.
    fn find_transition(&self, index: u32) -> usize {
        let mut hash_id = self.hash_transition(index) as usize % self.hash_table.len();
        while self.hash_table[hash_id] != 0 {
            hash_id = (hash_id + 1) % self.hash_table.len();
        }
        hash_id
    }

    /// Looks up the in-progress run headed by `unit_index`; returns the
    /// matching fixed run (0 if none) and the bucket it occupies or should
    /// occupy.
    fn find_unit(&self, unit_index: u32) -> (u32, usize) {
        let mut hash_id = self.hash_work_unit(unit_index) as usize % self.hash_table.len();
        loop {
            let transition_id = self.hash_table[hash_id];
            if transition_id == 0 {
                return (0, hash_id);
            }
            if self.are_equal(unit_index, transition_id) {
                return (transition_id, hash_id);
            }
            hash_id = (hash_id + 1) % self.hash_table.len();
        }
    }

    /// Compares an in-progress sibling run with a fixed one.
    fn are_equal(&self, unit_index: u32, transition_index: u32) -> bool {
        // Compares the numbers of transitions.
        let mut t = transition_index;
        let mut i = self.work_pool[unit_index as usize].sibling();
        while i != 0 {
            if !self.base_pool[t as usize].has_sibling() {
                return false;
            }
            t += 1;
            i = self.work_pool[i as usize].sibling();
        }
        if self.base_pool[t as usize].has_sibling() {
            return false;
        }

        // Compares the transitions, both runs walked from the largest label
        // down.
        let mut i = unit_index;
        while i != 0 {
            let unit = self.work_pool[i as usize];
            if unit.base() != self.base_pool[t as usize].base()
                || unit.label() != self.label_pool[t as usize]
            {
                return false;
            }
            i = unit.sibling();
            if i == 0 {
                break;
            }
            t -= 1;
        }
        true
    }

    /// Fingerprints a fixed run starting at `index`.
    fn hash_transition(&self, index: u32) -> u32 {
        let mut hash_value = 0;
        let mut i = index;
        while i != 0 {
            let base = self.base_pool[i as usize].base();
            let label = self.label_pool[i as usize];
            hash_value ^= mix32((u32::from(label) << 24) ^ base);

            if !self.base_pool[i as usize].has_sibling() {
                break;
            }
            i += 1;
        }
        hash_value
    }

    /// Fingerprints an in-progress run headed by `index`; XOR accumulation
    /// makes it agree with [`Self::hash_transition`] on equal runs.
    fn hash_work_unit(&self, index: u32) -> u32 {
        let mut hash_value = 0;
        let mut i = index;
        while i != 0 {
            let unit = self.work_pool[i as usize];
            hash_value ^= mix32((u32::from(unit.label()) << 24) ^ unit.base());
            i = unit.sibling();
        }
        hash_value
    }

    fn allocate_transition(&mut self) -> u32 {
        self.flag_pool.allocate();
        self.base_pool.allocate();
        self.label_pool.allocate() as u32
    }

    fn allocate_work_unit(&mut self) -> u32 {
        let index = match self.recycled_units.pop() {
            Some(index) => index,
            None => self.work_pool.allocate() as u32,
        };
        self.work_pool[index as usize].clear();
        index
    }
}
