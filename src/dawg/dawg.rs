/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::TransitionUnit;
use crate::pool::{BitPool, ObjectPool};

/// A minimal acyclic automaton in list form.
///
/// Transitions of the same source state occupy consecutive pool indices in
/// ascending label order, with the 0-labeled terminal transition first;
/// `has_sibling` is false on the last transition of a run. Index 0 is a
/// sentinel representing the super-root. Instances are produced by
/// [`DawgBuilder::finish`](crate::dawg::DawgBuilder::finish) and are
/// read-only.
#[derive(Debug, Default)]
pub struct Dawg {
    base_pool: ObjectPool<TransitionUnit>,
    label_pool: ObjectPool<u8>,
    flag_pool: BitPool,
    num_of_states: usize,
    num_of_merged_transitions: usize,
    num_of_merged_states: usize,
    num_of_merging_states: usize,
}

impl Dawg {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        base_pool: ObjectPool<TransitionUnit>,
        label_pool: ObjectPool<u8>,
        flag_pool: BitPool,
        num_of_states: usize,
        num_of_merged_transitions: usize,
        num_of_merged_states: usize,
        num_of_merging_states: usize,
    ) -> Self {
        Self {
            base_pool,
            label_pool,
            flag_pool,
            num_of_states,
            num_of_merged_transitions,
            num_of_merged_states,
            num_of_merging_states,
        }
    }

    /// The root index.
    pub fn root(&self) -> u32 {
        0
    }

    /// Number of units, including the sentinel.
    pub fn size(&self) -> usize {
        self.base_pool.len()
    }

    /// Number of transitions.
    pub fn num_of_transitions(&self) -> usize {
        self.base_pool.len() - 1
    }

    /// Number of distinct states.
    pub fn num_of_states(&self) -> usize {
        self.num_of_states
    }

    /// Number of transitions saved by state merging.
    pub fn num_of_merged_transitions(&self) -> usize {
        self.num_of_merged_transitions
    }

    /// Number of states saved by state merging.
    pub fn num_of_merged_states(&self) -> usize {
        self.num_of_merged_states
    }

    /// Number of states reachable from at least two parents.
    pub fn num_of_merging_states(&self) -> usize {
        self.num_of_merging_states
    }

    /// Index of the first transition of the state reached by transition
    /// `index`, or 0 for a leaf.
    pub fn child(&self, index: u32) -> u32 {
        self.base_pool[index as usize].child()
    }

    /// Index of the next transition of the same source state, or 0.
    pub fn sibling(&self, index: u32) -> u32 {
        if self.base_pool[index as usize].has_sibling() {
            index + 1
        } else {
            0
        }
    }

    /// Value carried by terminal transition `index`.
    pub fn value(&self, index: u32) -> u32 {
        self.base_pool[index as usize].value()
    }

    /// Label of transition `index`.
    pub fn label(&self, index: u32) -> u8 {
        self.label_pool[index as usize]
    }

    /// Whether transition `index` is the 0-labeled terminal of its state.
    pub fn is_leaf(&self, index: u32) -> bool {
        self.label(index) == 0
    }

    /// Whether the state starting at `index` is reachable from ≥ 2 parents.
    pub fn is_merging(&self, index: u32) -> bool {
        self.flag_pool.get(index as usize)
    }
}
