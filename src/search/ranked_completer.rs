/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::dictionary::{Dictionary, DictionaryUnit};
use crate::guide::{GuideUnit, MaxValueFirst, RankedGuide, ValueOrder};
use std::collections::BinaryHeap;

/// Label given to the seed node; any nonzero byte keeps the first descent
/// going.
const SEED_LABEL: u8 = 0xFF;

/// A node of the explored part of the subtree: its double-array slot, a
/// back-link for key reconstruction, and the flag gating the one-time
/// emission of its terminal child.
#[derive(Clone, Copy, Debug)]
struct ExploredNode {
    dic_index: u32,
    prev_node_index: u32,
    label: u8,
    is_queued: bool,
    has_terminal: bool,
}

/// A terminal waiting in the priority queue.
struct Candidate<O: ValueOrder> {
    node_index: u32,
    value: u32,
    _order: core::marker::PhantomData<O>,
}

impl<O: ValueOrder> PartialEq for Candidate<O> {
    fn eq(&self, other: &Self) -> bool {
        self.node_index == other.node_index && self.value == other.value
    }
}

impl<O: ValueOrder> Eq for Candidate<O> {}

impl<O: ValueOrder> Ord for Candidate<O> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        if self.value != other.value {
            if O::less(self.value, other.value) {
                core::cmp::Ordering::Less
            } else {
                core::cmp::Ordering::Greater
            }
        } else {
            // Equal values: the freshest node wins.
            self.node_index.cmp(&other.node_index)
        }
    }
}

impl<O: ValueOrder> PartialOrd for Candidate<O> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Cursor enumerating the keys of a subtree in the order of a [`ValueOrder`]
/// on their values, best first.
///
/// The cursor grows a DAG of explored nodes; every emitted key re-queues its
/// path so that the next call sprouts the siblings of each node on it, each
/// sibling contributing the best terminal of its subtree as a candidate. The
/// order parameter must match the one the [`RankedGuide`] was built with.
pub struct RankedCompleter<
    'a,
    B1: AsRef<[DictionaryUnit]>,
    B2: AsRef<[GuideUnit]>,
    O: ValueOrder = MaxValueFirst,
> {
    dic: &'a Dictionary<B1>,
    guide: &'a RankedGuide<B2>,
    key: Vec<u8>,
    prefix_len: usize,
    value: Option<u32>,
    nodes: Vec<ExploredNode>,
    node_queue: Vec<u32>,
    candidate_queue: BinaryHeap<Candidate<O>>,
}

impl<'a, B1: AsRef<[DictionaryUnit]>, B2: AsRef<[GuideUnit]>, O: ValueOrder>
    RankedCompleter<'a, B1, B2, O>
{
    pub fn new(dic: &'a Dictionary<B1>, guide: &'a RankedGuide<B2>) -> Self {
        Self {
            dic,
            guide,
            key: Vec::new(),
            prefix_len: 0,
            value: None,
            nodes: Vec::new(),
            node_queue: Vec::new(),
            candidate_queue: BinaryHeap::new(),
        }
    }

    /// Starts completing keys from `index`, reached by `prefix`.
    pub fn start(&mut self, index: u32, prefix: &[u8]) {
        self.key.clear();
        self.key.extend_from_slice(prefix);
        self.prefix_len = prefix.len();
        self.value = None;

        self.nodes.clear();
        self.node_queue.clear();
        self.candidate_queue.clear();

        if self.guide.size() != 0 {
            self.create_node(index, 0, SEED_LABEL);
            self.enqueue_node(0);
        }
    }

    /// Moves to the next key, best value first; `false` when the subtree is
    /// exhausted.
    pub fn next(&mut self) -> bool {
        for i in 0..self.node_queue.len() {
            let mut node_index = self.node_queue[i];
            if self.value.is_some() && !self.find_sibling(&mut node_index) {
                continue;
            }
            let node_index = self.find_terminal(node_index);
            self.enqueue_candidate(node_index);
        }
        self.node_queue.clear();

        let candidate = match self.candidate_queue.pop() {
            Some(candidate) => candidate,
            None => return false,
        };

        // Reconstructs the key along the back-links and re-queues the path.
        let mut node_index = candidate.node_index;
        self.enqueue_node(node_index);
        node_index = self.nodes[node_index as usize].prev_node_index;

        self.key.truncate(self.prefix_len);
        while node_index != 0 {
            self.key.push(self.nodes[node_index as usize].label);
            self.enqueue_node(node_index);
            node_index = self.nodes[node_index as usize].prev_node_index;
        }
        self.key[self.prefix_len..].reverse();

        self.value = Some(candidate.value);
        true
    }

    /// The current key; meaningful only after [`next`](Self::next) returned
    /// `true`.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The current value; meaningful only after [`next`](Self::next)
    /// returned `true`.
    pub fn value(&self) -> u32 {
        self.value.expect("no key has been produced yet")
    }

    fn enqueue_node(&mut self, node_index: u32) {
        if self.nodes[node_index as usize].is_queued {
            return;
        }
        self.node_queue.push(node_index);
        self.nodes[node_index as usize].is_queued = true;
    }

    fn enqueue_candidate(&mut self, node_index: u32) {
        let value = self
            .dic
            .unit(self.nodes[node_index as usize].dic_index)
            .value();
        self.candidate_queue.push(Candidate {
            node_index,
            value,
            _order: core::marker::PhantomData,
        });
    }

    /// Moves `node_index` to a node for its next-ranked sibling; a sibling
    /// label of 0 is the parent's terminal, emitted at most once.
    fn find_sibling(&mut self, node_index: &mut u32) -> bool {
        let prev_node_index = self.nodes[*node_index as usize].prev_node_index;
        let dic_index = self.nodes[*node_index as usize].dic_index;

        let sibling_label = self.guide.sibling(dic_index);
        if sibling_label == 0 {
            if !self.nodes[prev_node_index as usize].has_terminal {
                return false;
            }
            self.nodes[prev_node_index as usize].has_terminal = false;
        }

        let dic_prev_index = self.nodes[prev_node_index as usize].dic_index;
        let dic_index = self.follow_unchecked(dic_prev_index, sibling_label);
        *node_index = self.create_node(dic_index, prev_node_index, sibling_label);

        true
    }

    /// Descends along first-ranked child labels to the best terminal below
    /// `node_index`.
    fn find_terminal(&mut self, node_index: u32) -> u32 {
        let mut node_index = node_index;
        while self.nodes[node_index as usize].label != 0 {
            let dic_index = self.nodes[node_index as usize].dic_index;
            let child_label = self.guide.child(dic_index);
            if child_label == 0 {
                self.nodes[node_index as usize].has_terminal = false;
            }

            let dic_index = self.follow_unchecked(dic_index, child_label);
            node_index = self.create_node(dic_index, node_index, child_label);
        }
        node_index
    }

    fn follow_unchecked(&self, index: u32, label: u8) -> u32 {
        index ^ self.dic.unit(index).offset() ^ u32::from(label)
    }

    fn create_node(&mut self, dic_index: u32, prev_node_index: u32, label: u8) -> u32 {
        let has_terminal = label != 0 && self.dic.has_value(dic_index);
        self.nodes.push(ExploredNode {
            dic_index,
            prev_node_index,
            label,
            is_queued: false,
            has_terminal,
        });
        (self.nodes.len() - 1) as u32
    }
}
