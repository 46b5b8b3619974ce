/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::dictionary::{Dictionary, DictionaryUnit};
use crate::guide::{Guide, GuideUnit};

/// Cursor enumerating, in lexicographic order, every key in the subtree
/// rooted at a seed node.
///
/// ```
/// # use dawgmap::prelude::*;
/// # fn main() -> anyhow::Result<()> {
/// let mut builder = DawgBuilder::new();
/// builder.insert(b"one", 1)?;
/// builder.insert(b"two", 2)?;
/// let dawg = builder.finish()?;
/// let (dic, _) = DictionaryBuilder::build(&dawg)?;
/// let guide = GuideBuilder::build(&dawg, &dic)?;
///
/// let mut completer = Completer::new(&dic, &guide);
/// completer.start(dic.root(), b"");
/// assert!(completer.next());
/// assert_eq!((completer.key(), completer.value()), (&b"one"[..], 1));
/// assert!(completer.next());
/// assert_eq!((completer.key(), completer.value()), (&b"two"[..], 2));
/// assert!(!completer.next());
/// # Ok(())
/// # }
/// ```
pub struct Completer<'a, B1: AsRef<[DictionaryUnit]>, B2: AsRef<[GuideUnit]>> {
    dic: &'a Dictionary<B1>,
    guide: &'a Guide<B2>,
    key: Vec<u8>,
    prefix_len: usize,
    index_stack: Vec<u32>,
    last_index: u32,
}

impl<'a, B1: AsRef<[DictionaryUnit]>, B2: AsRef<[GuideUnit]>> Completer<'a, B1, B2> {
    pub fn new(dic: &'a Dictionary<B1>, guide: &'a Guide<B2>) -> Self {
        Self {
            dic,
            guide,
            key: Vec::new(),
            prefix_len: 0,
            index_stack: Vec::new(),
            last_index: 0,
        }
    }

    /// Starts completing keys from `index`, reached by `prefix`.
    ///
    /// `prefix` only seeds the reported keys; it is the caller's job to have
    /// followed it to `index` beforehand.
    pub fn start(&mut self, index: u32, prefix: &[u8]) {
        self.key.clear();
        self.key.extend_from_slice(prefix);
        self.prefix_len = prefix.len();

        self.index_stack.clear();
        if self.guide.size() != 0 {
            self.index_stack.push(index);
            self.last_index = self.dic.root();
        }
    }

    /// Moves to the next key; `false` when the subtree is exhausted.
    pub fn next(&mut self) -> bool {
        let mut index = match self.index_stack.last() {
            Some(&index) => index,
            None => return false,
        };

        if self.last_index != self.dic.root() {
            let child_label = self.guide.child(index);
            if child_label != 0 {
                // Follows a transition to the first child.
                if !self.follow(child_label, &mut index) {
                    return false;
                }
            } else {
                loop {
                    let sibling_label = self.guide.sibling(index);

                    // Moves to the previous node.
                    if self.key.len() > self.prefix_len {
                        self.key.pop();
                    }
                    self.index_stack.pop();
                    index = match self.index_stack.last() {
                        Some(&index) => index,
                        None => return false,
                    };

                    if sibling_label != 0 {
                        // Follows a transition to the next sibling.
                        if !self.follow(sibling_label, &mut index) {
                            return false;
                        }
                        break;
                    }
                }
            }
        }

        self.find_terminal(index)
    }

    /// The current key; meaningful only after [`next`](Self::next) returned
    /// `true`.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// The current value; meaningful only after [`next`](Self::next)
    /// returned `true`.
    pub fn value(&self) -> u32 {
        self.dic.value(self.last_index)
    }

    fn follow(&mut self, label: u8, index: &mut u32) -> bool {
        if !self.dic.follow(label, index) {
            return false;
        }
        self.key.push(label);
        self.index_stack.push(*index);
        true
    }

    /// Descends along first-child labels until a key ends.
    fn find_terminal(&mut self, index: u32) -> bool {
        let mut index = index;
        while !self.dic.has_value(index) {
            let label = self.guide.child(index);
            if !self.dic.follow(label, &mut index) {
                return false;
            }
            self.key.push(label);
            self.index_stack.push(index);
        }

        self.last_index = index;
        true
    }
}
