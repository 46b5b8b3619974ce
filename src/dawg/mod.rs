/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Incremental construction of minimal acyclic automata in list form.
//!
//! [`DawgBuilder`] consumes a lexicographically sorted stream of
//! `(key, value)` pairs and merges equivalent suffix states on the fly;
//! [`Dawg`] is the resulting read-only automaton, the input of the
//! double-array compiler.

mod builder;
pub use builder::*;

#[allow(clippy::module_inception)]
mod dawg;
pub use dawg::*;

mod units;
pub use units::*;
