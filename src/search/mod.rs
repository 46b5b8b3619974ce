/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Traversal cursors over a compiled dictionary and its guides.
//!
//! Each cursor holds mutable state (key buffer, stacks, visited nodes) and
//! is driven by repeated calls to `next`; accessors are meaningful only
//! after `next` returned `true`. Cursors are cheap to create, so each thread
//! enumerating keys over the same shared artifacts makes its own.

mod completer;
pub use completer::*;

mod nearest;
pub use nearest::*;

mod ranked_completer;
pub use ranked_completer::*;
