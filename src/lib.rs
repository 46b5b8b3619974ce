/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod dawg;
pub mod dictionary;
pub mod guide;
pub mod pool;
pub mod search;
pub mod utils;

/// Largest value that can be attached to a key.
///
/// Values are stored in 31 bits, both in the list-form automaton and in the
/// leaf words of the double array.
pub const MAX_VALUE: u32 = (1 << 31) - 1;

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::dawg::*;
    pub use crate::dictionary::*;
    pub use crate::guide::*;
    pub use crate::pool::*;
    pub use crate::search::*;
    pub use crate::utils::*;
    pub use crate::MAX_VALUE;
}
