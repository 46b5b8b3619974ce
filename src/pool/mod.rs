/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Block-allocated growable arrays with stable indices.

mod bit_pool;
pub use bit_pool::*;

mod object_pool;
pub use object_pool::*;
