//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::arena_key;

arena_key! {
    /// A reference to a function inside of a [`Module`](crate::ir::Module).
    ///
    /// These are only meaningful for the module that created them, and they
    /// stay valid (but dangling) after the function they refer to is removed.
    pub struct Func;

    /// A reference to a basic block inside of a function [`Body`](crate::ir::Body).
    pub struct Block;
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_eq_size;

    #[test]
    fn entity_refs_are_dense() {
        assert_eq_size!(Func, u32);
        assert_eq_size!(Block, u32);
        assert_eq_size!(Option<Block>, u64);
    }
}
