//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! A small typed arena used for the entities of the IR.
//!
//! Functions and blocks are referred to by small `Copy` keys rather than
//! by reference, which lets passes hold onto handles while mutating the
//! module they came from. Unlike a plain `Vec`, removal is supported: a
//! removed slot becomes a tombstone and its key is never handed out again,
//! so a stale key can be detected instead of silently aliasing new data.
//!
//! ```
//! # use lapis::arena_key;
//! # use lapis::arena::*;
//! arena_key! {
//!     pub struct Node;
//! }
//!
//! let mut arena = ArenaMap::new();
//! let a: Node = arena.insert("a");
//! let b = arena.insert("b");
//!
//! arena.remove(a);
//!
//! assert!(!arena.contains(a));
//! assert_eq!(arena[b], "b");
//! assert_eq!(arena.len(), 1);
//! ```

mod key;
mod map;

pub use key::ArenaKey;
pub use map::ArenaMap;
