//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use std::fmt::Debug;

/// Models a type that can act as a key for [`ArenaMap`](crate::arena::ArenaMap).
///
/// In most cases this trait should not be implemented directly, prefer the
/// [`arena_key`](crate::arena_key) macro that provides the implementation.
pub trait ArenaKey: Copy + Eq + Debug {
    /// Creates a new key from an arena index. Panics if the index cannot be
    /// represented by the key's storage type.
    fn key_new(index: usize) -> Self;

    /// Converts the key back into the arena index it was created from.
    fn key_index(self) -> usize;
}

/// Creates a type-safe key for an [`ArenaMap`](crate::arena::ArenaMap).
///
/// The storage type can be customized, by default it is `u32`.
///
/// ```
/// # use lapis::arena_key;
/// # use lapis::arena::ArenaMap;
/// arena_key! {
///     /// We can have doc comments!
///     pub struct EntityRef;
///
///     struct TinyRef(u8);
/// }
///
/// type EntityMap<V> = ArenaMap<EntityRef, V>;
/// type TinyMap<V> = ArenaMap<TinyRef, V>;
/// ```
#[macro_export(local_inner_macros)]
macro_rules! arena_key {
    ( $(#[$outer:meta])* $vis:vis struct $name:ident($ty:ty); $($rest:tt)* ) => {
        $(#[$outer])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[cfg_attr(feature = "enable-serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name($ty);

        impl $crate::arena::ArenaKey for $name {
            #[inline]
            fn key_new(index: usize) -> Self {
                use std::convert::TryInto;

                Self(index.try_into().expect("index is not representable with key type"))
            }

            #[inline]
            fn key_index(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
                std::write!(f, "{}({})", std::stringify!($name), self.0)
            }
        }

        arena_key!($($rest)*);
    };

    ( $(#[$outer:meta])* $vis:vis struct $name:ident; $($rest:tt)* ) => {
        arena_key! { $(#[$outer])* $vis struct $name(u32); $($rest)* }
    };

    () => {}
}

#[cfg(test)]
mod tests {
    use crate::arena::*;
    use crate::arena_key;
    use static_assertions::assert_eq_size;

    #[test]
    fn arena_key_default_is_u32() {
        arena_key! { struct Key; }

        assert_eq_size!(Key, u32);
    }

    #[test]
    fn arena_key_non_default_uses_type_provided() {
        arena_key! { struct Key(u16); }

        assert_eq_size!(Key, u16);
    }

    #[test]
    fn key_round_trips_through_index() {
        arena_key! { struct Key; }

        assert_eq!(Key::key_new(7).key_index(), 7);
        assert_eq!(format!("{:?}", Key::key_new(3)), "Key(3)");
    }

    #[test]
    #[should_panic]
    fn key_overflow_panics() {
        arena_key! { struct Key(u8); }

        let _ = Key::key_new(300);
    }
}
