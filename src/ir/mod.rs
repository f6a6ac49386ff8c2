//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Provides the minimal IR that the pass pipeline operates on.
//!
//! The scheduler itself only cares about a handful of properties of the IR:
//! the [`Stage`] of a [`Module`], the functions it owns, and the
//! [`DiagnosticContext`] that diagnostic passes record into. The rest of the
//! representation (blocks, a few instruction shapes, function attributes)
//! exists so that the built-in passes have something real to work on.

mod builders;
mod diagnostics;
mod entities;
mod function;
mod instruction;
mod module;

pub use builders::*;
pub use diagnostics::*;
pub use entities::*;
pub use function::*;
pub use instruction::*;
pub use module::*;
