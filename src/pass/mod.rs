//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Defines the pass infrastructure used by the middle-end of the compiler.
//!
//! Passes are broken down into two categories:
//!
//! 1. Transformations
//! 2. Analyses
//!
//! # Transform Passes
//! Transform passes mutate a [`Module`](crate::ir::Module) in place. They are
//! given read access to an [`AnalysisCache`] for the duration of their run,
//! and after they complete they declare which analyses survived the
//! mutation through [`PreservedAnalyses`]. The default declaration is
//! "nothing survived", which is always safe.
//!
//! # Analysis Passes & the Analysis Cache
//! Analysis passes are not able to modify IR, they are only able to observe
//! the IR and use other analyses. They are registered once per
//! [`AnalysisKind`] into an [`AnalysisCache`], which computes them lazily on
//! first request, hands out shared [`Rc`](std::rc::Rc) handles to the result,
//! and drops the cached result when a transform invalidates it.
//!
//! # The Pass Manager
//! A [`PassManager`] owns an [`AnalysisCache`] and the ordered list of passes
//! for its current *segment*. Pipelines are built by appending passes,
//! running them, and then starting a new segment with
//! [`PassManager::reset_and_remove_transformations`], which forgets the
//! schedule but keeps every registered analysis (and every cached result).

mod analysis;
mod errors;
mod manager;
mod transform;

pub use analysis::*;
pub use errors::*;
pub use manager::*;
pub use transform::*;
