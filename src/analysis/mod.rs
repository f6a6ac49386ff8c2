//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains the analyses that ship with the crate.
//!
//! Every analysis models either [`ModuleAnalysis`] or [`FunctionAnalysis`],
//! and is meant to be requested through an
//! [`AnalysisCache`](crate::pass::AnalysisCache) rather than computed
//! directly. [`builtin_analysis`] maps each kind to its implementation.
//!
//! [`ModuleAnalysis`]: crate::pass::ModuleAnalysis
//! [`FunctionAnalysis`]: crate::pass::FunctionAnalysis

mod callgraph;
mod dominance;
mod loops;
mod postorder;
mod summary;

pub use callgraph::*;
pub use dominance::*;
pub use loops::*;
pub use postorder::*;
pub use summary::*;

use crate::pass::{AnalysisKind, RegisteredAnalysis};

/// Creates the built-in implementation of an analysis kind.
pub fn builtin_analysis(kind: AnalysisKind) -> RegisteredAnalysis {
    match kind {
        AnalysisKind::CallGraph => RegisteredAnalysis::module(CallGraphAnalysis),
        AnalysisKind::Alias => RegisteredAnalysis::module(AliasAnalysis),
        AnalysisKind::Dominance => RegisteredAnalysis::function(DominanceAnalysis),
        AnalysisKind::LoopInfo => RegisteredAnalysis::function(LoopInfoAnalysis),
        AnalysisKind::InductionVariable => RegisteredAnalysis::module(InductionVariableAnalysis),
        AnalysisKind::PostOrder => RegisteredAnalysis::function(PostOrderAnalysis),
        AnalysisKind::ClassHierarchy => RegisteredAnalysis::module(ClassHierarchyAnalysis),
        AnalysisKind::RcIdentity => RegisteredAnalysis::module(RcIdentityAnalysis),
        AnalysisKind::Destructor => RegisteredAnalysis::module(DestructorAnalysis),
    }
}
