//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::Module;
use crate::pass::{AnalysisCache, AnalysisKind, ModuleAnalysis, PassError};

/// A cheap, structural summary of a module.
///
/// The analyses in the catalogue that need a richer IR than this crate
/// models (type hierarchies, memory effects, ownership) compute this
/// instead, so that they can still be registered, cached, requested and
/// invalidated like any other analysis.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub struct ModuleSummary {
    /// The number of functions in the module, declared or defined.
    pub functions: usize,
    /// The number of functions with a body.
    pub defined: usize,
    /// The number of instructions over every body.
    pub instructions: usize,
}

impl ModuleSummary {
    /// Computes the summary of a module.
    pub fn compute(module: &Module) -> Self {
        module
            .functions()
            .map(|func| module.function(func))
            .fold(Self::default(), |summary, func| Self {
                functions: summary.functions + 1,
                defined: summary.defined + usize::from(func.is_defined()),
                instructions: summary.instructions + func.inst_count(),
            })
    }
}

macro_rules! summary_analyses {
    ($($(#[$meta:meta])* $name:ident => $kind:ident;)+) => {
        $(
            $(#[$meta])*
            pub struct $name;

            impl ModuleAnalysis for $name {
                const KIND: AnalysisKind = AnalysisKind::$kind;
                type Result = ModuleSummary;

                fn run(&mut self, module: &Module, _: &AnalysisCache) -> Result<ModuleSummary, PassError> {
                    Ok(ModuleSummary::compute(module))
                }
            }
        )+
    };
}

summary_analyses! {
    /// Alias information. Summarizes the module.
    AliasAnalysis => Alias;
    /// Induction variable information. Summarizes the module.
    InductionVariableAnalysis => InductionVariable;
    /// The class hierarchy. Summarizes the module.
    ClassHierarchyAnalysis => ClassHierarchy;
    /// Reference-count identity roots. Summarizes the module.
    RcIdentityAnalysis => RcIdentity;
    /// Destructor side-effect information. Summarizes the module.
    DestructorAnalysis => Destructor;
}
