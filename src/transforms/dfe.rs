//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::CallGraphAnalysis;
use crate::ir::{Linkage, Module};
use crate::pass::{AnalysisCache, ModuleTransformPass, PassError, PassKind, PreservedAnalyses};

/// Removes private functions that can never be called.
///
/// Public functions are the roots, anything that is not transitively called
/// from a root (according to the call graph) and is not public is deleted.
#[derive(Default)]
pub struct DeadFunctionEliminationPass {
    changed: bool,
}

impl ModuleTransformPass for DeadFunctionEliminationPass {
    fn kind(&self) -> PassKind {
        PassKind::DeadFunctionElimination
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        if self.changed {
            PreservedAnalyses::none()
        } else {
            PreservedAnalyses::all()
        }
    }

    fn run(&mut self, module: &mut Module, am: &AnalysisCache) -> Result<(), PassError> {
        let cg = am.get::<CallGraphAnalysis>(module)?;
        let roots = module
            .functions()
            .filter(|&func| module.function(func).linkage() == Linkage::Public);
        let live = cg.reachable_from(roots);
        let dead: Vec<_> = module.functions().filter(|func| !live.contains(func)).collect();

        for &func in dead.iter() {
            if let Some(removed) = module.remove_function(func) {
                log::debug!("removing dead function `{}`", removed.name());
            }
        }

        self.changed = !dead.is_empty();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::FuncAttributes;
    use crate::pass::RegisteredAnalysis;

    fn define(module: &mut Module, name: &str, linkage: Linkage, callees: &[&str]) {
        let mut b = module.define_function(name, linkage, FuncAttributes::default());
        let entry = b.create_block("entry");

        b.switch_to(entry);

        for callee in callees {
            b.call(callee);
        }

        b.ret();
    }

    #[test]
    fn unreachable_private_functions_are_removed() {
        let mut module = Module::new("m");

        define(&mut module, "helper", Linkage::Private, &[]);
        define(&mut module, "cycle_a", Linkage::Private, &["cycle_b"]);
        define(&mut module, "cycle_b", Linkage::Private, &["cycle_a"]);
        define(&mut module, "exported", Linkage::Public, &[]);
        define(&mut module, "main", Linkage::Public, &["helper"]);

        let mut am = AnalysisCache::new();

        am.register(RegisteredAnalysis::module(CallGraphAnalysis)).unwrap();

        let mut pass = DeadFunctionEliminationPass::default();

        pass.run(&mut module, &am).unwrap();

        let mut names: Vec<_> = module
            .functions()
            .map(|func| module.function(func).name().to_owned())
            .collect();

        names.sort();

        assert_eq!(names, vec!["exported", "helper", "main"]);
        assert!(module.find_function_by_name("cycle_a").is_none());
        assert!(!pass.preserved_analyses().preserves_all());
    }
}
