//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{Func, Module};
use crate::pass::{AnalysisCache, AnalysisKind, ModuleAnalysis, PassError};
use crate::utility::{SaHashMap, SaHashSet};
use smallvec::SmallVec;

/// Models which functions of a module call which other functions.
///
/// Edges are only created for calls whose callee names a function of the
/// same module, calls to anything else are ignored. Every call site creates
/// one edge, but each edge is only recorded once.
#[derive(Debug, Default)]
pub struct CallGraph {
    callees: SaHashMap<Func, SmallVec<[Func; 4]>>,
    callers: SaHashMap<Func, SmallVec<[Func; 4]>>,
}

impl CallGraph {
    /// Directly computes the call graph of a module.
    ///
    /// Passes should request this through [`CallGraphAnalysis`] instead.
    pub fn compute(module: &Module) -> Self {
        let mut graph = Self::default();

        for func in module.functions() {
            graph.callees.entry(func).or_default();
            graph.callers.entry(func).or_default();

            let body = match module.function(func).body() {
                Some(body) => body,
                None => continue,
            };

            for bb in body.blocks() {
                for inst in body.block(bb).insts() {
                    let callee = match inst.callee().and_then(|name| module.find_function_by_name(name)) {
                        Some(callee) => callee,
                        None => continue,
                    };

                    graph.add_edge(func, callee);
                }
            }
        }

        graph
    }

    /// Gets the functions that `func` calls directly.
    pub fn callees(&self, func: Func) -> &[Func] {
        self.callees.get(&func).map_or(&[], |callees| callees.as_slice())
    }

    /// Gets the functions that directly call `func`.
    pub fn callers(&self, func: Func) -> &[Func] {
        self.callers.get(&func).map_or(&[], |callers| callers.as_slice())
    }

    /// Checks if `func` calls itself directly.
    pub fn is_self_recursive(&self, func: Func) -> bool {
        self.callees(func).contains(&func)
    }

    /// Finds every function transitively reachable from `roots`, including
    /// the roots themselves.
    pub fn reachable_from(&self, roots: impl IntoIterator<Item = Func>) -> SaHashSet<Func> {
        let mut seen = SaHashSet::default();
        let mut worklist: Vec<Func> = roots.into_iter().collect();

        while let Some(func) = worklist.pop() {
            if !seen.insert(func) {
                continue;
            }

            worklist.extend(self.callees(func).iter().copied());
        }

        seen
    }

    fn add_edge(&mut self, caller: Func, callee: Func) {
        let callees = self.callees.entry(caller).or_default();

        if callees.contains(&callee) {
            return;
        }

        callees.push(callee);
        self.callers.entry(callee).or_default().push(caller);
    }
}

/// Wrapper analysis that computes a [`CallGraph`].
pub struct CallGraphAnalysis;

impl ModuleAnalysis for CallGraphAnalysis {
    const KIND: AnalysisKind = AnalysisKind::CallGraph;
    type Result = CallGraph;

    fn run(&mut self, module: &Module, _: &AnalysisCache) -> Result<CallGraph, PassError> {
        Ok(CallGraph::compute(module))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FuncAttributes, Linkage};

    fn caller_of(module: &mut Module, name: &str, callees: &[&str]) -> Func {
        let mut b = module.define_function(name, Linkage::Public, FuncAttributes::default());
        let entry = b.create_block("entry");

        b.switch_to(entry);

        for callee in callees {
            b.call(callee);
            b.call(callee);
        }

        b.ret();
        b.func()
    }

    #[test]
    fn edges_are_deduplicated() {
        let mut module = Module::new("m");
        let leaf = caller_of(&mut module, "leaf", &[]);
        let main = caller_of(&mut module, "main", &["leaf", "printf"]);
        let graph = CallGraph::compute(&module);

        assert_eq!(graph.callees(main), &[leaf]);
        assert_eq!(graph.callers(leaf), &[main]);
        assert!(graph.callees(leaf).is_empty());
    }

    #[test]
    fn reachability_follows_calls() {
        let mut module = Module::new("m");
        let c = caller_of(&mut module, "c", &["c"]);
        let b = caller_of(&mut module, "b", &["c"]);
        let a = caller_of(&mut module, "a", &["b"]);
        let unused = caller_of(&mut module, "unused", &["a"]);
        let graph = CallGraph::compute(&module);
        let reachable = graph.reachable_from([a]);

        assert!(reachable.contains(&a));
        assert!(reachable.contains(&b));
        assert!(reachable.contains(&c));
        assert!(!reachable.contains(&unused));
        assert!(graph.is_self_recursive(c));
        assert!(!graph.is_self_recursive(b));
    }
}
