//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::ir::{FuncAttributes, InstData, Module};
use crate::pass::{AnalysisCache, ModuleTransformPass, PassError, PassKind, PreservedAnalyses};
use crate::utility::SaHashMap;

/// Decides which callees an inliner is allowed to inline.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum InlinePolicy {
    /// Only `transparent` functions, which must be inlined for correctness.
    Mandatory,
    /// Anything without externally-defined semantics that is not a global
    /// initializer. Semantic calls need to survive until the high-level
    /// optimizations that recognize them have run.
    Early,
    /// Anything that is not a global initializer.
    Performance,
    /// Everything.
    Late,
}

impl InlinePolicy {
    /// Checks whether a callee with `attributes` may be inlined.
    pub fn allows(self, attributes: &FuncAttributes) -> bool {
        match self {
            InlinePolicy::Mandatory => attributes.transparent,
            InlinePolicy::Early => !attributes.has_semantics() && !attributes.global_init,
            InlinePolicy::Performance => !attributes.global_init,
            InlinePolicy::Late => true,
        }
    }

    fn pass_kind(self) -> PassKind {
        match self {
            InlinePolicy::Mandatory => PassKind::MandatoryInlining,
            InlinePolicy::Early => PassKind::EarlyInliner,
            InlinePolicy::Performance => PassKind::PerfInliner,
            InlinePolicy::Late => PassKind::LateInliner,
        }
    }
}

/// An inliner, parameterized by the policy it follows.
///
/// Only trivially-inlinable callees are handled: the callee must be defined,
/// consist of a single block, and end in `ret`. Calls to the function being
/// inlined into are never inlined, and instructions that were spliced in by
/// this run are not looked at again until the next run.
pub struct InlinerPass {
    policy: InlinePolicy,
    changed: bool,
}

impl InlinerPass {
    /// Creates an inliner with a given policy.
    pub fn new(policy: InlinePolicy) -> Self {
        Self {
            policy,
            changed: false,
        }
    }

    /// The mandatory inliner used by the diagnostic pipeline.
    pub fn mandatory() -> Self {
        Self::new(InlinePolicy::Mandatory)
    }

    /// The high-level inliner.
    pub fn early() -> Self {
        Self::new(InlinePolicy::Early)
    }

    /// The mid-level inliner.
    pub fn performance() -> Self {
        Self::new(InlinePolicy::Performance)
    }

    /// The low-level inliner.
    pub fn late() -> Self {
        Self::new(InlinePolicy::Late)
    }

    /// Gets the policy of the inliner.
    pub fn policy(&self) -> InlinePolicy {
        self.policy
    }
}

impl ModuleTransformPass for InlinerPass {
    fn kind(&self) -> PassKind {
        self.policy.pass_kind()
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        if self.changed {
            PreservedAnalyses::none()
        } else {
            PreservedAnalyses::all()
        }
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        let candidates = inlinable_bodies(module, self.policy);
        let funcs: Vec<_> = module.functions().collect();
        let mut inlined = 0;

        for func in funcs {
            let function = module.function_mut(func);
            let caller = function.name().to_owned();
            let body = match function.body_mut() {
                Some(body) => body,
                None => continue,
            };

            let blocks: Vec<_> = body.blocks().collect();

            for bb in blocks {
                let insts = body.block_mut(bb).insts_mut();
                let mut i = 0;

                while i < insts.len() {
                    let spliced = match insts[i].callee() {
                        Some(callee) if callee != caller => candidates.get(callee),
                        _ => None,
                    };

                    let spliced = match spliced {
                        Some(spliced) => spliced,
                        None => {
                            i += 1;
                            continue;
                        }
                    };

                    log::debug!("inlining `{:?}` into `{caller}`", insts[i]);

                    insts.splice(i..=i, spliced.iter().cloned());
                    i += spliced.len();
                    inlined += 1;
                }
            }
        }

        if inlined != 0 {
            log::debug!("[{}] inlined {inlined} call sites", self.name());
        }

        self.changed = inlined != 0;

        Ok(())
    }
}

// snapshot of every callee that can be inlined, taken before anything is
// modified. maps name -> the callee's instructions without the final `ret`
fn inlinable_bodies(module: &Module, policy: InlinePolicy) -> SaHashMap<String, Vec<InstData>> {
    let mut candidates = SaHashMap::default();

    for func in module.functions() {
        let func = module.function(func);

        if !policy.allows(func.attributes()) {
            continue;
        }

        let body = match func.body() {
            Some(body) if body.len() == 1 => body,
            _ => continue,
        };

        let insts = match body.entry().map(|entry| body.block(entry).insts()) {
            Some([rest @ .., InstData::Ret]) => rest,
            _ => continue,
        };

        candidates.insert(func.name().to_owned(), insts.to_vec());
    }

    candidates
}
