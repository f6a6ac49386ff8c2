//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::{PostOrder, PostOrderAnalysis};
use crate::ir::{Block, Body, Func, Module};
use crate::pass::{AnalysisCache, ModuleTransformPass, PassError, PassKind, PreservedAnalyses};

/// Diagnoses and removes code that can never be executed.
///
/// Every block that is unreachable from its function's entry is reported as
/// a warning and then deleted. Unreachable code is suspicious but legal, so
/// this never records an error.
#[derive(Default)]
pub struct DiagnoseUnreachablePass {
    changed: bool,
}

impl ModuleTransformPass for DiagnoseUnreachablePass {
    fn kind(&self) -> PassKind {
        PassKind::DiagnoseUnreachable
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        if self.changed {
            PreservedAnalyses::none()
        } else {
            PreservedAnalyses::all()
        }
    }

    fn run(&mut self, module: &mut Module, am: &AnalysisCache) -> Result<(), PassError> {
        let mut dead: Vec<(Func, Vec<Block>)> = Vec::default();

        for func in module.functions() {
            let body = match module.function(func).body() {
                Some(body) => body,
                None => continue,
            };

            let po = am.get_for::<PostOrderAnalysis>(module, func)?;
            let unreachable: Vec<_> = body.blocks().filter(|&bb| !po.is_reachable(bb)).collect();

            if !unreachable.is_empty() {
                dead.push((func, unreachable));
            }
        }

        self.changed = !dead.is_empty();

        for (func, blocks) in dead {
            let function = module.function_mut(func);
            let name = function.name().to_owned();
            let mut messages = Vec::with_capacity(blocks.len());

            if let Some(body) = function.body_mut() {
                for bb in blocks {
                    if let Some(data) = body.remove_block(bb) {
                        messages.push(format!("block `{}` will never be executed", data.name()));
                    }
                }
            }

            for message in messages {
                module.diagnostics_mut().warn(&name, message);
            }
        }

        Ok(())
    }
}

/// Performs simple control-flow graph cleanup.
///
/// Blocks that are unreachable from the entry are removed, and a block whose
/// only predecessor ends in an unconditional branch to it is merged into
/// that predecessor. This repeats until neither applies.
#[derive(Default)]
pub struct SimplifyCfgPass {
    changed: bool,
}

impl ModuleTransformPass for SimplifyCfgPass {
    fn kind(&self) -> PassKind {
        PassKind::SimplifyCfg
    }

    fn preserved_analyses(&self) -> PreservedAnalyses {
        if self.changed {
            PreservedAnalyses::none()
        } else {
            PreservedAnalyses::all()
        }
    }

    fn run(&mut self, module: &mut Module, _: &AnalysisCache) -> Result<(), PassError> {
        let funcs: Vec<_> = module.functions().collect();

        self.changed = false;

        for func in funcs {
            if let Some(body) = module.function_mut(func).body_mut() {
                self.changed |= simplify_cfg(body);
            }
        }

        Ok(())
    }
}

/// Removes unreachable blocks and merges trivial edges in `body`. Returns
/// whether anything changed.
pub fn simplify_cfg(body: &mut Body) -> bool {
    let mut changed = remove_unreachable_blocks(body);

    while let Some((pred, bb)) = find_mergeable_edge(body) {
        if let Some(data) = body.remove_block(bb) {
            let insts = body.block_mut(pred).insts_mut();

            log::trace!("merging `{}` into its predecessor", data.name());

            insts.pop();
            insts.extend(data.insts().iter().cloned());
            changed = true;
        }
    }

    changed
}

fn remove_unreachable_blocks(body: &mut Body) -> bool {
    let po = PostOrder::compute(body);
    let unreachable: Vec<_> = body.blocks().filter(|&bb| !po.is_reachable(bb)).collect();

    for &bb in unreachable.iter() {
        body.remove_block(bb);
    }

    !unreachable.is_empty()
}

// finds `pred -> bb` where `pred` ends in `br bb` and that is the only edge into `bb`
fn find_mergeable_edge(body: &Body) -> Option<(Block, Block)> {
    let preds = body.predecessors();
    let entry = body.entry()?;

    body.blocks()
        .filter(|&bb| bb != entry)
        .find_map(|bb| match preds.get(&bb).map(|p| p.as_slice()) {
            Some(&[pred]) if pred != bb && body.successors(pred).len() == 1 => Some((pred, bb)),
            _ => None,
        })
}
